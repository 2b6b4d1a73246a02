use async_trait::async_trait;
use tracing::{debug, info};

use crate::agents::prompts::*;
use crate::agents::{AgentError, Rater};
use crate::evaluation::parser::parse_raw_evaluation;
use crate::evaluation::record::{RaterRole, RawEvaluation};
use crate::llm_client::prompts::{JSON_ONLY_SYSTEM, SCORING_SCALE_INSTRUCTION};
use crate::llm_client::{ChatMessage, LlmClient, LlmError};
use crate::models::candidate::Candidate;

/// Script for one persona: who the model plays, how it opens, and the
/// simulated candidate's replies.
struct Persona {
    system_template: &'static str,
    opening: &'static str,
    answers: &'static [&'static str],
}

fn persona(role: RaterRole) -> Persona {
    match role {
        RaterRole::Technical => Persona {
            system_template: TECHNICAL_SYSTEM_TEMPLATE,
            opening: TECHNICAL_OPENING,
            answers: TECHNICAL_ANSWERS,
        },
        RaterRole::Culture => Persona {
            system_template: CULTURE_SYSTEM_TEMPLATE,
            opening: CULTURE_OPENING,
            answers: CULTURE_ANSWERS,
        },
        RaterRole::Business => Persona {
            system_template: BUSINESS_SYSTEM_TEMPLATE,
            opening: BUSINESS_OPENING,
            answers: BUSINESS_ANSWERS,
        },
    }
}

fn system_prompt(role: RaterRole, candidate: &Candidate) -> String {
    persona(role)
        .system_template
        .replace("{name}", &candidate.name)
        .replace("{role}", &candidate.role_applying)
        .replace("{cv}", &candidate.cv_text)
}

fn final_request() -> String {
    format!("{EVALUATION_REQUEST}\n\n{SCORING_SCALE_INSTRUCTION}\n{JSON_ONLY_SYSTEM}")
}

/// Runs a simulated multi-turn interview for one role and returns the
/// interviewer's final structured verdict.
pub struct LlmInterviewer {
    client: LlmClient,
    role: RaterRole,
}

impl LlmInterviewer {
    pub fn new(client: LlmClient, role: RaterRole) -> Self {
        Self { client, role }
    }

    async fn turn(&self, system: &str, history: &mut Vec<ChatMessage>) -> Result<String, LlmError> {
        let response = self.client.converse(system, history).await?;
        let text = response.text().ok_or(LlmError::EmptyContent)?.to_string();
        history.push(ChatMessage::assistant(text.clone()));
        Ok(text)
    }
}

#[async_trait]
impl Rater for LlmInterviewer {
    fn role(&self) -> RaterRole {
        self.role
    }

    async fn evaluate(&self, candidate: &Candidate) -> Result<RawEvaluation, AgentError> {
        let persona = persona(self.role);
        let system = system_prompt(self.role, candidate);
        info!("{} interview started for candidate {}", self.role, candidate.id);

        let mut history = vec![ChatMessage::user(persona.opening)];
        self.turn(&system, &mut history).await?;

        for answer in persona.answers {
            history.push(ChatMessage::user(*answer));
            self.turn(&system, &mut history).await?;
        }

        history.push(ChatMessage::user(final_request()));
        let verdict = self.turn(&system, &mut history).await?;
        debug!("{} interview finished after {} turns", self.role, history.len());

        Ok(parse_raw_evaluation(&verdict)?)
    }
}
