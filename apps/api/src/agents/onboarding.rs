//! Onboarding plans for hired candidates.
//!
//! The planner asks the model for a structured plan. A reply that cannot be
//! parsed, or that has no first-days schedule, is replaced by a fixed default
//! plan; transport failures still surface as errors.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::agents::prompts::{ONBOARDING_PROMPT, ONBOARDING_SYSTEM_TEMPLATE};
use crate::agents::{AgentError, OnboardingPlanner};
use crate::evaluation::record::PanelEvaluations;
use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::{LlmClient, LlmError};
use crate::models::candidate::Candidate;

const BACKGROUND_PREVIEW_CHARS: usize = 200;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MentoringStrategy {
    #[serde(default)]
    pub focus_areas: Vec<String>,
    #[serde(default)]
    pub mentoring_pairs: String,
    #[serde(default)]
    pub check_in_frequency: String,
    #[serde(default)]
    pub support_resources: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillDevelopment {
    #[serde(default)]
    pub strengths_to_leverage: Vec<String>,
    #[serde(default)]
    pub areas_to_improve: Vec<String>,
    #[serde(default)]
    pub learning_path: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnboardingPlan {
    #[serde(default)]
    pub candidate_name: String,
    /// Day name → tasks for the first three days.
    #[serde(default)]
    pub day_1_3: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub week_1: Vec<String>,
    #[serde(default)]
    pub week_2_4: Vec<String>,
    #[serde(default)]
    pub mentoring_strategy: MentoringStrategy,
    #[serde(default)]
    pub skill_development: SkillDevelopment,
    #[serde(default)]
    pub milestones: BTreeMap<String, String>,
    #[serde(default)]
    pub success_criteria: Vec<String>,
    #[serde(default)]
    pub emergency_contacts: String,
    #[serde(default)]
    pub expectations: String,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Plan used when the model's reply is unusable.
pub fn default_plan(name: &str) -> OnboardingPlan {
    let day_1_3 = BTreeMap::from([
        (
            "monday".to_string(),
            strings(&["Welcome & office setup", "Meet team members", "Company overview"]),
        ),
        (
            "tuesday".to_string(),
            strings(&[
                "Dev environment setup",
                "Codebase introduction",
                "Project structure walkthrough",
            ]),
        ),
        (
            "wednesday".to_string(),
            strings(&[
                "Architecture overview",
                "Development workflow tutorial",
                "First simple task assignment",
            ]),
        ),
    ]);

    let milestones = BTreeMap::from([
        (
            "end_of_week_1".to_string(),
            "Dev environment working, first code committed".to_string(),
        ),
        (
            "end_of_week_2".to_string(),
            "First code review completed, attended meetings".to_string(),
        ),
        (
            "end_of_month".to_string(),
            "Contributing to features, team integration".to_string(),
        ),
    ]);

    OnboardingPlan {
        candidate_name: name.to_string(),
        day_1_3,
        week_1: strings(&[
            "Complete dev environment setup",
            "First code review",
            "Attend team standup",
            "Meet with direct manager",
            "Review coding standards",
        ]),
        week_2_4: strings(&[
            "Pair programming sessions (3-4 per week)",
            "Pick up first features/tasks",
            "Code reviews on submissions",
            "Documentation reading",
            "Team project participation",
        ]),
        mentoring_strategy: MentoringStrategy {
            focus_areas: strings(&["Team integration", "Codebase mastery", "Company culture"]),
            mentoring_pairs: "Senior dev + manager".to_string(),
            check_in_frequency: "Daily (first week), then 3x/week".to_string(),
            support_resources: strings(&["Onboarding docs", "Code examples", "Team wiki"]),
        },
        skill_development: SkillDevelopment {
            strengths_to_leverage: strings(&["Problem-solving", "Learning ability"]),
            areas_to_improve: strings(&["Codebase familiarity", "Team processes"]),
            learning_path: strings(&["Setup", "Read code", "Small fixes", "Feature work"]),
        },
        milestones,
        success_criteria: strings(&[
            "Dev environment fully functional",
            "First code merged by end of week 1",
            "Positive team feedback",
            "Productive contributor by week 4",
        ]),
        emergency_contacts: "Manager & Team Lead".to_string(),
        expectations: "Focus on learning and team integration. \
            You don't need to be fully productive immediately."
            .to_string(),
    }
}

fn system_prompt(candidate: &Candidate, evaluations: &PanelEvaluations) -> String {
    let technical_score = evaluations
        .technical
        .as_ref()
        .map(|e| e.score.to_string())
        .unwrap_or_else(|| "unknown".to_string());
    let red_flags: Vec<&str> = evaluations
        .iter()
        .flat_map(|e| e.red_flags.iter().map(String::as_str))
        .collect();
    let strengths: Vec<&str> = evaluations
        .iter()
        .flat_map(|e| e.strengths.iter().map(String::as_str))
        .collect();
    let background: String = candidate.cv_text.chars().take(BACKGROUND_PREVIEW_CHARS).collect();

    let system = ONBOARDING_SYSTEM_TEMPLATE
        .replace("{name}", &candidate.name)
        .replace("{role}", &candidate.role_applying)
        .replace("{technical_score}", &technical_score)
        .replace("{red_flags}", &red_flags.join("; "))
        .replace("{strengths}", &strengths.join("; "))
        .replace("{background}", &background);
    format!("{system}\n{JSON_ONLY_SYSTEM}")
}

pub struct LlmOnboardingPlanner {
    client: LlmClient,
}

impl LlmOnboardingPlanner {
    pub fn new(client: LlmClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl OnboardingPlanner for LlmOnboardingPlanner {
    async fn plan(
        &self,
        candidate: &Candidate,
        evaluations: &PanelEvaluations,
    ) -> Result<OnboardingPlan, AgentError> {
        let system = system_prompt(candidate, evaluations);

        let plan = match self
            .client
            .call_json::<OnboardingPlan>(ONBOARDING_PROMPT, &system)
            .await
        {
            Ok(plan) if !plan.day_1_3.is_empty() => plan,
            Ok(_) => {
                warn!("Onboarding plan for {} had no first-days schedule; using default", candidate.id);
                default_plan(&candidate.name)
            }
            Err(e @ (LlmError::NoJsonObject | LlmError::Parse(_) | LlmError::EmptyContent)) => {
                warn!("Onboarding plan for {} was unusable ({e}); using default", candidate.id);
                default_plan(&candidate.name)
            }
            Err(e) => return Err(e.into()),
        };

        info!("Onboarding plan ready for candidate {}", candidate.id);
        Ok(plan)
    }
}
