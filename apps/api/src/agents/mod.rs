//! Collaborator boundary: the interviewers, the negotiator and the onboarding
//! planner. The decision core never talks to these directly; the hiring
//! pipeline calls them, bounds them with timeouts and absorbs their failures.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::decision::negotiation::NegotiationResult;
use crate::evaluation::parser::ParseError;
use crate::evaluation::record::{Evaluation, PanelEvaluations, RaterRole, RawEvaluation};
use crate::llm_client::{LlmClient, LlmError};
use crate::models::candidate::Candidate;

pub mod interviewer;
pub mod negotiator;
pub mod onboarding;
pub mod prompts;

pub use interviewer::LlmInterviewer;
pub use negotiator::LlmNegotiator;
pub use onboarding::{LlmOnboardingPlanner, OnboardingPlan};

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("LLM call failed: {0}")]
    Llm(#[from] LlmError),

    #[error("malformed agent output: {0}")]
    Malformed(#[from] ParseError),

    #[error("agent timed out after {0:?}")]
    Timeout(Duration),
}

/// One interviewer persona. Returns its verdict unvalidated; the pipeline
/// runs it through `Evaluation::ingest`.
#[async_trait]
pub trait Rater: Send + Sync {
    fn role(&self) -> RaterRole;

    async fn evaluate(&self, candidate: &Candidate) -> Result<RawEvaluation, AgentError>;
}

/// Everything the negotiator sees: the three evaluations and how far apart they are.
#[derive(Debug, Clone, Serialize)]
pub struct NegotiationRequest<'a> {
    pub candidate: &'a Candidate,
    pub technical: &'a Evaluation,
    pub culture: &'a Evaluation,
    pub business: &'a Evaluation,
    pub gap: f64,
}

impl<'a> NegotiationRequest<'a> {
    /// `None` unless all three evaluations are attached.
    pub fn new(candidate: &'a Candidate, panel: &'a PanelEvaluations, gap: f64) -> Option<Self> {
        Some(Self {
            candidate,
            technical: panel.technical.as_ref()?,
            culture: panel.culture.as_ref()?,
            business: panel.business.as_ref()?,
            gap,
        })
    }
}

#[async_trait]
pub trait NegotiationSynthesizer: Send + Sync {
    async fn negotiate(
        &self,
        request: &NegotiationRequest<'_>,
    ) -> Result<NegotiationResult, AgentError>;
}

#[async_trait]
pub trait OnboardingPlanner: Send + Sync {
    async fn plan(
        &self,
        candidate: &Candidate,
        evaluations: &PanelEvaluations,
    ) -> Result<OnboardingPlan, AgentError>;
}

/// The three interviewers, one per role.
#[derive(Clone)]
pub struct RaterPanel {
    pub technical: Arc<dyn Rater>,
    pub culture: Arc<dyn Rater>,
    pub business: Arc<dyn Rater>,
}

impl RaterPanel {
    /// LLM-backed interviewers sharing one client.
    pub fn llm(client: &LlmClient) -> Self {
        Self {
            technical: Arc::new(LlmInterviewer::new(client.clone(), RaterRole::Technical)),
            culture: Arc::new(LlmInterviewer::new(client.clone(), RaterRole::Culture)),
            business: Arc::new(LlmInterviewer::new(client.clone(), RaterRole::Business)),
        }
    }
}
