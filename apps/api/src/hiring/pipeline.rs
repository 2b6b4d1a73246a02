//! Hiring pipeline: drives one candidate through an evaluation round.
//!
//! evaluate:
//!   1. Take the candidate's writer lock
//!   2. Load the latest round, opening a fresh one unless it is still `Created`
//!   3. Run the three raters concurrently, each under a timeout
//!   4. Attach evaluations and persist
//!   5. On conflict, move to `Negotiating`, persist, call the negotiator
//!   6. Aggregate, move to `Decided`, persist
//!
//! Collaborator failures never abort a round: a failed rater becomes a
//! defaulted evaluation, a failed negotiation becomes a data-quality issue.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::time::timeout;
use tracing::{info, warn};
use uuid::Uuid;

use crate::agents::{
    AgentError, NegotiationRequest, NegotiationSynthesizer, OnboardingPlan, OnboardingPlanner,
    Rater, RaterPanel,
};
use crate::decision::aggregator::{DataQualityIssue, Decision, FinalDecision};
use crate::decision::critical::CriticalFlagPolicy;
use crate::decision::negotiation::NegotiationResult;
use crate::errors::AppError;
use crate::evaluation::record::{Evaluation, EvaluationError, PanelEvaluations, RaterRole, RawEvaluation};
use crate::models::candidate::Candidate;
use crate::session::locks::CandidateLocks;
use crate::session::model::{Session, SessionError, SessionStatus};
use crate::session::repository::SessionRepository;
use crate::session::state::SessionState;

#[derive(Debug, Clone, Copy)]
pub struct CollaboratorTimeouts {
    pub rater: Duration,
    pub negotiation: Duration,
}

/// Result of a completed round.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationOutcome {
    pub candidate_id: Uuid,
    pub round: u32,
    pub evaluations: PanelEvaluations,
    pub negotiation: Option<NegotiationResult>,
    pub decision: Decision,
}

impl EvaluationOutcome {
    fn new(session: &Session, decision: Decision) -> Self {
        Self {
            candidate_id: session.candidate_id(),
            round: session.round,
            evaluations: session.evaluations.clone(),
            negotiation: session.negotiation.clone(),
            decision,
        }
    }
}

pub struct HiringPipeline {
    sessions: Arc<dyn SessionRepository>,
    raters: RaterPanel,
    negotiator: Arc<dyn NegotiationSynthesizer>,
    planner: Arc<dyn OnboardingPlanner>,
    critical_policy: Arc<dyn CriticalFlagPolicy>,
    locks: CandidateLocks,
    timeouts: CollaboratorTimeouts,
}

impl HiringPipeline {
    pub fn new(
        sessions: Arc<dyn SessionRepository>,
        raters: RaterPanel,
        negotiator: Arc<dyn NegotiationSynthesizer>,
        planner: Arc<dyn OnboardingPlanner>,
        critical_policy: Arc<dyn CriticalFlagPolicy>,
        timeouts: CollaboratorTimeouts,
    ) -> Self {
        Self {
            sessions,
            raters,
            negotiator,
            planner,
            critical_policy,
            locks: CandidateLocks::new(),
            timeouts,
        }
    }

    /// Stores a new candidate with an empty first round.
    pub async fn register(&self, candidate: Candidate) -> Result<Session, AppError> {
        let session = Session::new(candidate);
        self.sessions.put(&session).await?;
        info!(
            "Registered candidate {} for {}",
            session.candidate_id(),
            session.candidate.role_applying
        );
        Ok(session)
    }

    /// Runs a full interview round and returns its decision.
    pub async fn evaluate(&self, candidate_id: Uuid) -> Result<EvaluationOutcome, AppError> {
        let _guard = self.locks.acquire(candidate_id).await;
        let mut session = self.open_round(candidate_id, |s| s.state == SessionState::Created).await?;
        info!("Evaluating candidate {candidate_id} (round {})", session.round);

        let candidate = &session.candidate;
        let (technical, culture, business) = tokio::join!(
            self.run_rater(self.raters.technical.as_ref(), candidate),
            self.run_rater(self.raters.culture.as_ref(), candidate),
            self.run_rater(self.raters.business.as_ref(), candidate),
        );

        for (evaluation, issue) in [technical, culture, business] {
            if let Some(issue) = issue {
                session.record_issue(issue);
            }
            session.attach_evaluation(evaluation)?;
        }
        let session = self.save(session).await?;

        self.conclude(session).await
    }

    /// Attaches an externally produced evaluation. A decided round is left
    /// untouched and the evaluation starts the next round.
    pub async fn submit_evaluation(
        &self,
        candidate_id: Uuid,
        role: RaterRole,
        raw: RawEvaluation,
    ) -> Result<SessionStatus, AppError> {
        let evaluation = Evaluation::ingest(role, raw).map_err(|e| {
            warn!("Rejected {role} evaluation for {candidate_id}: {e}");
            AppError::from(e)
        })?;

        let _guard = self.locks.acquire(candidate_id).await;
        let mut session = self.open_round(candidate_id, |s| !s.state.is_terminal()).await?;
        if let Some(previous) = session.attach_evaluation(evaluation)? {
            info!("Replaced {} evaluation (score {}) for {candidate_id}", previous.role, previous.score);
        }
        let session = self.save(session).await?;
        Ok(session.status())
    }

    /// Decides over the evaluations already attached. On a decided round the
    /// decision is recomputed and replaced.
    pub async fn finalize(&self, candidate_id: Uuid) -> Result<EvaluationOutcome, AppError> {
        let _guard = self.locks.acquire(candidate_id).await;
        let mut session = self.sessions.get(candidate_id).await?;

        if session.state == SessionState::Decided {
            let decision = session
                .recompute_decision(self.critical_policy.as_ref())?
                .clone();
            let session = self.save(session).await?;
            info!("Recomputed decision for {candidate_id}: {}", decision.final_decision);
            return Ok(EvaluationOutcome::new(&session, decision));
        }

        self.conclude(session).await
    }

    pub async fn status(&self, candidate_id: Uuid) -> Result<SessionStatus, AppError> {
        Ok(self.sessions.get(candidate_id).await?.status())
    }

    pub async fn decision(&self, candidate_id: Uuid) -> Result<Decision, AppError> {
        self.sessions
            .get(candidate_id)
            .await?
            .decision
            .ok_or_else(|| AppError::NotFound(format!("No decision yet for candidate {candidate_id}")))
    }

    pub async fn history(&self, candidate_id: Uuid) -> Result<Vec<Session>, AppError> {
        Ok(self.sessions.history(candidate_id).await?)
    }

    /// Onboarding plan for a hired candidate.
    pub async fn onboarding(&self, candidate_id: Uuid) -> Result<OnboardingPlan, AppError> {
        let session = self.sessions.get(candidate_id).await?;
        match session.decision.as_ref().map(|d| d.final_decision) {
            Some(FinalDecision::Hire) => {}
            Some(other) => {
                return Err(AppError::UnprocessableEntity(format!(
                    "Onboarding is only available for hired candidates (decision: {other})"
                )))
            }
            None => {
                return Err(AppError::UnprocessableEntity(format!(
                    "Candidate {candidate_id} has not been decided yet"
                )))
            }
        }
        Ok(self.planner.plan(&session.candidate, &session.evaluations).await?)
    }

    // ────────────────────────────────────────────────────────────────────────
    // Round steps
    // ────────────────────────────────────────────────────────────────────────

    /// Latest round if `reuse` accepts it, otherwise a freshly stored next round.
    async fn open_round(
        &self,
        candidate_id: Uuid,
        reuse: impl Fn(&Session) -> bool,
    ) -> Result<Session, AppError> {
        let latest = self.sessions.get(candidate_id).await?;
        if reuse(&latest) {
            return Ok(latest);
        }
        let next = latest.next_round();
        self.sessions.put(&next).await?;
        info!("Opened round {} for candidate {candidate_id}", next.round);
        Ok(next)
    }

    /// Conflict gate, optional negotiation, then the decision.
    async fn conclude(&self, mut session: Session) -> Result<EvaluationOutcome, AppError> {
        let conflicted = session.conflict().is_some_and(|r| r.conflict);
        if conflicted && session.state == SessionState::Evaluating {
            let report = session.begin_negotiation()?;
            info!(
                "Raters disagree on {} (gap {:.2}); negotiating",
                session.candidate_id(),
                report.gap
            );
            session = self.save(session).await?;
        }

        if session.state == SessionState::Negotiating && session.negotiation.is_none() {
            self.negotiate(&mut session).await?;
        }

        let decision = session.decide(self.critical_policy.as_ref())?.clone();
        let session = self.save(session).await?;
        info!(
            "Decision for {} (round {}): {} at {:.2}, confidence {:?}",
            session.candidate_id(),
            session.round,
            decision.final_decision,
            decision.weighted_score,
            decision.confidence
        );
        Ok(EvaluationOutcome::new(&session, decision))
    }

    async fn run_rater(
        &self,
        rater: &dyn Rater,
        candidate: &Candidate,
    ) -> (Evaluation, Option<DataQualityIssue>) {
        let role = rater.role();
        let raw = match bounded(self.timeouts.rater, rater.evaluate(candidate)).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!("{role} rater failed for {}: {e}; scoring as 0", candidate.id);
                return (Evaluation::defaulted(role, e.to_string()), None);
            }
        };

        match Evaluation::ingest(role, raw) {
            Ok(evaluation) => (evaluation, None),
            Err(EvaluationError::OutOfRangeScore { role, score }) => {
                warn!("{role} rater returned out-of-range score {score} for {}; scoring as 0", candidate.id);
                (
                    Evaluation::defaulted(role, format!("rejected out-of-range score {score}")),
                    Some(DataQualityIssue::OutOfRangeScore { role, score }),
                )
            }
        }
    }

    async fn negotiate(&self, session: &mut Session) -> Result<(), SessionError> {
        let gap = session.conflict().map(|r| r.gap).unwrap_or_default();
        let result = match NegotiationRequest::new(&session.candidate, &session.evaluations, gap) {
            Some(request) => {
                bounded(self.timeouts.negotiation, self.negotiator.negotiate(&request)).await
            }
            None => return Ok(()),
        };

        match result {
            Ok(negotiation) => session.record_negotiation(negotiation),
            Err(AgentError::Malformed(e)) => {
                warn!("Negotiation output for {} was malformed: {e}", session.candidate_id());
                session.record_issue(DataQualityIssue::MalformedNegotiation {
                    reason: e.to_string(),
                });
                Ok(())
            }
            Err(e) => {
                warn!("Negotiation for {} unavailable: {e}", session.candidate_id());
                session.record_issue(DataQualityIssue::NegotiationUnavailable {
                    reason: e.to_string(),
                });
                Ok(())
            }
        }
    }

    async fn save(&self, session: Session) -> Result<Session, AppError> {
        Ok(self
            .sessions
            .compare_and_swap(session.version, &session)
            .await?)
    }
}

/// Runs a collaborator call under `limit`, mapping expiry to `AgentError::Timeout`.
async fn bounded<T>(
    limit: Duration,
    call: impl Future<Output = Result<T, AgentError>>,
) -> Result<T, AgentError> {
    timeout(limit, call)
        .await
        .unwrap_or(Err(AgentError::Timeout(limit)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use crate::agents::onboarding::default_plan;
    use crate::decision::aggregator::Confidence;
    use crate::decision::critical::KeywordCriticalPolicy;
    use crate::evaluation::parser::ParseError;
    use crate::session::repository::MemorySessionRepository;

    // ── Stub collaborators ─────────────────────────────────────────────────

    enum Script {
        Score(f64),
        Flags(f64, &'static [&'static str]),
        Fail,
        Hang,
    }

    struct StubRater {
        role: RaterRole,
        script: Script,
    }

    #[async_trait]
    impl Rater for StubRater {
        fn role(&self) -> RaterRole {
            self.role
        }

        async fn evaluate(&self, _candidate: &Candidate) -> Result<RawEvaluation, AgentError> {
            let (score, flags): (f64, &[&str]) = match &self.script {
                Script::Score(s) => (*s, &[]),
                Script::Flags(s, f) => (*s, *f),
                Script::Fail => return Err(AgentError::Malformed(ParseError::NoJsonObject)),
                Script::Hang => std::future::pending().await,
            };
            Ok(RawEvaluation {
                score: Some(score),
                red_flags: flags.iter().map(|f| f.to_string()).collect(),
                strengths: vec![format!("{} strength", self.role)],
                justification: "stub".to_string(),
                recommendation: String::new(),
            })
        }
    }

    fn rater(role: RaterRole, script: Script) -> Arc<dyn Rater> {
        Arc::new(StubRater { role, script })
    }

    fn panel(t: Script, c: Script, b: Script) -> RaterPanel {
        RaterPanel {
            technical: rater(RaterRole::Technical, t),
            culture: rater(RaterRole::Culture, c),
            business: rater(RaterRole::Business, b),
        }
    }

    #[derive(Default)]
    struct StubNegotiator {
        calls: AtomicUsize,
        malformed: bool,
    }

    #[async_trait]
    impl NegotiationSynthesizer for StubNegotiator {
        async fn negotiate(
            &self,
            request: &NegotiationRequest<'_>,
        ) -> Result<NegotiationResult, AgentError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.malformed {
                return Err(AgentError::Malformed(ParseError::MissingField(
                    "score_explanation",
                )));
            }
            Ok(NegotiationResult {
                key_disagreements: vec!["Teamwork evidence".to_string()],
                score_explanation: format!("Gap of {:.1} comes from thin team examples", request.gap),
                technical_perspective: None,
                culture_perspective: None,
                business_perspective: None,
                insights: None,
            })
        }
    }

    struct StubPlanner;

    #[async_trait]
    impl OnboardingPlanner for StubPlanner {
        async fn plan(
            &self,
            candidate: &Candidate,
            _evaluations: &PanelEvaluations,
        ) -> Result<OnboardingPlan, AgentError> {
            Ok(default_plan(&candidate.name))
        }
    }

    struct Harness {
        pipeline: HiringPipeline,
        negotiator: Arc<StubNegotiator>,
        repo: Arc<MemorySessionRepository>,
    }

    fn harness_with(raters: RaterPanel, negotiator: StubNegotiator) -> Harness {
        let repo = Arc::new(MemorySessionRepository::new());
        let negotiator = Arc::new(negotiator);
        let pipeline = HiringPipeline::new(
            repo.clone(),
            raters,
            negotiator.clone(),
            Arc::new(StubPlanner),
            Arc::new(KeywordCriticalPolicy::default()),
            CollaboratorTimeouts {
                rater: Duration::from_secs(30),
                negotiation: Duration::from_secs(10),
            },
        );
        Harness {
            pipeline,
            negotiator,
            repo,
        }
    }

    fn harness(raters: RaterPanel) -> Harness {
        harness_with(raters, StubNegotiator::default())
    }

    fn candidate() -> Candidate {
        Candidate::new(
            "Ada Example".to_string(),
            "ada@example.com".to_string(),
            "Ten years of Rust".to_string(),
            "Backend Engineer".to_string(),
        )
    }

    fn raw(score: f64) -> RawEvaluation {
        RawEvaluation {
            score: Some(score),
            ..Default::default()
        }
    }

    // ── Tests ──────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_hire_without_negotiation() {
        let h = harness(panel(Script::Score(9.0), Script::Score(8.0), Script::Score(8.0)));
        let id = h.pipeline.register(candidate()).await.unwrap().candidate_id();

        let outcome = h.pipeline.evaluate(id).await.unwrap();
        assert_eq!(outcome.decision.final_decision, FinalDecision::Hire);
        assert!((outcome.decision.weighted_score - 8.4).abs() < 1e-9);
        assert!(outcome.negotiation.is_none());
        assert_eq!(h.negotiator.calls.load(Ordering::SeqCst), 0);

        let stored = h.repo.get(id).await.unwrap();
        assert_eq!(stored.state, SessionState::Decided);
        assert_eq!(stored.decision, Some(outcome.decision));
    }

    #[tokio::test]
    async fn test_conflict_runs_negotiation_once() {
        let h = harness(panel(Script::Score(9.0), Script::Score(6.0), Script::Score(8.0)));
        let id = h.pipeline.register(candidate()).await.unwrap().candidate_id();

        let outcome = h.pipeline.evaluate(id).await.unwrap();
        assert_eq!(h.negotiator.calls.load(Ordering::SeqCst), 1);
        assert!(outcome.decision.conflict_detected);
        assert!(outcome.decision.negotiation_considered);
        assert!(outcome.decision.reasoning.contains("thin team examples"));
        // 0.4*9 + 0.3*6 + 0.3*8 = 7.8, no flags
        assert_eq!(outcome.decision.final_decision, FinalDecision::Hire);

        let states: Vec<SessionState> = h
            .repo
            .get(id)
            .await
            .unwrap()
            .transitions
            .iter()
            .map(|t| t.to)
            .collect();
        assert_eq!(
            states,
            vec![
                SessionState::Evaluating,
                SessionState::Negotiating,
                SessionState::Decided
            ]
        );
    }

    #[tokio::test]
    async fn test_malformed_negotiation_leaves_decision_unchanged() {
        let scripts = || panel(Script::Score(9.0), Script::Score(6.0), Script::Score(8.0));
        let good = harness(scripts());
        let bad = harness_with(
            scripts(),
            StubNegotiator {
                malformed: true,
                ..Default::default()
            },
        );

        let good_id = good.pipeline.register(candidate()).await.unwrap().candidate_id();
        let bad_id = bad.pipeline.register(candidate()).await.unwrap().candidate_id();
        let with = good.pipeline.evaluate(good_id).await.unwrap();
        let without = bad.pipeline.evaluate(bad_id).await.unwrap();

        assert!(without.negotiation.is_none());
        assert!(!without.decision.negotiation_considered);
        assert_eq!(without.decision.final_decision, with.decision.final_decision);
        assert_eq!(without.decision.weighted_score, with.decision.weighted_score);
        assert!(matches!(
            without.decision.data_quality.as_slice(),
            [DataQualityIssue::MalformedNegotiation { .. }]
        ));
        assert_eq!(without.decision.confidence, Confidence::Low);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rater_timeout_defaults_to_zero_and_still_decides() {
        let h = harness(panel(Script::Score(9.0), Script::Score(9.0), Script::Hang));
        let id = h.pipeline.register(candidate()).await.unwrap().candidate_id();

        let outcome = h.pipeline.evaluate(id).await.unwrap();
        let business = outcome.evaluations.business.as_ref().unwrap();
        assert!(business.is_defaulted());
        assert_eq!(business.score, 0.0);

        // 0.4*9 + 0.3*9 = 6.3; the gap of 9 also triggers negotiation
        assert!((outcome.decision.weighted_score - 6.3).abs() < 1e-9);
        assert_eq!(outcome.decision.final_decision, FinalDecision::Maybe);
        assert!(outcome.decision.data_quality.iter().any(|i| matches!(
            i,
            DataQualityIssue::DefaultedScore {
                role: RaterRole::Business,
                ..
            }
        )));
    }

    #[tokio::test]
    async fn test_failed_rater_is_defaulted() {
        let h = harness(panel(Script::Score(8.0), Script::Fail, Script::Score(8.0)));
        let id = h.pipeline.register(candidate()).await.unwrap().candidate_id();

        let outcome = h.pipeline.evaluate(id).await.unwrap();
        assert!(outcome.evaluations.culture.as_ref().unwrap().is_defaulted());
        // 0.4*8 + 0.3*0 + 0.3*8 = 5.6
        assert_eq!(outcome.decision.final_decision, FinalDecision::Pass);
    }

    #[tokio::test]
    async fn test_out_of_range_rater_output_is_rejected_not_clamped() {
        let h = harness(panel(Script::Score(12.0), Script::Score(8.0), Script::Score(8.0)));
        let id = h.pipeline.register(candidate()).await.unwrap().candidate_id();

        let outcome = h.pipeline.evaluate(id).await.unwrap();
        assert_eq!(outcome.evaluations.technical.as_ref().unwrap().score, 0.0);
        assert!(outcome
            .decision
            .data_quality
            .contains(&DataQualityIssue::OutOfRangeScore {
                role: RaterRole::Technical,
                score: 12.0
            }));
        assert_ne!(outcome.decision.final_decision, FinalDecision::Hire);
    }

    #[tokio::test]
    async fn test_flagged_raters_force_pass() {
        let h = harness(panel(
            Script::Flags(7.0, &["Vague on testing"]),
            Script::Flags(7.0, &["Interrupted often"]),
            Script::Score(7.0),
        ));
        let id = h.pipeline.register(candidate()).await.unwrap().candidate_id();

        let outcome = h.pipeline.evaluate(id).await.unwrap();
        assert_eq!(outcome.decision.final_decision, FinalDecision::Pass);
        assert_eq!(outcome.decision.red_flags_summary.len(), 2);
    }

    #[tokio::test]
    async fn test_reevaluation_opens_new_round_and_keeps_history() {
        let h = harness(panel(Script::Score(7.0), Script::Score(7.0), Script::Score(7.0)));
        let id = h.pipeline.register(candidate()).await.unwrap().candidate_id();

        let first = h.pipeline.evaluate(id).await.unwrap();
        let second = h.pipeline.evaluate(id).await.unwrap();
        assert_eq!(first.round, 1);
        assert_eq!(second.round, 2);

        let history = h.pipeline.history(id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert!(history.iter().all(|s| s.state == SessionState::Decided));
        assert_eq!(history[0].decision, Some(first.decision));
    }

    #[tokio::test]
    async fn test_submit_then_finalize() {
        let h = harness(panel(Script::Fail, Script::Fail, Script::Fail));
        let id = h.pipeline.register(candidate()).await.unwrap().candidate_id();

        let status = h
            .pipeline
            .submit_evaluation(id, RaterRole::Technical, raw(9.0))
            .await
            .unwrap();
        assert_eq!(status.state, SessionState::Evaluating);
        assert_eq!(status.evaluations_done, 1);

        let premature = h.pipeline.finalize(id).await.unwrap_err();
        assert!(matches!(premature, AppError::Conflict(_)));

        h.pipeline
            .submit_evaluation(id, RaterRole::Culture, raw(8.0))
            .await
            .unwrap();
        h.pipeline
            .submit_evaluation(id, RaterRole::Business, raw(8.0))
            .await
            .unwrap();

        let outcome = h.pipeline.finalize(id).await.unwrap();
        assert_eq!(outcome.decision.final_decision, FinalDecision::Hire);
        assert_eq!(
            h.pipeline.decision(id).await.unwrap(),
            outcome.decision
        );

        // Recomputing a decided round replaces the decision in place
        let again = h.pipeline.finalize(id).await.unwrap();
        assert_eq!(again.round, 1);
        assert_eq!(again.decision, outcome.decision);
    }

    #[tokio::test]
    async fn test_submit_out_of_range_is_unprocessable() {
        let h = harness(panel(Script::Fail, Script::Fail, Script::Fail));
        let id = h.pipeline.register(candidate()).await.unwrap().candidate_id();

        let err = h
            .pipeline
            .submit_evaluation(id, RaterRole::Business, raw(10.5))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UnprocessableEntity(_)));
        assert_eq!(h.pipeline.status(id).await.unwrap().state, SessionState::Created);
    }

    #[tokio::test]
    async fn test_submit_after_decision_starts_next_round() {
        let h = harness(panel(Script::Score(7.0), Script::Score(7.0), Script::Score(7.0)));
        let id = h.pipeline.register(candidate()).await.unwrap().candidate_id();
        h.pipeline.evaluate(id).await.unwrap();

        let status = h
            .pipeline
            .submit_evaluation(id, RaterRole::Culture, raw(3.0))
            .await
            .unwrap();
        assert_eq!(status.round, 2);
        assert_eq!(status.evaluations_done, 1);

        let history = h.pipeline.history(id).await.unwrap();
        assert_eq!(history[0].evaluations.culture.as_ref().unwrap().score, 7.0);
    }

    #[tokio::test]
    async fn test_onboarding_only_for_hires() {
        let hire = harness(panel(Script::Score(9.0), Script::Score(8.0), Script::Score(8.0)));
        let id = hire.pipeline.register(candidate()).await.unwrap().candidate_id();
        assert!(matches!(
            hire.pipeline.onboarding(id).await,
            Err(AppError::UnprocessableEntity(_))
        ));
        hire.pipeline.evaluate(id).await.unwrap();
        let plan = hire.pipeline.onboarding(id).await.unwrap();
        assert_eq!(plan.candidate_name, "Ada Example");

        let maybe = harness(panel(Script::Score(7.0), Script::Score(7.0), Script::Score(7.0)));
        let id = maybe.pipeline.register(candidate()).await.unwrap().candidate_id();
        maybe.pipeline.evaluate(id).await.unwrap();
        assert!(matches!(
            maybe.pipeline.onboarding(id).await,
            Err(AppError::UnprocessableEntity(_))
        ));
    }

    #[tokio::test]
    async fn test_unknown_candidate_is_not_found() {
        let h = harness(panel(Script::Score(7.0), Script::Score(7.0), Script::Score(7.0)));
        let id = Uuid::new_v4();
        assert!(matches!(h.pipeline.evaluate(id).await, Err(AppError::NotFound(_))));
        assert!(matches!(h.pipeline.status(id).await, Err(AppError::NotFound(_))));
        assert!(matches!(h.pipeline.decision(id).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_concurrent_evaluations_are_serialized() {
        let h = harness(panel(Script::Score(7.0), Script::Score(7.0), Script::Score(7.0)));
        let id = h.pipeline.register(candidate()).await.unwrap().candidate_id();

        let (a, b) = tokio::join!(h.pipeline.evaluate(id), h.pipeline.evaluate(id));
        let mut rounds = vec![a.unwrap().round, b.unwrap().round];
        rounds.sort_unstable();
        assert_eq!(rounds, vec![1, 2]);
    }
}
