//! The per-candidate session aggregate.
//!
//! One `Session` value is one evaluation round. All state changes go through
//! the methods below, which enforce the lifecycle guards; the repository only
//! stores snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::decision::aggregator::{aggregate, AggregationInput, DataQualityIssue, Decision};
use crate::decision::conflict::{detect_conflict, ConflictReport, RaterScores};
use crate::decision::critical::CriticalFlagPolicy;
use crate::decision::negotiation::NegotiationResult;
use crate::evaluation::record::{Evaluation, PanelEvaluations};
use crate::models::candidate::Candidate;
use crate::session::state::{SessionState, StateTransition};

#[derive(Debug, Error, PartialEq)]
pub enum SessionError {
    #[error("cannot move session from {from} to {to}: {reason}")]
    InvalidStateTransition {
        from: SessionState,
        to: SessionState,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub candidate: Candidate,
    /// 1-based evaluation round.
    pub round: u32,
    /// Optimistic-concurrency token, bumped by every repository swap.
    pub version: u64,
    pub state: SessionState,
    pub evaluations: PanelEvaluations,
    pub negotiation: Option<NegotiationResult>,
    pub decision: Option<Decision>,
    /// Collaborator-boundary problems absorbed during this round.
    pub issues: Vec<DataQualityIssue>,
    pub transitions: Vec<StateTransition>,
    pub created_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
}

/// Summary view served by the status endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionStatus {
    pub candidate_id: Uuid,
    pub round: u32,
    pub state: SessionState,
    pub evaluations_done: usize,
    pub has_negotiation: bool,
    pub has_decision: bool,
}

impl Session {
    pub fn new(candidate: Candidate) -> Self {
        Self::for_round(candidate, 1)
    }

    fn for_round(candidate: Candidate, round: u32) -> Self {
        Self {
            candidate,
            round,
            version: 0,
            state: SessionState::Created,
            evaluations: PanelEvaluations::default(),
            negotiation: None,
            decision: None,
            issues: Vec::new(),
            transitions: Vec::new(),
            created_at: Utc::now(),
            decided_at: None,
        }
    }

    pub fn candidate_id(&self) -> Uuid {
        self.candidate.id
    }

    /// Fresh `Created` snapshot for the same candidate. `self` is left as-is
    /// so the previous round stays in history.
    pub fn next_round(&self) -> Session {
        Self::for_round(self.candidate.clone(), self.round + 1)
    }

    /// Attaches an evaluation under its role. The first attach moves the
    /// session into `Evaluating`; re-attaching a role replaces it.
    pub fn attach_evaluation(
        &mut self,
        evaluation: Evaluation,
    ) -> Result<Option<Evaluation>, SessionError> {
        match self.state {
            SessionState::Created => self.transition(SessionState::Evaluating),
            SessionState::Evaluating => {}
            SessionState::Negotiating | SessionState::Decided => {
                return Err(self.invalid(
                    SessionState::Evaluating,
                    format!("{} evaluation arrived after evaluation closed", evaluation.role),
                ));
            }
        }
        Ok(self.evaluations.insert(evaluation))
    }

    pub fn record_issue(&mut self, issue: DataQualityIssue) {
        if !self.issues.contains(&issue) {
            self.issues.push(issue);
        }
    }

    /// Conflict report over the attached scores, once all three are present.
    pub fn conflict(&self) -> Option<ConflictReport> {
        self.evaluations
            .is_complete()
            .then(|| detect_conflict(&RaterScores::from_panel(&self.evaluations)))
    }

    /// `Evaluating → Negotiating`. Only legal when the panel is complete and
    /// the raters disagree.
    pub fn begin_negotiation(&mut self) -> Result<ConflictReport, SessionError> {
        if self.state != SessionState::Evaluating {
            return Err(self.invalid(SessionState::Negotiating, "session is not evaluating"));
        }
        let report = self
            .conflict()
            .ok_or_else(|| self.invalid(SessionState::Negotiating, self.missing_reason()))?;
        if !report.conflict {
            return Err(self.invalid(
                SessionState::Negotiating,
                format!("score gap {:.2} is not a conflict", report.gap),
            ));
        }
        self.transition(SessionState::Negotiating);
        Ok(report)
    }

    pub fn record_negotiation(&mut self, result: NegotiationResult) -> Result<(), SessionError> {
        if self.state != SessionState::Negotiating {
            return Err(SessionError::InvalidStateTransition {
                from: self.state,
                to: SessionState::Negotiating,
                reason: "negotiation recorded outside a negotiation".to_string(),
            });
        }
        self.negotiation = Some(result);
        Ok(())
    }

    /// Aggregates the panel and closes the round.
    pub fn decide(&mut self, policy: &dyn CriticalFlagPolicy) -> Result<&Decision, SessionError> {
        if !self.state.can_transition_to(SessionState::Decided) {
            return Err(self.invalid(
                SessionState::Decided,
                format!("session is {}", self.state),
            ));
        }
        let report = self
            .conflict()
            .ok_or_else(|| self.invalid(SessionState::Decided, self.missing_reason()))?;
        if report.conflict && self.state == SessionState::Evaluating {
            return Err(self.invalid(
                SessionState::Decided,
                "raters disagree; the session must pass through negotiation",
            ));
        }

        let decision = self.aggregate(policy);
        self.transition(SessionState::Decided);
        self.decided_at = Some(Utc::now());
        Ok(self.decision.insert(decision))
    }

    /// Re-runs the aggregator over a decided round and replaces the stored
    /// decision wholesale.
    pub fn recompute_decision(
        &mut self,
        policy: &dyn CriticalFlagPolicy,
    ) -> Result<&Decision, SessionError> {
        if self.state != SessionState::Decided {
            return Err(self.invalid(SessionState::Decided, "only a decided session can be recomputed"));
        }
        let decision = self.aggregate(policy);
        self.decided_at = Some(Utc::now());
        Ok(self.decision.insert(decision))
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            candidate_id: self.candidate_id(),
            round: self.round,
            state: self.state,
            evaluations_done: self.evaluations.iter().count(),
            has_negotiation: self.negotiation.is_some(),
            has_decision: self.decision.is_some(),
        }
    }

    fn aggregate(&self, policy: &dyn CriticalFlagPolicy) -> Decision {
        aggregate(
            AggregationInput {
                evaluations: &self.evaluations,
                negotiation: self.negotiation.as_ref(),
                upstream_issues: &self.issues,
            },
            policy,
        )
    }

    fn transition(&mut self, to: SessionState) {
        self.transitions.push(StateTransition {
            from: self.state,
            to,
            at: Utc::now(),
        });
        self.state = to;
    }

    fn invalid(&self, to: SessionState, reason: impl Into<String>) -> SessionError {
        SessionError::InvalidStateTransition {
            from: self.state,
            to,
            reason: reason.into(),
        }
    }

    fn missing_reason(&self) -> String {
        let missing: Vec<&str> = self
            .evaluations
            .missing_roles()
            .into_iter()
            .map(|r| r.as_str())
            .collect();
        format!("missing evaluations: {}", missing.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::aggregator::FinalDecision;
    use crate::decision::critical::KeywordCriticalPolicy;
    use crate::evaluation::record::{RaterRole, RawEvaluation};

    fn candidate() -> Candidate {
        Candidate::new(
            "Ada Example".to_string(),
            "ada@example.com".to_string(),
            "Ten years of Rust".to_string(),
            "Backend Engineer".to_string(),
        )
    }

    fn eval(role: RaterRole, score: f64) -> Evaluation {
        Evaluation::ingest(
            role,
            RawEvaluation {
                score: Some(score),
                ..Default::default()
            },
        )
        .unwrap()
    }

    fn attach_all(session: &mut Session, t: f64, c: f64, b: f64) {
        session.attach_evaluation(eval(RaterRole::Technical, t)).unwrap();
        session.attach_evaluation(eval(RaterRole::Culture, c)).unwrap();
        session.attach_evaluation(eval(RaterRole::Business, b)).unwrap();
    }

    #[test]
    fn test_first_attach_moves_to_evaluating() {
        let mut session = Session::new(candidate());
        assert_eq!(session.state, SessionState::Created);

        session.attach_evaluation(eval(RaterRole::Culture, 7.0)).unwrap();
        assert_eq!(session.state, SessionState::Evaluating);
        assert_eq!(session.transitions.len(), 1);
        assert_eq!(session.transitions[0].from, SessionState::Created);
    }

    #[test]
    fn test_cannot_decide_with_fewer_than_three() {
        let policy = KeywordCriticalPolicy::default();
        let mut session = Session::new(candidate());
        assert!(session.decide(&policy).is_err());

        session.attach_evaluation(eval(RaterRole::Technical, 9.0)).unwrap();
        session.attach_evaluation(eval(RaterRole::Culture, 9.0)).unwrap();
        let err = session.decide(&policy).unwrap_err();
        assert!(matches!(
            &err,
            SessionError::InvalidStateTransition { reason, .. } if reason.contains("business")
        ));
        assert_eq!(session.state, SessionState::Evaluating);
        assert!(session.decision.is_none());
    }

    #[test]
    fn test_decide_without_conflict() {
        let policy = KeywordCriticalPolicy::default();
        let mut session = Session::new(candidate());
        attach_all(&mut session, 9.0, 8.0, 8.0);

        assert!(!session.conflict().unwrap().conflict);
        assert!(session.begin_negotiation().is_err());
        let decision = session.decide(&policy).unwrap();
        assert_eq!(decision.final_decision, FinalDecision::Hire);
        assert_eq!(session.state, SessionState::Decided);
        assert!(session.negotiation.is_none());
        assert!(session.decided_at.is_some());
    }

    #[test]
    fn test_conflict_requires_negotiation_state() {
        let policy = KeywordCriticalPolicy::default();
        let mut session = Session::new(candidate());
        attach_all(&mut session, 9.0, 6.0, 8.0);

        assert!(session.decide(&policy).is_err());
        let report = session.begin_negotiation().unwrap();
        assert_eq!(report.gap, 3.0);
        assert_eq!(session.state, SessionState::Negotiating);

        // Late evaluations are refused once negotiation starts
        assert!(session.attach_evaluation(eval(RaterRole::Culture, 9.0)).is_err());

        let decision = session.decide(&policy).unwrap();
        assert!(decision.conflict_detected);
        assert!(!decision.negotiation_considered);
        let states: Vec<SessionState> = session.transitions.iter().map(|t| t.to).collect();
        assert_eq!(
            states,
            vec![
                SessionState::Evaluating,
                SessionState::Negotiating,
                SessionState::Decided
            ]
        );
    }

    #[test]
    fn test_attach_after_decided_is_rejected() {
        let policy = KeywordCriticalPolicy::default();
        let mut session = Session::new(candidate());
        attach_all(&mut session, 7.0, 7.0, 7.0);
        session.decide(&policy).unwrap();

        let err = session
            .attach_evaluation(eval(RaterRole::Business, 1.0))
            .unwrap_err();
        assert!(matches!(
            err,
            SessionError::InvalidStateTransition {
                from: SessionState::Decided,
                ..
            }
        ));
        assert_eq!(session.evaluations.business.as_ref().unwrap().score, 7.0);
    }

    #[test]
    fn test_recompute_overwrites_decision() {
        let mut session = Session::new(candidate());
        attach_all(&mut session, 9.0, 8.0, 8.0);
        let lenient = |_: &str| false;
        session.decide(&lenient).unwrap();

        session.evaluations.technical.as_mut().unwrap().red_flags.insert("anything".to_string());
        let strict = |_: &str| true;
        let decision = session.recompute_decision(&strict).unwrap();
        assert_eq!(decision.final_decision, FinalDecision::Maybe);
        assert_eq!(
            session.decision.as_ref().unwrap().final_decision,
            FinalDecision::Maybe
        );
    }

    #[test]
    fn test_next_round_starts_fresh() {
        let policy = KeywordCriticalPolicy::default();
        let mut session = Session::new(candidate());
        attach_all(&mut session, 7.0, 7.0, 7.0);
        session.decide(&policy).unwrap();

        let next = session.next_round();
        assert_eq!(next.round, 2);
        assert_eq!(next.state, SessionState::Created);
        assert_eq!(next.candidate_id(), session.candidate_id());
        assert!(next.decision.is_none());
        assert_eq!(session.state, SessionState::Decided);
    }

    #[test]
    fn test_recorded_issues_reach_the_decision() {
        let policy = KeywordCriticalPolicy::default();
        let mut session = Session::new(candidate());
        attach_all(&mut session, 9.0, 9.0, 9.0);
        let issue = DataQualityIssue::OutOfRangeScore {
            role: RaterRole::Business,
            score: 12.0,
        };
        session.record_issue(issue.clone());
        session.record_issue(issue.clone());

        let decision = session.decide(&policy).unwrap();
        assert_eq!(decision.data_quality, vec![issue]);
    }

    #[test]
    fn test_snapshot_with_unusable_score_reloads() {
        let policy = KeywordCriticalPolicy::default();
        let mut session = Session::new(candidate());
        let raw: RawEvaluation = serde_json::from_str(r#"{"score": "NaN"}"#).unwrap();
        session
            .attach_evaluation(Evaluation::ingest(RaterRole::Technical, raw).unwrap())
            .unwrap();
        session.attach_evaluation(eval(RaterRole::Culture, 8.0)).unwrap();
        session.attach_evaluation(eval(RaterRole::Business, 8.0)).unwrap();
        session.record_issue(DataQualityIssue::OutOfRangeScore {
            role: RaterRole::Technical,
            score: 11.0,
        });
        // 0 against 8 is a conflict, so the round passes through negotiation
        session.begin_negotiation().unwrap();
        let decision = session.decide(&policy).unwrap();
        assert_eq!(decision.final_decision, FinalDecision::Pass);

        let snapshot = serde_json::to_value(&session).unwrap();
        let reloaded: Session = serde_json::from_value(snapshot).unwrap();
        assert_eq!(reloaded, session);
    }

    #[test]
    fn test_status_summary() {
        let mut session = Session::new(candidate());
        session.attach_evaluation(eval(RaterRole::Technical, 5.0)).unwrap();
        let status = session.status();
        assert_eq!(status.evaluations_done, 1);
        assert_eq!(status.state, SessionState::Evaluating);
        assert!(!status.has_decision);
    }
}
