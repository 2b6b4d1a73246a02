//! Evaluation records: one rater's normalized opinion of a candidate.
//!
//! Raters (LLM interviewers or external callers) hand over a `RawEvaluation`;
//! `Evaluation::ingest` validates it into the record the decision core consumes.
//! Scores are never clamped: out-of-range input is rejected, a missing score
//! becomes 0 with `Defaulted` provenance so it cannot pass for an earned 0.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use tracing::warn;

pub const MIN_SCORE: f64 = 0.0;
pub const MAX_SCORE: f64 = 10.0;

/// The three fixed interviewer personas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RaterRole {
    Technical,
    Culture,
    Business,
}

impl RaterRole {
    /// Canonical order used for reporting.
    pub const ALL: [RaterRole; 3] = [RaterRole::Technical, RaterRole::Culture, RaterRole::Business];

    pub fn as_str(self) -> &'static str {
        match self {
            RaterRole::Technical => "technical",
            RaterRole::Culture => "culture",
            RaterRole::Business => "business",
        }
    }
}

impl fmt::Display for RaterRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a score was earned in an interview or filled in at the boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScoreProvenance {
    Rated,
    Defaulted { reason: String },
}

#[derive(Debug, Error, PartialEq)]
pub enum EvaluationError {
    #[error("{role} score {score} is outside [0, 10]")]
    OutOfRangeScore { role: RaterRole, score: f64 },
}

/// Collaborator payload before validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawEvaluation {
    #[serde(default, deserialize_with = "deserialize_score")]
    pub score: Option<f64>,
    #[serde(default)]
    pub red_flags: Vec<String>,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub justification: String,
    #[serde(default)]
    pub recommendation: String,
}

/// Accepts `7.5`, `"7.5"` and `"7.5/10"`. Anything else, including `"NaN"` and
/// `"inf"`, reads as missing.
fn deserialize_score<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ScoreRepr {
        Number(f64),
        Text(String),
    }

    let score = match Option::<ScoreRepr>::deserialize(deserializer)? {
        None => None,
        Some(ScoreRepr::Number(n)) => Some(n),
        Some(ScoreRepr::Text(t)) => t.trim().trim_end_matches("/10").trim().parse().ok(),
    };
    Ok(score.filter(|s: &f64| s.is_finite()))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub role: RaterRole,
    pub score: f64,
    pub red_flags: BTreeSet<String>,
    pub strengths: BTreeSet<String>,
    /// Advisory only; never consumed by the decision logic.
    pub justification: String,
    #[serde(default)]
    pub recommendation: String,
    pub provenance: ScoreProvenance,
}

impl Evaluation {
    /// Validates a raw rater payload.
    pub fn ingest(role: RaterRole, raw: RawEvaluation) -> Result<Self, EvaluationError> {
        // Non-finite scores cannot be stored in a snapshot; treat them as missing.
        let (score, provenance) = match raw.score.filter(|s| s.is_finite()) {
            Some(score) if (MIN_SCORE..=MAX_SCORE).contains(&score) => {
                (score, ScoreProvenance::Rated)
            }
            Some(score) => return Err(EvaluationError::OutOfRangeScore { role, score }),
            None => {
                warn!("{role} evaluation arrived without a score; defaulting to 0");
                (
                    0.0,
                    ScoreProvenance::Defaulted {
                        reason: "score missing from rater output".to_string(),
                    },
                )
            }
        };

        Ok(Self {
            role,
            score,
            red_flags: normalize_set(raw.red_flags),
            strengths: normalize_set(raw.strengths),
            justification: raw.justification.trim().to_string(),
            recommendation: raw.recommendation.trim().to_string(),
            provenance,
        })
    }

    /// Stand-in for an evaluation the collaborator failed to deliver.
    pub fn defaulted(role: RaterRole, reason: impl Into<String>) -> Self {
        Self {
            role,
            score: 0.0,
            red_flags: BTreeSet::new(),
            strengths: BTreeSet::new(),
            justification: String::new(),
            recommendation: String::new(),
            provenance: ScoreProvenance::Defaulted {
                reason: reason.into(),
            },
        }
    }

    pub fn is_defaulted(&self) -> bool {
        matches!(self.provenance, ScoreProvenance::Defaulted { .. })
    }

    pub fn has_red_flags(&self) -> bool {
        !self.red_flags.is_empty()
    }
}

fn normalize_set(items: Vec<String>) -> BTreeSet<String> {
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Up to one evaluation per rater role. Latest write wins; no history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PanelEvaluations {
    pub technical: Option<Evaluation>,
    pub culture: Option<Evaluation>,
    pub business: Option<Evaluation>,
}

impl PanelEvaluations {
    pub fn get(&self, role: RaterRole) -> Option<&Evaluation> {
        match role {
            RaterRole::Technical => self.technical.as_ref(),
            RaterRole::Culture => self.culture.as_ref(),
            RaterRole::Business => self.business.as_ref(),
        }
    }

    /// Attaches an evaluation under its own role, returning the one it replaced.
    pub fn insert(&mut self, evaluation: Evaluation) -> Option<Evaluation> {
        let slot = match evaluation.role {
            RaterRole::Technical => &mut self.technical,
            RaterRole::Culture => &mut self.culture,
            RaterRole::Business => &mut self.business,
        };
        slot.replace(evaluation)
    }

    /// Attached evaluations in canonical role order.
    pub fn iter(&self) -> impl Iterator<Item = &Evaluation> {
        RaterRole::ALL.into_iter().filter_map(|role| self.get(role))
    }

    pub fn attached_roles(&self) -> Vec<RaterRole> {
        self.iter().map(|e| e.role).collect()
    }

    pub fn missing_roles(&self) -> Vec<RaterRole> {
        RaterRole::ALL
            .into_iter()
            .filter(|role| self.get(*role).is_none())
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing_roles().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(score: Option<f64>) -> RawEvaluation {
        RawEvaluation {
            score,
            red_flags: vec![],
            strengths: vec!["Systems design".to_string()],
            justification: "Solid answers".to_string(),
            recommendation: String::new(),
        }
    }

    #[test]
    fn test_ingest_accepts_boundary_scores() {
        for score in [0.0, 10.0, 7.25] {
            let eval = Evaluation::ingest(RaterRole::Technical, raw(Some(score))).unwrap();
            assert_eq!(eval.score, score);
            assert_eq!(eval.provenance, ScoreProvenance::Rated);
        }
    }

    #[test]
    fn test_ingest_rejects_out_of_range() {
        for score in [-0.1, 10.5, 1e300] {
            let err = Evaluation::ingest(RaterRole::Culture, raw(Some(score))).unwrap_err();
            assert!(matches!(
                err,
                EvaluationError::OutOfRangeScore {
                    role: RaterRole::Culture,
                    ..
                }
            ));
        }
    }

    #[test]
    fn test_non_finite_score_defaults_to_zero() {
        for score in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let eval = Evaluation::ingest(RaterRole::Culture, raw(Some(score))).unwrap();
            assert_eq!(eval.score, 0.0);
            assert!(eval.is_defaulted());
        }
    }

    #[test]
    fn test_missing_score_defaults_to_zero_with_provenance() {
        let eval = Evaluation::ingest(RaterRole::Business, raw(None)).unwrap();
        assert_eq!(eval.score, 0.0);
        assert!(eval.is_defaulted());
        // Still keeps the rest of the payload
        assert!(eval.strengths.contains("Systems design"));
    }

    #[test]
    fn test_earned_zero_is_distinguishable_from_default() {
        let earned = Evaluation::ingest(RaterRole::Business, raw(Some(0.0))).unwrap();
        let defaulted = Evaluation::ingest(RaterRole::Business, raw(None)).unwrap();
        assert_eq!(earned.score, defaulted.score);
        assert_ne!(earned, defaulted);
        assert!(!earned.is_defaulted());
    }

    #[test]
    fn test_flags_are_a_set() {
        let payload = RawEvaluation {
            score: Some(5.0),
            red_flags: vec![
                "Vague answers".to_string(),
                " Vague answers ".to_string(),
                "".to_string(),
            ],
            ..Default::default()
        };
        let eval = Evaluation::ingest(RaterRole::Technical, payload).unwrap();
        assert_eq!(eval.red_flags.len(), 1);
        assert!(eval.has_red_flags());
    }

    #[test]
    fn test_raw_score_accepts_strings() {
        let parsed: RawEvaluation = serde_json::from_str(r#"{"score": "8.5/10"}"#).unwrap();
        assert_eq!(parsed.score, Some(8.5));
        let parsed: RawEvaluation = serde_json::from_str(r#"{"score": "great"}"#).unwrap();
        assert_eq!(parsed.score, None);
        for text in ["NaN", "inf", "-infinity"] {
            let parsed: RawEvaluation =
                serde_json::from_str(&format!(r#"{{"score": "{text}"}}"#)).unwrap();
            assert_eq!(parsed.score, None, "{text}");
        }
        let parsed: RawEvaluation = serde_json::from_str(r#"{"score": null}"#).unwrap();
        assert_eq!(parsed.score, None);
        let parsed: RawEvaluation = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(parsed.score, None);
    }

    #[test]
    fn test_panel_latest_write_wins() {
        let mut panel = PanelEvaluations::default();
        assert_eq!(panel.missing_roles(), RaterRole::ALL.to_vec());

        let first = Evaluation::ingest(RaterRole::Culture, raw(Some(4.0))).unwrap();
        let second = Evaluation::ingest(RaterRole::Culture, raw(Some(6.0))).unwrap();
        assert!(panel.insert(first).is_none());
        let replaced = panel.insert(second).unwrap();

        assert_eq!(replaced.score, 4.0);
        assert_eq!(panel.get(RaterRole::Culture).unwrap().score, 6.0);
        assert_eq!(panel.attached_roles(), vec![RaterRole::Culture]);
        assert!(!panel.is_complete());
    }

    #[test]
    fn test_role_serde_is_snake_case() {
        assert_eq!(
            serde_json::to_string(&RaterRole::Technical).unwrap(),
            "\"technical\""
        );
        let role: RaterRole = serde_json::from_str("\"business\"").unwrap();
        assert_eq!(role, RaterRole::Business);
    }
}
