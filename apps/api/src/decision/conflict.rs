//! Conflict detection. Decides whether the raters disagree enough to warrant
//! a negotiation round. This is the only gate in front of the negotiator.

use serde::{Deserialize, Serialize};

use crate::evaluation::record::{PanelEvaluations, RaterRole};

/// Raters disagree when the largest pairwise gap is strictly above this.
pub const SCORE_GAP_THRESHOLD: f64 = 1.5;

/// The three scores the decision core works with. Missing evaluations read as 0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RaterScores {
    pub technical: f64,
    pub culture: f64,
    pub business: f64,
}

impl RaterScores {
    pub fn new(technical: f64, culture: f64, business: f64) -> Self {
        Self {
            technical,
            culture,
            business,
        }
    }

    pub fn from_panel(panel: &PanelEvaluations) -> Self {
        let score = |role| panel.get(role).map(|e| e.score).unwrap_or(0.0);
        Self {
            technical: score(RaterRole::Technical),
            culture: score(RaterRole::Culture),
            business: score(RaterRole::Business),
        }
    }

    pub fn get(&self, role: RaterRole) -> f64 {
        match role {
            RaterRole::Technical => self.technical,
            RaterRole::Culture => self.culture,
            RaterRole::Business => self.business,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConflictReport {
    pub gap: f64,
    pub conflict: bool,
}

/// Maximum pairwise absolute difference among the three scores.
pub fn score_gap(technical: f64, culture: f64, business: f64) -> f64 {
    (technical - culture)
        .abs()
        .max((culture - business).abs())
        .max((technical - business).abs())
}

pub fn is_conflict(gap: f64) -> bool {
    gap > SCORE_GAP_THRESHOLD
}

pub fn detect_conflict(scores: &RaterScores) -> ConflictReport {
    let gap = score_gap(scores.technical, scores.culture, scores.business);
    ConflictReport {
        gap,
        conflict: is_conflict(gap),
    }
}
