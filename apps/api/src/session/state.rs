use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle of one evaluation round.
///
/// `Created → Evaluating → (Negotiating) → Decided`. `Decided` is terminal for
/// the round; a re-evaluation opens a new round instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Created,
    Evaluating,
    Negotiating,
    Decided,
}

impl SessionState {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionState::Created => "created",
            SessionState::Evaluating => "evaluating",
            SessionState::Negotiating => "negotiating",
            SessionState::Decided => "decided",
        }
    }

    pub fn is_terminal(self) -> bool {
        self == SessionState::Decided
    }

    /// Structural legality of an edge. Guards that depend on session data
    /// (all three evaluations present, conflict detected) live on `Session`.
    pub fn can_transition_to(self, next: SessionState) -> bool {
        use SessionState::*;
        matches!(
            (self, next),
            (Created, Evaluating)
                | (Evaluating, Negotiating)
                | (Evaluating, Decided)
                | (Negotiating, Decided)
        )
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateTransition {
    pub from: SessionState,
    pub to: SessionState,
    pub at: DateTime<Utc>,
}
