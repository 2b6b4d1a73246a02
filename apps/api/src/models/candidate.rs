use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A candidate as captured at intake. Immutable once registered; every
/// evaluation round snapshots it alongside its evaluations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub cv_text: String,
    pub role_applying: String,
    pub uploaded_at: DateTime<Utc>,
}

impl Candidate {
    pub fn new(name: String, email: String, cv_text: String, role_applying: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            email,
            cv_text,
            role_applying,
            uploaded_at: Utc::now(),
        }
    }
}
