//! Session persistence.
//!
//! Each round is stored as an independent snapshot keyed by
//! `(candidate_id, round)`. Writers update the latest round with
//! compare-and-swap on `version`; a stale version is rejected, never merged.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::session::model::Session;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("no session for candidate {0}")]
    NotFound(Uuid),

    #[error("round {round} already exists for candidate {candidate_id}")]
    AlreadyExists { candidate_id: Uuid, round: u32 },

    #[error("version conflict: expected {expected}, found {actual}")]
    VersionConflict { expected: u64, actual: u64 },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("snapshot serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Latest round for the candidate.
    async fn get(&self, candidate_id: Uuid) -> RepositoryResult<Session>;

    /// Stores a new round snapshot. Fails with `AlreadyExists` if the round is taken.
    async fn put(&self, session: &Session) -> RepositoryResult<()>;

    /// Replaces the stored round if its version still equals `expected_version`.
    /// Returns the stored snapshot with its version bumped.
    async fn compare_and_swap(
        &self,
        expected_version: u64,
        session: &Session,
    ) -> RepositoryResult<Session>;

    /// Every round for the candidate, oldest first.
    async fn history(&self, candidate_id: Uuid) -> RepositoryResult<Vec<Session>>;
}

// ────────────────────────────────────────────────────────────────────────────
// In-memory backend
// ────────────────────────────────────────────────────────────────────────────

/// Default backend when no database is configured. Rounds per candidate are
/// kept in ascending order.
#[derive(Debug, Default)]
pub struct MemorySessionRepository {
    sessions: RwLock<HashMap<Uuid, Vec<Session>>>,
}

impl MemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionRepository for MemorySessionRepository {
    async fn get(&self, candidate_id: Uuid) -> RepositoryResult<Session> {
        let sessions = self.sessions.read().await;
        sessions
            .get(&candidate_id)
            .and_then(|rounds| rounds.last())
            .cloned()
            .ok_or(RepositoryError::NotFound(candidate_id))
    }

    async fn put(&self, session: &Session) -> RepositoryResult<()> {
        let mut sessions = self.sessions.write().await;
        let rounds = sessions.entry(session.candidate_id()).or_default();
        if rounds.iter().any(|s| s.round == session.round) {
            return Err(RepositoryError::AlreadyExists {
                candidate_id: session.candidate_id(),
                round: session.round,
            });
        }
        rounds.push(session.clone());
        rounds.sort_by_key(|s| s.round);
        Ok(())
    }

    async fn compare_and_swap(
        &self,
        expected_version: u64,
        session: &Session,
    ) -> RepositoryResult<Session> {
        let mut sessions = self.sessions.write().await;
        let stored = sessions
            .get_mut(&session.candidate_id())
            .and_then(|rounds| rounds.iter_mut().find(|s| s.round == session.round))
            .ok_or(RepositoryError::NotFound(session.candidate_id()))?;

        if stored.version != expected_version {
            return Err(RepositoryError::VersionConflict {
                expected: expected_version,
                actual: stored.version,
            });
        }

        let mut next = session.clone();
        next.version = expected_version + 1;
        *stored = next.clone();
        Ok(next)
    }

    async fn history(&self, candidate_id: Uuid) -> RepositoryResult<Vec<Session>> {
        let sessions = self.sessions.read().await;
        sessions
            .get(&candidate_id)
            .filter(|rounds| !rounds.is_empty())
            .cloned()
            .ok_or(RepositoryError::NotFound(candidate_id))
    }
}
