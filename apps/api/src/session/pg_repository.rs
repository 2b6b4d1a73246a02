use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::session::model::Session;
use crate::session::repository::{RepositoryError, RepositoryResult, SessionRepository};

/// Postgres backend. One row per round; the full session is kept as a JSONB
/// snapshot next to the columns needed for lookups and CAS.
#[derive(Clone)]
pub struct PgSessionRepository {
    pool: PgPool,
}

#[derive(Debug, sqlx::FromRow)]
struct SessionRow {
    version: i64,
    snapshot: serde_json::Value,
}

impl SessionRow {
    fn into_session(self) -> RepositoryResult<Session> {
        let mut session: Session = serde_json::from_value(self.snapshot)?;
        // The column is authoritative; the snapshot may lag by one bump.
        session.version = u64::try_from(self.version).unwrap_or_default();
        Ok(session)
    }
}

impl PgSessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the sessions table if it does not exist yet.
    pub async fn ensure_schema(&self) -> RepositoryResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS candidate_sessions (
                candidate_id UUID        NOT NULL,
                round        INTEGER     NOT NULL,
                version      BIGINT      NOT NULL,
                state        TEXT        NOT NULL,
                snapshot     JSONB       NOT NULL,
                created_at   TIMESTAMPTZ NOT NULL DEFAULT now(),
                updated_at   TIMESTAMPTZ NOT NULL DEFAULT now(),
                PRIMARY KEY (candidate_id, round)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        info!("candidate_sessions table ready");
        Ok(())
    }

    async fn current_version(&self, candidate_id: Uuid, round: i32) -> RepositoryResult<Option<i64>> {
        Ok(sqlx::query_scalar(
            "SELECT version FROM candidate_sessions WHERE candidate_id = $1 AND round = $2",
        )
        .bind(candidate_id)
        .bind(round)
        .fetch_optional(&self.pool)
        .await?)
    }
}

fn round_column(session: &Session) -> i32 {
    i32::try_from(session.round).unwrap_or(i32::MAX)
}

fn version_column(version: u64) -> i64 {
    i64::try_from(version).unwrap_or(i64::MAX)
}

#[async_trait]
impl SessionRepository for PgSessionRepository {
    async fn get(&self, candidate_id: Uuid) -> RepositoryResult<Session> {
        let row: Option<SessionRow> = sqlx::query_as(
            r#"
            SELECT version, snapshot FROM candidate_sessions
            WHERE candidate_id = $1
            ORDER BY round DESC
            LIMIT 1
            "#,
        )
        .bind(candidate_id)
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or(RepositoryError::NotFound(candidate_id))?
            .into_session()
    }

    async fn put(&self, session: &Session) -> RepositoryResult<()> {
        let snapshot = serde_json::to_value(session)?;
        let result = sqlx::query(
            r#"
            INSERT INTO candidate_sessions (candidate_id, round, version, state, snapshot)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (candidate_id, round) DO NOTHING
            "#,
        )
        .bind(session.candidate_id())
        .bind(round_column(session))
        .bind(version_column(session.version))
        .bind(session.state.as_str())
        .bind(snapshot)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::AlreadyExists {
                candidate_id: session.candidate_id(),
                round: session.round,
            });
        }
        Ok(())
    }

    async fn compare_and_swap(
        &self,
        expected_version: u64,
        session: &Session,
    ) -> RepositoryResult<Session> {
        let mut next = session.clone();
        next.version = expected_version + 1;
        let snapshot = serde_json::to_value(&next)?;

        let result = sqlx::query(
            r#"
            UPDATE candidate_sessions
            SET version = $4, state = $5, snapshot = $6, updated_at = now()
            WHERE candidate_id = $1 AND round = $2 AND version = $3
            "#,
        )
        .bind(session.candidate_id())
        .bind(round_column(session))
        .bind(version_column(expected_version))
        .bind(version_column(next.version))
        .bind(next.state.as_str())
        .bind(snapshot)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return match self
                .current_version(session.candidate_id(), round_column(session))
                .await?
            {
                None => Err(RepositoryError::NotFound(session.candidate_id())),
                Some(actual) => Err(RepositoryError::VersionConflict {
                    expected: expected_version,
                    actual: u64::try_from(actual).unwrap_or_default(),
                }),
            };
        }
        Ok(next)
    }

    async fn history(&self, candidate_id: Uuid) -> RepositoryResult<Vec<Session>> {
        let rows: Vec<SessionRow> = sqlx::query_as(
            r#"
            SELECT version, snapshot FROM candidate_sessions
            WHERE candidate_id = $1
            ORDER BY round ASC
            "#,
        )
        .bind(candidate_id)
        .fetch_all(&self.pool)
        .await?;

        if rows.is_empty() {
            return Err(RepositoryError::NotFound(candidate_id));
        }
        rows.into_iter().map(SessionRow::into_session).collect()
    }
}
