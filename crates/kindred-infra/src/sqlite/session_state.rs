//! SQLite session state repository.
//!
//! Stores the latest merged `SessionState` per session as a JSON document,
//! keyed by session id and indexed by user for continuation lookups.

use chrono::Utc;
use kindred_core::repository::SessionStateRepository;
use kindred_types::error::RepositoryError;
use kindred_types::session::{SessionId, SessionState};
use sqlx::Row;

use super::pool::DatabasePool;
use super::{format_datetime, from_json, to_json};

pub struct SqliteStateRepository {
    pool: DatabasePool,
}

impl SqliteStateRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

impl SessionStateRepository for SqliteStateRepository {
    async fn load_session_state(
        &self,
        id: &SessionId,
    ) -> Result<Option<SessionState>, RepositoryError> {
        let row = sqlx::query("SELECT state FROM session_states WHERE session_id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let state: String = row
                    .try_get("state")
                    .map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(from_json(&state, "session state")?))
            }
            None => Ok(None),
        }
    }

    async fn save_session_state(
        &self,
        id: &SessionId,
        user_id: &str,
        state: &SessionState,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO session_states (session_id, user_id, state, updated_at)
             VALUES (?, ?, ?, ?)
             ON CONFLICT(session_id) DO UPDATE SET
                user_id = excluded.user_id,
                state = excluded.state,
                updated_at = excluded.updated_at",
        )
        .bind(id.to_string())
        .bind(user_id)
        .bind(to_json(state)?)
        .bind(format_datetime(&Utc::now()))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }

    async fn latest_session_for_user(
        &self,
        user_id: &str,
    ) -> Result<Option<SessionId>, RepositoryError> {
        let row = sqlx::query(
            "SELECT session_id FROM session_states WHERE user_id = ?
             ORDER BY updated_at DESC LIMIT 1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let id: String = row
                    .try_get("session_id")
                    .map_err(|e| RepositoryError::Query(e.to_string()))?;
                id.parse::<SessionId>()
                    .map(Some)
                    .map_err(|e| RepositoryError::Query(format!("invalid session id: {e}")))
            }
            None => Ok(None),
        }
    }
}
