//! Session state repository trait definition.

use kindred_types::error::RepositoryError;
use kindred_types::session::{SessionId, SessionState};

/// Persistence for the merged per-session state.
///
/// Only the latest state per session is kept; checkpoints stay in memory.
pub trait SessionStateRepository: Send + Sync {
    /// Load the last saved state of a session.
    fn load_session_state(
        &self,
        id: &SessionId,
    ) -> impl std::future::Future<Output = Result<Option<SessionState>, RepositoryError>> + Send;

    /// Insert or replace the state of a session.
    fn save_session_state(
        &self,
        id: &SessionId,
        user_id: &str,
        state: &SessionState,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Most recently updated session of a user, used for continuation.
    fn latest_session_for_user(
        &self,
        user_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<SessionId>, RepositoryError>> + Send;
}
