//! Memory event repository trait definition.

use kindred_types::error::RepositoryError;
use kindred_types::timeline::MemoryEvent;

/// Append-mostly store of timeline events, partitioned by user.
pub trait MemoryEventRepository: Send + Sync {
    /// Insert an event, or update its recall bookkeeping if it already exists.
    fn append_memory_event(
        &self,
        user_id: &str,
        event: &MemoryEvent,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Events of a user, newest first.
    fn list_memory_events(
        &self,
        user_id: &str,
        limit: usize,
    ) -> impl std::future::Future<Output = Result<Vec<MemoryEvent>, RepositoryError>> + Send;
}
