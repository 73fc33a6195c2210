//! SQLite storage layer.
//!
//! Repository implementations backed by SQLite with WAL mode and split
//! read/write connection pools.

pub mod memory_event;
pub mod pool;
pub mod session_state;
pub mod topic;

use chrono::{DateTime, SecondsFormat, Utc};
use kindred_types::error::RepositoryError;

pub use memory_event::SqliteMemoryEventRepository;
pub use pool::DatabasePool;
pub use session_state::SqliteStateRepository;
pub use topic::SqliteTopicRepository;

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

/// Fixed-width RFC 3339 so that `ORDER BY` on the text column is chronological.
fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, RepositoryError> {
    serde_json::to_string(value)
        .map_err(|e| RepositoryError::Query(format!("failed to encode JSON: {e}")))
}

fn from_json<T: serde::de::DeserializeOwned>(s: &str, what: &str) -> Result<T, RepositoryError> {
    serde_json::from_str(s).map_err(|e| RepositoryError::Query(format!("invalid {what} JSON: {e}")))
}
