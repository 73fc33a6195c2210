//! Database pool with split reader/writer connections in WAL mode.
//!
//! SQLite allows a single writer at a time, so writes go through a
//! one-connection pool while reads fan out over a larger read-only pool.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

const READER_CONNECTIONS: u32 = 8;
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Split read/write pool for the Kindred database.
#[derive(Clone)]
pub struct DatabasePool {
    pub reader: SqlitePool,
    pub writer: SqlitePool,
}

impl DatabasePool {
    /// Connect to `database_url` and apply pending migrations.
    ///
    /// Migrations run on the writer before the reader pool is opened, so
    /// readers never observe a half-migrated schema.
    pub async fn new(database_url: &str) -> Result<Self, sqlx::Error> {
        let base = SqliteConnectOptions::from_str(database_url)?
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true)
            .busy_timeout(BUSY_TIMEOUT)
            .create_if_missing(true);

        let writer = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(base.clone())
            .await?;

        sqlx::migrate!("../../migrations").run(&writer).await?;

        let reader = SqlitePoolOptions::new()
            .max_connections(READER_CONNECTIONS)
            .connect_with(base.read_only(true))
            .await?;

        Ok(Self { reader, writer })
    }

    /// Open `kindred.db` inside `data_dir`.
    pub async fn open(data_dir: &Path) -> Result<Self, sqlx::Error> {
        Self::new(&database_url(data_dir)).await
    }
}

pub fn database_url(data_dir: &Path) -> String {
    format!("sqlite://{}", data_dir.join("kindred.db").display())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::test_support::temp_pool;

    #[tokio::test]
    async fn test_pool_creates_tables() {
        let (_dir, pool) = temp_pool().await;

        let tables: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' AND name != '_sqlx_migrations' ORDER BY name",
        )
        .fetch_all(&pool.reader)
        .await
        .unwrap();

        let names: Vec<&str> = tables.iter().map(|t| t.0.as_str()).collect();
        assert_eq!(names, vec!["memory_events", "session_states", "topics"]);
    }

    #[tokio::test]
    async fn test_pool_wal_mode_and_foreign_keys() {
        let (_dir, pool) = temp_pool().await;

        let mode: (String,) = sqlx::query_as("PRAGMA journal_mode")
            .fetch_one(&pool.writer)
            .await
            .unwrap();
        assert_eq!(mode.0.to_lowercase(), "wal");

        let fk: (i32,) = sqlx::query_as("PRAGMA foreign_keys")
            .fetch_one(&pool.writer)
            .await
            .unwrap();
        assert_eq!(fk.0, 1);
    }

    #[tokio::test]
    async fn test_reader_is_read_only() {
        let (_dir, pool) = temp_pool().await;
        let result = sqlx::query(
            "INSERT INTO topics (id, domain, last_seen) VALUES ('x', 'x', '2026-01-01T00:00:00Z')",
        )
        .execute(&pool.reader)
        .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_open_uses_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let pool = DatabasePool::open(dir.path()).await.unwrap();
        drop(pool);
        assert!(dir.path().join("kindred.db").exists());
    }

    #[test]
    fn test_database_url() {
        let url = database_url(Path::new("/tmp/kd"));
        assert_eq!(url, "sqlite:///tmp/kd/kindred.db");
    }
}
