//! Application state wiring the coordinator to the SQLite repositories.

use std::path::PathBuf;
use std::sync::Arc;

use kindred_core::session::SessionCoordinator;
use kindred_infra::config::{load_config, resolve_data_dir};
use kindred_infra::sqlite::{
    DatabasePool, SqliteMemoryEventRepository, SqliteStateRepository, SqliteTopicRepository,
};
use tracing::{debug, warn};

/// Persisted topics loaded into the shared graph at startup.
const GRAPH_WARMUP_LIMIT: usize = 500;

pub type ConcreteCoordinator =
    SessionCoordinator<SqliteStateRepository, SqliteTopicRepository, SqliteMemoryEventRepository>;

#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<ConcreteCoordinator>,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Connect to the database, load `config.toml` and warm the topic graph.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();
        tokio::fs::create_dir_all(&data_dir).await?;

        let db_pool = DatabasePool::open(&data_dir).await?;
        let config = load_config(&data_dir).await;

        let topic_repo = SqliteTopicRepository::new(db_pool.clone());
        let warm = topic_repo
            .list_topics(GRAPH_WARMUP_LIMIT)
            .await
            .unwrap_or_else(|e| {
                warn!(error = %e, "Failed to load persisted topics, starting with an empty graph");
                Vec::new()
            });

        let coordinator = SessionCoordinator::new(
            config,
            SqliteStateRepository::new(db_pool.clone()),
            topic_repo,
            SqliteMemoryEventRepository::new(db_pool.clone()),
        );
        for topic in &warm {
            coordinator.graph().hydrate(topic);
        }
        debug!(topics = warm.len(), data_dir = %data_dir.display(), "Application state ready");

        Ok(Self {
            coordinator: Arc::new(coordinator),
            data_dir,
        })
    }
}
