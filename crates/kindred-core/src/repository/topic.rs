//! Topic repository trait definition.

use kindred_types::error::RepositoryError;
use kindred_types::topic::TopicData;

/// Persistence for topic graph nodes and their relations.
pub trait TopicRepository: Send + Sync {
    fn load_topic(
        &self,
        id: &str,
    ) -> impl std::future::Future<Output = Result<Option<TopicData>, RepositoryError>> + Send;

    /// Insert or replace a topic snapshot.
    fn save_topic(
        &self,
        data: &TopicData,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Topics related to `topic` with strength at or above `min_strength`,
    /// strongest first.
    fn query_related_topics(
        &self,
        topic: &str,
        min_strength: f64,
    ) -> impl std::future::Future<Output = Result<Vec<(String, f64)>, RepositoryError>> + Send;
}
