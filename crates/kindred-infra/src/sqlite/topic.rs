//! SQLite topic repository.
//!
//! One row per topic node. Relations live in a JSON object on each node; a
//! relation may have been written from either side, so related-topic queries
//! look at both the node's own object and every object that names it.

use std::collections::BTreeMap;

use kindred_core::repository::TopicRepository;
use kindred_types::error::RepositoryError;
use kindred_types::topic::TopicData;
use sqlx::Row;

use super::pool::DatabasePool;
use super::{format_datetime, from_json, parse_datetime, to_json};

pub struct SqliteTopicRepository {
    pool: DatabasePool,
}

impl SqliteTopicRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    /// Every stored topic, most frequent first. Used to warm the topic graph.
    pub async fn list_topics(&self, limit: usize) -> Result<Vec<TopicData>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM topics ORDER BY frequency DESC, id ASC LIMIT ?")
            .bind(limit as i64)
            .fetch_all(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        rows.iter()
            .map(|row| {
                TopicRow::from_row(row)
                    .map_err(|e| RepositoryError::Query(e.to_string()))?
                    .into_topic()
            })
            .collect()
    }
}

struct TopicRow {
    id: String,
    domain: String,
    keywords: String,
    contexts: String,
    relations: String,
    mood_patterns: String,
    last_seen: String,
    frequency: i64,
    metadata: String,
}

impl TopicRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            domain: row.try_get("domain")?,
            keywords: row.try_get("keywords")?,
            contexts: row.try_get("contexts")?,
            relations: row.try_get("relations")?,
            mood_patterns: row.try_get("mood_patterns")?,
            last_seen: row.try_get("last_seen")?,
            frequency: row.try_get("frequency")?,
            metadata: row.try_get("metadata")?,
        })
    }

    fn into_topic(self) -> Result<TopicData, RepositoryError> {
        Ok(TopicData {
            keywords: from_json(&self.keywords, "keywords")?,
            contexts: from_json(&self.contexts, "contexts")?,
            relations: from_json::<BTreeMap<String, f64>>(&self.relations, "relations")?,
            mood_patterns: from_json(&self.mood_patterns, "mood patterns")?,
            last_seen: parse_datetime(&self.last_seen)?,
            frequency: self.frequency.max(0) as u64,
            metadata: from_json(&self.metadata, "metadata")?,
            id: self.id,
            domain: self.domain,
        })
    }
}

impl TopicRepository for SqliteTopicRepository {
    async fn load_topic(&self, id: &str) -> Result<Option<TopicData>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM topics WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let row =
                    TopicRow::from_row(&row).map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(row.into_topic()?))
            }
            None => Ok(None),
        }
    }

    async fn save_topic(&self, data: &TopicData) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO topics (id, domain, keywords, contexts, relations, mood_patterns, last_seen, frequency, metadata)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                domain = excluded.domain,
                keywords = excluded.keywords,
                contexts = excluded.contexts,
                relations = excluded.relations,
                mood_patterns = excluded.mood_patterns,
                last_seen = excluded.last_seen,
                frequency = excluded.frequency,
                metadata = excluded.metadata",
        )
        .bind(&data.id)
        .bind(&data.domain)
        .bind(to_json(&data.keywords)?)
        .bind(to_json(&data.contexts)?)
        .bind(to_json(&data.relations)?)
        .bind(to_json(&data.mood_patterns)?)
        .bind(format_datetime(&data.last_seen))
        .bind(i64::try_from(data.frequency).unwrap_or(i64::MAX))
        .bind(to_json(&data.metadata)?)
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }

    async fn query_related_topics(
        &self,
        topic: &str,
        min_strength: f64,
    ) -> Result<Vec<(String, f64)>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT other, MAX(strength) AS strength FROM (
                SELECT j.key AS other, CAST(j.value AS REAL) AS strength
                FROM topics t, json_each(t.relations) j
                WHERE t.id = ?
                UNION ALL
                SELECT t.id AS other, CAST(j.value AS REAL) AS strength
                FROM topics t, json_each(t.relations) j
                WHERE j.key = ? AND t.id != ?
             )
             GROUP BY other
             HAVING MAX(strength) >= ?
             ORDER BY strength DESC, other ASC",
        )
        .bind(topic)
        .bind(topic)
        .bind(topic)
        .bind(min_strength)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        rows.iter()
            .map(|row| {
                let other: String = row
                    .try_get("other")
                    .map_err(|e| RepositoryError::Query(e.to_string()))?;
                let strength: f64 = row
                    .try_get("strength")
                    .map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok((other, strength))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::test_support::temp_pool;
    use chrono::{DateTime, Utc};

    fn topic(id: &str, relations: &[(&str, f64)], frequency: u64, now: DateTime<Utc>) -> TopicData {
        TopicData {
            id: id.to_string(),
            domain: id.to_string(),
            keywords: vec![format!("{id}-kw")],
            contexts: Vec::new(),
            relations: relations.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
            mood_patterns: BTreeMap::from([("playful".to_string(), 0.6)]),
            last_seen: now,
            frequency,
            metadata: BTreeMap::new(),
        }
    }

    #[tokio::test]
    async fn test_save_and_load_topic() {
        let (_dir, pool) = temp_pool().await;
        let repo = SqliteTopicRepository::new(pool);
        let now = Utc::now();

        assert!(repo.load_topic("tech").await.unwrap().is_none());
        repo.save_topic(&topic("tech", &[("gaming", 0.7)], 4, now))
            .await
            .unwrap();

        let loaded = repo.load_topic("tech").await.unwrap().unwrap();
        assert_eq!(loaded.frequency, 4);
        assert_eq!(loaded.keywords, vec!["tech-kw"]);
        assert_eq!(loaded.relations.get("gaming"), Some(&0.7));
        assert_eq!(loaded.mood_patterns.get("playful"), Some(&0.6));
        assert_eq!(loaded.last_seen.timestamp_micros(), now.timestamp_micros());
    }

    #[tokio::test]
    async fn test_save_topic_upserts() {
        let (_dir, pool) = temp_pool().await;
        let repo = SqliteTopicRepository::new(pool);
        let now = Utc::now();

        repo.save_topic(&topic("art", &[], 1, now)).await.unwrap();
        repo.save_topic(&topic("art", &[("emotional", 0.6)], 2, now))
            .await
            .unwrap();

        let loaded = repo.load_topic("art").await.unwrap().unwrap();
        assert_eq!(loaded.frequency, 2);
        assert_eq!(loaded.relations.len(), 1);
    }

    #[tokio::test]
    async fn test_related_topics_seen_from_both_sides() {
        let (_dir, pool) = temp_pool().await;
        let repo = SqliteTopicRepository::new(pool);
        let now = Utc::now();

        repo.save_topic(&topic("tech", &[("science", 0.8), ("art", 0.2)], 3, now))
            .await
            .unwrap();
        repo.save_topic(&topic("gaming", &[("tech", 0.7)], 1, now))
            .await
            .unwrap();
        repo.save_topic(&topic("science", &[("tech", 0.5)], 1, now))
            .await
            .unwrap();

        let related = repo.query_related_topics("tech", 0.5).await.unwrap();
        assert_eq!(
            related,
            vec![("science".to_string(), 0.8), ("gaming".to_string(), 0.7)]
        );

        let from_gaming = repo.query_related_topics("gaming", 0.0).await.unwrap();
        assert_eq!(from_gaming, vec![("tech".to_string(), 0.7)]);

        assert!(repo.query_related_topics("unknown", 0.0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_topics_by_frequency() {
        let (_dir, pool) = temp_pool().await;
        let repo = SqliteTopicRepository::new(pool);
        let now = Utc::now();

        repo.save_topic(&topic("art", &[], 1, now)).await.unwrap();
        repo.save_topic(&topic("tech", &[], 5, now)).await.unwrap();
        repo.save_topic(&topic("gaming", &[], 3, now)).await.unwrap();

        let ids: Vec<String> = repo
            .list_topics(2)
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ids, vec!["tech", "gaming"]);
    }
}
