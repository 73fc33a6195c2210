//! SQLite memory event repository.
//!
//! Events are stored whole as JSON next to a few denormalized columns
//! (kind, content, importance) for inspection and ordering.

use kindred_core::repository::MemoryEventRepository;
use kindred_types::error::RepositoryError;
use kindred_types::timeline::MemoryEvent;
use sqlx::Row;

use super::pool::DatabasePool;
use super::{format_datetime, from_json, to_json};

pub struct SqliteMemoryEventRepository {
    pool: DatabasePool,
}

impl SqliteMemoryEventRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    /// Number of stored events for a user.
    pub async fn count_memory_events(&self, user_id: &str) -> Result<u64, RepositoryError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM memory_events WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;
        let n: i64 = row
            .try_get("n")
            .map_err(|e| RepositoryError::Query(e.to_string()))?;
        Ok(n.max(0) as u64)
    }
}

impl MemoryEventRepository for SqliteMemoryEventRepository {
    async fn append_memory_event(
        &self,
        user_id: &str,
        event: &MemoryEvent,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO memory_events (id, user_id, kind, content, importance, event, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                importance = excluded.importance,
                event = excluded.event",
        )
        .bind(event.id.to_string())
        .bind(user_id)
        .bind(event.event_type.to_string())
        .bind(&event.content)
        .bind(event.importance)
        .bind(to_json(event)?)
        .bind(format_datetime(&event.timestamp))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }

    async fn list_memory_events(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<MemoryEvent>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT event FROM memory_events WHERE user_id = ?
             ORDER BY created_at DESC, id DESC LIMIT ?",
        )
        .bind(user_id)
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut events = Vec::with_capacity(rows.len());
        for row in &rows {
            let json: String = row
                .try_get("event")
                .map_err(|e| RepositoryError::Query(e.to_string()))?;
            events.push(from_json(&json, "memory event")?);
        }
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::test_support::temp_pool;
    use chrono::{Duration, Utc};
    use kindred_types::timeline::{EventContext, EventType};
    use std::collections::BTreeMap;
    use uuid::Uuid;

    fn event(content: &str, minutes_ago: i64) -> MemoryEvent {
        MemoryEvent {
            id: Uuid::now_v7(),
            event_type: EventType::Emotional,
            content: content.to_string(),
            timestamp: Utc::now() - Duration::minutes(minutes_ago),
            importance: 0.8,
            emotions: BTreeMap::from([("trust".to_string(), 0.4)]),
            tags: vec!["support".to_string()],
            related_ids: Vec::new(),
            context: EventContext {
                participants: vec!["alex".to_string()],
                mood: Some("protective".to_string()),
                topics: vec!["emotional".to_string()],
            },
            recall_count: 0,
            last_recalled: None,
        }
    }

    #[tokio::test]
    async fn test_append_and_list_newest_first() {
        let (_dir, pool) = temp_pool().await;
        let repo = SqliteMemoryEventRepository::new(pool);

        let old = event("rough week at work", 90);
        let new = event("got the promotion", 5);
        repo.append_memory_event("alex", &old).await.unwrap();
        repo.append_memory_event("alex", &new).await.unwrap();
        repo.append_memory_event("sam", &event("unrelated", 1)).await.unwrap();

        let events = repo.list_memory_events("alex", 10).await.unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].id, new.id);
        assert_eq!(events[1], old);

        let limited = repo.list_memory_events("alex", 1).await.unwrap();
        assert_eq!(limited.len(), 1);
        assert_eq!(repo.count_memory_events("sam").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_append_updates_recall_bookkeeping() {
        let (_dir, pool) = temp_pool().await;
        let repo = SqliteMemoryEventRepository::new(pool);

        let mut ev = event("first date anniversary", 10);
        repo.append_memory_event("alex", &ev).await.unwrap();

        ev.recall_count = 2;
        ev.last_recalled = Some(Utc::now());
        repo.append_memory_event("alex", &ev).await.unwrap();

        let events = repo.list_memory_events("alex", 10).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].recall_count, 2);
        assert!(events[0].last_recalled.is_some());
    }
}
