//! Timeline memory: event store, recall ranking, markers and the
//! per-user relationship ledger.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use kindred_types::config::TimelineConfig;
use kindred_types::timeline::{
    MemoryEvent, MemoryEventDraft, RecallQuery, Recurrence, RelationshipMemory, ScoredMemory,
    TimelineMarker,
};
use tracing::debug;
use uuid::Uuid;

use super::importance::{
    age_hours, calculate_importance, derive_marker, intimacy_impact, trust_impact,
};

/// Hours over which recall recency decays (thirty days).
const RECALL_DECAY_HOURS: f64 = 720.0;

/// Result of storing one event.
#[derive(Debug, Clone)]
pub struct StoredEvent {
    pub event: MemoryEvent,
    pub marker: Option<TimelineMarker>,
}

#[derive(Debug, Clone, Default)]
pub struct TimelineMemory {
    config: TimelineConfig,
    events: Vec<MemoryEvent>,
    markers: Vec<TimelineMarker>,
    relationships: BTreeMap<String, RelationshipMemory>,
}

impl TimelineMemory {
    pub fn new(config: TimelineConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn config(&self) -> &TimelineConfig {
        &self.config
    }

    pub fn events(&self) -> &[MemoryEvent] {
        &self.events
    }

    pub fn markers(&self) -> &[TimelineMarker] {
        &self.markers
    }

    pub fn relationship(&self, user_id: &str) -> Option<&RelationshipMemory> {
        self.relationships.get(user_id)
    }

    /// Load a previously persisted event. Importance is kept as stored;
    /// the marker, which is not persisted, is derived again.
    pub fn hydrate(&mut self, event: MemoryEvent) {
        if self.events.iter().any(|e| e.id == event.id) {
            return;
        }
        if let Some(marker) = derive_marker(&event, self.config.significance_threshold) {
            self.markers.push(marker);
        }
        self.events.push(event);
        self.enforce_capacity();
    }

    /// Seed the ledger for a user, e.g. from a persisted session state.
    pub fn hydrate_relationship(&mut self, relationship: RelationshipMemory) {
        self.relationships
            .insert(relationship.user_id.clone(), relationship);
    }

    /// Store an event, filling in id and importance, deriving a marker and
    /// updating the ledger of every participant.
    pub fn store_event(&mut self, draft: MemoryEventDraft, now: DateTime<Utc>) -> StoredEvent {
        let importance = draft
            .importance
            .filter(|i| *i > 0.0)
            .unwrap_or_else(|| {
                calculate_importance(draft.event_type, &draft.emotions, draft.timestamp, now)
            })
            .clamp(0.0, 1.0);

        let event = MemoryEvent {
            id: draft.id.unwrap_or_else(Uuid::now_v7),
            event_type: draft.event_type,
            content: draft.content,
            timestamp: draft.timestamp,
            importance,
            emotions: draft.emotions,
            tags: draft.tags,
            related_ids: draft.related_ids,
            context: draft.context,
            recall_count: 0,
            last_recalled: None,
        };

        let marker = derive_marker(&event, self.config.significance_threshold);
        if let Some(marker) = &marker {
            debug!(event_id = %event.id, kind = %marker.kind, "Timeline marker created");
            self.markers.push(marker.clone());
        }

        for participant in event.context.participants.clone() {
            self.apply_to_relationship(&participant, &event, marker.as_ref());
        }

        self.events.push(event.clone());
        self.enforce_capacity();
        StoredEvent { event, marker }
    }

    /// Evict the least important events, oldest first on ties, together with
    /// their markers until at most `max_events` remain.
    fn enforce_capacity(&mut self) {
        while self.events.len() > self.config.max_events {
            let Some(victim) = self
                .events
                .iter()
                .enumerate()
                .min_by(|(_, a), (_, b)| {
                    a.importance
                        .total_cmp(&b.importance)
                        .then(a.timestamp.cmp(&b.timestamp))
                })
                .map(|(index, _)| index)
            else {
                return;
            };
            let evicted = self.events.remove(victim);
            self.markers.retain(|m| m.event_id != evicted.id);
            debug!(event_id = %evicted.id, importance = evicted.importance, "Timeline event evicted");
        }
    }

    /// Apply an interaction to a user's ledger without storing an event.
    pub fn update_relationship(
        &mut self,
        user_id: &str,
        interaction: &MemoryEvent,
    ) -> RelationshipMemory {
        self.apply_to_relationship(user_id, interaction, None)
    }

    fn apply_to_relationship(
        &mut self,
        user_id: &str,
        event: &MemoryEvent,
        marker: Option<&TimelineMarker>,
    ) -> RelationshipMemory {
        let rel = self
            .relationships
            .entry(user_id.to_string())
            .or_insert_with(|| RelationshipMemory::new(user_id, event.timestamp));

        rel.trust = (rel.trust + trust_impact(event.event_type, &event.emotions)).clamp(0.0, 1.0);
        rel.intimacy =
            (rel.intimacy + intimacy_impact(event.event_type, &event.emotions)).clamp(0.0, 1.0);
        if event.timestamp > rel.last_interaction {
            rel.last_interaction = event.timestamp;
        }
        rel.shared_topics
            .extend(event.context.topics.iter().cloned());
        if !rel.event_ids.contains(&event.id) {
            rel.event_ids.push(event.id);
        }
        if let Some(marker) = marker {
            rel.milestone_ids.push(marker.id);
        }
        rel.clone()
    }

    /// Score every stored event against `query` without side effects.
    pub fn score_memories(&self, query: &RecallQuery, now: DateTime<Utc>) -> Vec<ScoredMemory> {
        self.events
            .iter()
            .map(|event| {
                let relevance = relevance(event, query);
                let recency = (-age_hours(event.timestamp, now) / RECALL_DECAY_HOURS).exp();
                let emotion = query
                    .mood
                    .as_ref()
                    .and_then(|mood| event.emotions.get(mood))
                    .copied()
                    .unwrap_or(0.0)
                    .clamp(0.0, 1.0);
                let score =
                    relevance * 0.4 + recency * 0.3 + emotion * 0.3 + event.importance * 0.2;
                ScoredMemory {
                    event: event.clone(),
                    score,
                    relevance,
                    recency,
                    emotion,
                }
            })
            .collect()
    }

    /// Top `limit` memories by score, newer first on ties. Returned events
    /// have their recall bookkeeping updated.
    pub fn recall_memories(
        &mut self,
        query: &RecallQuery,
        limit: usize,
        now: DateTime<Utc>,
    ) -> Vec<ScoredMemory> {
        let mut scored = self.score_memories(query, now);
        scored.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| b.event.timestamp.cmp(&a.event.timestamp))
        });
        scored.truncate(limit);

        for recalled in &mut scored {
            if let Some(stored) = self.events.iter_mut().find(|e| e.id == recalled.event.id) {
                stored.recall_count += 1;
                stored.last_recalled = Some(now);
                recalled.event = stored.clone();
            }
        }
        scored
    }

    /// Yearly markers whose next anniversary falls within `window_days` of `now`.
    pub fn upcoming_anniversaries(
        &self,
        now: DateTime<Utc>,
        window_days: i64,
    ) -> Vec<TimelineMarker> {
        let today = now.date_naive();
        let horizon = today + Duration::days(window_days);
        self.markers
            .iter()
            .filter(|m| m.recurrence == Some(Recurrence::Yearly))
            .filter(|m| {
                next_anniversary(m.timestamp.date_naive(), today)
                    .is_some_and(|date| date <= horizon)
            })
            .cloned()
            .collect()
    }
}

/// Fraction of query criteria (topics, keywords, participants) the event matches.
fn relevance(event: &MemoryEvent, query: &RecallQuery) -> f64 {
    let total = query.topics.len() + query.keywords.len() + query.participants.len();
    if total == 0 {
        return 0.0;
    }
    let content = event.content.to_lowercase();
    let topics = query
        .topics
        .iter()
        .filter(|t| event.context.topics.contains(t) || event.has_tag(t))
        .count();
    let keywords = query
        .keywords
        .iter()
        .filter(|k| content.contains(&k.to_lowercase()))
        .count();
    let participants = query
        .participants
        .iter()
        .filter(|p| event.context.participants.contains(p))
        .count();
    (topics + keywords + participants) as f64 / total as f64
}

/// First anniversary of `origin` on or after `today`, skipping the origin day itself.
fn next_anniversary(origin: NaiveDate, today: NaiveDate) -> Option<NaiveDate> {
    let year = today.year().max(origin.year() + 1);
    let candidate = same_day_in(origin, year)?;
    if candidate >= today {
        Some(candidate)
    } else {
        same_day_in(origin, year + 1)
    }
}

fn same_day_in(origin: NaiveDate, year: i32) -> Option<NaiveDate> {
    // Feb 29 falls back to Feb 28 in non-leap years.
    origin
        .with_year(year)
        .or_else(|| NaiveDate::from_ymd_opt(year, origin.month(), 28))
}

#[cfg(test)]
mod tests {
    use super::*;
    use kindred_types::timeline::{EventContext, EventType, MarkerKind};

    fn draft(event_type: EventType, content: &str, at: DateTime<Utc>) -> MemoryEventDraft {
        MemoryEventDraft::new(event_type, content, at)
    }

    #[test]
    fn store_assigns_id_and_importance() {
        let now = Utc::now();
        let mut tm = TimelineMemory::new(TimelineConfig::default());
        let stored = tm.store_event(draft(EventType::Personal, "moved to Lisbon", now), now);
        assert!((stored.event.importance - 0.3).abs() < 1e-9);
        assert!(stored.marker.is_none());
        assert_eq!(tm.events().len(), 1);

        let mut explicit = draft(EventType::Personal, "kept", now);
        let id = Uuid::now_v7();
        explicit.id = Some(id);
        explicit.importance = Some(0.9);
        let stored = tm.store_event(explicit, now);
        assert_eq!(stored.event.id, id);
        assert_eq!(stored.event.importance, 0.9);
        assert_eq!(stored.marker.unwrap().kind, MarkerKind::Reminder);
    }

    #[test]
    fn participants_relationships_are_updated() {
        let now = Utc::now();
        let mut tm = TimelineMemory::new(TimelineConfig::default());
        let mut d = draft(EventType::Relationship, "first date", now);
        d.importance = Some(0.9);
        d.tags = vec!["first".to_string()];
        d.context = EventContext {
            participants: vec!["alex".to_string(), "sam".to_string()],
            mood: None,
            topics: vec!["romantic".to_string()],
        };
        let stored = tm.store_event(d, now);

        for user in ["alex", "sam"] {
            let rel = tm.relationship(user).unwrap();
            assert!((rel.trust - 0.65).abs() < 1e-9);
            assert!((rel.intimacy - 0.3).abs() < 1e-9);
            assert!(rel.shared_topics.contains("romantic"));
            assert_eq!(rel.event_ids, vec![stored.event.id]);
            assert_eq!(rel.milestone_ids.len(), 1);
        }
    }

    #[test]
    fn trust_and_intimacy_are_clamped() {
        let now = Utc::now();
        let mut tm = TimelineMemory::new(TimelineConfig::default());
        for _ in 0..20 {
            let mut d = draft(EventType::Relationship, "again", now);
            d.context.participants.push("alex".to_string());
            tm.store_event(d, now);
        }
        let rel = tm.relationship("alex").unwrap();
        assert_eq!(rel.trust, 1.0);
        assert_eq!(rel.intimacy, 1.0);
        assert_eq!(rel.event_ids.len(), 20);
    }

    #[test]
    fn equal_importance_recalls_newer_first() {
        let now = Utc::now();
        let mut tm = TimelineMemory::new(TimelineConfig::default());
        let mut older = draft(EventType::Personal, "older", now - Duration::days(10));
        older.importance = Some(0.5);
        let mut newer = draft(EventType::Personal, "newer", now - Duration::days(1));
        newer.importance = Some(0.5);
        tm.store_event(older, now);
        tm.store_event(newer, now);

        let recalled = tm.recall_memories(&RecallQuery::default(), 2, now);
        assert_eq!(recalled[0].event.content, "newer");
        assert_eq!(recalled[1].event.content, "older");
    }

    #[test]
    fn recall_prefers_relevance_and_counts_recalls() {
        let now = Utc::now();
        let mut tm = TimelineMemory::new(TimelineConfig::default());
        let mut relevant = draft(EventType::Personal, "learning rust together", now);
        relevant.importance = Some(0.3);
        relevant.context.topics.push("tech".to_string());
        relevant.emotions.insert("excited".to_string(), 0.8);
        tm.store_event(relevant, now);
        let mut other = draft(EventType::Personal, "went hiking", now);
        other.importance = Some(0.3);
        tm.store_event(other, now);

        let query = RecallQuery {
            topics: vec!["tech".to_string()],
            keywords: vec!["rust".to_string()],
            participants: Vec::new(),
            mood: Some("excited".to_string()),
        };
        let recalled = tm.recall_memories(&query, 1, now);
        assert_eq!(recalled.len(), 1);
        assert_eq!(recalled[0].event.content, "learning rust together");
        assert_eq!(recalled[0].relevance, 1.0);
        assert!((recalled[0].emotion - 0.8).abs() < 1e-9);
        assert_eq!(recalled[0].event.recall_count, 1);
        assert_eq!(tm.events()[0].last_recalled, Some(now));
        assert_eq!(tm.events()[1].recall_count, 0);
    }

    #[test]
    fn anniversaries_within_window() {
        let now = Utc::now();
        let mut tm = TimelineMemory::new(TimelineConfig::default());
        let mut d = draft(
            EventType::Relationship,
            "we met",
            now - Duration::days(365 * 2 - 3),
        );
        d.importance = Some(0.9);
        d.tags.push("anniversary".to_string());
        tm.store_event(d, now);

        let mut not_yearly = draft(EventType::Emotional, "hard day", now - Duration::days(363));
        not_yearly.importance = Some(0.9);
        tm.store_event(not_yearly, now);

        let upcoming = tm.upcoming_anniversaries(now, 7);
        assert_eq!(upcoming.len(), 1);
        assert_eq!(upcoming[0].description, "we met");
        assert!(tm.upcoming_anniversaries(now, 0).is_empty());
    }

    #[test]
    fn hydrate_rederives_markers_once() {
        let now = Utc::now();
        let mut source = TimelineMemory::new(TimelineConfig::default());
        let mut d = draft(EventType::Relationship, "we met", now - Duration::days(364));
        d.importance = Some(0.9);
        d.tags.push("anniversary".to_string());
        let stored = source.store_event(d, now);

        let mut restored = TimelineMemory::new(TimelineConfig::default());
        restored.hydrate(stored.event.clone());
        restored.hydrate(stored.event);
        assert_eq!(restored.events().len(), 1);
        assert_eq!(restored.markers().len(), 1);
        assert_eq!(restored.upcoming_anniversaries(now, 7).len(), 1);
    }

    #[test]
    fn least_important_events_are_evicted_at_capacity() {
        let now = Utc::now();
        let mut tm = TimelineMemory::new(TimelineConfig {
            max_events: 3,
            ..Default::default()
        });
        let mut keep = draft(EventType::Relationship, "first date", now - Duration::days(2));
        keep.importance = Some(0.9);
        let kept = tm.store_event(keep, now);
        for i in 0..5 {
            let mut d = draft(EventType::Conversation, &format!("chat {i}"), now - Duration::hours(5 - i));
            d.importance = Some(0.2);
            tm.store_event(d, now);
        }

        assert_eq!(tm.events().len(), 3);
        assert!(tm.events().iter().any(|e| e.id == kept.event.id));
        let contents: Vec<&str> = tm.events().iter().map(|e| e.content.as_str()).collect();
        assert!(contents.contains(&"chat 4"));
        assert!(contents.contains(&"chat 3"));
        assert_eq!(tm.markers().len(), 1);

        tm.hydrate(kept.event.clone());
        assert_eq!(tm.events().len(), 3);
    }

    #[test]
    fn next_anniversary_skips_origin_day() {
        let origin = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(
            next_anniversary(origin, origin),
            NaiveDate::from_ymd_opt(2025, 2, 28)
        );
        let today = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        assert_eq!(
            next_anniversary(origin, today),
            NaiveDate::from_ymd_opt(2027, 2, 28)
        );
    }
}
