//! Importance, relationship impact and marker classification for memory events.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use kindred_types::timeline::{EventType, MarkerKind, MemoryEvent, Recurrence, TimelineMarker};
use uuid::Uuid;

/// Hours over which the recency term of importance decays (one week).
const IMPORTANCE_DECAY_HOURS: f64 = 168.0;

const MILESTONE_TAGS: &[&str] = &["milestone", "anniversary", "first"];

pub fn type_weight(event_type: EventType) -> f64 {
    match event_type {
        EventType::Emotional => 0.4,
        EventType::Personal => 0.3,
        EventType::Relationship => 0.2,
        EventType::Achievement => 0.1,
        EventType::Conversation | EventType::Custom => 0.0,
    }
}

pub(crate) fn age_hours(from: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    (now - from).num_milliseconds().max(0) as f64 / 3_600_000.0
}

/// `typeWeight * (1 + maxEmotion) * (0.7 + 0.3 * exp(-age / 168h))`, at most 1.
pub fn calculate_importance(
    event_type: EventType,
    emotions: &BTreeMap<String, f64>,
    timestamp: DateTime<Utc>,
    now: DateTime<Utc>,
) -> f64 {
    let max_emotion = emotions.values().copied().fold(0.0_f64, f64::max);
    let recency = (-age_hours(timestamp, now) / IMPORTANCE_DECAY_HOURS).exp();
    (type_weight(event_type) * (1.0 + max_emotion) * (0.7 + 0.3 * recency)).min(1.0)
}

fn amplified(base: f64, emotions: &BTreeMap<String, f64>, key: &str) -> f64 {
    match emotions.get(key) {
        Some(level) => base * (1.0 + level),
        None => base,
    }
}

pub fn trust_impact(event_type: EventType, emotions: &BTreeMap<String, f64>) -> f64 {
    let base = match event_type {
        EventType::Personal => 0.05,
        EventType::Emotional => 0.1,
        EventType::Relationship => 0.15,
        _ => 0.0,
    };
    amplified(base, emotions, "trust").max(0.0)
}

pub fn intimacy_impact(event_type: EventType, emotions: &BTreeMap<String, f64>) -> f64 {
    let base = match event_type {
        EventType::Personal => 0.1,
        EventType::Emotional => 0.15,
        EventType::Relationship => 0.2,
        _ => 0.0,
    };
    amplified(base, emotions, "intimacy").max(0.0)
}

fn is_relationship_milestone(event: &MemoryEvent) -> bool {
    event.event_type == EventType::Relationship
        && MILESTONE_TAGS.iter().any(|tag| event.has_tag(tag))
}

fn recurrence_from_tags(event: &MemoryEvent) -> Option<Recurrence> {
    if event.has_tag("weekly") {
        Some(Recurrence::Weekly)
    } else if event.has_tag("monthly") {
        Some(Recurrence::Monthly)
    } else if event.has_tag("yearly") || event.has_tag("birthday") || event.has_tag("recurring")
    {
        Some(Recurrence::Yearly)
    } else {
        None
    }
}

/// Derive a marker from an event whose importance reaches `threshold`.
pub fn derive_marker(event: &MemoryEvent, threshold: f64) -> Option<TimelineMarker> {
    if event.importance < threshold {
        return None;
    }

    let (kind, recurrence) = if is_relationship_milestone(event) {
        (MarkerKind::Milestone, Some(Recurrence::Yearly))
    } else if let Some(recurrence) = recurrence_from_tags(event) {
        (MarkerKind::Recurring, Some(recurrence))
    } else if event.event_type == EventType::Achievement {
        (MarkerKind::Milestone, None)
    } else {
        (MarkerKind::Reminder, None)
    };

    Some(TimelineMarker {
        id: Uuid::now_v7(),
        kind,
        event_id: event.id,
        description: event.content.clone(),
        timestamp: event.timestamp,
        importance: event.importance,
        recurrence,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use kindred_types::timeline::EventContext;

    fn event(event_type: EventType, importance: f64, tags: &[&str]) -> MemoryEvent {
        MemoryEvent {
            id: Uuid::now_v7(),
            event_type,
            content: "something".to_string(),
            timestamp: Utc::now(),
            importance,
            emotions: BTreeMap::new(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            related_ids: Vec::new(),
            context: EventContext::default(),
            recall_count: 0,
            last_recalled: None,
        }
    }

    #[test]
    fn fresh_emotional_event_importance() {
        let now = Utc::now();
        let emotions = BTreeMap::from([("joy".to_string(), 0.5)]);
        let importance = calculate_importance(EventType::Emotional, &emotions, now, now);
        assert!((importance - 0.6).abs() < 1e-9);
    }

    #[test]
    fn importance_decays_towards_seventy_percent() {
        let now = Utc::now();
        let old = now - Duration::days(365);
        let importance = calculate_importance(EventType::Personal, &BTreeMap::new(), old, now);
        assert!((importance - 0.21).abs() < 1e-6);
        assert_eq!(
            calculate_importance(EventType::Conversation, &BTreeMap::new(), now, now),
            0.0
        );
    }

    #[test]
    fn importance_is_capped() {
        let now = Utc::now();
        let emotions = BTreeMap::from([("joy".to_string(), 5.0)]);
        assert_eq!(calculate_importance(EventType::Emotional, &emotions, now, now), 1.0);
    }

    #[test]
    fn impacts_follow_type_and_emotion() {
        let emotions = BTreeMap::from([("trust".to_string(), 1.0)]);
        assert!((trust_impact(EventType::Relationship, &emotions) - 0.3).abs() < 1e-9);
        assert!((intimacy_impact(EventType::Relationship, &emotions) - 0.2).abs() < 1e-9);
        assert_eq!(trust_impact(EventType::Achievement, &emotions), 0.0);
    }

    #[test]
    fn marker_classification() {
        let m = derive_marker(&event(EventType::Relationship, 0.8, &["first"]), 0.7).unwrap();
        assert_eq!(m.kind, MarkerKind::Milestone);
        assert_eq!(m.recurrence, Some(Recurrence::Yearly));

        let m = derive_marker(&event(EventType::Personal, 0.8, &["Weekly"]), 0.7).unwrap();
        assert_eq!(m.kind, MarkerKind::Recurring);
        assert_eq!(m.recurrence, Some(Recurrence::Weekly));

        let m = derive_marker(&event(EventType::Achievement, 0.9, &[]), 0.7).unwrap();
        assert_eq!(m.kind, MarkerKind::Milestone);
        assert_eq!(m.recurrence, None);

        let m = derive_marker(&event(EventType::Emotional, 0.7, &[]), 0.7).unwrap();
        assert_eq!(m.kind, MarkerKind::Reminder);

        assert!(derive_marker(&event(EventType::Emotional, 0.69, &[]), 0.7).is_none());
    }
}
