//! Timeline memory types: events, markers, and the per-user relationship ledger.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of a memory event. Drives importance and relationship deltas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Personal,
    Relationship,
    Conversation,
    Emotional,
    Achievement,
    Custom,
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EventType::Personal => "personal",
            EventType::Relationship => "relationship",
            EventType::Conversation => "conversation",
            EventType::Emotional => "emotional",
            EventType::Achievement => "achievement",
            EventType::Custom => "custom",
        };
        write!(f, "{s}")
    }
}

impl FromStr for EventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "personal" => Ok(EventType::Personal),
            "relationship" => Ok(EventType::Relationship),
            "conversation" => Ok(EventType::Conversation),
            "emotional" => Ok(EventType::Emotional),
            "achievement" => Ok(EventType::Achievement),
            "custom" => Ok(EventType::Custom),
            other => Err(format!("invalid event type: '{other}'")),
        }
    }
}

/// Who was involved and what the conversation looked like when an event happened.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventContext {
    #[serde(default)]
    pub participants: Vec<String>,
    #[serde(default)]
    pub mood: Option<String>,
    #[serde(default)]
    pub topics: Vec<String>,
}

/// A stored memory. Immutable apart from the recall bookkeeping fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryEvent {
    pub id: Uuid,
    pub event_type: EventType,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    /// 0.0 to 1.0.
    pub importance: f64,
    #[serde(default)]
    pub emotions: BTreeMap<String, f64>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub related_ids: Vec<Uuid>,
    #[serde(default)]
    pub context: EventContext,
    #[serde(default)]
    pub recall_count: u32,
    #[serde(default)]
    pub last_recalled: Option<DateTime<Utc>>,
}

impl MemoryEvent {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }
}

/// An event as submitted for storage. Missing id and importance are filled in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryEventDraft {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub event_type: EventType,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub importance: Option<f64>,
    #[serde(default)]
    pub emotions: BTreeMap<String, f64>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub related_ids: Vec<Uuid>,
    #[serde(default)]
    pub context: EventContext,
}

impl MemoryEventDraft {
    pub fn new(event_type: EventType, content: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: None,
            event_type,
            content: content.into(),
            timestamp,
            importance: None,
            emotions: BTreeMap::new(),
            tags: Vec::new(),
            related_ids: Vec::new(),
            context: EventContext::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerKind {
    Milestone,
    Recurring,
    Reminder,
}

impl fmt::Display for MarkerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarkerKind::Milestone => write!(f, "milestone"),
            MarkerKind::Recurring => write!(f, "recurring"),
            MarkerKind::Reminder => write!(f, "reminder"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Recurrence {
    Yearly,
    Monthly,
    Weekly,
}

/// A significant point in time derived from an important event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineMarker {
    pub id: Uuid,
    pub kind: MarkerKind,
    pub event_id: Uuid,
    pub description: String,
    pub timestamp: DateTime<Utc>,
    pub importance: f64,
    pub recurrence: Option<Recurrence>,
}

/// Per-user relationship ledger. Only timeline memory writes to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipMemory {
    pub user_id: String,
    pub trust: f64,
    pub intimacy: f64,
    pub shared_topics: BTreeSet<String>,
    pub last_interaction: DateTime<Utc>,
    /// Grows monotonically.
    pub event_ids: Vec<Uuid>,
    pub milestone_ids: Vec<Uuid>,
}

impl RelationshipMemory {
    pub const INITIAL_TRUST: f64 = 0.5;
    pub const INITIAL_INTIMACY: f64 = 0.1;

    pub fn new(user_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.into(),
            trust: Self::INITIAL_TRUST,
            intimacy: Self::INITIAL_INTIMACY,
            shared_topics: BTreeSet::new(),
            last_interaction: now,
            event_ids: Vec::new(),
            milestone_ids: Vec::new(),
        }
    }
}

/// Context for a recall query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecallQuery {
    pub topics: Vec<String>,
    pub keywords: Vec<String>,
    pub participants: Vec<String>,
    pub mood: Option<String>,
}

/// A recalled event with the components of its score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredMemory {
    pub event: MemoryEvent,
    pub score: f64,
    pub relevance: f64,
    pub recency: f64,
    pub emotion: f64,
}
