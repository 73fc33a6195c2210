use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::emotion::EmotionalContext;

/// Topic name used when nothing more specific is active.
pub const UNCATEGORIZED_TOPIC: &str = "uncategorized";

/// A domain detected in a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicDetection {
    pub domain: String,
    pub confidence: f64,
    pub priority: u8,
    pub matched_keywords: Vec<String>,
}

/// An active conversation thread: a main topic plus recently co-occurring topics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicThread {
    pub id: Uuid,
    pub main_topic: String,
    /// Oldest first; bounded by the configured thread depth.
    pub active_topics: VecDeque<String>,
    pub started_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
    /// Shared with every subsystem of the turn that opened or last touched this thread.
    #[serde(skip)]
    pub emotional_context: Option<Arc<EmotionalContext>>,
}

impl TopicThread {
    pub fn contains(&self, topic: &str) -> bool {
        self.active_topics.iter().any(|t| t == topic)
    }
}

/// Per-topic attributes held in the process-wide topic graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicNode {
    pub name: String,
    pub frequency: u64,
    pub last_mood: Option<String>,
    pub last_intensity: f64,
    pub last_seen: DateTime<Utc>,
}

/// Persisted topic record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicData {
    pub id: String,
    pub domain: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub contexts: Vec<String>,
    /// Related topic to relation strength.
    #[serde(default)]
    pub relations: BTreeMap<String, f64>,
    /// Mood label to last observed intensity while on this topic.
    #[serde(default)]
    pub mood_patterns: BTreeMap<String, f64>,
    pub last_seen: DateTime<Utc>,
    #[serde(default)]
    pub frequency: u64,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

/// What happened to a thread during one turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThreadUpdateKind {
    Opened,
    Extended,
    Archived,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreadUpdate {
    pub thread_id: Uuid,
    pub kind: ThreadUpdateKind,
    pub topic: String,
    pub active_topics: Vec<String>,
}

/// Symmetric relation write between two topics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationUpdate {
    pub a: String,
    pub b: String,
    pub strength: f64,
}

/// Recorded when the main topic of the conversation changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextTransition {
    pub from_topic: String,
    pub to_topic: String,
    pub mood: String,
    pub intensity_delta: f64,
    pub timestamp: DateTime<Utc>,
}
