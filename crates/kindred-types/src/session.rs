use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::emotion::{ContextKind, EmotionalContext};
use crate::mood::MoodState;
use crate::persona::{PersonaEvent, ResponseStyle};
use crate::timeline::{RelationshipMemory, ScoredMemory, TimelineMarker};
use crate::topic::{ContextTransition, TopicDetection};

/// Unique identifier for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Subsystems the coordinator routes an interaction through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Subsystem {
    Mood,
    Persona,
    Topic,
    Timeline,
}

impl Subsystem {
    pub const ALL: [Subsystem; 4] = [
        Subsystem::Mood,
        Subsystem::Persona,
        Subsystem::Topic,
        Subsystem::Timeline,
    ];
}

/// Caller-supplied context when opening a session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InitialContext {
    /// Persona to activate on open.
    #[serde(default)]
    pub persona_id: Option<String>,
    /// Restrictions that suppress matching persona style rules.
    #[serde(default)]
    pub restrictions: BTreeSet<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

/// One incoming user turn.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub message: String,
    /// Mood the client reports for the user; overrides what the text says.
    #[serde(default)]
    pub user_mood: Option<String>,
    /// Explicit persona switch requested with this turn.
    #[serde(default)]
    pub persona_request: Option<String>,
    /// Defaults to the current time.
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl Interaction {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }
}

/// The merged, persisted state of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub mood: MoodState,
    pub persona_id: Option<String>,
    pub main_topic: Option<String>,
    pub active_topics: Vec<String>,
    pub relationship: Option<RelationshipMemory>,
    pub turn_count: u64,
    pub last_interaction: Option<DateTime<Utc>>,
}

impl SessionState {
    pub fn fresh(now: DateTime<Utc>) -> Self {
        Self {
            mood: MoodState::neutral(now),
            persona_id: None,
            main_topic: None,
            active_topics: Vec::new(),
            relationship: None,
            turn_count: 0,
            last_interaction: None,
        }
    }
}

/// The per-turn context handed to the response layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionContext {
    pub emotional: Option<EmotionalContext>,
    /// Normalized mood scores for the last turn.
    pub mood_scores: BTreeMap<String, f64>,
    pub response_style: ResponseStyle,
    pub detections: Vec<TopicDetection>,
    pub recalled: Vec<ScoredMemory>,
    pub new_markers: Vec<TimelineMarker>,
    pub transitions: Vec<ContextTransition>,
    pub persona_events: Vec<PersonaEvent>,
    /// The last few context kinds, most recent last.
    pub context_stack: Vec<ContextKind>,
    pub restrictions: BTreeSet<String>,
    pub metadata: BTreeMap<String, String>,
}

/// Immutable snapshot of session state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionCheckpoint {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub state: SessionState,
    pub reasons: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub user_id: String,
    pub started_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub state: SessionState,
    pub context: SessionContext,
    pub active_systems: BTreeSet<Subsystem>,
    pub checkpoints: Vec<SessionCheckpoint>,
    /// Set when this session continues an earlier one.
    pub continued_from: Option<SessionId>,
}

impl Session {
    pub fn is_active(&self) -> bool {
        self.ended_at.is_none()
    }
}

/// Result of processing one interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnOutcome {
    pub session_id: SessionId,
    pub state: SessionState,
    pub context: SessionContext,
    pub checkpoint: Option<SessionCheckpoint>,
}
