//! Configuration types for Kindred.
//!
//! `KindredConfig` represents the top-level `config.toml` that tunes the mood,
//! topic, persona, timeline, normalization and session subsystems.

use serde::{Deserialize, Serialize};

use crate::persona::Persona;

/// Top-level configuration.
///
/// Loaded from `~/.kindred/config.toml`. All fields have sensible defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KindredConfig {
    #[serde(default)]
    pub mood: MoodConfig,
    #[serde(default)]
    pub topic: TopicConfig,
    #[serde(default)]
    pub persona: PersonaConfig,
    #[serde(default)]
    pub timeline: TimelineConfig,
    #[serde(default)]
    pub normalization: NormalizationConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoodConfig {
    /// Per-hour exponential decay of intensity.
    #[serde(default = "default_mood_decay_rate")]
    pub decay_rate: f64,
    /// Scale applied to per-signal intensity impacts.
    #[serde(default = "default_change_threshold")]
    pub change_threshold: f64,
    #[serde(default = "default_max_intensity")]
    pub max_intensity: f64,
    /// Minimum pattern score needed to switch mood.
    #[serde(default = "default_shift_threshold")]
    pub shift_threshold: f64,
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

fn default_mood_decay_rate() -> f64 {
    0.1
}

fn default_change_threshold() -> f64 {
    0.3
}

fn default_max_intensity() -> f64 {
    1.0
}

fn default_shift_threshold() -> f64 {
    0.4
}

fn default_history_limit() -> usize {
    256
}

impl Default for MoodConfig {
    fn default() -> Self {
        Self {
            decay_rate: default_mood_decay_rate(),
            change_threshold: default_change_threshold(),
            max_intensity: default_max_intensity(),
            shift_threshold: default_shift_threshold(),
            history_limit: default_history_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicConfig {
    #[serde(default = "default_max_thread_depth")]
    pub max_thread_depth: usize,
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,
    /// Per-minute decay of thread relevance.
    #[serde(default = "default_topic_decay_rate")]
    pub decay_rate: f64,
    #[serde(default = "default_thread_timeout_minutes")]
    pub thread_timeout_minutes: i64,
}

fn default_max_thread_depth() -> usize {
    5
}

fn default_min_confidence() -> f64 {
    0.6
}

fn default_topic_decay_rate() -> f64 {
    0.1
}

fn default_thread_timeout_minutes() -> i64 {
    30
}

impl Default for TopicConfig {
    fn default() -> Self {
        Self {
            max_thread_depth: default_max_thread_depth(),
            min_confidence: default_min_confidence(),
            decay_rate: default_topic_decay_rate(),
            thread_timeout_minutes: default_thread_timeout_minutes(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaConfig {
    #[serde(default = "default_cooldown_minutes")]
    pub cooldown_minutes: i64,
    /// Personas added to the built-in catalog. Same id replaces the built-in.
    #[serde(default)]
    pub personas: Vec<Persona>,
}

fn default_cooldown_minutes() -> i64 {
    5
}

impl Default for PersonaConfig {
    fn default() -> Self {
        Self {
            cooldown_minutes: default_cooldown_minutes(),
            personas: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineConfig {
    /// Importance at or above which a marker is derived from an event.
    #[serde(default = "default_significance_threshold")]
    pub significance_threshold: f64,
    #[serde(default = "default_recall_limit")]
    pub recall_limit: usize,
    /// Events held in memory per session; the least important go first.
    #[serde(default = "default_max_events")]
    pub max_events: usize,
}

fn default_significance_threshold() -> f64 {
    0.7
}

fn default_recall_limit() -> usize {
    3
}

fn default_max_events() -> usize {
    1000
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            significance_threshold: default_significance_threshold(),
            recall_limit: default_recall_limit(),
            max_events: default_max_events(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizationConfig {
    /// Largest per-turn change of a normalized score.
    #[serde(default = "default_max_change")]
    pub max_change: f64,
    #[serde(default = "default_emotional_max_change")]
    pub emotional_max_change: f64,
}

fn default_max_change() -> f64 {
    0.3
}

fn default_emotional_max_change() -> f64 {
    0.5
}

impl Default for NormalizationConfig {
    fn default() -> Self {
        Self {
            max_change: default_max_change(),
            emotional_max_change: default_emotional_max_change(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_max_checkpoints")]
    pub max_checkpoints: usize,
    /// Mood intensity movement that counts as a significant change.
    #[serde(default = "default_intensity_checkpoint_delta")]
    pub intensity_checkpoint_delta: f64,
    /// Depth of the context-kind stack kept in the session context.
    #[serde(default = "default_context_stack_depth")]
    pub context_stack_depth: usize,
    /// Ended sessions kept in memory for continuation before the oldest are evicted.
    #[serde(default = "default_max_ended_sessions")]
    pub max_ended_sessions: usize,
}

fn default_max_checkpoints() -> usize {
    100
}

fn default_intensity_checkpoint_delta() -> f64 {
    0.25
}

fn default_context_stack_depth() -> usize {
    3
}

fn default_max_ended_sessions() -> usize {
    64
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_checkpoints: default_max_checkpoints(),
            intensity_checkpoint_delta: default_intensity_checkpoint_delta(),
            context_stack_depth: default_context_stack_depth(),
            max_ended_sessions: default_max_ended_sessions(),
        }
    }
}
