use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::emotion::{ContextCondition, ContextKind, EmotionalContext};

/// The mood label used when no pattern scores above the shift threshold.
pub const NEUTRAL_MOOD: &str = "neutral";

/// Intensity of a freshly reset mood.
pub const BASELINE_INTENSITY: f64 = 0.5;

/// Lightweight copy of the signals that drove a mood update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextSnapshot {
    pub sentiment: f64,
    pub intensity: f64,
    pub primary_context: ContextKind,
    pub keywords: Vec<String>,
}

impl From<&EmotionalContext> for ContextSnapshot {
    fn from(ctx: &EmotionalContext) -> Self {
        Self {
            sentiment: ctx.sentiment,
            intensity: ctx.intensity,
            primary_context: ctx.primary_context,
            keywords: ctx.keywords.clone(),
        }
    }
}

/// The agent's affect at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodState {
    pub primary_mood: String,
    /// Always within [0, max_intensity].
    pub intensity: f64,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub context: Option<ContextSnapshot>,
}

impl MoodState {
    pub fn neutral(timestamp: DateTime<Utc>) -> Self {
        Self {
            primary_mood: NEUTRAL_MOOD.to_string(),
            intensity: BASELINE_INTENSITY,
            timestamp,
            context: None,
        }
    }
}

/// One entry of the mood pattern catalog.
///
/// Several patterns may target the same `mood`; the mood keeps the best score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoodPattern {
    pub name: String,
    pub mood: String,
    pub keywords: Vec<String>,
    /// Target sentiment in [-1, 1].
    pub sentiment: f64,
    pub intensity: f64,
    /// Per-hour decay applied to the pattern score.
    pub decay_rate: f64,
    /// All of these must hold or the mood is zeroed.
    #[serde(default)]
    pub requires: Vec<ContextCondition>,
    /// Any of these holding zeroes the mood.
    #[serde(default)]
    pub excludes: Vec<ContextCondition>,
}
