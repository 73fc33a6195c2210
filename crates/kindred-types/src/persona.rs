use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::emotion::{ContextCondition, EmotionalContext};

/// Restriction added to the persona context whenever flirting is not allowed.
pub const FLIRTING_DISALLOWED: &str = "flirting_disallowed";

/// A conditional response style declared by a persona.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleRule {
    pub condition: ContextCondition,
    pub response: String,
    pub tone: String,
    pub priority: u8,
    /// The rule is skipped if any of these appear in the context's restrictions.
    #[serde(default)]
    pub constraints: Vec<String>,
}

/// A named behavioral profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Persona {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Trait name to strength in [0, 1].
    #[serde(default)]
    pub traits: BTreeMap<String, f64>,
    /// Mood label to additive bias.
    #[serde(default)]
    pub mood_bias: BTreeMap<String, f64>,
    /// Declaration order breaks priority ties.
    #[serde(default)]
    pub style_rules: Vec<StyleRule>,
    #[serde(default)]
    pub constraints: Vec<String>,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub last_used: Option<DateTime<Utc>>,
}

/// Immutable record of a persona switch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonaEvent {
    pub timestamp: DateTime<Utc>,
    pub from: Option<String>,
    pub to: String,
    pub reason: String,
}

/// The context a persona's style rules are evaluated against.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonaContext {
    pub conditions: BTreeSet<ContextCondition>,
    pub restrictions: BTreeSet<String>,
}

impl PersonaContext {
    /// Collect the conditions that hold for `ctx`, on top of session restrictions.
    pub fn from_emotional(ctx: &EmotionalContext, restrictions: &BTreeSet<String>) -> Self {
        let conditions = ContextCondition::ALL
            .into_iter()
            .filter(|c| c.holds(ctx))
            .collect();
        let mut restrictions = restrictions.clone();
        if !ctx.romantic.allows_flirting {
            restrictions.insert(FLIRTING_DISALLOWED.to_string());
        }
        Self {
            conditions,
            restrictions,
        }
    }
}

/// The style selected for a turn. The default value is the no-op style.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseStyle {
    pub persona_id: Option<String>,
    pub condition: Option<ContextCondition>,
    pub response: String,
    pub tone: String,
    pub priority: u8,
}

impl ResponseStyle {
    pub fn is_empty(&self) -> bool {
        self.condition.is_none()
    }
}

impl fmt::Display for ResponseStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            write!(f, "default")
        } else {
            write!(f, "{} ({})", self.response, self.tone)
        }
    }
}
