//! Per-message emotional context.
//!
//! An [`EmotionalContext`] is produced once per incoming message by the
//! analyzer and then shared read-only (behind `Arc`) with every subsystem
//! that participates in the turn.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Theme score at which a feminine/sapphic presence is considered established.
pub const FEMININE_PRESENCE_THRESHOLD: f64 = 0.3;

/// Coarse conversational context derived from a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextKind {
    Emotional,
    Technical,
    Romantic,
    Casual,
}

impl fmt::Display for ContextKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextKind::Emotional => write!(f, "emotional"),
            ContextKind::Technical => write!(f, "technical"),
            ContextKind::Romantic => write!(f, "romantic"),
            ContextKind::Casual => write!(f, "casual"),
        }
    }
}

impl FromStr for ContextKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "emotional" => Ok(ContextKind::Emotional),
            "technical" => Ok(ContextKind::Technical),
            "romantic" => Ok(ContextKind::Romantic),
            "casual" => Ok(ContextKind::Casual),
            other => Err(format!("invalid context kind: '{other}'")),
        }
    }
}

/// Message category used by the calling layer to choose a prompt family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MessageCategory {
    Greeting,
    Emotional,
    Identity,
    Philosophy,
    Knowledge,
    Casual,
    #[default]
    Uncategorized,
}

impl fmt::Display for MessageCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MessageCategory::Greeting => "greeting",
            MessageCategory::Emotional => "emotional",
            MessageCategory::Identity => "identity",
            MessageCategory::Philosophy => "philosophy",
            MessageCategory::Knowledge => "knowledge",
            MessageCategory::Casual => "casual",
            MessageCategory::Uncategorized => "uncategorized",
        };
        write!(f, "{s}")
    }
}

/// Romantic / platonic sub-context of a message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RomanticContext {
    pub is_romantic: bool,
    pub is_flirty: bool,
    pub is_platonic: bool,
    /// Gated by explicit relational markers; never true in professional,
    /// serious, or platonic contexts.
    pub allows_flirting: bool,
    pub intensity: f64,
}

/// Signals extracted from a single message. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionalContext {
    pub raw_input: String,
    /// -1.0 (negative) to 1.0 (positive).
    pub sentiment: f64,
    /// 0.0 to 1.0.
    pub intensity: f64,
    /// Normalized tokens in message order.
    pub keywords: Vec<String>,
    pub primary_emotion: String,
    pub romantic: RomanticContext,
    /// Theme name to score in [0, 1].
    pub themes: BTreeMap<String, f64>,
    pub is_emotional: bool,
    pub is_technical: bool,
    pub primary_context: ContextKind,
    pub secondary_context: Option<ContextKind>,
    pub category: MessageCategory,
    /// Mood the user reported for themselves ("i'm feeling tired").
    pub user_mood: Option<String>,
    pub mood_reset_requested: bool,
    pub emotional_tone: String,
    pub timestamp: DateTime<Utc>,
}

impl EmotionalContext {
    /// Neutral context used for empty or unparseable input.
    pub fn neutral(raw_input: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            raw_input: raw_input.into(),
            sentiment: 0.0,
            intensity: 0.5,
            keywords: Vec::new(),
            primary_emotion: "neutral".to_string(),
            romantic: RomanticContext::default(),
            themes: BTreeMap::new(),
            is_emotional: false,
            is_technical: false,
            primary_context: ContextKind::Casual,
            secondary_context: None,
            category: MessageCategory::Uncategorized,
            user_mood: None,
            mood_reset_requested: false,
            emotional_tone: "neutral".to_string(),
            timestamp,
        }
    }

    /// Score for a named theme, 0.0 when the theme was not detected.
    pub fn theme(&self, name: &str) -> f64 {
        self.themes.get(name).copied().unwrap_or(0.0)
    }

    /// Whether the message carries the given context kind (primary, flags, or secondary).
    pub fn has_context(&self, kind: ContextKind) -> bool {
        match kind {
            ContextKind::Emotional => self.is_emotional,
            ContextKind::Technical => self.is_technical,
            ContextKind::Romantic => self.romantic.is_romantic,
            ContextKind::Casual => {
                self.primary_context == ContextKind::Casual
                    || self.secondary_context == Some(ContextKind::Casual)
            }
        }
    }

    /// All context kinds carried by the message, primary first.
    pub fn context_kinds(&self) -> Vec<ContextKind> {
        let mut kinds = vec![self.primary_context];
        if let Some(secondary) = self.secondary_context {
            kinds.push(secondary);
        }
        for kind in [ContextKind::Emotional, ContextKind::Technical, ContextKind::Romantic] {
            if self.has_context(kind) && !kinds.contains(&kind) {
                kinds.push(kind);
            }
        }
        kinds
    }
}

/// A named condition evaluated against an [`EmotionalContext`].
///
/// Used for mood-pattern gating, topic-mood requirements and persona style rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextCondition {
    Romantic,
    Platonic,
    FlirtingAllowed,
    Technical,
    Emotional,
    Casual,
    FemininePresence,
}

impl ContextCondition {
    pub const ALL: [ContextCondition; 7] = [
        ContextCondition::Romantic,
        ContextCondition::Platonic,
        ContextCondition::FlirtingAllowed,
        ContextCondition::Technical,
        ContextCondition::Emotional,
        ContextCondition::Casual,
        ContextCondition::FemininePresence,
    ];

    pub fn holds(&self, ctx: &EmotionalContext) -> bool {
        match self {
            ContextCondition::Romantic => ctx.romantic.is_romantic,
            ContextCondition::Platonic => ctx.romantic.is_platonic,
            ContextCondition::FlirtingAllowed => ctx.romantic.allows_flirting,
            ContextCondition::Technical => ctx.is_technical,
            ContextCondition::Emotional => ctx.is_emotional,
            ContextCondition::Casual => ctx.has_context(ContextKind::Casual),
            ContextCondition::FemininePresence => {
                ctx.theme("feminine") >= FEMININE_PRESENCE_THRESHOLD
            }
        }
    }
}

impl fmt::Display for ContextCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ContextCondition::Romantic => "romantic",
            ContextCondition::Platonic => "platonic",
            ContextCondition::FlirtingAllowed => "flirting_allowed",
            ContextCondition::Technical => "technical",
            ContextCondition::Emotional => "emotional",
            ContextCondition::Casual => "casual",
            ContextCondition::FemininePresence => "feminine_presence",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neutral_context_defaults() {
        let ctx = EmotionalContext::neutral("", Utc::now());
        assert_eq!(ctx.sentiment, 0.0);
        assert_eq!(ctx.intensity, 0.5);
        assert_eq!(ctx.category, MessageCategory::Uncategorized);
        assert!(!ctx.romantic.allows_flirting);
        assert_eq!(ctx.context_kinds(), vec![ContextKind::Casual]);
    }

    #[test]
    fn test_context_kind_from_str() {
        assert_eq!("Technical".parse::<ContextKind>().unwrap(), ContextKind::Technical);
        assert!("nope".parse::<ContextKind>().is_err());
    }

    #[test]
    fn test_conditions_follow_context_flags() {
        let mut ctx = EmotionalContext::neutral("hi", Utc::now());
        assert!(!ContextCondition::FlirtingAllowed.holds(&ctx));
        ctx.romantic.allows_flirting = true;
        ctx.themes.insert("feminine".to_string(), 0.34);
        assert!(ContextCondition::FlirtingAllowed.holds(&ctx));
        assert!(ContextCondition::FemininePresence.holds(&ctx));
        assert!(ContextCondition::Casual.holds(&ctx));
    }

    #[test]
    fn test_condition_serde_snake_case() {
        let json = serde_json::to_string(&ContextCondition::FemininePresence).unwrap();
        assert_eq!(json, "\"feminine_presence\"");
    }
}
