//! Topic-mood integration.
//!
//! Some domains amplify or dampen the current mood: talking tech while
//! intellectual pushes intensity up, romance while flirty even more so. Each
//! pattern has a per-session cooldown so a long thread on one topic cannot
//! ratchet intensity every turn.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use kindred_types::emotion::{ContextCondition, EmotionalContext};
use kindred_types::topic::TopicDetection;
use tracing::debug;

use crate::mood::MoodEngine;

/// Multiplier applied when every required condition of a pattern holds.
const CONTEXT_MATCH_BOOST: f64 = 1.5;

#[derive(Debug, Clone)]
pub struct TopicMoodPattern {
    pub domain: String,
    pub base_intensity: f64,
    /// Mood label to intensity multiplier.
    pub modifiers: BTreeMap<String, f64>,
    pub requires: Vec<ContextCondition>,
    pub cooldown: Duration,
}

impl TopicMoodPattern {
    pub fn modifier(&self, mood: &str) -> f64 {
        self.modifiers.get(mood).copied().unwrap_or(1.0)
    }
}

fn topic_pattern(
    domain: &str,
    base_intensity: f64,
    modifiers: &[(&str, f64)],
    requires: &[ContextCondition],
    cooldown_minutes: i64,
) -> TopicMoodPattern {
    TopicMoodPattern {
        domain: domain.to_string(),
        base_intensity,
        modifiers: modifiers.iter().map(|(m, v)| (m.to_string(), *v)).collect(),
        requires: requires.to_vec(),
        cooldown: Duration::minutes(cooldown_minutes),
    }
}

pub fn default_topic_mood_patterns() -> Vec<TopicMoodPattern> {
    vec![
        topic_pattern(
            "romantic",
            0.8,
            &[("flirty", 1.5), ("playful", 1.3), ("romantic", 1.4), ("protective", 1.2)],
            &[ContextCondition::Romantic],
            5,
        ),
        topic_pattern(
            "tech",
            0.7,
            &[
                ("intellectual", 1.4),
                ("excited", 1.2),
                ("enthusiastic", 1.3),
                ("playful", 1.1),
            ],
            &[ContextCondition::Technical],
            2,
        ),
        topic_pattern(
            "gaming",
            0.6,
            &[("excited", 1.4), ("playful", 1.2), ("mischievous", 1.2)],
            &[ContextCondition::Casual],
            2,
        ),
        topic_pattern(
            "emotional",
            0.7,
            &[("protective", 1.4), ("playful", 0.8), ("sassy", 0.7)],
            &[ContextCondition::Emotional],
            3,
        ),
    ]
}

/// Outcome of applying one topic-mood pattern.
#[derive(Debug, Clone, PartialEq)]
pub struct Integration {
    pub domain: String,
    pub modifier: f64,
    pub integrated_intensity: f64,
    pub mood_intensity: f64,
}

#[derive(Debug, Clone)]
pub struct TopicMoodIntegrator {
    patterns: Arc<Vec<TopicMoodPattern>>,
    last_applied: HashMap<String, DateTime<Utc>>,
}

impl TopicMoodIntegrator {
    pub fn new(patterns: Arc<Vec<TopicMoodPattern>>) -> Self {
        Self {
            patterns,
            last_applied: HashMap::new(),
        }
    }

    fn cooling_down(&self, pattern: &TopicMoodPattern, now: DateTime<Utc>) -> bool {
        self.last_applied
            .get(&pattern.domain)
            .is_some_and(|last| now - *last < pattern.cooldown)
    }

    /// Apply matching patterns to the mood engine's current intensity.
    pub fn integrate(
        &mut self,
        detections: &[TopicDetection],
        ctx: &EmotionalContext,
        mood: &mut MoodEngine,
    ) -> Vec<Integration> {
        let now = ctx.timestamp;
        let mut applied = Vec::new();

        for detection in detections {
            let Some(pattern) = self.patterns.iter().find(|p| p.domain == detection.domain)
            else {
                continue;
            };
            if self.cooling_down(pattern, now) {
                debug!(domain = %pattern.domain, "Topic-mood pattern cooling down");
                continue;
            }

            let modifier = pattern.modifier(&mood.current().primary_mood);
            let context_boost = if pattern.requires.iter().all(|c| c.holds(ctx)) {
                CONTEXT_MATCH_BOOST
            } else {
                1.0
            };
            let integrated_intensity = pattern.base_intensity * modifier * context_boost;
            let mood_intensity = mood.scale_intensity(modifier);

            self.last_applied.insert(pattern.domain.clone(), now);
            applied.push(Integration {
                domain: pattern.domain.clone(),
                modifier,
                integrated_intensity,
                mood_intensity,
            });
        }
        applied
    }
}
