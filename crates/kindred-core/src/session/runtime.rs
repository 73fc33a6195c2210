//! Shared catalogs and the per-session bundle of subsystem state machines.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use kindred_types::config::KindredConfig;
use kindred_types::mood::MoodPattern;
use kindred_types::session::SessionState;

use crate::mood::MoodEngine;
use crate::mood::patterns::default_mood_patterns;
use crate::normalize::{MoodNormalizer, NormalizationRules};
use crate::persona::{PersonaCatalog, PersonaSystem};
use crate::timeline::TimelineMemory;
use crate::topic::domain::default_domain_rules;
use crate::topic::integrator::default_topic_mood_patterns;
use crate::topic::{DomainRule, TopicMoodIntegrator, TopicMoodPattern, TopicThreader};

/// Immutable catalogs built once and shared read-only by every session.
#[derive(Debug, Clone)]
pub struct Catalogs {
    pub mood_patterns: Arc<Vec<MoodPattern>>,
    pub domain_rules: Arc<Vec<DomainRule>>,
    pub topic_moods: Arc<Vec<TopicMoodPattern>>,
    pub personas: Arc<PersonaCatalog>,
}

impl Catalogs {
    /// Built-in catalogs plus the personas declared in `config`.
    pub fn from_config(config: &KindredConfig) -> Self {
        Self {
            mood_patterns: Arc::new(default_mood_patterns()),
            domain_rules: Arc::new(default_domain_rules()),
            topic_moods: Arc::new(default_topic_mood_patterns()),
            personas: Arc::new(PersonaCatalog::with_overrides(&config.persona.personas)),
        }
    }
}

/// Mutable per-session subsystems. Cloned at the start of every turn and
/// swapped back only once the turn has been fully computed.
#[derive(Debug, Clone)]
pub struct SessionRuntime {
    pub mood: MoodEngine,
    pub normalizer: MoodNormalizer,
    pub persona: PersonaSystem,
    pub threader: TopicThreader,
    pub integrator: TopicMoodIntegrator,
    pub timeline: TimelineMemory,
}

impl SessionRuntime {
    pub fn new(config: &KindredConfig, catalogs: &Catalogs, now: DateTime<Utc>) -> Self {
        Self {
            mood: MoodEngine::new(config.mood.clone(), Arc::clone(&catalogs.mood_patterns), now),
            normalizer: MoodNormalizer::new(NormalizationRules::from_config(&config.normalization)),
            persona: PersonaSystem::new(
                Arc::clone(&catalogs.personas),
                config.persona.cooldown_minutes,
            ),
            threader: TopicThreader::new(
                config.topic.clone(),
                Arc::clone(&catalogs.domain_rules),
            ),
            integrator: TopicMoodIntegrator::new(Arc::clone(&catalogs.topic_moods)),
            timeline: TimelineMemory::new(config.timeline.clone()),
        }
    }

    /// Rebuild a runtime from a persisted state (continuation after restart).
    pub fn from_state(
        config: &KindredConfig,
        catalogs: &Catalogs,
        state: &SessionState,
        now: DateTime<Utc>,
    ) -> Self {
        let mut runtime = Self::new(config, catalogs, now);
        runtime.mood = MoodEngine::with_state(
            config.mood.clone(),
            Arc::clone(&catalogs.mood_patterns),
            state.mood.clone(),
        );
        if let Some(persona_id) = &state.persona_id {
            runtime.persona.restore(persona_id, now);
        }
        runtime.threader.restore(&state.active_topics, now);
        if let Some(relationship) = &state.relationship {
            runtime.timeline.hydrate_relationship(relationship.clone());
        }
        runtime
    }
}
