//! Session-scoped persona state machine.
//!
//! The catalog is shared and immutable; the active persona, cooldown stamps
//! and transition history belong to one session.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use kindred_types::emotion::EmotionalContext;
use kindred_types::error::PersonaError;
use kindred_types::persona::{Persona, PersonaContext, PersonaEvent, ResponseStyle, StyleRule};
use tracing::{debug, info};

use super::catalog::{CONFIDANT, GEEKY_ASSISTANT, PersonaCatalog, TEASER};

#[derive(Debug, Clone)]
pub struct PersonaSystem {
    catalog: Arc<PersonaCatalog>,
    cooldown: Duration,
    active: Option<Persona>,
    activated_at: HashMap<String, DateTime<Utc>>,
    history: Vec<PersonaEvent>,
}

impl PersonaSystem {
    pub fn new(catalog: Arc<PersonaCatalog>, cooldown_minutes: i64) -> Self {
        Self {
            catalog,
            cooldown: Duration::try_minutes(cooldown_minutes).unwrap_or(Duration::MAX),
            active: None,
            activated_at: HashMap::new(),
            history: Vec::new(),
        }
    }

    pub fn catalog(&self) -> &PersonaCatalog {
        &self.catalog
    }

    pub fn current_persona(&self) -> Option<&Persona> {
        self.active.as_ref()
    }

    pub fn current_persona_id(&self) -> Option<&str> {
        self.active.as_ref().map(|p| p.id.as_str())
    }

    /// Transitions in order of occurrence.
    pub fn history(&self) -> &[PersonaEvent] {
        &self.history
    }

    /// Check the transition guard without changing anything.
    pub fn can_switch(&self, target: &str, now: DateTime<Utc>) -> Result<(), PersonaError> {
        if !self.catalog.contains(target) {
            return Err(PersonaError::UnknownPersona(target.to_string()));
        }
        if let Some(last) = self.activated_at.get(target) {
            let elapsed = now - *last;
            if elapsed < self.cooldown {
                return Err(PersonaError::CoolingDown {
                    persona_id: target.to_string(),
                    remaining_secs: (self.cooldown - elapsed).num_seconds().max(1),
                });
            }
        }
        Ok(())
    }

    /// Activate `target`, deactivating the current persona.
    ///
    /// On error the active persona and history are untouched.
    pub fn switch_persona(
        &mut self,
        target: &str,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<PersonaEvent, PersonaError> {
        self.can_switch(target, now)?;
        let mut next = self
            .catalog
            .get(target)
            .cloned()
            .ok_or_else(|| PersonaError::UnknownPersona(target.to_string()))?;

        let from = self.active.take().map(|mut previous| {
            previous.active = false;
            previous.id
        });
        next.active = true;
        next.last_used = Some(now);
        self.active = Some(next);
        self.activated_at.insert(target.to_string(), now);

        let event = PersonaEvent {
            timestamp: now,
            from,
            to: target.to_string(),
            reason: reason.to_string(),
        };
        info!(from = ?event.from, to = %event.to, reason, "Persona switched");
        self.history.push(event.clone());
        Ok(event)
    }

    /// Reactivate a persisted persona without recording a transition.
    pub fn restore(&mut self, persona_id: &str, now: DateTime<Utc>) -> bool {
        let Some(mut persona) = self.catalog.get(persona_id).cloned() else {
            debug!(persona = persona_id, "Persisted persona is no longer in the catalog");
            return false;
        };
        persona.active = true;
        persona.last_used = Some(now);
        self.active = Some(persona);
        true
    }

    /// Highest-priority style rule of the active persona that matches `context`.
    pub fn get_response_style(&self, context: &PersonaContext) -> ResponseStyle {
        let Some(persona) = &self.active else {
            return ResponseStyle::default();
        };

        let best = persona
            .style_rules
            .iter()
            .filter(|rule| context.conditions.contains(&rule.condition))
            .filter(|rule| {
                !rule
                    .constraints
                    .iter()
                    .any(|c| context.restrictions.contains(c))
            })
            .fold(None, |best: Option<&StyleRule>, rule| match best {
                Some(b) if b.priority >= rule.priority => Some(b),
                _ => Some(rule),
            });

        match best {
            Some(rule) => ResponseStyle {
                persona_id: Some(persona.id.clone()),
                condition: Some(rule.condition),
                response: rule.response.clone(),
                tone: rule.tone.clone(),
                priority: rule.priority,
            },
            None => ResponseStyle::default(),
        }
    }

    /// Persona that best fits the message, if any applies and exists.
    pub fn suggest_transition(&self, ctx: &EmotionalContext) -> Option<&str> {
        let suggestion = if ctx.is_technical {
            GEEKY_ASSISTANT
        } else if ctx.romantic.is_romantic && ctx.romantic.allows_flirting {
            TEASER
        } else if ctx.is_emotional {
            CONFIDANT
        } else {
            return None;
        };
        self.catalog.contains(suggestion).then_some(suggestion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::EmotionalAnalyzer;
    use kindred_types::emotion::ContextCondition;

    fn system() -> PersonaSystem {
        PersonaSystem::new(Arc::new(PersonaCatalog::default()), 5)
    }

    fn context(conditions: &[ContextCondition], restrictions: &[&str]) -> PersonaContext {
        PersonaContext {
            conditions: conditions.iter().copied().collect(),
            restrictions: restrictions.iter().map(|r| r.to_string()).collect(),
        }
    }

    #[test]
    fn switch_records_event_and_deactivates_previous() {
        let mut ps = system();
        let now = Utc::now();
        let first = ps.switch_persona(GEEKY_ASSISTANT, "tech talk", now).unwrap();
        assert_eq!(first.from, None);

        let second = ps.switch_persona(CONFIDANT, "user upset", now).unwrap();
        assert_eq!(second.from.as_deref(), Some(GEEKY_ASSISTANT));
        assert_eq!(ps.current_persona_id(), Some(CONFIDANT));
        assert!(ps.current_persona().unwrap().active);
        assert_eq!(ps.current_persona().unwrap().last_used, Some(now));
        assert_eq!(ps.history().len(), 2);
    }

    #[test]
    fn unknown_persona_is_rejected_and_state_kept() {
        let mut ps = system();
        let now = Utc::now();
        ps.switch_persona(TEASER, "start", now).unwrap();

        let err = ps.switch_persona("nonexistent_id", "test", now).unwrap_err();
        assert!(matches!(err, PersonaError::UnknownPersona(_)));
        assert_eq!(ps.current_persona_id(), Some(TEASER));
        assert_eq!(ps.history().len(), 1);
    }

    #[test]
    fn cooldown_blocks_reactivation() {
        let mut ps = system();
        let now = Utc::now();
        ps.switch_persona(GEEKY_ASSISTANT, "a", now).unwrap();
        ps.switch_persona(CONFIDANT, "b", now + Duration::minutes(1)).unwrap();

        let err = ps
            .switch_persona(GEEKY_ASSISTANT, "c", now + Duration::minutes(2))
            .unwrap_err();
        match err {
            PersonaError::CoolingDown { remaining_secs, .. } => assert_eq!(remaining_secs, 180),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(ps.current_persona_id(), Some(CONFIDANT));

        ps.switch_persona(GEEKY_ASSISTANT, "c", now + Duration::minutes(5))
            .unwrap();
        assert_eq!(ps.current_persona_id(), Some(GEEKY_ASSISTANT));
    }

    #[test]
    fn out_of_range_cooldown_never_expires() {
        let mut ps = PersonaSystem::new(Arc::new(PersonaCatalog::default()), i64::MAX);
        let now = Utc::now();
        ps.switch_persona(GEEKY_ASSISTANT, "a", now).unwrap();
        ps.switch_persona(CONFIDANT, "b", now).unwrap();
        let err = ps
            .switch_persona(GEEKY_ASSISTANT, "c", now + Duration::days(365))
            .unwrap_err();
        assert!(matches!(err, PersonaError::CoolingDown { .. }));
    }

    #[test]
    fn response_style_is_empty_without_persona() {
        let ps = system();
        let style = ps.get_response_style(&context(&[ContextCondition::Technical], &[]));
        assert!(style.is_empty());
    }

    #[test]
    fn response_style_picks_highest_priority_match() {
        let mut ps = system();
        ps.switch_persona(TEASER, "start", Utc::now()).unwrap();

        let style = ps.get_response_style(&context(
            &[
                ContextCondition::Romantic,
                ContextCondition::FemininePresence,
                ContextCondition::FlirtingAllowed,
            ],
            &[],
        ));
        assert_eq!(style.response, "romantic");
        assert_eq!(style.priority, 2);
        assert_eq!(style.persona_id.as_deref(), Some(TEASER));
    }

    #[test]
    fn constrained_rules_are_skipped() {
        let mut ps = system();
        ps.switch_persona(TEASER, "start", Utc::now()).unwrap();
        let style = ps.get_response_style(&context(
            &[ContextCondition::Romantic, ContextCondition::Casual],
            &[kindred_types::persona::FLIRTING_DISALLOWED],
        ));
        assert_eq!(style.response, "banter");
    }

    #[test]
    fn priority_ties_go_to_declaration_order() {
        let mut persona = PersonaCatalog::default().get(CONFIDANT).unwrap().clone();
        persona.id = "twin".to_string();
        for rule in &mut persona.style_rules {
            rule.priority = 1;
        }
        let catalog = PersonaCatalog::new(vec![persona]);
        let mut ps = PersonaSystem::new(Arc::new(catalog), 5);
        ps.switch_persona("twin", "start", Utc::now()).unwrap();
        let style = ps.get_response_style(&context(
            &[ContextCondition::Emotional, ContextCondition::Casual],
            &[],
        ));
        assert_eq!(style.response, "supportive");
    }

    #[test]
    fn suggestions_follow_context() {
        let ps = system();
        let now = Utc::now();
        let analyzer = EmotionalAnalyzer::new();

        let tech = analyzer.analyze("my rust compiler backend code is broken", None, now);
        assert_eq!(ps.suggest_transition(&tech), Some(GEEKY_ASSISTANT));

        let sad = analyzer.analyze("i feel so sad and lonely and hurt", None, now);
        assert_eq!(ps.suggest_transition(&sad), Some(CONFIDANT));

        let plain = analyzer.analyze("ok", None, now);
        assert_eq!(ps.suggest_transition(&plain), None);
    }

    #[test]
    fn restore_skips_history() {
        let mut ps = system();
        assert!(ps.restore(CONFIDANT, Utc::now()));
        assert!(!ps.restore("gone", Utc::now()));
        assert_eq!(ps.current_persona_id(), Some(CONFIDANT));
        assert!(ps.history().is_empty());
    }
}
