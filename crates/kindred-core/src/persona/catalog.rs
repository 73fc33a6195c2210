//! Built-in personas and the immutable catalog shared across sessions.

use std::collections::BTreeMap;

use kindred_types::emotion::ContextCondition;
use kindred_types::persona::{FLIRTING_DISALLOWED, Persona, StyleRule};
use tracing::debug;

pub const TEASER: &str = "teaser";
pub const GEEKY_ASSISTANT: &str = "geeky_assistant";
pub const CONFIDANT: &str = "confidant";

fn weights(entries: &[(&str, f64)]) -> BTreeMap<String, f64> {
    entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

fn rule(condition: ContextCondition, response: &str, tone: &str, priority: u8) -> StyleRule {
    StyleRule {
        condition,
        response: response.to_string(),
        tone: tone.to_string(),
        priority,
        constraints: Vec::new(),
    }
}

pub fn default_personas() -> Vec<Persona> {
    let mut romantic = rule(ContextCondition::Romantic, "romantic", "gentle", 2);
    romantic.constraints.push(FLIRTING_DISALLOWED.to_string());
    let mut feminine = rule(ContextCondition::FemininePresence, "flirty", "playful", 1);
    feminine.constraints.push(FLIRTING_DISALLOWED.to_string());

    vec![
        Persona {
            id: TEASER.to_string(),
            name: "Teaser".to_string(),
            description: "Playful, confident and openly flirtatious when invited".to_string(),
            traits: weights(&[
                ("flirty", 0.9),
                ("playful", 0.8),
                ("confident", 0.7),
                ("gentle", 0.6),
                ("romantic", 0.8),
            ]),
            mood_bias: weights(&[("flirty", 0.3), ("playful", 0.2), ("romantic", 0.2)]),
            style_rules: vec![
                feminine,
                romantic,
                rule(ContextCondition::Casual, "banter", "playful", 0),
            ],
            constraints: vec!["consensual_flirting_only".to_string()],
            active: false,
            last_used: None,
        },
        Persona {
            id: GEEKY_ASSISTANT.to_string(),
            name: "Geeky Assistant".to_string(),
            description: "Precise and enthusiastic about technical detail".to_string(),
            traits: weights(&[
                ("analytical", 0.9),
                ("helpful", 0.8),
                ("enthusiastic", 0.7),
                ("nerdy", 0.8),
                ("precise", 0.9),
            ]),
            mood_bias: weights(&[("focused", 0.3), ("excited", 0.2), ("intellectual", 0.2)]),
            style_rules: vec![
                rule(ContextCondition::Technical, "detailed", "enthusiastic", 1),
                rule(ContextCondition::Emotional, "reassuring", "warm", 0),
            ],
            constraints: Vec::new(),
            active: false,
            last_used: None,
        },
        Persona {
            id: CONFIDANT.to_string(),
            name: "Confidant".to_string(),
            description: "Steady, protective listener for heavy moments".to_string(),
            traits: weights(&[
                ("empathetic", 0.9),
                ("protective", 0.8),
                ("patient", 0.8),
                ("gentle", 0.7),
            ]),
            mood_bias: weights(&[("protective", 0.3), ("sassy", -0.2), ("playful", -0.1)]),
            style_rules: vec![
                rule(ContextCondition::Emotional, "supportive", "gentle", 2),
                rule(ContextCondition::Casual, "attentive", "calm", 0),
            ],
            constraints: Vec::new(),
            active: false,
            last_used: None,
        },
    ]
}

/// Immutable persona catalog, built once and shared behind `Arc`.
#[derive(Debug, Clone)]
pub struct PersonaCatalog {
    personas: Vec<Persona>,
}

impl Default for PersonaCatalog {
    fn default() -> Self {
        Self::new(default_personas())
    }
}

impl PersonaCatalog {
    pub fn new(personas: Vec<Persona>) -> Self {
        let personas = personas
            .into_iter()
            .map(|mut p| {
                p.active = false;
                p.last_used = None;
                p
            })
            .collect();
        Self { personas }
    }

    /// Built-in personas with `extra` layered on top. An extra persona with a
    /// built-in id replaces it.
    pub fn with_overrides(extra: &[Persona]) -> Self {
        let mut personas = default_personas();
        for persona in extra {
            match personas.iter_mut().find(|p| p.id == persona.id) {
                Some(existing) => {
                    debug!(persona = %persona.id, "Overriding built-in persona");
                    *existing = persona.clone();
                }
                None => personas.push(persona.clone()),
            }
        }
        Self::new(personas)
    }

    pub fn get(&self, id: &str) -> Option<&Persona> {
        self.personas.iter().find(|p| p.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Persona> {
        self.personas.iter()
    }

    pub fn len(&self) -> usize {
        self.personas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.personas.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_catalog_has_three_personas() {
        let catalog = PersonaCatalog::default();
        assert_eq!(catalog.len(), 3);
        for id in [TEASER, GEEKY_ASSISTANT, CONFIDANT] {
            assert!(catalog.contains(id), "missing {id}");
        }
        assert!(catalog.iter().all(|p| !p.active));
    }

    #[test]
    fn teaser_romantic_rule_is_constrained() {
        let catalog = PersonaCatalog::default();
        let teaser = catalog.get(TEASER).unwrap();
        let romantic = teaser
            .style_rules
            .iter()
            .find(|r| r.condition == ContextCondition::Romantic)
            .unwrap();
        assert_eq!(romantic.constraints, vec![FLIRTING_DISALLOWED.to_string()]);
    }

    #[test]
    fn overrides_replace_and_extend() {
        let mut geeky = PersonaCatalog::default().get(GEEKY_ASSISTANT).unwrap().clone();
        geeky.name = "Hacker".to_string();
        geeky.active = true;
        let muse = Persona {
            id: "muse".to_string(),
            name: "Muse".to_string(),
            description: String::new(),
            traits: BTreeMap::new(),
            mood_bias: BTreeMap::new(),
            style_rules: Vec::new(),
            constraints: Vec::new(),
            active: false,
            last_used: None,
        };

        let catalog = PersonaCatalog::with_overrides(&[geeky, muse]);
        assert_eq!(catalog.len(), 4);
        let geeky = catalog.get(GEEKY_ASSISTANT).unwrap();
        assert_eq!(geeky.name, "Hacker");
        assert!(!geeky.active);
        assert!(catalog.contains("muse"));
    }
}
