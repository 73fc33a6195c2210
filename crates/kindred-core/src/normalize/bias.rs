//! Personality and contextual bias applied to raw mood scores.

use std::collections::BTreeMap;

use kindred_types::emotion::{ContextKind, EmotionalContext};
use kindred_types::persona::Persona;

/// Long-lived character traits, keyed by the mood they lean toward.
const CORE_TRAITS: &[(&str, f64)] = &[
    ("flirty", 0.9),
    ("intellectual", 0.8),
    ("sassy", 0.7),
    ("protective", 0.6),
    ("playful", 0.6),
];

/// Baseline mood leanings, averaged with the core traits.
const MOOD_BIAS: &[(&str, f64)] = &[
    ("flirty", 0.7),
    ("intellectual", 0.8),
    ("playful", 0.6),
    ("protective", 0.5),
    ("sassy", 0.6),
];

/// Additive adjustments per context kind.
const CONTEXT_RULES: &[(ContextKind, &[(&str, f64)])] = &[
    (ContextKind::Technical, &[("intellectual", 0.4), ("playful", -0.1)]),
    (ContextKind::Emotional, &[("protective", 0.5), ("sassy", -0.3)]),
    (ContextKind::Romantic, &[("flirty", 0.3), ("protective", 0.2)]),
];

#[derive(Debug, Clone)]
pub struct BiasHandler {
    base: BTreeMap<String, f64>,
}

impl Default for BiasHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl BiasHandler {
    pub fn new() -> Self {
        let mut base: BTreeMap<String, f64> = CORE_TRAITS
            .iter()
            .map(|(mood, v)| (mood.to_string(), *v))
            .collect();
        for (mood, bias) in MOOD_BIAS {
            base.entry(mood.to_string())
                .and_modify(|v| *v = (*v + bias) / 2.0)
                .or_insert(*bias);
        }
        Self { base }
    }

    /// Bias vector for this turn: base leanings, context rules, then the
    /// persona's own mood bias. Every entry is clamped to [0, 1].
    pub fn bias_vector(
        &self,
        ctx: &EmotionalContext,
        persona: Option<&Persona>,
    ) -> BTreeMap<String, f64> {
        let mut bias = self.base.clone();

        for (kind, adjustments) in CONTEXT_RULES {
            if ctx.has_context(*kind) {
                for (mood, delta) in *adjustments {
                    *bias.entry(mood.to_string()).or_insert(0.0) += delta;
                }
            }
        }

        if let Some(persona) = persona {
            for (mood, delta) in &persona.mood_bias {
                *bias.entry(mood.clone()).or_insert(0.0) += delta;
            }
        }

        for value in bias.values_mut() {
            *value = value.clamp(0.0, 1.0);
        }
        bias
    }

    /// Merge raw scores with the bias vector: `min(1, raw * (1 + bias))`.
    pub fn apply(
        &self,
        raw: &BTreeMap<String, f64>,
        ctx: &EmotionalContext,
        persona: Option<&Persona>,
    ) -> BTreeMap<String, f64> {
        let bias = self.bias_vector(ctx, persona);
        raw.iter()
            .map(|(mood, score)| {
                let b = bias.get(mood).copied().unwrap_or(0.0);
                (mood.clone(), (score * (1.0 + b)).min(1.0))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn base_bias_averages_traits_and_mood_bias() {
        let handler = BiasHandler::new();
        let ctx = EmotionalContext::neutral("hi", Utc::now());
        let bias = handler.bias_vector(&ctx, None);
        assert!((bias["flirty"] - 0.8).abs() < 1e-9);
        assert!((bias["sassy"] - 0.65).abs() < 1e-9);
        assert!((bias["protective"] - 0.55).abs() < 1e-9);
    }

    #[test]
    fn emotional_context_shifts_toward_protective() {
        let handler = BiasHandler::new();
        let mut ctx = EmotionalContext::neutral("i feel sad", Utc::now());
        ctx.is_emotional = true;
        let bias = handler.bias_vector(&ctx, None);
        assert_eq!(bias["protective"], 1.0);
        assert!((bias["sassy"] - 0.35).abs() < 1e-9);
    }

    #[test]
    fn persona_bias_is_added_and_clamped() {
        let handler = BiasHandler::new();
        let ctx = EmotionalContext::neutral("hi", Utc::now());
        let persona = Persona {
            id: "p".to_string(),
            name: "P".to_string(),
            description: String::new(),
            traits: BTreeMap::new(),
            mood_bias: BTreeMap::from([("focused".to_string(), 0.3), ("sassy".to_string(), -2.0)]),
            style_rules: Vec::new(),
            constraints: Vec::new(),
            active: false,
            last_used: None,
        };
        let bias = handler.bias_vector(&ctx, Some(&persona));
        assert!((bias["focused"] - 0.3).abs() < 1e-9);
        assert_eq!(bias["sassy"], 0.0);
    }

    #[test]
    fn apply_caps_at_one() {
        let handler = BiasHandler::new();
        let ctx = EmotionalContext::neutral("hi", Utc::now());
        let raw = BTreeMap::from([
            ("flirty".to_string(), 0.9),
            ("unknown".to_string(), 0.4),
        ]);
        let biased = handler.apply(&raw, &ctx, None);
        assert_eq!(biased["flirty"], 1.0);
        assert!((biased["unknown"] - 0.4).abs() < 1e-9);
    }
}
