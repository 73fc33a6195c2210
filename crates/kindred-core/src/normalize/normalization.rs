//! Bounded normalization of biased mood scores.
//!
//! Order of operations per mood: trait weight, context weight, min/max
//! thresholds, smoothing against the previous turn, gate re-zeroing. A mood
//! missing from the previous vector counts as 0. The resulting vector is
//! scaled down proportionally if it sums above 1.

use std::collections::BTreeMap;

use kindred_types::config::NormalizationConfig;
use kindred_types::emotion::EmotionalContext;

/// Slack before a vector sum counts as above 1, so rescaling stays idempotent.
const SUM_EPSILON: f64 = 1e-12;

#[derive(Debug, Clone)]
pub struct NormalizationRules {
    trait_weights: BTreeMap<String, f64>,
    default_weight: f64,
    min_thresholds: BTreeMap<String, f64>,
    max_thresholds: BTreeMap<String, f64>,
    context_weighting: bool,
    max_change: f64,
    emotional_max_change: f64,
}

impl NormalizationRules {
    pub fn from_config(config: &NormalizationConfig) -> Self {
        let map = |entries: &[(&str, f64)]| -> BTreeMap<String, f64> {
            entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
        };
        Self {
            trait_weights: map(&[
                ("flirty", 0.9),
                ("intellectual", 0.8),
                ("sassy", 0.7),
                ("protective", 0.6),
                ("playful", 0.5),
                ("neutral", 0.3),
            ]),
            default_weight: 0.5,
            min_thresholds: map(&[
                ("flirty", 0.3),
                ("sassy", 0.2),
                ("intellectual", 0.15),
                ("protective", 0.25),
                ("playful", 0.1),
            ]),
            max_thresholds: map(&[
                ("flirty", 0.8),
                ("sassy", 0.9),
                ("intellectual", 0.95),
                ("protective", 0.85),
                ("playful", 0.7),
            ]),
            context_weighting: true,
            max_change: config.max_change,
            emotional_max_change: config.emotional_max_change,
        }
    }

    /// Unit weights, no thresholds, no context weighting, unbounded change.
    /// Only the flirting gate and the sum rescale remain.
    pub fn identity() -> Self {
        Self {
            trait_weights: BTreeMap::new(),
            default_weight: 1.0,
            min_thresholds: BTreeMap::new(),
            max_thresholds: BTreeMap::new(),
            context_weighting: false,
            max_change: f64::INFINITY,
            emotional_max_change: f64::INFINITY,
        }
    }

    fn context_weight(&self, mood: &str, ctx: &EmotionalContext) -> f64 {
        if !self.context_weighting {
            return 1.0;
        }
        let mut weight = 1.0;
        if mood == "flirty" && ctx.romantic.is_romantic {
            weight *= 1.2;
        }
        if ctx.is_emotional {
            match mood {
                "protective" | "caring" => weight *= 1.3,
                "sassy" => weight *= 0.7,
                _ => {}
            }
        }
        weight
    }
}

impl Default for NormalizationRules {
    fn default() -> Self {
        Self::from_config(&NormalizationConfig::default())
    }
}

fn is_gated(mood: &str, ctx: &EmotionalContext) -> bool {
    mood == "flirty" && !ctx.romantic.allows_flirting
}

/// Normalize `scores` against `previous` (the last normalized vector).
pub fn normalize_scores(
    rules: &NormalizationRules,
    scores: &BTreeMap<String, f64>,
    ctx: &EmotionalContext,
    previous: &BTreeMap<String, f64>,
) -> BTreeMap<String, f64> {
    let max_change = if ctx.is_emotional {
        rules.emotional_max_change
    } else {
        rules.max_change
    };

    let mut out: BTreeMap<String, f64> = scores
        .iter()
        .map(|(mood, raw)| {
            if is_gated(mood, ctx) {
                return (mood.clone(), 0.0);
            }
            let weight = rules
                .trait_weights
                .get(mood)
                .copied()
                .unwrap_or(rules.default_weight);
            let mut score = raw * weight * rules.context_weight(mood, ctx);

            if let Some(min) = rules.min_thresholds.get(mood) {
                if score < *min {
                    score = 0.0;
                }
            }
            if let Some(max) = rules.max_thresholds.get(mood) {
                score = score.min(*max);
            }

            let prev = previous.get(mood).copied().unwrap_or(0.0);
            score = prev + (score - prev).clamp(-max_change, max_change);

            if is_gated(mood, ctx) {
                score = 0.0;
            }
            (mood.clone(), score.clamp(0.0, 1.0))
        })
        .collect();

    let sum: f64 = out.values().sum();
    if sum > 1.0 + SUM_EPSILON {
        for value in out.values_mut() {
            *value /= sum;
        }
    }
    out
}

/// Stateful normalizer remembering the previous normalized vector.
#[derive(Debug, Clone, Default)]
pub struct MoodNormalizer {
    rules: NormalizationRules,
    previous: BTreeMap<String, f64>,
}

impl MoodNormalizer {
    pub fn new(rules: NormalizationRules) -> Self {
        Self {
            rules,
            previous: BTreeMap::new(),
        }
    }

    pub fn previous(&self) -> &BTreeMap<String, f64> {
        &self.previous
    }

    pub fn normalize(
        &mut self,
        scores: &BTreeMap<String, f64>,
        ctx: &EmotionalContext,
    ) -> BTreeMap<String, f64> {
        let out = normalize_scores(&self.rules, scores, ctx, &self.previous);
        self.previous = out.clone();
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn scores(entries: &[(&str, f64)]) -> BTreeMap<String, f64> {
        entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn ctx() -> EmotionalContext {
        EmotionalContext::neutral("hi", Utc::now())
    }

    #[test]
    fn flirty_is_zero_when_not_allowed() {
        let rules = NormalizationRules::default();
        let previous = scores(&[("flirty", 0.8)]);
        for raw in [0.0, 0.4, 1.0, 25.0] {
            let out = normalize_scores(&rules, &scores(&[("flirty", raw)]), &ctx(), &previous);
            assert_eq!(out["flirty"], 0.0);
        }
    }

    #[test]
    fn flirty_is_weighted_up_in_romance() {
        let rules = NormalizationRules::default();
        let mut c = ctx();
        c.romantic.allows_flirting = true;
        c.romantic.is_romantic = true;
        let previous = scores(&[("flirty", 0.5)]);
        let out = normalize_scores(&rules, &scores(&[("flirty", 0.5)]), &c, &previous);
        assert!((out["flirty"] - 0.5 * 0.9 * 1.2).abs() < 1e-9);
    }

    #[test]
    fn thresholds_apply() {
        let rules = NormalizationRules::default();
        let out = normalize_scores(
            &rules,
            &scores(&[("sassy", 0.2), ("playful", 1.0)]),
            &ctx(),
            &scores(&[("playful", 0.4)]),
        );
        // 0.2 * 0.7 = 0.14 < 0.2 minimum
        assert_eq!(out["sassy"], 0.0);
        // 1.0 * 0.5 = 0.5 below the 0.7 cap
        assert!((out["playful"] - 0.5).abs() < 1e-9);

        let out = normalize_scores(
            &rules,
            &scores(&[("intellectual", 1.0)]),
            &ctx(),
            &scores(&[("intellectual", 0.6)]),
        );
        assert!((out["intellectual"] - 0.8).abs() < 1e-9);
    }

    #[test]
    fn smoothing_caps_change_per_turn() {
        let rules = NormalizationRules::default();
        let previous = scores(&[("intellectual", 0.1)]);
        let out = normalize_scores(&rules, &scores(&[("intellectual", 1.0)]), &ctx(), &previous);
        assert!((out["intellectual"] - 0.4).abs() < 1e-9);

        let mut emotional = ctx();
        emotional.is_emotional = true;
        let out = normalize_scores(&rules, &scores(&[("intellectual", 1.0)]), &emotional, &previous);
        assert!((out["intellectual"] - 0.6).abs() < 1e-9);
    }

    #[test]
    fn missing_previous_value_counts_as_zero() {
        let rules = NormalizationRules::default();
        let out = normalize_scores(&rules, &scores(&[("intellectual", 1.0)]), &ctx(), &BTreeMap::new());
        assert!((out["intellectual"] - 0.3).abs() < 1e-9);
    }

    #[test]
    fn empty_turn_does_not_lift_the_change_cap() {
        let mut normalizer = MoodNormalizer::new(NormalizationRules::default());
        let first = normalizer.normalize(&scores(&[("intellectual", 0.25)]), &ctx());
        assert!((first["intellectual"] - 0.2).abs() < 1e-9);

        assert!(normalizer.normalize(&BTreeMap::new(), &ctx()).is_empty());

        let spike = normalizer.normalize(&scores(&[("intellectual", 1.0)]), &ctx());
        assert!(spike["intellectual"] <= 0.3 + 1e-9);
    }

    #[test]
    fn emotional_context_reweights_protective_and_sassy() {
        let rules = NormalizationRules::default();
        let mut c = ctx();
        c.is_emotional = true;
        let out = normalize_scores(
            &rules,
            &scores(&[("protective", 0.5), ("sassy", 0.5)]),
            &c,
            &BTreeMap::new(),
        );
        assert!((out["protective"] - 0.5 * 0.6 * 1.3).abs() < 1e-9);
        assert!((out["sassy"] - 0.5 * 0.7 * 0.7).abs() < 1e-9);
    }

    #[test]
    fn vector_is_rescaled_when_sum_exceeds_one() {
        let rules = NormalizationRules::identity();
        let out = normalize_scores(
            &rules,
            &scores(&[("a", 0.9), ("b", 0.6), ("c", 0.3)]),
            &ctx(),
            &BTreeMap::new(),
        );
        let sum: f64 = out.values().sum();
        assert!((sum - 1.0).abs() < 1e-9);
        assert!((out["a"] / out["c"] - 3.0).abs() < 1e-9);
    }

    #[test]
    fn normalize_is_idempotent_under_identity_rules() {
        let mut normalizer = MoodNormalizer::new(NormalizationRules::identity());
        let input = scores(&[("playful", 0.7), ("sassy", 0.5), ("flirty", 0.4)]);
        let once = normalizer.normalize(&input, &ctx());
        let twice = normalizer.normalize(&once, &ctx());
        assert_eq!(once, twice);
        assert_eq!(once["flirty"], 0.0);
    }

    #[test]
    fn already_normalized_vector_is_unchanged() {
        let mut normalizer = MoodNormalizer::new(NormalizationRules::identity());
        let input = scores(&[("playful", 0.4), ("sassy", 0.3)]);
        normalizer.normalize(&input, &ctx());
        assert_eq!(normalizer.normalize(&input, &ctx()), input);
    }
}
