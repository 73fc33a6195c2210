//! Per-session mood state machine.
//!
//! Each update decays the current intensity over wall-clock time, nudges it by
//! the message's affect and arousal, then re-scores the pattern catalog to pick
//! the next primary mood. The previous state is always pushed to history first.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use kindred_types::config::MoodConfig;
use kindred_types::emotion::EmotionalContext;
use kindred_types::mood::{BASELINE_INTENSITY, ContextSnapshot, MoodPattern, MoodState, NEUTRAL_MOOD};
use tracing::debug;

use super::patterns::PERSONALITY_BIASES;

/// Boost applied to the mood the user reported for themselves.
const USER_MOOD_BOOST: f64 = 1.2;

#[derive(Debug, Clone)]
pub struct MoodEngine {
    config: MoodConfig,
    patterns: Arc<Vec<MoodPattern>>,
    current: MoodState,
    history: VecDeque<MoodState>,
    last_scores: BTreeMap<String, f64>,
}

impl MoodEngine {
    /// Start at neutral with baseline intensity.
    pub fn new(config: MoodConfig, patterns: Arc<Vec<MoodPattern>>, now: DateTime<Utc>) -> Self {
        Self::with_state(config, patterns, MoodState::neutral(now))
    }

    /// Resume from a previously persisted state.
    pub fn with_state(
        config: MoodConfig,
        patterns: Arc<Vec<MoodPattern>>,
        mut state: MoodState,
    ) -> Self {
        state.intensity = state.intensity.clamp(0.0, config.max_intensity);
        Self {
            config,
            patterns,
            current: state,
            history: VecDeque::new(),
            last_scores: BTreeMap::new(),
        }
    }

    pub fn current(&self) -> &MoodState {
        &self.current
    }

    /// Previous states, oldest first.
    pub fn history(&self) -> &VecDeque<MoodState> {
        &self.history
    }

    /// Raw per-mood scores computed by the last update.
    pub fn last_scores(&self) -> &BTreeMap<String, f64> {
        &self.last_scores
    }

    pub fn config(&self) -> &MoodConfig {
        &self.config
    }

    /// Current intensity decayed to `at`.
    pub fn decayed_intensity(&self, at: DateTime<Utc>) -> f64 {
        let hours = hours_between(self.current.timestamp, at);
        self.current.intensity * (-self.config.decay_rate * hours).exp()
    }

    /// Apply a message's signals and return the new state.
    pub fn update(&mut self, ctx: &EmotionalContext) -> MoodState {
        if ctx.mood_reset_requested {
            return self.reset(ctx.timestamp);
        }

        let now = ctx.timestamp;
        let hours = hours_between(self.current.timestamp, now);
        let decayed = self.decayed_intensity(now);

        let affect = ctx.sentiment.abs();
        let arousal = ctx.intensity - 0.5;
        let intensity = (decayed + (affect + arousal) * self.config.change_threshold)
            .clamp(0.0, self.config.max_intensity);

        // No tokens means no evidence for a shift.
        let scores = if ctx.keywords.is_empty() {
            Vec::new()
        } else {
            score_moods(&self.patterns, ctx, hours)
        };

        let best = scores
            .iter()
            .fold(None::<&(String, f64)>, |best, candidate| match best {
                Some(b) if b.1 >= candidate.1 => Some(b),
                _ => Some(candidate),
            });

        let primary_mood = match best {
            Some((mood, score)) if *score >= self.config.shift_threshold => mood.clone(),
            _ if decayed > self.config.shift_threshold => self.current.primary_mood.clone(),
            _ => NEUTRAL_MOOD.to_string(),
        };

        debug!(
            mood = %primary_mood,
            intensity,
            decayed,
            top_score = best.map(|b| b.1).unwrap_or(0.0),
            "Mood updated"
        );

        self.last_scores = scores.into_iter().collect();
        self.replace(MoodState {
            primary_mood,
            intensity,
            timestamp: now,
            context: Some(ContextSnapshot::from(ctx)),
        });
        self.current.clone()
    }

    /// Return to neutral at baseline intensity. Counts as an update.
    pub fn reset(&mut self, now: DateTime<Utc>) -> MoodState {
        self.last_scores.clear();
        self.replace(MoodState {
            primary_mood: NEUTRAL_MOOD.to_string(),
            intensity: BASELINE_INTENSITY.min(self.config.max_intensity),
            timestamp: now,
            context: None,
        });
        debug!("Mood reset to neutral");
        self.current.clone()
    }

    /// Multiply the current intensity in place, clamped. Does not touch history.
    pub fn scale_intensity(&mut self, factor: f64) -> f64 {
        self.current.intensity =
            (self.current.intensity * factor).clamp(0.0, self.config.max_intensity);
        self.current.intensity
    }

    fn replace(&mut self, next: MoodState) {
        let previous = std::mem::replace(&mut self.current, next);
        self.history.push_back(previous);
        while self.history.len() > self.config.history_limit {
            self.history.pop_front();
        }
    }
}

fn hours_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_milliseconds().max(0) as f64 / 3_600_000.0
}

fn keyword_matches(pattern: &MoodPattern, ctx: &EmotionalContext, lower: &str) -> usize {
    pattern
        .keywords
        .iter()
        .filter(|k| {
            if k.contains(' ') {
                lower.contains(k.as_str())
            } else {
                ctx.keywords.iter().any(|w| w == *k)
            }
        })
        .count()
}

fn score_pattern(pattern: &MoodPattern, ctx: &EmotionalContext, lower: &str, hours: f64) -> f64 {
    let keyword_score = (keyword_matches(pattern, ctx, lower) as f64 * 0.2).min(1.0);
    let sentiment_alignment = 1.0 - (pattern.sentiment - ctx.sentiment).abs();
    let intensity_factor = (ctx.intensity * pattern.intensity).min(1.0);

    let blend = keyword_score * 0.4 + sentiment_alignment * 0.3 + intensity_factor * 0.3;
    blend * (-pattern.decay_rate * hours).exp()
}

/// Score every mood in the catalog against `ctx`.
///
/// Returned in catalog order of first appearance. Gated moods score zero.
pub fn score_moods(
    patterns: &[MoodPattern],
    ctx: &EmotionalContext,
    hours: f64,
) -> Vec<(String, f64)> {
    let lower = ctx.raw_input.to_lowercase();
    // (mood, best score among open patterns, any pattern open)
    let mut moods: Vec<(String, f64, bool)> = Vec::new();

    for pattern in patterns {
        let open = pattern.requires.iter().all(|c| c.holds(ctx))
            && !pattern.excludes.iter().any(|c| c.holds(ctx));
        let score = if open {
            score_pattern(pattern, ctx, &lower, hours)
        } else {
            0.0
        };

        match moods.iter_mut().find(|(mood, _, _)| *mood == pattern.mood) {
            Some(entry) => {
                entry.1 = entry.1.max(score);
                entry.2 |= open;
            }
            None => moods.push((pattern.mood.clone(), score, open)),
        }
    }

    moods
        .into_iter()
        .map(|(mood, score, open)| {
            if !open {
                return (mood, 0.0);
            }
            let bias = PERSONALITY_BIASES
                .iter()
                .find(|(m, _)| *m == mood)
                .map(|(_, b)| *b)
                .unwrap_or(0.0);
            let mut score = (score + bias).min(1.0);
            if ctx.user_mood.as_deref() == Some(mood.as_str()) {
                score = (score * USER_MOOD_BOOST).min(1.0);
            }
            (mood, score)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::EmotionalAnalyzer;
    use crate::mood::patterns::default_mood_patterns;
    use chrono::Duration;

    fn engine(now: DateTime<Utc>) -> MoodEngine {
        MoodEngine::new(MoodConfig::default(), Arc::new(default_mood_patterns()), now)
    }

    fn ctx(text: &str, now: DateTime<Utc>) -> EmotionalContext {
        EmotionalAnalyzer::new().analyze(text, None, now)
    }

    #[test]
    fn playful_message_shifts_neutral_to_playful() {
        let t0 = Utc::now();
        let mut engine = engine(t0);
        let baseline = engine.decayed_intensity(t0);

        let state = engine.update(&ctx("haha that's so fun lol", t0));

        assert_eq!(state.primary_mood, "playful");
        assert!(state.intensity > baseline);
        assert_eq!(engine.history().len(), 1);
        assert_eq!(engine.history()[0].primary_mood, "neutral");
    }

    #[test]
    fn intensity_stays_within_bounds() {
        let t0 = Utc::now();
        let mut engine = engine(t0);
        let messages = [
            "",
            "GREAT AMAZING AWESOME so very really!!",
            "awful terrible horrible worst",
            "haha lol 😂 fun play joke tease so!!",
            "   ",
            "quantum theory algorithm is so complex and interesting!!",
        ];
        for (i, msg) in messages.iter().cycle().take(60).enumerate() {
            let at = t0 + Duration::minutes(i as i64 * 7);
            let state = engine.update(&ctx(msg, at));
            assert!(state.intensity >= 0.0);
            assert!(state.intensity <= engine.config().max_intensity);
        }
    }

    #[test]
    fn history_grows_by_one_per_update_until_cap() {
        let t0 = Utc::now();
        let config = MoodConfig {
            history_limit: 4,
            ..Default::default()
        };
        let mut engine = MoodEngine::new(config, Arc::new(default_mood_patterns()), t0);
        for i in 0..4 {
            engine.update(&ctx("hello", t0));
            assert_eq!(engine.history().len(), i + 1);
        }
        for _ in 0..3 {
            engine.update(&ctx("hello", t0));
            assert_eq!(engine.history().len(), 4);
        }
    }

    #[test]
    fn flirty_is_zero_without_allowance() {
        let t0 = Utc::now();
        let mut engine = engine(t0);
        engine.update(&ctx("you are so cute and gorgeous and pretty", t0));
        assert_eq!(engine.last_scores().get("flirty"), Some(&0.0));
        assert_ne!(engine.current().primary_mood, "flirty");
    }

    #[test]
    fn flirty_allowed_in_romantic_context() {
        let t0 = Utc::now();
        let mut engine = engine(t0);
        engine.update(&ctx("my girlfriend says you are cute and gorgeous", t0));
        assert!(engine.last_scores()["flirty"] > 0.0);
    }

    #[test]
    fn empty_input_decays_without_shift() {
        let t0 = Utc::now();
        let state = MoodState {
            primary_mood: "playful".to_string(),
            intensity: 0.9,
            timestamp: t0,
            context: None,
        };
        let mut engine =
            MoodEngine::with_state(MoodConfig::default(), Arc::new(default_mood_patterns()), state);

        let kept = engine.update(&ctx("", t0 + Duration::hours(1)));
        assert_eq!(kept.primary_mood, "playful");
        assert!((kept.intensity - 0.9 * (-0.1f64).exp()).abs() < 1e-9);

        let faded = engine.update(&ctx("", t0 + Duration::hours(30)));
        assert_eq!(faded.primary_mood, "neutral");
        assert!(faded.intensity < kept.intensity);
    }

    #[test]
    fn reset_request_returns_to_baseline() {
        let t0 = Utc::now();
        let mut engine = engine(t0);
        engine.update(&ctx("haha that's so fun lol", t0));
        let state = engine.update(&ctx("please forget my mood", t0));
        assert_eq!(state.primary_mood, "neutral");
        assert_eq!(state.intensity, 0.5);
        assert_eq!(engine.history().len(), 2);
        assert!(engine.last_scores().is_empty());
    }

    #[test]
    fn user_mood_is_boosted() {
        let t0 = Utc::now();
        let patterns = default_mood_patterns();
        let plain = ctx("quantum theory", t0);
        let mut hinted = plain.clone();
        hinted.user_mood = Some("intellectual".to_string());

        let base = score_moods(&patterns, &plain, 0.0);
        let boosted = score_moods(&patterns, &hinted, 0.0);
        let get = |scores: &[(String, f64)]| {
            scores.iter().find(|(m, _)| m == "intellectual").map(|(_, s)| *s).unwrap()
        };
        assert!(get(&boosted) > get(&base));
        assert!(get(&boosted) <= 1.0);
    }

    #[test]
    fn scale_intensity_clamps() {
        let t0 = Utc::now();
        let mut engine = engine(t0);
        assert_eq!(engine.scale_intensity(10.0), 1.0);
        assert_eq!(engine.scale_intensity(-1.0), 0.0);
        assert!(engine.history().is_empty());
    }
}
