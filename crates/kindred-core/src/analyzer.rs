//! Lexicon-based emotional context analysis.
//!
//! `EmotionalAnalyzer` turns a raw message into an [`EmotionalContext`]. It is
//! stateless and deterministic: the same text and timestamp always yield the
//! same context. Accuracy is not the goal here; stable, bounded signals are.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use kindred_types::emotion::{ContextKind, EmotionalContext, MessageCategory, RomanticContext};

/// Multi-word cues joined into a single keyword when their tokens are adjacent.
const CUE_PHRASES: &[(&[&str], &str)] = &[
    (&["well", "actually"], "well_actually"),
    (&["oh", "really"], "oh_really"),
    (&["sure", "jan"], "sure_jan"),
];

const THEMES: &[(&str, &[&str])] = &[
    (
        "romantic",
        &[
            "love", "romantic", "romance", "date", "dating", "girlfriend", "partner", "crush",
            "kiss", "cuddle", "darling", "babe", "intimate", "tender", "sweetheart", "wife",
        ],
    ),
    (
        "platonic",
        &["friend", "friends", "buddy", "bestie", "pal", "platonic", "teammate", "colleague"],
    ),
    (
        "professional",
        &[
            "work", "business", "professional", "meeting", "office", "client", "deadline",
            "manager", "boss", "colleague",
        ],
    ),
    (
        "serious",
        &[
            "death", "died", "funeral", "emergency", "hospital", "grief", "crisis", "urgent",
            "diagnosis", "lawsuit",
        ],
    ),
    (
        "feminine",
        &[
            "girl", "girls", "woman", "women", "lady", "ladies", "feminine", "sapphic", "she",
            "her", "girlfriend", "wife", "lesbian", "wlw",
        ],
    ),
    (
        "technical",
        &[
            "code", "coding", "programming", "software", "algorithm", "api", "database", "rust",
            "python", "golang", "javascript", "bug", "compiler", "server", "backend", "frontend",
            "github", "deploy", "debugging",
        ],
    ),
    (
        "emotional",
        &[
            "feel", "feeling", "feelings", "sad", "happy", "angry", "anxious", "worried",
            "stressed", "lonely", "excited", "upset", "hurt", "scared", "cry", "crying",
            "depressed", "miss",
        ],
    ),
    (
        "playful",
        &["haha", "lol", "lmao", "😂", "fun", "joke", "play", "tease", "silly", "hehe"],
    ),
];

const POSITIVE: &[&str] = &[
    "good", "great", "love", "happy", "fun", "awesome", "amazing", "cute", "beautiful", "nice",
    "wonderful", "excited", "haha", "lol", "lmao", "hehe", "😂", "thanks", "thank", "glad",
    "yay", "cool", "sweet", "pretty", "gorgeous", "interesting", "enjoy",
];

const NEGATIVE: &[&str] = &[
    "bad", "sad", "hate", "angry", "terrible", "awful", "worried", "anxious", "stressed",
    "lonely", "upset", "hurt", "scared", "tired", "depressed", "annoying", "horrible", "cry",
    "crying", "worst",
];

const INTENSIFIERS: &[&str] = &["very", "really", "so", "extremely", "super"];

const RELATIONAL_TERMS: &[&str] = &[
    "girlfriend", "partner", "date", "dating", "crush", "wife", "babe", "darling", "sweetheart",
    "romantic", "romance",
];

const FLIRT_INDICATORS: &[&str] = &[
    "cute", "pretty", "beautiful", "gorgeous", "hot", "flirt", "flirty", "wink", "😉", "😘",
    "kiss",
];

const EMOTIONAL_PHRASES: &[&str] = &[
    "i feel", "i'm feeling", "makes me", "my life", "for me", "i am so",
];

const SASSY_CUES: &[&str] = &["actually", "well_actually", "oh_really", "sure_jan", "whatever"];

/// Moods a user can report for themselves.
const USER_MOODS: &[&str] = &[
    "happy", "sad", "angry", "tired", "excited", "grumpy", "anxious", "stressed", "curious",
    "bored",
];

const MOOD_RESET_PHRASES: &[&str] = &[
    "forget my mood",
    "reset my mood",
    "ignore how i feel",
    "never mind my feelings",
    "i'm over it",
    "it doesn't matter how i feel",
    "change the subject",
    "move on from that",
    "stop talking about my mood",
];

/// Canonical primary emotion for emotion words.
const EMOTION_WORDS: &[(&str, &str)] = &[
    ("happy", "joy"),
    ("glad", "joy"),
    ("excited", "excitement"),
    ("sad", "sadness"),
    ("lonely", "sadness"),
    ("crying", "sadness"),
    ("angry", "anger"),
    ("hate", "anger"),
    ("anxious", "fear"),
    ("worried", "fear"),
    ("scared", "fear"),
    ("stressed", "stress"),
    ("love", "affection"),
];

/// Stateless analyzer producing one [`EmotionalContext`] per message.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmotionalAnalyzer;

impl EmotionalAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Analyze `text`. An explicit `user_mood_hint` wins over a mood stated in the text.
    pub fn analyze(
        &self,
        text: &str,
        user_mood_hint: Option<&str>,
        now: DateTime<Utc>,
    ) -> EmotionalContext {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            let mut ctx = EmotionalContext::neutral(text, now);
            ctx.user_mood = normalize_hint(user_mood_hint);
            return ctx;
        }

        let lower = trimmed.to_lowercase();
        let tokens = tokenize(&lower);
        let keywords = join_cue_phrases(&tokens);

        let themes = score_themes(&keywords);
        let theme = |name: &str| themes.get(name).copied().unwrap_or(0.0);

        let sentiment = score_sentiment(&keywords);

        let has_intensifier =
            lower.contains("!!") || tokens.iter().any(|t| INTENSIFIERS.contains(&t.as_str()));
        let theme_sum: f64 = themes.values().sum();
        let intensity =
            (0.5 + theme_sum * 0.1 + if has_intensifier { 0.2 } else { 0.0 }).min(1.0);

        let romantic = romantic_context(&keywords, &themes);

        let is_emotional =
            theme("emotional") > 0.5 || EMOTIONAL_PHRASES.iter().any(|p| lower.contains(p));
        let is_technical = theme("technical") > 0.5;

        let mut kinds = Vec::new();
        if is_emotional {
            kinds.push(ContextKind::Emotional);
        }
        if is_technical {
            kinds.push(ContextKind::Technical);
        }
        if romantic.is_romantic {
            kinds.push(ContextKind::Romantic);
        }
        let primary_context = kinds.first().copied().unwrap_or(ContextKind::Casual);
        let secondary_context = kinds.get(1).copied();

        let user_mood = normalize_hint(user_mood_hint).or_else(|| extract_user_mood(&lower));
        let primary_emotion = user_mood
            .clone()
            .or_else(|| {
                keywords.iter().find_map(|k| {
                    EMOTION_WORDS
                        .iter()
                        .find(|(word, _)| *word == k.as_str())
                        .map(|(_, emotion)| emotion.to_string())
                })
            })
            .unwrap_or_else(|| sentiment_label(sentiment).to_string());

        let emotional_tone = dominant_tone(&keywords, &themes, &romantic, is_emotional, intensity);

        EmotionalContext {
            raw_input: text.to_string(),
            sentiment,
            intensity,
            category: classify(&lower, &keywords),
            keywords,
            primary_emotion,
            romantic,
            themes,
            is_emotional,
            is_technical,
            primary_context,
            secondary_context,
            user_mood,
            mood_reset_requested: MOOD_RESET_PHRASES.iter().any(|p| lower.contains(p)),
            emotional_tone,
            timestamp: now,
        }
    }
}

fn normalize_hint(hint: Option<&str>) -> Option<String> {
    hint.map(|h| h.trim().to_lowercase()).filter(|h| !h.is_empty())
}

fn join_cue_phrases(tokens: &[String]) -> Vec<String> {
    let mut out = Vec::with_capacity(tokens.len());
    let mut i = 0;
    while i < tokens.len() {
        let rest = &tokens[i..];
        let cue = CUE_PHRASES.iter().find(|(words, _)| {
            rest.len() >= words.len() && words.iter().zip(rest).all(|(w, t)| *w == t.as_str())
        });
        match cue {
            Some((words, joined)) => {
                out.push(joined.to_string());
                i += words.len();
            }
            None => {
                out.push(tokens[i].clone());
                i += 1;
            }
        }
    }
    out
}

fn tokenize(lower: &str) -> Vec<String> {
    lower
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| c.is_ascii_punctuation() && c != '_'))
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

fn count_hits(keywords: &[String], lexicon: &[&str]) -> usize {
    keywords
        .iter()
        .filter(|k| lexicon.contains(&k.as_str()))
        .count()
}

fn score_themes(keywords: &[String]) -> BTreeMap<String, f64> {
    THEMES
        .iter()
        .filter_map(|(name, lexicon)| {
            let hits = count_hits(keywords, lexicon);
            (hits > 0).then(|| (name.to_string(), (hits as f64 / 3.0).min(1.0)))
        })
        .collect()
}

fn score_sentiment(keywords: &[String]) -> f64 {
    let positive = count_hits(keywords, POSITIVE) as f64;
    let negative = count_hits(keywords, NEGATIVE) as f64;
    ((positive - negative) * 0.3).clamp(-1.0, 1.0)
}

fn sentiment_label(sentiment: f64) -> &'static str {
    if sentiment > 0.3 {
        "positive"
    } else if sentiment < -0.3 {
        "negative"
    } else {
        "neutral"
    }
}

fn romantic_context(keywords: &[String], themes: &BTreeMap<String, f64>) -> RomanticContext {
    let theme = |name: &str| themes.get(name).copied().unwrap_or(0.0);

    let has_relational_term = count_hits(keywords, RELATIONAL_TERMS) > 0;
    let is_flirty = count_hits(keywords, FLIRT_INDICATORS) > 0;
    let is_platonic = theme("platonic") > 0.5;

    let mut intensity = theme("romantic") * 0.5;
    if has_relational_term {
        intensity += 0.3;
    }
    if is_flirty {
        intensity += 0.2;
    }

    let blocked = theme("professional") > 0.7 || theme("serious") > 0.8 || is_platonic;
    let allows_flirting = !blocked && (has_relational_term || theme("feminine") >= 0.3);

    RomanticContext {
        is_romantic: has_relational_term,
        is_flirty,
        is_platonic,
        allows_flirting,
        intensity: intensity.min(1.0),
    }
}

fn extract_user_mood(lower: &str) -> Option<String> {
    USER_MOODS
        .iter()
        .find(|mood| {
            lower.contains(&format!("i'm feeling {mood}"))
                || lower.contains(&format!("i feel {mood}"))
                || lower.contains(&format!("i am {mood}"))
        })
        .map(|mood| mood.to_string())
}

fn dominant_tone(
    keywords: &[String],
    themes: &BTreeMap<String, f64>,
    romantic: &RomanticContext,
    is_emotional: bool,
    intensity: f64,
) -> String {
    let mut candidates: Vec<(&str, f64)> = Vec::new();
    if themes.contains_key("playful") {
        candidates.push(("playful", 0.6));
    }
    if themes.contains_key("technical") {
        candidates.push(("intellectual", 0.7));
    }
    if is_emotional {
        candidates.push(("caring", 0.5));
    }
    if count_hits(keywords, SASSY_CUES) > 0 {
        candidates.push(("sassy", 0.4));
    }
    if romantic.is_flirty && romantic.allows_flirting {
        candidates.push(("flirty", 0.3));
    }

    candidates
        .into_iter()
        .map(|(tone, weight)| (tone, weight * intensity))
        .fold(None::<(&str, f64)>, |best, (tone, score)| match best {
            Some((_, best_score)) if best_score >= score => best,
            _ => Some((tone, score)),
        })
        .map(|(tone, _)| tone.to_string())
        .unwrap_or_else(|| "neutral".to_string())
}

fn classify(lower: &str, keywords: &[String]) -> MessageCategory {
    let has_word = |words: &[&str]| keywords.iter().any(|k| words.contains(&k.as_str()));
    let has_phrase = |phrases: &[&str]| phrases.iter().any(|p| lower.contains(p));

    if has_word(&["hello", "hi", "hey", "hiya"])
        || has_phrase(&["good morning", "good evening", "good afternoon"])
    {
        MessageCategory::Greeting
    } else if has_word(&["sad", "happy", "angry", "tired", "love", "hate", "miss", "emotion"])
        || lower.contains("feel")
    {
        MessageCategory::Emotional
    } else if has_phrase(&[
        "who are you",
        "what are you",
        "your name",
        "about you",
        "tell me about yourself",
    ]) {
        MessageCategory::Identity
    } else if has_word(&[
        "think", "believe", "opinion", "meaning", "purpose", "life", "death", "exist",
        "consciousness",
    ]) {
        MessageCategory::Philosophy
    } else if has_word(&["know", "learn", "teach", "explain"])
        || has_phrase(&["how does", "what is", "why does"])
    {
        MessageCategory::Knowledge
    } else if has_word(&["like", "fun", "interesting", "cool", "awesome", "nice"]) {
        MessageCategory::Casual
    } else {
        MessageCategory::Uncategorized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyze(text: &str) -> EmotionalContext {
        EmotionalAnalyzer::new().analyze(text, None, Utc::now())
    }

    #[test]
    fn empty_input_yields_neutral_defaults() {
        let ctx = analyze("   ");
        assert_eq!(ctx.sentiment, 0.0);
        assert_eq!(ctx.intensity, 0.5);
        assert!(ctx.keywords.is_empty());
        assert_eq!(ctx.category, MessageCategory::Uncategorized);
        assert!(!ctx.romantic.allows_flirting);
    }

    #[test]
    fn playful_message_scores_positive_and_intense() {
        let ctx = analyze("haha that's so fun lol");
        assert!((ctx.sentiment - 0.9).abs() < 1e-9);
        assert!((ctx.intensity - 0.8).abs() < 1e-9);
        assert_eq!(ctx.theme("playful"), 1.0);
        assert_eq!(ctx.emotional_tone, "playful");
        assert_eq!(ctx.category, MessageCategory::Casual);
        assert_eq!(ctx.primary_context, ContextKind::Casual);
    }

    #[test]
    fn keywords_keep_order_and_join_cue_phrases() {
        let ctx = analyze("Well actually, the API is broken!");
        assert_eq!(
            ctx.keywords,
            vec!["well_actually", "the", "api", "is", "broken"]
        );
    }

    #[test]
    fn cue_phrases_join_on_whole_tokens_only() {
        let ctx = analyze("sure january works");
        assert_eq!(ctx.keywords, vec!["sure", "january", "works"]);

        let ctx = analyze("sure jan");
        assert_eq!(ctx.keywords, vec!["sure_jan"]);

        let ctx = analyze("oh reallyyy");
        assert_eq!(ctx.keywords, vec!["oh", "reallyyy"]);
    }

    #[test]
    fn really_inside_a_cue_still_intensifies() {
        let plain = analyze("oh ok");
        let cued = analyze("oh really");
        assert_eq!(cued.keywords, vec!["oh_really"]);
        assert!((cued.intensity - plain.intensity - 0.2).abs() < 1e-9);
    }

    #[test]
    fn sentiment_is_bounded() {
        let ctx = analyze("great great great great great great");
        assert_eq!(ctx.sentiment, 1.0);
        let ctx = analyze("awful terrible horrible worst bad sad");
        assert_eq!(ctx.sentiment, -1.0);
    }

    #[test]
    fn flirting_requires_relational_marker() {
        let ctx = analyze("you look cute today");
        assert!(ctx.romantic.is_flirty);
        assert!(!ctx.romantic.allows_flirting);

        let ctx = analyze("my girlfriend thinks you are cute");
        assert!(ctx.romantic.is_romantic);
        assert!(ctx.romantic.allows_flirting);
        assert!((ctx.romantic.intensity - (ctx.theme("romantic") * 0.5 + 0.5)).abs() < 1e-9);
    }

    #[test]
    fn professional_context_blocks_flirting() {
        let ctx = analyze("my girlfriend has a work meeting with her boss at the office");
        assert!(ctx.theme("professional") > 0.7);
        assert!(!ctx.romantic.allows_flirting);
    }

    #[test]
    fn platonic_context_blocks_flirting() {
        let ctx = analyze("she is my friend and bestie, a pal, nothing more, cute girl");
        assert!(ctx.romantic.is_platonic);
        assert!(!ctx.romantic.allows_flirting);
    }

    #[test]
    fn technical_and_emotional_contexts() {
        let ctx = analyze("i feel stressed debugging this rust compiler bug in the backend");
        assert!(ctx.is_technical);
        assert!(ctx.is_emotional);
        assert_eq!(ctx.primary_context, ContextKind::Emotional);
        assert_eq!(ctx.secondary_context, Some(ContextKind::Technical));
        assert_eq!(ctx.user_mood.as_deref(), Some("stressed"));
        assert_eq!(ctx.primary_emotion, "stressed");
    }

    #[test]
    fn explicit_hint_overrides_stated_mood() {
        let ctx = EmotionalAnalyzer::new().analyze("i am happy", Some(" Curious "), Utc::now());
        assert_eq!(ctx.user_mood.as_deref(), Some("curious"));
    }

    #[test]
    fn detects_mood_reset_request() {
        assert!(analyze("ok, forget my mood please").mood_reset_requested);
        assert!(!analyze("remember my mood").mood_reset_requested);
    }

    #[test]
    fn classifies_messages() {
        assert_eq!(analyze("hey there").category, MessageCategory::Greeting);
        assert_eq!(analyze("who are you exactly").category, MessageCategory::Identity);
        assert_eq!(analyze("what is the meaning of it all").category, MessageCategory::Philosophy);
        assert_eq!(analyze("explain monads").category, MessageCategory::Knowledge);
        assert_eq!(analyze("qwerty").category, MessageCategory::Uncategorized);
    }

    #[test]
    fn analysis_is_deterministic() {
        let now = Utc::now();
        let analyzer = EmotionalAnalyzer::new();
        let a = analyzer.analyze("i love quantum theory!!", None, now);
        let b = analyzer.analyze("i love quantum theory!!", None, now);
        assert_eq!(a, b);
    }
}
