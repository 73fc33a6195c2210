//! Built-in mood pattern catalog.
//!
//! The first five patterns are the core moods; the rest are compound patterns
//! that map onto a (possibly shared) mood label. Catalog order is the tie-break
//! order when two moods score the same.

use kindred_types::emotion::ContextCondition;
use kindred_types::mood::MoodPattern;

fn pattern(
    name: &str,
    mood: &str,
    keywords: &[&str],
    sentiment: f64,
    intensity: f64,
    decay_rate: f64,
) -> MoodPattern {
    MoodPattern {
        name: name.to_string(),
        mood: mood.to_string(),
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
        sentiment,
        intensity,
        decay_rate,
        requires: Vec::new(),
        excludes: Vec::new(),
    }
}

/// Personality biases added to a mood's score after pattern scoring.
pub const PERSONALITY_BIASES: &[(&str, f64)] = &[("sassy", 0.2), ("intellectual", 0.15), ("flirty", 0.1)];

pub fn default_mood_patterns() -> Vec<MoodPattern> {
    let mut flirty = pattern(
        "flirty",
        "flirty",
        &["cute", "pretty", "beautiful", "hot", "gorgeous", "flirt"],
        0.8,
        0.7,
        0.15,
    );
    flirty.requires = vec![ContextCondition::FlirtingAllowed];

    let mut romantic_flirty = pattern(
        "romantic_flirty",
        "flirty",
        &[
            "cute girl", "pretty girl", "beautiful woman", "lesbian", "sapphic", "girls",
            "women", "gf", "girlfriend", "wife", "date", "wlw", "queer", "feminine", "soft",
        ],
        0.9,
        0.8,
        0.15,
    );
    romantic_flirty.requires = vec![ContextCondition::FlirtingAllowed, ContextCondition::Romantic];
    romantic_flirty.excludes = vec![ContextCondition::Platonic];

    vec![
        pattern(
            "playful",
            "playful",
            &["haha", "lol", "😂", "fun", "play", "joke", "tease"],
            0.7,
            0.6,
            0.2,
        ),
        pattern(
            "sassy",
            "sassy",
            &["actually", "well_actually", "oh_really", "sure_jan", "whatever"],
            0.3,
            0.8,
            0.1,
        ),
        flirty,
        pattern(
            "intellectual",
            "intellectual",
            &["think", "theory", "quantum", "algorithm", "complex", "interesting"],
            0.4,
            0.6,
            0.05,
        ),
        pattern(
            "protective",
            "protective",
            &["help", "protect", "safe", "careful", "worry", "concern"],
            0.2,
            0.5,
            0.3,
        ),
        romantic_flirty,
        pattern(
            "tech_passionate",
            "enthusiastic",
            &[
                "code", "programming", "golang", "typescript", "c++", "algorithm", "backend",
                "frontend", "engineering", "software", "development", "tech", "coding",
                "hacking", "debugging",
            ],
            0.8,
            0.7,
            0.1,
        ),
        pattern(
            "intellectual_playful",
            "intellectual",
            &[
                "quantum", "physics", "theory", "mathematics", "research", "science",
                "experiment", "hypothesis", "proof", "analysis", "nerd", "geek", "academic",
                "study", "learn",
            ],
            0.75,
            0.6,
            0.05,
        ),
        pattern(
            "protective_caring",
            "protective",
            &[
                "protect", "safe", "care", "support", "help", "comfort", "gentle", "kind",
                "soft", "warm", "cuddle", "hug", "hold", "close", "tender",
            ],
            0.85,
            0.7,
            0.2,
        ),
        pattern(
            "sassy_confident",
            "sassy",
            &[
                "actually", "well_actually", "oh_really", "whatever", "sass", "attitude",
                "confidence", "bold", "fierce", "queen", "icon", "mood", "vibe", "energy",
            ],
            0.6,
            0.8,
            0.1,
        ),
        pattern(
            "gaming_excited",
            "excited",
            &[
                "game", "gaming", "play", "stream", "twitch", "discord", "server", "online",
                "multiplayer", "co-op", "rpg", "mmo", "strategy", "fps", "competitive",
            ],
            0.7,
            0.6,
            0.15,
        ),
        pattern(
            "artistic_inspired",
            "inspired",
            &[
                "art", "create", "design", "draw", "paint", "3d", "model", "render",
                "animation", "creative", "aesthetic", "beautiful", "style", "artistic", "vision",
            ],
            0.8,
            0.7,
            0.1,
        ),
        pattern(
            "mischievous_teasing",
            "mischievous",
            &[
                "tease", "joke", "play", "fun", "laugh", "silly", "goofy", "playful", "meme",
                "humor", "witty", "clever", "smart", "sharp", "quick",
            ],
            0.75,
            0.6,
            0.2,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_moods_come_first() {
        let moods: Vec<String> = default_mood_patterns()
            .into_iter()
            .take(5)
            .map(|p| p.mood)
            .collect();
        assert_eq!(moods, vec!["playful", "sassy", "flirty", "intellectual", "protective"]);
    }

    #[test]
    fn every_flirty_pattern_is_gated() {
        for p in default_mood_patterns().iter().filter(|p| p.mood == "flirty") {
            assert!(p.requires.contains(&ContextCondition::FlirtingAllowed), "{}", p.name);
        }
    }
}
