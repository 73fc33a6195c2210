//! Declarative topic domains.
//!
//! A domain is detected from keyword occurrences plus validator phrase lists.
//! Transition affinities describe how naturally a conversation drifts from one
//! domain to another and seed the topic graph's relation strengths.

use std::collections::BTreeMap;

use kindred_types::topic::TopicDetection;

/// Confidence contributed by each keyword occurrence.
const KEYWORD_WEIGHT: f64 = 0.2;
/// Confidence contributed by each validator that passes.
const VALIDATOR_WEIGHT: f64 = 0.3;

#[derive(Debug, Clone)]
pub struct DomainRule {
    pub domain: String,
    pub keywords: Vec<String>,
    /// Each validator passes if any of its phrases occurs in the message.
    pub validators: Vec<Vec<String>>,
    pub priority: u8,
    pub transitions: BTreeMap<String, f64>,
}

impl DomainRule {
    pub fn new(domain: &str, keywords: &[&str], priority: u8) -> Self {
        Self {
            domain: domain.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            validators: Vec::new(),
            priority,
            transitions: BTreeMap::new(),
        }
    }

    pub fn validator(mut self, phrases: &[&str]) -> Self {
        self.validators
            .push(phrases.iter().map(|p| p.to_string()).collect());
        self
    }

    pub fn transitions(mut self, transitions: &[(&str, f64)]) -> Self {
        self.transitions = transitions
            .iter()
            .map(|(d, w)| (d.to_string(), *w))
            .collect();
        self
    }

    /// Score this domain against a message.
    ///
    /// `tokens` are lowercase words; a token matches a keyword exactly or as
    /// its plural.
    pub fn detect(&self, lower: &str, tokens: &[&str]) -> TopicDetection {
        let mut matched = Vec::new();
        let mut occurrences = 0usize;
        for keyword in &self.keywords {
            let count = tokens
                .iter()
                .filter(|t| **t == keyword.as_str() || t.strip_suffix('s') == Some(keyword.as_str()))
                .count();
            if count > 0 {
                matched.push(keyword.clone());
                occurrences += count;
            }
        }

        let passed = self
            .validators
            .iter()
            .filter(|phrases| phrases.iter().any(|p| lower.contains(p.as_str())))
            .count();

        TopicDetection {
            domain: self.domain.clone(),
            confidence: occurrences as f64 * KEYWORD_WEIGHT + passed as f64 * VALIDATOR_WEIGHT,
            priority: self.priority,
            matched_keywords: matched,
        }
    }

    pub fn affinity(&self, other: &str) -> f64 {
        self.transitions.get(other).copied().unwrap_or(0.0)
    }
}

/// Symmetric affinity between two domains: the max of both directions.
pub fn mutual_affinity(rules: &[DomainRule], a: &str, b: &str) -> f64 {
    let forward = rules
        .iter()
        .find(|r| r.domain == a)
        .map(|r| r.affinity(b))
        .unwrap_or(0.0);
    let backward = rules
        .iter()
        .find(|r| r.domain == b)
        .map(|r| r.affinity(a))
        .unwrap_or(0.0);
    forward.max(backward)
}

pub fn default_domain_rules() -> Vec<DomainRule> {
    vec![
        DomainRule::new(
            "tech",
            &[
                "coding", "programming", "software", "computer", "algorithm", "golang",
                "python", "javascript", "rust", "api", "database", "backend", "frontend", "dev",
                "github", "stack", "code", "compiler",
            ],
            3,
        )
        .validator(&["```", "fn ", "func ", "def ", "class ", "import ", "()", "::"])
        .validator(&[
            "stack trace", "pull request", "compile", "deploy", "error:", "refactor",
            "segfault",
        ])
        .transitions(&[
            ("science", 0.8),
            ("gaming", 0.7),
            ("romantic", 0.5),
            ("memes", 0.6),
            ("academic", 0.7),
        ]),
        DomainRule::new(
            "gaming",
            &[
                "game", "play", "steam", "console", "rpg", "mmorpg", "fps", "strategy",
                "minecraft", "gaming", "quest", "achievement", "multiplayer", "server", "mod",
            ],
            2,
        )
        .validator(&[
            "game", "gaming", "steam", "console", "rpg", "mmorpg", "minecraft", "quest",
            "multiplayer", "level", "character", "inventory", "boss", "raid", "dungeon",
        ])
        .validator(&[
            "playing a game", "gaming session", "game server", "game character",
            "game world", "game mechanics", "gameplay", "game design", "game development",
        ])
        .transitions(&[
            ("tech", 0.6),
            ("romantic", 0.6),
            ("memes", 0.8),
            ("social", 0.7),
            ("fantasy", 0.8),
            ("art", 0.5),
        ]),
        DomainRule::new(
            "emotional",
            &[
                "feel", "emotion", "happy", "sad", "angry", "excited", "worried", "anxious",
                "love", "hate", "stress", "relief", "mood", "support", "care",
            ],
            5,
        )
        .validator(&[
            "i feel", "i'm feeling", "makes me", "i am", "i was", "i will be",
            "i have been", "it feels", "it's making me", "it makes me",
        ])
        .validator(&[
            "my life", "my experience", "my story", "i have", "i had", "i will", "in my",
            "for me", "to me",
        ])
        .transitions(&[
            ("romantic", 0.9),
            ("social", 0.8),
            ("personal", 0.9),
            ("support", 1.0),
        ]),
        DomainRule::new(
            "romantic",
            &[
                "romantic", "intimate", "tender", "gentle", "soft", "loving", "affectionate",
                "warm", "close", "sweet",
            ],
            4,
        )
        .validator(&["girlfriend", "partner", "crush", "kiss", "date", "wife"])
        .validator(&["in love", "my girlfriend", "on a date", "miss you", "hold hands"])
        .transitions(&[("emotional", 0.9), ("social", 0.8), ("personal", 0.9)]),
        DomainRule::new(
            "science",
            &[
                "science", "physics", "chemistry", "biology", "quantum", "theory",
                "experiment", "research", "hypothesis", "space", "universe", "mathematics",
            ],
            3,
        )
        .validator(&["peer review", "scientific method", "according to research", "the data"])
        .transitions(&[("tech", 0.8), ("academic", 0.9), ("art", 0.4), ("emotional", 0.3)]),
        DomainRule::new(
            "art",
            &[
                "art", "draw", "drawing", "paint", "painting", "design", "music", "poem",
                "poetry", "creative", "sketch", "animation",
            ],
            2,
        )
        .validator(&["working on a piece", "color palette", "art style", "my art"])
        .transitions(&[("emotional", 0.6), ("romantic", 0.5), ("gaming", 0.5), ("tech", 0.4)]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detect(rule: &DomainRule, text: &str) -> TopicDetection {
        let lower = text.to_lowercase();
        let tokens: Vec<&str> = lower.split_whitespace().collect();
        rule.detect(&lower, &tokens)
    }

    #[test]
    fn confidence_counts_keywords_and_validators() {
        let rules = default_domain_rules();
        let tech = rules.iter().find(|r| r.domain == "tech").unwrap();

        let d = detect(tech, "python python");
        assert!((d.confidence - 0.4).abs() < 1e-9);
        assert_eq!(d.matched_keywords, vec!["python"]);

        let d = detect(tech, "my python code fails to compile");
        // python + code, compile validator
        assert!((d.confidence - 0.7).abs() < 1e-9);
    }

    #[test]
    fn plural_tokens_match() {
        let rules = default_domain_rules();
        let gaming = rules.iter().find(|r| r.domain == "gaming").unwrap();
        let d = detect(gaming, "games");
        assert_eq!(d.matched_keywords, vec!["game"]);
    }

    #[test]
    fn mutual_affinity_takes_max_of_both_directions() {
        let rules = default_domain_rules();
        assert!((mutual_affinity(&rules, "tech", "gaming") - 0.7).abs() < 1e-9);
        assert!((mutual_affinity(&rules, "gaming", "tech") - 0.7).abs() < 1e-9);
        assert_eq!(mutual_affinity(&rules, "tech", "emotional"), 0.0);
    }
}
