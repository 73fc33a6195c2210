//! Process-wide topic graph.
//!
//! Relation strengths are stored once per unordered topic pair, so
//! `relation(a, b) == relation(b, a)` holds under any interleaving of writers.
//! Nodes carry frequency and the last mood observed on the topic.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use kindred_types::topic::{RelationUpdate, TopicData, TopicNode};

#[derive(Debug, Default)]
pub struct TopicGraph {
    nodes: DashMap<String, TopicNode>,
    relations: DashMap<(String, String), f64>,
}

fn pair(a: &str, b: &str) -> (String, String) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

impl TopicGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, topic: &str) -> bool {
        self.nodes.contains_key(topic)
    }

    pub fn node(&self, topic: &str) -> Option<TopicNode> {
        self.nodes.get(topic).map(|n| n.clone())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn relation(&self, a: &str, b: &str) -> f64 {
        if a == b {
            return 0.0;
        }
        self.relations.get(&pair(a, b)).map(|r| *r).unwrap_or(0.0)
    }

    /// Set the symmetric strength between two distinct topics, clamped to [0, 1].
    pub fn set_relation(&self, a: &str, b: &str, strength: f64) {
        if a == b {
            return;
        }
        self.relations.insert(pair(a, b), strength.clamp(0.0, 1.0));
    }

    pub fn apply(&self, updates: &[RelationUpdate]) {
        for update in updates {
            self.set_relation(&update.a, &update.b, update.strength);
        }
    }

    /// Count one more mention of `topic`.
    pub fn touch(&self, topic: &str, now: DateTime<Utc>) {
        let mut node = self
            .nodes
            .entry(topic.to_string())
            .or_insert_with(|| TopicNode {
                name: topic.to_string(),
                frequency: 0,
                last_mood: None,
                last_intensity: 0.0,
                last_seen: now,
            });
        node.frequency += 1;
        node.last_seen = now;
    }

    pub fn record_mood(&self, topic: &str, mood: &str, intensity: f64, now: DateTime<Utc>) {
        let mut node = self
            .nodes
            .entry(topic.to_string())
            .or_insert_with(|| TopicNode {
                name: topic.to_string(),
                frequency: 0,
                last_mood: None,
                last_intensity: 0.0,
                last_seen: now,
            });
        node.last_mood = Some(mood.to_string());
        node.last_intensity = intensity;
    }

    /// Topics related to `topic` with strength at or above `min_strength`, strongest first.
    pub fn neighbors(&self, topic: &str, min_strength: f64) -> Vec<(String, f64)> {
        let mut out: Vec<(String, f64)> = self
            .relations
            .iter()
            .filter_map(|entry| {
                let ((a, b), strength) = (entry.key(), *entry.value());
                let other = if a == topic {
                    b
                } else if b == topic {
                    a
                } else {
                    return None;
                };
                (strength >= min_strength).then(|| (other.clone(), strength))
            })
            .collect();
        out.sort_by(|x, y| y.1.total_cmp(&x.1).then_with(|| x.0.cmp(&y.0)));
        out
    }

    /// Load a persisted topic. Existing relations keep the stronger value.
    pub fn hydrate(&self, data: &TopicData) {
        self.nodes
            .entry(data.id.clone())
            .and_modify(|node| {
                node.frequency = node.frequency.max(data.frequency);
                if data.last_seen > node.last_seen {
                    node.last_seen = data.last_seen;
                }
            })
            .or_insert_with(|| TopicNode {
                name: data.id.clone(),
                frequency: data.frequency,
                last_mood: None,
                last_intensity: 0.0,
                last_seen: data.last_seen,
            });
        for (other, strength) in &data.relations {
            let current = self.relation(&data.id, other);
            if *strength > current {
                self.set_relation(&data.id, other, *strength);
            }
        }
    }

    /// Snapshot a topic for persistence.
    pub fn to_topic_data(&self, topic: &str, domain: &str, keywords: &[String]) -> Option<TopicData> {
        let node = self.node(topic)?;
        let relations: BTreeMap<String, f64> = self.neighbors(topic, 0.0).into_iter().collect();
        let mut mood_patterns = BTreeMap::new();
        if let Some(mood) = &node.last_mood {
            mood_patterns.insert(mood.clone(), node.last_intensity);
        }
        Some(TopicData {
            id: topic.to_string(),
            domain: domain.to_string(),
            keywords: keywords.to_vec(),
            contexts: Vec::new(),
            relations,
            mood_patterns,
            last_seen: node.last_seen,
            frequency: node.frequency,
            metadata: BTreeMap::new(),
        })
    }
}
