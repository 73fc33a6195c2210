//! Per-session topic threading.
//!
//! Detected domains either extend the most relevant active thread or open a
//! new one. Relation writes are returned to the caller instead of being
//! applied to the shared graph, so a turn's effects can be committed at once.

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use kindred_types::config::TopicConfig;
use kindred_types::emotion::EmotionalContext;
use kindred_types::topic::{
    RelationUpdate, ThreadUpdate, ThreadUpdateKind, TopicDetection, TopicThread,
    UNCATEGORIZED_TOPIC,
};
use tracing::debug;
use uuid::Uuid;

use super::domain::{DomainRule, mutual_affinity};
use super::graph::TopicGraph;

/// Everything topic processing produced for one message.
#[derive(Debug, Clone, Default)]
pub struct TopicUpdate {
    pub detections: Vec<TopicDetection>,
    pub thread_updates: Vec<ThreadUpdate>,
    pub relation_updates: Vec<RelationUpdate>,
    /// Threads that timed out; they belong to the timeline now.
    pub archived: Vec<TopicThread>,
}

#[derive(Debug, Clone)]
pub struct TopicThreader {
    config: TopicConfig,
    rules: Arc<Vec<DomainRule>>,
    threads: Vec<TopicThread>,
}

impl TopicThreader {
    pub fn new(config: TopicConfig, rules: Arc<Vec<DomainRule>>) -> Self {
        Self {
            config,
            rules,
            threads: Vec::new(),
        }
    }

    pub fn rules(&self) -> &[DomainRule] {
        &self.rules
    }

    pub fn active_threads(&self) -> &[TopicThread] {
        &self.threads
    }

    /// Detect domains in `text`, highest priority first, then by confidence.
    pub fn detect_topics(&self, text: &str) -> Vec<TopicDetection> {
        let lower = text.to_lowercase();
        let tokens: Vec<&str> = lower
            .split_whitespace()
            .map(|w| w.trim_matches(|c: char| c.is_ascii_punctuation()))
            .filter(|w| !w.is_empty())
            .collect();

        let mut detections: Vec<TopicDetection> = self
            .rules
            .iter()
            .map(|rule| rule.detect(&lower, &tokens))
            .filter(|d| d.confidence >= self.config.min_confidence)
            .collect();
        detections.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then_with(|| b.confidence.total_cmp(&a.confidence))
        });
        detections
    }

    /// Prune stale threads, then thread every detected domain.
    pub fn process_input(
        &mut self,
        text: &str,
        ctx: &Arc<EmotionalContext>,
        graph: &TopicGraph,
    ) -> TopicUpdate {
        let now = ctx.timestamp;
        let archived = self.prune(now);
        let detections = self.detect_topics(text);

        let mut update = TopicUpdate {
            archived,
            ..Default::default()
        };

        for detection in &detections {
            let topic = detection.domain.as_str();
            match self.find_relevant_thread(topic, now, graph, &update.relation_updates) {
                Some(index) => {
                    let relations = self.extend_thread(index, topic, ctx, now);
                    let thread = &self.threads[index];
                    debug!(thread_id = %thread.id, topic, "Extended topic thread");
                    update.thread_updates.push(ThreadUpdate {
                        thread_id: thread.id,
                        kind: ThreadUpdateKind::Extended,
                        topic: topic.to_string(),
                        active_topics: thread.active_topics.iter().cloned().collect(),
                    });
                    update.relation_updates.extend(relations);
                }
                None => {
                    let thread = TopicThread {
                        id: Uuid::now_v7(),
                        main_topic: topic.to_string(),
                        active_topics: VecDeque::from([topic.to_string()]),
                        started_at: now,
                        last_active: now,
                        emotional_context: Some(Arc::clone(ctx)),
                    };
                    debug!(thread_id = %thread.id, topic, "Opened topic thread");
                    update.thread_updates.push(ThreadUpdate {
                        thread_id: thread.id,
                        kind: ThreadUpdateKind::Opened,
                        topic: topic.to_string(),
                        active_topics: vec![topic.to_string()],
                    });
                    self.threads.push(thread);
                }
            }
        }

        for thread in &update.archived {
            update.thread_updates.push(ThreadUpdate {
                thread_id: thread.id,
                kind: ThreadUpdateKind::Archived,
                topic: thread.main_topic.clone(),
                active_topics: thread.active_topics.iter().cloned().collect(),
            });
        }

        update.detections = detections;
        update
    }

    /// Remove threads inactive longer than the timeout and hand them back.
    pub fn prune(&mut self, now: DateTime<Utc>) -> Vec<TopicThread> {
        let timeout =
            Duration::try_minutes(self.config.thread_timeout_minutes).unwrap_or(Duration::MAX);
        let (stale, active): (Vec<_>, Vec<_>) = std::mem::take(&mut self.threads)
            .into_iter()
            .partition(|t| now - t.last_active > timeout);
        self.threads = active;
        stale
    }

    /// Relation strength used for relevance: the graph's value or the
    /// domains' mutual affinity, whichever is stronger.
    fn relation(&self, graph: &TopicGraph, pending: &[RelationUpdate], a: &str, b: &str) -> f64 {
        let staged = pending
            .iter()
            .filter(|u| (u.a == a && u.b == b) || (u.a == b && u.b == a))
            .map(|u| u.strength)
            .fold(0.0, f64::max);
        graph
            .relation(a, b)
            .max(staged)
            .max(mutual_affinity(&self.rules, a, b))
    }

    /// Relevance of thread `thread` for `topic` at `now`.
    pub fn thread_relevance(
        &self,
        thread: &TopicThread,
        topic: &str,
        now: DateTime<Utc>,
        graph: &TopicGraph,
    ) -> f64 {
        self.relevance_with(thread, topic, now, graph, &[])
    }

    fn relevance_with(
        &self,
        thread: &TopicThread,
        topic: &str,
        now: DateTime<Utc>,
        graph: &TopicGraph,
        pending: &[RelationUpdate],
    ) -> f64 {
        let raw: f64 = thread
            .active_topics
            .iter()
            .map(|active| {
                if active == topic {
                    1.0
                } else {
                    self.relation(graph, pending, active, topic)
                }
            })
            .sum();
        let minutes = (now - thread.last_active).num_milliseconds().max(0) as f64 / 60_000.0;
        raw * (-self.config.decay_rate * minutes).exp()
    }

    fn find_relevant_thread(
        &self,
        topic: &str,
        now: DateTime<Utc>,
        graph: &TopicGraph,
        pending: &[RelationUpdate],
    ) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (index, thread) in self.threads.iter().enumerate() {
            let relevance = self.relevance_with(thread, topic, now, graph, pending);
            if relevance >= self.config.min_confidence
                && best.is_none_or(|(_, b)| relevance > b)
            {
                best = Some((index, relevance));
            }
        }
        best.map(|(index, _)| index)
    }

    fn extend_thread(
        &mut self,
        index: usize,
        topic: &str,
        ctx: &Arc<EmotionalContext>,
        now: DateTime<Utc>,
    ) -> Vec<RelationUpdate> {
        let max_depth = self.config.max_thread_depth;
        let relations: Vec<RelationUpdate> = self.threads[index]
            .active_topics
            .iter()
            .filter(|other| other.as_str() != topic)
            .filter_map(|other| {
                let strength = mutual_affinity(&self.rules, topic, other);
                (strength > 0.0).then(|| RelationUpdate {
                    a: topic.to_string(),
                    b: other.clone(),
                    strength,
                })
            })
            .collect();

        let thread = &mut self.threads[index];
        push_topic(thread, topic, max_depth);
        thread.last_active = now;
        thread.emotional_context = Some(Arc::clone(ctx));
        relations
    }

    /// Topics across active threads, most recently active thread first.
    /// `["uncategorized"]` when nothing is active.
    pub fn current_topics(&self) -> Vec<String> {
        let mut threads: Vec<&TopicThread> = self.threads.iter().collect();
        threads.sort_by(|a, b| b.last_active.cmp(&a.last_active));
        let mut topics: Vec<String> = Vec::new();
        for thread in threads {
            for topic in thread.active_topics.iter().rev() {
                if !topics.contains(topic) {
                    topics.push(topic.clone());
                }
            }
        }
        if topics.is_empty() {
            topics.push(UNCATEGORIZED_TOPIC.to_string());
        }
        topics
    }

    /// Main topic of the most recently active thread.
    pub fn main_topic(&self) -> Option<String> {
        self.threads
            .iter()
            .max_by_key(|t| t.last_active)
            .map(|t| t.main_topic.clone())
    }

    /// Seed a thread from previously persisted topics (session continuation).
    pub fn restore(&mut self, topics: &[String], now: DateTime<Utc>) {
        let topics: Vec<&String> = topics
            .iter()
            .filter(|t| t.as_str() != UNCATEGORIZED_TOPIC)
            .collect();
        let Some(first) = topics.first() else {
            return;
        };
        let mut thread = TopicThread {
            id: Uuid::now_v7(),
            main_topic: (*first).clone(),
            active_topics: VecDeque::new(),
            started_at: now,
            last_active: now,
            emotional_context: None,
        };
        // Persisted order is most recent first; threads store oldest first.
        for topic in topics.iter().rev() {
            push_topic(&mut thread, topic, self.config.max_thread_depth);
        }
        self.threads.push(thread);
    }
}

/// Append `topic` if absent, evicting the oldest topics beyond `max_depth`.
pub fn push_topic(thread: &mut TopicThread, topic: &str, max_depth: usize) {
    if thread.contains(topic) {
        return;
    }
    thread.active_topics.push_back(topic.to_string());
    while thread.active_topics.len() > max_depth {
        thread.active_topics.pop_front();
    }
}
