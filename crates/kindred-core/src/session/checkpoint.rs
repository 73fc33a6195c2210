//! Checkpoint policies decide when a turn is significant enough to snapshot.

use std::collections::BTreeSet;

use kindred_types::session::{SessionContext, SessionState};

/// Decides whether a turn produced a significant change.
///
/// Returns the reasons for checkpointing; an empty list means no checkpoint.
pub trait CheckpointPolicy: Send + Sync {
    fn significant_changes(
        &self,
        previous: &SessionState,
        current: &SessionState,
        context: &SessionContext,
    ) -> Vec<String>;
}

/// Fires on a mood label change, an intensity move of at least
/// `intensity_delta`, a persona switch, a changed topic set or a new
/// timeline marker.
#[derive(Debug, Clone, Copy)]
pub struct SignificantChangePolicy {
    pub intensity_delta: f64,
}

impl Default for SignificantChangePolicy {
    fn default() -> Self {
        Self {
            intensity_delta: 0.25,
        }
    }
}

impl CheckpointPolicy for SignificantChangePolicy {
    fn significant_changes(
        &self,
        previous: &SessionState,
        current: &SessionState,
        context: &SessionContext,
    ) -> Vec<String> {
        let mut reasons = Vec::new();

        if previous.mood.primary_mood != current.mood.primary_mood {
            reasons.push(format!(
                "mood changed: {} -> {}",
                previous.mood.primary_mood, current.mood.primary_mood
            ));
        }
        let moved = (current.mood.intensity - previous.mood.intensity).abs();
        // Tolerate float noise right at the threshold.
        if moved + 1e-9 >= self.intensity_delta {
            reasons.push(format!("intensity moved by {moved:.2}"));
        }
        if previous.persona_id != current.persona_id {
            reasons.push(format!(
                "persona switched to {}",
                current.persona_id.as_deref().unwrap_or("none")
            ));
        }
        let before: BTreeSet<&String> = previous.active_topics.iter().collect();
        let after: BTreeSet<&String> = current.active_topics.iter().collect();
        if before != after {
            reasons.push("topic set changed".to_string());
        }
        if !context.new_markers.is_empty() {
            reasons.push(format!("{} timeline marker(s) created", context.new_markers.len()));
        }

        reasons
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use kindred_types::timeline::{MarkerKind, TimelineMarker};
    use uuid::Uuid;

    fn state() -> SessionState {
        SessionState::fresh(Utc::now())
    }

    #[test]
    fn unchanged_state_is_not_significant() {
        let policy = SignificantChangePolicy::default();
        let s = state();
        assert!(policy
            .significant_changes(&s, &s.clone(), &SessionContext::default())
            .is_empty());
    }

    #[test]
    fn each_trigger_fires() {
        let policy = SignificantChangePolicy::default();
        let before = state();

        let mut after = before.clone();
        after.mood.primary_mood = "playful".to_string();
        assert_eq!(
            policy.significant_changes(&before, &after, &SessionContext::default()),
            vec!["mood changed: neutral -> playful".to_string()]
        );

        let mut after = before.clone();
        after.mood.intensity = before.mood.intensity + 0.25;
        assert_eq!(
            policy
                .significant_changes(&before, &after, &SessionContext::default())
                .len(),
            1
        );
        after.mood.intensity = before.mood.intensity + 0.2;
        assert!(policy
            .significant_changes(&before, &after, &SessionContext::default())
            .is_empty());

        let mut after = before.clone();
        after.persona_id = Some("confidant".to_string());
        after.active_topics = vec!["emotional".to_string()];
        assert_eq!(
            policy
                .significant_changes(&before, &after, &SessionContext::default())
                .len(),
            2
        );

        let context = SessionContext {
            new_markers: vec![TimelineMarker {
                id: Uuid::now_v7(),
                kind: MarkerKind::Reminder,
                event_id: Uuid::now_v7(),
                description: "x".to_string(),
                timestamp: Utc::now(),
                importance: 0.8,
                recurrence: None,
            }],
            ..Default::default()
        };
        assert_eq!(policy.significant_changes(&before, &before, &context).len(), 1);
    }

    #[test]
    fn topic_order_does_not_matter() {
        let policy = SignificantChangePolicy::default();
        let mut before = state();
        before.active_topics = vec!["tech".to_string(), "gaming".to_string()];
        let mut after = before.clone();
        after.active_topics.reverse();
        assert!(policy
            .significant_changes(&before, &after, &SessionContext::default())
            .is_empty());
    }
}
