//! Timeline CLI commands: recall and listing.
//!
//! Both work directly on the persisted events of a user, so they never start
//! or continue a session.

use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use kindred_core::analyzer::EmotionalAnalyzer;
use kindred_core::repository::MemoryEventRepository;
use kindred_core::timeline::TimelineMemory;
use kindred_core::topic::TopicThreader;
use kindred_types::timeline::{EventType, RecallQuery};
use tracing::warn;

use crate::state::AppState;

/// Events loaded from storage before scoring.
const RECALL_POOL: usize = 500;

/// Anniversaries shown by `timeline` when they fall within this many days.
const ANNIVERSARY_WINDOW_DAYS: i64 = 14;

async fn load_timeline(state: &AppState, user: &str) -> Result<TimelineMemory> {
    let coordinator = &state.coordinator;
    let events = coordinator
        .memory_repo()
        .list_memory_events(user, RECALL_POOL)
        .await?;
    let mut timeline = TimelineMemory::new(coordinator.config().timeline.clone());
    for event in events.into_iter().rev() {
        timeline.hydrate(event);
    }
    Ok(timeline)
}

/// ```bash
/// kindred recall "that game we played" --user alex
/// ```
pub async fn recall(
    state: &AppState,
    user: &str,
    text: &str,
    limit: Option<usize>,
    json: bool,
) -> Result<()> {
    let now = Utc::now();
    let coordinator = &state.coordinator;
    let limit = limit.unwrap_or(coordinator.config().timeline.recall_limit);

    let ctx = EmotionalAnalyzer::new().analyze(text, None, now);
    let threader = TopicThreader::new(
        coordinator.config().topic.clone(),
        Arc::clone(&coordinator.catalogs().domain_rules),
    );
    let query = RecallQuery {
        topics: threader.detect_topics(text).into_iter().map(|d| d.domain).collect(),
        keywords: ctx.keywords.iter().filter(|k| k.chars().count() >= 4).cloned().collect(),
        participants: vec![user.to_string()],
        mood: None,
    };

    let mut timeline = load_timeline(state, user).await?;
    let recalled = timeline.recall_memories(&query, limit, now);

    // Recall bookkeeping is part of the event; write it back.
    for memory in &recalled {
        if let Err(e) = coordinator.memory_repo().append_memory_event(user, &memory.event).await {
            warn!(user_id = %user, error = %e, "Failed to update recall bookkeeping");
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&recalled)?);
        return Ok(());
    }

    if recalled.is_empty() {
        println!();
        println!(
            "  {} No memories for '{}' yet. Memories are stored from emotional turns in `kindred chat`.",
            style("i").blue().bold(),
            style(user).cyan(),
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Memory").fg(Color::White),
        Cell::new("Score").fg(Color::White),
        Cell::new("Relevance").fg(Color::White),
        Cell::new("Recency").fg(Color::White),
        Cell::new("Date").fg(Color::White),
    ]);
    for memory in &recalled {
        table.add_row(vec![
            Cell::new(truncate(&memory.event.content, 60)).fg(Color::White),
            Cell::new(format!("{:.2}", memory.score)).fg(Color::Yellow),
            Cell::new(format!("{:.2}", memory.relevance)),
            Cell::new(format!("{:.2}", memory.recency)),
            Cell::new(memory.event.timestamp.format("%Y-%m-%d").to_string()).fg(Color::DarkGrey),
        ]);
    }

    println!();
    println!("  Recalled for '{}'", style(user).cyan().bold());
    println!();
    println!("{table}");
    println!();

    Ok(())
}

/// ```bash
/// kindred timeline --user alex --limit 50
/// ```
pub async fn list_timeline(state: &AppState, user: &str, limit: usize, json: bool) -> Result<()> {
    let now = Utc::now();
    let events = state
        .coordinator
        .memory_repo()
        .list_memory_events(user, limit)
        .await?;
    let total = state.coordinator.memory_repo().count_memory_events(user).await?;
    let upcoming = load_timeline(state, user)
        .await?
        .upcoming_anniversaries(now, ANNIVERSARY_WINDOW_DAYS);

    if json {
        let out = serde_json::json!({
            "total": total,
            "events": events,
            "upcoming_anniversaries": upcoming,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    if events.is_empty() {
        println!();
        println!("  {} No timeline events for '{}'.", style("i").blue().bold(), style(user).cyan());
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Event").fg(Color::White),
        Cell::new("Type").fg(Color::White),
        Cell::new("Importance").fg(Color::White),
        Cell::new("Recalled").fg(Color::White),
        Cell::new("Date").fg(Color::White),
    ]);
    for event in &events {
        let kind = match event.event_type {
            EventType::Relationship => Cell::new("relationship").fg(Color::Magenta),
            EventType::Emotional => Cell::new("emotional").fg(Color::Red),
            EventType::Achievement => Cell::new("achievement").fg(Color::Green),
            EventType::Conversation => Cell::new("conversation").fg(Color::Blue),
            other => Cell::new(other.to_string()).fg(Color::Cyan),
        };
        table.add_row(vec![
            Cell::new(truncate(&event.content, 60)).fg(Color::White),
            kind,
            Cell::new(format!("{:.2}", event.importance)).fg(Color::Yellow),
            Cell::new(event.recall_count),
            Cell::new(event.timestamp.format("%Y-%m-%d %H:%M").to_string()).fg(Color::DarkGrey),
        ]);
    }

    println!();
    println!(
        "  Timeline for '{}' ({} of {} events)",
        style(user).cyan().bold(),
        events.len(),
        total
    );
    println!();
    println!("{table}");
    if !upcoming.is_empty() {
        println!();
        for marker in &upcoming {
            println!(
                "  {} Anniversary coming up: {} ({})",
                style("*").magenta().bold(),
                marker.description,
                marker.timestamp.format("%b %d")
            );
        }
    }
    println!();

    Ok(())
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{cut}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("héllo wörld", 8), "héllo...");
    }
}
