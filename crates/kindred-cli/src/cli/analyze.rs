//! One-shot message analysis: emotional signals and topic detections.

use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use kindred_core::analyzer::EmotionalAnalyzer;
use kindred_core::topic::TopicThreader;
use kindred_core::topic::domain::default_domain_rules;
use kindred_infra::config::{load_config, resolve_data_dir};

/// Analyze `message` without touching any session.
///
/// ```bash
/// kindred analyze "haha that's so fun lol"
/// kindred analyze "my code won't compile" --json
/// ```
pub async fn analyze(message: &str, mood: Option<&str>, json: bool) -> Result<()> {
    let config = load_config(&resolve_data_dir()).await;
    let ctx = EmotionalAnalyzer::new().analyze(message, mood, Utc::now());
    let threader = TopicThreader::new(config.topic.clone(), Arc::new(default_domain_rules()));
    let detections = threader.detect_topics(message);

    if json {
        let out = serde_json::json!({
            "emotional": ctx,
            "topics": detections,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!();
    println!("  {} {}", style("Message:").bold(), style(message).dim());
    println!();

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Signal").fg(Color::White),
        Cell::new("Value").fg(Color::White),
    ]);

    let context = match ctx.secondary_context {
        Some(secondary) => format!("{} (+{secondary})", ctx.primary_context),
        None => ctx.primary_context.to_string(),
    };
    let rows = [
        ("emotion", ctx.primary_emotion.clone()),
        ("tone", ctx.emotional_tone.clone()),
        ("sentiment", format!("{:+.2}", ctx.sentiment)),
        ("intensity", format!("{:.2}", ctx.intensity)),
        ("context", context),
        ("category", ctx.category.to_string()),
        ("flirting allowed", ctx.romantic.allows_flirting.to_string()),
        ("user mood", ctx.user_mood.clone().unwrap_or_else(|| "-".to_string())),
    ];
    for (name, value) in rows {
        table.add_row(vec![Cell::new(name).fg(Color::Cyan), Cell::new(value)]);
    }
    println!("{table}");

    let mut themes: Vec<(&String, &f64)> = ctx.themes.iter().filter(|(_, s)| **s > 0.0).collect();
    themes.sort_by(|a, b| b.1.total_cmp(a.1));
    if !themes.is_empty() {
        println!();
        println!("  {}", style("Themes").bold());
        for (theme, score) in themes {
            println!("    {:<14} {:.2}", theme, score);
        }
    }

    println!();
    if detections.is_empty() {
        println!("  {} No topic above the confidence threshold", style("i").blue().bold());
    } else {
        println!("  {}", style("Topics").bold());
        for d in &detections {
            println!(
                "    {:<14} {:.2}  {}",
                style(&d.domain).green(),
                d.confidence,
                style(d.matched_keywords.join(", ")).dim()
            );
        }
    }
    println!();

    Ok(())
}
