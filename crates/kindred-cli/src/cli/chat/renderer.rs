//! Styled rendering of session state for the chat loop.

use console::style;
use kindred_types::mood::MoodState;
use kindred_types::session::{Session, TurnOutcome};
use kindred_types::timeline::ScoredMemory;

pub fn print_session_banner(session: &Session) {
    println!();
    println!(
        "  {} Session {}",
        style("*").magenta().bold(),
        style(session.id).dim()
    );
    if let Some(previous) = session.continued_from {
        println!("    continued from {}", style(previous).dim());
    }
    println!(
        "    persona: {}  mood: {}",
        style(session.state.persona_id.as_deref().unwrap_or("none")).cyan(),
        mood_label(&session.state.mood)
    );
    if !session.state.active_topics.is_empty() {
        println!("    topics: {}", session.state.active_topics.join(", "));
    }
    println!();
    println!("  Type a message, or {} for commands.", style("/help").cyan());
    println!();
}

pub fn mood_label(mood: &MoodState) -> String {
    format!("{} {:.2}", style(&mood.primary_mood).yellow(), mood.intensity)
}

pub fn print_turn(outcome: &TurnOutcome) {
    let state = &outcome.state;
    let context = &outcome.context;

    println!(
        "  {} {}  {} {}  {} {}",
        style("mood").dim(),
        mood_label(&state.mood),
        style("persona").dim(),
        style(state.persona_id.as_deref().unwrap_or("none")).cyan(),
        style("style").dim(),
        context.response_style,
    );

    if let Some(main) = &state.main_topic {
        println!(
            "  {} {}  {}",
            style("topic").dim(),
            style(main).green(),
            style(state.active_topics.join(" > ")).dim()
        );
    }
    for event in &context.persona_events {
        println!(
            "  {} persona {} -> {} ({})",
            style("~").magenta(),
            event.from.as_deref().unwrap_or("none"),
            style(&event.to).cyan(),
            event.reason
        );
    }
    for transition in &context.transitions {
        println!(
            "  {} topic {} -> {}",
            style("~").blue(),
            transition.from_topic,
            style(&transition.to_topic).green()
        );
    }
    for marker in &context.new_markers {
        println!(
            "  {} {} marker: {}",
            style("*").magenta().bold(),
            marker.kind,
            marker.description
        );
    }
    if !context.recalled.is_empty() {
        print_recalled(&context.recalled);
    }
    if let Some(checkpoint) = &outcome.checkpoint {
        println!(
            "  {} checkpoint: {}",
            style("#").dim(),
            style(checkpoint.reasons.join(", ")).dim()
        );
    }
    println!();
}

pub fn print_recalled(recalled: &[ScoredMemory]) {
    for memory in recalled {
        println!(
            "  {} {:.2} {}",
            style("remembers").dim(),
            memory.score,
            style(&memory.event.content).italic()
        );
    }
}
