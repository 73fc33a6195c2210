//! Interactive chat loop.
//!
//! Each line is one interaction routed through the session coordinator. The
//! loop prints the merged state after every turn; with `--json` it prints one
//! `TurnOutcome` JSON document per line instead.

pub mod commands;
pub mod input;
pub mod renderer;

use std::collections::{BTreeMap, BTreeSet};

use anyhow::Result;
use console::style;
use kindred_types::session::{InitialContext, Interaction, SessionId};
use kindred_types::timeline::RecallQuery;
use tracing::info;

use self::commands::ChatCommand;
use self::input::{ChatInput, InputEvent};
use crate::state::AppState;

/// Minimum strength for `/related` suggestions.
const RELATED_MIN_STRENGTH: f64 = 0.5;

pub fn initial_context(
    persona: Option<String>,
    restrictions: Vec<String>,
    topics: Vec<String>,
) -> InitialContext {
    InitialContext {
        persona_id: persona,
        restrictions: restrictions.into_iter().collect::<BTreeSet<_>>(),
        topics,
        metadata: BTreeMap::from([("client".to_string(), "kindred-cli".to_string())]),
    }
}

/// Run the chat loop until `/exit` or end of input.
///
/// ```bash
/// kindred chat --user alex --persona confidant
/// echo "haha that's so fun lol" | kindred chat --json
/// ```
pub async fn run_chat(state: &AppState, user: &str, initial: InitialContext, json: bool) -> Result<()> {
    let coordinator = &state.coordinator;
    let session = coordinator.start_session(user, initial).await?;
    let id = session.id;
    info!(session_id = %id, user_id = %user, "Chat started");

    if !json {
        renderer::print_session_banner(&session);
    }

    let prompt = format!("{} ", style(">").cyan().bold());
    let mut input = ChatInput::open(prompt, json)
        .map_err(|e| anyhow::anyhow!("Failed to initialize input: {e}"))?;
    loop {
        let line = match input.read_line().await {
            InputEvent::Eof => break,
            InputEvent::Interrupted => {
                println!("  {}", style("Press Ctrl+D or type /exit to leave.").dim());
                continue;
            }
            InputEvent::Message(line) => line,
        };
        let line = line.as_str();
        if line.is_empty() {
            continue;
        }

        match commands::parse(line) {
            Some(ChatCommand::Exit) => break,
            Some(command) => run_command(state, &id, command, json).await?,
            None => {
                let outcome = coordinator.process_interaction(&id, Interaction::new(line)).await?;
                if json {
                    println!("{}", serde_json::to_string(&outcome)?);
                } else {
                    renderer::print_turn(&outcome);
                }
            }
        }
    }

    let ended = coordinator.end_session(&id).await?;
    if !json {
        println!();
        println!(
            "  {} Session ended after {} turn{}",
            style("*").magenta().bold(),
            ended.state.turn_count,
            if ended.state.turn_count == 1 { "" } else { "s" }
        );
        println!();
    }
    Ok(())
}

async fn run_command(state: &AppState, id: &SessionId, command: ChatCommand, json: bool) -> Result<()> {
    let coordinator = &state.coordinator;
    match command {
        ChatCommand::Help => commands::print_help(),
        ChatCommand::Exit => {}
        ChatCommand::Mood => {
            let mood = coordinator.current_mood(id).await?;
            if json {
                println!("{}", serde_json::to_string(&mood)?);
            } else {
                println!("  {}", renderer::mood_label(&mood));
            }
        }
        ChatCommand::Persona(None) => {
            let persona = coordinator.current_persona(id).await?;
            if json {
                println!("{}", serde_json::to_string(&persona)?);
            } else {
                match persona {
                    Some(p) => println!("  {} ({})", style(&p.name).cyan(), p.id),
                    None => println!("  {} No active persona", style("i").blue().bold()),
                }
            }
        }
        ChatCommand::Persona(Some(target)) => {
            match coordinator.switch_persona(id, &target, "requested in chat").await {
                Ok(event) if json => println!("{}", serde_json::to_string(&event)?),
                Ok(event) => println!("  {} Now {}", style("~").magenta(), style(&event.to).cyan()),
                // Validation errors are shown, not fatal.
                Err(e) => eprintln!("  {} {e}", style("!").red().bold()),
            }
        }
        ChatCommand::Related => {
            let related = coordinator.suggest_related_topics(id, RELATED_MIN_STRENGTH).await?;
            if json {
                println!("{}", serde_json::to_string(&related)?);
            } else if related.is_empty() {
                println!("  {} Nothing related yet", style("i").blue().bold());
            } else {
                for (topic, strength) in related {
                    println!("  {:<14} {:.2}", style(topic).green(), strength);
                }
            }
        }
        ChatCommand::Recall(text) => {
            let query = RecallQuery {
                keywords: text.split_whitespace().map(|w| w.to_lowercase()).collect(),
                ..Default::default()
            };
            let limit = coordinator.config().timeline.recall_limit;
            let recalled = coordinator.recall_memories(id, &query, limit).await?;
            if json {
                println!("{}", serde_json::to_string(&recalled)?);
            } else if recalled.is_empty() {
                println!("  {} Nothing comes to mind", style("i").blue().bold());
            } else {
                renderer::print_recalled(&recalled);
            }
        }
        ChatCommand::Unknown(cmd) => {
            eprintln!(
                "  {} Unknown command {}. Type {} for help.",
                style("!").yellow().bold(),
                style(cmd).yellow(),
                style("/help").cyan()
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_context_collects_flags() {
        let ctx = initial_context(
            Some("confidant".to_string()),
            vec!["no_flirting".to_string(), "no_flirting".to_string()],
            vec!["emotional".to_string()],
        );
        assert_eq!(ctx.persona_id.as_deref(), Some("confidant"));
        assert_eq!(ctx.restrictions.len(), 1);
        assert_eq!(ctx.topics, vec!["emotional"]);
        assert_eq!(ctx.metadata.get("client").map(String::as_str), Some("kindred-cli"));
    }
}
