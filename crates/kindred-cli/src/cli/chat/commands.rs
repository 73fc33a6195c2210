//! Slash command parsing for the chat loop.

use console::style;

#[derive(Debug, PartialEq)]
pub enum ChatCommand {
    Help,
    Exit,
    /// Show the current mood.
    Mood,
    /// Show the active persona, or switch to the given one.
    Persona(Option<String>),
    /// Suggest topics related to the active ones.
    Related,
    /// Recall memories matching the text.
    Recall(String),
    Unknown(String),
}

/// Parse user input as a slash command. `None` for plain messages.
pub fn parse(input: &str) -> Option<ChatCommand> {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return None;
    }

    let (cmd, arg) = match trimmed.split_once(' ') {
        Some((cmd, arg)) => (cmd.to_lowercase(), Some(arg.trim().to_string())),
        None => (trimmed.to_lowercase(), None),
    };
    let arg = arg.filter(|a| !a.is_empty());

    let command = match cmd.as_str() {
        "/help" | "/h" | "/?" => ChatCommand::Help,
        "/exit" | "/quit" | "/q" => ChatCommand::Exit,
        "/mood" => ChatCommand::Mood,
        "/persona" | "/p" => ChatCommand::Persona(arg),
        "/related" => ChatCommand::Related,
        "/recall" => match arg {
            Some(text) => ChatCommand::Recall(text),
            None => ChatCommand::Unknown("/recall requires some text".to_string()),
        },
        other => ChatCommand::Unknown(other.to_string()),
    };
    Some(command)
}

pub fn print_help() {
    let rows = [
        ("/help", "Show this help message"),
        ("/exit", "End the session"),
        ("/mood", "Show the current mood"),
        ("/persona [id]", "Show or switch the active persona"),
        ("/related", "Suggest related topics"),
        ("/recall <text>", "Recall memories"),
    ];
    println!();
    println!("  {}", style("Available commands:").bold());
    println!();
    for (cmd, help) in rows {
        println!("  {:<16} {}", style(cmd).cyan(), help);
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_not_a_command() {
        assert_eq!(parse("hello there"), None);
        assert_eq!(parse("  "), None);
    }

    #[test]
    fn parses_commands_and_aliases() {
        assert_eq!(parse("/q"), Some(ChatCommand::Exit));
        assert_eq!(parse("/MOOD"), Some(ChatCommand::Mood));
        assert_eq!(parse("/persona"), Some(ChatCommand::Persona(None)));
        assert_eq!(
            parse("/p  confidant "),
            Some(ChatCommand::Persona(Some("confidant".to_string())))
        );
        assert_eq!(
            parse("/recall our trip"),
            Some(ChatCommand::Recall("our trip".to_string()))
        );
    }

    #[test]
    fn recall_without_text_is_rejected() {
        assert!(matches!(parse("/recall"), Some(ChatCommand::Unknown(_))));
        assert!(matches!(parse("/recall   "), Some(ChatCommand::Unknown(_))));
        assert_eq!(parse("/dance"), Some(ChatCommand::Unknown("/dance".to_string())));
    }
}
