//! Line input for the chat loop.
//!
//! An attended terminal gets `rustyline_async::Readline` with line editing
//! and in-session history; piped input and `--json` runs read plain lines
//! from stdin so scripts keep working.

use std::io::IsTerminal;

use rustyline_async::{Readline, ReadlineError, ReadlineEvent, SharedWriter};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

/// What the user did at the prompt.
#[derive(Debug, PartialEq, Eq)]
pub enum InputEvent {
    /// A submitted line, trimmed.
    Message(String),
    /// End of input (Ctrl+D or a closed pipe).
    Eof,
    /// Ctrl+C at the prompt.
    Interrupted,
}

pub enum ChatInput {
    Terminal {
        rl: Readline,
        // Held so the prompt keeps redrawing while output is printed.
        _writer: SharedWriter,
    },
    Piped(Lines<BufReader<Stdin>>),
}

impl ChatInput {
    /// Pick the readline front end when stdin is a terminal and output is
    /// meant for a person.
    pub fn open(prompt: String, json: bool) -> Result<Self, ReadlineError> {
        if !json && std::io::stdin().is_terminal() {
            let (rl, writer) = Readline::new(prompt)?;
            Ok(Self::Terminal { rl, _writer: writer })
        } else {
            Ok(Self::piped())
        }
    }

    pub fn piped() -> Self {
        Self::Piped(BufReader::new(tokio::io::stdin()).lines())
    }

    pub async fn read_line(&mut self) -> InputEvent {
        match self {
            Self::Terminal { rl, .. } => match rl.readline().await {
                Ok(ReadlineEvent::Line(line)) => {
                    let trimmed = line.trim().to_string();
                    if !trimmed.is_empty() {
                        rl.add_history_entry(trimmed.clone());
                    }
                    InputEvent::Message(trimmed)
                }
                Ok(ReadlineEvent::Eof) => InputEvent::Eof,
                Ok(ReadlineEvent::Interrupted) => InputEvent::Interrupted,
                Err(_) => InputEvent::Eof,
            },
            Self::Piped(lines) => match lines.next_line().await {
                Ok(Some(line)) => InputEvent::Message(line.trim().to_string()),
                Ok(None) | Err(_) => InputEvent::Eof,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn json_runs_read_plain_lines() {
        let input = ChatInput::open("> ".to_string(), true).unwrap();
        assert!(matches!(input, ChatInput::Piped(_)));
    }
}
