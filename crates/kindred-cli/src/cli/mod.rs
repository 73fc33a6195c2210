//! CLI command definitions for the `kindred` binary.

pub mod analyze;
pub mod chat;
pub mod config;
pub mod memory;
pub mod personas;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Behavioral state layer for a conversational companion.
#[derive(Parser)]
#[command(name = "kindred", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Export tracing spans to stdout via OpenTelemetry.
    #[arg(long, global = true, env = "KINDRED_OTEL")]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start or continue a session and chat line by line.
    Chat {
        /// User the session belongs to.
        #[arg(short, long, default_value = "local")]
        user: String,

        /// Persona to activate at session start.
        #[arg(short, long)]
        persona: Option<String>,

        /// Session restrictions (e.g. no_flirting). Repeatable.
        #[arg(short, long = "restrict")]
        restrictions: Vec<String>,

        /// Topics to restore at session start. Repeatable.
        #[arg(short, long = "topic")]
        topics: Vec<String>,
    },

    /// Run the emotional analyzer on a single message.
    Analyze {
        /// Message text.
        message: String,

        /// Mood the user reports, overriding what the text says.
        #[arg(long)]
        mood: Option<String>,
    },

    /// List the persona catalog.
    Personas,

    /// Recall memories for a user.
    Recall {
        /// What to recall (free text; keywords and topics are extracted).
        query: String,

        #[arg(short, long, default_value = "local")]
        user: String,

        /// Maximum number of memories.
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// List stored memory events for a user, newest first.
    #[command(alias = "memories")]
    Timeline {
        #[arg(short, long, default_value = "local")]
        user: String,

        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },

    /// Show the effective configuration.
    Config,

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}
