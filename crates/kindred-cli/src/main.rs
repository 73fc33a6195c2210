//! Kindred CLI entry point.
//!
//! Binary name: `kindred`
//!
//! Parses CLI arguments, initializes tracing, the database and the session
//! coordinator, then dispatches to the command handler.

mod cli;
mod state;

use clap::Parser;
use clap_complete::generate;
use kindred_observe::{TracingOptions, init_tracing, shutdown_tracing};

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut options =
        TracingOptions::new(TracingOptions::filter_for_verbosity(cli.verbose, cli.quiet));
    options.otel = cli.otel;
    if let Err(e) = init_tracing(&options) {
        eprintln!("Warning: failed to initialize tracing: {e}");
    }

    let result = run(cli).await;
    shutdown_tracing();
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // Commands that need no database
    match &cli.command {
        Commands::Completions { shell } => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            generate(*shell, &mut cmd, "kindred", &mut std::io::stdout());
            return Ok(());
        }
        Commands::Analyze { message, mood } => {
            return cli::analyze::analyze(message, mood.as_deref(), cli.json).await;
        }
        _ => {}
    }

    let state = AppState::init().await?;

    match cli.command {
        Commands::Chat {
            user,
            persona,
            restrictions,
            topics,
        } => {
            let initial = cli::chat::initial_context(persona, restrictions, topics);
            cli::chat::run_chat(&state, &user, initial, cli.json).await?;
        }
        Commands::Personas => cli::personas::list_personas(&state, cli.json)?,
        Commands::Recall { query, user, limit } => {
            cli::memory::recall(&state, &user, &query, limit, cli.json).await?;
        }
        Commands::Timeline { user, limit } => {
            cli::memory::list_timeline(&state, &user, limit, cli.json).await?;
        }
        Commands::Config => cli::config::show_config(&state, cli.json)?,
        Commands::Completions { .. } | Commands::Analyze { .. } => {}
    }

    Ok(())
}
