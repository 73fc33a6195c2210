//! Effective configuration display.

use anyhow::Result;
use console::style;

use crate::state::AppState;

/// Print the configuration after `config.toml` and defaults are merged.
pub fn show_config(state: &AppState, json: bool) -> Result<()> {
    let config = state.coordinator.config();

    if json {
        println!("{}", serde_json::to_string_pretty(config)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} {}",
        style("Data directory:").bold(),
        style(state.data_dir.display()).cyan()
    );
    println!(
        "  {} {}",
        style("Config file:").bold(),
        style(state.data_dir.join("config.toml").display()).dim()
    );
    println!();
    print!("{}", toml::to_string_pretty(config)?);
    println!();

    Ok(())
}
