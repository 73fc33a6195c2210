//! Persona catalog listing.

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use kindred_types::persona::Persona;

use crate::state::AppState;

/// ```bash
/// kindred personas
/// kindred personas --json
/// ```
pub fn list_personas(state: &AppState, json: bool) -> Result<()> {
    let personas: Vec<&Persona> = state.coordinator.catalogs().personas.iter().collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&personas)?);
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("ID").fg(Color::White),
        Cell::new("Name").fg(Color::White),
        Cell::new("Style rules").fg(Color::White),
        Cell::new("Mood bias").fg(Color::White),
        Cell::new("Constraints").fg(Color::White),
    ]);

    for persona in &personas {
        let rules = persona
            .style_rules
            .iter()
            .map(|r| format!("{} -> {}/{} (p{})", r.condition, r.response, r.tone, r.priority))
            .collect::<Vec<_>>()
            .join("\n");
        let bias = if persona.mood_bias.is_empty() {
            "-".to_string()
        } else {
            persona
                .mood_bias
                .iter()
                .map(|(mood, b)| format!("{mood} {b:+.1}"))
                .collect::<Vec<_>>()
                .join(", ")
        };
        let constraints = if persona.constraints.is_empty() {
            "-".to_string()
        } else {
            persona.constraints.join(", ")
        };

        table.add_row(vec![
            Cell::new(&persona.id).fg(Color::Cyan),
            Cell::new(&persona.name),
            Cell::new(rules),
            Cell::new(bias).fg(Color::Yellow),
            Cell::new(constraints).fg(Color::DarkGrey),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    println!(
        "  {} persona{}",
        style(personas.len()).bold(),
        if personas.len() == 1 { "" } else { "s" }
    );
    println!();

    Ok(())
}
