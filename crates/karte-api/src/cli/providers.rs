//! `karte providers`: credential and model status per provider.

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use serde::Serialize;

use karte_types::config::AppConfig;
use karte_types::llm::ProviderKind;

use crate::state::AppState;

#[derive(Debug, Serialize)]
struct ProviderStatus {
    provider: ProviderKind,
    credentials: bool,
    model: String,
    default: bool,
    fallback: bool,
}

fn provider_statuses(config: &AppConfig) -> Vec<ProviderStatus> {
    ProviderKind::ALL
        .iter()
        .map(|&kind| ProviderStatus {
            provider: kind,
            credentials: config.has_credentials(kind),
            model: config.model_for(kind).to_string(),
            default: config.dispatch.default_provider == kind,
            fallback: config.dispatch.fallback_provider == kind,
        })
        .collect()
}

/// Run `karte providers`.
pub fn list_providers(state: &AppState, json: bool) -> Result<()> {
    let statuses = provider_statuses(&state.config);

    if json {
        println!("{}", serde_json::to_string_pretty(&statuses)?);
        return Ok(());
    }

    println!();
    println!("  {}", style("Providers").bold());
    println!();

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Provider").fg(Color::White),
        Cell::new("Credentials").fg(Color::White),
        Cell::new("Model").fg(Color::White),
        Cell::new("Role").fg(Color::White),
    ]);

    for status in &statuses {
        let credentials = if status.credentials {
            Cell::new("✓ configured").fg(Color::Green)
        } else {
            Cell::new("✗ missing").fg(Color::Red)
        };
        let role = match (status.default, status.fallback) {
            (true, true) => "default, fallback",
            (true, false) => "default",
            (false, true) => "fallback",
            (false, false) => "-",
        };
        table.add_row(vec![
            Cell::new(status.provider.vendor_name()),
            credentials,
            Cell::new(&status.model),
            Cell::new(role),
        ]);
    }

    println!("{table}");
    println!();

    if statuses.iter().all(|s| !s.credentials) {
        println!(
            "  {} No AI API credentials are configured. Set {} or edit {}.",
            style("!").yellow().bold(),
            style("CLAUDE_API_KEY / OPENAI_API_KEY / GEMINI_CREDENTIALS").cyan(),
            style("karte.toml").cyan()
        );
        println!();
    }

    Ok(())
}
