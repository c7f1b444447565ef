//! `karte config`: print the resolved configuration.
//!
//! Credentials are never serialized; only their presence is shown.

use anyhow::{Context, Result};
use console::style;

use karte_types::config::AppConfig;
use karte_types::llm::ProviderKind;

use crate::state::AppState;

fn config_json(config: &AppConfig) -> Result<serde_json::Value> {
    let mut value = serde_json::to_value(config)?;
    let credentials: serde_json::Map<String, serde_json::Value> = ProviderKind::ALL
        .iter()
        .map(|kind| (kind.to_string(), config.has_credentials(*kind).into()))
        .collect();
    value["credentials"] = credentials.into();
    Ok(value)
}

/// Run `karte config`.
pub fn show_config(state: &AppState, json: bool) -> Result<()> {
    if json {
        let value = config_json(&state.config)?;
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    let path = state
        .config_path
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "(none)".to_string());

    println!();
    println!("  {} {}", style("Config file:").bold(), style(path).cyan());
    for kind in ProviderKind::ALL {
        let status = if state.config.has_credentials(kind) {
            style("configured").green()
        } else {
            style("missing").red()
        };
        println!("  {} {status}", style(format!("{} credentials:", kind.vendor_name())).bold());
    }
    println!();

    let rendered =
        toml::to_string_pretty(state.config.as_ref()).context("failed to render configuration")?;
    for line in rendered.lines() {
        println!("  {line}");
    }
    println!();

    Ok(())
}
