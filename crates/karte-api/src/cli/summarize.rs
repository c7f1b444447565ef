//! `karte summarize`: generate and print a sectioned summary.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Args;
use console::style;
use tokio::io::AsyncReadExt;

use karte_core::dispatch::DispatchOutcome;
use karte_core::sections::format_output;
use karte_types::llm::{ProviderKind, ProviderSelector};
use karte_types::section::SectionMap;
use karte_types::summary::{
    DEFAULT_DEPARTMENT, DEFAULT_DOCTOR, DEFAULT_DOCUMENT_TYPE, SummaryRequest,
};

use crate::state::AppState;

#[derive(Args, Debug)]
pub struct SummarizeArgs {
    /// Medical record file (reads stdin when omitted).
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Provider: claude, openai or gemini (defaults to the configured provider).
    #[arg(short, long)]
    pub provider: Option<String>,

    /// Model name, bypassing prompt-based model selection.
    #[arg(short, long)]
    pub model: Option<String>,

    /// Use Gemini with the configured flash model.
    #[arg(long, conflicts_with_all = ["provider", "model"])]
    pub flash: bool,

    #[arg(long, default_value = DEFAULT_DEPARTMENT)]
    pub department: String,

    #[arg(long, default_value = DEFAULT_DOCUMENT_TYPE)]
    pub document_type: String,

    #[arg(long, default_value = DEFAULT_DOCTOR)]
    pub doctor: String,

    /// Extra context appended after the record.
    #[arg(long, default_value = "")]
    pub additional_info: String,

    #[arg(long, default_value = "")]
    pub referral_purpose: String,

    #[arg(long, default_value = "")]
    pub current_prescription: String,

    /// Also print the full formatted text.
    #[arg(long)]
    pub raw: bool,
}

/// Run `karte summarize`.
pub async fn summarize(state: &AppState, args: SummarizeArgs, json: bool) -> Result<()> {
    let medical_text = read_input(args.input.as_ref()).await?;

    let (selector, model) = if args.flash {
        let Some(flash) = state.config.providers.gemini.flash_model.clone() else {
            bail!("no Gemini flash model is configured (set GEMINI_FLASH_MODEL)");
        };
        (Some(ProviderSelector::Kind(ProviderKind::Gemini)), Some(flash))
    } else {
        (args.provider.map(ProviderSelector::Name), args.model)
    };

    let mut request = SummaryRequest::new(medical_text)
        .with_additional_info(args.additional_info)
        .with_referral_purpose(args.referral_purpose)
        .with_current_prescription(args.current_prescription)
        .with_department(args.department)
        .with_document_type(args.document_type)
        .with_doctor(args.doctor);
    request.model = model;

    let outcome = state
        .dispatcher
        .summarize(selector, &request)
        .await
        .context("summary generation failed")?;

    let formatted = format_output(&outcome.result.text);
    let sections = state.sections.parse(&formatted);

    if json {
        let value = summary_json(&outcome, &sections, args.raw.then_some(formatted.as_str()));
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    if let Some(notice) = &outcome.switch_notice {
        println!();
        println!("  {} {}", style("!").yellow().bold(), style(notice).yellow());
    }

    println!();
    for (name, text) in sections.iter() {
        println!("  {}", style(format!("【{name}】")).bold().cyan());
        if text.is_empty() {
            println!("  {}", style("(empty)").dim());
        } else {
            for line in text.lines() {
                println!("  {line}");
            }
        }
        println!();
    }

    if args.raw {
        println!("  {}", style("Full text").bold());
        println!();
        for line in formatted.lines() {
            println!("  {line}");
        }
        println!();
    }

    let model = outcome.model.as_deref().unwrap_or("default model");
    println!(
        "  {}",
        style(format!(
            "{} ({model}) | input {} tokens | output {} tokens",
            outcome.provider.vendor_name(),
            outcome.result.input_tokens,
            outcome.result.output_tokens
        ))
        .dim()
    );
    println!();

    Ok(())
}

async fn read_input(path: Option<&PathBuf>) -> Result<String> {
    match path {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read {}", path.display())),
        None => {
            let mut text = String::new();
            tokio::io::stdin()
                .read_to_string(&mut text)
                .await
                .context("failed to read medical record from stdin")?;
            Ok(text)
        }
    }
}

/// JSON rendering of a summary outcome.
fn summary_json(
    outcome: &DispatchOutcome,
    sections: &SectionMap,
    full_text: Option<&str>,
) -> serde_json::Value {
    let mut value = serde_json::json!({
        "provider": outcome.provider,
        "model": outcome.model,
        "switch_notice": outcome.switch_notice,
        "input_tokens": outcome.result.input_tokens,
        "output_tokens": outcome.result.output_tokens,
        "sections": sections,
    });
    if let Some(text) = full_text {
        value["text"] = serde_json::Value::String(text.to_string());
    }
    value
}
