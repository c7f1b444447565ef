//! CLI command definitions for the `karte` binary.

pub mod config;
pub mod providers;
pub mod summarize;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Summarize medical records with Claude, OpenAI or Gemini.
#[derive(Parser)]
#[command(name = "karte", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all log output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to karte.toml (defaults to the user config directory).
    #[arg(long, global = true, env = "KARTE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Export tracing spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a sectioned summary of a medical record.
    Summarize(summarize::SummarizeArgs),

    /// List providers with credential and model status.
    Providers,

    /// Show the resolved configuration (secrets redacted).
    Config,
}
