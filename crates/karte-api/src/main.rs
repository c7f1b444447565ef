//! karte CLI entry point.
//!
//! Binary name: `karte`
//!
//! Parses CLI arguments, sets up tracing, loads configuration and prompt
//! overrides, then dispatches to the command handler.

mod cli;
mod state;

use clap::Parser;
use console::style;

use karte_observe::tracing_setup::{filter_for_verbosity, init_tracing, shutdown_tracing};

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = filter_for_verbosity(cli.verbose, cli.quiet);
    if let Err(e) = init_tracing(filter, cli.otel) {
        eprintln!("Warning: failed to initialize tracing: {e}");
    }

    let result = run(cli).await;
    shutdown_tracing();

    if let Err(err) = result {
        eprintln!("  {} {err:#}", style("✗").red().bold());
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let state = AppState::init(cli.config.clone()).await?;

    match cli.command {
        Commands::Summarize(args) => cli::summarize::summarize(&state, args, cli.json).await,
        Commands::Providers => cli::providers::list_providers(&state, cli.json),
        Commands::Config => cli::config::show_config(&state, cli.json),
    }
}
