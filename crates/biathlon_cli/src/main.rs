//! Biathlon race replay CLI
//!
//! Reads a race config and an event log, replays the race and prints the
//! narration log and results table.

#[cfg(feature = "cli")]
use anyhow::{Context, Result};
#[cfg(feature = "cli")]
use biathlon_core::{load_events, render_text, RaceConfig, Simulation, Standings};
#[cfg(feature = "cli")]
use clap::{Parser, ValueEnum};
#[cfg(feature = "cli")]
use std::path::PathBuf;
#[cfg(feature = "cli")]
use tracing::{info, warn};

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "biathlon", version = biathlon_core::VERSION)]
#[command(about = "Replay a biathlon race event log", long_about = None)]
struct Cli {
    /// Race config JSON file
    #[arg(long, default_value = "config.json")]
    config: PathBuf,

    /// Event log file
    #[arg(long, default_value = "events")]
    events: PathBuf,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[cfg(feature = "cli")]
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    /// Output log followed by the results table
    Text,
    /// Standings and skipped lines as JSON
    Json,
}

#[cfg(feature = "cli")]
fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = RaceConfig::load(&cli.config)
        .with_context(|| format!("failed to load race config {}", cli.config.display()))?;
    let decoded = load_events(&cli.events)
        .with_context(|| format!("failed to read event log {}", cli.events.display()))?;

    info!(
        config = %cli.config.display(),
        events = decoded.events.len(),
        skipped = decoded.skipped.len(),
        "inputs loaded"
    );
    if let Some(first) = decoded.skipped.first() {
        warn!(
            count = decoded.skipped.len(),
            first_line = first.line_number,
            "event log contained malformed lines"
        );
    }

    let mut simulation = Simulation::new(config);
    simulation.run(decoded.events);

    match cli.format {
        Format::Text => print!("{}", render_text(&simulation)),
        Format::Json => {
            let output = serde_json::json!({
                "config": simulation.config(),
                "standings": Standings::build(&simulation),
                "log": simulation.log(),
                "warnings": simulation.warnings(),
                "skipped": decoded.skipped,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("biathlon CLI is not available. Enable the 'cli' feature to use it.");
    std::process::exit(1);
}
