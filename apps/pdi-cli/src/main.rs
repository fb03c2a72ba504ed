//! # pdi
//!
//! Command-line interface for PDI Tracker.
//!
//! - `pdi okr show/list/dashboard/tree` — inspect objectives and scores
//! - `pdi okr create/add-kr/cycle` — record objectives, key results, cycles
//! - `pdi okr transition/advance` — drive the approval workflow
//! - `pdi okr check-in` — record progress on a key result
//! - `pdi habit streaks/achievements/kpi` — evaluate personal progress files
//! - `pdi people list/chart` — inspect the directory and org chart

mod commands;
mod config;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use config::PdiConfig;

/// PDI Tracker CLI — OKRs, habits, and the people behind them.
#[derive(Parser)]
#[command(name = "pdi", version, about)]
struct Cli {
    /// Project root directory (defaults to current directory).
    #[arg(long, default_value = ".")]
    project_root: PathBuf,

    /// Config file (defaults to pdi.toml in the project root).
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Objectives, key results, and the approval workflow.
    Okr {
        #[command(subcommand)]
        command: commands::okr::OkrCommands,
    },
    /// Habit streaks, achievements, and KPIs.
    Habit {
        #[command(subcommand)]
        command: commands::habit::HabitCommands,
    },
    /// The people directory.
    People {
        #[command(subcommand)]
        command: commands::people::PeopleCommands,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let project_root = cli.project_root.canonicalize().unwrap_or(cli.project_root);
    let config = match &cli.config {
        Some(path) => PdiConfig::load(path)?.resolve(&project_root),
        None => PdiConfig::for_project(&project_root)?,
    };

    init_logging(&config)?;
    tracing::debug!(project_root = %project_root.display(), "pdi starting");

    match &cli.command {
        Commands::Okr { command } => commands::okr::execute(command, &config),
        Commands::Habit { command } => commands::habit::execute(command),
        Commands::People { command } => commands::people::execute(command, &config),
    }
}

/// Logs go to stderr so command output on stdout stays clean.
fn init_logging(config: &PdiConfig) -> anyhow::Result<()> {
    let directives = std::env::var(EnvFilter::DEFAULT_ENV)
        .ok()
        .filter(|d| !d.trim().is_empty())
        .unwrap_or_else(|| config.logging.level.clone());
    let filter = EnvFilter::try_new(&directives)?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false);
    if config.logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}
