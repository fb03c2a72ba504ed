// habit.rs — Habit subcommands over exported JSON files.

use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::Subcommand;
use pdi_habits::{
    current_streak_as_of, evaluate_achievements, streaks_by_habit, AchievementMetrics,
    AchievementType, HabitLog, Kpi,
};
use serde::de::DeserializeOwned;

#[derive(Subcommand)]
pub enum HabitCommands {
    /// Current and best streak per habit from a JSON array of log entries.
    Streaks {
        /// Path to the habit log file.
        logs: PathBuf,
        /// Also show the streak as of this date (defaults to today).
        #[arg(long)]
        on: Option<NaiveDate>,
    },
    /// Achievements newly earned by the metrics in a JSON file.
    Achievements {
        /// Path to the metrics file.
        metrics: PathBuf,
        /// Achievements already unlocked (comma-separated, e.g. "first_habit,streak_7").
        #[arg(long, value_delimiter = ',')]
        unlocked: Vec<AchievementType>,
    },
    /// Current value, last change, and gap to target for a KPI file.
    Kpi {
        /// Path to the KPI file.
        kpi: PathBuf,
    },
}

pub fn execute(cmd: &HabitCommands) -> anyhow::Result<()> {
    match cmd {
        HabitCommands::Streaks { logs, on } => {
            show_streaks(logs, on.unwrap_or_else(|| Utc::now().date_naive()))
        }
        HabitCommands::Achievements { metrics, unlocked } => show_achievements(metrics, unlocked),
        HabitCommands::Kpi { kpi } => show_kpi(kpi),
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("invalid JSON in {}", path.display()))
}

fn show_streaks(path: &Path, today: NaiveDate) -> anyhow::Result<()> {
    let logs: Vec<HabitLog> = read_json(path)?;
    if logs.is_empty() {
        println!("No habit entries found.");
        return Ok(());
    }

    let mut by_habit: Vec<_> = streaks_by_habit(&logs).into_iter().collect();
    by_habit.sort_by_key(|(habit_id, _)| *habit_id);

    println!("{:<38} {:>8} {:>8} {:>10}", "HABIT", "CURRENT", "BEST", "AS OF");
    println!("{}", "-".repeat(67));
    for (habit_id, streaks) in &by_habit {
        let own: Vec<HabitLog> = logs
            .iter()
            .filter(|l| l.habit_id == *habit_id)
            .cloned()
            .collect();
        println!(
            "{:<38} {:>8} {:>8} {:>10}",
            habit_id,
            streaks.current,
            streaks.best,
            current_streak_as_of(&own, today)
        );
    }
    println!("\nAs of {}.", today);
    Ok(())
}

fn show_achievements(path: &Path, unlocked: &[AchievementType]) -> anyhow::Result<()> {
    let metrics: AchievementMetrics = read_json(path)?;
    let earned = evaluate_achievements(&metrics, unlocked);
    if earned.is_empty() {
        println!("No new achievements.");
        return Ok(());
    }
    for achievement in &earned {
        println!(
            "{:<22} ({} >= {})",
            achievement.to_string(),
            metrics.value(achievement.metric()),
            achievement.threshold()
        );
    }
    println!("\n{} new achievement(s).", earned.len());
    Ok(())
}

fn show_kpi(path: &Path) -> anyhow::Result<()> {
    let kpi: Kpi = read_json(path)?;
    kpi.validate()
        .with_context(|| format!("invalid KPI series in {}", path.display()))?;
    let unit = kpi.unit.as_deref().unwrap_or("");
    let fmt = |v: Option<f64>| match v {
        Some(v) => format!("{}{}", v, unit),
        None => "-".to_string(),
    };
    println!("KPI:      {}", kpi.name);
    println!("Values:   {}", kpi.values.len());
    println!("Current:  {}", fmt(kpi.current_value()));
    println!("Change:   {}", fmt(kpi.delta()));
    println!("Target:   {}", fmt(kpi.target_value));
    println!("Gap:      {}", fmt(kpi.gap_to_target()));
    Ok(())
}
