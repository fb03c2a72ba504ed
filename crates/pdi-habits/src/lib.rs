//! # pdi-habits
//!
//! Personal development tracking for PDI Tracker: daily habits and their
//! streaks, achievement unlocks, and KPI value series.
//!
//! - [`compute_streaks`] derives current and best streaks from a habit's
//!   completion log, one calendar day at a time.
//! - [`evaluate_achievements`] turns progress metrics into newly earned
//!   achievements without re-emitting ones already unlocked.
//! - [`Kpi`] keeps an append-only, time-ordered value series.
//!
//! All functions here are pure; persistence is left to the caller.

pub mod achievement;
pub mod error;
pub mod habit;
pub mod kpi;
pub mod streak;

pub use achievement::{
    evaluate_achievements, unlock, Achievement, AchievementMetrics, AchievementType, Metric,
};
pub use error::HabitError;
pub use habit::{Habit, HabitLog};
pub use kpi::{Kpi, KpiValue};
pub use streak::{compute_streaks, current_streak_as_of, streaks_by_habit, Streaks};
