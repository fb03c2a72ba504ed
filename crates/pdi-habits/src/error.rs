// error.rs — Error types for habits, achievements, and KPIs.

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur while recording habit or KPI data.
#[derive(Debug, Error)]
pub enum HabitError {
    /// A log entry was handed to the wrong habit.
    #[error("log for habit {log_habit_id} does not belong to habit {habit_id}")]
    HabitMismatch { habit_id: Uuid, log_habit_id: Uuid },

    /// KPI series are append-only in time order.
    #[error("value for KPI {kpi_id} at {attempted} predates latest value at {latest}")]
    KpiValueOutOfOrder {
        kpi_id: Uuid,
        latest: DateTime<Utc>,
        attempted: DateTime<Utc>,
    },

    /// A recorded value was NaN or infinite.
    #[error("non-finite value {value} for KPI {kpi_id}")]
    NonFiniteValue { kpi_id: Uuid, value: f64 },

    /// An achievement type name could not be parsed.
    #[error("unknown achievement type '{0}'")]
    UnknownAchievement(String),
}
