// habit.rs — Habits and their date-keyed completion log.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::HabitError;
use crate::streak::{compute_streaks, Streaks};

/// A recurring action a person wants to practice daily.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Habit {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    /// Archived habits keep their history but stop counting as active.
    #[serde(default = "default_active")]
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

impl Habit {
    pub fn new(user_id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            name: name.into(),
            active: true,
            created_at: Utc::now(),
        }
    }

    /// Create a log entry for `date`.
    pub fn log(&self, date: NaiveDate, completed: bool) -> HabitLog {
        HabitLog {
            habit_id: self.id,
            date,
            completed,
            logged_at: Utc::now(),
        }
    }

    /// Streaks over this habit's entries in `logs`; entries for other habits
    /// are ignored.
    pub fn streaks(&self, logs: &[HabitLog]) -> Streaks {
        let own: Vec<HabitLog> = logs
            .iter()
            .filter(|l| l.habit_id == self.id)
            .cloned()
            .collect();
        compute_streaks(&own)
    }

    /// Like [`Habit::streaks`] but refuses foreign entries instead of
    /// skipping them.
    pub fn strict_streaks(&self, logs: &[HabitLog]) -> Result<Streaks, HabitError> {
        if let Some(stray) = logs.iter().find(|l| l.habit_id != self.id) {
            return Err(HabitError::HabitMismatch {
                habit_id: self.id,
                log_habit_id: stray.habit_id,
            });
        }
        Ok(compute_streaks(logs))
    }
}

/// One day's entry for a habit. Later entries for the same date replace
/// earlier ones.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HabitLog {
    pub habit_id: Uuid,
    pub date: NaiveDate,
    pub completed: bool,
    pub logged_at: DateTime<Utc>,
}
