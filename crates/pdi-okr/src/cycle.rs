// cycle.rs — Cycle: the bounded period (usually a quarter) objectives belong to.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::OkrError;

/// Where a date falls relative to a cycle.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CyclePhase {
    #[default]
    Upcoming,
    Active,
    Ended,
}

impl fmt::Display for CyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CyclePhase::Upcoming => write!(f, "upcoming"),
            CyclePhase::Active => write!(f, "active"),
            CyclePhase::Ended => write!(f, "ended"),
        }
    }
}

/// A named period with inclusive start and end dates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cycle {
    pub id: Uuid,
    pub name: String,
    pub starts_on: NaiveDate,
    pub ends_on: NaiveDate,
}

impl Cycle {
    pub fn new(
        name: impl Into<String>,
        starts_on: NaiveDate,
        ends_on: NaiveDate,
    ) -> Result<Self, OkrError> {
        let name = name.into();
        if ends_on < starts_on {
            return Err(OkrError::InvalidCycle { name });
        }
        Ok(Self {
            id: Uuid::new_v4(),
            name,
            starts_on,
            ends_on,
        })
    }

    pub fn phase_on(&self, date: NaiveDate) -> CyclePhase {
        if date < self.starts_on {
            CyclePhase::Upcoming
        } else if date > self.ends_on {
            CyclePhase::Ended
        } else {
            CyclePhase::Active
        }
    }
}
