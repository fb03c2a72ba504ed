// kpi.rs — Key performance indicators and their value series.
//
// A KPI's history is append-only and ordered by `recorded_at`; the current
// value is always the last entry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::HabitError;

/// A tracked indicator with an optional target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Kpi {
    pub id: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    pub owner_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_value: Option<f64>,
    #[serde(default)]
    pub values: Vec<KpiValue>,
}

/// One recorded measurement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KpiValue {
    pub id: Uuid,
    pub kpi_id: Uuid,
    pub value: f64,
    pub recorded_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Kpi {
    pub fn new(owner_id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            unit: None,
            owner_id,
            target_value: None,
            values: Vec::new(),
        }
    }

    pub fn with_target(mut self, target: f64) -> Self {
        self.target_value = Some(target);
        self
    }

    /// Append a value recorded now.
    pub fn record(&mut self, value: f64, note: Option<String>) -> Result<&KpiValue, HabitError> {
        self.record_at(value, Utc::now(), note)
    }

    /// Append a value with an explicit timestamp. Equal timestamps are
    /// accepted and keep insertion order; earlier ones are refused.
    pub fn record_at(
        &mut self,
        value: f64,
        recorded_at: DateTime<Utc>,
        note: Option<String>,
    ) -> Result<&KpiValue, HabitError> {
        if !value.is_finite() {
            return Err(HabitError::NonFiniteValue {
                kpi_id: self.id,
                value,
            });
        }
        if let Some(latest) = self.values.last() {
            if recorded_at < latest.recorded_at {
                return Err(HabitError::KpiValueOutOfOrder {
                    kpi_id: self.id,
                    latest: latest.recorded_at,
                    attempted: recorded_at,
                });
            }
        }
        self.values.push(KpiValue {
            id: Uuid::new_v4(),
            kpi_id: self.id,
            value,
            recorded_at,
            note,
        });
        tracing::debug!(kpi_id = %self.id, value, "recorded KPI value");
        let idx = self.values.len() - 1;
        Ok(&self.values[idx])
    }

    /// Check a series that did not come through `record_at`, such as one
    /// read from a file: values must be finite and in time order.
    pub fn validate(&self) -> Result<(), HabitError> {
        if let Some(bad) = self.values.iter().find(|v| !v.value.is_finite()) {
            return Err(HabitError::NonFiniteValue {
                kpi_id: self.id,
                value: bad.value,
            });
        }
        for pair in self.values.windows(2) {
            if pair[1].recorded_at < pair[0].recorded_at {
                return Err(HabitError::KpiValueOutOfOrder {
                    kpi_id: self.id,
                    latest: pair[0].recorded_at,
                    attempted: pair[1].recorded_at,
                });
            }
        }
        Ok(())
    }

    pub fn current_value(&self) -> Option<f64> {
        self.values.last().map(|v| v.value)
    }

    /// Change between the last two values.
    pub fn delta(&self) -> Option<f64> {
        match self.values.as_slice() {
            [.., previous, latest] => Some(latest.value - previous.value),
            _ => None,
        }
    }

    /// Distance still to go: `target - current`. Negative once the target is
    /// passed.
    pub fn gap_to_target(&self) -> Option<f64> {
        Some(self.target_value? - self.current_value()?)
    }
}
