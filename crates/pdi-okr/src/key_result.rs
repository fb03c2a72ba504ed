// key_result.rs — Key results and their append-only check-in history.
//
// A key result's `current_value` only moves through check-ins. Each check-in
// is an immutable record of the value at a point in time; the key result's
// current value always equals the most recent check-in's value.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::OkrError;
use crate::scoring::score_key_result;

/// Whether a metric improves by going up or down.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MetricDirection {
    Increasing,
    Decreasing,
}

/// How confident the author of a check-in is about hitting the target.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Confidence::Low => write!(f, "low"),
            Confidence::Medium => write!(f, "medium"),
            Confidence::High => write!(f, "high"),
        }
    }
}

impl FromStr for Confidence {
    type Err = OkrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Confidence::Low),
            "medium" => Ok(Confidence::Medium),
            "high" => Ok(Confidence::High),
            other => Err(OkrError::UnknownName {
                kind: "confidence",
                value: other.to_string(),
            }),
        }
    }
}

/// A measurable target under an objective.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyResult {
    pub id: Uuid,

    pub objective_id: Uuid,

    pub title: String,

    /// Display unit (e.g., "%", "BRL", "tickets").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,

    pub start_value: f64,

    pub target_value: f64,

    pub current_value: f64,

    /// Relative weight in the objective's aggregate score.
    #[serde(default = "default_weight")]
    pub weight: f64,

    pub updated_at: DateTime<Utc>,
}

fn default_weight() -> f64 {
    1.0
}

impl KeyResult {
    /// Create a key result that starts at its start value with default weight.
    pub fn new(
        objective_id: Uuid,
        title: impl Into<String>,
        start_value: f64,
        target_value: f64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            objective_id,
            title: title.into(),
            unit: None,
            start_value,
            target_value,
            current_value: start_value,
            weight: default_weight(),
            updated_at: Utc::now(),
        }
    }

    /// Inferred from start vs target. A flat metric counts as increasing.
    pub fn direction(&self) -> MetricDirection {
        if self.target_value < self.start_value {
            MetricDirection::Decreasing
        } else {
            MetricDirection::Increasing
        }
    }

    /// Normalized 0–10 score; see [`score_key_result`].
    pub fn score(&self) -> f64 {
        score_key_result(self)
    }

    /// Record a new value and return the immutable check-in for the history.
    pub fn check_in(
        &mut self,
        author_id: Uuid,
        value: f64,
        confidence: Option<Confidence>,
        note: Option<String>,
    ) -> Result<CheckIn, OkrError> {
        if !value.is_finite() {
            return Err(OkrError::NonFiniteValue {
                key_result_id: self.id,
                value,
            });
        }
        let check_in = CheckIn {
            id: Uuid::new_v4(),
            key_result_id: self.id,
            author_id,
            previous_value: self.current_value,
            value,
            confidence,
            note,
            created_at: Utc::now(),
        };
        self.current_value = value;
        self.updated_at = check_in.created_at;
        Ok(check_in)
    }

    /// Re-derive `current_value` from a stored check-in history.
    ///
    /// The latest check-in by timestamp wins; among equal timestamps the
    /// later one in `history` wins. With no history the value falls back to
    /// `start_value`.
    pub fn reconcile(&mut self, history: &[CheckIn]) -> Result<(), OkrError> {
        if let Some(stray) = history.iter().find(|c| c.key_result_id != self.id) {
            return Err(OkrError::CheckInMismatch {
                key_result_id: self.id,
                check_in_id: stray.id,
            });
        }
        let latest = history
            .iter()
            .fold(None::<&CheckIn>, |best, c| match best {
                Some(b) if b.created_at > c.created_at => Some(b),
                _ => Some(c),
            });
        match latest {
            Some(c) => {
                self.current_value = c.value;
                self.updated_at = c.created_at;
            }
            None => self.current_value = self.start_value,
        }
        Ok(())
    }
}

/// An immutable, timestamped record of a key result's value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckIn {
    pub id: Uuid,
    pub key_result_id: Uuid,
    pub author_id: Uuid,
    pub previous_value: f64,
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<Confidence>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}
