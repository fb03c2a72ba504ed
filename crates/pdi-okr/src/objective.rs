// objective.rs — Objective: a qualitative goal at one level of the organization.
//
// Objectives form a hierarchy (company → area → head → individual) through
// optional parent links. Each objective carries its lifecycle status:
//   Draft → PendingValidation → Approved → Tracking → Closed
//                             ↘ Rejected → Draft
// The rules for moving between statuses live in `lifecycle.rs`; this module
// only holds the data and applies a status once it has been validated.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::OkrError;
use crate::key_result::KeyResult;
use crate::lifecycle::{validate_transition, Actor, InvalidTransition, TransitionContext};
use crate::scoring::score_objective;

/// The organizational level an objective belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ObjectiveLevel {
    Company,
    Area,
    Head,
    Individual,
}

impl ObjectiveLevel {
    /// Depth in the hierarchy; company is 0 and individual is 3.
    pub fn depth(self) -> u8 {
        match self {
            ObjectiveLevel::Company => 0,
            ObjectiveLevel::Area => 1,
            ObjectiveLevel::Head => 2,
            ObjectiveLevel::Individual => 3,
        }
    }

    /// True if an objective at this level may parent one at `child`.
    pub fn can_parent(self, child: ObjectiveLevel) -> bool {
        self.depth() < child.depth()
    }
}

impl fmt::Display for ObjectiveLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectiveLevel::Company => write!(f, "company"),
            ObjectiveLevel::Area => write!(f, "area"),
            ObjectiveLevel::Head => write!(f, "head"),
            ObjectiveLevel::Individual => write!(f, "individual"),
        }
    }
}

impl FromStr for ObjectiveLevel {
    type Err = OkrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "company" => Ok(ObjectiveLevel::Company),
            "area" => Ok(ObjectiveLevel::Area),
            "head" => Ok(ObjectiveLevel::Head),
            "individual" => Ok(ObjectiveLevel::Individual),
            other => Err(OkrError::UnknownName {
                kind: "objective level",
                value: other.to_string(),
            }),
        }
    }
}

/// The lifecycle status of an objective.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ObjectiveStatus {
    /// Being written by its owner; not yet submitted.
    Draft,

    /// Submitted and waiting for the owner's manager.
    PendingValidation,

    /// Validated; starts tracking once the cycle is active.
    Approved,

    /// Sent back to the owner for edits.
    Rejected,

    /// Cycle is running and check-ins are being recorded.
    Tracking,

    /// Cycle has ended. Terminal.
    Closed,
}

impl ObjectiveStatus {
    pub const ALL: [ObjectiveStatus; 6] = [
        ObjectiveStatus::Draft,
        ObjectiveStatus::PendingValidation,
        ObjectiveStatus::Approved,
        ObjectiveStatus::Rejected,
        ObjectiveStatus::Tracking,
        ObjectiveStatus::Closed,
    ];

    /// Anything short of `Closed` still counts against the owner's
    /// one-individual-objective-per-cycle allowance.
    pub fn is_active(self) -> bool {
        self != ObjectiveStatus::Closed
    }

    /// Whether key results under an objective in this status take check-ins.
    pub fn accepts_check_ins(self) -> bool {
        matches!(self, ObjectiveStatus::Approved | ObjectiveStatus::Tracking)
    }

    /// Key results are added only while the objective is being drafted.
    pub fn accepts_new_key_results(self) -> bool {
        matches!(self, ObjectiveStatus::Draft | ObjectiveStatus::Rejected)
    }
}

impl fmt::Display for ObjectiveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectiveStatus::Draft => write!(f, "draft"),
            ObjectiveStatus::PendingValidation => write!(f, "pending_validation"),
            ObjectiveStatus::Approved => write!(f, "approved"),
            ObjectiveStatus::Rejected => write!(f, "rejected"),
            ObjectiveStatus::Tracking => write!(f, "tracking"),
            ObjectiveStatus::Closed => write!(f, "closed"),
        }
    }
}

impl FromStr for ObjectiveStatus {
    type Err = OkrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ObjectiveStatus::ALL
            .into_iter()
            .find(|status| status.to_string() == s)
            .ok_or_else(|| OkrError::UnknownName {
                kind: "objective status",
                value: s.to_string(),
            })
    }
}

/// An objective together with its lifecycle status and cached score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Objective {
    pub id: Uuid,

    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub level: ObjectiveLevel,

    /// Business area (e.g., "Sales") for area/head/individual objectives.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area: Option<String>,

    /// Link to the higher-level objective this one contributes to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_objective_id: Option<Uuid>,

    pub cycle_id: Uuid,

    pub owner_id: Uuid,

    pub status: ObjectiveStatus,

    /// Cached aggregate score (0–10). `None` while there are no key results.
    /// Always recomputed via [`Objective::refresh_score`], never edited.
    #[serde(default)]
    pub current_score: Option<f64>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Objective {
    /// Create a new objective in the Draft status.
    pub fn new(
        title: impl Into<String>,
        level: ObjectiveLevel,
        owner_id: Uuid,
        cycle_id: Uuid,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            description: None,
            level,
            area: None,
            parent_objective_id: None,
            cycle_id,
            owner_id,
            status: ObjectiveStatus::Draft,
            current_score: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Validate and apply a status change. On error the objective is untouched.
    pub fn transition(
        &mut self,
        requested: ObjectiveStatus,
        actor: &Actor,
        context: &TransitionContext,
    ) -> Result<ObjectiveStatus, InvalidTransition> {
        let previous = self.status;
        self.status = validate_transition(self, requested, actor, context)?;
        self.updated_at = Utc::now();
        Ok(previous)
    }

    /// Recompute the cached score from the given key results.
    pub fn refresh_score(&mut self, key_results: &[KeyResult]) -> Option<f64> {
        self.current_score = score_objective(self, key_results);
        self.current_score
    }
}
