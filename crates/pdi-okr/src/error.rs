// error.rs — Error types for the OKR subsystem.

use thiserror::Error;
use uuid::Uuid;

use crate::lifecycle::InvalidTransition;
use crate::objective::{ObjectiveLevel, ObjectiveStatus};

/// Errors that can occur during OKR operations.
#[derive(Debug, Error)]
pub enum OkrError {
    /// A file I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    IoError {
        path: String,
        source: std::io::Error,
    },

    /// Failed to serialize/deserialize OKR data.
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// A stored record could not be parsed while checking an invariant.
    #[error("corrupt record at {path}: {source}")]
    CorruptRecord {
        path: String,
        source: serde_json::Error,
    },

    /// Another writer held the store lock for too long.
    #[error("store is locked ({path}); remove the file if no other pdi process is running")]
    StoreLocked { path: String },

    /// The requested objective was not found.
    #[error("objective not found: {0}")]
    ObjectiveNotFound(Uuid),

    /// The requested key result was not found.
    #[error("key result not found: {0}")]
    KeyResultNotFound(Uuid),

    /// The requested cycle was not found.
    #[error("cycle not found: {0}")]
    CycleNotFound(Uuid),

    /// The lifecycle engine refused the requested status change.
    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),

    /// The persisted status moved since the caller read it.
    #[error("objective {objective_id} is {actual}, expected {expected}")]
    StaleStatus {
        objective_id: Uuid,
        expected: ObjectiveStatus,
        actual: ObjectiveStatus,
    },

    /// The authorization gate refused the actor.
    #[error("actor {actor_id} may not act on objective {objective_id}")]
    NotAuthorized { actor_id: Uuid, objective_id: Uuid },

    /// Check-ins are only recorded while an objective is approved or tracking.
    #[error("objective {objective_id} does not accept check-ins while {status}")]
    CheckInRejected {
        objective_id: Uuid,
        status: ObjectiveStatus,
    },

    /// Key results can no longer be added or edited in this status.
    #[error("objective {objective_id} does not accept key result changes while {status}")]
    KeyResultsFrozen {
        objective_id: Uuid,
        status: ObjectiveStatus,
    },

    /// A check-in in the history belongs to a different key result.
    #[error("check-in {check_in_id} does not belong to key result {key_result_id}")]
    CheckInMismatch {
        key_result_id: Uuid,
        check_in_id: Uuid,
    },

    /// A recorded value was NaN or infinite.
    #[error("non-finite value {value} for key result {key_result_id}")]
    NonFiniteValue { key_result_id: Uuid, value: f64 },

    /// A cycle ends before it starts.
    #[error("cycle '{name}' ends before it starts")]
    InvalidCycle { name: String },

    /// A company objective tried to link to a parent.
    #[error("company objective {0} cannot have a parent")]
    CompanyObjectiveWithParent(Uuid),

    /// The parent does not sit above the child in the hierarchy.
    #[error("a {parent_level} objective cannot parent a {child_level} objective")]
    ParentLevelMismatch {
        child_level: ObjectiveLevel,
        parent_level: ObjectiveLevel,
    },

    /// Following parent links returned to an objective already visited.
    #[error("parent chain of objective {0} contains a cycle")]
    ParentCycle(Uuid),

    /// An owner already has an active individual objective in the cycle.
    #[error("owner {owner_id} already has individual objective {existing} in cycle {cycle_id}")]
    DuplicateIndividualObjective {
        owner_id: Uuid,
        cycle_id: Uuid,
        existing: Uuid,
    },

    /// A status or level name could not be parsed.
    #[error("unknown {kind} '{value}'")]
    UnknownName { kind: &'static str, value: String },

    /// A notification dispatch failed (non-fatal).
    #[error("notification error: {0}")]
    NotificationError(String),
}
