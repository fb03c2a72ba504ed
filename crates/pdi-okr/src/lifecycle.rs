// lifecycle.rs — Objective approval workflow.
//
// The valid transitions form a small directed graph:
//   Draft → PendingValidation          (owner, needs ≥ 1 key result)
//   PendingValidation → Approved       (owner's manager or admin, never the owner)
//   PendingValidation → Rejected       (same as above)
//   Rejected → Draft                   (owner, edit and resubmit)
//   Approved → Tracking                (system or admin, once the cycle has started)
//   Tracking → Closed                  (system or admin, once the cycle has ended)
//
// `validate_transition` is pure: it reads the objective, the actor, and a
// `TransitionContext` holding the facts the guards need, and returns the new
// status or the reason it was refused. Persisting the result, and making sure
// the status it validated against is still the persisted one, is the
// caller's job (see `OkrStore::apply_transition`).

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::cycle::CyclePhase;
use crate::objective::{Objective, ObjectiveStatus};

/// The role an actor holds in the organization.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Collaborator,
    Head,
    Admin,
    /// Scheduled jobs applying automatic transitions.
    System,
}

impl Role {
    /// Elevated actors may validate any objective they do not own.
    pub fn is_elevated(self) -> bool {
        self == Role::Admin
    }

    /// Cycle-driven transitions belong to the scheduler; admins may apply
    /// them by hand.
    pub fn drives_cycle_transitions(self) -> bool {
        matches!(self, Role::System | Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Collaborator => write!(f, "collaborator"),
            Role::Head => write!(f, "head"),
            Role::Admin => write!(f, "admin"),
            Role::System => write!(f, "system"),
        }
    }
}

/// Who is asking for a transition.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Actor {
    pub id: Uuid,
    pub role: Role,
}

impl Actor {
    pub fn new(id: Uuid, role: Role) -> Self {
        Self { id, role }
    }

    /// The actor used for automatic transitions.
    pub fn system() -> Self {
        Self {
            id: Uuid::nil(),
            role: Role::System,
        }
    }
}

/// Facts about the objective's surroundings that the guards read.
///
/// The caller gathers these from the store and the directory in the same
/// read that loaded the objective.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransitionContext {
    /// Number of key results currently attached to the objective.
    pub key_result_count: usize,

    /// Phase of the objective's cycle on the evaluation date.
    pub cycle_phase: CyclePhase,

    /// The objective owner's manager, if the directory knows one.
    pub owner_manager_id: Option<Uuid>,
}

/// Why a transition was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum TransitionRejection {
    /// The graph has no edge between the two statuses.
    NoSuchTransition,
    /// Only the owner may take this step.
    NotOwner { actor_id: Uuid },
    /// Owners cannot validate their own objectives.
    OwnerCannotValidate,
    /// Validation needs the owner's manager or an elevated actor.
    NotManager { actor_id: Uuid },
    /// Submission needs at least one key result.
    MissingKeyResults,
    /// Cycle-driven steps are taken by the system or an admin.
    NotScheduler { actor_id: Uuid },
    /// Tracking starts only once the cycle has started.
    CycleNotActive { phase: CyclePhase },
    /// Closing waits for the cycle to end.
    CycleNotEnded { phase: CyclePhase },
}

impl fmt::Display for TransitionRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransitionRejection::NoSuchTransition => write!(f, "no such transition"),
            TransitionRejection::NotOwner { actor_id } => {
                write!(f, "actor {} is not the owner", actor_id)
            }
            TransitionRejection::OwnerCannotValidate => {
                write!(f, "owners cannot validate their own objective")
            }
            TransitionRejection::NotManager { actor_id } => {
                write!(f, "actor {} is neither the owner's manager nor an admin", actor_id)
            }
            TransitionRejection::MissingKeyResults => {
                write!(f, "objective has no key results")
            }
            TransitionRejection::NotScheduler { actor_id } => {
                write!(f, "actor {} may not apply cycle-driven transitions", actor_id)
            }
            TransitionRejection::CycleNotActive { phase } => {
                write!(f, "cycle is {}, not active", phase)
            }
            TransitionRejection::CycleNotEnded { phase } => {
                write!(f, "cycle is {}, not ended", phase)
            }
        }
    }
}

/// A refused transition, naming both statuses and the reason.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition from {from} to {to} for objective {objective_id}: {reason}")]
pub struct InvalidTransition {
    pub objective_id: Uuid,
    pub from: ObjectiveStatus,
    pub to: ObjectiveStatus,
    pub reason: TransitionRejection,
}

/// External authorization capability (row-level policy in the hosted backend).
///
/// The engine never calls this itself; callers ask the gate before asking
/// the engine.
pub trait TransitionGate {
    /// Whether `actor` may act on `objective` at all.
    fn can_transition(&self, actor: &Actor, objective: &Objective) -> bool;

    /// The owner's manager as known to the gate's directory.
    fn owner_manager(&self, _objective: &Objective) -> Option<Uuid> {
        None
    }
}

/// Statuses reachable from `from` when every guard passes.
pub fn allowed_transitions(from: ObjectiveStatus) -> &'static [ObjectiveStatus] {
    use ObjectiveStatus::*;
    match from {
        Draft => &[PendingValidation],
        PendingValidation => &[Approved, Rejected],
        Approved => &[Tracking],
        Rejected => &[Draft],
        Tracking => &[Closed],
        Closed => &[],
    }
}

/// Check whether `actor` may move `objective` to `requested`.
///
/// Returns the new status on success.
pub fn validate_transition(
    objective: &Objective,
    requested: ObjectiveStatus,
    actor: &Actor,
    context: &TransitionContext,
) -> Result<ObjectiveStatus, InvalidTransition> {
    use ObjectiveStatus::*;

    let reject = |reason| InvalidTransition {
        objective_id: objective.id,
        from: objective.status,
        to: requested,
        reason,
    };
    let is_owner = actor.id == objective.owner_id;

    match (objective.status, requested) {
        (Draft, PendingValidation) => {
            if !is_owner {
                return Err(reject(TransitionRejection::NotOwner { actor_id: actor.id }));
            }
            if context.key_result_count == 0 {
                return Err(reject(TransitionRejection::MissingKeyResults));
            }
        }
        (PendingValidation, Approved | Rejected) => {
            if is_owner {
                return Err(reject(TransitionRejection::OwnerCannotValidate));
            }
            let is_manager = context.owner_manager_id == Some(actor.id);
            if !is_manager && !actor.role.is_elevated() {
                return Err(reject(TransitionRejection::NotManager { actor_id: actor.id }));
            }
        }
        (Rejected, Draft) => {
            if !is_owner {
                return Err(reject(TransitionRejection::NotOwner { actor_id: actor.id }));
            }
        }
        (Approved, Tracking) => {
            if !actor.role.drives_cycle_transitions() {
                return Err(reject(TransitionRejection::NotScheduler { actor_id: actor.id }));
            }
            if context.cycle_phase == CyclePhase::Upcoming {
                return Err(reject(TransitionRejection::CycleNotActive {
                    phase: context.cycle_phase,
                }));
            }
        }
        (Tracking, Closed) => {
            if !actor.role.drives_cycle_transitions() {
                return Err(reject(TransitionRejection::NotScheduler { actor_id: actor.id }));
            }
            if context.cycle_phase != CyclePhase::Ended {
                return Err(reject(TransitionRejection::CycleNotEnded {
                    phase: context.cycle_phase,
                }));
            }
        }
        _ => return Err(reject(TransitionRejection::NoSuchTransition)),
    }

    Ok(requested)
}

/// The transition the system should apply on its own, if any.
///
/// Approved objectives start tracking when their cycle is active; tracking
/// objectives close once it has ended. An approved objective whose cycle has
/// already ended still moves to tracking first.
pub fn automatic_transition(objective: &Objective, phase: CyclePhase) -> Option<ObjectiveStatus> {
    match (objective.status, phase) {
        (ObjectiveStatus::Approved, CyclePhase::Active | CyclePhase::Ended) => {
            Some(ObjectiveStatus::Tracking)
        }
        (ObjectiveStatus::Tracking, CyclePhase::Ended) => Some(ObjectiveStatus::Closed),
        _ => None,
    }
}
