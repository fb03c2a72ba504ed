//! # pdi-okr
//!
//! OKR lifecycle, scoring, and alignment rules for PDI Tracker.
//!
//! An [`Objective`] is a goal at company, area, head, or individual level.
//! Its [`KeyResult`]s are scored 0–10 from their start, target, and current
//! values; the objective's score is their weighted mean. Objectives move
//! through an approval workflow before their cycle starts and are closed
//! when it ends.
//!
//! ## Key components
//!
//! - [`validate_transition`] — the workflow state machine (Draft →
//!   PendingValidation → Approved/Rejected → Tracking → Closed)
//! - [`score_key_result`], [`score_objective`], [`classify`] — scoring and
//!   on-track / at-risk / off-track bands
//! - [`build_alignment_tree`], [`validate_parent`] — the objective hierarchy
//! - [`OkrStore`] — JSON file-based persistence with compare-and-set
//!   transitions
//! - [`OkrEvent`] / [`EventDispatcher`] — change notifications
//!
//! Everything except the store and the log sink is pure and holds no state,
//! so it can be called concurrently from any number of request handlers.

pub mod alignment;
pub mod cycle;
pub mod error;
pub mod events;
pub mod key_result;
pub mod lifecycle;
pub mod objective;
pub mod scoring;
pub mod store;

pub use alignment::{
    build_alignment_tree, ensure_single_individual_objective, validate_parent, AlignmentNode,
};
pub use cycle::{Cycle, CyclePhase};
pub use error::OkrError;
pub use events::{EventDispatcher, LogSink, NotificationSink, OkrEvent};
pub use key_result::{CheckIn, Confidence, KeyResult, MetricDirection};
pub use lifecycle::{
    allowed_transitions, automatic_transition, validate_transition, Actor, InvalidTransition,
    Role, TransitionContext, TransitionGate, TransitionRejection,
};
pub use objective::{Objective, ObjectiveLevel, ObjectiveStatus};
pub use scoring::{
    classify, score_key_result, score_objective, BandSummary, KeyResultScore, ScoreBand,
    Scorecard,
};
pub use store::{CheckInOutcome, OkrStore, TransitionOutcome};
