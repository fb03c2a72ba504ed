// events.rs — Change notifications for the OKR subsystem.
//
// The presentation layer refreshes dashboards when objectives move through
// the workflow or key results get new check-ins. Callers dispatch an
// `OkrEvent` after a successful write; notification sinks (JSONL log,
// realtime feed, email digests) receive it. The engine itself never emits.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::OkrError;
use crate::key_result::CheckIn;
use crate::objective::{Objective, ObjectiveStatus};
use crate::scoring::{classify, ScoreBand};

/// Events emitted after OKR writes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum OkrEvent {
    /// A new objective was saved.
    ObjectiveCreated {
        objective_id: Uuid,
        title: String,
        owner_id: Uuid,
        timestamp: DateTime<Utc>,
    },

    /// An objective moved to a new status.
    ObjectiveStatusChanged {
        objective_id: Uuid,
        from_status: ObjectiveStatus,
        to_status: ObjectiveStatus,
        actor_id: Uuid,
        timestamp: DateTime<Utc>,
    },

    /// A key result received a check-in.
    CheckInRecorded {
        objective_id: Uuid,
        key_result_id: Uuid,
        check_in_id: Uuid,
        value: f64,
        timestamp: DateTime<Utc>,
    },

    /// An objective's cached score was recomputed.
    ScoreRefreshed {
        objective_id: Uuid,
        score: Option<f64>,
        band: Option<ScoreBand>,
        timestamp: DateTime<Utc>,
    },
}

impl OkrEvent {
    pub fn event_type(&self) -> &str {
        match self {
            OkrEvent::ObjectiveCreated { .. } => "objective_created",
            OkrEvent::ObjectiveStatusChanged { .. } => "objective_status_changed",
            OkrEvent::CheckInRecorded { .. } => "check_in_recorded",
            OkrEvent::ScoreRefreshed { .. } => "score_refreshed",
        }
    }

    pub fn objective_id(&self) -> Uuid {
        match self {
            OkrEvent::ObjectiveCreated { objective_id, .. }
            | OkrEvent::ObjectiveStatusChanged { objective_id, .. }
            | OkrEvent::CheckInRecorded { objective_id, .. }
            | OkrEvent::ScoreRefreshed { objective_id, .. } => *objective_id,
        }
    }

    pub fn objective_created(objective: &Objective) -> Self {
        OkrEvent::ObjectiveCreated {
            objective_id: objective.id,
            title: objective.title.clone(),
            owner_id: objective.owner_id,
            timestamp: Utc::now(),
        }
    }

    pub fn status_changed(
        objective_id: Uuid,
        from: ObjectiveStatus,
        to: ObjectiveStatus,
        actor_id: Uuid,
    ) -> Self {
        OkrEvent::ObjectiveStatusChanged {
            objective_id,
            from_status: from,
            to_status: to,
            actor_id,
            timestamp: Utc::now(),
        }
    }

    pub fn check_in_recorded(objective_id: Uuid, check_in: &CheckIn) -> Self {
        OkrEvent::CheckInRecorded {
            objective_id,
            key_result_id: check_in.key_result_id,
            check_in_id: check_in.id,
            value: check_in.value,
            timestamp: check_in.created_at,
        }
    }

    pub fn score_refreshed(objective: &Objective) -> Self {
        OkrEvent::ScoreRefreshed {
            objective_id: objective.id,
            score: objective.current_score,
            band: objective.current_score.map(classify),
            timestamp: Utc::now(),
        }
    }
}

/// Trait for receiving OKR events.
///
/// Implementations decide what to do with each event: append to a log,
/// push to a realtime channel, queue a digest email, etc.
pub trait NotificationSink: Send + Sync {
    /// Handle an event. Errors are logged but don't stop the system.
    fn send(&self, event: &OkrEvent) -> Result<(), OkrError>;
}

/// Appends events as JSONL to a file.
pub struct LogSink {
    path: PathBuf,
}

impl LogSink {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl NotificationSink for LogSink {
    fn send(&self, event: &OkrEvent) -> Result<(), OkrError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| OkrError::IoError {
                path: parent.display().to_string(),
                source,
            })?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| OkrError::IoError {
                path: self.path.display().to_string(),
                source,
            })?;

        let json = serde_json::to_string(event)?;
        writeln!(file, "{}", json).map_err(|source| OkrError::IoError {
            path: self.path.display().to_string(),
            source,
        })?;

        Ok(())
    }
}

/// Dispatches events to multiple sinks.
///
/// A failing sink is logged and skipped; the others still receive the event.
#[derive(Default)]
pub struct EventDispatcher {
    sinks: Vec<Box<dyn NotificationSink>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    pub fn add_sink(&mut self, sink: Box<dyn NotificationSink>) {
        self.sinks.push(sink);
    }

    pub fn dispatch(&self, event: &OkrEvent) {
        for sink in &self.sinks {
            if let Err(e) = sink.send(event) {
                tracing::warn!(event_type = event.event_type(), "notification sink error: {}", e);
            }
        }
    }
}
