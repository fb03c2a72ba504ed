// store.rs — OkrStore: file-backed persistence for objectives, key results,
// check-ins, and cycles.
//
// Layout under the store root:
//   objectives/<objective_id>.json
//   key_results/<key_result_id>.json
//   check_ins/<key_result_id>.jsonl   (append-only, one check-in per line)
//   cycles/<cycle_id>.json
//   .lock                              (held by the current writer)
//
// In production the hosted backend plays this role; this store keeps the
// same contract so the engines can be driven end to end from the CLI. The
// write paths that matter for correctness are `apply_transition`, which
// refuses to write when the persisted status moved since the caller read
// it, and `record_check_in`, which keeps `current_value` equal to the latest
// check-in.
//
// Every write path takes the store lock for its whole read-check-write
// sequence, so two CLI processes racing on the same objective serialize and
// the loser sees `StaleStatus`. Records are written to a temp file in the
// same directory and renamed into place; readers never see a partial file.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tempfile::NamedTempFile;
use uuid::Uuid;

use crate::alignment::{ensure_single_individual_objective, validate_parent};
use crate::cycle::Cycle;
use crate::error::OkrError;
use crate::key_result::{CheckIn, Confidence, KeyResult};
use crate::lifecycle::{
    automatic_transition, validate_transition, Actor, TransitionContext, TransitionGate,
};
use crate::objective::{Objective, ObjectiveStatus};

/// Result of a persisted status change.
#[derive(Debug, Clone)]
pub struct TransitionOutcome {
    pub objective: Objective,
    pub from: ObjectiveStatus,
}

/// Result of a persisted check-in.
#[derive(Debug, Clone)]
pub struct CheckInOutcome {
    pub check_in: CheckIn,
    pub key_result: KeyResult,
    /// The owning objective with its refreshed score cache.
    pub objective: Objective,
}

const LOCK_TIMEOUT: Duration = Duration::from_secs(10);
const LOCK_RETRY: Duration = Duration::from_millis(5);

/// Exclusive writer lock on a store, released on drop.
///
/// The lock is a file created with `create_new`, which fails for every
/// caller but one whether they are threads or separate processes.
struct StoreLock {
    path: PathBuf,
}

impl StoreLock {
    fn acquire(path: PathBuf) -> Result<Self, OkrError> {
        let deadline = Instant::now() + LOCK_TIMEOUT;
        loop {
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    // Owner pid, for whoever finds a lock left behind by a crash.
                    let _ = write!(file, "{}", std::process::id());
                    return Ok(Self { path });
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    if Instant::now() >= deadline {
                        return Err(OkrError::StoreLocked {
                            path: path.display().to_string(),
                        });
                    }
                    thread::sleep(LOCK_RETRY);
                }
                Err(source) => {
                    return Err(OkrError::IoError {
                        path: path.display().to_string(),
                        source,
                    })
                }
            }
        }
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            tracing::warn!(path = %self.path.display(), "failed to release store lock: {}", e);
        }
    }
}

/// Persistent store for OKR records.
pub struct OkrStore {
    root: PathBuf,
}

impl OkrStore {
    /// Open a store at `root`, creating the directory layout if needed.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, OkrError> {
        let root = root.as_ref().to_path_buf();
        for sub in ["objectives", "key_results", "check_ins", "cycles"] {
            let dir = root.join(sub);
            fs::create_dir_all(&dir).map_err(|source| OkrError::IoError {
                path: dir.display().to_string(),
                source,
            })?;
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    // ── Objectives ──────────────────────────────────────────────

    /// Save a new objective after checking its parent link and the
    /// one-individual-objective-per-cycle rule.
    ///
    /// A corrupt objective record fails the call instead of being skipped,
    /// since it could hide the parent or the duplicate being checked for.
    pub fn create_objective(&self, objective: &Objective) -> Result<(), OkrError> {
        let _lock = self.lock()?;
        let existing: Vec<Objective> = list_json_strict(&self.root.join("objectives"))?;
        validate_parent(objective, |id| existing.iter().find(|o| o.id == id))?;
        ensure_single_individual_objective(objective, &existing)?;
        write_json(&self.objective_file(objective.id), objective)?;
        tracing::info!(
            objective_id = %objective.id,
            level = %objective.level,
            "objective created"
        );
        Ok(())
    }

    /// Save an objective (creates or overwrites) without hierarchy checks.
    pub fn save_objective(&self, objective: &Objective) -> Result<(), OkrError> {
        let _lock = self.lock()?;
        write_json(&self.objective_file(objective.id), objective)
    }

    pub fn get_objective(&self, objective_id: Uuid) -> Result<Option<Objective>, OkrError> {
        read_json(&self.objective_file(objective_id))
    }

    /// List all objectives, newest first.
    pub fn list_objectives(&self) -> Result<Vec<Objective>, OkrError> {
        let mut objectives: Vec<Objective> = list_json(&self.root.join("objectives"))?;
        objectives.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(objectives)
    }

    pub fn list_objectives_by_status(
        &self,
        status: ObjectiveStatus,
    ) -> Result<Vec<Objective>, OkrError> {
        Ok(self
            .list_objectives()?
            .into_iter()
            .filter(|o| o.status == status)
            .collect())
    }

    // ── Key results ─────────────────────────────────────────────

    /// Save a key result. Its objective must already exist.
    ///
    /// New key results are accepted only while the objective is draft or
    /// rejected, and nothing under a closed objective changes. The stored
    /// `current_value` always comes from the check-in history when there is
    /// one, whatever the caller passed in.
    pub fn save_key_result(&self, key_result: &KeyResult) -> Result<(), OkrError> {
        let _lock = self.lock()?;
        let objective = self
            .get_objective(key_result.objective_id)?
            .ok_or(OkrError::ObjectiveNotFound(key_result.objective_id))?;
        let is_new_here = self
            .get_key_result(key_result.id)?
            .map_or(true, |stored| stored.objective_id != key_result.objective_id);
        let frozen = if is_new_here {
            !objective.status.accepts_new_key_results()
        } else {
            objective.status == ObjectiveStatus::Closed
        };
        if frozen {
            return Err(OkrError::KeyResultsFrozen {
                objective_id: objective.id,
                status: objective.status,
            });
        }

        let mut key_result = key_result.clone();
        let history = self.list_check_ins(key_result.id)?;
        if !history.is_empty() {
            key_result.reconcile(&history)?;
        }
        write_json(&self.key_result_file(key_result.id), &key_result)
    }

    pub fn get_key_result(&self, key_result_id: Uuid) -> Result<Option<KeyResult>, OkrError> {
        read_json(&self.key_result_file(key_result_id))
    }

    /// Key results of one objective, ordered by title.
    pub fn list_key_results(&self, objective_id: Uuid) -> Result<Vec<KeyResult>, OkrError> {
        let mut key_results: Vec<KeyResult> = list_json(&self.root.join("key_results"))?;
        key_results.retain(|kr| kr.objective_id == objective_id);
        key_results.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(key_results)
    }

    /// Every key result in the store.
    pub fn list_all_key_results(&self) -> Result<Vec<KeyResult>, OkrError> {
        list_json(&self.root.join("key_results"))
    }

    // ── Check-ins ───────────────────────────────────────────────

    /// Check-in history of a key result, in the order it was recorded.
    pub fn list_check_ins(&self, key_result_id: Uuid) -> Result<Vec<CheckIn>, OkrError> {
        let path = self.check_in_file(key_result_id);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&path).map_err(|source| OkrError::IoError {
            path: path.display().to_string(),
            source,
        })?;
        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).map_err(OkrError::from))
            .collect()
    }

    /// Record a check-in against a key result.
    ///
    /// The objective must be approved or tracking and the gate must let the
    /// actor act on it. The key result is first reconciled with its stored
    /// history, then the new check-in is appended, and finally the key
    /// result and the objective's score cache are rewritten.
    pub fn record_check_in(
        &self,
        key_result_id: Uuid,
        actor: &Actor,
        value: f64,
        confidence: Option<Confidence>,
        note: Option<String>,
        gate: &dyn TransitionGate,
    ) -> Result<CheckInOutcome, OkrError> {
        let _lock = self.lock()?;
        let mut key_result = self
            .get_key_result(key_result_id)?
            .ok_or(OkrError::KeyResultNotFound(key_result_id))?;
        let mut objective = self
            .get_objective(key_result.objective_id)?
            .ok_or(OkrError::ObjectiveNotFound(key_result.objective_id))?;

        if !objective.status.accepts_check_ins() {
            return Err(OkrError::CheckInRejected {
                objective_id: objective.id,
                status: objective.status,
            });
        }
        if !gate.can_transition(actor, &objective) {
            return Err(OkrError::NotAuthorized {
                actor_id: actor.id,
                objective_id: objective.id,
            });
        }

        let history = self.list_check_ins(key_result_id)?;
        if !history.is_empty() {
            key_result.reconcile(&history)?;
        }
        let check_in = key_result.check_in(actor.id, value, confidence, note)?;
        self.append_check_in(&check_in)?;
        write_json(&self.key_result_file(key_result.id), &key_result)?;

        let siblings = self.key_results_checked(objective.id)?;
        objective.refresh_score(&siblings);
        write_json(&self.objective_file(objective.id), &objective)?;

        tracing::info!(
            key_result_id = %key_result_id,
            value,
            score = ?objective.current_score,
            "check-in recorded"
        );
        Ok(CheckInOutcome {
            check_in,
            key_result,
            objective,
        })
    }

    fn append_check_in(&self, check_in: &CheckIn) -> Result<(), OkrError> {
        let path = self.check_in_file(check_in.key_result_id);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| OkrError::IoError {
                path: path.display().to_string(),
                source,
            })?;
        let json = serde_json::to_string(check_in)?;
        writeln!(file, "{}", json).map_err(|source| OkrError::IoError {
            path: path.display().to_string(),
            source,
        })
    }

    // ── Cycles ──────────────────────────────────────────────────

    pub fn save_cycle(&self, cycle: &Cycle) -> Result<(), OkrError> {
        let _lock = self.lock()?;
        write_json(&self.cycle_file(cycle.id), cycle)
    }

    pub fn get_cycle(&self, cycle_id: Uuid) -> Result<Option<Cycle>, OkrError> {
        read_json(&self.cycle_file(cycle_id))
    }

    /// All cycles, earliest start first.
    pub fn list_cycles(&self) -> Result<Vec<Cycle>, OkrError> {
        let mut cycles: Vec<Cycle> = list_json(&self.root.join("cycles"))?;
        cycles.sort_by_key(|c| c.starts_on);
        Ok(cycles)
    }

    // ── Workflow ────────────────────────────────────────────────

    /// Gather the guard inputs for `objective` as of `today`.
    pub fn transition_context(
        &self,
        objective: &Objective,
        gate: &dyn TransitionGate,
        today: NaiveDate,
    ) -> Result<TransitionContext, OkrError> {
        let cycle = self
            .get_cycle(objective.cycle_id)?
            .ok_or(OkrError::CycleNotFound(objective.cycle_id))?;
        Ok(TransitionContext {
            key_result_count: self.key_results_checked(objective.id)?.len(),
            cycle_phase: cycle.phase_on(today),
            owner_manager_id: gate.owner_manager(objective),
        })
    }

    /// Validate and persist a status change requested by `actor`.
    ///
    /// `expected` is the status the caller saw when it offered the action.
    /// If the persisted status differs, nothing is written and
    /// [`OkrError::StaleStatus`] is returned.
    pub fn apply_transition(
        &self,
        objective_id: Uuid,
        expected: ObjectiveStatus,
        requested: ObjectiveStatus,
        actor: &Actor,
        gate: &dyn TransitionGate,
        today: NaiveDate,
    ) -> Result<TransitionOutcome, OkrError> {
        let _lock = self.lock()?;
        let mut objective = self
            .get_objective(objective_id)?
            .ok_or(OkrError::ObjectiveNotFound(objective_id))?;
        if objective.status != expected {
            return Err(OkrError::StaleStatus {
                objective_id,
                expected,
                actual: objective.status,
            });
        }
        if !gate.can_transition(actor, &objective) {
            return Err(OkrError::NotAuthorized {
                actor_id: actor.id,
                objective_id,
            });
        }

        let context = self.transition_context(&objective, gate, today)?;
        let from = objective.transition(requested, actor, &context).map_err(|e| {
            tracing::warn!(objective_id = %objective_id, "transition refused: {}", e.reason);
            e
        })?;
        write_json(&self.objective_file(objective_id), &objective)?;

        tracing::info!(
            objective_id = %objective_id,
            from = %from,
            to = %objective.status,
            actor_id = %actor.id,
            "objective transitioned"
        );
        Ok(TransitionOutcome { objective, from })
    }

    /// Apply every automatic transition due on `today`.
    ///
    /// An approved objective whose cycle already ended moves through
    /// tracking to closed in one pass. Objectives whose cycle is missing are
    /// skipped with a warning.
    pub fn advance(&self, today: NaiveDate) -> Result<Vec<TransitionOutcome>, OkrError> {
        let _lock = self.lock()?;
        let system = Actor::system();
        let mut outcomes = Vec::new();

        for mut objective in self.list_objectives()? {
            let Some(cycle) = self.get_cycle(objective.cycle_id)? else {
                tracing::warn!(
                    objective_id = %objective.id,
                    cycle_id = %objective.cycle_id,
                    "skipping objective with unknown cycle"
                );
                continue;
            };
            let phase = cycle.phase_on(today);
            let context = TransitionContext {
                key_result_count: self.key_results_checked(objective.id)?.len(),
                cycle_phase: phase,
                owner_manager_id: None,
            };

            let mut changed = false;
            while let Some(next) = automatic_transition(&objective, phase) {
                let from = objective.status;
                objective.status = validate_transition(&objective, next, &system, &context)?;
                outcomes.push(TransitionOutcome {
                    objective: objective.clone(),
                    from,
                });
                changed = true;
            }
            if changed {
                objective.updated_at = chrono::Utc::now();
                write_json(&self.objective_file(objective.id), &objective)?;
                tracing::info!(
                    objective_id = %objective.id,
                    status = %objective.status,
                    "objective advanced"
                );
            }
        }
        Ok(outcomes)
    }

    /// Recompute and persist an objective's score cache.
    pub fn refresh_score(&self, objective_id: Uuid) -> Result<Objective, OkrError> {
        let _lock = self.lock()?;
        let mut objective = self
            .get_objective(objective_id)?
            .ok_or(OkrError::ObjectiveNotFound(objective_id))?;
        let key_results = self.key_results_checked(objective_id)?;
        objective.refresh_score(&key_results);
        write_json(&self.objective_file(objective_id), &objective)?;
        Ok(objective)
    }

    fn lock(&self) -> Result<StoreLock, OkrError> {
        StoreLock::acquire(self.root.join(".lock"))
    }

    /// Key results feeding a score or a guard; a corrupt one is an error.
    fn key_results_checked(&self, objective_id: Uuid) -> Result<Vec<KeyResult>, OkrError> {
        let mut key_results: Vec<KeyResult> = list_json_strict(&self.root.join("key_results"))?;
        key_results.retain(|kr| kr.objective_id == objective_id);
        Ok(key_results)
    }

    fn objective_file(&self, id: Uuid) -> PathBuf {
        self.root.join("objectives").join(format!("{}.json", id))
    }

    fn key_result_file(&self, id: Uuid) -> PathBuf {
        self.root.join("key_results").join(format!("{}.json", id))
    }

    fn check_in_file(&self, key_result_id: Uuid) -> PathBuf {
        self.root
            .join("check_ins")
            .join(format!("{}.jsonl", key_result_id))
    }

    fn cycle_file(&self, id: Uuid) -> PathBuf {
        self.root.join("cycles").join(format!("{}.json", id))
    }
}

/// Write `value` to a temp file beside `path`, then rename it into place.
fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), OkrError> {
    let json = serde_json::to_string_pretty(value)?;
    let io_err = |source| OkrError::IoError {
        path: path.display().to_string(),
        source,
    };
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
    tmp.write_all(json.as_bytes()).map_err(io_err)?;
    tmp.persist(path).map_err(|e| io_err(e.error))?;
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, OkrError> {
    if !path.exists() {
        return Ok(None);
    }
    let json = fs::read_to_string(path).map_err(|source| OkrError::IoError {
        path: path.display().to_string(),
        source,
    })?;
    Ok(Some(serde_json::from_str(&json)?))
}

/// Read every `.json` file in `dir`. Unreadable records are skipped with a warning.
fn list_json<T: DeserializeOwned>(dir: &Path) -> Result<Vec<T>, OkrError> {
    collect_json(dir, false)
}

/// Like [`list_json`], but the first unreadable record fails the listing.
fn list_json_strict<T: DeserializeOwned>(dir: &Path) -> Result<Vec<T>, OkrError> {
    collect_json(dir, true)
}

fn collect_json<T: DeserializeOwned>(dir: &Path, strict: bool) -> Result<Vec<T>, OkrError> {
    let entries = fs::read_dir(dir).map_err(|source| OkrError::IoError {
        path: dir.display().to_string(),
        source,
    })?;

    let mut records = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| OkrError::IoError {
            path: dir.display().to_string(),
            source,
        })?;
        let path = entry.path();
        if !path.extension().is_some_and(|ext| ext == "json") {
            continue;
        }
        let json = fs::read_to_string(&path).map_err(|source| OkrError::IoError {
            path: path.display().to_string(),
            source,
        })?;
        match serde_json::from_str::<T>(&json) {
            Ok(record) => records.push(record),
            Err(source) if strict => {
                return Err(OkrError::CorruptRecord {
                    path: path.display().to_string(),
                    source,
                })
            }
            Err(e) => tracing::warn!(path = %path.display(), "skipping unreadable record: {}", e),
        }
    }
    Ok(records)
}
