// directory.rs — The people directory and the org chart built from it.
//
// The directory is loaded once from a JSON array of people and then only
// read. Reporting lines come from each person's `manager_id`; a manager id
// that points outside the directory makes that person a root of the chart.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use pdi_okr::{Actor, CyclePhase, Objective, TransitionContext};
use serde::Serialize;
use uuid::Uuid;

use crate::error::DirectoryError;
use crate::person::Person;

/// Read-only index of people by id.
#[derive(Debug, Clone, Default)]
pub struct Directory {
    people: HashMap<Uuid, Person>,
}

/// One person and everyone reporting to them, recursively.
#[derive(Debug, Clone, Serialize)]
pub struct OrgNode {
    pub person: Person,
    pub reports: Vec<OrgNode>,
}

/// The org chart as a forest.
#[derive(Debug, Clone, Default, Serialize)]
pub struct OrgChart {
    pub roots: Vec<OrgNode>,
    /// People whose management chain loops back on itself and therefore
    /// never reaches a root.
    pub cyclic: Vec<Uuid>,
}

impl Directory {
    pub fn new(people: Vec<Person>) -> Result<Self, DirectoryError> {
        let mut index = HashMap::with_capacity(people.len());
        for person in people {
            let id = person.id;
            if index.insert(id, person).is_some() {
                return Err(DirectoryError::DuplicatePerson(id));
            }
        }
        Ok(Self { people: index })
    }

    /// Load a directory from a JSON array of people.
    pub fn load(path: &Path) -> Result<Self, DirectoryError> {
        let json = fs::read_to_string(path).map_err(|source| DirectoryError::IoError {
            path: path.display().to_string(),
            source,
        })?;
        let people: Vec<Person> = serde_json::from_str(&json)?;
        let directory = Self::new(people)?;
        tracing::debug!(path = %path.display(), people = directory.len(), "loaded directory");
        Ok(directory)
    }

    /// Like [`Directory::load`] but an absent file yields an empty directory.
    pub fn load_or_empty(path: &Path) -> Result<Self, DirectoryError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn len(&self) -> usize {
        self.people.len()
    }

    pub fn is_empty(&self) -> bool {
        self.people.is_empty()
    }

    pub fn get(&self, id: Uuid) -> Option<&Person> {
        self.people.get(&id)
    }

    /// Everyone, sorted by name.
    pub fn people(&self) -> Vec<&Person> {
        let mut all: Vec<&Person> = self.people.values().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        all
    }

    /// The recorded manager id of `person_id`, whether or not that manager
    /// is in the directory.
    pub fn manager_id_of(&self, person_id: Uuid) -> Option<Uuid> {
        self.people.get(&person_id).and_then(|p| p.manager_id)
    }

    pub fn manager_of(&self, person_id: Uuid) -> Option<&Person> {
        self.manager_id_of(person_id)
            .and_then(|manager_id| self.people.get(&manager_id))
    }

    /// People whose direct manager is `manager_id`, sorted by name.
    pub fn direct_reports(&self, manager_id: Uuid) -> Vec<&Person> {
        let mut reports: Vec<&Person> = self
            .people
            .values()
            .filter(|p| p.manager_id == Some(manager_id) && p.id != manager_id)
            .collect();
        reports.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        reports
    }

    /// The actor for `person_id`, carrying their directory role.
    pub fn actor_for(&self, person_id: Uuid) -> Result<Actor, DirectoryError> {
        self.get(person_id)
            .map(Person::actor)
            .ok_or(DirectoryError::PersonNotFound(person_id))
    }

    /// Guard inputs for `objective`, with the owner's manager filled in.
    pub fn transition_context(
        &self,
        objective: &Objective,
        key_result_count: usize,
        cycle_phase: CyclePhase,
    ) -> TransitionContext {
        TransitionContext {
            key_result_count,
            cycle_phase,
            owner_manager_id: self.manager_id_of(objective.owner_id),
        }
    }

    /// Build the org chart from reporting lines.
    ///
    /// Roots are people with no manager or whose manager is not in the
    /// directory. Anyone not reachable from a root sits on a reporting loop
    /// and is listed in [`OrgChart::cyclic`] instead.
    pub fn org_chart(&self) -> OrgChart {
        let roots: Vec<&Person> = self
            .people()
            .into_iter()
            .filter(|p| match p.manager_id {
                None => true,
                Some(m) => !self.people.contains_key(&m),
            })
            .collect();

        let mut placed: HashSet<Uuid> = HashSet::new();
        let nodes: Vec<OrgNode> = roots
            .into_iter()
            .map(|root| self.org_node(root, &mut placed))
            .collect();

        let mut cyclic: Vec<Uuid> = self
            .people()
            .into_iter()
            .filter(|p| !placed.contains(&p.id))
            .map(|p| p.id)
            .collect();
        cyclic.sort();
        if !cyclic.is_empty() {
            tracing::warn!(count = cyclic.len(), "reporting lines contain a loop");
        }

        OrgChart {
            roots: nodes,
            cyclic,
        }
    }

    fn org_node(&self, person: &Person, placed: &mut HashSet<Uuid>) -> OrgNode {
        placed.insert(person.id);
        let pending: Vec<&Person> = self
            .direct_reports(person.id)
            .into_iter()
            .filter(|r| !placed.contains(&r.id))
            .collect();
        let reports = pending
            .into_iter()
            .map(|r| self.org_node(r, placed))
            .collect();
        OrgNode {
            person: person.clone(),
            reports,
        }
    }
}

impl OrgNode {
    /// This person plus everyone below them.
    pub fn headcount(&self) -> usize {
        1 + self.reports.iter().map(OrgNode::headcount).sum::<usize>()
    }
}
