// alignment.rs — Objective hierarchy rules and the alignment tree.
//
// Objectives cascade: company objectives are refined by area objectives,
// which are refined by head objectives, and so on down to individuals.
// This module guards the parent links and builds the tree the alignment
// view renders.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::OkrError;
use crate::key_result::KeyResult;
use crate::objective::{Objective, ObjectiveLevel};
use crate::scoring::score_objective;

/// Check that `child`'s parent link is acceptable.
///
/// - company objectives have no parent;
/// - the parent must sit strictly above the child;
/// - following parent links from the child never revisits an objective.
///
/// `lookup` resolves an objective id against the caller's data.
pub fn validate_parent<'a, F>(child: &Objective, lookup: F) -> Result<(), OkrError>
where
    F: Fn(Uuid) -> Option<&'a Objective>,
{
    let Some(parent_id) = child.parent_objective_id else {
        return Ok(());
    };
    if child.level == ObjectiveLevel::Company {
        return Err(OkrError::CompanyObjectiveWithParent(child.id));
    }

    let parent = lookup(parent_id).ok_or(OkrError::ObjectiveNotFound(parent_id))?;
    if !parent.level.can_parent(child.level) {
        return Err(OkrError::ParentLevelMismatch {
            child_level: child.level,
            parent_level: parent.level,
        });
    }

    let mut visited = HashSet::from([child.id]);
    let mut current = parent;
    loop {
        if !visited.insert(current.id) {
            return Err(OkrError::ParentCycle(child.id));
        }
        let Some(next_id) = current.parent_objective_id else {
            return Ok(());
        };
        current = lookup(next_id).ok_or(OkrError::ObjectiveNotFound(next_id))?;
    }
}

/// Enforce one active individual objective per (owner, cycle).
///
/// `existing` may include `candidate` itself (e.g., when re-saving it).
pub fn ensure_single_individual_objective(
    candidate: &Objective,
    existing: &[Objective],
) -> Result<(), OkrError> {
    if candidate.level != ObjectiveLevel::Individual || !candidate.status.is_active() {
        return Ok(());
    }
    let clash = existing.iter().find(|other| {
        other.id != candidate.id
            && other.level == ObjectiveLevel::Individual
            && other.owner_id == candidate.owner_id
            && other.cycle_id == candidate.cycle_id
            && other.status.is_active()
    });
    match clash {
        Some(other) => Err(OkrError::DuplicateIndividualObjective {
            owner_id: candidate.owner_id,
            cycle_id: candidate.cycle_id,
            existing: other.id,
        }),
        None => Ok(()),
    }
}

/// One objective in the alignment tree, with its key results and children.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlignmentNode {
    pub objective: Objective,
    pub key_results: Vec<KeyResult>,
    pub score: Option<f64>,
    pub children: Vec<AlignmentNode>,
}

impl AlignmentNode {
    /// Number of objectives in this subtree, including this one.
    pub fn subtree_size(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(AlignmentNode::subtree_size)
            .sum::<usize>()
    }
}

/// Build the alignment forest.
///
/// Roots are objectives with no parent or whose parent is not in
/// `objectives`. Siblings are ordered by title. Each objective appears
/// exactly once; objectives caught in a parent loop surface as extra roots.
pub fn build_alignment_tree(
    objectives: &[Objective],
    key_results: &[KeyResult],
) -> Vec<AlignmentNode> {
    let known: HashSet<Uuid> = objectives.iter().map(|o| o.id).collect();
    let mut children: HashMap<Uuid, Vec<&Objective>> = HashMap::new();
    let mut roots: Vec<&Objective> = Vec::new();
    for objective in objectives {
        match objective.parent_objective_id {
            Some(parent) if known.contains(&parent) && parent != objective.id => {
                children.entry(parent).or_default().push(objective)
            }
            _ => roots.push(objective),
        }
    }
    for siblings in children.values_mut() {
        siblings.sort_by(|a, b| a.title.cmp(&b.title));
    }
    roots.sort_by(|a, b| a.title.cmp(&b.title));

    let mut placed: HashSet<Uuid> = HashSet::new();
    let mut forest: Vec<AlignmentNode> = roots
        .into_iter()
        .filter_map(|root| build_node(root, &children, key_results, &mut placed))
        .collect();

    // Anything left over sits on a parent loop.
    let mut stranded: Vec<&Objective> = objectives
        .iter()
        .filter(|o| !placed.contains(&o.id))
        .collect();
    stranded.sort_by(|a, b| a.title.cmp(&b.title));
    for objective in stranded {
        if let Some(node) = build_node(objective, &children, key_results, &mut placed) {
            tracing::warn!(objective_id = %objective.id, "objective sits on a parent loop");
            forest.push(node);
        }
    }
    forest
}

fn build_node(
    objective: &Objective,
    children: &HashMap<Uuid, Vec<&Objective>>,
    key_results: &[KeyResult],
    placed: &mut HashSet<Uuid>,
) -> Option<AlignmentNode> {
    if !placed.insert(objective.id) {
        return None;
    }
    let own: Vec<KeyResult> = key_results
        .iter()
        .filter(|kr| kr.objective_id == objective.id)
        .cloned()
        .collect();
    let kids = children
        .get(&objective.id)
        .map(|list| {
            list.iter()
                .filter_map(|child| build_node(child, children, key_results, placed))
                .collect()
        })
        .unwrap_or_default();
    Some(AlignmentNode {
        objective: objective.clone(),
        score: score_objective(objective, &own),
        key_results: own,
        children: kids,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objective::ObjectiveStatus;

    fn objective(title: &str, level: ObjectiveLevel, parent: Option<&Objective>) -> Objective {
        let mut o = Objective::new(title, level, Uuid::new_v4(), Uuid::new_v4());
        o.parent_objective_id = parent.map(|p| p.id);
        o
    }

    fn index(objectives: &[Objective]) -> HashMap<Uuid, Objective> {
        objectives.iter().map(|o| (o.id, o.clone())).collect()
    }

    #[test]
    fn valid_chain_passes() {
        let company = objective("Company", ObjectiveLevel::Company, None);
        let area = objective("Sales", ObjectiveLevel::Area, Some(&company));
        let person = objective("Close deals", ObjectiveLevel::Individual, Some(&area));
        let all = index(&[company, area, person.clone()]);
        validate_parent(&person, |id| all.get(&id)).unwrap();
    }

    #[test]
    fn company_objective_cannot_have_parent() {
        let company = objective("Company", ObjectiveLevel::Company, None);
        let other = objective("Other", ObjectiveLevel::Company, Some(&company));
        let all = index(&[company]);
        assert!(matches!(
            validate_parent(&other, |id| all.get(&id)),
            Err(OkrError::CompanyObjectiveWithParent(_))
        ));
    }

    #[test]
    fn parent_must_sit_higher() {
        let individual = objective("Mine", ObjectiveLevel::Individual, None);
        let head = objective("Team", ObjectiveLevel::Head, Some(&individual));
        let all = index(&[individual]);
        assert!(matches!(
            validate_parent(&head, |id| all.get(&id)),
            Err(OkrError::ParentLevelMismatch { .. })
        ));
    }

    #[test]
    fn missing_parent_is_reported() {
        let company = objective("Company", ObjectiveLevel::Company, None);
        let area = objective("Sales", ObjectiveLevel::Area, Some(&company));
        let all: HashMap<Uuid, Objective> = HashMap::new();
        assert!(matches!(
            validate_parent(&area, |id| all.get(&id)),
            Err(OkrError::ObjectiveNotFound(id)) if id == company.id
        ));
    }

    #[test]
    fn parent_loop_is_detected() {
        // Corrupt data: H → A → I → H.
        let mut a = objective("A", ObjectiveLevel::Area, None);
        let h = objective("H", ObjectiveLevel::Head, Some(&a));
        let i = objective("I", ObjectiveLevel::Individual, Some(&h));
        a.parent_objective_id = Some(i.id);
        let mut all = index(&[a.clone(), h.clone(), i]);
        if let Some(stored) = all.get_mut(&a.id) {
            stored.level = ObjectiveLevel::Company;
        }
        let result = validate_parent(&h, |id| all.get(&id));
        assert!(matches!(result, Err(OkrError::ParentCycle(id)) if id == h.id));
    }

    #[test]
    fn second_active_individual_objective_is_refused() {
        let owner = Uuid::new_v4();
        let cycle = Uuid::new_v4();
        let first = Objective::new("First", ObjectiveLevel::Individual, owner, cycle);
        let second = Objective::new("Second", ObjectiveLevel::Individual, owner, cycle);

        assert!(ensure_single_individual_objective(&first, &[first.clone()]).is_ok());
        assert!(matches!(
            ensure_single_individual_objective(&second, &[first.clone()]),
            Err(OkrError::DuplicateIndividualObjective { existing, .. }) if existing == first.id
        ));
    }

    #[test]
    fn closed_or_other_cycle_objectives_do_not_clash() {
        let owner = Uuid::new_v4();
        let cycle = Uuid::new_v4();
        let mut closed = Objective::new("Last", ObjectiveLevel::Individual, owner, cycle);
        closed.status = ObjectiveStatus::Closed;
        let next_quarter = Objective::new("Next", ObjectiveLevel::Individual, owner, Uuid::new_v4());
        let area = Objective::new("Area", ObjectiveLevel::Area, owner, cycle);
        let candidate = Objective::new("Now", ObjectiveLevel::Individual, owner, cycle);

        ensure_single_individual_objective(&candidate, &[closed, next_quarter, area]).unwrap();
    }

    #[test]
    fn tree_nests_children_under_parents_sorted_by_title() {
        let company = objective("Company", ObjectiveLevel::Company, None);
        let sales = objective("Sales", ObjectiveLevel::Area, Some(&company));
        let ops = objective("Ops", ObjectiveLevel::Area, Some(&company));
        let rep = objective("Close deals", ObjectiveLevel::Individual, Some(&sales));
        let mut kr = KeyResult::new(rep.id, "Deals closed", 0.0, 10.0);
        kr.current_value = 8.0;

        let forest = build_alignment_tree(
            &[rep.clone(), sales.clone(), company.clone(), ops.clone()],
            &[kr],
        );
        assert_eq!(forest.len(), 1);
        let root = &forest[0];
        assert_eq!(root.objective.id, company.id);
        assert_eq!(root.subtree_size(), 4);
        assert_eq!(root.score, None);
        let titles: Vec<&str> = root.children.iter().map(|c| c.objective.title.as_str()).collect();
        assert_eq!(titles, ["Ops", "Sales"]);
        let leaf = &root.children[1].children[0];
        assert_eq!(leaf.objective.id, rep.id);
        assert_eq!(leaf.score, Some(8.0));
    }

    #[test]
    fn orphans_and_loops_become_roots() {
        let missing_parent = objective("Gone", ObjectiveLevel::Company, None);
        let orphan = objective("Orphan", ObjectiveLevel::Area, Some(&missing_parent));
        let mut a = objective("Loop A", ObjectiveLevel::Head, None);
        let b = objective("Loop B", ObjectiveLevel::Individual, Some(&a));
        a.parent_objective_id = Some(b.id);

        let forest = build_alignment_tree(&[orphan.clone(), a.clone(), b.clone()], &[]);
        let total: usize = forest.iter().map(AlignmentNode::subtree_size).sum();
        assert_eq!(total, 3);
        assert!(forest.iter().any(|n| n.objective.id == orphan.id));
    }
}
