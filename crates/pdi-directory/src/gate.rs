// gate.rs — Directory-backed authorization for objective actions.
//
// Admins and the system actor may act on any objective. Everyone else may
// act on objectives they own or that belong to one of their direct reports.
// The workflow guards in `validate_transition` still apply on top.

use pdi_okr::{Actor, Objective, Role, TransitionGate};
use uuid::Uuid;

use crate::directory::Directory;

/// [`TransitionGate`] backed by a [`Directory`].
pub struct DirectoryGate<'a> {
    directory: &'a Directory,
}

impl<'a> DirectoryGate<'a> {
    pub fn new(directory: &'a Directory) -> Self {
        Self { directory }
    }
}

impl TransitionGate for DirectoryGate<'_> {
    fn can_transition(&self, actor: &Actor, objective: &Objective) -> bool {
        let allowed = match actor.role {
            Role::Admin | Role::System => true,
            Role::Head | Role::Collaborator => {
                actor.id == objective.owner_id
                    || self.directory.manager_id_of(objective.owner_id) == Some(actor.id)
            }
        };
        if !allowed {
            tracing::debug!(
                actor_id = %actor.id,
                objective_id = %objective.id,
                "directory gate denied access"
            );
        }
        allowed
    }

    fn owner_manager(&self, objective: &Objective) -> Option<Uuid> {
        self.directory.manager_id_of(objective.owner_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::person::Person;
    use pdi_okr::ObjectiveLevel;

    fn setup() -> (Directory, Person, Person, Person, Person) {
        let admin = Person::new("Ada", Role::Admin);
        let head = Person::new("Hugo", Role::Head).reporting_to(admin.id);
        let owner = Person::new("Olive", Role::Collaborator).reporting_to(head.id);
        let peer = Person::new("Pete", Role::Collaborator).reporting_to(head.id);
        let dir = Directory::new(vec![
            admin.clone(),
            head.clone(),
            owner.clone(),
            peer.clone(),
        ])
        .unwrap();
        (dir, admin, head, owner, peer)
    }

    fn objective_of(owner: &Person) -> Objective {
        Objective::new(
            "Ship onboarding revamp",
            ObjectiveLevel::Individual,
            owner.id,
            Uuid::new_v4(),
        )
    }

    #[test]
    fn owner_manager_and_admin_may_act() {
        let (dir, admin, head, owner, _) = setup();
        let gate = DirectoryGate::new(&dir);
        let objective = objective_of(&owner);

        assert!(gate.can_transition(&owner.actor(), &objective));
        assert!(gate.can_transition(&head.actor(), &objective));
        assert!(gate.can_transition(&admin.actor(), &objective));
        assert!(gate.can_transition(&Actor::system(), &objective));
    }

    #[test]
    fn peers_and_skip_level_heads_may_not() {
        let (dir, _, head, owner, peer) = setup();
        let gate = DirectoryGate::new(&dir);
        let objective = objective_of(&owner);
        assert!(!gate.can_transition(&peer.actor(), &objective));

        // Hugo manages Olive, but a head above Hugo is not her direct manager.
        let skip = Person::new("Sam", Role::Head);
        let mut hugo = head.clone();
        hugo.manager_id = Some(skip.id);
        let dir = Directory::new(vec![skip.clone(), hugo, owner.clone()]).unwrap();
        let gate = DirectoryGate::new(&dir);
        assert!(!gate.can_transition(&skip.actor(), &objective));
    }

    #[test]
    fn owner_manager_comes_from_directory() {
        let (dir, _, head, owner, _) = setup();
        let gate = DirectoryGate::new(&dir);
        assert_eq!(gate.owner_manager(&objective_of(&owner)), Some(head.id));

        let stranger = Person::new("Zed", Role::Collaborator);
        assert_eq!(gate.owner_manager(&objective_of(&stranger)), None);
    }
}
