// person.rs — A directory entry.

use pdi_okr::{Actor, Role};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Someone in the organization who can own objectives or review them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Person {
    pub id: Uuid,
    pub name: String,
    pub role: Role,
    /// Direct manager. `None` for the top of the chart.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manager_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area: Option<String>,
}

impl Person {
    pub fn new(name: impl Into<String>, role: Role) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            role,
            manager_id: None,
            area: None,
        }
    }

    pub fn reporting_to(mut self, manager_id: Uuid) -> Self {
        self.manager_id = Some(manager_id);
        self
    }

    pub fn in_area(mut self, area: impl Into<String>) -> Self {
        self.area = Some(area.into());
        self
    }

    pub fn actor(&self) -> Actor {
        Actor::new(self.id, self.role)
    }
}
