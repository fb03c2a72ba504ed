//! # pdi-directory
//!
//! The people directory for PDI Tracker: who reports to whom, the org chart
//! built from those reporting lines, and [`DirectoryGate`], the
//! [`pdi_okr::TransitionGate`] that decides who may act on an objective.

pub mod directory;
pub mod error;
pub mod gate;
pub mod person;

pub use directory::{Directory, OrgChart, OrgNode};
pub use error::DirectoryError;
pub use gate::DirectoryGate;
pub use person::Person;
