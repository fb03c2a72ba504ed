pub mod habit;
pub mod okr;
pub mod people;
