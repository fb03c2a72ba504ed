// error.rs — Error types for the people directory.

use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur while loading or querying the directory.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// Two entries share the same id.
    #[error("person {0} appears more than once in the directory")]
    DuplicatePerson(Uuid),

    #[error("person not found: {0}")]
    PersonNotFound(Uuid),

    #[error("I/O error at {path}: {source}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}
