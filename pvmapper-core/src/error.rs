//! Error types for pvmapper-core.

use thiserror::Error;

/// Result type alias for pvmapper operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types shared by every pvmapper crate.
#[derive(Error, Debug)]
pub enum Error {
    /// A referenced file, directory, source or composite key is absent.
    #[error("not found: {0}")]
    NotFound(String),

    /// An analysis name collides with an existing source.
    #[error("a source named \"{0}\" already exists")]
    NameConflict(String),

    /// An analysis job is already running.
    #[error("an analysis job is already running")]
    Busy,

    /// A patch or column index is no longer valid for the current data.
    #[error("index {index} out of range (length {len})")]
    OutOfRange { index: usize, len: usize },

    /// Unexpected geometry, column or file shape.
    #[error("malformed data: {0}")]
    MalformedData(String),

    /// Analysis name that cannot be used as a directory name.
    #[error("invalid analysis name: {0:?}")]
    InvalidName(String),

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing or serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns true for the `NotFound` variant.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}
