//! I/O error types.

use std::path::Path;

use thiserror::Error;

/// Result type for I/O operations.
pub type Result<T> = std::result::Result<T, Error>;

/// I/O error types.
#[derive(Error, Debug)]
pub enum Error {
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Pickle decoding error.
    #[error("pickle error: {0}")]
    Pickle(#[from] serde_pickle::Error),

    /// TIFF decoding or encoding error.
    #[error("TIFF error: {0}")]
    Tiff(#[from] tiff::TiffError),

    /// Core library error.
    #[error(transparent)]
    Core(#[from] pvmapper_core::Error),
}

impl Error {
    /// Wraps an I/O error, mapping a missing file to `NotFound` for `path`.
    pub(crate) fn at_path(err: std::io::Error, path: &Path) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            Error::Core(pvmapper_core::Error::NotFound(path.display().to_string()))
        } else {
            Error::Io(err)
        }
    }
}

impl From<Error> for pvmapper_core::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Core(e) => e,
            Error::Io(e) => pvmapper_core::Error::Io(e),
            Error::Pickle(e) => pvmapper_core::Error::MalformedData(format!("pickle: {e}")),
            Error::Tiff(e) => pvmapper_core::Error::MalformedData(format!("tiff: {e}")),
        }
    }
}
