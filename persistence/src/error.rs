//! Error types for persistence operations

use std::io;
use stubindex_stubs::StubError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PersistenceError>;

#[derive(Error, Debug)]
pub enum PersistenceError {
    /// I/O errors during file operations
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Compression errors
    #[error("Compression error: {0}")]
    Compression(String),

    /// Invalid magic bytes in file header
    #[error("Invalid file format: expected STBS magic bytes")]
    InvalidMagic,

    /// Unsupported format version
    #[error("Unsupported store version: {0} (expected {1})")]
    UnsupportedVersion(u16, u16),

    /// Corrupt stored stream
    #[error("Corrupt stored stubs: {0}")]
    CorruptData(String),

    /// Storage path does not exist
    #[error("Storage path does not exist: {0}")]
    PathNotFound(String),
}

impl From<PersistenceError> for StubError {
    fn from(err: PersistenceError) -> Self {
        match err {
            PersistenceError::Io(e) => Self::Io(e),
            PersistenceError::PathNotFound(path) => {
                Self::Io(io::Error::new(io::ErrorKind::NotFound, path))
            }
            other => Self::PayloadMismatch(other.to_string()),
        }
    }
}
