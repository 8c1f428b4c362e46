//! Error types for stub operations

use std::io;
use stubindex_ast::AstError;
use thiserror::Error;

pub type StubResult<T> = Result<T, StubError>;

#[derive(Error, Debug)]
pub enum StubError {
    /// An element type with the same debug name or parse kind already exists
    #[error("Duplicate element type registration: {0}")]
    DuplicateRegistration(String),

    /// The process-wide registry was already installed or read
    #[error("Element type registry is frozen")]
    RegistryFrozen,

    #[error("Unknown element type id: {0}")]
    UnknownElementType(u32),

    /// Stream format version outside the supported window
    #[error("Stub format version mismatch: found {found}, expected at most {expected}")]
    VersionMismatch { found: u32, expected: u32 },

    #[error("Stub stream truncated at offset {offset}")]
    TruncatedStream { offset: usize },

    #[error("Stub payload mismatch: {0}")]
    PayloadMismatch(String),

    #[error("Parse failed: {0}")]
    ParseFailed(String),

    #[error("Operation cancelled")]
    Cancelled,

    /// A lazy node was used after its file was dropped
    #[error("Stub-based file was closed")]
    FileClosed,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl StubError {
    /// Stream errors after which the stubs have to be rebuilt from source.
    pub const fn requires_rebuild(&self) -> bool {
        matches!(
            self,
            Self::VersionMismatch { .. }
                | Self::UnknownElementType(_)
                | Self::TruncatedStream { .. }
                | Self::PayloadMismatch(_)
        )
    }

    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl From<AstError> for StubError {
    fn from(err: AstError) -> Self {
        match err {
            AstError::Cancelled => Self::Cancelled,
            AstError::IoError(msg) => Self::Io(io::Error::other(msg)),
            other => Self::ParseFailed(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rebuild_classification() {
        assert!(StubError::VersionMismatch { found: 2, expected: 1 }.requires_rebuild());
        assert!(StubError::UnknownElementType(99).requires_rebuild());
        assert!(StubError::TruncatedStream { offset: 3 }.requires_rebuild());
        assert!(StubError::PayloadMismatch("bad".into()).requires_rebuild());
        assert!(!StubError::Cancelled.requires_rebuild());
        assert!(!StubError::ParseFailed("x".into()).requires_rebuild());
        assert!(!StubError::FileClosed.requires_rebuild());
    }

    #[test]
    fn test_ast_error_conversion() {
        assert!(StubError::from(AstError::Cancelled).is_cancelled());
        assert!(matches!(
            StubError::from(AstError::FileTooLarge { size: 10, max: 1 }),
            StubError::ParseFailed(_)
        ));
        assert!(matches!(
            StubError::from(AstError::NestingTooDeep { max: 256 }),
            StubError::ParseFailed(_)
        ));
    }
}
