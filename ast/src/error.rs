//! Error types for parse-tree operations

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AstError {
    #[error("Language not supported: {0}")]
    UnsupportedLanguage(String),

    #[error("Failed to detect language for file: {0}")]
    LanguageDetectionFailed(String),

    #[error("Parser error: {0}")]
    ParserError(String),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Invalid tree node: {0}")]
    InvalidNode(String),

    #[error("Parsing cancelled")]
    Cancelled,

    #[error("Declarations nested deeper than {max} levels")]
    NestingTooDeep { max: usize },

    #[error("File too large: {size} bytes exceeds maximum {max} bytes")]
    FileTooLarge { size: usize, max: usize },
}

pub type AstResult<T> = Result<T, AstError>;
