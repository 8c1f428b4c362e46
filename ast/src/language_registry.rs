//! Language detection and parsing into lightweight trees.
//!
//! Only Java has a stub-producing front end today. Other source files are
//! rejected at detection time so callers never build stubs for them.

use crate::error::AstError;
use crate::error::AstResult;
use crate::java;
use crate::lighter::FlatTree;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Default upper bound on the size of a single parsed file.
pub const DEFAULT_MAX_FILE_SIZE: usize = 8 * 1024 * 1024;

/// Languages with a lightweight-tree front end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Java,
}

impl Language {
    /// Get the tree-sitter language parser
    pub fn parser(&self) -> tree_sitter::Language {
        match self {
            Self::Java => tree_sitter_java::LANGUAGE.into(),
        }
    }

    /// Get language display name
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Java => "Java",
        }
    }

    /// Stable identifier used as the prefix of element type names.
    pub const fn id(&self) -> &'static str {
        match self {
            Self::Java => "java",
        }
    }
}

/// Language registry for detection and parsing
#[derive(Debug)]
pub struct LanguageRegistry {
    max_file_size: usize,
    parses: AtomicU64,
}

impl LanguageRegistry {
    pub fn new() -> Self {
        Self::with_max_file_size(DEFAULT_MAX_FILE_SIZE)
    }

    pub fn with_max_file_size(max_file_size: usize) -> Self {
        Self {
            max_file_size,
            parses: AtomicU64::new(0),
        }
    }

    pub const fn max_file_size(&self) -> usize {
        self.max_file_size
    }

    /// Detect language from file path
    pub fn detect_language(&self, path: &Path) -> AstResult<Language> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| AstError::LanguageDetectionFailed(path.display().to_string()))?;

        match extension {
            "java" => Ok(Language::Java),
            _ => Err(AstError::UnsupportedLanguage(extension.to_string())),
        }
    }

    /// Parse source code into a lightweight tree.
    ///
    /// The token is polled while the tree is lowered; a cancelled parse
    /// returns [`AstError::Cancelled`] and produces nothing.
    pub fn parse(
        &self,
        language: Language,
        source: impl Into<Arc<str>>,
        cancel: &CancellationToken,
    ) -> AstResult<FlatTree> {
        let source = source.into();
        if source.len() > self.max_file_size {
            return Err(AstError::FileTooLarge {
                size: source.len(),
                max: self.max_file_size,
            });
        }
        let tree = match language {
            Language::Java => java::parse_java(source, cancel)?,
        };
        self.parses.fetch_add(1, Ordering::Relaxed);
        debug!(language = language.name(), nodes = tree.len(), "parsed lightweight tree");
        Ok(tree)
    }

    /// Get statistics about the registry
    pub fn stats(&self) -> LanguageRegistryStats {
        LanguageRegistryStats {
            total_parses: self.parses.load(Ordering::Relaxed),
            total_languages: 1,
        }
    }
}

impl Default for LanguageRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Statistics about the language registry
#[derive(Debug, Clone)]
pub struct LanguageRegistryStats {
    pub total_parses: u64,
    pub total_languages: usize,
}
