//! Lightweight parse trees for stub building.
//!
//! This crate turns source files into flat, read-only trees that the stub
//! builder walks. Java is parsed with tree-sitter and lowered into the
//! declaration skeleton described by [`SyntaxKind`].

pub mod char_table;
pub mod error;
pub mod java;
pub mod language_registry;
pub mod lighter;
pub mod types;

pub use char_table::CharTable;
pub use error::AstError;
pub use error::AstResult;
pub use language_registry::Language;
pub use language_registry::LanguageRegistry;
pub use lighter::FlatTree;
pub use lighter::FlatTreeBuilder;
pub use lighter::LighterAst;
pub use lighter::NodeRef;
pub use types::SyntaxKind;
pub use types::TextRange;
pub use types::normalize_text;
