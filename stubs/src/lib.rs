//! Stub element model, serializer and indexes.
//!
//! A stub tree mirrors the declarations of a source file: packages, imports,
//! classes, methods, fields, annotations and their name/value pairs. Every
//! element type defines how a stub is built from a parse node, written to and
//! read from a stub stream, and which index keys it contributes. Stub trees
//! can be answered from without the source being parsed again; the lazy node
//! layer reparses a file only when token-level detail is asked for.

pub mod builder;
pub mod cache;
pub mod config;
pub mod element_type;
pub mod engine;
pub mod error;
pub mod index;
pub mod java;
pub mod lazy;
pub mod project_index;
pub mod registry;
pub mod serializer;
pub mod stream;
pub mod stub;

pub use builder::BuiltStubs;
pub use builder::StubTreeBuilder;
pub use builder::build_stub_tree;
pub use cache::CacheStats;
pub use cache::ContentHash;
pub use cache::StubCache;
pub use config::StorageConfig;
pub use config::StubEngineConfig;
pub use element_type::ElementTypeId;
pub use element_type::StubElementType;
pub use engine::IndexedFile;
pub use engine::StubEngine;
pub use engine::StubOrigin;
pub use engine::StubStore;
pub use engine::content_hash;
pub use error::StubError;
pub use error::StubResult;
pub use index::IndexContributions;
pub use index::IndexKey;
pub use index::IndexSink;
pub use index::StubIndexKey;
pub use lazy::FileState;
pub use lazy::LazySyntaxNode;
pub use lazy::Reparser;
pub use lazy::StubBasedFile;
pub use project_index::IndexHit;
pub use project_index::ProjectIndex;
pub use registry::ElementTypeRegistry;
pub use registry::RegistryBuilder;
pub use serializer::StubSerializer;
pub use serializer::deserialize;
pub use serializer::serialize;
pub use stub::StubId;
pub use stub::StubPayload;
pub use stub::StubTree;
