//! On-disk store for serialized stub trees with Zstd compression
//!
//! Stored streams are keyed by source path and tagged with the content hash
//! of the source they were built from, so a changed file never loads stale
//! stubs.

pub mod compression;
pub mod error;
pub mod migration;
pub mod storage;


pub use compression::CompressionLevel;
pub use compression::Compressor;
pub use error::PersistenceError;
pub use error::Result;
pub use migration::StoreSweeper;
pub use migration::SweepReport;
pub use storage::DiskStubStore;
pub use storage::StoredHeader;

/// Magic bytes of stored stub files
pub const STORE_MAGIC: &[u8] = b"STBS";

/// Current store format version
pub const STORE_VERSION: u16 = 1;
