//! File-based stub store
//!
//! One file per source path, named after the sha256 of the path:
//!
//! ```text
//! "STBS" . u16 LE store version . [u8; 32] content hash
//!        . u32 LE payload length . zstd(stub stream)
//! ```

use crate::STORE_MAGIC;
use crate::STORE_VERSION;
use crate::compression::CompressionLevel;
use crate::compression::Compressor;
use crate::error::PersistenceError;
use crate::error::Result;
use async_trait::async_trait;
use bytes::Bytes;
use sha2::Digest;
use sha2::Sha256;
use std::fmt::Write as _;
use std::io;
use std::path::Path;
use std::path::PathBuf;
use stubindex_stubs::ContentHash;
use stubindex_stubs::StorageConfig;
use stubindex_stubs::StubResult;
use stubindex_stubs::StubStore;
use tokio::fs as async_fs;
use tracing::debug;

/// Extension of stored stub files.
pub const STUB_FILE_EXTENSION: &str = "stb";

/// Size of the fixed header in front of the compressed payload.
pub const HEADER_LEN: usize = 4 + 2 + 32 + 4;

/// Upper bound for a decompressed stub stream.
const MAX_STREAM_SIZE: usize = 256 * 1024 * 1024;

/// Decoded header of a stored stub file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoredHeader {
    pub version: u16,
    pub content_hash: ContentHash,
    pub payload_len: u32,
}

impl StoredHeader {
    /// Validate magic and version of the first [`HEADER_LEN`] bytes.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(PersistenceError::CorruptData(format!(
                "header is {} bytes, expected {HEADER_LEN}",
                bytes.len()
            )));
        }
        if &bytes[0..4] != STORE_MAGIC {
            return Err(PersistenceError::InvalidMagic);
        }
        let version = u16::from_le_bytes([bytes[4], bytes[5]]);
        if version != STORE_VERSION {
            return Err(PersistenceError::UnsupportedVersion(version, STORE_VERSION));
        }
        let mut content_hash = [0u8; 32];
        content_hash.copy_from_slice(&bytes[6..38]);
        let payload_len = u32::from_le_bytes([bytes[38], bytes[39], bytes[40], bytes[41]]);
        Ok(Self {
            version,
            content_hash,
            payload_len,
        })
    }
}

/// Stub streams stored under a directory, one compressed file per source.
#[derive(Debug, Clone)]
pub struct DiskStubStore {
    base_path: PathBuf,
    compressor: Compressor,
}

impl DiskStubStore {
    /// Create a store rooted at `base_path`, creating the directory.
    pub fn new(base_path: PathBuf, compression_level: CompressionLevel) -> Result<Self> {
        // Ensure base path exists
        std::fs::create_dir_all(&base_path)?;

        Ok(Self {
            base_path,
            compressor: Compressor::new(compression_level),
        })
    }

    /// Store configured by `[storage]`, or `None` when no directory is set.
    pub fn from_config(config: &StorageConfig) -> Result<Option<Self>> {
        config
            .dir
            .clone()
            .map(|dir| Self::new(dir, CompressionLevel::from_level(config.compression_level)))
            .transpose()
    }

    /// Per-user cache directory for stub stores.
    pub fn default_dir() -> Result<PathBuf> {
        dirs::cache_dir()
            .map(|dir| dir.join("stubindex").join("stubs"))
            .ok_or_else(|| PersistenceError::PathNotFound("user cache directory".to_string()))
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Get the stored file for a source path
    pub fn file_for(&self, source: &Path) -> PathBuf {
        let digest = Sha256::digest(source.to_string_lossy().as_bytes());
        let mut name = String::with_capacity(64 + 4);
        for byte in digest {
            let _ = write!(name, "{byte:02x}");
        }
        name.push('.');
        name.push_str(STUB_FILE_EXTENSION);
        self.base_path.join(name)
    }

    /// Encode a stub stream with its header.
    pub fn encode(&self, content_hash: &ContentHash, stream: &[u8]) -> Result<Vec<u8>> {
        let compressed = self.compressor.compress(stream)?;
        let payload_len = u32::try_from(compressed.len()).map_err(|_| {
            PersistenceError::CorruptData(format!("payload of {} bytes", compressed.len()))
        })?;

        let mut out = Vec::with_capacity(HEADER_LEN + compressed.len());
        out.extend_from_slice(STORE_MAGIC);
        out.extend_from_slice(&STORE_VERSION.to_le_bytes());
        out.extend_from_slice(content_hash);
        out.extend_from_slice(&payload_len.to_le_bytes());
        out.extend_from_slice(&compressed);
        Ok(out)
    }

    /// Decode a stored file into its header and stub stream.
    pub fn decode(&self, bytes: &[u8]) -> Result<(StoredHeader, Vec<u8>)> {
        let header = StoredHeader::parse(bytes)?;
        let payload = &bytes[HEADER_LEN..];
        if payload.len() != header.payload_len as usize {
            return Err(PersistenceError::CorruptData(format!(
                "payload is {} bytes, header says {}",
                payload.len(),
                header.payload_len
            )));
        }
        let stream = self.compressor.decompress(payload, MAX_STREAM_SIZE)?;
        Ok((header, stream))
    }
}

#[async_trait]
impl StubStore for DiskStubStore {
    async fn load(&self, path: &Path, content_hash: &ContentHash) -> StubResult<Option<Bytes>> {
        let file = self.file_for(path);
        let bytes = match async_fs::read(&file).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        // Check the content hash before paying for decompression
        let header = StoredHeader::parse(&bytes)?;
        if header.content_hash != *content_hash {
            debug!(path = %path.display(), "stored stubs belong to other content");
            return Ok(None);
        }
        let (_, stream) = self.decode(&bytes)?;
        Ok(Some(Bytes::from(stream)))
    }

    async fn save(&self, path: &Path, content_hash: &ContentHash, stream: &[u8]) -> StubResult<()> {
        let file = self.file_for(path);
        let encoded = self.encode(content_hash, stream)?;

        // Write to temporary file first
        let temp_path = file.with_extension("tmp");
        async_fs::write(&temp_path, &encoded).await?;

        // Atomic rename
        async_fs::rename(&temp_path, &file).await?;
        debug!(
            path = %path.display(),
            stream = stream.len(),
            stored = encoded.len(),
            "stored stubs"
        );
        Ok(())
    }

    async fn remove(&self, path: &Path) -> StubResult<()> {
        match async_fs::remove_file(self.file_for(path)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
