//! Compression utilities using Zstd

use crate::error::PersistenceError;
use crate::error::Result;
use std::io::Read;
use std::io::Write;

/// Compression level for Zstd
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompressionLevel {
    /// Fast compression (level 1)
    Fast,
    /// Balanced compression (level 3)
    #[default]
    Balanced,
    /// Maximum compression (level 9)
    Maximum,
    /// Custom level (1-22)
    Custom(i32),
}

impl CompressionLevel {
    /// Convert to Zstd compression level
    pub fn to_level(self) -> i32 {
        match self {
            Self::Fast => 1,
            Self::Balanced => 3,
            Self::Maximum => 9,
            Self::Custom(level) => level.clamp(1, 22),
        }
    }

    /// Level named in configuration.
    pub const fn from_level(level: i32) -> Self {
        match level {
            1 => Self::Fast,
            3 => Self::Balanced,
            9 => Self::Maximum,
            other => Self::Custom(other),
        }
    }
}

/// Zstd compressor for stub streams
#[derive(Debug, Clone, Copy)]
pub struct Compressor {
    level: CompressionLevel,
}

impl Compressor {
    /// Create a new compressor with the specified level
    pub const fn new(level: CompressionLevel) -> Self {
        Self { level }
    }

    /// Compress data using Zstd
    pub fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut encoder = zstd::Encoder::new(Vec::new(), self.level.to_level())
            .map_err(|e| PersistenceError::Compression(e.to_string()))?;

        encoder
            .write_all(data)
            .map_err(|e| PersistenceError::Compression(e.to_string()))?;

        encoder
            .finish()
            .map_err(|e| PersistenceError::Compression(e.to_string()))
    }

    /// Decompress data using Zstd, refusing output larger than `limit`
    pub fn decompress(&self, compressed: &[u8], limit: usize) -> Result<Vec<u8>> {
        let decoder = zstd::Decoder::new(compressed)
            .map_err(|e| PersistenceError::Compression(e.to_string()))?;

        let mut decompressed = Vec::new();
        decoder
            .take(limit as u64 + 1)
            .read_to_end(&mut decompressed)
            .map_err(|e| PersistenceError::Compression(e.to_string()))?;

        if decompressed.len() > limit {
            return Err(PersistenceError::CorruptData(format!(
                "stream expands beyond {limit} bytes"
            )));
        }
        Ok(decompressed)
    }
}
