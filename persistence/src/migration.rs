//! Sweeping stored stub files written by other store versions

use crate::error::Result;
use crate::storage::HEADER_LEN;
use crate::storage::STUB_FILE_EXTENSION;
use crate::storage::StoredHeader;
use std::fs;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::path::PathBuf;
use tracing::info;
use tracing::warn;

/// Removes stored stub files that can no longer be read
#[derive(Debug, Clone)]
pub struct StoreSweeper {
    base_path: PathBuf,
}

impl StoreSweeper {
    pub const fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    /// Delete stale files and leftovers of interrupted writes.
    pub fn sweep(&self) -> Result<SweepReport> {
        let mut report = SweepReport::default();
        let mut leftovers = Vec::new();
        for entry in fs::read_dir(&self.base_path)?.flatten() {
            let path = entry.path();
            match path.extension().and_then(|ext| ext.to_str()) {
                Some(STUB_FILE_EXTENSION) => {
                    report.files_scanned += 1;
                    if Self::read_header(&path).is_err() {
                        leftovers.push(path);
                    }
                }
                Some("tmp") => leftovers.push(path),
                _ => {}
            }
        }

        for path in leftovers {
            match fs::remove_file(&path) {
                Ok(()) => report.files_removed += 1,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to remove stale stub file");
                    report.errors.push(format!("{}: {e}", path.display()));
                }
            }
        }

        info!(
            scanned = report.files_scanned,
            removed = report.files_removed,
            path = %self.base_path.display(),
            "swept stub store"
        );
        Ok(report)
    }

    fn read_header(path: &Path) -> Result<StoredHeader> {
        let mut header = [0u8; HEADER_LEN];
        File::open(path)?.read_exact(&mut header)?;
        StoredHeader::parse(&header)
    }
}

/// Outcome of a sweep
#[derive(Debug, Clone, Default)]
pub struct SweepReport {
    pub files_scanned: usize,
    pub files_removed: usize,
    pub errors: Vec<String>,
}

impl SweepReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}
