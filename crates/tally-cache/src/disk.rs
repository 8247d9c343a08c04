// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! On-disk cache backend.
//!
//! Each entry is one `<digest>.json` file under the cache directory, so
//! entries survive process restart and any instance pointed at the same
//! directory sees the same cache. Writes go to a temporary file in the
//! same directory followed by an atomic rename; a reader never observes a
//! half-written entry. An unreadable or corrupt file is treated as a miss.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tally_core::TallyError;
use tracing::warn;

use crate::backend::{CacheBackend, CacheEntry};

/// Filesystem-backed cache keyed by fingerprint as filename.
pub struct DiskCache {
    dir: PathBuf,
}

impl DiskCache {
    /// Open (creating if needed) a cache directory.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, TallyError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| TallyError::Cache {
            source: Box::new(e),
        })?;
        Ok(Self { dir })
    }

    /// The directory entries are stored under.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, digest: &str) -> PathBuf {
        self.dir.join(format!("{digest}.json"))
    }
}

impl CacheBackend for DiskCache {
    fn get(&self, digest: &str) -> Result<Option<CacheEntry>, TallyError> {
        let path = self.entry_path(digest);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(TallyError::Cache {
                    source: Box::new(e),
                });
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(entry) => Ok(Some(entry)),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "discarding corrupt cache entry");
                Ok(None)
            }
        }
    }

    fn put(&self, digest: &str, entry: CacheEntry) -> Result<(), TallyError> {
        let bytes = serde_json::to_vec(&entry).map_err(|e| TallyError::Cache {
            source: Box::new(e),
        })?;
        // Unique temp name so concurrent writers of the same digest cannot
        // collide mid-write; the final rename is atomic.
        let tmp = self
            .dir
            .join(format!(".{digest}.{}.tmp", uuid::Uuid::new_v4()));
        fs::write(&tmp, &bytes).map_err(|e| TallyError::Cache {
            source: Box::new(e),
        })?;
        fs::rename(&tmp, self.entry_path(digest)).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            TallyError::Cache {
                source: Box::new(e),
            }
        })
    }

    fn clear(&self) -> Result<(), TallyError> {
        let entries = fs::read_dir(&self.dir).map_err(|e| TallyError::Cache {
            source: Box::new(e),
        })?;
        for entry in entries {
            let entry = entry.map_err(|e| TallyError::Cache {
                source: Box::new(e),
            })?;
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                match fs::remove_file(&path) {
                    Ok(()) => {}
                    // Lost a race with another clear; nothing to do.
                    Err(e) if e.kind() == ErrorKind::NotFound => {}
                    Err(e) => {
                        return Err(TallyError::Cache {
                            source: Box::new(e),
                        });
                    }
                }
            }
        }
        Ok(())
    }
}
