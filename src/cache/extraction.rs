//! Extraction results cached per file.
//!
//! A stored result is reused only while the file still has the stamp it was
//! extracted from: same modification time and same length. Results written
//! by an older extractor carry a different format tag and are ignored.
//! Either way the file is re-extracted and the entry overwritten.

use std::fs;
use std::io;
use std::path::Path;
use std::time::SystemTime;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::store::{CacheStats, CacheStore};
use crate::extraction::extract_file;
use crate::types::ExtractionResult;

/// Key prefix for project globals files.
pub const GLOBALS_FOLDER: &str = "globals";
/// Key prefix for per-unit script files.
pub const UNITS_FOLDER: &str = "units";

/// Bumped whenever `ExtractionResult` or the extraction rules change.
const RESULT_FORMAT: u16 = 1;

/// What a file looked like when it was extracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileStamp {
    pub modified: SystemTime,
    pub len: u64,
}

impl FileStamp {
    pub fn of(path: &Path) -> io::Result<Self> {
        let meta = fs::metadata(path)?;
        Ok(Self {
            modified: meta.modified()?,
            len: meta.len(),
        })
    }
}

#[derive(Serialize, Deserialize)]
struct StoredExtraction {
    format: u16,
    stamp: FileStamp,
    result: ExtractionResult,
}

impl StoredExtraction {
    fn decode(bytes: &[u8]) -> Result<Self> {
        bincode::deserialize(bytes).context("Malformed extraction record")
    }

    fn result_for(self, stamp: &FileStamp) -> Option<ExtractionResult> {
        (self.format == RESULT_FORMAT && self.stamp == *stamp).then_some(self.result)
    }
}

/// Cache key for a file under `folder`: `folder/<relative path with '/'>`.
pub fn cache_key(folder: &str, rel_path: &Path) -> String {
    let rel = rel_path
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");
    format!("{folder}/{rel}")
}

/// Extraction front-end over a `CacheStore`.
pub struct ExtractionCache {
    store: Box<dyn CacheStore>,
}

impl ExtractionCache {
    pub fn new(store: Box<dyn CacheStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &dyn CacheStore {
        self.store.as_ref()
    }

    /// Cached result for `key`, if it was extracted from a file with `stamp`.
    pub fn get(&self, key: &str, stamp: &FileStamp) -> Option<ExtractionResult> {
        let bytes = self.store.load(key)?;
        match StoredExtraction::decode(&bytes) {
            Ok(stored) => stored.result_for(stamp),
            Err(e) => {
                let error = format!("{e:#}");
                warn!(key, %error, "discarding unreadable cache entry");
                None
            }
        }
    }

    pub fn set(&self, key: &str, stamp: &FileStamp, result: &ExtractionResult) -> Result<()> {
        let stored = StoredExtraction {
            format: RESULT_FORMAT,
            stamp: *stamp,
            result: result.clone(),
        };
        let bytes = bincode::serialize(&stored).context("Failed to encode extraction record")?;
        self.store.save(key, &bytes)
    }

    /// Extract `path`, reusing the cached result when the file is unchanged.
    ///
    /// Read and parse failures are logged and yield `None`; cache failures
    /// are logged and otherwise ignored.
    pub fn get_or_extract(&self, path: &Path, key: &str) -> Option<ExtractionResult> {
        let stamp = FileStamp::of(path).ok();

        if let Some(hit) = stamp.as_ref().and_then(|s| self.get(key, s)) {
            debug!(key, "extraction cache hit");
            return Some(hit);
        }

        let result = match extract_file(path) {
            Ok(result) => result,
            Err(e) => {
                let error = format!("{e:#}");
                warn!(path = %path.display(), %error, "skipping file");
                return None;
            }
        };

        if let Some(stamp) = stamp {
            if let Err(e) = self.set(key, &stamp, &result) {
                let error = format!("{e:#}");
                warn!(key, %error, "failed to write extraction cache");
            }
        }
        Some(result)
    }

    /// Keys of all cached entries under `folder`.
    pub fn keys(&self, folder: &str) -> Vec<String> {
        self.store.list_folder(folder, true, None)
    }

    pub fn stats(&self) -> CacheStats {
        self.store.stats()
    }
}
