//! Key/value stores behind the extraction cache.
//!
//! Keys are `/`-separated paths (`units/crm/forms/main.js`), values are opaque
//! bytes. Stores never evict: entries live until the database file is removed.
//!
//! Two implementations:
//! - `RedbStore`: `<root>/<cache-dir>/extraction.redb`, durable across runs
//! - `MemoryStore`: process-local, used in tests and when redb cannot open

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dashmap::DashMap;
use redb::{Database, ReadableTable, TableDefinition};

/// Key = cache key, Value = opaque bytes
const ENTRIES_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("entries");

/// File name of the redb database inside the cache directory.
pub const DATABASE_FILE: &str = "extraction.redb";

/// The persistence collaborator.
///
/// Reads are best-effort: a store that cannot read answers "absent".
pub trait CacheStore: Send + Sync {
    /// Insert or overwrite `key`.
    fn save(&self, key: &str, bytes: &[u8]) -> Result<()>;

    fn load(&self, key: &str) -> Option<Vec<u8>>;

    /// Keys inside `folder`, ascending. Non-recursive listings only return
    /// keys directly inside the folder. `filter` sees the full key.
    fn list_folder(&self, folder: &str, recursive: bool, filter: Option<&dyn Fn(&str) -> bool>) -> Vec<String>;

    /// Entry count and approximate size.
    fn stats(&self) -> CacheStats {
        let keys = self.list_folder("", true, None);
        let size_bytes = keys
            .iter()
            .map(|k| k.len() + self.load(k).map_or(0, |v| v.len()))
            .sum::<usize>() as u64;
        CacheStats {
            entries: keys.len(),
            size_bytes,
        }
    }
}

/// Does `key` belong to the listing of `folder`?
fn in_folder(key: &str, folder: &str, recursive: bool) -> bool {
    let folder = folder.trim_end_matches('/');
    let rest = if folder.is_empty() {
        key
    } else {
        match key.strip_prefix(folder).and_then(|r| r.strip_prefix('/')) {
            Some(rest) => rest,
            None => return false,
        }
    };
    !rest.is_empty() && (recursive || !rest.contains('/'))
}

fn select_keys(
    keys: impl Iterator<Item = String>,
    folder: &str,
    recursive: bool,
    filter: Option<&dyn Fn(&str) -> bool>,
) -> Vec<String> {
    let mut selected: Vec<String> = keys
        .filter(|k| in_folder(k, folder, recursive))
        .filter(|k| filter.map_or(true, |f| f(k.as_str())))
        .collect();
    selected.sort();
    selected
}

/// Persistent store backed by redb.
pub struct RedbStore {
    db: Database,
    path: PathBuf,
}

impl RedbStore {
    /// Open or create `<cache_dir>/extraction.redb`, creating the directory.
    pub fn open(cache_dir: &Path) -> Result<Self> {
        fs::create_dir_all(cache_dir)
            .with_context(|| format!("Failed to create cache directory: {}", cache_dir.display()))?;

        let path = cache_dir.join(DATABASE_FILE);
        let db = Database::create(&path)
            .with_context(|| format!("Failed to open cache database: {}", path.display()))?;

        Ok(Self { db, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn all_keys(&self) -> Vec<String> {
        let Ok(read_txn) = self.db.begin_read() else {
            return Vec::new();
        };
        let Ok(table) = read_txn.open_table(ENTRIES_TABLE) else {
            return Vec::new();
        };
        table
            .iter()
            .ok()
            .into_iter()
            .flatten()
            .filter_map(|r| r.ok())
            .map(|(k, _)| k.value().to_string())
            .collect()
    }
}

impl CacheStore for RedbStore {
    fn save(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let write_txn = self
            .db
            .begin_write()
            .context("Failed to begin write transaction")?;
        {
            let mut table = write_txn
                .open_table(ENTRIES_TABLE)
                .context("Failed to open cache table")?;
            table
                .insert(key, bytes)
                .with_context(|| format!("Failed to insert cache entry for {key}"))?;
        }
        write_txn.commit().context("Failed to commit cache write")?;
        Ok(())
    }

    fn load(&self, key: &str) -> Option<Vec<u8>> {
        let read_txn = self.db.begin_read().ok()?;
        // A fresh database has no table until the first write.
        let table = read_txn.open_table(ENTRIES_TABLE).ok()?;
        let guard = table.get(key).ok()??;
        Some(guard.value().to_vec())
    }

    fn list_folder(&self, folder: &str, recursive: bool, filter: Option<&dyn Fn(&str) -> bool>) -> Vec<String> {
        select_keys(self.all_keys().into_iter(), folder, recursive, filter)
    }
}

/// In-process store.
#[derive(Default)]
pub struct MemoryStore {
    entries: DashMap<String, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheStore for MemoryStore {
    fn save(&self, key: &str, bytes: &[u8]) -> Result<()> {
        self.entries.insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    fn load(&self, key: &str) -> Option<Vec<u8>> {
        self.entries.get(key).map(|v| v.value().clone())
    }

    fn list_folder(&self, folder: &str, recursive: bool, filter: Option<&dyn Fn(&str) -> bool>) -> Vec<String> {
        let keys: Vec<String> = self.entries.iter().map(|e| e.key().clone()).collect();
        select_keys(keys.into_iter(), folder, recursive, filter)
    }
}

/// Cache statistics for the `cache` command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    /// Keys plus values, in bytes
    pub size_bytes: u64,
}

impl CacheStats {
    /// Format size in human-readable form (KB, MB, GB)
    pub fn size_human(&self) -> String {
        const KB: u64 = 1024;
        const MB: u64 = KB * 1024;
        const GB: u64 = MB * 1024;

        if self.size_bytes >= GB {
            format!("{:.2} GB", self.size_bytes as f64 / GB as f64)
        } else if self.size_bytes >= MB {
            format!("{:.2} MB", self.size_bytes as f64 / MB as f64)
        } else if self.size_bytes >= KB {
            format!("{:.2} KB", self.size_bytes as f64 / KB as f64)
        } else {
            format!("{} B", self.size_bytes)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill(store: &dyn CacheStore) -> Result<()> {
        for key in ["units/b.js", "units/a.js", "units/forms/x.js", "globals/globals.js"] {
            store.save(key, key.as_bytes())?;
        }
        Ok(())
    }

    fn check_listing(store: &dyn CacheStore) {
        assert_eq!(store.list_folder("units", false, None), vec!["units/a.js", "units/b.js"]);
        assert_eq!(
            store.list_folder("units/", true, None),
            vec!["units/a.js", "units/b.js", "units/forms/x.js"]
        );
        let only_b = |k: &str| k.ends_with("b.js");
        assert_eq!(store.list_folder("units", true, Some(&only_b)), vec!["units/b.js"]);
        assert!(store.list_folder("missing", true, None).is_empty());
        assert_eq!(store.list_folder("", true, None).len(), 4);
    }

    #[test]
    fn test_memory_store() -> Result<()> {
        let store = MemoryStore::new();
        assert!(store.load("units/a.js").is_none());
        fill(&store)?;
        assert_eq!(store.load("units/a.js").as_deref(), Some(&b"units/a.js"[..]));
        check_listing(&store);

        store.save("units/a.js", b"new")?;
        assert_eq!(store.load("units/a.js").as_deref(), Some(&b"new"[..]));
        Ok(())
    }

    #[test]
    fn test_redb_store_persists() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let cache_dir = dir.path().join(".scriptsense.cache");
        {
            let store = RedbStore::open(&cache_dir)?;
            assert!(store.load("units/a.js").is_none());
            assert!(store.list_folder("", true, None).is_empty());
            fill(&store)?;
            check_listing(&store);
        }

        let reopened = RedbStore::open(&cache_dir)?;
        assert!(reopened.path().ends_with(DATABASE_FILE));
        assert_eq!(reopened.load("globals/globals.js").as_deref(), Some(&b"globals/globals.js"[..]));
        Ok(())
    }

    #[test]
    fn test_stats() -> Result<()> {
        let store = MemoryStore::new();
        assert_eq!(store.stats(), CacheStats::default());
        store.save("k", b"abc")?;
        let stats = store.stats();
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.size_bytes, 4);
        assert_eq!(stats.size_human(), "4 B");
        Ok(())
    }

    #[test]
    fn test_size_human() {
        let stats = CacheStats {
            entries: 1,
            size_bytes: 3 * 1024 * 1024,
        };
        assert_eq!(stats.size_human(), "3.00 MB");
    }
}
