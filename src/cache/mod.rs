//! Persistent caching with redb.
//!
//! Caches extraction results per file, keyed by relative path and validated
//! by the file's modification time and length. The store itself is a plain key/value collaborator so tests can
//! swap in the in-memory implementation.

mod extraction;
mod store;

pub use extraction::{cache_key, ExtractionCache, FileStamp, GLOBALS_FOLDER, UNITS_FOLDER};
pub use store::{CacheStats, CacheStore, MemoryStore, RedbStore, DATABASE_FILE};
