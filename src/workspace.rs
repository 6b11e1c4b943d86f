//! One analyzed workspace: config, extraction cache, symbol index and scope
//! graph, built once and read-only afterwards.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cache::{CacheStore, ExtractionCache, MemoryStore, RedbStore};
use crate::config::Config;
use crate::diagnostics::{Diagnostic, DiagnosticEngine, ResolveOptions};
use crate::index::SymbolIndex;
use crate::scope::ScopeGraph;

pub struct Workspace {
    root: PathBuf,
    config: Config,
    cache: ExtractionCache,
    index: SymbolIndex,
    scopes: ScopeGraph,
}

impl Workspace {
    /// Load config, open the cache and build the index and scope graph.
    ///
    /// Only an unusable root is an error. A cache that cannot be opened
    /// degrades to an in-memory one.
    pub fn open(root: &Path) -> Result<Self> {
        let root = root
            .canonicalize()
            .with_context(|| format!("Failed to resolve workspace root {}", root.display()))?;
        let config = Config::load(&root);
        if let Some(source) = &config.source {
            info!(config = %source.display(), "using config");
        }

        let store: Box<dyn CacheStore> = match RedbStore::open(&root.join(&config.cache_dir)) {
            Ok(store) => Box::new(store),
            Err(e) => {
                let error = format!("{e:#}");
                warn!(%error, "extraction cache unavailable, using memory");
                Box::new(MemoryStore::new())
            }
        };
        let cache = ExtractionCache::new(store);

        Ok(Self::build(root, config, cache))
    }

    /// Build from parts. The index and scope graph are built concurrently.
    pub fn build(root: PathBuf, config: Config, cache: ExtractionCache) -> Self {
        let (index, scopes) = rayon::join(
            || SymbolIndex::build(&root, &config, &cache),
            || ScopeGraph::build(&root, &config, &cache),
        );
        Self {
            root,
            config,
            cache,
            index,
            scopes,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn cache(&self) -> &ExtractionCache {
        &self.cache
    }

    pub fn index(&self) -> &SymbolIndex {
        &self.index
    }

    pub fn scopes(&self) -> &ScopeGraph {
        &self.scopes
    }

    pub fn engine(&self) -> DiagnosticEngine<'_> {
        DiagnosticEngine::new(
            &self.index,
            ResolveOptions {
                allow_unknown_actuals: self.config.allow_unknown_actuals,
            },
        )
    }

    /// Diagnostics for a document's current text.
    pub fn analyze(&self, text: &str) -> Result<Vec<Diagnostic>> {
        Ok(self.engine().analyze(text)?)
    }

    /// Diagnostics for a file on disk. Relative paths resolve against the root.
    pub fn check_file(&self, path: &Path) -> Result<Vec<Diagnostic>> {
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        };
        let text = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read script {}", path.display()))?;
        self.analyze(&text)
            .with_context(|| format!("Failed to analyze {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        Ok(())
    }

    const CATALOG: &str = r#"{
        "servoydoc": { "runtime": { "object": [
            { "_qualifiedName": "com.example.DatabaseManager", "_scriptingName": "databaseManager",
              "functions": { "function": {
                  "_name": "getTable", "return": { "_typecode": "JSTable" },
                  "parameters": { "parameter": { "_name": "name", "_typecode": "java.lang.String" } } } } }
        ] } }
    }"#;

    fn workspace() -> Result<tempfile::TempDir> {
        let dir = tempfile::tempdir()?;
        let root = dir.path();
        write(&root.join("catalog.json"), CATALOG)?;
        write(&root.join("scriptsense.toml"), "catalog = \"catalog.json\"\n")?;
        write(&root.join("crm/solution_settings.obj"), "uuid: \"1\",\n")?;
        write(
            &root.join("crm/globals.js"),
            "/**\n * @param {number} id\n */\nfunction open(id) {}\n",
        )?;
        write(&root.join("crm/main.js"), "globals.open(\"x\");\n")?;
        Ok(dir)
    }

    #[test]
    fn test_open_builds_everything() -> Result<()> {
        let dir = workspace()?;
        let ws = Workspace::open(dir.path())?;

        assert!(ws.config().source.is_some());
        assert!(ws.index().lookup("databaseManager").is_some());
        assert_eq!(ws.index().globals().unwrap().functions[0].name, "open");
        assert_eq!(ws.scopes().solutions().len(), 1);
        assert!(ws.root().join(&ws.config().cache_dir).join(crate::cache::DATABASE_FILE).exists());
        Ok(())
    }

    #[test]
    fn test_check_file_and_analyze() -> Result<()> {
        let dir = workspace()?;
        let ws = Workspace::open(dir.path())?;

        let diagnostics = ws.check_file(Path::new("crm/main.js"))?;
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].message.starts_with("No matching overload found for function 'globals.open'."));

        assert!(ws.analyze("databaseManager.getTable(\"t\");\n")?.is_empty());
        assert_eq!(ws.analyze("databaseManager.getTable(1);\n")?.len(), 1);
        assert!(ws.analyze("databaseManager.getTable(").is_err());
        Ok(())
    }

    #[test]
    fn test_cache_is_reused_across_opens() -> Result<()> {
        let dir = workspace()?;
        let first = Workspace::open(dir.path())?.cache().stats().entries;
        assert!(first >= 2);
        let second = Workspace::open(dir.path())?.cache().stats().entries;
        assert_eq!(first, second);
        Ok(())
    }

    #[test]
    fn test_missing_root_is_an_error() {
        assert!(Workspace::open(Path::new("/nonexistent/workspace")).is_err());
    }
}
