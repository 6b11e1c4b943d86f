//! The symbol index: named `ScriptObject`s from the catalog plus the merged
//! project globals.
//!
//! Built once, read-only afterwards. Names are unique; insertion order is
//! preserved for `list_names`.

use std::collections::HashMap;
use std::path::Path;

use tracing::{info, warn};

use super::catalog::Catalog;
use super::fuzzy::fuzzy_search;
use super::globals::{collect_globals, GlobalsAggregate};
use crate::cache::ExtractionCache;
use crate::config::Config;
use crate::typesys::AliasTable;
use crate::types::{Function, ScriptObject};

/// Reserved name of the project globals object.
pub const GLOBALS_OBJECT: &str = "globals";

#[derive(Debug, Clone, Default)]
pub struct SymbolIndex {
    objects: Vec<ScriptObject>,
    by_name: HashMap<String, usize>,
    aliases: AliasTable,
}

impl SymbolIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index the catalog's objects, in catalog order.
    pub fn from_catalog(catalog: Catalog) -> Self {
        let mut index = Self {
            aliases: catalog.aliases,
            ..Self::default()
        };
        for obj in catalog.objects {
            index.insert(obj);
        }
        index
    }

    /// Load the configured catalog and merge the workspace's globals files.
    ///
    /// A missing or unreadable catalog degrades to an index holding only the
    /// project globals.
    pub fn build(root: &Path, config: &Config, cache: &ExtractionCache) -> Self {
        let catalog = match config.catalog {
            Some(ref path) => Catalog::load(path).unwrap_or_else(|e| {
                let error = format!("{e:#}");
                warn!(path = %path.display(), %error, "platform catalog unavailable");
                Catalog::default()
            }),
            None => {
                info!("no platform catalog configured");
                Catalog::default()
            }
        };

        let mut index = Self::from_catalog(catalog);
        index.install_globals(collect_globals(root, config, cache));
        info!(
            objects = index.len(),
            functions = index.objects().iter().map(|o| o.functions.len()).sum::<usize>(),
            aliases = index.aliases().len(),
            "symbol index ready"
        );
        index
    }

    /// Add `obj`, replacing an existing object of the same name in place.
    pub fn insert(&mut self, obj: ScriptObject) {
        match self.by_name.get(&obj.name) {
            Some(&idx) => self.objects[idx] = obj,
            None => {
                self.by_name.insert(obj.name.clone(), self.objects.len());
                self.objects.push(obj);
            }
        }
    }

    /// Replace the globals object's functions and properties, keeping its
    /// other fields. Creates the object when the catalog has none.
    pub fn install_globals(&mut self, globals: GlobalsAggregate) {
        let mut obj = self
            .lookup(GLOBALS_OBJECT)
            .cloned()
            .unwrap_or_else(|| ScriptObject::new(GLOBALS_OBJECT));
        obj.functions = globals.functions;
        obj.properties = globals.properties;
        self.insert(obj);
    }

    pub fn lookup(&self, name: &str) -> Option<&ScriptObject> {
        self.by_name.get(name).map(|&idx| &self.objects[idx])
    }

    pub fn globals(&self) -> Option<&ScriptObject> {
        self.lookup(GLOBALS_OBJECT)
    }

    /// Object names in insertion order.
    pub fn list_names(&self) -> Vec<&str> {
        self.objects.iter().map(|o| o.name.as_str()).collect()
    }

    pub fn objects(&self) -> &[ScriptObject] {
        &self.objects
    }

    /// Qualified → scripting names from the catalog.
    pub fn aliases(&self) -> &AliasTable {
        &self.aliases
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Objects whose names fuzzily match `partial`, best first.
    pub fn search_objects(&self, partial: &str) -> Vec<&ScriptObject> {
        fuzzy_search(&self.list_names(), partial)
            .iter()
            .filter_map(|name| self.lookup(name))
            .collect()
    }

    /// Functions of `obj` fuzzily matching `partial`: the first overload of
    /// each distinct name, best first.
    pub fn search_functions<'a>(obj: &'a ScriptObject, partial: &str) -> Vec<&'a Function> {
        let mut names: Vec<&str> = Vec::new();
        for f in &obj.functions {
            if !names.contains(&f.name.as_str()) {
                names.push(&f.name);
            }
        }
        fuzzy_search(&names, partial)
            .iter()
            .filter_map(|name| obj.functions.iter().find(|f| f.name == *name))
            .collect()
    }
}
