//! Project globals: every `globals.js` in the workspace, merged into the
//! reserved `globals` object.
//!
//! Files are extracted in parallel (through the extraction cache) and merged
//! in sorted path order once all of them have settled:
//! - functions dedupe by name; a same-named function with a different
//!   signature is kept next to the first one and logged as a conflict
//! - variables become properties, appended without dedupe

use std::path::Path;

use rayon::prelude::*;
use tracing::{info, warn};

use crate::cache::{cache_key, ExtractionCache, GLOBALS_FOLDER};
use crate::config::Config;
use crate::discovery::find_files;
use crate::types::{ExtractionResult, Function, Variable};

/// Merged functions and properties of all globals files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlobalsAggregate {
    pub functions: Vec<Function>,
    pub properties: Vec<Variable>,
}

/// Merge per-file results, in the given order.
pub fn aggregate(results: impl IntoIterator<Item = ExtractionResult>) -> GlobalsAggregate {
    // Groups keyed by function name, in first-seen name order.
    let mut groups: Vec<(String, Vec<Function>)> = Vec::new();
    let mut properties = Vec::new();

    for result in results {
        for func in result.functions {
            match groups.iter_mut().find(|(name, _)| *name == func.name) {
                None => groups.push((func.name.clone(), vec![func])),
                Some((_, existing)) => {
                    if !existing.iter().any(|e| e.same_signature(&func)) {
                        warn!(function = %func.name, "duplicate but not identical global functions, keeping both");
                        existing.push(func);
                    }
                }
            }
        }
        properties.extend(result.variables);
    }

    GlobalsAggregate {
        functions: groups.into_iter().flat_map(|(_, funcs)| funcs).collect(),
        properties,
    }
}

/// Discover, extract and merge all globals files under `root`.
///
/// A file that cannot be read or parsed is logged and contributes nothing.
pub fn collect_globals(root: &Path, config: &Config, cache: &ExtractionCache) -> GlobalsAggregate {
    let files = match find_files(root, config, |p| config.is_globals_file(p)) {
        Ok(files) => files,
        Err(e) => {
            let error = format!("{e:#}");
            warn!(root = %root.display(), %error, "globals discovery failed");
            return GlobalsAggregate::default();
        }
    };

    // Parallel extraction; collect preserves the sorted file order.
    let results: Vec<ExtractionResult> = files
        .par_iter()
        .filter_map(|path| {
            let rel = path.strip_prefix(root).unwrap_or(path);
            cache.get_or_extract(path, &cache_key(GLOBALS_FOLDER, rel))
        })
        .collect();

    info!(files = files.len(), extracted = results.len(), "extracted project globals");
    aggregate(results)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::cache::MemoryStore;
    use crate::types::{Param, TypeInfo};

    fn func(name: &str, param_type: &str) -> Function {
        Function {
            name: name.into(),
            params: vec![Param {
                name: "a".into(),
                ty: TypeInfo::named(param_type),
                description: String::new(),
                optional: false,
            }],
            returns: TypeInfo::void(),
            description: String::new(),
            location: None,
        }
    }

    fn var(name: &str) -> Variable {
        Variable {
            name: name.into(),
            ty: TypeInfo::unknown(),
            description: String::new(),
            deprecated: None,
            location: None,
        }
    }

    #[test]
    fn test_identical_duplicates_collapse() {
        let a = ExtractionResult {
            functions: vec![func("f", "number"), func("g", "string")],
            ..Default::default()
        };
        let b = ExtractionResult {
            functions: vec![func("f", "number")],
            ..Default::default()
        };
        let merged = aggregate(vec![a, b]);
        let names: Vec<&str> = merged.functions.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["f", "g"]);
    }

    #[test]
    fn test_conflicting_duplicates_are_kept_together() {
        let a = ExtractionResult {
            functions: vec![func("f", "number"), func("g", "string")],
            ..Default::default()
        };
        let b = ExtractionResult {
            functions: vec![func("f", "string")],
            ..Default::default()
        };
        let merged = aggregate(vec![a, b]);
        let shape: Vec<(&str, &str)> = merged
            .functions
            .iter()
            .map(|f| (f.name.as_str(), f.params[0].ty.name.as_str()))
            .collect();
        assert_eq!(shape, vec![("f", "number"), ("f", "string"), ("g", "string")]);
    }

    #[test]
    fn test_properties_are_never_deduped() {
        let a = ExtractionResult {
            variables: vec![var("x")],
            ..Default::default()
        };
        let b = ExtractionResult {
            variables: vec![var("x"), var("y")],
            ..Default::default()
        };
        let merged = aggregate(vec![a, b]);
        assert_eq!(merged.properties.len(), 3);
    }

    #[test]
    fn test_collect_globals_from_workspace() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let root = dir.path();
        fs::create_dir_all(root.join("crm"))?;
        fs::create_dir_all(root.join("sales"))?;
        fs::create_dir_all(root.join("broken"))?;
        fs::write(root.join("crm/globals.js"), "function open() {}\nvar crmName = 'x';\n")?;
        fs::write(root.join("sales/globals.js"), "function close() {}\nvar crmName = 'y';\n")?;
        fs::write(root.join("broken/globals.js"), "function (")?;
        fs::write(root.join("crm/other.js"), "function ignored() {}\n")?;

        let cache = ExtractionCache::new(Box::new(MemoryStore::new()));
        let merged = collect_globals(root, &Config::default(), &cache);

        let names: Vec<&str> = merged.functions.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["open", "close"]);
        assert_eq!(merged.properties.len(), 2);
        assert_eq!(cache.keys(GLOBALS_FOLDER), vec!["globals/crm/globals.js", "globals/sales/globals.js"]);
        Ok(())
    }
}
