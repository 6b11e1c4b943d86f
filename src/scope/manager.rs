//! The scope graph: discovered units, their files, and what each unit sees.
//!
//! Built once at startup:
//! 1. find every settings file and parse it (units without `uuid` are skipped)
//! 2. build the direct-reference graph
//! 3. list each unit's script files (the globals file excluded)
//! 4. extract every file in parallel through the extraction cache; each
//!    file's failure is independent
//!
//! Read-only afterwards.

use std::collections::{BTreeSet, HashMap};
use std::path::{Component, Path, PathBuf};

use dashmap::DashMap;
use rayon::prelude::*;
use tracing::{info, warn};

use super::graph::DependencyGraph;
use super::settings::{load_solution, SolutionInfo};
use crate::cache::{cache_key, ExtractionCache, UNITS_FOLDER};
use crate::config::Config;
use crate::discovery::find_files;
use crate::types::ExtractionResult;

/// Directory names whose subtrees never belong to a unit.
const DEPENDENCY_DIRS: &[&str] = &["node_modules", "vendor"];

/// One script file visible from a unit.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ModuleRef {
    /// File name without extension
    pub module_name: String,
    /// Unit the file belongs to
    pub origin_unit: String,
}

#[derive(Debug, Default)]
pub struct ScopeGraph {
    root: PathBuf,
    solutions: Vec<SolutionInfo>,
    graph: DependencyGraph,
    /// Unit name -> sorted script files
    files: HashMap<String, Vec<PathBuf>>,
    declarations: HashMap<PathBuf, ExtractionResult>,
}

impl ScopeGraph {
    /// Discover units under `root` and extract their files.
    pub fn build(root: &Path, config: &Config, cache: &ExtractionCache) -> Self {
        let settings_files = find_files(root, config, |p| {
            p.file_name().is_some_and(|n| n == config.settings_file.as_str())
        })
        .unwrap_or_else(|e| {
            let error = format!("{e:#}");
            warn!(root = %root.display(), %error, "settings discovery failed");
            Vec::new()
        });

        let parsed: Vec<SolutionInfo> = settings_files
            .par_iter()
            .filter_map(|path| match load_solution(path) {
                Ok(Some(solution)) => Some(solution),
                Ok(None) => {
                    warn!(path = %path.display(), "settings file has no uuid, skipping");
                    None
                }
                Err(e) => {
                    let error = format!("{e:#}");
                    warn!(path = %path.display(), %error, "skipping unreadable settings file");
                    None
                }
            })
            .collect();

        let mut solutions: Vec<SolutionInfo> = Vec::with_capacity(parsed.len());
        for solution in parsed {
            if solutions.iter().any(|s| s.name == solution.name) {
                warn!(name = %solution.name, path = %solution.path.display(), "duplicate unit name, keeping the first");
                continue;
            }
            solutions.push(solution);
        }

        let files: HashMap<String, Vec<PathBuf>> = solutions
            .par_iter()
            .map(|solution| {
                let found = find_files(&solution.path, config, |p| {
                    config.is_script(p) && !config.is_globals_file(p)
                })
                .unwrap_or_else(|e| {
                    let error = format!("{e:#}");
                    warn!(unit = %solution.name, %error, "file discovery failed");
                    Vec::new()
                });
                (solution.name.clone(), found)
            })
            .collect();

        let mut scopes = Self {
            root: root.to_path_buf(),
            graph: DependencyGraph::from_solutions(&solutions),
            solutions,
            files,
            declarations: HashMap::new(),
        };
        scopes.extract_all(cache);

        info!(
            solutions = scopes.solutions.len(),
            units = scopes.graph.unit_count(),
            references = scopes.graph.reference_count(),
            files = scopes.declarations.len(),
            "scope graph ready"
        );
        scopes
    }

    /// Startup extraction of every unit file. Unordered, failures isolated.
    fn extract_all(&mut self, cache: &ExtractionCache) {
        let mut all: Vec<&PathBuf> = self.files.values().flatten().collect();
        all.sort();
        all.dedup();

        let extracted: DashMap<PathBuf, ExtractionResult> = DashMap::new();
        all.par_iter().for_each(|path| {
            let path: &Path = path;
            let rel = path.strip_prefix(&self.root).unwrap_or(path);
            if let Some(result) = cache.get_or_extract(path, &cache_key(UNITS_FOLDER, rel)) {
                extracted.insert(path.to_path_buf(), result);
            }
        });

        self.declarations = extracted.into_iter().collect();
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn solutions(&self) -> &[SolutionInfo] {
        &self.solutions
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    pub fn solution_by_name(&self, name: &str) -> Option<&SolutionInfo> {
        self.solutions.iter().find(|s| s.name == name)
    }

    /// The innermost unit whose directory contains `path`. Paths running
    /// through a dependency subtree belong to no unit. Relative paths are
    /// resolved against the workspace root.
    pub fn solution_for_path(&self, path: &Path) -> Option<&SolutionInfo> {
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        };

        self.solutions
            .iter()
            .filter(|solution| {
                absolute.strip_prefix(&solution.path).is_ok_and(|rel| {
                    !rel.components()
                        .any(|c| matches!(c, Component::Normal(n) if DEPENDENCY_DIRS.iter().any(|d| n == *d)))
                })
            })
            .max_by_key(|solution| solution.path.components().count())
    }

    /// Units visible from `unit` (itself included). Empty for unknown units.
    pub fn references_of(&self, unit: &str) -> BTreeSet<String> {
        self.graph.direct(unit)
    }

    /// One entry per indexed file of every unit visible from `unit`.
    pub fn visible_modules(&self, unit: &str) -> Vec<ModuleRef> {
        self.references_of(unit)
            .into_iter()
            .flat_map(|origin| {
                self.files_of(&origin)
                    .iter()
                    .filter_map(|file| file.file_stem())
                    .map(|stem| ModuleRef {
                        module_name: stem.to_string_lossy().into_owned(),
                        origin_unit: origin.clone(),
                    })
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    /// Module names visible from `unit`, in `visible_modules` order.
    pub fn module_names(&self, unit: &str) -> Vec<String> {
        self.visible_modules(unit)
            .into_iter()
            .map(|m| m.module_name)
            .collect()
    }

    /// Script files of `unit`, sorted.
    pub fn files_of(&self, unit: &str) -> &[PathBuf] {
        self.files.get(unit).map_or(&[], Vec::as_slice)
    }

    /// Startup extraction result for a unit file.
    pub fn declarations(&self, path: &Path) -> Option<&ExtractionResult> {
        self.declarations.get(path)
    }
}
