//! Git-aware file discovery with parallel traversal.
//!
//! - Respects .gitignore automatically via the `ignore` crate
//! - Applies scriptsense.toml include/exclude patterns to root-relative paths
//! - Hands every surviving file to the caller's predicate
//! - Returns deterministic (sorted) results

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Result;
use ignore::WalkBuilder;

use crate::config::Config;

/// Find files under `root` accepted by `config` and `predicate`.
///
/// ## Returns
/// Sorted vector of paths. A `root` that is a file yields just that file
/// when it passes the filters.
pub fn find_files<F>(root: &Path, config: &Config, predicate: F) -> Result<Vec<PathBuf>>
where
    F: Fn(&Path) -> bool + Sync,
{
    if root.is_file() {
        let keep = root
            .file_name()
            .is_some_and(|name| config.should_include(Path::new(name)))
            && predicate(root);
        return Ok(if keep { vec![root.to_path_buf()] } else { Vec::new() });
    }

    if !root.is_dir() {
        anyhow::bail!("Path does not exist: {}", root.display());
    }

    // threads(0) = auto-detect based on CPU count
    let walker = WalkBuilder::new(root)
        .hidden(false) // Let .gitignore and excludes decide
        .git_ignore(true)
        .git_global(true)
        .git_exclude(true)
        .require_git(false)
        .follow_links(false) // Don't follow symlinks (avoid cycles)
        .threads(0)
        .build_parallel();

    let files = Mutex::new(Vec::new());

    walker.run(|| {
        Box::new(|entry_result| {
            // Skip entries we can't read (permissions, broken symlinks, etc.)
            let Ok(entry) = entry_result else {
                return ignore::WalkState::Continue;
            };
            let path = entry.path();
            if !path.is_file() {
                return ignore::WalkState::Continue;
            }

            let rel_path = path.strip_prefix(root).unwrap_or(path);
            if !config.should_include(rel_path) || !predicate(path) {
                return ignore::WalkState::Continue;
            }

            if let Ok(mut files) = files.lock() {
                files.push(path.to_path_buf());
            }
            ignore::WalkState::Continue
        })
    });

    let mut files = files
        .into_inner()
        .map_err(|_| anyhow::anyhow!("Failed to unwrap mutex"))?;
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, "var a = 1;\n")?;
        Ok(())
    }

    #[test]
    fn test_sorted_filtered_discovery() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let root = dir.path();
        touch(&root.join("crm/forms/b.js"))?;
        touch(&root.join("crm/forms/a.js"))?;
        touch(&root.join("crm/globals.js"))?;
        touch(&root.join("crm/readme.md"))?;
        touch(&root.join("crm/node_modules/lib/index.js"))?;

        let config = Config::default();
        let files = find_files(root, &config, |p| config.is_script(p))?;
        let rel: Vec<PathBuf> = files
            .iter()
            .map(|f| f.strip_prefix(root).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            rel,
            vec![
                PathBuf::from("crm/forms/a.js"),
                PathBuf::from("crm/forms/b.js"),
                PathBuf::from("crm/globals.js"),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_predicate_selects_globals() -> Result<()> {
        let dir = tempfile::tempdir()?;
        touch(&dir.path().join("a/globals.js"))?;
        touch(&dir.path().join("a/other.js"))?;

        let config = Config::default();
        let files = find_files(dir.path(), &config, |p| config.is_globals_file(p))?;
        assert_eq!(files, vec![dir.path().join("a/globals.js")]);
        Ok(())
    }

    #[test]
    fn test_single_file_root() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let file = dir.path().join("main.js");
        touch(&file)?;

        let config = Config::default();
        assert_eq!(find_files(&file, &config, |_| true)?, vec![file.clone()]);
        assert!(find_files(&file, &config, |_| false)?.is_empty());
        Ok(())
    }

    #[test]
    fn test_nonexistent_path() {
        let result = find_files(Path::new("/nonexistent/path/xyz"), &Config::default(), |_| true);
        assert!(result.is_err());
    }
}
