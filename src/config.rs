//! Configuration loading from scriptsense.toml.
//!
//! The file is looked up in the workspace root, then in each ancestor. A
//! missing file means defaults; a malformed one is logged and ignored.
//!
//! ## Example
//!
//! ```toml
//! catalog = "platform/servoydoc.json"
//! cache-dir = ".scriptsense.cache"
//! globals-file = "globals.js"
//! extend-exclude = ["**/generated/**"]
//! allow-unknown-actuals = true
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{debug, warn};

pub const CONFIG_FILE: &str = "scriptsense.toml";

/// Default exclude patterns (dependency, vendor and build trees).
pub const DEFAULT_EXCLUDES: &[&str] = &[
    "**/node_modules/**",
    "**/.git/**",
    "**/vendor/**",
    "**/dist/**",
    "**/build/**",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// File this config was read from (for display).
    pub source: Option<PathBuf>,

    /// Platform reference catalog (JSON). Relative paths resolve against the
    /// config file's directory.
    pub catalog: Option<PathBuf>,

    /// Cache directory, relative to the workspace root.
    pub cache_dir: PathBuf,

    /// File name marking a solution root.
    pub settings_file: String,

    /// File name of project globals files.
    pub globals_file: String,

    /// Extension of script files, without the dot.
    pub script_extension: String,

    /// Glob patterns for files to include. If empty, include all.
    pub include: Vec<String>,

    /// Glob patterns for files to exclude. Replaces defaults if set.
    pub exclude: Vec<String>,

    /// Additional exclude patterns (extends defaults).
    pub extend_exclude: Vec<String>,

    /// Treat actual arguments typed `unknown` as compatible with any parameter.
    pub allow_unknown_actuals: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: None,
            catalog: None,
            cache_dir: PathBuf::from(".scriptsense.cache"),
            settings_file: "solution_settings.obj".to_string(),
            globals_file: "globals.js".to_string(),
            script_extension: "js".to_string(),
            include: Vec::new(),
            exclude: Vec::new(),
            extend_exclude: Vec::new(),
            allow_unknown_actuals: false,
        }
    }
}

/// Raw config as deserialized from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct RawConfig {
    catalog: Option<String>,
    cache_dir: Option<String>,
    settings_file: Option<String>,
    globals_file: Option<String>,
    script_extension: Option<String>,
    include: Option<Vec<String>>,
    exclude: Option<Vec<String>>,
    extend_exclude: Option<Vec<String>>,
    allow_unknown_actuals: Option<bool>,
}

impl Config {
    /// Load configuration for the workspace rooted at `directory`.
    ///
    /// Search order:
    /// 1. scriptsense.toml in directory
    /// 2. scriptsense.toml in each ancestor
    /// 3. Default config if nothing usable is found
    pub fn load(directory: &Path) -> Self {
        for dir in directory.ancestors() {
            let candidate = dir.join(CONFIG_FILE);
            if !candidate.is_file() {
                continue;
            }
            match Self::load_file(&candidate) {
                Ok(config) => {
                    debug!(path = %candidate.display(), "loaded config");
                    return config;
                }
                Err(e) => {
                    let error = format!("{e:#}");
                    warn!(path = %candidate.display(), %error, "ignoring malformed config");
                    return Self::default();
                }
            }
        }
        Self::default()
    }

    fn load_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let raw: RawConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        Ok(Self::from_raw(raw, path.to_path_buf()))
    }

    fn from_raw(raw: RawConfig, source: PathBuf) -> Self {
        let defaults = Self::default();
        let base = source.parent().map(Path::to_path_buf).unwrap_or_default();
        Self {
            catalog: raw.catalog.map(|c| base.join(c)),
            cache_dir: raw.cache_dir.map(PathBuf::from).unwrap_or(defaults.cache_dir),
            settings_file: raw.settings_file.unwrap_or(defaults.settings_file),
            globals_file: raw.globals_file.unwrap_or(defaults.globals_file),
            script_extension: raw
                .script_extension
                .map(|e| e.trim_start_matches('.').to_string())
                .unwrap_or(defaults.script_extension),
            include: raw.include.unwrap_or_default(),
            exclude: raw.exclude.unwrap_or_default(),
            extend_exclude: raw.extend_exclude.unwrap_or_default(),
            allow_unknown_actuals: raw.allow_unknown_actuals.unwrap_or(false),
            source: Some(source),
        }
    }

    /// Get effective exclude patterns (defaults + cache dir + extend-exclude,
    /// or custom exclude).
    pub fn effective_excludes(&self) -> Vec<String> {
        if !self.exclude.is_empty() {
            // Custom exclude replaces defaults
            return self.exclude.clone();
        }
        let mut patterns: Vec<String> = DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect();
        patterns.push(format!("**/{}/**", self.cache_dir.display()));
        patterns.extend(self.extend_exclude.iter().cloned());
        patterns
    }

    /// Check if a path matches any include pattern.
    /// Returns true if no include patterns (include all), or if path matches any pattern.
    pub fn matches_include(&self, path: &Path) -> bool {
        if self.include.is_empty() {
            return true;
        }
        let path_str = normalized(path);
        self.include
            .iter()
            .any(|pattern| glob_match::glob_match(pattern, &path_str))
    }

    /// Check if a path matches any exclude pattern.
    pub fn matches_exclude(&self, path: &Path) -> bool {
        let path_str = normalized(path);
        self.effective_excludes()
            .iter()
            .any(|pattern| glob_match::glob_match(pattern, &path_str))
    }

    /// Check if a path should be included (matches include AND not exclude).
    pub fn should_include(&self, path: &Path) -> bool {
        self.matches_include(path) && !self.matches_exclude(path)
    }

    /// Is `path` a script file (by extension)?
    pub fn is_script(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(&self.script_extension))
    }

    /// Is `path` a project globals file?
    pub fn is_globals_file(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n == self.globals_file)
    }

    /// Format config for verbose display.
    pub fn display_summary(&self) -> String {
        let mut lines = Vec::new();

        match self.source {
            Some(ref source) => lines.push(format!("   Config: {}", source.display())),
            None => lines.push("   Config: (defaults)".to_string()),
        }

        match self.catalog {
            Some(ref catalog) => lines.push(format!("   Catalog: {}", catalog.display())),
            None => lines.push("   Catalog: (none)".to_string()),
        }

        if !self.include.is_empty() {
            lines.push(format!("   Include: {}", self.include.join(", ")));
        }

        let excludes = self.effective_excludes();
        if excludes.len() <= 3 {
            lines.push(format!("   Exclude: {}", excludes.join(", ")));
        } else {
            lines.push(format!(
                "   Exclude: {}, ... (+{} more)",
                excludes[..2].join(", "),
                excludes.len() - 2
            ));
        }

        lines.join("\n")
    }
}

/// Forward-slash form of a relative path for glob matching.
fn normalized(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_excludes() {
        let config = Config::default();
        assert!(config.matches_exclude(Path::new("foo/node_modules/bar.js")));
        assert!(config.matches_exclude(Path::new("project/.git/config")));
        assert!(config.matches_exclude(Path::new(".scriptsense.cache/extraction.redb")));
        assert!(!config.matches_exclude(Path::new("crm/forms/main.js")));
    }

    #[test]
    fn test_include_patterns() {
        let config = Config {
            include: vec!["crm/**".to_string(), "shared/**".to_string()],
            ..Default::default()
        };
        assert!(config.matches_include(Path::new("crm/globals.js")));
        assert!(config.matches_include(Path::new("shared/util.js")));
        assert!(!config.matches_include(Path::new("tests/test_main.js")));
    }

    #[test]
    fn test_extend_exclude() {
        let config = Config {
            extend_exclude: vec!["**/generated/**".to_string()],
            ..Default::default()
        };
        assert!(config.matches_exclude(Path::new("node_modules/foo.js")));
        assert!(config.matches_exclude(Path::new("crm/generated/schema.js")));
    }

    #[test]
    fn test_custom_exclude_replaces_defaults() {
        let config = Config {
            exclude: vec!["**/legacy/**".to_string()],
            ..Default::default()
        };
        assert!(!config.matches_exclude(Path::new("node_modules/foo.js")));
        assert!(config.matches_exclude(Path::new("crm/legacy/old.js")));
    }

    #[test]
    fn test_script_and_globals_detection() {
        let config = Config::default();
        assert!(config.is_script(Path::new("crm/forms/main.js")));
        assert!(config.is_script(Path::new("crm/forms/MAIN.JS")));
        assert!(!config.is_script(Path::new("crm/solution_settings.obj")));
        assert!(config.is_globals_file(Path::new("crm/globals.js")));
        assert!(!config.is_globals_file(Path::new("crm/forms/globals.json")));
    }

    #[test]
    fn test_load_from_ancestor() -> std::io::Result<()> {
        let dir = tempfile::tempdir()?;
        fs::write(
            dir.path().join(CONFIG_FILE),
            "catalog = \"docs/catalog.json\"\nglobals-file = \"shared.js\"\nscript-extension = \".js\"\nallow-unknown-actuals = true\n",
        )?;
        let nested = dir.path().join("crm").join("forms");
        fs::create_dir_all(&nested)?;

        let config = Config::load(&nested);
        assert_eq!(config.source, Some(dir.path().join(CONFIG_FILE)));
        assert_eq!(config.catalog, Some(dir.path().join("docs/catalog.json")));
        assert_eq!(config.globals_file, "shared.js");
        assert_eq!(config.script_extension, "js");
        assert!(config.allow_unknown_actuals);
        assert_eq!(config.settings_file, "solution_settings.obj");
        Ok(())
    }

    #[test]
    fn test_malformed_config_falls_back_to_defaults() -> std::io::Result<()> {
        let dir = tempfile::tempdir()?;
        fs::write(dir.path().join(CONFIG_FILE), "cache-dir = [1, 2\n")?;
        assert_eq!(Config::load(dir.path()), Config::default());

        fs::write(dir.path().join(CONFIG_FILE), "unknown-key = 1\n")?;
        assert_eq!(Config::load(dir.path()), Config::default());
        Ok(())
    }

    #[test]
    fn test_load_file_errors_name_the_file() -> std::io::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join(CONFIG_FILE);

        let error = format!("{:#}", Config::load_file(&path).unwrap_err());
        assert!(error.starts_with("Failed to read config"));
        assert!(error.contains(CONFIG_FILE));

        fs::write(&path, "cache-dir = [1, 2\n")?;
        let error = format!("{:#}", Config::load_file(&path).unwrap_err());
        assert!(error.starts_with("Failed to parse config"));
        Ok(())
    }
}
