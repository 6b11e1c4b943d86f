//! Solution settings files.
//!
//! A solution ("unit") is a directory holding a settings file of flat
//! `key: "value",` lines:
//!
//! ```text
//! uuid: "7c1b0f4e-...",
//! modulesNames: "shared,reporting",
//! ```
//!
//! `uuid` is required; `modulesNames` lists directly referenced units. The
//! unit's name is its directory name.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;

static SETTING_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^([a-zA-Z0-9_]+)\s*:\s*"(.*?)",?$"#).expect("setting line pattern is valid"));

/// One discovered project unit. Immutable after discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolutionInfo {
    /// Directory containing the settings file
    pub path: PathBuf,
    pub settings_path: PathBuf,
    pub name: String,
    /// Directly referenced unit names, in file order
    pub references: Vec<String>,
    pub uuid: String,
}

/// `key → value` pairs of a settings file. Non-matching lines are ignored.
pub fn parse_settings(content: &str) -> HashMap<String, String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| {
            let caps = SETTING_LINE.captures(line)?;
            Some((caps[1].to_string(), caps[2].to_string()))
        })
        .collect()
}

/// Build a `SolutionInfo` from settings text. `None` when `uuid` is missing.
pub fn solution_from_settings(content: &str, settings_path: &Path) -> Option<SolutionInfo> {
    let mut settings = parse_settings(content);
    let uuid = settings.remove("uuid").filter(|u| !u.is_empty())?;

    let path = settings_path.parent().map(Path::to_path_buf).unwrap_or_default();
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let references = settings
        .get("modulesNames")
        .map(|list| {
            list.split(',')
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    Some(SolutionInfo {
        path,
        settings_path: settings_path.to_path_buf(),
        name,
        references,
        uuid,
    })
}

/// Read a settings file. `Ok(None)` when it has no `uuid`.
pub fn load_solution(settings_path: &Path) -> Result<Option<SolutionInfo>> {
    let content = fs::read_to_string(settings_path)
        .with_context(|| format!("Failed to read settings {}", settings_path.display()))?;
    Ok(solution_from_settings(&content, settings_path))
}
