use std::fs;
use std::path::{Path, PathBuf};

use glob::Pattern;
use serde::{Deserialize, Serialize};

use crate::errors::{CiteGraphError, Result};

/// Name of the configuration file stored inside the `.citegraph` directory.
pub const CONFIG_FILENAME: &str = "config.json";

/// Name of the hidden directory used to store CiteGraph metadata.
pub const CITEGRAPH_DIR: &str = ".citegraph";

/// Configuration for a CiteGraph project.
///
/// Controls which extraction manifests are ingested, where the graph
/// snapshot lives, and the default traversal depth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CiteGraphConfig {
    /// Schema version of the configuration.
    pub version: u32,
    /// Root directory of the project.
    pub root_dir: String,
    /// Directory, relative to the root, scanned for extraction manifests.
    pub manifest_dir: String,
    /// Glob patterns for manifests to include.
    pub include: Vec<String>,
    /// Glob patterns for manifests to exclude.
    pub exclude: Vec<String>,
    /// Maximum manifest size in bytes; larger files are skipped.
    pub max_file_size: u64,
    /// Default traversal depth for `analyze`.
    pub max_depth: u32,
    /// Number of entries kept in the "most referenced" rankings.
    pub top_n: usize,
    /// Snapshot file name inside the `.citegraph` directory.
    pub snapshot_file: String,
}

impl Default for CiteGraphConfig {
    fn default() -> Self {
        Self {
            version: 1,
            root_dir: String::new(),
            manifest_dir: "manifests".to_string(),
            include: vec!["**/*.json".to_string(), "**/*.jsonl".to_string()],
            exclude: vec![
                ".citegraph/**".to_string(),
                ".git/**".to_string(),
                "**/*.tmp".to_string(),
            ],
            max_file_size: 16 * 1_048_576,
            max_depth: 5,
            top_n: 10,
            snapshot_file: "graph.json".to_string(),
        }
    }
}

/// Returns the path to the `.citegraph` directory within the given project root.
pub fn get_citegraph_dir(project_root: &Path) -> PathBuf {
    project_root.join(CITEGRAPH_DIR)
}

/// Returns the path to the configuration file (`config.json`) within the `.citegraph` directory.
pub fn get_config_path(project_root: &Path) -> PathBuf {
    get_citegraph_dir(project_root).join(CONFIG_FILENAME)
}

/// Returns the path of the graph snapshot for the given configuration.
pub fn get_snapshot_path(project_root: &Path, config: &CiteGraphConfig) -> PathBuf {
    get_citegraph_dir(project_root).join(&config.snapshot_file)
}

/// Loads the configuration from disk.
///
/// A project without a config file gets the defaults, rooted at
/// `project_root`. A stored `max_depth` of 0 is rejected.
pub fn load_config(project_root: &Path) -> Result<CiteGraphConfig> {
    let config_path = get_config_path(project_root);
    let config_error = |what: &str, detail: String| CiteGraphError::Config {
        message: format!("{} '{}': {}", what, config_path.display(), detail),
    };

    let contents = match fs::read_to_string(&config_path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(CiteGraphConfig {
                root_dir: project_root.to_string_lossy().to_string(),
                ..CiteGraphConfig::default()
            });
        }
        Err(e) => return Err(config_error("failed to read config file", e.to_string())),
    };

    let config: CiteGraphConfig = serde_json::from_str(&contents)
        .map_err(|e| config_error("failed to parse config file", e.to_string()))?;

    if config.max_depth < 1 {
        return Err(config_error(
            "invalid config file",
            "max_depth must be at least 1".to_string(),
        ));
    }
    Ok(config)
}

/// Saves the configuration to disk using an atomic write.
pub fn save_config(project_root: &Path, config: &CiteGraphConfig) -> Result<()> {
    let config_path = get_config_path(project_root);
    let json = serde_json::to_string_pretty(config).map_err(|e| CiteGraphError::Config {
        message: format!("failed to serialize config: {}", e),
    })?;

    write_atomic(&config_path, &json).map_err(|e| CiteGraphError::Config {
        message: format!("failed to write config file '{}': {}", config_path.display(), e),
    })
}

/// Writes `contents` to a sibling `.tmp` file and renames it over `path`,
/// creating missing parent directories first.
pub(crate) fn write_atomic(path: &Path, contents: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let tmp_path = path.with_extension("tmp");
    fs::write(&tmp_path, contents)?;
    fs::rename(&tmp_path, path)
}

/// Determines whether a manifest path (relative to the manifest directory)
/// is ingested. Exclude patterns win over include patterns; invalid
/// patterns never match.
pub fn should_include_file(file_path: &str, config: &CiteGraphConfig) -> bool {
    !matches_any(&config.exclude, file_path) && matches_any(&config.include, file_path)
}

fn matches_any(patterns: &[String], file_path: &str) -> bool {
    let options = glob::MatchOptions {
        case_sensitive: true,
        require_literal_separator: false,
        require_literal_leading_dot: false,
    };
    patterns
        .iter()
        .filter_map(|p| Pattern::new(p).ok())
        .any(|pattern| pattern.matches_with(file_path, options))
}
