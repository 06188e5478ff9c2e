//! Configuration module for distlink
//!
//! Precedence, highest first:
//! 1. CLI flags
//! 2. Config file (TOML, passed via `--config`)
//! 3. Built-in defaults
//!
//! Merging is done by pure functions; there is no global config object.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{DistlinkError, DistlinkResult};

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Wipe each destination root before syncing (force-clean mode).
    /// When false, stale destination entries are removed incrementally.
    #[serde(default = "default_clean")]
    pub clean: bool,

    /// File extensions routed through the transform capability.
    /// Everything else is copied or linked verbatim.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Suffix appended to a transform destination to name its map artifact.
    #[serde(default = "default_map_suffix")]
    pub map_suffix: String,

    /// Caller-supplied options handed to the transformer. Engine-computed
    /// keys (sourceMap, filename, sourceMapTarget, sourceRoot) always win
    /// over anything set here.
    #[serde(default)]
    pub transform_options: Map<String, Value>,
}

fn default_clean() -> bool {
    true
}

fn default_extensions() -> Vec<String> {
    ["js", "jsx", "mjs", "cjs"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_map_suffix() -> String {
    ".map".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            clean: default_clean(),
            extensions: default_extensions(),
            map_suffix: default_map_suffix(),
            transform_options: Map::new(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> DistlinkResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| DistlinkError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        toml::from_str(&content).map_err(|e| DistlinkError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Whether a source file should go through the transform bucket.
    pub fn is_transformable(&self, path: &Path) -> bool {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => self.extensions.iter().any(|e| e == ext),
            None => false,
        }
    }
}
