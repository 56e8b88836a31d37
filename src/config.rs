//! Configuration file support
//!
//! Reads from .sessions/config.toml. Every key is optional.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Result, SessionsError};
use crate::keys::Layout;

pub const CONFIG_FILE: &str = "config.toml";

/// Configuration structure
#[derive(Debug, Deserialize, Serialize, Default, Clone, PartialEq)]
pub struct Config {
    /// Directory layout for sessions and artifacts
    #[serde(default)]
    pub layout: Layout,

    #[serde(default)]
    pub artifacts: ArtifactsConfig,

    #[serde(default)]
    pub git: GitConfig,
}

/// Artifact creation defaults
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ArtifactsConfig {
    /// Type given to new artifacts when `--type` is not passed.
    /// Default: "analysis"
    #[serde(default = "default_artifact_type")]
    pub default_type: String,
}

/// Git integration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct GitConfig {
    /// Whether `sessions new` may run git to pre-fill changed files.
    /// Default: true
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_artifact_type() -> String {
    "analysis".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            default_type: default_artifact_type(),
        }
    }
}

impl Default for GitConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Config {
    /// Load config from `<sessions_dir>/config.toml`.
    /// Returns the default config if the file doesn't exist.
    pub fn load(sessions_dir: &Path) -> Result<Self> {
        let path = sessions_dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(&path).map_err(|e| SessionsError::io(&path, e))?;
        toml::from_str(&contents).map_err(|e| SessionsError::Config {
            path,
            message: e.message().to_string(),
        })
    }

    /// Config file contents written by `sessions init`
    pub fn template(layout: Layout) -> String {
        format!(
            r#"# sessions configuration

# Directory layout: "sharded" (sessions/YYYY-MM/<id>.md) or "flat" (<id>.md)
layout = "{}"

[artifacts]
# Type used when `sessions artifact` is run without --type
default_type = "{}"

[git]
# Pre-fill files_changed from `git status` in `sessions new` templates
enabled = true
"#,
            layout,
            default_artifact_type()
        )
    }
}
