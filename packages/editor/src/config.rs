//! Editor settings, read from `pipe.config.json` in a document directory.

use pipe_net::{DEFAULT_PLACE_SIZE, DEFAULT_TRANSITION_SIZE};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_CONFIG_NAME: &str = "pipe.config.json";

/// Editor settings for one open document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorConfig {
    /// Undo depth (0 = unlimited)
    #[serde(default = "default_max_undo_levels")]
    pub max_undo_levels: usize,

    /// Prefix for synthesized place identifiers
    #[serde(default = "default_place_prefix")]
    pub place_prefix: String,

    /// Prefix for synthesized transition identifiers
    #[serde(default = "default_transition_prefix")]
    pub transition_prefix: String,

    #[serde(default = "default_place_size")]
    pub place_size: f64,

    #[serde(default = "default_transition_size")]
    pub transition_size: f64,
}

fn default_max_undo_levels() -> usize {
    100
}

fn default_place_prefix() -> String {
    "P".to_string()
}

fn default_transition_prefix() -> String {
    "T".to_string()
}

fn default_place_size() -> f64 {
    DEFAULT_PLACE_SIZE
}

fn default_transition_size() -> f64 {
    DEFAULT_TRANSITION_SIZE
}

impl EditorConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Load config from a directory
    pub fn load(dir: impl AsRef<Path>) -> anyhow::Result<Self> {
        let config_path = dir.as_ref().join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Ok(Self::from_json(&content)?)
        } else {
            // Return default config if none exists
            Ok(Self::default())
        }
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            max_undo_levels: default_max_undo_levels(),
            place_prefix: default_place_prefix(),
            transition_prefix: default_transition_prefix(),
            place_size: default_place_size(),
            transition_size: default_transition_size(),
        }
    }
}
