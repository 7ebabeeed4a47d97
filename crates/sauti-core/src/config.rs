//! Engine configuration types.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the serving core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Maximum number of model instances resident in memory at once.
    /// Values below 1 are treated as 1.
    #[serde(default = "default_max_loaded_models")]
    pub max_loaded_models: usize,

    /// Coalesce concurrent loads of the same absent model: a second miss
    /// waits for the first miss's in-flight load instead of starting a
    /// duplicate one. Turn off to let callers serialize loads themselves.
    #[serde(default = "default_coalesce_loads")]
    pub coalesce_loads: bool,

    /// Device the backend should place model instances on.
    #[serde(default = "default_device")]
    pub device: String,

    /// Path to the SQLite database file holding tokens and speaker profiles.
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
}

fn default_max_loaded_models() -> usize {
    2
}
fn default_coalesce_loads() -> bool {
    true
}
fn default_device() -> String {
    "cpu".to_string()
}
fn default_database_path() -> PathBuf {
    PathBuf::from("sauti.db")
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_loaded_models: default_max_loaded_models(),
            coalesce_loads: default_coalesce_loads(),
            device: default_device(),
            database_path: default_database_path(),
        }
    }
}
