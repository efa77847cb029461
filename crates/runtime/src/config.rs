//! Runtime configuration and its TOML loader.

use std::path::Path;

use effect_core::EffectConfig;
use serde::{Deserialize, Serialize};

use crate::error::{Result, RuntimeError};

/// Settings of one [`crate::AbilityComponent`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub effects: EffectConfig,

    /// Drop ended instances from the registry at the end of every step.
    pub remove_ended_effects: bool,

    /// Number of rollback snapshots the in-memory repository keeps.
    pub snapshot_history: usize,
}

impl RuntimeConfig {
    pub const DEFAULT_SNAPSHOT_HISTORY: usize = 32;

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| RuntimeError::Config(anyhow::anyhow!("Failed to parse config TOML: {}", e)))
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            effects: EffectConfig::default(),
            remove_ended_effects: true,
            snapshot_history: Self::DEFAULT_SNAPSHOT_HISTORY,
        }
    }
}

/// Loader for runtime configuration from TOML files.
pub struct ConfigLoader;

impl ConfigLoader {
    pub fn load(path: &Path) -> Result<RuntimeConfig> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            RuntimeError::Config(anyhow::anyhow!(
                "Failed to read file {}: {}",
                path.display(),
                e
            ))
        })?;
        RuntimeConfig::from_toml_str(&content)
    }
}
