use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::oracle::TerrainRule;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Tunables for a [`World`](crate::world::World).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Frames a character spends animating a single step.
    pub move_frames: u32,
    pub terrain_rule: TerrainRule,
}

impl Default for WorldConfig {
    fn default() -> Self {
        WorldConfig {
            move_frames: 4,
            terrain_rule: TerrainRule::AnyExit,
        }
    }
}

impl WorldConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }
}
