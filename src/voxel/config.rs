//! World configuration

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::{Error, Result};
use crate::math::morton::MORTON_U32_MAX_COORD;

/// Tunables shared by a world and its edit manager
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Voxels per chunk side, excluding padding
    pub chunk_size: u32,
    /// Ray march step in voxels
    pub ray_step: f32,
    /// Maximum number of undoable edits
    pub undo_queue_size: usize,
    /// Central difference step for SDF normals
    pub gradient_epsilon: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            chunk_size: 16,
            ray_step: 0.1,
            undo_queue_size: 5,
            gradient_epsilon: 0.01,
        }
    }
}

impl WorldConfig {
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::InvalidConfig("chunk_size must be positive".into()));
        }
        // Padded coordinates run up to chunk_size and must fit a u32 Morton code
        if self.chunk_size > MORTON_U32_MAX_COORD {
            return Err(Error::InvalidConfig(format!(
                "chunk_size {} exceeds {}",
                self.chunk_size, MORTON_U32_MAX_COORD
            )));
        }
        if !(self.ray_step > 0.0 && self.ray_step.is_finite()) {
            return Err(Error::InvalidConfig(format!("ray_step {} must be positive", self.ray_step)));
        }
        if !(self.gradient_epsilon > 0.0 && self.gradient_epsilon.is_finite()) {
            return Err(Error::InvalidConfig(format!(
                "gradient_epsilon {} must be positive",
                self.gradient_epsilon
            )));
        }
        Ok(())
    }

    /// Parse and validate a JSON config
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load from file
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Save to file, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = self.to_json_string()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)?;
        Ok(())
    }
}
