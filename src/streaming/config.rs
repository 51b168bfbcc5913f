//! Streaming configuration

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::{Error, Result};

/// Tunables for the streaming window and load pipeline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamingConfig {
    /// Meters left in the active segment at which the next one is requested
    pub preload_distance: f32,
    /// Segments behind the active one that stay resident
    pub unload_threshold: u32,
    /// Upper bound on concurrent fetch + decode tasks
    pub max_concurrent_loads: usize,
    /// Directory payload files are read from
    pub payload_dir: PathBuf,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            preload_distance: 50.0,
            unload_threshold: 2,
            max_concurrent_loads: 4,
            payload_dir: PathBuf::from("assets/splats"),
        }
    }
}

impl StreamingConfig {
    /// Parse and validate a JSON config. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.preload_distance.is_finite() || self.preload_distance < 0.0 {
            return Err(Error::Config(format!(
                "preload_distance must be a non-negative number, got {}",
                self.preload_distance
            )));
        }
        if self.max_concurrent_loads == 0 {
            return Err(Error::Config("max_concurrent_loads must be at least 1".into()));
        }
        Ok(())
    }
}
