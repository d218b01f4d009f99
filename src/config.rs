//! Engine configuration file. Every section falls back to its defaults, so a
//! file only has to name what it changes.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::batch::BatchConfig;
use crate::realtime::{MidlineConfig, RealtimeConfig};
use crate::review::ReviewConfig;
use crate::stream::StreamConfig;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub realtime: RealtimeConfig,
    pub midline: MidlineConfig,
    pub batch: BatchConfig,
    pub review: ReviewConfig,
    pub stream: StreamConfig,
}

impl EngineConfig {
    /// Missing file means defaults. A file that exists but does not parse is
    /// an error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config at {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let serialized = serde_json::to_string_pretty(self)?;
        fs::write(path, serialized)
            .with_context(|| format!("Failed to write config to {}", path.display()))
    }
}
