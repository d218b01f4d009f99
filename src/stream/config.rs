use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Frames that may wait behind the one being classified, per camera
    pub queue_depth: usize,
    pub status_interval_ms: u64,
    /// No status trail when unset
    pub status_log_path: Option<PathBuf>,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            queue_depth: 4,
            status_interval_ms: 1000,
            status_log_path: None,
        }
    }
}

impl StreamConfig {
    pub fn status_interval(&self) -> Duration {
        Duration::from_millis(self.status_interval_ms)
    }
}
