use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewConfig {
    /// Attributed moves below this confidence still go to review
    pub acceptance_threshold: f64,
    /// Upper bound on one batch flush
    pub flush_timeout_secs: u64,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            acceptance_threshold: 0.6,
            flush_timeout_secs: 10,
        }
    }
}

impl ReviewConfig {
    pub fn flush_timeout(&self) -> Duration {
        Duration::from_secs(self.flush_timeout_secs)
    }
}
