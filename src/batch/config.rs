use serde::{Deserialize, Serialize};

/// How a frame's foreground is chosen before averaging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaskMode {
    /// Ask the vision provider for a person mask (unless the sample already
    /// carries one).
    Segmented,
    /// Average the whole frame.
    General,
}

/// What to do when a k-means cluster empties mid-run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReseedPolicy {
    /// Random point; repeated runs may differ in this edge case.
    Random,
    /// Point farthest from the surviving centroids; reproducible.
    Farthest,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub mask_mode: MaskMode,
    /// Frames with fewer foreground pixels are skipped
    pub min_foreground_pixels: usize,
    pub max_iterations: usize,
    pub reseed: ReseedPolicy,
    /// Each cluster must hold between these shares of all samples
    pub min_cluster_ratio: f64,
    pub max_cluster_ratio: f64,
    pub epsilon: f64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            mask_mode: MaskMode::Segmented,
            min_foreground_pixels: 500,
            max_iterations: 100,
            reseed: ReseedPolicy::Random,
            min_cluster_ratio: 0.10,
            max_cluster_ratio: 0.90,
            epsilon: 1e-9,
        }
    }
}
