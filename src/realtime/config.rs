use serde::{Deserialize, Serialize};

use crate::models::Player;

/// Which historical classifier variant runs per frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Weighted HSV distance with reliability-weighted votes.
    WeightedHsv,
    /// Pixel counts inside each profile's tolerance box.
    HueOnly,
    /// Side of the table plus pointing direction; no color.
    Spatial,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandSelection {
    /// Smallest wrist y, i.e. the hand reaching furthest up the frame.
    Highest,
    /// Provider order.
    First,
}

/// Tunables for color voting.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RealtimeConfig {
    pub strategy: StrategyKind,
    pub hand_selection: HandSelection,

    /// Side of the square sampled around the wrist (pixels)
    pub roi_size: u32,
    /// Sample every n-th pixel in both directions
    pub pixel_stride: u32,

    /// Noise floor: pixels below either are not considered at all
    pub min_saturation: f32,
    pub min_value: f32,

    /// Weighted distance: w_h * hue + w_s * |ds| + w_v * |dv|
    pub weight_hue: f32,
    pub weight_sat: f32,
    pub weight_val: f32,

    /// Pixels whose best distance exceeds this cast no vote
    pub neutral_zone: f32,

    /// Winner must exceed 50% by this margin
    pub sensitivity: f64,

    /// Fewer considered pixels than this is insufficient evidence
    pub min_pixels: usize,

    /// Confidence reported when only one player is calibrated
    pub unary_confidence: f64,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::WeightedHsv,
            hand_selection: HandSelection::Highest,
            roi_size: 60,
            pixel_stride: 2,
            min_saturation: 60.0,
            min_value: 70.0,
            weight_hue: 1.0,
            weight_sat: 0.2,
            weight_val: 0.1,
            neutral_zone: 40.0,
            sensitivity: 0.1,
            min_pixels: 20,
            unary_confidence: 0.5,
        }
    }
}

/// Tunables for the spatial midline mode. Positions are normalized frame x.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MidlineConfig {
    pub initial_position: f32,
    /// EMA weight of the current frame's target
    pub alpha: f32,
    /// |pointing.x| above this counts as pointing sideways
    pub point_threshold: f32,
    pub side_score: i32,
    pub point_score: i32,
    pub deep_reach_score: i32,
    /// Width of the outer thirds used for the deep reach lock
    pub deep_zone: f32,
    /// Player seated on the left edge of the frame
    pub left_player: Player,
}

impl Default for MidlineConfig {
    fn default() -> Self {
        Self {
            initial_position: 0.5,
            alpha: 0.2,
            point_threshold: 0.05,
            side_score: 1,
            point_score: 2,
            deep_reach_score: 4,
            deep_zone: 1.0 / 3.0,
            left_player: Player::A,
        }
    }
}

impl MidlineConfig {
    pub fn max_score(&self) -> i32 {
        self.side_score + self.point_score + self.deep_reach_score
    }
}
