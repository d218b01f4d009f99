//! Hand observations as delivered by the vision provider.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A position or direction in normalized frame coordinates
/// (x: 0.0 left .. 1.0 right, y: 0.0 top .. 1.0 bottom).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length(&self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }
}

/// One detected hand in one frame. Lives for the current frame only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandObservation {
    pub wrist_position: Vec2,
    /// Wrist to index fingertip.
    pub pointing_vector: Vec2,
    pub timestamp: DateTime<Utc>,
}

impl HandObservation {
    pub fn new(wrist_position: Vec2, pointing_vector: Vec2) -> Self {
        Self {
            wrist_position,
            pointing_vector,
            timestamp: Utc::now(),
        }
    }

    /// Wrist position in pixel coordinates for a frame of the given size.
    pub fn wrist_pixel(&self, width: u32, height: u32) -> (i64, i64) {
        (
            (self.wrist_position.x * width as f32).round() as i64,
            (self.wrist_position.y * height as f32).round() as i64,
        )
    }

    /// Coordinates outside the unit square (with a small slack) or non-finite
    /// values mean the provider handed us garbage.
    pub fn is_well_formed(&self) -> bool {
        let finite = self.wrist_position.x.is_finite()
            && self.wrist_position.y.is_finite()
            && self.pointing_vector.x.is_finite()
            && self.pointing_vector.y.is_finite();
        let in_frame = (-0.1..=1.1).contains(&self.wrist_position.x)
            && (-0.1..=1.1).contains(&self.wrist_position.y);
        finite && in_frame
    }
}
