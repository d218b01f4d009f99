//! Per-pixel distance functions, one per color strategy.

use crate::calibration::ColorProfile;
use crate::color::{hue_distance, Hsv};

use super::config::RealtimeConfig;

pub trait PixelScorer: Send + Sync {
    /// Distance from `px` to `profile`; `None` when the pixel is in the
    /// neutral zone for this profile.
    fn distance(&self, px: &Hsv, profile: &ColorProfile) -> Option<f32>;
}

/// `w_h * hueDistance + w_s * |ds| + w_v * |dv|`, cut off at `neutral_zone`.
#[derive(Debug, Clone)]
pub struct WeightedHsvScorer {
    pub weight_hue: f32,
    pub weight_sat: f32,
    pub weight_val: f32,
    pub neutral_zone: f32,
}

impl WeightedHsvScorer {
    pub fn from_config(config: &RealtimeConfig) -> Self {
        Self {
            weight_hue: config.weight_hue,
            weight_sat: config.weight_sat,
            weight_val: config.weight_val,
            neutral_zone: config.neutral_zone,
        }
    }
}

impl PixelScorer for WeightedHsvScorer {
    fn distance(&self, px: &Hsv, profile: &ColorProfile) -> Option<f32> {
        let d = self.weight_hue * hue_distance(px.h, profile.h)
            + self.weight_sat * (px.s - profile.s).abs()
            + self.weight_val * (px.v - profile.v).abs();
        (d <= self.neutral_zone).then_some(d)
    }
}

/// Hue distance, but only inside the profile's `dH/dS/dV` box.
#[derive(Debug, Clone, Default)]
pub struct HueBoxScorer;

impl PixelScorer for HueBoxScorer {
    fn distance(&self, px: &Hsv, profile: &ColorProfile) -> Option<f32> {
        let dh = hue_distance(px.h, profile.h);
        let inside = dh <= profile.hue_tolerance
            && (px.s - profile.s).abs() <= profile.sat_tolerance
            && (px.v - profile.v).abs() <= profile.val_tolerance;
        inside.then_some(dh)
    }
}
