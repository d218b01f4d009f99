use image::RgbImage;
use serde::{Deserialize, Serialize};

use crate::color::{circular_mean_hue, hsv_to_rgb, Hsv, Rgb};
use crate::error::{AttributionError, Result};
use crate::region::Roi;

pub const DEFAULT_HUE_TOLERANCE: f32 = 10.0;
pub const DEFAULT_SAT_TOLERANCE: f32 = 60.0;
pub const DEFAULT_VAL_TOLERANCE: f32 = 60.0;
pub const DEFAULT_SAMPLE_SIDE: u32 = 100;

fn default_hue_tolerance() -> f32 {
    DEFAULT_HUE_TOLERANCE
}

fn default_sat_tolerance() -> f32 {
    DEFAULT_SAT_TOLERANCE
}

fn default_val_tolerance() -> f32 {
    DEFAULT_VAL_TOLERANCE
}

/// A player's reference color. Serialized as `{h, s, v, dH, dS, dV}`, the
/// format the manual color picker writes; tolerances may be omitted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorProfile {
    pub h: f32,
    pub s: f32,
    pub v: f32,
    #[serde(rename = "dH", default = "default_hue_tolerance")]
    pub hue_tolerance: f32,
    #[serde(rename = "dS", default = "default_sat_tolerance")]
    pub sat_tolerance: f32,
    #[serde(rename = "dV", default = "default_val_tolerance")]
    pub val_tolerance: f32,
}

impl ColorProfile {
    pub fn new(h: f32, s: f32, v: f32) -> Self {
        Self {
            h,
            s,
            v,
            hue_tolerance: DEFAULT_HUE_TOLERANCE,
            sat_tolerance: DEFAULT_SAT_TOLERANCE,
            val_tolerance: DEFAULT_VAL_TOLERANCE,
        }
    }

    pub fn with_tolerances(mut self, hue: f32, sat: f32, val: f32) -> Self {
        self.hue_tolerance = hue;
        self.sat_tolerance = sat;
        self.val_tolerance = val;
        self
    }

    pub fn hsv(&self) -> Hsv {
        Hsv {
            h: self.h,
            s: self.s,
            v: self.v,
        }
    }

    pub fn to_rgb(&self) -> Rgb {
        hsv_to_rgb(self.hsv())
    }

    /// Rejects profiles outside the 0-180 / 0-255 convention.
    pub fn validate(&self) -> Result<()> {
        let in_range = |value: f32, max: f32| value.is_finite() && (0.0..=max).contains(&value);
        let ok = in_range(self.h, 180.0)
            && in_range(self.s, 255.0)
            && in_range(self.v, 255.0)
            && in_range(self.hue_tolerance, 90.0)
            && in_range(self.sat_tolerance, 255.0)
            && in_range(self.val_tolerance, 255.0);
        if ok {
            Ok(())
        } else {
            Err(AttributionError::InvalidColor(format!("{self:?}")))
        }
    }
}

/// Average a region into a profile. Hue is averaged on the circle; s and v
/// arithmetically.
pub fn compute_profile<I>(pixels: I) -> Result<ColorProfile>
where
    I: IntoIterator<Item = Rgb>,
{
    let hsv: Vec<Hsv> = pixels.into_iter().map(|px| px.to_hsv()).collect();
    if hsv.is_empty() {
        return Err(AttributionError::InsufficientEvidence(
            "calibration region contains no pixels".into(),
        ));
    }

    let hue = circular_mean_hue(hsv.iter().map(|p| p.h)).ok_or_else(|| {
        AttributionError::InsufficientEvidence("calibration hues cancel out".into())
    })?;
    let n = hsv.len() as f32;
    let s = hsv.iter().map(|p| p.s).sum::<f32>() / n;
    let v = hsv.iter().map(|p| p.v).sum::<f32>() / n;

    Ok(ColorProfile::new(hue, s, v))
}

/// Sample a `side`-pixel square of `frame` around `center` (frame centre when
/// `None`) and average it into a profile.
pub fn sample_profile(frame: &RgbImage, center: Option<(u32, u32)>, side: u32) -> Result<ColorProfile> {
    let (w, h) = frame.dimensions();
    let roi = match center {
        Some((cx, cy)) => Roi::centered(cx as i64, cy as i64, side, w, h),
        None => Roi::frame_center(side, w, h),
    }
    .ok_or_else(|| AttributionError::InsufficientEvidence("calibration region is empty".into()))?;

    compute_profile(roi.pixels(frame, 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::hue_distance;
    use image::Rgb as Px;

    #[test]
    fn reds_on_both_sides_of_the_wrap_average_to_red() {
        // hue ~179 and hue ~1
        let pixels = vec![Rgb::new(255, 0, 9); 10]
            .into_iter()
            .chain(vec![Rgb::new(255, 9, 0); 10]);
        let profile = compute_profile(pixels).unwrap();
        assert!(hue_distance(profile.h, 0.0) < 1.0, "hue was {}", profile.h);
        assert!((profile.v - 255.0).abs() < 1e-3);
    }

    #[test]
    fn defaults_tolerances() {
        let profile = compute_profile([Rgb::new(0, 0, 255)]).unwrap();
        assert_eq!(profile.hue_tolerance, 10.0);
        assert_eq!(profile.sat_tolerance, 60.0);
        assert_eq!(profile.val_tolerance, 60.0);
        assert!((profile.h - 120.0).abs() < 1e-3);
    }

    #[test]
    fn empty_region_is_insufficient_evidence() {
        let err = compute_profile(std::iter::empty()).unwrap_err();
        assert!(matches!(err, AttributionError::InsufficientEvidence(_)));
    }

    #[test]
    fn samples_only_the_requested_square() {
        let mut frame = RgbImage::from_pixel(200, 200, Px([0, 0, 255]));
        for y in 90..110 {
            for x in 90..110 {
                frame.put_pixel(x, y, Px([255, 0, 0]));
            }
        }
        let profile = sample_profile(&frame, None, 20).unwrap();
        assert!(hue_distance(profile.h, 0.0) < 0.5);

        let profile = sample_profile(&frame, Some((20, 20)), 20).unwrap();
        assert!((profile.h - 120.0).abs() < 0.5);
    }

    #[test]
    fn serializes_with_canonical_keys() {
        let profile = ColorProfile::new(5.0, 200.0, 180.0);
        let value = serde_json::to_value(profile).unwrap();
        assert_eq!(value["dH"], 10.0);
        assert_eq!(value["dS"], 60.0);
        assert!(value.get("hue_tolerance").is_none());

        let parsed: ColorProfile =
            serde_json::from_str(r#"{"h": 120, "s": 200, "v": 150}"#).unwrap();
        assert_eq!(parsed.val_tolerance, 60.0);
        assert!(parsed.validate().is_ok());

        let bad = ColorProfile::new(250.0, 10.0, 10.0);
        assert!(bad.validate().is_err());
    }
}
