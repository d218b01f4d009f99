use serde::{Deserialize, Serialize};

/// Hue wraps at 180, not 360: half-degree units, the convention every
/// calibration profile uses.
pub const HUE_RANGE: f32 = 180.0;
pub const CHANNEL_MAX: f32 = 255.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// `[r/255, g/255, b/255]`, the feature space used for clustering.
    pub fn normalized(&self) -> [f64; 3] {
        [
            self.r as f64 / 255.0,
            self.g as f64 / 255.0,
            self.b as f64 / 255.0,
        ]
    }

    pub fn to_hsv(&self) -> Hsv {
        rgb_to_hsv(self.r, self.g, self.b)
    }
}

impl From<image::Rgb<u8>> for Rgb {
    fn from(px: image::Rgb<u8>) -> Self {
        let [r, g, b] = px.0;
        Self { r, g, b }
    }
}

/// h in [0, 180), s and v in [0, 255].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Hsv {
    pub h: f32,
    pub s: f32,
    pub v: f32,
}

pub fn rgb_to_hsv(r: u8, g: u8, b: u8) -> Hsv {
    let (rf, gf, bf) = (r as f32, g as f32, b as f32);
    let max = rf.max(gf).max(bf);
    let min = rf.min(gf).min(bf);
    let delta = max - min;

    let s = if max > 0.0 { delta / max * CHANNEL_MAX } else { 0.0 };

    let degrees = if delta == 0.0 {
        0.0
    } else if max == rf {
        60.0 * (gf - bf) / delta
    } else if max == gf {
        120.0 + 60.0 * (bf - rf) / delta
    } else {
        240.0 + 60.0 * (rf - gf) / delta
    };
    let degrees = if degrees < 0.0 { degrees + 360.0 } else { degrees };

    Hsv {
        h: (degrees / 2.0) % HUE_RANGE,
        s,
        v: max,
    }
}

pub fn hsv_to_rgb(hsv: Hsv) -> Rgb {
    let h = hsv.h.rem_euclid(HUE_RANGE) * 2.0;
    let s = (hsv.s / CHANNEL_MAX).clamp(0.0, 1.0);
    let v = (hsv.v / CHANNEL_MAX).clamp(0.0, 1.0);

    let c = v * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = v - c;

    let (r1, g1, b1) = match h {
        h if h < 60.0 => (c, x, 0.0),
        h if h < 120.0 => (x, c, 0.0),
        h if h < 180.0 => (0.0, c, x),
        h if h < 240.0 => (0.0, x, c),
        h if h < 300.0 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    let channel = |value: f32| ((value + m) * CHANNEL_MAX).round().clamp(0.0, 255.0) as u8;
    Rgb::new(channel(r1), channel(g1), channel(b1))
}

/// Circular distance on the 0..180 hue wheel.
pub fn hue_distance(h1: f32, h2: f32) -> f32 {
    let d = (h1 - h2).abs() % HUE_RANGE;
    d.min(HUE_RANGE - d)
}

/// Mean of hues via unit vectors. `None` for an empty input or when the
/// vectors cancel out exactly.
pub fn circular_mean_hue<I>(hues: I) -> Option<f32>
where
    I: IntoIterator<Item = f32>,
{
    let mut sum_cos = 0.0f64;
    let mut sum_sin = 0.0f64;
    let mut count = 0usize;

    for hue in hues {
        let angle = hue as f64 / HUE_RANGE as f64 * std::f64::consts::TAU;
        sum_cos += angle.cos();
        sum_sin += angle.sin();
        count += 1;
    }

    if count == 0 || (sum_cos.abs() < 1e-9 && sum_sin.abs() < 1e-9) {
        return None;
    }

    let mean = sum_sin.atan2(sum_cos).rem_euclid(std::f64::consts::TAU);
    Some((mean / std::f64::consts::TAU * HUE_RANGE as f64) as f32 % HUE_RANGE)
}
