//! Reliability-weighted color voting over a pixel region.

use crate::calibration::ColorProfile;
use crate::color::{Hsv, Rgb};
use crate::models::{Attribution, Player};

use super::scoring::PixelScorer;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseFloor {
    pub min_saturation: f32,
    pub min_value: f32,
}

impl NoiseFloor {
    fn admits(&self, px: &Hsv) -> bool {
        px.s >= self.min_saturation && px.v >= self.min_value
    }
}

/// Washed-out or dark pixels carry less color signal.
pub fn reliability(px: &Hsv) -> f64 {
    (px.s as f64 / 255.0) * (px.v as f64 / 255.0)
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct VoteTally {
    pub votes_a: f64,
    pub votes_b: f64,
    /// Reliability mass of every pixel above the noise floor, voting or not.
    pub considered: f64,
    pub considered_pixels: usize,
}

impl VoteTally {
    pub fn percent_a(&self) -> f64 {
        if self.considered > 0.0 {
            self.votes_a / self.considered
        } else {
            0.0
        }
    }

    pub fn percent_b(&self) -> f64 {
        if self.considered > 0.0 {
            self.votes_b / self.considered
        } else {
            0.0
        }
    }

    /// Commit only when the winner clears 50% plus `sensitivity`.
    pub fn decide(&self, sensitivity: f64, min_pixels: usize) -> (Attribution, f64) {
        if self.considered_pixels < min_pixels.max(1) {
            return (Attribution::None, 0.0);
        }

        let (a, b) = (self.percent_a(), self.percent_b());
        let bar = 0.5 + sensitivity;
        if a > b && a > bar {
            (Attribution::from(Player::A), a)
        } else if b > a && b > bar {
            (Attribution::from(Player::B), b)
        } else {
            (Attribution::None, a.max(b))
        }
    }
}

pub fn tally<I, S>(
    pixels: I,
    profile_a: &ColorProfile,
    profile_b: &ColorProfile,
    scorer: &S,
    floor: NoiseFloor,
) -> VoteTally
where
    I: IntoIterator<Item = Rgb>,
    S: PixelScorer + ?Sized,
{
    let mut tally = VoteTally::default();

    for px in pixels {
        let hsv = px.to_hsv();
        if !floor.admits(&hsv) {
            continue;
        }

        let weight = reliability(&hsv);
        tally.considered += weight;
        tally.considered_pixels += 1;

        match (scorer.distance(&hsv, profile_a), scorer.distance(&hsv, profile_b)) {
            (Some(da), Some(db)) if da < db => tally.votes_a += weight,
            (Some(da), Some(db)) if db < da => tally.votes_b += weight,
            (Some(_), None) => tally.votes_a += weight,
            (None, Some(_)) => tally.votes_b += weight,
            // equidistant or neutral for both
            _ => {}
        }
    }

    tally
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::realtime::config::RealtimeConfig;
    use crate::realtime::scoring::WeightedHsvScorer;

    fn floor() -> NoiseFloor {
        NoiseFloor {
            min_saturation: 60.0,
            min_value: 70.0,
        }
    }

    fn profiles() -> (ColorProfile, ColorProfile) {
        (
            ColorProfile::new(0.0, 230.0, 230.0),
            ColorProfile::new(90.0, 230.0, 230.0),
        )
    }

    #[test]
    fn uniform_first_color_votes_all_for_a() {
        let (a, b) = profiles();
        let scorer = WeightedHsvScorer::from_config(&RealtimeConfig::default());
        let pixels = vec![Rgb::new(240, 10, 10); 100];
        let t = tally(pixels, &a, &b, &scorer, floor());
        assert!((t.percent_a() - 1.0).abs() < 1e-9);
        assert_eq!(t.percent_b(), 0.0);
        assert_eq!(t.decide(0.1, 20).0, Attribution::PlayerA);
    }

    #[test]
    fn grey_pixels_are_below_the_noise_floor() {
        let (a, b) = profiles();
        let scorer = WeightedHsvScorer::from_config(&RealtimeConfig::default());
        let t = tally(vec![Rgb::new(120, 120, 120); 50], &a, &b, &scorer, floor());
        assert_eq!(t.considered_pixels, 0);
        assert_eq!(t.decide(0.1, 1), (Attribution::None, 0.0));
    }

    #[test]
    fn neutral_pixels_dilute_the_vote() {
        let (a, b) = profiles();
        let scorer = WeightedHsvScorer::from_config(&RealtimeConfig::default());
        // half red, half saturated purple-ish (hue ~150) far from both
        let mut pixels = vec![Rgb::new(240, 10, 10); 50];
        pixels.extend(vec![Rgb::new(130, 10, 240); 50]);
        let t = tally(pixels, &a, &b, &scorer, floor());
        assert!(t.percent_a() < 0.6);
        assert_eq!(t.decide(0.1, 20).0, Attribution::None);
    }

    #[test]
    fn margin_is_required_above_half() {
        let t = VoteTally {
            votes_a: 0.58,
            votes_b: 0.42,
            considered: 1.0,
            considered_pixels: 100,
        };
        assert_eq!(t.decide(0.1, 20).0, Attribution::None);
        assert_eq!(t.decide(0.05, 20).0, Attribution::PlayerA);
        assert_eq!(t.decide(0.05, 200).0, Attribution::None);
    }
}
