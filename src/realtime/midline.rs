//! Spatial attribution: which side of a smoothed midline a hand is on, and
//! which way it points.

use serde::{Deserialize, Serialize};

use crate::models::{Attribution, HandObservation};

use super::config::MidlineConfig;

/// EMA of the horizontal boundary between the two seats. One per session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MidlineState {
    pub position: f32,
    pub alpha: f32,
}

impl MidlineState {
    pub fn new(position: f32, alpha: f32) -> Self {
        Self {
            position,
            alpha: alpha.clamp(0.0, 1.0),
        }
    }

    pub fn from_config(config: &MidlineConfig) -> Self {
        Self::new(config.initial_position, config.alpha)
    }

    /// Midline to use for this frame.
    ///
    /// Only hands whose side and pointing agree (left pointing right, right
    /// pointing left) move the EMA. With none of those, the plain mean of all
    /// wrists is used for this frame and the EMA is left untouched.
    pub fn observe(&mut self, hands: &[HandObservation], point_threshold: f32) -> Option<f32> {
        if hands.is_empty() {
            return None;
        }

        let behaving: Vec<f32> = hands
            .iter()
            .filter(|h| self.is_behaving(h, point_threshold))
            .map(|h| h.wrist_position.x)
            .collect();

        if behaving.is_empty() {
            let mean = hands.iter().map(|h| h.wrist_position.x).sum::<f32>() / hands.len() as f32;
            return Some(mean);
        }

        let target = behaving.iter().sum::<f32>() / behaving.len() as f32;
        self.position = self.alpha * target + (1.0 - self.alpha) * self.position;
        Some(self.position)
    }

    fn is_behaving(&self, hand: &HandObservation, point_threshold: f32) -> bool {
        let x = hand.wrist_position.x;
        let px = hand.pointing_vector.x;
        (x < self.position && px > point_threshold) || (x > self.position && px < -point_threshold)
    }
}

/// Signed score; positive favours the left seat.
pub fn score_hand(hand: &HandObservation, midline: f32, config: &MidlineConfig) -> i32 {
    let x = hand.wrist_position.x;
    let px = hand.pointing_vector.x;
    let mut score = if x < midline {
        config.side_score
    } else {
        -config.side_score
    };

    let pointing_right = px > config.point_threshold;
    let pointing_left = px < -config.point_threshold;
    if pointing_right {
        score += config.point_score;
    } else if pointing_left {
        score -= config.point_score;
    }

    // An arm reaching all the way across still points away from its own seat.
    if x > 1.0 - config.deep_zone && pointing_right {
        score += config.deep_reach_score;
    } else if x < config.deep_zone && pointing_left {
        score -= config.deep_reach_score;
    }

    score
}

pub fn attribution_for_score(score: i32, config: &MidlineConfig) -> Attribution {
    match score {
        s if s > 0 => Attribution::from(config.left_player),
        s if s < 0 => Attribution::from(config.left_player.other()),
        _ => Attribution::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Player, Vec2};

    fn hand(x: f32, point_x: f32) -> HandObservation {
        HandObservation::new(Vec2::new(x, 0.5), Vec2::new(point_x, 0.0))
    }

    #[test]
    fn behaving_hands_pull_the_midline() {
        let mut state = MidlineState::new(0.5, 0.5);
        let m = state.observe(&[hand(0.3, 0.2), hand(0.5001, 0.0)], 0.05).unwrap();
        // only the left hand qualifies: 0.5 * 0.3 + 0.5 * 0.5
        assert!((m - 0.4).abs() < 1e-6);
        assert!((state.position - 0.4).abs() < 1e-6);
    }

    #[test]
    fn crossing_hands_do_not_bias_the_ema() {
        let mut state = MidlineState::new(0.5, 0.5);
        // left of midline but pointing left, right of midline pointing right
        let m = state.observe(&[hand(0.2, -0.3), hand(0.9, 0.3)], 0.05).unwrap();
        assert!((m - 0.55).abs() < 1e-6);
        assert_eq!(state.position, 0.5);
        assert!(state.observe(&[], 0.05).is_none());
    }

    #[test]
    fn side_and_pointing_agree() {
        let cfg = MidlineConfig::default();
        assert_eq!(score_hand(&hand(0.4, 0.2), 0.5, &cfg), 3);
        assert_eq!(score_hand(&hand(0.6, -0.2), 0.5, &cfg), -3);
        assert_eq!(score_hand(&hand(0.45, 0.0), 0.5, &cfg), 1);
        assert_eq!(attribution_for_score(3, &cfg), Attribution::PlayerA);
        assert_eq!(attribution_for_score(-1, &cfg), Attribution::PlayerB);
        assert_eq!(attribution_for_score(0, &cfg), Attribution::None);
    }

    #[test]
    fn deep_reach_keeps_its_home_side() {
        let cfg = MidlineConfig::default();
        // left player's hand deep in the right third, still pointing right
        let score = score_hand(&hand(0.85, 0.3), 0.5, &cfg);
        assert_eq!(score, -1 + 2 + 4);
        assert_eq!(attribution_for_score(score, &cfg), Attribution::PlayerA);

        let cfg = MidlineConfig {
            left_player: Player::B,
            ..MidlineConfig::default()
        };
        let score = score_hand(&hand(0.1, -0.3), 0.5, &cfg);
        assert_eq!(attribution_for_score(score, &cfg), Attribution::PlayerA);
    }
}
