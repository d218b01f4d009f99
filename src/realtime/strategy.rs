//! The three classifier variants behind one interface.

use image::RgbImage;
use serde::Serialize;

use crate::calibration::CalibrationSnapshot;
use crate::color::Rgb;
use crate::models::{Attribution, HandObservation};
use crate::region::Roi;

use super::config::{HandSelection, MidlineConfig, RealtimeConfig, StrategyKind};
use super::midline::{attribution_for_score, score_hand, MidlineState};
use super::scoring::{HueBoxScorer, PixelScorer, WeightedHsvScorer};
use super::voting::{tally, NoiseFloor};

/// Spatial verdict for one hand.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HandAssignment {
    pub hand_index: usize,
    pub score: i32,
    pub attribution: Attribution,
}

/// Per-frame result, always one of PlayerA / PlayerB / None.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameDecision {
    pub attribution: Attribution,
    pub confidence: f64,
    pub percent_a: f64,
    pub percent_b: f64,
    pub reference_hand: Option<usize>,
    pub hands: Vec<HandAssignment>,
}

impl FrameDecision {
    pub fn none() -> Self {
        Self {
            attribution: Attribution::None,
            confidence: 0.0,
            percent_a: 0.0,
            percent_b: 0.0,
            reference_hand: None,
            hands: Vec::new(),
        }
    }
}

pub trait RealTimeClassifierStrategy: Send {
    fn classify(
        &mut self,
        frame: &RgbImage,
        hands: &[HandObservation],
        calibration: &CalibrationSnapshot,
    ) -> FrameDecision;

    /// Forget per-session state.
    fn reset(&mut self) {}
}

pub fn select_reference_hand(hands: &[HandObservation], selection: HandSelection) -> Option<usize> {
    match selection {
        HandSelection::First => (!hands.is_empty()).then_some(0),
        HandSelection::Highest => hands
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| a.wrist_position.y.total_cmp(&b.wrist_position.y))
            .map(|(i, _)| i),
    }
}

/// Color voting in a square around the reference wrist.
pub struct ColorVoteStrategy {
    config: RealtimeConfig,
    scorer: Box<dyn PixelScorer>,
}

impl ColorVoteStrategy {
    pub fn new(config: RealtimeConfig, scorer: Box<dyn PixelScorer>) -> Self {
        Self { config, scorer }
    }

    pub fn weighted(config: RealtimeConfig) -> Self {
        let scorer = Box::new(WeightedHsvScorer::from_config(&config));
        Self::new(config, scorer)
    }

    pub fn hue_only(config: RealtimeConfig) -> Self {
        Self::new(config, Box::new(HueBoxScorer))
    }

    /// Vote over an already-extracted region.
    pub fn classify_pixels<I>(&self, pixels: I, calibration: &CalibrationSnapshot) -> FrameDecision
    where
        I: IntoIterator<Item = Rgb>,
    {
        if let Some(decision) = self.calibration_shortcut(calibration) {
            return decision;
        }
        let Some((profile_a, profile_b)) = calibration.pair() else {
            return FrameDecision::none();
        };

        let floor = NoiseFloor {
            min_saturation: self.config.min_saturation,
            min_value: self.config.min_value,
        };
        let votes = tally(pixels, profile_a, profile_b, self.scorer.as_ref(), floor);
        let (attribution, confidence) = votes.decide(self.config.sensitivity, self.config.min_pixels);

        FrameDecision {
            attribution,
            confidence,
            percent_a: votes.percent_a(),
            percent_b: votes.percent_b(),
            reference_hand: None,
            hands: Vec::new(),
        }
    }

    /// Neither profile: None. Exactly one: that player, no voting.
    fn calibration_shortcut(&self, calibration: &CalibrationSnapshot) -> Option<FrameDecision> {
        if calibration.is_empty() {
            return Some(FrameDecision::none());
        }
        calibration.sole_player().map(|player| FrameDecision {
            attribution: Attribution::from(player),
            confidence: self.config.unary_confidence,
            ..FrameDecision::none()
        })
    }
}

impl RealTimeClassifierStrategy for ColorVoteStrategy {
    fn classify(
        &mut self,
        frame: &RgbImage,
        hands: &[HandObservation],
        calibration: &CalibrationSnapshot,
    ) -> FrameDecision {
        let reference = select_reference_hand(hands, self.config.hand_selection);

        if let Some(mut decision) = self.calibration_shortcut(calibration) {
            decision.reference_hand = reference;
            return decision;
        }

        let Some(index) = reference else {
            return FrameDecision::none();
        };

        let (w, h) = frame.dimensions();
        let (cx, cy) = hands[index].wrist_pixel(w, h);
        let Some(roi) = Roi::centered(cx, cy, self.config.roi_size, w, h) else {
            return FrameDecision {
                reference_hand: Some(index),
                ..FrameDecision::none()
            };
        };

        let mut decision = self.classify_pixels(roi.pixels(frame, self.config.pixel_stride), calibration);
        decision.reference_hand = Some(index);
        decision
    }
}

/// Side-of-table plus pointing direction. Ignores color entirely.
pub struct SpatialStrategy {
    config: MidlineConfig,
    selection: HandSelection,
    midline: MidlineState,
}

impl SpatialStrategy {
    pub fn new(config: MidlineConfig, selection: HandSelection) -> Self {
        let midline = MidlineState::from_config(&config);
        Self {
            config,
            selection,
            midline,
        }
    }

    pub fn midline(&self) -> MidlineState {
        self.midline
    }
}

impl RealTimeClassifierStrategy for SpatialStrategy {
    fn classify(
        &mut self,
        _frame: &RgbImage,
        hands: &[HandObservation],
        _calibration: &CalibrationSnapshot,
    ) -> FrameDecision {
        let Some(midline) = self.midline.observe(hands, self.config.point_threshold) else {
            return FrameDecision::none();
        };

        let assignments: Vec<HandAssignment> = hands
            .iter()
            .enumerate()
            .map(|(hand_index, hand)| {
                let score = score_hand(hand, midline, &self.config);
                HandAssignment {
                    hand_index,
                    score,
                    attribution: attribution_for_score(score, &self.config),
                }
            })
            .collect();

        let total = assignments.len() as f64;
        let count = |target: Attribution| {
            assignments.iter().filter(|a| a.attribution == target).count() as f64 / total
        };
        let percent_a = count(Attribution::PlayerA);
        let percent_b = count(Attribution::PlayerB);

        let reference = select_reference_hand(hands, self.selection);
        let (attribution, confidence) = reference
            .map(|i| {
                let a = &assignments[i];
                let max = self.config.max_score().max(1) as f64;
                (a.attribution, (a.score.abs() as f64 / max).min(1.0))
            })
            .unwrap_or((Attribution::None, 0.0));

        FrameDecision {
            attribution,
            confidence,
            percent_a,
            percent_b,
            reference_hand: reference,
            hands: assignments,
        }
    }

    fn reset(&mut self) {
        self.midline = MidlineState::from_config(&self.config);
    }
}

pub fn build_strategy(
    realtime: &RealtimeConfig,
    midline: &MidlineConfig,
) -> Box<dyn RealTimeClassifierStrategy> {
    match realtime.strategy {
        StrategyKind::WeightedHsv => Box::new(ColorVoteStrategy::weighted(realtime.clone())),
        StrategyKind::HueOnly => Box::new(ColorVoteStrategy::hue_only(realtime.clone())),
        StrategyKind::Spatial => Box::new(SpatialStrategy::new(midline.clone(), realtime.hand_selection)),
    }
}
