use std::sync::Arc;

use image::RgbImage;

use crate::calibration::CalibrationStore;
use crate::models::HandObservation;
use crate::vision::{observe_hands, VisionProvider};

use super::config::{MidlineConfig, RealtimeConfig};
use super::strategy::{build_strategy, FrameDecision, RealTimeClassifierStrategy};

const ENABLE_LOGS: bool = true;

use crate::log_debug;

/// Live per-stream classifier. Owns its strategy state (the midline, for the
/// spatial mode); reads calibration once per frame.
pub struct RealTimeClassifier {
    calibration: Arc<dyn CalibrationStore>,
    strategy: Box<dyn RealTimeClassifierStrategy>,
    frames_seen: u64,
}

impl RealTimeClassifier {
    pub fn new(calibration: Arc<dyn CalibrationStore>, strategy: Box<dyn RealTimeClassifierStrategy>) -> Self {
        Self {
            calibration,
            strategy,
            frames_seen: 0,
        }
    }

    pub fn from_config(
        calibration: Arc<dyn CalibrationStore>,
        realtime: &RealtimeConfig,
        midline: &MidlineConfig,
    ) -> Self {
        Self::new(calibration, build_strategy(realtime, midline))
    }

    pub fn classify(&mut self, frame: &RgbImage, hands: &[HandObservation]) -> FrameDecision {
        let snapshot = self.calibration.snapshot();
        let decision = self.strategy.classify(frame, hands, &snapshot);
        self.frames_seen += 1;

        log_debug!(
            "frame {}: {} hand(s) -> {} (confidence {:.2}, A {:.2} / B {:.2})",
            self.frames_seen,
            hands.len(),
            decision.attribution.as_str(),
            decision.confidence,
            decision.percent_a,
            decision.percent_b
        );

        decision
    }

    /// Detect hands with `provider`, then classify. A failing provider yields
    /// a frame without hands.
    pub fn classify_frame<P: VisionProvider + ?Sized>(&mut self, provider: &P, frame: &RgbImage) -> FrameDecision {
        let hands = observe_hands(provider, frame);
        self.classify(frame, &hands)
    }

    /// New session: drop smoothing state.
    pub fn reset(&mut self) {
        self.frames_seen = 0;
        self.strategy.reset();
    }

    pub fn frames_seen(&self) -> u64 {
        self.frames_seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::{ColorProfile, MemoryCalibrationStore};
    use crate::models::{Attribution, Player, Vec2};
    use crate::realtime::config::StrategyKind;
    use image::Rgb as Px;

    const RED: Px<u8> = Px([235, 15, 15]);
    const GREEN: Px<u8> = Px([15, 235, 15]);

    fn centre_hand() -> Vec<HandObservation> {
        vec![HandObservation::new(Vec2::new(0.5, 0.5), Vec2::new(0.0, -0.1))]
    }

    fn classifier(store: MemoryCalibrationStore, strategy: StrategyKind) -> RealTimeClassifier {
        let realtime = RealtimeConfig {
            strategy,
            ..RealtimeConfig::default()
        };
        RealTimeClassifier::from_config(Arc::new(store), &realtime, &MidlineConfig::default())
    }

    fn two_profiles() -> MemoryCalibrationStore {
        MemoryCalibrationStore::with_profiles(
            Some(ColorProfile::new(0.0, 230.0, 230.0)),
            Some(ColorProfile::new(60.0, 230.0, 230.0)),
        )
    }

    #[test]
    fn uniform_first_color_is_player_a() {
        let frame = RgbImage::from_pixel(200, 200, RED);
        for kind in [StrategyKind::WeightedHsv, StrategyKind::HueOnly] {
            let mut clf = classifier(two_profiles(), kind);
            let decision = clf.classify(&frame, &centre_hand());
            assert_eq!(decision.attribution, Attribution::PlayerA, "{kind:?}");
            assert!(decision.percent_a > 0.99);
            assert_eq!(decision.reference_hand, Some(0));
        }
    }

    #[test]
    fn second_color_is_player_b() {
        let frame = RgbImage::from_pixel(200, 200, GREEN);
        let mut clf = classifier(two_profiles(), StrategyKind::WeightedHsv);
        let decision = clf.classify(&frame, &centre_hand());
        assert_eq!(decision.attribution, Attribution::PlayerB);
        assert!(decision.confidence > 0.6);
    }

    #[test]
    fn one_profile_collapses_to_that_player() {
        let store = MemoryCalibrationStore::with_profiles(Some(ColorProfile::new(0.0, 230.0, 230.0)), None);
        let mut clf = classifier(store, StrategyKind::WeightedHsv);
        let frame = RgbImage::from_pixel(100, 100, RED);
        assert_eq!(clf.classify(&frame, &centre_hand()).attribution, Attribution::PlayerA);
        assert_eq!(clf.classify(&frame, &[]).attribution, Attribution::PlayerA);
    }

    #[test]
    fn no_profiles_is_always_none() {
        let mut clf = classifier(MemoryCalibrationStore::new(), StrategyKind::WeightedHsv);
        for px in [RED, GREEN] {
            let frame = RgbImage::from_pixel(100, 100, px);
            let decision = clf.classify(&frame, &centre_hand());
            assert_eq!(decision.attribution, Attribution::None);
            assert_eq!(decision.confidence, 0.0);
        }
    }

    #[test]
    fn no_hand_means_no_evidence() {
        let mut clf = classifier(two_profiles(), StrategyKind::WeightedHsv);
        let frame = RgbImage::from_pixel(100, 100, RED);
        assert_eq!(clf.classify(&frame, &[]).attribution, Attribution::None);
    }

    #[test]
    fn samples_around_the_highest_wrist() {
        // left half red, right half green; the higher hand is on the right
        let frame = RgbImage::from_fn(200, 100, |x, _| if x < 100 { RED } else { GREEN });
        let hands = vec![
            HandObservation::new(Vec2::new(0.25, 0.8), Vec2::default()),
            HandObservation::new(Vec2::new(0.75, 0.3), Vec2::default()),
        ];
        let mut clf = classifier(two_profiles(), StrategyKind::WeightedHsv);
        let decision = clf.classify(&frame, &hands);
        assert_eq!(decision.reference_hand, Some(1));
        assert_eq!(decision.attribution, Attribution::PlayerB);
    }

    #[test]
    fn profile_change_between_frames_is_picked_up() {
        let store = Arc::new(two_profiles());
        let mut clf = RealTimeClassifier::from_config(
            store.clone(),
            &RealtimeConfig::default(),
            &MidlineConfig::default(),
        );
        let frame = RgbImage::from_pixel(100, 100, RED);
        assert_eq!(clf.classify(&frame, &centre_hand()).attribution, Attribution::PlayerA);

        store.set(Player::A, ColorProfile::new(60.0, 230.0, 230.0)).unwrap();
        store.set(Player::B, ColorProfile::new(0.0, 230.0, 230.0)).unwrap();
        assert_eq!(clf.classify(&frame, &centre_hand()).attribution, Attribution::PlayerB);
        assert_eq!(clf.frames_seen(), 2);
    }

    #[test]
    fn spatial_mode_assigns_each_hand() {
        let mut clf = classifier(MemoryCalibrationStore::new(), StrategyKind::Spatial);
        let frame = RgbImage::new(10, 10);
        let hands = vec![
            HandObservation::new(Vec2::new(0.3, 0.4), Vec2::new(0.2, 0.0)),
            HandObservation::new(Vec2::new(0.7, 0.6), Vec2::new(-0.2, 0.0)),
        ];
        let decision = clf.classify(&frame, &hands);
        assert_eq!(decision.hands.len(), 2);
        assert_eq!(decision.hands[0].attribution, Attribution::PlayerA);
        assert_eq!(decision.hands[1].attribution, Attribution::PlayerB);
        assert_eq!(decision.attribution, Attribution::PlayerA);
        assert!((decision.confidence - 3.0 / 7.0).abs() < 1e-9);
        assert_eq!(decision.percent_a, 0.5);

        clf.reset();
        assert_eq!(clf.frames_seen(), 0);
    }
}
