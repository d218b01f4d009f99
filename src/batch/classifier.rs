use std::sync::Arc;

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::calibration::CalibrationStore;
use crate::error::{AttributionError, Result};
use crate::models::{Attribution, AttributionUpdate, MoveId, Player};
use crate::vision::{observe_foreground, VisionProvider};

use super::balance::enforce_ratio;
use super::config::{BatchConfig, MaskMode};
use super::features::{mean_color, BatchSample, FeatureSample, FrameSource, SkipReason, SkippedFrame};
use super::kmeans::{distance, kmeans, Point};
use super::mapping::{map_clusters, MappingSource};

const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

/// One cluster of a single run. Never persisted.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
    pub centroid: Point,
    pub member_move_ids: Vec<MoveId>,
    pub assigned_player: Player,
    pub mapped_by: MappingSource,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleAssignment {
    pub move_id: MoveId,
    pub cluster: usize,
    pub player: Player,
    pub confidence: f64,
    /// Moved by the ratio constraint rather than by distance.
    pub rebalanced: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchOutcome {
    pub assignments: Vec<SampleAssignment>,
    pub clusters: Vec<Cluster>,
    pub skipped: Vec<SkippedFrame>,
    pub iterations: usize,
    pub converged: bool,
}

impl BatchOutcome {
    pub fn rebalanced_count(&self) -> usize {
        self.assignments.iter().filter(|a| a.rebalanced).count()
    }

    pub fn cluster_for(&self, player: Player) -> Option<&Cluster> {
        self.clusters.iter().find(|c| c.assigned_player == player)
    }

    /// Write-back rows for every classified sample.
    pub fn updates(&self) -> Vec<AttributionUpdate> {
        self.assignments
            .iter()
            .map(|a| AttributionUpdate {
                move_id: a.move_id.clone(),
                player: Attribution::from(a.player),
                confidence: a.confidence,
            })
            .collect()
    }
}

/// Post-session reclassification over all captured frames at once.
pub struct OfflineBatchClassifier {
    config: BatchConfig,
    calibration: Arc<dyn CalibrationStore>,
    provider: Option<Arc<dyn VisionProvider>>,
}

impl OfflineBatchClassifier {
    pub fn new(
        config: BatchConfig,
        calibration: Arc<dyn CalibrationStore>,
        provider: Option<Arc<dyn VisionProvider>>,
    ) -> Self {
        Self {
            config,
            calibration,
            provider,
        }
    }

    /// Extract features frame by frame, then cluster. Cancellation is checked
    /// between frames; nothing is written anywhere until the caller applies
    /// the returned outcome.
    pub async fn run(&self, samples: Vec<BatchSample>, cancel: &CancellationToken) -> Result<BatchOutcome> {
        let total = samples.len();
        let mut features = Vec::with_capacity(total);
        let mut skipped = Vec::new();

        for sample in samples {
            if cancel.is_cancelled() {
                log_info!("offline run cancelled after {} of {} frame(s)", features.len() + skipped.len(), total);
                return Err(AttributionError::Cancelled);
            }

            let move_id = sample.move_id.clone();
            let provider = self.provider.clone();
            let config = self.config.clone();
            let extracted = tokio::task::spawn_blocking(move || extract_feature(sample, provider.as_deref(), &config))
                .await
                .unwrap_or_else(|err| Err(SkipReason::WorkerFailed(err.to_string())));

            match extracted {
                Ok(feature) => features.push(feature),
                Err(reason) => {
                    log_warn!("skipping frame for move {move_id}: {reason:?}");
                    skipped.push(SkippedFrame { move_id, reason });
                }
            }
        }

        let mut outcome = self.classify_features(&features)?;
        outcome.skipped = skipped;
        Ok(outcome)
    }

    /// Cluster ready-made features. Fewer than two aborts the run.
    pub fn classify_features(&self, samples: &[FeatureSample]) -> Result<BatchOutcome> {
        if samples.len() < 2 {
            return Err(AttributionError::InsufficientEvidence(format!(
                "{} usable frame(s); clustering needs at least 2",
                samples.len()
            )));
        }

        let points: Vec<Point> = samples.iter().map(|s| s.feature).collect();
        let k = 2.min(points.len());
        let result = kmeans(&points, k, self.config.max_iterations, self.config.reseed)?;
        let centroids = result.centroids.clone();

        let distances: Vec<[f64; 2]> = points
            .iter()
            .map(|p| [distance(p, &centroids[0]), distance(p, &centroids[1])])
            .collect();

        let members: Vec<Vec<usize>> = (0..k).map(|c| result.members(c).collect()).collect();
        let calibration = self.calibration.snapshot();
        let mapping = map_clusters(&centroids, &members, samples, &calibration);

        let mut assignments = result.assignments.clone();
        let moved = enforce_ratio(
            &mut assignments,
            &distances,
            self.config.min_cluster_ratio,
            self.config.max_cluster_ratio,
        );
        if !moved.is_empty() {
            log_info!("ratio constraint moved {} sample(s) to the smaller cluster", moved.len());
        }

        let eps = self.config.epsilon;
        let sample_assignments: Vec<SampleAssignment> = samples
            .iter()
            .enumerate()
            .map(|(i, sample)| {
                let cluster = assignments[i];
                let own = distances[i][cluster];
                let other = distances[i][1 - cluster];
                SampleAssignment {
                    move_id: sample.move_id.clone(),
                    cluster,
                    player: mapping[cluster].0,
                    confidence: (1.0 - own / (own + other + eps)).max(0.0),
                    rebalanced: moved.contains(&i),
                }
            })
            .collect();

        let clusters = (0..k)
            .map(|c| Cluster {
                centroid: centroids[c],
                member_move_ids: sample_assignments
                    .iter()
                    .filter(|a| a.cluster == c)
                    .map(|a| a.move_id.clone())
                    .collect(),
                assigned_player: mapping[c].0,
                mapped_by: mapping[c].1,
            })
            .collect();

        log_info!(
            "clustered {} frame(s) in {} iteration(s) (converged: {})",
            samples.len(),
            result.iterations,
            result.converged
        );

        Ok(BatchOutcome {
            assignments: sample_assignments,
            clusters,
            skipped: Vec::new(),
            iterations: result.iterations,
            converged: result.converged,
        })
    }
}

fn extract_feature(
    sample: BatchSample,
    provider: Option<&dyn VisionProvider>,
    config: &BatchConfig,
) -> std::result::Result<FeatureSample, SkipReason> {
    let (frame, mask) = match sample.source {
        FrameSource::Masked { frame, mask } => (frame, Some(mask)),
        FrameSource::Image(frame) => (frame, None),
        FrameSource::Path(path) => {
            let frame = image::open(&path)
                .map_err(|err| SkipReason::LoadFailed(format!("{}: {err}", path.display())))?
                .to_rgb8();
            (frame, None)
        }
    };

    let mask = match (config.mask_mode, mask) {
        (MaskMode::General, _) => None,
        (MaskMode::Segmented, Some(mask)) if mask.dimensions() == frame.dimensions() => Some(mask),
        (MaskMode::Segmented, Some(mask)) => return Err(SkipReason::MaskMismatch(mask.dimensions())),
        (MaskMode::Segmented, None) => {
            let provider = provider.ok_or(SkipReason::ProviderFailed)?;
            Some(observe_foreground(provider, &frame).ok_or(SkipReason::ProviderFailed)?)
        }
    };

    let (feature, pixel_count) =
        mean_color(&frame, mask.as_ref(), config.min_foreground_pixels).map_err(SkipReason::TooFewPixels)?;

    Ok(FeatureSample {
        move_id: sample.move_id,
        feature,
        existing_label: sample.existing_label,
        pixel_count,
    })
}
