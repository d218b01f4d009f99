//! Fan-in of several cameras onto per-camera classifier workers.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use image::RgbImage;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::calibration::CalibrationStore;
use crate::config::EngineConfig;
use crate::realtime::{MidlineConfig, RealTimeClassifier, RealtimeConfig};
use crate::status_log::StatusLog;
use crate::vision::VisionProvider;

use super::config::StreamConfig;
use super::worker::{camera_loop, FrameJob, FrameTag, TaggedDecision, WorkerMessage};

const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

struct CameraWorker {
    sender: mpsc::Sender<WorkerMessage>,
    next_sequence: u64,
    handle: JoinHandle<()>,
}

/// Each camera gets its own worker task and classifier, created on its
/// first frame. Replies carry the tag of the frame that produced them.
pub struct CameraRouter {
    calibration: Arc<dyn CalibrationStore>,
    provider: Arc<dyn VisionProvider>,
    realtime: RealtimeConfig,
    midline: MidlineConfig,
    queue_depth: usize,
    status_log: Option<Arc<StatusLog>>,
    cancel_token: CancellationToken,
    workers: HashMap<String, CameraWorker>,
}

impl CameraRouter {
    pub fn new(
        calibration: Arc<dyn CalibrationStore>,
        provider: Arc<dyn VisionProvider>,
        realtime: RealtimeConfig,
        midline: MidlineConfig,
        stream: &StreamConfig,
    ) -> Self {
        Self {
            calibration,
            provider,
            realtime,
            midline,
            queue_depth: stream.queue_depth.max(1),
            status_log: None,
            cancel_token: CancellationToken::new(),
            workers: HashMap::new(),
        }
    }

    /// Router for a full engine config, with the status trail opened when
    /// the config names a path.
    pub fn from_config(
        calibration: Arc<dyn CalibrationStore>,
        provider: Arc<dyn VisionProvider>,
        config: &EngineConfig,
    ) -> Result<Self> {
        let router = Self::new(
            calibration,
            provider,
            config.realtime.clone(),
            config.midline.clone(),
            &config.stream,
        );
        match &config.stream.status_log_path {
            Some(path) => {
                let log = StatusLog::open(path.clone(), config.stream.status_interval())?;
                Ok(router.with_status_log(Arc::new(log)))
            }
            None => Ok(router),
        }
    }

    pub fn with_status_log(mut self, log: Arc<StatusLog>) -> Self {
        self.status_log = Some(log);
        self
    }

    pub fn cameras(&self) -> impl Iterator<Item = &str> {
        self.workers.keys().map(String::as_str)
    }

    fn worker(&mut self, camera: &str) -> &mut CameraWorker {
        let calibration = &self.calibration;
        let provider = &self.provider;
        let realtime = &self.realtime;
        let midline = &self.midline;
        let status_log = &self.status_log;
        let cancel_token = &self.cancel_token;
        let queue_depth = self.queue_depth;

        self.workers.entry(camera.to_string()).or_insert_with(|| {
            let (sender, receiver) = mpsc::channel(queue_depth);
            let classifier = RealTimeClassifier::from_config(Arc::clone(calibration), realtime, midline);
            let handle = tokio::spawn(camera_loop(
                camera.to_string(),
                classifier,
                Arc::clone(provider),
                status_log.clone(),
                receiver,
                cancel_token.child_token(),
            ));
            log_info!("camera {camera} worker started");
            CameraWorker {
                sender,
                next_sequence: 0,
                handle,
            }
        })
    }

    /// Queue a frame. Waits while the camera's queue is full, which is the
    /// backpressure a live feed sees when classification falls behind.
    pub async fn submit(&mut self, camera: &str, frame: RgbImage) -> Result<oneshot::Receiver<TaggedDecision>> {
        let worker = self.worker(camera);
        let tag = FrameTag {
            camera: camera.to_string(),
            sequence: worker.next_sequence,
        };
        worker.next_sequence += 1;

        let (reply, receiver) = oneshot::channel();
        worker
            .sender
            .send(WorkerMessage::Frame(FrameJob { tag, frame, reply }))
            .await
            .map_err(|_| anyhow!("camera {camera} worker has stopped"))?;
        Ok(receiver)
    }

    pub async fn classify(&mut self, camera: &str, frame: RgbImage) -> Result<TaggedDecision> {
        let receiver = self.submit(camera, frame).await?;
        receiver
            .await
            .with_context(|| format!("camera {camera} worker dropped the frame"))
    }

    /// New session for one camera: its midline starts over.
    pub async fn reset_camera(&mut self, camera: &str) -> Result<()> {
        match self.workers.get(camera) {
            Some(worker) => worker
                .sender
                .send(WorkerMessage::Reset)
                .await
                .map_err(|_| anyhow!("camera {camera} worker has stopped")),
            None => Ok(()),
        }
    }

    pub async fn shutdown(mut self) -> Result<()> {
        self.cancel_token.cancel();
        let mut failures = 0usize;
        for (camera, worker) in self.workers.drain() {
            drop(worker.sender);
            if let Err(err) = worker.handle.await {
                log_warn!("camera {camera} worker failed to join: {err}");
                failures += 1;
            }
        }
        if failures > 0 {
            return Err(anyhow!("{failures} camera worker(s) failed to join"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::{ColorProfile, MemoryCalibrationStore};
    use crate::models::{Attribution, HandObservation, Vec2};
    use image::{GrayImage, Luma, Rgb};
    use std::time::Duration;

    const RED: Rgb<u8> = Rgb([235, 15, 15]);
    const GREEN: Rgb<u8> = Rgb([15, 235, 15]);

    /// One centred hand per frame; red frames are slow to process.
    struct CentredHand;

    impl VisionProvider for CentredHand {
        fn detect_hands(&self, frame: &RgbImage) -> anyhow::Result<Vec<HandObservation>> {
            if *frame.get_pixel(0, 0) == RED {
                std::thread::sleep(Duration::from_millis(30));
            }
            Ok(vec![HandObservation::new(Vec2::new(0.5, 0.5), Vec2::new(0.0, -0.1))])
        }

        fn segment_foreground(&self, frame: &RgbImage) -> anyhow::Result<GrayImage> {
            Ok(GrayImage::from_pixel(frame.width(), frame.height(), Luma([255])))
        }
    }

    fn router() -> CameraRouter {
        let store = MemoryCalibrationStore::with_profiles(
            Some(ColorProfile::new(0.0, 230.0, 230.0)),
            Some(ColorProfile::new(60.0, 230.0, 230.0)),
        );
        CameraRouter::new(
            Arc::new(store),
            Arc::new(CentredHand),
            RealtimeConfig::default(),
            MidlineConfig::default(),
            &StreamConfig::default(),
        )
    }

    #[tokio::test]
    async fn replies_route_back_to_their_camera() {
        let mut router = router();
        let mut pending = Vec::new();
        for _ in 0..3 {
            pending.push(router.submit("left", RgbImage::from_pixel(120, 120, RED)).await.unwrap());
            pending.push(router.submit("right", RgbImage::from_pixel(120, 120, GREEN)).await.unwrap());
        }

        let mut left_sequences = Vec::new();
        let mut right_sequences = Vec::new();
        for receiver in pending {
            let reply = receiver.await.unwrap();
            match reply.tag.camera.as_str() {
                "left" => {
                    assert_eq!(reply.decision.attribution, Attribution::PlayerA);
                    left_sequences.push(reply.tag.sequence);
                }
                "right" => {
                    assert_eq!(reply.decision.attribution, Attribution::PlayerB);
                    right_sequences.push(reply.tag.sequence);
                }
                other => panic!("unexpected camera {other}"),
            }
        }
        assert_eq!(left_sequences, vec![0, 1, 2]);
        assert_eq!(right_sequences, vec![0, 1, 2]);

        let mut cameras: Vec<_> = router.cameras().map(str::to_string).collect();
        cameras.sort();
        assert_eq!(cameras, vec!["left", "right"]);
        router.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn status_log_from_config_records_decisions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("status.jsonl");
        let mut config = EngineConfig::default();
        config.stream.status_log_path = Some(path.clone());
        config.stream.status_interval_ms = 60_000;

        let store = MemoryCalibrationStore::with_profiles(
            Some(ColorProfile::new(0.0, 230.0, 230.0)),
            Some(ColorProfile::new(60.0, 230.0, 230.0)),
        );
        let mut router = CameraRouter::from_config(Arc::new(store), Arc::new(CentredHand), &config).unwrap();
        for _ in 0..3 {
            router.classify("cam", RgbImage::from_pixel(60, 60, GREEN)).await.unwrap();
        }
        router.shutdown().await.unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 1);
        assert!(contents.contains("\"PlayerB\""));
    }

    #[tokio::test]
    async fn classify_waits_for_its_own_frame() {
        let mut router = router();
        let reply = router
            .classify("only", RgbImage::from_pixel(120, 120, GREEN))
            .await
            .unwrap();
        assert_eq!(reply.tag, FrameTag { camera: "only".into(), sequence: 0 });
        assert_eq!(reply.decision.attribution, Attribution::PlayerB);

        router.reset_camera("only").await.unwrap();
        router.reset_camera("never-seen").await.unwrap();
        router.shutdown().await.unwrap();
    }
}
