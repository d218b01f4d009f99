use std::sync::{Arc, Mutex};

use image::RgbImage;
use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use crate::realtime::{FrameDecision, RealTimeClassifier};
use crate::status_log::StatusLog;
use crate::vision::VisionProvider;

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_info};

/// Identifies which camera produced a frame and where it sits in that
/// camera's sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct FrameTag {
    pub camera: String,
    pub sequence: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TaggedDecision {
    pub tag: FrameTag,
    pub decision: FrameDecision,
}

pub(super) struct FrameJob {
    pub tag: FrameTag,
    pub frame: RgbImage,
    pub reply: oneshot::Sender<TaggedDecision>,
}

pub(super) enum WorkerMessage {
    Frame(FrameJob),
    Reset,
}

/// Serves one camera. Frames are classified strictly one after another, so
/// the camera's midline and calibration reads never interleave with another
/// frame from the same camera.
pub(super) async fn camera_loop(
    camera: String,
    classifier: RealTimeClassifier,
    provider: Arc<dyn VisionProvider>,
    status_log: Option<Arc<StatusLog>>,
    mut receiver: mpsc::Receiver<WorkerMessage>,
    cancel_token: CancellationToken,
) {
    let classifier = Arc::new(Mutex::new(classifier));

    loop {
        tokio::select! {
            biased;
            _ = cancel_token.cancelled() => {
                log_info!("camera {camera} worker shutting down");
                break;
            }
            message = receiver.recv() => {
                match message {
                    Some(WorkerMessage::Frame(job)) => {
                        let decision = classify_blocking(&classifier, &provider, job.frame).await;
                        if let Some(log) = &status_log {
                            log.record(&camera, &decision);
                        }
                        let reply = TaggedDecision { tag: job.tag, decision };
                        if job.reply.send(reply).is_err() {
                            log_debug!("camera {camera}: caller dropped before receiving decision");
                        }
                    }
                    Some(WorkerMessage::Reset) => {
                        lock(&classifier).reset();
                        log_info!("camera {camera} classifier reset");
                    }
                    None => {
                        log_debug!("camera {camera} channel closed");
                        break;
                    }
                }
            }
        }
    }
}

fn lock(classifier: &Mutex<RealTimeClassifier>) -> std::sync::MutexGuard<'_, RealTimeClassifier> {
    match classifier.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

async fn classify_blocking(
    classifier: &Arc<Mutex<RealTimeClassifier>>,
    provider: &Arc<dyn VisionProvider>,
    frame: RgbImage,
) -> FrameDecision {
    let classifier = Arc::clone(classifier);
    let provider = Arc::clone(provider);

    match tokio::task::spawn_blocking(move || lock(&classifier).classify_frame(provider.as_ref(), &frame)).await {
        Ok(decision) => decision,
        Err(err) => {
            log_error!("classification worker failed: {err}");
            FrameDecision::none()
        }
    }
}
