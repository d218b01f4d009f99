//! Attributes moves in a two-player block game to Player A or Player B from
//! camera evidence: a live per-frame classifier, an offline k-means pass over
//! a finished session, and a review queue for whatever both leave uncertain.

pub mod batch;
pub mod calibration;
pub mod color;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod persistence;
pub mod realtime;
pub mod region;
pub mod review;
pub mod status_log;
pub mod stream;
pub mod utils;
pub mod vision;

pub use batch::{BatchOutcome, OfflineBatchClassifier};
pub use calibration::{CalibrationStore, ColorProfile, FileCalibrationStore, MemoryCalibrationStore};
pub use config::EngineConfig;
pub use db::Database;
pub use error::{AttributionError, Result};
pub use models::{ActionRecord, Attribution, HandObservation, Player, ReviewDecision};
pub use persistence::PlayerStore;
pub use realtime::{FrameDecision, RealTimeClassifier};
pub use review::ReviewQueue;
pub use stream::CameraRouter;
pub use vision::{ScopedProvider, VisionProvider};

/// Install the process-wide logger. `RUST_LOG` overrides the Info default.
pub fn init_logging() {
    let _ = env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .try_init();
}
