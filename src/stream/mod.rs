pub mod config;
pub mod router;
mod worker;

pub use config::StreamConfig;
pub use router::CameraRouter;
pub use worker::{FrameTag, TaggedDecision};
