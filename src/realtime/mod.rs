pub mod classifier;
pub mod config;
pub mod midline;
pub mod scoring;
pub mod strategy;
pub mod voting;

pub use classifier::RealTimeClassifier;
pub use config::{HandSelection, MidlineConfig, RealtimeConfig, StrategyKind};
pub use midline::MidlineState;
pub use strategy::{
    build_strategy, ColorVoteStrategy, FrameDecision, HandAssignment, RealTimeClassifierStrategy,
    SpatialStrategy,
};
