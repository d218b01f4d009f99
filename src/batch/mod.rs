pub mod balance;
pub mod classifier;
pub mod config;
pub mod features;
pub mod kmeans;
pub mod mapping;

pub use classifier::{BatchOutcome, Cluster, OfflineBatchClassifier, SampleAssignment};
pub use config::{BatchConfig, MaskMode, ReseedPolicy};
pub use features::{BatchSample, FeatureSample, FrameSource, SkipReason, SkippedFrame};
pub use mapping::MappingSource;
