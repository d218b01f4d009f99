pub mod config;
pub mod queue;

pub use config::ReviewConfig;
pub use queue::{review_reason, FlushOutcome, ReviewChoice, ReviewItem, ReviewQueue, ReviewReason};
