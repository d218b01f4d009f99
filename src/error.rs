//! Failure taxonomy shared by the classifiers, the review loop and the
//! persistence adapter.

use crate::models::Player;

pub type Result<T> = std::result::Result<T, AttributionError>;

#[derive(Debug, thiserror::Error)]
pub enum AttributionError {
    /// No profile for the named player (or for either player when `None`).
    #[error("no calibration profile for {}", .0.map(|p| p.to_string()).unwrap_or_else(|| "either player".into()))]
    MissingCalibration(Option<Player>),

    /// Too few qualifying pixels or frames to decide without guessing.
    #[error("insufficient evidence: {0}")]
    InsufficientEvidence(String),

    /// The vision provider threw or returned malformed data.
    #[error("vision provider failure: {0}")]
    ProviderFailure(String),

    /// A batch write to the move store failed; queued decisions are kept.
    #[error("persistence failure: {0}")]
    PersistenceFailure(String),

    #[error("operation timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("operation cancelled")]
    Cancelled,

    #[error("invalid color: {0}")]
    InvalidColor(String),
}
