//! Move records as stored by the persistence adapter.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Attribution, Player};

pub type MoveId = String;

/// One game action and who we currently believe performed it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionRecord {
    pub move_id: MoveId,
    pub session_id: String,
    /// Path of the frame captured when the move happened, if any.
    pub captured_frame: Option<String>,
    pub assigned_player: Attribution,
    pub confidence: f64,
    pub phase: String,
    pub timestamp: DateTime<Utc>,
}

impl ActionRecord {
    pub fn new(
        session_id: impl Into<String>,
        phase: impl Into<String>,
        captured_frame: Option<String>,
        assigned_player: Attribution,
        confidence: f64,
    ) -> Self {
        Self {
            move_id: Uuid::new_v4().to_string(),
            session_id: session_id.into(),
            captured_frame,
            assigned_player,
            confidence,
            phase: phase.into(),
            timestamp: Utc::now(),
        }
    }
}

/// A reviewer's forced choice for a single move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewDecision {
    pub move_id: MoveId,
    pub player: Player,
}

/// An automatic attribution to write back after an offline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributionUpdate {
    pub move_id: MoveId,
    pub player: Attribution,
    pub confidence: f64,
}
