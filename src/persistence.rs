//! The write side of the move store, as seen by the review loop.

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{Player, ReviewDecision};

/// Idempotent label writes. A failed batch leaves every row untouched, so the
/// whole batch can be retried as a unit.
#[async_trait]
pub trait PlayerStore: Send + Sync {
    async fn set_player(&self, move_id: &str, player: Player) -> Result<()>;

    async fn set_players_batch(&self, decisions: &[ReviewDecision]) -> Result<()>;
}
