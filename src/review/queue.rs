//! Manual review of moves the classifiers could not settle.

use std::collections::VecDeque;
use std::time::Duration;

use serde::Serialize;

use crate::error::{AttributionError, Result};
use crate::models::{ActionRecord, Attribution, Player, ReviewDecision};
use crate::persistence::PlayerStore;

const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewReason {
    Unattributed,
    LowConfidence,
}

pub fn review_reason(record: &ActionRecord, threshold: f64) -> Option<ReviewReason> {
    match record.assigned_player {
        Attribution::None | Attribution::Unknown => Some(ReviewReason::Unattributed),
        _ if record.confidence < threshold => Some(ReviewReason::LowConfidence),
        _ => None,
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewItem {
    pub record: ActionRecord,
    pub reason: ReviewReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewChoice {
    Player(Player),
    Skip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
    /// Nothing was queued; the store was not contacted.
    Empty,
    Written(usize),
}

/// Forced-choice queue. Decisions accumulate locally and leave in one batch.
#[derive(Debug, Default)]
pub struct ReviewQueue {
    items: VecDeque<ReviewItem>,
    skipped: Vec<ReviewItem>,
    pending: Vec<ReviewDecision>,
}

impl ReviewQueue {
    pub fn from_records<I>(records: I, threshold: f64) -> Self
    where
        I: IntoIterator<Item = ActionRecord>,
    {
        let items: VecDeque<ReviewItem> = records
            .into_iter()
            .filter_map(|record| review_reason(&record, threshold).map(|reason| ReviewItem { record, reason }))
            .collect();

        log_info!("review queue holds {} move(s)", items.len());

        Self {
            items,
            ..Self::default()
        }
    }

    /// Item awaiting a decision.
    pub fn current(&self) -> Option<&ReviewItem> {
        self.items.front()
    }

    pub fn remaining(&self) -> usize {
        self.items.len()
    }

    pub fn pending(&self) -> &[ReviewDecision] {
        &self.pending
    }

    /// Skipped items stay listed so they remain visible, just not queued.
    pub fn skipped(&self) -> &[ReviewItem] {
        &self.skipped
    }

    /// Apply `choice` to the current item and advance. `None` when the queue
    /// was already exhausted.
    pub fn decide(&mut self, choice: ReviewChoice) -> Option<ReviewItem> {
        let item = self.items.pop_front()?;
        match choice {
            ReviewChoice::Player(player) => {
                // a second decision for the same move replaces the first
                self.pending.retain(|d| d.move_id != item.record.move_id);
                self.pending.push(ReviewDecision {
                    move_id: item.record.move_id.clone(),
                    player,
                });
            }
            ReviewChoice::Skip => self.skipped.push(item.clone()),
        }
        Some(item)
    }

    /// Put skipped items back at the end of the queue.
    pub fn requeue_skipped(&mut self) {
        self.items.extend(self.skipped.drain(..));
    }

    /// Drained: nothing left to decide and every decision persisted.
    pub fn is_drained(&self) -> bool {
        self.items.is_empty() && self.pending.is_empty()
    }

    /// Write all pending decisions in one batch call. On failure or timeout
    /// the decisions stay queued for a manual retry.
    pub async fn flush<S: PlayerStore + ?Sized>(&mut self, store: &S, timeout: Duration) -> Result<FlushOutcome> {
        if self.pending.is_empty() {
            return Ok(FlushOutcome::Empty);
        }

        let count = self.pending.len();
        match tokio::time::timeout(timeout, store.set_players_batch(&self.pending)).await {
            Ok(Ok(())) => {
                self.pending.clear();
                log_info!("flushed {count} review decision(s)");
                Ok(FlushOutcome::Written(count))
            }
            Ok(Err(err)) => {
                log_warn!("review flush failed, {count} decision(s) kept for retry: {err:#}");
                Err(AttributionError::PersistenceFailure(format!("{err:#}")))
            }
            Err(_) => {
                log_warn!("review flush timed out after {timeout:?}, {count} decision(s) kept for retry");
                Err(AttributionError::Timeout(timeout))
            }
        }
    }
}
