use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection};

use crate::db::{helpers::row_to_move, Database};
use crate::models::{ActionRecord, Attribution, AttributionUpdate, Player, ReviewDecision};
use crate::persistence::PlayerStore;

/// Human labels are final, so they are stored at full confidence.
const REVIEWED_CONFIDENCE: f64 = 1.0;

const MOVE_COLUMNS: &str =
    "id, session_id, captured_frame, assigned_player, confidence, phase, timestamp";

fn update_label(conn: &Connection, move_id: &str, player: Attribution, confidence: f64) -> Result<()> {
    let now = Utc::now().to_rfc3339();
    let changed = conn
        .execute(
            "UPDATE moves
             SET assigned_player = ?1,
                 confidence = ?2,
                 updated_at = ?3,
                 reviewed_at = ?3
             WHERE id = ?4",
            params![player.as_str(), confidence, now, move_id],
        )
        .with_context(|| format!("failed to update move {move_id}"))?;
    if changed == 0 {
        bail!("move {move_id} not found");
    }
    Ok(())
}

/// Automatic label write. Returns `false` for moves a reviewer already labelled.
fn update_unreviewed_label(conn: &Connection, update: &AttributionUpdate) -> Result<bool> {
    let move_id = &update.move_id;
    let changed = conn
        .execute(
            "UPDATE moves
             SET assigned_player = ?1,
                 confidence = ?2,
                 updated_at = ?3
             WHERE id = ?4 AND reviewed_at IS NULL",
            params![update.player.as_str(), update.confidence, Utc::now().to_rfc3339(), move_id],
        )
        .with_context(|| format!("failed to update move {move_id}"))?;
    if changed > 0 {
        return Ok(true);
    }

    let exists: bool = conn
        .query_row("SELECT EXISTS(SELECT 1 FROM moves WHERE id = ?1)", params![move_id], |row| row.get(0))
        .with_context(|| format!("failed to look up move {move_id}"))?;
    if !exists {
        bail!("move {move_id} not found");
    }
    Ok(false)
}

impl Database {
    /// Store a move, creating its session row on first use.
    pub async fn insert_move(&self, record: &ActionRecord) -> Result<()> {
        let record = record.clone();
        self.execute(move |conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT OR IGNORE INTO sessions (id, created_at) VALUES (?1, ?2)",
                params![record.session_id, Utc::now().to_rfc3339()],
            )?;
            tx.execute(
                "INSERT INTO moves (id, session_id, captured_frame, assigned_player, confidence, phase, timestamp, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    record.move_id,
                    record.session_id,
                    record.captured_frame,
                    record.assigned_player.as_str(),
                    record.confidence,
                    record.phase,
                    record.timestamp.to_rfc3339(),
                    Utc::now().to_rfc3339(),
                ],
            )
            .with_context(|| "failed to insert move")?;
            tx.commit()?;
            Ok(())
        })
        .await
    }

    pub async fn get_move(&self, move_id: &str) -> Result<Option<ActionRecord>> {
        let move_id = move_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(&format!("SELECT {MOVE_COLUMNS} FROM moves WHERE id = ?1"))?;
            let mut rows = stmt.query(params![move_id])?;
            let record = match rows.next()? {
                Some(row) => Some(row_to_move(row)?),
                None => None,
            };
            Ok(record)
        })
        .await
    }

    /// Moves of a session in capture order.
    pub async fn list_moves_for_session(&self, session_id: &str) -> Result<Vec<ActionRecord>> {
        let session_id = session_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MOVE_COLUMNS} FROM moves WHERE session_id = ?1 ORDER BY timestamp ASC, id ASC"
            ))?;
            let mut rows = stmt.query(params![session_id])?;
            let mut moves = Vec::new();
            while let Some(row) = rows.next()? {
                moves.push(row_to_move(row)?);
            }
            Ok(moves)
        })
        .await
    }

    /// Write back the labels of an offline run in one transaction. Moves a
    /// reviewer already labelled keep their label. Returns the rows written.
    pub async fn apply_attributions(&self, updates: &[AttributionUpdate]) -> Result<usize> {
        if updates.is_empty() {
            return Ok(0);
        }
        let updates = updates.to_vec();
        self.execute(move |conn| {
            let tx = conn.transaction()?;
            let mut written = 0;
            for update in &updates {
                if update_unreviewed_label(&tx, update)? {
                    written += 1;
                }
            }
            tx.commit()?;
            Ok(written)
        })
        .await
    }

    pub async fn set_player(&self, move_id: &str, player: Player) -> Result<()> {
        let move_id = move_id.to_string();
        self.execute(move |conn| update_label(conn, &move_id, player.into(), REVIEWED_CONFIDENCE))
            .await
    }

    /// Apply reviewer decisions in one transaction. Replaying the same batch
    /// yields the same rows.
    pub async fn set_players_batch(&self, decisions: &[ReviewDecision]) -> Result<()> {
        if decisions.is_empty() {
            return Ok(());
        }
        let decisions = decisions.to_vec();
        self.execute(move |conn| {
            let tx = conn.transaction()?;
            for decision in &decisions {
                update_label(&tx, &decision.move_id, decision.player.into(), REVIEWED_CONFIDENCE)?;
            }
            tx.commit()?;
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl PlayerStore for Database {
    async fn set_player(&self, move_id: &str, player: Player) -> Result<()> {
        Database::set_player(self, move_id, player).await
    }

    async fn set_players_batch(&self, decisions: &[ReviewDecision]) -> Result<()> {
        Database::set_players_batch(self, decisions).await
    }
}
