use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::Row;

use crate::models::{ActionRecord, Attribution};

pub fn parse_datetime(value: &str, field: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("failed to parse {field}"))
}

pub fn parse_attribution(value: &str) -> Result<Attribution> {
    Attribution::parse(value).ok_or_else(|| anyhow!("unknown assigned_player {value}"))
}

pub fn row_to_move(row: &Row) -> Result<ActionRecord> {
    let assigned: String = row.get("assigned_player")?;
    let timestamp: String = row.get("timestamp")?;

    Ok(ActionRecord {
        move_id: row.get("id")?,
        session_id: row.get("session_id")?,
        captured_frame: row.get("captured_frame")?,
        assigned_player: parse_attribution(&assigned)?,
        confidence: row.get("confidence")?,
        phase: row.get("phase")?,
        timestamp: parse_datetime(&timestamp, "timestamp")?,
    })
}
