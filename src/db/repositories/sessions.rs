use anyhow::{bail, Result};
use chrono::Utc;
use rusqlite::{params, OptionalExtension};

use crate::db::Database;

impl Database {
    /// Register a session. Re-registering an existing id is a no-op.
    pub async fn ensure_session(&self, session_id: &str) -> Result<()> {
        let session_id = session_id.to_string();
        self.execute(move |conn| {
            conn.execute(
                "INSERT OR IGNORE INTO sessions (id, created_at) VALUES (?1, ?2)",
                params![session_id, Utc::now().to_rfc3339()],
            )?;
            Ok(())
        })
        .await
    }

    /// Freeze a session. Its moves keep accepting player and confidence
    /// updates, nothing else.
    pub async fn archive_session(&self, session_id: &str) -> Result<()> {
        let session_id = session_id.to_string();
        self.execute(move |conn| {
            let changed = conn.execute(
                "UPDATE sessions SET archived_at = COALESCE(archived_at, ?1) WHERE id = ?2",
                params![Utc::now().to_rfc3339(), session_id],
            )?;
            if changed == 0 {
                bail!("session {session_id} not found");
            }
            Ok(())
        })
        .await
    }

    pub async fn is_session_archived(&self, session_id: &str) -> Result<bool> {
        let session_id = session_id.to_string();
        self.execute(move |conn| {
            let archived: Option<Option<String>> = conn
                .query_row(
                    "SELECT archived_at FROM sessions WHERE id = ?1",
                    params![session_id],
                    |row| row.get(0),
                )
                .optional()?;
            match archived {
                Some(value) => Ok(value.is_some()),
                None => bail!("session {session_id} not found"),
            }
        })
        .await
    }
}
