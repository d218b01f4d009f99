//! Throttled per-camera classifier status: a JSONL trail plus a plain
//! `timestamp,camera,status` sibling with the same stem and a `.txt` extension.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::models::Attribution;
use crate::realtime::FrameDecision;

const ENABLE_LOGS: bool = true;

use crate::log_warn;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusLine<'a> {
    timestamp: DateTime<Utc>,
    camera: &'a str,
    status: Attribution,
    confidence: f64,
    percent_a: f64,
    percent_b: f64,
    reference_hand: Option<usize>,
}

struct StatusLogInner {
    file: File,
    text: Option<File>,
    last_written: HashMap<String, Instant>,
}

/// At most one line per camera per `interval`.
pub struct StatusLog {
    path: PathBuf,
    interval: Duration,
    inner: Mutex<StatusLogInner>,
}

impl StatusLog {
    pub fn open(path: PathBuf, interval: Duration) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create status log directory {}", parent.display()))?;
        }
        let file = open_append(&path)?;
        let text_path = path.with_extension("txt");
        let text = if text_path == path {
            None
        } else {
            Some(open_append(&text_path)?)
        };

        Ok(Self {
            path,
            interval,
            inner: Mutex::new(StatusLogInner {
                file,
                text,
                last_written: HashMap::new(),
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The plain-text sibling, unless the log itself already ends in `.txt`.
    pub fn text_path(&self) -> Option<PathBuf> {
        let text_path = self.path.with_extension("txt");
        (text_path != self.path).then_some(text_path)
    }

    /// Append a line for `camera` unless one was written within the interval.
    /// Returns whether a line was written. Write failures are logged only.
    pub fn record(&self, camera: &str, decision: &FrameDecision) -> bool {
        self.record_at(camera, decision, Instant::now())
    }

    fn record_at(&self, camera: &str, decision: &FrameDecision, now: Instant) -> bool {
        let mut inner = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(last) = inner.last_written.get(camera) {
            if now.saturating_duration_since(*last) < self.interval {
                return false;
            }
        }

        let line = StatusLine {
            timestamp: Utc::now(),
            camera,
            status: decision.attribution,
            confidence: decision.confidence,
            percent_a: decision.percent_a,
            percent_b: decision.percent_b,
            reference_hand: decision.reference_hand,
        };

        let written = serde_json::to_string(&line)
            .map_err(anyhow::Error::from)
            .and_then(|json| writeln!(inner.file, "{json}").map_err(anyhow::Error::from))
            .and_then(|()| match inner.text.as_mut() {
                Some(text) => writeln!(
                    text,
                    "{},{},{}",
                    line.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
                    camera,
                    line.status.as_str()
                )
                .map_err(anyhow::Error::from),
                None => Ok(()),
            });

        match written {
            Ok(()) => {
                inner.last_written.insert(camera.to_string(), now);
                true
            }
            Err(err) => {
                log_warn!("failed to append status line to {}: {err:#}", self.path.display());
                false
            }
        }
    }
}

fn open_append(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open status log {}", path.display()))
}
