use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, sync::RwLock};

use super::{CalibrationSnapshot, CalibrationStore, ColorProfile};
use crate::models::Player;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct CalibrationFile {
    #[serde(flatten)]
    profiles: CalibrationSnapshot,
    #[serde(rename = "lastUpdated", default)]
    last_updated: Option<DateTime<Utc>>,
}

/// `calibration.json`-backed store. Every mutation is written through
/// atomically (temp file + rename) while holding the write lock.
pub struct FileCalibrationStore {
    path: PathBuf,
    data: RwLock<CalibrationFile>,
}

impl FileCalibrationStore {
    pub fn open(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read calibration from {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Malformed calibration file {}", path.display()))?
        } else {
            CalibrationFile::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.data.read().unwrap_or_else(|p| p.into_inner()).last_updated
    }

    pub fn reload(&self) -> Result<()> {
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read calibration from {}", self.path.display()))?;
        let data: CalibrationFile = serde_json::from_str(&contents)
            .with_context(|| format!("Malformed calibration file {}", self.path.display()))?;
        let mut guard = self.data.write().unwrap_or_else(|p| p.into_inner());
        *guard = data;
        Ok(())
    }

    fn update(&self, player: Player, profile: Option<ColorProfile>) -> Result<()> {
        let mut guard = self.data.write().unwrap_or_else(|p| p.into_inner());
        let mut next = guard.clone();
        next.profiles.set(player, profile);
        next.last_updated = Some(Utc::now());
        self.persist(&next)?;
        *guard = next;
        Ok(())
    }

    fn persist(&self, data: &CalibrationFile) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("failed to create calibration directory {}", parent.display())
                })?;
            }
        }

        let serialized = serde_json::to_string_pretty(data)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serialized)
            .with_context(|| format!("Failed to write calibration to {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to replace {}", self.path.display()))
    }
}

impl CalibrationStore for FileCalibrationStore {
    fn set(&self, player: Player, profile: ColorProfile) -> Result<()> {
        profile.validate()?;
        self.update(player, Some(profile))
    }

    fn clear(&self, player: Player) -> Result<()> {
        self.update(player, None)
    }

    fn snapshot(&self) -> CalibrationSnapshot {
        self.data.read().unwrap_or_else(|p| p.into_inner()).profiles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn persists_across_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("calibration.json");

        let store = FileCalibrationStore::open(path.clone()).unwrap();
        store.set(Player::A, ColorProfile::new(2.0, 220.0, 180.0)).unwrap();
        assert!(store.last_updated().is_some());

        let reopened = FileCalibrationStore::open(path.clone()).unwrap();
        assert_eq!(reopened.get(Player::A).unwrap().h, 2.0);
        assert!(reopened.get(Player::B).is_none());

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert!(raw["playerB"].is_null());
        assert_eq!(raw["playerA"]["dV"], 60.0);
        assert!(raw["lastUpdated"].is_string());
    }

    #[test]
    fn accepts_picker_files_without_tolerances() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("calibration.json");
        fs::write(
            &path,
            r#"{"playerA": {"h": 3, "s": 200, "v": 190}, "playerB": {"h": 118, "s": 210, "v": 160}}"#,
        )
        .unwrap();

        let store = FileCalibrationStore::open(path).unwrap();
        let snapshot = store.snapshot();
        assert_eq!(snapshot.player_b.unwrap().hue_tolerance, 10.0);
        assert!(store.last_updated().is_none());
    }

    #[test]
    fn clear_writes_through() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("calibration.json");
        let store = FileCalibrationStore::open(path.clone()).unwrap();
        store.set(Player::B, ColorProfile::new(100.0, 200.0, 200.0)).unwrap();
        store.clear(Player::B).unwrap();

        let reopened = FileCalibrationStore::open(path).unwrap();
        assert!(reopened.snapshot().is_empty());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("calibration.json");
        fs::write(&path, "{not json").unwrap();
        assert!(FileCalibrationStore::open(path).is_err());
    }

    #[test]
    fn reload_errors_name_the_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("calibration.json");
        let store = FileCalibrationStore::open(path.clone()).unwrap();
        store.set(Player::A, ColorProfile::new(2.0, 220.0, 180.0)).unwrap();

        fs::write(&path, "{not json").unwrap();
        let err = store.reload().unwrap_err();
        assert!(format!("{err}").contains("Malformed calibration file"));
        assert_eq!(store.get(Player::A).unwrap().h, 2.0);

        fs::remove_file(&path).unwrap();
        let err = store.reload().unwrap_err();
        assert!(format!("{err}").contains("Failed to read calibration"));
    }
}
