use std::sync::RwLock;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::ColorProfile;
use crate::models::Player;

/// Both profile slots, read together so a frame never mixes an old profile
/// with a new one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CalibrationSnapshot {
    #[serde(rename = "playerA")]
    pub player_a: Option<ColorProfile>,
    #[serde(rename = "playerB")]
    pub player_b: Option<ColorProfile>,
}

impl CalibrationSnapshot {
    pub fn get(&self, player: Player) -> Option<&ColorProfile> {
        match player {
            Player::A => self.player_a.as_ref(),
            Player::B => self.player_b.as_ref(),
        }
    }

    pub fn set(&mut self, player: Player, profile: Option<ColorProfile>) {
        match player {
            Player::A => self.player_a = profile,
            Player::B => self.player_b = profile,
        }
    }

    /// Both profiles, when both exist.
    pub fn pair(&self) -> Option<(&ColorProfile, &ColorProfile)> {
        Some((self.player_a.as_ref()?, self.player_b.as_ref()?))
    }

    /// The only calibrated player, if exactly one is.
    pub fn sole_player(&self) -> Option<Player> {
        match (self.player_a.is_some(), self.player_b.is_some()) {
            (true, false) => Some(Player::A),
            (false, true) => Some(Player::B),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.player_a.is_none() && self.player_b.is_none()
    }
}

/// Per-player profile slots injected into both classifiers.
pub trait CalibrationStore: Send + Sync {
    fn get(&self, player: Player) -> Option<ColorProfile> {
        self.snapshot().get(player).copied()
    }

    fn set(&self, player: Player, profile: ColorProfile) -> Result<()>;

    fn clear(&self, player: Player) -> Result<()>;

    fn snapshot(&self) -> CalibrationSnapshot;
}

/// Process-local store, the default for tests and live sessions that load
/// their calibration once at startup.
#[derive(Debug, Default)]
pub struct MemoryCalibrationStore {
    slots: RwLock<CalibrationSnapshot>,
}

impl MemoryCalibrationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profiles(player_a: Option<ColorProfile>, player_b: Option<ColorProfile>) -> Self {
        Self {
            slots: RwLock::new(CalibrationSnapshot { player_a, player_b }),
        }
    }
}

impl CalibrationStore for MemoryCalibrationStore {
    fn set(&self, player: Player, profile: ColorProfile) -> Result<()> {
        profile.validate()?;
        let mut guard = self.slots.write().unwrap_or_else(|p| p.into_inner());
        guard.set(player, Some(profile));
        Ok(())
    }

    fn clear(&self, player: Player) -> Result<()> {
        let mut guard = self.slots.write().unwrap_or_else(|p| p.into_inner());
        guard.set(player, None);
        Ok(())
    }

    fn snapshot(&self) -> CalibrationSnapshot {
        *self.slots.read().unwrap_or_else(|p| p.into_inner())
    }
}
