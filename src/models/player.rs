use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the two seats at the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Player {
    A,
    B,
}

impl Player {
    pub const BOTH: [Player; 2] = [Player::A, Player::B];

    pub fn other(self) -> Player {
        match self {
            Player::A => Player::B,
            Player::B => Player::A,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Player::A => "A",
            Player::B => "B",
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Player {}", self.as_str())
    }
}

/// Outcome of any classification path.
///
/// `Unknown` marks a move whose attribution was never attempted (no frame,
/// classifier not running). `None` means a classifier ran and declined to
/// commit. Both are routed to review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Attribution {
    PlayerA,
    PlayerB,
    None,
    Unknown,
}

impl Attribution {
    pub fn player(self) -> Option<Player> {
        match self {
            Attribution::PlayerA => Some(Player::A),
            Attribution::PlayerB => Some(Player::B),
            Attribution::None | Attribution::Unknown => None,
        }
    }

    pub fn is_attributed(self) -> bool {
        self.player().is_some()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Attribution::PlayerA => "PlayerA",
            Attribution::PlayerB => "PlayerB",
            Attribution::None => "None",
            Attribution::Unknown => "Unknown",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "PlayerA" => Some(Attribution::PlayerA),
            "PlayerB" => Some(Attribution::PlayerB),
            "None" => Some(Attribution::None),
            "Unknown" => Some(Attribution::Unknown),
            _ => None,
        }
    }
}

impl From<Player> for Attribution {
    fn from(player: Player) -> Self {
        match player {
            Player::A => Attribution::PlayerA,
            Player::B => Attribution::PlayerB,
        }
    }
}

impl From<Option<Player>> for Attribution {
    fn from(player: Option<Player>) -> Self {
        player.map(Attribution::from).unwrap_or(Attribution::None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribution_round_trips_through_storage_names() {
        for value in [
            Attribution::PlayerA,
            Attribution::PlayerB,
            Attribution::None,
            Attribution::Unknown,
        ] {
            assert_eq!(Attribution::parse(value.as_str()), Some(value));
        }
        assert_eq!(Attribution::parse("playerA"), None);
    }

    #[test]
    fn only_players_count_as_attributed() {
        assert!(Attribution::from(Player::B).is_attributed());
        assert!(!Attribution::None.is_attributed());
        assert!(!Attribution::Unknown.is_attributed());
        assert_eq!(Attribution::from(None::<Player>), Attribution::None);
    }
}
