//! Game status machine and the per-frame snapshot handed to hosts.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::data::{DeferredAction, Encounter};
use crate::ledger::Ledger;
use crate::spawner::RoadEntity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    #[default]
    Title,
    Playing,
    Encounter,
    GameOver,
    Victory,
}

impl GameStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Playing => "playing",
            Self::Encounter => "encounter",
            Self::GameOver => "gameover",
            Self::Victory => "victory",
        }
    }

    /// Terminal statuses only leave through a restart.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::GameOver | Self::Victory)
    }

    /// Statuses in which the pause toggle is honoured.
    #[must_use]
    pub const fn is_pausable(self) -> bool {
        matches!(self, Self::Playing | Self::Encounter)
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GameStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "title" => Ok(Self::Title),
            "playing" => Ok(Self::Playing),
            "encounter" => Ok(Self::Encounter),
            "gameover" => Ok(Self::GameOver),
            "victory" => Ok(Self::Victory),
            _ => Err(()),
        }
    }
}

/// How a victorious run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VictoryType {
    /// Retired at the haven.
    Hero,
}

impl VictoryType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hero => "hero",
        }
    }
}

impl fmt::Display for VictoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structural change staged by a resolved choice, consumed when the player acknowledges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PendingAction {
    #[default]
    None,
    ContinueJourney,
    EndJourney,
    RemovePassenger,
}

impl From<Option<DeferredAction>> for PendingAction {
    fn from(action: Option<DeferredAction>) -> Self {
        match action {
            None => Self::None,
            Some(DeferredAction::ContinueJourney) => Self::ContinueJourney,
            Some(DeferredAction::EndJourney) => Self::EndJourney,
            Some(DeferredAction::RemovePassenger) => Self::RemovePassenger,
        }
    }
}

/// Outcome text and staged action of the choice taken in an open encounter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub choice_id: String,
    pub consequence_text: String,
    pub pending: PendingAction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveEncounter {
    pub encounter: Encounter,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<Resolution>,
}

impl ActiveEncounter {
    #[must_use]
    pub const fn open(encounter: Encounter) -> Self {
        Self {
            encounter,
            resolution: None,
        }
    }

    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        self.resolution.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PlayerPosition {
    pub x: f32,
    pub y: f32,
}

impl PlayerPosition {
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Read-only view handed to renderers and test harnesses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub status: GameStatus,
    pub paused: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub victory: Option<VictoryType>,
    pub player: PlayerPosition,
    pub scroll_offset: f32,
    pub entities: Vec<RoadEntity>,
    pub ledger: Ledger,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encounter: Option<ActiveEncounter>,
    pub tick: u64,
}

impl GameSnapshot {
    /// Consequence text of the open encounter, once a choice has been made.
    #[must_use]
    pub fn resolution_text(&self) -> Option<&str> {
        self.encounter
            .as_ref()?
            .resolution
            .as_ref()
            .map(|resolution| resolution.consequence_text.as_str())
    }
}
