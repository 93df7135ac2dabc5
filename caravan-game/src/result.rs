//! End-of-run summary
use serde::{Deserialize, Serialize};

use crate::ledger::PassengerKind;
use crate::state::{GameSnapshot, GameStatus, VictoryType};

/// How a run concluded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ending {
    /// Food ran out with no lives to spare
    Starved,
    /// Retired at the haven
    Hero,
    /// Run still in progress or abandoned
    Unfinished,
}

impl Ending {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Starved => "starved",
            Self::Hero => "hero",
            Self::Unfinished => "unfinished",
        }
    }

    #[must_use]
    pub const fn headline(self) -> &'static str {
        match self {
            Self::Starved => "The caravan starved on the road",
            Self::Hero => "A hero retires at the haven",
            Self::Unfinished => "The road goes on",
        }
    }
}

impl std::fmt::Display for Ending {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Complete summary of a run for the result screen and reports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultSummary {
    pub ending: Ending,
    pub headline: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<String>,
    pub status: GameStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub victory: Option<VictoryType>,
    pub score: u64,
    pub journeys: u32,
    pub food: f32,
    pub gold: u32,
    pub reputation: u32,
    pub lives: u32,
    pub progress: f32,
    pub passengers: Vec<PassengerKind>,
    pub flags: Vec<String>,
    pub ticks: u64,
}

#[must_use]
pub fn select_ending(snapshot: &GameSnapshot) -> Ending {
    match (snapshot.status, snapshot.victory) {
        (GameStatus::Victory, Some(VictoryType::Hero)) => Ending::Hero,
        (GameStatus::GameOver, _) => Ending::Starved,
        _ => Ending::Unfinished,
    }
}

/// Summarize a snapshot. `seed` is the share code the run was started from, if any.
#[must_use]
pub fn result_summary(snapshot: &GameSnapshot, seed: Option<String>) -> ResultSummary {
    let ending = select_ending(snapshot);
    let ledger = &snapshot.ledger;
    ResultSummary {
        ending,
        headline: ending.headline().to_string(),
        seed,
        status: snapshot.status,
        victory: snapshot.victory,
        score: ledger.score(),
        journeys: ledger.journey_count(),
        food: ledger.food(),
        gold: ledger.gold(),
        reputation: ledger.reputation(),
        lives: ledger.lives(),
        progress: ledger.progress(),
        passengers: ledger.passengers().iter().map(|p| p.kind).collect(),
        flags: ledger.flags().iter().map(str::to_string).collect(),
        ticks: snapshot.tick,
    }
}
