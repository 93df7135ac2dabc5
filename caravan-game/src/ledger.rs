//! Resource ledger: survival/economic state plus persistent narrative flags.
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

use crate::constants::{
    BASE_PASSENGER_CAPACITY, CLOSE_CALL_FOOD, FLAG_CAPACITY_UPGRADE, FOOD_MAX, PROGRESS_MAX,
    SCORE_GOLD_WEIGHT, SCORE_PROGRESS_WEIGHT, SCORE_REPUTATION_WEIGHT,
    UPGRADED_PASSENGER_CAPACITY,
};
use crate::numbers::{clamp_i64_to_u32, floor_f32_to_u64};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PassengerKind {
    Merchant,
    Cook,
    Scholar,
    Guard,
}

impl PassengerKind {
    pub const ALL: [Self; 4] = [Self::Merchant, Self::Cook, Self::Scholar, Self::Guard];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Merchant => "merchant",
            Self::Cook => "cook",
            Self::Scholar => "scholar",
            Self::Guard => "guard",
        }
    }

    #[must_use]
    pub const fn bonus_text(self) -> &'static str {
        match self {
            Self::Merchant => "Haggles with traders",
            Self::Cook => "Food lasts longer",
            Self::Scholar => "Reads old runes",
            Self::Guard => "Keeps bandits honest",
        }
    }
}

impl fmt::Display for PassengerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passenger {
    pub id: u64,
    pub name: String,
    pub kind: PassengerKind,
    pub bonus_text: String,
}

impl Passenger {
    #[must_use]
    pub fn traveler(id: u64, kind: PassengerKind) -> Self {
        Self {
            id,
            name: "Traveler".to_string(),
            kind,
            bonus_text: kind.bonus_text().to_string(),
        }
    }
}

pub type PassengerList = SmallVec<[Passenger; UPGRADED_PASSENGER_CAPACITY]>;

/// Append-only set of narrative flags.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlagSet(BTreeSet<String>);

impl FlagSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` when the flag was not already present.
    pub fn insert(&mut self, token: &str) -> bool {
        if self.0.contains(token) {
            return false;
        }
        self.0.insert(token.to_string())
    }

    #[must_use]
    pub fn contains(&self, token: &str) -> bool {
        self.0.contains(token)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

/// Raw resource values. The [`Ledger`] clamps these on construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceState {
    pub food: f32,
    pub gold: u32,
    pub reputation: u32,
    pub lives: u32,
    pub progress: f32,
    pub journey_count: u32,
    #[serde(default)]
    pub score: u64,
    #[serde(default)]
    pub passengers: PassengerList,
}

impl Default for ResourceState {
    fn default() -> Self {
        Self {
            food: FOOD_MAX,
            gold: 20,
            reputation: 0,
            lives: 3,
            progress: 0.0,
            journey_count: 1,
            score: 0,
            passengers: PassengerList::new(),
        }
    }
}

/// Signed change to the bounded resources.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ResourceDelta {
    pub food: f32,
    pub gold: i64,
    pub reputation: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RecruitError {
    #[error("caravan is full ({capacity} passengers)")]
    AtCapacity { capacity: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ledger {
    state: ResourceState,
    flags: FlagSet,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new(ResourceState::default(), FlagSet::new())
    }
}

impl Ledger {
    /// Build a ledger, clamping every field into its documented bounds.
    #[must_use]
    pub fn new(mut state: ResourceState, flags: FlagSet) -> Self {
        state.food = clamp_unit(state.food, FOOD_MAX);
        state.progress = clamp_unit(state.progress, PROGRESS_MAX);
        let mut ledger = Self { state, flags };
        let capacity = ledger.capacity();
        ledger.state.passengers.truncate(capacity);
        ledger.recompute_score();
        ledger
    }

    #[must_use]
    pub const fn state(&self) -> &ResourceState {
        &self.state
    }

    #[must_use]
    pub const fn flags(&self) -> &FlagSet {
        &self.flags
    }

    #[must_use]
    pub const fn food(&self) -> f32 {
        self.state.food
    }

    #[must_use]
    pub const fn gold(&self) -> u32 {
        self.state.gold
    }

    #[must_use]
    pub const fn reputation(&self) -> u32 {
        self.state.reputation
    }

    #[must_use]
    pub const fn lives(&self) -> u32 {
        self.state.lives
    }

    #[must_use]
    pub const fn progress(&self) -> f32 {
        self.state.progress
    }

    #[must_use]
    pub const fn journey_count(&self) -> u32 {
        self.state.journey_count
    }

    #[must_use]
    pub const fn score(&self) -> u64 {
        self.state.score
    }

    #[must_use]
    pub fn passengers(&self) -> &[Passenger] {
        &self.state.passengers
    }

    /// Apply a signed delta. Food clamps to [0, 100], gold and reputation floor at 0.
    /// Reputation has no upper bound.
    pub fn apply_delta(&mut self, delta: ResourceDelta) {
        self.state.food = clamp_unit(self.state.food + delta.food, FOOD_MAX);
        self.state.gold = clamp_i64_to_u32(i64::from(self.state.gold).saturating_add(delta.gold));
        self.state.reputation =
            clamp_i64_to_u32(i64::from(self.state.reputation).saturating_add(delta.reputation));
        self.recompute_score();
    }

    pub fn add_gold(&mut self, amount: u32) {
        self.apply_delta(ResourceDelta {
            gold: i64::from(amount),
            ..ResourceDelta::default()
        });
    }

    /// Subtract food, flooring at zero. Returns `true` once the stores are empty.
    pub fn drain_food(&mut self, amount: f32) -> bool {
        self.state.food = clamp_unit(self.state.food - amount.max(0.0), FOOD_MAX);
        self.state.food <= 0.0
    }

    /// Spend one life and refill food to the close-call level.
    pub fn consume_life(&mut self) {
        self.state.lives = self.state.lives.saturating_sub(1);
        self.state.food = CLOSE_CALL_FOOD;
    }

    pub fn advance_progress(&mut self, step: f32) {
        self.state.progress = clamp_unit(self.state.progress + step.max(0.0), PROGRESS_MAX);
        self.recompute_score();
    }

    /// Start the next leg after resting at a haven.
    pub fn start_next_leg(&mut self) {
        self.state.journey_count = self.state.journey_count.saturating_add(1);
        self.state.progress = 0.0;
        self.recompute_score();
    }

    /// Returns `true` when the flag was newly inserted.
    pub fn add_flag(&mut self, token: &str) -> bool {
        self.flags.insert(token)
    }

    #[must_use]
    pub fn has_flag(&self, token: &str) -> bool {
        self.flags.contains(token)
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        if self.has_flag(FLAG_CAPACITY_UPGRADE) {
            UPGRADED_PASSENGER_CAPACITY
        } else {
            BASE_PASSENGER_CAPACITY
        }
    }

    #[must_use]
    pub fn has_passenger(&self, kind: PassengerKind) -> bool {
        self.state.passengers.iter().any(|p| p.kind == kind)
    }

    /// # Errors
    ///
    /// Returns [`RecruitError::AtCapacity`] without mutating when the caravan is full.
    pub fn add_passenger(&mut self, passenger: Passenger) -> Result<(), RecruitError> {
        let capacity = self.capacity();
        if self.state.passengers.len() >= capacity {
            return Err(RecruitError::AtCapacity { capacity });
        }
        self.state.passengers.push(passenger);
        Ok(())
    }

    /// Remove the first passenger matching `predicate`.
    pub fn remove_passenger_where(
        &mut self,
        predicate: impl Fn(&Passenger) -> bool,
    ) -> Option<Passenger> {
        let position = self.state.passengers.iter().position(predicate)?;
        Some(self.state.passengers.remove(position))
    }

    pub fn remove_passenger_at(&mut self, index: usize) -> Option<Passenger> {
        if index < self.state.passengers.len() {
            Some(self.state.passengers.remove(index))
        } else {
            None
        }
    }

    pub fn recompute_score(&mut self) -> u64 {
        let gold = u64::from(self.state.gold).saturating_mul(SCORE_GOLD_WEIGHT);
        let reputation = u64::from(self.state.reputation).saturating_mul(SCORE_REPUTATION_WEIGHT);
        let progress = floor_f32_to_u64(self.state.progress * SCORE_PROGRESS_WEIGHT);
        self.state.score = gold.saturating_add(reputation).saturating_add(progress);
        self.state.score
    }
}

fn clamp_unit(value: f32, max: f32) -> f32 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, max)
}
