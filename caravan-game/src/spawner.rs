//! Road entity spawning policy.
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::SimConfig;
use crate::constants::{
    BIG_COIN_CHANCE, BIG_COIN_VALUE, COIN_CHANCE, COIN_SIZE, ENTITY_SIZE, HAVEN_CHECKPOINT_ID,
    HAVEN_PROGRESS_THRESHOLD, PERSON_CHANCE_CEILING, PERSON_PROGRESS_LIMIT, SMALL_COIN_VALUE,
    SPAWN_X_OFFSET, SPEED_MULTIPLIER_MIN, SPEED_MULTIPLIER_SPAN, WAYSTATION_ID,
    WAYSTATION_PROGRESS_MAX, WAYSTATION_PROGRESS_MIN,
};
use crate::data::EncounterCatalog;
use crate::ledger::{Passenger, PassengerKind};
use crate::numbers::{unit_draw_to_index, unit_f64_to_f32};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoinTier {
    Small,
    Big,
}

impl CoinTier {
    #[must_use]
    pub const fn value(self) -> u32 {
        match self {
            Self::Small => SMALL_COIN_VALUE,
            Self::Big => BIG_COIN_VALUE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EntityKind {
    Coin { tier: CoinTier },
    Person { passenger: Passenger },
    Trader { encounter_id: String },
    Haven { encounter_id: String },
}

impl EntityKind {
    #[must_use]
    pub fn encounter_id(&self) -> Option<&str> {
        match self {
            Self::Trader { encounter_id } | Self::Haven { encounter_id } => {
                Some(encounter_id.as_str())
            }
            Self::Coin { .. } | Self::Person { .. } => None,
        }
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Coin { .. } => "coin",
            Self::Person { .. } => "person",
            Self::Trader { .. } => "trader",
            Self::Haven { .. } => "haven",
        }
    }
}

/// Transient object scrolling toward the player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoadEntity {
    pub id: u64,
    pub x: f32,
    pub y: f32,
    pub kind: EntityKind,
    pub size: f32,
    /// Fixed fraction of the global scroll speed, in [0.5, 1.0).
    pub speed_multiplier: f32,
}

impl RoadEntity {
    #[must_use]
    pub const fn is_coin(&self) -> bool {
        matches!(self.kind, EntityKind::Coin { .. })
    }

    #[must_use]
    pub const fn is_person(&self) -> bool {
        matches!(self.kind, EntityKind::Person { .. })
    }

    #[must_use]
    pub const fn is_haven(&self) -> bool {
        matches!(self.kind, EntityKind::Haven { .. })
    }

    /// Triggers an encounter on contact.
    #[must_use]
    pub const fn is_encounter(&self) -> bool {
        matches!(
            self.kind,
            EntityKind::Trader { .. } | EntityKind::Haven { .. }
        )
    }

    #[must_use]
    pub const fn coin_value(&self) -> Option<u32> {
        match self.kind {
            EntityKind::Coin { tier } => Some(tier.value()),
            _ => None,
        }
    }
}

/// Produces road entities from an injected random source.
///
/// Every spawn draws, in order: the branch roll, one branch-specific draw
/// (coin tier, passenger type or pool index), the lane, and the speed multiplier.
#[derive(Debug, Clone)]
pub struct Spawner<R> {
    rng: R,
    pool: Vec<String>,
    next_id: u64,
    spawn_x: f32,
    lane_top: f32,
    lane_span: f32,
}

impl<R: Rng> Spawner<R> {
    #[must_use]
    pub fn new(rng: R, catalog: &EncounterCatalog, config: &SimConfig) -> Self {
        Self {
            rng,
            pool: catalog.random_pool(),
            next_id: 1,
            spawn_x: config.world_width + SPAWN_X_OFFSET,
            lane_top: config.road_top,
            lane_span: config.lane_span(),
        }
    }

    /// Spawn one entity weighted by the current leg progress.
    pub fn spawn(&mut self, progress: f32) -> RoadEntity {
        let roll = self.draw();
        let kind = if roll < COIN_CHANCE {
            let tier = if self.draw() < BIG_COIN_CHANCE {
                CoinTier::Big
            } else {
                CoinTier::Small
            };
            EntityKind::Coin { tier }
        } else if roll < PERSON_CHANCE_CEILING && progress < PERSON_PROGRESS_LIMIT {
            let kind_index = unit_draw_to_index(self.draw(), PassengerKind::ALL.len());
            let passenger_kind = PassengerKind::ALL
                .get(kind_index)
                .copied()
                .unwrap_or(PassengerKind::Merchant);
            let passenger = Passenger::traveler(self.next_id, passenger_kind);
            EntityKind::Person { passenger }
        } else {
            let pool_index = unit_draw_to_index(self.draw(), self.pool.len());
            let mut encounter_id = self
                .pool
                .get(pool_index)
                .cloned()
                .unwrap_or_else(|| WAYSTATION_ID.to_string());
            if progress > WAYSTATION_PROGRESS_MIN && progress < WAYSTATION_PROGRESS_MAX {
                encounter_id = WAYSTATION_ID.to_string();
            }
            if progress >= HAVEN_PROGRESS_THRESHOLD {
                encounter_id = HAVEN_CHECKPOINT_ID.to_string();
            }
            checkpoint_kind(encounter_id)
        };
        self.place(kind)
    }

    /// Force-spawn a named encounter entity regardless of the roll.
    pub fn spawn_checkpoint(&mut self, encounter_id: &str) -> RoadEntity {
        self.place(checkpoint_kind(encounter_id.to_string()))
    }

    #[must_use]
    pub const fn rng(&self) -> &R {
        &self.rng
    }

    fn place(&mut self, kind: EntityKind) -> RoadEntity {
        let lane = unit_f64_to_f32(self.draw());
        let speed = SPEED_MULTIPLIER_MIN + self.draw() * SPEED_MULTIPLIER_SPAN;
        let size = if matches!(kind, EntityKind::Coin { .. }) {
            COIN_SIZE
        } else {
            ENTITY_SIZE
        };
        let id = self.next_id;
        self.next_id = self.next_id.saturating_add(1);
        RoadEntity {
            id,
            x: self.spawn_x,
            y: self.lane_top + lane * self.lane_span,
            kind,
            size,
            speed_multiplier: unit_f64_to_f32(speed),
        }
    }

    fn draw(&mut self) -> f64 {
        self.rng.r#gen::<f64>()
    }
}

fn checkpoint_kind(encounter_id: String) -> EntityKind {
    if encounter_id == HAVEN_CHECKPOINT_ID {
        EntityKind::Haven { encounter_id }
    } else {
        EntityKind::Trader { encounter_id }
    }
}

/// Accumulates tick time toward the next spawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SpawnTimer {
    elapsed_ms: u32,
}

impl SpawnTimer {
    pub const fn advance(&mut self, ms: u32) {
        self.elapsed_ms = self.elapsed_ms.saturating_add(ms);
    }

    /// Fires strictly after the interval has elapsed.
    #[must_use]
    pub const fn ready(&self, interval_ms: u32) -> bool {
        self.elapsed_ms > interval_ms
    }

    pub const fn reset(&mut self) {
        self.elapsed_ms = 0;
    }

    #[must_use]
    pub const fn elapsed_ms(&self) -> u32 {
        self.elapsed_ms
    }
}
