//! Centralized balance and tuning constants for the Caravan simulation.
//!
//! The spawn policy and collision geometry live here rather than in
//! [`SimConfig`](crate::config::SimConfig) because replays and tests depend on
//! them being identical across every configuration.

// Encounter identifiers ----------------------------------------------------
pub const WAYSTATION_ID: &str = "waystation";
pub const HAVEN_CHECKPOINT_ID: &str = "haven_checkpoint";
pub const CHECKPOINT_IDS: [&str; 2] = [WAYSTATION_ID, HAVEN_CHECKPOINT_ID];

// Flags --------------------------------------------------------------------
pub const FLAG_SPEED_UPGRADE: &str = "speed_upgrade";
pub const FLAG_EFFICIENCY_UPGRADE: &str = "efficiency_upgrade";
pub const FLAG_CAPACITY_UPGRADE: &str = "capacity_upgrade";
pub const REPUTATION_FLAG_PREFIX: &str = "reputation_";

// Ledger bounds ------------------------------------------------------------
pub const FOOD_MAX: f32 = 100.0;
pub const PROGRESS_MAX: f32 = 100.0;
pub const BASE_PASSENGER_CAPACITY: usize = 3;
pub const UPGRADED_PASSENGER_CAPACITY: usize = 5;
pub const CLOSE_CALL_FOOD: f32 = 50.0;
pub const SCORE_GOLD_WEIGHT: u64 = 10;
pub const SCORE_REPUTATION_WEIGHT: u64 = 50;
pub const SCORE_PROGRESS_WEIGHT: f32 = 10.0;

// Movement and drain -------------------------------------------------------
pub const SPEED_UPGRADE_FACTOR: f32 = 1.4;
pub const MOVING_DRAIN_FACTOR: f32 = 2.0;
pub const COOK_DRAIN_FACTOR: f32 = 0.8;
pub const EFFICIENCY_DRAIN_FACTOR: f32 = 0.75;
pub const PROGRESS_DIVISOR: f32 = 80.0;
pub const SCROLL_WRAP: f32 = 100.0;
pub const PLAYER_X_MARGIN: f32 = 50.0;
pub const PLAYER_ROAD_MARGIN: f32 = 20.0;

// Spawn policy -------------------------------------------------------------
pub const COIN_CHANCE: f64 = 0.35;
pub const PERSON_CHANCE_CEILING: f64 = 0.50;
pub const BIG_COIN_CHANCE: f64 = 0.1;
pub const SMALL_COIN_VALUE: u32 = 5;
pub const BIG_COIN_VALUE: u32 = 25;
pub const PERSON_PROGRESS_LIMIT: f32 = 90.0;
pub const WAYSTATION_PROGRESS_MIN: f32 = 45.0;
pub const WAYSTATION_PROGRESS_MAX: f32 = 55.0;
pub const HAVEN_PROGRESS_THRESHOLD: f32 = 95.0;
pub const SPAWN_X_OFFSET: f32 = 100.0;
pub const SPAWN_LANE_PADDING: f32 = 40.0;
pub const SPEED_MULTIPLIER_MIN: f64 = 0.5;
pub const SPEED_MULTIPLIER_SPAN: f64 = 0.5;
pub const COIN_SIZE: f32 = 32.0;
pub const ENTITY_SIZE: f32 = 48.0;
pub const DESPAWN_X: f32 = -150.0;

// Collision ----------------------------------------------------------------
pub const COIN_HIT_RANGE: f32 = 35.0;
pub const ENCOUNTER_HIT_RANGE: f32 = 45.0;
