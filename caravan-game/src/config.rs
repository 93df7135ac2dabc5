//! Static simulation configuration supplied by the host.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ledger::ResourceState;

/// Constants the host feeds into the simulation. Fixed for a simulation's lifetime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    #[serde(default = "SimConfig::default_player_speed")]
    pub player_speed: f32,
    #[serde(default = "SimConfig::default_scroll_speed")]
    pub scroll_speed: f32,
    #[serde(default = "SimConfig::default_food_drain_rate")]
    pub food_drain_rate: f32,
    #[serde(default = "SimConfig::default_world_width")]
    pub world_width: f32,
    #[serde(default = "SimConfig::default_world_height")]
    pub world_height: f32,
    #[serde(default = "SimConfig::default_road_top")]
    pub road_top: f32,
    #[serde(default = "SimConfig::default_road_bottom")]
    pub road_bottom: f32,
    #[serde(default = "SimConfig::default_interaction_range")]
    pub interaction_range: f32,
    /// Milliseconds credited to the spawn timer per tick.
    #[serde(default = "SimConfig::default_tick_ms")]
    pub tick_ms: u32,
    #[serde(default = "SimConfig::default_spawn_interval_ms")]
    pub spawn_interval_ms: u32,
    #[serde(default = "SimConfig::default_player_start")]
    pub player_start: (f32, f32),
    #[serde(default)]
    pub starting_resources: ResourceState,
}

impl SimConfig {
    const fn default_player_speed() -> f32 {
        6.0
    }

    const fn default_scroll_speed() -> f32 {
        4.0
    }

    const fn default_food_drain_rate() -> f32 {
        0.04
    }

    const fn default_world_width() -> f32 {
        1200.0
    }

    const fn default_world_height() -> f32 {
        700.0
    }

    const fn default_road_top() -> f32 {
        200.0
    }

    const fn default_road_bottom() -> f32 {
        600.0
    }

    const fn default_interaction_range() -> f32 {
        100.0
    }

    const fn default_tick_ms() -> u32 {
        16
    }

    const fn default_spawn_interval_ms() -> u32 {
        1300
    }

    const fn default_player_start() -> (f32, f32) {
        (200.0, 300.0)
    }

    /// Parse a configuration document; missing fields take defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the values are inconsistent.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validate numeric bounds.
    ///
    /// # Errors
    ///
    /// Returns an error when a value is non-finite, non-positive where it must be
    /// positive, or when the road does not fit inside the world.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("player_speed", self.player_speed),
            ("scroll_speed", self.scroll_speed),
            ("food_drain_rate", self.food_drain_rate),
            ("world_width", self.world_width),
            ("world_height", self.world_height),
            ("interaction_range", self.interaction_range),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::NonPositive { field, value });
            }
        }
        if self.tick_ms == 0 {
            return Err(ConfigError::ZeroDuration { field: "tick_ms" });
        }
        if self.spawn_interval_ms == 0 {
            return Err(ConfigError::ZeroDuration {
                field: "spawn_interval_ms",
            });
        }
        self.validate_road()?;
        let (x, y) = self.player_start;
        if !(x.is_finite() && y.is_finite()) {
            return Err(ConfigError::PlayerStart { x, y });
        }
        Ok(())
    }

    fn validate_road(&self) -> Result<(), ConfigError> {
        let fits = self.road_top >= 0.0
            && self.road_bottom <= self.world_height
            && self.road_bottom - self.road_top > crate::constants::SPAWN_LANE_PADDING;
        if fits {
            Ok(())
        } else {
            Err(ConfigError::RoadBounds {
                top: self.road_top,
                bottom: self.road_bottom,
                height: self.world_height,
            })
        }
    }

    /// Road height available for spawn lanes.
    #[must_use]
    pub fn lane_span(&self) -> f32 {
        self.road_bottom - self.road_top - crate::constants::SPAWN_LANE_PADDING
    }

    /// Progress gained per tick.
    #[must_use]
    pub fn progress_step(&self) -> f32 {
        self.scroll_speed / crate::constants::PROGRESS_DIVISOR
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            player_speed: Self::default_player_speed(),
            scroll_speed: Self::default_scroll_speed(),
            food_drain_rate: Self::default_food_drain_rate(),
            world_width: Self::default_world_width(),
            world_height: Self::default_world_height(),
            road_top: Self::default_road_top(),
            road_bottom: Self::default_road_bottom(),
            interaction_range: Self::default_interaction_range(),
            tick_ms: Self::default_tick_ms(),
            spawn_interval_ms: Self::default_spawn_interval_ms(),
            player_start: Self::default_player_start(),
            starting_resources: ResourceState::default(),
        }
    }
}

/// Errors raised when simulation configuration invariants are violated.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("{field} must be a positive finite number (got {value})")]
    NonPositive { field: &'static str, value: f32 },
    #[error("{field} must be greater than zero")]
    ZeroDuration { field: &'static str },
    #[error("road {top:.1}..{bottom:.1} does not fit a world of height {height:.1}")]
    RoadBounds { top: f32, bottom: f32, height: f32 },
    #[error("player start ({x}, {y}) is not finite")]
    PlayerStart { x: f32, y: f32 },
}
