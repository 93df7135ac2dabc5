//! Caravan Game Engine
//!
//! Platform-agnostic real-time simulation core for the Caravan survival game.
//! Rendering, audio playback and menus live with the host; this crate owns the
//! fixed-tick update, the spawner and the encounter choice engine.

pub mod choice;
pub mod config;
pub mod constants;
pub mod cues;
pub mod data;
pub mod input;
pub mod ledger;
pub mod numbers;
pub mod result;
pub mod rng;
pub mod seed;
pub mod simulation;
pub mod spawner;
pub mod state;

// Re-export commonly used types
pub use choice::{
    ChoiceOutcome, ChoiceRejection, Settlement, check_eligibility, resolve_choice, settle,
};
pub use config::{ConfigError, SimConfig};
pub use cues::{CueQueue, CueSink, SoundCue};
pub use data::{CatalogError, Choice, DeferredAction, Encounter, EncounterCatalog};
pub use input::{Direction, HeldDirections, Key};
pub use ledger::{
    FlagSet, Ledger, Passenger, PassengerKind, RecruitError, ResourceDelta, ResourceState,
};
pub use result::{Ending, ResultSummary, result_summary, select_ending};
pub use rng::{CountingRng, SpawnRng, derive_stream_seed};
pub use seed::{decode_to_seed, encode_friendly, generate_code_from_entropy, parse_seed_input};
pub use simulation::{RecruitOutcome, Simulation, TickReport};
pub use spawner::{CoinTier, EntityKind, RoadEntity, SpawnTimer, Spawner};
pub use state::{
    ActiveEncounter, GameSnapshot, GameStatus, PendingAction, PlayerPosition, Resolution,
    VictoryType,
};

/// Trait for abstracting data loading operations
/// Platform-specific implementations should provide this
pub trait DataLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the encounter catalog from the platform-specific source
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be loaded or fails validation.
    fn load_encounter_catalog(&self) -> Result<EncounterCatalog, Self::Error>;

    /// Load the simulation configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded or parsed.
    fn load_config(&self) -> Result<SimConfig, Self::Error>;
}

/// Loader backed by the catalog compiled into this crate and default tuning.
#[derive(Debug, Clone, Copy, Default)]
pub struct BundledData;

impl DataLoader for BundledData {
    type Error = std::convert::Infallible;

    fn load_encounter_catalog(&self) -> Result<EncounterCatalog, Self::Error> {
        Ok(EncounterCatalog::bundled().clone())
    }

    fn load_config(&self) -> Result<SimConfig, Self::Error> {
        Ok(SimConfig::default())
    }
}

/// Main game engine for creating simulation instances
pub struct CaravanEngine<L>
where
    L: DataLoader,
{
    data_loader: L,
}

impl<L> CaravanEngine<L>
where
    L: DataLoader,
{
    /// Create a new game engine with the provided data loader
    pub const fn new(data_loader: L) -> Self {
        Self { data_loader }
    }

    /// Create a simulation on the title screen, seeded for replay
    ///
    /// # Errors
    ///
    /// Returns an error if data cannot be loaded or the configuration is invalid.
    pub fn create_simulation(&self, seed: u64) -> Result<Simulation, anyhow::Error>
    where
        L::Error: Into<anyhow::Error>,
    {
        let config = self.data_loader.load_config().map_err(Into::into)?;
        let catalog = self
            .data_loader
            .load_encounter_catalog()
            .map_err(Into::into)?;
        Ok(Simulation::new(config, catalog, seed)?)
    }

    /// Create a simulation from a share code or decimal seed and start the run
    ///
    /// # Errors
    ///
    /// Returns an error if the code is unrecognised or the simulation cannot be built.
    pub fn start_from_code(&self, code: &str) -> Result<Simulation, anyhow::Error>
    where
        L::Error: Into<anyhow::Error>,
    {
        let seed = parse_seed_input(code)
            .ok_or_else(|| anyhow::anyhow!("unrecognised seed or share code `{code}`"))?;
        let mut sim = self.create_simulation(seed)?;
        sim.start();
        Ok(sim)
    }
}
