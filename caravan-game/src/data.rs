//! Encounter catalog: narrative events and their choices, bundled as JSON.
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::OnceLock;
use thiserror::Error;

use crate::constants::CHECKPOINT_IDS;
use crate::ledger::PassengerKind;

/// Structural action staged by a choice and applied when the encounter closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeferredAction {
    ContinueJourney,
    EndJourney,
    RemovePassenger,
}

/// A choice within an encounter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub id: String,
    pub text: String,
    pub consequence_text: String,
    #[serde(default)]
    pub food_cost: u32,
    #[serde(default)]
    pub food_gain: u32,
    #[serde(default)]
    pub gold_cost: u32,
    #[serde(default)]
    pub gold_gain: u32,
    #[serde(default)]
    pub reputation_cost: u32,
    #[serde(default)]
    pub reputation_gain: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flag_to_set: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_passenger_type: Option<PassengerKind>,
    /// Gate token; `reputation_N` reads as "reputation of at least N".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_flag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<DeferredAction>,
    #[serde(default)]
    pub color: String,
}

impl Choice {
    /// Bare choice with no costs, gains or gates (useful for tests)
    #[must_use]
    pub fn plain(id: &str, consequence_text: &str) -> Self {
        Self {
            id: id.to_string(),
            text: id.to_string(),
            consequence_text: consequence_text.to_string(),
            food_cost: 0,
            food_gain: 0,
            gold_cost: 0,
            gold_gain: 0,
            reputation_cost: 0,
            reputation_gain: 0,
            flag_to_set: None,
            required_passenger_type: None,
            required_flag: None,
            action: None,
            color: String::new(),
        }
    }
}

/// An encounter in the game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Encounter {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub choices: Vec<Choice>,
}

/// Errors raised when the encounter catalog cannot back the spawner.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("encounter catalog is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("encounter id `{0}` appears more than once")]
    DuplicateId(String),
    #[error("encounter `{0}` has no choices")]
    NoChoices(String),
    #[error("checkpoint encounter `{0}` is missing from the catalog")]
    MissingCheckpoint(&'static str),
    #[error("catalog has no encounters outside the checkpoints")]
    EmptyPool,
}

#[derive(Debug, Clone, Deserialize)]
struct CatalogFile {
    encounters: Vec<Encounter>,
}

/// Ordered, validated encounter lookup table.
///
/// Order follows the source document and drives the spawner's uniform pick,
/// so it is part of the deterministic replay surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EncounterCatalog {
    encounters: Vec<Encounter>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl EncounterCatalog {
    /// Build a catalog, rejecting duplicates, empty encounters and missing checkpoints.
    ///
    /// # Errors
    ///
    /// Returns an error if any encounter the spawner can produce would not resolve.
    pub fn from_encounters(encounters: Vec<Encounter>) -> Result<Self, CatalogError> {
        let mut index = HashMap::with_capacity(encounters.len());
        for (position, encounter) in encounters.iter().enumerate() {
            if encounter.choices.is_empty() {
                return Err(CatalogError::NoChoices(encounter.id.clone()));
            }
            if index.insert(encounter.id.clone(), position).is_some() {
                return Err(CatalogError::DuplicateId(encounter.id.clone()));
            }
        }
        for checkpoint in CHECKPOINT_IDS {
            if !index.contains_key(checkpoint) {
                return Err(CatalogError::MissingCheckpoint(checkpoint));
            }
        }
        if encounters.len() <= CHECKPOINT_IDS.len() {
            return Err(CatalogError::EmptyPool);
        }
        Ok(Self { encounters, index })
    }

    /// Load encounter data from a JSON document shaped `{ "encounters": [...] }`
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed or fails validation.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(json)?;
        Self::from_encounters(file.encounters)
    }

    /// Catalog compiled into the crate.
    ///
    /// # Panics
    ///
    /// Panics if the bundled asset is malformed, which is a build defect.
    #[must_use]
    pub fn bundled() -> &'static Self {
        static CATALOG: OnceLock<EncounterCatalog> = OnceLock::new();
        CATALOG.get_or_init(|| {
            Self::from_json(include_str!("../assets/encounters.json"))
                .expect("valid bundled encounter catalog")
        })
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Encounter> {
        self.index
            .get(id)
            .and_then(|position| self.encounters.get(*position))
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.encounters.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.encounters.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Encounter> {
        self.encounters.iter()
    }

    /// Identifiers eligible for random trader spawns, in catalog order.
    #[must_use]
    pub fn random_pool(&self) -> Vec<String> {
        self.encounters
            .iter()
            .map(|encounter| encounter.id.clone())
            .filter(|id| !CHECKPOINT_IDS.contains(&id.as_str()))
            .collect()
    }
}
