//! Encounter choice resolution.
//!
//! Pure functions over the [`Ledger`]: eligibility gates, delta application and
//! the settlement of a staged action when the encounter closes.
use thiserror::Error;

use crate::constants::REPUTATION_FLAG_PREFIX;
use crate::data::Choice;
use crate::ledger::{Ledger, Passenger, PassengerKind, ResourceDelta};
use crate::numbers::f64_to_f32;
use crate::state::PendingAction;

/// Why a choice was not applied. The simulation treats these as silent no-ops.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChoiceRejection {
    #[error("requires a {0} aboard")]
    MissingPassenger(PassengerKind),
    #[error("requires reputation {required} (have {actual})")]
    ReputationBelow { required: u32, actual: u32 },
    #[error("requires flag `{0}`")]
    MissingFlag(String),
}

/// Applied effects of an accepted choice.
#[derive(Debug, Clone, PartialEq)]
pub struct ChoiceOutcome {
    pub delta: ResourceDelta,
    /// Flag inserted by this choice, if it was not already set.
    pub flag_set: Option<String>,
    pub pending: PendingAction,
    pub consequence_text: String,
}

/// Structural follow-up the simulation performs after [`settle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settlement {
    /// New leg started; the road must be cleared.
    ClearRoadAndResume,
    Victory,
    Resume { removed: Option<Passenger> },
}

/// Parse a `reputation_N` gate into its threshold.
#[must_use]
pub fn reputation_threshold(token: &str) -> Option<u32> {
    token.strip_prefix(REPUTATION_FLAG_PREFIX)?.parse().ok()
}

/// Check the passenger and flag gates without mutating.
///
/// # Errors
///
/// Returns the first unmet gate.
pub fn check_eligibility(choice: &Choice, ledger: &Ledger) -> Result<(), ChoiceRejection> {
    if let Some(kind) = choice.required_passenger_type
        && !ledger.has_passenger(kind)
    {
        return Err(ChoiceRejection::MissingPassenger(kind));
    }
    if let Some(token) = choice.required_flag.as_deref() {
        if let Some(required) = reputation_threshold(token) {
            let actual = ledger.reputation();
            if actual < required {
                return Err(ChoiceRejection::ReputationBelow { required, actual });
            }
        } else if !ledger.has_flag(token) {
            return Err(ChoiceRejection::MissingFlag(token.to_string()));
        }
    }
    Ok(())
}

/// Net delta a choice applies to the bounded resources.
#[must_use]
pub fn choice_delta(choice: &Choice) -> ResourceDelta {
    let food = f64::from(choice.food_gain) - f64::from(choice.food_cost);
    ResourceDelta {
        food: f64_to_f32(food),
        gold: i64::from(choice.gold_gain) - i64::from(choice.gold_cost),
        reputation: i64::from(choice.reputation_gain) - i64::from(choice.reputation_cost),
    }
}

/// Validate and apply a choice to the ledger.
///
/// # Errors
///
/// Returns a [`ChoiceRejection`] and leaves the ledger untouched when a gate fails.
pub fn resolve_choice(
    choice: &Choice,
    ledger: &mut Ledger,
) -> Result<ChoiceOutcome, ChoiceRejection> {
    check_eligibility(choice, ledger)?;
    let delta = choice_delta(choice);
    ledger.apply_delta(delta);
    let flag_set = choice
        .flag_to_set
        .as_deref()
        .filter(|token| ledger.add_flag(token))
        .map(str::to_string);
    Ok(ChoiceOutcome {
        delta,
        flag_set,
        pending: PendingAction::from(choice.action),
        consequence_text: choice.consequence_text.clone(),
    })
}

/// Apply the ledger side of a staged action.
pub fn settle(pending: PendingAction, ledger: &mut Ledger) -> Settlement {
    match pending {
        PendingAction::ContinueJourney => {
            ledger.start_next_leg();
            Settlement::ClearRoadAndResume
        }
        PendingAction::EndJourney => Settlement::Victory,
        // Always the first passenger, whichever one the story mentions.
        PendingAction::RemovePassenger => Settlement::Resume {
            removed: ledger.remove_passenger_at(0),
        },
        PendingAction::None => Settlement::Resume { removed: None },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::FLAG_SPEED_UPGRADE;
    use crate::data::{DeferredAction, EncounterCatalog};
    use crate::ledger::{FlagSet, ResourceState};

    fn bundled_choice(encounter: &str, choice: &str) -> Choice {
        EncounterCatalog::bundled()
            .get(encounter)
            .and_then(|e| e.choices.iter().find(|c| c.id == choice))
            .cloned()
            .unwrap()
    }

    fn scholar_gated() -> Choice {
        Choice {
            required_passenger_type: Some(PassengerKind::Scholar),
            reputation_gain: 2,
            ..Choice::plain("decipher", "The runes speak")
        }
    }

    #[test]
    fn scholar_gate_rejects_then_applies() {
        let mut ledger = Ledger::default();
        let before = ledger.clone();
        let err = resolve_choice(&scholar_gated(), &mut ledger).unwrap_err();
        assert_eq!(err, ChoiceRejection::MissingPassenger(PassengerKind::Scholar));
        assert_eq!(ledger, before);

        ledger
            .add_passenger(Passenger::traveler(1, PassengerKind::Scholar))
            .unwrap();
        let outcome = resolve_choice(&scholar_gated(), &mut ledger).unwrap();
        assert_eq!(ledger.reputation(), 2);
        assert_eq!(outcome.consequence_text, "The runes speak");
        assert_eq!(outcome.pending, PendingAction::None);
    }

    #[test]
    fn reputation_gate_reads_threshold() {
        let choice = Choice {
            required_flag: Some("reputation_3".to_string()),
            ..Choice::plain("parley", "ok")
        };
        let mut ledger = Ledger::new(
            ResourceState {
                reputation: 2,
                ..ResourceState::default()
            },
            FlagSet::new(),
        );
        assert_eq!(
            check_eligibility(&choice, &ledger),
            Err(ChoiceRejection::ReputationBelow {
                required: 3,
                actual: 2
            })
        );
        ledger.apply_delta(ResourceDelta {
            reputation: 1,
            ..ResourceDelta::default()
        });
        assert!(check_eligibility(&choice, &ledger).is_ok());
    }

    #[test]
    fn plain_flag_gate_needs_membership() {
        let choice = Choice {
            required_flag: Some("golem_blessing".to_string()),
            ..Choice::plain("ask", "ok")
        };
        let mut ledger = Ledger::default();
        assert_eq!(
            check_eligibility(&choice, &ledger),
            Err(ChoiceRejection::MissingFlag("golem_blessing".to_string()))
        );
        ledger.add_flag("golem_blessing");
        assert!(check_eligibility(&choice, &ledger).is_ok());
        assert_eq!(reputation_threshold("reputation_x"), None);
        assert_eq!(reputation_threshold("reputation_12"), Some(12));
    }

    #[test]
    fn costs_and_gains_clamp_and_set_flags() {
        let mut ledger = Ledger::new(
            ResourceState {
                food: 90.0,
                gold: 10,
                ..ResourceState::default()
            },
            FlagSet::new(),
        );
        let choice = Choice {
            food_gain: 30,
            gold_cost: 40,
            flag_to_set: Some(FLAG_SPEED_UPGRADE.to_string()),
            ..Choice::plain("buy", "Faster wheels")
        };
        let outcome = resolve_choice(&choice, &mut ledger).unwrap();
        assert!((ledger.food() - 100.0).abs() < f32::EPSILON);
        assert_eq!(ledger.gold(), 0);
        assert!(ledger.has_flag(FLAG_SPEED_UPGRADE));
        assert_eq!(outcome.flag_set.as_deref(), Some(FLAG_SPEED_UPGRADE));

        let again = resolve_choice(&choice, &mut ledger).unwrap();
        assert!(again.flag_set.is_none());
        assert_eq!(ledger.flags().len(), 1);
    }

    #[test]
    fn end_journey_is_only_staged() {
        let mut ledger = Ledger::default();
        let retire = Choice {
            action: Some(DeferredAction::EndJourney),
            ..Choice::plain("retire", "You settle down")
        };
        let outcome = resolve_choice(&retire, &mut ledger).unwrap();
        assert_eq!(outcome.pending, PendingAction::EndJourney);
        assert_eq!(ledger.journey_count(), 1);
        assert_eq!(settle(outcome.pending, &mut ledger), Settlement::Victory);
    }

    #[test]
    fn settle_applies_structural_actions() {
        let mut ledger = Ledger::new(
            ResourceState {
                progress: 100.0,
                ..ResourceState::default()
            },
            FlagSet::new(),
        );
        assert_eq!(
            settle(PendingAction::ContinueJourney, &mut ledger),
            Settlement::ClearRoadAndResume
        );
        assert_eq!(ledger.journey_count(), 2);
        assert!(ledger.progress().abs() < f32::EPSILON);

        ledger
            .add_passenger(Passenger::traveler(4, PassengerKind::Guard))
            .unwrap();
        ledger
            .add_passenger(Passenger::traveler(5, PassengerKind::Cook))
            .unwrap();
        match settle(PendingAction::RemovePassenger, &mut ledger) {
            Settlement::Resume { removed } => assert_eq!(removed.map(|p| p.id), Some(4)),
            other => panic!("unexpected settlement {other:?}"),
        }
        assert_eq!(
            settle(PendingAction::RemovePassenger, &mut Ledger::default()),
            Settlement::Resume { removed: None }
        );
    }

    #[test]
    fn bundled_catalog_choices_resolve() {
        let mut ledger = Ledger::default();
        let advice = bundled_choice("strange_traveler", "scholar_advice");
        assert!(resolve_choice(&advice, &mut ledger).is_err());

        let help = bundled_choice("strange_traveler", "help_wanderer");
        let outcome = resolve_choice(&help, &mut ledger).unwrap();
        assert!((ledger.food() - 90.0).abs() < f32::EPSILON);
        assert_eq!(ledger.reputation(), 2);
        assert_eq!(outcome.flag_set.as_deref(), Some("helped_wanderer"));

        let retire = bundled_choice(crate::constants::HAVEN_CHECKPOINT_ID, "retire_journey");
        let outcome = resolve_choice(&retire, &mut ledger).unwrap();
        assert_eq!(outcome.pending, PendingAction::EndJourney);

        let sell = bundled_choice("shady_dealer", "sell_crew");
        let outcome = resolve_choice(&sell, &mut ledger).unwrap();
        assert_eq!(outcome.pending, PendingAction::RemovePassenger);
        assert_eq!(ledger.gold(), 220);
        assert_eq!(ledger.reputation(), 0);
    }
}
