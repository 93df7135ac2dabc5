use anyhow::{Context, Result};
use caravan_game::constants::{FOOD_MAX, HAVEN_CHECKPOINT_ID, PROGRESS_MAX};
use caravan_game::data::DeferredAction;
use caravan_game::{
    CueSink, Direction, EncounterCatalog, GameStatus, Key, RecruitOutcome, ResultSummary,
    SimConfig, Simulation, SoundCue, check_eligibility, result_summary,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use super::policy::PlayerPolicy;

/// Static inputs shared by every playthrough in a sweep.
#[derive(Debug, Clone)]
pub struct RunPlan {
    pub config: SimConfig,
    pub catalog: EncounterCatalog,
    /// Legs to complete before retiring at the haven.
    pub legs: u32,
    /// Loop steps before a run is abandoned as unfinished.
    pub max_steps: u64,
}

impl RunPlan {
    #[must_use]
    pub fn bundled(legs: u32, max_steps: u64) -> Self {
        Self {
            config: SimConfig::default(),
            catalog: EncounterCatalog::bundled().clone(),
            legs: legs.max(1),
            max_steps,
        }
    }

    /// Replace the bundled configuration and catalog with JSON files on disk.
    ///
    /// # Errors
    ///
    /// Returns an error if a file cannot be read or fails validation.
    pub fn with_overrides(mut self, config: Option<&Path>, catalog: Option<&Path>) -> Result<Self> {
        if let Some(path) = config {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            self.config = SimConfig::from_json(&raw)
                .with_context(|| format!("parsing config {}", path.display()))?;
        }
        if let Some(path) = catalog {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading catalog {}", path.display()))?;
            self.catalog = EncounterCatalog::from_json(&raw)
                .with_context(|| format!("parsing catalog {}", path.display()))?;
        }
        Ok(self)
    }
}

/// Counts every cue the simulation emits.
#[derive(Debug, Clone, Default)]
pub struct CueTally(BTreeMap<SoundCue, u32>);

impl CueTally {
    #[must_use]
    pub fn labelled(&self) -> BTreeMap<String, u32> {
        self.0
            .iter()
            .map(|(cue, count)| (cue.as_str().to_string(), *count))
            .collect()
    }
}

impl CueSink for CueTally {
    fn play(&mut self, cue: SoundCue) {
        *self.0.entry(cue).or_default() += 1;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub step: u64,
    pub leg: u32,
    pub encounter_id: String,
    pub choice_id: String,
    pub policy_name: String,
    pub rationale: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub seed: u64,
    pub seed_code: Option<String>,
    pub policy: String,
    pub steps: u64,
    pub timed_out: bool,
    pub result: ResultSummary,
    pub cues: BTreeMap<String, u32>,
    pub encounters: u32,
    pub recruits: u32,
    pub coins: u32,
    pub lives_lost: u32,
    pub decisions: Vec<DecisionRecord>,
    pub violations: Vec<String>,
}

impl RunSummary {
    #[must_use]
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }
}

#[derive(Debug, Default)]
struct RunCounters {
    encounters: u32,
    recruits: u32,
    coins: u32,
    lives_lost: u32,
}

/// Drive one seeded playthrough with the given policy until it ends or runs out of steps.
///
/// # Errors
///
/// Returns an error if the simulation cannot be constructed from the plan.
pub fn run_playthrough(
    plan: &RunPlan,
    seed: u64,
    seed_code: Option<String>,
    policy: &mut dyn PlayerPolicy,
) -> Result<RunSummary> {
    let mut sim = Simulation::new(plan.config.clone(), plan.catalog.clone(), seed)
        .context("building simulation")?;
    sim.start();

    let mut tally = CueTally::default();
    let mut counters = RunCounters::default();
    let mut decisions = Vec::new();
    let mut violations = Vec::new();
    let mut steps = 0;

    while steps < plan.max_steps {
        match sim.status() {
            GameStatus::Playing => {
                drive(&mut sim, policy, &mut counters);
                let report = sim.tick();
                if report.coin_collected.is_some() {
                    counters.coins += 1;
                }
                if report.life_lost {
                    counters.lives_lost += 1;
                }
                if report.encounter_started.is_some() {
                    counters.encounters += 1;
                }
            }
            GameStatus::Encounter => {
                if let Some(record) = decide(&mut sim, policy, plan.legs, steps) {
                    decisions.push(record);
                }
            }
            GameStatus::Title | GameStatus::GameOver | GameStatus::Victory => break,
        }
        sim.drain_cues(&mut tally);
        if let Some(violation) = check_invariants(&sim) {
            violations.push(format!("step {steps}: {violation}"));
            break;
        }
        steps += 1;
    }

    let snapshot = sim.snapshot();
    log::debug!(
        "seed {seed} {} finished in {steps} steps with status {}",
        policy.name(),
        snapshot.status
    );
    Ok(RunSummary {
        seed,
        policy: policy.name().to_string(),
        steps,
        timed_out: !snapshot.status.is_terminal(),
        result: result_summary(&snapshot, seed_code.clone()),
        seed_code,
        cues: tally.labelled(),
        encounters: counters.encounters,
        recruits: counters.recruits,
        coins: counters.coins,
        lives_lost: counters.lives_lost,
        decisions,
        violations,
    })
}

fn drive(sim: &mut Simulation, policy: &mut dyn PlayerPolicy, counters: &mut RunCounters) {
    let snapshot = sim.snapshot();
    let heading = policy.steer(&snapshot);
    for direction in [Direction::Up, Direction::Down, Direction::Left, Direction::Right] {
        if Some(direction) == heading {
            sim.key_down(Key::Move(direction));
        } else {
            sim.key_up(Key::Move(direction));
        }
    }

    let ledger = sim.ledger();
    let range = sim.config().interaction_range;
    let person_nearby = sim
        .entities()
        .iter()
        .any(|entity| entity.is_person() && (entity.x - snapshot.player.x).abs() < range);
    if person_nearby
        && ledger.passengers().len() < ledger.capacity()
        && matches!(sim.recruit(), RecruitOutcome::Boarded(_))
    {
        counters.recruits += 1;
    }
}

fn decide(
    sim: &mut Simulation,
    policy: &mut dyn PlayerPolicy,
    legs: u32,
    step: u64,
) -> Option<DecisionRecord> {
    let active = sim.encounter()?.clone();
    if active.is_resolved() {
        sim.acknowledge();
        return None;
    }

    let encounter = &active.encounter;
    let (index, rationale) = if encounter.id == HAVEN_CHECKPOINT_ID {
        let wanted = if sim.ledger().journey_count() >= legs {
            DeferredAction::EndJourney
        } else {
            DeferredAction::ContinueJourney
        };
        let index = encounter
            .choices
            .iter()
            .position(|choice| choice.action == Some(wanted))
            .unwrap_or(0);
        (index, Some(format!("leg {} of {legs}", sim.ledger().journey_count())))
    } else {
        let decision = policy.pick_choice(sim.ledger(), encounter);
        (decision.choice_index, decision.rationale)
    };

    let accepted = sim.select_choice(index)
        || encounter
            .choices
            .iter()
            .position(|choice| check_eligibility(choice, sim.ledger()).is_ok())
            .is_some_and(|fallback| sim.select_choice(fallback));
    if !accepted {
        log::warn!("no choice accepted in {}", encounter.id);
        return None;
    }

    let choice_id = sim
        .encounter()
        .and_then(|open| open.resolution.as_ref())
        .map(|resolution| resolution.choice_id.clone())
        .unwrap_or_default();
    Some(DecisionRecord {
        step,
        leg: sim.ledger().journey_count(),
        encounter_id: encounter.id.clone(),
        choice_id,
        policy_name: policy.name().to_string(),
        rationale,
    })
}

/// First broken ledger invariant, if any.
#[must_use]
pub fn check_invariants(sim: &Simulation) -> Option<String> {
    let ledger = sim.ledger();
    if !(0.0..=FOOD_MAX).contains(&ledger.food()) {
        return Some(format!("food out of range: {}", ledger.food()));
    }
    if !(0.0..=PROGRESS_MAX).contains(&ledger.progress()) {
        return Some(format!("progress out of range: {}", ledger.progress()));
    }
    if ledger.passengers().len() > ledger.capacity() {
        return Some(format!(
            "{} passengers exceed capacity {}",
            ledger.passengers().len(),
            ledger.capacity()
        ));
    }
    let mut scratch = ledger.clone();
    if scratch.recompute_score() != ledger.score() {
        return Some(format!("stale score {}", ledger.score()));
    }
    if sim.encounter().is_some() != (sim.status() == GameStatus::Encounter) {
        return Some(format!("encounter presence disagrees with {}", sim.status()));
    }
    None
}
