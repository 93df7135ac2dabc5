use std::fmt;

use caravan_game::data::{Choice, DeferredAction, Encounter};
use caravan_game::{Direction, GameSnapshot, Ledger, RoadEntity, check_eligibility};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// Vertical gap below which the autopilot stops correcting.
const STEER_DEADBAND: f32 = 8.0;
/// Look-ahead used when dodging traders.
const DODGE_WINDOW_X: f32 = 320.0;
const DODGE_WINDOW_Y: f32 = 60.0;
const HUNGRY_FOOD: f32 = 35.0;

/// Decision returned by a [`PlayerPolicy`]
#[derive(Debug, Clone)]
pub struct PolicyDecision {
    pub choice_index: usize,
    pub rationale: Option<String>,
}

impl PolicyDecision {
    #[must_use]
    pub fn new(choice_index: usize, rationale: Option<String>) -> Self {
        Self {
            choice_index,
            rationale,
        }
    }
}

/// Policy interface for automated play strategies.
pub trait PlayerPolicy {
    /// Name used for logging/debug output.
    fn name(&self) -> &'static str;

    /// Vertical steering for the next tick; `None` coasts.
    fn steer(&mut self, snapshot: &GameSnapshot) -> Option<Direction>;

    /// Select a choice for an open encounter.
    fn pick_choice(&mut self, ledger: &Ledger, encounter: &Encounter) -> PolicyDecision;
}

/// Built-in driving strategies for automated runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DrivingStrategy {
    Cautious,
    Greedy,
    Balanced,
    Wanderer,
}

impl DrivingStrategy {
    pub const ALL: [Self; 4] = [Self::Cautious, Self::Greedy, Self::Balanced, Self::Wanderer];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            DrivingStrategy::Cautious => "Cautious",
            DrivingStrategy::Greedy => "Greedy",
            DrivingStrategy::Balanced => "Balanced",
            DrivingStrategy::Wanderer => "Wanderer",
        }
    }

    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            DrivingStrategy::Cautious => "cautious",
            DrivingStrategy::Greedy => "greedy",
            DrivingStrategy::Balanced => "balanced",
            DrivingStrategy::Wanderer => "wanderer",
        }
    }

    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            DrivingStrategy::Cautious => "dodges traders, picks the cheapest choice",
            DrivingStrategy::Greedy => "chases coins, picks the richest choice",
            DrivingStrategy::Balanced => "chases coins, eats when hungry, weighs gain against cost",
            DrivingStrategy::Wanderer => "drifts at random, picks any allowed choice",
        }
    }

    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.key().eq_ignore_ascii_case(key.trim()))
    }

    #[must_use]
    pub fn create_policy(self, seed: u64) -> Box<dyn PlayerPolicy + Send> {
        match self {
            DrivingStrategy::Cautious => Box::new(CautiousPolicy),
            DrivingStrategy::Greedy => Box::new(GreedyPolicy),
            DrivingStrategy::Balanced => Box::new(BalancedPolicy),
            DrivingStrategy::Wanderer => Box::new(WandererPolicy::new(seed)),
        }
    }
}

impl fmt::Display for DrivingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

struct CautiousPolicy;
struct GreedyPolicy;
struct BalancedPolicy;

struct WandererPolicy {
    rng: ChaCha20Rng,
    heading: Option<Direction>,
    ticks_left: u32,
}

impl WandererPolicy {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
            heading: None,
            ticks_left: 0,
        }
    }
}

impl PlayerPolicy for CautiousPolicy {
    fn name(&self) -> &'static str {
        "Cautious"
    }

    fn steer(&mut self, snapshot: &GameSnapshot) -> Option<Direction> {
        if let Some(haven) = nearest_ahead(snapshot, RoadEntity::is_haven) {
            return toward(snapshot.player.y, haven.y);
        }
        dodge_traders(snapshot)
    }

    fn pick_choice(&mut self, ledger: &Ledger, encounter: &Encounter) -> PolicyDecision {
        best_eligible(ledger, encounter, |choice| -risk(choice), "risk")
    }
}

impl PlayerPolicy for GreedyPolicy {
    fn name(&self) -> &'static str {
        "Greedy"
    }

    fn steer(&mut self, snapshot: &GameSnapshot) -> Option<Direction> {
        let target = nearest_ahead(snapshot, RoadEntity::is_haven)
            .or_else(|| nearest_ahead(snapshot, RoadEntity::is_coin))?;
        toward(snapshot.player.y, target.y)
    }

    fn pick_choice(&mut self, ledger: &Ledger, encounter: &Encounter) -> PolicyDecision {
        best_eligible(ledger, encounter, reward, "reward")
    }
}

impl PlayerPolicy for BalancedPolicy {
    fn name(&self) -> &'static str {
        "Balanced"
    }

    fn steer(&mut self, snapshot: &GameSnapshot) -> Option<Direction> {
        if let Some(haven) = nearest_ahead(snapshot, RoadEntity::is_haven) {
            return toward(snapshot.player.y, haven.y);
        }
        if snapshot.ledger.food() < HUNGRY_FOOD
            && let Some(trader) = nearest_ahead(snapshot, RoadEntity::is_encounter)
        {
            return toward(snapshot.player.y, trader.y);
        }
        if let Some(coin) = nearest_ahead(snapshot, RoadEntity::is_coin) {
            return toward(snapshot.player.y, coin.y);
        }
        dodge_traders(snapshot)
    }

    fn pick_choice(&mut self, ledger: &Ledger, encounter: &Encounter) -> PolicyDecision {
        let hungry = ledger.food() < HUNGRY_FOOD;
        best_eligible(
            ledger,
            encounter,
            |choice| {
                let mut score = reward(choice) - risk(choice);
                if hungry {
                    score += i64::from(choice.food_gain) * 3;
                }
                score
            },
            "score",
        )
    }
}

impl PlayerPolicy for WandererPolicy {
    fn name(&self) -> &'static str {
        "Wanderer"
    }

    fn steer(&mut self, _snapshot: &GameSnapshot) -> Option<Direction> {
        if self.ticks_left == 0 {
            self.heading = match self.rng.gen_range(0..3_u8) {
                0 => Some(Direction::Up),
                1 => Some(Direction::Down),
                _ => None,
            };
            self.ticks_left = self.rng.gen_range(15..60);
        }
        self.ticks_left -= 1;
        self.heading
    }

    fn pick_choice(&mut self, ledger: &Ledger, encounter: &Encounter) -> PolicyDecision {
        let eligible = eligible_indices(ledger, encounter);
        if eligible.is_empty() {
            return PolicyDecision::new(0, Some("no eligible choices".to_string()));
        }
        let pick = eligible[self.rng.gen_range(0..eligible.len())];
        PolicyDecision::new(pick, Some(format!("roll among {}", eligible.len())))
    }
}

fn eligible_indices(ledger: &Ledger, encounter: &Encounter) -> Vec<usize> {
    encounter
        .choices
        .iter()
        .enumerate()
        .filter(|(_, choice)| check_eligibility(choice, ledger).is_ok())
        .map(|(idx, _)| idx)
        .collect()
}

fn best_eligible(
    ledger: &Ledger,
    encounter: &Encounter,
    score: impl Fn(&Choice) -> i64,
    label: &str,
) -> PolicyDecision {
    let best = encounter
        .choices
        .iter()
        .enumerate()
        .filter(|(_, choice)| check_eligibility(choice, ledger).is_ok())
        .map(|(idx, choice)| (idx, score(choice)))
        // Ties keep the earlier choice.
        .fold(None, |best: Option<(usize, i64)>, candidate| match best {
            Some(current) if current.1 >= candidate.1 => Some(current),
            _ => Some(candidate),
        });
    match best {
        Some((idx, value)) => PolicyDecision::new(idx, Some(format!("{label} {value}"))),
        None => PolicyDecision::new(0, Some("no eligible choices".to_string())),
    }
}

fn risk(choice: &Choice) -> i64 {
    let mut risk = i64::from(choice.food_cost) * 3
        + i64::from(choice.gold_cost) * 2
        + i64::from(choice.reputation_cost) * 2;
    if choice.action == Some(DeferredAction::RemovePassenger) {
        risk += 40;
    }
    risk
}

fn reward(choice: &Choice) -> i64 {
    i64::from(choice.gold_gain) * 2 + i64::from(choice.food_gain) + i64::from(choice.reputation_gain) * 3
        - i64::from(choice.gold_cost)
        - i64::from(choice.food_cost)
}

fn nearest_ahead(snapshot: &GameSnapshot, keep: fn(&RoadEntity) -> bool) -> Option<&RoadEntity> {
    let player_x = snapshot.player.x;
    snapshot
        .entities
        .iter()
        .filter(|entity| keep(entity) && entity.x > player_x - 20.0)
        .min_by(|a, b| a.x.total_cmp(&b.x))
}

fn toward(player_y: f32, target_y: f32) -> Option<Direction> {
    if target_y < player_y - STEER_DEADBAND {
        Some(Direction::Up)
    } else if target_y > player_y + STEER_DEADBAND {
        Some(Direction::Down)
    } else {
        None
    }
}

fn dodge_traders(snapshot: &GameSnapshot) -> Option<Direction> {
    let player = snapshot.player;
    let threat = snapshot.entities.iter().find(|entity| {
        entity.is_encounter()
            && entity.x > player.x
            && entity.x - player.x < DODGE_WINDOW_X
            && (entity.y - player.y).abs() < DODGE_WINDOW_Y
    })?;
    if threat.y <= player.y {
        Some(Direction::Down)
    } else {
        Some(Direction::Up)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use caravan_game::{EncounterCatalog, Passenger, PassengerKind};

    fn encounter(id: &str) -> Encounter {
        EncounterCatalog::bundled().get(id).cloned().unwrap()
    }

    #[test]
    fn strategies_parse_from_keys() {
        for strategy in DrivingStrategy::ALL {
            assert_eq!(DrivingStrategy::from_key(strategy.key()), Some(strategy));
        }
        assert_eq!(DrivingStrategy::from_key(" GREEDY "), Some(DrivingStrategy::Greedy));
        assert!(DrivingStrategy::from_key("reckless").is_none());
    }

    #[test]
    fn cautious_refuses_the_dealer() {
        let ledger = Ledger::default();
        let decision = CautiousPolicy.pick_choice(&ledger, &encounter("shady_dealer"));
        assert_eq!(decision.choice_index, 1);
    }

    #[test]
    fn gated_choices_are_skipped_until_unlocked() {
        let traveler = encounter("strange_traveler");
        let mut ledger = Ledger::default();
        let decision = GreedyPolicy.pick_choice(&ledger, &traveler);
        assert_ne!(decision.choice_index, 1);

        ledger
            .add_passenger(Passenger::traveler(1, PassengerKind::Scholar))
            .unwrap();
        let decision = GreedyPolicy.pick_choice(&ledger, &traveler);
        assert_eq!(decision.choice_index, 1);
    }

    #[test]
    fn wanderer_is_reproducible() {
        let ledger = Ledger::default();
        let cart = encounter("food_cart");
        let mut a = WandererPolicy::new(9);
        let mut b = WandererPolicy::new(9);
        for _ in 0..10 {
            assert_eq!(
                a.pick_choice(&ledger, &cart).choice_index,
                b.pick_choice(&ledger, &cart).choice_index
            );
        }
    }

    #[test]
    fn steering_moves_toward_and_away() {
        assert_eq!(toward(300.0, 250.0), Some(Direction::Up));
        assert_eq!(toward(300.0, 360.0), Some(Direction::Down));
        assert_eq!(toward(300.0, 305.0), None);
    }
}
