//! Fixed-tick simulation: movement, drain, scrolling, collisions and spawning.
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::choice::{Settlement, resolve_choice, settle};
use crate::config::{ConfigError, SimConfig};
use crate::constants::{
    COIN_HIT_RANGE, COOK_DRAIN_FACTOR, DESPAWN_X, EFFICIENCY_DRAIN_FACTOR, ENCOUNTER_HIT_RANGE,
    FLAG_EFFICIENCY_UPGRADE, FLAG_SPEED_UPGRADE, HAVEN_CHECKPOINT_ID, HAVEN_PROGRESS_THRESHOLD,
    MOVING_DRAIN_FACTOR, PLAYER_ROAD_MARGIN, PLAYER_X_MARGIN, SCROLL_WRAP, SPEED_UPGRADE_FACTOR,
};
use crate::cues::{CueQueue, CueSink, SoundCue};
use crate::data::EncounterCatalog;
use crate::input::{HeldDirections, Key};
use crate::ledger::{FlagSet, Ledger, Passenger, PassengerKind, RecruitError};
use crate::rng::SpawnRng;
use crate::spawner::{EntityKind, RoadEntity, SpawnTimer, Spawner};
use crate::state::{
    ActiveEncounter, GameSnapshot, GameStatus, PendingAction, PlayerPosition, Resolution,
    VictoryType,
};

/// What a single tick did. Idle ticks leave every field at its default.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TickReport {
    pub advanced: bool,
    pub life_lost: bool,
    pub game_over: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coin_collected: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encounter_started: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spawned: Option<u64>,
}

impl TickReport {
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        !self.advanced
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecruitOutcome {
    Boarded(Passenger),
    NobodyInRange,
    Full { capacity: usize },
    /// Recruiting is only possible while driving.
    Unavailable,
}

/// Owns every piece of mutable game state; all input handlers run on `&mut self`.
#[derive(Debug, Clone)]
pub struct Simulation<R = SpawnRng> {
    config: SimConfig,
    catalog: EncounterCatalog,
    spawner: Spawner<R>,
    timer: SpawnTimer,
    ledger: Ledger,
    status: GameStatus,
    paused: bool,
    victory: Option<VictoryType>,
    player: PlayerPosition,
    held: HeldDirections,
    entities: Vec<RoadEntity>,
    scroll_offset: f32,
    encounter: Option<ActiveEncounter>,
    cues: CueQueue,
    tick_count: u64,
}

impl Simulation<SpawnRng> {
    /// Build a simulation whose spawner draws from the seeded ChaCha20 stream.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration fails validation.
    pub fn new(
        config: SimConfig,
        catalog: EncounterCatalog,
        seed: u64,
    ) -> Result<Self, ConfigError> {
        Self::with_rng(config, catalog, SpawnRng::spawn_stream(seed))
    }
}

impl<R: Rng> Simulation<R> {
    /// Build a simulation around an injected random source.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration fails validation.
    pub fn with_rng(
        config: SimConfig,
        catalog: EncounterCatalog,
        rng: R,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let spawner = Spawner::new(rng, &catalog, &config);
        let ledger = Ledger::new(config.starting_resources.clone(), FlagSet::new());
        let (x, y) = config.player_start;
        Ok(Self {
            spawner,
            timer: SpawnTimer::default(),
            ledger,
            status: GameStatus::Title,
            paused: false,
            victory: None,
            player: PlayerPosition::new(x, y),
            held: HeldDirections::none(),
            entities: Vec::new(),
            scroll_offset: 0.0,
            encounter: None,
            cues: CueQueue::default(),
            tick_count: 0,
            config,
            catalog,
        })
    }

    /// Begin a fresh run from the title or an end screen.
    pub fn start(&mut self) -> bool {
        if !matches!(
            self.status,
            GameStatus::Title | GameStatus::GameOver | GameStatus::Victory
        ) {
            return false;
        }
        self.ledger = Ledger::new(self.config.starting_resources.clone(), FlagSet::new());
        let (x, y) = self.config.player_start;
        self.player = PlayerPosition::new(x, y);
        self.held = HeldDirections::none();
        self.entities.clear();
        self.scroll_offset = 0.0;
        self.timer.reset();
        self.victory = None;
        self.encounter = None;
        self.paused = false;
        self.tick_count = 0;
        self.status = GameStatus::Playing;
        self.cues.emit(SoundCue::Confirm);
        log::info!("journey started");
        true
    }

    pub fn toggle_pause(&mut self) -> bool {
        if !self.status.is_pausable() {
            return false;
        }
        self.paused = !self.paused;
        self.cues.emit(SoundCue::Select);
        log::debug!("paused = {}", self.paused);
        true
    }

    /// Leave a paused run and return to the title screen.
    pub fn abandon(&mut self) -> bool {
        if !self.paused || !self.status.is_pausable() {
            return false;
        }
        self.paused = false;
        self.encounter = None;
        self.held = HeldDirections::none();
        self.status = GameStatus::Title;
        self.cues.emit(SoundCue::Select);
        log::info!("journey abandoned");
        true
    }

    pub fn key_down(&mut self, key: Key) {
        match key {
            Key::Move(direction) => self.held.set(direction, true),
            Key::Pause => {
                self.toggle_pause();
            }
            Key::Interact => {
                self.recruit();
            }
            Key::Choice(number) => {
                if let Some(index) = usize::from(number).checked_sub(1) {
                    self.select_choice(index);
                }
            }
            Key::Acknowledge => {
                self.acknowledge();
            }
        }
    }

    pub fn key_up(&mut self, key: Key) {
        if let Key::Move(direction) = key {
            self.held.set(direction, false);
        }
    }

    /// Advance one fixed interval.
    pub fn tick(&mut self) -> TickReport {
        let mut report = TickReport::default();
        if self.status != GameStatus::Playing || self.paused {
            return report;
        }
        report.advanced = true;
        self.tick_count = self.tick_count.saturating_add(1);

        self.move_player();
        if !self.drain(&mut report) {
            return report;
        }
        self.ledger.advance_progress(self.config.progress_step());
        self.scroll_offset = (self.scroll_offset + self.config.scroll_speed) % SCROLL_WRAP;
        self.advance_entities();
        self.collide(&mut report);
        self.run_spawn_timer(&mut report);
        report
    }

    /// Take aboard the first person within interaction range.
    pub fn recruit(&mut self) -> RecruitOutcome {
        if self.status != GameStatus::Playing || self.paused {
            return RecruitOutcome::Unavailable;
        }
        let player_x = self.player.x;
        let range = self.config.interaction_range;
        let Some((index, passenger)) =
            self.entities
                .iter()
                .enumerate()
                .find_map(|(index, entity)| match &entity.kind {
                    EntityKind::Person { passenger } if (entity.x - player_x).abs() < range => {
                        Some((index, passenger.clone()))
                    }
                    _ => None,
                })
        else {
            return RecruitOutcome::NobodyInRange;
        };
        match self.ledger.add_passenger(passenger.clone()) {
            Ok(()) => {
                self.entities.remove(index);
                self.cues.emit(SoundCue::Onboard);
                log::debug!("recruited {} #{}", passenger.kind, passenger.id);
                RecruitOutcome::Boarded(passenger)
            }
            Err(RecruitError::AtCapacity { capacity }) => {
                log::debug!("recruit ignored: caravan full at {capacity}");
                RecruitOutcome::Full { capacity }
            }
        }
    }

    /// Pick a choice (zero-based) in the open encounter. Returns `true` when applied.
    pub fn select_choice(&mut self, index: usize) -> bool {
        if self.status != GameStatus::Encounter || self.paused {
            return false;
        }
        let Some(active) = self.encounter.as_mut() else {
            return false;
        };
        if active.is_resolved() {
            return false;
        }
        let Some(choice) = active.encounter.choices.get(index) else {
            return false;
        };
        match resolve_choice(choice, &mut self.ledger) {
            Ok(outcome) => {
                log::debug!(
                    "{}: chose {} (pending {:?})",
                    active.encounter.id,
                    choice.id,
                    outcome.pending
                );
                active.resolution = Some(Resolution {
                    choice_id: choice.id.clone(),
                    consequence_text: outcome.consequence_text,
                    pending: outcome.pending,
                });
                self.cues.emit(SoundCue::Trade);
                true
            }
            Err(rejection) => {
                log::debug!("{}: {} rejected: {rejection}", active.encounter.id, choice.id);
                false
            }
        }
    }

    /// Close a resolved encounter and apply its staged action exactly once.
    pub fn acknowledge(&mut self) -> bool {
        if self.status != GameStatus::Encounter || self.paused {
            return false;
        }
        let resolved = self
            .encounter
            .as_ref()
            .is_some_and(ActiveEncounter::is_resolved);
        if !resolved {
            return false;
        }
        let pending = self
            .encounter
            .take()
            .and_then(|active| active.resolution)
            .map_or(PendingAction::None, |resolution| resolution.pending);
        self.cues.emit(SoundCue::Confirm);
        match settle(pending, &mut self.ledger) {
            Settlement::ClearRoadAndResume => {
                self.entities.clear();
                self.status = GameStatus::Playing;
                log::info!("leg {} begins", self.ledger.journey_count());
            }
            Settlement::Victory => {
                self.victory = Some(VictoryType::Hero);
                self.status = GameStatus::Victory;
                self.cues.emit(SoundCue::Victory);
                log::info!("retired at the haven with score {}", self.ledger.score());
            }
            Settlement::Resume { removed } => {
                if let Some(passenger) = removed {
                    log::debug!("passenger {} left the caravan", passenger.id);
                }
                self.status = GameStatus::Playing;
            }
        }
        true
    }

    pub fn drain_cues(&mut self, sink: &mut dyn CueSink) {
        self.cues.drain_into(sink);
    }

    #[must_use]
    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            status: self.status,
            paused: self.paused,
            victory: self.victory,
            player: self.player,
            scroll_offset: self.scroll_offset,
            entities: self.entities.clone(),
            ledger: self.ledger.clone(),
            encounter: self.encounter.clone(),
            tick: self.tick_count,
        }
    }

    #[must_use]
    pub const fn status(&self) -> GameStatus {
        self.status
    }

    #[must_use]
    pub const fn is_paused(&self) -> bool {
        self.paused
    }

    #[must_use]
    pub const fn victory(&self) -> Option<VictoryType> {
        self.victory
    }

    #[must_use]
    pub const fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    #[must_use]
    pub const fn player(&self) -> PlayerPosition {
        self.player
    }

    #[must_use]
    pub const fn held(&self) -> HeldDirections {
        self.held
    }

    #[must_use]
    pub fn entities(&self) -> &[RoadEntity] {
        &self.entities
    }

    #[must_use]
    pub const fn encounter(&self) -> Option<&ActiveEncounter> {
        self.encounter.as_ref()
    }

    #[must_use]
    pub const fn scroll_offset(&self) -> f32 {
        self.scroll_offset
    }

    #[must_use]
    pub const fn tick_count(&self) -> u64 {
        self.tick_count
    }

    #[must_use]
    pub const fn config(&self) -> &SimConfig {
        &self.config
    }

    #[must_use]
    pub const fn catalog(&self) -> &EncounterCatalog {
        &self.catalog
    }

    #[must_use]
    pub const fn spawner(&self) -> &Spawner<R> {
        &self.spawner
    }

    fn move_player(&mut self) {
        let speed = if self.ledger.has_flag(FLAG_SPEED_UPGRADE) {
            self.config.player_speed * SPEED_UPGRADE_FACTOR
        } else {
            self.config.player_speed
        };
        let (dx, dy) = self.held.axes();
        let min_x = PLAYER_X_MARGIN;
        let max_x = (self.config.world_width - PLAYER_X_MARGIN).max(min_x);
        let min_y = self.config.road_top + PLAYER_ROAD_MARGIN;
        let max_y = (self.config.road_bottom - PLAYER_ROAD_MARGIN).max(min_y);
        self.player.x = (self.player.x + dx * speed).clamp(min_x, max_x);
        self.player.y = (self.player.y + dy * speed).clamp(min_y, max_y);
    }

    /// Returns `false` when the run ended this tick.
    fn drain(&mut self, report: &mut TickReport) -> bool {
        let mut rate = self.config.food_drain_rate;
        if self.held.any() {
            rate *= MOVING_DRAIN_FACTOR;
        }
        if self.ledger.has_passenger(PassengerKind::Cook) {
            rate *= COOK_DRAIN_FACTOR;
        }
        if self.ledger.has_flag(FLAG_EFFICIENCY_UPGRADE) {
            rate *= EFFICIENCY_DRAIN_FACTOR;
        }
        if !self.ledger.drain_food(rate) {
            return true;
        }
        if self.ledger.lives() > 1 {
            self.ledger.consume_life();
            self.cues.emit(SoundCue::Hurt);
            report.life_lost = true;
            log::debug!("starving: {} lives left", self.ledger.lives());
            true
        } else {
            self.status = GameStatus::GameOver;
            self.cues.emit(SoundCue::GameOver);
            report.game_over = true;
            log::info!(
                "caravan starved on leg {} with score {}",
                self.ledger.journey_count(),
                self.ledger.score()
            );
            false
        }
    }

    fn advance_entities(&mut self) {
        let scroll = self.config.scroll_speed;
        for entity in &mut self.entities {
            entity.x -= scroll * entity.speed_multiplier;
        }
        self.entities.retain(|entity| entity.x > DESPAWN_X);
    }

    fn collide(&mut self, report: &mut TickReport) {
        let player = self.player;
        let within = |entity: &RoadEntity, range: f32| {
            (entity.x - player.x).abs() < range && (entity.y - player.y).abs() < range
        };

        if let Some(index) = self
            .entities
            .iter()
            .position(|e| e.is_coin() && within(e, COIN_HIT_RANGE))
        {
            let coin = self.entities.remove(index);
            let value = coin.coin_value().unwrap_or(0);
            self.ledger.add_gold(value);
            self.cues.emit(SoundCue::Trade);
            report.coin_collected = Some(value);
            return;
        }

        let Some(index) = self
            .entities
            .iter()
            .position(|e| e.is_encounter() && within(e, ENCOUNTER_HIT_RANGE))
        else {
            return;
        };
        let entity = self.entities.remove(index);
        let Some(encounter_id) = entity.kind.encounter_id() else {
            return;
        };
        debug_assert!(
            self.catalog.contains(encounter_id),
            "spawned unknown encounter `{encounter_id}`"
        );
        if let Some(encounter) = self.catalog.get(encounter_id) {
            self.encounter = Some(ActiveEncounter::open(encounter.clone()));
            self.status = GameStatus::Encounter;
            self.cues.emit(SoundCue::Collision);
            report.encounter_started = Some(encounter_id.to_string());
            log::debug!("encounter {encounter_id} at progress {:.2}", self.ledger.progress());
        } else {
            log::error!("dropping entity with unknown encounter `{encounter_id}`");
        }
    }

    fn run_spawn_timer(&mut self, report: &mut TickReport) {
        self.timer.advance(self.config.tick_ms);
        if !self.timer.ready(self.config.spawn_interval_ms) {
            return;
        }
        let progress = self.ledger.progress();
        let entity = if progress < HAVEN_PROGRESS_THRESHOLD {
            self.spawner.spawn(progress)
        } else if self.entities.iter().any(RoadEntity::is_haven) {
            return;
        } else {
            self.spawner.spawn_checkpoint(HAVEN_CHECKPOINT_ID)
        };
        self.timer.reset();
        log::trace!("spawned {} #{}", entity.kind.label(), entity.id);
        report.spawned = Some(entity.id);
        self.entities.push(entity);
    }

    #[cfg(test)]
    fn place(&mut self, entity: RoadEntity) {
        self.entities.push(entity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{BIG_COIN_VALUE, FLAG_CAPACITY_UPGRADE, SMALL_COIN_VALUE, WAYSTATION_ID};
    use crate::input::Direction;
    use crate::ledger::ResourceState;
    use crate::spawner::tests::ScriptedRng;
    use crate::spawner::CoinTier;

    fn sim_with(config: SimConfig, draws: &[f64]) -> Simulation<ScriptedRng> {
        let mut sim = Simulation::with_rng(
            config,
            EncounterCatalog::bundled().clone(),
            ScriptedRng::new(draws),
        )
        .unwrap();
        assert!(sim.start());
        sim.cues.clear();
        sim
    }

    fn playing() -> Simulation<ScriptedRng> {
        sim_with(SimConfig::default(), &[])
    }

    fn with_resources(state: ResourceState) -> Simulation<ScriptedRng> {
        sim_with(
            SimConfig {
                starting_resources: state,
                ..SimConfig::default()
            },
            &[],
        )
    }

    fn entity(id: u64, x: f32, y: f32, kind: EntityKind) -> RoadEntity {
        RoadEntity {
            id,
            x,
            y,
            kind,
            size: 48.0,
            speed_multiplier: 0.0,
        }
    }

    fn trader_at_player(sim: &Simulation<ScriptedRng>, id: &str) -> RoadEntity {
        let player = sim.player();
        entity(
            90,
            player.x,
            player.y,
            EntityKind::Trader {
                encounter_id: id.to_string(),
            },
        )
    }

    fn cues(sim: &mut Simulation<ScriptedRng>) -> Vec<SoundCue> {
        let mut heard = Vec::new();
        sim.drain_cues(&mut heard);
        heard
    }

    #[test]
    fn title_ticks_are_idle() {
        let mut sim = Simulation::with_rng(
            SimConfig::default(),
            EncounterCatalog::bundled().clone(),
            ScriptedRng::new(&[]),
        )
        .unwrap();
        let before = sim.snapshot();
        assert!(sim.tick().is_idle());
        assert_eq!(sim.snapshot(), before);
    }

    #[test]
    fn start_resets_and_confirms() {
        let mut sim = Simulation::new(SimConfig::default(), EncounterCatalog::bundled().clone(), 1)
            .unwrap();
        assert_eq!(sim.status(), GameStatus::Title);
        assert!(sim.start());
        assert!(!sim.start(), "already playing");
        assert_eq!(sim.status(), GameStatus::Playing);
        assert_eq!(sim.ledger().gold(), 20);
        assert_eq!(sim.ledger().lives(), 3);
        let mut heard: Vec<SoundCue> = Vec::new();
        sim.drain_cues(&mut heard);
        assert_eq!(heard, vec![SoundCue::Confirm]);
    }

    #[test]
    fn idle_tick_drains_base_rate_and_advances_progress() {
        let mut sim = playing();
        let report = sim.tick();
        assert!(report.advanced);
        assert!((sim.ledger().food() - 99.96).abs() < 1e-4);
        assert!((sim.ledger().progress() - 0.05).abs() < 1e-6);
        assert!((sim.scroll_offset() - 4.0).abs() < f32::EPSILON);
    }

    #[test]
    fn moving_doubles_drain_and_modifiers_stack() {
        let mut sim = with_resources(ResourceState::default());
        sim.ledger.add_flag(FLAG_EFFICIENCY_UPGRADE);
        sim.ledger
            .add_passenger(Passenger::traveler(1, PassengerKind::Cook))
            .unwrap();
        sim.key_down(Key::Move(Direction::Down));
        sim.tick();
        let expected = 100.0 - 0.04 * 2.0 * 0.8 * 0.75;
        assert!((sim.ledger().food() - expected).abs() < 1e-4);
        assert!((sim.player().y - 306.0).abs() < 1e-4);
    }

    #[test]
    fn movement_clamps_to_road_and_speed_upgrade_applies() {
        let mut sim = playing();
        sim.key_down(Key::Move(Direction::Up));
        sim.key_down(Key::Move(Direction::Left));
        for _ in 0..200 {
            sim.tick();
        }
        assert!((sim.player().x - 50.0).abs() < f32::EPSILON);
        assert!((sim.player().y - 220.0).abs() < f32::EPSILON);

        sim.key_up(Key::Move(Direction::Up));
        sim.key_up(Key::Move(Direction::Left));
        sim.ledger.add_flag(FLAG_SPEED_UPGRADE);
        sim.key_down(Key::Move(Direction::Right));
        sim.tick();
        assert!((sim.player().x - (50.0 + 6.0 * 1.4)).abs() < 1e-4);
    }

    #[test]
    fn starvation_costs_a_life_then_ends_the_run() {
        let mut sim = with_resources(ResourceState {
            food: 0.02,
            lives: 3,
            ..ResourceState::default()
        });
        let report = sim.tick();
        assert!(report.life_lost);
        assert_eq!(sim.ledger().lives(), 2);
        assert!((sim.ledger().food() - 50.0).abs() < f32::EPSILON);
        assert_eq!(sim.status(), GameStatus::Playing);
        assert_eq!(cues(&mut sim), vec![SoundCue::Hurt]);

        let mut last = with_resources(ResourceState {
            food: 0.02,
            lives: 1,
            ..ResourceState::default()
        });
        let report = last.tick();
        assert!(report.game_over);
        assert_eq!(last.status(), GameStatus::GameOver);
        assert_eq!(last.ledger().lives(), 1);
        assert!(last.ledger().progress().abs() < f32::EPSILON);
        assert_eq!(cues(&mut last), vec![SoundCue::GameOver]);

        let frozen = last.snapshot();
        assert!(last.tick().is_idle());
        assert_eq!(last.snapshot(), frozen);
    }

    #[test]
    fn coins_add_their_value_and_vanish() {
        for (tier, value) in [(CoinTier::Small, SMALL_COIN_VALUE), (CoinTier::Big, BIG_COIN_VALUE)] {
            let mut sim = playing();
            let player = sim.player();
            sim.place(entity(7, player.x + 10.0, player.y - 10.0, EntityKind::Coin { tier }));
            let report = sim.tick();
            assert_eq!(report.coin_collected, Some(value));
            assert_eq!(sim.ledger().gold(), 20 + value);
            assert!(sim.entities().is_empty());
            assert_eq!(cues(&mut sim), vec![SoundCue::Trade]);
        }
    }

    #[test]
    fn coin_takes_priority_over_encounter() {
        let mut sim = playing();
        let trader = trader_at_player(&sim, "bandit_toll");
        let player = sim.player();
        sim.place(trader);
        sim.place(entity(
            8,
            player.x,
            player.y,
            EntityKind::Coin {
                tier: CoinTier::Small,
            },
        ));
        sim.tick();
        assert_eq!(sim.status(), GameStatus::Playing);
        assert_eq!(sim.entities().len(), 1);
        sim.tick();
        assert_eq!(sim.status(), GameStatus::Encounter);
    }

    #[test]
    fn encounter_suspends_simulation_until_closed() {
        let mut sim = playing();
        let trader = trader_at_player(&sim, "food_cart");
        sim.place(trader);
        let report = sim.tick();
        assert_eq!(report.encounter_started.as_deref(), Some("food_cart"));
        assert_eq!(sim.status(), GameStatus::Encounter);
        assert_eq!(cues(&mut sim), vec![SoundCue::Collision]);

        let frozen = sim.snapshot();
        assert!(sim.tick().is_idle());
        assert_eq!(sim.snapshot(), frozen);

        assert!(!sim.acknowledge(), "nothing chosen yet");
        sim.key_down(Key::Choice(1));
        assert_eq!(sim.ledger().gold(), 12);
        assert_eq!(
            sim.snapshot().resolution_text(),
            Some(sim.catalog().get("food_cart").unwrap().choices[0].consequence_text.as_str())
        );
        assert!(!sim.select_choice(1), "one choice per encounter");
        sim.key_down(Key::Acknowledge);
        assert_eq!(sim.status(), GameStatus::Playing);
        assert!(sim.encounter().is_none());
        assert_eq!(cues(&mut sim), vec![SoundCue::Trade, SoundCue::Confirm]);
    }

    #[test]
    fn gated_choice_is_silently_rejected() {
        let mut sim = playing();
        let trader = trader_at_player(&sim, "strange_traveler");
        sim.place(trader);
        sim.tick();
        let before = sim.ledger().clone();
        assert!(!sim.select_choice(1));
        assert!(!sim.select_choice(9));
        assert_eq!(sim.ledger(), &before);
        assert!(sim.snapshot().resolution_text().is_none());
        assert_eq!(cues(&mut sim), vec![SoundCue::Collision]);

        sim.ledger
            .add_passenger(Passenger::traveler(3, PassengerKind::Scholar))
            .unwrap();
        assert!(sim.select_choice(1));
        assert_eq!(sim.ledger().reputation(), 15);
    }

    #[test]
    fn retiring_waits_for_acknowledgement() {
        let mut sim = playing();
        let haven = trader_at_player(&sim, HAVEN_CHECKPOINT_ID);
        sim.place(haven);
        sim.tick();
        assert!(sim.select_choice(1));
        assert_eq!(sim.status(), GameStatus::Encounter);
        assert!(sim.victory().is_none());

        assert!(sim.acknowledge());
        assert_eq!(sim.status(), GameStatus::Victory);
        assert_eq!(sim.victory(), Some(VictoryType::Hero));
        assert_eq!(
            cues(&mut sim),
            vec![
                SoundCue::Collision,
                SoundCue::Trade,
                SoundCue::Confirm,
                SoundCue::Victory
            ]
        );
        assert!(sim.tick().is_idle());
        assert!(!sim.acknowledge());
    }

    #[test]
    fn continuing_clears_the_road_and_starts_a_new_leg() {
        let mut sim = with_resources(ResourceState {
            progress: 97.0,
            ..ResourceState::default()
        });
        let haven = trader_at_player(&sim, HAVEN_CHECKPOINT_ID);
        sim.place(haven);
        sim.place(entity(
            5,
            900.0,
            400.0,
            EntityKind::Coin {
                tier: CoinTier::Big,
            },
        ));
        sim.tick();
        assert!(sim.select_choice(0));
        assert!(sim.acknowledge());
        assert_eq!(sim.status(), GameStatus::Playing);
        assert_eq!(sim.ledger().journey_count(), 2);
        assert!(sim.ledger().progress().abs() < f32::EPSILON);
        assert!(sim.entities().is_empty());
    }

    #[test]
    fn dealer_removes_the_first_passenger() {
        let mut sim = playing();
        for (id, kind) in [(1, PassengerKind::Guard), (2, PassengerKind::Merchant)] {
            sim.ledger.add_passenger(Passenger::traveler(id, kind)).unwrap();
        }
        let dealer = trader_at_player(&sim, "shady_dealer");
        sim.place(dealer);
        sim.tick();
        assert!(sim.select_choice(0));
        assert_eq!(sim.ledger().passengers().len(), 2);
        assert!(sim.acknowledge());
        let ids: Vec<u64> = sim.ledger().passengers().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![2]);
    }

    #[test]
    fn recruitment_respects_capacity() {
        let mut sim = playing();
        for id in 1..=4 {
            let passenger = Passenger::traveler(id, PassengerKind::Merchant);
            sim.place(entity(id, sim.player().x + 60.0, 560.0, EntityKind::Person { passenger }));
        }
        for _ in 0..3 {
            assert!(matches!(sim.recruit(), RecruitOutcome::Boarded(_)));
        }
        assert_eq!(sim.recruit(), RecruitOutcome::Full { capacity: 3 });
        assert_eq!(sim.entities().len(), 1);
        assert_eq!(sim.ledger().passengers().len(), 3);

        sim.ledger.add_flag(FLAG_CAPACITY_UPGRADE);
        sim.key_down(Key::Interact);
        assert_eq!(sim.ledger().passengers().len(), 4);
        assert!(sim.entities().is_empty());
        assert_eq!(sim.recruit(), RecruitOutcome::NobodyInRange);
        assert_eq!(cues(&mut sim), vec![SoundCue::Onboard; 4]);
    }

    #[test]
    fn upgraded_capacity_refuses_a_sixth_recruit() {
        let mut sim = playing();
        sim.ledger.add_flag(FLAG_CAPACITY_UPGRADE);
        for id in 1..=6 {
            let passenger = Passenger::traveler(id, PassengerKind::Cook);
            sim.place(entity(id, sim.player().x, 560.0, EntityKind::Person { passenger }));
        }
        for _ in 0..5 {
            assert!(matches!(sim.recruit(), RecruitOutcome::Boarded(_)));
        }
        assert_eq!(sim.recruit(), RecruitOutcome::Full { capacity: 5 });
        assert_eq!(sim.ledger().passengers().len(), 5);
        assert_eq!(sim.entities().len(), 1);
        assert!(sim.entities()[0].is_person());
    }

    #[test]
    fn recruitment_ignores_vertical_distance_but_not_horizontal() {
        let mut sim = playing();
        let passenger = Passenger::traveler(1, PassengerKind::Guard);
        sim.place(entity(1, sim.player().x + 150.0, sim.player().y, EntityKind::Person { passenger }));
        assert_eq!(sim.recruit(), RecruitOutcome::NobodyInRange);
    }

    #[test]
    fn spawn_timer_fires_after_interval() {
        // roll 0.1 -> coin, tier 0.5 -> small, lane, speed
        let mut sim = sim_with(SimConfig::default(), &[0.10, 0.50, 0.25, 0.5]);
        for _ in 0..81 {
            assert!(sim.tick().spawned.is_none());
        }
        let report = sim.tick();
        assert_eq!(report.spawned, Some(1));
        assert_eq!(sim.entities().len(), 1);
        assert!(sim.entities()[0].is_coin());
        assert_eq!(sim.timer.elapsed_ms(), 0);
    }

    #[test]
    fn spawn_step_still_runs_when_an_encounter_opens() {
        let mut sim = sim_with(
            SimConfig {
                spawn_interval_ms: 10,
                ..SimConfig::default()
            },
            &[0.10, 0.50, 0.25, 0.5],
        );
        let trader = trader_at_player(&sim, "food_cart");
        sim.place(trader);
        let report = sim.tick();
        assert_eq!(report.encounter_started.as_deref(), Some("food_cart"));
        assert_eq!(sim.status(), GameStatus::Encounter);
        assert_eq!(report.spawned, Some(1));
        assert_eq!(sim.entities().len(), 1);
        assert!(sim.entities()[0].is_coin());

        // suspended from the next tick on
        assert!(sim.tick().is_idle());
        assert_eq!(sim.entities().len(), 1);
    }

    #[test]
    fn trader_spawns_mid_journey_are_waystations() {
        let mut sim = sim_with(
            SimConfig {
                starting_resources: ResourceState {
                    progress: 50.0,
                    ..ResourceState::default()
                },
                spawn_interval_ms: 10,
                ..SimConfig::default()
            },
            &[0.9, 0.42, 0.5, 0.5],
        );
        sim.tick();
        assert_eq!(sim.entities()[0].kind.encounter_id(), Some(WAYSTATION_ID));
    }

    #[test]
    fn haven_is_forced_once_near_the_end() {
        let mut sim = sim_with(
            SimConfig {
                starting_resources: ResourceState {
                    progress: 96.0,
                    ..ResourceState::default()
                },
                spawn_interval_ms: 10,
                ..SimConfig::default()
            },
            &[0.5, 0.5, 0.5, 0.5],
        );
        sim.tick();
        assert_eq!(sim.entities().len(), 1);
        assert!(sim.entities()[0].is_haven());
        sim.tick();
        assert_eq!(sim.entities().len(), 1, "one haven on the road at a time");
    }

    #[test]
    fn pause_freezes_and_abandon_returns_to_title() {
        let mut sim = playing();
        assert!(!sim.abandon(), "must be paused first");
        sim.key_down(Key::Pause);
        assert!(sim.is_paused());
        let frozen = sim.snapshot();
        assert!(sim.tick().is_idle());
        assert_eq!(sim.recruit(), RecruitOutcome::Unavailable);
        assert_eq!(sim.snapshot(), frozen);
        assert!(sim.abandon());
        assert_eq!(sim.status(), GameStatus::Title);
        assert!(!sim.is_paused());
        assert_eq!(cues(&mut sim), vec![SoundCue::Select, SoundCue::Select]);
        assert!(!sim.toggle_pause());
    }

    #[test]
    fn entities_scroll_and_despawn() {
        let mut sim = playing();
        let mut coin = entity(
            3,
            -140.0,
            600.0,
            EntityKind::Coin {
                tier: CoinTier::Small,
            },
        );
        coin.speed_multiplier = 1.0;
        sim.place(coin.clone());
        coin.id = 4;
        coin.x = 800.0;
        coin.speed_multiplier = 0.5;
        sim.place(coin);
        sim.tick();
        assert_eq!(sim.entities().len(), 2);
        assert!((sim.entities()[0].x + 144.0).abs() < 1e-4);
        sim.tick();
        sim.tick();
        assert_eq!(sim.entities().len(), 1);
        assert!((sim.entities()[0].x - 794.0).abs() < 1e-4);
    }
}
