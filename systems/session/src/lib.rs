#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Gameplay session driver for Mob Runner.
//!
//! A [`Session`] owns the world and every pure system, and receives its two
//! collaborators, a [`LevelStreaming`] implementation and a [`Presenter`],
//! at construction. It runs a closed set of phases:
//!
//! ```text
//! InMenu -> GameStart -> GameMoving <-> GameEncounter
//!                            |               |
//!                            v               v
//!                      LevelFinished ---> GameOver -> InMenu
//! ```
//!
//! Every transition runs the exit action of the old phase to completion
//! before the enter action of the new one. Events are routed to whichever
//! phase is active when they arrive and are never held back for the next.

mod config;

use std::time::Duration;

use glam::Vec2;
use mob_runner_core::{
    Button, Command, Counter, Event, Gate, LevelStreaming, MobId, MobKind, Presenter, Screen,
    SessionEvent, SessionPhase, Sound,
};
use mob_runner_system_forces::ForceSolver;
use mob_runner_system_formation::{FormationError, FormationLayout};
use mob_runner_system_gates::{self as gates, GateSpawner};
use mob_runner_system_movement::MovementIntegrator;
use mob_runner_system_scoring::{ScoringSequencer, ScoringStep};
use mob_runner_world::{self as world, query, World};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, UnitDisc};
use thiserror::Error;

pub use config::Config;

/// Failures that stop a session.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The formation table cannot seat the configured swarm.
    #[error("invalid formation configuration: {0}")]
    Formation(#[from] FormationError),
    /// More initial members were requested than the swarm may hold.
    #[error("initial population {initial} exceeds the maximum of {max}")]
    InitialPopulationTooLarge {
        /// Configured initial population.
        initial: usize,
        /// Configured maximum player population.
        max: usize,
    },
    /// The registry capacity cannot hold the configured swarm.
    #[error("registry capacity {capacity} cannot hold a swarm of {population}")]
    RegistryTooSmall {
        /// Configured maximum player population.
        population: usize,
        /// Configured registry capacity.
        capacity: usize,
    },
    /// Neither the requested level nor the fallback level could be loaded.
    #[error("no playable level: level {requested} and the fallback level failed to load")]
    NoPlayableLevel {
        /// Level index that was requested.
        requested: usize,
    },
    /// The registry was asked to remove a mob it never knew about.
    #[error("registry has no record of mob {mob:?}")]
    RegistryDesync {
        /// Identity that matched neither a live mob nor the leader.
        mob: MobId,
    },
}

/// Outcome of the most recent score tally.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LevelResult {
    /// Final score.
    pub score: u64,
    /// Stars earned.
    pub stars: u8,
}

/// Active phase together with the state only that phase owns.
#[derive(Debug)]
enum Phase {
    InMenu,
    GameStart,
    GameMoving,
    GameEncounter { battlefield: Vec2 },
    LevelFinished { scoring: Option<ScoringSequencer> },
    GameOver,
}

impl Phase {
    fn kind(&self) -> SessionPhase {
        match self {
            Self::InMenu => SessionPhase::InMenu,
            Self::GameStart => SessionPhase::GameStart,
            Self::GameMoving => SessionPhase::GameMoving,
            Self::GameEncounter { .. } => SessionPhase::GameEncounter,
            Self::LevelFinished { .. } => SessionPhase::LevelFinished,
            Self::GameOver => SessionPhase::GameOver,
        }
    }
}

const FALLBACK_LEVEL: usize = 0;

/// Finite-state machine driving one player's gameplay session.
#[derive(Debug)]
pub struct Session<L, P> {
    config: Config,
    world: World,
    layout: FormationLayout,
    movement: MovementIntegrator,
    forces: ForceSolver,
    gate_spawner: GateSpawner,
    levels: L,
    presenter: P,
    phase: Phase,
    level_index: usize,
    pending_input: Option<f32>,
    rng: ChaCha8Rng,
    last_result: Option<LevelResult>,
    fault: Option<SessionError>,
}

impl<L, P> Session<L, P>
where
    L: LevelStreaming,
    P: Presenter,
{
    /// Validates `config`, builds every system and enters the menu on level 0.
    pub fn new(config: Config, levels: L, presenter: P) -> Result<Self, SessionError> {
        let layout = config.formation_layout();
        config.validate(&layout)?;

        let mut session = Self {
            world: World::new(config.world),
            movement: MovementIntegrator::new(config.movement, config.leader_start),
            forces: ForceSolver::new(config.forces),
            gate_spawner: GateSpawner::new(config.gates),
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
            layout,
            levels,
            presenter,
            phase: Phase::InMenu,
            level_index: 0,
            pending_input: None,
            last_result: None,
            fault: None,
            config,
        };
        let _ = session.enter();
        session.check_fault()?;
        Ok(session)
    }

    /// Currently active phase.
    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.phase.kind()
    }

    /// Index of the level loaded by the menu.
    #[must_use]
    pub const fn level_index(&self) -> usize {
        self.level_index
    }

    /// Read-only access to the population registry.
    #[must_use]
    pub const fn world(&self) -> &World {
        &self.world
    }

    /// Current leader position.
    #[must_use]
    pub fn leader(&self) -> Vec2 {
        self.movement.position()
    }

    /// Forward distance covered in the current level.
    #[must_use]
    pub fn distance_travelled(&self) -> f32 {
        self.movement.distance_travelled()
    }

    /// Formation table used for spawning and cohesion.
    #[must_use]
    pub const fn layout(&self) -> &FormationLayout {
        &self.layout
    }

    /// Tally running in the level-finished phase, if any.
    #[must_use]
    pub fn scoring(&self) -> Option<&ScoringSequencer> {
        match &self.phase {
            Phase::LevelFinished { scoring } => scoring.as_ref(),
            _ => None,
        }
    }

    /// Outcome of the most recently completed tally.
    #[must_use]
    pub const fn last_result(&self) -> Option<LevelResult> {
        self.last_result
    }

    /// Members still queued by gates.
    #[must_use]
    pub fn pending_gate_spawns(&self) -> u32 {
        self.gate_spawner.pending()
    }

    /// Level streaming collaborator.
    #[must_use]
    pub const fn levels(&self) -> &L {
        &self.levels
    }

    /// Mutable access to the level streaming collaborator.
    pub fn levels_mut(&mut self) -> &mut L {
        &mut self.levels
    }

    /// Presentation collaborator.
    #[must_use]
    pub const fn presenter(&self) -> &P {
        &self.presenter
    }

    /// Records the normalized lateral input sampled this frame.
    ///
    /// Only the latest sample before the next variable tick is used.
    pub fn record_lateral_input(&mut self, normalized: f32) {
        self.pending_input = Some(normalized);
    }

    /// Delivers a button press to the active phase.
    pub fn press(&mut self, button: Button) -> Result<(), SessionError> {
        self.check_fault()?;
        match (self.phase.kind(), button) {
            (SessionPhase::InMenu, Button::Start) => self.change_phase(Phase::GameStart),
            (SessionPhase::LevelFinished, Button::Confirm) => {
                if let Phase::LevelFinished {
                    scoring: Some(scoring),
                } = &mut self.phase
                {
                    tracing::debug!("score tally skipped");
                    scoring.skip();
                } else {
                    self.level_index += 1;
                    self.change_phase(Phase::InMenu);
                }
            }
            (SessionPhase::GameOver, Button::Confirm) => {
                self.level_index = FALLBACK_LEVEL;
                self.change_phase(Phase::InMenu);
            }
            (phase, button) => tracing::trace!(?phase, ?button, "button ignored"),
        }
        self.check_fault()
    }

    /// Raises a discrete event on the session's event bus.
    pub fn raise(&mut self, event: SessionEvent) -> Result<(), SessionError> {
        self.check_fault()?;
        self.on_event(event);
        self.check_fault()
    }

    /// Applies a command to the registry and routes the resulting events.
    pub fn submit(&mut self, command: Command) -> Result<(), SessionError> {
        self.check_fault()?;
        self.execute(command);
        self.check_fault()
    }

    /// Runs the variable-rate part of a frame.
    pub fn tick(&mut self, dt: Duration) -> Result<(), SessionError> {
        self.check_fault()?;
        let input = self.pending_input.take();

        match self.phase.kind() {
            SessionPhase::GameMoving => {
                if let Some(normalized) = input {
                    self.movement
                        .record_lateral_input(normalized * self.config.lateral_sensitivity);
                }
                self.advance_gate_spawner(dt);
                self.stream_level(dt);
                self.refresh_counters();
            }
            SessionPhase::GameEncounter => {
                self.advance_gate_spawner(dt);
                self.refresh_counters();
            }
            SessionPhase::LevelFinished => self.advance_scoring(dt),
            SessionPhase::InMenu | SessionPhase::GameStart | SessionPhase::GameOver => {}
        }
        self.check_fault()
    }

    /// Runs one fixed-rate physics step.
    pub fn fixed_tick(&mut self, dt: Duration) -> Result<(), SessionError> {
        self.check_fault()?;
        match self.phase {
            Phase::GameMoving => self.run_step(dt),
            Phase::GameEncounter { battlefield } => self.encounter_step(dt, battlefield),
            _ => {}
        }
        self.check_fault()
    }

    fn check_fault(&self) -> Result<(), SessionError> {
        match &self.fault {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    fn halt(&mut self, error: SessionError) {
        tracing::error!(%error, "session halted");
        if self.fault.is_none() {
            self.fault = Some(error);
        }
    }

    fn change_phase(&mut self, next: Phase) {
        let mut next = next;
        loop {
            let from = self.phase.kind();
            self.exit();
            self.phase = next;
            let to = self.phase.kind();
            tracing::info!(?from, ?to, level = self.level_index, "phase changed");
            self.presenter.phase_changed(from, to);

            match self.enter() {
                Some(following) => next = following,
                None => break,
            }
        }
    }

    /// Runs the enter action of the active phase. Transient phases name the
    /// phase that follows them.
    fn enter(&mut self) -> Option<Phase> {
        match self.phase.kind() {
            SessionPhase::InMenu => {
                self.presenter.show_screen(Screen::MainMenu);
                self.gate_spawner.clear();
                self.execute(Command::ClearPopulation);
                self.movement.reset(self.config.leader_start);
                self.load_level();
                self.refresh_counters();
                None
            }
            SessionPhase::GameStart => {
                self.spawn_initial_population();
                Some(Phase::GameMoving)
            }
            SessionPhase::GameMoving => {
                self.presenter.show_screen(Screen::Run);
                None
            }
            SessionPhase::GameEncounter => None,
            SessionPhase::LevelFinished => {
                self.presenter.play_sound(Sound::Finish);
                self.presenter.show_screen(Screen::LevelComplete);
                self.presenter.set_counter(Counter::Score, 0);

                let thresholds = self
                    .levels
                    .level_setting(self.level_index)
                    .unwrap_or_default();
                let distance = self.movement.distance_travelled().floor() as u64;
                let remaining = query::count_of(&self.world, MobKind::Player) as u32;
                tracing::info!(distance, remaining, "score tally started");
                self.phase = Phase::LevelFinished {
                    scoring: Some(ScoringSequencer::new(
                        self.config.scoring,
                        distance,
                        remaining,
                        thresholds,
                    )),
                };
                None
            }
            SessionPhase::GameOver => {
                self.presenter.show_screen(Screen::GameOver);
                None
            }
        }
    }

    fn exit(&mut self) {
        match self.phase.kind() {
            SessionPhase::InMenu => self.presenter.hide_screen(Screen::MainMenu),
            SessionPhase::GameMoving => self.presenter.hide_screen(Screen::Run),
            SessionPhase::LevelFinished => self.presenter.hide_screen(Screen::LevelComplete),
            SessionPhase::GameOver => self.presenter.hide_screen(Screen::GameOver),
            SessionPhase::GameStart | SessionPhase::GameEncounter => {}
        }
    }

    fn on_event(&mut self, event: SessionEvent) {
        match (self.phase.kind(), event) {
            (SessionPhase::GameMoving, SessionEvent::EncounterTriggered {
                battlefield,
                enemy_count,
            }) => {
                tracing::info!(enemy_count, "encounter triggered");
                self.spawn_enemies(battlefield, enemy_count);
                self.change_phase(Phase::GameEncounter { battlefield });
            }
            (SessionPhase::GameMoving, SessionEvent::LevelFinished) => {
                self.change_phase(Phase::LevelFinished { scoring: None });
            }
            (SessionPhase::GameMoving, SessionEvent::GateTriggered { gate, spawn_point }) => {
                self.apply_gate(gate, spawn_point);
            }
            (
                SessionPhase::GameMoving
                | SessionPhase::GameEncounter
                | SessionPhase::LevelFinished,
                SessionEvent::LeaderDied,
            ) => {
                tracing::info!("leader died");
                self.change_phase(Phase::GameOver);
            }
            (phase, event) => tracing::trace!(?phase, ?event, "event ignored"),
        }
    }

    fn execute(&mut self, command: Command) {
        let mut events = Vec::new();
        world::apply(&mut self.world, command, &mut events);
        for event in events {
            self.on_world_event(event);
        }
    }

    fn execute_all(&mut self, commands: Vec<Command>) {
        for command in commands {
            self.execute(command);
        }
    }

    fn on_world_event(&mut self, event: Event) {
        match event {
            Event::MobSpawned {
                mob,
                kind,
                position,
            } => {
                self.presenter.spawn_visual(mob, kind, position);
                if kind == MobKind::Player {
                    self.presenter.play_sound(Sound::Spawn);
                }
            }
            Event::MobDespawned { mob, kind, .. } => {
                self.presenter.release_visual(mob);
                if kind == MobKind::Player {
                    self.presenter.play_sound(Sound::Despawn);
                }
            }
            Event::LeaderDied => self.on_event(SessionEvent::LeaderDied),
            Event::DespawnRejected { mob } => self.halt(SessionError::RegistryDesync { mob }),
            Event::TimeAdvanced { .. } | Event::SpawnRefused { .. } => {}
        }
    }

    fn load_level(&mut self) {
        if self.levels.load_level(self.level_index) {
            tracing::info!(level = self.level_index, "level loaded");
            return;
        }

        tracing::warn!(
            level = self.level_index,
            fallback = FALLBACK_LEVEL,
            "level failed to load, falling back"
        );
        let requested = self.level_index;
        self.level_index = FALLBACK_LEVEL;
        if !self.levels.load_level(FALLBACK_LEVEL) {
            self.halt(SessionError::NoPlayableLevel { requested });
        }
    }

    fn spawn_initial_population(&mut self) {
        let leader = self.movement.position();
        for _ in 0..self.config.initial_population {
            let slot = query::count_of(&self.world, MobKind::Player);
            let offset = match self.layout.try_offset(slot) {
                Ok(offset) => offset,
                Err(error) => {
                    self.halt(SessionError::Formation(error));
                    break;
                }
            };
            self.execute(Command::SpawnMob {
                kind: MobKind::Player,
                position: leader + offset,
            });
        }
        tracing::debug!(
            spawned = query::count_of(&self.world, MobKind::Player),
            "initial population spawned"
        );
    }

    fn spawn_enemies(&mut self, battlefield: Vec2, count: u32) {
        for _ in 0..count {
            let [x, y]: [f32; 2] = UnitDisc.sample(&mut self.rng);
            let scatter = Vec2::new(x, y) * self.config.enemy_scatter_radius;
            self.execute(Command::SpawnMob {
                kind: MobKind::Enemy,
                position: battlefield + scatter,
            });
        }
    }

    /// Applies a gate using the swarm size at the moment it triggers.
    fn apply_gate(&mut self, gate: Gate, spawn_point: Vec2) {
        let players = query::count_of(&self.world, MobKind::Player);
        let current = u32::try_from(players + 1).unwrap_or(u32::MAX);
        let delta = gates::mob_delta(gate, current);
        tracing::debug!(
            gate = %gates::label(gate),
            current,
            delta,
            "gate triggered"
        );

        if delta > 0 {
            let queued = players + self.gate_spawner.pending() as usize;
            let room = self.config.max_player_population.saturating_sub(queued);
            let amount = usize::try_from(delta).unwrap_or(usize::MAX).min(room);
            self.gate_spawner.queue(amount as u32, spawn_point);
            return;
        }

        for _ in 0..delta.unsigned_abs() {
            if self.phase.kind() != SessionPhase::GameMoving {
                break;
            }
            self.execute(Command::DespawnRandom {
                kind: MobKind::Player,
            });
        }
    }

    fn advance_gate_spawner(&mut self, dt: Duration) {
        let mut commands = Vec::new();
        self.gate_spawner.advance(dt, &mut commands);
        self.execute_all(commands);
    }

    fn stream_level(&mut self, dt: Duration) {
        let mut triggers = Vec::new();
        self.levels
            .on_leader_moved(dt, self.movement.position(), &mut triggers);
        for trigger in triggers {
            if self.phase.kind() != SessionPhase::GameMoving {
                tracing::debug!(?trigger, "trigger dropped after leaving the run");
                break;
            }
            self.on_event(trigger);
        }
    }

    fn run_step(&mut self, dt: Duration) {
        let population = query::count_of(&self.world, MobKind::Player) + 1;
        let lateral = self.movement.advance_fixed_tick(dt, population);
        let leader = self.movement.position();

        let mut commands = Vec::new();
        let view = query::mob_view(&self.world);
        self.forces
            .apply_cohesion(&view, leader, &self.layout, &mut commands);
        self.forces
            .shift_swarm(Vec2::new(lateral, 0.0), &mut commands);
        commands.push(Command::Tick { dt, leader });
        self.execute_all(commands);
    }

    fn encounter_step(&mut self, dt: Duration, battlefield: Vec2) {
        if query::count_of(&self.world, MobKind::Player) == 0 {
            let velocity = self
                .forces
                .leader_encounter_velocity(self.movement.position(), battlefield);
            self.movement.displace(velocity * dt.as_secs_f32());
        }

        let mut commands = Vec::new();
        let view = query::mob_view(&self.world);
        self.forces
            .apply_encounter_force(&view, battlefield, &mut commands);
        commands.push(Command::Tick {
            dt,
            leader: self.movement.position(),
        });
        self.execute_all(commands);

        if self.phase.kind() == SessionPhase::GameEncounter
            && query::count_of(&self.world, MobKind::Enemy) == 0
        {
            tracing::info!(
                survivors = query::count_of(&self.world, MobKind::Player),
                "encounter won"
            );
            self.change_phase(Phase::GameMoving);
        }
    }

    fn advance_scoring(&mut self, dt: Duration) {
        let mut steps = Vec::new();
        let finished = match &mut self.phase {
            Phase::LevelFinished {
                scoring: Some(scoring),
            } => scoring.advance(dt, &mut steps),
            _ => return,
        };

        for step in steps {
            match step {
                ScoringStep::MemberConverted { score, .. } => {
                    self.presenter.set_counter(Counter::Score, score);
                }
                ScoringStep::StarRevealed { index } => self.presenter.reveal_star(index),
                ScoringStep::Completed { score, stars } => {
                    tracing::info!(score, stars, level = self.level_index, "score tally completed");
                    self.last_result = Some(LevelResult { score, stars });
                }
            }
        }

        if finished {
            self.phase = Phase::LevelFinished { scoring: None };
        }
    }

    fn refresh_counters(&mut self) {
        let population = query::count_of(&self.world, MobKind::Player) as u64 + 1;
        self.presenter.set_counter(Counter::Population, population);
        self.presenter.set_counter(
            Counter::Distance,
            self.movement.distance_travelled().floor() as u64,
        );
    }
}
