#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Mob Runner engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. The session submits [`Command`]
//! values describing desired population mutations, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! that the session routes to the active phase and to the [`Presenter`].
//! Level triggers travel separately as [`SessionEvent`] values raised by the
//! [`LevelStreaming`] collaborator.

use std::time::Duration;

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Mob Runner.";

/// Side a simulated mob fights for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MobKind {
    /// Member of the swarm following the leader.
    Player,
    /// Member of an opposing encounter swarm.
    Enemy,
}

impl MobKind {
    /// Every mob kind in bucket order.
    pub const ALL: [MobKind; 2] = [MobKind::Player, MobKind::Enemy];
}

/// Unique identifier assigned to a mob or to the leader.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MobId(u32);

impl MobId {
    /// Creates a new mob identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Reason a mob left the registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DespawnCause {
    /// Eliminated by contact with an opposing mob.
    Killed,
    /// Removed by gameplay rules such as a subtracting gate.
    Culled,
    /// Removed while the registry was reset between runs.
    Cleared,
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Creates a mob of the provided kind at a position.
    SpawnMob {
        /// Side the new mob fights for.
        kind: MobKind,
        /// Initial position in world units.
        position: Vec2,
    },
    /// Removes a mob by identity.
    DespawnMob {
        /// Identifier of the mob to remove. The leader identity reports a death.
        mob: MobId,
        /// Reason recorded on the emitted event.
        cause: DespawnCause,
    },
    /// Removes a uniformly random mob of the provided kind.
    DespawnRandom {
        /// Bucket to remove from.
        kind: MobKind,
    },
    /// Removes every mob without reporting a leader death.
    ClearPopulation,
    /// Overwrites a mob's velocity after force application.
    SetVelocity {
        /// Identifier of the mob being steered.
        mob: MobId,
        /// New velocity in world units per second.
        velocity: Vec2,
    },
    /// Rigidly translates every mob of one kind.
    ShiftMobs {
        /// Bucket to translate.
        kind: MobKind,
        /// Translation applied to every member.
        delta: Vec2,
    },
    /// Integrates velocities and resolves contacts for one fixed step.
    Tick {
        /// Duration of simulated time covered by the step.
        dt: Duration,
        /// Leader position taking part in contact resolution.
        leader: Vec2,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the physics clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that a mob joined the registry.
    MobSpawned {
        /// Identifier assigned to the new mob.
        mob: MobId,
        /// Side the mob fights for.
        kind: MobKind,
        /// Position the mob spawned at.
        position: Vec2,
    },
    /// Reports that a spawn was refused because the registry is full.
    SpawnRefused {
        /// Kind of mob that could not be created.
        kind: MobKind,
    },
    /// Confirms that a mob left the registry.
    MobDespawned {
        /// Identifier of the removed mob.
        mob: MobId,
        /// Side the mob fought for.
        kind: MobKind,
        /// Reason the mob was removed.
        cause: DespawnCause,
    },
    /// Announces that the leader died or the player swarm is exhausted.
    LeaderDied,
    /// Reports a despawn request for an identity unknown to the registry.
    DespawnRejected {
        /// Identifier that matched neither a live mob nor the leader.
        mob: MobId,
    },
}

/// Immutable representation of a single mob used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MobSnapshot {
    /// Unique identifier assigned to the mob.
    pub id: MobId,
    /// Side the mob fights for.
    pub kind: MobKind,
    /// Index of the mob inside its kind bucket, used as its formation slot.
    pub slot: usize,
    /// Current position in world units.
    pub position: Vec2,
    /// Current velocity in world units per second.
    pub velocity: Vec2,
}

/// Read-only snapshot describing every live mob.
#[derive(Clone, Debug, Default)]
pub struct MobView {
    snapshots: Vec<MobSnapshot>,
}

impl MobView {
    /// Creates a new mob view, ordering snapshots by kind and then by slot.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<MobSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| (snapshot.kind, snapshot.slot));
        Self { snapshots }
    }

    /// Iterator over every captured snapshot in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &MobSnapshot> {
        self.snapshots.iter()
    }

    /// Iterator over the snapshots of a single kind in slot order.
    pub fn of_kind(&self, kind: MobKind) -> impl Iterator<Item = &MobSnapshot> {
        self.snapshots
            .iter()
            .filter(move |snapshot| snapshot.kind == kind)
    }
}

/// Named phases of a gameplay session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SessionPhase {
    /// Main menu waiting for the start button.
    InMenu,
    /// Transient phase that spawns the initial swarm.
    GameStart,
    /// The leader runs forward through the course.
    GameMoving,
    /// Both swarms are drawn into a fight.
    GameEncounter,
    /// The finish line was crossed and the score is being tallied.
    LevelFinished,
    /// The leader died.
    GameOver,
}

/// Discrete events routed to the active session phase.
#[derive(Clone, Debug, PartialEq)]
pub enum SessionEvent {
    /// The leader entered an encounter zone.
    EncounterTriggered {
        /// Point both swarms are drawn toward.
        battlefield: Vec2,
        /// Number of enemies joining the fight.
        enemy_count: u32,
    },
    /// The leader crossed the finish line.
    LevelFinished,
    /// The leader passed through a mob gate.
    GateTriggered {
        /// Gate that was passed.
        gate: Gate,
        /// Position new members appear at when the gate adds mobs.
        spawn_point: Vec2,
    },
    /// The leader died.
    LeaderDied,
}

/// Buttons the player can press outside of lateral steering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Button {
    /// Starts a run from the menu.
    Start,
    /// Skips or confirms the end-of-run screens.
    Confirm,
}

/// Arithmetic applied by a mob gate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateKind {
    /// Adds a fixed number of members.
    Add,
    /// Removes a fixed number of members.
    Subtract,
    /// Multiplies the swarm size.
    Multiply,
    /// Divides the swarm size.
    Divide,
}

/// Gate the leader may pass through, changing the swarm size.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Gate {
    kind: GateKind,
    value: u32,
}

impl Gate {
    /// Creates a gate applying `kind` with the provided operand.
    #[must_use]
    pub const fn new(kind: GateKind, value: u32) -> Self {
        Self { kind, value }
    }

    /// Arithmetic applied by the gate.
    #[must_use]
    pub const fn kind(&self) -> GateKind {
        self.kind
    }

    /// Operand applied by the gate.
    #[must_use]
    pub const fn value(&self) -> u32 {
        self.value
    }
}

/// Scores required for each of the three stars of a level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StarThresholds([u32; 3]);

impl StarThresholds {
    /// Creates thresholds from the three star scores.
    #[must_use]
    pub const fn new(scores: [u32; 3]) -> Self {
        Self(scores)
    }

    /// Returns the three star scores in reveal order.
    #[must_use]
    pub const fn scores(&self) -> [u32; 3] {
        self.0
    }

    /// Number of stars earned by the provided score.
    #[must_use]
    pub fn stars_for(&self, score: u64) -> u8 {
        self.0
            .iter()
            .filter(|threshold| score >= u64::from(**threshold))
            .count() as u8
    }
}

impl Default for StarThresholds {
    fn default() -> Self {
        Self([100, 300, 500])
    }
}

/// UI screens toggled by session phases.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Screen {
    /// Main menu with the start button.
    MainMenu,
    /// Heads-up display shown while running.
    Run,
    /// Score tally shown after the finish line.
    LevelComplete,
    /// Screen shown after the leader died.
    GameOver,
}

/// Sound cues requested by the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Sound {
    /// A mob joined the swarm.
    Spawn,
    /// A mob left the swarm.
    Despawn,
    /// The finish line was crossed.
    Finish,
}

/// Numbers displayed by the heads-up display.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Counter {
    /// Player swarm size including the leader.
    Population,
    /// Distance travelled by the leader in whole units.
    Distance,
    /// Score accumulated by the tally.
    Score,
}

/// Level streaming collaborator owning course geometry and world triggers.
pub trait LevelStreaming {
    /// Activates the level at `index`, resetting its triggers.
    ///
    /// Returns `false` when no such level exists.
    fn load_level(&mut self, index: usize) -> bool;

    /// Star thresholds configured for the level at `index`.
    fn level_setting(&self, index: usize) -> Option<StarThresholds>;

    /// Streams segments around the leader and raises crossed triggers.
    ///
    /// Implementations report at most one trigger per call and keep any
    /// other crossed trigger armed until a later call. Passing the end of
    /// the level raises [`SessionEvent::LevelFinished`].
    fn on_leader_moved(&mut self, dt: Duration, leader: Vec2, out: &mut Vec<SessionEvent>);
}

/// Visual, audio and UI collaborator driven by the session.
pub trait Presenter {
    /// Shows a UI screen.
    fn show_screen(&mut self, screen: Screen);

    /// Hides a UI screen.
    fn hide_screen(&mut self, screen: Screen);

    /// Plays a sound cue.
    fn play_sound(&mut self, sound: Sound);

    /// Instantiates the visual counterpart of a mob.
    fn spawn_visual(&mut self, mob: MobId, kind: MobKind, position: Vec2);

    /// Releases the visual counterpart of a mob.
    fn release_visual(&mut self, mob: MobId);

    /// Updates a displayed number.
    fn set_counter(&mut self, counter: Counter, value: u64);

    /// Reveals one of the three score stars.
    fn reveal_star(&mut self, index: u8);

    /// Observes a completed phase transition.
    fn phase_changed(&mut self, _from: SessionPhase, _to: SessionPhase) {}
}
