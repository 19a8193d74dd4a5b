#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure force solver that steers swarm members through velocity commands.
//!
//! Every force is a velocity change applied once per fixed tick. The solver
//! reads an immutable [`MobView`] and answers with [`Command::SetVelocity`]
//! and [`Command::ShiftMobs`] batches for the world to apply.

use glam::Vec2;
use mob_runner_core::{Command, MobKind, MobView};
use mob_runner_system_formation::FormationLayout;

const DEFAULT_COHESION_FORCE: f32 = 0.02;
const DEFAULT_FORMATION_FORCE: f32 = 0.4;
const DEFAULT_ENCOUNTER_FORCE: f32 = 1.5;
const DEFAULT_MAX_SPEED: f32 = 8.0;
const DEFAULT_MIN_PULL_DISTANCE: f32 = 0.05;

/// Configuration parameters required to construct the force solver.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config {
    cohesion_force: f32,
    formation_force: f32,
    encounter_force: f32,
    max_speed: f32,
    min_pull_distance: f32,
}

impl Config {
    /// Creates a new configuration.
    ///
    /// `min_pull_distance` floors the distance used to normalise encounter
    /// pulls so a mob standing on the battlefield point stays finite.
    #[must_use]
    pub const fn new(
        cohesion_force: f32,
        formation_force: f32,
        encounter_force: f32,
        max_speed: f32,
        min_pull_distance: f32,
    ) -> Self {
        Self {
            cohesion_force,
            formation_force,
            encounter_force,
            max_speed,
            min_pull_distance,
        }
    }

    /// Strength of the pull toward the swarm centre.
    #[must_use]
    pub const fn cohesion_force(&self) -> f32 {
        self.cohesion_force
    }

    /// Strength of the pull toward each member's formation slot.
    #[must_use]
    pub const fn formation_force(&self) -> f32 {
        self.formation_force
    }

    /// Strength of the pull toward the battlefield point.
    #[must_use]
    pub const fn encounter_force(&self) -> f32 {
        self.encounter_force
    }

    /// Floor of the distance used to normalise encounter pulls.
    #[must_use]
    pub const fn min_pull_distance(&self) -> f32 {
        self.min_pull_distance
    }

    /// Maximum speed any steered mob may reach.
    #[must_use]
    pub const fn max_speed(&self) -> f32 {
        self.max_speed
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(
            DEFAULT_COHESION_FORCE,
            DEFAULT_FORMATION_FORCE,
            DEFAULT_ENCOUNTER_FORCE,
            DEFAULT_MAX_SPEED,
            DEFAULT_MIN_PULL_DISTANCE,
        )
    }
}

/// Computes cohesion, formation and encounter forces.
#[derive(Clone, Debug, Default)]
pub struct ForceSolver {
    config: Config,
}

impl ForceSolver {
    /// Creates a solver using the supplied configuration.
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config }
    }

    /// Pulls every player mob toward the leader and toward its formation slot.
    ///
    /// Both pulls grow with the squared distance to their target so
    /// stragglers catch up quickly. The resulting velocity is clamped.
    pub fn apply_cohesion(
        &self,
        mobs: &MobView,
        leader: Vec2,
        layout: &FormationLayout,
        out: &mut Vec<Command>,
    ) {
        for mob in mobs.of_kind(MobKind::Player) {
            let mut velocity = mob.velocity;
            velocity += squared_pull(leader - mob.position, self.config.cohesion_force);
            if let Some(offset) = layout.offset(mob.slot) {
                velocity +=
                    squared_pull(leader + offset - mob.position, self.config.formation_force);
            }

            out.push(Command::SetVelocity {
                mob: mob.id,
                velocity: velocity.clamp_length_max(self.config.max_speed),
            });
        }
    }

    /// Translates the player swarm rigidly alongside the leader's lane shift.
    pub fn shift_swarm(&self, delta: Vec2, out: &mut Vec<Command>) {
        if delta == Vec2::ZERO {
            return;
        }
        out.push(Command::ShiftMobs {
            kind: MobKind::Player,
            delta,
        });
    }

    /// Draws every mob of both kinds toward the battlefield point.
    pub fn apply_encounter_force(&self, mobs: &MobView, battlefield: Vec2, out: &mut Vec<Command>) {
        for mob in mobs.iter() {
            let velocity = mob.velocity + self.encounter_pull(battlefield - mob.position);
            out.push(Command::SetVelocity {
                mob: mob.id,
                velocity: velocity.clamp_length_max(self.config.max_speed),
            });
        }
    }

    /// Velocity drawing the leader alone toward the battlefield point.
    ///
    /// Used once the player swarm is gone but the fight is not over.
    #[must_use]
    pub fn leader_encounter_velocity(&self, leader: Vec2, battlefield: Vec2) -> Vec2 {
        self.encounter_pull(battlefield - leader)
            .clamp_length_max(self.config.max_speed)
    }

    fn encounter_pull(&self, to_target: Vec2) -> Vec2 {
        let distance = to_target.length();
        let direction = to_target / distance.max(self.config.min_pull_distance);
        direction * distance * self.config.encounter_force
    }

    /// Configuration the solver runs with.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }
}

/// Velocity change along `to_target` scaled by its squared length.
fn squared_pull(to_target: Vec2, strength: f32) -> Vec2 {
    to_target * to_target.length() * strength
}
