//! Optional TOML tuning file overriding the built-in system parameters.

use std::{fs, path::Path, time::Duration};

use anyhow::{bail, Context, Result};
use glam::Vec2;
use serde::Deserialize;

/// Every tunable parameter, grouped by the system that consumes it.
///
/// Missing tables and keys keep their defaults.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct Tuning {
    pub(crate) world: WorldTuning,
    pub(crate) movement: MovementTuning,
    pub(crate) forces: ForceTuning,
    pub(crate) scoring: ScoringTuning,
    pub(crate) gates: GateTuning,
    pub(crate) swarm: SwarmTuning,
    pub(crate) course: CourseTuning,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct WorldTuning {
    pub(crate) capacity: usize,
    pub(crate) contact_radius: f32,
    pub(crate) linear_damping: f32,
    pub(crate) seed: u64,
    pub(crate) cull_half_width: f32,
    pub(crate) cull_behind: f32,
}

impl Default for WorldTuning {
    fn default() -> Self {
        let config = mob_runner_world::Config::default();
        Self {
            capacity: config.capacity(),
            contact_radius: config.contact_radius(),
            linear_damping: config.linear_damping(),
            seed: config.rng_seed(),
            cull_half_width: config.cull_half_width(),
            cull_behind: config.cull_behind(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct MovementTuning {
    pub(crate) forward_speed: f32,
    pub(crate) lane_half_width: f32,
    pub(crate) shrink_per_member: f32,
}

impl Default for MovementTuning {
    fn default() -> Self {
        let config = mob_runner_system_movement::Config::default();
        Self {
            forward_speed: config.forward_speed(),
            lane_half_width: config.base_half_width(),
            shrink_per_member: config.shrink_per_member(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct ForceTuning {
    pub(crate) cohesion: f32,
    pub(crate) formation: f32,
    pub(crate) encounter: f32,
    pub(crate) max_speed: f32,
    pub(crate) min_pull_distance: f32,
}

impl Default for ForceTuning {
    fn default() -> Self {
        let config = mob_runner_system_forces::Config::default();
        Self {
            cohesion: config.cohesion_force(),
            formation: config.formation_force(),
            encounter: config.encounter_force(),
            max_speed: config.max_speed(),
            min_pull_distance: config.min_pull_distance(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct ScoringTuning {
    pub(crate) conversion_interval_ms: u64,
    pub(crate) star_interval_ms: u64,
}

impl Default for ScoringTuning {
    fn default() -> Self {
        let config = mob_runner_system_scoring::Config::default();
        Self {
            conversion_interval_ms: millis(config.conversion_interval()),
            star_interval_ms: millis(config.star_interval()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct GateTuning {
    pub(crate) total_spawn_time_ms: u64,
}

impl Default for GateTuning {
    fn default() -> Self {
        let config = mob_runner_system_gates::Config::default();
        Self {
            total_spawn_time_ms: millis(config.total_spawn_time()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct SwarmTuning {
    pub(crate) formation_rings: u32,
    pub(crate) formation_spacing: f32,
    pub(crate) initial_population: u32,
    pub(crate) max_population: usize,
    pub(crate) lateral_sensitivity: f32,
    pub(crate) enemy_scatter_radius: f32,
    pub(crate) seed: u64,
}

impl Default for SwarmTuning {
    fn default() -> Self {
        let config = mob_runner_session::Config::default();
        Self {
            formation_rings: config.formation_rings,
            formation_spacing: config.formation_spacing,
            initial_population: config.initial_population,
            max_population: config.max_player_population,
            lateral_sensitivity: config.lateral_sensitivity,
            enemy_scatter_radius: config.enemy_scatter_radius,
            seed: config.rng_seed,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct CourseTuning {
    pub(crate) view_ahead: f32,
    pub(crate) view_behind: f32,
    pub(crate) gate_offset: f32,
}

impl Default for CourseTuning {
    fn default() -> Self {
        let config = mob_runner_levels::Config::default();
        Self {
            view_ahead: config.view_ahead(),
            view_behind: config.view_behind(),
            gate_offset: config.gate_offset(),
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl Tuning {
    /// Reads a tuning file.
    pub(crate) fn from_path(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read tuning file at {}", path.display()))?;
        Self::from_toml_str(&contents)
            .with_context(|| format!("failed to load tuning file at {}", path.display()))
    }

    pub(crate) fn from_toml_str(contents: &str) -> Result<Self> {
        let tuning: Self = toml::from_str(contents).context("failed to parse tuning toml")?;
        if tuning.course.view_ahead <= 0.0 {
            bail!("course.view_ahead must be positive");
        }
        if tuning.forces.max_speed <= 0.0 {
            bail!("forces.max_speed must be positive");
        }
        Ok(tuning)
    }

    /// Replaces both random seeds.
    pub(crate) fn reseed(&mut self, seed: u64) {
        self.world.seed = seed;
        self.swarm.seed = seed.rotate_left(32);
    }

    pub(crate) fn session_config(&self) -> mob_runner_session::Config {
        mob_runner_session::Config {
            world: mob_runner_world::Config::new(
                self.world.capacity,
                self.world.contact_radius,
                self.world.linear_damping,
                self.world.seed,
            )
            .with_cull_bounds(self.world.cull_half_width, self.world.cull_behind),
            movement: mob_runner_system_movement::Config::new(
                self.movement.forward_speed,
                self.movement.lane_half_width,
                self.movement.shrink_per_member,
            ),
            forces: mob_runner_system_forces::Config::new(
                self.forces.cohesion,
                self.forces.formation,
                self.forces.encounter,
                self.forces.max_speed,
                self.forces.min_pull_distance,
            ),
            scoring: mob_runner_system_scoring::Config::new(
                Duration::from_millis(self.scoring.conversion_interval_ms),
                Duration::from_millis(self.scoring.star_interval_ms),
            ),
            gates: mob_runner_system_gates::Config::new(Duration::from_millis(
                self.gates.total_spawn_time_ms,
            )),
            formation_rings: self.swarm.formation_rings,
            formation_spacing: self.swarm.formation_spacing,
            initial_population: self.swarm.initial_population,
            max_player_population: self.swarm.max_population,
            lateral_sensitivity: self.swarm.lateral_sensitivity,
            enemy_scatter_radius: self.swarm.enemy_scatter_radius,
            rng_seed: self.swarm.seed,
            leader_start: Vec2::ZERO,
        }
    }

    pub(crate) fn course_config(&self) -> mob_runner_levels::Config {
        mob_runner_levels::Config::new(
            self.course.view_ahead,
            self.course.view_behind,
            self.course.gate_offset,
        )
    }
}
