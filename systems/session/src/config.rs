use glam::Vec2;
use mob_runner_system_formation::FormationLayout;

use crate::SessionError;

/// Aggregated tuning for every system the session drives.
#[derive(Clone, Debug)]
pub struct Config {
    /// Registry capacity, contact radius, damping and random seed.
    pub world: mob_runner_world::Config,
    /// Forward speed and lane shape.
    pub movement: mob_runner_system_movement::Config,
    /// Cohesion, formation and encounter strengths.
    pub forces: mob_runner_system_forces::Config,
    /// Pauses of the end-of-level tally.
    pub scoring: mob_runner_system_scoring::Config,
    /// Pacing of members added by gates.
    pub gates: mob_runner_system_gates::Config,
    /// Outermost ring of the formation table.
    pub formation_rings: u32,
    /// Distance between neighbouring formation slots.
    pub formation_spacing: f32,
    /// Player mobs spawned when a run starts.
    pub initial_population: u32,
    /// Upper bound on the player swarm, excluding the leader.
    pub max_player_population: usize,
    /// World units of lateral movement per unit of normalized input.
    pub lateral_sensitivity: f32,
    /// Radius of the disc enemies are scattered over around the battlefield.
    pub enemy_scatter_radius: f32,
    /// Seed for enemy scatter.
    pub rng_seed: u64,
    /// Leader position at the start of every level.
    pub leader_start: Vec2,
}

impl Config {
    /// Builds the formation table described by this configuration.
    #[must_use]
    pub fn formation_layout(&self) -> FormationLayout {
        FormationLayout::new(self.formation_rings, self.formation_spacing)
    }

    /// Checks that the configured swarm fits the formation table and registry.
    pub fn validate(&self, layout: &FormationLayout) -> Result<(), SessionError> {
        layout.ensure_fits(self.max_player_population)?;

        let initial = self.initial_population as usize;
        if initial > self.max_player_population {
            return Err(SessionError::InitialPopulationTooLarge {
                initial,
                max: self.max_player_population,
            });
        }

        let capacity = self.world.capacity();
        if self.max_player_population > capacity {
            return Err(SessionError::RegistryTooSmall {
                population: self.max_player_population,
                capacity,
            });
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            world: mob_runner_world::Config::default(),
            movement: mob_runner_system_movement::Config::default(),
            forces: mob_runner_system_forces::Config::default(),
            scoring: mob_runner_system_scoring::Config::default(),
            gates: mob_runner_system_gates::Config::default(),
            formation_rings: 15,
            formation_spacing: 0.6,
            initial_population: 10,
            max_player_population: 600,
            lateral_sensitivity: 20.0,
            enemy_scatter_radius: 1.5,
            rng_seed: 0x5eed_cafe,
            leader_start: Vec2::ZERO,
        }
    }
}
