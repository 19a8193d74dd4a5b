#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Leader movement integrator.
//!
//! The leader advances along +y at a constant speed every fixed tick while
//! lateral input shifts it along x inside a lane. The lane narrows as the
//! swarm grows so the crowd's footprint stays on the track.

use std::{f32::consts::PI, time::Duration};

use glam::Vec2;

const DEFAULT_FORWARD_SPEED: f32 = 6.0;
const DEFAULT_BASE_HALF_WIDTH: f32 = 9.0;
const DEFAULT_SHRINK_PER_MEMBER: f32 = 0.6;

/// Configuration parameters required to construct the integrator.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config {
    forward_speed: f32,
    base_half_width: f32,
    shrink_per_member: f32,
}

impl Config {
    /// Creates a new configuration.
    ///
    /// `shrink_per_member` scales the radius of a disc holding the swarm, so
    /// it is usually the formation spacing.
    #[must_use]
    pub const fn new(forward_speed: f32, base_half_width: f32, shrink_per_member: f32) -> Self {
        Self {
            forward_speed,
            base_half_width,
            shrink_per_member,
        }
    }

    /// Forward speed in world units per second.
    #[must_use]
    pub const fn forward_speed(&self) -> f32 {
        self.forward_speed
    }

    /// Lane half-width of a lone leader.
    #[must_use]
    pub const fn base_half_width(&self) -> f32 {
        self.base_half_width
    }

    /// Lane shrink per unit of swarm radius.
    #[must_use]
    pub const fn shrink_per_member(&self) -> f32 {
        self.shrink_per_member
    }

    /// Lane half-width for the provided population.
    ///
    /// The swarm is treated as a disc of `population` unit cells, so the
    /// shrink follows its radius `sqrt(population / PI)`. Never negative.
    #[must_use]
    pub fn lane_half_width(&self, population: usize) -> f32 {
        let radius = (population as f32 / PI).sqrt();
        (self.base_half_width - self.shrink_per_member.max(0.0) * radius).max(0.0)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(
            DEFAULT_FORWARD_SPEED,
            DEFAULT_BASE_HALF_WIDTH,
            DEFAULT_SHRINK_PER_MEMBER,
        )
    }
}

/// Owns the leader position and integrates it on fixed ticks.
#[derive(Clone, Debug)]
pub struct MovementIntegrator {
    config: Config,
    start: Vec2,
    position: Vec2,
    pending_lateral: f32,
}

impl MovementIntegrator {
    /// Creates an integrator with the leader standing at `start`.
    #[must_use]
    pub fn new(config: Config, start: Vec2) -> Self {
        Self {
            config,
            start,
            position: start,
            pending_lateral: 0.0,
        }
    }

    /// Returns the leader to `start` and discards pending input.
    pub fn reset(&mut self, start: Vec2) {
        self.start = start;
        self.position = start;
        self.pending_lateral = 0.0;
    }

    /// Records the lateral delta sampled this frame. The latest sample wins.
    pub fn record_lateral_input(&mut self, delta_x: f32) {
        self.pending_lateral = delta_x;
    }

    /// Advances the leader by one fixed tick.
    ///
    /// Returns the lateral delta actually applied after clamping to the lane,
    /// so callers can shift the swarm by the same amount.
    pub fn advance_fixed_tick(&mut self, dt: Duration, population: usize) -> f32 {
        let half_width = self.config.lane_half_width(population);
        let target_x = (self.position.x + self.pending_lateral).clamp(-half_width, half_width);
        let applied = target_x - self.position.x;

        self.position.x = target_x;
        self.position.y += self.config.forward_speed * dt.as_secs_f32();
        self.pending_lateral = 0.0;
        applied
    }

    /// Moves the leader without lane clamping.
    pub fn displace(&mut self, delta: Vec2) {
        self.position += delta;
    }

    /// Current leader position.
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        self.position
    }

    /// Lateral delta waiting for the next fixed tick.
    #[must_use]
    pub const fn pending_lateral(&self) -> f32 {
        self.pending_lateral
    }

    /// Forward distance covered since the last reset.
    #[must_use]
    pub fn distance_travelled(&self) -> f32 {
        (self.position.y - self.start.y).max(0.0)
    }

    /// Configuration the integrator runs with.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }
}
