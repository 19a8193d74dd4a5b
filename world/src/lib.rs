#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative population state for Mob Runner.
//!
//! The world owns every live mob, grouped into one bucket per [`MobKind`].
//! It is mutated exclusively through [`apply`], which also stands in for the
//! physics collaborator: [`Command::Tick`] integrates velocities, culls mobs
//! that strayed out of bounds and resolves lethal contacts between opposing
//! mobs before returning.

use std::time::Duration;

use glam::Vec2;
use mob_runner_core::{Command, DespawnCause, Event, MobId, MobKind};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const DEFAULT_CAPACITY: usize = 1_024;
const DEFAULT_CONTACT_RADIUS: f32 = 0.5;
const DEFAULT_LINEAR_DAMPING: f32 = 4.0;
const DEFAULT_RNG_SEED: u64 = 0x6d6f_6273_7761_726d;
const DEFAULT_CULL_HALF_WIDTH: f32 = 30.0;
const DEFAULT_CULL_BEHIND: f32 = 40.0;

/// Configuration parameters required to construct the world.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config {
    capacity: usize,
    contact_radius: f32,
    linear_damping: f32,
    rng_seed: u64,
    cull_half_width: f32,
    cull_behind: f32,
}

impl Config {
    /// Creates a new configuration.
    ///
    /// `capacity` bounds the total number of live mobs, `contact_radius` is
    /// the centre distance at which opposing mobs eliminate each other and
    /// `linear_damping` is the fraction of velocity shed per second.
    #[must_use]
    pub const fn new(
        capacity: usize,
        contact_radius: f32,
        linear_damping: f32,
        rng_seed: u64,
    ) -> Self {
        Self {
            capacity,
            contact_radius,
            linear_damping,
            rng_seed,
            cull_half_width: DEFAULT_CULL_HALF_WIDTH,
            cull_behind: DEFAULT_CULL_BEHIND,
        }
    }

    /// Bounds outside of which mobs are culled on every tick: further than
    /// `half_width` from the lane centre or more than `behind` behind the
    /// leader.
    #[must_use]
    pub const fn with_cull_bounds(self, half_width: f32, behind: f32) -> Self {
        Self {
            cull_half_width: half_width,
            cull_behind: behind,
            ..self
        }
    }

    /// Maximum number of live mobs across both kinds.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Centre distance at which opposing mobs eliminate each other.
    #[must_use]
    pub const fn contact_radius(&self) -> f32 {
        self.contact_radius
    }

    /// Fraction of velocity shed per second.
    #[must_use]
    pub const fn linear_damping(&self) -> f32 {
        self.linear_damping
    }

    /// Seed of the generator picking random despawns.
    #[must_use]
    pub const fn rng_seed(&self) -> u64 {
        self.rng_seed
    }

    /// Lateral distance from the lane centre beyond which mobs are culled.
    #[must_use]
    pub const fn cull_half_width(&self) -> f32 {
        self.cull_half_width
    }

    /// Distance behind the leader beyond which mobs are culled.
    #[must_use]
    pub const fn cull_behind(&self) -> f32 {
        self.cull_behind
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(
            DEFAULT_CAPACITY,
            DEFAULT_CONTACT_RADIUS,
            DEFAULT_LINEAR_DAMPING,
            DEFAULT_RNG_SEED,
        )
    }
}

#[derive(Clone, Debug)]
struct Mob {
    id: MobId,
    kind: MobKind,
    position: Vec2,
    velocity: Vec2,
    alive: bool,
}

#[derive(Debug, Default)]
struct Buckets {
    player: Vec<Mob>,
    enemy: Vec<Mob>,
}

impl Buckets {
    fn get(&self, kind: MobKind) -> &Vec<Mob> {
        match kind {
            MobKind::Player => &self.player,
            MobKind::Enemy => &self.enemy,
        }
    }

    fn get_mut(&mut self, kind: MobKind) -> &mut Vec<Mob> {
        match kind {
            MobKind::Player => &mut self.player,
            MobKind::Enemy => &mut self.enemy,
        }
    }

    fn total(&self) -> usize {
        self.player.len() + self.enemy.len()
    }

    fn iter_mut(&mut self) -> impl Iterator<Item = &mut Mob> {
        self.player.iter_mut().chain(self.enemy.iter_mut())
    }
}

/// Represents the authoritative Mob Runner population.
#[derive(Debug)]
pub struct World {
    config: Config,
    leader: MobId,
    buckets: Buckets,
    next_id: u32,
    rng: ChaCha8Rng,
    tick_index: u64,
}

impl World {
    /// Creates an empty world. The first identifier is reserved for the leader.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            leader: MobId::new(0),
            buckets: Buckets::default(),
            next_id: 1,
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
            tick_index: 0,
            config,
        }
    }

    fn allocate_id(&mut self) -> MobId {
        let id = MobId::new(self.next_id);
        self.next_id = self.next_id.wrapping_add(1).max(1);
        id
    }

    fn mob_mut(&mut self, mob: MobId) -> Option<&mut Mob> {
        self.buckets.iter_mut().find(|candidate| candidate.id == mob)
    }

    fn spawn(&mut self, kind: MobKind, position: Vec2, out_events: &mut Vec<Event>) {
        if self.buckets.total() >= self.config.capacity {
            tracing::warn!(?kind, capacity = self.config.capacity, "population capacity reached");
            out_events.push(Event::SpawnRefused { kind });
            return;
        }

        let id = self.allocate_id();
        self.buckets.get_mut(kind).push(Mob {
            id,
            kind,
            position,
            velocity: Vec2::ZERO,
            alive: true,
        });
        out_events.push(Event::MobSpawned {
            mob: id,
            kind,
            position,
        });
    }

    fn despawn(&mut self, mob: MobId, cause: DespawnCause, out_events: &mut Vec<Event>) {
        if mob == self.leader {
            tracing::debug!(?cause, "leader despawned");
            out_events.push(Event::LeaderDied);
            return;
        }

        for kind in MobKind::ALL {
            let bucket = self.buckets.get_mut(kind);
            if let Some(index) = bucket.iter().position(|candidate| candidate.id == mob) {
                let _ = bucket.remove(index);
                out_events.push(Event::MobDespawned { mob, kind, cause });
                return;
            }
        }

        tracing::error!(mob = mob.get(), "despawn requested for unknown mob");
        out_events.push(Event::DespawnRejected { mob });
    }

    fn despawn_random(&mut self, kind: MobKind, out_events: &mut Vec<Event>) {
        let len = self.buckets.get(kind).len();
        if len == 0 {
            match kind {
                MobKind::Player => {
                    tracing::debug!("player bucket exhausted");
                    out_events.push(Event::LeaderDied);
                }
                MobKind::Enemy => tracing::trace!("enemy bucket already empty"),
            }
            return;
        }

        let index = self.rng.gen_range(0..len);
        let removed = self.buckets.get_mut(kind).remove(index);
        out_events.push(Event::MobDespawned {
            mob: removed.id,
            kind,
            cause: DespawnCause::Culled,
        });
    }

    fn clear(&mut self, out_events: &mut Vec<Event>) {
        for kind in MobKind::ALL {
            for mob in self.buckets.get_mut(kind).drain(..) {
                out_events.push(Event::MobDespawned {
                    mob: mob.id,
                    kind,
                    cause: DespawnCause::Cleared,
                });
            }
        }
    }

    fn integrate(&mut self, dt: Duration) {
        let seconds = dt.as_secs_f32();
        let retained = (1.0 - self.config.linear_damping * seconds).max(0.0);
        for mob in self.buckets.iter_mut() {
            mob.position += mob.velocity * seconds;
            mob.velocity *= retained;
        }
    }

    /// Removes every mob outside the lane bounds or too far behind the leader.
    fn cull_out_of_bounds(&mut self, leader: Vec2, out_events: &mut Vec<Event>) {
        let half_width = self.config.cull_half_width;
        let rear = leader.y - self.config.cull_behind;
        for kind in MobKind::ALL {
            self.buckets.get_mut(kind).retain(|mob| {
                let inside = mob.position.x.abs() <= half_width && mob.position.y >= rear;
                if !inside {
                    tracing::debug!(mob = mob.id.get(), ?kind, "mob left the course");
                    out_events.push(Event::MobDespawned {
                        mob: mob.id,
                        kind,
                        cause: DespawnCause::Culled,
                    });
                }
                inside
            });
        }
    }

    /// Marks every contacting pair dead, then removes all of them at once.
    ///
    /// Each participant eliminates at most one opponent per tick. The leader
    /// participates on the player side but is never stored in a bucket.
    fn resolve_contacts(&mut self, leader: Vec2, out_events: &mut Vec<Event>) {
        let radius_sq = self.config.contact_radius * self.config.contact_radius;
        let Buckets { player, enemy } = &mut self.buckets;

        for mob in player.iter_mut() {
            let position = mob.position;
            if let Some(opponent) = enemy
                .iter_mut()
                .find(|other| other.alive && other.position.distance_squared(position) <= radius_sq)
            {
                opponent.alive = false;
                mob.alive = false;
            }
        }

        let leader_hit = match enemy
            .iter_mut()
            .find(|other| other.alive && other.position.distance_squared(leader) <= radius_sq)
        {
            Some(opponent) => {
                opponent.alive = false;
                true
            }
            None => false,
        };

        for bucket in [player, enemy] {
            bucket.retain(|mob| {
                if !mob.alive {
                    out_events.push(Event::MobDespawned {
                        mob: mob.id,
                        kind: mob.kind,
                        cause: DespawnCause::Killed,
                    });
                }
                mob.alive
            });
        }

        if leader_hit {
            tracing::debug!("enemy reached the leader");
            out_events.push(Event::LeaderDied);
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::SpawnMob { kind, position } => world.spawn(kind, position, out_events),
        Command::DespawnMob { mob, cause } => world.despawn(mob, cause, out_events),
        Command::DespawnRandom { kind } => world.despawn_random(kind, out_events),
        Command::ClearPopulation => world.clear(out_events),
        Command::SetVelocity { mob, velocity } => {
            if let Some(target) = world.mob_mut(mob) {
                target.velocity = velocity;
            } else {
                tracing::trace!(mob = mob.get(), "velocity for missing mob ignored");
            }
        }
        Command::ShiftMobs { kind, delta } => {
            for mob in world.buckets.get_mut(kind) {
                mob.position += delta;
            }
        }
        Command::Tick { dt, leader } => {
            world.tick_index = world.tick_index.saturating_add(1);
            out_events.push(Event::TimeAdvanced { dt });
            world.integrate(dt);
            world.cull_out_of_bounds(leader, out_events);
            world.resolve_contacts(leader, out_events);
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use mob_runner_core::{MobId, MobKind, MobSnapshot, MobView};

    use super::World;

    /// Identity reserved for the leader.
    #[must_use]
    pub fn leader(world: &World) -> MobId {
        world.leader
    }

    /// Number of live mobs of the provided kind.
    #[must_use]
    pub fn count_of(world: &World, kind: MobKind) -> usize {
        world.buckets.get(kind).len()
    }

    /// Number of live mobs across both kinds.
    #[must_use]
    pub fn total_population(world: &World) -> usize {
        world.buckets.total()
    }

    /// Maximum number of live mobs the world accepts.
    #[must_use]
    pub fn capacity(world: &World) -> usize {
        world.config.capacity
    }

    /// Number of physics ticks processed so far.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }

    /// Captures a read-only view of every live mob.
    #[must_use]
    pub fn mob_view(world: &World) -> MobView {
        let snapshots = MobKind::ALL
            .into_iter()
            .flat_map(|kind| {
                world
                    .buckets
                    .get(kind)
                    .iter()
                    .enumerate()
                    .map(|(slot, mob)| MobSnapshot {
                        id: mob.id,
                        kind: mob.kind,
                        slot,
                        position: mob.position,
                        velocity: mob.velocity,
                    })
            })
            .collect();
        MobView::from_snapshots(snapshots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers_skip_the_leader() {
        let mut world = World::default();
        let first = world.allocate_id();
        assert_ne!(first, world.leader);
        assert_eq!(first.get(), 1);
    }

    #[test]
    fn damping_never_reverses_velocity() {
        let mut world = World::new(Config::new(8, 0.5, 100.0, 1));
        let mut events = Vec::new();
        world.spawn(MobKind::Player, Vec2::ZERO, &mut events);
        world.buckets.player[0].velocity = Vec2::new(3.0, 0.0);
        world.integrate(Duration::from_millis(20));
        assert_eq!(world.buckets.player[0].velocity, Vec2::ZERO);
        assert!(world.buckets.player[0].position.x > 0.0);
    }
}
