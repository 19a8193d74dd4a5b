#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Mob gate arithmetic and paced spawning of the members a gate adds.

use std::time::Duration;

use glam::Vec2;
use mob_runner_core::{Command, Gate, GateKind, MobKind};

const DEFAULT_TOTAL_SPAWN_TIME: Duration = Duration::from_secs(1);

/// Change in swarm size caused by passing `gate` with `current` members.
///
/// `current` counts the whole swarm including the leader and must be read
/// when the gate triggers. A zero divisor leaves the swarm unchanged.
#[must_use]
pub fn mob_delta(gate: Gate, current: u32) -> i64 {
    let current = i64::from(current);
    let value = i64::from(gate.value());
    match gate.kind() {
        GateKind::Add => value,
        GateKind::Subtract => -value,
        GateKind::Multiply => current * value - current,
        GateKind::Divide => {
            if value == 0 {
                0
            } else {
                -(current / value)
            }
        }
    }
}

/// Billboard text shown above a gate.
#[must_use]
pub fn label(gate: Gate) -> String {
    let value = gate.value();
    match gate.kind() {
        GateKind::Add => format!("+{value}"),
        GateKind::Subtract => format!("-{value}"),
        GateKind::Multiply => format!("x {value}"),
        GateKind::Divide => format!("÷ {value}"),
    }
}

/// Configuration parameters required to construct the gate spawner.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    total_spawn_time: Duration,
}

impl Config {
    /// Creates a configuration spreading every batch over `total_spawn_time`.
    #[must_use]
    pub const fn new(total_spawn_time: Duration) -> Self {
        Self { total_spawn_time }
    }

    /// Time over which one batch is spawned.
    #[must_use]
    pub const fn total_spawn_time(&self) -> Duration {
        self.total_spawn_time
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_TOTAL_SPAWN_TIME)
    }
}

#[derive(Clone, Debug)]
struct SpawnBatch {
    remaining: u32,
    rate: f32,
    accumulator: Duration,
    spawn_point: Vec2,
}

/// Spreads the members added by gates over time.
#[derive(Clone, Debug, Default)]
pub struct GateSpawner {
    config: Config,
    batches: Vec<SpawnBatch>,
}

impl GateSpawner {
    /// Creates an idle spawner.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            batches: Vec::new(),
        }
    }

    /// Queues `amount` player mobs to appear at `spawn_point`.
    pub fn queue(&mut self, amount: u32, spawn_point: Vec2) {
        if amount == 0 {
            return;
        }
        let seconds = self.config.total_spawn_time.as_secs_f32();
        let rate = if seconds > 0.0 {
            amount as f32 / seconds
        } else {
            f32::INFINITY
        };
        self.batches.push(SpawnBatch {
            remaining: amount,
            rate,
            accumulator: Duration::ZERO,
            spawn_point,
        });
    }

    /// Emits the spawn commands that became due during `dt`.
    pub fn advance(&mut self, dt: Duration, out: &mut Vec<Command>) {
        for batch in &mut self.batches {
            batch.accumulator = batch.accumulator.saturating_add(dt);
            let due = batch.rate * batch.accumulator.as_secs_f32();
            let count = if due.is_finite() {
                (due.round() as u32).min(batch.remaining)
            } else {
                batch.remaining
            };
            if count == 0 {
                continue;
            }

            for _ in 0..count {
                out.push(Command::SpawnMob {
                    kind: MobKind::Player,
                    position: batch.spawn_point,
                });
            }
            batch.remaining -= count;
            batch.accumulator = Duration::ZERO;
        }
        self.batches.retain(|batch| batch.remaining > 0);
    }

    /// Members still waiting to spawn.
    #[must_use]
    pub fn pending(&self) -> u32 {
        self.batches.iter().map(|batch| batch.remaining).sum()
    }

    /// Drops every queued batch.
    pub fn clear(&mut self) {
        self.batches.clear();
    }
}
