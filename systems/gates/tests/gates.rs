use std::time::Duration;

use glam::Vec2;
use mob_runner_core::{Command, Gate, GateKind, MobKind};
use mob_runner_system_gates::{label, mob_delta, Config, GateSpawner};

#[test]
fn gate_arithmetic_uses_the_current_swarm() {
    assert_eq!(mob_delta(Gate::new(GateKind::Add, 5), 10), 5);
    assert_eq!(mob_delta(Gate::new(GateKind::Subtract, 3), 10), -3);
    assert_eq!(mob_delta(Gate::new(GateKind::Multiply, 3), 10), 20);
    assert_eq!(mob_delta(Gate::new(GateKind::Divide, 2), 10), -5);
    assert_eq!(mob_delta(Gate::new(GateKind::Divide, 3), 10), -3);
    assert_eq!(mob_delta(Gate::new(GateKind::Multiply, 1), 10), 0);
}

#[test]
fn gate_delta_tracks_a_changing_swarm() {
    let gate = Gate::new(GateKind::Multiply, 2);
    assert_eq!(mob_delta(gate, 4), 4);
    assert_eq!(mob_delta(gate, 9), 9);
}

#[test]
fn labels_match_billboard_format() {
    assert_eq!(label(Gate::new(GateKind::Add, 5)), "+5");
    assert_eq!(label(Gate::new(GateKind::Subtract, 2)), "-2");
    assert_eq!(label(Gate::new(GateKind::Multiply, 3)), "x 3");
    assert_eq!(label(Gate::new(GateKind::Divide, 4)), "÷ 4");
}

#[test]
fn spawner_spreads_a_batch_over_the_spawn_time() {
    let mut spawner = GateSpawner::new(Config::new(Duration::from_secs(1)));
    let spawn_point = Vec2::new(2.0, 40.0);
    spawner.queue(10, spawn_point);

    let mut commands = Vec::new();
    spawner.advance(Duration::from_millis(100), &mut commands);
    assert_eq!(commands.len(), 1);
    assert_eq!(spawner.pending(), 9);

    let mut frames = 0;
    while spawner.pending() > 0 {
        spawner.advance(Duration::from_millis(100), &mut commands);
        frames += 1;
        assert!(frames < 100, "spawner stalled");
    }

    assert_eq!(commands.len(), 10);
    assert!(commands.iter().all(|command| *command
        == Command::SpawnMob {
            kind: MobKind::Player,
            position: spawn_point,
        }));
}

#[test]
fn large_frames_never_overspawn() {
    let mut spawner = GateSpawner::new(Config::new(Duration::from_millis(500)));
    spawner.queue(4, Vec2::ZERO);
    let mut commands = Vec::new();
    spawner.advance(Duration::from_secs(5), &mut commands);
    assert_eq!(commands.len(), 4);
    assert_eq!(spawner.pending(), 0);
}

#[test]
fn instant_spawn_time_releases_everything_at_once() {
    let mut spawner = GateSpawner::new(Config::new(Duration::ZERO));
    spawner.queue(7, Vec2::ZERO);
    let mut commands = Vec::new();
    spawner.advance(Duration::ZERO, &mut commands);
    assert_eq!(commands.len(), 7);
}

#[test]
fn clear_drops_pending_batches() {
    let mut spawner = GateSpawner::default();
    spawner.queue(3, Vec2::ZERO);
    spawner.queue(5, Vec2::ONE);
    assert_eq!(spawner.pending(), 8);
    spawner.clear();
    assert_eq!(spawner.pending(), 0);
}
