use std::time::Duration;

use glam::Vec2;
use mob_runner_core::{
    Button, Command, Counter, DespawnCause, Gate, GateKind, LevelStreaming, MobId, MobKind,
    Presenter, Screen, SessionEvent, SessionPhase, Sound, StarThresholds,
};
use mob_runner_session::{Config, Session, SessionError};
use mob_runner_world::query;

const FIXED: Duration = Duration::from_micros(16_667);
const FRAME: Duration = Duration::from_millis(16);

#[derive(Clone, Debug, PartialEq)]
enum Call {
    Show(Screen),
    Hide(Screen),
    Sound(Sound),
    SpawnVisual(MobId, MobKind, Vec2),
    ReleaseVisual(MobId),
    Counter(Counter, u64),
    Star(u8),
    Phase(SessionPhase, SessionPhase),
}

#[derive(Debug, Default)]
struct Recorder {
    calls: Vec<Call>,
}

impl Recorder {
    fn position(&self, call: &Call) -> Option<usize> {
        self.calls.iter().position(|recorded| recorded == call)
    }

    fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.calls.iter().filter(|call| predicate(call)).count()
    }

    fn last_counter(&self, counter: Counter) -> Option<u64> {
        self.calls.iter().rev().find_map(|call| match call {
            Call::Counter(recorded, value) if *recorded == counter => Some(*value),
            _ => None,
        })
    }
}

impl Presenter for Recorder {
    fn show_screen(&mut self, screen: Screen) {
        self.calls.push(Call::Show(screen));
    }

    fn hide_screen(&mut self, screen: Screen) {
        self.calls.push(Call::Hide(screen));
    }

    fn play_sound(&mut self, sound: Sound) {
        self.calls.push(Call::Sound(sound));
    }

    fn spawn_visual(&mut self, mob: MobId, kind: MobKind, position: Vec2) {
        self.calls.push(Call::SpawnVisual(mob, kind, position));
    }

    fn release_visual(&mut self, mob: MobId) {
        self.calls.push(Call::ReleaseVisual(mob));
    }

    fn set_counter(&mut self, counter: Counter, value: u64) {
        self.calls.push(Call::Counter(counter, value));
    }

    fn reveal_star(&mut self, index: u8) {
        self.calls.push(Call::Star(index));
    }

    fn phase_changed(&mut self, from: SessionPhase, to: SessionPhase) {
        self.calls.push(Call::Phase(from, to));
    }
}

/// Level collaborator that raises whatever triggers a test queues.
#[derive(Debug)]
struct ScriptedLevels {
    playable: usize,
    loads: Vec<usize>,
    queued: Vec<SessionEvent>,
}

impl ScriptedLevels {
    fn new(playable: usize) -> Self {
        Self {
            playable,
            loads: Vec::new(),
            queued: Vec::new(),
        }
    }
}

impl LevelStreaming for ScriptedLevels {
    fn load_level(&mut self, index: usize) -> bool {
        self.loads.push(index);
        self.queued.clear();
        index < self.playable
    }

    fn level_setting(&self, index: usize) -> Option<StarThresholds> {
        (index < self.playable).then(|| StarThresholds::new([100, 300, 500]))
    }

    fn on_leader_moved(&mut self, _dt: Duration, _leader: Vec2, out: &mut Vec<SessionEvent>) {
        out.append(&mut self.queued);
    }
}

type TestSession = Session<ScriptedLevels, Recorder>;

fn session_with(config: Config) -> TestSession {
    Session::new(config, ScriptedLevels::new(3), Recorder::default()).expect("valid session")
}

fn running_session() -> TestSession {
    let mut session = session_with(Config::default());
    session.press(Button::Start).expect("start");
    session
}

fn trigger(session: &mut TestSession, event: SessionEvent) {
    session.levels_mut().queued.push(event);
    session.tick(FRAME).expect("tick");
}

fn players(session: &TestSession) -> usize {
    query::count_of(session.world(), MobKind::Player)
}

fn enemies(session: &TestSession) -> usize {
    query::count_of(session.world(), MobKind::Enemy)
}

fn run_fixed_until(session: &mut TestSession, done: impl Fn(&TestSession) -> bool) {
    for _ in 0..5_000 {
        if done(session) {
            return;
        }
        session.fixed_tick(FIXED).expect("fixed tick");
    }
    panic!("condition never reached");
}

#[test]
fn session_opens_in_the_menu_on_level_zero() {
    let session = session_with(Config::default());

    assert_eq!(session.phase(), SessionPhase::InMenu);
    assert_eq!(session.level_index(), 0);
    assert_eq!(session.levels().loads, vec![0]);
    assert_eq!(query::total_population(session.world()), 0);
    assert_eq!(session.presenter().calls.first(), Some(&Call::Show(Screen::MainMenu)));
}

#[test]
fn start_spawns_the_swarm_and_enters_the_run() {
    let session = running_session();
    let presenter = session.presenter();

    assert_eq!(session.phase(), SessionPhase::GameMoving);
    assert_eq!(players(&session), 10);

    let hidden = presenter.position(&Call::Hide(Screen::MainMenu)).expect("menu hidden");
    let started = presenter
        .position(&Call::Phase(SessionPhase::InMenu, SessionPhase::GameStart))
        .expect("start entered");
    let moving = presenter
        .position(&Call::Phase(SessionPhase::GameStart, SessionPhase::GameMoving))
        .expect("run entered");
    let shown = presenter.position(&Call::Show(Screen::Run)).expect("run shown");
    let first_spawn = presenter
        .calls
        .iter()
        .position(|call| matches!(call, Call::SpawnVisual(_, MobKind::Player, _)))
        .expect("members spawned");

    assert!(hidden < started);
    assert!(started < first_spawn && first_spawn < moving);
    assert!(moving < shown);
    assert_eq!(presenter.count(|call| *call == Call::Sound(Sound::Spawn)), 10);
}

#[test]
fn initial_members_take_consecutive_formation_slots() {
    let session = running_session();
    let positions: Vec<Vec2> = session
        .presenter()
        .calls
        .iter()
        .filter_map(|call| match call {
            Call::SpawnVisual(_, MobKind::Player, position) => Some(*position),
            _ => None,
        })
        .collect();

    let expected: Vec<Vec2> = (0..10)
        .map(|slot| session.layout().offset(slot).expect("slot in table"))
        .collect();
    assert_eq!(positions, expected);
}

#[test]
fn buttons_outside_their_phase_are_ignored() {
    let mut session = session_with(Config::default());
    session.press(Button::Confirm).expect("confirm");
    assert_eq!(session.phase(), SessionPhase::InMenu);

    session.press(Button::Start).expect("start");
    session.press(Button::Start).expect("second start");
    assert_eq!(session.phase(), SessionPhase::GameMoving);
    assert_eq!(players(&session), 10);
}

#[test]
fn fixed_ticks_carry_the_swarm_forward() {
    let mut session = running_session();
    for _ in 0..60 {
        session.fixed_tick(FIXED).expect("fixed tick");
    }
    session.tick(FRAME).expect("tick");

    assert!(session.leader().y > 5.0);
    assert_eq!(players(&session), 10);
    assert_eq!(session.presenter().last_counter(Counter::Population), Some(11));
    assert_eq!(
        session.presenter().last_counter(Counter::Distance),
        Some(session.distance_travelled().floor() as u64)
    );
}

#[test]
fn lateral_input_moves_the_leader_within_the_lane() {
    let mut session = running_session();
    session.record_lateral_input(0.1);
    session.tick(FRAME).expect("tick");
    session.fixed_tick(FIXED).expect("fixed tick");
    assert!(session.leader().x > 0.0);

    session.record_lateral_input(100.0);
    session.tick(FRAME).expect("tick");
    session.fixed_tick(FIXED).expect("fixed tick");
    let half_width = mob_runner_system_movement::Config::default().lane_half_width(11);
    assert!(session.leader().x <= half_width + f32::EPSILON);
}

#[test]
fn finishing_a_level_tallies_and_advances_on_confirm() {
    let mut session = running_session();
    for _ in 0..120 {
        session.fixed_tick(FIXED).expect("fixed tick");
    }
    let distance = session.distance_travelled().floor() as u64;

    trigger(&mut session, SessionEvent::LevelFinished);
    assert_eq!(session.phase(), SessionPhase::LevelFinished);
    assert!(session.scoring().is_some());
    assert!(session.presenter().position(&Call::Sound(Sound::Finish)).is_some());

    for _ in 0..1_000 {
        if session.scoring().is_none() {
            break;
        }
        session.tick(FRAME).expect("tick");
    }
    let result = session.last_result().expect("tally completed");
    assert_eq!(result.score, distance * 10);
    assert_eq!(result.stars, StarThresholds::new([100, 300, 500]).stars_for(result.score));
    assert_eq!(
        session.presenter().count(|call| matches!(call, Call::Star(_))),
        usize::from(result.stars)
    );
    assert_eq!(session.presenter().last_counter(Counter::Score), Some(result.score));

    session.press(Button::Confirm).expect("confirm");
    assert_eq!(session.phase(), SessionPhase::InMenu);
    assert_eq!(session.level_index(), 1);
    assert_eq!(session.levels().loads, vec![0, 1]);
    assert_eq!(query::total_population(session.world()), 0);
}

#[test]
fn confirm_during_the_tally_skips_instead_of_leaving() {
    let mut session = running_session();
    trigger(&mut session, SessionEvent::LevelFinished);

    session.press(Button::Confirm).expect("skip");
    assert_eq!(session.phase(), SessionPhase::LevelFinished);
    assert!(session.scoring().is_some_and(|scoring| scoring.is_skipping()));

    session.tick(Duration::ZERO).expect("tick");
    assert!(session.scoring().is_none());
    assert!(session.last_result().is_some());
    assert_eq!(session.level_index(), 0);

    session.press(Button::Confirm).expect("confirm");
    assert_eq!(session.level_index(), 1);
}

#[test]
fn missing_level_falls_back_to_the_first() {
    let mut session = Session::new(
        Config::default(),
        ScriptedLevels::new(1),
        Recorder::default(),
    )
    .expect("valid session");
    session.press(Button::Start).expect("start");
    trigger(&mut session, SessionEvent::LevelFinished);
    session.press(Button::Confirm).expect("skip");
    session.tick(FRAME).expect("tick");
    session.press(Button::Confirm).expect("confirm");

    assert_eq!(session.phase(), SessionPhase::InMenu);
    assert_eq!(session.level_index(), 0);
    assert_eq!(session.levels().loads, vec![0, 1, 0]);
}

#[test]
fn session_without_any_playable_level_is_rejected() {
    let result = Session::new(
        Config::default(),
        ScriptedLevels::new(0),
        Recorder::default(),
    );
    assert_eq!(
        result.err(),
        Some(SessionError::NoPlayableLevel { requested: 0 })
    );
}

#[test]
fn invalid_configuration_is_rejected() {
    let config = Config {
        initial_population: 700,
        ..Config::default()
    };
    let result = Session::new(config, ScriptedLevels::new(1), Recorder::default());
    assert!(matches!(
        result.err(),
        Some(SessionError::InitialPopulationTooLarge { initial: 700, max: 600 })
    ));

    let config = Config {
        formation_rings: 2,
        ..Config::default()
    };
    let result = Session::new(config, ScriptedLevels::new(1), Recorder::default());
    assert!(matches!(result.err(), Some(SessionError::Formation(_))));
}

#[test]
fn add_gate_queues_paced_members() {
    let mut session = running_session();
    trigger(
        &mut session,
        SessionEvent::GateTriggered {
            gate: Gate::new(GateKind::Add, 5),
            spawn_point: Vec2::new(0.0, 1.0),
        },
    );
    assert_eq!(session.pending_gate_spawns(), 5);
    assert_eq!(players(&session), 10);

    for _ in 0..200 {
        if session.pending_gate_spawns() == 0 {
            break;
        }
        session.tick(FRAME).expect("tick");
    }
    assert_eq!(players(&session), 15);
}

#[test]
fn multiply_gate_uses_the_swarm_including_the_leader() {
    let mut session = running_session();
    trigger(
        &mut session,
        SessionEvent::GateTriggered {
            gate: Gate::new(GateKind::Multiply, 2),
            spawn_point: Vec2::ZERO,
        },
    );
    assert_eq!(session.pending_gate_spawns(), 11);
}

#[test]
fn gate_growth_is_capped_by_the_population_limit() {
    let config = Config {
        max_player_population: 15,
        ..Config::default()
    };
    let mut session = session_with(config);
    session.press(Button::Start).expect("start");
    trigger(
        &mut session,
        SessionEvent::GateTriggered {
            gate: Gate::new(GateKind::Add, 20),
            spawn_point: Vec2::ZERO,
        },
    );
    assert_eq!(session.pending_gate_spawns(), 5);
}

#[test]
fn divide_gate_removes_members_immediately() {
    let mut session = running_session();
    trigger(
        &mut session,
        SessionEvent::GateTriggered {
            gate: Gate::new(GateKind::Divide, 2),
            spawn_point: Vec2::ZERO,
        },
    );
    assert_eq!(players(&session), 5);
    assert_eq!(
        session
            .presenter()
            .count(|call| matches!(call, Call::ReleaseVisual(_))),
        5
    );
    assert_eq!(session.phase(), SessionPhase::GameMoving);
}

#[test]
fn emptying_the_swarm_kills_the_leader() {
    let mut session = running_session();
    trigger(
        &mut session,
        SessionEvent::GateTriggered {
            gate: Gate::new(GateKind::Subtract, 25),
            spawn_point: Vec2::ZERO,
        },
    );

    assert_eq!(session.phase(), SessionPhase::GameOver);
    assert_eq!(players(&session), 0);
    assert!(session.presenter().position(&Call::Show(Screen::GameOver)).is_some());
    assert!(session.presenter().position(&Call::Hide(Screen::Run)).is_some());
}

#[test]
fn game_over_confirm_returns_to_level_zero() {
    let mut session = running_session();
    trigger(&mut session, SessionEvent::LevelFinished);
    session.press(Button::Confirm).expect("skip");
    session.tick(FRAME).expect("tick");
    session.press(Button::Confirm).expect("next level");
    assert_eq!(session.level_index(), 1);

    session.press(Button::Start).expect("start");
    session.raise(SessionEvent::LeaderDied).expect("leader died");
    assert_eq!(session.phase(), SessionPhase::GameOver);

    session.press(Button::Confirm).expect("confirm");
    assert_eq!(session.phase(), SessionPhase::InMenu);
    assert_eq!(session.level_index(), 0);
    assert_eq!(query::total_population(session.world()), 0);
    assert_eq!(session.leader(), Vec2::ZERO);
}

#[test]
fn encounter_trades_members_for_enemies_then_resumes() {
    let mut session = running_session();
    trigger(
        &mut session,
        SessionEvent::EncounterTriggered {
            battlefield: Vec2::new(0.0, 8.0),
            enemy_count: 3,
        },
    );
    assert_eq!(session.phase(), SessionPhase::GameEncounter);
    assert_eq!(enemies(&session), 3);

    run_fixed_until(&mut session, |session| {
        session.phase() != SessionPhase::GameEncounter
    });

    assert_eq!(session.phase(), SessionPhase::GameMoving);
    assert_eq!(enemies(&session), 0);
    assert_eq!(players(&session), 7);
    assert_eq!(
        session
            .presenter()
            .count(|call| matches!(call, Call::ReleaseVisual(_))),
        6
    );
}

#[test]
fn full_phase_sequence_reaches_the_next_level() {
    let mut session = running_session();
    trigger(
        &mut session,
        SessionEvent::EncounterTriggered {
            battlefield: Vec2::new(0.0, 10.0),
            enemy_count: 4,
        },
    );
    assert_eq!(session.phase(), SessionPhase::GameEncounter);

    let view = query::mob_view(session.world());
    let enemy_ids: Vec<MobId> = view.of_kind(MobKind::Enemy).map(|mob| mob.id).collect();
    assert_eq!(enemy_ids.len(), 4);
    for mob in enemy_ids {
        session
            .submit(Command::DespawnMob {
                mob,
                cause: DespawnCause::Killed,
            })
            .expect("despawn enemy");
    }
    assert_eq!(session.phase(), SessionPhase::GameEncounter);

    session.fixed_tick(FIXED).expect("fixed tick");
    assert_eq!(session.phase(), SessionPhase::GameMoving);
    assert_eq!(players(&session), 10);

    trigger(&mut session, SessionEvent::LevelFinished);
    assert_eq!(session.phase(), SessionPhase::LevelFinished);
    session.press(Button::Confirm).expect("skip");
    session.tick(FRAME).expect("tick");
    session.press(Button::Confirm).expect("confirm");

    assert_eq!(session.phase(), SessionPhase::InMenu);
    assert_eq!(session.level_index(), 1);

    let phases: Vec<(SessionPhase, SessionPhase)> = session
        .presenter()
        .calls
        .iter()
        .filter_map(|call| match call {
            Call::Phase(from, to) => Some((*from, *to)),
            _ => None,
        })
        .collect();
    assert_eq!(
        phases,
        vec![
            (SessionPhase::InMenu, SessionPhase::GameStart),
            (SessionPhase::GameStart, SessionPhase::GameMoving),
            (SessionPhase::GameMoving, SessionPhase::GameEncounter),
            (SessionPhase::GameEncounter, SessionPhase::GameMoving),
            (SessionPhase::GameMoving, SessionPhase::LevelFinished),
            (SessionPhase::LevelFinished, SessionPhase::InMenu),
        ]
    );
}

#[test]
fn lone_leader_walks_into_the_enemy_and_dies() {
    let config = Config {
        initial_population: 0,
        ..Config::default()
    };
    let mut session = session_with(config);
    session.press(Button::Start).expect("start");
    trigger(
        &mut session,
        SessionEvent::EncounterTriggered {
            battlefield: Vec2::new(0.0, 4.0),
            enemy_count: 1,
        },
    );

    run_fixed_until(&mut session, |session| {
        session.phase() != SessionPhase::GameEncounter
    });
    assert_eq!(session.phase(), SessionPhase::GameOver);
}

#[test]
fn triggers_outside_the_run_are_ignored() {
    let mut session = session_with(Config::default());
    session
        .raise(SessionEvent::GateTriggered {
            gate: Gate::new(GateKind::Add, 5),
            spawn_point: Vec2::ZERO,
        })
        .expect("raise");
    session
        .raise(SessionEvent::EncounterTriggered {
            battlefield: Vec2::ZERO,
            enemy_count: 4,
        })
        .expect("raise");

    assert_eq!(session.phase(), SessionPhase::InMenu);
    assert_eq!(session.pending_gate_spawns(), 0);
    assert_eq!(query::total_population(session.world()), 0);
}

#[test]
fn unknown_despawn_halts_the_session() {
    let mut session = running_session();
    let ghost = MobId::new(9_999);

    let error = session
        .submit(Command::DespawnMob {
            mob: ghost,
            cause: DespawnCause::Killed,
        })
        .expect_err("desync");
    assert_eq!(error, SessionError::RegistryDesync { mob: ghost });

    assert_eq!(session.tick(FRAME), Err(SessionError::RegistryDesync { mob: ghost }));
    assert!(session.press(Button::Confirm).is_err());
}

fn scripted_run() -> TestSession {
    let mut session = running_session();
    for frame in 0..240 {
        session.record_lateral_input(if frame % 60 < 30 { 0.02 } else { -0.02 });
        if frame == 60 {
            session.levels_mut().queued.push(SessionEvent::EncounterTriggered {
                battlefield: Vec2::new(0.0, 12.0),
                enemy_count: 4,
            });
        }
        if frame == 200 {
            session.levels_mut().queued.push(SessionEvent::GateTriggered {
                gate: Gate::new(GateKind::Add, 3),
                spawn_point: Vec2::new(0.0, 20.0),
            });
        }
        session.tick(FRAME).expect("tick");
        session.fixed_tick(FIXED).expect("fixed tick");
    }
    session
}

#[test]
fn identical_input_replays_identically() {
    let first = scripted_run();
    let second = scripted_run();

    assert_eq!(first.phase(), second.phase());
    assert_eq!(first.leader(), second.leader());
    assert_eq!(first.presenter().calls, second.presenter().calls);
}
