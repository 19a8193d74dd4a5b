//! Frame loop driving a session with scripted input.

use std::time::Duration;

use anyhow::Result;
use glam::Vec2;
use mob_runner_core::{Button, LevelStreaming, SessionPhase};
use mob_runner_session::Session;

use crate::presenter::LogPresenter;

const STEERING_GAIN: f32 = 0.01;
const SIDE_TARGET: f32 = 3.0;
const WEAVE_AMPLITUDE: f32 = 4.0;
const WEAVE_FREQUENCY: f32 = 0.5;
const MAX_FIXED_STEPS_PER_FRAME: u32 = 8;

/// Lateral strategy followed by the autopilot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub(crate) enum Steering {
    /// Holds the lane centre. Gate pairs resolve to the right-hand gate.
    Centre,
    /// Hugs the left side of the lane.
    Left,
    /// Hugs the right side of the lane.
    Right,
    /// Sweeps from side to side.
    Weave,
}

/// Produces one normalized lateral sample per frame.
#[derive(Clone, Debug)]
pub(crate) struct Autopilot {
    steering: Steering,
    elapsed: Duration,
}

impl Autopilot {
    pub(crate) const fn new(steering: Steering) -> Self {
        Self {
            steering,
            elapsed: Duration::ZERO,
        }
    }

    pub(crate) fn sample(&mut self, dt: Duration, leader: Vec2) -> f32 {
        self.elapsed = self.elapsed.saturating_add(dt);
        let target = match self.steering {
            Steering::Centre => 0.0,
            Steering::Left => -SIDE_TARGET,
            Steering::Right => SIDE_TARGET,
            Steering::Weave => {
                WEAVE_AMPLITUDE * (self.elapsed.as_secs_f32() * WEAVE_FREQUENCY).sin()
            }
        };
        ((target - leader.x) * STEERING_GAIN).clamp(-1.0, 1.0)
    }
}

/// Splits variable frames into fixed physics steps.
#[derive(Clone, Debug)]
pub(crate) struct Scheduler {
    fixed: Duration,
    accumulator: Duration,
}

impl Scheduler {
    pub(crate) const fn new(fixed: Duration) -> Self {
        Self {
            fixed,
            accumulator: Duration::ZERO,
        }
    }

    pub(crate) const fn fixed(&self) -> Duration {
        self.fixed
    }

    /// Number of fixed steps owed after a frame of `dt`.
    ///
    /// Backlog beyond a bounded number of steps is dropped so a stalled frame
    /// cannot snowball.
    pub(crate) fn steps(&mut self, dt: Duration) -> u32 {
        if self.fixed.is_zero() {
            return 0;
        }
        self.accumulator = self.accumulator.saturating_add(dt);
        let mut steps = 0;
        while self.accumulator >= self.fixed && steps < MAX_FIXED_STEPS_PER_FRAME {
            self.accumulator -= self.fixed;
            steps += 1;
        }
        if steps == MAX_FIXED_STEPS_PER_FRAME && self.accumulator >= self.fixed {
            tracing::warn!(
                dropped_ms = self.accumulator.as_millis() as u64,
                "fixed step backlog dropped"
            );
            self.accumulator = Duration::ZERO;
        }
        steps
    }
}

/// Limits applied to a headless run.
#[derive(Clone, Copy, Debug)]
pub(crate) struct RunLimits {
    pub(crate) frame: Duration,
    pub(crate) max_time: Duration,
    pub(crate) levels: usize,
    pub(crate) skip_tally: bool,
}

/// Result of one finished level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct LevelReport {
    pub(crate) level: usize,
    pub(crate) score: u64,
    pub(crate) stars: u8,
    pub(crate) survivors: u64,
}

/// How a headless run ended.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct Outcome {
    pub(crate) levels: Vec<LevelReport>,
    pub(crate) game_over: bool,
    pub(crate) timed_out: bool,
    pub(crate) simulated: Duration,
}

/// Plays levels until enough were finished, the leader died or time ran out.
pub(crate) fn run<L>(
    session: &mut Session<L, LogPresenter>,
    autopilot: &mut Autopilot,
    scheduler: &mut Scheduler,
    limits: RunLimits,
) -> Result<Outcome>
where
    L: LevelStreaming,
{
    let mut outcome = Outcome::default();
    let mut survivors = 0;

    loop {
        if outcome.simulated >= limits.max_time {
            tracing::warn!(simulated_s = outcome.simulated.as_secs(), "run timed out");
            outcome.timed_out = true;
            break;
        }

        match session.phase() {
            SessionPhase::InMenu => {
                if outcome.levels.len() >= limits.levels {
                    break;
                }
                tracing::info!(level = session.level_index(), "starting level");
                session.press(Button::Start)?;
            }
            SessionPhase::GameOver => {
                tracing::info!(level = session.level_index(), "game over");
                outcome.game_over = true;
                break;
            }
            SessionPhase::LevelFinished => {
                let skipping = session.scoring().map(|scoring| scoring.is_skipping());
                match skipping {
                    Some(false) if limits.skip_tally => session.press(Button::Confirm)?,
                    Some(_) => {}
                    None => {
                        if let Some(result) = session.last_result() {
                            outcome.levels.push(LevelReport {
                                level: session.level_index(),
                                score: result.score,
                                stars: result.stars,
                                survivors,
                            });
                        }
                        session.press(Button::Confirm)?;
                    }
                }
            }
            SessionPhase::GameStart | SessionPhase::GameMoving | SessionPhase::GameEncounter => {
                survivors = session.presenter().population().saturating_sub(1);
            }
        }

        let input = autopilot.sample(limits.frame, session.leader());
        session.record_lateral_input(input);
        session.tick(limits.frame)?;
        for _ in 0..scheduler.steps(limits.frame) {
            session.fixed_tick(scheduler.fixed())?;
        }
        outcome.simulated += limits.frame;
    }

    Ok(outcome)
}
