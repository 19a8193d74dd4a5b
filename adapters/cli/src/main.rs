#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays Mob Runner headlessly.
//!
//! The binary wires a session to a level course and a logging presenter, then
//! drives it with an autopilot on a fixed/variable tick schedule and prints a
//! summary of every finished level.

mod presenter;
mod runner;
mod tuning;

use std::{env, path::PathBuf, time::Duration};

use anyhow::{bail, Context, Result};
use clap::Parser;
use mob_runner_core::{MobKind, WELCOME_BANNER};
use mob_runner_levels::Course;
use mob_runner_session::Session;
use tracing_subscriber::EnvFilter;

use crate::{
    presenter::LogPresenter,
    runner::{Autopilot, RunLimits, Scheduler, Steering},
    tuning::Tuning,
};

const DEFAULT_LOG_FILTER: &str = "info";

/// Command-line arguments accepted by the headless runner.
#[derive(Debug, Parser)]
#[command(name = "mob-runner", about = "Plays Mob Runner headlessly with an autopilot")]
struct Cli {
    /// Course definition in TOML. The built-in course is used when omitted.
    #[arg(long, value_name = "PATH")]
    levels: Option<PathBuf>,
    /// Tuning overrides in TOML.
    #[arg(long, value_name = "PATH")]
    tuning: Option<PathBuf>,
    /// Number of levels to finish before stopping.
    #[arg(long, default_value_t = 1)]
    play: usize,
    /// Lateral strategy followed by the autopilot.
    #[arg(long, value_enum, default_value_t = Steering::Weave)]
    steering: Steering,
    /// Physics steps per simulated second.
    #[arg(long, default_value_t = 50)]
    fixed_hz: u32,
    /// Length of one variable frame in milliseconds.
    #[arg(long, default_value_t = 16)]
    frame_ms: u64,
    /// Simulated time after which the run is abandoned.
    #[arg(long, default_value_t = 600)]
    max_seconds: u64,
    /// Seed overriding both random generators.
    #[arg(long)]
    seed: Option<u64>,
    /// Skips the paced score tally.
    #[arg(long)]
    skip_tally: bool,
    /// Log filter directives. Overrides `RUST_LOG`.
    #[arg(long, value_name = "FILTER")]
    log: Option<String>,
}

/// Entry point for the Mob Runner command-line interface.
fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log.as_deref())?;
    println!("{WELCOME_BANNER}");

    if cli.fixed_hz == 0 {
        bail!("--fixed-hz must be greater than zero");
    }
    if cli.frame_ms == 0 {
        bail!("--frame-ms must be greater than zero");
    }

    let mut tuning = match &cli.tuning {
        Some(path) => Tuning::from_path(path)?,
        None => Tuning::default(),
    };
    if let Some(seed) = cli.seed {
        tuning.reseed(seed);
    }

    let course = match &cli.levels {
        Some(path) => Course::from_path(tuning.course_config(), path)?,
        None => Course::builtin(tuning.course_config()),
    };
    let level_count = course.level_count();
    let mut session = Session::new(tuning.session_config(), course, LogPresenter::default())
        .context("failed to start session")?;

    let mut autopilot = Autopilot::new(cli.steering);
    let mut scheduler = Scheduler::new(Duration::from_secs(1) / cli.fixed_hz);
    let limits = RunLimits {
        frame: Duration::from_millis(cli.frame_ms),
        max_time: Duration::from_secs(cli.max_seconds),
        levels: cli.play,
        skip_tally: cli.skip_tally,
    };
    tracing::info!(
        levels = level_count,
        play = cli.play,
        steering = ?cli.steering,
        "headless run starting"
    );

    let outcome = runner::run(&mut session, &mut autopilot, &mut scheduler, limits)?;

    for report in &outcome.levels {
        println!(
            "level {}: score {} with {} survivors, {} star(s)",
            report.level + 1,
            report.score,
            report.survivors,
            report.stars
        );
    }

    let presenter = session.presenter();
    println!(
        "simulated {:.1}s, distance {}, population {}, last score {} ({} stars), {} sounds",
        outcome.simulated.as_secs_f32(),
        presenter.distance(),
        presenter.population(),
        presenter.score(),
        presenter.stars(),
        presenter.sounds()
    );
    tracing::debug!(
        visuals = presenter.live_visuals(),
        players = presenter.visuals_of(MobKind::Player),
        enemies = presenter.visuals_of(MobKind::Enemy),
        "visuals still instantiated"
    );

    if outcome.game_over {
        println!("game over");
    }
    if outcome.timed_out {
        bail!(
            "run did not finish {} level(s) within {}s",
            cli.play,
            cli.max_seconds
        );
    }
    Ok(())
}

fn init_logging(directives: Option<&str>) -> Result<()> {
    let directives = match directives {
        Some(directives) => directives.to_owned(),
        None => env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_owned()),
    };
    let filter = EnvFilter::try_new(&directives)
        .with_context(|| format!("invalid log filter `{directives}`"))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}
