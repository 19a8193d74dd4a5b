#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Paced end-of-level score tally.
//!
//! The sequencer converts surviving swarm members into score one at a time
//! and then checks the three star thresholds, pausing between visible steps.
//! It is a resumable state machine driven by [`ScoringSequencer::advance`];
//! skipping removes the pauses but never the steps, so the outcome does not
//! depend on whether the player skipped.

use std::time::Duration;

use mob_runner_core::StarThresholds;

const DEFAULT_CONVERSION_INTERVAL: Duration = Duration::from_millis(100);
const DEFAULT_STAR_INTERVAL: Duration = Duration::from_millis(400);
const STAR_COUNT: u8 = 3;

/// Configuration parameters required to construct a sequencer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    conversion_interval: Duration,
    star_interval: Duration,
}

impl Config {
    /// Creates a new configuration with the pause after each conversion and
    /// after each revealed star.
    #[must_use]
    pub const fn new(conversion_interval: Duration, star_interval: Duration) -> Self {
        Self {
            conversion_interval,
            star_interval,
        }
    }

    /// Pause after each converted member.
    #[must_use]
    pub const fn conversion_interval(&self) -> Duration {
        self.conversion_interval
    }

    /// Pause after each revealed star.
    #[must_use]
    pub const fn star_interval(&self) -> Duration {
        self.star_interval
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_CONVERSION_INTERVAL, DEFAULT_STAR_INTERVAL)
    }
}

/// Visible step produced while the tally runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScoringStep {
    /// One more member was converted into score.
    MemberConverted {
        /// Members converted so far.
        converted: u32,
        /// Score after the conversion.
        score: u64,
    },
    /// A star threshold was met.
    StarRevealed {
        /// Zero-based star index.
        index: u8,
    },
    /// The tally finished.
    Completed {
        /// Final score.
        score: u64,
        /// Stars earned.
        stars: u8,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Stage {
    Converting,
    Stars,
    Done,
}

/// Resumable score tally for one finished level.
#[derive(Clone, Debug)]
pub struct ScoringSequencer {
    config: Config,
    thresholds: StarThresholds,
    distance: u64,
    remaining: u32,
    converted: u32,
    score: u64,
    next_star: u8,
    stars: u8,
    stage: Stage,
    pause: Duration,
    elapsed: Duration,
    skip: bool,
}

impl ScoringSequencer {
    /// Starts a tally worth `distance` points per surviving member.
    #[must_use]
    pub fn new(
        config: Config,
        distance: u64,
        population_remaining: u32,
        thresholds: StarThresholds,
    ) -> Self {
        Self {
            config,
            thresholds,
            distance,
            remaining: population_remaining,
            converted: 0,
            score: 0,
            next_star: 0,
            stars: 0,
            stage: Stage::Converting,
            pause: Duration::ZERO,
            elapsed: Duration::ZERO,
            skip: false,
        }
    }

    /// Suppresses every remaining pause. The steps still run in order.
    pub fn skip(&mut self) {
        self.skip = true;
    }

    /// Resumes the tally with `dt` of elapsed time.
    ///
    /// Steps that become due are appended to `out`. Returns `true` once the
    /// tally has completed.
    pub fn advance(&mut self, dt: Duration, out: &mut Vec<ScoringStep>) -> bool {
        self.elapsed = self.elapsed.saturating_add(dt);
        let mut budget = dt;

        while self.stage != Stage::Done {
            if self.skip {
                self.pause = Duration::ZERO;
            } else if self.pause > budget {
                self.pause -= budget;
                return false;
            } else {
                budget -= self.pause;
                self.pause = Duration::ZERO;
            }
            self.step(out);
        }
        true
    }

    fn step(&mut self, out: &mut Vec<ScoringStep>) {
        match self.stage {
            Stage::Converting => {
                if self.remaining == 0 {
                    self.stage = Stage::Stars;
                    return;
                }
                self.remaining -= 1;
                self.converted += 1;
                self.score = u64::from(self.converted) * self.distance;
                self.pause = self.config.conversion_interval;
                out.push(ScoringStep::MemberConverted {
                    converted: self.converted,
                    score: self.score,
                });
            }
            Stage::Stars => {
                if self.next_star == STAR_COUNT {
                    self.stage = Stage::Done;
                    out.push(ScoringStep::Completed {
                        score: self.score,
                        stars: self.stars,
                    });
                    return;
                }
                let index = self.next_star;
                self.next_star += 1;
                if index < self.thresholds.stars_for(self.score) {
                    self.stars += 1;
                    self.pause = self.config.star_interval;
                    out.push(ScoringStep::StarRevealed { index });
                }
            }
            Stage::Done => {}
        }
    }

    /// Score accumulated so far.
    #[must_use]
    pub const fn score(&self) -> u64 {
        self.score
    }

    /// Stars revealed so far.
    #[must_use]
    pub const fn stars(&self) -> u8 {
        self.stars
    }

    /// Members converted so far.
    #[must_use]
    pub const fn converted(&self) -> u32 {
        self.converted
    }

    /// Total time the tally has been advanced by.
    #[must_use]
    pub const fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Reports whether skipping was requested.
    #[must_use]
    pub const fn is_skipping(&self) -> bool {
        self.skip
    }

    /// Reports whether the tally has completed.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.stage == Stage::Done
    }
}
