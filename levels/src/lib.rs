#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Data-driven level course for Mob Runner.
//!
//! A course is a list of levels, each made of segments laid end to end along
//! the run direction starting at `y = 0`. [`Course`] streams the segments of
//! the loaded level in a window around the leader and raises each feature's
//! trigger once when the leader crosses the feature line at the segment's
//! midpoint. At most one trigger is raised per update; lines crossed in the
//! same step stay armed and fire on the following updates in course order.
//! Running past the end of the level finishes it even without a finish line.

mod definition;

use std::{collections::VecDeque, fs, path::Path, time::Duration};

use anyhow::{Context, Result};
use glam::Vec2;
use mob_runner_core::{LevelStreaming, SessionEvent, StarThresholds};

pub use definition::{CourseDefinition, Feature, LevelDefinition, SegmentDefinition};

const DEFAULT_VIEW_AHEAD: f32 = 60.0;
const DEFAULT_VIEW_BEHIND: f32 = 20.0;
const DEFAULT_GATE_OFFSET: f32 = 3.0;
const GATE_SPAWN_AHEAD: f32 = 1.0;

/// Configuration parameters controlling how segments are streamed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config {
    view_ahead: f32,
    view_behind: f32,
    gate_offset: f32,
}

impl Config {
    /// Creates a configuration keeping segments that start within
    /// `view_ahead` of the leader and retiring those ending more than
    /// `view_behind` behind it. Gates sit `gate_offset` either side of the
    /// lane centre.
    #[must_use]
    pub const fn new(view_ahead: f32, view_behind: f32, gate_offset: f32) -> Self {
        Self {
            view_ahead,
            view_behind,
            gate_offset,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_VIEW_AHEAD, DEFAULT_VIEW_BEHIND, DEFAULT_GATE_OFFSET)
    }
}

impl Config {
    /// Distance ahead of the leader within which segments stream in.
    #[must_use]
    pub const fn view_ahead(&self) -> f32 {
        self.view_ahead
    }

    /// Distance behind the leader after which segments retire.
    #[must_use]
    pub const fn view_behind(&self) -> f32 {
        self.view_behind
    }

    /// Lateral distance of each gate from the lane centre.
    #[must_use]
    pub const fn gate_offset(&self) -> f32 {
        self.gate_offset
    }
}

#[derive(Clone, Copy, Debug)]
struct PlacedSegment {
    start: f32,
    end: f32,
    feature: Option<Feature>,
    triggered: bool,
}

impl PlacedSegment {
    fn feature_line(&self) -> f32 {
        (self.start + self.end) * 0.5
    }

    fn pending(&self, leader_y: f32) -> bool {
        self.feature.is_some() && !self.triggered && leader_y >= self.feature_line()
    }
}

/// Level streaming collaborator backed by a validated course definition.
#[derive(Debug)]
pub struct Course {
    config: Config,
    definition: CourseDefinition,
    active_level: Option<usize>,
    segments: Vec<PlacedSegment>,
    window: VecDeque<usize>,
    next_segment: usize,
    elapsed: Duration,
    finished: bool,
}

impl Course {
    /// Wraps an already validated definition.
    #[must_use]
    pub fn new(config: Config, definition: CourseDefinition) -> Self {
        Self {
            config,
            definition,
            active_level: None,
            segments: Vec::new(),
            window: VecDeque::new(),
            next_segment: 0,
            elapsed: Duration::ZERO,
            finished: false,
        }
    }

    /// Course built from the levels shipped with the game.
    #[must_use]
    pub fn builtin(config: Config) -> Self {
        Self::new(config, CourseDefinition::builtin())
    }

    /// Loads and validates a course from a TOML file.
    pub fn from_path(config: Config, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read course at {}", path.display()))?;
        let definition = CourseDefinition::from_toml_str(&contents)
            .with_context(|| format!("failed to load course at {}", path.display()))?;
        tracing::info!(
            path = %path.display(),
            levels = definition.levels.len(),
            "course loaded"
        );
        Ok(Self::new(config, definition))
    }

    /// Number of levels in the course.
    #[must_use]
    pub fn level_count(&self) -> usize {
        self.definition.levels.len()
    }

    /// Index of the loaded level, if any.
    #[must_use]
    pub const fn active_level(&self) -> Option<usize> {
        self.active_level
    }

    /// Indices of the segments currently streamed in, in course order.
    pub fn active_segments(&self) -> impl Iterator<Item = usize> + '_ {
        self.window.iter().copied()
    }

    /// Total length of the loaded level.
    #[must_use]
    pub fn level_length(&self) -> f32 {
        self.segments.last().map_or(0.0, |segment| segment.end)
    }

    /// Time the leader has spent on the loaded level.
    #[must_use]
    pub const fn elapsed(&self) -> Duration {
        self.elapsed
    }

    fn stream(&mut self, leader_y: f32) {
        while let Some(segment) = self.segments.get(self.next_segment) {
            if segment.start > leader_y + self.config.view_ahead {
                break;
            }
            tracing::trace!(segment = self.next_segment, "segment streamed in");
            self.window.push_back(self.next_segment);
            self.next_segment += 1;
        }
    }

    fn retire(&mut self, leader_y: f32) {
        while let Some(&index) = self.window.front() {
            let segment = &self.segments[index];
            if segment.pending(leader_y) || segment.end >= leader_y - self.config.view_behind {
                break;
            }
            tracing::trace!(segment = index, "segment retired");
            let _ = self.window.pop_front();
        }
    }

    fn raise_trigger(&mut self, leader: Vec2) -> Option<SessionEvent> {
        let index = self
            .window
            .iter()
            .copied()
            .find(|&index| self.segments[index].pending(leader.y))?;
        let segment = &mut self.segments[index];
        segment.triggered = true;
        let line = segment.feature_line();

        let event = match segment.feature? {
            Feature::GatePair { left, right } => {
                let (gate, x) = if leader.x < 0.0 {
                    (left, -self.config.gate_offset)
                } else {
                    (right, self.config.gate_offset)
                };
                SessionEvent::GateTriggered {
                    gate,
                    spawn_point: Vec2::new(x, line + GATE_SPAWN_AHEAD),
                }
            }
            Feature::Encounter {
                enemies,
                battlefield_ahead,
            } => SessionEvent::EncounterTriggered {
                battlefield: Vec2::new(0.0, line + battlefield_ahead),
                enemy_count: enemies,
            },
            Feature::Finish => {
                self.finished = true;
                SessionEvent::LevelFinished
            }
        };
        tracing::debug!(segment = index, ?event, "course trigger crossed");
        Some(event)
    }

    fn exhausted(&mut self, leader_y: f32) -> Option<SessionEvent> {
        if self.finished || self.segments.is_empty() || leader_y < self.level_length() {
            return None;
        }
        self.finished = true;
        tracing::debug!(length = self.level_length(), "ran past the last segment");
        Some(SessionEvent::LevelFinished)
    }
}

impl LevelStreaming for Course {
    fn load_level(&mut self, index: usize) -> bool {
        self.window.clear();
        self.segments.clear();
        self.next_segment = 0;
        self.elapsed = Duration::ZERO;
        self.finished = false;

        let Some(level) = self.definition.levels.get(index) else {
            self.active_level = None;
            return false;
        };

        let mut start = 0.0;
        for segment in &level.segments {
            let end = start + segment.length;
            self.segments.push(PlacedSegment {
                start,
                end,
                feature: segment.feature,
                triggered: false,
            });
            start = end;
        }
        self.active_level = Some(index);
        self.stream(0.0);
        tracing::debug!(
            level = index,
            segments = self.segments.len(),
            length = start,
            "level activated"
        );
        true
    }

    fn level_setting(&self, index: usize) -> Option<StarThresholds> {
        self.definition.levels.get(index).map(|level| level.stars)
    }

    fn on_leader_moved(&mut self, dt: Duration, leader: Vec2, out: &mut Vec<SessionEvent>) {
        if self.active_level.is_none() {
            return;
        }
        self.elapsed = self.elapsed.saturating_add(dt);
        self.stream(leader.y);
        if let Some(event) = self
            .raise_trigger(leader)
            .or_else(|| self.exhausted(leader.y))
        {
            out.push(event);
        }
        self.retire(leader.y);
    }
}

impl Default for Course {
    fn default() -> Self {
        Self::builtin(Config::default())
    }
}
