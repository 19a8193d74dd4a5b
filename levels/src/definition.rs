use anyhow::{bail, Context, Result};
use mob_runner_core::{Gate, GateKind, StarThresholds};
use serde::Deserialize;

const DEFAULT_SEGMENT_LENGTH: f32 = 20.0;
const DEFAULT_BATTLEFIELD_AHEAD: f32 = 8.0;

/// Every level of a course in play order.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CourseDefinition {
    /// Levels indexed from zero.
    pub levels: Vec<LevelDefinition>,
}

/// One level: its star thresholds and the segments laid end to end.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LevelDefinition {
    /// Scores required for the three stars.
    pub stars: StarThresholds,
    /// Segments in course order, starting at the leader's start line.
    #[serde(default)]
    pub segments: Vec<SegmentDefinition>,
}

/// A stretch of course with at most one feature at its midpoint.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SegmentDefinition {
    /// Length along the run direction.
    #[serde(default = "default_segment_length")]
    pub length: f32,
    /// Feature placed across the segment.
    #[serde(default)]
    pub feature: Option<Feature>,
}

/// Something the leader can cross.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum Feature {
    /// Two gates side by side. Passing one disables both.
    GatePair {
        /// Gate on the negative x side of the lane.
        left: Gate,
        /// Gate on the positive x side of the lane.
        right: Gate,
    },
    /// Enemy squad waiting ahead of the trigger line.
    Encounter {
        /// Enemies spawned when the encounter triggers.
        enemies: u32,
        /// Distance from the trigger line to the battlefield point.
        #[serde(default = "default_battlefield_ahead")]
        battlefield_ahead: f32,
    },
    /// End of the level.
    Finish,
}

fn default_segment_length() -> f32 {
    DEFAULT_SEGMENT_LENGTH
}

fn default_battlefield_ahead() -> f32 {
    DEFAULT_BATTLEFIELD_AHEAD
}

impl CourseDefinition {
    /// Parses and validates a course from TOML.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let course: Self = toml::from_str(contents).context("failed to parse course toml")?;
        course.validate()?;
        Ok(course)
    }

    /// Rejects courses that cannot be played to completion.
    pub fn validate(&self) -> Result<()> {
        if self.levels.is_empty() {
            bail!("course defines no levels");
        }
        for (index, level) in self.levels.iter().enumerate() {
            level
                .validate()
                .with_context(|| format!("level {index} is invalid"))?;
        }
        Ok(())
    }

    /// Course used when no level file is supplied.
    #[must_use]
    pub fn builtin() -> Self {
        let gate = Gate::new;
        let plain = || SegmentDefinition {
            length: DEFAULT_SEGMENT_LENGTH,
            feature: None,
        };
        let with = |feature| SegmentDefinition {
            length: DEFAULT_SEGMENT_LENGTH,
            feature: Some(feature),
        };
        let encounter = |enemies| Feature::Encounter {
            enemies,
            battlefield_ahead: DEFAULT_BATTLEFIELD_AHEAD,
        };

        Self {
            levels: vec![
                LevelDefinition {
                    stars: StarThresholds::new([300, 900, 1500]),
                    segments: vec![
                        plain(),
                        with(Feature::GatePair {
                            left: gate(GateKind::Add, 10),
                            right: gate(GateKind::Multiply, 2),
                        }),
                        with(encounter(8)),
                        with(Feature::GatePair {
                            left: gate(GateKind::Subtract, 5),
                            right: gate(GateKind::Add, 15),
                        }),
                        plain(),
                        with(Feature::Finish),
                    ],
                },
                LevelDefinition {
                    stars: StarThresholds::new([600, 1800, 3000]),
                    segments: vec![
                        plain(),
                        with(Feature::GatePair {
                            left: gate(GateKind::Multiply, 3),
                            right: gate(GateKind::Divide, 2),
                        }),
                        with(encounter(20)),
                        with(Feature::GatePair {
                            left: gate(GateKind::Add, 20),
                            right: gate(GateKind::Subtract, 10),
                        }),
                        with(encounter(25)),
                        plain(),
                        with(Feature::Finish),
                    ],
                },
            ],
        }
    }
}

impl LevelDefinition {
    fn validate(&self) -> Result<()> {
        let [one, two, three] = self.stars.scores();
        if !(one < two && two < three) {
            bail!("star thresholds {one}, {two}, {three} must be strictly ascending");
        }

        let mut finish_lines = 0;
        for (index, segment) in self.segments.iter().enumerate() {
            if !(segment.length.is_finite() && segment.length > 0.0) {
                bail!("segment {index} has non-positive length {}", segment.length);
            }
            match segment.feature {
                Some(Feature::GatePair { left, right }) => {
                    for gate in [left, right] {
                        if gate.kind() == GateKind::Divide && gate.value() == 0 {
                            bail!("segment {index} divides by zero");
                        }
                    }
                }
                Some(Feature::Encounter {
                    battlefield_ahead, ..
                }) if !battlefield_ahead.is_finite() => {
                    bail!("segment {index} has a non-finite battlefield distance");
                }
                Some(Feature::Finish) => finish_lines += 1,
                Some(Feature::Encounter { .. }) | None => {}
            }
        }

        if finish_lines == 0 {
            bail!("level has no finish line");
        }
        Ok(())
    }
}
