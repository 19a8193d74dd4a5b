#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Hexagonal formation layout used to place swarm members around the leader.
//!
//! Slot 0 sits on the leader. Every further ring `r` holds `6r` slots laid
//! out as six rows of `r` slots, each row starting on a hexagon corner and
//! walking toward the next corner. The table is computed once for a bounded
//! number of rings and never changes afterwards.

use glam::Vec2;
use thiserror::Error;

const HALF_SQRT_3: f32 = 0.866_025_4;

/// Corner each of the six rows starts from, scaled by the ring index.
const ROW_STARTS: [Vec2; 6] = [
    Vec2::new(-1.0, 0.0),
    Vec2::new(-0.5, HALF_SQRT_3),
    Vec2::new(0.5, HALF_SQRT_3),
    Vec2::new(1.0, 0.0),
    Vec2::new(0.5, -HALF_SQRT_3),
    Vec2::new(-0.5, -HALF_SQRT_3),
];

/// Step taken per slot along each row.
const ROW_DIRECTIONS: [Vec2; 6] = [
    Vec2::new(0.5, HALF_SQRT_3),
    Vec2::new(1.0, 0.0),
    Vec2::new(0.5, -HALF_SQRT_3),
    Vec2::new(-0.5, -HALF_SQRT_3),
    Vec2::new(-1.0, 0.0),
    Vec2::new(-0.5, HALF_SQRT_3),
];

const DEFAULT_RINGS: u32 = 15;
const DEFAULT_SPACING: f32 = 0.6;

/// Errors raised when a formation table cannot serve a request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum FormationError {
    /// A slot beyond the precomputed table was requested.
    #[error("formation slot {slot} is outside the table of {len} slots")]
    SlotOutOfRange {
        /// Requested slot.
        slot: usize,
        /// Number of slots in the table.
        len: usize,
    },
    /// The table cannot seat the requested population.
    #[error("formation table of {len} slots cannot seat a population of {population}")]
    TooSmall {
        /// Population that must fit.
        population: usize,
        /// Number of slots in the table.
        len: usize,
    },
}

/// Number of slots on the provided ring.
#[must_use]
pub const fn ring_size(ring: u32) -> usize {
    if ring == 0 {
        1
    } else {
        6 * ring as usize
    }
}

/// Number of slots on every ring up to and including `ring`.
#[must_use]
pub const fn slots_through_ring(ring: u32) -> usize {
    let ring = ring as usize;
    1 + 3 * ring * (ring + 1)
}

/// Resolves the ring holding `slot` by accumulating ring sizes until the
/// running total exceeds the slot index.
#[must_use]
pub fn ring_of(slot: usize) -> u32 {
    let mut ring = 0;
    let mut total = ring_size(0);
    while total <= slot {
        ring += 1;
        total += ring_size(ring);
    }
    ring
}

/// Precomputed table of formation offsets indexed by slot.
#[derive(Clone, Debug)]
pub struct FormationLayout {
    offsets: Vec<Vec2>,
    rings: u32,
}

impl FormationLayout {
    /// Builds the table for rings `0..=rings` with `spacing` world units
    /// between neighbouring slots.
    #[must_use]
    pub fn new(rings: u32, spacing: f32) -> Self {
        let mut offsets = Vec::with_capacity(slots_through_ring(rings));
        offsets.push(Vec2::ZERO);

        for ring in 1..=rings {
            let scale = ring as f32;
            for row in 0..6 {
                let start = ROW_STARTS[row] * scale;
                for step in 0..ring {
                    offsets.push((start + ROW_DIRECTIONS[row] * step as f32) * spacing);
                }
            }
        }

        Self { offsets, rings }
    }

    /// Offset of `slot` relative to the leader, if the table covers it.
    #[must_use]
    pub fn offset(&self, slot: usize) -> Option<Vec2> {
        self.offsets.get(slot).copied()
    }

    /// Offset of `slot`, reporting a configuration error beyond the table.
    pub fn try_offset(&self, slot: usize) -> Result<Vec2, FormationError> {
        self.offset(slot).ok_or(FormationError::SlotOutOfRange {
            slot,
            len: self.len(),
        })
    }

    /// Verifies that every slot a population of `population` may occupy exists.
    pub fn ensure_fits(&self, population: usize) -> Result<(), FormationError> {
        if population > self.len() {
            return Err(FormationError::TooSmall {
                population,
                len: self.len(),
            });
        }
        Ok(())
    }

    /// Number of slots in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    /// Reports whether the table holds no slots. Never true for a built table.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Outermost ring covered by the table.
    #[must_use]
    pub const fn rings(&self) -> u32 {
        self.rings
    }
}

impl Default for FormationLayout {
    fn default() -> Self {
        Self::new(DEFAULT_RINGS, DEFAULT_SPACING)
    }
}
