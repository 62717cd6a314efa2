//! Planar geometry and compass types.
//!
//! Positions are metres in a flat city frame (x east, y north), stored as
//! `f32` — centimetre precision over a 50 km extent, half the memory of
//! `f64`, and every distance the simulation cares about is well above the
//! rounding floor.

use std::fmt;

/// A position in the city frame, metres.
#[derive(Copy, Clone, Debug, PartialEq, Default)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    #[inline]
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance in metres.
    #[inline]
    pub fn distance(self, other: Point) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Unit vector from `self` toward `target`, or `(0, 0)` if coincident.
    pub fn unit_to(self, target: Point) -> (f32, f32) {
        let dx = target.x - self.x;
        let dy = target.y - self.y;
        let d = (dx * dx + dy * dy).sqrt();
        if d == 0.0 { (0.0, 0.0) } else { (dx / d, dy / d) }
    }

    /// Translate by a direction vector scaled by `len` metres.
    #[inline]
    pub fn advance(self, dir: (f32, f32), len: f32) -> Point {
        Point::new(self.x + dir.0 * len, self.y + dir.1 * len)
    }

    /// The compass direction from which an approaching object at `other`
    /// arrives at `self` — the dominant axis of the offset wins.
    ///
    /// An object east of `self` approaches from [`Direction::East`], etc.
    pub fn approach_direction(self, other: Point) -> Direction {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        if dx.abs() > dy.abs() {
            if dx > 0.0 { Direction::East } else { Direction::West }
        } else if dy > 0.0 {
            Direction::North
        } else {
            Direction::South
        }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.1}, {:.1})", self.x, self.y)
    }
}

// ── Direction ─────────────────────────────────────────────────────────────────

/// Approach lanes of a four-way intersection.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(serde::Serialize, serde::Deserialize)]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    pub const ALL: [Direction; 4] =
        [Direction::North, Direction::South, Direction::East, Direction::West];

    /// Array index for per-direction `[T; 4]` storage.
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Direction::North => 0,
            Direction::South => 1,
            Direction::East => 2,
            Direction::West => 3,
        }
    }

    /// The signal phase group this direction belongs to.
    #[inline]
    pub fn phase(self) -> Phase {
        match self {
            Direction::North | Direction::South => Phase::NS,
            Direction::East | Direction::West => Phase::EW,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Direction::North => "north",
            Direction::South => "south",
            Direction::East => "east",
            Direction::West => "west",
        };
        f.write_str(s)
    }
}

// ── Phase ─────────────────────────────────────────────────────────────────────

/// The two mutually exclusive green groups of a signalized intersection.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[derive(serde::Serialize, serde::Deserialize)]
pub enum Phase {
    /// North and South approaches share green.
    NS,
    /// East and West approaches share green.
    EW,
}

impl Phase {
    /// The directions that are green while this phase holds.
    #[inline]
    pub fn directions(self) -> [Direction; 2] {
        match self {
            Phase::NS => [Direction::North, Direction::South],
            Phase::EW => [Direction::East, Direction::West],
        }
    }

    /// The opposing phase group.
    #[inline]
    pub fn other(self) -> Phase {
        match self {
            Phase::NS => Phase::EW,
            Phase::EW => Phase::NS,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::NS => "NS",
            Phase::EW => "EW",
        })
    }
}
