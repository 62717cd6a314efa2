//! Simulation time model.
//!
//! Time is a monotonically increasing `Tick` counter; one tick spans
//! `time_step` simulated seconds (default 1.0).  The integer tick is the
//! canonical unit — schedule arithmetic is exact and comparisons are O(1) —
//! while timers inside agents accumulate fractional seconds.

use std::fmt;

// ── Tick ─────────────────────────────────────────────────────────────────────

/// An absolute simulation tick counter.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct Tick(pub u64);

impl Tick {
    pub const ZERO: Tick = Tick(0);

    /// The tick `n` steps after `self`.
    #[inline]
    pub fn offset(self, n: u64) -> Tick {
        Tick(self.0 + n)
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

// ── SimClock ──────────────────────────────────────────────────────────────────

/// Converts between tick counts and simulated seconds.
///
/// Cheap to copy; holds no heap data.
#[derive(Clone, Debug)]
pub struct SimClock {
    /// Simulated seconds per tick.
    pub time_step: f32,
    /// The current tick — advanced by [`SimClock::advance`] once per loop
    /// iteration.
    pub current_tick: Tick,
}

impl SimClock {
    pub fn new(time_step: f32) -> Self {
        Self { time_step, current_tick: Tick::ZERO }
    }

    /// Advance the clock by one tick.
    #[inline]
    pub fn advance(&mut self) {
        self.current_tick = Tick(self.current_tick.0 + 1);
    }

    /// Elapsed simulated seconds since tick 0.
    #[inline]
    pub fn now_secs(&self) -> f64 {
        self.current_tick.0 as f64 * self.time_step as f64
    }

    /// How many ticks span `secs` simulated seconds (rounds up, so an event
    /// scheduled by seconds never fires early).
    #[inline]
    pub fn ticks_for_secs(&self, secs: f32) -> u64 {
        (secs / self.time_step).ceil() as u64
    }
}

impl fmt::Display for SimClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:.1} s)", self.current_tick, self.now_secs())
    }
}
