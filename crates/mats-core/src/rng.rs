//! The run's single deterministic RNG.
//!
//! # Determinism strategy
//!
//! One `SimRng`, seeded from `SimConfig::random_seed`, feeds every stochastic
//! site in the simulation: agent activation order, ε-greedy signal policy,
//! scenario zone sampling, and vehicle generation.  It is passed explicitly
//! (`&mut SimRng`) — there is no global RNG — so the same seed always
//! reproduces the same run, and the call-site order fully determines the
//! stream.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Deterministic simulation RNG wrapping a `SmallRng`.
pub struct SimRng(SmallRng);

impl SimRng {
    pub fn new(seed: u64) -> Self {
        SimRng(SmallRng::seed_from_u64(seed))
    }

    /// Expose the inner `SmallRng` for use with `rand` distribution types.
    #[inline]
    pub fn inner(&mut self) -> &mut SmallRng {
        &mut self.0
    }

    /// Generate a value uniformly in `range`.
    #[inline]
    pub fn gen_range<T, R>(&mut self, range: R) -> T
    where
        T: rand::distributions::uniform::SampleUniform,
        R: rand::distributions::uniform::SampleRange<T>,
    {
        self.0.gen_range(range)
    }

    /// `true` with probability `p` (clamped to [0, 1]).
    #[inline]
    pub fn gen_bool(&mut self, p: f64) -> bool {
        self.0.gen_bool(p.clamp(0.0, 1.0))
    }

    /// Shuffle a mutable slice in-place (Fisher-Yates).
    #[inline]
    pub fn shuffle<T>(&mut self, slice: &mut [T]) {
        use rand::seq::SliceRandom;
        slice.shuffle(&mut self.0);
    }

    /// Choose a random element from a slice, `None` if empty.
    #[inline]
    pub fn choose<'a, T>(&mut self, slice: &'a [T]) -> Option<&'a T> {
        use rand::seq::SliceRandom;
        slice.choose(&mut self.0)
    }

    /// Uniform `f32` in [0, 1).
    #[inline]
    pub fn unit(&mut self) -> f32 {
        self.0.r#gen::<f32>()
    }
}
