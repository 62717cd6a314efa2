//! Simulation observer trait for progress reporting and data collection.

use mats_core::Tick;

use crate::kpi::KpiSnapshot;
use crate::world::World;

/// Callbacks invoked by [`World::run`] at key points in the tick loop.
///
/// All methods have default no-op implementations so implementors only need
/// to override what they care about.
pub trait SimObserver {
    /// Called at the end of each tick, after messages were routed and
    /// arrived vehicles harvested.
    fn on_tick_end(&mut self, _tick: Tick, _world: &World) {}

    /// Called every `kpi_interval` ticks with the freshly computed snapshot.
    fn on_kpi_snapshot(&mut self, _snapshot: &KpiSnapshot) {}

    /// Called once after the final tick completes.
    fn on_sim_end(&mut self, _world: &World) {}
}

/// A [`SimObserver`] that does nothing.
pub struct NoopObserver;

impl SimObserver for NoopObserver {}
