//! The `SimulationRecorder` trait implemented by all backends.

use mats_agents::{IntersectionStats, VehicleStats};
use mats_sim::KpiSnapshot;

use crate::OutputResult;

/// Run identification written once at simulation start.
#[derive(Clone, Debug)]
pub struct SimulationHeader {
    /// Caller-chosen run identifier (also passed to [`SimulationRecorder::end`]).
    pub id: String,
    pub name: String,
    /// Active scenario names, comma-separated.
    pub scenario: String,
    /// The full configuration, serialized by the caller (JSON in practice).
    pub config: String,
}

/// A persistence backend for one simulation run.
///
/// Call order: `start` once, any number of `kpi` rows during the run,
/// then the `vehicle`/`intersection` aggregates, then `end` exactly once.
pub trait SimulationRecorder {
    fn start(&mut self, header: &SimulationHeader) -> OutputResult<()>;

    fn kpi(&mut self, snapshot: &KpiSnapshot) -> OutputResult<()>;

    fn vehicle(&mut self, stats: &VehicleStats) -> OutputResult<()>;

    fn intersection(&mut self, stats: &IntersectionStats) -> OutputResult<()>;

    /// Close the run record.  Idempotent backends are preferred; the
    /// observer calls this exactly once.
    fn end(&mut self, simulation_id: &str, duration_secs: f64) -> OutputResult<()>;
}
