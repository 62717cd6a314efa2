//! The KPI snapshot record collected every `kpi_interval` ticks.

use serde::Serialize;

/// One row of the periodic performance record.
///
/// Averages cover *active* vehicles only; counters are cumulative since the
/// start of the run.
#[derive(Clone, Debug, Serialize)]
pub struct KpiSnapshot {
    pub tick: u64,
    /// Simulated seconds at snapshot time.
    pub sim_time: f64,
    /// Mean travel time of vehicles still en route, seconds.
    pub avg_travel_time: f32,
    /// Mean total queue length across intersections.
    pub avg_queue_length: f32,
    /// Cumulative messages routed by the bus.
    pub total_messages: u64,
    pub active_vehicles: u32,
    /// Cumulative vehicles that reached their destination.
    pub arrivals: u64,
    /// Mean speed of active vehicles, m/s.
    pub avg_speed: f32,
    /// `1 − avg_speed / max_speed`, in [0, 1].
    pub congestion_level: f32,
}
