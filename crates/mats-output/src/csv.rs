//! CSV output backend.
//!
//! Creates four files in the configured output directory:
//! - `simulation.csv` — one `start` row and one `end` row
//! - `kpi_snapshots.csv`
//! - `vehicle_aggregates.csv`
//! - `intersection_aggregates.csv`

use std::fs::File;
use std::path::Path;

use csv::Writer;

use mats_agents::{IntersectionStats, VehicleStats};
use mats_sim::KpiSnapshot;

use crate::recorder::{SimulationHeader, SimulationRecorder};
use crate::OutputResult;

/// Writes simulation records to CSV files.
pub struct CsvRecorder {
    simulation: Writer<File>,
    kpis: Writer<File>,
    vehicles: Writer<File>,
    intersections: Writer<File>,
}

impl CsvRecorder {
    /// Open (or create) the four CSV files in `dir` and write header rows.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        let mut simulation = Writer::from_path(dir.join("simulation.csv"))?;
        simulation.write_record(["event", "id", "name", "scenario", "duration_secs"])?;

        let mut kpis = Writer::from_path(dir.join("kpi_snapshots.csv"))?;
        kpis.write_record([
            "tick",
            "sim_time",
            "avg_travel_time",
            "avg_queue_length",
            "total_messages",
            "active_vehicles",
            "arrivals",
            "avg_speed",
            "congestion_level",
        ])?;

        let mut vehicles = Writer::from_path(dir.join("vehicle_aggregates.csv"))?;
        vehicles.write_record([
            "id",
            "vehicle_type",
            "distance_traveled",
            "travel_time",
            "route_changes",
            "stops",
            "average_speed",
            "reached_destination",
        ])?;

        let mut intersections = Writer::from_path(dir.join("intersection_aggregates.csv"))?;
        intersections.write_record([
            "id",
            "vehicles_processed",
            "avg_waiting_time",
            "phase_changes",
            "coordination_messages",
            "green_wave_active",
        ])?;

        Ok(Self { simulation, kpis, vehicles, intersections })
    }
}

impl SimulationRecorder for CsvRecorder {
    fn start(&mut self, header: &SimulationHeader) -> OutputResult<()> {
        self.simulation.write_record([
            "start",
            &header.id,
            &header.name,
            &header.scenario,
            "",
        ])?;
        self.simulation.flush()?;
        Ok(())
    }

    fn kpi(&mut self, snapshot: &KpiSnapshot) -> OutputResult<()> {
        self.kpis.write_record(&[
            snapshot.tick.to_string(),
            snapshot.sim_time.to_string(),
            snapshot.avg_travel_time.to_string(),
            snapshot.avg_queue_length.to_string(),
            snapshot.total_messages.to_string(),
            snapshot.active_vehicles.to_string(),
            snapshot.arrivals.to_string(),
            snapshot.avg_speed.to_string(),
            snapshot.congestion_level.to_string(),
        ])?;
        Ok(())
    }

    fn vehicle(&mut self, stats: &VehicleStats) -> OutputResult<()> {
        self.vehicles.write_record(&[
            stats.id.0.to_string(),
            stats.vehicle_type.to_string(),
            stats.distance_traveled.to_string(),
            stats.travel_time.to_string(),
            stats.route_changes.to_string(),
            stats.stops.to_string(),
            stats.average_speed.to_string(),
            (stats.reached_destination as u8).to_string(),
        ])?;
        Ok(())
    }

    fn intersection(&mut self, stats: &IntersectionStats) -> OutputResult<()> {
        self.intersections.write_record(&[
            stats.id.0.to_string(),
            stats.total_vehicles_processed.to_string(),
            stats.avg_waiting_time.to_string(),
            stats.phase_changes.to_string(),
            stats.coordination_messages.to_string(),
            (stats.green_wave_active as u8).to_string(),
        ])?;
        Ok(())
    }

    fn end(&mut self, simulation_id: &str, duration_secs: f64) -> OutputResult<()> {
        self.simulation.write_record([
            "end",
            simulation_id,
            "",
            "",
            &duration_secs.to_string(),
        ])?;
        self.simulation.flush()?;
        self.kpis.flush()?;
        self.vehicles.flush()?;
        self.intersections.flush()?;
        Ok(())
    }
}
