//! SQLite output backend (feature `sqlite`).
//!
//! Creates a single `simulation.db` in the configured output directory with
//! four tables: `simulations`, `kpi_snapshots`, `vehicle_aggregates`, and
//! `intersection_aggregates`.

use std::path::Path;

use rusqlite::Connection;

use mats_agents::{IntersectionStats, VehicleStats};
use mats_sim::KpiSnapshot;

use crate::recorder::{SimulationHeader, SimulationRecorder};
use crate::OutputResult;

/// Writes simulation records to an SQLite database.
pub struct SqliteRecorder {
    conn: Connection,
}

impl SqliteRecorder {
    /// Open (or create) `simulation.db` in `dir` and initialise the schema.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        let conn = Connection::open(dir.join("simulation.db"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous  = NORMAL;
             CREATE TABLE IF NOT EXISTS simulations (
                 id            TEXT PRIMARY KEY,
                 name          TEXT NOT NULL,
                 scenario      TEXT NOT NULL,
                 config        TEXT NOT NULL,
                 duration_secs REAL
             );
             CREATE TABLE IF NOT EXISTS kpi_snapshots (
                 tick             INTEGER NOT NULL,
                 sim_time         REAL NOT NULL,
                 avg_travel_time  REAL NOT NULL,
                 avg_queue_length REAL NOT NULL,
                 total_messages   INTEGER NOT NULL,
                 active_vehicles  INTEGER NOT NULL,
                 arrivals         INTEGER NOT NULL,
                 avg_speed        REAL NOT NULL,
                 congestion_level REAL NOT NULL
             );
             CREATE TABLE IF NOT EXISTS vehicle_aggregates (
                 id                  INTEGER NOT NULL,
                 vehicle_type        TEXT NOT NULL,
                 distance_traveled   REAL NOT NULL,
                 travel_time         REAL NOT NULL,
                 route_changes       INTEGER NOT NULL,
                 stops               INTEGER NOT NULL,
                 average_speed       REAL NOT NULL,
                 reached_destination INTEGER NOT NULL
             );
             CREATE TABLE IF NOT EXISTS intersection_aggregates (
                 id                    INTEGER NOT NULL,
                 vehicles_processed    INTEGER NOT NULL,
                 avg_waiting_time      REAL NOT NULL,
                 phase_changes         INTEGER NOT NULL,
                 coordination_messages INTEGER NOT NULL,
                 green_wave_active     INTEGER NOT NULL
             );",
        )?;

        Ok(Self { conn })
    }
}

impl SimulationRecorder for SqliteRecorder {
    fn start(&mut self, header: &SimulationHeader) -> OutputResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO simulations (id, name, scenario, config) \
             VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![header.id, header.name, header.scenario, header.config],
        )?;
        Ok(())
    }

    fn kpi(&mut self, snapshot: &KpiSnapshot) -> OutputResult<()> {
        self.conn.execute(
            "INSERT INTO kpi_snapshots \
             (tick, sim_time, avg_travel_time, avg_queue_length, total_messages, \
              active_vehicles, arrivals, avg_speed, congestion_level) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            rusqlite::params![
                snapshot.tick,
                snapshot.sim_time,
                snapshot.avg_travel_time,
                snapshot.avg_queue_length,
                snapshot.total_messages,
                snapshot.active_vehicles,
                snapshot.arrivals,
                snapshot.avg_speed,
                snapshot.congestion_level,
            ],
        )?;
        Ok(())
    }

    fn vehicle(&mut self, stats: &VehicleStats) -> OutputResult<()> {
        self.conn.execute(
            "INSERT INTO vehicle_aggregates \
             (id, vehicle_type, distance_traveled, travel_time, route_changes, \
              stops, average_speed, reached_destination) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            rusqlite::params![
                stats.id.0,
                stats.vehicle_type.to_string(),
                stats.distance_traveled,
                stats.travel_time,
                stats.route_changes,
                stats.stops,
                stats.average_speed,
                stats.reached_destination as i64,
            ],
        )?;
        Ok(())
    }

    fn intersection(&mut self, stats: &IntersectionStats) -> OutputResult<()> {
        self.conn.execute(
            "INSERT INTO intersection_aggregates \
             (id, vehicles_processed, avg_waiting_time, phase_changes, \
              coordination_messages, green_wave_active) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                stats.id.0,
                stats.total_vehicles_processed,
                stats.avg_waiting_time,
                stats.phase_changes,
                stats.coordination_messages,
                stats.green_wave_active as i64,
            ],
        )?;
        Ok(())
    }

    fn end(&mut self, simulation_id: &str, duration_secs: f64) -> OutputResult<()> {
        self.conn.execute(
            "UPDATE simulations SET duration_secs = ?2 WHERE id = ?1",
            rusqlite::params![simulation_id, duration_secs],
        )?;
        self.conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
        Ok(())
    }
}
