//! `RecordingObserver<R>` — bridges `SimObserver` to a `SimulationRecorder`.

use mats_sim::{KpiSnapshot, SimObserver, World};

use crate::recorder::{SimulationHeader, SimulationRecorder};
use crate::OutputError;

/// A [`SimObserver`] that persists KPI snapshots during the run and the
/// per-agent aggregates at the end.
///
/// Recorder errors are stored internally because observer methods have no
/// return value, and persistence failures must not abort the simulation.
/// After `world.run()` returns, check for errors with
/// [`take_error`][Self::take_error].
pub struct RecordingObserver<R: SimulationRecorder> {
    recorder: R,
    simulation_id: String,
    last_error: Option<OutputError>,
}

impl<R: SimulationRecorder> RecordingObserver<R> {
    /// Create the observer and write the run header.
    pub fn new(mut recorder: R, header: SimulationHeader) -> Self {
        let start_result = recorder.start(&header);
        let mut observer = Self {
            recorder,
            simulation_id: header.id,
            last_error: None,
        };
        observer.store_err(start_result);
        observer
    }

    /// Take the stored write error (if any) after the run.
    pub fn take_error(&mut self) -> Option<OutputError> {
        self.last_error.take()
    }

    /// Unwrap the inner recorder (e.g. to inspect files after the run).
    pub fn into_recorder(self) -> R {
        self.recorder
    }

    fn store_err(&mut self, result: crate::OutputResult<()>) {
        if let Err(e) = result
            && self.last_error.is_none()
        {
            self.last_error = Some(e);
        }
    }
}

impl<R: SimulationRecorder> SimObserver for RecordingObserver<R> {
    fn on_kpi_snapshot(&mut self, snapshot: &KpiSnapshot) {
        let result = self.recorder.kpi(snapshot);
        self.store_err(result);
    }

    fn on_sim_end(&mut self, world: &World) {
        for stats in world.final_vehicle_aggregates() {
            let result = self.recorder.vehicle(&stats);
            self.store_err(result);
        }
        for stats in world.intersection_aggregates() {
            let result = self.recorder.intersection(&stats);
            self.store_err(result);
        }
        let result = self.recorder.end(&self.simulation_id, world.clock.now_secs());
        self.store_err(result);
    }
}
