//! `mats-output` — the persistence hook.
//!
//! The core only *emits* records; storage schemas are this crate's concern.
//! Backends implement [`SimulationRecorder`]:
//!
//! | Backend                     | Feature  | Output                          |
//! |-----------------------------|----------|---------------------------------|
//! | [`CsvRecorder`]             | always   | four CSV files in a directory   |
//! | [`SqliteRecorder`]          | `sqlite` | a single `simulation.db`        |
//!
//! [`RecordingObserver`] bridges a recorder onto the simulation's observer
//! seam.  Persistence failures are non-fatal by contract: the observer
//! stores the first error and the run continues; check
//! [`RecordingObserver::take_error`] after the run.

pub mod csv;
pub mod error;
pub mod observer;
pub mod recorder;
#[cfg(feature = "sqlite")]
pub mod sqlite;


pub use csv::CsvRecorder;
pub use error::{OutputError, OutputResult};
pub use observer::RecordingObserver;
pub use recorder::{SimulationHeader, SimulationRecorder};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteRecorder;
