//! `mats-sim` — the simulation world and tick loop.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                   |
//! |--------------|------------------------------------------------------------|
//! | [`world`]    | `World`, `WorldBuilder`, the tick pipeline                 |
//! | [`kpi`]      | `KpiSnapshot` — the per-interval metrics record            |
//! | [`observer`] | `SimObserver` callbacks, `NoopObserver`                    |
//! | [`microsim`] | `MicrosimLink` — the external microsimulator sync hook     |
//! | [`scenario`] | `Scenario` trait, rush-hour and incident implementations   |
//! | [`error`]    | `SimError`, `SimResult`                                    |
//!
//! # Tick pipeline
//!
//! ```text
//! for each tick:
//!   ① restore expired blockages (and drop stale cached routes)
//!   ② freeze a WorldView snapshot of all observable agent state
//!   ③ run the BDI cycle for every active agent, in an RNG-shuffled order
//!   ④ drain outboxes in activation order through the message bus
//!   ⑤ harvest arrived vehicles into the final aggregates
//!   ⑥ scenario step hooks (new vehicles, blockages, informs)
//!   ⑦ KPI snapshot every kpi_interval ticks
//!   ⑧ microsim sync hook
//!   ⑨ advance the clock
//! ```
//!
//! A tick is atomic: every agent steps against the same snapshot before any
//! message is routed, so messages emitted at tick T are observed at T+1.

pub mod error;
pub mod kpi;
pub mod microsim;
pub mod observer;
pub mod scenario;
pub mod world;

#[cfg(test)]
mod tests;

pub use error::{SimError, SimResult};
pub use kpi::KpiSnapshot;
pub use microsim::{MicrosimLink, NoopMicrosim, PhaseSync, VehicleSync};
pub use observer::{NoopObserver, SimObserver};
pub use scenario::{IncidentScenario, RushHourScenario, Scenario, ScenarioStats};
pub use world::{InformDeliveries, World, WorldBuilder};
