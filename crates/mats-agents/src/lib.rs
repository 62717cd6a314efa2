//! `mats-agents` — the three agent kinds of the traffic system.
//!
//! # Crate layout
//!
//! | Module           | Contents                                                  |
//! |------------------|-----------------------------------------------------------|
//! | [`vehicle`]      | `VehicleAgent` — kinematics, route following, rerouting   |
//! | [`intersection`] | `IntersectionAgent` — signal control and coordination     |
//! | [`crisis`]       | `CrisisManagerAgent` — emergency priority and CNP manager |
//! | [`kind`]         | `AgentKind` — the dispatch sum type over the three        |
//!
//! All three implement [`mats_bdi::BdiAgent`]; the scheduler drives them
//! through the shared cycle via [`AgentKind`], which dispatches on the
//! variant instead of any inheritance hierarchy.

pub mod crisis;
pub mod intersection;
pub mod kind;
pub mod vehicle;

#[cfg(test)]
mod tests;

pub use crisis::{CongestionClass, CrisisManagerAgent, CrisisStats};
pub use intersection::{
    IntersectionAgent, IntersectionStats, LightState, NeighborState, SignalTiming,
};
pub use kind::AgentKind;
pub use vehicle::{RerouteRecord, VehicleAgent, VehicleStats};
