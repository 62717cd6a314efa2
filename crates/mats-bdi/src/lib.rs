//! `mats-bdi` — the belief-desire-intention agent model.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                     |
//! |---------------|--------------------------------------------------------------|
//! | [`belief`]    | `BeliefKind`, `BeliefValue`, `Belief`, `BeliefStore`         |
//! | [`desire`]    | `DesireKind`, `Desire`, `DesireSet`                          |
//! | [`intention`] | `IntentionKind`, `Intention`, lifecycle status               |
//! | [`context`]   | `WorldView` (per-tick snapshot) + `TickCtx`                  |
//! | [`agent`]     | `BdiAgent` trait, `BdiState`, the `run_cycle` driver         |
//!
//! # The reasoning cycle
//!
//! Each tick, [`agent::run_cycle`] drives an agent through four phases:
//!
//! 1. **Perceive** — refresh beliefs from the [`context::WorldView`]
//!    snapshot, then drain the inbox through `handle_message`; beliefs older
//!    than the validity window are dropped.
//! 2. **Generate desires** — rebuild the desire set from current beliefs;
//!    sort by priority descending.
//! 3. **Deliberate** — emit new intentions consistent with the top desires.
//! 4. **Execute** — run each pending intention to completed/failed, record
//!    the outcome in a bounded action history, purge terminal intentions.
//!
//! Agents only read the snapshot and only write their own state and outbox,
//! so no agent ever observes another agent's same-tick mutations.

pub mod agent;
pub mod belief;
pub mod context;
pub mod desire;
pub mod intention;

#[cfg(test)]
mod tests;

pub use agent::{run_cycle, ActionRecord, BdiAgent, BdiState};
pub use belief::{
    Belief, BeliefKind, BeliefSource, BeliefStore, BeliefValue, CongestionBelief, NearbyVehicle,
    TrafficState, DEFAULT_VALIDITY_WINDOW,
};
pub use context::{IntersectionObs, TickCtx, VehicleObs, WorldView};
pub use desire::{Desire, DesireKind, DesireSet};
pub use intention::{
    CongestedIntersection, Intention, IntentionKind, IntentionStatus, RerouteReason,
};
