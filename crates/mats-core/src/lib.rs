//! `mats-core` — foundational types for the `rust_mats` traffic simulator.
//!
//! This crate is a dependency of every other `mats-*` crate.  It intentionally
//! has no `mats-*` dependencies and minimal external ones (only `rand`,
//! `serde`, and `thiserror`).
//!
//! # What lives here
//!
//! | Module      | Contents                                              |
//! |-------------|-------------------------------------------------------|
//! | [`ids`]     | `AgentId`, `NodeId`, `MessageId`, `ConversationId`    |
//! | [`geo`]     | `Point`, `Direction`, `Phase`                         |
//! | [`time`]    | `Tick`, `SimClock`                                    |
//! | [`config`]  | `SimConfig` and algorithm selection enums             |
//! | [`rng`]     | `SimRng` — the run's single deterministic RNG         |
//! | [`vehicle`] | `VehicleType` and per-type speed limits               |
//! | [`error`]   | `CoreError`, `CoreResult`                             |

pub mod config;
pub mod error;
pub mod geo;
pub mod ids;
pub mod rng;
pub mod time;
pub mod vehicle;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::{RoutingAlgorithm, SignalAlgorithm, SimConfig};
pub use error::{CoreError, CoreResult};
pub use geo::{Direction, Phase, Point};
pub use ids::{AgentId, ConversationId, MessageId, NodeId};
pub use rng::SimRng;
pub use time::{SimClock, Tick};
pub use vehicle::VehicleType;
