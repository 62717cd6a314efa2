//! The per-tick world snapshot and execution context.
//!
//! [`WorldView`] is an owned copy of the observable agent state, built by the
//! scheduler before any agent steps.  Every agent perceives the same frozen
//! frame, so perception never reflects another agent's same-tick mutations
//! regardless of activation order.

use mats_core::{AgentId, Phase, Point, SimRng, VehicleType};
use mats_routing::{DynamicRouter, RoadGraph};

/// A vehicle as other agents can observe it.
#[derive(Clone, Debug)]
pub struct VehicleObs {
    pub id: AgentId,
    pub vehicle_type: VehicleType,
    pub position: Point,
    pub speed: f32,
    pub destination: Point,
    /// Remaining planned waypoints.  Populated only for priority classes —
    /// the crisis manager is the sole consumer and nothing else pays for the
    /// copy.
    pub route: Option<Vec<Point>>,
}

/// An intersection as other agents can observe it.
#[derive(Clone, Debug)]
pub struct IntersectionObs {
    pub id: AgentId,
    pub position: Point,
    pub phase: Phase,
    /// Queue length per approach, indexed by `Direction::index()`.
    pub queue_lengths: [u32; 4],
    pub congestion_threshold: u32,
    pub neighbors: Vec<AgentId>,
}

impl IntersectionObs {
    #[inline]
    pub fn queue_total(&self) -> u32 {
        self.queue_lengths.iter().sum()
    }

    /// The approach with the longest queue.
    pub fn worst_direction(&self) -> mats_core::Direction {
        mats_core::Direction::ALL
            .into_iter()
            .max_by_key(|d| self.queue_lengths[d.index()])
            .unwrap_or(mats_core::Direction::North)
    }
}

/// Frozen observable state of every active agent at the start of a tick.
#[derive(Default)]
pub struct WorldView {
    pub vehicles: Vec<VehicleObs>,
    pub intersections: Vec<IntersectionObs>,
}

impl WorldView {
    /// Active vehicles strictly within `radius` metres of `pos`, excluding
    /// `except`.
    pub fn vehicles_near<'a>(
        &'a self,
        pos: Point,
        radius: f32,
        except: AgentId,
    ) -> impl Iterator<Item = &'a VehicleObs> {
        self.vehicles
            .iter()
            .filter(move |v| v.id != except && v.position.distance(pos) < radius)
    }
}

/// Everything an agent may touch while reasoning: the frozen view, the road
/// graph (read-only during agent phases), the router, and the run's RNG.
pub struct TickCtx<'a> {
    /// Simulated seconds at the start of this tick.
    pub now: f64,
    /// Seconds this tick spans.
    pub time_step: f32,
    pub view: &'a WorldView,
    pub graph: &'a RoadGraph,
    pub router: &'a mut DynamicRouter,
    pub rng: &'a mut SimRng,
}
