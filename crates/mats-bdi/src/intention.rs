//! Intentions: committed plans with a within-tick lifecycle.
//!
//! Parameters ride inside the kind variants, so every intention is fully
//! self-describing and handlers match on one tag.

use mats_core::{AgentId, Direction, Point, VehicleType};

use crate::desire::DesireKind;

/// Why a vehicle requested a new route.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RerouteReason {
    /// No route yet, or routine cooldown-gated recomputation.
    PeriodicCheck,
    /// Self-assessed congested traffic state.
    HighCongestion,
    /// An inbound congestion `inform` crossed the immediate threshold.
    CongestionAlert,
    /// An inbound incident report.
    IncidentAlert,
}

impl RerouteReason {
    pub fn as_str(self) -> &'static str {
        match self {
            RerouteReason::PeriodicCheck => "periodic_check",
            RerouteReason::HighCongestion => "high_congestion",
            RerouteReason::CongestionAlert => "congestion_alert",
            RerouteReason::IncidentAlert => "incident_alert",
        }
    }
}

/// A congested intersection the crisis manager delegates around.
#[derive(Clone, Debug)]
pub struct CongestedIntersection {
    pub id: AgentId,
    pub position: Point,
    pub queue_total: u32,
    pub worst_direction: Direction,
}

/// The committed plans an agent can form, with their parameters.
#[derive(Clone, Debug)]
pub enum IntentionKind {
    // ── Vehicle ───────────────────────────────────────────────────────────
    MoveForward,
    ChangeRoute { reason: RerouteReason },
    Stop,
    Accelerate { target_speed: f32 },
    Decelerate { target_speed: f32 },

    // ── Intersection ──────────────────────────────────────────────────────
    ChangeLightTiming,
    BroadcastCongestion { level: f32, location: Point },
    /// Share a neighbor-state snapshot with adjacent intersections.
    NegotiateWithNeighbor,

    // ── Crisis manager ────────────────────────────────────────────────────
    CreateGreenWave {
        vehicle: AgentId,
        vehicle_type: VehicleType,
        position: Point,
        route: Vec<Point>,
    },
    DelegatePriority { congested: Vec<CongestedIntersection> },
}

impl IntentionKind {
    /// Stable label for action-history records and logs.
    pub fn label(&self) -> &'static str {
        match self {
            IntentionKind::MoveForward => "move_forward",
            IntentionKind::ChangeRoute { .. } => "change_route",
            IntentionKind::Stop => "stop",
            IntentionKind::Accelerate { .. } => "accelerate",
            IntentionKind::Decelerate { .. } => "decelerate",
            IntentionKind::ChangeLightTiming => "change_light_timing",
            IntentionKind::BroadcastCongestion { .. } => "broadcast_congestion",
            IntentionKind::NegotiateWithNeighbor => "negotiate_with_neighbor",
            IntentionKind::CreateGreenWave { .. } => "create_green_wave",
            IntentionKind::DelegatePriority { .. } => "delegate_priority",
        }
    }
}

/// Lifecycle: created pending, driven to a terminal state within the same
/// tick, purged at tick end.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum IntentionStatus {
    Pending,
    Executing,
    Completed,
    Failed,
}

/// A plan the agent has committed to.
#[derive(Clone, Debug)]
pub struct Intention {
    pub kind: IntentionKind,
    pub priority: f32,
    pub status: IntentionStatus,
    pub parent_desire: Option<DesireKind>,
}

impl Intention {
    pub fn new(kind: IntentionKind, priority: f32) -> Self {
        Self { kind, priority, status: IntentionStatus::Pending, parent_desire: None }
    }

    pub fn from_desire(kind: IntentionKind, priority: f32, parent: DesireKind) -> Self {
        Self { kind, priority, status: IntentionStatus::Pending, parent_desire: Some(parent) }
    }

    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self.status, IntentionStatus::Completed | IntentionStatus::Failed)
    }
}
