//! Beliefs: timestamped facts an agent holds about the world.
//!
//! Each agent owns at most one belief per [`BeliefKind`]; updating a kind
//! replaces the previous fact.  Beliefs decay: anything older than the
//! validity window is dropped during perception, so stale observations can
//! never drive deliberation.  Beliefs are never shared between agents —
//! information travels only through messages.

use rustc_hash::FxHashMap;

use mats_core::{AgentId, Point};

/// Seconds a belief stays valid after its timestamp.
pub const DEFAULT_VALIDITY_WINDOW: f32 = 10.0;

/// The fact categories an agent can hold.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BeliefKind {
    Position,
    TrafficState,
    Route,
    Neighbors,
    Congestion,
    Speed,
    Destination,
}

/// Local flow classification a vehicle derives from its nearby count.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TrafficState {
    Smooth,
    Dense,
    Congested,
}

/// A vehicle observed near another agent, with just enough state for
/// car-following decisions.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct NearbyVehicle {
    pub id: AgentId,
    pub position: Point,
    pub speed: f32,
}

/// Congestion knowledge, either self-assessed or received via `inform`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CongestionBelief {
    /// Normalized severity in [0, 1].
    pub level: f32,
    pub location: Option<Point>,
    /// `true` when the congestion stems from a reported incident.
    pub incident: bool,
}

/// Kind-specific belief payload.
#[derive(Clone, Debug, PartialEq)]
pub enum BeliefValue {
    Position(Point),
    TrafficState(TrafficState),
    Route(Vec<Point>),
    Neighbors(Vec<NearbyVehicle>),
    Congestion(CongestionBelief),
    Speed(f32),
    Destination(Point),
}

impl BeliefValue {
    /// The kind slot this payload occupies.
    pub fn kind(&self) -> BeliefKind {
        match self {
            BeliefValue::Position(_) => BeliefKind::Position,
            BeliefValue::TrafficState(_) => BeliefKind::TrafficState,
            BeliefValue::Route(_) => BeliefKind::Route,
            BeliefValue::Neighbors(_) => BeliefKind::Neighbors,
            BeliefValue::Congestion(_) => BeliefKind::Congestion,
            BeliefValue::Speed(_) => BeliefKind::Speed,
            BeliefValue::Destination(_) => BeliefKind::Destination,
        }
    }
}

/// Where a belief came from.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BeliefSource {
    /// The agent's own perception.
    Own,
    /// Conveyed by a message from another agent.
    Agent(AgentId),
}

/// A tagged, timestamped fact.
#[derive(Clone, Debug)]
pub struct Belief {
    pub value: BeliefValue,
    /// Certainty in [0, 1].
    pub confidence: f32,
    /// Simulated seconds at which the fact was established.
    pub timestamp: f64,
    pub source: BeliefSource,
}

impl Belief {
    /// `true` while the belief is inside the validity window.
    #[inline]
    pub fn is_valid(&self, now: f64, window: f32) -> bool {
        now - self.timestamp < window as f64
    }
}

// ── BeliefStore ───────────────────────────────────────────────────────────────

/// One agent's belief base: at most one belief per kind.
#[derive(Default)]
pub struct BeliefStore {
    map: FxHashMap<BeliefKind, Belief>,
}

impl BeliefStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the belief for the payload's kind.
    pub fn update(&mut self, value: BeliefValue, timestamp: f64, source: BeliefSource) {
        self.update_with_confidence(value, 1.0, timestamp, source);
    }

    pub fn update_with_confidence(
        &mut self,
        value: BeliefValue,
        confidence: f32,
        timestamp: f64,
        source: BeliefSource,
    ) {
        let kind = value.kind();
        self.map.insert(
            kind,
            Belief { value, confidence: confidence.clamp(0.0, 1.0), timestamp, source },
        );
    }

    pub fn get(&self, kind: BeliefKind) -> Option<&Belief> {
        self.map.get(&kind)
    }

    pub fn value(&self, kind: BeliefKind) -> Option<&BeliefValue> {
        self.map.get(&kind).map(|b| &b.value)
    }

    /// Drop every belief whose age reached the validity window.
    pub fn remove_stale(&mut self, now: f64, window: f32) {
        self.map.retain(|_, belief| belief.is_valid(now, window));
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    // ── Typed accessors for the common kinds ──────────────────────────────

    pub fn traffic_state(&self) -> Option<TrafficState> {
        match self.value(BeliefKind::TrafficState) {
            Some(BeliefValue::TrafficState(s)) => Some(*s),
            _ => None,
        }
    }

    pub fn neighbors(&self) -> Option<&[NearbyVehicle]> {
        match self.value(BeliefKind::Neighbors) {
            Some(BeliefValue::Neighbors(n)) => Some(n.as_slice()),
            _ => None,
        }
    }

    pub fn congestion(&self) -> Option<CongestionBelief> {
        match self.value(BeliefKind::Congestion) {
            Some(BeliefValue::Congestion(c)) => Some(*c),
            _ => None,
        }
    }
}
