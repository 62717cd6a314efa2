//! The crisis manager: emergency prioritization and Contract-Net delegation.
//!
//! A single logical agent positioned at the map centre.  Each tick it scans
//! the world view for priority vehicles and congested intersections, then:
//!
//! - dispatches `request/emergency_priority` to every intersection within
//!   300 m of an emergency vehicle's planned route (a **green wave**), and
//! - runs the Contract-Net manager role for congested intersections: CFP to
//!   the congested node's neighbors, collect `propose` bids, award the
//!   highest availability, reject the rest.

use log::debug;

use rustc_hash::FxHashMap;

use mats_acl::{Content, Message, Performative, Protocol, Recipient, Severity};
use mats_bdi::{
    BdiAgent, BdiState, BeliefSource, BeliefValue, CongestedIntersection, CongestionBelief,
    Desire, DesireKind, Intention, IntentionKind, TickCtx,
};
use mats_core::{AgentId, ConversationId, Direction, Point, VehicleType};

/// Intersections within this distance of a route get priority requests.
const GREEN_WAVE_RADIUS: f32 = 300.0;
/// Bids collected before a CNP conversation is arbitrated.
const MIN_PROPOSALS: usize = 2;

/// Global congestion classification from the average queue length.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum CongestionClass {
    Low,
    Medium,
    Strong,
    Critical,
}

impl CongestionClass {
    fn from_average_queue(avg: f32) -> Self {
        if avg > 15.0 {
            CongestionClass::Critical
        } else if avg > 8.0 {
            CongestionClass::Strong
        } else if avg > 4.0 {
            CongestionClass::Medium
        } else {
            CongestionClass::Low
        }
    }

    fn as_level(self) -> f32 {
        match self {
            CongestionClass::Low => 0.2,
            CongestionClass::Medium => 0.5,
            CongestionClass::Strong => 0.8,
            CongestionClass::Critical => 1.0,
        }
    }
}

/// A priority vehicle observed this tick.
#[derive(Clone, Debug)]
struct EmergencySighting {
    id: AgentId,
    vehicle_type: VehicleType,
    position: Point,
    route: Vec<Point>,
}

/// A dispatched green wave, for the record.
#[derive(Clone, Debug)]
pub struct GreenWaveRecord {
    pub vehicle: AgentId,
    pub vehicle_type: VehicleType,
    pub intersections_notified: u32,
    pub time: f64,
}

/// An incident reported to the manager.
#[derive(Clone, Debug)]
pub struct IncidentRecord {
    pub location: Point,
    pub severity: Severity,
    pub road: String,
    pub reported_by: AgentId,
    pub time: f64,
}

/// A received CNP bid.
#[derive(Clone, Debug)]
struct CnpBid {
    sender: AgentId,
    availability: f32,
}

#[derive(Clone, Debug, Default)]
pub struct CrisisStats {
    pub interventions: u64,
    pub green_waves_created: u64,
    pub active_incidents: usize,
    pub active_emergency_vehicles: usize,
}

// ── CrisisManagerAgent ────────────────────────────────────────────────────────

pub struct CrisisManagerAgent {
    pub state: BdiState,
    pub position: Point,
    pub active_green_waves: Vec<GreenWaveRecord>,
    pub active_incidents: Vec<IncidentRecord>,
    pub interventions: u64,
    pub green_waves_created: u64,

    emergency_vehicles: Vec<EmergencySighting>,
    congested: Vec<CongestedIntersection>,
    congestion_class: CongestionClass,
    /// Collected bids per open CNP conversation.
    cnp_proposals: FxHashMap<ConversationId, Vec<CnpBid>>,
    /// Direction promised per conversation, captured when the CFP went out.
    cnp_directions: FxHashMap<ConversationId, Direction>,
    conversation_seq: u32,
}

impl CrisisManagerAgent {
    pub fn new(id: AgentId, now: f64, position: Point) -> Self {
        Self {
            state: BdiState::new(id, now),
            position,
            active_green_waves: Vec::new(),
            active_incidents: Vec::new(),
            interventions: 0,
            green_waves_created: 0,
            emergency_vehicles: Vec::new(),
            congested: Vec::new(),
            congestion_class: CongestionClass::Low,
            cnp_proposals: FxHashMap::default(),
            cnp_directions: FxHashMap::default(),
            conversation_seq: 0,
        }
    }

    #[inline]
    pub fn congestion_class(&self) -> CongestionClass {
        self.congestion_class
    }

    #[inline]
    pub fn emergency_vehicle_count(&self) -> usize {
        self.emergency_vehicles.len()
    }

    fn next_conversation(&mut self) -> ConversationId {
        let conversation = ConversationId::compose(self.state.id, self.conversation_seq);
        self.conversation_seq += 1;
        conversation
    }

    // ── Execution bodies ──────────────────────────────────────────────────

    fn create_green_wave(
        &mut self,
        ctx: &TickCtx<'_>,
        vehicle: AgentId,
        vehicle_type: VehicleType,
        position: Point,
        route: &[Point],
    ) -> bool {
        let mut notified = 0u32;
        for intersection in &ctx.view.intersections {
            let min_distance = if route.is_empty() {
                intersection.position.distance(position)
            } else {
                route
                    .iter()
                    .map(|wp| intersection.position.distance(*wp))
                    .fold(f32::INFINITY, f32::min)
            };
            if min_distance < GREEN_WAVE_RADIUS {
                let msg = self
                    .state
                    .draft(
                        Recipient::Agent(intersection.id),
                        Performative::Request,
                        Content::EmergencyPriority { vehicle, vehicle_type, position },
                    )
                    .with_protocol(Protocol::EmergencyManagement);
                self.state.post(msg);
                notified += 1;
            }
        }

        if notified == 0 {
            return false;
        }
        self.green_waves_created += 1;
        self.interventions += 1;
        self.active_green_waves.push(GreenWaveRecord {
            vehicle,
            vehicle_type,
            intersections_notified: notified,
            time: self.state.current_time,
        });
        true
    }

    fn delegate_priority(&mut self, ctx: &TickCtx<'_>, congested: &[CongestedIntersection]) -> bool {
        for target in congested {
            let Some(obs) = ctx.view.intersections.iter().find(|i| i.id == target.id) else {
                continue;
            };
            let conversation = self.next_conversation();
            self.cnp_directions.insert(conversation, target.worst_direction);

            for &neighbor in &obs.neighbors {
                let cfp = self
                    .state
                    .draft(
                        Recipient::Agent(neighbor),
                        Performative::Request,
                        Content::CallForProposals {
                            congested_intersection: target.id,
                            congestion_level: target.queue_total as f32,
                            direction: target.worst_direction,
                        },
                    )
                    .with_protocol(Protocol::FipaContractNet)
                    .with_conversation(conversation);
                self.state.post(cfp);
            }
            self.interventions += 1;
        }
        true
    }

    // ── CNP manager role ──────────────────────────────────────────────────

    fn evaluate_proposal(&mut self, message: &Message, availability: f32) {
        let Some(conversation) = message.conversation_id else {
            self.state.unhandled_messages += 1;
            return;
        };

        self.cnp_proposals
            .entry(conversation)
            .or_default()
            .push(CnpBid { sender: message.sender, availability });

        let bids = &self.cnp_proposals[&conversation];
        if bids.len() < MIN_PROPOSALS {
            return;
        }

        // Arbitrate: exactly one award to the highest availability, a
        // rejection to every other bidder, then forget the conversation.
        let bids = self.cnp_proposals.remove(&conversation).unwrap_or_default();
        let direction = self
            .cnp_directions
            .remove(&conversation)
            .unwrap_or(Direction::North);

        // Lower ids win ties for determinism.
        let Some(best) = bids
            .iter()
            .max_by(|a, b| {
                a.availability
                    .total_cmp(&b.availability)
                    .then(b.sender.cmp(&a.sender))
            })
            .map(|b| b.sender)
        else {
            return;
        };

        debug!(
            "cnp {:?}: awarding {} among {} bids (direction {})",
            conversation,
            best,
            bids.len(),
            direction,
        );

        for bid in &bids {
            let msg = if bid.sender == best {
                self.state
                    .draft(
                        Recipient::Agent(bid.sender),
                        Performative::AcceptProposal,
                        Content::Award { direction },
                    )
                    .with_conversation(conversation)
            } else {
                self.state
                    .draft(Recipient::Agent(bid.sender), Performative::RejectProposal, Content::Opaque)
                    .with_conversation(conversation)
            };
            self.state.post(msg);
        }
    }

    pub fn statistics(&self) -> CrisisStats {
        CrisisStats {
            interventions: self.interventions,
            green_waves_created: self.green_waves_created,
            active_incidents: self.active_incidents.len(),
            active_emergency_vehicles: self.emergency_vehicles.len(),
        }
    }
}

// ── BdiAgent impl ─────────────────────────────────────────────────────────────

impl BdiAgent for CrisisManagerAgent {
    fn state(&self) -> &BdiState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut BdiState {
        &mut self.state
    }

    fn position(&self) -> Point {
        self.position
    }

    fn perceive(&mut self, ctx: &mut TickCtx<'_>) {
        // Emergency fleet scan.
        self.emergency_vehicles = ctx
            .view
            .vehicles
            .iter()
            .filter(|v| v.vehicle_type.is_priority())
            .map(|v| EmergencySighting {
                id: v.id,
                vehicle_type: v.vehicle_type,
                position: v.position,
                route: v.route.clone().unwrap_or_default(),
            })
            .collect();

        // Global congestion index.
        let intersections = &ctx.view.intersections;
        let total_queue: u32 = intersections.iter().map(|i| i.queue_total()).sum();
        let avg_queue = total_queue as f32 / intersections.len().max(1) as f32;
        self.congestion_class = CongestionClass::from_average_queue(avg_queue);

        self.congested = intersections
            .iter()
            .filter(|i| i.queue_total() > i.congestion_threshold * 4)
            .map(|i| CongestedIntersection {
                id: i.id,
                position: i.position,
                queue_total: i.queue_total(),
                worst_direction: i.worst_direction(),
            })
            .collect();

        let now = self.state.current_time;
        self.state.beliefs.update(
            BeliefValue::Congestion(CongestionBelief {
                level: self.congestion_class.as_level(),
                location: None,
                incident: false,
            }),
            now,
            BeliefSource::Own,
        );
    }

    fn generate_desires(&mut self) {
        self.state.desires.clear();

        if !self.emergency_vehicles.is_empty() {
            self.state.desires.add(
                Desire::new(DesireKind::PrioritizeEmergency, 1.0)
                    .with_conditions(self.emergency_vehicles.len() as f32),
            );
        }
        if self.congestion_class >= CongestionClass::Strong {
            self.state.desires.add(Desire::new(DesireKind::Coordinate, 0.8));
        }
        self.state.desires.add(Desire::new(DesireKind::OptimizeFlow, 0.5));
    }

    fn deliberate(&mut self, _ctx: &mut TickCtx<'_>) -> Vec<Intention> {
        let mut intentions = Vec::new();

        for sighting in &self.emergency_vehicles {
            intentions.push(Intention::from_desire(
                IntentionKind::CreateGreenWave {
                    vehicle: sighting.id,
                    vehicle_type: sighting.vehicle_type,
                    position: sighting.position,
                    route: sighting.route.clone(),
                },
                1.0,
                DesireKind::PrioritizeEmergency,
            ));
        }

        if !self.congested.is_empty() {
            intentions.push(Intention::from_desire(
                IntentionKind::DelegatePriority { congested: self.congested.clone() },
                0.8,
                DesireKind::Coordinate,
            ));
        }

        intentions
    }

    fn execute(&mut self, intention: &Intention, ctx: &mut TickCtx<'_>) -> bool {
        match &intention.kind {
            IntentionKind::CreateGreenWave { vehicle, vehicle_type, position, route } => {
                self.create_green_wave(ctx, *vehicle, *vehicle_type, *position, route)
            }
            IntentionKind::DelegatePriority { congested } => {
                let congested = congested.clone();
                self.delegate_priority(ctx, &congested)
            }
            _ => false,
        }
    }

    fn handle_message(&mut self, message: Message, _ctx: &mut TickCtx<'_>) {
        match (message.performative, &message.content) {
            (Performative::Propose, Content::Proposal { availability, .. }) => {
                let availability = *availability;
                self.evaluate_proposal(&message, availability);
            }

            (Performative::Inform, Content::IncidentReport { location, severity, road }) => {
                self.active_incidents.push(IncidentRecord {
                    location: *location,
                    severity: *severity,
                    road: road.clone(),
                    reported_by: message.sender,
                    time: self.state.current_time,
                });
            }

            (Performative::Inform, Content::EmergencyAck { .. }) => {
                // Pre-emption confirmed; nothing further to do.
            }

            _ => self.state.unhandled_messages += 1,
        }
    }
}
