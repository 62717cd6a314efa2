//! The vehicle agent: perception, deliberation, kinematics, rerouting.

use log::{info, warn};

use mats_acl::{Content, Message, Performative};
use mats_bdi::{
    BdiAgent, BdiState, BeliefSource, BeliefValue, CongestionBelief, Desire, DesireKind,
    Intention, IntentionKind, NearbyVehicle, RerouteReason, TickCtx, TrafficState,
};
use mats_core::{AgentId, Point, VehicleType};

/// Radius within which other vehicles count as "nearby".
const NEARBY_RADIUS: f32 = 100.0;
/// Seconds between refreshes of the nearby-vehicle cache.
const NEARBY_CACHE_INTERVAL: f64 = 10.0;
/// Seconds between congestion-driven route recomputations.
const REROUTE_COOLDOWN: f32 = 30.0;
/// A vehicle this close to its destination has arrived.
const ARRIVAL_RADIUS: f32 = 10.0;
/// A waypoint this close is considered reached.
const WAYPOINT_RADIUS: f32 = 5.0;
/// Car-following gap: decelerate behind a slower vehicle inside this range.
const FOLLOW_GAP: f32 = 20.0;
/// Inbound congestion at or above this level triggers an immediate reroute.
const IMMEDIATE_REROUTE_LEVEL: f32 = 0.7;

/// One route recomputation, kept for observability.
#[derive(Clone, Debug)]
pub struct RerouteRecord {
    pub time: f64,
    pub reason: RerouteReason,
    pub congestion_level: f32,
    /// Waypoints that remained of the old route.
    pub old_route_len: usize,
    pub new_route_len: usize,
    pub position: Point,
}

/// Final per-vehicle aggregate, emitted at harvest.
#[derive(Clone, Debug)]
pub struct VehicleStats {
    pub id: AgentId,
    pub vehicle_type: VehicleType,
    pub distance_traveled: f32,
    pub travel_time: f32,
    pub route_changes: u32,
    pub stops: u32,
    pub average_speed: f32,
    pub reached_destination: bool,
}

// ── VehicleAgent ──────────────────────────────────────────────────────────────

pub struct VehicleAgent {
    pub state: BdiState,
    pub vehicle_type: VehicleType,
    pub position: Point,
    pub origin: Point,
    pub destination: Point,
    pub speed: f32,
    pub max_speed: f32,
    pub acceleration: f32,
    pub deceleration: f32,
    pub route: Vec<Point>,
    pub waypoint_index: usize,
    pub travel_time: f32,
    pub distance_traveled: f32,
    pub route_changes: u32,
    pub stops: u32,
    pub stuck_timer: f32,
    pub reroutes: Vec<RerouteRecord>,
    stopped: bool,
    reroute_timer: f32,
    nearby_cache: Vec<NearbyVehicle>,
    nearby_cache_time: f64,
}

impl VehicleAgent {
    pub fn new(
        id: AgentId,
        now: f64,
        vehicle_type: VehicleType,
        position: Point,
        destination: Point,
        max_speed: f32,
    ) -> Self {
        let mut agent = Self {
            state: BdiState::new(id, now),
            vehicle_type,
            position,
            origin: position,
            destination,
            speed: 0.0,
            max_speed,
            acceleration: 2.0,
            deceleration: 4.0,
            route: Vec::new(),
            waypoint_index: 0,
            travel_time: 0.0,
            distance_traveled: 0.0,
            route_changes: 0,
            stops: 0,
            stuck_timer: 0.0,
            reroutes: Vec::new(),
            stopped: false,
            reroute_timer: 0.0,
            nearby_cache: Vec::new(),
            nearby_cache_time: f64::NEG_INFINITY,
        };
        agent.refresh_static_beliefs();
        agent
    }

    /// Install an initial route computed at spawn time.
    pub fn set_route(&mut self, route: Vec<Point>) {
        self.route = route;
        self.waypoint_index = 0;
        self.refresh_static_beliefs();
    }

    fn refresh_static_beliefs(&mut self) {
        let now = self.state.current_time;
        self.state
            .beliefs
            .update(BeliefValue::Position(self.position), now, BeliefSource::Own);
        self.state
            .beliefs
            .update(BeliefValue::Speed(self.speed), now, BeliefSource::Own);
        self.state
            .beliefs
            .update(BeliefValue::Destination(self.destination), now, BeliefSource::Own);
        self.state
            .beliefs
            .update(BeliefValue::Route(self.route.clone()), now, BeliefSource::Own);
    }

    #[inline]
    pub fn at_destination(&self) -> bool {
        self.position.distance(self.destination) < ARRIVAL_RADIUS
    }

    /// Remaining waypoints on the current route.
    #[inline]
    fn remaining_route_len(&self) -> usize {
        self.route.len().saturating_sub(self.waypoint_index)
    }

    fn classify_traffic(&self) -> TrafficState {
        match self.nearby_cache.len() {
            0..=5 => TrafficState::Smooth,
            6..=10 => TrafficState::Dense,
            _ => TrafficState::Congested,
        }
    }

    /// A slower vehicle inside the follow gap?
    fn vehicle_ahead(&self) -> bool {
        self.state.beliefs.neighbors().is_some_and(|nearby| {
            nearby.iter().any(|v| {
                v.position.distance(self.position) < FOLLOW_GAP && v.speed < self.speed
            })
        })
    }

    // ── Kinematics ────────────────────────────────────────────────────────

    fn move_forward(&mut self, dt: f32) -> bool {
        let Some(&target) = self.route.get(self.waypoint_index) else {
            return false;
        };

        if self.speed < self.max_speed {
            self.speed = (self.speed + self.acceleration * dt).min(self.max_speed);
        }

        let direction = self.position.unit_to(target);
        let displacement = self.speed * dt;
        let old = self.position;
        self.position = self.position.advance(direction, displacement);
        self.distance_traveled += old.distance(self.position);

        if self.position.distance(target) < WAYPOINT_RADIUS {
            self.waypoint_index += 1;
        }
        true
    }

    fn accelerate(&mut self, target_speed: f32, dt: f32) -> bool {
        self.speed = (self.speed + self.acceleration * dt).min(target_speed.min(self.max_speed));
        true
    }

    fn decelerate(&mut self, target_speed: f32, dt: f32) -> bool {
        self.speed = (self.speed - self.deceleration * dt).max(target_speed.max(0.0));
        true
    }

    fn stop(&mut self) -> bool {
        self.speed = 0.0;
        self.stopped = true;
        self.stops += 1;
        true
    }

    // ── Rerouting ─────────────────────────────────────────────────────────

    fn recalculate_route(&mut self, ctx: &mut TickCtx<'_>, reason: RerouteReason) -> bool {
        let congestion_level = self
            .state
            .beliefs
            .congestion()
            .map(|c| c.level)
            .unwrap_or(0.0);
        let old_route_len = self.remaining_route_len();

        match ctx
            .router
            .find_path(ctx.graph, self.position, self.destination, true)
        {
            Some(new_route) => {
                let record = RerouteRecord {
                    time: self.state.current_time,
                    reason,
                    congestion_level,
                    old_route_len,
                    new_route_len: new_route.len(),
                    position: self.position,
                };
                info!(
                    "vehicle {} ({}) rerouted: reason={} congestion={:.2} {}→{} waypoints at {}",
                    self.state.id,
                    self.vehicle_type,
                    reason.as_str(),
                    congestion_level,
                    record.old_route_len,
                    record.new_route_len,
                    self.position,
                );
                self.route = new_route;
                self.waypoint_index = 0;
                self.route_changes += 1;
                self.reroutes.push(record);
                let now = self.state.current_time;
                self.state
                    .beliefs
                    .update(BeliefValue::Route(self.route.clone()), now, BeliefSource::Own);
                true
            }
            None => {
                warn!(
                    "vehicle {} reroute failed ({}): no path {} → {}",
                    self.state.id,
                    reason.as_str(),
                    self.position,
                    self.destination,
                );
                false
            }
        }
    }

    /// Inform-driven reroute: bypasses the cooldown entirely.
    fn immediate_reroute(&mut self, ctx: &mut TickCtx<'_>, reason: RerouteReason) {
        if self.state.active && !self.route.is_empty() {
            self.recalculate_route(ctx, reason);
        } else {
            // No route yet: let the next deliberation pick it up at once.
            self.reroute_timer = REROUTE_COOLDOWN;
        }
    }

    pub fn statistics(&self) -> VehicleStats {
        VehicleStats {
            id: self.state.id,
            vehicle_type: self.vehicle_type,
            distance_traveled: self.distance_traveled,
            travel_time: self.travel_time,
            route_changes: self.route_changes,
            stops: self.stops,
            average_speed: self.distance_traveled / self.travel_time.max(1.0),
            reached_destination: self.at_destination(),
        }
    }
}

// ── BdiAgent impl ─────────────────────────────────────────────────────────────

impl BdiAgent for VehicleAgent {
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
        // Timers tick first so cooldowns measure whole cycles.
        self.travel_time += ctx.time_step;
        self.reroute_timer += ctx.time_step;
        if self.speed < 0.1 && !self.stopped {
            self.stuck_timer += ctx.time_step;
        } else {
            self.stuck_timer = 0.0;
        }

        self.refresh_static_beliefs();

        // The radius query is the expensive part of perception; refresh at
        // most once per cache interval.
        if ctx.now - self.nearby_cache_time >= NEARBY_CACHE_INTERVAL {
            self.nearby_cache = ctx
                .view
                .vehicles_near(self.position, NEARBY_RADIUS, self.state.id)
                .map(|v| NearbyVehicle { id: v.id, position: v.position, speed: v.speed })
                .collect();
            self.nearby_cache_time = ctx.now;
        }

        let now = self.state.current_time;
        self.state.beliefs.update(
            BeliefValue::Neighbors(self.nearby_cache.clone()),
            now,
            BeliefSource::Own,
        );
        let traffic = self.classify_traffic();
        self.state
            .beliefs
            .update(BeliefValue::TrafficState(traffic), now, BeliefSource::Own);
    }

    fn generate_desires(&mut self) {
        self.state.desires.clear();

        if !self.at_destination() {
            self.state
                .desires
                .add(Desire::new(DesireKind::ReachDestination, 1.0));
        }
        self.state
            .desires
            .add(Desire::new(DesireKind::MinimizeTravelTime, 0.8));

        if matches!(
            self.state.beliefs.traffic_state(),
            Some(TrafficState::Dense | TrafficState::Congested)
        ) {
            self.state
                .desires
                .add(Desire::new(DesireKind::AvoidCongestion, 0.7));
        }
    }

    fn deliberate(&mut self, _ctx: &mut TickCtx<'_>) -> Vec<Intention> {
        // No route yet: everything else waits on one.
        if self.route.is_empty() && !self.at_destination() {
            return vec![Intention::from_desire(
                IntentionKind::ChangeRoute { reason: RerouteReason::PeriodicCheck },
                1.0,
                DesireKind::ReachDestination,
            )];
        }

        // Arrived: stop and leave the simulation.
        if self.at_destination() {
            self.state.active = false;
            return vec![Intention::from_desire(
                IntentionKind::Stop,
                1.0,
                DesireKind::ReachDestination,
            )];
        }

        let mut intentions = Vec::new();

        // Congestion-driven reroute, gated on the cooldown.
        if self.state.beliefs.traffic_state() == Some(TrafficState::Congested)
            && self.reroute_timer >= REROUTE_COOLDOWN
        {
            intentions.push(Intention::from_desire(
                IntentionKind::ChangeRoute { reason: RerouteReason::HighCongestion },
                0.7,
                DesireKind::AvoidCongestion,
            ));
            self.reroute_timer = 0.0;
        }

        if self.vehicle_ahead() {
            intentions.push(Intention::new(
                IntentionKind::Decelerate { target_speed: self.speed * 0.5 },
                0.9,
            ));
        } else {
            intentions.push(Intention::from_desire(
                IntentionKind::MoveForward,
                0.8,
                DesireKind::ReachDestination,
            ));
        }

        intentions
    }

    fn execute(&mut self, intention: &Intention, ctx: &mut TickCtx<'_>) -> bool {
        match &intention.kind {
            IntentionKind::MoveForward => self.move_forward(ctx.time_step),
            IntentionKind::ChangeRoute { reason } => self.recalculate_route(ctx, *reason),
            IntentionKind::Stop => self.stop(),
            IntentionKind::Accelerate { target_speed } => {
                self.accelerate(*target_speed, ctx.time_step)
            }
            IntentionKind::Decelerate { target_speed } => {
                self.decelerate(*target_speed, ctx.time_step)
            }
            _ => false,
        }
    }

    fn handle_message(&mut self, message: Message, ctx: &mut TickCtx<'_>) {
        if message.performative != Performative::Inform {
            self.state.unhandled_messages += 1;
            return;
        }
        match message.content {
            Content::Congestion { level, location } => {
                let now = self.state.current_time;
                self.state.beliefs.update(
                    BeliefValue::Congestion(CongestionBelief {
                        level,
                        location: Some(location),
                        incident: false,
                    }),
                    now,
                    BeliefSource::Agent(message.sender),
                );
                if level >= IMMEDIATE_REROUTE_LEVEL {
                    self.immediate_reroute(ctx, RerouteReason::CongestionAlert);
                }
            }
            Content::IncidentReport { location, .. } => {
                let now = self.state.current_time;
                self.state.beliefs.update(
                    BeliefValue::Congestion(CongestionBelief {
                        level: 1.0,
                        location: Some(location),
                        incident: true,
                    }),
                    now,
                    BeliefSource::Agent(message.sender),
                );
                self.immediate_reroute(ctx, RerouteReason::IncidentAlert);
            }
            _ => self.state.unhandled_messages += 1,
        }
    }
}
