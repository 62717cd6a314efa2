//! The intersection agent: signal state machine, phase selection policies,
//! neighbor coordination, and priority handling.
//!
//! # Phase model
//!
//! Lights are two-state (red/green).  Exactly one of the two phase groups —
//! {North, South} or {East, West} — is green at any time; the opposing group
//! is red.  Every transition zeroes both groups' timers.
//!
//! # Phase selection
//!
//! Two interchangeable policies, picked by configuration:
//!
//! - **Max-Pressure** (Varaiya 2013): switch to the phase with the larger
//!   upstream-minus-downstream queue differential once the gap crosses a
//!   threshold.
//! - **Q-Learning**: tabular ε-greedy over a discretized
//!   (ns_queue, ew_queue, phase) state with the standard Bellman update.
//!
//! Both respect the same minimum-green floor; a hard maximum green forces a
//! change regardless of policy.

use rustc_hash::FxHashMap;

use mats_acl::{Content, Message, Performative, Protocol, Recipient};
use mats_bdi::{
    BdiAgent, BdiState, BeliefSource, BeliefValue, CongestionBelief, Desire, DesireKind,
    Intention, IntentionKind, TickCtx,
};
use mats_core::{AgentId, Direction, Phase, Point, SimRng, config::SignalAlgorithm};

/// Vehicles inside this radius are assigned to an approach queue.
const DETECTION_RADIUS: f32 = 50.0;
/// Neighbor snapshots older than this are ignored and purged.
const NEIGHBOR_STALE_AFTER: f64 = 30.0;
/// Seconds between neighbor-state broadcasts.
const NEIGHBOR_SYNC_INTERVAL: f64 = 10.0;
/// Pressure gap that justifies an off-schedule phase change.
const PRESSURE_THRESHOLD: f32 = 5.0;
/// Assumed urban progression speed for arrival estimation, m/s (~30 km/h).
const AVG_APPROACH_SPEED: f32 = 8.33;
/// Minimum predicted inbound flow worth coordinating for.
const MIN_COORDINATION_FLOW: f32 = 2.0;
/// Saturation flow per lane, vehicles/hour.
const SATURATION_FLOW: f32 = 1_800.0;
/// CNP: bid only when availability clears this floor.
const MIN_BID_AVAILABILITY: f32 = 0.3;

/// Signal timing floors and ceilings, seconds.
#[derive(Clone, Copy, Debug)]
pub struct SignalTiming {
    pub min_green: f32,
    pub max_green: f32,
    pub default_green: f32,
}

impl Default for SignalTiming {
    fn default() -> Self {
        Self { min_green: 15.0, max_green: 90.0, default_green: 30.0 }
    }
}

/// A signal head's state.  Yellow is not modeled; transitions are immediate.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LightState {
    Red,
    Green,
}

/// A neighbor's last reported state, plus when we received it.
#[derive(Clone, Debug)]
pub struct NeighborState {
    pub phase: Phase,
    pub phase_timer_remaining: f32,
    pub queue_lengths: [u32; 4],
    pub outflow_estimate: f32,
    pub position: Point,
    pub timestamp: f64,
    received_at: f64,
}

/// Green-wave coordination state.
#[derive(Clone, Debug, Default)]
struct GreenWave {
    /// While set, `should_change_phase` holds the forced phase.
    active: bool,
    /// Remaining seconds of the forced hold.
    timer: f32,
    /// Phase to adopt at the next natural change (or that is being held).
    target_phase: Option<Phase>,
    /// Seconds until the anticipated platoon arrives.
    offset: f32,
}

// ── Q-learning ────────────────────────────────────────────────────────────────

/// Discretized state: queues bucketed by 3, capped at 5, plus current phase.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
struct QState {
    ns: u8,
    ew: u8,
    phase: Phase,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum QAction {
    Change,
    Keep,
}

impl QAction {
    #[inline]
    fn index(self) -> usize {
        match self {
            QAction::Change => 0,
            QAction::Keep => 1,
        }
    }
}

/// Tabular Q-learning with decaying ε-greedy exploration.
struct QLearning {
    table: FxHashMap<QState, [f32; 2]>,
    alpha: f32,
    gamma: f32,
    epsilon: f32,
    epsilon_decay: f32,
    epsilon_min: f32,
    previous: Option<(QState, QAction)>,
    previous_total_waiting: f32,
}

impl QLearning {
    fn new() -> Self {
        Self {
            table: FxHashMap::default(),
            alpha: 0.1,
            gamma: 0.9,
            epsilon: 0.1,
            epsilon_decay: 0.995,
            epsilon_min: 0.01,
            previous: None,
            previous_total_waiting: 0.0,
        }
    }

    fn q_values(&mut self, state: QState) -> [f32; 2] {
        *self.table.entry(state).or_insert([0.0, 0.0])
    }

    /// Standard Bellman update:
    /// `Q(s,a) ← Q(s,a) + α · (r + γ · max_a' Q(s',a') − Q(s,a))`.
    fn update(&mut self, state: QState, action: QAction, reward: f32, next: QState) {
        let max_next = self.q_values(next).into_iter().fold(f32::MIN, f32::max);
        let entry = self.table.entry(state).or_insert([0.0, 0.0]);
        let current = entry[action.index()];
        entry[action.index()] = current + self.alpha * (reward + self.gamma * max_next - current);
    }

    /// ε-greedy action selection; decays ε per decision.
    fn select(&mut self, state: QState, rng: &mut SimRng) -> QAction {
        let action = if (rng.unit() as f64) < self.epsilon as f64 {
            if rng.gen_bool(0.5) { QAction::Change } else { QAction::Keep }
        } else {
            let q = self.q_values(state);
            if q[QAction::Change.index()] > q[QAction::Keep.index()] {
                QAction::Change
            } else {
                QAction::Keep
            }
        };
        self.epsilon = (self.epsilon * self.epsilon_decay).max(self.epsilon_min);
        action
    }
}

// ── Statistics ────────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct IntersectionStats {
    pub id: AgentId,
    pub total_vehicles_processed: u64,
    pub avg_waiting_time: f32,
    pub phase_changes: u64,
    pub coordination_messages: u64,
    pub green_wave_active: bool,
}

// ── IntersectionAgent ─────────────────────────────────────────────────────────

pub struct IntersectionAgent {
    pub state: BdiState,
    pub position: Point,
    pub timing: SignalTiming,
    pub congestion_threshold: u32,
    pub neighbors: Vec<AgentId>,

    lights: [LightState; 4],
    light_timers: [f32; 4],
    green_durations: [f32; 4],
    queue_lengths: [u32; 4],
    prev_queue_lengths: [u32; 4],
    queues: [Vec<AgentId>; 4],
    neighbor_states: FxHashMap<AgentId, NeighborState>,
    green_wave: GreenWave,
    policy: SignalAlgorithm,
    q: QLearning,
    last_sync_time: f64,

    pub total_vehicles_processed: u64,
    pub phase_changes: u64,
    pub coordination_messages: u64,
    waiting_vehicle_seconds: f64,
}

impl IntersectionAgent {
    pub fn new(id: AgentId, now: f64, position: Point, policy: SignalAlgorithm) -> Self {
        let timing = SignalTiming::default();
        // NS starts green, EW red.
        let mut lights = [LightState::Red; 4];
        for d in Phase::NS.directions() {
            lights[d.index()] = LightState::Green;
        }
        Self {
            state: BdiState::new(id, now),
            position,
            timing,
            congestion_threshold: 10,
            neighbors: Vec::new(),
            lights,
            light_timers: [0.0; 4],
            green_durations: [timing.default_green; 4],
            queue_lengths: [0; 4],
            prev_queue_lengths: [0; 4],
            queues: Default::default(),
            neighbor_states: FxHashMap::default(),
            green_wave: GreenWave::default(),
            policy,
            q: QLearning::new(),
            last_sync_time: f64::NEG_INFINITY,
            total_vehicles_processed: 0,
            phase_changes: 0,
            coordination_messages: 0,
            waiting_vehicle_seconds: 0.0,
        }
    }

    pub fn add_neighbor(&mut self, neighbor: AgentId) {
        if neighbor != self.state.id && !self.neighbors.contains(&neighbor) {
            self.neighbors.push(neighbor);
        }
    }

    // ── State inspection ──────────────────────────────────────────────────

    #[inline]
    pub fn light(&self, direction: Direction) -> LightState {
        self.lights[direction.index()]
    }

    /// The phase group currently holding green.
    #[inline]
    pub fn current_phase(&self) -> Phase {
        if self.lights[Direction::North.index()] == LightState::Green {
            Phase::NS
        } else {
            Phase::EW
        }
    }

    #[inline]
    pub fn queue_length(&self, direction: Direction) -> u32 {
        self.queue_lengths[direction.index()]
    }

    #[inline]
    pub fn queue_lengths(&self) -> [u32; 4] {
        self.queue_lengths
    }

    #[inline]
    pub fn green_wave_active(&self) -> bool {
        self.green_wave.active
    }

    /// Phase target stored for the next natural change, if any.
    #[inline]
    pub fn green_wave_target(&self) -> Option<Phase> {
        self.green_wave.target_phase
    }

    /// Longest-running green timer.
    fn current_green_timer(&self) -> f32 {
        self.current_phase()
            .directions()
            .into_iter()
            .map(|d| self.light_timers[d.index()])
            .fold(0.0, f32::max)
    }

    /// Seconds remaining of the current green's planned duration.
    fn phase_timer_remaining(&self) -> f32 {
        let d = self.current_phase().directions()[0];
        (self.green_durations[d.index()] - self.light_timers[d.index()]).max(0.0)
    }

    /// Test/inspection hook: force queue contents (virtual detection).
    pub fn inject_queue(&mut self, direction: Direction, count: u32) {
        self.queue_lengths[direction.index()] = count;
    }

    // ── Perception helpers ────────────────────────────────────────────────

    fn count_vehicles(&mut self, ctx: &TickCtx<'_>) {
        self.prev_queue_lengths = self.queue_lengths;
        self.queue_lengths = [0; 4];
        for q in &mut self.queues {
            q.clear();
        }
        for v in ctx
            .view
            .vehicles_near(self.position, DETECTION_RADIUS, self.state.id)
        {
            let dir = self.position.approach_direction(v.position);
            self.queue_lengths[dir.index()] += 1;
            self.queues[dir.index()].push(v.id);
        }

        // Throughput: vehicles released from a green approach since the last
        // perceive.
        for d in self.current_phase().directions() {
            let (prev, cur) = (self.prev_queue_lengths[d.index()], self.queue_lengths[d.index()]);
            self.total_vehicles_processed += prev.saturating_sub(cur) as u64;
        }
    }

    fn congestion_level(&self) -> f32 {
        let max_queue = *self.queue_lengths.iter().max().unwrap_or(&0);
        let strong = (self.congestion_threshold as f32 * 1.5) as u32;
        if max_queue > strong {
            0.8
        } else if max_queue > self.congestion_threshold {
            0.5
        } else {
            0.2
        }
    }

    // ── Phase selection ───────────────────────────────────────────────────

    fn should_change_phase(&mut self, rng: &mut SimRng, dt: f32) -> bool {
        // An active green wave pins the phase until its hold expires.
        if self.green_wave.active {
            self.green_wave.timer -= dt;
            if self.green_wave.timer > 0.0 {
                return false;
            }
            self.green_wave.active = false;
        }

        // Hard ceiling: no green outlives max_green, whatever the policy says.
        if self.current_green_timer() > self.timing.max_green {
            return true;
        }

        match self.policy {
            SignalAlgorithm::MaxPressure => self.max_pressure_decision(),
            SignalAlgorithm::QLearning => self.q_learning_decision(rng),
        }
    }

    /// Downstream queue estimate for Max-Pressure.  Uses the freshest view of
    /// the lowest-id neighbor when available; otherwise a fixed prior keyed
    /// on the light state.
    fn downstream_estimate(&self, direction: Direction) -> f32 {
        let mut fresh: Vec<(&AgentId, &NeighborState)> = self
            .neighbor_states
            .iter()
            .filter(|(_, s)| self.state.current_time - s.received_at <= NEIGHBOR_STALE_AFTER)
            .collect();
        fresh.sort_by_key(|(id, _)| **id);

        if let Some((_, snapshot)) = fresh.first() {
            let avg =
                snapshot.queue_lengths.iter().sum::<u32>() as f32 / snapshot.queue_lengths.len() as f32;
            return avg.min(10.0);
        }

        if self.lights[direction.index()] == LightState::Green {
            2.0
        } else {
            5.0
        }
    }

    fn pressure(&self, phase: Phase) -> f32 {
        phase
            .directions()
            .into_iter()
            .map(|d| self.queue_lengths[d.index()] as f32 - self.downstream_estimate(d))
            .sum()
    }

    fn max_pressure_decision(&self) -> bool {
        let green_timer = self.current_green_timer();
        if green_timer < self.timing.min_green {
            return false;
        }

        let current = self.current_phase();
        let current_pressure = self.pressure(current);
        let alternative_pressure = self.pressure(current.other());

        if alternative_pressure - current_pressure > PRESSURE_THRESHOLD {
            return true;
        }
        // Scheduled green exhausted with nothing much waiting: move on.
        let planned = self.green_durations[current.directions()[0].index()];
        green_timer > planned && current_pressure < 2.0
    }

    fn q_learning_decision(&mut self, rng: &mut SimRng) -> bool {
        if self.current_green_timer() < self.timing.min_green {
            return false;
        }

        let state = self.q_state();
        if let Some((prev_state, prev_action)) = self.q.previous {
            let reward = self.q_reward();
            self.q.update(prev_state, prev_action, reward, state);
        }

        let action = self.q.select(state, rng);
        self.q.previous = Some((state, action));
        self.q.previous_total_waiting = self.queue_lengths.iter().sum::<u32>() as f32;

        action == QAction::Change
    }

    fn q_state(&self) -> QState {
        let ns: u32 = Phase::NS
            .directions()
            .into_iter()
            .map(|d| self.queue_lengths[d.index()])
            .sum();
        let ew: u32 = Phase::EW
            .directions()
            .into_iter()
            .map(|d| self.queue_lengths[d.index()])
            .sum();
        QState {
            ns: (ns / 3).min(5) as u8,
            ew: (ew / 3).min(5) as u8,
            phase: self.current_phase(),
        }
    }

    fn q_reward(&self) -> f32 {
        let total_waiting: f32 = self.queue_lengths.iter().sum::<u32>() as f32;
        let waiting_diff = self.q.previous_total_waiting - total_waiting;
        let max_queue = *self.queue_lengths.iter().max().unwrap_or(&0) as f32;
        let congestion_penalty =
            -0.5 * (max_queue - self.congestion_threshold as f32).max(0.0);
        let throughput_bonus = 0.1 * self.total_vehicles_processed as f32;
        waiting_diff + congestion_penalty + throughput_bonus
    }

    // ── Phase transitions ─────────────────────────────────────────────────

    /// Flip to `next` phase, zeroing timers and computing the new green
    /// duration from queue length and any anticipated inbound flow.
    fn apply_phase(&mut self, next: Phase) {
        for d in next.other().directions() {
            self.lights[d.index()] = LightState::Red;
            self.light_timers[d.index()] = 0.0;
        }
        let neighbor_bonus = self.neighbor_inflow_bonus(next);
        for d in next.directions() {
            self.lights[d.index()] = LightState::Green;
            self.light_timers[d.index()] = 0.0;
            let queue = self.queue_lengths[d.index()] as f32;
            self.green_durations[d.index()] =
                (self.timing.min_green + queue * 2.0 + neighbor_bonus).min(self.timing.max_green);
        }
        self.phase_changes += 1;
    }

    /// Extra green seconds justified by a matching upstream neighbor's
    /// predicted outflow.
    fn neighbor_inflow_bonus(&self, phase: Phase) -> f32 {
        let mut fresh: Vec<&NeighborState> = self
            .neighbor_states
            .values()
            .filter(|s| {
                s.phase == phase
                    && self.state.current_time - s.received_at <= NEIGHBOR_STALE_AFTER
            })
            .collect();
        fresh.sort_by(|a, b| b.outflow_estimate.total_cmp(&a.outflow_estimate));
        fresh
            .first()
            .map(|s| (2.0 * s.outflow_estimate).min(20.0))
            .unwrap_or(0.0)
    }

    fn change_phase(&mut self) -> bool {
        let mut next = self.current_phase().other();
        // A stored green-wave target overrides the plain alternation.
        if !self.green_wave.active
            && let Some(target) = self.green_wave.target_phase.take()
        {
            next = target;
            self.green_wave.offset = 0.0;
        }
        self.apply_phase(next);
        true
    }

    /// Force the phase group containing `direction` to green, subject to the
    /// min-green floor of the current green.  Returns whether the approach
    /// ends up green.  A successful force clears any green-wave hold.
    pub fn force_green(&mut self, direction: Direction) -> bool {
        if self.current_green_timer() < self.timing.min_green {
            return false;
        }
        if self.lights[direction.index()] == LightState::Green {
            return true;
        }
        self.green_wave.active = false;
        self.green_wave.timer = 0.0;
        self.apply_phase(direction.phase());
        true
    }

    // ── Green-wave coordination ───────────────────────────────────────────

    /// Vehicles expected to clear this intersection before the current green
    /// ends.
    fn estimate_outflow(&self) -> f32 {
        let rate = SATURATION_FLOW / 3_600.0; // vehicles per second
        let remaining = self.phase_timer_remaining();
        self.current_phase()
            .directions()
            .into_iter()
            .map(|d| (self.queue_lengths[d.index()] as f32).min(rate * remaining))
            .sum()
    }

    fn broadcast_state_to_neighbors(&mut self) -> bool {
        let content = Content::NeighborState {
            phase: self.current_phase(),
            phase_timer_remaining: self.phase_timer_remaining(),
            queue_lengths: self.queue_lengths,
            outflow_estimate: self.estimate_outflow(),
            position: self.position,
            timestamp: self.state.current_time,
        };
        for neighbor in self.neighbors.clone() {
            let msg = self
                .state
                .draft(Recipient::Agent(neighbor), Performative::Inform, content.clone())
                .with_protocol(Protocol::GreenWaveCoordination);
            self.state.post(msg);
            self.coordination_messages += 1;
        }
        self.last_sync_time = self.state.current_time;

        self.apply_neighbor_coordination();
        true
    }

    /// Estimate the strongest imminent inbound platoon from fresh neighbor
    /// snapshots and plan a green wave for it.
    fn apply_neighbor_coordination(&mut self) {
        let now = self.state.current_time;
        let mut best: Option<(f32, Phase, f32)> = None; // (flow, phase, arrival_in)

        let mut fresh: Vec<(&AgentId, &NeighborState)> = self
            .neighbor_states
            .iter()
            .filter(|(_, s)| now - s.received_at <= NEIGHBOR_STALE_AFTER)
            .collect();
        fresh.sort_by_key(|(id, _)| **id);

        for (_, snapshot) in fresh {
            if snapshot.outflow_estimate <= 0.0 {
                continue;
            }
            let distance = self.position.distance(snapshot.position);
            let travel_time = distance / AVG_APPROACH_SPEED;
            let arrival_in = snapshot.phase_timer_remaining + travel_time;
            // On a shared axis the platoon arrives on the same phase group it
            // left on.
            let incoming_phase = snapshot.phase;

            if best.is_none_or(|(flow, _, _)| snapshot.outflow_estimate > flow) {
                best = Some((snapshot.outflow_estimate, incoming_phase, arrival_in));
            }
        }

        if let Some((flow, phase, arrival_in)) = best
            && flow >= MIN_COORDINATION_FLOW
        {
            self.schedule_green_wave(phase, arrival_in, flow);
        }
    }

    fn schedule_green_wave(&mut self, target: Phase, offset: f32, expected_flow: f32) {
        let hold = (2.0 * expected_flow).min(self.timing.max_green);

        if self.current_phase() == target {
            // Already matching: stretch the green to absorb the platoon.
            for d in target.directions() {
                self.green_durations[d.index()] =
                    (self.green_durations[d.index()] + hold).min(self.timing.max_green);
            }
            return;
        }

        if offset <= self.timing.min_green {
            // Platoon is nearly here: force the phase now if the floor allows.
            if self.current_green_timer() >= self.timing.min_green {
                self.apply_phase(target);
                self.green_wave.active = true;
                self.green_wave.target_phase = Some(target);
                self.green_wave.timer = hold;
            }
        } else {
            // Remember the target for the next natural change.
            self.green_wave.target_phase = Some(target);
            self.green_wave.offset = offset;
        }
    }

    // ── CNP contractor ────────────────────────────────────────────────────

    fn handle_cfp(&mut self, message: &Message) {
        let current_load: u32 = self.queue_lengths.iter().sum();
        let max_capacity = (self.congestion_threshold * 4).max(1);
        let availability = 1.0 - current_load as f32 / max_capacity as f32;

        if availability > MIN_BID_AVAILABILITY {
            let proposal = self.state.reply(
                message,
                Performative::Propose,
                Content::Proposal { availability, current_load, position: self.position },
            );
            self.state.post(proposal);
            self.coordination_messages += 1;
        }
    }

    fn handle_emergency_priority(&mut self, message: &Message, vehicle_position: Point) {
        let approach = self.position.approach_direction(vehicle_position);
        self.force_green(approach);
        let ack = self.state.reply(
            message,
            Performative::Inform,
            Content::EmergencyAck { green_direction: approach, intersection: self.state.id },
        );
        self.state.post(ack);
    }

    pub fn statistics(&self) -> IntersectionStats {
        IntersectionStats {
            id: self.state.id,
            total_vehicles_processed: self.total_vehicles_processed,
            avg_waiting_time: (self.waiting_vehicle_seconds
                / self.total_vehicles_processed.max(1) as f64) as f32,
            phase_changes: self.phase_changes,
            coordination_messages: self.coordination_messages,
            green_wave_active: self.green_wave.active,
        }
    }
}

// ── BdiAgent impl ─────────────────────────────────────────────────────────────

impl BdiAgent for IntersectionAgent {
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
        self.count_vehicles(ctx);
        self.waiting_vehicle_seconds +=
            self.queue_lengths.iter().sum::<u32>() as f64 * ctx.time_step as f64;

        let now = self.state.current_time;
        self.state
            .beliefs
            .update(BeliefValue::Position(self.position), now, BeliefSource::Own);
        self.state.beliefs.update(
            BeliefValue::Congestion(CongestionBelief {
                level: self.congestion_level(),
                location: Some(self.position),
                incident: false,
            }),
            now,
            BeliefSource::Own,
        );
    }

    fn generate_desires(&mut self) {
        self.state.desires.clear();
        self.state.desires.add(Desire::new(DesireKind::OptimizeFlow, 1.0));

        if self.congestion_level() >= 0.5 {
            self.state
                .desires
                .add(Desire::new(DesireKind::AvoidCongestion, 0.9));
        }
        if !self.neighbors.is_empty() {
            self.state
                .desires
                .add(Desire::new(DesireKind::Coordinate, 0.7));
        }
    }

    fn deliberate(&mut self, ctx: &mut TickCtx<'_>) -> Vec<Intention> {
        let dt = ctx.time_step;
        for timer in &mut self.light_timers {
            *timer += dt;
        }
        let now = self.state.current_time;
        self.neighbor_states
            .retain(|_, s| now - s.received_at <= NEIGHBOR_STALE_AFTER);

        let mut intentions = Vec::new();

        if self.should_change_phase(ctx.rng, dt) {
            intentions.push(Intention::from_desire(
                IntentionKind::ChangeLightTiming,
                1.0,
                DesireKind::OptimizeFlow,
            ));
        }

        if self.congestion_level() >= 0.8 {
            intentions.push(Intention::new(
                IntentionKind::BroadcastCongestion { level: 0.8, location: self.position },
                0.8,
            ));
        }

        if !self.neighbors.is_empty()
            && now - self.last_sync_time >= NEIGHBOR_SYNC_INTERVAL
        {
            intentions.push(Intention::from_desire(
                IntentionKind::NegotiateWithNeighbor,
                0.75,
                DesireKind::Coordinate,
            ));
        }

        intentions
    }

    fn execute(&mut self, intention: &Intention, _ctx: &mut TickCtx<'_>) -> bool {
        match &intention.kind {
            IntentionKind::ChangeLightTiming => self.change_phase(),
            IntentionKind::BroadcastCongestion { level, location } => {
                let msg = self
                    .state
                    .draft(
                        Recipient::Broadcast,
                        Performative::Inform,
                        Content::Congestion { level: *level, location: *location },
                    )
                    .with_protocol(Protocol::TrafficManagement);
                self.state.post(msg);
                true
            }
            IntentionKind::NegotiateWithNeighbor => self.broadcast_state_to_neighbors(),
            _ => false,
        }
    }

    fn handle_message(&mut self, message: Message, _ctx: &mut TickCtx<'_>) {
        match (message.performative, &message.content) {
            (
                Performative::Inform,
                Content::NeighborState {
                    phase,
                    phase_timer_remaining,
                    queue_lengths,
                    outflow_estimate,
                    position,
                    timestamp,
                },
            ) => {
                self.neighbor_states.insert(
                    message.sender,
                    NeighborState {
                        phase: *phase,
                        phase_timer_remaining: *phase_timer_remaining,
                        queue_lengths: *queue_lengths,
                        outflow_estimate: *outflow_estimate,
                        position: *position,
                        timestamp: *timestamp,
                        received_at: self.state.current_time,
                    },
                );
            }

            (Performative::Inform, Content::Congestion { level, location }) => {
                let now = self.state.current_time;
                self.state.beliefs.update(
                    BeliefValue::Congestion(CongestionBelief {
                        level: *level,
                        location: Some(*location),
                        incident: false,
                    }),
                    now,
                    BeliefSource::Agent(message.sender),
                );
            }

            (Performative::Inform, Content::IncidentReport { location, .. }) => {
                let now = self.state.current_time;
                self.state.beliefs.update(
                    BeliefValue::Congestion(CongestionBelief {
                        level: 1.0,
                        location: Some(*location),
                        incident: true,
                    }),
                    now,
                    BeliefSource::Agent(message.sender),
                );
            }

            (Performative::Request, Content::EmergencyPriority { position, .. }) => {
                let position = *position;
                self.handle_emergency_priority(&message, position);
            }

            (Performative::Request, Content::CallForProposals { .. }) => {
                self.handle_cfp(&message);
            }

            (Performative::AcceptProposal, Content::Award { direction }) => {
                self.force_green(*direction);
            }

            (Performative::RejectProposal, _) => {
                // Our bid lost; nothing to do.
            }

            _ => self.state.unhandled_messages += 1,
        }
    }
}

// ── Q-learning internals ──────────────────────────────────────────────────────
