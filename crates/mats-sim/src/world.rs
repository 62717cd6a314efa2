//! The world: agent table, road graph, bus, clock, and the tick pipeline.

use log::{info, warn};
use rustc_hash::FxHashSet;

use mats_acl::{
    Content, DeliveryOutcome, Directory, Message, MessageBus, Performative, Recipient,
};
use mats_agents::{
    AgentKind, CrisisManagerAgent, CrisisStats, IntersectionAgent, IntersectionStats,
    VehicleAgent, VehicleStats,
};
use mats_bdi::{run_cycle, BdiAgent, IntersectionObs, TickCtx, VehicleObs, WorldView};
use mats_core::{AgentId, MessageId, NodeId, Point, SimClock, SimConfig, SimRng, VehicleType};
use mats_routing::{DynamicRouter, RoadGraph, RouterStats};

use crate::error::{SimError, SimResult};
use crate::kpi::KpiSnapshot;
use crate::microsim::{MicrosimLink, NoopMicrosim, PhaseSync, VehicleSync};
use crate::observer::{NoopObserver, SimObserver};
use crate::scenario::Scenario;

/// Road-grid node spacing is never finer than this, whatever the config's
/// `cell_size` says.
const MIN_ROAD_CELL: f32 = 100.0;

// ── Directory adapter ─────────────────────────────────────────────────────────

/// The bus's view of the agent table for one routing pass.
///
/// Inactive vehicles are unknown recipients: they have left the simulation,
/// and messages to them drop silently (and are counted by the bus).
struct AgentDirectory<'a> {
    agents: &'a mut Vec<AgentKind>,
}

impl Directory for AgentDirectory<'_> {
    fn position_of(&self, id: AgentId) -> Option<Point> {
        let agent = self.agents.get(id.index())?;
        agent.is_active().then(|| agent.position())
    }

    fn deliver(&mut self, id: AgentId, message: Message) -> DeliveryOutcome {
        match self.agents.get_mut(id.index()) {
            Some(agent) if agent.is_active() => {
                agent.state_mut().mailbox.accept(message);
                DeliveryOutcome::Delivered
            }
            _ => DeliveryOutcome::UnknownRecipient,
        }
    }

    fn broadcast_targets(&self) -> Vec<AgentId> {
        self.agents
            .iter()
            .filter(|a| a.is_active())
            .map(|a| a.id())
            .collect()
    }
}

// ── Scenario inform deliveries ────────────────────────────────────────────────

/// Deliveries made by one scenario inform, by receiving agent kind.
#[derive(Clone, Copy, Debug, Default)]
pub struct InformDeliveries {
    pub vehicles: u32,
    pub intersections: u32,
}

impl InformDeliveries {
    #[inline]
    pub fn total(self) -> u32 {
        self.vehicles + self.intersections
    }
}

// ── World ─────────────────────────────────────────────────────────────────────

/// All simulation state.  The world owns the agents exclusively; agents see
/// it only through the per-tick [`WorldView`] snapshot and [`TickCtx`].
pub struct World {
    pub config: SimConfig,
    pub clock: SimClock,
    pub graph: RoadGraph,
    pub router: DynamicRouter,
    pub bus: MessageBus,
    pub rng: SimRng,

    agents: Vec<AgentKind>,
    crisis_id: AgentId,
    harvested: FxHashSet<AgentId>,
    scenario_message_seq: u32,

    pub total_vehicles_created: u64,
    pub total_vehicles_arrived: u64,
    pub total_travel_time: f64,
    pub vehicle_aggregates: Vec<VehicleStats>,
    pub kpi_history: Vec<KpiSnapshot>,
}

impl World {
    /// Build the standard world from a configuration: a road grid, a grid of
    /// intersections, the crisis manager at the centre, and the initial
    /// vehicle population.
    pub fn from_config(config: SimConfig) -> SimResult<World> {
        let env = config.environment.clone();
        let spacing = env.width / 5.0;

        let mut builder = WorldBuilder::new(config);
        let mut x = 0.0;
        while x < env.width {
            let mut y = 0.0;
            while y < env.height {
                builder = builder.intersection_at(Point::new(x, y));
                y += spacing;
            }
            x += spacing;
        }

        let mut world = builder.neighbor_radius(spacing * 1.5).build()?;
        world.spawn_initial_vehicles();
        Ok(world)
    }

    fn spawn_initial_vehicles(&mut self) {
        let n = self.config.num_vehicles;
        let width = self.config.environment.width;
        let height = self.config.environment.height;
        let min_trip = width * 0.3;

        for _ in 0..n {
            let vehicle_type = self.sample_vehicle_type();
            let origin = Point::new(
                self.rng.gen_range(0.0..width),
                self.rng.gen_range(0.0..height),
            );
            // Destinations closer than a third of the map are re-drawn.
            let destination = loop {
                let candidate = Point::new(
                    self.rng.gen_range(0.0..width),
                    self.rng.gen_range(0.0..height),
                );
                if origin.distance(candidate) > min_trip {
                    break candidate;
                }
            };
            self.spawn_vehicle(vehicle_type, origin, destination);
        }
        info!("spawned {n} initial vehicles");
    }

    /// Fleet mix of the initial population: 75 % standard, 10 % bus,
    /// 5 % each ambulance / fire / police.
    fn sample_vehicle_type(&mut self) -> VehicleType {
        let r = self.rng.unit();
        if r < 0.70 {
            VehicleType::Standard
        } else if r < 0.80 {
            VehicleType::Bus
        } else if r < 0.85 {
            VehicleType::Ambulance
        } else if r < 0.90 {
            VehicleType::Fire
        } else if r < 0.95 {
            VehicleType::Police
        } else {
            VehicleType::Standard
        }
    }

    // ── Agent table access ────────────────────────────────────────────────

    pub fn agent(&self, id: AgentId) -> Option<&AgentKind> {
        self.agents.get(id.index())
    }

    pub fn agent_mut(&mut self, id: AgentId) -> Option<&mut AgentKind> {
        self.agents.get_mut(id.index())
    }

    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    pub fn crisis_id(&self) -> AgentId {
        self.crisis_id
    }

    pub fn crisis(&self) -> Option<&CrisisManagerAgent> {
        self.agents.get(self.crisis_id.index())?.as_crisis()
    }

    pub fn vehicles(&self) -> impl Iterator<Item = &VehicleAgent> {
        self.agents.iter().filter_map(AgentKind::as_vehicle)
    }

    pub fn active_vehicles(&self) -> impl Iterator<Item = &VehicleAgent> {
        self.vehicles().filter(|v| v.state.active)
    }

    pub fn intersections(&self) -> impl Iterator<Item = &IntersectionAgent> {
        self.agents.iter().filter_map(AgentKind::as_intersection)
    }

    // ── Spawning ──────────────────────────────────────────────────────────

    /// Create a vehicle, route it, and add it to the world.  A vehicle whose
    /// origin has no path to its destination still enters the simulation —
    /// its first deliberation will retry the route.
    pub fn spawn_vehicle(
        &mut self,
        vehicle_type: VehicleType,
        origin: Point,
        destination: Point,
    ) -> AgentId {
        let id = AgentId(self.agents.len() as u32);
        let max_speed = match vehicle_type {
            VehicleType::Standard => self.config.vehicle.max_speed,
            other => other.max_speed(),
        };
        let mut vehicle = VehicleAgent::new(
            id,
            self.clock.now_secs(),
            vehicle_type,
            origin,
            destination,
            max_speed,
        );
        match self.router.find_path(&self.graph, origin, destination, true) {
            Some(route) => vehicle.set_route(route),
            None => warn!("vehicle {id}: no initial route {origin} → {destination}"),
        }
        self.agents.push(AgentKind::Vehicle(vehicle));
        self.total_vehicles_created += 1;
        id
    }

    // ── Scenario surface ──────────────────────────────────────────────────

    /// Block an edge until `expiry_sim_time`, dropping cached routes that
    /// may traverse it.
    pub fn block_edge(&mut self, a: NodeId, b: NodeId, expiry_sim_time: f64) {
        self.graph.add_temporary_blockage(a, b, expiry_sim_time);
        self.router.invalidate_cache();
    }

    fn scenario_message(
        &mut self,
        recipient: Recipient,
        performative: Performative,
        content: Content,
    ) -> Message {
        let message_id = MessageId::compose(AgentId::INVALID, self.scenario_message_seq);
        self.scenario_message_seq += 1;
        Message::new(
            message_id,
            AgentId::INVALID,
            recipient,
            performative,
            content,
            self.clock.now_secs(),
        )
    }

    /// Deliver an `inform` directly to every active vehicle and intersection
    /// within `radius` metres of `origin`, bypassing the bus (scenario hooks
    /// are not agents and have no mailbox of their own).  The crisis manager
    /// is reported separately via [`Self::scenario_unicast`].  Returns the
    /// per-kind delivery counts so scenarios can keep exact message tallies.
    pub fn scenario_inform(
        &mut self,
        origin: Point,
        radius: f32,
        content: Content,
    ) -> InformDeliveries {
        let message = self.scenario_message(Recipient::Broadcast, Performative::Inform, content);
        let mut delivered = InformDeliveries::default();
        for agent in &mut self.agents {
            if !agent.is_active() || agent.position().distance(origin) > radius {
                continue;
            }
            match agent {
                AgentKind::Vehicle(_) => delivered.vehicles += 1,
                AgentKind::Intersection(_) => delivered.intersections += 1,
                AgentKind::Crisis(_) => continue,
            }
            agent.state_mut().mailbox.accept(message.clone());
        }
        delivered
    }

    /// Same delivery path, addressed to intersections only (used by periodic
    /// incident rebroadcasts).  Returns the number of intersections reached.
    pub fn scenario_inform_intersections(
        &mut self,
        origin: Point,
        radius: f32,
        content: Content,
    ) -> u32 {
        let message = self.scenario_message(Recipient::Broadcast, Performative::Inform, content);
        let mut delivered = 0;
        for agent in &mut self.agents {
            if matches!(agent, AgentKind::Intersection(_))
                && agent.position().distance(origin) <= radius
            {
                agent.state_mut().mailbox.accept(message.clone());
                delivered += 1;
            }
        }
        delivered
    }

    /// Deliver a message straight into one agent's inbox (scenario use).
    pub fn scenario_unicast(&mut self, to: AgentId, performative: Performative, content: Content) {
        let message = self.scenario_message(Recipient::Agent(to), performative, content);
        if let Some(agent) = self.agents.get_mut(to.index()) {
            agent.state_mut().mailbox.accept(message);
        }
    }

    // ── Tick pipeline ─────────────────────────────────────────────────────

    /// Run the configured number of ticks with scenarios, an observer, and a
    /// microsim link.
    pub fn run<O: SimObserver, M: MicrosimLink>(
        &mut self,
        scenarios: &mut [Box<dyn Scenario>],
        observer: &mut O,
        microsim: &mut M,
    ) -> SimResult<()> {
        for scenario in scenarios.iter_mut() {
            scenario.setup(self);
        }
        for _ in 0..self.config.total_ticks() {
            self.tick_once(scenarios, observer, microsim);
        }
        observer.on_sim_end(self);
        Ok(())
    }

    /// Advance exactly one tick without scenarios or observers — the test
    /// and embedding entry point.
    pub fn step(&mut self) {
        self.tick_once(&mut [], &mut NoopObserver, &mut NoopMicrosim);
    }

    fn tick_once<O: SimObserver, M: MicrosimLink>(
        &mut self,
        scenarios: &mut [Box<dyn Scenario>],
        observer: &mut O,
        microsim: &mut M,
    ) {
        let now = self.clock.now_secs();
        let tick = self.clock.current_tick;

        // ① Timed blockages are polled, not event-driven.
        if self.graph.restore_expired_blockages(now) > 0 {
            self.router.invalidate_cache();
        }

        // ② One frozen frame for every agent this tick.
        let view = self.build_view();

        // ③ Uniformly random activation order from the run's RNG.
        let mut order: Vec<usize> = self
            .agents
            .iter()
            .enumerate()
            .filter(|(_, a)| a.is_active())
            .map(|(i, _)| i)
            .collect();
        self.rng.shuffle(&mut order);

        {
            let World { agents, graph, router, rng, config, .. } = self;
            for &idx in &order {
                let mut ctx = TickCtx {
                    now,
                    time_step: config.time_step,
                    view: &view,
                    graph: &*graph,
                    router: &mut *router,
                    rng: &mut *rng,
                };
                run_cycle(&mut agents[idx], &mut ctx);
            }
        }

        // ④ Route outboxes in activation order; FIFO within each outbox.
        for &idx in &order {
            let outbound = self.agents[idx].state_mut().mailbox.drain_outbox();
            let mut directory = AgentDirectory { agents: &mut self.agents };
            for message in outbound {
                self.bus.route(&mut directory, message);
            }
        }

        // ⑤ Harvest arrived vehicles.
        self.harvest_arrivals();

        // ⑥ Scenario mutations.
        for scenario in scenarios.iter_mut() {
            scenario.step(self, tick);
        }

        // ⑦ KPI snapshot.
        if self.config.kpi_interval > 0 && tick.0 % self.config.kpi_interval == 0 {
            let snapshot = self.kpi_snapshot();
            observer.on_kpi_snapshot(&snapshot);
            self.kpi_history.push(snapshot);
        }

        // ⑧ Companion sync.
        self.sync_microsim(microsim);

        observer.on_tick_end(tick, self);

        // ⑨
        self.clock.advance();
    }

    fn build_view(&self) -> WorldView {
        let mut view = WorldView::default();
        for agent in &self.agents {
            match agent {
                AgentKind::Vehicle(v) if v.state.active => {
                    view.vehicles.push(VehicleObs {
                        id: v.state.id,
                        vehicle_type: v.vehicle_type,
                        position: v.position,
                        speed: v.speed,
                        destination: v.destination,
                        route: v.vehicle_type.is_priority().then(|| {
                            v.route[v.waypoint_index.min(v.route.len())..].to_vec()
                        }),
                    });
                }
                AgentKind::Intersection(i) => {
                    view.intersections.push(IntersectionObs {
                        id: i.state.id,
                        position: i.position,
                        phase: i.current_phase(),
                        queue_lengths: i.queue_lengths(),
                        congestion_threshold: i.congestion_threshold,
                        neighbors: i.neighbors.clone(),
                    });
                }
                _ => {}
            }
        }
        view
    }

    fn harvest_arrivals(&mut self) {
        for agent in &self.agents {
            let Some(vehicle) = agent.as_vehicle() else { continue };
            if vehicle.state.active || self.harvested.contains(&vehicle.state.id) {
                continue;
            }
            self.harvested.insert(vehicle.state.id);
            self.total_vehicles_arrived += 1;
            self.total_travel_time += vehicle.travel_time as f64;
            self.vehicle_aggregates.push(vehicle.statistics());
        }
    }

    fn sync_microsim<M: MicrosimLink>(&self, microsim: &mut M) {
        let vehicles: Vec<VehicleSync> = self
            .active_vehicles()
            .map(|v| VehicleSync {
                id: v.state.id,
                vehicle_type: v.vehicle_type,
                origin: v.origin,
                destination: v.destination,
            })
            .collect();
        microsim.sync_vehicles(&vehicles);

        let phases: Vec<PhaseSync> = self
            .intersections()
            .map(|i| PhaseSync { id: i.state.id, phase: i.current_phase() })
            .collect();
        microsim.sync_phases(&phases);

        microsim.sync_blockages(&self.graph.blocked_edges());
        microsim.step_once();
    }

    // ── KPI reporters ─────────────────────────────────────────────────────

    pub fn kpi_snapshot(&self) -> KpiSnapshot {
        let active: Vec<&VehicleAgent> = self.active_vehicles().collect();
        let active_count = active.len();

        let avg_travel_time = if active_count == 0 {
            0.0
        } else {
            active.iter().map(|v| v.travel_time).sum::<f32>() / active_count as f32
        };
        let avg_speed = if active_count == 0 {
            0.0
        } else {
            active.iter().map(|v| v.speed).sum::<f32>() / active_count as f32
        };

        let intersection_count = self.intersections().count();
        let avg_queue_length = if intersection_count == 0 {
            0.0
        } else {
            self.intersections()
                .map(|i| i.queue_lengths().iter().sum::<u32>() as f32)
                .sum::<f32>()
                / intersection_count as f32
        };

        let max_speed = self.config.vehicle.max_speed;
        let congestion_level = if max_speed > 0.0 && active_count > 0 {
            (1.0 - avg_speed / max_speed).clamp(0.0, 1.0)
        } else {
            0.0
        };

        KpiSnapshot {
            tick: self.clock.current_tick.0,
            sim_time: self.clock.now_secs(),
            avg_travel_time,
            avg_queue_length,
            total_messages: self.bus.stats().total_messages,
            active_vehicles: active_count as u32,
            arrivals: self.total_vehicles_arrived,
            avg_speed,
            congestion_level,
        }
    }

    /// Final per-intersection aggregates.
    pub fn intersection_aggregates(&self) -> Vec<IntersectionStats> {
        self.intersections().map(|i| i.statistics()).collect()
    }

    /// Final per-vehicle aggregates: harvested arrivals plus the vehicles
    /// still en route at run end.
    pub fn final_vehicle_aggregates(&self) -> Vec<VehicleStats> {
        let mut all = self.vehicle_aggregates.clone();
        all.extend(self.active_vehicles().map(|v| v.statistics()));
        all
    }

    pub fn crisis_stats(&self) -> CrisisStats {
        self.crisis().map(|c| c.statistics()).unwrap_or_default()
    }

    pub fn router_stats(&self) -> RouterStats {
        self.router.stats()
    }
}

// ── WorldBuilder ──────────────────────────────────────────────────────────────

/// Assemble a world piece by piece.  [`World::from_config`] is the standard
/// grid-city assembly; tests and embeddings lay out their own.
pub struct WorldBuilder {
    config: SimConfig,
    graph: Option<RoadGraph>,
    intersection_positions: Vec<Point>,
    crisis_position: Option<Point>,
    neighbor_radius: Option<f32>,
}

impl WorldBuilder {
    pub fn new(config: SimConfig) -> Self {
        Self {
            config,
            graph: None,
            intersection_positions: Vec::new(),
            crisis_position: None,
            neighbor_radius: None,
        }
    }

    /// Use a custom road graph instead of the default grid.
    pub fn graph(mut self, graph: RoadGraph) -> Self {
        self.graph = Some(graph);
        self
    }

    /// Place an intersection agent.
    pub fn intersection_at(mut self, position: Point) -> Self {
        self.intersection_positions.push(position);
        self
    }

    /// Position of the crisis manager (default: map centre).
    pub fn crisis_at(mut self, position: Point) -> Self {
        self.crisis_position = Some(position);
        self
    }

    /// Link intersections within `radius` of each other as coordination
    /// neighbors.
    pub fn neighbor_radius(mut self, radius: f32) -> Self {
        self.neighbor_radius = Some(radius);
        self
    }

    pub fn build(self) -> SimResult<World> {
        self.config.validate().map_err(SimError::Core)?;
        let env = &self.config.environment;

        let graph = self.graph.unwrap_or_else(|| {
            RoadGraph::grid(env.width, env.height, env.cell_size.max(MIN_ROAD_CELL))
        });
        let router = DynamicRouter::new(self.config.algorithms.routing);
        let clock = SimClock::new(self.config.time_step);
        let rng = SimRng::new(self.config.random_seed);

        let mut agents: Vec<AgentKind> = Vec::new();
        let signal_policy = self.config.algorithms.traffic_light;
        for position in &self.intersection_positions {
            let id = AgentId(agents.len() as u32);
            agents.push(AgentKind::Intersection(IntersectionAgent::new(
                id,
                0.0,
                *position,
                signal_policy,
            )));
        }

        // Wire up coordination neighborhoods.
        if let Some(radius) = self.neighbor_radius {
            let positions: Vec<(AgentId, Point)> = agents
                .iter()
                .filter_map(|a| a.as_intersection())
                .map(|i| (i.state.id, i.position))
                .collect();
            for agent in &mut agents {
                let Some(intersection) = agent.as_intersection_mut() else { continue };
                for &(other_id, other_pos) in &positions {
                    if other_id != intersection.state.id
                        && intersection.position.distance(other_pos) <= radius
                    {
                        intersection.add_neighbor(other_id);
                    }
                }
            }
        }

        let crisis_position = self
            .crisis_position
            .unwrap_or_else(|| Point::new(env.width / 2.0, env.height / 2.0));
        let crisis_id = AgentId(agents.len() as u32);
        agents.push(AgentKind::Crisis(CrisisManagerAgent::new(
            crisis_id,
            0.0,
            crisis_position,
        )));

        info!(
            "world built: {} intersections, crisis manager at {}, {} road nodes",
            agents.len() - 1,
            crisis_position,
            graph.node_count(),
        );

        Ok(World {
            config: self.config,
            clock,
            graph,
            router,
            bus: MessageBus::new(),
            rng,
            agents,
            crisis_id,
            harvested: FxHashSet::default(),
            scenario_message_seq: 0,
            total_vehicles_created: 0,
            total_vehicles_arrived: 0,
            total_travel_time: 0.0,
            vehicle_aggregates: Vec::new(),
            kpi_history: Vec::new(),
        })
    }
}
