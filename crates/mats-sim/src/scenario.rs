//! Scenario hooks: demand waves and incidents that mutate the world.
//!
//! A scenario is a callback triple — `setup` once at start, `step` every
//! tick, `statistics` at the end.  Scenarios are the only code (besides the
//! dynamic router's weight map) that mutates the road graph, and they run in
//! a scheduler phase after all agents have stepped, so agent reads never
//! overlap scenario writes.

use log::{info, warn};

use mats_acl::{Content, Performative, Severity};
use mats_core::{config::IncidentConfig, config::RushHourConfig, NodeId, Point, Tick, VehicleType};

use crate::world::World;

/// Informs radiate this far from an incident.
const INCIDENT_INFORM_RADIUS: f32 = 1_000.0;
/// Corridor half-width when matching edges to an incident segment.
const CORRIDOR_MARGIN: f32 = 50.0;
/// Seconds between congestion rebroadcasts while an incident is active.
const REBROADCAST_INTERVAL: f32 = 60.0;

/// End-of-run summary of one scenario.
#[derive(Clone, Debug, Default)]
pub struct ScenarioStats {
    pub name: String,
    pub vehicles_created: u32,
    pub edges_blocked: u32,
    /// Vehicles that received the incident inform (one count per vehicle).
    pub vehicles_redirected: u32,
    /// Congestion informs actually delivered, one count per receiving agent.
    pub congestion_messages_sent: u32,
}

pub trait Scenario {
    fn name(&self) -> &str;

    /// Called once before the first tick.
    fn setup(&mut self, world: &mut World);

    /// Called every tick after agents stepped and messages routed.
    fn step(&mut self, world: &mut World, tick: Tick);

    /// Called after the final tick.
    fn statistics(&self) -> ScenarioStats;
}

// ── Rush hour ─────────────────────────────────────────────────────────────────

/// Morning-peak demand: vehicles from weighted origin zones toward the
/// destination zones, at a rate that ramps up, plateaus, and ramps down
/// across the window.
pub struct RushHourScenario {
    cfg: RushHourConfig,
    vehicles_created: u32,
}

impl RushHourScenario {
    pub fn new(cfg: RushHourConfig) -> Self {
        Self { cfg, vehicles_created: 0 }
    }

    /// Demand multiplier over window progress: ramp / plateau / ramp-down.
    fn rate_multiplier(progress: f32) -> f32 {
        if progress < 0.33 {
            progress / 0.33
        } else if progress < 0.66 {
            1.0
        } else {
            (1.0 - progress) / 0.34
        }
    }

    fn sample_zone_position(world: &mut World, zones: &[mats_core::config::ZoneConfig]) -> Point {
        let total: f32 = zones.iter().map(|z| z.weight).sum();
        let mut pick = world.rng.unit() * total;
        let zone = zones
            .iter()
            .find(|z| {
                pick -= z.weight;
                pick <= 0.0
            })
            .unwrap_or(&zones[zones.len() - 1]);

        let width = world.config.environment.width;
        let height = world.config.environment.height;
        let x = zone.center.x + world.rng.gen_range(-zone.spread..=zone.spread);
        let y = zone.center.y + world.rng.gen_range(-zone.spread..=zone.spread);
        Point::new(x.clamp(0.0, width - 1.0), y.clamp(0.0, height - 1.0))
    }

    /// Rush-hour fleet mix: heavier on buses than the background traffic.
    fn sample_vehicle_type(world: &mut World) -> VehicleType {
        let r = world.rng.unit();
        if r < 0.80 {
            VehicleType::Standard
        } else if r < 0.95 {
            VehicleType::Bus
        } else if r < 0.97 {
            VehicleType::Ambulance
        } else if r < 0.99 {
            VehicleType::Fire
        } else {
            VehicleType::Police
        }
    }
}

impl Scenario for RushHourScenario {
    fn name(&self) -> &str {
        "rush_hour"
    }

    fn setup(&mut self, _world: &mut World) {
        info!(
            "rush hour configured: start {:.0} s, duration {:.0} s, peak rate {:.2}/s",
            self.cfg.start_time, self.cfg.duration, self.cfg.generation_rate,
        );
    }

    fn step(&mut self, world: &mut World, _tick: Tick) {
        if self.cfg.origin_zones.is_empty() || self.cfg.destination_zones.is_empty() {
            return;
        }
        let elapsed = world.clock.now_secs() as f32 - self.cfg.start_time;
        if elapsed < 0.0 || elapsed > self.cfg.duration {
            return;
        }

        let progress = elapsed / self.cfg.duration;
        let rate = self.cfg.generation_rate
            * Self::rate_multiplier(progress)
            * world.config.time_step;
        if !world.rng.gen_bool(rate as f64) {
            return;
        }

        let origin = Self::sample_zone_position(world, &self.cfg.origin_zones);
        let destination = Self::sample_zone_position(world, &self.cfg.destination_zones);
        let vehicle_type = Self::sample_vehicle_type(world);
        world.spawn_vehicle(vehicle_type, origin, destination);
        self.vehicles_created += 1;
    }

    fn statistics(&self) -> ScenarioStats {
        ScenarioStats {
            name: self.name().to_owned(),
            vehicles_created: self.vehicles_created,
            ..ScenarioStats::default()
        }
    }
}

// ── Incident ──────────────────────────────────────────────────────────────────

/// A corridor blockage: at `start_time` every edge inside the corridor's
/// bounding box is removed (with an expiry at `start_time + duration`), the
/// neighborhood is informed, and the crisis manager gets an incident report.
/// While the incident is active the congestion inform is rebroadcast to
/// intersections every [`REBROADCAST_INTERVAL`] seconds so late arrivals
/// still learn of it.  Edges restore themselves through the world's blockage
/// polling.
pub struct IncidentScenario {
    cfg: IncidentConfig,
    triggered: bool,
    resolved: bool,
    edges_blocked: u32,
    vehicles_redirected: u32,
    congestion_messages_sent: u32,
    last_broadcast_time: f32,
}

impl IncidentScenario {
    pub fn new(cfg: IncidentConfig) -> Self {
        Self {
            cfg,
            triggered: false,
            resolved: false,
            edges_blocked: 0,
            vehicles_redirected: 0,
            congestion_messages_sent: 0,
            last_broadcast_time: 0.0,
        }
    }

    fn corridor_center(&self) -> Point {
        let [a, b] = self.cfg.corridor;
        Point::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0)
    }

    /// Edges whose endpoints both fall inside the corridor bounding box.
    fn corridor_edges(&self, world: &World) -> Vec<(NodeId, NodeId)> {
        let [a, b] = self.cfg.corridor;
        let (min_x, max_x) = (a.x.min(b.x) - CORRIDOR_MARGIN, a.x.max(b.x) + CORRIDOR_MARGIN);
        let (min_y, max_y) = (a.y.min(b.y) - CORRIDOR_MARGIN, a.y.max(b.y) + CORRIDOR_MARGIN);
        let in_zone = |p: Point| p.x >= min_x && p.x <= max_x && p.y >= min_y && p.y <= max_y;

        let mut edges = Vec::new();
        for id in 0..world.graph.node_count() as u32 {
            let node = NodeId(id);
            if !in_zone(world.graph.node_pos(node)) {
                continue;
            }
            for (neighbor, _) in world.graph.neighbors(node) {
                if node < neighbor && in_zone(world.graph.node_pos(neighbor)) {
                    edges.push((node, neighbor));
                }
            }
        }
        edges
    }

    fn trigger(&mut self, world: &mut World) {
        warn!(
            "incident triggered on '{}' at t={:.0} s",
            self.cfg.road_name,
            world.clock.now_secs(),
        );
        self.triggered = true;

        let expiry = (self.cfg.start_time + self.cfg.duration) as f64;
        let edges = self.corridor_edges(world);
        for &(a, b) in &edges {
            world.block_edge(a, b, expiry);
        }
        self.edges_blocked = edges.len() as u32;
        info!("incident blocked {} edges on '{}'", self.edges_blocked, self.cfg.road_name);

        let center = self.corridor_center();
        // Warn everything in the neighborhood so vehicles reroute at once.
        let delivered = world.scenario_inform(
            center,
            INCIDENT_INFORM_RADIUS,
            Content::IncidentReport {
                location: center,
                severity: Severity::High,
                road: self.cfg.road_name.clone(),
            },
        );
        self.vehicles_redirected += delivered.vehicles;
        self.congestion_messages_sent += delivered.total();
        self.last_broadcast_time = world.clock.now_secs() as f32;

        // The crisis manager tracks the incident regardless of distance.
        world.scenario_unicast(
            world.crisis_id(),
            Performative::Inform,
            Content::IncidentReport {
                location: center,
                severity: Severity::High,
                road: self.cfg.road_name.clone(),
            },
        );
    }

    /// Periodic reminder while the incident is active: intersections keep a
    /// fresh congestion belief even if the initial inform has long decayed.
    fn rebroadcast_to_intersections(&mut self, world: &mut World) {
        let center = self.corridor_center();
        let sent = world.scenario_inform_intersections(
            center,
            INCIDENT_INFORM_RADIUS,
            Content::Congestion { level: 0.9, location: center },
        );
        self.congestion_messages_sent += sent;
        self.last_broadcast_time = world.clock.now_secs() as f32;
    }
}

impl Scenario for IncidentScenario {
    fn name(&self) -> &str {
        "incident"
    }

    fn setup(&mut self, _world: &mut World) {
        info!(
            "incident configured on '{}': t={:.0} s for {:.0} s",
            self.cfg.road_name, self.cfg.start_time, self.cfg.duration,
        );
    }

    fn step(&mut self, world: &mut World, _tick: Tick) {
        let now = world.clock.now_secs() as f32;

        if now >= self.cfg.start_time && !self.triggered && !self.resolved {
            self.trigger(world);
        }

        if self.triggered && !self.resolved && now >= self.cfg.start_time + self.cfg.duration {
            // The graph restores the edges itself; this is just bookkeeping.
            self.resolved = true;
            info!("incident on '{}' resolved at t={now:.0} s", self.cfg.road_name);
        }

        if self.triggered
            && !self.resolved
            && now - self.last_broadcast_time >= REBROADCAST_INTERVAL
        {
            self.rebroadcast_to_intersections(world);
        }
    }

    fn statistics(&self) -> ScenarioStats {
        ScenarioStats {
            name: self.name().to_owned(),
            vehicles_created: 0,
            edges_blocked: self.edges_blocked,
            vehicles_redirected: self.vehicles_redirected,
            congestion_messages_sent: self.congestion_messages_sent,
        }
    }
}
