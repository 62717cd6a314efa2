//! Integration tests: whole-world runs over small hand-built cities.

#[cfg(test)]
mod helpers {
    use mats_core::SimConfig;

    /// A small-city config: `width` × `height` at 100 m road spacing, 1 s
    /// ticks, fixed seed, no auto-spawned vehicles.
    pub fn config(width: f32, height: f32, duration: f32) -> SimConfig {
        let mut cfg = SimConfig::default();
        cfg.environment.width = width;
        cfg.environment.height = height;
        cfg.environment.cell_size = 100.0;
        cfg.duration = duration;
        cfg.time_step = 1.0;
        cfg.num_vehicles = 0;
        cfg.random_seed = 42;
        cfg
    }
}

// ── Straight route ────────────────────────────────────────────────────────────

#[cfg(test)]
mod straight_route {
    use mats_core::{Point, VehicleType};

    use super::helpers::config;
    use crate::WorldBuilder;

    #[test]
    fn vehicle_crosses_a_grid_and_arrives() {
        let mut cfg = config(200.0, 200.0, 100.0);
        cfg.vehicle.max_speed = 10.0;
        let mut world = WorldBuilder::new(cfg).build().unwrap();

        let id = world.spawn_vehicle(
            VehicleType::Standard,
            Point::new(0.0, 0.0),
            Point::new(200.0, 200.0),
        );
        assert!(!world.agent(id).unwrap().as_vehicle().unwrap().route.is_empty());

        let mut arrival_tick = None;
        for tick in 0..60u64 {
            world.step();
            let vehicle = world.agent(id).unwrap().as_vehicle().unwrap();
            if !vehicle.state.active {
                arrival_tick = Some(tick);
                break;
            }
        }

        // The grid path is 400 m; at 10 m/s with the 2 m/s² ramp the trip
        // lands in the low forties.
        let arrived = arrival_tick.expect("vehicle must arrive");
        assert!((36..=50).contains(&arrived), "arrived at tick {arrived}");

        let vehicle = world.agent(id).unwrap().as_vehicle().unwrap();
        let stats = vehicle.statistics();
        assert!(stats.reached_destination);
        assert_eq!(stats.route_changes, 0);
        assert_eq!(world.total_vehicles_arrived, 1);
        assert_eq!(world.vehicle_aggregates.len(), 1);
    }
}

// ── Emergency pre-emption ─────────────────────────────────────────────────────

#[cfg(test)]
mod emergency {
    use mats_acl::Performative;
    use mats_core::{AgentId, Phase, Point, VehicleType};

    use super::helpers::config;
    use crate::WorldBuilder;

    #[test]
    fn ambulance_gets_a_green_wave() {
        let cfg = config(1_000.0, 300.0, 60.0);
        let mut world = WorldBuilder::new(cfg)
            .intersection_at(Point::new(200.0, 100.0))
            .build()
            .unwrap();
        let intersection_id = AgentId(0);

        world.spawn_vehicle(
            VehicleType::Ambulance,
            Point::new(100.0, 100.0),
            Point::new(800.0, 100.0),
        );

        for _ in 0..25 {
            world.step();
        }

        // The crisis manager saw the ambulance and asked the on-route
        // intersection for priority; once its min-green elapsed, the
        // east-west approach was forced green and acknowledged.
        let intersection = world
            .agent(intersection_id)
            .unwrap()
            .as_intersection()
            .unwrap();
        assert_eq!(intersection.current_phase(), Phase::EW);

        let stats = world.bus.stats();
        assert!(stats.by_performative[Performative::Request.index()] > 0);
        assert!(stats.by_performative[Performative::Inform.index()] > 0);
        assert!(world.crisis_stats().green_waves_created > 0);
        // Acks were understood, not dropped.
        assert_eq!(world.crisis().unwrap().state.unhandled_messages, 0);
    }
}

// ── Incident reroute ──────────────────────────────────────────────────────────

#[cfg(test)]
mod incident {
    use mats_core::{config::IncidentConfig, Point, VehicleType};

    use super::helpers::config;
    use crate::{IncidentScenario, NoopMicrosim, NoopObserver, Scenario, WorldBuilder};

    #[test]
    fn blocked_corridor_forces_reroute_around_it() {
        let mut cfg = config(400.0, 400.0, 12.0);
        cfg.vehicle.max_speed = 10.0;
        cfg.scenarios.incident = Some(IncidentConfig {
            start_time: 5.0,
            duration: 60.0,
            road_name: "center corridor".into(),
            corridor: [Point::new(150.0, 200.0), Point::new(250.0, 200.0)],
        });
        let incident_cfg = cfg.scenarios.incident.clone().unwrap();

        let mut world = WorldBuilder::new(cfg).build().unwrap();
        // One vehicle routed over the corridor, two on parallel streets —
        // all three are inside the 1 km inform radius when it triggers.
        let id = world.spawn_vehicle(
            VehicleType::Standard,
            Point::new(0.0, 200.0),
            Point::new(400.0, 200.0),
        );
        world.spawn_vehicle(
            VehicleType::Standard,
            Point::new(0.0, 100.0),
            Point::new(400.0, 100.0),
        );
        world.spawn_vehicle(
            VehicleType::Standard,
            Point::new(0.0, 300.0),
            Point::new(400.0, 300.0),
        );

        let mut scenarios: Vec<Box<dyn Scenario>> =
            vec![Box::new(IncidentScenario::new(incident_cfg))];
        world
            .run(&mut scenarios, &mut NoopObserver, &mut NoopMicrosim)
            .unwrap();

        let vehicle = world.agent(id).unwrap().as_vehicle().unwrap();
        assert!(vehicle.route_changes >= 1, "incident inform must trigger a reroute");

        // The corridor edges (100,200)–(200,200) and (200,200)–(300,200)
        // must not appear in the replanned route.
        let blocked = [
            (Point::new(100.0, 200.0), Point::new(200.0, 200.0)),
            (Point::new(200.0, 200.0), Point::new(300.0, 200.0)),
        ];
        for pair in vehicle.route.windows(2) {
            for &(a, b) in &blocked {
                let hits = (pair[0] == a && pair[1] == b) || (pair[0] == b && pair[1] == a);
                assert!(!hits, "route still crosses the blocked corridor");
            }
        }

        let stats = scenarios[0].statistics();
        assert_eq!(stats.edges_blocked, 2);
        // Every vehicle was informed once; with no intersections in this
        // world, the message tally equals the vehicle tally.
        assert_eq!(stats.vehicles_redirected, 3);
        assert_eq!(stats.congestion_messages_sent, 3);
    }

    #[test]
    fn active_incident_rebroadcasts_to_intersections() {
        let mut cfg = config(400.0, 400.0, 140.0);
        cfg.scenarios.incident = Some(IncidentConfig {
            start_time: 5.0,
            duration: 130.0,
            road_name: "long incident".into(),
            corridor: [Point::new(150.0, 200.0), Point::new(250.0, 200.0)],
        });
        let incident_cfg = cfg.scenarios.incident.clone().unwrap();

        let mut world = WorldBuilder::new(cfg)
            .intersection_at(Point::new(250.0, 250.0))
            .build()
            .unwrap();

        let mut scenarios: Vec<Box<dyn Scenario>> =
            vec![Box::new(IncidentScenario::new(incident_cfg))];
        world
            .run(&mut scenarios, &mut NoopObserver, &mut NoopMicrosim)
            .unwrap();

        let stats = scenarios[0].statistics();
        // Initial inform at t=5 reaches the one intersection, then the
        // 60 s reminder loop fires at t=65 and t=125; the incident resolves
        // at t=135, so no further rebroadcast.
        assert_eq!(stats.congestion_messages_sent, 3);
        // No vehicles in this world: nothing to redirect.
        assert_eq!(stats.vehicles_redirected, 0);
        assert_eq!(stats.edges_blocked, 2);
    }

    #[test]
    fn blockage_restores_after_duration() {
        let mut cfg = config(400.0, 400.0, 30.0);
        cfg.scenarios.incident = Some(IncidentConfig {
            start_time: 5.0,
            duration: 10.0,
            road_name: "short incident".into(),
            corridor: [Point::new(150.0, 200.0), Point::new(250.0, 200.0)],
        });
        let incident_cfg = cfg.scenarios.incident.clone().unwrap();

        let mut world = WorldBuilder::new(cfg).build().unwrap();
        let mut scenarios: Vec<Box<dyn Scenario>> =
            vec![Box::new(IncidentScenario::new(incident_cfg))];
        world
            .run(&mut scenarios, &mut NoopObserver, &mut NoopMicrosim)
            .unwrap();

        // Expiry was start + duration = 15 s; by run end (30 s) all edges
        // are back.
        assert!(world.graph.blocked_edges().is_empty());
        let a = world.graph.nearest_node(Point::new(100.0, 200.0)).unwrap();
        let b = world.graph.nearest_node(Point::new(200.0, 200.0)).unwrap();
        assert!(world.graph.has_edge(a, b));
    }
}

// ── Rush hour ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod rush_hour {
    use mats_core::config::{RushHourConfig, ZoneConfig};
    use mats_core::Point;

    use super::helpers::config;
    use crate::{NoopMicrosim, NoopObserver, RushHourScenario, Scenario, WorldBuilder};

    #[test]
    fn demand_wave_spawns_vehicles_from_zones() {
        let cfg = config(1_000.0, 1_000.0, 60.0);
        let rush = RushHourConfig {
            start_time: 0.0,
            duration: 60.0,
            generation_rate: 0.5,
            origin_zones: vec![
                ZoneConfig {
                    name: "A".into(),
                    weight: 0.5,
                    center: Point::new(100.0, 900.0),
                    spread: 80.0,
                },
                ZoneConfig {
                    name: "B".into(),
                    weight: 0.5,
                    center: Point::new(900.0, 900.0),
                    spread: 80.0,
                },
            ],
            destination_zones: vec![ZoneConfig {
                name: "C".into(),
                weight: 1.0,
                center: Point::new(500.0, 100.0),
                spread: 80.0,
            }],
        };

        let mut world = WorldBuilder::new(cfg).build().unwrap();
        let mut scenarios: Vec<Box<dyn Scenario>> =
            vec![Box::new(RushHourScenario::new(rush))];
        world
            .run(&mut scenarios, &mut NoopObserver, &mut NoopMicrosim)
            .unwrap();

        let stats = scenarios[0].statistics();
        assert!(stats.vehicles_created > 0);
        assert_eq!(world.total_vehicles_created as u32, stats.vehicles_created);

        // Spawned vehicles originate inside the configured zones.
        for v in world.vehicles() {
            assert!(v.origin.y > 700.0, "origin {} outside zones A/B", v.origin);
        }
    }
}

// ── Scheduler properties ──────────────────────────────────────────────────────

#[cfg(test)]
mod scheduler {
    use mats_core::{Point, Tick, VehicleType};

    use super::helpers::config;
    use crate::{
        KpiSnapshot, NoopMicrosim, SimObserver, World, WorldBuilder,
    };

    #[test]
    fn same_seed_reproduces_the_run() {
        let build = || {
            let mut cfg = config(600.0, 600.0, 40.0);
            cfg.num_vehicles = 12;
            World::from_config(cfg).unwrap()
        };

        let mut a = build();
        let mut b = build();
        for _ in 0..40 {
            a.step();
            b.step();
        }

        assert_eq!(a.total_vehicles_arrived, b.total_vehicles_arrived);
        assert_eq!(a.bus.stats().total_messages, b.bus.stats().total_messages);
        let positions_a: Vec<Point> = a.vehicles().map(|v| v.position).collect();
        let positions_b: Vec<Point> = b.vehicles().map(|v| v.position).collect();
        assert_eq!(positions_a, positions_b);
    }

    #[test]
    fn observer_sees_every_tick_and_kpi_cadence() {
        struct Counting {
            ticks: u64,
            kpis: Vec<KpiSnapshot>,
            ended: bool,
        }
        impl SimObserver for Counting {
            fn on_tick_end(&mut self, _tick: Tick, _world: &World) {
                self.ticks += 1;
            }
            fn on_kpi_snapshot(&mut self, snapshot: &KpiSnapshot) {
                self.kpis.push(snapshot.clone());
            }
            fn on_sim_end(&mut self, _world: &World) {
                self.ended = true;
            }
        }

        let mut cfg = config(400.0, 400.0, 30.0);
        cfg.num_vehicles = 3;
        cfg.kpi_interval = 10;
        let mut world = World::from_config(cfg).unwrap();

        let mut observer = Counting { ticks: 0, kpis: Vec::new(), ended: false };
        world
            .run(&mut [], &mut observer, &mut NoopMicrosim)
            .unwrap();

        assert_eq!(observer.ticks, 30);
        // Snapshots at ticks 0, 10, 20.
        assert_eq!(observer.kpis.len(), 3);
        assert!(observer.ended);
        for kpi in &observer.kpis {
            assert!((0.0..=1.0).contains(&kpi.congestion_level));
        }
        assert_eq!(world.kpi_history.len(), 3);
    }

    #[test]
    fn microsim_hook_receives_world_state() {
        use crate::{MicrosimLink, PhaseSync, VehicleSync};
        use mats_core::NodeId;

        #[derive(Default)]
        struct Recording {
            vehicle_batches: u32,
            phase_batches: u32,
            steps: u32,
            last_vehicle_count: usize,
        }
        impl MicrosimLink for Recording {
            fn sync_vehicles(&mut self, vehicles: &[VehicleSync]) {
                self.vehicle_batches += 1;
                self.last_vehicle_count = vehicles.len();
            }
            fn sync_phases(&mut self, phases: &[PhaseSync]) {
                self.phase_batches += 1;
                assert!(!phases.is_empty());
            }
            fn sync_blockages(&mut self, _blocked: &[(NodeId, NodeId)]) {}
            fn step_once(&mut self) {
                self.steps += 1;
            }
        }

        let mut cfg = config(600.0, 600.0, 5.0);
        cfg.num_vehicles = 4;
        let mut world = World::from_config(cfg).unwrap();

        let mut link = Recording::default();
        world
            .run(&mut [], &mut crate::NoopObserver, &mut link)
            .unwrap();

        assert_eq!(link.steps, 5);
        assert_eq!(link.vehicle_batches, 5);
        assert_eq!(link.phase_batches, 5);
        assert!(link.last_vehicle_count <= 4);
    }

    #[test]
    fn arrived_vehicles_become_unknown_recipients() {
        let mut cfg = config(200.0, 200.0, 10.0);
        cfg.vehicle.max_speed = 10.0;
        let mut world = WorldBuilder::new(cfg).build().unwrap();
        // Spawn already at its destination: deactivates on the first cycle.
        let id = world.spawn_vehicle(
            VehicleType::Standard,
            Point::new(198.0, 200.0),
            Point::new(200.0, 200.0),
        );
        world.step();
        assert!(!world.agent(id).unwrap().as_vehicle().unwrap().state.active);
        assert_eq!(world.total_vehicles_arrived, 1);
    }
}
