//! Grid-city demo: build a world from a JSON config, run the configured
//! scenarios, and write CSV output.
//!
//! ```text
//! grid [config.json] [output_dir]
//! ```
//!
//! With no arguments, a built-in rush-hour + incident configuration runs on
//! a 5 km × 5 km grid and writes into `./output`.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use log::info;

use mats_core::SimConfig;
use mats_output::{CsvRecorder, RecordingObserver, SimulationHeader};
use mats_sim::{IncidentScenario, NoopMicrosim, RushHourScenario, Scenario, World};

/// Fallback configuration when no file is given: an hour of rush-hour
/// traffic with a mid-run incident on the central north-south corridor.
const DEFAULT_CONFIG: &str = r#"{
    "time_step": 1.0,
    "duration": 3600.0,
    "num_vehicles": 50,
    "random_seed": 42,
    "environment": { "width": 5000.0, "height": 5000.0, "cell_size": 100.0 },
    "algorithms": { "routing": "A_STAR", "traffic_light": "MAX_PRESSURE" },
    "vehicle": { "max_speed": 13.89 },
    "scenarios": {
        "rush_hour": {
            "start_time": 0.0,
            "duration": 3600.0,
            "generation_rate": 0.5,
            "origin_zones": [
                { "name": "north-west", "weight": 0.5, "center": { "x": 500.0,  "y": 4500.0 } },
                { "name": "north-east", "weight": 0.5, "center": { "x": 4500.0, "y": 4500.0 } }
            ],
            "destination_zones": [
                { "name": "downtown", "weight": 1.0, "center": { "x": 2500.0, "y": 500.0 }, "spread": 200.0 }
            ]
        },
        "incident": {
            "start_time": 1800.0,
            "duration": 900.0,
            "road_name": "central bridge",
            "corridor": [ { "x": 2500.0, "y": 2000.0 }, { "x": 2500.0, "y": 2500.0 } ]
        }
    }
}"#;

fn main() -> Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let config_json = match args.next() {
        Some(path) => fs::read_to_string(&path).with_context(|| format!("reading {path}"))?,
        None => DEFAULT_CONFIG.to_owned(),
    };
    let output_dir = PathBuf::from(args.next().unwrap_or_else(|| "output".to_owned()));

    let config: SimConfig = serde_json::from_str(&config_json).context("parsing config")?;
    config.validate().context("validating config")?;
    fs::create_dir_all(&output_dir)?;

    // Scenarios come from the config; absent sections simply don't run.
    let mut scenarios: Vec<Box<dyn Scenario>> = Vec::new();
    if let Some(rush) = config.scenarios.rush_hour.clone() {
        scenarios.push(Box::new(RushHourScenario::new(rush)));
    }
    if let Some(incident) = config.scenarios.incident.clone() {
        scenarios.push(Box::new(IncidentScenario::new(incident)));
    }
    let scenario_names: Vec<&str> = scenarios.iter().map(|s| s.name()).collect();

    let header = SimulationHeader {
        id: format!("grid-{}", config.random_seed),
        name: "grid city".to_owned(),
        scenario: scenario_names.join(","),
        config: config_json.clone(),
    };
    let recorder = CsvRecorder::new(&output_dir)?;
    let mut observer = RecordingObserver::new(recorder, header);

    let mut world = World::from_config(config)?;
    info!(
        "running {} ticks over {} agents",
        world.config.total_ticks(),
        world.agent_count(),
    );
    world.run(&mut scenarios, &mut observer, &mut NoopMicrosim)?;

    if let Some(err) = observer.take_error() {
        eprintln!("warning: output incomplete: {err}");
    }

    // ── Run summary ───────────────────────────────────────────────────────
    let bus = world.bus.stats();
    let router = world.router_stats();
    let crisis = world.crisis_stats();
    println!("simulated {:.0} s", world.clock.now_secs());
    println!(
        "vehicles: {} created, {} arrived, {} still en route",
        world.total_vehicles_created,
        world.total_vehicles_arrived,
        world.active_vehicles().count(),
    );
    println!(
        "messages: {} routed ({} dropped), by performative {:?}",
        bus.total_messages,
        bus.dropped,
        bus.by_performative_named(),
    );
    println!(
        "routing: {} paths, cache hit rate {:.1}%",
        router.paths_calculated,
        router.hit_rate * 100.0,
    );
    println!(
        "crisis: {} interventions, {} green waves, {} incidents",
        crisis.interventions, crisis.green_waves_created, crisis.active_incidents,
    );
    for scenario in &scenarios {
        let stats = scenario.statistics();
        println!(
            "scenario {}: {} vehicles, {} edges blocked",
            stats.name, stats.vehicles_created, stats.edges_blocked,
        );
    }
    println!("output written to {}", output_dir.display());

    Ok(())
}
