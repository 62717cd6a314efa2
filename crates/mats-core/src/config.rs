//! Top-level simulation configuration.
//!
//! Typically deserialized from a JSON file by the application binary and
//! handed to the world builder.  Every field has a serde default so partial
//! configs stay valid; [`SimConfig::validate`] rejects the combinations the
//! scheduler cannot start from.

use serde::Deserialize;

use crate::error::{CoreError, CoreResult};
use crate::geo::Point;

/// Route computation algorithm selection.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize)]
pub enum RoutingAlgorithm {
    #[serde(rename = "A_STAR")]
    AStar,
    #[serde(rename = "DIJKSTRA")]
    Dijkstra,
}

/// Traffic-light phase selection policy.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize)]
pub enum SignalAlgorithm {
    #[serde(rename = "MAX_PRESSURE")]
    MaxPressure,
    #[serde(rename = "Q_LEARNING")]
    QLearning,
}

/// Spatial extent of the simulated area and the road-grid resolution.
#[derive(Clone, Debug, Deserialize)]
pub struct EnvironmentConfig {
    /// East-west extent in metres.
    pub width: f32,
    /// North-south extent in metres.
    pub height: f32,
    /// Road-grid node spacing in metres.
    pub cell_size: f32,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self { width: 5_000.0, height: 5_000.0, cell_size: 100.0 }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct AlgorithmsConfig {
    #[serde(default = "default_routing")]
    pub routing: RoutingAlgorithm,
    #[serde(default = "default_signal")]
    pub traffic_light: SignalAlgorithm,
}

fn default_routing() -> RoutingAlgorithm {
    RoutingAlgorithm::AStar
}

fn default_signal() -> SignalAlgorithm {
    SignalAlgorithm::MaxPressure
}

impl Default for AlgorithmsConfig {
    fn default() -> Self {
        Self { routing: default_routing(), traffic_light: default_signal() }
    }
}

/// Default free-flow speed for standard vehicles (overridable per config;
/// priority classes keep their type-specific limits).
#[derive(Clone, Debug, Deserialize)]
pub struct VehicleConfig {
    pub max_speed: f32,
}

impl Default for VehicleConfig {
    fn default() -> Self {
        Self { max_speed: 13.89 }
    }
}

// ── Scenario configs ──────────────────────────────────────────────────────────

/// A weighted rectangular origin/destination zone.
#[derive(Clone, Debug, Deserialize)]
pub struct ZoneConfig {
    pub name: String,
    pub weight: f32,
    /// Zone centre in the city frame.
    pub center: Point,
    /// Half-extent of the uniform sampling square around the centre, metres.
    #[serde(default = "default_zone_spread")]
    pub spread: f32,
}

fn default_zone_spread() -> f32 {
    300.0
}

/// Morning-peak demand wave: traffic from the origin zones toward the
/// destination zones, modulated by a bell curve over the window.
#[derive(Clone, Debug, Deserialize)]
pub struct RushHourConfig {
    /// Simulated seconds at which the wave begins.
    pub start_time: f32,
    /// Length of the wave in simulated seconds.
    pub duration: f32,
    /// Peak vehicle-generation rate, vehicles per simulated second.
    #[serde(default = "default_generation_rate")]
    pub generation_rate: f32,
    pub origin_zones: Vec<ZoneConfig>,
    pub destination_zones: Vec<ZoneConfig>,
}

fn default_generation_rate() -> f32 {
    0.5
}

/// A localized blockage of a named corridor, with automatic restoration.
#[derive(Clone, Debug, Deserialize)]
pub struct IncidentConfig {
    /// Simulated seconds at which the corridor is blocked.
    pub start_time: f32,
    /// Seconds until the blockage expires.
    pub duration: f32,
    /// Human-readable name of the blocked corridor, for logs and reports.
    #[serde(default)]
    pub road_name: String,
    /// Two endpoints approximating the corridor; every edge whose endpoints
    /// both fall within 50 m of the segment's bounding box is blocked.
    pub corridor: [Point; 2],
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ScenariosConfig {
    #[serde(default)]
    pub rush_hour: Option<RushHourConfig>,
    #[serde(default)]
    pub incident: Option<IncidentConfig>,
}

// ── SimConfig ─────────────────────────────────────────────────────────────────

/// Everything the core consumes from the configuration input.
#[derive(Clone, Debug, Deserialize)]
pub struct SimConfig {
    /// Simulated seconds per tick.
    #[serde(default = "default_time_step")]
    pub time_step: f32,
    /// Total simulated seconds to run.
    pub duration: f32,
    /// Vehicles created up-front at world construction.
    #[serde(default)]
    pub num_vehicles: u32,
    /// Master RNG seed.  The same seed always produces identical results.
    #[serde(default = "default_seed")]
    pub random_seed: u64,
    #[serde(default)]
    pub environment: EnvironmentConfig,
    #[serde(default)]
    pub algorithms: AlgorithmsConfig,
    #[serde(default)]
    pub scenarios: ScenariosConfig,
    #[serde(default)]
    pub vehicle: VehicleConfig,
    /// Record a KPI snapshot every N ticks.
    #[serde(default = "default_kpi_interval")]
    pub kpi_interval: u64,
}

fn default_time_step() -> f32 {
    1.0
}

fn default_seed() -> u64 {
    42
}

fn default_kpi_interval() -> u64 {
    10
}

impl SimConfig {
    /// Total ticks the run spans.
    #[inline]
    pub fn total_ticks(&self) -> u64 {
        (self.duration / self.time_step).ceil() as u64
    }

    /// Reject configurations the scheduler cannot start from.  This is the
    /// only place initialization is allowed to abort.
    pub fn validate(&self) -> CoreResult<()> {
        if self.time_step <= 0.0 {
            return Err(CoreError::Config("time_step must be positive".into()));
        }
        if self.duration <= 0.0 {
            return Err(CoreError::Config("duration must be positive".into()));
        }
        if self.environment.cell_size <= 0.0
            || self.environment.width < self.environment.cell_size
            || self.environment.height < self.environment.cell_size
        {
            return Err(CoreError::Config(
                "environment extent must cover at least one grid cell".into(),
            ));
        }
        if self.vehicle.max_speed <= 0.0 {
            return Err(CoreError::Config("vehicle.max_speed must be positive".into()));
        }
        Ok(())
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            time_step: default_time_step(),
            duration: 3_600.0,
            num_vehicles: 0,
            random_seed: default_seed(),
            environment: EnvironmentConfig::default(),
            algorithms: AlgorithmsConfig::default(),
            scenarios: ScenariosConfig::default(),
            vehicle: VehicleConfig::default(),
            kpi_interval: default_kpi_interval(),
        }
    }
}
