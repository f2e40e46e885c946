//! Simulation configuration from CLI flags and environment.

use std::time::Duration;

use clap::Parser;
use flock_core::DetectionConfig;
use flock_gateway::GatewayConfig;

#[derive(Debug, Parser)]
#[command(name = "flock-sim", about = "Autonomous drone simulation loop")]
pub struct Args {
    /// Base URL of the drone's own server.
    #[arg(long, env = "FLOCK_DRONE_URL", default_value = "http://localhost:8081")]
    pub drone_url: String,

    /// Base URL of the central controller server.
    #[arg(long, env = "FLOCK_CENTRAL_URL", default_value = "http://localhost:8080")]
    pub central_url: String,

    /// Seconds between simulation cycles. A zero-period ticker is
    /// meaningless, so at least one second is required.
    #[arg(
        long,
        env = "FLOCK_INTERVAL_SECS",
        default_value_t = 15,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub interval_secs: u64,

    /// Half-width of the square operating boundary, in km, centered on
    /// the controller location.
    #[arg(long, env = "FLOCK_BOUNDARY_KM", default_value_t = 10.0)]
    pub boundary_km: f64,

    /// HTTP request timeout, in seconds.
    #[arg(long, default_value_t = 10)]
    pub timeout_secs: u64,

    /// Tile zoom level for anomaly detection.
    #[arg(long, default_value_t = 17)]
    pub detection_zoom: u32,

    /// Modulus of the deterministic tile gate (0 disables detection).
    #[arg(long, default_value_t = 35)]
    pub detection_modulus: i64,

    /// Probability of raising an anomaly on a hot tile.
    #[arg(long, default_value_t = 0.5)]
    pub detection_probability: f64,
}

/// Settings consumed by the cycle orchestrator.
#[derive(Debug, Clone)]
pub struct SimConfig {
    pub interval: Duration,
    pub boundary_km: f64,
    pub detection: DetectionConfig,
}

impl Args {
    pub fn gateway_config(&self) -> GatewayConfig {
        GatewayConfig {
            drone_url: self.drone_url.clone(),
            central_url: self.central_url.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }

    pub fn sim_config(&self) -> SimConfig {
        SimConfig {
            interval: Duration::from_secs(self.interval_secs),
            boundary_km: self.boundary_km,
            detection: DetectionConfig {
                zoom: self.detection_zoom,
                modulus: self.detection_modulus,
                probability: self.detection_probability,
            },
        }
    }
}
