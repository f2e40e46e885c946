//! The fixed-interval simulation cycle.
//!
//! One cycle reads the drone record, reconciles external commands,
//! runs the mode-specific behavior, steps the battery model, moves the
//! drone, and persists the result to both servers. Gateway failures
//! inside a cycle are logged and downgraded; only a failure to fetch
//! the drone record aborts the cycle, and the next one is scheduled
//! either way.

use tokio::time::{interval, MissedTickBehavior};

use rand::seq::SliceRandom;
use rand::Rng;

use flock_core::{
    battery::{self, BatteryEvent},
    detect, geo, Bounds, Datastream, Direction, Drone, DroneLog, HttpApiLog, Mode, Position,
    SENTINEL_DRONE_ID,
};
use flock_gateway::{Gateway, GatewayError};

use crate::commands;
use crate::config::SimConfig;

const NORMAL_SENSOR_RANGE: std::ops::Range<i64> = 25..40;
const ABNORMAL_SENSOR_RANGE: std::ops::Range<i64> = 45..60;

/// Sensor reading in the normal band.
pub(crate) fn normal_reading() -> i64 {
    rand::rng().random_range(NORMAL_SENSOR_RANGE)
}

fn abnormal_reading() -> i64 {
    rand::rng().random_range(ABNORMAL_SENSOR_RANGE)
}

/// Per-drone simulation state machine, generic over the gateway so
/// tests can run cycles against an in-memory backend.
pub struct Simulation<G: Gateway> {
    pub(crate) gateway: G,
    pub(crate) config: SimConfig,
    /// Controller home point: charging destination and boundary center.
    pub(crate) home: Position,
    pub(crate) bounds: Bounds,
}

impl<G: Gateway> Simulation<G> {
    pub fn new(gateway: G, config: SimConfig, home: Position) -> Self {
        let bounds = Bounds::around(home, config.boundary_km);
        Self {
            gateway,
            config,
            home,
            bounds,
        }
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Run cycles forever. The ticker re-arms only after the current
    /// cycle finishes, so cycles never overlap, and a failed cycle
    /// never stops the loop.
    pub async fn run(&mut self) {
        let mut ticker = interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if let Err(err) = self.run_cycle().await {
                tracing::warn!("cycle aborted: {err}");
            }
        }
    }

    /// One pass of the state machine.
    pub async fn run_cycle(&mut self) -> Result<(), GatewayError> {
        let mut drone = self.gateway.get_drone().await?;
        let mut sample = None;

        // Commands apply in any mode, Off included.
        self.reconcile_commands(&mut drone).await;

        if drone.state.mode != Mode::Off {
            if drone.state.mode == Mode::Active {
                if let Some(anomaly) = self.fetch_anomaly().await {
                    if anomaly.status == flock_core::AnomalyStatus::Confirming {
                        tracing::info!(anomaly_id = anomaly.id, "assigned anomaly, confirming");
                        drone.state.mode = Mode::Confirming;
                    }
                }
            }

            match drone.state.mode {
                Mode::Confirming => self.handle_anomaly(&mut drone).await,
                Mode::Inactive => self.head_home(&mut drone).await,
                Mode::Active => sample = Some(self.sense(&mut drone).await),
                Mode::Charging | Mode::Off => {}
            }

            if let Some(event) = battery::step(&mut drone.state) {
                self.log_battery_event(&drone, event).await;
            }

            self.advance_position(&mut drone).await;
        }

        self.persist(&drone, sample.as_ref()).await;
        Ok(())
    }

    /// Execute the latest queued command and drain the backlog.
    async fn reconcile_commands(&self, drone: &mut Drone) {
        let refs = match self.gateway.get_commands().await {
            Ok(refs) => refs,
            Err(err) => {
                tracing::debug!("command fetch failed: {err}");
                return;
            }
        };

        let ids = commands::parse_ids(&refs);
        let Some(latest_id) = commands::latest(&ids) else {
            return;
        };

        match self.gateway.get_command(latest_id).await {
            Ok(command) => {
                self.drone_log(
                    drone.id,
                    format!("executing command with id {latest_id}"),
                )
                .await;
                if commands::apply(&command, drone) {
                    self.drone_log(
                        drone.id,
                        format!(
                            "changed speed to {} and direction to {} after command execution",
                            drone.state.speed, drone.state.direction
                        ),
                    )
                    .await;
                    tracing::info!(command_id = latest_id, "command executed");
                } else {
                    tracing::debug!(
                        command_id = latest_id,
                        drone_id = command.drone_id,
                        "command addressed to another drone, ignoring"
                    );
                }
            }
            Err(err) => tracing::debug!(command_id = latest_id, "command fetch failed: {err}"),
        }

        // Drain everything, examined or not. At most one command
        // survives to be applied per cycle.
        for id in ids {
            if let Err(err) = self.gateway.delete_command(id).await {
                tracing::debug!(command_id = id, "command delete failed: {err}");
            }
        }
    }

    /// Active-mode sensing: maybe raise an anomaly, always produce one
    /// datastream sample.
    async fn sense(&self, drone: &mut Drone) -> Datastream {
        let raised = detect::roll(
            drone.state.position,
            &self.config.detection,
            &mut rand::rng(),
        );

        let temperature = if raised {
            self.raise_anomaly(drone).await;
            abnormal_reading()
        } else {
            normal_reading()
        };

        Datastream {
            temperature,
            position: drone.state.position,
            drone_id: drone.id,
        }
    }

    /// Inactive-mode behavior: fly home, dock once arrived.
    async fn head_home(&self, drone: &mut Drone) {
        if geo::reached_destination(&drone.state, self.home, self.config.interval.as_secs()) {
            drone.state.mode = Mode::Charging;
            self.drone_log(drone.id, "reached central controller, charging.".to_string())
                .await;
            return;
        }

        let new_direction = geo::bearing(drone.state.position, self.home);
        if new_direction != drone.state.direction {
            drone.state.direction = new_direction;
            self.drone_log(drone.id, format!("changed direction to {new_direction}"))
                .await;
        }
    }

    /// Move the drone one cycle's worth of distance in its current
    /// direction, bouncing off the operating boundary if needed.
    async fn advance_position(&self, drone: &mut Drone) {
        if matches!(drone.state.mode, Mode::Charging | Mode::Off) {
            return;
        }

        let distance_km = drone.state.speed * self.config.interval.as_secs() as f64 / 3600.0;
        let previous_direction = drone.state.direction;

        let next = geo::offset(drone.state.position, distance_km, drone.state.direction);
        if self.bounds.contains(next) {
            drone.state.position = next;
        } else {
            // Bounded search over the other compass directions; if every
            // candidate leaves the boundary, stay in place.
            let mut candidates: Vec<Direction> = Direction::ALL
                .into_iter()
                .filter(|d| *d != previous_direction)
                .collect();
            candidates.shuffle(&mut rand::rng());

            for candidate in candidates {
                let next = geo::offset(drone.state.position, distance_km, candidate);
                if self.bounds.contains(next) {
                    drone.state.position = next;
                    drone.state.direction = candidate;
                    break;
                }
            }
        }

        if drone.state.direction != previous_direction {
            self.drone_log(
                drone.id,
                format!("changed direction to {}", drone.state.direction),
            )
            .await;
        }
    }

    async fn log_battery_event(&self, drone: &Drone, event: BatteryEvent) {
        let message = match event {
            BatteryEvent::LowBattery { remaining } => {
                format!("battery Low {remaining}, changing to Inactive state")
            }
            BatteryEvent::CriticalShutdown => "Battery level critical, shutting down!".to_string(),
            BatteryEvent::ChargeComplete => {
                "charging complete, returning to Active state".to_string()
            }
        };
        self.drone_log(drone.id, message).await;
    }

    /// Persist the updated record locally and centrally, plus the
    /// cycle's datastream sample when one was produced.
    async fn persist(&self, drone: &Drone, sample: Option<&Datastream>) {
        if let Err(err) = self.gateway.update_drone(drone).await {
            tracing::warn!("local drone update failed: {err}");
        }

        if drone.id != SENTINEL_DRONE_ID {
            if let Err(err) = self.gateway.update_drone_remote(drone, drone.id).await {
                tracing::warn!("central drone update failed: {err}");
            }
        }

        if let Some(sample) = sample {
            if let Err(err) = self.gateway.add_datastream(sample).await {
                tracing::warn!("central datastream post failed: {err}");
            } else {
                self.api_log(drone.id, "PUT Datastream").await;
            }
            if let Err(err) = self.gateway.update_datastream(sample).await {
                tracing::debug!("local datastream update failed: {err}");
            }
        }
    }

    /// Best-effort audit log delivery: a DroneLog plus the HttpApiLog
    /// recording the call that carried it.
    pub(crate) async fn drone_log(&self, drone_id: i64, message: String) {
        let log = DroneLog::new(drone_id, message);
        if let Err(err) = self.gateway.send_drone_log(&log).await {
            tracing::debug!("drone log delivery failed: {err}");
            return;
        }
        self.api_log(drone_id, "PUT DroneLog").await;
    }

    pub(crate) async fn api_log(&self, drone_id: i64, predicate: &str) {
        let log = HttpApiLog::new(drone_id, predicate, "Controller");
        if let Err(err) = self.gateway.send_http_api_log(&log).await {
            tracing::debug!("http api log delivery failed: {err}");
        }
    }
}
