//! Anomaly lifecycle: detection reporting, travel toward the target,
//! and on-site confirmation.
//!
//! The anomaly entity is shared with the controller: the drone raises
//! it, the controller flips its status to Confirming to dispatch the
//! drone, and the drone writes the terminal Positive/Negative outcome
//! back. Any connection failure here downgrades to "no anomaly this
//! cycle"; the fixed-interval loop retries naturally.

use flock_core::{detect, geo, Anomaly, AnomalyStatus, Drone, Mode};
use flock_gateway::Gateway;

use crate::cycle::Simulation;

impl<G: Gateway> Simulation<G> {
    /// The anomaly currently tracked for this drone, or `None` if
    /// there is none or the store is unreachable.
    pub(crate) async fn fetch_anomaly(&self) -> Option<Anomaly> {
        match self.gateway.get_anomaly().await {
            Ok(anomaly) => anomaly,
            Err(err) => {
                tracing::debug!("anomaly fetch failed: {err}");
                None
            }
        }
    }

    /// Report a freshly detected anomaly at the drone's position to
    /// the central store, then mirror it locally under the assigned id.
    pub(crate) async fn raise_anomaly(&self, drone: &Drone) {
        let mut anomaly = Anomaly::detected(drone.state.position, drone.id);

        match self.gateway.add_anomaly(&anomaly).await {
            Ok(id) => {
                anomaly.id = id;
                self.api_log(drone.id, "PUT Anomaly").await;
                self.drone_log(
                    drone.id,
                    format!("detected anomaly at {}", anomaly.location),
                )
                .await;
                if let Err(err) = self.gateway.update_anomaly_local(&anomaly).await {
                    tracing::debug!("local anomaly mirror failed: {err}");
                }
            }
            Err(err) => tracing::warn!("anomaly report failed: {err}"),
        }
    }

    /// Confirming-mode behavior: travel toward the anomaly, and once
    /// on site classify it and propagate the outcome.
    pub(crate) async fn handle_anomaly(&self, drone: &mut Drone) {
        // Absent or unreachable: stay in Confirming and retry next cycle.
        let Some(mut anomaly) = self.fetch_anomaly().await else {
            return;
        };

        if !geo::reached_destination(
            &drone.state,
            anomaly.location,
            self.config.interval.as_secs(),
        ) {
            let new_direction = geo::bearing(drone.state.position, anomaly.location);
            if new_direction != drone.state.direction {
                drone.state.direction = new_direction;
                self.drone_log(drone.id, format!("changed direction to {new_direction}"))
                    .await;
            }
            return;
        }

        self.drone_log(drone.id, "reached anomaly location, scanning".to_string())
            .await;

        // Same detection test, re-rolled at the anomaly's location.
        let confirmed = detect::roll(anomaly.location, &self.config.detection, &mut rand::rng());
        if confirmed {
            anomaly.status = AnomalyStatus::Positive;
            self.drone_log(drone.id, "detected POSITIVE anomaly.".to_string())
                .await;
        } else {
            anomaly.status = AnomalyStatus::Negative;
            self.drone_log(drone.id, "detected NEGATIVE anomaly.".to_string())
                .await;
        }

        // Local first; if the remote push fails the local copy is
        // still authoritative for this drone's view.
        if let Err(err) = self.gateway.update_anomaly_local(&anomaly).await {
            tracing::warn!("local anomaly update failed: {err}");
        }
        if let Err(err) = self.gateway.update_anomaly_remote(&anomaly).await {
            tracing::warn!("central anomaly update failed: {err}");
        } else {
            self.api_log(drone.id, "PUT Anomaly").await;
        }

        drone.state.mode = Mode::Active;
    }
}
