//! Drone initialization: local default record, central registration,
//! initial datastream.

use flock_core::{Datastream, Drone, SENTINEL_DRONE_ID};
use flock_gateway::{Gateway, GatewayError};

use crate::cycle;

/// Ensure the drone exists locally and is registered centrally.
///
/// A fresh drone starts as the default record with the sentinel id,
/// positioned at the controller location. A record surviving from an
/// earlier run is deregistered first, so every startup gets a fresh
/// central id; if the controller is unreachable the sentinel id is
/// kept and registration is retried on the next startup.
pub async fn init_drone<G: Gateway>(gateway: &G) -> Result<Drone, GatewayError> {
    let mut drone = match gateway.get_drone().await {
        Ok(drone) => {
            tracing::info!(drone_id = drone.id, "drone already initialized locally");
            drone
        }
        Err(err) => {
            tracing::debug!("no local drone record yet: {err}");
            let mut drone = Drone::default_record();
            drone.state.position = gateway.get_controller_location().await?;
            gateway.update_drone(&drone).await?;
            tracing::info!("drone initialized locally");
            drone
        }
    };

    if drone.id != SENTINEL_DRONE_ID {
        // The central record from the previous run is stale.
        if let Err(err) = gateway.deregister_drone(drone.id).await {
            tracing::debug!(drone_id = drone.id, "stale central record delete failed: {err}");
        }
        drone.id = SENTINEL_DRONE_ID;
    }

    match gateway.register_drone(&drone).await {
        Ok(id) => {
            drone.id = id;
            gateway.update_drone(&drone).await?;
            tracing::info!(drone_id = id, "registered with central server");
        }
        Err(err) => {
            gateway.update_drone(&drone).await?;
            tracing::warn!("central registration failed, keeping sentinel id: {err}");
        }
    }

    let sample = Datastream {
        temperature: cycle::normal_reading(),
        position: drone.state.position,
        drone_id: drone.id,
    };
    if let Err(err) = gateway.update_datastream(&sample).await {
        tracing::debug!("initial datastream update failed: {err}");
    }

    Ok(drone)
}
