//! HTTP client for the drone server and the central server.

use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;

use flock_core::{
    Anomaly, Command, CommandRef, Datastream, Drone, DroneLog, HttpApiLog, Position,
};

use crate::wire;

/// Failure talking to either server. The simulation treats every
/// variant as transient: log, skip, retry next cycle.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("http transport error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected response status: {0}")]
    Status(StatusCode),
    #[error("response missing a usable Location header")]
    MissingLocation,
    #[error("malformed payload: {0}")]
    Payload(#[from] serde_json::Error),
}

/// The only seam through which the simulation touches the network.
///
/// The per-cycle state machine is generic over this trait; tests swap
/// in an in-memory implementation.
#[allow(async_fn_in_trait)]
pub trait Gateway {
    /// Fetch the drone record from the local drone server.
    async fn get_drone(&self) -> Result<Drone, GatewayError>;
    /// Replace the drone record on the local drone server.
    async fn update_drone(&self, drone: &Drone) -> Result<(), GatewayError>;
    /// Replace the drone record at the central server.
    async fn update_drone_remote(&self, drone: &Drone, id: i64) -> Result<(), GatewayError>;
    /// Register the drone centrally; returns the assigned id.
    async fn register_drone(&self, drone: &Drone) -> Result<i64, GatewayError>;
    /// Remove a stale central drone record.
    async fn deregister_drone(&self, id: i64) -> Result<(), GatewayError>;

    /// List queued command references on the drone server.
    async fn get_commands(&self) -> Result<Vec<CommandRef>, GatewayError>;
    async fn get_command(&self, id: i64) -> Result<Command, GatewayError>;
    async fn delete_command(&self, id: i64) -> Result<(), GatewayError>;

    /// The anomaly currently assigned to this drone, if any.
    async fn get_anomaly(&self) -> Result<Option<Anomaly>, GatewayError>;
    /// Report a fresh anomaly to the central server; returns the assigned id.
    async fn add_anomaly(&self, anomaly: &Anomaly) -> Result<i64, GatewayError>;
    async fn update_anomaly_local(&self, anomaly: &Anomaly) -> Result<(), GatewayError>;
    async fn update_anomaly_remote(&self, anomaly: &Anomaly) -> Result<(), GatewayError>;

    /// Publish a sample to the central server.
    async fn add_datastream(&self, sample: &Datastream) -> Result<(), GatewayError>;
    /// Replace the sample held by the local drone server.
    async fn update_datastream(&self, sample: &Datastream) -> Result<(), GatewayError>;

    async fn send_drone_log(&self, log: &DroneLog) -> Result<(), GatewayError>;
    async fn send_http_api_log(&self, log: &HttpApiLog) -> Result<(), GatewayError>;

    /// Home point of the controller; seeds the operating boundary.
    async fn get_controller_location(&self) -> Result<Position, GatewayError>;
}

/// Connection settings for the two servers.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub drone_url: String,
    pub central_url: String,
    pub timeout: Duration,
}

/// [`Gateway`] implementation over two hydra-style HTTP APIs.
pub struct HttpGateway {
    client: Client,
    drone_url: String,
    central_url: String,
}

#[derive(Debug, Deserialize)]
struct ControllerLocation {
    #[serde(rename = "Location")]
    location: Position,
}

impl HttpGateway {
    pub fn new(config: GatewayConfig) -> Self {
        Self {
            client: Client::builder()
                .timeout(config.timeout)
                .build()
                .expect("Failed to create HTTP client"),
            drone_url: trim_base(config.drone_url),
            central_url: trim_base(config.central_url),
        }
    }

    fn drone_api(&self, path: &str) -> String {
        format!("{}/api/{}", self.drone_url, path)
    }

    fn central_api(&self, path: &str) -> String {
        format!("{}/api/{}", self.central_url, path)
    }

    async fn put_tagged<T: serde::Serialize>(
        &self,
        url: String,
        value: &T,
        type_name: &str,
    ) -> Result<Response, GatewayError> {
        let body = wire::tagged(value, type_name)?;
        let response = self.client.put(&url).json(&body).send().await?;
        ensure_success(response)
    }

    async fn post_tagged<T: serde::Serialize>(
        &self,
        url: String,
        value: &T,
        type_name: &str,
    ) -> Result<Response, GatewayError> {
        let body = wire::tagged(value, type_name)?;
        let response = self.client.post(&url).json(&body).send().await?;
        ensure_success(response)
    }
}

fn trim_base(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

fn ensure_success(response: Response) -> Result<Response, GatewayError> {
    if response.status().is_success() {
        Ok(response)
    } else {
        Err(GatewayError::Status(response.status()))
    }
}

/// Assigned resource id from a creation response's Location header.
fn location_id(response: &Response) -> Result<i64, GatewayError> {
    response
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .and_then(wire::id_suffix)
        .ok_or(GatewayError::MissingLocation)
}

impl Gateway for HttpGateway {
    async fn get_drone(&self) -> Result<Drone, GatewayError> {
        let response = self.client.get(self.drone_api("Drone")).send().await?;
        Ok(ensure_success(response)?.json().await?)
    }

    async fn update_drone(&self, drone: &Drone) -> Result<(), GatewayError> {
        self.put_tagged(self.drone_api("Drone"), drone, "Drone")
            .await?;
        Ok(())
    }

    async fn update_drone_remote(&self, drone: &Drone, id: i64) -> Result<(), GatewayError> {
        self.put_tagged(
            self.central_api(&format!("DroneCollection/{id}")),
            drone,
            "Drone",
        )
        .await?;
        Ok(())
    }

    async fn register_drone(&self, drone: &Drone) -> Result<i64, GatewayError> {
        let response = self
            .post_tagged(self.central_api("DroneCollection"), drone, "Drone")
            .await?;
        let id = location_id(&response)?;
        tracing::debug!(drone_id = id, "central server assigned drone id");
        Ok(id)
    }

    async fn deregister_drone(&self, id: i64) -> Result<(), GatewayError> {
        let response = self
            .client
            .delete(self.central_api(&format!("DroneCollection/{id}")))
            .send()
            .await?;
        ensure_success(response)?;
        Ok(())
    }

    async fn get_commands(&self) -> Result<Vec<CommandRef>, GatewayError> {
        let response = self
            .client
            .get(self.drone_api("CommandCollection"))
            .send()
            .await?;
        Ok(ensure_success(response)?.json().await?)
    }

    async fn get_command(&self, id: i64) -> Result<Command, GatewayError> {
        let response = self
            .client
            .get(self.drone_api(&format!("CommandCollection/{id}")))
            .send()
            .await?;
        Ok(ensure_success(response)?.json().await?)
    }

    async fn delete_command(&self, id: i64) -> Result<(), GatewayError> {
        let response = self
            .client
            .delete(self.drone_api(&format!("CommandCollection/{id}")))
            .send()
            .await?;
        ensure_success(response)?;
        Ok(())
    }

    async fn get_anomaly(&self) -> Result<Option<Anomaly>, GatewayError> {
        let response = self.client.get(self.drone_api("Anomaly")).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            tracing::debug!("no anomaly assigned");
            return Ok(None);
        }
        Ok(Some(ensure_success(response)?.json().await?))
    }

    async fn add_anomaly(&self, anomaly: &Anomaly) -> Result<i64, GatewayError> {
        let response = self
            .post_tagged(self.central_api("AnomalyCollection"), anomaly, "Anomaly")
            .await?;
        location_id(&response)
    }

    async fn update_anomaly_local(&self, anomaly: &Anomaly) -> Result<(), GatewayError> {
        self.put_tagged(self.drone_api("Anomaly"), anomaly, "Anomaly")
            .await?;
        Ok(())
    }

    async fn update_anomaly_remote(&self, anomaly: &Anomaly) -> Result<(), GatewayError> {
        self.put_tagged(
            self.central_api(&format!("AnomalyCollection/{}", anomaly.id)),
            anomaly,
            "Anomaly",
        )
        .await?;
        Ok(())
    }

    async fn add_datastream(&self, sample: &Datastream) -> Result<(), GatewayError> {
        self.post_tagged(
            self.central_api("DatastreamCollection"),
            sample,
            "Datastream",
        )
        .await?;
        Ok(())
    }

    async fn update_datastream(&self, sample: &Datastream) -> Result<(), GatewayError> {
        self.put_tagged(self.drone_api("Datastream"), sample, "Datastream")
            .await?;
        Ok(())
    }

    async fn send_drone_log(&self, log: &DroneLog) -> Result<(), GatewayError> {
        self.post_tagged(self.central_api("DroneLogCollection"), log, "DroneLog")
            .await?;
        Ok(())
    }

    async fn send_http_api_log(&self, log: &HttpApiLog) -> Result<(), GatewayError> {
        self.post_tagged(
            self.central_api("HttpApiLogCollection"),
            log,
            "HttpApiLog",
        )
        .await?;
        Ok(())
    }

    async fn get_controller_location(&self) -> Result<Position, GatewayError> {
        let response = self.client.get(self.central_api("Location")).send().await?;
        let payload: ControllerLocation = ensure_success(response)?.json().await?;
        Ok(payload.location)
    }
}
