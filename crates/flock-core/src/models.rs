//! Core data models for the drone simulation.
//!
//! Field renames match the wire vocabulary of the hypermedia servers
//! (`DroneID`, `MaxSpeed`, ...) so the gateway only has to add and
//! strip the JSON-LD envelope.

use chrono::{DateTime, Utc};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Placeholder id for a drone that has not yet registered centrally.
pub const SENTINEL_DRONE_ID: i64 = -1000;

/// Placeholder id for an anomaly the remote store has not assigned yet.
pub const SENTINEL_ANOMALY_ID: i64 = -1;

/// A latitude/longitude pair in decimal degrees.
///
/// Serializes as the wire's `"lat,lon"` string.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub lat: f64,
    pub lon: f64,
}

impl Position {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lat, self.lon)
    }
}

impl FromStr for Position {
    type Err = InvalidPosition;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (lat, lon) = s
            .split_once(',')
            .ok_or_else(|| InvalidPosition(s.to_string()))?;
        let lat = lat
            .trim()
            .parse()
            .map_err(|_| InvalidPosition(s.to_string()))?;
        let lon = lon
            .trim()
            .parse()
            .map_err(|_| InvalidPosition(s.to_string()))?;
        Ok(Self { lat, lon })
    }
}

impl Serialize for Position {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Position {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

#[derive(Debug, Error)]
#[error("not a valid \"lat,lon\" position: {0:?}")]
pub struct InvalidPosition(pub String);

/// Compass direction of travel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    #[serde(rename = "N")]
    North,
    #[serde(rename = "E")]
    East,
    #[serde(rename = "S")]
    South,
    #[serde(rename = "W")]
    West,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::North => "N",
            Direction::East => "E",
            Direction::South => "S",
            Direction::West => "W",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = InvalidDirection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "N" => Ok(Direction::North),
            "E" => Ok(Direction::East),
            "S" => Ok(Direction::South),
            "W" => Ok(Direction::West),
            other => Err(InvalidDirection(other.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("not a valid direction of movement (use one of N, E, S, W): {0:?}")]
pub struct InvalidDirection(pub String);

/// Operating mode of the drone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    /// Normal patrol and sensing
    Active,
    /// Battery low, returning home to charge
    Inactive,
    /// Docked at the controller location
    Charging,
    /// Investigating an anomaly
    Confirming,
    /// Battery critical, inert except for command handling
    Off,
}

/// Mutable per-cycle state embedded in a [`Drone`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DroneState {
    #[serde(rename = "Speed")]
    pub speed: f64,
    #[serde(rename = "Position")]
    pub position: Position,
    #[serde(rename = "Battery")]
    pub battery: f64,
    #[serde(rename = "Direction")]
    pub direction: Direction,
    #[serde(rename = "Status")]
    pub mode: Mode,
}

/// A registered drone and its current state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Drone {
    #[serde(rename = "DroneID")]
    pub id: i64,
    pub name: String,
    pub model: String,
    #[serde(rename = "MaxSpeed")]
    pub max_speed: f64,
    #[serde(rename = "Sensor")]
    pub sensor: String,
    #[serde(rename = "DroneState")]
    pub state: DroneState,
}

impl Drone {
    /// Default record used before central registration assigns a real id.
    /// Speeds are in km/h.
    pub fn default_record() -> Self {
        Self {
            id: SENTINEL_DRONE_ID,
            name: "Drone 1".to_string(),
            model: "xyz".to_string(),
            max_speed: 130.0,
            sensor: "Temperature".to_string(),
            state: DroneState {
                speed: 100.0,
                position: Position::new(0.0, 0.0),
                battery: 100.0,
                direction: Direction::North,
                mode: Mode::Active,
            },
        }
    }
}

/// Hypermedia reference to a queued command, e.g.
/// `/api/CommandCollection/12`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandRef {
    #[serde(rename = "@id")]
    pub id: String,
}

/// A state override issued to a drone through the drone server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    #[serde(rename = "DroneID")]
    pub drone_id: i64,
    #[serde(rename = "State")]
    pub state: DroneState,
}

/// Confirmation status of an anomaly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnomalyStatus {
    /// Freshly reported, awaiting assignment
    ToBeConfirmed,
    /// A drone has been dispatched to investigate
    Confirming,
    /// Investigated and confirmed real
    Positive,
    /// Investigated and found spurious
    Negative,
    /// Acknowledged by the controller, terminal
    Confirmed,
}

impl AnomalyStatus {
    /// Terminal statuses end the owning drone's involvement.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AnomalyStatus::Positive | AnomalyStatus::Negative | AnomalyStatus::Confirmed
        )
    }
}

/// A sensor reading of interest requiring physical investigation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    #[serde(rename = "Location")]
    pub location: Position,
    #[serde(rename = "DroneID")]
    pub drone_id: i64,
    #[serde(rename = "Status")]
    pub status: AnomalyStatus,
    /// Assigned by the remote store after creation.
    #[serde(rename = "AnomalyID", default = "sentinel_anomaly_id")]
    pub id: i64,
}

fn sentinel_anomaly_id() -> i64 {
    SENTINEL_ANOMALY_ID
}

impl Anomaly {
    /// A freshly detected anomaly, not yet known to the remote store.
    pub fn detected(location: Position, drone_id: i64) -> Self {
        Self {
            location,
            drone_id,
            status: AnomalyStatus::ToBeConfirmed,
            id: SENTINEL_ANOMALY_ID,
        }
    }
}

/// One sensor sample emitted per Active cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Datastream {
    #[serde(rename = "Temperature")]
    pub temperature: i64,
    #[serde(rename = "Position")]
    pub position: Position,
    #[serde(rename = "DroneID")]
    pub drone_id: i64,
}

/// Append-only audit record describing a drone state transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DroneLog {
    #[serde(rename = "DroneID")]
    pub drone_id: String,
    #[serde(rename = "LogString")]
    pub log_string: String,
    #[serde(rename = "Timestamp")]
    pub timestamp: DateTime<Utc>,
}

impl DroneLog {
    pub fn new(drone_id: i64, message: impl Into<String>) -> Self {
        Self {
            drone_id: format!("Drone {}", drone_id),
            log_string: message.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Append-only audit record describing an outbound API call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpApiLog {
    #[serde(rename = "Subject")]
    pub subject: String,
    #[serde(rename = "Predicate")]
    pub predicate: String,
    #[serde(rename = "Object")]
    pub object: String,
    #[serde(rename = "Timestamp")]
    pub timestamp: DateTime<Utc>,
}

impl HttpApiLog {
    pub fn new(
        drone_id: i64,
        predicate: impl Into<String>,
        object: impl Into<String>,
    ) -> Self {
        Self {
            subject: format!("Drone {}", drone_id),
            predicate: predicate.into(),
            object: object.into(),
            timestamp: Utc::now(),
        }
    }
}
