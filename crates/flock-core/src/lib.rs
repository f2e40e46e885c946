pub mod battery;
pub mod detect;
pub mod geo;
pub mod models;

pub use battery::BatteryEvent;
pub use detect::DetectionConfig;
pub use geo::Bounds;
pub use models::{
    Anomaly, AnomalyStatus, Command, CommandRef, Datastream, Direction, Drone, DroneLog,
    DroneState, HttpApiLog, Mode, Position, SENTINEL_ANOMALY_ID, SENTINEL_DRONE_ID,
};
