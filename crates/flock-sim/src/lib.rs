//! Simulation library surface, shared by the binary and the tests.

pub mod anomaly;
pub mod commands;
pub mod config;
pub mod cycle;
pub mod init;

pub use config::{Args, SimConfig};
pub use cycle::Simulation;
