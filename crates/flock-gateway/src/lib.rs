//! External resource gateway: everything that talks HTTP lives here.
//!
//! The simulation core operates on plain in-memory records; this crate
//! owns the two server connections (the drone's own server and the
//! central controller) and the wire-JSON mapping.

pub mod client;
pub mod wire;

pub use client::{Gateway, GatewayConfig, GatewayError, HttpGateway};
