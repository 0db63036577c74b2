//! Infrastructure implementations.
//!
//! Ports for time and randomness with their adapters, rules loading and
//! tracing setup.

pub mod clock;
pub mod error;
pub mod ports;
pub mod settings;
pub mod telemetry;
