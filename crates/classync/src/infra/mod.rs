//! Infrastructure adapters: configuration, logging, telemetry, and in-memory collaborators.

pub mod config;
pub mod logging;
pub mod memory;
pub mod telemetry;
