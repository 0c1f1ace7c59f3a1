//! # Delivery Simulator
//!
//! Execution half of the drone delivery engine.
//!
//! ## Features
//!
//! - In-memory, lock-guarded fleet and order registries
//! - Plan-to-mission queue binding
//! - Discrete-time tick engine with delivery and recharge dwells
//! - Per-drone telemetry and aggregate delivery reports
//! - Manual ticking or an automatic periodic driver

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod config;
pub mod engine;
pub mod fleet;
pub mod orders;
pub mod report;

pub use config::SimLimits;
pub use engine::{Mode, SimStatus, Simulator, TelemetrySnapshot};
pub use fleet::FleetRegistry;
pub use orders::OrderRegistry;
pub use report::Report;
