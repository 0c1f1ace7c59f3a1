//! # Delivery Routing
//!
//! Planning half of the drone delivery engine.
//!
//! ## Features
//!
//! - No-fly zone bookkeeping and segment intersection queries
//! - Nearest-neighbor route construction with obstacle detours
//! - Range feasibility with optional mid-trip recharge insertion
//! - Priority-driven order-to-drone allocation

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod battery;
pub mod optimizer;
pub mod route;
pub mod zones;

pub use battery::{apply_policy, RangeOutcome};
pub use optimizer::plan;
pub use route::{nearest_neighbor, PlannedRoute};
pub use zones::ObstacleSet;
