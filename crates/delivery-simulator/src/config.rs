//! Simulation limits and pacing constants.

use serde::{Deserialize, Serialize};

/// Tunable limits for registries and the tick engine. Defaults match
/// the reference deployment profile.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SimLimits {
    /// Fleet-wide ceiling on a single drone's payload capacity.
    pub max_capacity_kg: f64,
    /// Floor applied to drone speed during a tick, keeping progress
    /// strictly positive.
    pub min_speed_kmh: f64,
    /// Dwell at a delivery waypoint.
    pub delivery_pause_secs: u64,
    /// Dwell at a mid-route base pit stop.
    pub recharge_pause_secs: u64,
    /// Battery gain per paused second while charging.
    pub recharge_pct_per_sec: f64,
    /// Default automatic-driver interval.
    pub default_tick_ms: u64,
}

impl Default for SimLimits {
    fn default() -> Self {
        Self {
            max_capacity_kg: 25.0,
            min_speed_kmh: 1.0,
            delivery_pause_secs: 10,
            recharge_pause_secs: 20,
            recharge_pct_per_sec: 0.5,
            default_tick_ms: 1000,
        }
    }
}
