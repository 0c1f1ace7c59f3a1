//! # Drone Delivery Simulator - Domain Model
//!
//! Core domain entities, value objects, and enums for drone delivery
//! planning and execution. These types are the single source of truth
//! across all layers: routing, allocation, and simulation.

#![forbid(unsafe_code)]
#![warn(clippy::all)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Colinearity / coincidence tolerance used by the geometry helpers.
pub const EPSILON: f64 = 1e-9;

// =============================================================================
// VALUE OBJECTS
// =============================================================================

/// Planar position in kilometres relative to the delivery base.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// The single depot every route starts and ends at.
pub const BASE: Point = Point { x: 0.0, y: 0.0 };

impl Point {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance_to(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Squared distance, for nearest-corner comparisons.
    #[must_use]
    pub fn distance_sq(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Whether this point coincides with the base within tolerance.
    #[must_use]
    pub fn is_base(&self) -> bool {
        self.x.abs() < EPSILON && self.y.abs() < EPSILON
    }

    /// Exact coordinate equality within tolerance.
    #[must_use]
    pub fn coincides_with(&self, other: &Point) -> bool {
        (self.x - other.x).abs() < EPSILON && (self.y - other.y).abs() < EPSILON
    }
}

// =============================================================================
// ENUMS
// =============================================================================

/// Order delivery priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    /// Numeric rank for sorting: HIGH=3, MEDIUM=2, LOW=1.
    #[must_use]
    pub const fn rank(&self) -> u8 {
        match self {
            Self::High => 3,
            Self::Medium => 2,
            Self::Low => 1,
        }
    }
}

/// Drone operational status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DroneState {
    Idle,
    Flying,
    Delivering,
    Charging,
    Returning,
}

impl DroneState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "IDLE",
            Self::Flying => "FLYING",
            Self::Delivering => "DELIVERING",
            Self::Charging => "CHARGING",
            Self::Returning => "RETURNING",
        }
    }
}

/// Range-feasibility policy for trip planning.
///
/// `Strict` never reroutes; `Smart` may insert base recharge stops to
/// stretch a trip beyond single-charge range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BatteryPolicy {
    Strict,
    Smart,
}

// =============================================================================
// ENTITY TYPES
// =============================================================================

/// Delivery order. Immutable after submission; ids are assigned as a
/// monotonic sequence by the order registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: u64,
    pub position: Point,
    pub weight_kg: f64,
    pub priority: Priority,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Build an order with a registry-assigned id.
    ///
    /// # Errors
    /// Validation error when the weight is not strictly positive.
    pub fn new(id: u64, position: Point, weight_kg: f64, priority: Priority) -> Result<Self> {
        if weight_kg <= 0.0 {
            return Err(DomainError::Validation("weight_kg must be > 0".into()));
        }
        Ok(Self {
            id,
            position,
            weight_kg,
            priority,
            created_at: Utc::now(),
        })
    }
}

/// Drone platform with fixed physical parameters and a mutable state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Drone {
    pub id: String,
    pub capacity_kg: f64,
    pub range_km: f64,
    pub speed_kmh: f64,
    pub consumption_pct_per_km: f64,
    pub state: DroneState,
}

impl Drone {
    /// Build a drone, validating the physical parameters.
    ///
    /// # Errors
    /// Validation error on blank id or non-positive capacity, range or
    /// speed, or negative consumption rate.
    pub fn new(
        id: &str,
        capacity_kg: f64,
        range_km: f64,
        speed_kmh: f64,
        consumption_pct_per_km: f64,
    ) -> Result<Self> {
        if id.trim().is_empty() {
            return Err(DomainError::Validation("drone id must not be blank".into()));
        }
        if capacity_kg <= 0.0 {
            return Err(DomainError::Validation("capacity_kg must be > 0".into()));
        }
        if range_km <= 0.0 {
            return Err(DomainError::Validation("range_km must be > 0".into()));
        }
        if speed_kmh <= 0.0 {
            return Err(DomainError::Validation("speed_kmh must be > 0".into()));
        }
        if consumption_pct_per_km < 0.0 {
            return Err(DomainError::Validation(
                "consumption_pct_per_km must be >= 0".into(),
            ));
        }
        Ok(Self {
            id: id.to_string(),
            capacity_kg,
            range_km,
            speed_kmh,
            consumption_pct_per_km,
            state: DroneState::Idle,
        })
    }

    #[must_use]
    pub fn can_carry(&self, weight_kg: f64) -> bool {
        weight_kg > 0.0 && weight_kg <= self.capacity_kg
    }

    #[must_use]
    pub fn can_reach(&self, distance_km: f64) -> bool {
        distance_km >= 0.0 && distance_km <= self.range_km
    }

    /// Estimated flight time in minutes for a given distance.
    #[must_use]
    pub fn eta_minutes(&self, distance_km: f64) -> f64 {
        (distance_km / self.speed_kmh) * 60.0
    }

    /// Estimated battery consumption (percent) for a given distance.
    #[must_use]
    pub fn consumption_for(&self, distance_km: f64) -> f64 {
        distance_km * self.consumption_pct_per_km
    }
}

/// Axis-aligned rectangular no-fly zone, normalized on construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoFlyZone {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl NoFlyZone {
    /// Build a zone from two opposite corners.
    ///
    /// # Errors
    /// Validation error on a degenerate rectangle (zero width or height).
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Result<Self> {
        let (min_x, max_x) = (x1.min(x2), x1.max(x2));
        let (min_y, max_y) = (y1.min(y2), y1.max(y2));
        if min_x == max_x || min_y == max_y {
            return Err(DomainError::Validation(
                "no-fly zone rectangle is degenerate".into(),
            ));
        }
        Ok(Self {
            min_x,
            min_y,
            max_x,
            max_y,
        })
    }

    #[must_use]
    pub fn contains(&self, p: &Point) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }

    /// Rectangle corners in counter-clockwise order from (min_x, min_y).
    #[must_use]
    pub fn corners(&self) -> [Point; 4] {
        [
            Point::new(self.min_x, self.min_y),
            Point::new(self.max_x, self.min_y),
            Point::new(self.max_x, self.max_y),
            Point::new(self.min_x, self.max_y),
        ]
    }

    /// Whether the segment a-b enters this zone: either endpoint inside,
    /// or the segment crosses one of the four edges.
    #[must_use]
    pub fn intersects_segment(&self, a: &Point, b: &Point) -> bool {
        if self.contains(a) || self.contains(b) {
            return true;
        }
        let [c1, c2, c3, c4] = self.corners();
        segments_intersect(a, b, &c1, &c2)
            || segments_intersect(a, b, &c2, &c3)
            || segments_intersect(a, b, &c3, &c4)
            || segments_intersect(a, b, &c4, &c1)
    }
}

/// Orientation of the ordered triple (a, b, c): 0 colinear, 1 clockwise,
/// 2 counter-clockwise.
fn orientation(a: &Point, b: &Point, c: &Point) -> u8 {
    let v = (b.y - a.y) * (c.x - b.x) - (b.x - a.x) * (c.y - b.y);
    if v.abs() < EPSILON {
        0
    } else if v > 0.0 {
        1
    } else {
        2
    }
}

/// Whether b lies on the segment a-c, assuming the three are colinear.
fn on_segment(a: &Point, b: &Point, c: &Point) -> bool {
    b.x <= a.x.max(c.x) && b.x >= a.x.min(c.x) && b.y <= a.y.max(c.y) && b.y >= a.y.min(c.y)
}

/// Segment intersection test via orientations, handling colinear overlaps.
fn segments_intersect(p1: &Point, p2: &Point, q1: &Point, q2: &Point) -> bool {
    let o1 = orientation(p1, p2, q1);
    let o2 = orientation(p1, p2, q2);
    let o3 = orientation(q1, q2, p1);
    let o4 = orientation(q1, q2, p2);

    if o1 != o2 && o3 != o4 {
        return true;
    }
    (o1 == 0 && on_segment(p1, q1, p2))
        || (o2 == 0 && on_segment(p1, q2, p2))
        || (o3 == 0 && on_segment(q1, p1, q2))
        || (o4 == 0 && on_segment(q1, p2, q2))
}

/// One drone's planned round trip: orders served, realized waypoint path
/// (base to base), and the planning verdict. Read-only once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    pub drone_id: String,
    pub order_ids: Vec<u64>,
    pub path: Vec<Point>,
    pub distance_km: f64,
    pub eta_minutes: f64,
    pub total_weight_kg: f64,
    pub feasible: bool,
    pub recharge_stops: u32,
}

impl Trip {
    #[must_use]
    pub fn new(drone_id: &str) -> Self {
        Self {
            drone_id: drone_id.to_string(),
            order_ids: Vec::new(),
            path: Vec::new(),
            distance_km: 0.0,
            eta_minutes: 0.0,
            total_weight_kg: 0.0,
            feasible: true,
            recharge_stops: 0,
        }
    }

    /// Record an order on this trip, accumulating its weight.
    pub fn add_order(&mut self, order: &Order) {
        self.order_ids.push(order.id);
        self.total_weight_kg += order.weight_kg;
    }
}

// =============================================================================
// ERRORS
// =============================================================================

/// Domain-level errors. Infeasible trips are NOT errors: they travel as
/// `feasible = false` on the carrying result.
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("conflict: {0}")]
    Conflict(String),
}

pub type Result<T> = std::result::Result<T, DomainError>;

/// Round to two decimals, matching the precision of reported distances,
/// ETAs and telemetry.
#[must_use]
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
