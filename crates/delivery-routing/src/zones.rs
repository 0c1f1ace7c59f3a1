//! No-fly zone collection and segment queries.

use delivery_domain::{NoFlyZone, Point};

/// Ordered collection of no-fly zones. Zones are kept in insertion order
/// and duplicates are allowed; degenerate rectangles are rejected at
/// `NoFlyZone` construction, not here.
#[derive(Debug, Clone, Default)]
pub struct ObstacleSet {
    zones: Vec<NoFlyZone>,
}

impl ObstacleSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, zone: NoFlyZone) {
        self.zones.push(zone);
    }

    /// Snapshot copy of the current zones.
    #[must_use]
    pub fn list(&self) -> Vec<NoFlyZone> {
        self.zones.clone()
    }

    pub fn clear(&mut self) {
        self.zones.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.zones.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    /// First zone, in insertion order, intersecting the segment a-b.
    #[must_use]
    pub fn first_intersecting(&self, a: &Point, b: &Point) -> Option<&NoFlyZone> {
        self.zones.iter().find(|z| z.intersects_segment(a, b))
    }
}
