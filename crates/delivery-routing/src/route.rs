//! Round-trip route construction: nearest-neighbor sequencing plus
//! no-fly zone detours.

use crate::zones::ObstacleSet;
use delivery_domain::{Order, Point, BASE};
use serde::{Deserialize, Serialize};

/// A realized waypoint path and its total length.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannedRoute {
    pub path: Vec<Point>,
    pub distance_km: f64,
}

/// Build a base-to-base tour over the given delivery points.
///
/// Sequencing is a greedy nearest-neighbor walk from the base: the
/// unvisited point strictly closest to the current position is taken
/// next, ties keeping the earliest submission. Deliberately heuristic,
/// not an optimal tour.
#[must_use]
pub fn nearest_neighbor(orders: &[Order], obstacles: &ObstacleSet) -> PlannedRoute {
    let mut path = vec![BASE];
    let mut current = BASE;
    let mut remaining: Vec<&Order> = orders.iter().collect();

    while !remaining.is_empty() {
        let mut best = 0;
        let mut best_dist = current.distance_to(&remaining[0].position);
        for (i, o) in remaining.iter().enumerate().skip(1) {
            let d = current.distance_to(&o.position);
            if d < best_dist {
                best = i;
                best_dist = d;
            }
        }
        current = remaining.remove(best).position;
        path.push(current);
    }

    path.push(BASE);

    let adjusted = detour_around_zones(path, obstacles);
    let distance_km = path_length(&adjusted);
    PlannedRoute {
        path: adjusted,
        distance_km,
    }
}

/// Sum of consecutive Euclidean segment lengths.
#[must_use]
pub fn path_length(path: &[Point]) -> f64 {
    path.windows(2).map(|w| w[0].distance_to(&w[1])).sum()
}

/// Insert detour waypoints around intersecting zones.
///
/// Per segment only the first intersecting zone is resolved: the corner
/// nearest the segment start goes in first and, if the remainder still
/// intersects, the corner nearest the end follows. Chained or nested
/// zones on a single segment stay unresolved; that limitation is part of
/// the observable contract.
fn detour_around_zones(path: Vec<Point>, obstacles: &ObstacleSet) -> Vec<Point> {
    if obstacles.is_empty() || path.len() < 2 {
        return path;
    }

    let mut out = vec![path[0]];

    for b in path.into_iter().skip(1) {
        let a = out[out.len() - 1];

        let Some(hit) = obstacles.first_intersecting(&a, &b) else {
            out.push(b);
            continue;
        };
        let corners = hit.corners();

        let near_start = nearest_corner(&corners, &a);
        if !near_start.coincides_with(&a) {
            out.push(near_start);
        }

        let last = out[out.len() - 1];
        if obstacles.first_intersecting(&last, &b).is_some() {
            let near_end = nearest_corner(&corners, &b);
            if !near_end.coincides_with(&last) {
                out.push(near_end);
            }
        }
        out.push(b);
    }
    out
}

fn nearest_corner(corners: &[Point; 4], to: &Point) -> Point {
    let mut best = corners[0];
    let mut best_sq = to.distance_sq(&best);
    for c in &corners[1..] {
        let d = to.distance_sq(c);
        if d < best_sq {
            best = *c;
            best_sq = d;
        }
    }
    best
}
