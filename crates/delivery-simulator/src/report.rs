//! Delivery report over the last recorded plan.

use delivery_domain::{round2, Order, Trip};
use serde::{Deserialize, Serialize};

/// Aggregate view of a plan: delivery count, mean ETA, the drone with
/// the least planned distance, and an ASCII sketch of the order book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub delivered_count: usize,
    pub mean_eta_minutes: f64,
    pub most_efficient_drone: String,
    pub ascii_map: String,
}

/// Build the report. An empty plan yields the fixed placeholders.
#[must_use]
pub fn build(plan: &[Trip], orders: &[Order]) -> Report {
    if plan.is_empty() {
        return Report {
            delivered_count: 0,
            mean_eta_minutes: 0.0,
            most_efficient_drone: "-".to_string(),
            ascii_map: "(no data)".to_string(),
        };
    }

    let delivered_count = plan.iter().map(|t| t.order_ids.len()).sum();
    let mean_eta_minutes =
        round2(plan.iter().map(|t| t.eta_minutes).sum::<f64>() / plan.len() as f64);

    // Least total planned distance wins; first encountered breaks ties.
    let mut totals: Vec<(String, f64)> = Vec::new();
    for trip in plan {
        if let Some(entry) = totals.iter_mut().find(|(id, _)| *id == trip.drone_id) {
            entry.1 += trip.distance_km;
        } else {
            totals.push((trip.drone_id.clone(), trip.distance_km));
        }
    }
    let most_efficient_drone = totals
        .iter()
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map_or_else(|| "-".to_string(), |(id, _)| id.clone());

    Report {
        delivered_count,
        mean_eta_minutes,
        most_efficient_drone,
        ascii_map: ascii_map(orders),
    }
}

/// Plot the order book on a character grid: `B` marks the base at the
/// centre, `*` each order, one cell per kilometre.
fn ascii_map(orders: &[Order]) -> String {
    if orders.is_empty() {
        return "(no orders)".to_string();
    }

    let max_x = orders
        .iter()
        .map(|o| o.position.x.abs())
        .fold(5.0, f64::max);
    let max_y = orders
        .iter()
        .map(|o| o.position.y.abs())
        .fold(5.0, f64::max);
    let w = (max_x.ceil() as usize * 2 + 3).max(20);
    let h = (max_y.ceil() as usize * 2 + 3).max(10);

    let mut grid = vec![vec!['.'; w]; h];
    let (cx, cy) = (w / 2, h / 2);
    grid[cy][cx] = 'B';

    for o in orders {
        let px = cx as i64 + o.position.x.round() as i64;
        let py = cy as i64 - o.position.y.round() as i64;
        if px >= 0 && (px as usize) < w && py >= 0 && (py as usize) < h {
            grid[py as usize][px as usize] = '*';
        }
    }

    let mut out = String::with_capacity(h * (w + 1));
    for row in grid {
        out.extend(row);
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use delivery_domain::{Point, Priority};

    fn trip(drone_id: &str, orders: &[u64], distance: f64, eta: f64) -> Trip {
        let mut t = Trip::new(drone_id);
        t.order_ids = orders.to_vec();
        t.distance_km = distance;
        t.eta_minutes = eta;
        t
    }

    #[test]
    fn test_empty_plan_placeholders() {
        let r = build(&[], &[]);
        assert_eq!(r.delivered_count, 0);
        assert_eq!(r.mean_eta_minutes, 0.0);
        assert_eq!(r.most_efficient_drone, "-");
        assert_eq!(r.ascii_map, "(no data)");
    }

    #[test]
    fn test_counts_and_mean_eta() {
        let plan = [
            trip("D1", &[1, 2], 10.0, 12.0),
            trip("D2", &[3], 4.0, 6.0),
        ];
        let r = build(&plan, &[]);
        assert_eq!(r.delivered_count, 3);
        assert!((r.mean_eta_minutes - 9.0).abs() < 1e-9);
        assert_eq!(r.ascii_map, "(no orders)");
    }

    #[test]
    fn test_most_efficient_is_least_total_distance() {
        let plan = [
            trip("D1", &[1], 10.0, 10.0),
            trip("D2", &[2], 4.0, 4.0),
            trip("D1", &[3], 1.0, 1.0),
        ];
        let r = build(&plan, &[]);
        // D2 total 4.0 beats D1 total 11.0.
        assert_eq!(r.most_efficient_drone, "D2");
    }

    #[test]
    fn test_ascii_map_marks_base_and_orders() {
        let orders = [Order::new(1, Point::new(3.0, 4.0), 1.0, Priority::High).unwrap()];
        let plan = [trip("D1", &[1], 10.0, 10.0)];
        let map = build(&plan, &orders).ascii_map;

        assert!(map.contains('B'));
        assert!(map.contains('*'));
        let lines: Vec<&str> = map.lines().collect();
        assert!(lines.len() >= 10);
        assert!(lines[0].len() >= 20);
    }
}
