//! Range feasibility: walk a candidate path against a drone's range
//! budget, optionally inserting forced base recharge stops.

use delivery_domain::{BatteryPolicy, Drone, Point, BASE};
use serde::{Deserialize, Serialize};

/// Verdict for one candidate path. An infeasible outcome is not an
/// error: `distance_km` then carries a diagnostic estimate of what the
/// trip would have cost.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RangeOutcome {
    pub path: Vec<Point>,
    pub distance_km: f64,
    pub feasible: bool,
    pub recharge_stops: u32,
}

/// Simulate flying `path` segment by segment with the drone's full range
/// as the budget.
///
/// Under `Strict` the first segment that exceeds the remaining range
/// fails the trip. Under `Smart` a base waypoint is inserted instead:
/// the drone returns to base (if it can), recharges, and retries the
/// segment from there. Comparisons are exact; a segment equal to the
/// remaining range is feasible.
#[must_use]
pub fn apply_policy(policy: BatteryPolicy, drone: &Drone, path: &[Point]) -> RangeOutcome {
    if path.len() < 2 {
        return RangeOutcome {
            path: path.to_vec(),
            distance_km: 0.0,
            feasible: true,
            recharge_stops: 0,
        };
    }

    let range = drone.range_km;
    let mut remaining = range;
    let mut total = 0.0;
    let mut stops = 0;

    let mut out = vec![path[0]];

    for (i, b) in path.iter().enumerate().skip(1) {
        let a = out[out.len() - 1];
        let seg = a.distance_to(b);

        if seg <= remaining {
            out.push(*b);
            remaining -= seg;
            total += seg;
            continue;
        }

        if policy == BatteryPolicy::Strict {
            return infeasible(path, total + seg + rest_of(path, i), stops);
        }

        // SMART: detour to base for a recharge, then retry from there.
        let back = a.distance_to(&BASE);
        if back > remaining {
            return infeasible(path, total + back + rest_of(path, i), stops);
        }

        out.push(BASE);
        total += back;
        stops += 1;
        remaining = range;

        let from_base = BASE.distance_to(b);
        if from_base > remaining {
            return infeasible(path, total + from_base + rest_of(path, i), stops);
        }

        out.push(*b);
        total += from_base;
        remaining -= from_base;
    }

    RangeOutcome {
        path: out,
        distance_km: total,
        feasible: true,
        recharge_stops: stops,
    }
}

fn infeasible(path: &[Point], diagnostic_km: f64, stops: u32) -> RangeOutcome {
    RangeOutcome {
        path: path.to_vec(),
        distance_km: diagnostic_km,
        feasible: false,
        recharge_stops: stops,
    }
}

/// Length of the untraveled tail of `path` starting at waypoint `i`.
fn rest_of(path: &[Point], i: usize) -> f64 {
    path[i..].windows(2).map(|w| w[0].distance_to(&w[1])).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drone(range_km: f64) -> Drone {
        Drone::new("D1", 10.0, range_km, 60.0, 1.0).unwrap()
    }

    fn round_trip(x: f64, y: f64) -> Vec<Point> {
        vec![BASE, Point::new(x, y), BASE]
    }

    #[test]
    fn test_short_path_is_trivially_feasible() {
        let out = apply_policy(BatteryPolicy::Strict, &drone(5.0), &[BASE]);
        assert!(out.feasible);
        assert_eq!(out.distance_km, 0.0);
    }

    #[test]
    fn test_within_range_keeps_path() {
        let out = apply_policy(BatteryPolicy::Strict, &drone(30.0), &round_trip(3.0, 4.0));
        assert!(out.feasible);
        assert_eq!(out.recharge_stops, 0);
        assert!((out.distance_km - 10.0).abs() < 1e-9);
        assert_eq!(out.path.len(), 3);
    }

    #[test]
    fn test_exact_range_is_feasible() {
        // 5 out + 5 back against a 10 km budget, no epsilon slack.
        let out = apply_policy(BatteryPolicy::Strict, &drone(10.0), &round_trip(3.0, 4.0));
        assert!(out.feasible);
    }

    #[test]
    fn test_strict_fails_without_rerouting() {
        let out = apply_policy(BatteryPolicy::Strict, &drone(8.0), &round_trip(3.0, 4.0));
        assert!(!out.feasible);
        assert_eq!(out.recharge_stops, 0);
        // Diagnostic distance still covers the whole candidate.
        assert!((out.distance_km - 10.0).abs() < 1e-9);
        // Original path returned untouched.
        assert_eq!(out.path.len(), 3);
    }

    #[test]
    fn test_smart_inserts_recharge_stop() {
        // Out leg fits exactly (range 5), return leg forces a pit stop
        // at base... which is where the drone already is heading, so use
        // a two-stop tour instead: (3,4) then (-3,4).
        let path = vec![BASE, Point::new(3.0, 4.0), Point::new(-3.0, 4.0), BASE];
        let out = apply_policy(BatteryPolicy::Smart, &drone(10.0), &path);
        assert!(out.feasible);
        assert_eq!(out.recharge_stops, 1);
        // Path gained a base waypoint mid-route.
        assert_eq!(out.path.len(), 5);
        assert!(out.path[2].is_base());
        // 5 (out) + 5 (back) + 5 (out again) + 6 (leg) + ... recompute:
        // base->(3,4)=5, (3,4)->base=5, base->(-3,4)=5, (-3,4)->base=5.
        assert!((out.distance_km - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_smart_fails_when_base_unreachable() {
        // Range 6: reaches (3,4) with 1 km left, cannot fly the 5 km home.
        let out = apply_policy(BatteryPolicy::Smart, &drone(6.0), &round_trip(3.0, 4.0));
        assert!(!out.feasible);
        assert_eq!(out.recharge_stops, 0);
    }

    #[test]
    fn test_smart_fails_when_segment_exceeds_full_range() {
        // Even from a fresh charge the leg to (30,40) is 50 km.
        let out = apply_policy(BatteryPolicy::Smart, &drone(10.0), &round_trip(30.0, 40.0));
        assert!(!out.feasible);
    }
}
