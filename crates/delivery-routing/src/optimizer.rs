//! Order-to-drone allocation heuristic.
//!
//! - Sorts orders by priority (HIGH > MEDIUM > LOW), then weight
//!   (descending), then submission id (FIFO).
//! - Visits drones round-robin, filling one trip per pass under the
//!   capacity and range limits.
//! - Drops upfront any order heavier than the largest capacity in the
//!   fleet.
//! - Falls back to a forced single-order trip when a pass commits
//!   nothing, feasible or not.

use crate::battery::apply_policy;
use crate::route::nearest_neighbor;
use crate::zones::ObstacleSet;
use delivery_domain::{round2, BatteryPolicy, Drone, Order, Trip};
use tracing::debug;

/// Plan trips for the pending orders over the given fleet.
///
/// Consumes every order that any drone can lift; overweight orders are
/// silently excluded. Output is grouped drone by drone in fleet order,
/// each drone's trips in creation order.
#[must_use]
pub fn plan(
    orders: &[Order],
    fleet: &[Drone],
    policy: BatteryPolicy,
    obstacles: &ObstacleSet,
) -> Vec<Trip> {
    if orders.is_empty() || fleet.is_empty() {
        return Vec::new();
    }

    // 1) Drop orders no drone in the fleet can lift.
    let max_capacity = fleet.iter().map(|d| d.capacity_kg).fold(0.0, f64::max);
    let mut remaining: Vec<Order> = orders
        .iter()
        .filter(|o| o.weight_kg <= max_capacity)
        .cloned()
        .collect();

    // 2) Priority desc, weight desc, id asc: a stable total order.
    remaining.sort_by(|a, b| {
        b.priority
            .rank()
            .cmp(&a.priority.rank())
            .then_with(|| b.weight_kg.total_cmp(&a.weight_kg))
            .then_with(|| a.id.cmp(&b.id))
    });

    let mut trips_by_drone: Vec<(String, Vec<Trip>)> = fleet
        .iter()
        .map(|d| (d.id.clone(), Vec::new()))
        .collect();

    let mut idx = 0;
    while !remaining.is_empty() {
        let drone = &fleet[idx];
        let mut trip = Trip::new(&drone.id);
        let mut committed: Vec<Order> = Vec::new();

        // First-fit within the sorted pool; infeasible candidates are
        // skipped for this pass, not retried.
        for order in remaining.clone() {
            if trip.total_weight_kg + order.weight_kg > drone.capacity_kg {
                continue;
            }

            let mut candidate = committed.clone();
            candidate.push(order.clone());

            let route = nearest_neighbor(&candidate, obstacles);
            let outcome = apply_policy(policy, drone, &route.path);
            if !outcome.feasible {
                debug!(
                    drone = %drone.id,
                    order = order.id,
                    distance_km = outcome.distance_km,
                    "candidate rejected by range feasibility"
                );
                continue;
            }

            committed.push(order.clone());
            trip.add_order(&order);
            trip.path = outcome.path;
            trip.distance_km = round2(outcome.distance_km);
            trip.eta_minutes = round2(drone.eta_minutes(outcome.distance_km));
            trip.feasible = true;
            trip.recharge_stops = outcome.recharge_stops;

            remaining.retain(|o| o.id != order.id);
        }

        // 3) Fallback: force the highest-priority order that fits this
        // drone into a one-order trip, keeping the verdict as computed.
        if trip.order_ids.is_empty() {
            let Some(pos) = remaining
                .iter()
                .position(|o| o.weight_kg <= drone.capacity_kg)
            else {
                // Nothing fits this drone; try the next one.
                idx = (idx + 1) % fleet.len();
                continue;
            };
            let order = remaining.remove(pos);

            let route = nearest_neighbor(std::slice::from_ref(&order), obstacles);
            let outcome = apply_policy(policy, drone, &route.path);

            trip.add_order(&order);
            trip.path = outcome.path;
            trip.distance_km = round2(outcome.distance_km);
            trip.eta_minutes = round2(drone.eta_minutes(outcome.distance_km));
            trip.feasible = outcome.feasible;
            trip.recharge_stops = outcome.recharge_stops;
        }

        if let Some((_, trips)) = trips_by_drone.iter_mut().find(|(id, _)| *id == drone.id) {
            trips.push(trip);
        }
        idx = (idx + 1) % fleet.len();
    }

    trips_by_drone
        .into_iter()
        .flat_map(|(_, trips)| trips)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use delivery_domain::{Point, Priority};

    fn order(id: u64, x: f64, y: f64, weight: f64, priority: Priority) -> Order {
        Order::new(id, Point::new(x, y), weight, priority).unwrap()
    }

    fn drone(id: &str, capacity: f64, range: f64) -> Drone {
        Drone::new(id, capacity, range, 60.0, 1.0).unwrap()
    }

    #[test]
    fn test_empty_inputs_give_empty_plan() {
        let obstacles = ObstacleSet::new();
        assert!(plan(&[], &[drone("D1", 10.0, 50.0)], BatteryPolicy::Strict, &obstacles).is_empty());
        assert!(plan(
            &[order(1, 1.0, 1.0, 1.0, Priority::High)],
            &[],
            BatteryPolicy::Strict,
            &obstacles
        )
        .is_empty());
    }

    #[test]
    fn test_overweight_orders_never_planned() {
        let obstacles = ObstacleSet::new();
        let fleet = [drone("D1", 5.0, 50.0), drone("D2", 8.0, 50.0)];
        let orders = [
            order(1, 1.0, 1.0, 9.0, Priority::High), // above every capacity
            order(2, 2.0, 2.0, 3.0, Priority::Low),
        ];

        let trips = plan(&orders, &fleet, BatteryPolicy::Strict, &obstacles);
        let planned: Vec<u64> = trips.iter().flat_map(|t| t.order_ids.clone()).collect();
        assert_eq!(planned, vec![2]);
    }

    #[test]
    fn test_trip_weight_respects_capacity() {
        let obstacles = ObstacleSet::new();
        let fleet = [drone("D1", 5.0, 200.0)];
        let orders = [
            order(1, 1.0, 0.0, 3.0, Priority::Medium),
            order(2, 0.0, 1.0, 3.0, Priority::Medium),
            order(3, 1.0, 1.0, 2.0, Priority::Medium),
        ];

        let trips = plan(&orders, &fleet, BatteryPolicy::Strict, &obstacles);
        for t in &trips {
            assert!(t.total_weight_kg <= 5.0 + 1e-9);
            assert!(t.path.first().unwrap().is_base());
            assert!(t.path.last().unwrap().is_base());
        }
        let planned: usize = trips.iter().map(|t| t.order_ids.len()).sum();
        assert_eq!(planned, 3);
    }

    #[test]
    fn test_priority_order_non_increasing() {
        let obstacles = ObstacleSet::new();
        let fleet = [drone("D1", 10.0, 200.0)];
        // Arrival order MEDIUM, HIGH, LOW; all same weight.
        let orders = [
            order(1, 1.0, 1.0, 1.0, Priority::Medium),
            order(2, -1.0, 1.0, 1.0, Priority::High),
            order(3, 2.0, -1.0, 1.0, Priority::Low),
        ];

        let trips = plan(&orders, &fleet, BatteryPolicy::Strict, &obstacles);
        let ranks: Vec<u8> = trips
            .iter()
            .flat_map(|t| t.order_ids.clone())
            .map(|id| {
                orders
                    .iter()
                    .find(|o| o.id == id)
                    .map(|o| o.priority.rank())
                    .unwrap()
            })
            .collect();
        assert!(ranks.windows(2).all(|w| w[0] >= w[1]), "ranks: {ranks:?}");
    }

    #[test]
    fn test_round_robin_spreads_trips_in_fleet_order() {
        let obstacles = ObstacleSet::new();
        let fleet = [drone("D1", 1.0, 200.0), drone("D2", 1.0, 200.0)];
        let orders = [
            order(1, 1.0, 0.0, 1.0, Priority::Medium),
            order(2, 0.0, 1.0, 1.0, Priority::Medium),
        ];

        let trips = plan(&orders, &fleet, BatteryPolicy::Strict, &obstacles);
        assert_eq!(trips.len(), 2);
        assert_eq!(trips[0].drone_id, "D1");
        assert_eq!(trips[1].drone_id, "D2");
    }

    #[test]
    fn test_fallback_forces_infeasible_single_order_trip() {
        let obstacles = ObstacleSet::new();
        // Range too short for the round trip even under SMART.
        let fleet = [drone("D1", 10.0, 4.0)];
        let orders = [order(1, 3.0, 4.0, 1.0, Priority::High)];

        let trips = plan(&orders, &fleet, BatteryPolicy::Smart, &obstacles);
        assert_eq!(trips.len(), 1);
        assert_eq!(trips[0].order_ids, vec![1]);
        assert!(!trips[0].feasible);
        assert!(trips[0].distance_km > 0.0, "diagnostic distance expected");
    }

    #[test]
    fn test_eta_uses_drone_speed() {
        let obstacles = ObstacleSet::new();
        let fleet = [drone("D1", 10.0, 50.0)]; // 60 km/h
        let orders = [order(1, 3.0, 4.0, 1.0, Priority::High)];

        let trips = plan(&orders, &fleet, BatteryPolicy::Strict, &obstacles);
        assert!((trips[0].distance_km - 10.0).abs() < 1e-9);
        assert!((trips[0].eta_minutes - 10.0).abs() < 1e-9);
    }
}
