//! In-memory fleet registry, insertion-ordered and lock-guarded.

use crate::config::SimLimits;
use delivery_domain::{DomainError, Drone, DroneState, Result};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Keyed store for the drone fleet. All operations serialize on one
/// mutex; snapshots are copied out so callers never observe mid-update
/// state.
#[derive(Debug)]
pub struct FleetRegistry {
    limits: SimLimits,
    fleet: Mutex<Vec<Drone>>,
}

impl FleetRegistry {
    #[must_use]
    pub fn new(limits: SimLimits) -> Self {
        Self {
            limits,
            fleet: Mutex::new(Vec::new()),
        }
    }

    fn guard(&self) -> MutexGuard<'_, Vec<Drone>> {
        self.fleet.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_limits(&self, capacity_kg: f64) -> Result<()> {
        if capacity_kg > self.limits.max_capacity_kg {
            return Err(DomainError::Validation(format!(
                "capacity_kg above the permitted ceiling: {capacity_kg} kg (max {} kg)",
                self.limits.max_capacity_kg
            )));
        }
        Ok(())
    }

    /// Register a new drone.
    ///
    /// # Errors
    /// Conflict on duplicate id; validation error on parameters outside
    /// the physical or configured limits. State is unchanged on error.
    pub fn create(
        &self,
        id: &str,
        capacity_kg: f64,
        range_km: f64,
        speed_kmh: f64,
        consumption_pct_per_km: f64,
    ) -> Result<Drone> {
        let mut fleet = self.guard();
        if fleet.iter().any(|d| d.id == id) {
            return Err(DomainError::Conflict(format!(
                "drone already exists with id: {id}"
            )));
        }
        self.check_limits(capacity_kg)?;
        let drone = Drone::new(id, capacity_kg, range_km, speed_kmh, consumption_pct_per_km)?;
        fleet.push(drone.clone());
        Ok(drone)
    }

    /// Snapshot of the fleet in registration order.
    #[must_use]
    pub fn list(&self) -> Vec<Drone> {
        self.guard().clone()
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<Drone> {
        self.guard().iter().find(|d| d.id == id).cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.guard().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.guard().is_empty()
    }

    /// Replace a drone's physical parameters, keeping its state unless a
    /// new one is given.
    ///
    /// # Errors
    /// Not-found on unknown id; validation errors as in `create`.
    pub fn update(
        &self,
        id: &str,
        capacity_kg: f64,
        range_km: f64,
        speed_kmh: f64,
        consumption_pct_per_km: f64,
        new_state: Option<DroneState>,
    ) -> Result<Drone> {
        let mut fleet = self.guard();
        let Some(slot) = fleet.iter_mut().find(|d| d.id == id) else {
            return Err(DomainError::NotFound {
                entity: "drone".into(),
                id: id.into(),
            });
        };
        self.check_limits(capacity_kg)?;
        let mut updated = Drone::new(id, capacity_kg, range_km, speed_kmh, consumption_pct_per_km)?;
        updated.state = new_state.unwrap_or(slot.state);
        *slot = updated.clone();
        Ok(updated)
    }

    /// Mutate a drone's state; the transition hook the simulator calls.
    ///
    /// # Errors
    /// Not-found on unknown id.
    pub fn set_state(&self, id: &str, state: DroneState) -> Result<Drone> {
        let mut fleet = self.guard();
        let Some(drone) = fleet.iter_mut().find(|d| d.id == id) else {
            return Err(DomainError::NotFound {
                entity: "drone".into(),
                id: id.into(),
            });
        };
        drone.state = state;
        Ok(drone.clone())
    }

    pub fn set_all_states(&self, state: DroneState) {
        for d in self.guard().iter_mut() {
            d.state = state;
        }
    }

    /// Remove a drone; false when the id was unknown.
    pub fn remove(&self, id: &str) -> bool {
        let mut fleet = self.guard();
        let before = fleet.len();
        fleet.retain(|d| d.id != id);
        fleet.len() < before
    }

    pub fn clear(&self) {
        self.guard().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> FleetRegistry {
        FleetRegistry::new(SimLimits::default())
    }

    #[test]
    fn test_create_and_list_keeps_order() {
        let reg = registry();
        reg.create("D2", 5.0, 20.0, 40.0, 1.0).unwrap();
        reg.create("D1", 5.0, 20.0, 40.0, 1.0).unwrap();
        let ids: Vec<String> = reg.list().into_iter().map(|d| d.id).collect();
        assert_eq!(ids, vec!["D2", "D1"]);
    }

    #[test]
    fn test_duplicate_id_is_conflict() {
        let reg = registry();
        reg.create("D1", 5.0, 20.0, 40.0, 1.0).unwrap();
        let err = reg.create("D1", 6.0, 20.0, 40.0, 1.0).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_capacity_ceiling_enforced() {
        let reg = registry();
        let err = reg.create("D1", 26.0, 20.0, 40.0, 1.0).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert!(reg.is_empty());
    }

    #[test]
    fn test_update_preserves_state_unless_given() {
        let reg = registry();
        reg.create("D1", 5.0, 20.0, 40.0, 1.0).unwrap();
        reg.set_state("D1", DroneState::Flying).unwrap();

        let updated = reg.update("D1", 6.0, 25.0, 50.0, 1.5, None).unwrap();
        assert_eq!(updated.state, DroneState::Flying);

        let updated = reg
            .update("D1", 6.0, 25.0, 50.0, 1.5, Some(DroneState::Idle))
            .unwrap();
        assert_eq!(updated.state, DroneState::Idle);
    }

    #[test]
    fn test_set_all_states() {
        let reg = registry();
        reg.create("D1", 5.0, 20.0, 40.0, 1.0).unwrap();
        reg.create("D2", 5.0, 20.0, 40.0, 1.0).unwrap();
        reg.set_all_states(DroneState::Charging);
        assert!(reg.list().iter().all(|d| d.state == DroneState::Charging));
    }

    #[test]
    fn test_unknown_id_is_not_found() {
        let reg = registry();
        assert!(matches!(
            reg.set_state("nope", DroneState::Flying),
            Err(DomainError::NotFound { .. })
        ));
        assert!(!reg.remove("nope"));
        assert!(reg.get("nope").is_none());
    }
}
