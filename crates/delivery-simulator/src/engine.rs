//! Discrete-time execution engine: mission queues, tick advancement,
//! telemetry, and the automatic driver.

use crate::config::SimLimits;
use crate::fleet::FleetRegistry;
use crate::report::{self, Report};
use delivery_domain::{round2, BatteryPolicy, DomainError, DroneState, Order, Point, Result, Trip, EPSILON};
use delivery_routing::ObstacleSet;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Driver mode: explicit ticks only, or a background periodic driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Mode {
    Manual,
    Automatic,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "MANUAL",
            Self::Automatic => "AUTOMATIC",
        }
    }
}

/// A trip bound into a drone's execution queue.
#[derive(Debug, Clone)]
struct Mission {
    order_ids: Vec<u64>,
    path: Vec<Point>,
}

impl From<&Trip> for Mission {
    fn from(trip: &Trip) -> Self {
        Self {
            order_ids: trip.order_ids.clone(),
            path: trip.path.clone(),
        }
    }
}

/// FIFO mission queue for one drone, kept in plan order.
#[derive(Debug)]
struct MissionQueue {
    drone_id: String,
    missions: VecDeque<Mission>,
}

/// Per-drone mutable execution state. Mutated only inside `tick`.
#[derive(Debug)]
struct DroneTelemetry {
    drone_id: String,
    state: DroneState,
    in_mission: bool,
    path: Vec<Point>,
    order_ids: Vec<u64>,
    /// Index of the segment currently flown (path[i] -> path[i+1]).
    segment_idx: usize,
    /// Distance already flown within the current segment.
    progress_km: f64,
    position: Point,
    battery_pct: f64,
    pause_remaining_secs: u64,
}

impl DroneTelemetry {
    fn initial(drone_id: &str) -> Self {
        Self {
            drone_id: drone_id.to_string(),
            state: DroneState::Idle,
            in_mission: false,
            path: Vec::new(),
            order_ids: Vec::new(),
            segment_idx: 0,
            progress_km: 0.0,
            position: Point::new(0.0, 0.0),
            battery_pct: 100.0,
            pause_remaining_secs: 0,
        }
    }

    fn start_mission(&mut self, mission: &Mission) {
        self.in_mission = true;
        self.state = DroneState::Flying;
        self.path = mission.path.clone();
        self.order_ids = mission.order_ids.clone();
        self.segment_idx = 0;
        self.progress_km = 0.0;
        self.pause_remaining_secs = 0;
        self.position = self.path[0];
    }

    // Battery level deliberately survives mission boundaries.
    fn finish_mission(&mut self) {
        self.in_mission = false;
        self.state = DroneState::Idle;
        self.path = Vec::new();
        self.order_ids = Vec::new();
        self.segment_idx = 0;
        self.progress_km = 0.0;
        self.pause_remaining_secs = 0;
        self.position = Point::new(0.0, 0.0);
    }

    fn mission_complete(&self) -> bool {
        self.path.len() < 2 || self.segment_idx >= self.path.len() - 1
    }

    fn at_route_start(&self) -> bool {
        self.segment_idx == 0
    }

    /// The waypoint just reached counts as a delivery point whenever it
    /// is not the base. Deciding by distance-from-base rather than order
    /// identity is a deliberate simplification; it is part of the tested
    /// observable behavior.
    fn at_delivery_point(&self) -> bool {
        self.segment_idx < self.path.len() && !self.path[self.segment_idx].is_base()
    }

    fn next_waypoint_is_final_base(&self) -> bool {
        if self.path.len() >= 2 && self.segment_idx + 1 == self.path.len() - 1 {
            return self.path[self.segment_idx + 1].is_base();
        }
        false
    }
}

/// Read-only telemetry view handed to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    pub drone_id: String,
    pub state: String,
    pub x: f64,
    pub y: f64,
    pub battery_pct: f64,
    pub in_mission: bool,
    pub next_waypoint_idx: usize,
    pub order_ids: Vec<u64>,
}

impl TelemetrySnapshot {
    fn from_telemetry(t: &DroneTelemetry) -> Self {
        Self {
            drone_id: t.drone_id.clone(),
            state: t.state.as_str().to_string(),
            x: round2(t.position.x),
            y: round2(t.position.y),
            battery_pct: round2(t.battery_pct),
            in_mission: t.in_mission,
            next_waypoint_idx: (t.segment_idx + 1).min(t.path.len().saturating_sub(1)),
            order_ids: t.order_ids.clone(),
        }
    }

    fn unknown(drone_id: &str) -> Self {
        Self {
            drone_id: drone_id.to_string(),
            state: "UNKNOWN".to_string(),
            x: 0.0,
            y: 0.0,
            battery_pct: 0.0,
            in_mission: false,
            next_waypoint_idx: 0,
            order_ids: Vec::new(),
        }
    }
}

/// Pending mission count for one drone, in queue order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingMissions {
    pub drone_id: String,
    pub missions: usize,
}

/// Simulator status snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimStatus {
    pub mode: String,
    pub active_drones: usize,
    pub idle_drones: usize,
    pub tick_interval_ms: u64,
    pub pending_missions: Vec<PendingMissions>,
}

/// Everything a tick reads and writes, behind one mutex: no two ticks
/// interleave, and no tick overlaps a queue load or a status read.
struct SimState {
    last_plan: Vec<Trip>,
    planned_orders: Vec<Order>,
    queues: Vec<MissionQueue>,
    telemetry: Vec<DroneTelemetry>,
    mode: Mode,
    tick_interval_ms: u64,
}

/// Tick-based execution simulator over the fleet registry.
pub struct Simulator {
    fleet: Arc<FleetRegistry>,
    limits: SimLimits,
    state: Mutex<SimState>,
    driver: Mutex<Option<JoinHandle<()>>>,
}

impl Simulator {
    #[must_use]
    pub fn new(fleet: Arc<FleetRegistry>, limits: SimLimits) -> Self {
        let tick_interval_ms = limits.default_tick_ms;
        Self {
            fleet,
            limits,
            state: Mutex::new(SimState {
                last_plan: Vec::new(),
                planned_orders: Vec::new(),
                queues: Vec::new(),
                telemetry: Vec::new(),
                mode: Mode::Manual,
                tick_interval_ms,
            }),
            driver: Mutex::new(None),
        }
    }

    fn guard(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn driver_guard(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.driver.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Plan trips for the given orders over the registered fleet and
    /// record the result as the "last plan".
    #[must_use]
    pub fn plan(
        &self,
        orders: &[Order],
        policy: BatteryPolicy,
        obstacles: &ObstacleSet,
    ) -> Vec<Trip> {
        let trips = delivery_routing::plan(orders, &self.fleet.list(), policy, obstacles);
        info!(trips = trips.len(), orders = orders.len(), "plan computed");
        self.record_plan(&trips, orders);
        trips
    }

    /// Record a freshly planned set of trips as the "last plan".
    pub fn record_plan(&self, trips: &[Trip], orders: &[Order]) {
        let mut state = self.guard();
        state.last_plan = trips.to_vec();
        state.planned_orders = orders.to_vec();
    }

    /// Convert the last recorded plan into per-drone mission queues.
    ///
    /// # Errors
    /// Conflict when no plan has been recorded; queues and telemetry are
    /// untouched in that case.
    pub fn queue_last_plan(&self) -> Result<()> {
        let mut state = self.guard();
        if state.last_plan.is_empty() {
            return Err(DomainError::Conflict(
                "no plan available - run planning first".into(),
            ));
        }

        state.queues.clear();
        state.telemetry.clear();

        // Group trips by drone, preserving plan order.
        let trips = state.last_plan.clone();
        for trip in &trips {
            if let Some(q) = state
                .queues
                .iter_mut()
                .find(|q| q.drone_id == trip.drone_id)
            {
                q.missions.push_back(Mission::from(trip));
            } else {
                state.queues.push(MissionQueue {
                    drone_id: trip.drone_id.clone(),
                    missions: VecDeque::from([Mission::from(trip)]),
                });
                state
                    .telemetry
                    .push(DroneTelemetry::initial(&trip.drone_id));
            }
        }

        info!(drones = state.queues.len(), "plan queued as missions");
        Ok(())
    }

    /// Advance simulated time by `seconds`. Zero or negative is a no-op.
    pub fn tick(&self, seconds: i64) {
        if seconds <= 0 {
            return;
        }
        let mut state = self.guard();
        let state = &mut *state;

        // Idle drones with queued work start their head mission.
        for queue in &state.queues {
            if queue.missions.is_empty() {
                continue;
            }
            let idx = state
                .telemetry
                .iter()
                .position(|t| t.drone_id == queue.drone_id)
                .unwrap_or_else(|| {
                    state
                        .telemetry
                        .push(DroneTelemetry::initial(&queue.drone_id));
                    state.telemetry.len() - 1
                });
            let tel = &mut state.telemetry[idx];
            if !tel.in_mission {
                if let Some(mission) = queue.missions.front() {
                    tel.start_mission(mission);
                    self.apply_state_hook(&queue.drone_id, DroneState::Flying);
                }
            }
        }

        // Advance each drone.
        for tel in &mut state.telemetry {
            let Some(drone) = self.fleet.get(&tel.drone_id) else {
                continue;
            };
            if !tel.in_mission {
                continue;
            }

            let speed = drone.speed_kmh.max(self.limits.min_speed_kmh);
            let mut budget_km = (speed / 3600.0) * seconds as f64;

            // Pauses (delivery / recharge) consume the tick first.
            if tel.pause_remaining_secs > 0 {
                let consumed = tel.pause_remaining_secs.min(seconds as u64);
                tel.pause_remaining_secs -= consumed;
                if tel.state == DroneState::Charging {
                    tel.battery_pct = (tel.battery_pct
                        + self.limits.recharge_pct_per_sec * consumed as f64)
                        .min(100.0);
                }
                if tel.pause_remaining_secs > 0 {
                    continue;
                }
                if !tel.mission_complete() {
                    tel.state = DroneState::Flying;
                    self.apply_state_hook(&tel.drone_id, DroneState::Flying);
                }
            }

            // Consume the distance budget segment by segment.
            while budget_km > 0.0 && tel.in_mission {
                let a = tel.path[tel.segment_idx];
                let b = tel.path[tel.segment_idx + 1];
                let seg_len = a.distance_to(&b);
                let seg_rest = seg_len - tel.progress_km;

                if budget_km >= seg_rest - EPSILON {
                    // Waypoint reached: snap, drain, transition.
                    budget_km -= seg_rest;
                    tel.position = b;
                    tel.battery_pct =
                        (tel.battery_pct - drone.consumption_for(seg_rest)).max(0.0);
                    tel.segment_idx += 1;
                    tel.progress_km = 0.0;

                    if tel.mission_complete() {
                        tel.finish_mission();
                        self.apply_state_hook(&tel.drone_id, DroneState::Idle);
                        if let Some(q) = state
                            .queues
                            .iter_mut()
                            .find(|q| q.drone_id == tel.drone_id)
                        {
                            q.missions.pop_front();
                        }
                        // Next queued mission starts on the next tick.
                        break;
                    }

                    if tel.at_delivery_point() {
                        tel.state = DroneState::Delivering;
                        self.apply_state_hook(&tel.drone_id, DroneState::Delivering);
                        tel.pause_remaining_secs = self.limits.delivery_pause_secs;
                        break;
                    } else if tel.position.is_base() && !tel.at_route_start() {
                        // Mid-route base pit stop inserted by SMART planning.
                        tel.state = DroneState::Charging;
                        self.apply_state_hook(&tel.drone_id, DroneState::Charging);
                        tel.pause_remaining_secs = self.limits.recharge_pause_secs;
                        break;
                    }
                    tel.state = DroneState::Flying;
                    self.apply_state_hook(&tel.drone_id, DroneState::Flying);
                } else {
                    // Partial progress within the segment.
                    let frac = ((tel.progress_km + budget_km) / seg_len).min(1.0);
                    tel.position =
                        Point::new(a.x + (b.x - a.x) * frac, a.y + (b.y - a.y) * frac);
                    tel.progress_km += budget_km;
                    tel.battery_pct =
                        (tel.battery_pct - drone.consumption_for(budget_km)).max(0.0);
                    budget_km = 0.0;
                }
            }

            // Homeward leg shows as RETURNING.
            if tel.in_mission && tel.next_waypoint_is_final_base() {
                tel.state = DroneState::Returning;
                self.apply_state_hook(&tel.drone_id, DroneState::Returning);
            }
        }
    }

    /// Configure the driver mode. AUTOMATIC spawns a periodic task that
    /// issues one-second ticks strictly sequentially; MANUAL cancels any
    /// running driver.
    pub fn start(self: &Arc<Self>, mode: Mode, tick_interval_ms: Option<u64>) {
        self.cancel_driver();
        let interval_ms = {
            let mut state = self.guard();
            if let Some(ms) = tick_interval_ms.filter(|ms| *ms > 0) {
                state.tick_interval_ms = ms;
            }
            state.mode = mode;
            state.tick_interval_ms
        };

        if mode == Mode::Automatic {
            let sim = Arc::clone(self);
            let handle = tokio::spawn(async move {
                let mut interval = tokio::time::interval(Duration::from_millis(interval_ms));
                interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
                loop {
                    interval.tick().await;
                    sim.tick(1);
                }
            });
            *self.driver_guard() = Some(handle);
            info!(interval_ms, "automatic driver started");
        }
    }

    /// Stop the automatic driver and fall back to MANUAL. An in-flight
    /// tick finishes; no further tick fires afterwards.
    pub fn stop(&self) {
        self.cancel_driver();
        self.guard().mode = Mode::Manual;
    }

    fn cancel_driver(&self) {
        if let Some(handle) = self.driver_guard().take() {
            handle.abort();
            debug!("automatic driver cancelled");
        }
    }

    /// Read-only status snapshot; stable between ticks.
    #[must_use]
    pub fn status(&self) -> SimStatus {
        let state = self.guard();
        let active = state.telemetry.iter().filter(|t| t.in_mission).count();
        let idle = self.fleet.len().saturating_sub(active);
        SimStatus {
            mode: state.mode.as_str().to_string(),
            active_drones: active,
            idle_drones: idle,
            tick_interval_ms: state.tick_interval_ms,
            pending_missions: state
                .queues
                .iter()
                .map(|q| PendingMissions {
                    drone_id: q.drone_id.clone(),
                    missions: q.missions.len(),
                })
                .collect(),
        }
    }

    /// Telemetry snapshots for every tracked drone.
    #[must_use]
    pub fn telemetry(&self) -> Vec<TelemetrySnapshot> {
        self.guard()
            .telemetry
            .iter()
            .map(TelemetrySnapshot::from_telemetry)
            .collect()
    }

    /// Telemetry for one drone; unknown ids get a placeholder row rather
    /// than an error.
    #[must_use]
    pub fn telemetry_for(&self, drone_id: &str) -> TelemetrySnapshot {
        self.guard()
            .telemetry
            .iter()
            .find(|t| t.drone_id == drone_id)
            .map_or_else(
                || TelemetrySnapshot::unknown(drone_id),
                TelemetrySnapshot::from_telemetry,
            )
    }

    /// Delivery report over the last recorded plan.
    #[must_use]
    pub fn report(&self) -> Report {
        let state = self.guard();
        report::build(&state.last_plan, &state.planned_orders)
    }

    fn apply_state_hook(&self, drone_id: &str, state: DroneState) {
        // Unknown ids are tolerated: the registry entry may have been
        // removed mid-mission.
        if self.fleet.set_state(drone_id, state).is_err() {
            debug!(drone = drone_id, "state hook on unregistered drone");
        }
    }
}

impl Drop for Simulator {
    fn drop(&mut self) {
        if let Some(handle) = self.driver_guard().take() {
            handle.abort();
        }
    }
}
