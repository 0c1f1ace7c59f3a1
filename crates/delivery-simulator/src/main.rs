//! Drone Delivery Simulator CLI
//!
//! Seeds a fleet and an order book, plans trips, and runs the execution
//! simulation, logging telemetry until every mission completes.

use anyhow::Result;
use clap::Parser;
use delivery_domain::{BatteryPolicy, NoFlyZone, Priority};
use delivery_routing::ObstacleSet;
use delivery_simulator::{FleetRegistry, Mode, SimLimits, Simulator};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "delivery-simulator")]
#[command(about = "Simulate drone delivery operations")]
struct Args {
    /// Number of drones in the fleet
    #[arg(short, long, default_value = "3")]
    drones: usize,

    /// Number of orders to seed
    #[arg(short, long, default_value = "8")]
    orders: usize,

    /// Battery policy: STRICT or SMART
    #[arg(short, long, default_value = "SMART")]
    policy: String,

    /// Tick interval in milliseconds for the automatic driver
    #[arg(long, default_value = "200")]
    tick_ms: u64,

    /// Wall-clock runtime budget in driver intervals
    #[arg(long, default_value = "600")]
    duration: u32,

    /// Add a demo no-fly zone between the base and the order area
    #[arg(long)]
    obstacle: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("delivery_simulator=info".parse()?),
        )
        .init();

    let args = Args::parse();
    let policy = match args.policy.to_uppercase().as_str() {
        "STRICT" => BatteryPolicy::Strict,
        _ => BatteryPolicy::Smart,
    };

    info!(
        "Starting delivery simulation: {} drones, {} orders, {:?} policy",
        args.drones, args.orders, policy
    );

    // Fleet
    let fleet = Arc::new(FleetRegistry::new(SimLimits::default()));
    for i in 0..args.drones {
        let id = format!("DRONE-{:02}", i + 1);
        fleet.create(&id, 8.0 + i as f64 * 2.0, 25.0, 50.0 + i as f64 * 10.0, 1.5)?;
    }

    // Order book
    let registry = delivery_simulator::OrderRegistry::new();
    let mut rng = rand::thread_rng();
    let priorities = [Priority::High, Priority::Medium, Priority::Low];
    for _ in 0..args.orders {
        let x: f64 = rng.gen_range(-8.0..8.0);
        let y: f64 = rng.gen_range(-8.0..8.0);
        let weight = rng.gen_range(0.5..5.0);
        let priority = priorities[rng.gen_range(0..priorities.len())];
        let order = registry.submit(x, y, weight, priority)?;
        info!(
            "Order #{} at ({:.1}, {:.1}) | {:.1} kg | {:?}",
            order.id, x, y, weight, priority
        );
    }

    // Obstacles
    let mut obstacles = ObstacleSet::new();
    if args.obstacle {
        obstacles.add(NoFlyZone::new(2.0, 2.0, 4.0, 4.0)?);
        info!("No-fly zone active: (2,2)-(4,4)");
    }

    // Plan
    let sim = Arc::new(Simulator::new(Arc::clone(&fleet), SimLimits::default()));
    let orders = registry.list();
    let trips = sim.plan(&orders, policy, &obstacles);
    info!("Plan: {} trips", trips.len());
    for t in &trips {
        info!(
            "  {} | orders {:?} | {:.2} km | ETA {:.2} min | feasible={} | recharges={}",
            t.drone_id, t.order_ids, t.distance_km, t.eta_minutes, t.feasible, t.recharge_stops
        );
    }

    // Execute
    sim.queue_last_plan()?;
    sim.start(Mode::Automatic, Some(args.tick_ms));
    info!("Status: {}", serde_json::to_string(&sim.status())?);

    for _ in 0..args.duration {
        sleep(Duration::from_millis(args.tick_ms)).await;

        let status = sim.status();
        for t in sim.telemetry() {
            info!(
                "{} | {} | ({:.2}, {:.2}) | battery {:.1}% | next wp {}",
                t.drone_id, t.state, t.x, t.y, t.battery_pct, t.next_waypoint_idx
            );
        }
        if status.active_drones == 0 {
            break;
        }
    }

    sim.stop();

    let report = sim.report();
    info!("Mission complete!");
    info!(
        "Delivered {} orders | mean ETA {:.2} min | most efficient: {}",
        report.delivered_count, report.mean_eta_minutes, report.most_efficient_drone
    );
    info!("Map:\n{}", report.ascii_map);

    Ok(())
}
