use crate::control_system::direction::Direction;
use crate::control_system::intersection_state::IntersectionState;
use crate::detection::feed::apply_observation;
use crate::global_variables::{AMQP_URL, QUEUE_VEHICLE_OBSERVATIONS};
use crate::shared_data::{current_timestamp, ObservationRecord};
use amiquip::{Connection, Exchange, Publish, QueueDeclareOptions, Result as AmiquipResult};
use rand::Rng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::time::{sleep, Duration};

/// Tuning for the synthetic detector loops.
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    /// Seconds between reports.
    pub interval_secs: u64,
    /// Upper bound on a generated vehicle count.
    pub max_vehicles: u32,
    /// Chance that a report carries an emergency flag.
    pub emergency_probability: f64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            interval_secs: 1,
            max_vehicles: 25,
            emergency_probability: 0.02,
        }
    }
}

/// Builds one synthetic detection report for a random approach.
pub fn random_observation(config: &SimulatorConfig) -> ObservationRecord {
    let mut rng = rand::rng();
    let direction = Direction::ROTATION[rng.random_range(0..Direction::ROTATION.len())];
    ObservationRecord {
        timestamp: current_timestamp(),
        direction: direction.label().to_string(),
        vehicle_count: rng.random_range(0..=config.max_vehicles) as i64,
        emergency: rng.random_bool(config.emergency_probability),
    }
}

/// Feeds synthetic reports straight into the shared record, with no broker
/// in between. Used when the whole system runs in one process.
pub async fn run_local_feed(
    state: IntersectionState,
    config: SimulatorConfig,
    shutdown: Arc<AtomicBool>,
) {
    println!(
        "[DetectionFeed] Local simulator started (report every {}s)",
        config.interval_secs
    );
    while !shutdown.load(Ordering::SeqCst) {
        let record = random_observation(&config);
        apply_observation(&state, &record);
        sleep(Duration::from_secs(config.interval_secs)).await;
    }
    println!("[DetectionFeed] Local simulator stopped");
}

/// Publishes synthetic reports onto the observation queue until the process
/// is killed. Drives the control process from the outside, the way a real
/// roadside detector would.
pub fn run_feed_publisher(config: SimulatorConfig) -> AmiquipResult<()> {
    let mut connection = Connection::insecure_open(AMQP_URL)?;
    let channel = connection.open_channel(None)?;
    let exchange = Exchange::direct(&channel);
    channel.queue_declare(QUEUE_VEHICLE_OBSERVATIONS, QueueDeclareOptions::default())?;
    println!(
        "[DetectionFeed] Publishing reports to '{}' every {}s",
        QUEUE_VEHICLE_OBSERVATIONS, config.interval_secs
    );

    loop {
        let record = random_observation(&config);
        if let Ok(payload) = serde_json::to_string(&record) {
            exchange.publish(Publish::new(payload.as_bytes(), QUEUE_VEHICLE_OBSERVATIONS))?;
            if record.emergency {
                println!(
                    "[DetectionFeed] Sent EMERGENCY report for {}",
                    record.direction
                );
            } else {
                log::info!(
                    "[DetectionFeed] Sent report: {} vehicles on {}",
                    record.vehicle_count,
                    record.direction
                );
            }
        }
        std::thread::sleep(std::time::Duration::from_secs(config.interval_secs));
    }
}
