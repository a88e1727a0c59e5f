use adaptive_signal_control::control_system::direction::Direction;
use adaptive_signal_control::control_system::event_publisher::{
    start_phase_event_bridge, EventPublisher,
};
use adaptive_signal_control::control_system::intersection_state::IntersectionState;
use adaptive_signal_control::control_system::signal_scheduler::{SchedulerConfig, SignalScheduler};
use adaptive_signal_control::detection::feed::start_observation_consumer;
use adaptive_signal_control::detection::simulator::{run_local_feed, SimulatorConfig};
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};

#[tokio::main]
async fn main() {
    env_logger::init();
    println!("Starting signal control...");

    // With --local the detector runs in-process and no broker is needed.
    let local_mode = std::env::args().any(|arg| arg == "--local");

    let config = SchedulerConfig::default();
    let state = IntersectionState::new(config.rotation_order[0]);
    let publisher = Arc::new(Mutex::new(EventPublisher::new()));

    // Signal display: prints every phase change to the console.
    let mut display_rx = publisher.lock().unwrap().subscribe("signal_display");
    tokio::spawn(async move {
        while let Some(event) = display_rx.recv().await {
            let red: Vec<&str> = Direction::ROTATION
                .iter()
                .filter(|d| **d != event.direction)
                .map(|d| d.label())
                .collect();
            if event.is_emergency {
                println!(
                    "[SignalDisplay] EMERGENCY: Green for {} ({}s) and Red for {:?}",
                    event.direction, event.duration_secs, red
                );
            } else {
                println!(
                    "[SignalDisplay] Green for {} ({}s) and Red for {:?}",
                    event.direction, event.duration_secs, red
                );
            }
        }
    });

    let scheduler = SignalScheduler::new(config, state.clone(), Arc::clone(&publisher));
    let shutdown = scheduler.shutdown_flag();

    if local_mode {
        tokio::spawn(run_local_feed(
            state.clone(),
            SimulatorConfig::default(),
            Arc::clone(&shutdown),
        ));
    } else {
        // Phase events go out to the monitor over RabbitMQ.
        let bridge_rx = publisher.lock().unwrap().subscribe("rabbitmq_bridge");
        tokio::spawn(async move {
            if let Err(e) = start_phase_event_bridge(bridge_rx).await {
                eprintln!("Phase event bridge error: {}", e);
            }
        });

        let consumer_state = state.clone();
        tokio::spawn(async move {
            if let Err(e) = start_observation_consumer(consumer_state).await {
                eprintln!("Observation consumer error: {}", e);
            }
        });
    }

    let shutdown_for_signal = Arc::clone(&shutdown);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            println!("\nShutdown requested, finishing current phase...");
            shutdown_for_signal.store(true, Ordering::SeqCst);
        }
    });

    scheduler.run().await;
}
