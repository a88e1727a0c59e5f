use adaptive_signal_control::detection::simulator::{run_feed_publisher, SimulatorConfig};

fn main() {
    env_logger::init();
    println!("Starting detection feed...");
    if let Err(e) = run_feed_publisher(SimulatorConfig::default()) {
        eprintln!("Detection feed error: {}", e);
    }
}
