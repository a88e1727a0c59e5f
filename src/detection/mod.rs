pub mod feed;
pub mod simulator;

// Re-export the items from the feed and simulator
pub use feed::{apply_observation, start_observation_consumer};
pub use simulator::{random_observation, run_feed_publisher, run_local_feed, SimulatorConfig};
