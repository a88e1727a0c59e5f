use adaptive_signal_control::monitoring::phase_monitoring::{listen_phase_events, run_cli};
use tokio::join;

#[tokio::main]
async fn main() {
    env_logger::init();

    // Spawn the phase event listener concurrently with the CLI.
    let phase_listener = tokio::spawn(async {
        if let Err(e) = listen_phase_events().await {
            eprintln!("Error in phase events listener: {}", e);
        }
    });

    // Run the admin CLI concurrently.
    let cli_handle = tokio::spawn(async {
        run_cli().await;
    });

    // Wait for all tasks to complete (the CLI will exit on its own).
    let _ = join!(phase_listener, cli_handle);
}
