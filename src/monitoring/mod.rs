pub mod phase_monitoring;

// Re-export the items from phase_monitoring
pub use phase_monitoring::{
    generate_report_summary, listen_phase_events, log_phase_record, run_cli, show_green_time_chart,
    show_phase_history,
};
