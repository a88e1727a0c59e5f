pub mod direction;
pub mod event_publisher;
pub mod intersection_state;
pub mod signal_scheduler;

// Re-export the items that make up the control surface
pub use direction::Direction;
pub use event_publisher::{start_phase_event_bridge, EventPublisher, PhaseEvent};
pub use intersection_state::{IntersectionState, StateSnapshot};
pub use signal_scheduler::{
    busiest_direction, default_count_bonus, green_duration, next_in_rotation, SchedulerConfig,
    SchedulerMode, SignalScheduler,
};
