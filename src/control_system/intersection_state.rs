use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::control_system::direction::Direction;

/// A consistent copy of the shared state, captured in one lock acquisition
/// so a scheduling decision never mixes fields from different moments.
#[derive(Debug, Clone)]
pub struct StateSnapshot {
    pub counts: HashMap<Direction, u32>,
    pub emergency_direction: Option<Direction>,
    pub active_direction: Direction,
}

impl StateSnapshot {
    /// Count for a direction; every direction has an entry, but a missing
    /// one still reads as zero rather than tripping the scheduler.
    pub fn count_for(&self, direction: Direction) -> u32 {
        self.counts.get(&direction).copied().unwrap_or(0)
    }
}

#[derive(Debug)]
struct StateFields {
    counts: HashMap<Direction, u32>,
    emergency_direction: Option<Direction>,
    active_direction: Direction,
}

/// The single source of truth for the intersection, shared between the
/// detection activity and the scheduler activity.
///
/// One mutex guards the whole triple. Field ownership is split by role:
/// the detection side writes counts and raises emergencies, the scheduler
/// side moves the green and clears emergencies. Cloning the handle shares
/// the same underlying state.
#[derive(Debug, Clone)]
pub struct IntersectionState {
    fields: Arc<Mutex<StateFields>>,
}

impl IntersectionState {
    /// Creates the state with every count at zero, no emergency, and the
    /// green on the given first direction of the rotation.
    pub fn new(first_active: Direction) -> Self {
        let mut counts = HashMap::new();
        for direction in Direction::ROTATION {
            counts.insert(direction, 0);
        }
        Self {
            fields: Arc::new(Mutex::new(StateFields {
                counts,
                emergency_direction: None,
                active_direction: first_active,
            })),
        }
    }

    /// Stores the latest detection result for a direction. The previous
    /// count is overwritten; the last observation wins. An emergency flag
    /// raises the emergency for that direction and keeps it raised until
    /// the scheduler clears it, even if later frames for the same
    /// direction report no emergency. When several directions report
    /// emergencies, the last writer wins.
    pub fn record_observation(&self, direction: Direction, vehicle_count: u32, emergency: bool) {
        let mut fields = self.fields.lock().unwrap();
        fields.counts.insert(direction, vehicle_count);
        if emergency {
            fields.emergency_direction = Some(direction);
        }
    }

    /// Called by the scheduler once an emergency phase has been served.
    pub fn clear_emergency(&self) {
        let mut fields = self.fields.lock().unwrap();
        fields.emergency_direction = None;
    }

    /// Called by the scheduler when the green moves to another direction.
    pub fn set_active_direction(&self, direction: Direction) {
        let mut fields = self.fields.lock().unwrap();
        fields.active_direction = direction;
    }

    /// Captures counts, emergency flag and active direction together.
    pub fn snapshot(&self) -> StateSnapshot {
        let fields = self.fields.lock().unwrap();
        StateSnapshot {
            counts: fields.counts.clone(),
            emergency_direction: fields.emergency_direction,
            active_direction: fields.active_direction,
        }
    }
}
