// src/shared_data.rs

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// One detection result for one approach, as published by the camera side.
///
/// The direction travels as a plain label and the count as a signed value,
/// so the control side validates both at its boundary: unknown labels are
/// rejected, negative counts are clamped to zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservationRecord {
    pub timestamp: u64,
    pub direction: String,
    pub vehicle_count: i64,
    pub emergency: bool,
}

/// One granted green phase, as republished for monitoring consumers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseRecord {
    pub timestamp: u64,
    pub direction: String,
    pub duration_secs: u64,
    pub is_emergency: bool,
}

pub fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}
