use crate::control_system::direction::Direction;
use crate::control_system::intersection_state::IntersectionState;
use crate::global_variables::{AMQP_URL, QUEUE_VEHICLE_OBSERVATIONS};
use crate::shared_data::ObservationRecord;
use amiquip::{
    Connection, ConsumerMessage, ConsumerOptions, QueueDeclareOptions, Result as AmiquipResult,
};
use tokio::task;

/// Applies one detection report to the shared intersection record.
///
/// Reports for unknown approaches are dropped so a misconfigured sensor
/// cannot poison the record; counts are clamped into the storable range.
/// Returns whether the report was accepted.
pub fn apply_observation(state: &IntersectionState, record: &ObservationRecord) -> bool {
    let direction = match Direction::parse(&record.direction) {
        Some(direction) => direction,
        None => {
            log::warn!(
                "[DetectionFeed] Dropping report for unknown approach '{}'",
                record.direction
            );
            return false;
        }
    };
    let count = record.vehicle_count.clamp(0, u32::MAX as i64) as u32;
    if i64::from(count) != record.vehicle_count {
        log::warn!(
            "[DetectionFeed] Clamped out-of-range count {} for {} to {}",
            record.vehicle_count,
            direction,
            count
        );
    }
    state.record_observation(direction, count, record.emergency);
    if record.emergency {
        println!("[DetectionFeed] Emergency vehicle reported on {}", direction);
    }
    true
}

/// Consumes detection reports from the observation queue and folds each one
/// into the shared record. Intended to be spawned alongside the scheduler.
pub async fn start_observation_consumer(state: IntersectionState) -> AmiquipResult<()> {
    task::spawn_blocking(move || -> AmiquipResult<()> {
        let mut connection = Connection::insecure_open(AMQP_URL)?;
        let channel = connection.open_channel(None)?;
        let queue =
            channel.queue_declare(QUEUE_VEHICLE_OBSERVATIONS, QueueDeclareOptions::default())?;
        let consumer = queue.consume(ConsumerOptions::default())?;
        println!(
            "[DetectionFeed] Waiting for reports on '{}'...",
            QUEUE_VEHICLE_OBSERVATIONS
        );

        for message in consumer.receiver() {
            match message {
                ConsumerMessage::Delivery(delivery) => {
                    if let Ok(json_str) = std::str::from_utf8(&delivery.body) {
                        match serde_json::from_str::<ObservationRecord>(json_str) {
                            Ok(record) => {
                                apply_observation(&state, &record);
                            }
                            Err(e) => {
                                log::warn!("[DetectionFeed] Ignoring malformed report: {}", e);
                            }
                        }
                    }
                    consumer.ack(delivery)?;
                }
                other => {
                    println!("[DetectionFeed] Consumer ended: {:?}", other);
                    break;
                }
            }
        }
        connection.close()
    })
    .await
    .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared_data::current_timestamp;

    fn report(direction: &str, count: i64, emergency: bool) -> ObservationRecord {
        ObservationRecord {
            timestamp: current_timestamp(),
            direction: direction.to_string(),
            vehicle_count: count,
            emergency,
        }
    }

    #[test]
    fn test_valid_report_updates_count() {
        let state = IntersectionState::new(Direction::North);
        assert!(apply_observation(&state, &report("east", 12, false)));
        let snapshot = state.snapshot();
        assert_eq!(snapshot.count_for(Direction::East), 12);
        assert_eq!(snapshot.emergency_direction, None);
    }

    #[test]
    fn test_unknown_approach_is_dropped() {
        let state = IntersectionState::new(Direction::North);
        assert!(!apply_observation(&state, &report("northeast", 5, false)));
        let snapshot = state.snapshot();
        for direction in Direction::ROTATION {
            assert_eq!(snapshot.count_for(direction), 0);
        }
    }

    #[test]
    fn test_negative_count_clamps_to_zero() {
        let state = IntersectionState::new(Direction::North);
        assert!(apply_observation(&state, &report("south", -7, false)));
        assert_eq!(state.snapshot().count_for(Direction::South), 0);
    }

    #[test]
    fn test_oversized_count_clamps_to_max() {
        let state = IntersectionState::new(Direction::North);
        assert!(apply_observation(&state, &report("west", i64::MAX, false)));
        assert_eq!(state.snapshot().count_for(Direction::West), u32::MAX);
    }

    #[test]
    fn test_emergency_report_raises_flag() {
        let state = IntersectionState::new(Direction::North);
        assert!(apply_observation(&state, &report("n", 3, true)));
        let snapshot = state.snapshot();
        assert_eq!(snapshot.emergency_direction, Some(Direction::North));
        assert_eq!(snapshot.count_for(Direction::North), 3);
    }

    #[test]
    fn test_non_emergency_report_leaves_flag_raised() {
        let state = IntersectionState::new(Direction::North);
        apply_observation(&state, &report("west", 2, true));
        apply_observation(&state, &report("east", 8, false));
        assert_eq!(
            state.snapshot().emergency_direction,
            Some(Direction::West)
        );
    }
}
