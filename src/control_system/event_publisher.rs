use amiquip::{Connection, Exchange, Publish, QueueDeclareOptions, Result as AmiquipResult};
use tokio::sync::mpsc;
use tokio::task;

use crate::control_system::direction::Direction;
use crate::global_variables::{AMQP_URL, QUEUE_PHASE_EVENTS};
use crate::shared_data::{current_timestamp, PhaseRecord};

/// Emitted once per granted green phase, in grant order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseEvent {
    pub direction: Direction,
    pub duration_secs: u64,
    pub is_emergency: bool,
}

/// Fan-out of phase events to display, logging and actuator consumers.
///
/// Every subscriber gets its own unbounded channel, so a slow consumer
/// backs up its own queue instead of the scheduler. A subscriber whose
/// receiving end is gone gets dropped from the list on the next publish;
/// the remaining subscribers still receive the event.
pub struct EventPublisher {
    subscribers: Vec<(String, mpsc::UnboundedSender<PhaseEvent>)>,
}

impl EventPublisher {
    pub fn new() -> Self {
        Self {
            subscribers: Vec::new(),
        }
    }

    /// Registers a named subscriber and returns its receiving end.
    /// Only phases granted after this call are delivered to it.
    pub fn subscribe(&mut self, name: &str) -> mpsc::UnboundedReceiver<PhaseEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push((name.to_string(), tx));
        rx
    }

    /// Sends the event to every subscriber registered at this point.
    /// Never blocks the caller.
    pub fn publish(&mut self, event: PhaseEvent) {
        self.subscribers.retain(|(name, tx)| {
            if let Err(e) = tx.send(event.clone()) {
                log::warn!("[Publisher] Dropping subscriber '{}': {}", name, e);
                false
            } else {
                true
            }
        });
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

/// Forwards phase events to the monitoring queue as JSON records.
///
/// Runs the broker I/O on a blocking thread so a slow or absent broker
/// never touches the scheduler; it only backs up this subscriber's own
/// channel. Ends when the publisher side drops the subscription.
pub async fn start_phase_event_bridge(
    mut rx: mpsc::UnboundedReceiver<PhaseEvent>,
) -> AmiquipResult<()> {
    task::spawn_blocking(move || -> AmiquipResult<()> {
        let mut connection = Connection::insecure_open(AMQP_URL)?;
        let channel = connection.open_channel(None)?;
        let exchange = Exchange::direct(&channel);
        channel.queue_declare(QUEUE_PHASE_EVENTS, QueueDeclareOptions::default())?;
        println!(
            "[Publisher] Forwarding phase events to '{}'...",
            QUEUE_PHASE_EVENTS
        );

        while let Some(event) = rx.blocking_recv() {
            let record = PhaseRecord {
                timestamp: current_timestamp(),
                direction: event.direction.label().to_string(),
                duration_secs: event.duration_secs,
                is_emergency: event.is_emergency,
            };
            match serde_json::to_string(&record) {
                Ok(payload) => {
                    exchange.publish(Publish::new(payload.as_bytes(), QUEUE_PHASE_EVENTS))?;
                }
                Err(e) => {
                    log::error!("[Publisher] Failed to serialize phase record: {}", e);
                }
            }
        }
        connection.close()
    })
    .await
    .unwrap()
}
