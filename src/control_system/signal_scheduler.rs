use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::time::{sleep, Duration, Instant};

use crate::control_system::direction::Direction;
use crate::control_system::event_publisher::{EventPublisher, PhaseEvent};
use crate::control_system::intersection_state::{IntersectionState, StateSnapshot};
use crate::global_variables::{
    DEFAULT_BASE_GREEN_SECS, DEFAULT_EMERGENCY_GREEN_SECS, DEFAULT_MAX_GREEN_SECS,
    PHASE_POLL_MILLIS,
};

/// Timing policy for the intersection. Built once at startup and treated
/// as immutable afterwards.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Shortest green any direction receives.
    pub base_green_secs: u64,
    /// Longest green a normal phase may stretch to.
    pub max_green_secs: u64,
    /// Fixed length of an emergency green.
    pub emergency_green_secs: u64,
    /// Cyclic order in which directions take the green. Fixed for the
    /// lifetime of the scheduler.
    pub rotation_order: Vec<Direction>,
    /// Extra green seconds granted for the active direction's own count.
    /// Must be non-decreasing in the count.
    pub count_bonus: fn(u32) -> u64,
    /// How often a waiting phase re-checks for emergencies and shutdown.
    pub poll_interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            base_green_secs: DEFAULT_BASE_GREEN_SECS,
            max_green_secs: DEFAULT_MAX_GREEN_SECS,
            emergency_green_secs: DEFAULT_EMERGENCY_GREEN_SECS,
            rotation_order: Direction::ROTATION.to_vec(),
            count_bonus: default_count_bonus,
            poll_interval: Duration::from_millis(PHASE_POLL_MILLIS),
        }
    }
}

/// Default density bonus: one extra second for every two vehicles.
pub fn default_count_bonus(count: u32) -> u64 {
    (count / 2) as u64
}

/// Clamped green time for a normal phase, driven by the active direction's
/// own vehicle count.
pub fn green_duration(config: &SchedulerConfig, active_count: u32) -> u64 {
    let extended = config
        .base_green_secs
        .saturating_add((config.count_bonus)(active_count));
    extended.min(config.max_green_secs)
}

/// Direction holding the most vehicles in the snapshot. Ties go to the
/// direction appearing first in the rotation order, so the choice is
/// reproducible for identical inputs. `rotation_order` must be non-empty.
pub fn busiest_direction(
    counts: &HashMap<Direction, u32>,
    rotation_order: &[Direction],
) -> Direction {
    let mut best = rotation_order[0];
    let mut best_count = counts.get(&best).copied().unwrap_or(0);
    for &direction in &rotation_order[1..] {
        let count = counts.get(&direction).copied().unwrap_or(0);
        if count > best_count {
            best = direction;
            best_count = count;
        }
    }
    best
}

/// Successor of `current` in the cyclic rotation order.
pub fn next_in_rotation(rotation_order: &[Direction], current: Direction) -> Direction {
    let idx = rotation_order
        .iter()
        .position(|&d| d == current)
        .unwrap_or(0);
    rotation_order[(idx + 1) % rotation_order.len()]
}

/// Operating mode of the control loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerMode {
    NormalRotation,
    EmergencyOverride,
}

/// How a phase wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WaitOutcome {
    Elapsed,
    EmergencyFlagged,
    ShutdownRequested,
}

/// The control loop producing the sequence of green phases.
///
/// One decision per phase boundary: take a snapshot, serve an emergency if
/// one is raised, otherwise grant the next direction in rotation a green
/// sized by its own vehicle count. Every phase is published before the
/// loop suspends for its duration.
pub struct SignalScheduler {
    config: SchedulerConfig,
    state: IntersectionState,
    publisher: Arc<Mutex<EventPublisher>>,
    shutdown: Arc<AtomicBool>,
    mode: SchedulerMode,
    /// Direction whose turn the next normal phase is. An emergency
    /// override leaves this untouched, which is what lets rotation resume
    /// where it was paused instead of resetting.
    up_next: Direction,
}

impl SignalScheduler {
    pub fn new(
        config: SchedulerConfig,
        state: IntersectionState,
        publisher: Arc<Mutex<EventPublisher>>,
    ) -> Self {
        let mut config = config;
        if config.rotation_order.is_empty() {
            log::warn!("[Scheduler] Empty rotation order; falling back to the standard rotation");
            config.rotation_order = Direction::ROTATION.to_vec();
        }
        let up_next = config.rotation_order[0];
        Self {
            config,
            state,
            publisher,
            shutdown: Arc::new(AtomicBool::new(false)),
            mode: SchedulerMode::NormalRotation,
            up_next,
        }
    }

    /// Flag the owning process raises to stop the loop. Takes effect at
    /// the next tick or poll slice.
    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Runs until the shutdown flag is raised. Data anomalies never end
    /// the loop; with no observations at all it still rotates every
    /// direction at the base green.
    pub async fn run(mut self) {
        log::info!(
            "[Scheduler] Control loop starting; rotation {:?}",
            self.config.rotation_order
        );
        loop {
            if self.shutdown.load(Ordering::SeqCst) {
                break;
            }
            let snapshot = self.state.snapshot();
            let outcome = match snapshot.emergency_direction {
                Some(emergency) => self.run_emergency_phase(emergency).await,
                None => self.run_normal_phase(&snapshot).await,
            };
            if outcome == WaitOutcome::ShutdownRequested {
                break;
            }
        }
        log::info!("[Scheduler] Control loop stopped");
    }

    /// Serves a preemptive green to the direction reporting an emergency,
    /// for the fixed emergency duration.
    async fn run_emergency_phase(&mut self, emergency: Direction) -> WaitOutcome {
        if self.mode != SchedulerMode::EmergencyOverride {
            self.mode = SchedulerMode::EmergencyOverride;
            println!(
                "[Scheduler] EMERGENCY OVERRIDE: green for {} ({}s); rotation paused before {}",
                emergency, self.config.emergency_green_secs, self.up_next
            );
        }
        self.state.set_active_direction(emergency);
        self.publish_phase(emergency, self.config.emergency_green_secs, true);

        // An emergency reported while one is being served cannot cut this
        // phase short; only shutdown can.
        let outcome = self
            .wait_phase(self.config.emergency_green_secs, false)
            .await;
        if outcome == WaitOutcome::ShutdownRequested {
            return outcome;
        }

        self.state.clear_emergency();
        self.mode = SchedulerMode::NormalRotation;
        println!(
            "[Scheduler] Emergency served; resuming rotation at {}",
            self.up_next
        );
        outcome
    }

    /// Grants the next direction in rotation a green sized by its own
    /// vehicle count, then advances the rotation.
    async fn run_normal_phase(&mut self, snapshot: &StateSnapshot) -> WaitOutcome {
        let active = self.up_next;
        self.state.set_active_direction(active);

        // Two counts, two jobs: the busiest approach is only reported for
        // operators, while the active approach's own count decides how
        // long it holds the green.
        let busiest = busiest_direction(&snapshot.counts, &self.config.rotation_order);
        let duration = green_duration(&self.config, snapshot.count_for(active));
        log::info!(
            "[Scheduler] Green for {} ({}s, own count {}; busiest: {} with {})",
            active,
            duration,
            snapshot.count_for(active),
            busiest,
            snapshot.count_for(busiest)
        );

        self.publish_phase(active, duration, false);
        let outcome = self.wait_phase(duration, true).await;
        if outcome == WaitOutcome::EmergencyFlagged {
            log::info!("[Scheduler] Phase for {} cut short by an emergency", active);
        }
        if outcome != WaitOutcome::ShutdownRequested {
            self.up_next = next_in_rotation(&self.config.rotation_order, active);
        }
        outcome
    }

    fn publish_phase(&self, direction: Direction, duration_secs: u64, is_emergency: bool) {
        let mut publisher = self.publisher.lock().unwrap();
        publisher.publish(PhaseEvent {
            direction,
            duration_secs,
            is_emergency,
        });
    }

    /// Sleeps out a phase in short slices so the loop can wake early for
    /// an emergency (normal phases only) or for shutdown, instead of
    /// waiting out the remaining green.
    async fn wait_phase(&self, duration_secs: u64, wake_on_emergency: bool) -> WaitOutcome {
        let deadline = Instant::now() + Duration::from_secs(duration_secs);
        loop {
            if self.shutdown.load(Ordering::SeqCst) {
                return WaitOutcome::ShutdownRequested;
            }
            if wake_on_emergency && self.state.snapshot().emergency_direction.is_some() {
                return WaitOutcome::EmergencyFlagged;
            }
            let now = Instant::now();
            if now >= deadline {
                return WaitOutcome::Elapsed;
            }
            let slice = self.config.poll_interval.min(deadline - now);
            sleep(slice).await;
        }
    }
}
