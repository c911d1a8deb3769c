//! Operator control state for the run loop.
//!
//! The scheduler has two states, [`RunState::Stopped`] and
//! [`RunState::Running`]. [`OperatorState::start`] and
//! [`OperatorState::stop`] toggle the run flag; the run loop waits on a
//! [`Notify`] while stopped. A shutdown request ends the loop for good.
//!
//! All control fields are atomics so the handle can be shared through an
//! [`Arc`](std::sync::Arc) between the run loop and whatever drives it.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, Notify};

use crate::config::SimulationConfig;

/// Whether ticks are being produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    /// The loop is idle and waits for [`OperatorState::start`].
    Stopped,
    /// The loop is ticking.
    Running,
}

/// Reason why the run loop ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimulationEndReason {
    /// Reached the configured `max_ticks` limit.
    MaxTicksReached,
    /// Shutdown was requested.
    Shutdown,
}

/// Shared run-loop control state.
#[derive(Debug)]
pub struct OperatorState {
    /// Run flag.
    running: AtomicBool,

    /// Wakes the loop on start and on shutdown.
    wake: Notify,

    /// Set once shutdown has been requested.
    shutdown_requested: AtomicBool,

    /// Real-time pause between ticks, adjustable at runtime.
    tick_interval_ms: AtomicU64,

    /// Tick at which the loop ends (0 = unlimited).
    max_ticks: u64,

    /// Why the loop ended, once it has.
    end_reason: Mutex<Option<SimulationEndReason>>,
}

impl OperatorState {
    /// A stopped operator with the given bounds.
    pub fn new(tick_interval_ms: u64, max_ticks: u64) -> Self {
        Self {
            running: AtomicBool::new(false),
            wake: Notify::new(),
            shutdown_requested: AtomicBool::new(false),
            tick_interval_ms: AtomicU64::new(tick_interval_ms),
            max_ticks,
            end_reason: Mutex::new(None),
        }
    }

    /// A stopped operator using the bounds from `config`.
    pub fn from_config(config: &SimulationConfig) -> Self {
        Self::new(config.tick_interval_ms, config.max_ticks)
    }

    // -----------------------------------------------------------------------
    // Start / Stop
    // -----------------------------------------------------------------------

    /// Set the run flag and wake the loop.
    pub fn start(&self) {
        self.running.store(true, Ordering::Release);
        self.wake.notify_one();
    }

    /// Clear the run flag. The loop finishes the current tick, then waits.
    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
    }

    /// Current run state.
    pub fn run_state(&self) -> RunState {
        if self.running.load(Ordering::Acquire) {
            RunState::Running
        } else {
            RunState::Stopped
        }
    }

    /// Whether the run flag is set.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Wait until the loop may tick.
    ///
    /// Returns immediately when running or when shutdown was requested.
    pub async fn wait_until_running(&self) {
        while !self.is_running() && !self.is_shutdown_requested() {
            self.wake.notified().await;
        }
    }

    // -----------------------------------------------------------------------
    // Shutdown
    // -----------------------------------------------------------------------

    /// Ask the loop to end after the current tick, waking it if stopped.
    pub fn request_shutdown(&self) {
        self.shutdown_requested.store(true, Ordering::Release);
        self.wake.notify_one();
    }

    /// Whether shutdown has been requested.
    pub fn is_shutdown_requested(&self) -> bool {
        self.shutdown_requested.load(Ordering::Acquire)
    }

    /// Record the reason the loop ended.
    pub async fn set_end_reason(&self, reason: SimulationEndReason) {
        let mut guard = self.end_reason.lock().await;
        *guard = Some(reason);
    }

    /// The reason the loop ended, if it has.
    pub async fn end_reason(&self) -> Option<SimulationEndReason> {
        self.end_reason.lock().await.clone()
    }

    // -----------------------------------------------------------------------
    // Pacing and bounds
    // -----------------------------------------------------------------------

    /// Current pause between ticks in milliseconds.
    pub fn tick_interval_ms(&self) -> u64 {
        self.tick_interval_ms.load(Ordering::Acquire)
    }

    /// Change the pause between ticks. Returns the previous value.
    pub fn set_tick_interval_ms(&self, ms: u64) -> u64 {
        self.tick_interval_ms.swap(ms, Ordering::AcqRel)
    }

    /// Whether `current_tick` has reached a non-zero `max_ticks`.
    pub const fn tick_limit_reached(&self, current_tick: u64) -> bool {
        self.max_ticks > 0 && current_tick >= self.max_ticks
    }

    /// The configured tick limit (0 = unlimited).
    pub const fn max_ticks(&self) -> u64 {
        self.max_ticks
    }
}
