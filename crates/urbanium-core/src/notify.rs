//! Tick-completed notifications.
//!
//! [`TickNotifier`] is a [`TickCallback`] that publishes one
//! [`TickNotification`] per completed tick on a broadcast channel. Each
//! notification carries an immutable snapshot of the world state, so
//! subscribers can read it at their own pace without touching the state
//! the scheduler is mutating.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use urbanium_types::MetricsSnapshot;

use crate::runner::TickCallback;
use crate::tick::TickSummary;
use crate::world::WorldState;

/// Notifications buffered per subscriber.
///
/// A subscriber that falls further behind receives
/// [`broadcast::error::RecvError::Lagged`] and skips to the newest entry.
const NOTIFICATION_CAPACITY: usize = 64;

/// Published after every completed tick.
#[derive(Debug, Clone)]
pub struct TickNotification {
    /// The tick that completed.
    pub tick: u64,
    /// Simulation time of the tick.
    pub time: DateTime<Utc>,
    /// Descriptions of the tick's events, in order.
    pub events: Vec<String>,
    /// Metrics recorded at the end of the tick.
    pub metrics: MetricsSnapshot,
    /// Read-only snapshot of the world after the tick.
    pub state: Arc<WorldState>,
}

/// Publishes tick notifications to any number of subscribers.
#[derive(Debug, Clone)]
pub struct TickNotifier {
    tx: broadcast::Sender<Arc<TickNotification>>,
}

impl TickNotifier {
    /// A notifier with no subscribers yet.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(NOTIFICATION_CAPACITY);
        Self { tx }
    }

    /// Subscribe to notifications published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<TickNotification>> {
        self.tx.subscribe()
    }

    /// Publish one notification.
    ///
    /// Returns the number of subscribers that received it; 0 when nobody
    /// is listening.
    pub fn publish(&self, notification: TickNotification) -> usize {
        self.tx.send(Arc::new(notification)).unwrap_or(0)
    }
}

impl Default for TickNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl TickCallback for TickNotifier {
    fn on_tick(&mut self, summary: &TickSummary, state: &WorldState) {
        if self.tx.receiver_count() == 0 {
            return;
        }
        self.publish(TickNotification {
            tick: summary.tick,
            time: summary.time,
            events: summary.event_descriptions(),
            metrics: summary.metrics.clone(),
            state: Arc::new(state.clone()),
        });
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::UrbaniumConfig;
    use crate::tick::run_tick;

    fn state() -> WorldState {
        let mut config = UrbaniumConfig::default();
        config.scenario.population = 8;
        config.scenario.districts = 3;
        config.scenario.housing_units = 6;
        config.scenario.employers = 2;
        config.scenario.job_listings = 2;
        WorldState::initialize(config).unwrap()
    }

    #[test]
    fn publish_without_subscribers_is_not_an_error() {
        let notifier = TickNotifier::new();
        let state = state();
        let delivered = notifier.publish(TickNotification {
            tick: 0,
            time: state.time(),
            events: Vec::new(),
            metrics: state.metrics.latest().unwrap().clone(),
            state: Arc::new(state),
        });
        assert_eq!(delivered, 0);
    }

    #[tokio::test]
    async fn subscriber_receives_snapshot() {
        let mut notifier = TickNotifier::new();
        let mut rx = notifier.subscribe();
        let mut state = state();

        let summary = run_tick(&mut state, None).unwrap();
        notifier.on_tick(&summary, &state);
        run_tick(&mut state, None).unwrap();

        let notification = rx.recv().await.unwrap();
        assert_eq!(notification.tick, 1);
        assert_eq!(notification.metrics, summary.metrics);
        assert_eq!(notification.events, summary.event_descriptions());
        // The snapshot is frozen at tick 1 while the live state moved on.
        assert_eq!(notification.state.tick(), 1);
        assert_eq!(state.tick(), 2);
    }
}
