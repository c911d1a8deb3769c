//! Logs tick notifications as they are published.

use std::sync::Arc;

use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, warn};
use urbanium_core::TickNotification;

/// Log every notification until the channel closes.
///
/// Returns the number of notifications handled.
pub async fn log_notifications(mut rx: broadcast::Receiver<Arc<TickNotification>>) -> u64 {
    let mut handled: u64 = 0;
    loop {
        match rx.recv().await {
            Ok(notification) => {
                handled = handled.saturating_add(1);
                for event in &notification.events {
                    info!(tick = notification.tick, event = %event, "World event");
                }
                let metrics = &notification.metrics;
                debug!(
                    tick = notification.tick,
                    time = %notification.time,
                    population = metrics.population,
                    employment_rate = metrics.employment_rate,
                    average_wage = %metrics.average_wage,
                    rent_index = %metrics.rent_index,
                    gini = metrics.gini,
                    homeless = metrics.homeless_count,
                    open_positions = metrics.open_positions,
                    "Tick metrics"
                );
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "Notification subscriber lagged");
            }
            Err(RecvError::Closed) => break,
        }
    }
    handled
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use urbanium_core::{
        OperatorState, TickNotifier, UrbaniumConfig, WorldState, run_simulation,
    };

    use super::*;

    #[tokio::test]
    async fn handles_every_tick_then_stops_when_closed() {
        let mut config = UrbaniumConfig::default();
        config.scenario.population = 10;
        config.scenario.districts = 3;
        config.scenario.employers = 2;
        config.scenario.housing_units = 8;
        config.scenario.job_listings = 3;
        let mut state = WorldState::initialize(config).unwrap();

        let mut notifier = TickNotifier::new();
        let logger = tokio::spawn(log_notifications(notifier.subscribe()));

        let operator = Arc::new(OperatorState::new(0, 4));
        operator.start();
        run_simulation(&mut state, None, &operator, &mut notifier)
            .await
            .unwrap();
        drop(notifier);

        assert_eq!(logger.await.unwrap(), 4);
    }
}
