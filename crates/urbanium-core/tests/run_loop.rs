//! Integration tests for the async run loop and tick notifications.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use urbanium_core::{
    OperatorState, RunState, SimulationEndReason, TickNotifier, UrbaniumConfig, WorldState,
    run_simulation,
};

fn state(max_ticks: u64) -> WorldState {
    let mut config = UrbaniumConfig::default();
    config.simulation.max_ticks = max_ticks;
    config.scenario.population = 12;
    config.scenario.districts = 3;
    config.scenario.employers = 2;
    config.scenario.housing_units = 10;
    config.scenario.job_listings = 4;
    WorldState::initialize(config).unwrap()
}

#[tokio::test]
async fn notifications_follow_every_tick() {
    let mut state = state(6);
    let operator = Arc::new(OperatorState::from_config(&state.config.simulation));
    operator.start();
    let mut notifier = TickNotifier::new();
    let mut rx = notifier.subscribe();

    let result = run_simulation(&mut state, None, &operator, &mut notifier)
        .await
        .unwrap();
    assert_eq!(result.end_reason, SimulationEndReason::MaxTicksReached);
    assert_eq!(result.total_ticks, 6);

    let mut seen = Vec::new();
    while let Ok(notification) = rx.try_recv() {
        assert_eq!(notification.state.tick(), notification.tick);
        assert_eq!(notification.metrics.tick, notification.tick);
        seen.push(notification.tick);
    }
    assert_eq!(seen, vec![1, 2, 3, 4, 5, 6]);
    assert_eq!(operator.run_state(), RunState::Stopped);
}

#[tokio::test]
async fn shutdown_from_another_task_ends_an_unbounded_run() {
    let mut state = state(0);
    let operator = Arc::new(OperatorState::new(5, 0));
    operator.start();
    let stopper = {
        let operator = Arc::clone(&operator);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(40)).await;
            operator.request_shutdown();
        })
    };

    let mut notifier = TickNotifier::new();
    let result = tokio::time::timeout(
        Duration::from_secs(10),
        run_simulation(&mut state, None, &operator, &mut notifier),
    )
    .await
    .unwrap()
    .unwrap();
    stopper.await.unwrap();

    assert_eq!(result.end_reason, SimulationEndReason::Shutdown);
    assert_eq!(result.total_ticks, state.tick());
    assert_eq!(
        operator.end_reason().await,
        Some(SimulationEndReason::Shutdown)
    );
}

#[tokio::test]
async fn continuing_a_run_picks_up_where_it_stopped() {
    let mut state = state(4);
    let operator = Arc::new(OperatorState::new(0, 4));
    operator.start();
    let mut notifier = TickNotifier::new();
    run_simulation(&mut state, None, &operator, &mut notifier)
        .await
        .unwrap();
    assert_eq!(state.tick(), 4);

    let operator = Arc::new(OperatorState::new(0, 7));
    operator.start();
    let result = run_simulation(&mut state, None, &operator, &mut notifier)
        .await
        .unwrap();
    assert_eq!(result.total_ticks, 3);
    assert_eq!(state.tick(), 7);
}
