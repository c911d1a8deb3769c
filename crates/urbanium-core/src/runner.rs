//! Simulation run loop with operator controls.
//!
//! [`run_simulation`] drives [`run_tick`] until a termination condition is
//! met:
//!
//! - **Start/Stop**: while the operator's run flag is clear the loop waits
//! - **Bounded run**: ends once `max_ticks` ticks have completed
//! - **Pacing**: sleeps the operator's tick interval between ticks
//! - **Shutdown**: ends cleanly before the next tick
//! - **Fatal errors**: a [`TickError`] ends the loop and is returned
//!
//! [`run_tick`]: crate::tick::run_tick

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::decision::DecisionOracle;
use crate::operator::{OperatorState, SimulationEndReason};
use crate::tick::{self, TickError, TickSummary};
use crate::world::WorldState;

/// Errors that end the run loop.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// A tick failed and the state can no longer be trusted.
    #[error("tick error: {source}")]
    Tick {
        /// The underlying tick error.
        #[from]
        source: TickError,
    },
}

/// Result of a run.
#[derive(Debug)]
pub struct SimulationResult {
    /// Why the loop ended.
    pub end_reason: SimulationEndReason,
    /// The last tick summary, if any tick completed.
    pub final_summary: Option<TickSummary>,
    /// Ticks executed by this call.
    pub total_ticks: u64,
}

/// Called after each tick completes.
///
/// The callback receives the summary and a shared borrow of the state it
/// must not keep; [`TickNotifier`](crate::notify::TickNotifier) clones a
/// snapshot for subscribers.
pub trait TickCallback: Send {
    /// Called after a tick completes successfully.
    fn on_tick(&mut self, summary: &TickSummary, state: &WorldState);
}

/// A callback that does nothing.
pub struct NoOpCallback;

impl TickCallback for NoOpCallback {
    fn on_tick(&mut self, _summary: &TickSummary, _state: &WorldState) {}
}

/// Run the tick loop until a termination condition is met.
///
/// # Arguments
///
/// * `state` - The world state, held exclusively for the whole run
/// * `oracle` - Optional decision oracle
/// * `operator` - Shared run flag, pacing, and shutdown control
/// * `callback` - Called after each tick
///
/// # Errors
///
/// Returns [`RunnerError`] when a tick fails.
pub async fn run_simulation(
    state: &mut WorldState,
    mut oracle: Option<&mut (dyn DecisionOracle + '_)>,
    operator: &Arc<OperatorState>,
    callback: &mut dyn TickCallback,
) -> Result<SimulationResult, RunnerError> {
    let mut last_summary: Option<TickSummary> = None;
    let mut total_ticks: u64 = 0;

    info!(
        seed = state.seed,
        start_tick = state.tick(),
        max_ticks = operator.max_ticks(),
        tick_interval_ms = operator.tick_interval_ms(),
        oracle = oracle.is_some() && state.config.decision.oracle_enabled,
        "Simulation starting"
    );

    loop {
        // --- Wait while stopped ---
        if !operator.is_running() && !operator.is_shutdown_requested() {
            info!(tick = state.tick(), "Simulation stopped, waiting for start");
            operator.wait_until_running().await;
            info!(tick = state.tick(), "Simulation running");
        }

        // --- Check shutdown (before tick) ---
        if operator.is_shutdown_requested() {
            info!(tick = state.tick(), "Shutdown requested");
            return finish(operator, SimulationEndReason::Shutdown, last_summary, total_ticks)
                .await;
        }

        // --- Check tick limit (before tick) ---
        if operator.tick_limit_reached(state.tick()) {
            return finish(
                operator,
                SimulationEndReason::MaxTicksReached,
                last_summary,
                total_ticks,
            )
            .await;
        }

        // --- Execute tick ---
        let summary = match tick::run_tick(state, oracle.as_deref_mut()) {
            Ok(summary) => summary,
            Err(e) => {
                error!(tick = state.tick(), error = %e, "Tick failed, stopping simulation");
                operator.stop();
                return Err(e.into());
            }
        };
        total_ticks = total_ticks.saturating_add(1);

        // --- Notify callback ---
        callback.on_tick(&summary, state);

        // --- Check tick limit (after tick) ---
        if operator.tick_limit_reached(summary.tick) {
            info!(
                tick = summary.tick,
                max_ticks = operator.max_ticks(),
                "Tick limit reached"
            );
            return finish(
                operator,
                SimulationEndReason::MaxTicksReached,
                Some(summary),
                total_ticks,
            )
            .await;
        }
        last_summary = Some(summary);

        // --- Sleep for tick interval ---
        let interval_ms = operator.tick_interval_ms();
        if interval_ms > 0 {
            tokio::time::sleep(tokio::time::Duration::from_millis(interval_ms)).await;
        } else {
            tokio::task::yield_now().await;
        }
    }
}

async fn finish(
    operator: &OperatorState,
    reason: SimulationEndReason,
    final_summary: Option<TickSummary>,
    total_ticks: u64,
) -> Result<SimulationResult, RunnerError> {
    operator.stop();
    operator.set_end_reason(reason.clone()).await;
    Ok(SimulationResult {
        end_reason: reason,
        final_summary,
        total_ticks,
    })
}

/// Log the end of a run.
pub fn log_simulation_end(result: &SimulationResult) {
    info!(
        reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        final_tick = result.final_summary.as_ref().map(|s| s.tick),
        "Simulation ended"
    );

    if let Some(ref summary) = result.final_summary {
        info!(
            tick = summary.tick,
            population = summary.metrics.population,
            employment_rate = summary.metrics.employment_rate,
            average_wage = %summary.metrics.average_wage,
            rent_index = %summary.metrics.rent_index,
            gini = summary.metrics.gini,
            housing_pressure = summary.metrics.housing_pressure,
            "Final metrics"
        );
    } else {
        warn!("Simulation ended with no ticks executed");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::config::UrbaniumConfig;

    fn state() -> WorldState {
        let mut config = UrbaniumConfig::default();
        config.scenario.population = 10;
        config.scenario.districts = 3;
        config.scenario.employers = 2;
        config.scenario.housing_units = 8;
        config.scenario.job_listings = 3;
        WorldState::initialize(config).unwrap()
    }

    fn running(max_ticks: u64) -> Arc<OperatorState> {
        let operator = Arc::new(OperatorState::new(0, max_ticks));
        operator.start();
        operator
    }

    #[tokio::test]
    async fn bounded_by_max_ticks() {
        let mut state = state();
        let operator = running(5);
        let mut cb = NoOpCallback;

        let result = run_simulation(&mut state, None, &operator, &mut cb)
            .await
            .unwrap();

        assert_eq!(result.end_reason, SimulationEndReason::MaxTicksReached);
        assert_eq!(result.total_ticks, 5);
        assert_eq!(state.tick(), 5);
        assert_eq!(result.final_summary.map(|s| s.tick), Some(5));
        assert_eq!(
            operator.end_reason().await,
            Some(SimulationEndReason::MaxTicksReached)
        );
    }

    #[tokio::test]
    async fn shutdown_before_first_tick() {
        let mut state = state();
        let operator = running(0);
        operator.request_shutdown();
        let mut cb = NoOpCallback;

        let result = run_simulation(&mut state, None, &operator, &mut cb)
            .await
            .unwrap();

        assert_eq!(result.end_reason, SimulationEndReason::Shutdown);
        assert_eq!(result.total_ticks, 0);
        assert!(result.final_summary.is_none());
    }

    #[tokio::test]
    async fn stopped_loop_waits_for_start() {
        let mut state = state();
        let operator = Arc::new(OperatorState::new(0, 3));
        let starter = {
            let operator = Arc::clone(&operator);
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                operator.start();
            })
        };
        let mut cb = NoOpCallback;

        let result = run_simulation(&mut state, None, &operator, &mut cb)
            .await
            .unwrap();
        starter.await.unwrap();

        assert_eq!(result.total_ticks, 3);
    }

    #[tokio::test]
    async fn tick_callback_is_called() {
        struct CountCallback {
            ticks: Vec<u64>,
        }
        impl TickCallback for CountCallback {
            fn on_tick(&mut self, summary: &TickSummary, state: &WorldState) {
                assert_eq!(summary.tick, state.tick());
                self.ticks.push(summary.tick);
            }
        }

        let mut state = state();
        let operator = running(3);
        let mut cb = CountCallback { ticks: Vec::new() };

        let _ = run_simulation(&mut state, None, &operator, &mut cb)
            .await
            .unwrap();

        assert_eq!(cb.ticks, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn tick_error_is_returned() {
        let mut state = state();
        let id = state.city.citizen_ids().into_iter().next().unwrap();
        state.city.citizen_mut(id).unwrap().household_id =
            Some(urbanium_types::HouseholdId::new());
        let operator = running(10);
        let mut cb = NoOpCallback;

        let result = run_simulation(&mut state, None, &operator, &mut cb).await;
        assert!(result.is_err());
        assert!(!operator.is_running());
    }
}
