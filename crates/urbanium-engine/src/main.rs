//! Simulation driver binary for Urbanium.
//!
//! Loads configuration, initializes logging and the world, optionally
//! wires the language-model decision oracle, and runs the tick loop until
//! the tick limit is reached or the process receives Ctrl-C.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `urbanium-config.yaml` (or `URBANIUM_CONFIG`)
//! 2. Initialize structured logging (tracing)
//! 3. Generate the city from the scenario and seed
//! 4. Build the decision oracle when enabled
//! 5. Create operator state and the Ctrl-C handler
//! 6. Subscribe a logger to tick notifications
//! 7. Run the simulation loop
//! 8. Log the result

mod error;
mod settings;
mod subscriber;

use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use urbanium_core::config::LoggingConfig;
use urbanium_core::runner::log_simulation_end;
use urbanium_core::{
    DecisionOracle, OperatorState, TickNotifier, UrbaniumConfig, WorldState, run_simulation,
};
use urbanium_oracle::LlmOracle;

use crate::error::EngineError;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    // 1. Load configuration.
    let (config, config_path) = UrbaniumConfig::load().context("loading configuration")?;

    // 2. Initialize structured logging.
    init_logging(&config.logging);
    info!("urbanium-engine starting");
    match &config_path {
        Some(path) => info!(path = %path.display(), "Configuration loaded"),
        None => info!("Config file not found, using defaults"),
    }
    info!(
        seed = config.simulation.seed,
        max_ticks = config.simulation.max_ticks,
        tick_interval_ms = config.simulation.tick_interval_ms,
        population = config.scenario.population,
        districts = config.scenario.districts,
        interventions = config.interventions.len(),
        oracle_enabled = config.decision.oracle_enabled,
        "Simulation settings"
    );

    // 3. Generate the city.
    let oracle_enabled = config.decision.oracle_enabled;
    let operator = Arc::new(OperatorState::from_config(&config.simulation));
    let mut state = WorldState::initialize(config)
        .map_err(EngineError::from)
        .context("initializing world state")?;

    // 4. Build the decision oracle.
    let mut llm = if oracle_enabled {
        build_oracle(config_path.as_deref())
    } else {
        None
    };
    let oracle = llm.as_mut().map(|o| o as &mut dyn DecisionOracle);

    // 5. Operator controls.
    info!(
        max_ticks = operator.max_ticks(),
        tick_interval_ms = operator.tick_interval_ms(),
        "Operator state initialized"
    );
    {
        let operator = Arc::clone(&operator);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Ctrl-C received, shutting down after the current tick");
                operator.request_shutdown();
            }
        });
    }

    // 6. Notification logger.
    let mut notifier = TickNotifier::new();
    let logger = tokio::spawn(subscriber::log_notifications(notifier.subscribe()));

    // 7. Run.
    operator.start();
    let result = run_simulation(&mut state, oracle, &operator, &mut notifier)
        .await
        .map_err(EngineError::from)
        .context("simulation run failed")?;

    drop(notifier);
    let notifications = logger.await.unwrap_or(0);

    // 8. Log results.
    log_simulation_end(&result);
    info!(
        end_reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        notifications,
        events_recorded = state.events.total_recorded(),
        "urbanium-engine shutting down"
    );

    Ok(())
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured level.
fn init_logging(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    if logging.format.eq_ignore_ascii_case("json") {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Build the language-model oracle, or `None` to run on rules alone.
fn build_oracle(config_path: Option<&std::path::Path>) -> Option<LlmOracle> {
    let oracle = settings::load_oracle_config(config_path)
        .and_then(|config| LlmOracle::new(config).map_err(EngineError::from));
    match oracle {
        Ok(oracle) => {
            info!(model = oracle.model(), "Decision oracle enabled");
            Some(oracle)
        }
        Err(e) => {
            warn!(error = %e, "Decision oracle unavailable, using the rule table only");
            None
        }
    }
}
