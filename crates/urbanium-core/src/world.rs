//! The world state owned by the tick scheduler.
//!
//! [`WorldState`] bundles everything a tick reads or writes: the clock and
//! its derived flags, the city, the bounded metrics history and event log,
//! the intervention schedule, and the configuration it was built from.
//! It is an explicitly owned value; [`run_tick`](crate::tick::run_tick)
//! takes it by `&mut` and consumers receive clones after a tick completes.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::info;
use urbanium_types::DecisionSource;
use urbanium_world::{City, generate_city};

use crate::clock::{SimClock, WorldFlags};
use crate::config::{ConfigError, UrbaniumConfig};
use crate::events::EventLog;
use crate::metrics::{MetricsHistory, compute_metrics};
use crate::scenario::InterventionSchedule;

/// The authoritative simulation state.
#[derive(Debug, Clone)]
pub struct WorldState {
    /// Seed the current city was generated from.
    pub seed: u64,
    /// Tick counter and simulation time.
    pub clock: SimClock,
    /// Flags derived from the clock for the current tick.
    pub flags: WorldFlags,
    /// Districts, markets, and population.
    pub city: City,
    /// Bounded metrics history; tick 0 holds the initial snapshot.
    pub metrics: MetricsHistory,
    /// Bounded append-only event log.
    pub events: EventLog,
    /// Interventions still to be applied, keyed by tick.
    pub interventions: InterventionSchedule,
    /// Configuration the state was built from.
    pub config: UrbaniumConfig,
    /// Decisions made since initialization, per source.
    pub decision_totals: BTreeMap<DecisionSource, u64>,
    /// Why the state stopped accepting ticks. Set by the first failed tick
    /// and cleared only by [`reset`](Self::reset).
    pub halted: Option<String>,
}

impl WorldState {
    /// Build a fresh world from `config` using its configured seed.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the configuration is invalid.
    pub fn initialize(config: UrbaniumConfig) -> Result<Self, ConfigError> {
        let seed = config.simulation.seed;
        Self::initialize_with_seed(config, seed)
    }

    /// Build a fresh world from `config` with an explicit seed.
    ///
    /// Two calls with the same config and seed produce identical states.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the configuration is invalid.
    pub fn initialize_with_seed(config: UrbaniumConfig, seed: u64) -> Result<Self, ConfigError> {
        config.validate()?;
        let city = generate_city(&config.scenario, seed)?;
        let clock = SimClock::new(config.simulation.start_time);

        let mut metrics = MetricsHistory::new(config.simulation.history_capacity);
        metrics.push(compute_metrics(&city, clock.tick(), clock.time()));

        info!(
            seed,
            population = city.population(),
            districts = city.map.district_count(),
            employers = city.employers.len(),
            housing_units = city.housing.units.len(),
            open_positions = city.labor.open_positions.len(),
            "World initialized"
        );

        Ok(Self {
            seed,
            flags: WorldFlags::from_clock(&clock),
            clock,
            city,
            metrics,
            events: EventLog::new(config.simulation.event_log_capacity),
            interventions: InterventionSchedule::new(config.interventions.clone()),
            config,
            decision_totals: BTreeMap::new(),
            halted: None,
        })
    }

    /// Discard the current state and rebuild it from the stored config.
    ///
    /// Uses `seed` when given, else the seed of the current state.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the stored configuration no longer
    /// validates.
    pub fn reset(&mut self, seed: Option<u64>) -> Result<(), ConfigError> {
        let seed = seed.unwrap_or(self.seed);
        info!(seed, previous_tick = self.clock.tick(), "World reset");
        *self = Self::initialize_with_seed(self.config.clone(), seed)?;
        Ok(())
    }

    /// The current tick number.
    pub const fn tick(&self) -> u64 {
        self.clock.tick()
    }

    /// The current simulation time.
    pub const fn time(&self) -> DateTime<Utc> {
        self.clock.time()
    }

    /// Whether a failed tick has halted the state.
    pub const fn is_halted(&self) -> bool {
        self.halted.is_some()
    }
}
