//! Tick scheduler, metrics, and run loop for the Urbanium simulation.
//!
//! This crate owns the [`WorldState`] and advances it one tick at a time.
//! Every tick runs the same fixed sequence: advance the clock, recompute
//! the exogenous flags, apply scheduled interventions, settle household
//! bills at day boundaries, let each citizen decay, decide, and act, check
//! invariants, then record metrics.
//!
//! # Modules
//!
//! - [`clock`] -- [`SimClock`] and the per-tick [`WorldFlags`].
//! - [`config`] -- YAML configuration ([`UrbaniumConfig`]).
//! - [`decision`] -- The [`DecisionOracle`] boundary and [`arbitrate`],
//!   which falls back to the rule table on any oracle fault.
//! - [`economy`] -- Daily household bills and price drift.
//! - [`events`] -- The bounded, append-only [`EventLog`].
//! - [`invariants`] -- End-of-tick consistency checks.
//! - [`metrics`] -- [`compute_metrics`] and the bounded [`MetricsHistory`].
//! - [`notify`] -- [`TickNotifier`], tick-completed notifications.
//! - [`operator`] -- [`OperatorState`], the Start/Stop run flag.
//! - [`runner`] -- [`run_simulation`], the async run loop.
//! - [`scenario`] -- Scheduled interventions.
//! - [`tick`] -- [`run_tick`], one atomic simulation step.
//! - [`world`] -- [`WorldState`] initialization and reset.

pub mod clock;
pub mod config;
pub mod decision;
pub mod economy;
pub mod events;
pub mod invariants;
pub mod metrics;
pub mod notify;
pub mod operator;
pub mod runner;
pub mod scenario;
pub mod tick;
pub mod world;

pub use clock::{SimClock, WorldFlags};
pub use config::{ConfigError, UrbaniumConfig};
pub use decision::{DecisionOracle, OracleError, OracleProposal, OracleRequest, arbitrate};
pub use economy::{DailySettlement, EconomyConfig, settle_day};
pub use events::EventLog;
pub use metrics::{MetricsHistory, compute_metrics};
pub use notify::{TickNotification, TickNotifier};
pub use operator::{OperatorState, RunState, SimulationEndReason};
pub use runner::{NoOpCallback, SimulationResult, TickCallback, run_simulation};
pub use scenario::{Intervention, ScheduledIntervention};
pub use tick::{TickError, TickSummary, run_tick};
pub use world::WorldState;
