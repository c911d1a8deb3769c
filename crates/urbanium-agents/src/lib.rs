//! Citizen logic for the Urbanium simulation.
//!
//! This crate contains everything that operates on a citizen without owning
//! the world: need decay, the action pipeline (costs, validation,
//! execution), and the deterministic rule-based arbitrator. It sits between
//! `urbanium-world` (the data) and `urbanium-core` (the tick scheduler).
//!
//! # Modules
//!
//! - [`actions`] -- Action costs, validation, and execution. The executor
//!   is the only code that mutates the city on behalf of an action.
//! - [`arbitrator`] -- Critical-need override, the priority rule table,
//!   the available-action set, and payload construction for a chosen kind.
//! - [`config`] -- Tunable need rates and action increments
//!   ([`NeedsConfig`], [`ActionConfig`]).
//! - [`error`] -- Error types for agent operations ([`AgentError`]).
//! - [`needs`] -- Per-tick need decay.

pub mod actions;
pub mod arbitrator;
pub mod config;
pub mod error;
pub mod needs;

// Re-export primary types at crate root for convenience.
pub use actions::{ExecutionContext, ExecutionOutcome, execute_action};
pub use arbitrator::{DecisionContext, available_actions, citizen_rng, decide, proposal_for};
pub use config::{ActionConfig, NeedsConfig};
pub use error::AgentError;
pub use needs::{NeedDecayResult, apply_need_decay};
