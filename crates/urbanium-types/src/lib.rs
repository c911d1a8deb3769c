//! Shared type definitions for the Urbanium city simulation.
//!
//! This crate is the single source of truth for the plain data that flows
//! between the world model, the agents, and the tick scheduler. Nothing here
//! owns behavior beyond small invariant helpers (clamping, vacancy checks,
//! affordability).
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for all entity identifiers
//! - [`enums`] -- Action kinds, citizen activity, failure reasons, and other
//!   closed vocabularies
//! - [`structs`] -- Citizens, households, employers, districts, housing
//!   units, job listings, and public services
//! - [`markets`] -- Labor, housing, and goods market aggregates
//! - [`actions`] -- Proposed actions, decisions, and action results
//! - [`events`] -- World event log entries
//! - [`metrics`] -- Immutable per-tick metrics snapshots

pub mod actions;
pub mod enums;
pub mod events;
pub mod ids;
pub mod markets;
pub mod metrics;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use actions::{ActionResult, Decision, ProposedAction};
pub use enums::{
    ActionType, CitizenActivity, DecisionSource, DistrictKind, FailureReason, NeedKind,
    ServiceKind, TieType, TimeOfDay, WorldEventKind,
};
pub use events::WorldEvent;
pub use ids::{
    CitizenId, DistrictId, EmployerId, HouseholdId, HousingUnitId, JobListingId, ServiceId,
};
pub use markets::{GoodsMarket, HousingMarket, LaborMarket};
pub use metrics::MetricsSnapshot;
pub use structs::{
    Citizen, District, Employer, Household, HousingUnit, JobListing, Needs, PublicService,
    Resources, Skill, SocialTie, Traits,
};
