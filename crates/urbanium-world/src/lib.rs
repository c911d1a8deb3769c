//! Districts, markets, and population for the Urbanium simulation.
//!
//! This crate models the city itself: every entity collection the world
//! state owns, the district graph citizens commute across, and the seeded
//! generator that builds a fresh city from a [`CityConfig`].
//!
//! # Modules
//!
//! - [`city`] -- [`City`], the container for citizens, households,
//!   employers, public services, and the three markets.
//! - [`city_map`] -- [`CityMap`], districts as nodes with bidirectional
//!   connections and BFS routing.
//! - [`error`] -- Error types for city operations.
//! - [`generation`] -- [`CityConfig`] and [`generate_city`], deterministic
//!   from a seed.
//! - [`ids`] -- [`IdSource`], the seeded identifier generator used for
//!   entities created after initialization.

pub mod city;
pub mod city_map;
pub mod error;
pub mod generation;
pub mod ids;

// Re-export primary types at crate root.
pub use city::City;
pub use city_map::CityMap;
pub use error::WorldError;
pub use generation::{CityConfig, generate_city};
pub use ids::IdSource;
