//! Per-tick metrics snapshot.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Statistics recomputed from world state at the end of a tick.
///
/// Snapshots are immutable once recorded in the history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Tick the snapshot was taken on.
    pub tick: u64,
    /// Simulation time at that tick.
    pub time: DateTime<Utc>,
    /// Number of citizens.
    pub population: usize,
    /// Employed citizens over all citizens (0 when the city is empty).
    pub employment_rate: f64,
    /// Mean monthly income over citizens with positive income.
    pub average_wage: Decimal,
    /// Mean rent over all housing units.
    pub rent_index: Decimal,
    /// Gini coefficient of cash balances, in `[0, 1]`.
    pub gini: f64,
    /// Occupied units over all units (1.0 when there are no units).
    pub housing_pressure: f64,
    /// Open job listings.
    pub open_positions: usize,
    /// Citizens without a household.
    pub homeless_count: usize,
    /// Mean cash over all citizens.
    pub average_cash: Decimal,
}
