//! Metrics aggregation: pure functions of the city, plus a bounded history.
//!
//! All money aggregates are computed in [`Decimal`]. Ratios and the Gini
//! coefficient are computed in [`Decimal`] too and only converted to `f64`
//! at the end, so repeated runs agree to the bit.
//!
//! Degenerate inputs never fail:
//!
//! - employment rate is 0 with no citizens;
//! - average wage is 0 when nobody has positive income;
//! - rent index is 0 with no housing units;
//! - housing pressure is 1.0 with no housing units;
//! - Gini is 0 with one citizen or zero total wealth.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use urbanium_types::MetricsSnapshot;
use urbanium_world::City;

/// Compute a snapshot of the city at `tick`.
pub fn compute_metrics(city: &City, tick: u64, time: DateTime<Utc>) -> MetricsSnapshot {
    let population = city.population();
    let employed = city.citizens.values().filter(|c| c.is_employed()).count();
    let homeless_count = city.citizens.values().filter(|c| !c.has_shelter()).count();
    let cash: Vec<Decimal> = city.citizens.values().map(|c| c.resources.cash).collect();

    MetricsSnapshot {
        tick,
        time,
        population,
        employment_rate: employment_rate(employed, population),
        average_wage: average_wage(city),
        rent_index: rent_index(city),
        gini: gini(&cash),
        housing_pressure: housing_pressure(city),
        open_positions: city.labor.open_positions.len(),
        homeless_count,
        average_cash: mean(&cash),
    }
}

/// Employed citizens over all citizens; 0 for an empty city.
pub fn employment_rate(employed: usize, population: usize) -> f64 {
    ratio(employed, population).unwrap_or(0.0)
}

/// Mean monthly income over citizens with positive income.
pub fn average_wage(city: &City) -> Decimal {
    let incomes: Vec<Decimal> = city
        .citizens
        .values()
        .map(|c| c.resources.monthly_income)
        .filter(|income| *income > Decimal::ZERO)
        .collect();
    mean(&incomes)
}

/// Mean rent over every housing unit, occupied or not.
pub fn rent_index(city: &City) -> Decimal {
    let rents: Vec<Decimal> = city.housing.units.iter().map(|u| u.rent).collect();
    mean(&rents)
}

/// Occupied units over all units; 1.0 when there are no units.
pub fn housing_pressure(city: &City) -> f64 {
    ratio(city.housing.occupied_count(), city.housing.units.len()).unwrap_or(1.0)
}

/// Gini coefficient of `values`.
///
/// Uses `G = sum((2i - n - 1) * x_i) / (n * sum(x))` over the values sorted
/// ascending, with `i` counted from 1. Negative values are treated as 0.
/// The result is clamped into `[0, 1]`.
pub fn gini(values: &[Decimal]) -> f64 {
    let mut sorted: Vec<Decimal> = values.iter().map(|v| (*v).max(Decimal::ZERO)).collect();
    sorted.sort_unstable();
    gini_sorted(&sorted).map_or(0.0, |g| g.clamp(0.0, 1.0))
}

fn gini_sorted(sorted: &[Decimal]) -> Option<f64> {
    let n = Decimal::from(sorted.len());
    if sorted.len() <= 1 {
        return Some(0.0);
    }
    let total = sorted
        .iter()
        .try_fold(Decimal::ZERO, |acc, x| acc.checked_add(*x))?;
    if total.is_zero() {
        return Some(0.0);
    }
    // 2i - n - 1 for i = 1..=n
    let offset = n.checked_add(Decimal::ONE)?;
    let numerator = sorted
        .iter()
        .zip(1_u64..)
        .try_fold(Decimal::ZERO, |acc, (x, i)| {
            let weight = Decimal::from(i).checked_mul(Decimal::TWO)?.checked_sub(offset)?;
            acc.checked_add(weight.checked_mul(*x)?)
        })?;
    let denominator = n.checked_mul(total)?;
    numerator.checked_div(denominator)?.to_f64()
}

fn mean(values: &[Decimal]) -> Decimal {
    if values.is_empty() {
        return Decimal::ZERO;
    }
    values
        .iter()
        .try_fold(Decimal::ZERO, |acc, x| acc.checked_add(*x))
        .and_then(|total| total.checked_div(Decimal::from(values.len())))
        .map_or(Decimal::ZERO, |avg| avg.round_dp(2))
}

fn ratio(part: usize, whole: usize) -> Option<f64> {
    if whole == 0 {
        return None;
    }
    Decimal::from(part)
        .checked_div(Decimal::from(whole))?
        .to_f64()
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

/// Bounded time series of metrics snapshots, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsHistory {
    snapshots: VecDeque<MetricsSnapshot>,
    capacity: usize,
}

impl MetricsHistory {
    /// An empty history retaining at most `capacity` snapshots.
    pub fn new(capacity: usize) -> Self {
        Self {
            snapshots: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
        }
    }

    /// Append a snapshot, evicting the oldest when full.
    pub fn push(&mut self, snapshot: MetricsSnapshot) {
        if self.capacity == 0 {
            return;
        }
        while self.snapshots.len() >= self.capacity {
            self.snapshots.pop_front();
        }
        self.snapshots.push_back(snapshot);
    }

    /// The most recent snapshot.
    pub fn latest(&self) -> Option<&MetricsSnapshot> {
        self.snapshots.back()
    }

    /// Every retained snapshot, oldest first.
    pub fn snapshots(&self) -> impl Iterator<Item = &MetricsSnapshot> {
        self.snapshots.iter()
    }

    /// Number of retained snapshots.
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Whether the history is empty.
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// `(tick, employment_rate)` pairs.
    pub fn employment_rate_series(&self) -> Vec<(u64, f64)> {
        self.series(|s| s.employment_rate)
    }

    /// `(tick, average_wage)` pairs.
    pub fn average_wage_series(&self) -> Vec<(u64, Decimal)> {
        self.series(|s| s.average_wage)
    }

    /// `(tick, rent_index)` pairs.
    pub fn rent_index_series(&self) -> Vec<(u64, Decimal)> {
        self.series(|s| s.rent_index)
    }

    /// `(tick, gini)` pairs.
    pub fn gini_series(&self) -> Vec<(u64, f64)> {
        self.series(|s| s.gini)
    }

    /// `(tick, housing_pressure)` pairs.
    pub fn housing_pressure_series(&self) -> Vec<(u64, f64)> {
        self.series(|s| s.housing_pressure)
    }

    fn series<T>(&self, value: impl Fn(&MetricsSnapshot) -> T) -> Vec<(u64, T)> {
        self.snapshots.iter().map(|s| (s.tick, value(s))).collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use rust_decimal_macros::dec;
    use urbanium_types::{
        Citizen, CitizenActivity, CitizenId, EmployerId, HouseholdId, HousingUnit, HousingUnitId,
        DistrictId, LaborMarket, Needs, Resources, Traits,
    };
    use urbanium_world::IdSource;

    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn citizen(cash: Decimal, income: Decimal, employed: bool, housed: bool) -> Citizen {
        Citizen {
            id: CitizenId::new(),
            name: String::from("Cy"),
            age: 40,
            traits: Traits::default(),
            skills: Vec::new(),
            resources: Resources {
                cash,
                monthly_income: income,
                monthly_expenses: Decimal::ZERO,
            },
            needs: Needs::SATISFIED,
            ties: Vec::new(),
            employer_id: employed.then(EmployerId::new),
            household_id: housed.then(HouseholdId::new),
            home_id: None,
            district_id: None,
            activity: CitizenActivity::Idle,
            unemployed_ticks: 0,
            total_decisions: 0,
            oracle_decisions: 0,
        }
    }

    fn city_with(citizens: Vec<Citizen>, rents: &[(Decimal, bool)]) -> City {
        let mut city = City::empty(LaborMarket::new(dec!(900)), IdSource::from_seed(5));
        for c in citizens {
            city.citizens.insert(c.id, c);
        }
        let district = DistrictId::new();
        for (rent, occupied) in rents {
            city.housing.units.push(HousingUnit {
                id: HousingUnitId::new(),
                district_id: district,
                rent: *rent,
                occupant: occupied.then(HouseholdId::new),
            });
        }
        city
    }

    #[test]
    fn gini_of_equal_values_is_zero() {
        assert!(close(gini(&[dec!(7), dec!(7), dec!(7)]), 0.0));
        assert!(close(gini(&[Decimal::ZERO; 4]), 0.0));
        assert!(close(gini(&[dec!(100)]), 0.0));
        assert!(close(gini(&[]), 0.0));
    }

    #[test]
    fn gini_of_concentrated_wealth() {
        // One of four holds everything: (n - 1) / n.
        let g = gini(&[Decimal::ZERO, Decimal::ZERO, Decimal::ZERO, dec!(100)]);
        assert!(close(g, 0.75));
    }

    #[test]
    fn gini_is_order_independent_and_bounded() {
        let a = gini(&[dec!(1), dec!(5), dec!(10), dec!(50)]);
        let b = gini(&[dec!(50), dec!(1), dec!(10), dec!(5)]);
        assert!(close(a, b));
        assert!((0.0..=1.0).contains(&a));
        // sum((2i-5) x_i) = -3 - 5 + 10 + 150 = 152; 152 / (4 * 66)
        assert!(close(a, 152.0 / 264.0));
    }

    #[test]
    fn snapshot_aggregates_city() {
        let city = city_with(
            vec![
                citizen(dec!(100), dec!(2000), true, true),
                citizen(dec!(300), dec!(1000), true, false),
                citizen(dec!(0), Decimal::ZERO, false, false),
                citizen(dec!(0), Decimal::ZERO, false, true),
            ],
            &[(dec!(400), true), (dec!(600), true), (dec!(500), false), (dec!(700), false)],
        );
        let snap = compute_metrics(&city, 3, Utc::now());
        assert_eq!(snap.population, 4);
        assert!(close(snap.employment_rate, 0.5));
        assert_eq!(snap.average_wage, dec!(1500));
        assert_eq!(snap.rent_index, dec!(550));
        assert!(close(snap.housing_pressure, 0.5));
        assert_eq!(snap.homeless_count, 2);
        assert_eq!(snap.average_cash, dec!(100));
    }

    #[test]
    fn empty_city_has_degenerate_defaults() {
        let city = city_with(Vec::new(), &[]);
        let snap = compute_metrics(&city, 0, Utc::now());
        assert!(close(snap.employment_rate, 0.0));
        assert_eq!(snap.average_wage, Decimal::ZERO);
        assert_eq!(snap.rent_index, Decimal::ZERO);
        assert!(close(snap.housing_pressure, 1.0));
        assert!(close(snap.gini, 0.0));
    }

    #[test]
    fn history_evicts_oldest_and_exposes_series() {
        let city = city_with(vec![citizen(dec!(1), dec!(1), true, true)], &[]);
        let mut history = MetricsHistory::new(3);
        for tick in 1..=5 {
            history.push(compute_metrics(&city, tick, Utc::now()));
        }
        assert_eq!(history.len(), 3);
        assert_eq!(history.latest().unwrap().tick, 5);
        let series = history.employment_rate_series();
        assert_eq!(series.iter().map(|(t, _)| *t).collect::<Vec<_>>(), vec![3, 4, 5]);
        assert!(close(series[0].1, 1.0));
        assert_eq!(history.rent_index_series().len(), 3);
    }
}
