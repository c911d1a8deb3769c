//! Market aggregates: labor, housing, and goods.
//!
//! Listings and units are kept in `Vec`s so that iteration order is the
//! insertion order. The executor relies on that order to pick "the first
//! match" deterministically.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ids::{HousingUnitId, JobListingId};
use crate::structs::{HousingUnit, JobListing};

/// Open positions and the wage policy floor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaborMarket {
    /// Open listings in posting order.
    pub open_positions: Vec<JobListing>,
    /// Minimum wage policy. The arbitrator never proposes a job search
    /// for less than this.
    pub minimum_wage: Decimal,
}

impl LaborMarket {
    /// Create an empty labor market with the given minimum wage.
    pub const fn new(minimum_wage: Decimal) -> Self {
        Self {
            open_positions: Vec::new(),
            minimum_wage,
        }
    }

    /// Remove and return the listing with `id`.
    ///
    /// Listings are consumed by hiring, never duplicated.
    pub fn take(&mut self, id: JobListingId) -> Option<JobListing> {
        let index = self.open_positions.iter().position(|l| l.id == id)?;
        Some(self.open_positions.remove(index))
    }

    /// Whether any listing is open.
    pub fn has_openings(&self) -> bool {
        !self.open_positions.is_empty()
    }
}

/// All housing units in the city.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HousingMarket {
    /// Units in creation order.
    pub units: Vec<HousingUnit>,
}

impl HousingMarket {
    /// Look up a unit.
    pub fn get(&self, id: HousingUnitId) -> Option<&HousingUnit> {
        self.units.iter().find(|unit| unit.id == id)
    }

    /// Look up a unit mutably.
    pub fn get_mut(&mut self, id: HousingUnitId) -> Option<&mut HousingUnit> {
        self.units.iter_mut().find(|unit| unit.id == id)
    }

    /// Vacant units in creation order.
    pub fn vacant(&self) -> impl Iterator<Item = &HousingUnit> {
        self.units.iter().filter(|unit| unit.is_vacant())
    }

    /// Number of occupied units.
    pub fn occupied_count(&self) -> usize {
        self.units.iter().filter(|unit| !unit.is_vacant()).count()
    }
}

/// Consumer goods pricing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoodsMarket {
    /// Multiplier applied to the base food cost. 1.0 is the baseline.
    pub food_price_index: Decimal,
}

impl Default for GoodsMarket {
    fn default() -> Self {
        Self {
            food_price_index: Decimal::ONE,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::ids::{DistrictId, EmployerId, HouseholdId};

    fn listing(title: &str) -> JobListing {
        JobListing {
            id: JobListingId::new(),
            employer_id: EmployerId::new(),
            title: title.to_owned(),
            wage: dec!(1500),
            required_skills: Vec::new(),
        }
    }

    #[test]
    fn take_removes_exactly_one_listing() {
        let mut market = LaborMarket::new(dec!(15));
        let first = listing("clerk");
        let second = listing("driver");
        let first_id = first.id;
        market.open_positions.push(first);
        market.open_positions.push(second);

        let taken = market.take(first_id).unwrap();
        assert_eq!(taken.title, "clerk");
        assert_eq!(market.open_positions.len(), 1);
        assert!(market.take(first_id).is_none());
        assert_eq!(market.open_positions.len(), 1);
    }

    #[test]
    fn vacancy_counts() {
        let district = DistrictId::new();
        let mut market = HousingMarket::default();
        market.units.push(HousingUnit {
            id: HousingUnitId::new(),
            district_id: district,
            rent: dec!(500),
            occupant: Some(HouseholdId::new()),
        });
        market.units.push(HousingUnit {
            id: HousingUnitId::new(),
            district_id: district,
            rent: dec!(450),
            occupant: None,
        });
        assert_eq!(market.occupied_count(), 1);
        assert_eq!(market.vacant().count(), 1);
    }
}
