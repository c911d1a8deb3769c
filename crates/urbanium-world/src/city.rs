//! The city container: every entity collection and market in one value.
//!
//! [`City`] is plain owned data. The tick scheduler holds it by `&mut` for
//! the duration of a tick and hands out `&` references between ticks;
//! nothing in it is shared or interior-mutable.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use urbanium_types::{
    Citizen, CitizenId, Employer, EmployerId, GoodsMarket, Household, HouseholdId, HousingMarket,
    LaborMarket, PublicService, ServiceKind,
};

use crate::city_map::CityMap;
use crate::ids::IdSource;

/// All entities and markets of the simulated city.
#[derive(Debug, Clone)]
pub struct City {
    /// District graph.
    pub map: CityMap,
    /// Citizens keyed by id. Iteration order is the processing order.
    pub citizens: BTreeMap<CitizenId, Citizen>,
    /// Households keyed by id.
    pub households: BTreeMap<HouseholdId, Household>,
    /// Employers keyed by id.
    pub employers: BTreeMap<EmployerId, Employer>,
    /// Public services in creation order.
    pub services: Vec<PublicService>,
    /// Open positions and the minimum wage.
    pub labor: LaborMarket,
    /// Housing units.
    pub housing: HousingMarket,
    /// Goods pricing.
    pub goods: GoodsMarket,
    /// Seeded id generator for entities created after initialization.
    pub ids: IdSource,
}

impl City {
    /// Create an empty city with the given labor market and id source.
    pub const fn empty(labor: LaborMarket, ids: IdSource) -> Self {
        Self {
            map: CityMap::new(),
            citizens: BTreeMap::new(),
            households: BTreeMap::new(),
            employers: BTreeMap::new(),
            services: Vec::new(),
            labor,
            housing: HousingMarket { units: Vec::new() },
            goods: GoodsMarket {
                food_price_index: Decimal::ONE,
            },
            ids,
        }
    }

    /// Citizen ids in processing order.
    pub fn citizen_ids(&self) -> Vec<CitizenId> {
        self.citizens.keys().copied().collect()
    }

    /// Look up a citizen.
    pub fn citizen(&self, id: CitizenId) -> Option<&Citizen> {
        self.citizens.get(&id)
    }

    /// Look up a citizen mutably.
    pub fn citizen_mut(&mut self, id: CitizenId) -> Option<&mut Citizen> {
        self.citizens.get_mut(&id)
    }

    /// Number of citizens.
    pub fn population(&self) -> usize {
        self.citizens.len()
    }

    /// Each member's share of a household's rent, rounded to cents.
    ///
    /// `None` if the household or its unit is missing, or it has no members.
    pub fn rent_share(&self, household_id: HouseholdId) -> Option<Decimal> {
        let household = self.households.get(&household_id)?;
        let rent = self.housing.get(household.home_id)?.rent;
        let members = Decimal::from(household.members.len());
        rent.checked_div(members).map(|share| share.round_dp(2))
    }

    /// Write the current rent share into every member's monthly expenses.
    ///
    /// Returns the share, or `None` (changing nothing) when
    /// [`rent_share`](Self::rent_share) has none.
    pub fn refresh_rent_shares(&mut self, household_id: HouseholdId) -> Option<Decimal> {
        let share = self.rent_share(household_id)?;
        let members = self.households.get(&household_id)?.members.clone();
        for member in members {
            if let Some(citizen) = self.citizens.get_mut(&member) {
                citizen.resources.monthly_expenses = share;
            }
        }
        Some(share)
    }

    /// Whether a public service of `kind` exists in the citizen's district.
    pub fn has_service_near(&self, citizen: &Citizen, kind: ServiceKind) -> bool {
        citizen.district_id.is_some_and(|district| {
            self.services
                .iter()
                .any(|s| s.kind == kind && s.district_id == district)
        })
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use urbanium_types::{
        CitizenActivity, District, DistrictId, DistrictKind, HousingUnit, HousingUnitId, Needs,
        Resources, ServiceId, Traits,
    };

    use super::*;

    fn citizen_in(district: Option<DistrictId>) -> Citizen {
        Citizen {
            id: CitizenId::new(),
            name: String::from("Bo"),
            age: 40,
            traits: Traits::default(),
            skills: Vec::new(),
            resources: Resources::default(),
            needs: Needs::default(),
            ties: Vec::new(),
            employer_id: None,
            household_id: None,
            home_id: None,
            district_id: district,
            activity: CitizenActivity::Idle,
            unemployed_ticks: 0,
            total_decisions: 0,
            oracle_decisions: 0,
        }
    }

    #[test]
    fn service_lookup_is_by_district() {
        let mut city = City::empty(LaborMarket::new(dec!(15)), IdSource::from_seed(1));
        let park_district = DistrictId::new();
        let _ = city.map.add_district(District {
            id: park_district,
            name: String::from("Green"),
            kind: DistrictKind::Residential,
        });
        city.services.push(PublicService {
            id: ServiceId::new(),
            kind: ServiceKind::Park,
            district_id: park_district,
            capacity: 50,
        });

        assert!(city.has_service_near(&citizen_in(Some(park_district)), ServiceKind::Park));
        assert!(!city.has_service_near(&citizen_in(Some(park_district)), ServiceKind::School));
        assert!(!city.has_service_near(&citizen_in(None), ServiceKind::Park));
    }

    #[test]
    fn citizen_ids_follow_key_order() {
        let mut city = City::empty(LaborMarket::new(dec!(15)), IdSource::from_seed(1));
        for _ in 0..5 {
            let citizen = citizen_in(None);
            city.citizens.insert(citizen.id, citizen);
        }
        let ids = city.citizen_ids();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
        assert_eq!(city.population(), 5);
    }

    #[test]
    fn rent_is_split_across_members() {
        let mut city = City::empty(LaborMarket::new(dec!(15)), IdSource::from_seed(1));
        let district = DistrictId::new();
        let unit = HousingUnitId::new();
        city.housing.units.push(HousingUnit {
            id: unit,
            district_id: district,
            rent: dec!(1000),
            occupant: None,
        });
        let members: Vec<Citizen> = (0..3).map(|_| citizen_in(Some(district))).collect();
        let household = HouseholdId::new();
        city.households.insert(
            household,
            Household {
                id: household,
                members: members.iter().map(|c| c.id).collect(),
                home_id: unit,
                district_id: district,
            },
        );
        for citizen in members {
            city.citizens.insert(citizen.id, citizen);
        }

        assert_eq!(city.refresh_rent_shares(household), Some(dec!(333.33)));
        assert!(
            city.citizens
                .values()
                .all(|c| c.resources.monthly_expenses == dec!(333.33))
        );

        let leaving = city
            .households
            .get(&household)
            .and_then(|h| h.members.first().copied());
        if let Some(h) = city.households.get_mut(&household) {
            h.members.retain(|m| Some(*m) != leaving);
        }
        assert_eq!(city.refresh_rent_shares(household), Some(dec!(500)));
        assert_eq!(city.rent_share(HouseholdId::new()), None);
    }
}
