//! World-state consistency checks run at the end of every tick.
//!
//! A violation means the engine itself is defective: an action handler
//! left a dangling reference, two collections disagree about a binding,
//! money went negative, or the clock moved backwards. The tick scheduler
//! surfaces every violation as a fatal error and never repairs state.

use rust_decimal::Decimal;
use urbanium_types::{CitizenId, DistrictId, EmployerId, HouseholdId, HousingUnitId};
use urbanium_world::City;

use crate::clock::SimClock;

/// A broken world-state invariant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvariantViolation {
    /// The tick counter or simulation time did not move forward.
    #[error("clock regressed from tick {previous} to tick {current}")]
    ClockRegression {
        /// Tick before the step.
        previous: u64,
        /// Tick after the step.
        current: u64,
    },

    /// A citizen references an employer that does not exist.
    #[error("citizen {citizen_id} references missing employer {employer_id}")]
    DanglingEmployer {
        /// The citizen holding the reference.
        citizen_id: CitizenId,
        /// The missing employer.
        employer_id: EmployerId,
    },

    /// A citizen references a household that does not exist.
    #[error("citizen {citizen_id} references missing household {household_id}")]
    DanglingHousehold {
        /// The citizen holding the reference.
        citizen_id: CitizenId,
        /// The missing household.
        household_id: HouseholdId,
    },

    /// A reference to a housing unit that does not exist.
    #[error("{holder} references missing housing unit {unit_id}")]
    DanglingHousingUnit {
        /// Who holds the reference.
        holder: String,
        /// The missing unit.
        unit_id: HousingUnitId,
    },

    /// A reference to a district that is not on the map.
    #[error("{holder} references missing district {district_id}")]
    DanglingDistrict {
        /// Who holds the reference.
        holder: String,
        /// The missing district.
        district_id: DistrictId,
    },

    /// A roster lists a citizen that does not exist.
    #[error("{holder} lists missing citizen {citizen_id}")]
    DanglingCitizen {
        /// The employer or household roster.
        holder: String,
        /// The missing citizen.
        citizen_id: CitizenId,
    },

    /// Two sides of a binding disagree.
    #[error("binding mismatch: {message}")]
    BindingMismatch {
        /// Which binding disagrees and how.
        message: String,
    },

    /// A household has no members.
    #[error("household {household_id} is empty")]
    EmptyHousehold {
        /// The empty household.
        household_id: HouseholdId,
    },

    /// A citizen's cash balance is negative.
    #[error("citizen {citizen_id} has negative cash")]
    NegativeCash {
        /// The overdrawn citizen.
        citizen_id: CitizenId,
    },
}

/// Check that the clock moved forward by exactly one step.
///
/// # Errors
///
/// Returns [`InvariantViolation::ClockRegression`] otherwise.
pub fn check_clock(previous: &SimClock, current: &SimClock) -> Result<(), InvariantViolation> {
    if current.tick() <= previous.tick() || current.time() <= previous.time() {
        return Err(InvariantViolation::ClockRegression {
            previous: previous.tick(),
            current: current.tick(),
        });
    }
    Ok(())
}

/// Check every entity reference and binding in the city.
///
/// # Errors
///
/// Returns the first violation found, scanning citizens, then employers,
/// then households, then housing units, then listings.
pub fn check_city(city: &City) -> Result<(), InvariantViolation> {
    check_citizens(city)?;
    check_employers(city)?;
    check_households(city)?;
    check_units(city)?;
    check_listings(city)
}

/// Run the clock and city checks together.
///
/// # Errors
///
/// Returns the first violation found.
pub fn check_invariants(
    city: &City,
    previous: &SimClock,
    current: &SimClock,
) -> Result<(), InvariantViolation> {
    check_clock(previous, current)?;
    check_city(city)
}

fn check_citizens(city: &City) -> Result<(), InvariantViolation> {
    for citizen in city.citizens.values() {
        let citizen_id = citizen.id;
        if citizen.resources.cash < Decimal::ZERO {
            return Err(InvariantViolation::NegativeCash { citizen_id });
        }
        if let Some(employer_id) = citizen.employer_id {
            let employer = city
                .employers
                .get(&employer_id)
                .ok_or(InvariantViolation::DanglingEmployer {
                    citizen_id,
                    employer_id,
                })?;
            if !employer.employees.contains(&citizen_id) {
                return Err(mismatch(format!(
                    "citizen {citizen_id} works for {employer_id} but is not on its roster"
                )));
            }
        }
        if let Some(household_id) = citizen.household_id {
            let household =
                city.households
                    .get(&household_id)
                    .ok_or(InvariantViolation::DanglingHousehold {
                        citizen_id,
                        household_id,
                    })?;
            if !household.members.contains(&citizen_id) {
                return Err(mismatch(format!(
                    "citizen {citizen_id} belongs to {household_id} but is not a member"
                )));
            }
            if citizen.home_id != Some(household.home_id) {
                return Err(mismatch(format!(
                    "citizen {citizen_id} home differs from household {household_id} home"
                )));
            }
        } else if citizen.home_id.is_some() {
            return Err(mismatch(format!(
                "citizen {citizen_id} has a home but no household"
            )));
        }
        if let Some(unit_id) = citizen.home_id
            && city.housing.get(unit_id).is_none()
        {
            return Err(InvariantViolation::DanglingHousingUnit {
                holder: format!("citizen {citizen_id}"),
                unit_id,
            });
        }
        if let Some(district_id) = citizen.district_id
            && !city.map.contains(district_id)
        {
            return Err(InvariantViolation::DanglingDistrict {
                holder: format!("citizen {citizen_id}"),
                district_id,
            });
        }
    }
    Ok(())
}

fn check_employers(city: &City) -> Result<(), InvariantViolation> {
    for employer in city.employers.values() {
        if !city.map.contains(employer.district_id) {
            return Err(InvariantViolation::DanglingDistrict {
                holder: format!("employer {}", employer.id),
                district_id: employer.district_id,
            });
        }
        for &citizen_id in &employer.employees {
            let citizen = city
                .citizen(citizen_id)
                .ok_or_else(|| InvariantViolation::DanglingCitizen {
                    holder: format!("employer {}", employer.id),
                    citizen_id,
                })?;
            if citizen.employer_id != Some(employer.id) {
                return Err(mismatch(format!(
                    "employer {} lists {citizen_id} who works elsewhere",
                    employer.id
                )));
            }
        }
    }
    Ok(())
}

fn check_households(city: &City) -> Result<(), InvariantViolation> {
    for household in city.households.values() {
        let household_id = household.id;
        if household.members.is_empty() {
            return Err(InvariantViolation::EmptyHousehold { household_id });
        }
        for &citizen_id in &household.members {
            let citizen = city
                .citizen(citizen_id)
                .ok_or_else(|| InvariantViolation::DanglingCitizen {
                    holder: format!("household {household_id}"),
                    citizen_id,
                })?;
            if citizen.household_id != Some(household_id) {
                return Err(mismatch(format!(
                    "household {household_id} lists {citizen_id} who lives elsewhere"
                )));
            }
        }
        let unit = city.housing.get(household.home_id).ok_or_else(|| {
            InvariantViolation::DanglingHousingUnit {
                holder: format!("household {household_id}"),
                unit_id: household.home_id,
            }
        })?;
        if unit.occupant != Some(household_id) {
            return Err(mismatch(format!(
                "household {household_id} lives in {} which records another occupant",
                unit.id
            )));
        }
    }
    Ok(())
}

fn check_units(city: &City) -> Result<(), InvariantViolation> {
    for unit in &city.housing.units {
        if !city.map.contains(unit.district_id) {
            return Err(InvariantViolation::DanglingDistrict {
                holder: format!("housing unit {}", unit.id),
                district_id: unit.district_id,
            });
        }
        if let Some(household_id) = unit.occupant
            && !city.households.contains_key(&household_id)
        {
            return Err(mismatch(format!(
                "housing unit {} is occupied by missing household {household_id}",
                unit.id
            )));
        }
    }
    Ok(())
}

fn check_listings(city: &City) -> Result<(), InvariantViolation> {
    match city
        .labor
        .open_positions
        .iter()
        .find(|listing| !city.employers.contains_key(&listing.employer_id))
    {
        Some(listing) => Err(mismatch(format!(
            "job listing {} is posted by missing employer {}",
            listing.id, listing.employer_id
        ))),
        None => Ok(()),
    }
}

const fn mismatch(message: String) -> InvariantViolation {
    InvariantViolation::BindingMismatch { message }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;
    use urbanium_world::{CityConfig, generate_city};

    use super::*;

    fn city() -> City {
        let config = CityConfig {
            population: 20,
            districts: 3,
            employers: 3,
            housing_units: 15,
            job_listings: 5,
            ..CityConfig::default()
        };
        generate_city(&config, 5).unwrap()
    }

    #[test]
    fn generated_city_is_consistent() {
        assert!(check_city(&city()).is_ok());
    }

    #[test]
    fn clock_must_advance() {
        let start = Utc.with_ymd_and_hms(2025, 1, 6, 0, 0, 0).unwrap();
        let before = SimClock::new(start);
        let mut after = before;
        after.advance().unwrap();
        assert!(check_clock(&before, &after).is_ok());
        assert_eq!(
            check_clock(&after, &before),
            Err(InvariantViolation::ClockRegression {
                previous: 1,
                current: 0
            })
        );
        assert!(check_clock(&before, &before).is_err());
    }

    #[test]
    fn dangling_employer_is_detected() {
        let mut city = city();
        let id = city.citizen_ids().into_iter().next().unwrap();
        let ghost = EmployerId::new();
        city.citizen_mut(id).unwrap().employer_id = Some(ghost);
        assert_eq!(
            check_city(&city),
            Err(InvariantViolation::DanglingEmployer {
                citizen_id: id,
                employer_id: ghost
            })
        );
    }

    #[test]
    fn dangling_household_is_detected() {
        let mut city = city();
        let id = city.citizen_ids().into_iter().next().unwrap();
        city.citizen_mut(id).unwrap().household_id = Some(HouseholdId::new());
        assert!(matches!(
            check_city(&city),
            Err(InvariantViolation::DanglingHousehold { .. })
        ));
    }

    #[test]
    fn negative_cash_is_detected() {
        let mut city = city();
        let id = city.citizen_ids().into_iter().next().unwrap();
        city.citizen_mut(id).unwrap().resources.cash = dec!(-0.01);
        assert_eq!(
            check_city(&city),
            Err(InvariantViolation::NegativeCash { citizen_id: id })
        );
    }

    #[test]
    fn roster_mismatch_is_detected() {
        let mut city = city();
        let employed = city
            .citizens
            .values()
            .find(|c| c.is_employed())
            .map(|c| c.id)
            .unwrap();
        city.citizen_mut(employed).unwrap().employer_id = None;
        assert!(matches!(
            check_city(&city),
            Err(InvariantViolation::BindingMismatch { .. })
        ));
    }

    #[test]
    fn vacated_unit_with_household_is_detected() {
        let mut city = city();
        let home = city.households.values().next().unwrap().home_id;
        city.housing.get_mut(home).unwrap().occupant = None;
        assert!(matches!(
            check_city(&city),
            Err(InvariantViolation::BindingMismatch { .. })
        ));
    }
}
