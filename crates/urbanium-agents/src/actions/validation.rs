//! Action validation.
//!
//! Validation is read-only. It checks a proposal against the citizen and
//! the city and either rejects it with a [`FailureReason`] or resolves it
//! into a [`ValidatedAction`] carrying everything the handler needs. A
//! handler never re-checks legality; a rejected proposal never reaches one,
//! so failures leave the city untouched.

use rust_decimal::Decimal;
use urbanium_types::{
    Citizen, CitizenId, DistrictId, EmployerId, FailureReason, HousingUnitId, JobListing,
    JobListingId, ProposedAction, ServiceKind,
};
use urbanium_world::City;

use crate::config::ActionConfig;

use super::costs;

/// Tick context needed to validate and execute an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionContext {
    /// The tick being executed.
    pub tick: u64,
    /// Whether the current hour is within working hours.
    pub is_working_hours: bool,
}

/// A proposal that passed validation, with its resolved parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidatedAction {
    /// Work a shift for `employer`.
    WorkShift {
        /// The employer being worked for.
        employer: EmployerId,
        /// Hours worked.
        hours: u32,
    },
    /// Rest, with or without a household.
    Rest {
        /// Whether the citizen has a household.
        sheltered: bool,
    },
    /// Eat a meal costing `cost`.
    Eat {
        /// Resolved meal price.
        cost: Decimal,
    },
    /// Move across one graph edge.
    Commute {
        /// Current district.
        from: DistrictId,
        /// Adjacent destination.
        to: DistrictId,
    },
    /// Spend time with others.
    Socialize {
        /// Tie to reinforce, when the citizen has one to the target.
        tie_target: Option<CitizenId>,
        /// Whether a park is in the citizen's district.
        near_park: bool,
    },
    /// Take the first matching listing.
    JobSearch {
        /// The selected listing.
        listing: JobListingId,
    },
    /// Move into a vacant unit.
    HousingChange {
        /// The target unit.
        unit: HousingUnitId,
    },
}

/// Validate a proposal for `citizen`.
///
/// # Errors
///
/// Returns the [`FailureReason`] of the first failed rule.
pub fn validate_action(
    proposal: &ProposedAction,
    citizen: &Citizen,
    city: &City,
    ctx: &ExecutionContext,
    config: &ActionConfig,
) -> Result<ValidatedAction, FailureReason> {
    match proposal {
        ProposedAction::WorkShift { hours } => validate_work_shift(citizen, ctx, *hours),
        ProposedAction::Rest => Ok(ValidatedAction::Rest {
            sheltered: citizen.has_shelter(),
        }),
        ProposedAction::Eat { cost } => validate_eat(citizen, city, config, *cost),
        ProposedAction::Commute { target } => validate_commute(citizen, city, *target),
        ProposedAction::Socialize { target } => Ok(ValidatedAction::Socialize {
            tie_target: target.filter(|t| citizen.ties.iter().any(|tie| tie.target == *t)),
            near_park: city.has_service_near(citizen, ServiceKind::Park),
        }),
        ProposedAction::JobSearch { minimum_wage } => {
            validate_job_search(citizen, city, config, *minimum_wage)
        }
        ProposedAction::HousingChange { unit } => validate_housing_change(citizen, city, config, *unit),
    }
}

fn validate_work_shift(
    citizen: &Citizen,
    ctx: &ExecutionContext,
    hours: u32,
) -> Result<ValidatedAction, FailureReason> {
    let employer = citizen.employer_id.ok_or(FailureReason::NotEmployed)?;
    if !ctx.is_working_hours {
        return Err(FailureReason::NotWorkingHours);
    }
    Ok(ValidatedAction::WorkShift { employer, hours })
}

fn validate_eat(
    citizen: &Citizen,
    city: &City,
    config: &ActionConfig,
    explicit: Option<Decimal>,
) -> Result<ValidatedAction, FailureReason> {
    let cost = costs::meal_cost(explicit, config.base_food_cost, city.goods.food_price_index)
        .ok_or(FailureReason::InsufficientFunds)?;
    if !citizen.resources.can_afford(cost) {
        return Err(FailureReason::InsufficientFunds);
    }
    Ok(ValidatedAction::Eat { cost })
}

fn validate_commute(
    citizen: &Citizen,
    city: &City,
    target: DistrictId,
) -> Result<ValidatedAction, FailureReason> {
    match citizen.district_id {
        Some(from) if city.map.is_adjacent(from, target) => {
            Ok(ValidatedAction::Commute { from, to: target })
        }
        _ => Err(FailureReason::NoRouteAvailable),
    }
}

/// Whether `citizen` covers every skill the listing requires.
pub fn covers_skills(citizen: &Citizen, listing: &JobListing, floor: f64) -> bool {
    listing
        .required_skills
        .iter()
        .all(|skill| citizen.skill_level(skill).is_some_and(|level| level >= floor))
}

/// The first open listing paying at least `minimum_wage` whose skills
/// `citizen` covers, in stable listing order.
pub fn first_matching_listing<'a>(
    citizen: &Citizen,
    city: &'a City,
    config: &ActionConfig,
    minimum_wage: Decimal,
) -> Option<&'a JobListing> {
    city.labor.open_positions.iter().find(|listing| {
        listing.wage >= minimum_wage
            && covers_skills(citizen, listing, config.skill_proficiency_floor)
    })
}

fn validate_job_search(
    citizen: &Citizen,
    city: &City,
    config: &ActionConfig,
    minimum_wage: Decimal,
) -> Result<ValidatedAction, FailureReason> {
    first_matching_listing(citizen, city, config, minimum_wage)
        .map(|listing| ValidatedAction::JobSearch { listing: listing.id })
        .ok_or(FailureReason::NoMatchingJobs)
}

fn validate_housing_change(
    citizen: &Citizen,
    city: &City,
    config: &ActionConfig,
    unit: Option<HousingUnitId>,
) -> Result<ValidatedAction, FailureReason> {
    let unit = unit
        .and_then(|id| city.housing.get(id))
        .filter(|unit| unit.is_vacant())
        .ok_or(FailureReason::HousingUnitUnavailable)?;
    if !costs::is_rent_affordable(
        unit.rent,
        citizen.resources.monthly_income,
        config.rent_affordability_ratio,
    ) {
        return Err(FailureReason::CannotAffordRent);
    }
    Ok(ValidatedAction::HousingChange { unit: unit.id })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use rust_decimal_macros::dec;
    use urbanium_types::{
        CitizenActivity, District, DistrictKind, EmployerId, HousingUnit, LaborMarket, Needs,
        PublicService, Resources, ServiceId, Skill, SocialTie, TieType, Traits,
    };
    use urbanium_world::IdSource;

    use super::*;

    const WORK: ExecutionContext = ExecutionContext {
        tick: 10,
        is_working_hours: true,
    };
    const NIGHT: ExecutionContext = ExecutionContext {
        tick: 3,
        is_working_hours: false,
    };

    fn citizen(cash: Decimal, income: Decimal) -> Citizen {
        Citizen {
            id: CitizenId::new(),
            name: String::from("Ada"),
            age: 30,
            traits: Traits::default(),
            skills: Vec::new(),
            resources: Resources {
                cash,
                monthly_income: income,
                monthly_expenses: Decimal::ZERO,
            },
            needs: Needs::SATISFIED,
            ties: Vec::new(),
            employer_id: None,
            household_id: None,
            home_id: None,
            district_id: None,
            activity: CitizenActivity::Idle,
            unemployed_ticks: 0,
            total_decisions: 0,
            oracle_decisions: 0,
        }
    }

    fn two_district_city() -> (City, DistrictId, DistrictId) {
        let mut city = City::empty(LaborMarket::new(dec!(900)), IdSource::from_seed(1));
        let a = DistrictId::new();
        let b = DistrictId::new();
        for (id, kind) in [(a, DistrictKind::Downtown), (b, DistrictKind::Residential)] {
            city.map
                .add_district(District {
                    id,
                    name: format!("{kind:?}"),
                    kind,
                })
                .unwrap();
        }
        city.map.connect(a, b).unwrap();
        (city, a, b)
    }

    fn listing(wage: Decimal, skills: &[&str]) -> JobListing {
        JobListing {
            id: JobListingId::new(),
            employer_id: EmployerId::new(),
            title: String::from("Clerk"),
            wage,
            required_skills: skills.iter().map(|s| (*s).to_owned()).collect(),
        }
    }

    fn unit(district: DistrictId, rent: Decimal) -> HousingUnit {
        HousingUnit {
            id: HousingUnitId::new(),
            district_id: district,
            rent,
            occupant: None,
        }
    }

    #[test]
    fn work_shift_checks_employment_before_hours() {
        let (city, ..) = two_district_city();
        let config = ActionConfig::default();
        let mut c = citizen(dec!(0), dec!(1600));
        let shift = ProposedAction::WorkShift { hours: 1 };

        let err = validate_action(&shift, &c, &city, &NIGHT, &config).unwrap_err();
        assert_eq!(err, FailureReason::NotEmployed);

        c.employer_id = Some(EmployerId::new());
        let err = validate_action(&shift, &c, &city, &NIGHT, &config).unwrap_err();
        assert_eq!(err, FailureReason::NotWorkingHours);

        assert!(validate_action(&shift, &c, &city, &WORK, &config).is_ok());
    }

    #[test]
    fn eat_requires_cash_for_market_price() {
        let (mut city, ..) = two_district_city();
        city.goods.food_price_index = dec!(2);
        let config = ActionConfig::default();
        let eat = ProposedAction::Eat { cost: None };

        let poor = citizen(dec!(19.99), Decimal::ZERO);
        assert_eq!(
            validate_action(&eat, &poor, &city, &WORK, &config).unwrap_err(),
            FailureReason::InsufficientFunds
        );
        let exact = citizen(dec!(20), Decimal::ZERO);
        assert_eq!(
            validate_action(&eat, &exact, &city, &WORK, &config).unwrap(),
            ValidatedAction::Eat { cost: dec!(20) }
        );
    }

    #[test]
    fn commute_requires_an_edge() {
        let (mut city, a, b) = two_district_city();
        let c_id = DistrictId::new();
        city.map
            .add_district(District {
                id: c_id,
                name: String::from("Far"),
                kind: DistrictKind::Industrial,
            })
            .unwrap();
        let config = ActionConfig::default();
        let mut c = citizen(dec!(0), dec!(0));
        c.district_id = Some(a);

        let ok = ProposedAction::Commute { target: b };
        assert_eq!(
            validate_action(&ok, &c, &city, &WORK, &config).unwrap(),
            ValidatedAction::Commute { from: a, to: b }
        );
        let unreachable = ProposedAction::Commute { target: c_id };
        assert_eq!(
            validate_action(&unreachable, &c, &city, &WORK, &config).unwrap_err(),
            FailureReason::NoRouteAvailable
        );
        let same = ProposedAction::Commute { target: a };
        assert_eq!(
            validate_action(&same, &c, &city, &WORK, &config).unwrap_err(),
            FailureReason::NoRouteAvailable
        );
    }

    #[test]
    fn socialize_only_keeps_existing_tie_targets() {
        let (mut city, a, _) = two_district_city();
        city.services.push(PublicService {
            id: ServiceId::new(),
            kind: ServiceKind::Park,
            district_id: a,
            capacity: 100,
        });
        let config = ActionConfig::default();
        let friend = CitizenId::new();
        let mut c = citizen(dec!(0), dec!(0));
        c.district_id = Some(a);
        c.ties.push(SocialTie {
            target: friend,
            tie_type: TieType::Friend,
            strength: 0.5,
            interactions: 0,
        });

        let known = ProposedAction::Socialize { target: Some(friend) };
        assert_eq!(
            validate_action(&known, &c, &city, &WORK, &config).unwrap(),
            ValidatedAction::Socialize {
                tie_target: Some(friend),
                near_park: true
            }
        );
        let stranger = ProposedAction::Socialize {
            target: Some(CitizenId::new()),
        };
        assert_eq!(
            validate_action(&stranger, &c, &city, &WORK, &config).unwrap(),
            ValidatedAction::Socialize {
                tie_target: None,
                near_park: true
            }
        );
    }

    #[test]
    fn job_search_filters_by_wage_and_skills() {
        let (mut city, ..) = two_district_city();
        let cheap = listing(dec!(800), &[]);
        let skilled = listing(dec!(3000), &["welding"]);
        let plain = listing(dec!(1200), &[]);
        let plain_id = plain.id;
        city.labor.open_positions = vec![cheap, skilled, plain];
        let config = ActionConfig::default();
        let mut c = citizen(dec!(0), dec!(0));
        c.skills.push(Skill {
            name: String::from("welding"),
            level: 0.2,
            years: 1,
        });

        let search = ProposedAction::JobSearch {
            minimum_wage: dec!(1000),
        };
        assert_eq!(
            validate_action(&search, &c, &city, &WORK, &config).unwrap(),
            ValidatedAction::JobSearch { listing: plain_id }
        );

        let picky = ProposedAction::JobSearch {
            minimum_wage: dec!(2000),
        };
        assert_eq!(
            validate_action(&picky, &c, &city, &WORK, &config).unwrap_err(),
            FailureReason::NoMatchingJobs
        );

        c.skills[0].level = 0.3;
        let skilled_id = city.labor.open_positions[1].id;
        assert_eq!(
            validate_action(&picky, &c, &city, &WORK, &config).unwrap(),
            ValidatedAction::JobSearch { listing: skilled_id }
        );
    }

    #[test]
    fn housing_change_checks_vacancy_then_affordability() {
        let (mut city, _, b) = two_district_city();
        let at_bound = unit(b, dec!(800));
        let over = unit(b, dec!(800.01));
        let mut taken = unit(b, dec!(100));
        taken.occupant = Some(urbanium_types::HouseholdId::new());
        let (at_id, over_id, taken_id) = (at_bound.id, over.id, taken.id);
        city.housing.units = vec![at_bound, over, taken];
        let config = ActionConfig::default();
        let c = citizen(dec!(0), dec!(2000));

        let move_to = |unit| ProposedAction::HousingChange { unit };
        assert_eq!(
            validate_action(&move_to(Some(at_id)), &c, &city, &WORK, &config).unwrap(),
            ValidatedAction::HousingChange { unit: at_id }
        );
        assert_eq!(
            validate_action(&move_to(Some(over_id)), &c, &city, &WORK, &config).unwrap_err(),
            FailureReason::CannotAffordRent
        );
        assert_eq!(
            validate_action(&move_to(Some(taken_id)), &c, &city, &WORK, &config).unwrap_err(),
            FailureReason::HousingUnitUnavailable
        );
        assert_eq!(
            validate_action(&move_to(None), &c, &city, &WORK, &config).unwrap_err(),
            FailureReason::HousingUnitUnavailable
        );
    }
}
