//! Deterministic city generation.
//!
//! [`generate_city`] builds a complete [`City`] from a [`CityConfig`] and a
//! seed: districts and their connections, public services, housing units,
//! employers and their open listings, and the initial population with
//! households, jobs, and social ties. Identifiers come from an [`IdSource`]
//! seeded with the world seed; attributes draw from their own stream. The
//! same config and seed always produce the same city.

use std::collections::BTreeMap;

use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use tracing::info;
use urbanium_types::{
    Citizen, CitizenActivity, CitizenId, District, DistrictId, DistrictKind, Employer, EmployerId,
    Household, HousingUnit, JobListing, LaborMarket, Needs, PublicService, Resources, ServiceKind,
    Skill, SocialTie, TieType, Traits,
};

use crate::city::City;
use crate::city_map::CityMap;
use crate::error::WorldError;
use crate::ids::IdSource;

/// Offset mixed into the seed for the attribute stream.
const ATTRIBUTE_STREAM: u64 = 0x9e37_79b9_7f4a_7c15;

// -----------------------------------------------------------------------
// Configuration
// -----------------------------------------------------------------------

/// Sizes and economic parameters of a generated city.
///
/// Loaded from the `scenario` section of the YAML config. Every field has
/// a default, so an empty section yields a 100-citizen city.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityConfig {
    /// Number of citizens.
    #[serde(default = "default_population")]
    pub population: u32,

    /// Number of districts, including the downtown hub.
    #[serde(default = "default_districts")]
    pub districts: u32,

    /// Number of employers.
    #[serde(default = "default_employers")]
    pub employers: u32,

    /// Number of housing units.
    #[serde(default = "default_housing_units")]
    pub housing_units: u32,

    /// Number of open job listings at start.
    #[serde(default = "default_job_listings")]
    pub job_listings: u32,

    /// Lowest starting cash balance.
    #[serde(default = "default_initial_cash_min")]
    pub initial_cash_min: Decimal,

    /// Highest starting cash balance.
    #[serde(default = "default_initial_cash_max")]
    pub initial_cash_max: Decimal,

    /// Reference monthly wage. Listings and starting incomes scatter around it.
    #[serde(default = "default_base_wage")]
    pub base_wage: Decimal,

    /// Reference monthly rent. Unit rents scatter around it.
    #[serde(default = "default_base_rent")]
    pub base_rent: Decimal,

    /// Starting minimum monthly wage policy.
    #[serde(default = "default_minimum_wage")]
    pub minimum_wage: Decimal,

    /// Share of citizens that start without a household.
    #[serde(default = "default_homeless_share")]
    pub homeless_share: f64,

    /// Share of citizens that start employed.
    #[serde(default = "default_employed_share")]
    pub employed_share: f64,
}

impl Default for CityConfig {
    fn default() -> Self {
        Self {
            population: default_population(),
            districts: default_districts(),
            employers: default_employers(),
            housing_units: default_housing_units(),
            job_listings: default_job_listings(),
            initial_cash_min: default_initial_cash_min(),
            initial_cash_max: default_initial_cash_max(),
            base_wage: default_base_wage(),
            base_rent: default_base_rent(),
            minimum_wage: default_minimum_wage(),
            homeless_share: default_homeless_share(),
            employed_share: default_employed_share(),
        }
    }
}

impl CityConfig {
    /// Check that the configuration can produce a valid city.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidConfig`] describing the first problem.
    pub fn validate(&self) -> Result<(), WorldError> {
        if self.districts == 0 {
            return Err(invalid("at least one district is required"));
        }
        if self.initial_cash_min.is_sign_negative() {
            return Err(invalid("initial_cash_min must not be negative"));
        }
        if self.initial_cash_min > self.initial_cash_max {
            return Err(invalid("initial_cash_min must not exceed initial_cash_max"));
        }
        if self.base_wage.is_sign_negative() || self.base_rent.is_sign_negative() {
            return Err(invalid("base_wage and base_rent must not be negative"));
        }
        if !(0.0..=1.0).contains(&self.homeless_share) {
            return Err(invalid("homeless_share must be within [0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.employed_share) {
            return Err(invalid("employed_share must be within [0, 1]"));
        }
        Ok(())
    }
}

fn invalid(message: &str) -> WorldError {
    WorldError::InvalidConfig {
        message: message.to_owned(),
    }
}

const fn default_population() -> u32 {
    100
}

const fn default_districts() -> u32 {
    5
}

const fn default_employers() -> u32 {
    10
}

const fn default_housing_units() -> u32 {
    80
}

const fn default_job_listings() -> u32 {
    30
}

const fn default_initial_cash_min() -> Decimal {
    Decimal::from_parts(100, 0, 0, false, 0)
}

const fn default_initial_cash_max() -> Decimal {
    Decimal::from_parts(1000, 0, 0, false, 0)
}

const fn default_base_wage() -> Decimal {
    Decimal::from_parts(1000, 0, 0, false, 0)
}

const fn default_base_rent() -> Decimal {
    Decimal::from_parts(500, 0, 0, false, 0)
}

const fn default_minimum_wage() -> Decimal {
    Decimal::from_parts(900, 0, 0, false, 0)
}

const fn default_homeless_share() -> f64 {
    0.1
}

const fn default_employed_share() -> f64 {
    0.6
}

// -----------------------------------------------------------------------
// Pools
// -----------------------------------------------------------------------

const FIRST_NAMES: &[&str] = &[
    "Ada", "Bruno", "Chioma", "Dmitri", "Elena", "Farid", "Greta", "Hiro", "Ines", "Jonas",
    "Kemi", "Luca", "Mira", "Nikhil", "Olga", "Pavel", "Quinn", "Rosa", "Sami", "Tomas",
    "Uma", "Viktor", "Wen", "Ximena", "Yusuf", "Zora",
];

const LAST_NAMES: &[&str] = &[
    "Abara", "Berg", "Costa", "Duarte", "Ekwueme", "Fischer", "Garcia", "Horvat", "Ito",
    "Jansen", "Kowalski", "Lindqvist", "Moreau", "Nakamura", "Okafor", "Petrov", "Rossi",
    "Santos", "Tanaka", "Varga",
];

const DISTRICT_NAMES: &[&str] = &[
    "Riverside", "Northgate", "Eastwood", "Southport", "Hillcrest", "Westfield", "Old Town",
    "Harbor", "Millbrook", "Ashford",
];

/// Non-hub district kinds, cycled in order.
const DISTRICT_KINDS: [DistrictKind; 4] = [
    DistrictKind::Residential,
    DistrictKind::Residential,
    DistrictKind::Industrial,
    DistrictKind::Commercial,
];

/// Industry label and the skill its listings may require.
const INDUSTRIES: &[(&str, &str)] = &[
    ("Construction", "carpentry"),
    ("Finance", "accounting"),
    ("Healthcare", "nursing"),
    ("Education", "teaching"),
    ("Logistics", "driving"),
    ("Hospitality", "cooking"),
    ("Software", "programming"),
    ("Retail", "sales"),
];

const SERVICE_KINDS: [ServiceKind; 4] = [
    ServiceKind::TransitHub,
    ServiceKind::Hospital,
    ServiceKind::Park,
    ServiceKind::School,
];

// -----------------------------------------------------------------------
// Generation
// -----------------------------------------------------------------------

/// Build a fresh city from `config`, deterministic in `seed`.
///
/// # Errors
///
/// Returns [`WorldError::InvalidConfig`] if the configuration is invalid
/// and [`WorldError::ArithmeticOverflow`] if a money calculation overflows.
pub fn generate_city(config: &CityConfig, seed: u64) -> Result<City, WorldError> {
    config.validate()?;

    let mut ids = IdSource::from_seed(seed);
    let mut rng = ChaCha8Rng::seed_from_u64(seed ^ ATTRIBUTE_STREAM);

    let map = build_map(config.districts, &mut ids)?;
    let mut city = City::empty(LaborMarket::new(config.minimum_wage), ids);
    city.map = map;

    place_services(&mut city);
    build_housing(&mut city, config, &mut rng)?;
    let skill_by_employer = build_employers(&mut city, config, &mut rng);
    post_listings(&mut city, config, &skill_by_employer, &mut rng)?;
    populate(&mut city, config, &mut rng)?;

    info!(
        seed,
        districts = city.map.district_count(),
        citizens = city.citizens.len(),
        households = city.households.len(),
        employers = city.employers.len(),
        housing_units = city.housing.units.len(),
        open_positions = city.labor.open_positions.len(),
        "City generated"
    );

    Ok(city)
}

/// One downtown hub connected to every other district, plus a chain
/// between consecutive non-hub districts.
fn build_map(count: u32, ids: &mut IdSource) -> Result<CityMap, WorldError> {
    let mut map = CityMap::new();
    let hub = ids.district();
    map.add_district(District {
        id: hub,
        name: String::from("Downtown"),
        kind: DistrictKind::Downtown,
    })?;

    let mut previous: Option<DistrictId> = None;
    let others = DISTRICT_NAMES
        .iter()
        .cycle()
        .zip(DISTRICT_KINDS.iter().cycle())
        .enumerate()
        .take(count.saturating_sub(1) as usize);
    for (index, (name, kind)) in others {
        let id = ids.district();
        let lap = index.checked_div(DISTRICT_NAMES.len()).unwrap_or(0);
        let name = if lap == 0 {
            (*name).to_owned()
        } else {
            format!("{name} {}", lap.saturating_add(1))
        };
        map.add_district(District {
            id,
            name,
            kind: *kind,
        })?;
        map.connect(hub, id)?;
        if let Some(prev) = previous {
            map.connect(prev, id)?;
        }
        previous = Some(id);
    }
    Ok(map)
}

fn place_services(city: &mut City) {
    let districts: Vec<DistrictId> = city.map.districts().iter().map(|d| d.id).collect();
    for (kind, district_id) in SERVICE_KINDS.iter().zip(districts.iter().cycle()) {
        let id = city.ids.service();
        city.services.push(PublicService {
            id,
            kind: *kind,
            district_id: *district_id,
            capacity: 200,
        });
    }
}

fn build_housing(
    city: &mut City,
    config: &CityConfig,
    rng: &mut ChaCha8Rng,
) -> Result<(), WorldError> {
    let mut homes_in = city.map.districts_of_kind(DistrictKind::Residential);
    if homes_in.is_empty() {
        homes_in = city.map.districts().iter().map(|d| d.id).collect();
    }
    for district_id in homes_in.iter().cycle().take(config.housing_units as usize) {
        let rent = scatter(config.base_rent, 60, 140, rng)?;
        let id = city.ids.housing_unit();
        city.housing.units.push(HousingUnit {
            id,
            district_id: *district_id,
            rent,
            occupant: None,
        });
    }
    Ok(())
}

/// Create employers in non-residential districts. Returns the skill each
/// employer's listings may require.
fn build_employers(
    city: &mut City,
    config: &CityConfig,
    rng: &mut ChaCha8Rng,
) -> BTreeMap<EmployerId, &'static str> {
    let workplaces: Vec<DistrictId> = city
        .map
        .districts()
        .iter()
        .filter(|d| d.kind != DistrictKind::Residential)
        .map(|d| d.id)
        .collect();

    let mut skills = BTreeMap::new();
    for (index, district_id) in workplaces
        .iter()
        .cycle()
        .take(config.employers as usize)
        .enumerate()
    {
        let Some(&(industry, skill)) = INDUSTRIES.choose(rng) else {
            continue;
        };
        let id = city.ids.employer();
        city.employers.insert(
            id,
            Employer {
                id,
                name: format!("{industry} Co. {}", index.saturating_add(1)),
                industry: industry.to_owned(),
                district_id: *district_id,
                employees: Vec::new(),
            },
        );
        skills.insert(id, skill);
    }
    skills
}

fn post_listings(
    city: &mut City,
    config: &CityConfig,
    skill_by_employer: &BTreeMap<EmployerId, &'static str>,
    rng: &mut ChaCha8Rng,
) -> Result<(), WorldError> {
    let employers: Vec<EmployerId> = city.employers.keys().copied().collect();
    for employer_id in employers.iter().cycle().take(config.job_listings as usize) {
        let wage = scatter(config.base_wage, 80, 200, rng)?;
        let required_skills = match skill_by_employer.get(employer_id) {
            Some(skill) if rng.random_bool(0.5) => vec![(*skill).to_owned()],
            _ => Vec::new(),
        };
        let id = city.ids.job_listing();
        city.labor.open_positions.push(JobListing {
            id,
            employer_id: *employer_id,
            title: String::from("Associate"),
            wage,
            required_skills,
        });
    }
    Ok(())
}

fn populate(city: &mut City, config: &CityConfig, rng: &mut ChaCha8Rng) -> Result<(), WorldError> {
    let employers: Vec<EmployerId> = city.employers.keys().copied().collect();
    let districts: Vec<DistrictId> = city.map.districts().iter().map(|d| d.id).collect();
    let mut order = Vec::with_capacity(config.population as usize);
    let mut housed = Vec::new();

    for _ in 0..config.population {
        let id = city.ids.citizen();
        let mut citizen = random_citizen(id, config, rng)?;

        if rng.random_bool(config.employed_share)
            && let Some(employer_id) = employers.choose(rng)
        {
            citizen.employer_id = Some(*employer_id);
            citizen.resources.monthly_income = scatter(config.base_wage, 80, 160, rng)?;
            if let Some(employer) = city.employers.get_mut(employer_id) {
                employer.employees.push(id);
            }
        }

        if rng.random_bool(config.homeless_share) {
            citizen.district_id = districts.choose(rng).copied();
        } else {
            housed.push(id);
        }

        order.push(id);
        city.citizens.insert(id, citizen);
    }

    form_households(city, housed, &districts, rng)?;
    weave_ties(city, &order, rng);
    Ok(())
}

fn random_citizen(
    id: CitizenId,
    config: &CityConfig,
    rng: &mut ChaCha8Rng,
) -> Result<Citizen, WorldError> {
    let first = FIRST_NAMES.choose(rng).copied().unwrap_or("Alex");
    let last = LAST_NAMES.choose(rng).copied().unwrap_or("Doe");

    let skill_count = rng.random_range(1..=2_usize);
    let skills = INDUSTRIES
        .choose_multiple(rng, skill_count)
        .map(|(_, skill)| Skill {
            name: (*skill).to_owned(),
            level: rng.random_range(0.2..1.0),
            years: rng.random_range(0..=20),
        })
        .collect();

    Ok(Citizen {
        id,
        name: format!("{first} {last}"),
        age: rng.random_range(18..=70),
        traits: Traits {
            sociability: rng.random(),
            risk_tolerance: rng.random(),
            frugality: rng.random(),
            ambition: rng.random(),
            stability: rng.random(),
        },
        skills,
        resources: Resources {
            cash: random_money(config.initial_cash_min, config.initial_cash_max, rng)?,
            ..Resources::default()
        },
        needs: Needs {
            hunger: rng.random_range(0.0..0.3),
            energy: rng.random_range(0.0..0.3),
            social: rng.random_range(0.0..0.3),
            shelter: 0.0,
            income: 0.0,
        },
        ties: Vec::new(),
        employer_id: None,
        household_id: None,
        home_id: None,
        district_id: None,
        activity: CitizenActivity::Idle,
        unemployed_ticks: 0,
        total_decisions: 0,
        oracle_decisions: 0,
    })
}

/// Group housed citizens into households of one to three, one unit each.
/// Citizens left over when units run out start homeless.
fn form_households(
    city: &mut City,
    housed: Vec<CitizenId>,
    districts: &[DistrictId],
    rng: &mut ChaCha8Rng,
) -> Result<(), WorldError> {
    let mut waiting = housed.into_iter().peekable();
    let unit_count = city.housing.units.len();

    for unit_index in 0..unit_count {
        if waiting.peek().is_none() {
            break;
        }
        let size = rng.random_range(1..=3_usize);
        let members: Vec<CitizenId> = waiting.by_ref().take(size).collect();
        let household_id = city.ids.household();
        let Some(unit) = city.housing.units.get_mut(unit_index) else {
            break;
        };
        unit.occupant = Some(household_id);
        let (home_id, district_id) = (unit.id, unit.district_id);

        for member in &members {
            if let Some(citizen) = city.citizens.get_mut(member) {
                citizen.household_id = Some(household_id);
                citizen.home_id = Some(home_id);
                citizen.district_id = Some(district_id);
            }
        }
        city.households.insert(
            household_id,
            Household {
                id: household_id,
                members,
                home_id,
                district_id,
            },
        );
        city.refresh_rent_shares(household_id).ok_or(WorldError::ArithmeticOverflow)?;
    }

    for leftover in waiting {
        if let Some(citizen) = city.citizens.get_mut(&leftover) {
            citizen.district_id = districts.choose(rng).copied();
        }
    }
    Ok(())
}

/// Family ties within households, coworker ties between consecutive hires,
/// and one acquaintance per citizen.
fn weave_ties(city: &mut City, order: &[CitizenId], rng: &mut ChaCha8Rng) {
    let mut pairs: Vec<(CitizenId, CitizenId, TieType, f64)> = Vec::new();
    for household in city.households.values() {
        for a in &household.members {
            for b in household.members.iter().filter(|b| *b != a) {
                pairs.push((*a, *b, TieType::Family, 0.8));
            }
        }
    }
    for employer in city.employers.values() {
        for window in employer.employees.windows(2) {
            if let [a, b] = window {
                pairs.push((*a, *b, TieType::Coworker, 0.4));
                pairs.push((*b, *a, TieType::Coworker, 0.4));
            }
        }
    }
    if order.len() > 1 {
        for id in order {
            if let Some(other) = order.choose(rng)
                && other != id
            {
                pairs.push((*id, *other, TieType::Acquaintance, 0.2));
            }
        }
    }

    for (from, to, tie_type, strength) in pairs {
        if let Some(citizen) = city.citizens.get_mut(&from)
            && citizen.ties.iter().all(|t| t.target != to)
        {
            citizen.ties.push(SocialTie {
                target: to,
                tie_type,
                strength,
                interactions: 0,
            });
        }
    }
}

// -----------------------------------------------------------------------
// Money helpers
// -----------------------------------------------------------------------

/// `base` scaled by a random percentage in `[low_pct, high_pct]`, in cents.
fn scatter(
    base: Decimal,
    low_pct: i64,
    high_pct: i64,
    rng: &mut ChaCha8Rng,
) -> Result<Decimal, WorldError> {
    let factor = Decimal::new(rng.random_range(low_pct..=high_pct), 2);
    base.checked_mul(factor)
        .map(|value| value.round_dp(2))
        .ok_or(WorldError::ArithmeticOverflow)
}

/// Uniform amount in `[min, max]`, in whole cents.
fn random_money(min: Decimal, max: Decimal, rng: &mut ChaCha8Rng) -> Result<Decimal, WorldError> {
    let to_cents = |value: Decimal| {
        value
            .checked_mul(Decimal::ONE_HUNDRED)
            .and_then(|cents| cents.trunc().to_i64())
            .ok_or(WorldError::ArithmeticOverflow)
    };
    let low = to_cents(min)?;
    let high = to_cents(max)?;
    Ok(Decimal::new(rng.random_range(low..=high), 2))
}
