//! Execution handlers for validated actions.
//!
//! Each handler assumes its action already passed
//! [`validate_action`](super::validation::validate_action) and applies the
//! side effects directly to the city. Money and need deltas are computed
//! before the first write, so an arithmetic error leaves the city as it
//! was. Handlers report what changed as a string effect map plus any
//! world events worth logging.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use urbanium_types::{
    Citizen, CitizenActivity, CitizenId, DistrictId, EmployerId, Household, HouseholdId,
    HousingUnitId, JobListingId, NeedKind, Skill, WorldEvent, WorldEventKind,
};
use urbanium_world::City;

use crate::config::ActionConfig;
use crate::error::AgentError;

use super::costs;
use super::validation::{ExecutionContext, ValidatedAction};

/// Changes produced by a handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerResult {
    /// Key/value record of what changed, for logging and observers.
    pub effects: BTreeMap<String, String>,
    /// Events to append to the world event log.
    pub events: Vec<WorldEvent>,
    /// The citizen's activity after the action.
    pub activity: CitizenActivity,
}

impl HandlerResult {
    fn new(activity: CitizenActivity) -> Self {
        Self {
            effects: BTreeMap::new(),
            events: Vec::new(),
            activity,
        }
    }

    fn effect(mut self, key: &str, value: impl ToString) -> Self {
        self.effects.insert(key.to_owned(), value.to_string());
        self
    }

    fn event(mut self, tick: u64, kind: WorldEventKind, description: String) -> Self {
        self.events.push(WorldEvent {
            tick,
            kind,
            description,
        });
        self
    }
}

fn citizen(city: &City, id: CitizenId) -> Result<&Citizen, AgentError> {
    city.citizen(id).ok_or(AgentError::CitizenNotFound(id))
}

fn citizen_mut(city: &mut City, id: CitizenId) -> Result<&mut Citizen, AgentError> {
    city.citizen_mut(id).ok_or(AgentError::CitizenNotFound(id))
}

fn need_effect(value: f64) -> String {
    format!("{value:.3}")
}

/// Credit the hourly share of monthly income and tire the citizen.
pub fn execute_work_shift(
    city: &mut City,
    id: CitizenId,
    employer: EmployerId,
    hours: u32,
    config: &ActionConfig,
) -> Result<HandlerResult, AgentError> {
    let citizen = citizen_mut(city, id)?;
    let wage = costs::shift_wage(citizen.resources.monthly_income, config.hours_per_month, hours)
        .ok_or_else(|| AgentError::overflow("shift wage"))?;
    let cash = citizen
        .resources
        .cash
        .checked_add(wage)
        .ok_or_else(|| AgentError::overflow("wage credit"))?;

    citizen.resources.cash = cash;
    citizen.needs.adjust(NeedKind::Energy, config.work_energy_cost);
    citizen.needs.adjust(NeedKind::Income, -config.work_income_relief);

    let mut result = HandlerResult::new(CitizenActivity::Working)
        .effect("employer", employer)
        .effect("hours", hours)
        .effect("wage", wage)
        .effect("cash", cash)
        .effect("energy", need_effect(citizen.needs.energy));

    if let Some(skill) = strongest_skill_mut(citizen) {
        let gain = config.skill_gain_per_hour * f64::from(hours);
        skill.level = (skill.level + gain).clamp(0.0, 1.0);
        result = result
            .effect("skill", &skill.name)
            .effect("skill_level", need_effect(skill.level));
    }
    Ok(result)
}

/// The highest-proficiency skill, earliest first on equal level.
fn strongest_skill_mut(citizen: &mut Citizen) -> Option<&mut Skill> {
    citizen.skills.iter_mut().fold(None, |best: Option<&mut Skill>, skill| match best {
        Some(current) if current.level >= skill.level => Some(current),
        _ => Some(skill),
    })
}

/// Recover energy; a household roof recovers more.
pub fn execute_rest(
    city: &mut City,
    id: CitizenId,
    sheltered: bool,
    config: &ActionConfig,
) -> Result<HandlerResult, AgentError> {
    let citizen = citizen_mut(city, id)?;
    let recovery = if sheltered {
        config.rest_recovery_sheltered
    } else {
        config.rest_recovery_unsheltered
    };
    citizen.needs.adjust(NeedKind::Energy, -recovery);

    Ok(HandlerResult::new(CitizenActivity::Resting)
        .effect("sheltered", sheltered)
        .effect("energy", need_effect(citizen.needs.energy)))
}

/// Pay for a meal and reduce hunger.
pub fn execute_eat(
    city: &mut City,
    id: CitizenId,
    cost: Decimal,
    config: &ActionConfig,
) -> Result<HandlerResult, AgentError> {
    let citizen = citizen_mut(city, id)?;
    let cash = citizen
        .resources
        .cash
        .checked_sub(cost)
        .ok_or_else(|| AgentError::overflow("meal debit"))?;

    citizen.resources.cash = cash;
    citizen.needs.adjust(NeedKind::Hunger, -config.eat_relief);

    Ok(HandlerResult::new(CitizenActivity::Idle)
        .effect("cost", cost)
        .effect("cash", cash)
        .effect("hunger", need_effect(citizen.needs.hunger)))
}

/// Move to an adjacent district.
pub fn execute_commute(
    city: &mut City,
    id: CitizenId,
    from: DistrictId,
    to: DistrictId,
    config: &ActionConfig,
) -> Result<HandlerResult, AgentError> {
    let citizen = citizen_mut(city, id)?;
    citizen.district_id = Some(to);
    citizen.needs.adjust(NeedKind::Energy, config.commute_energy_cost);

    Ok(HandlerResult::new(CitizenActivity::Commuting)
        .effect("from", from)
        .effect("to", to)
        .effect("energy", need_effect(citizen.needs.energy)))
}

/// Reduce social need and reinforce an existing tie.
pub fn execute_socialize(
    city: &mut City,
    id: CitizenId,
    tie_target: Option<CitizenId>,
    near_park: bool,
    config: &ActionConfig,
) -> Result<HandlerResult, AgentError> {
    let citizen = citizen_mut(city, id)?;
    let relief = if near_park {
        config.socialize_relief + config.park_bonus
    } else {
        config.socialize_relief
    };
    citizen.needs.adjust(NeedKind::Social, -relief);

    let mut result = HandlerResult::new(CitizenActivity::Socializing)
        .effect("social", need_effect(citizen.needs.social))
        .effect("near_park", near_park);

    if let Some(target) = tie_target
        && let Some(tie) = citizen.tie_mut(target)
    {
        tie.reinforce(config.tie_reinforcement);
        result = result
            .effect("tie_target", target)
            .effect("tie_strength", need_effect(tie.strength))
            .effect("tie_interactions", tie.interactions);
    }
    Ok(result)
}

/// Fill a listing: bind the citizen to its employer and consume it.
pub fn execute_job_search(
    city: &mut City,
    id: CitizenId,
    listing_id: JobListingId,
    tick: u64,
) -> Result<HandlerResult, AgentError> {
    let (name, previous) = {
        let citizen = citizen(city, id)?;
        (citizen.name.clone(), citizen.employer_id)
    };
    let employer_id = city
        .labor
        .open_positions
        .iter()
        .find(|listing| listing.id == listing_id)
        .map(|listing| listing.employer_id)
        .ok_or(AgentError::JobListingNotFound(listing_id))?;
    if !city.employers.contains_key(&employer_id) {
        return Err(AgentError::EmployerNotFound(employer_id));
    }

    let listing = city
        .labor
        .take(listing_id)
        .ok_or(AgentError::JobListingNotFound(listing_id))?;
    if let Some(old) = previous
        && let Some(employer) = city.employers.get_mut(&old)
    {
        employer.employees.retain(|member| *member != id);
    }
    let employer_name = city
        .employers
        .get_mut(&employer_id)
        .map(|employer| {
            employer.employees.push(id);
            employer.name.clone()
        })
        .unwrap_or_default();

    let citizen = citizen_mut(city, id)?;
    citizen.employer_id = Some(employer_id);
    citizen.resources.monthly_income = listing.wage;
    citizen.needs.adjust(NeedKind::Income, -1.0);

    Ok(HandlerResult::new(CitizenActivity::Employed)
        .effect("listing", listing.id)
        .effect("employer", employer_id)
        .effect("title", &listing.title)
        .effect("monthly_income", listing.wage)
        .event(
            tick,
            WorldEventKind::Hired,
            format!("{name} was hired as {} at {employer_name} for {}", listing.title, listing.wage),
        ))
}

/// Move into a vacant unit as a new single-member household.
///
/// The citizen leaves its current household first. A household left empty
/// is dissolved and its unit released.
pub fn execute_housing_change(
    city: &mut City,
    id: CitizenId,
    unit_id: HousingUnitId,
    tick: u64,
) -> Result<HandlerResult, AgentError> {
    let (name, old_household) = {
        let citizen = citizen(city, id)?;
        (citizen.name.clone(), citizen.household_id)
    };
    let (rent, district) = city
        .housing
        .get(unit_id)
        .map(|unit| (unit.rent, unit.district_id))
        .ok_or(AgentError::HousingUnitNotFound(unit_id))?;
    if let Some(household) = old_household
        && !city.households.contains_key(&household)
    {
        return Err(AgentError::HouseholdNotFound(household));
    }

    let mut result = HandlerResult::new(CitizenActivity::Idle);
    if let Some(dissolved) = leave_household(city, id, old_household) {
        result = result.effect("dissolved_household", dissolved).event(
            tick,
            WorldEventKind::HouseholdDissolved,
            format!("household {dissolved} dissolved when {name} moved out"),
        );
    }

    let household_id = city.ids.household();
    city.households.insert(
        household_id,
        Household {
            id: household_id,
            members: vec![id],
            home_id: unit_id,
            district_id: district,
        },
    );
    if let Some(unit) = city.housing.get_mut(unit_id) {
        unit.occupant = Some(household_id);
    }

    let citizen = citizen_mut(city, id)?;
    citizen.household_id = Some(household_id);
    citizen.home_id = Some(unit_id);
    citizen.district_id = Some(district);
    citizen.resources.monthly_expenses = rent;
    citizen.needs.adjust(NeedKind::Shelter, -1.0);

    Ok(result
        .effect("unit", unit_id)
        .effect("household", household_id)
        .effect("district", district)
        .effect("monthly_expenses", rent)
        .event(
            tick,
            WorldEventKind::Moved,
            format!("{name} moved into unit {unit_id} at rent {rent}"),
        )
        .event(
            tick,
            WorldEventKind::HouseholdFormed,
            format!("{name} formed household {household_id}"),
        ))
}

/// Remove `id` from its household. Returns the household id when it was
/// left empty and dissolved.
fn leave_household(
    city: &mut City,
    id: CitizenId,
    household: Option<HouseholdId>,
) -> Option<HouseholdId> {
    let household_id = household?;
    let household = city.households.get_mut(&household_id)?;
    household.members.retain(|member| *member != id);
    if !household.members.is_empty() {
        city.refresh_rent_shares(household_id);
        return None;
    }
    let home = household.home_id;
    city.households.remove(&household_id);
    if let Some(unit) = city.housing.get_mut(home) {
        unit.occupant = None;
    }
    Some(household_id)
}

/// Dispatch a validated action to its handler.
pub fn apply_validated(
    action: ValidatedAction,
    id: CitizenId,
    city: &mut City,
    ctx: &ExecutionContext,
    config: &ActionConfig,
) -> Result<HandlerResult, AgentError> {
    match action {
        ValidatedAction::WorkShift { employer, hours } => {
            execute_work_shift(city, id, employer, hours, config)
        }
        ValidatedAction::Rest { sheltered } => execute_rest(city, id, sheltered, config),
        ValidatedAction::Eat { cost } => execute_eat(city, id, cost, config),
        ValidatedAction::Commute { from, to } => execute_commute(city, id, from, to, config),
        ValidatedAction::Socialize {
            tie_target,
            near_park,
        } => execute_socialize(city, id, tie_target, near_park, config),
        ValidatedAction::JobSearch { listing } => execute_job_search(city, id, listing, ctx.tick),
        ValidatedAction::HousingChange { unit } => {
            execute_housing_change(city, id, unit, ctx.tick)
        }
    }
}
