//! Deterministic decision arbitration for citizens.
//!
//! [`decide`] turns one citizen and a read-only city into a single
//! [`Decision`]:
//!
//! 1. **Critical override.** Hunger, energy, or shelter at or above the
//!    critical threshold forces Eat, Rest, or `HousingChange`, checked in
//!    that order.
//! 2. **Priority table.** Otherwise each rule that fires contributes a
//!    candidate with a fixed priority. The highest priority wins; on equal
//!    priority the earlier rule wins.
//! 3. **Default.** Rest when no rule fires.
//!
//! Two rules are trait-weighted rolls. They draw from a ChaCha8 stream
//! seeded from (world seed, citizen id, tick), so a citizen's rolls do not
//! depend on how many citizens were processed before it.
//!
//! The oracle path lives in `urbanium-core`; it uses [`available_actions`]
//! to constrain the vocabulary and [`proposal_for`] to build a payload for
//! the kind the oracle picked.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rust_decimal::Decimal;
use tracing::{debug, trace};
use urbanium_types::{
    ActionType, Citizen, CitizenId, Decision, DecisionSource, DistrictId, HousingUnit,
    HousingUnitId, NeedKind, ProposedAction,
};
use urbanium_world::City;

use crate::actions::{costs, validation};
use crate::config::{ActionConfig, NeedsConfig};
use crate::needs::first_critical_need;

// ---------------------------------------------------------------------------
// Rule priorities
// ---------------------------------------------------------------------------

/// Unemployed with a matching opening.
const PRIORITY_SEEK_EMPLOYMENT: u32 = 90;

/// Hunger at or above the urgent threshold and a meal is affordable.
const PRIORITY_HUNGRY: u32 = 85;

/// Employed during working hours.
const PRIORITY_WORK: u32 = 80;

/// Homeless with an affordable vacant unit.
const PRIORITY_FIND_HOME: u32 = 75;

/// Social need and sociability both above their cutoffs.
const PRIORITY_LONELY: u32 = 70;

/// Employed, daytime before work, away from the workplace.
const PRIORITY_GO_TO_WORK: u32 = 65;

/// Energy need at or above the urgent threshold.
const PRIORITY_TIRED: u32 = 60;

/// Night, away from home.
const PRIORITY_GO_HOME: u32 = 50;

/// Ambition roll for a better-paid job.
const PRIORITY_CAREER_MOVE: u32 = 40;

/// Sociability roll for a casual meeting.
const PRIORITY_CASUAL_SOCIAL: u32 = 30;

// ---------------------------------------------------------------------------
// Context
// ---------------------------------------------------------------------------

/// Per-tick inputs to arbitration beyond the citizen and the city.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecisionContext {
    /// The tick being decided.
    pub tick: u64,
    /// The world seed, mixed into each citizen's roll stream.
    pub seed: u64,
    /// Whether the current hour is within working hours.
    pub is_working_hours: bool,
    /// Whether the current hour is daytime.
    pub is_daytime: bool,
}

/// A rule that fired, with the action it proposes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// The proposed action.
    pub action: ProposedAction,
    /// Rule priority; higher wins.
    pub priority: u32,
    /// Rule name for logging.
    pub rule: &'static str,
}

/// The roll stream for one citizen on one tick.
pub fn citizen_rng(seed: u64, citizen: CitizenId, tick: u64) -> ChaCha8Rng {
    let mut key = [0_u8; 32];
    let uuid = citizen.into_inner();
    let material = seed
        .to_le_bytes()
        .into_iter()
        .chain(uuid.as_bytes().iter().copied())
        .chain(tick.to_le_bytes());
    for (slot, byte) in key.iter_mut().zip(material) {
        *slot = byte;
    }
    ChaCha8Rng::from_seed(key)
}

// ---------------------------------------------------------------------------
// Arbitration
// ---------------------------------------------------------------------------

/// Decide the action for `citizen` using the deterministic path.
///
/// The result is tagged [`DecisionSource::CriticalOverride`] or
/// [`DecisionSource::RuleTable`].
pub fn decide(
    citizen: &Citizen,
    city: &City,
    ctx: &DecisionContext,
    needs: &NeedsConfig,
    actions: &ActionConfig,
) -> Decision {
    if let Some(action) = critical_override(citizen, city, needs, actions) {
        debug!(
            citizen_id = %citizen.id,
            action = %action.action_type(),
            "critical need override"
        );
        return Decision::rule(action, DecisionSource::CriticalOverride);
    }
    Decision::rule(
        rule_decision(citizen, city, ctx, needs, actions),
        DecisionSource::RuleTable,
    )
}

/// The emergency action for the first critical need, if any.
pub fn critical_override(
    citizen: &Citizen,
    city: &City,
    needs: &NeedsConfig,
    actions: &ActionConfig,
) -> Option<ProposedAction> {
    match first_critical_need(citizen, needs)? {
        NeedKind::Hunger => Some(ProposedAction::Eat { cost: None }),
        NeedKind::Energy => Some(ProposedAction::Rest),
        NeedKind::Shelter | NeedKind::Social | NeedKind::Income => {
            Some(ProposedAction::HousingChange {
                unit: housing_target(citizen, city, actions),
            })
        }
    }
}

/// The winning rule-table action, or Rest when no rule fires.
pub fn rule_decision(
    citizen: &Citizen,
    city: &City,
    ctx: &DecisionContext,
    needs: &NeedsConfig,
    actions: &ActionConfig,
) -> ProposedAction {
    let candidates = rule_candidates(citizen, city, ctx, needs, actions);
    let winner = candidates.into_iter().fold(None, |best: Option<Candidate>, candidate| match best {
        Some(current) if current.priority >= candidate.priority => Some(current),
        _ => Some(candidate),
    });
    match winner {
        Some(candidate) => {
            trace!(
                citizen_id = %citizen.id,
                rule = candidate.rule,
                priority = candidate.priority,
                "rule table decision"
            );
            candidate.action
        }
        None => ProposedAction::Rest,
    }
}

/// Every rule that fires for `citizen`, in rule order.
pub fn rule_candidates(
    citizen: &Citizen,
    city: &City,
    ctx: &DecisionContext,
    needs: &NeedsConfig,
    actions: &ActionConfig,
) -> Vec<Candidate> {
    let mut rng = citizen_rng(ctx.seed, citizen.id, ctx.tick);
    let career_roll: f64 = rng.random();
    let social_roll: f64 = rng.random();

    let mut candidates = Vec::new();
    let mut push = |priority, rule, action| {
        candidates.push(Candidate {
            action,
            priority,
            rule,
        });
    };

    let minimum_wage = city.labor.minimum_wage;
    if !citizen.is_employed()
        && validation::first_matching_listing(citizen, city, actions, minimum_wage).is_some()
    {
        push(
            PRIORITY_SEEK_EMPLOYMENT,
            "seek_employment",
            ProposedAction::JobSearch { minimum_wage },
        );
    }

    if citizen.needs.hunger >= needs.urgent_threshold && can_afford_meal(citizen, city, actions) {
        push(PRIORITY_HUNGRY, "hungry", ProposedAction::Eat { cost: None });
    }

    if ctx.is_working_hours && citizen.is_employed() {
        push(
            PRIORITY_WORK,
            "work_hours",
            ProposedAction::WorkShift {
                hours: actions.shift_hours,
            },
        );
    }

    if !citizen.has_shelter()
        && let Some(unit) = affordable_unit(citizen, city, actions)
    {
        push(
            PRIORITY_FIND_HOME,
            "find_home",
            ProposedAction::HousingChange { unit: Some(unit) },
        );
    }

    if citizen.needs.social >= needs.social_threshold
        && citizen.traits.sociability >= needs.sociability_cutoff
    {
        push(
            PRIORITY_LONELY,
            "lonely",
            ProposedAction::Socialize {
                target: citizen.strongest_tie().map(|tie| tie.target),
            },
        );
    }

    if citizen.is_employed()
        && ctx.is_daytime
        && !ctx.is_working_hours
        && let Some(target) = employer_district(citizen, city).and_then(|d| hop_toward(citizen, city, d))
    {
        push(PRIORITY_GO_TO_WORK, "go_to_work", ProposedAction::Commute { target });
    }

    if citizen.needs.energy >= needs.urgent_threshold {
        push(PRIORITY_TIRED, "tired", ProposedAction::Rest);
    }

    if !ctx.is_daytime
        && let Some(target) = home_district(citizen, city).and_then(|d| hop_toward(citizen, city, d))
    {
        push(PRIORITY_GO_HOME, "go_home", ProposedAction::Commute { target });
    }

    if citizen.is_employed() && career_roll < needs.career_roll_chance * citizen.traits.ambition {
        let minimum_wage = reservation_wage(citizen, city);
        if validation::first_matching_listing(citizen, city, actions, minimum_wage).is_some() {
            push(
                PRIORITY_CAREER_MOVE,
                "career_move",
                ProposedAction::JobSearch { minimum_wage },
            );
        }
    }

    if social_roll < needs.social_roll_chance * citizen.traits.sociability {
        push(
            PRIORITY_CASUAL_SOCIAL,
            "casual_social",
            ProposedAction::Socialize {
                target: citizen.strongest_tie().map(|tie| tie.target),
            },
        );
    }

    candidates
}

// ---------------------------------------------------------------------------
// Vocabulary for the oracle path
// ---------------------------------------------------------------------------

/// The action kinds `citizen` may take this tick, in declaration order.
pub fn available_actions(
    citizen: &Citizen,
    city: &City,
    ctx: &DecisionContext,
    actions: &ActionConfig,
) -> Vec<ActionType> {
    ActionType::ALL
        .into_iter()
        .filter(|kind| match kind {
            ActionType::WorkShift => citizen.is_employed() && ctx.is_working_hours,
            ActionType::Rest | ActionType::Socialize => true,
            ActionType::Eat => can_afford_meal(citizen, city, actions),
            ActionType::Commute => citizen
                .district_id
                .is_some_and(|district| !city.map.neighbors(district).is_empty()),
            ActionType::JobSearch => city.labor.has_openings(),
            ActionType::HousingChange => {
                !citizen.has_shelter() && city.housing.vacant().next().is_some()
            }
        })
        .collect()
}

/// Build a proposal of `kind` for `citizen`.
///
/// Returns `None` only for a Commute with nowhere to go.
pub fn proposal_for(
    kind: ActionType,
    citizen: &Citizen,
    city: &City,
    ctx: &DecisionContext,
    actions: &ActionConfig,
) -> Option<ProposedAction> {
    let proposal = match kind {
        ActionType::WorkShift => ProposedAction::WorkShift {
            hours: actions.shift_hours,
        },
        ActionType::Rest => ProposedAction::Rest,
        ActionType::Eat => ProposedAction::Eat { cost: None },
        ActionType::Commute => ProposedAction::Commute {
            target: commute_destination(citizen, city, ctx)?,
        },
        ActionType::Socialize => ProposedAction::Socialize {
            target: citizen.strongest_tie().map(|tie| tie.target),
        },
        ActionType::JobSearch => ProposedAction::JobSearch {
            minimum_wage: reservation_wage(citizen, city),
        },
        ActionType::HousingChange => ProposedAction::HousingChange {
            unit: housing_target(citizen, city, actions),
        },
    };
    Some(proposal)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn can_afford_meal(citizen: &Citizen, city: &City, actions: &ActionConfig) -> bool {
    costs::meal_cost(None, actions.base_food_cost, city.goods.food_price_index)
        .is_some_and(|cost| citizen.resources.can_afford(cost))
}

/// The lowest wage worth accepting: the minimum wage, or the current
/// income when employed and higher.
fn reservation_wage(citizen: &Citizen, city: &City) -> Decimal {
    if citizen.is_employed() {
        citizen.resources.monthly_income.max(city.labor.minimum_wage)
    } else {
        city.labor.minimum_wage
    }
}

/// Cheapest vacant unit within the affordability bound, first on ties.
fn affordable_unit(citizen: &Citizen, city: &City, actions: &ActionConfig) -> Option<HousingUnitId> {
    cheapest(city.housing.vacant().filter(|unit| {
        costs::is_rent_affordable(
            unit.rent,
            citizen.resources.monthly_income,
            actions.rent_affordability_ratio,
        )
    }))
}

/// The unit a housing proposal targets: the cheapest affordable vacancy,
/// else the cheapest vacancy at all.
fn housing_target(citizen: &Citizen, city: &City, actions: &ActionConfig) -> Option<HousingUnitId> {
    affordable_unit(citizen, city, actions).or_else(|| cheapest(city.housing.vacant()))
}

fn cheapest<'a>(units: impl Iterator<Item = &'a HousingUnit>) -> Option<HousingUnitId> {
    units
        .fold(None, |best: Option<&HousingUnit>, unit| match best {
            Some(current) if current.rent <= unit.rent => Some(current),
            _ => Some(unit),
        })
        .map(|unit| unit.id)
}

fn employer_district(citizen: &Citizen, city: &City) -> Option<DistrictId> {
    citizen
        .employer_id
        .and_then(|id| city.employers.get(&id))
        .map(|employer| employer.district_id)
}

fn home_district(citizen: &Citizen, city: &City) -> Option<DistrictId> {
    citizen
        .home_id
        .and_then(|id| city.housing.get(id))
        .map(|unit| unit.district_id)
}

/// First hop from the citizen's district toward `goal`. `None` when the
/// citizen is already there or has no district.
fn hop_toward(citizen: &Citizen, city: &City, goal: DistrictId) -> Option<DistrictId> {
    let here = citizen.district_id?;
    if here == goal {
        return None;
    }
    city.map.next_hop(here, goal)
}

/// Where a Commute chosen by the oracle should go: toward work by day,
/// toward home otherwise, else the first neighbor.
fn commute_destination(citizen: &Citizen, city: &City, ctx: &DecisionContext) -> Option<DistrictId> {
    let purposeful = if ctx.is_daytime && citizen.is_employed() {
        employer_district(citizen, city)
    } else {
        home_district(citizen, city)
    };
    purposeful
        .and_then(|goal| hop_toward(citizen, city, goal))
        .or_else(|| {
            citizen
                .district_id
                .and_then(|here| city.map.neighbors(here).first().copied())
        })
}
