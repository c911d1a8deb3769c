//! Scheduled interventions: parameter changes applied at a given tick.
//!
//! The scenario section of the config lists `{ tick, intervention }`
//! entries. At the start of each tick, after the clock advance and flag
//! recomputation and before any citizen acts, every entry scheduled for that
//! tick is applied in config order and logged as an
//! [`InterventionApplied`](WorldEventKind::InterventionApplied) event.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;
use urbanium_types::{EmployerId, HouseholdId, JobListing, WorldEvent, WorldEventKind};
use urbanium_world::City;

/// Errors that can occur while applying an intervention.
#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    /// A rescaled rent overflowed.
    #[error("arithmetic overflow applying {intervention}")]
    ArithmeticOverflow {
        /// The intervention being applied.
        intervention: &'static str,
    },
}

/// A single parameter change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Intervention {
    /// Replace the minimum monthly wage policy.
    SetMinimumWage {
        /// New minimum wage.
        amount: Decimal,
    },
    /// Replace the goods market food price index.
    SetFoodPriceIndex {
        /// New index; 1.0 is the base price.
        index: Decimal,
    },
    /// Multiply every unit's rent by `factor`, rounded to cents. Occupants'
    /// monthly expenses follow the new rent.
    ScaleRents {
        /// Rent multiplier.
        factor: Decimal,
    },
    /// Post `count` listings round-robin across employers in id order.
    PostJobListings {
        /// Listings to post.
        count: u32,
        /// Monthly wage of each listing.
        wage: Decimal,
        /// Skills every listing requires.
        #[serde(default)]
        required_skills: Vec<String>,
    },
}

impl Intervention {
    /// Short name for logs and errors.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::SetMinimumWage { .. } => "set_minimum_wage",
            Self::SetFoodPriceIndex { .. } => "set_food_price_index",
            Self::ScaleRents { .. } => "scale_rents",
            Self::PostJobListings { .. } => "post_job_listings",
        }
    }

    /// Whether every amount in the intervention is non-negative.
    pub fn is_valid(&self) -> bool {
        match self {
            Self::SetMinimumWage { amount } => !amount.is_sign_negative(),
            Self::SetFoodPriceIndex { index } => !index.is_sign_negative(),
            Self::ScaleRents { factor } => !factor.is_sign_negative(),
            Self::PostJobListings { wage, .. } => !wage.is_sign_negative(),
        }
    }
}

/// An intervention and the tick it fires on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledIntervention {
    /// Tick at whose start the intervention is applied.
    pub tick: u64,
    /// The change to apply.
    pub intervention: Intervention,
}

/// The interventions of a run, in config order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterventionSchedule {
    entries: Vec<ScheduledIntervention>,
}

impl InterventionSchedule {
    /// A schedule from config entries.
    pub const fn new(entries: Vec<ScheduledIntervention>) -> Self {
        Self { entries }
    }

    /// Interventions scheduled for `tick`, in config order.
    pub fn due(&self, tick: u64) -> impl Iterator<Item = &Intervention> {
        self.entries
            .iter()
            .filter(move |entry| entry.tick == tick)
            .map(|entry| &entry.intervention)
    }

    /// Every scheduled entry.
    pub fn entries(&self) -> &[ScheduledIntervention] {
        &self.entries
    }
}

/// Apply one intervention to the city and describe it as an event.
///
/// # Errors
///
/// Returns [`ScenarioError::ArithmeticOverflow`] if a rescaled rent
/// overflows; no rent is changed in that case.
pub fn apply_intervention(
    city: &mut City,
    intervention: &Intervention,
    tick: u64,
) -> Result<WorldEvent, ScenarioError> {
    let description = match intervention {
        Intervention::SetMinimumWage { amount } => {
            let previous = std::mem::replace(&mut city.labor.minimum_wage, *amount);
            format!("minimum wage changed from {previous} to {amount}")
        }
        Intervention::SetFoodPriceIndex { index } => {
            let previous = std::mem::replace(&mut city.goods.food_price_index, *index);
            format!("food price index changed from {previous} to {index}")
        }
        Intervention::ScaleRents { factor } => {
            let rents = city
                .housing
                .units
                .iter()
                .map(|unit| unit.rent.checked_mul(*factor).map(|rent| rent.round_dp(2)))
                .collect::<Option<Vec<Decimal>>>()
                .ok_or(ScenarioError::ArithmeticOverflow {
                    intervention: intervention.name(),
                })?;
            for (unit, rent) in city.housing.units.iter_mut().zip(rents) {
                unit.rent = rent;
            }
            let households: Vec<HouseholdId> = city.households.keys().copied().collect();
            for household in households {
                city.refresh_rent_shares(household);
            }
            format!("rents scaled by {factor} across {} units", city.housing.units.len())
        }
        Intervention::PostJobListings {
            count,
            wage,
            required_skills,
        } => {
            let posted = post_listings(city, *count, *wage, required_skills);
            format!("{posted} job listings posted at {wage}")
        }
    };

    info!(tick, intervention = intervention.name(), %description, "intervention applied");

    Ok(WorldEvent {
        tick,
        kind: WorldEventKind::InterventionApplied,
        description,
    })
}

fn post_listings(city: &mut City, count: u32, wage: Decimal, required_skills: &[String]) -> usize {
    let employers: Vec<(EmployerId, String)> = city
        .employers
        .values()
        .map(|employer| (employer.id, employer.industry.clone()))
        .collect();
    let mut posted = 0_usize;
    for (employer_id, industry) in employers.iter().cycle().take(count as usize) {
        let id = city.ids.job_listing();
        city.labor.open_positions.push(JobListing {
            id,
            employer_id: *employer_id,
            title: format!("{industry} Associate"),
            wage,
            required_skills: required_skills.to_vec(),
        });
        posted = posted.saturating_add(1);
    }
    posted
}
