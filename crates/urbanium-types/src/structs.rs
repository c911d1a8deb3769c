//! Core entity structs for the Urbanium simulation.
//!
//! Entities reference each other by id only. A citizen knows the id of its
//! employer, household, home, and district; the owning collections live in
//! the world state and back-references are lookups, never ownership.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::enums::{CitizenActivity, DistrictKind, NeedKind, ServiceKind, TieType};
use crate::ids::{
    CitizenId, DistrictId, EmployerId, HouseholdId, HousingUnitId, JobListingId, ServiceId,
};

// ---------------------------------------------------------------------------
// Citizen components
// ---------------------------------------------------------------------------

/// Personality traits fixed for the duration of a run. Each is in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Traits {
    /// Drive to seek company.
    pub sociability: f64,
    /// Willingness to accept uncertain outcomes.
    pub risk_tolerance: f64,
    /// Reluctance to spend.
    pub frugality: f64,
    /// Drive to improve one's career.
    pub ambition: f64,
    /// Preference for routine.
    pub stability: f64,
}

impl Traits {
    /// Return a copy with every trait clamped into `[0, 1]`.
    pub fn clamped(self) -> Self {
        Self {
            sociability: self.sociability.clamp(0.0, 1.0),
            risk_tolerance: self.risk_tolerance.clamp(0.0, 1.0),
            frugality: self.frugality.clamp(0.0, 1.0),
            ambition: self.ambition.clamp(0.0, 1.0),
            stability: self.stability.clamp(0.0, 1.0),
        }
    }
}

impl Default for Traits {
    fn default() -> Self {
        Self {
            sociability: 0.5,
            risk_tolerance: 0.5,
            frugality: 0.5,
            ambition: 0.5,
            stability: 0.5,
        }
    }
}

/// A skill a citizen has, used to match job listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    /// Skill name, matched exactly against listing requirements.
    pub name: String,
    /// Proficiency in `[0, 1]`.
    pub level: f64,
    /// Years of experience.
    pub years: u32,
}

/// Money held and flowing through a citizen, as exact decimals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resources {
    /// Cash on hand.
    pub cash: Decimal,
    /// Monthly income from employment.
    pub monthly_income: Decimal,
    /// Monthly expenses (rent).
    pub monthly_expenses: Decimal,
}

impl Resources {
    /// Whether the citizen has at least `cost` in cash.
    pub fn can_afford(&self, cost: Decimal) -> bool {
        self.cash >= cost
    }
}

impl Default for Resources {
    fn default() -> Self {
        Self {
            cash: Decimal::ZERO,
            monthly_income: Decimal::ZERO,
            monthly_expenses: Decimal::ZERO,
        }
    }
}

/// Need levels in `[0, 1]`: 0 is satisfied, 1 is critical.
///
/// Needs rise every tick through decay and only fall through actions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Needs {
    /// Need for food.
    pub hunger: f64,
    /// Need for rest.
    pub energy: f64,
    /// Need for company.
    pub social: f64,
    /// Need for a home.
    pub shelter: f64,
    /// Need for a paycheck.
    pub income: f64,
}

impl Needs {
    /// All needs fully satisfied.
    pub const SATISFIED: Self = Self {
        hunger: 0.0,
        energy: 0.0,
        social: 0.0,
        shelter: 0.0,
        income: 0.0,
    };

    /// The level of a single need.
    pub const fn get(&self, kind: NeedKind) -> f64 {
        match kind {
            NeedKind::Hunger => self.hunger,
            NeedKind::Energy => self.energy,
            NeedKind::Social => self.social,
            NeedKind::Shelter => self.shelter,
            NeedKind::Income => self.income,
        }
    }

    /// Add `delta` to a need and clamp the result into `[0, 1]`.
    pub fn adjust(&mut self, kind: NeedKind, delta: f64) {
        let slot = match kind {
            NeedKind::Hunger => &mut self.hunger,
            NeedKind::Energy => &mut self.energy,
            NeedKind::Social => &mut self.social,
            NeedKind::Shelter => &mut self.shelter,
            NeedKind::Income => &mut self.income,
        };
        *slot = (*slot + delta).clamp(0.0, 1.0);
    }
}

impl Default for Needs {
    fn default() -> Self {
        Self::SATISFIED
    }
}

/// A directed social tie from one citizen to another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocialTie {
    /// The other citizen.
    pub target: CitizenId,
    /// Kind of relationship.
    pub tie_type: TieType,
    /// Strength in `[0, 1]`.
    pub strength: f64,
    /// Number of interactions recorded on this tie.
    pub interactions: u32,
}

impl SocialTie {
    /// Strengthen the tie by `delta` (clamped to 1.0) and count one interaction.
    pub fn reinforce(&mut self, delta: f64) {
        self.strength = (self.strength + delta).clamp(0.0, 1.0);
        self.interactions = self.interactions.saturating_add(1);
    }
}

// ---------------------------------------------------------------------------
// Citizen
// ---------------------------------------------------------------------------

/// A simulated resident of the city.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citizen {
    /// Unique identifier.
    pub id: CitizenId,
    /// Display name.
    pub name: String,
    /// Age in years.
    pub age: u32,
    /// Fixed personality traits.
    pub traits: Traits,
    /// Skills used to qualify for job listings.
    pub skills: Vec<Skill>,
    /// Cash, income, and expenses.
    pub resources: Resources,
    /// Current need levels.
    pub needs: Needs,
    /// Outgoing social ties.
    pub ties: Vec<SocialTie>,
    /// Current employer, if employed.
    pub employer_id: Option<EmployerId>,
    /// Household the citizen belongs to, if any.
    pub household_id: Option<HouseholdId>,
    /// Housing unit the citizen lives in, if any.
    pub home_id: Option<HousingUnitId>,
    /// District the citizen is currently in.
    pub district_id: Option<DistrictId>,
    /// Behavioral state after the last action.
    pub activity: CitizenActivity,
    /// Consecutive ticks spent without an employer.
    pub unemployed_ticks: u64,
    /// Decisions made so far.
    pub total_decisions: u64,
    /// Decisions where the oracle's suggestion was accepted.
    pub oracle_decisions: u64,
}

impl Citizen {
    /// Whether the citizen has an employer binding.
    pub const fn is_employed(&self) -> bool {
        self.employer_id.is_some()
    }

    /// Whether the citizen has a household binding (and so a roof).
    pub const fn has_shelter(&self) -> bool {
        self.household_id.is_some()
    }

    /// Proficiency in the named skill, if the citizen has it.
    pub fn skill_level(&self, name: &str) -> Option<f64> {
        self.skills
            .iter()
            .find(|skill| skill.name == name)
            .map(|skill| skill.level)
    }

    /// The tie to `target`, if one exists.
    pub fn tie_mut(&mut self, target: CitizenId) -> Option<&mut SocialTie> {
        self.ties.iter_mut().find(|tie| tie.target == target)
    }

    /// The strongest tie, earliest first on equal strength.
    pub fn strongest_tie(&self) -> Option<&SocialTie> {
        self.ties.iter().fold(None, |best: Option<&SocialTie>, tie| match best {
            Some(current) if current.strength >= tie.strength => Some(current),
            _ => Some(tie),
        })
    }
}

// ---------------------------------------------------------------------------
// City entities
// ---------------------------------------------------------------------------

/// An employer that hires citizens through job listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employer {
    /// Unique identifier.
    pub id: EmployerId,
    /// Display name.
    pub name: String,
    /// Industry label.
    pub industry: String,
    /// District where the workplace is.
    pub district_id: DistrictId,
    /// Citizens currently employed here, in hiring order.
    pub employees: Vec<CitizenId>,
}

/// Citizens sharing one housing unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Household {
    /// Unique identifier.
    pub id: HouseholdId,
    /// Member citizens.
    pub members: Vec<CitizenId>,
    /// The unit the household occupies.
    pub home_id: HousingUnitId,
    /// District of the home.
    pub district_id: DistrictId,
}

/// A district of the city (node in the city graph).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct District {
    /// Unique identifier.
    pub id: DistrictId,
    /// Display name.
    pub name: String,
    /// Land-use character.
    pub kind: DistrictKind,
}

/// A rentable housing unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HousingUnit {
    /// Unique identifier.
    pub id: HousingUnitId,
    /// District where the unit is.
    pub district_id: DistrictId,
    /// Monthly rent.
    pub rent: Decimal,
    /// Household living here, if occupied.
    pub occupant: Option<HouseholdId>,
}

impl HousingUnit {
    /// Whether nobody lives here.
    pub const fn is_vacant(&self) -> bool {
        self.occupant.is_none()
    }
}

/// An open position posted by an employer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobListing {
    /// Unique identifier.
    pub id: JobListingId,
    /// Employer offering the position.
    pub employer_id: EmployerId,
    /// Position title.
    pub title: String,
    /// Offered monthly wage.
    pub wage: Decimal,
    /// Skill names the applicant must have at or above the proficiency floor.
    pub required_skills: Vec<String>,
}

/// A public service located in a district.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicService {
    /// Unique identifier.
    pub id: ServiceId,
    /// Kind of service.
    pub kind: ServiceKind,
    /// District where the service is.
    pub district_id: DistrictId,
    /// How many citizens it is sized for.
    pub capacity: u32,
}
