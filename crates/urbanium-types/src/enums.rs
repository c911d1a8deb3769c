//! Enumeration types for the Urbanium simulation.
//!
//! These are the closed vocabularies of the engine: the seven action kinds a
//! citizen may propose, the behavioral state shown for each citizen, the
//! expected validation failures, and the small classification enums used by
//! the world model and the event log.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

/// The kind of action a citizen can propose for a tick.
///
/// The decision oracle may only answer with one of these, and only with one
/// that is in the citizen's available set for the tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    /// Work one hour for the bound employer.
    WorkShift,
    /// Recover energy.
    Rest,
    /// Buy and eat a meal.
    Eat,
    /// Move to an adjacent district.
    Commute,
    /// Spend time with other citizens.
    Socialize,
    /// Look for an open job listing.
    JobSearch,
    /// Move into a vacant housing unit.
    HousingChange,
}

impl ActionType {
    /// Every action kind, in declaration order.
    pub const ALL: [Self; 7] = [
        Self::WorkShift,
        Self::Rest,
        Self::Eat,
        Self::Commute,
        Self::Socialize,
        Self::JobSearch,
        Self::HousingChange,
    ];

    /// The `snake_case` name used in prompts, logs, and oracle replies.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::WorkShift => "work_shift",
            Self::Rest => "rest",
            Self::Eat => "eat",
            Self::Commute => "commute",
            Self::Socialize => "socialize",
            Self::JobSearch => "job_search",
            Self::HousingChange => "housing_change",
        }
    }

    /// Resolve an action kind from free text.
    ///
    /// Accepts the `snake_case` name, the `PascalCase` variant name, and
    /// space or hyphen separated spellings, ignoring case. Anything else
    /// returns `None`; unknown text is never coerced into an action.
    pub fn from_name(name: &str) -> Option<Self> {
        let normalized: String = name
            .trim()
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .map(|c| c.to_ascii_lowercase())
            .collect();
        Self::ALL.into_iter().find(|kind| {
            let candidate: String = kind.as_str().chars().filter(|c| *c != '_').collect();
            candidate == normalized
        })
    }
}

impl core::fmt::Display for ActionType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Expected, non-fatal reasons an action fails validation.
///
/// These are returned as data inside an action result. They never abort a
/// tick and never leave partial mutations behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// The citizen's cash is below the action's cost.
    InsufficientFunds,
    /// No graph edge connects the current and target districts.
    NoRouteAvailable,
    /// No open listing passes the wage and skill filters.
    NoMatchingJobs,
    /// Rent exceeds the affordability share of monthly income.
    CannotAffordRent,
    /// The action requires an employer binding.
    NotEmployed,
    /// The action requires working hours.
    NotWorkingHours,
    /// The target housing unit does not exist or is occupied.
    HousingUnitUnavailable,
}

impl FailureReason {
    /// The `snake_case` name of this failure.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InsufficientFunds => "insufficient_funds",
            Self::NoRouteAvailable => "no_route_available",
            Self::NoMatchingJobs => "no_matching_jobs",
            Self::CannotAffordRent => "cannot_afford_rent",
            Self::NotEmployed => "not_employed",
            Self::NotWorkingHours => "not_working_hours",
            Self::HousingUnitUnavailable => "housing_unit_unavailable",
        }
    }
}

impl core::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which path of the arbitrator produced a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionSource {
    /// A critical hunger, energy, or shelter need forced the action.
    CriticalOverride,
    /// The fixed priority rule table picked the action.
    RuleTable,
    /// The decision oracle's suggestion was accepted.
    Oracle,
    /// The oracle failed and the rule table answered instead.
    Fallback,
}

// ---------------------------------------------------------------------------
// Citizens
// ---------------------------------------------------------------------------

/// The behavioral state shown for a citizen after its last action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CitizenActivity {
    /// Doing nothing in particular.
    Idle,
    /// Working a shift.
    Working,
    /// Travelling between districts.
    Commuting,
    /// Resting.
    Resting,
    /// Spending time with others.
    Socializing,
    /// Just hired.
    Employed,
    /// Looked for work and found none.
    Unemployed,
    /// Tried to move and could not.
    SearchingForHousing,
}

/// A need tracked for every citizen. 0 is satisfied, 1 is critical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NeedKind {
    /// Food.
    Hunger,
    /// Rest.
    Energy,
    /// Company.
    Social,
    /// A home.
    Shelter,
    /// A paycheck.
    Income,
}

/// The kind of relationship a social tie represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TieType {
    /// Member of the same household.
    Family,
    /// Close friend.
    Friend,
    /// Works for the same employer.
    Coworker,
    /// Lives in the same district.
    Neighbor,
    /// Known in passing.
    Acquaintance,
}

// ---------------------------------------------------------------------------
// City
// ---------------------------------------------------------------------------

/// The land-use character of a district.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DistrictKind {
    /// The central hub connected to every other district.
    Downtown,
    /// Mostly housing.
    Residential,
    /// Factories and warehouses.
    Industrial,
    /// Shops and offices.
    Commercial,
}

/// The kind of a public service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ServiceKind {
    /// Medical care.
    Hospital,
    /// Education.
    School,
    /// Green space; socializing here counts for more.
    Park,
    /// Public transit interchange.
    TransitHub,
}

/// Coarse classification of the simulation hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TimeOfDay {
    /// 06:00 to 12:00.
    Morning,
    /// 12:00 to 18:00.
    Afternoon,
    /// 18:00 to 22:00.
    Evening,
    /// 22:00 to 06:00.
    Night,
}

impl TimeOfDay {
    /// Classify an hour of the day (0-23).
    pub const fn from_hour(hour: u32) -> Self {
        match hour {
            6..=11 => Self::Morning,
            12..=17 => Self::Afternoon,
            18..=21 => Self::Evening,
            _ => Self::Night,
        }
    }
}

/// The kind of an entry in the world event log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorldEventKind {
    /// A citizen filled a job listing.
    Hired,
    /// A citizen moved into a housing unit.
    Moved,
    /// A new household was formed.
    HouseholdFormed,
    /// An emptied household was dissolved and its unit released.
    HouseholdDissolved,
    /// A scheduled intervention changed a city parameter.
    InterventionApplied,
    /// A citizen hit a critical need.
    CriticalNeed,
    /// The decision oracle failed and the rule table answered.
    OracleFallback,
    /// A household member could not cover their daily bill.
    BillShortfall,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_names_round_trip() {
        for kind in ActionType::ALL {
            assert_eq!(ActionType::from_name(kind.as_str()), Some(kind));
        }
    }

    #[test]
    fn action_name_spellings() {
        assert_eq!(ActionType::from_name("WorkShift"), Some(ActionType::WorkShift));
        assert_eq!(ActionType::from_name(" job search "), Some(ActionType::JobSearch));
        assert_eq!(
            ActionType::from_name("housing-change"),
            Some(ActionType::HousingChange)
        );
        assert_eq!(ActionType::from_name("dance"), None);
        assert_eq!(ActionType::from_name(""), None);
    }

    #[test]
    fn serde_uses_snake_case() {
        let json = serde_json::to_string(&ActionType::JobSearch).unwrap_or_default();
        assert_eq!(json, "\"job_search\"");
    }

    #[test]
    fn time_of_day_boundaries() {
        assert_eq!(TimeOfDay::from_hour(5), TimeOfDay::Night);
        assert_eq!(TimeOfDay::from_hour(6), TimeOfDay::Morning);
        assert_eq!(TimeOfDay::from_hour(12), TimeOfDay::Afternoon);
        assert_eq!(TimeOfDay::from_hour(18), TimeOfDay::Evening);
        assert_eq!(TimeOfDay::from_hour(22), TimeOfDay::Night);
    }
}
