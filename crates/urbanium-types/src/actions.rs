//! Proposed actions, decisions, and action results.
//!
//! A [`ProposedAction`] is a closed tagged union: one variant per action
//! kind, each carrying the payload its validation needs. The executor
//! matches it exhaustively, so adding a kind is a compile-time change.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::enums::{ActionType, DecisionSource, FailureReason};
use crate::ids::{CitizenId, DistrictId, HousingUnitId};

/// A citizen's intended action for the current tick, not yet validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ProposedAction {
    /// Work for the bound employer.
    WorkShift {
        /// Hours worked this tick.
        hours: u32,
    },
    /// Recover energy.
    Rest,
    /// Buy and eat a meal.
    Eat {
        /// Explicit meal cost. `None` or zero means the market price.
        cost: Option<Decimal>,
    },
    /// Move to an adjacent district.
    Commute {
        /// Destination district.
        target: DistrictId,
    },
    /// Spend time with others.
    Socialize {
        /// Citizen to spend time with. Only an existing tie is reinforced.
        target: Option<CitizenId>,
    },
    /// Look for a job paying at least `minimum_wage`.
    JobSearch {
        /// Lowest acceptable monthly wage.
        minimum_wage: Decimal,
    },
    /// Move into a housing unit.
    HousingChange {
        /// Target unit. `None` when no candidate was found.
        unit: Option<HousingUnitId>,
    },
}

impl ProposedAction {
    /// The kind of this action.
    pub const fn action_type(&self) -> ActionType {
        match self {
            Self::WorkShift { .. } => ActionType::WorkShift,
            Self::Rest => ActionType::Rest,
            Self::Eat { .. } => ActionType::Eat,
            Self::Commute { .. } => ActionType::Commute,
            Self::Socialize { .. } => ActionType::Socialize,
            Self::JobSearch { .. } => ActionType::JobSearch,
            Self::HousingChange { .. } => ActionType::HousingChange,
        }
    }
}

/// The arbitrator's output for one citizen and one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    /// The action to execute.
    pub action: ProposedAction,
    /// Which path produced it.
    pub source: DecisionSource,
    /// Free-text reasoning, when the oracle supplied one.
    pub reasoning: Option<String>,
    /// Oracle confidence in `[0, 1]`, when supplied.
    pub confidence: Option<f64>,
}

impl Decision {
    /// A decision made by the deterministic rule path.
    pub const fn rule(action: ProposedAction, source: DecisionSource) -> Self {
        Self {
            action,
            source,
            reasoning: None,
            confidence: None,
        }
    }
}

/// The outcome of executing a proposed action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResult {
    /// The kind of action that was attempted.
    pub action: ActionType,
    /// Whether validation passed and state was mutated.
    pub success: bool,
    /// Why validation failed, when it did.
    pub failure_reason: Option<FailureReason>,
    /// What changed, as key/value pairs for logging.
    pub effects: BTreeMap<String, String>,
}

impl ActionResult {
    /// A successful result with the given effect record.
    pub const fn succeeded(action: ActionType, effects: BTreeMap<String, String>) -> Self {
        Self {
            action,
            success: true,
            failure_reason: None,
            effects,
        }
    }

    /// A failed result. State was not changed.
    pub const fn failed(action: ActionType, reason: FailureReason) -> Self {
        Self {
            action,
            success: false,
            failure_reason: Some(reason),
            effects: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn action_type_matches_variant() {
        assert_eq!(
            ProposedAction::JobSearch {
                minimum_wage: dec!(1000)
            }
            .action_type(),
            ActionType::JobSearch
        );
        assert_eq!(ProposedAction::Rest.action_type(), ActionType::Rest);
    }

    #[test]
    fn proposed_action_serializes_tagged() {
        let json = serde_json::to_value(ProposedAction::Eat { cost: None }).unwrap_or_default();
        assert_eq!(json["action"], "eat");
    }

    #[test]
    fn failed_result_has_no_effects() {
        let result = ActionResult::failed(ActionType::Eat, FailureReason::InsufficientFunds);
        assert!(!result.success);
        assert!(result.effects.is_empty());
        assert_eq!(result.failure_reason, Some(FailureReason::InsufficientFunds));
    }
}
