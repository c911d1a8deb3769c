//! The action pipeline: costs, validation, and execution.
//!
//! [`execute_action`] is the only code path that mutates the city on behalf
//! of a citizen. It validates first; a rejected proposal returns a failed
//! [`ActionResult`] and leaves the city untouched apart from the citizen's
//! displayed activity.
//!
//! # Submodules
//!
//! - [`costs`] -- Meal prices, shift wages, and rent affordability.
//! - [`validation`] -- Read-only legality checks per action kind.
//! - [`handlers`] -- State mutation for validated actions.

pub mod costs;
pub mod handlers;
pub mod validation;

use tracing::debug;
use urbanium_types::{
    ActionResult, ActionType, CitizenActivity, CitizenId, FailureReason, ProposedAction,
    WorldEvent,
};
use urbanium_world::City;

use crate::config::ActionConfig;
use crate::error::AgentError;

pub use validation::{ExecutionContext, ValidatedAction, validate_action};

/// What executing one proposal produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOutcome {
    /// Success flag, failure reason, and effect map.
    pub result: ActionResult,
    /// Events to append to the world event log.
    pub events: Vec<WorldEvent>,
}

/// Validate and execute `proposal` for the citizen `id`.
///
/// Validation failures are returned as a failed [`ActionResult`], never as
/// an error.
///
/// # Errors
///
/// Returns [`AgentError`] when the world is inconsistent (the citizen or a
/// validated target is missing) or money arithmetic overflows. Both abort
/// the tick.
pub fn execute_action(
    proposal: &ProposedAction,
    id: CitizenId,
    city: &mut City,
    ctx: &ExecutionContext,
    config: &ActionConfig,
) -> Result<ExecutionOutcome, AgentError> {
    let action = proposal.action_type();
    let validated = {
        let citizen = city.citizen(id).ok_or(AgentError::CitizenNotFound(id))?;
        validate_action(proposal, citizen, city, ctx, config)
    };

    match validated {
        Ok(validated) => {
            let handled = handlers::apply_validated(validated, id, city, ctx, config)?;
            if let Some(citizen) = city.citizen_mut(id) {
                citizen.activity = handled.activity;
            }
            Ok(ExecutionOutcome {
                result: ActionResult::succeeded(action, handled.effects),
                events: handled.events,
            })
        }
        Err(reason) => {
            debug!(
                citizen_id = %id,
                action = %action,
                reason = %reason,
                "action rejected"
            );
            if let Some(citizen) = city.citizen_mut(id)
                && let Some(activity) = activity_after_failure(action, citizen.is_employed(), reason)
            {
                citizen.activity = activity;
            }
            Ok(ExecutionOutcome {
                result: ActionResult::failed(action, reason),
                events: Vec::new(),
            })
        }
    }
}

/// The activity shown after a failed action, if it changes.
const fn activity_after_failure(
    action: ActionType,
    employed: bool,
    reason: FailureReason,
) -> Option<CitizenActivity> {
    match (action, reason) {
        (ActionType::JobSearch, FailureReason::NoMatchingJobs) if !employed => {
            Some(CitizenActivity::Unemployed)
        }
        (ActionType::HousingChange, _) => Some(CitizenActivity::SearchingForHousing),
        _ => None,
    }
}
