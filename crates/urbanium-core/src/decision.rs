//! The decision oracle boundary and arbitration with fallback.
//!
//! [`DecisionOracle`] abstracts an external service that may suggest an
//! action for a citizen. It is never authoritative: [`arbitrate`] checks
//! the critical override first, then asks the oracle (when one is wired and
//! enabled), validates the answer against the citizen's available-action
//! set, and falls back to the deterministic rule table on any fault.
//!
//! Oracle faults are returned alongside the decision so the scheduler can
//! log and count them. They never reach the simulation's control flow.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tracing::{debug, warn};
use urbanium_agents::{
    ActionConfig, DecisionContext, NeedsConfig, available_actions, decide, proposal_for,
};
use urbanium_types::{
    ActionType, Citizen, Decision, DecisionSource, ProposedAction, TimeOfDay,
};
use urbanium_world::City;

/// Faults an oracle call can end in. All of them trigger the fallback.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OracleError {
    /// No answer arrived within the timeout.
    #[error("oracle timed out after {timeout_ms}ms")]
    Timeout {
        /// The timeout that was exceeded.
        timeout_ms: u64,
    },

    /// The request could not be delivered or the provider returned an error.
    #[error("oracle transport error: {message}")]
    Transport {
        /// Description of the failure.
        message: String,
    },

    /// The reply could not be parsed into a proposal.
    #[error("malformed oracle reply: {message}")]
    Malformed {
        /// Description of what was wrong.
        message: String,
    },

    /// The reply named an action outside the citizen's available set.
    #[error("oracle proposed {action:?}, which is not an available action")]
    OutsideVocabulary {
        /// The action text the oracle returned.
        action: String,
    },

    /// The oracle is not able to answer at all.
    #[error("oracle unavailable: {message}")]
    Unavailable {
        /// Why the oracle cannot answer.
        message: String,
    },
}

impl OracleError {
    /// Short fault label for logs and event descriptions.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Timeout { .. } => "timeout",
            Self::Transport { .. } => "transport",
            Self::Malformed { .. } => "malformed",
            Self::OutsideVocabulary { .. } => "outside_vocabulary",
            Self::Unavailable { .. } => "unavailable",
        }
    }
}

/// What the oracle sees for one citizen decision. Everything is read-only.
#[derive(Debug, Clone, Copy)]
pub struct OracleRequest<'a> {
    /// The tick being decided.
    pub tick: u64,
    /// Simulation time of the tick.
    pub time: DateTime<Utc>,
    /// Coarse time of day.
    pub time_of_day: TimeOfDay,
    /// Whether it is within working hours.
    pub is_working_hours: bool,
    /// The deciding citizen.
    pub citizen: &'a Citizen,
    /// The city as of this point in the tick.
    pub city: &'a City,
    /// The only action kinds the oracle may answer with.
    pub available: &'a [ActionType],
}

/// An unvalidated suggestion from the oracle.
#[derive(Debug, Clone, PartialEq)]
pub struct OracleProposal {
    /// Action name as returned by the oracle.
    pub action: String,
    /// Free-text reasoning, kept for observability only.
    pub reasoning: Option<String>,
    /// Self-reported confidence.
    pub confidence: Option<f64>,
}

/// An external source of suggested actions.
pub trait DecisionOracle: Send {
    /// Suggest an action for the citizen in `request`.
    ///
    /// Implementations should give up once `timeout` has elapsed. The
    /// caller also measures the call and discards late answers.
    ///
    /// # Errors
    ///
    /// Returns [`OracleError`] on any failure; the caller falls back to
    /// the rule table.
    fn propose_action(
        &mut self,
        request: &OracleRequest<'_>,
        timeout: Duration,
    ) -> Result<OracleProposal, OracleError>;
}

/// Settings for one arbitration.
#[derive(Debug, Clone, Copy)]
pub struct ArbitrationSettings<'a> {
    /// Per-tick context for the rule table.
    pub ctx: DecisionContext,
    /// Simulation time of the tick.
    pub time: DateTime<Utc>,
    /// Coarse time of day.
    pub time_of_day: TimeOfDay,
    /// Longest wait for the oracle.
    pub oracle_timeout: Duration,
    /// Need thresholds.
    pub needs: &'a NeedsConfig,
    /// Action parameters.
    pub actions: &'a ActionConfig,
}

/// A decision plus the oracle fault that forced a fallback, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct Arbitration {
    /// The action to execute.
    pub decision: Decision,
    /// Set when the oracle was asked and its answer was discarded.
    pub fault: Option<OracleError>,
}

/// Decide one citizen's action.
///
/// Order: critical override, then the oracle if given, then the rule table.
/// An oracle fault yields the rule-table action tagged
/// [`DecisionSource::Fallback`].
pub fn arbitrate(
    citizen: &Citizen,
    city: &City,
    settings: &ArbitrationSettings<'_>,
    oracle: Option<&mut (dyn DecisionOracle + '_)>,
) -> Arbitration {
    let rules = decide(citizen, city, &settings.ctx, settings.needs, settings.actions);
    let oracle = match oracle {
        Some(oracle) if rules.source != DecisionSource::CriticalOverride => oracle,
        _ => {
            return Arbitration {
                decision: rules,
                fault: None,
            };
        }
    };

    match consult(citizen, city, settings, oracle) {
        Ok(decision) => Arbitration {
            decision,
            fault: None,
        },
        Err(fault) => {
            warn!(
                tick = settings.ctx.tick,
                citizen_id = %citizen.id,
                fault = fault.kind(),
                error = %fault,
                "oracle fault, falling back to rule table"
            );
            Arbitration {
                decision: Decision::rule(rules.action, DecisionSource::Fallback),
                fault: Some(fault),
            }
        }
    }
}

fn consult(
    citizen: &Citizen,
    city: &City,
    settings: &ArbitrationSettings<'_>,
    oracle: &mut (dyn DecisionOracle + '_),
) -> Result<Decision, OracleError> {
    let available = available_actions(citizen, city, &settings.ctx, settings.actions);
    let request = OracleRequest {
        tick: settings.ctx.tick,
        time: settings.time,
        time_of_day: settings.time_of_day,
        is_working_hours: settings.ctx.is_working_hours,
        citizen,
        city,
        available: &available,
    };

    let started = Instant::now();
    let proposal = oracle.propose_action(&request, settings.oracle_timeout)?;
    if started.elapsed() > settings.oracle_timeout {
        return Err(OracleError::Timeout {
            timeout_ms: u64::try_from(settings.oracle_timeout.as_millis()).unwrap_or(u64::MAX),
        });
    }

    let action = accept_proposal(&proposal, &available, citizen, city, settings)?;
    debug!(
        citizen_id = %citizen.id,
        action = %action.action_type(),
        reasoning = proposal.reasoning.as_deref().unwrap_or(""),
        "oracle decision accepted"
    );
    Ok(Decision {
        action,
        source: DecisionSource::Oracle,
        reasoning: proposal.reasoning,
        confidence: proposal
            .confidence
            .filter(|c| c.is_finite())
            .map(|c| c.clamp(0.0, 1.0)),
    })
}

/// Turn an oracle answer into a proposal, or reject it.
///
/// # Errors
///
/// Returns [`OracleError::OutsideVocabulary`] when the action name is not
/// a known kind, is not in `available`, or has no valid payload.
pub fn accept_proposal(
    proposal: &OracleProposal,
    available: &[ActionType],
    citizen: &Citizen,
    city: &City,
    settings: &ArbitrationSettings<'_>,
) -> Result<ProposedAction, OracleError> {
    let outside = || OracleError::OutsideVocabulary {
        action: proposal.action.clone(),
    };
    let kind = ActionType::from_name(&proposal.action).ok_or_else(outside)?;
    if !available.contains(&kind) {
        return Err(outside());
    }
    proposal_for(kind, citizen, city, &settings.ctx, settings.actions).ok_or_else(outside)
}
