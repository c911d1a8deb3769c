//! The tick cycle: one atomic step of the simulation.
//!
//! [`run_tick`] runs these phases in a fixed order and never interleaves
//! two ticks, since it holds the world state by `&mut` throughout:
//!
//! 1. **Clock** -- advance the tick counter and simulation time by one
//!    hour, then recompute the working-hours and daytime flags.
//! 2. **Interventions** -- apply every scheduled intervention due at this
//!    tick, in config order.
//! 3. **Household finances** -- on the first tick of each day, drift prices
//!    and settle household bills.
//! 4. **Citizens** -- in stable id order, for each citizen: decay needs,
//!    arbitrate a decision, validate and execute it.
//! 5. **Invariants** -- verify the clock moved forward and every entity
//!    reference still resolves. A violation aborts the run.
//! 6. **Metrics** -- recompute the snapshot and append it to the history,
//!    then append the tick's events to the log.
//!
//! A failed tick halts the state: every later [`run_tick`] returns
//! [`TickError::Halted`] without touching it, until
//! [`WorldState::reset`].
//!
//! With the oracle disabled the tick is a pure function of the state.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use urbanium_agents::{
    AgentError, DecisionContext, ExecutionContext, apply_need_decay, execute_action,
};
use urbanium_types::{
    ActionResult, ActionType, CitizenId, DecisionSource, FailureReason, MetricsSnapshot,
    TimeOfDay, WorldEvent, WorldEventKind,
};

use crate::clock::{ClockError, WorldFlags};
use crate::decision::{ArbitrationSettings, DecisionOracle, arbitrate};
use crate::economy::{DailySettlement, EconomyError, settle_day};
use crate::invariants::{InvariantViolation, check_invariants};
use crate::metrics::compute_metrics;
use crate::scenario::{Intervention, ScenarioError, apply_intervention};
use crate::world::WorldState;

/// Errors that abort a tick. Validation failures and oracle faults are not
/// among them.
#[derive(Debug, thiserror::Error)]
pub enum TickError {
    /// The clock could not advance.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },

    /// Executing a citizen's action hit an inconsistent world.
    #[error("agent error for {citizen_id}: {source}")]
    Agent {
        /// The citizen being processed.
        citizen_id: CitizenId,
        /// The underlying agent error.
        source: AgentError,
    },

    /// A scheduled intervention could not be applied.
    #[error("scenario error: {source}")]
    Scenario {
        /// The underlying scenario error.
        #[from]
        source: ScenarioError,
    },

    /// Daily settlement overflowed.
    #[error("economy error: {source}")]
    Economy {
        /// The underlying economy error.
        #[from]
        source: EconomyError,
    },

    /// The world state broke an invariant.
    #[error("invariant violated: {source}")]
    Invariant {
        /// The violated invariant.
        #[from]
        source: InvariantViolation,
    },

    /// An earlier tick failed; the state no longer advances.
    #[error("world halted at tick {tick}: {reason}")]
    Halted {
        /// Tick the clock stopped at.
        tick: u64,
        /// The error that halted the state.
        reason: String,
    },
}

/// Summary of one completed tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TickSummary {
    /// The tick that was executed.
    pub tick: u64,
    /// Simulation time of the tick.
    pub time: DateTime<Utc>,
    /// Coarse time of day.
    pub time_of_day: TimeOfDay,
    /// Action result per citizen.
    pub results: BTreeMap<CitizenId, ActionResult>,
    /// Decisions made this tick, per source.
    pub decisions: BTreeMap<DecisionSource, u32>,
    /// Actions attempted this tick, per kind.
    pub actions: BTreeMap<ActionType, u32>,
    /// Rejected actions this tick, per reason.
    pub failures: BTreeMap<FailureReason, u32>,
    /// Household bills settled this tick, on day boundaries only.
    pub settlement: Option<DailySettlement>,
    /// Events recorded this tick, in order.
    pub events: Vec<WorldEvent>,
    /// Metrics recomputed at the end of the tick.
    pub metrics: MetricsSnapshot,
}

impl TickSummary {
    /// Number of actions that succeeded.
    pub fn successes(&self) -> usize {
        self.results.values().filter(|r| r.success).count()
    }

    /// Number of actions that failed validation.
    pub fn failure_count(&self) -> usize {
        self.results.values().filter(|r| !r.success).count()
    }

    /// Human-readable descriptions of the tick's events.
    pub fn event_descriptions(&self) -> Vec<String> {
        self.events.iter().map(|e| e.description.clone()).collect()
    }
}

/// Execute one complete tick.
///
/// The oracle is consulted only when `decision.oracle_enabled` is set in
/// the state's config.
///
/// # Errors
///
/// Returns [`TickError`] on clock overflow, an inconsistent world found
/// during execution, an intervention or settlement overflow, or an
/// invariant violation. Any of these halts the state, and later calls
/// return [`TickError::Halted`].
pub fn run_tick(
    state: &mut WorldState,
    oracle: Option<&mut (dyn DecisionOracle + '_)>,
) -> Result<TickSummary, TickError> {
    if let Some(reason) = &state.halted {
        return Err(TickError::Halted {
            tick: state.tick(),
            reason: reason.clone(),
        });
    }
    let result = execute_tick(state, oracle);
    if let Err(e) = &result {
        warn!(tick = state.tick(), error = %e, "World halted");
        state.halted = Some(e.to_string());
    }
    result
}

fn execute_tick(
    state: &mut WorldState,
    oracle: Option<&mut (dyn DecisionOracle + '_)>,
) -> Result<TickSummary, TickError> {
    // --- Phase 1: Clock ---
    let previous = state.clock;
    let tick = state.clock.advance()?;
    state.flags = WorldFlags::from_clock(&state.clock);
    let time = state.clock.time();
    debug!(tick, %time, time_of_day = ?state.flags.time_of_day, "Tick started");

    // --- Phase 2: Interventions ---
    let mut events = Vec::new();
    let due: Vec<Intervention> = state.interventions.due(tick).cloned().collect();
    for intervention in &due {
        events.push(apply_intervention(&mut state.city, intervention, tick)?);
    }

    // --- Phase 3: Household finances ---
    let settlement = if state.clock.day() > previous.day() {
        let settlement = settle_day(&mut state.city, &state.config.economy, tick)?;
        info!(
            tick,
            billed = %settlement.billed,
            collected = %settlement.collected,
            shortfalls = settlement.shortfalls,
            food_price_index = %settlement.food_price_index,
            "Household bills settled"
        );
        events.extend(settlement.events.iter().cloned());
        Some(settlement)
    } else {
        None
    };

    // --- Phase 4: Citizens ---
    let settings = ArbitrationSettings {
        ctx: DecisionContext {
            tick,
            seed: state.seed,
            is_working_hours: state.flags.is_working_hours,
            is_daytime: state.flags.is_daytime,
        },
        time,
        time_of_day: state.flags.time_of_day,
        oracle_timeout: Duration::from_millis(state.config.decision.oracle_timeout_ms),
        needs: &state.config.needs,
        actions: &state.config.actions,
    };
    let exec_ctx = ExecutionContext {
        tick,
        is_working_hours: state.flags.is_working_hours,
    };
    let mut oracle = oracle.filter(|_| state.config.decision.oracle_enabled);

    let mut results = BTreeMap::new();
    let mut decisions: BTreeMap<DecisionSource, u32> = BTreeMap::new();
    let mut actions: BTreeMap<ActionType, u32> = BTreeMap::new();
    let mut failures: BTreeMap<FailureReason, u32> = BTreeMap::new();

    for citizen_id in state.city.citizen_ids() {
        let agent_error = |source: AgentError| TickError::Agent { citizen_id, source };
        let missing = || agent_error(AgentError::CitizenNotFound(citizen_id));

        // Decay
        let citizen = state.city.citizen_mut(citizen_id).ok_or_else(missing)?;
        let decay = apply_need_decay(citizen, settings.needs);
        for need in decay.newly_critical {
            events.push(WorldEvent {
                tick,
                kind: WorldEventKind::CriticalNeed,
                description: format!("{} reached a critical {need:?} need", citizen.name),
            });
        }

        // Arbitrate
        let citizen = state.city.citizen(citizen_id).ok_or_else(missing)?;
        let arbitration = arbitrate(citizen, &state.city, &settings, oracle.as_deref_mut());
        if let Some(fault) = &arbitration.fault {
            events.push(WorldEvent {
                tick,
                kind: WorldEventKind::OracleFallback,
                description: format!(
                    "oracle {} for {}, rule table used",
                    fault.kind(),
                    citizen.name
                ),
            });
        }
        let source = arbitration.decision.source;
        bump(&mut decisions, source);
        let total = state.decision_totals.entry(source).or_insert(0);
        *total = total.saturating_add(1);
        let citizen = state.city.citizen_mut(citizen_id).ok_or_else(missing)?;
        citizen.total_decisions = citizen.total_decisions.saturating_add(1);
        if source == DecisionSource::Oracle {
            citizen.oracle_decisions = citizen.oracle_decisions.saturating_add(1);
        }

        // Execute
        let proposal = arbitration.decision.action;
        bump(&mut actions, proposal.action_type());
        let outcome = execute_action(
            &proposal,
            citizen_id,
            &mut state.city,
            &exec_ctx,
            settings.actions,
        )
        .map_err(agent_error)?;
        if let Some(reason) = outcome.result.failure_reason {
            bump(&mut failures, reason);
        }
        events.extend(outcome.events);
        results.insert(citizen_id, outcome.result);
    }

    // --- Phase 5: Invariants ---
    check_invariants(&state.city, &previous, &state.clock)?;

    // --- Phase 6: Metrics ---
    let metrics = compute_metrics(&state.city, tick, time);
    state.metrics.push(metrics.clone());
    state.events.extend(events.iter().cloned());

    let summary = TickSummary {
        tick,
        time,
        time_of_day: state.flags.time_of_day,
        results,
        decisions,
        actions,
        failures,
        settlement,
        events,
        metrics,
    };

    info!(
        tick,
        %time,
        actions = summary.results.len(),
        successes = summary.successes(),
        failures = summary.failure_count(),
        events = summary.events.len(),
        employment_rate = summary.metrics.employment_rate,
        "Tick completed"
    );

    Ok(summary)
}

fn bump<K: Ord>(counts: &mut BTreeMap<K, u32>, key: K) {
    let count = counts.entry(key).or_insert(0);
    *count = count.saturating_add(1);
}
