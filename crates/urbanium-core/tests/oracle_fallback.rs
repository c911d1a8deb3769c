//! Integration tests for the decision oracle boundary.
//!
//! Scripted fake oracles stand in for the HTTP client. Whatever they
//! answer, every tick completes and every decision is either an accepted
//! in-vocabulary answer or a rule-table fallback.

#![allow(clippy::unwrap_used)]

use std::collections::BTreeSet;
use std::time::Duration;

use urbanium_core::{
    DecisionOracle, OracleError, OracleProposal, OracleRequest, UrbaniumConfig, WorldState,
    run_tick,
};
use urbanium_types::{ActionType, DecisionSource, WorldEventKind};

fn config() -> UrbaniumConfig {
    let mut config = UrbaniumConfig::default();
    config.simulation.seed = 99;
    config.scenario.population = 20;
    config.scenario.districts = 4;
    config.scenario.employers = 3;
    config.scenario.housing_units = 16;
    config.scenario.job_listings = 6;
    config.decision.oracle_enabled = true;
    config.decision.oracle_timeout_ms = 100;
    config
}

/// Always answers with the same text.
struct FixedOracle {
    action: &'static str,
    calls: u64,
}

impl DecisionOracle for FixedOracle {
    fn propose_action(
        &mut self,
        _request: &OracleRequest<'_>,
        _timeout: Duration,
    ) -> Result<OracleProposal, OracleError> {
        self.calls = self.calls.saturating_add(1);
        Ok(OracleProposal {
            action: self.action.to_owned(),
            reasoning: Some(String::from("scripted")),
            confidence: Some(0.5),
        })
    }
}

/// Picks the first action it was offered and records every offer.
#[derive(Default)]
struct FirstAvailableOracle {
    offered: Vec<Vec<ActionType>>,
}

impl DecisionOracle for FirstAvailableOracle {
    fn propose_action(
        &mut self,
        request: &OracleRequest<'_>,
        _timeout: Duration,
    ) -> Result<OracleProposal, OracleError> {
        self.offered.push(request.available.to_vec());
        let first = request.available.first().ok_or(OracleError::Unavailable {
            message: String::from("empty vocabulary"),
        })?;
        Ok(OracleProposal {
            action: first.as_str().to_owned(),
            reasoning: None,
            confidence: None,
        })
    }
}

/// Fails every call.
struct BrokenOracle;

impl DecisionOracle for BrokenOracle {
    fn propose_action(
        &mut self,
        _request: &OracleRequest<'_>,
        _timeout: Duration,
    ) -> Result<OracleProposal, OracleError> {
        Err(OracleError::Malformed {
            message: String::from("not json"),
        })
    }
}

#[test]
fn out_of_vocabulary_answers_fall_back() {
    let mut state = WorldState::initialize(config()).unwrap();
    let mut oracle = FixedOracle {
        action: "launch_rocket",
        calls: 0,
    };

    let summary = run_tick(&mut state, Some(&mut oracle)).unwrap();
    assert!(!summary.decisions.contains_key(&DecisionSource::Oracle));
    let fallbacks = summary
        .decisions
        .get(&DecisionSource::Fallback)
        .copied()
        .unwrap_or(0);
    assert_eq!(u64::from(fallbacks), oracle.calls);
    assert_eq!(
        summary
            .events
            .iter()
            .filter(|e| e.kind == WorldEventKind::OracleFallback)
            .count(),
        usize::try_from(fallbacks).unwrap()
    );
}

#[test]
fn fallback_matches_the_rule_table() {
    let mut with_broken = WorldState::initialize(config()).unwrap();
    let mut without = WorldState::initialize(config()).unwrap();
    without.config.decision.oracle_enabled = false;

    for _ in 0..24 {
        run_tick(&mut with_broken, Some(&mut BrokenOracle)).unwrap();
        run_tick(&mut without, None).unwrap();
    }
    assert_eq!(with_broken.city.citizens.len(), without.city.citizens.len());
    for (a, b) in with_broken
        .city
        .citizens
        .values()
        .zip(without.city.citizens.values())
    {
        assert_eq!(a.resources, b.resources);
        assert_eq!(a.employer_id, b.employer_id);
        assert_eq!(a.household_id, b.household_id);
        assert_eq!(a.oracle_decisions, 0);
    }
    assert_eq!(with_broken.metrics, without.metrics);
}

#[test]
fn accepted_answers_come_from_the_offered_set() {
    let mut state = WorldState::initialize(config()).unwrap();
    let mut oracle = FirstAvailableOracle::default();

    let mut accepted = 0_u64;
    for _ in 0..12 {
        let summary = run_tick(&mut state, Some(&mut oracle)).unwrap();
        accepted = accepted.saturating_add(u64::from(
            summary
                .decisions
                .get(&DecisionSource::Oracle)
                .copied()
                .unwrap_or(0),
        ));
        for id in summary.results.keys() {
            let citizen = state.city.citizen(*id).unwrap();
            assert!(citizen.oracle_decisions <= citizen.total_decisions);
        }
    }
    assert!(accepted > 0);
    assert!(oracle.offered.iter().all(|offer| !offer.is_empty()));
    let offered: BTreeSet<ActionType> = oracle.offered.iter().flatten().copied().collect();
    assert!(offered.contains(&ActionType::Rest));
    assert!(offered.contains(&ActionType::Socialize));

    let total_oracle: u64 = state.city.citizens.values().map(|c| c.oracle_decisions).sum();
    assert_eq!(total_oracle, accepted);
}

#[test]
fn disabled_oracle_is_never_called() {
    let mut config = config();
    config.decision.oracle_enabled = false;
    let mut state = WorldState::initialize(config).unwrap();
    let mut oracle = FixedOracle {
        action: "rest",
        calls: 0,
    };

    for _ in 0..5 {
        run_tick(&mut state, Some(&mut oracle)).unwrap();
    }
    assert_eq!(oracle.calls, 0);
}
