//! Tunable parameters for need decay, arbitration thresholds, and action
//! effects.
//!
//! Both structs deserialize from the `needs` and `actions` sections of the
//! YAML config. Missing keys take the [`Default`] value.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Need decay rates and the thresholds the arbitrator reads them against.
///
/// All values are fractions of the `[0, 1]` need scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NeedsConfig {
    /// Hunger added per tick (default: 0.04).
    pub hunger_rate: f64,

    /// Energy need added per tick (default: 0.03).
    pub energy_rate: f64,

    /// Social need added per tick (default: 0.01).
    pub social_rate: f64,

    /// Shelter need added per tick while the citizen has no household
    /// (default: 0.02).
    pub shelter_rate: f64,

    /// Income need added per tick while the citizen has no employer
    /// (default: 0.01).
    pub income_rate: f64,

    /// Level at or above which hunger, energy, or shelter forces the
    /// emergency action (default: 0.9).
    pub critical_threshold: f64,

    /// Level at or above which hunger or energy enters the rule table
    /// (default: 0.6).
    pub urgent_threshold: f64,

    /// Social need level that makes socializing a candidate (default: 0.5).
    pub social_threshold: f64,

    /// Sociability a citizen needs for the social rule to fire (default: 0.5).
    pub sociability_cutoff: f64,

    /// Per-tick chance, scaled by ambition, of a career job search
    /// (default: 0.05).
    pub career_roll_chance: f64,

    /// Per-tick chance, scaled by sociability, of a casual socialize
    /// (default: 0.10).
    pub social_roll_chance: f64,
}

impl Default for NeedsConfig {
    fn default() -> Self {
        Self {
            hunger_rate: 0.04,
            energy_rate: 0.03,
            social_rate: 0.01,
            shelter_rate: 0.02,
            income_rate: 0.01,
            critical_threshold: 0.9,
            urgent_threshold: 0.6,
            social_threshold: 0.5,
            sociability_cutoff: 0.5,
            career_roll_chance: 0.05,
            social_roll_chance: 0.10,
        }
    }
}

impl NeedsConfig {
    /// Whether every rate, threshold, and chance lies within `[0, 1]`.
    pub fn is_valid(&self) -> bool {
        [
            self.hunger_rate,
            self.energy_rate,
            self.social_rate,
            self.shelter_rate,
            self.income_rate,
            self.critical_threshold,
            self.urgent_threshold,
            self.social_threshold,
            self.sociability_cutoff,
            self.career_roll_chance,
            self.social_roll_chance,
        ]
        .iter()
        .all(|value| (0.0..=1.0).contains(value))
    }
}

/// Effects and prices applied by the action executor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionConfig {
    /// Meal cost before the food price index (default: 10).
    pub base_food_cost: Decimal,

    /// Working hours in a month, used to turn monthly income into an
    /// hourly wage (default: 160).
    pub hours_per_month: Decimal,

    /// Hours worked per `WorkShift` proposal (default: 1, one tick).
    pub shift_hours: u32,

    /// Highest share of monthly income a unit's rent may take (default: 0.4).
    pub rent_affordability_ratio: Decimal,

    /// Proficiency a citizen needs in each required skill (default: 0.3).
    pub skill_proficiency_floor: f64,

    /// Energy need added by a work shift (default: 0.05).
    pub work_energy_cost: f64,

    /// Income need removed by a work shift (default: 0.1).
    pub work_income_relief: f64,

    /// Energy need removed by resting with a household (default: 0.3).
    pub rest_recovery_sheltered: f64,

    /// Energy need removed by resting without a household (default: 0.15).
    pub rest_recovery_unsheltered: f64,

    /// Hunger removed by a meal (default: 0.5).
    pub eat_relief: f64,

    /// Energy need added by a commute (default: 0.02).
    pub commute_energy_cost: f64,

    /// Social need removed by socializing (default: 0.3).
    pub socialize_relief: f64,

    /// Extra social need removed when a park is in the district (default: 0.1).
    pub park_bonus: f64,

    /// Tie strength added per interaction (default: 0.05).
    pub tie_reinforcement: f64,

    /// Proficiency gained per hour worked in the citizen's strongest skill
    /// (default: 0.002).
    pub skill_gain_per_hour: f64,
}

impl Default for ActionConfig {
    fn default() -> Self {
        Self {
            base_food_cost: Decimal::TEN,
            hours_per_month: Decimal::from(160_u32),
            shift_hours: 1,
            rent_affordability_ratio: Decimal::new(4, 1),
            skill_proficiency_floor: 0.3,
            work_energy_cost: 0.05,
            work_income_relief: 0.1,
            rest_recovery_sheltered: 0.3,
            rest_recovery_unsheltered: 0.15,
            eat_relief: 0.5,
            commute_energy_cost: 0.02,
            socialize_relief: 0.3,
            park_bonus: 0.1,
            tie_reinforcement: 0.05,
            skill_gain_per_hour: 0.002,
        }
    }
}

impl ActionConfig {
    /// Whether prices are non-negative, hours positive, and increments
    /// within `[0, 1]`.
    pub fn is_valid(&self) -> bool {
        let money_ok = !self.base_food_cost.is_sign_negative()
            && self.hours_per_month > Decimal::ZERO
            && !self.rent_affordability_ratio.is_sign_negative();
        let increments_ok = [
            self.skill_proficiency_floor,
            self.work_energy_cost,
            self.work_income_relief,
            self.rest_recovery_sheltered,
            self.rest_recovery_unsheltered,
            self.eat_relief,
            self.commute_energy_cost,
            self.socialize_relief,
            self.park_bonus,
            self.tie_reinforcement,
            self.skill_gain_per_hour,
        ]
        .iter()
        .all(|value| (0.0..=1.0).contains(value));
        money_ok && increments_ok
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(NeedsConfig::default().is_valid());
        assert!(ActionConfig::default().is_valid());
    }

    #[test]
    fn sheltered_rest_recovers_more() {
        let config = ActionConfig::default();
        assert!(config.rest_recovery_sheltered > config.rest_recovery_unsheltered);
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config: ActionConfig =
            serde_yml::from_str("base_food_cost: 12.5\nshift_hours: 2\n").unwrap();
        assert_eq!(config.base_food_cost, dec!(12.5));
        assert_eq!(config.shift_hours, 2);
        assert_eq!(config.rent_affordability_ratio, dec!(0.4));
    }

    #[test]
    fn out_of_range_threshold_is_invalid() {
        let config = NeedsConfig {
            critical_threshold: 1.2,
            ..NeedsConfig::default()
        };
        assert!(!config.is_valid());
    }
}
