//! Configuration loading and typed config structures for the Urbanium
//! simulation.
//!
//! The canonical configuration lives in `urbanium-config.yaml` at the
//! project root; the `URBANIUM_CONFIG` environment variable points at a
//! different file. Every section and field has a default, so an empty or
//! partial file is valid. Sections owned by other crates (the oracle
//! client's `oracle` section) are ignored here and parsed by the binary.

use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use urbanium_agents::{ActionConfig, NeedsConfig};
use urbanium_world::{CityConfig, WorldError};

use crate::economy::EconomyConfig;
use crate::scenario::ScheduledIntervention;

/// Default config file name, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "urbanium-config.yaml";

/// Environment variable overriding the config file path.
pub const CONFIG_PATH_ENV: &str = "URBANIUM_CONFIG";

/// Errors that can occur when loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The scenario cannot produce a valid city.
    #[error("invalid scenario: {source}")]
    Scenario {
        /// The underlying world error.
        #[from]
        source: WorldError,
    },

    /// A value is out of range.
    #[error("invalid configuration: {message}")]
    Invalid {
        /// What is wrong.
        message: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level simulation configuration.
///
/// Mirrors the structure of `urbanium-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UrbaniumConfig {
    /// Seed, run bounds, start time, and retention sizes.
    #[serde(default)]
    pub simulation: SimulationConfig,

    /// City sizes and starting economics.
    #[serde(default)]
    pub scenario: CityConfig,

    /// Parameter changes scheduled by tick.
    #[serde(default)]
    pub interventions: Vec<ScheduledIntervention>,

    /// Need decay rates and arbitration thresholds.
    #[serde(default)]
    pub needs: NeedsConfig,

    /// Action effects and prices.
    #[serde(default)]
    pub actions: ActionConfig,

    /// Household bills and price drift.
    #[serde(default)]
    pub economy: EconomyConfig,

    /// Decision oracle switches.
    #[serde(default)]
    pub decision: DecisionConfig,

    /// Log output settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl UrbaniumConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yml::from_str(yaml)?)
    }

    /// The config path: `URBANIUM_CONFIG` if set, else the default name.
    pub fn resolve_path() -> PathBuf {
        std::env::var_os(CONFIG_PATH_ENV)
            .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from)
    }

    /// Load from [`resolve_path`](Self::resolve_path), falling back to
    /// defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if an existing file cannot be read or parsed.
    pub fn load() -> Result<(Self, Option<PathBuf>), ConfigError> {
        let path = Self::resolve_path();
        if path.exists() {
            let config = Self::from_file(&path)?;
            Ok((config, Some(path)))
        } else {
            Ok((Self::default(), None))
        }
    }

    /// Check every section for out-of-range values.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.scenario.validate()?;
        if self.simulation.history_capacity == 0 {
            return Err(invalid("simulation.history_capacity must be at least 1"));
        }
        if !self.needs.is_valid() {
            return Err(invalid("needs rates and thresholds must lie within [0, 1]"));
        }
        if !self.actions.is_valid() {
            return Err(invalid(
                "actions prices must be non-negative, hours_per_month positive, increments within [0, 1]",
            ));
        }
        if !self.economy.is_valid() {
            return Err(invalid(
                "economy days_per_month must be positive, utilities non-negative, inflation within [-1, 1]",
            ));
        }
        if self.decision.oracle_enabled && self.decision.oracle_timeout_ms == 0 {
            return Err(invalid("decision.oracle_timeout_ms must be positive when the oracle is enabled"));
        }
        if let Some(entry) = self.interventions.iter().find(|e| !e.intervention.is_valid()) {
            return Err(invalid(&format!(
                "intervention {} at tick {} has a negative amount",
                entry.intervention.name(),
                entry.tick
            )));
        }
        Ok(())
    }
}

fn invalid(message: &str) -> ConfigError {
    ConfigError::Invalid {
        message: message.to_owned(),
    }
}

/// Seed, bounds, and retention settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Random seed for reproducibility.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Ticks to run before stopping (0 = unlimited).
    #[serde(default = "default_max_ticks")]
    pub max_ticks: u64,

    /// Real-time pause between ticks in milliseconds.
    #[serde(default)]
    pub tick_interval_ms: u64,

    /// Simulation time at tick 0.
    #[serde(default = "default_start_time")]
    pub start_time: DateTime<Utc>,

    /// Metrics snapshots retained.
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,

    /// World events retained (0 = none).
    #[serde(default = "default_event_log_capacity")]
    pub event_log_capacity: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            max_ticks: default_max_ticks(),
            tick_interval_ms: 0,
            start_time: default_start_time(),
            history_capacity: default_history_capacity(),
            event_log_capacity: default_event_log_capacity(),
        }
    }
}

/// Decision oracle switches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionConfig {
    /// Consult the oracle for non-critical decisions.
    #[serde(default)]
    pub oracle_enabled: bool,

    /// Longest wait for one oracle answer, in milliseconds.
    #[serde(default = "default_oracle_timeout_ms")]
    pub oracle_timeout_ms: u64,
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            oracle_enabled: false,
            oracle_timeout_ms: default_oracle_timeout_ms(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format: `pretty` or `json`.
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

const fn default_seed() -> u64 {
    42
}

const fn default_max_ticks() -> u64 {
    240
}

fn default_start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 6, 0, 0, 0)
        .single()
        .unwrap_or(DateTime::UNIX_EPOCH)
}

const fn default_history_capacity() -> usize {
    1000
}

const fn default_event_log_capacity() -> usize {
    10_000
}

const fn default_oracle_timeout_ms() -> u64 {
    2000
}

fn default_log_level() -> String {
    String::from("info")
}

fn default_log_format() -> String {
    String::from("pretty")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::scenario::Intervention;

    #[test]
    fn default_config_is_valid() {
        let config = UrbaniumConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.simulation.seed, 42);
        assert_eq!(config.simulation.max_ticks, 240);
        assert_eq!(config.simulation.start_time.to_rfc3339(), "2025-01-06T00:00:00+00:00");
        assert!(!config.decision.oracle_enabled);
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn parse_empty_yaml() {
        assert_eq!(UrbaniumConfig::parse("").unwrap(), UrbaniumConfig::default());
    }

    #[test]
    fn parse_partial_yaml() {
        let yaml = r"
simulation:
  seed: 7
  max_ticks: 48
scenario:
  population: 20
  minimum_wage: 1000
interventions:
  - tick: 24
    intervention:
      type: scale_rents
      factor: 1.1
needs:
  hunger_rate: 0.05
decision:
  oracle_enabled: true
oracle:
  model: ignored-here
";
        let config = UrbaniumConfig::parse(yaml).unwrap();
        assert_eq!(config.simulation.seed, 7);
        assert_eq!(config.simulation.max_ticks, 48);
        assert_eq!(config.simulation.history_capacity, 1000);
        assert_eq!(config.scenario.population, 20);
        assert_eq!(config.scenario.minimum_wage, dec!(1000));
        assert_eq!(config.interventions.len(), 1);
        assert_eq!(
            config.interventions.first().map(|e| &e.intervention),
            Some(&Intervention::ScaleRents { factor: dec!(1.1) })
        );
        assert!((config.needs.hunger_rate - 0.05).abs() < f64::EPSILON);
        assert!((config.needs.energy_rate - 0.03).abs() < f64::EPSILON);
        assert!(config.decision.oracle_enabled);
        assert_eq!(config.decision.oracle_timeout_ms, 2000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn invalid_values_are_rejected() {
        let mut config = UrbaniumConfig::default();
        config.simulation.history_capacity = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));

        let mut config = UrbaniumConfig::default();
        config.scenario.districts = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Scenario { .. })));

        let mut config = UrbaniumConfig::default();
        config.interventions.push(ScheduledIntervention {
            tick: 1,
            intervention: Intervention::SetMinimumWage { amount: dec!(-1) },
        });
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn economy_section_parses_and_validates() {
        let config = UrbaniumConfig::parse("economy:\n  annual_inflation: 0.03\n").unwrap();
        assert_eq!(config.economy.annual_inflation, dec!(0.03));
        assert_eq!(config.economy.days_per_month, 30);
        assert!(config.validate().is_ok());

        let config = UrbaniumConfig::parse("economy:\n  days_per_month: 0\n").unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn bad_yaml_is_an_error() {
        assert!(matches!(
            UrbaniumConfig::parse("simulation: [unclosed"),
            Err(ConfigError::Yaml { .. })
        ));
    }

    #[test]
    fn load_project_config_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../urbanium-config.yaml");
        if path.exists() {
            let config = UrbaniumConfig::from_file(&path).unwrap();
            assert!(config.validate().is_ok());
        }
    }
}
