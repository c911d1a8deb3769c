//! Configuration for the decision oracle client.
//!
//! Lives under the `oracle` key of `urbanium-config.yaml`. The API key is
//! never stored in the file; `api_key_env` names the environment variable
//! that holds it.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::OracleClientError;

/// Settings for an OpenAI-compatible chat completions endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OracleConfig {
    /// Base URL; requests go to `{api_base}/chat/completions`.
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Name of the environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Model identifier.
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature. Kept low so answers stay near the rules.
    #[serde(default = "default_temperature")]
    pub temperature: f64,

    /// Completion token cap.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Directory with `system.j2` and `decision.j2`. Built-in templates
    /// are used when unset.
    #[serde(default)]
    pub template_dir: Option<PathBuf>,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            api_key_env: default_api_key_env(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            template_dir: None,
        }
    }
}

impl OracleConfig {
    /// Read the API key from the configured environment variable.
    ///
    /// Local endpoints that need no key may set the variable to any
    /// non-empty value.
    pub fn api_key(&self) -> Result<String, OracleClientError> {
        match std::env::var(&self.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            Ok(_) | Err(_) => Err(OracleClientError::Config {
                message: format!("environment variable {} is not set", self.api_key_env),
            }),
        }
    }

    /// Check ranges.
    pub fn validate(&self) -> Result<(), OracleClientError> {
        if self.api_base.trim().is_empty() {
            return Err(OracleClientError::Config {
                message: String::from("api_base must not be empty"),
            });
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(OracleClientError::Config {
                message: format!("temperature {} is outside [0, 2]", self.temperature),
            });
        }
        if self.max_tokens == 0 {
            return Err(OracleClientError::Config {
                message: String::from("max_tokens must be positive"),
            });
        }
        Ok(())
    }

    /// The completions URL, without a doubled slash.
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.api_base.trim_end_matches('/'))
    }
}

fn default_api_base() -> String {
    String::from("https://api.openai.com/v1")
}

fn default_api_key_env() -> String {
    String::from("URBANIUM_ORACLE_API_KEY")
}

fn default_model() -> String {
    String::from("gpt-4o-mini")
}

const fn default_temperature() -> f64 {
    0.1
}

const fn default_max_tokens() -> u32 {
    256
}
