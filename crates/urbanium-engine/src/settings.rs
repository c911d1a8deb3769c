//! Binary-specific config sections.
//!
//! The core config ignores keys it does not own. The `oracle` section is
//! read here from the same file, as a raw YAML value.

use std::path::Path;

use urbanium_oracle::OracleConfig;

use crate::error::EngineError;

/// Read the `oracle` section of the config file at `path`.
///
/// A missing file or a missing section yields the defaults.
pub fn load_oracle_config(path: Option<&Path>) -> Result<OracleConfig, EngineError> {
    let Some(path) = path else {
        return Ok(OracleConfig::default());
    };
    let contents = std::fs::read_to_string(path).map_err(|e| EngineError::Settings {
        message: format!("failed to read {}: {e}", path.display()),
    })?;
    parse_oracle_section(&contents)
}

/// Extract the `oracle` section from YAML text.
pub fn parse_oracle_section(yaml: &str) -> Result<OracleConfig, EngineError> {
    if yaml.trim().is_empty() {
        return Ok(OracleConfig::default());
    }
    let raw: serde_yml::Value = serde_yml::from_str(yaml).map_err(|e| EngineError::Settings {
        message: format!("failed to parse config YAML: {e}"),
    })?;

    match raw.get("oracle") {
        Some(section) if !section.is_null() => serde_yml::from_value(section.clone())
            .map_err(|e| EngineError::Settings {
                message: format!("invalid oracle section: {e}"),
            }),
        _ => Ok(OracleConfig::default()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn missing_section_uses_defaults() {
        let config = parse_oracle_section("simulation:\n  seed: 3\n").unwrap();
        assert_eq!(config, OracleConfig::default());
        assert_eq!(parse_oracle_section("").unwrap(), OracleConfig::default());
        assert_eq!(load_oracle_config(None).unwrap(), OracleConfig::default());
    }

    #[test]
    fn section_overrides_fields() {
        let yaml = "\
decision:
  oracle_enabled: true
oracle:
  api_base: http://localhost:11434/v1
  model: llama3
  max_tokens: 64
";
        let config = parse_oracle_section(yaml).unwrap();
        assert_eq!(config.api_base, "http://localhost:11434/v1");
        assert_eq!(config.model, "llama3");
        assert_eq!(config.max_tokens, 64);
        assert_eq!(config.api_key_env, OracleConfig::default().api_key_env);
    }

    #[test]
    fn malformed_section_is_an_error() {
        let yaml = "oracle:\n  max_tokens: lots\n";
        assert!(matches!(
            parse_oracle_section(yaml),
            Err(EngineError::Settings { .. })
        ));
    }

    #[test]
    fn unreadable_file_is_an_error() {
        let path = Path::new("/nonexistent/urbanium-config.yaml");
        assert!(load_oracle_config(Some(path)).is_err());
    }
}
