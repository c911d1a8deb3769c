//! Error types for the decision oracle client.
//!
//! [`OracleClientError`] covers everything that can go wrong between
//! rendering a prompt and parsing the reply. The simulation never sees it
//! directly: it is converted into the core [`OracleError`] taxonomy, which
//! the arbitrator recovers from by falling back to the rule table.

use urbanium_core::OracleError;

/// Errors that can occur while asking the oracle for a decision.
#[derive(Debug, thiserror::Error)]
pub enum OracleClientError {
    /// Configuration is invalid or incomplete.
    #[error("oracle config error: {message}")]
    Config {
        /// What is wrong.
        message: String,
    },

    /// A prompt template could not be loaded or rendered.
    #[error("template error: {message}")]
    Template {
        /// Description of the failure.
        message: String,
    },

    /// The HTTP request could not be sent or its body could not be read.
    #[error("request failed: {message}")]
    Http {
        /// Description of the failure.
        message: String,
    },

    /// The provider answered with a non-success status.
    #[error("provider returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, as far as it could be read.
        body: String,
    },

    /// The completion envelope did not contain a message.
    #[error("unexpected response shape: {message}")]
    Response {
        /// What was missing.
        message: String,
    },

    /// The message text could not be parsed into a proposal.
    #[error("response parse error: {message}")]
    Parse {
        /// Description of the failure.
        message: String,
    },

    /// No reply arrived in time.
    #[error("no reply within {timeout_ms}ms")]
    Timeout {
        /// The exceeded timeout.
        timeout_ms: u64,
    },

    /// No runtime is available to drive the request.
    #[error("oracle unavailable: {message}")]
    Unavailable {
        /// Why the call cannot be made.
        message: String,
    },
}

impl From<OracleClientError> for OracleError {
    fn from(err: OracleClientError) -> Self {
        match err {
            OracleClientError::Timeout { timeout_ms } => Self::Timeout { timeout_ms },
            OracleClientError::Http { .. } | OracleClientError::Status { .. } => Self::Transport {
                message: err.to_string(),
            },
            OracleClientError::Response { .. } | OracleClientError::Parse { .. } => {
                Self::Malformed {
                    message: err.to_string(),
                }
            }
            OracleClientError::Config { .. }
            | OracleClientError::Template { .. }
            | OracleClientError::Unavailable { .. } => Self::Unavailable {
                message: err.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_map_onto_oracle_faults() {
        let timeout: OracleError = OracleClientError::Timeout { timeout_ms: 250 }.into();
        assert_eq!(timeout, OracleError::Timeout { timeout_ms: 250 });

        let status: OracleError = OracleClientError::Status {
            status: 503,
            body: String::from("overloaded"),
        }
        .into();
        assert_eq!(status.kind(), "transport");

        let parse: OracleError = OracleClientError::Parse {
            message: String::from("no json"),
        }
        .into();
        assert_eq!(parse.kind(), "malformed");

        let template: OracleError = OracleClientError::Template {
            message: String::from("missing"),
        }
        .into();
        assert_eq!(template.kind(), "unavailable");
    }
}
