//! Error types for the engine binary.

/// Top-level error for the engine binary.
///
/// Each variant wraps a subsystem error so startup helpers can propagate
/// with `?`; `main` adds context with `anyhow`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading or world initialization failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: urbanium_core::ConfigError,
    },

    /// The run loop stopped on a fatal error.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: urbanium_core::runner::RunnerError,
    },

    /// The oracle client could not be built.
    #[error("oracle error: {source}")]
    Oracle {
        /// The underlying client error.
        #[from]
        source: urbanium_oracle::OracleClientError,
    },

    /// A binary-specific config section could not be read.
    #[error("settings error: {message}")]
    Settings {
        /// Description of the failure.
        message: String,
    },
}
