//! Error types for the `urbanium-world` crate.

use urbanium_types::DistrictId;

/// Errors that can occur while building or querying the city.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// A district was not found in the city graph.
    #[error("district not found: {0}")]
    DistrictNotFound(DistrictId),

    /// A district with the same id was already added.
    #[error("duplicate district id: {0}")]
    DuplicateDistrict(DistrictId),

    /// A district cannot be connected to itself.
    #[error("district {0} cannot connect to itself")]
    SelfConnection(DistrictId),

    /// The city configuration cannot produce a valid city.
    #[error("invalid city configuration: {message}")]
    InvalidConfig {
        /// What is wrong with the configuration.
        message: String,
    },

    /// Arithmetic overflow during a checked money calculation.
    #[error("arithmetic overflow in city calculation")]
    ArithmeticOverflow,
}
