//! Error types for the urbanium-agents crate.
//!
//! Expected validation failures are not errors: they are returned as
//! [`FailureReason`](urbanium_types::FailureReason) data. The variants here
//! signal a broken world (a missing citizen, a dangling id) or arithmetic
//! that could not be completed exactly.

use urbanium_types::{CitizenId, EmployerId, HouseholdId, HousingUnitId, JobListingId};

/// Errors that can occur while executing an action.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// The acting citizen is not in the city.
    #[error("citizen not found: {0}")]
    CitizenNotFound(CitizenId),

    /// A listing names an employer that does not exist.
    #[error("employer not found: {0}")]
    EmployerNotFound(EmployerId),

    /// A citizen names a household that does not exist.
    #[error("household not found: {0}")]
    HouseholdNotFound(HouseholdId),

    /// A validated job listing disappeared before execution.
    #[error("job listing not found: {0}")]
    JobListingNotFound(JobListingId),

    /// A validated housing unit disappeared before execution.
    #[error("housing unit not found: {0}")]
    HousingUnitNotFound(HousingUnitId),

    /// A money calculation overflowed.
    #[error("arithmetic overflow: {context}")]
    ArithmeticOverflow {
        /// What was being computed.
        context: String,
    },
}

impl AgentError {
    /// Shorthand for an overflow while computing `context`.
    pub fn overflow(context: &str) -> Self {
        Self::ArithmeticOverflow {
            context: context.to_owned(),
        }
    }
}
