//! Error types for generation runs.

use thiserror::Error;

use crate::provider::ProviderError;
use crate::validator::ValidatorError;

/// Fatal errors that abort a generation run.
///
/// Validation failures are not errors: they drive the retry loop and end up in
/// [`GenerationResult`](super::GenerationResult) when the budget runs out.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// The provider call failed. Never retried.
    #[error("generating query (attempt {attempt}): {source}")]
    Provider {
        /// Attempt in which the call failed.
        attempt: usize,
        /// Transport-level cause.
        #[source]
        source: ProviderError,
    },

    /// The validator could not be run at all.
    #[error("validating query (attempt {attempt}): {source}")]
    Validator {
        /// Attempt in which validation failed to run.
        attempt: usize,
        /// Underlying cause.
        #[source]
        source: ValidatorError,
    },

    /// The caller cancelled the run or its deadline passed.
    #[error("generation cancelled during attempt {attempt}")]
    Cancelled {
        /// Attempt that was in flight.
        attempt: usize,
    },
}

impl GenerationError {
    /// Attempt number the error occurred in.
    #[must_use]
    pub const fn attempt(&self) -> usize {
        match self {
            Self::Provider { attempt, .. }
            | Self::Validator { attempt, .. }
            | Self::Cancelled { attempt } => *attempt,
        }
    }
}
