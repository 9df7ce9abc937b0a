//! Generate-validate-repair runs.
//!
//! - [`RetryController`] - sequential attempt loop with validation feedback
//! - [`ValidationConfig`] - retry, feedback and temperature policy
//! - [`GenerationError`] - fatal failures (transport, validator, cancellation)
//! - [`GenerationMetrics`] - token and timing metrics
//! - [`Disposition`] - strict/lenient handling of a finished run

pub mod config;
pub mod controller;
pub mod error;
pub mod metrics;
pub mod report;

pub use config::{FeedbackConfig, Preset, TempAdjustConfig, ValidationConfig};
pub use controller::{ProgressSink, RetryController, DEFAULT_SOURCE_NAME};
pub use error::GenerationError;
pub use metrics::{estimate_tokens, GenerationMetrics};
pub use report::{format_validation_error, format_validation_warning, Disposition};

use crate::diagnostic::ValidationError;

/// What the caller asked for. Never modified during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    /// Natural-language description, or the broken query when repairing.
    pub prompt: String,
    /// Table the query should target.
    pub table: Option<String>,
    /// Column names, as free text.
    pub schema: Option<String>,
}

impl GenerationRequest {
    /// Request with only a prompt.
    #[must_use]
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            table: None,
            schema: None,
        }
    }

    /// Sets the target table.
    #[must_use]
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Sets the schema hint.
    #[must_use]
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }
}

/// Outcome of a run that was not aborted.
///
/// `valid` implies `errors` is empty; `!valid` implies every allowed attempt was used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationResult {
    /// Candidate from the last attempt made.
    pub query: String,
    /// Whether that candidate validated (always true when validation is disabled).
    pub valid: bool,
    /// Diagnostics of the final attempt when invalid.
    pub errors: Vec<ValidationError>,
    /// Provider calls made.
    pub attempts: usize,
    /// Timing and token estimates.
    pub metrics: GenerationMetrics,
}
