//! AI-assisted KQL query generation with syntax validation and repair.
//!
//! A [`RetryController`](generation::RetryController) asks a [`Provider`] for a
//! query, pulls the query out of the response, validates it, and feeds any
//! diagnostics back into the next prompt until the query validates or the
//! retry budget runs out.
//!
//! ```
//! use kql_ai::ValidationError;
//!
//! let e = ValidationError::from_diagnostic("generated.kql:1:20: expected ')'");
//! assert_eq!(e.to_string(), "Line 1, Column 20: expected ')'");
//! ```

pub mod classify;
pub mod diagnostic;
pub mod extract;
pub mod generation;
pub mod prompt;
pub mod provider;
pub mod temperature;
pub mod validator;

pub use diagnostic::ValidationError;
pub use provider::{Provider, ProviderError};
pub use validator::{LexicalValidator, ValidationMode, Validator, ValidatorError};

/// Common traits and types for driving a generation run.
pub mod prelude {
    pub use crate::classify::ErrorClassifier;
    pub use crate::diagnostic::ValidationError;
    pub use crate::extract::{extract_query, Extractor, ResponseExtractor};
    pub use crate::generation::{
        Disposition, FeedbackConfig, GenerationError, GenerationMetrics, GenerationRequest,
        GenerationResult, Preset, ProgressSink, RetryController, TempAdjustConfig,
        ValidationConfig,
    };
    pub use crate::prompt::{GeneratePrompts, PromptBuilder, RepairPrompts};
    pub use crate::provider::{Provider, ProviderError};
    pub use crate::validator::{LexicalValidator, ValidationMode, Validator, ValidatorError};
}
