//! Subcommand implementations and the session they share.

use std::sync::Arc;

use kql_ai::generation::{ProgressSink, RetryController};
use kql_ai::{Provider, ValidationError, ValidationMode, Validator};
use tokio_util::sync::CancellationToken;

use crate::backends::{build_provider, build_validator};
use crate::errors::CliError;
use crate::settings::Settings;

/// `kql config`.
pub mod config;
/// `kql explain`.
pub mod explain;
/// `kql fix`.
pub mod fix;
/// `kql generate`.
pub mod generate;
/// `kql lint`.
pub mod lint;
/// `kql suggest`.
pub mod suggest;

/// How a command finished, when it did not error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Exit 0.
    Success,
    /// Exit 1 without an error message of its own (strict rejection, lint findings).
    Failure,
}

/// Everything a model-backed command needs.
#[derive(Clone)]
pub struct Session {
    /// Effective settings.
    pub settings: Settings,
    /// Model backend.
    pub provider: Arc<dyn Provider>,
    /// Query checker.
    pub validator: Arc<dyn Validator>,
    /// Fires on Ctrl-C or when the deadline passes.
    pub cancel: CancellationToken,
    /// Progress lines, when `--verbose`.
    pub progress: Option<Arc<dyn ProgressSink>>,
    /// Raw responses, when `--debug`.
    pub debug: Option<Arc<dyn ProgressSink>>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("settings", &self.settings)
            .field("provider", &self.provider.name())
            .field("model", &self.provider.model())
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Builds the provider and validator the settings select.
    ///
    /// # Errors
    /// Fails when a configured program cannot be found.
    pub fn open(settings: Settings, cancel: CancellationToken) -> Result<Self, CliError> {
        let provider = build_provider(&settings)?;
        let validator = build_validator(&settings, ValidationMode::Syntax)?;
        Ok(Self {
            settings,
            provider,
            validator,
            cancel,
            progress: None,
            debug: None,
        })
    }

    /// Sets the progress and debug sinks.
    #[must_use]
    pub fn with_sinks(
        mut self,
        progress: Option<Arc<dyn ProgressSink>>,
        debug: Option<Arc<dyn ProgressSink>>,
    ) -> Self {
        self.progress = progress;
        self.debug = debug;
        self
    }

    /// A retry controller wired to this session's sinks.
    #[must_use]
    pub fn controller(&self) -> RetryController {
        let mut controller =
            RetryController::new(self.settings.validation.clone(), self.settings.temperature);
        if let Some(sink) = &self.progress {
            let sink = Arc::clone(sink);
            controller = controller.with_verbose(move |line: &str| sink.line(line));
        }
        if let Some(sink) = &self.debug {
            let sink = Arc::clone(sink);
            controller = controller.with_debug(move |line: &str| sink.line(line));
        }
        controller
    }

    /// Emits a progress line when verbose.
    pub fn note(&self, line: &str) {
        if let Some(sink) = &self.progress {
            sink.line(line);
        }
    }

    /// Announces the backend in use when verbose.
    pub fn announce(&self) {
        if self.progress.is_some() {
            self.note(&format!(
                "Using {} provider with model {}...",
                self.provider.name(),
                self.provider.model()
            ));
        }
    }

    /// One provider call at the session temperature, outside any retry loop.
    ///
    /// # Errors
    /// Returns `CliError::Provider` on failure and `CliError::Cancelled` if the
    /// session is cancelled first.
    pub async fn ask(&self, prompt: &str, context: &'static str) -> Result<String, CliError> {
        let temperature = self.settings.temperature;
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(CliError::Cancelled),
            res = self.provider.complete(prompt, temperature) => {
                res.map_err(|source| CliError::Provider { context, source })
            }
        }
    }

    /// Validates `text` once with this session's validator.
    ///
    /// # Errors
    /// See [`validate`].
    pub async fn validate(&self, source_name: &str, text: &str) -> Result<Vec<ValidationError>, CliError> {
        validate(self.validator.as_ref(), &self.cancel, source_name, text).await
    }
}

/// Validates `text` once and parses the diagnostics.
///
/// # Errors
/// Returns `CliError::Validator` when the validator cannot run and
/// `CliError::Cancelled` if `cancel` fires first.
pub async fn validate(
    validator: &dyn Validator,
    cancel: &CancellationToken,
    source_name: &str,
    text: &str,
) -> Result<Vec<ValidationError>, CliError> {
    let raw = tokio::select! {
        biased;
        () = cancel.cancelled() => return Err(CliError::Cancelled),
        res = validator.validate(source_name, text) => res?,
    };
    Ok(raw.iter().map(|d| ValidationError::from_diagnostic(d)).collect())
}
