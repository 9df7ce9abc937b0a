//! The bounded generate-validate-repair loop.

use std::fmt;
use std::sync::Arc;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::config::ValidationConfig;
use super::error::GenerationError;
use super::metrics::TokenTally;
use super::{GenerationRequest, GenerationResult};
use crate::diagnostic::ValidationError;
use crate::extract::Extractor;
use crate::prompt::PromptBuilder;
use crate::provider::Provider;
use crate::temperature::temperature;
use crate::validator::Validator;

/// Default name validators see for generated candidates.
pub const DEFAULT_SOURCE_NAME: &str = "generated.kql";

/// Receives human-readable progress lines. Purely observational.
pub trait ProgressSink: Send + Sync {
    /// Called once per line.
    fn line(&self, line: &str);
}

impl<F> ProgressSink for F
where
    F: Fn(&str) + Send + Sync,
{
    fn line(&self, line: &str) {
        self(line);
    }
}

/// Runs attempts strictly in sequence until a candidate validates or the budget is spent.
///
/// Each attempt builds a prompt, calls the provider at the scheduled temperature,
/// extracts a candidate and validates it. Attempt `k + 1` always sees the
/// candidate and diagnostics of attempt `k`; the request itself never changes.
/// Only provider, validator and cancellation failures abort a run.
#[derive(Clone)]
pub struct RetryController {
    config: ValidationConfig,
    base_temperature: f32,
    source_name: String,
    verbose: Option<Arc<dyn ProgressSink>>,
    debug: Option<Arc<dyn ProgressSink>>,
}

impl fmt::Debug for RetryController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryController")
            .field("config", &self.config)
            .field("base_temperature", &self.base_temperature)
            .field("source_name", &self.source_name)
            .field("verbose", &self.verbose.is_some())
            .field("debug", &self.debug.is_some())
            .finish()
    }
}

/// State carried from one failed attempt into the next.
struct Failed {
    candidate: String,
    errors: Vec<ValidationError>,
}

impl RetryController {
    /// Creates a controller for one policy and base temperature.
    #[must_use]
    pub fn new(config: ValidationConfig, base_temperature: f32) -> Self {
        Self {
            config,
            base_temperature,
            source_name: DEFAULT_SOURCE_NAME.to_string(),
            verbose: None,
            debug: None,
        }
    }

    /// Name passed to the validator for each candidate.
    #[must_use]
    pub fn with_source_name(mut self, name: impl Into<String>) -> Self {
        self.source_name = name.into();
        self
    }

    /// Sink for one summary line per attempt.
    #[must_use]
    pub fn with_verbose(mut self, sink: impl ProgressSink + 'static) -> Self {
        self.verbose = Some(Arc::new(sink));
        self
    }

    /// Sink for raw responses and extracted candidates.
    #[must_use]
    pub fn with_debug(mut self, sink: impl ProgressSink + 'static) -> Self {
        self.debug = Some(Arc::new(sink));
        self
    }

    /// The policy this controller runs with.
    #[must_use]
    pub const fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Runs the loop.
    ///
    /// # Errors
    ///
    /// Returns `GenerationError::Provider` if any provider call fails,
    /// `GenerationError::Validator` if the validator cannot run, and
    /// `GenerationError::Cancelled` if `cancel` fires first. An exhausted
    /// budget is not an error: it yields a result with `valid == false`.
    pub async fn run<P, V, B, E>(
        &self,
        provider: &P,
        validator: &V,
        request: &GenerationRequest,
        prompts: &B,
        extractor: &E,
        cancel: &CancellationToken,
    ) -> Result<GenerationResult, GenerationError>
    where
        P: Provider + ?Sized,
        V: Validator + ?Sized,
        B: PromptBuilder + ?Sized,
        E: Extractor + ?Sized,
    {
        let start = Instant::now();
        let mut tally = TokenTally::default();

        if !self.config.enabled {
            let prompt = prompts.initial(request);
            let response = complete(provider, &prompt, self.base_temperature, 1, cancel).await?;
            tally.record(&prompt, &response);
            let query = extractor.extract(&response);
            self.emit_debug(1, &response, &query);
            self.emit_verbose(&format!(
                "Attempt 1/1 (temp={:.2}): validation skipped",
                self.base_temperature
            ));
            return Ok(GenerationResult {
                query,
                valid: true,
                errors: Vec::new(),
                attempts: 1,
                metrics: tally.finish(1, start.elapsed()),
            });
        }

        let max_attempts = self.config.max_attempts();
        let mut last: Option<Failed> = None;

        for attempt in 1..=max_attempts {
            let prompt = match &last {
                None => prompts.initial(request),
                Some(failed) => prompts.retry(
                    request,
                    &failed.candidate,
                    &failed.errors,
                    attempt,
                    &self.config.feedback,
                ),
            };
            let temp = temperature(self.base_temperature, attempt, &self.config.temperature);
            tracing::debug!(attempt, max_attempts, temperature = temp, "requesting candidate");

            let response = complete(provider, &prompt, temp, attempt, cancel).await?;
            tally.record(&prompt, &response);

            let candidate = extractor.extract(&response);
            self.emit_debug(attempt, &response, &candidate);

            let errors = self.check(validator, &candidate, attempt, cancel).await?;
            if errors.is_empty() {
                tracing::info!(attempt, "candidate validated");
                self.emit_verbose(&format!(
                    "Attempt {attempt}/{max_attempts} (temp={temp:.2}): valid"
                ));
                return Ok(GenerationResult {
                    query: candidate,
                    valid: true,
                    errors: Vec::new(),
                    attempts: attempt,
                    metrics: tally.finish(attempt, start.elapsed()),
                });
            }

            tracing::debug!(attempt, diagnostics = errors.len(), "candidate rejected");
            self.emit_verbose(&format!(
                "Attempt {attempt}/{max_attempts} (temp={temp:.2}): {} syntax error(s)",
                errors.len()
            ));
            last = Some(Failed { candidate, errors });
        }

        let Failed { candidate, errors } = last.unwrap_or(Failed {
            candidate: String::new(),
            errors: Vec::new(),
        });
        tracing::warn!(
            attempts = max_attempts,
            diagnostics = errors.len(),
            "retry budget exhausted"
        );

        Ok(GenerationResult {
            query: candidate,
            valid: false,
            errors,
            attempts: max_attempts,
            metrics: tally.finish(max_attempts, start.elapsed()),
        })
    }

    async fn check<V: Validator + ?Sized>(
        &self,
        validator: &V,
        candidate: &str,
        attempt: usize,
        cancel: &CancellationToken,
    ) -> Result<Vec<ValidationError>, GenerationError> {
        let raw = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(GenerationError::Cancelled { attempt }),
            res = validator.validate(&self.source_name, candidate) => {
                res.map_err(|source| GenerationError::Validator { attempt, source })?
            }
        };
        Ok(raw.iter().map(|d| ValidationError::from_diagnostic(d)).collect())
    }

    fn emit_verbose(&self, line: &str) {
        if let Some(sink) = &self.verbose {
            sink.line(line);
        }
    }

    fn emit_debug(&self, attempt: usize, response: &str, candidate: &str) {
        if let Some(sink) = &self.debug {
            sink.line(&format!(
                "--- Raw response (attempt {attempt}) ---\n{response}\n--- End raw response ---"
            ));
            sink.line(&format!("--- Extracted query ---\n{candidate}\n--- End extracted ---"));
        }
    }
}

async fn complete<P: Provider + ?Sized>(
    provider: &P,
    prompt: &str,
    temp: f32,
    attempt: usize,
    cancel: &CancellationToken,
) -> Result<String, GenerationError> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(GenerationError::Cancelled { attempt }),
        res = provider.complete(prompt, temp) => {
            res.map_err(|source| GenerationError::Provider { attempt, source })
        }
    }
}
