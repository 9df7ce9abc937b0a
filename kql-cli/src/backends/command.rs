//! Providers and validators backed by external programs.

use async_trait::async_trait;
use command_adapter::{ExternalCommand, TemplateVars};
use kql_ai::{Provider, ProviderError, ValidationMode, Validator, ValidatorError};

/// Runs a program once per prompt and returns its stdout.
///
/// The prompt is substituted for `{prompt}` when the template has one and
/// written to stdin otherwise.
#[derive(Debug, Clone)]
pub struct CommandProvider {
    command: ExternalCommand,
    model: Option<String>,
}

impl CommandProvider {
    /// Creates a provider; `model` fills `{model}`.
    #[must_use]
    pub const fn new(command: ExternalCommand, model: Option<String>) -> Self {
        Self { command, model }
    }
}

#[async_trait]
impl Provider for CommandProvider {
    fn name(&self) -> &str {
        "command"
    }

    fn model(&self) -> &str {
        self.model.as_deref().unwrap_or("")
    }

    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String, ProviderError> {
        let inline = self.command.takes_prompt_inline();
        let vars = TemplateVars {
            prompt: inline.then_some(prompt),
            temperature: Some(temperature),
            model: self.model.as_deref(),
            source: None,
            mode: None,
        };
        let stdin = if inline { None } else { Some(prompt) };

        let result = self
            .command
            .run(&vars, stdin)
            .await
            .and_then(command_adapter::RunResult::into_success)
            .map_err(|e| ProviderError::Process(e.to_string()))?;
        if result.stdout.trim().is_empty() {
            return Err(ProviderError::InvalidResponse(format!(
                "{} produced no output",
                self.command.path.display()
            )));
        }
        Ok(result.stdout)
    }
}

/// Runs a program over each candidate.
///
/// The query goes to stdin, `{source}` names it and `{mode}` is `syntax` or
/// `semantic`. Exit status zero means valid; otherwise every non-blank line
/// of stdout and stderr is a diagnostic.
#[derive(Debug, Clone)]
pub struct CommandValidator {
    command: ExternalCommand,
    mode: ValidationMode,
}

impl CommandValidator {
    /// Wraps a resolved command in syntax mode.
    #[must_use]
    pub const fn new(command: ExternalCommand) -> Self {
        Self {
            command,
            mode: ValidationMode::Syntax,
        }
    }

    /// Sets the depth passed as `{mode}`.
    #[must_use]
    pub const fn with_mode(mut self, mode: ValidationMode) -> Self {
        self.mode = mode;
        self
    }
}

#[async_trait]
impl Validator for CommandValidator {
    async fn validate(&self, source_name: &str, text: &str) -> Result<Vec<String>, ValidatorError> {
        let vars = TemplateVars {
            source: Some(source_name),
            mode: Some(self.mode.as_str()),
            ..TemplateVars::default()
        };
        let result = self
            .command
            .run(&vars, Some(text))
            .await
            .map_err(|e| ValidatorError::Process(e.to_string()))?;
        if result.success() {
            return Ok(Vec::new());
        }

        let diagnostics: Vec<String> = result
            .stdout
            .lines()
            .chain(result.stderr.lines())
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();
        if diagnostics.is_empty() {
            return Err(ValidatorError::Process(format!(
                "{} exited with status {} and no diagnostics",
                self.command.path.display(),
                result.exit_code
            )));
        }
        Ok(diagnostics)
    }
}
