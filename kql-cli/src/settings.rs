//! Layered settings: defaults, then the settings file, then environment,
//! then a preset, then explicit flags.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use kql_ai::generation::ValidationConfig;
use ollama_adapter::{
    DEFAULT_INSTRUCTLAB_ENDPOINT, DEFAULT_INSTRUCTLAB_MODEL, DEFAULT_OLLAMA_ENDPOINT,
    DEFAULT_OLLAMA_MODEL,
};
use serde::{Deserialize, Serialize};

use crate::cli::{ProviderArgs, ProviderKind, ValidationArgs};
use crate::errors::CliError;

/// Default OpenAI endpoint.
pub const DEFAULT_OPENAI_ENDPOINT: &str = "https://api.openai.com";
/// Default OpenAI model.
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
/// Default deadline for a command.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Base temperature for `kql generate`.
pub const GENERATE_TEMPERATURE: f32 = 0.2;
/// Base temperature for `kql fix`.
pub const FIX_TEMPERATURE: f32 = 0.1;
/// Base temperature for `kql explain`.
pub const EXPLAIN_TEMPERATURE: f32 = 0.2;
/// Base temperature for `kql suggest`.
pub const SUGGEST_TEMPERATURE: f32 = 0.3;

/// `~/.kql/config.yaml`. Every field is optional so an explicit `false` differs from absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// The `ai:` section.
    pub ai: AiFileConfig,
}

/// The `ai:` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiFileConfig {
    /// Backend name.
    pub provider: Option<ProviderKind>,
    /// Model name.
    pub model: Option<String>,
    /// Base temperature for every command.
    pub temperature: Option<f32>,
    /// Deadline in seconds.
    pub timeout: Option<u64>,
    /// Ollama server.
    pub ollama: EndpointFileConfig,
    /// InstructLab server.
    pub instructlab: EndpointFileConfig,
    /// OpenAI-compatible server.
    pub openai: EndpointFileConfig,
    /// Program for the `command` provider.
    pub agent: CommandFileConfig,
    /// External validator program.
    pub validator: CommandFileConfig,
    /// Retry policy.
    pub validation: ValidationFileConfig,
}

/// An HTTP server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointFileConfig {
    /// Base URL.
    pub endpoint: Option<String>,
    /// Bearer key.
    pub api_key: Option<String>,
}

/// An external program and its argument template.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandFileConfig {
    /// Program name or path.
    pub program: Option<String>,
    /// Arguments; may contain placeholders and spaces.
    pub args: Option<Vec<String>>,
}

/// The `validation:` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationFileConfig {
    /// Validate at all.
    pub enabled: Option<bool>,
    /// Fail on a still-invalid result.
    pub strict: Option<bool>,
    /// Retries after the first attempt.
    pub retries: Option<usize>,
    /// Feedback sections.
    pub feedback: FeedbackFileConfig,
    /// Temperature schedule.
    pub temperature: TemperatureFileConfig,
}

/// The `feedback:` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackFileConfig {
    /// Include diagnostics.
    pub errors: Option<bool>,
    /// Include hints.
    pub hints: Option<bool>,
    /// Include examples.
    pub examples: Option<bool>,
    /// Escalate on later attempts.
    pub progressive: Option<bool>,
}

/// The `validation.temperature:` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemperatureFileConfig {
    /// Raise temperature on retries.
    pub adjust: Option<bool>,
    /// Step per retry.
    pub increment: Option<f32>,
    /// Ceiling.
    pub max: Option<f32>,
}

/// Default settings file location.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".kql").join("config.yaml"))
}

/// Reads a settings file. A missing file is `Ok(None)`.
///
/// # Errors
/// Returns an error for an unreadable file or invalid YAML.
pub fn load_file(path: &Path) -> anyhow::Result<Option<FileConfig>> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e).with_context(|| format!("reading {}", path.display())),
    };
    if text.trim().is_empty() {
        return Ok(Some(FileConfig::default()));
    }
    let config = serde_yaml::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
    Ok(Some(config))
}

/// Loads the file at `explicit` or the default location, warning and continuing on failure.
#[must_use]
pub fn load_or_warn(explicit: Option<&Path>) -> Option<FileConfig> {
    let path = explicit.map(Path::to_path_buf).or_else(default_config_path)?;
    match load_file(&path) {
        Ok(config) => {
            if config.is_some() {
                tracing::debug!(path = %path.display(), "loaded settings file");
            }
            config
        }
        Err(e) => {
            tracing::warn!("error loading config file: {e:#}");
            None
        }
    }
}

/// A program plus argument template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandSpec {
    /// Program name or path.
    pub program: String,
    /// Argument template.
    pub args: Vec<String>,
}

impl CommandSpec {
    fn from_line(line: &str) -> Result<Self, CliError> {
        let (program, args) = command_adapter::split_command_line(line)?;
        Ok(Self { program, args })
    }

    fn from_file(config: &CommandFileConfig) -> Option<Self> {
        config.program.as_ref().map(|program| Self {
            program: program.clone(),
            args: config.args.clone().unwrap_or_default(),
        })
    }
}

/// Effective settings for one invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Settings {
    /// Backend.
    pub provider: ProviderKind,
    /// Model name; `None` lets the command provider decide.
    pub model: Option<String>,
    /// Base temperature.
    pub temperature: f32,
    /// HTTP endpoint.
    pub endpoint: Option<String>,
    /// Bearer key for OpenAI-compatible servers.
    #[serde(serialize_with = "redact")]
    pub api_key: Option<String>,
    /// Program for the `command` provider.
    pub agent: Option<CommandSpec>,
    /// External validator; `None` uses the built-in lexical checks.
    pub validator: Option<CommandSpec>,
    /// Deadline in seconds.
    pub timeout_secs: u64,
    /// Retry policy.
    pub validation: ValidationConfig,
}

#[allow(clippy::ref_option)]
fn redact<S: serde::Serializer>(key: &Option<String>, s: S) -> Result<S::Ok, S::Error> {
    match key {
        Some(_) => s.serialize_some("********"),
        None => s.serialize_none(),
    }
}

impl Settings {
    /// Deadline as a duration.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Flag values that take part in resolution.
#[derive(Debug, Clone, Copy, Default)]
pub struct Overrides<'a> {
    /// Model selection flags.
    pub provider: Option<&'a ProviderArgs>,
    /// Retry flags.
    pub validation: Option<&'a ValidationArgs>,
    /// `--validator-command`.
    pub validator_command: Option<&'a str>,
    /// `--timeout`.
    pub timeout: Option<u64>,
}

fn env_flag(value: Option<String>, on: &[&str]) -> bool {
    value.is_some_and(|v| on.contains(&v.trim().to_ascii_lowercase().as_str()))
}

/// Merges every layer into effective settings.
///
/// `env` is consulted for `KQL_*` variables; pass `|k| std::env::var(k).ok()` in production.
///
/// # Errors
/// Returns `CliError::Config` when the result is unusable, e.g. the `command`
/// provider with no program.
pub fn resolve(
    file: Option<&FileConfig>,
    env: impl Fn(&str) -> Option<String>,
    overrides: &Overrides<'_>,
    command_temperature: f32,
) -> Result<Settings, CliError> {
    let default_file = FileConfig::default();
    let ai = &file.unwrap_or(&default_file).ai;
    let flags = overrides.provider.cloned().unwrap_or_default();

    let provider = match flags.provider {
        Some(p) => p,
        None => match env("KQL_AI_PROVIDER") {
            Some(name) => name
                .parse::<ProviderKind>()
                .map_err(|e| CliError::Config(format!("KQL_AI_PROVIDER: {e}")))?,
            None => ai.provider.unwrap_or_default(),
        },
    };

    let model = flags
        .model
        .or_else(|| env("KQL_AI_MODEL"))
        .or_else(|| ai.model.clone())
        .or_else(|| default_model(provider).map(str::to_string));

    let temperature = flags
        .temperature
        .or(ai.temperature)
        .unwrap_or(command_temperature);

    let server = match provider {
        ProviderKind::Ollama => &ai.ollama,
        ProviderKind::Instructlab => &ai.instructlab,
        ProviderKind::Openai | ProviderKind::Command => &ai.openai,
    };
    let endpoint = match provider {
        ProviderKind::Command => None,
        _ => flags
            .endpoint
            .or_else(|| env("KQL_AI_ENDPOINT"))
            .or_else(|| server.endpoint.clone())
            .or_else(|| default_endpoint(provider).map(str::to_string)),
    };
    let api_key = match provider {
        ProviderKind::Openai | ProviderKind::Instructlab => {
            env("KQL_OPENAI_API_KEY").or_else(|| server.api_key.clone())
        }
        _ => None,
    };

    let agent = match flags.agent_command.as_deref() {
        Some(line) => Some(CommandSpec::from_line(line)?),
        None => CommandSpec::from_file(&ai.agent),
    };
    if provider == ProviderKind::Command && agent.is_none() {
        return Err(CliError::Config(
            "the command provider needs --agent-command or ai.agent.program".to_string(),
        ));
    }

    let validator = match overrides.validator_command {
        Some(line) => Some(CommandSpec::from_line(line)?),
        None => CommandSpec::from_file(&ai.validator),
    };

    let timeout_secs = overrides
        .timeout
        .or(ai.timeout)
        .unwrap_or(DEFAULT_TIMEOUT_SECS);
    if timeout_secs == 0 {
        return Err(CliError::Config("timeout must be at least 1 second".to_string()));
    }

    let mut validation = ValidationConfig::default();
    apply_file(&mut validation, &ai.validation);
    apply_env(&mut validation, &env);
    if let Some(flags) = overrides.validation {
        apply_flags(&mut validation, flags);
    }

    Ok(Settings {
        provider,
        model,
        temperature,
        endpoint,
        api_key,
        agent,
        validator,
        timeout_secs,
        validation,
    })
}

const fn default_model(provider: ProviderKind) -> Option<&'static str> {
    match provider {
        ProviderKind::Ollama => Some(DEFAULT_OLLAMA_MODEL),
        ProviderKind::Instructlab => Some(DEFAULT_INSTRUCTLAB_MODEL),
        ProviderKind::Openai => Some(DEFAULT_OPENAI_MODEL),
        ProviderKind::Command => None,
    }
}

const fn default_endpoint(provider: ProviderKind) -> Option<&'static str> {
    match provider {
        ProviderKind::Ollama => Some(DEFAULT_OLLAMA_ENDPOINT),
        ProviderKind::Instructlab => Some(DEFAULT_INSTRUCTLAB_ENDPOINT),
        ProviderKind::Openai => Some(DEFAULT_OPENAI_ENDPOINT),
        ProviderKind::Command => None,
    }
}

fn apply_file(cfg: &mut ValidationConfig, v: &ValidationFileConfig) {
    if let Some(enabled) = v.enabled {
        cfg.enabled = enabled;
    }
    if let Some(strict) = v.strict {
        cfg.strict = strict;
    }
    if let Some(retries) = v.retries {
        cfg.retries = retries;
    }
    if let Some(errors) = v.feedback.errors {
        cfg.feedback.errors = errors;
    }
    if let Some(hints) = v.feedback.hints {
        cfg.feedback.hints = hints;
    }
    if let Some(examples) = v.feedback.examples {
        cfg.feedback.examples = examples;
    }
    if let Some(progressive) = v.feedback.progressive {
        cfg.feedback.progressive = progressive;
    }
    if let Some(adjust) = v.temperature.adjust {
        cfg.temperature.adjust = adjust;
    }
    if let Some(increment) = positive("validation.temperature.increment", v.temperature.increment) {
        cfg.temperature.increment = increment;
    }
    if let Some(max) = positive("validation.temperature.max", v.temperature.max) {
        cfg.temperature.max = max;
    }
}

/// Keeps only values above zero; anything else is ignored with a warning.
fn positive(name: &str, value: Option<f32>) -> Option<f32> {
    let value = value?;
    if value > 0.0 {
        Some(value)
    } else {
        tracing::warn!(setting = name, value, "ignoring non-positive value");
        None
    }
}

fn apply_env(cfg: &mut ValidationConfig, env: &impl Fn(&str) -> Option<String>) {
    if env_flag(env("KQL_VALIDATE"), &["false", "0"]) {
        cfg.enabled = false;
    }
    if env_flag(env("KQL_VALIDATE_STRICT"), &["true", "1"]) {
        cfg.strict = true;
    }
    if let Some(raw) = env("KQL_VALIDATE_RETRIES") {
        match raw.trim().parse::<usize>() {
            Ok(retries) => cfg.retries = retries,
            Err(_) => tracing::warn!(value = %raw, "ignoring invalid KQL_VALIDATE_RETRIES"),
        }
    }
}

fn apply_flags(cfg: &mut ValidationConfig, flags: &ValidationArgs) {
    if let Some(preset) = flags.preset {
        cfg.apply_preset(preset);
    }

    if flags.no_validate {
        cfg.enabled = false;
    }
    if flags.strict {
        cfg.strict = true;
    }
    if let Some(retries) = flags.retries {
        cfg.retries = retries;
    }

    if flags.no_feedback {
        cfg.feedback.errors = false;
        cfg.feedback.hints = false;
        cfg.feedback.examples = false;
        cfg.feedback.progressive = false;
    }
    if flags.no_feedback_errors {
        cfg.feedback.errors = false;
    }
    if flags.no_feedback_hints {
        cfg.feedback.hints = false;
    }
    if flags.no_feedback_examples {
        cfg.feedback.examples = false;
    }
    if flags.no_feedback_progressive {
        cfg.feedback.progressive = false;
    }

    if flags.no_retry_temp_adjust {
        cfg.temperature.adjust = false;
    }
    if let Some(increment) = positive("--retry-temp-increment", flags.retry_temp_increment) {
        cfg.temperature.increment = increment;
    }
    if let Some(max) = positive("--retry-temp-max", flags.retry_temp_max) {
        cfg.temperature.max = max;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kql_ai::generation::Preset;
    use std::collections::HashMap;
    use std::io::Write;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_defaults() {
        let s = resolve(None, no_env, &Overrides::default(), GENERATE_TEMPERATURE).unwrap();
        assert_eq!(s.provider, ProviderKind::Ollama);
        assert_eq!(s.model.as_deref(), Some("llama3.2"));
        assert_eq!(s.endpoint.as_deref(), Some("http://localhost:11434"));
        assert!((s.temperature - 0.2).abs() < f32::EPSILON);
        assert_eq!(s.timeout_secs, 60);
        assert_eq!(s.validation, ValidationConfig::default());
        assert!(s.validator.is_none());
    }

    #[test]
    fn test_instructlab_defaults() {
        let flags = ProviderArgs {
            provider: Some(ProviderKind::Instructlab),
            ..ProviderArgs::default()
        };
        let overrides = Overrides {
            provider: Some(&flags),
            ..Overrides::default()
        };
        let s = resolve(None, no_env, &overrides, FIX_TEMPERATURE).unwrap();
        assert_eq!(s.model.as_deref(), Some("default"));
        assert_eq!(s.endpoint.as_deref(), Some("http://localhost:8000"));
    }

    #[test]
    fn test_file_values_distinguish_false_from_absent() {
        let yaml = "
ai:
  provider: openai
  model: gpt-4o
  openai:
    endpoint: http://llm.internal:9000
    api_key: from-file
  validation:
    enabled: false
    retries: 4
    feedback:
      hints: false
    temperature:
      max: 0.9
";
        let file: FileConfig = serde_yaml::from_str(yaml).unwrap();
        let s = resolve(Some(&file), no_env, &Overrides::default(), GENERATE_TEMPERATURE).unwrap();

        assert_eq!(s.provider, ProviderKind::Openai);
        assert_eq!(s.model.as_deref(), Some("gpt-4o"));
        assert_eq!(s.endpoint.as_deref(), Some("http://llm.internal:9000"));
        assert_eq!(s.api_key.as_deref(), Some("from-file"));
        assert!(!s.validation.enabled);
        assert_eq!(s.validation.retries, 4);
        assert!(!s.validation.feedback.hints);
        assert!(s.validation.feedback.examples);
        assert!((s.validation.temperature.max - 0.9).abs() < f32::EPSILON);
    }

    #[test]
    fn test_env_overrides_file() {
        let file: FileConfig =
            serde_yaml::from_str("ai:\n  model: from-file\n  validation:\n    retries: 7\n").unwrap();
        let env = env_of(&[
            ("KQL_AI_MODEL", "from-env"),
            ("KQL_VALIDATE_RETRIES", "1"),
            ("KQL_VALIDATE_STRICT", "1"),
            ("KQL_VALIDATE", "false"),
        ]);
        let s = resolve(Some(&file), env, &Overrides::default(), GENERATE_TEMPERATURE).unwrap();
        assert_eq!(s.model.as_deref(), Some("from-env"));
        assert_eq!(s.validation.retries, 1);
        assert!(s.validation.strict);
        assert!(!s.validation.enabled);
    }

    #[test]
    fn test_invalid_env_retries_is_ignored() {
        let env = env_of(&[("KQL_VALIDATE_RETRIES", "lots"), ("KQL_VALIDATE", "yes")]);
        let s = resolve(None, env, &Overrides::default(), GENERATE_TEMPERATURE).unwrap();
        assert_eq!(s.validation.retries, 2);
        assert!(s.validation.enabled);
    }

    #[test]
    fn test_unknown_env_provider_is_an_error() {
        let env = env_of(&[("KQL_AI_PROVIDER", "vertex")]);
        let err = resolve(None, env, &Overrides::default(), GENERATE_TEMPERATURE).unwrap_err();
        assert!(matches!(err, CliError::Config(_)));
    }

    #[test]
    fn test_preset_then_explicit_flags() {
        let env = env_of(&[("KQL_VALIDATE_RETRIES", "9")]);
        let flags = ValidationArgs {
            preset: Some(Preset::Thorough),
            ..ValidationArgs::default()
        };
        let overrides = Overrides {
            validation: Some(&flags),
            ..Overrides::default()
        };
        let s = resolve(None, &env, &overrides, GENERATE_TEMPERATURE).unwrap();
        assert_eq!(s.validation.retries, 5);
        assert!(s.validation.feedback.progressive);

        let flags = ValidationArgs {
            preset: Some(Preset::Thorough),
            retries: Some(1),
            no_feedback_progressive: true,
            ..ValidationArgs::default()
        };
        let overrides = Overrides {
            validation: Some(&flags),
            ..Overrides::default()
        };
        let s = resolve(None, &env, &overrides, GENERATE_TEMPERATURE).unwrap();
        assert_eq!(s.validation.retries, 1);
        assert!(!s.validation.feedback.progressive);
    }

    #[test]
    fn test_no_feedback_clears_everything() {
        let flags = ValidationArgs {
            no_feedback: true,
            no_retry_temp_adjust: true,
            retry_temp_increment: Some(0.2),
            ..ValidationArgs::default()
        };
        let overrides = Overrides {
            validation: Some(&flags),
            ..Overrides::default()
        };
        let s = resolve(None, no_env, &overrides, GENERATE_TEMPERATURE).unwrap();
        let f = s.validation.feedback;
        assert!(!f.errors && !f.hints && !f.examples && !f.progressive);
        assert!(!s.validation.temperature.adjust);
        assert!((s.validation.temperature.increment - 0.2).abs() < f32::EPSILON);
    }

    #[test]
    fn test_non_positive_temperature_steps_are_ignored() {
        let defaults = ValidationConfig::default().temperature;

        let flags = ValidationArgs {
            retry_temp_increment: Some(-0.3),
            retry_temp_max: Some(0.0),
            ..ValidationArgs::default()
        };
        let overrides = Overrides {
            validation: Some(&flags),
            ..Overrides::default()
        };
        let s = resolve(None, no_env, &overrides, GENERATE_TEMPERATURE).unwrap();
        assert_eq!(s.validation.temperature, defaults);

        let file: FileConfig = serde_yaml::from_str(
            "ai:\n  validation:\n    temperature:\n      increment: -1.0\n      max: -0.5\n",
        )
        .unwrap();
        let s = resolve(Some(&file), no_env, &Overrides::default(), GENERATE_TEMPERATURE).unwrap();
        assert_eq!(s.validation.temperature, defaults);

        let temps: Vec<f32> = (1..=4)
            .map(|a| kql_ai::temperature::temperature(s.temperature, a, &s.validation.temperature))
            .collect();
        assert!(temps.windows(2).all(|w| w[1] >= w[0]), "{temps:?}");
        assert!(temps.iter().all(|t| *t >= 0.0));
    }

    #[test]
    fn test_command_provider_requires_program() {
        let flags = ProviderArgs {
            provider: Some(ProviderKind::Command),
            ..ProviderArgs::default()
        };
        let overrides = Overrides {
            provider: Some(&flags),
            ..Overrides::default()
        };
        assert!(resolve(None, no_env, &overrides, GENERATE_TEMPERATURE).is_err());

        let flags = ProviderArgs {
            provider: Some(ProviderKind::Command),
            agent_command: Some("llm -m {model}".to_string()),
            ..ProviderArgs::default()
        };
        let overrides = Overrides {
            provider: Some(&flags),
            validator_command: Some("kql-validate --name {source}"),
            ..Overrides::default()
        };
        let s = resolve(None, no_env, &overrides, GENERATE_TEMPERATURE).unwrap();
        let agent = s.agent.unwrap();
        assert_eq!(agent.program, "llm");
        assert_eq!(agent.args, vec!["-m", "{model}"]);
        assert!(s.model.is_none());
        assert!(s.endpoint.is_none());
        assert_eq!(s.validator.unwrap().program, "kql-validate");
    }

    #[test]
    fn test_flags_beat_file_temperature() {
        let file: FileConfig = serde_yaml::from_str("ai:\n  temperature: 0.7\n").unwrap();
        let s = resolve(Some(&file), no_env, &Overrides::default(), SUGGEST_TEMPERATURE).unwrap();
        assert!((s.temperature - 0.7).abs() < f32::EPSILON);

        let flags = ProviderArgs {
            temperature: Some(0.05),
            ..ProviderArgs::default()
        };
        let overrides = Overrides {
            provider: Some(&flags),
            ..Overrides::default()
        };
        let s = resolve(Some(&file), no_env, &overrides, SUGGEST_TEMPERATURE).unwrap();
        assert!((s.temperature - 0.05).abs() < f32::EPSILON);
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(load_file(&dir.path().join("missing.yaml")).unwrap(), None);

        let path = dir.path().join("config.yaml");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "ai:\n  provider: instructlab\n  validation:\n    strict: true").unwrap();
        let config = load_file(&path).unwrap().unwrap();
        assert_eq!(config.ai.provider, Some(ProviderKind::Instructlab));
        assert_eq!(config.ai.validation.strict, Some(true));

        std::fs::write(&path, "ai: [not, a, map]").unwrap();
        assert!(load_file(&path).is_err());
        assert!(load_or_warn(Some(&path)).is_none());
    }

    #[test]
    fn test_api_key_is_redacted() {
        let env = env_of(&[("KQL_OPENAI_API_KEY", "sk-secret")]);
        let flags = ProviderArgs {
            provider: Some(ProviderKind::Openai),
            ..ProviderArgs::default()
        };
        let overrides = Overrides {
            provider: Some(&flags),
            ..Overrides::default()
        };
        let s = resolve(None, env, &overrides, GENERATE_TEMPERATURE).unwrap();
        assert_eq!(s.api_key.as_deref(), Some("sk-secret"));
        let yaml = serde_yaml::to_string(&s).unwrap();
        assert!(!yaml.contains("sk-secret"));
        assert!(yaml.contains("********"));
    }
}
