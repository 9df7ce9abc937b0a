//! Adapters from the HTTP clients and external programs to the provider and validator traits.

use std::path::PathBuf;
use std::sync::Arc;

use command_adapter::{discover_program, CommandConfig, ExternalCommand};
use kql_ai::{LexicalValidator, Provider, ValidationMode, Validator};
use ollama_adapter::{
    OllamaClient, OpenAiClient, DEFAULT_INSTRUCTLAB_ENDPOINT, DEFAULT_OLLAMA_ENDPOINT,
};

use crate::cli::ProviderKind;
use crate::errors::CliError;
use crate::settings::{CommandSpec, Settings, DEFAULT_OPENAI_ENDPOINT};

/// External program backends.
pub mod command;
/// HTTP backends.
pub mod http;

pub use command::{CommandProvider, CommandValidator};
pub use http::{OllamaProvider, OpenAiProvider};

/// Builds the provider the settings select.
///
/// # Errors
/// Returns `CliError::Command` when the agent program cannot be found and
/// `CliError::Config` when the `command` provider has no program.
pub fn build_provider(settings: &Settings) -> Result<Arc<dyn Provider>, CliError> {
    let model = settings.model.clone().unwrap_or_default();
    let provider: Arc<dyn Provider> = match settings.provider {
        ProviderKind::Ollama => {
            let endpoint = settings.endpoint.as_deref().unwrap_or(DEFAULT_OLLAMA_ENDPOINT);
            Arc::new(OllamaProvider::new(
                OllamaClient::new(endpoint, model).with_timeout(settings.timeout()),
            ))
        }
        ProviderKind::Openai | ProviderKind::Instructlab => {
            let (name, fallback) = if settings.provider == ProviderKind::Openai {
                ("openai", DEFAULT_OPENAI_ENDPOINT)
            } else {
                ("instructlab", DEFAULT_INSTRUCTLAB_ENDPOINT)
            };
            let endpoint = settings.endpoint.as_deref().unwrap_or(fallback);
            let mut client = OpenAiClient::new(name, endpoint, model).with_timeout(settings.timeout());
            if let Some(key) = &settings.api_key {
                client = client.with_api_key(key.clone());
            }
            Arc::new(OpenAiProvider::new(client))
        }
        ProviderKind::Command => {
            let spec = settings.agent.as_ref().ok_or_else(|| {
                CliError::Config("the command provider needs --agent-command".to_string())
            })?;
            let command = resolve_command(spec, settings, true)?;
            Arc::new(CommandProvider::new(command, settings.model.clone()))
        }
    };
    tracing::debug!(provider = provider.name(), model = provider.model(), "provider ready");
    Ok(provider)
}

/// Builds the configured validator, or the built-in lexical checks.
///
/// `mode` only reaches external validators; the lexical checks have one depth.
///
/// # Errors
/// Returns `CliError::Command` when the validator program cannot be found.
pub fn build_validator(
    settings: &Settings,
    mode: ValidationMode,
) -> Result<Arc<dyn Validator>, CliError> {
    match &settings.validator {
        Some(spec) => {
            let command = resolve_command(spec, settings, false)?;
            tracing::debug!(
                program = %command.path.display(),
                mode = mode.as_str(),
                "using external validator"
            );
            Ok(Arc::new(CommandValidator::new(command).with_mode(mode)))
        }
        None => Ok(Arc::new(LexicalValidator)),
    }
}

/// A bare agent name may be overridden by `KQL_AGENT_BIN`; paths and validators are used as given.
fn resolve_command(
    spec: &CommandSpec,
    settings: &Settings,
    agent: bool,
) -> Result<ExternalCommand, CliError> {
    let program = PathBuf::from(&spec.program);
    let explicit = (!agent || program.components().count() > 1).then_some(program);
    let path = discover_program(explicit, &spec.program)?;
    let config = CommandConfig {
        timeout: settings.timeout(),
        ..CommandConfig::default()
    };
    Ok(ExternalCommand::new(path, spec.args.clone()).with_config(config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::ProviderArgs;
    use crate::settings::{resolve, Overrides, GENERATE_TEMPERATURE};

    fn settings_for(flags: &ProviderArgs, validator: Option<&str>) -> Settings {
        let overrides = Overrides {
            provider: Some(flags),
            validator_command: validator,
            ..Overrides::default()
        };
        resolve(None, |_| None, &overrides, GENERATE_TEMPERATURE).unwrap()
    }

    #[test]
    fn test_http_providers() {
        let s = settings_for(&ProviderArgs::default(), None);
        let p = build_provider(&s).unwrap();
        assert_eq!((p.name(), p.model()), ("ollama", "llama3.2"));

        let flags = ProviderArgs {
            provider: Some(ProviderKind::Openai),
            model: Some("gpt-4o".to_string()),
            ..ProviderArgs::default()
        };
        let p = build_provider(&settings_for(&flags, None)).unwrap();
        assert_eq!((p.name(), p.model()), ("openai", "gpt-4o"));
    }

    #[tokio::test]
    async fn test_lexical_validator_is_the_fallback() {
        let v = build_validator(
            &settings_for(&ProviderArgs::default(), None),
            ValidationMode::Semantic,
        )
        .unwrap();
        assert!(v.validate("q", "T | take 1").await.unwrap().is_empty());
        assert_eq!(v.validate("q", "T |").await.unwrap().len(), 1);
    }

    #[test]
    fn test_missing_programs() {
        let flags = ProviderArgs {
            provider: Some(ProviderKind::Command),
            agent_command: Some("/nonexistent/agent --fast".to_string()),
            ..ProviderArgs::default()
        };
        let built = build_provider(&settings_for(&flags, None));
        assert!(matches!(built, Err(CliError::Command(_))));

        let s = settings_for(&ProviderArgs::default(), Some("/nonexistent/validate"));
        let built = build_validator(&s, ValidationMode::Syntax);
        assert!(matches!(built, Err(CliError::Command(_))));
    }
}
