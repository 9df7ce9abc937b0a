//! Providers backed by local model servers.

use async_trait::async_trait;
use kql_ai::{Provider, ProviderError};
use ollama_adapter::{HttpError, OllamaClient, OpenAiClient};

fn provider_error(e: HttpError) -> ProviderError {
    match e {
        HttpError::Transport { endpoint, source } => {
            ProviderError::Transport(format!("{endpoint}: {source}"))
        }
        HttpError::HttpStatus { status, body, .. } => ProviderError::Status { status, body },
        HttpError::Decode(msg) => ProviderError::InvalidResponse(msg),
    }
}

/// Ollama `/api/chat`.
#[derive(Debug, Clone)]
pub struct OllamaProvider {
    client: OllamaClient,
}

impl OllamaProvider {
    /// Wraps a configured client.
    #[must_use]
    pub const fn new(client: OllamaClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Provider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        self.client.model()
    }

    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String, ProviderError> {
        self.client
            .chat(prompt, temperature)
            .await
            .map_err(provider_error)
    }
}

/// Any `/v1/chat/completions` server, including InstructLab.
#[derive(Debug, Clone)]
pub struct OpenAiProvider {
    client: OpenAiClient,
}

impl OpenAiProvider {
    /// Wraps a configured client.
    #[must_use]
    pub const fn new(client: OpenAiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    fn name(&self) -> &str {
        self.client.provider()
    }

    fn model(&self) -> &str {
        self.client.model()
    }

    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String, ProviderError> {
        self.client
            .chat(prompt, temperature)
            .await
            .map_err(provider_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_keeps_code_and_body() {
        let e = provider_error(HttpError::HttpStatus {
            provider: "ollama",
            status: 404,
            body: "model not found".to_string(),
        });
        assert!(matches!(e, ProviderError::Status { status: 404, ref body } if body == "model not found"));
    }

    #[test]
    fn test_decode_is_invalid_response() {
        let e = provider_error(HttpError::Decode("no choices in response".to_string()));
        assert_eq!(e.to_string(), "invalid response: no choices in response");
    }

    #[test]
    fn test_names() {
        let p = OllamaProvider::new(OllamaClient::default());
        assert_eq!(p.name(), "ollama");
        assert_eq!(p.model(), "llama3.2");

        let p = OpenAiProvider::new(OpenAiClient::instructlab());
        assert_eq!(p.name(), "instructlab");
        assert_eq!(p.model(), "default");
    }
}
