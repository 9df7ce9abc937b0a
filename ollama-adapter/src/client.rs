//! Chat clients.

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::HttpError;
use crate::types::{
    ChatMessage, OllamaChatRequest, OllamaChatResponse, OllamaOptions, OpenAiChatRequest,
    OpenAiChatResponse,
};

/// Default Ollama server.
pub const DEFAULT_OLLAMA_ENDPOINT: &str = "http://localhost:11434";
/// Default Ollama model.
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3.2";
/// Default InstructLab server.
pub const DEFAULT_INSTRUCTLAB_ENDPOINT: &str = "http://localhost:8000";
/// Default InstructLab model.
pub const DEFAULT_INSTRUCTLAB_MODEL: &str = "default";
/// Default per-request deadline.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

fn normalize(endpoint: &str) -> String {
    endpoint.trim_end_matches('/').to_string()
}

async fn post_json<B, R>(
    client: &Client,
    provider: &'static str,
    url: &str,
    bearer: Option<&str>,
    timeout: Duration,
    body: &B,
) -> Result<R, HttpError>
where
    B: Serialize + Sync,
    R: DeserializeOwned,
{
    tracing::debug!(provider, url, "posting chat request");

    let mut request = client.post(url).timeout(timeout).json(body);
    if let Some(key) = bearer {
        request = request.bearer_auth(key);
    }

    let response = request.send().await.map_err(|source| HttpError::Transport {
        endpoint: url.to_string(),
        source,
    })?;

    let status = response.status();
    let text = response.text().await.map_err(|source| HttpError::Transport {
        endpoint: url.to_string(),
        source,
    })?;

    if !status.is_success() {
        return Err(HttpError::HttpStatus {
            provider,
            status: status.as_u16(),
            body: text,
        });
    }

    serde_json::from_str(&text).map_err(|e| HttpError::Decode(e.to_string()))
}

/// Client for Ollama's native chat API.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: Client,
    endpoint: String,
    model: String,
    timeout: Duration,
}

impl Default for OllamaClient {
    fn default() -> Self {
        Self::new(DEFAULT_OLLAMA_ENDPOINT, DEFAULT_OLLAMA_MODEL)
    }
}

impl OllamaClient {
    /// Creates a client. A trailing `/` on the endpoint is ignored.
    #[must_use]
    pub fn new(endpoint: &str, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: normalize(endpoint),
            model: model.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Sets the per-request deadline.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Model in use.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Endpoint without trailing slash.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Request body for one prompt.
    #[must_use]
    pub fn request_body(&self, prompt: &str, temperature: f32) -> OllamaChatRequest<'_> {
        OllamaChatRequest {
            model: &self.model,
            messages: vec![ChatMessage::user(prompt)],
            stream: false,
            options: OllamaOptions { temperature },
        }
    }

    /// Sends one user message and returns the reply text.
    ///
    /// # Errors
    /// Returns [`HttpError`] on transport failure, non-2xx status, or an undecodable body.
    pub async fn chat(&self, prompt: &str, temperature: f32) -> Result<String, HttpError> {
        let url = format!("{}/api/chat", self.endpoint);
        let body = self.request_body(prompt, temperature);
        let response: OllamaChatResponse =
            post_json(&self.client, "ollama", &url, None, self.timeout, &body).await?;
        Ok(response.message.content)
    }
}

/// Client for OpenAI-compatible chat completions (OpenAI, InstructLab, vLLM, llama.cpp).
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: Client,
    provider: &'static str,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl OpenAiClient {
    /// Creates a client. `provider` names it in errors and logs.
    #[must_use]
    pub fn new(provider: &'static str, endpoint: &str, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            provider,
            endpoint: normalize(endpoint),
            model: model.into(),
            api_key: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// InstructLab defaults.
    #[must_use]
    pub fn instructlab() -> Self {
        Self::new("instructlab", DEFAULT_INSTRUCTLAB_ENDPOINT, DEFAULT_INSTRUCTLAB_MODEL)
    }

    /// Sends `Authorization: Bearer <key>` with every request.
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the per-request deadline.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Provider name.
    #[must_use]
    pub const fn provider(&self) -> &'static str {
        self.provider
    }

    /// Model in use.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Endpoint without trailing slash.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Request body for one prompt.
    #[must_use]
    pub fn request_body(&self, prompt: &str, temperature: f32) -> OpenAiChatRequest<'_> {
        OpenAiChatRequest {
            model: &self.model,
            messages: vec![ChatMessage::user(prompt)],
            temperature,
        }
    }

    /// Sends one user message and returns the first choice's text.
    ///
    /// # Errors
    /// Returns [`HttpError`] on transport failure, non-2xx status, an undecodable
    /// body, or a response with no choices.
    pub async fn chat(&self, prompt: &str, temperature: f32) -> Result<String, HttpError> {
        let url = format!("{}/v1/chat/completions", self.endpoint);
        let body = self.request_body(prompt, temperature);
        let response: OpenAiChatResponse = post_json(
            &self.client,
            self.provider,
            &url,
            self.api_key.as_deref(),
            self.timeout,
            &body,
        )
        .await?;

        response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| HttpError::Decode("no choices in response".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_endpoint_trailing_slash_is_trimmed() {
        assert_eq!(OllamaClient::new("http://host:11434/", "m").endpoint(), "http://host:11434");
        assert_eq!(OpenAiClient::new("x", "http://h:8000//", "m").endpoint(), "http://h:8000");
    }

    #[test]
    fn test_ollama_body_shape() {
        let client = OllamaClient::default();
        let body = serde_json::to_value(client.request_body("hi", 0.25)).unwrap();
        assert_eq!(
            body,
            json!({
                "model": "llama3.2",
                "messages": [{"role": "user", "content": "hi"}],
                "stream": false,
                "options": {"temperature": 0.25}
            })
        );
    }

    #[test]
    fn test_openai_body_shape() {
        let client = OpenAiClient::instructlab();
        let body = serde_json::to_value(client.request_body("hi", 0.5)).unwrap();
        assert_eq!(
            body,
            json!({
                "model": "default",
                "messages": [{"role": "user", "content": "hi"}],
                "temperature": 0.5
            })
        );
    }

    #[test]
    fn test_response_decoding() {
        let ollama: OllamaChatResponse = serde_json::from_str(
            r#"{"model":"llama3.2","message":{"role":"assistant","content":"T | count"},"done":true}"#,
        )
        .unwrap();
        assert_eq!(ollama.message.content, "T | count");

        let openai: OpenAiChatResponse = serde_json::from_str(
            r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"T"}}]}"#,
        )
        .unwrap();
        assert_eq!(openai.choices[0].message.content, "T");

        let empty: OpenAiChatResponse = serde_json::from_str(r#"{"id":"x"}"#).unwrap();
        assert!(empty.choices.is_empty());
    }
}
