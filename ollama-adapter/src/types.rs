//! Wire types for the two chat APIs.

use serde::{Deserialize, Serialize};

/// One chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// `user`, `assistant` or `system`.
    pub role: String,
    /// Message text.
    pub content: String,
}

impl ChatMessage {
    /// A user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Body of `POST /api/chat`.
#[derive(Debug, Clone, Serialize)]
pub struct OllamaChatRequest<'a> {
    /// Model name.
    pub model: &'a str,
    /// Conversation.
    pub messages: Vec<ChatMessage>,
    /// Always false; the whole reply is read at once.
    pub stream: bool,
    /// Sampling options.
    pub options: OllamaOptions,
}

/// Ollama sampling options.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct OllamaOptions {
    /// Sampling temperature.
    pub temperature: f32,
}

/// Body returned by `POST /api/chat`.
#[derive(Debug, Clone, Deserialize)]
pub struct OllamaChatResponse {
    /// The reply.
    pub message: ChatMessage,
}

/// Body of `POST /v1/chat/completions`.
#[derive(Debug, Clone, Serialize)]
pub struct OpenAiChatRequest<'a> {
    /// Model name.
    pub model: &'a str,
    /// Conversation.
    pub messages: Vec<ChatMessage>,
    /// Sampling temperature.
    pub temperature: f32,
}

/// Body returned by `POST /v1/chat/completions`.
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiChatResponse {
    /// Candidate replies; the first is used.
    #[serde(default)]
    pub choices: Vec<OpenAiChoice>,
}

/// One candidate reply.
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiChoice {
    /// The reply.
    pub message: ChatMessage,
}
