//! The text-generation boundary.

use async_trait::async_trait;
use thiserror::Error;

/// Transport-level failures from a provider. All of them abort a run.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider could not be reached.
    #[error("transport error: {0}")]
    Transport(String),

    /// The provider answered with a non-success status.
    #[error("provider returned status {status}: {body}")]
    Status {
        /// Status code.
        status: u16,
        /// Response body, as text.
        body: String,
    },

    /// The response arrived but could not be understood.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// A subprocess-backed provider failed.
    #[error("process error: {0}")]
    Process(String),
}

/// A text-generation service.
///
/// Implementations must be safe to share between concurrent runs.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Short identifier, e.g. `ollama`.
    fn name(&self) -> &str;

    /// Model in use.
    fn model(&self) -> &str;

    /// Sends `prompt` and returns the raw model output.
    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String, ProviderError>;
}

#[async_trait]
impl<P: Provider + ?Sized> Provider for std::sync::Arc<P> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn model(&self) -> &str {
        (**self).model()
    }

    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String, ProviderError> {
        (**self).complete(prompt, temperature).await
    }
}
