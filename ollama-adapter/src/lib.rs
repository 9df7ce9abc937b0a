//! HTTP chat clients for locally hosted models.
//!
//! - [`OllamaClient`] speaks Ollama's `/api/chat`.
//! - [`OpenAiClient`] speaks `/v1/chat/completions`, which InstructLab, vLLM and
//!   the llama.cpp server all implement.

pub mod client;
pub mod error;
pub mod types;

pub use client::{
    OllamaClient, OpenAiClient, DEFAULT_INSTRUCTLAB_ENDPOINT, DEFAULT_INSTRUCTLAB_MODEL,
    DEFAULT_OLLAMA_ENDPOINT, DEFAULT_OLLAMA_MODEL, DEFAULT_TIMEOUT,
};
pub use error::HttpError;
pub use types::ChatMessage;
