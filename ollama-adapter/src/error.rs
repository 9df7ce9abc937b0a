//! Error types for HTTP chat clients.

use thiserror::Error;

/// Failures talking to a chat endpoint.
#[derive(Debug, Error)]
pub enum HttpError {
    /// The request could not be sent or the body could not be read.
    #[error("sending request to {endpoint}: {source}")]
    Transport {
        /// Endpoint URL.
        endpoint: String,
        /// Underlying client error.
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status.
    #[error("{provider} returned status {status}: {body}")]
    HttpStatus {
        /// Provider name.
        provider: &'static str,
        /// Status code.
        status: u16,
        /// Response body.
        body: String,
    },

    /// The response body was not the expected shape.
    #[error("decoding response: {0}")]
    Decode(String),
}
