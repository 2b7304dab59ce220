//! Error types for the Anthropic client.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnthropicError {
    /// Missing or invalid configuration (e.g. no API key)
    #[error("configuration error: {0}")]
    Config(String),

    /// Network failure while talking to the API
    #[error("network error: {0}")]
    Network(String),

    /// The API rejected the key (HTTP 401/403)
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The API throttled the request (HTTP 429)
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// Any other non-success response from the API
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// Response body did not match the expected shape
    #[error("failed to parse API response: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, AnthropicError>;
