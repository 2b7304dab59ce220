//! Error types for the generation pipeline.
//!
//! Uses `thiserror` for library errors (not `anyhow`). Each variant maps
//! to a [`Severity`] which tells the batch worker whether to stop, pause,
//! or move straight on to the next keyword.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenerationError {
    /// The text service rejected our credentials
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The text service throttled the request
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// The style guide could not be read; nothing can run without it
    #[error("style guide load failed: {0}")]
    StyleGuide(#[source] std::io::Error),

    /// Input rejected before any work started
    #[error("{0}")]
    Validation(String),

    /// Text service failure other than auth or throttling
    #[error("generation service error: {0}")]
    Service(String),

    /// Filesystem failure while reading samples or writing output
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// How a failure affects the batch that hit it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Stop the whole batch; remaining keywords are not attempted
    BatchFatal,
    /// Skip the current keyword, pause before the next one
    RecoverableDelayed,
    /// Skip the current keyword, continue immediately
    RecoverableImmediate,
    /// Rejected synchronously, no worker was started
    Validation,
}

impl GenerationError {
    /// Classify this error for the batch loop.
    pub fn severity(&self) -> Severity {
        match self {
            GenerationError::Auth(_) | GenerationError::StyleGuide(_) => Severity::BatchFatal,
            GenerationError::RateLimited(_) => Severity::RecoverableDelayed,
            GenerationError::Validation(_) => Severity::Validation,
            GenerationError::Service(_) | GenerationError::Io(_) => Severity::RecoverableImmediate,
        }
    }
}

pub type Result<T> = std::result::Result<T, GenerationError>;
