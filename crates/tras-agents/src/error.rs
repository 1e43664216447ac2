use thiserror::Error;

/// Failure of a single provider call attempt.
///
/// Retryable variants are rate limits, timeouts and transient server or
/// network errors. Everything else points at misconfiguration and is
/// surfaced without retry.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    #[error("rate limited{}", .retry_after_secs.map(|s| format!(" (retry after {s}s)")).unwrap_or_default())]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("attempt timed out after {0} ms")]
    Timeout(u64),

    #[error("transient provider error: {0}")]
    Transient(String),

    #[error("model not found: {0}")]
    NotFound(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("provider disabled: {0}")]
    Disabled(String),
}

impl ProviderError {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProviderError::RateLimited { .. } | ProviderError::Timeout(_) | ProviderError::Transient(_)
        )
    }
}

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Invalid text pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Agent configuration error: {0}")]
    Config(String),
}
