use thiserror::Error;
use tras_models::Instrument;

/// Live price lookup failure. Always skipped for the current poll.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PriceError {
    #[error("{0} is not quotable by this feed")]
    Unsupported(Instrument),

    #[error("no rate for {0} in the latest quote")]
    Missing(Instrument),

    #[error("price feed error: {0}")]
    Feed(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum NotifyError {
    #[error("sink not configured: {0}")]
    NotConfigured(String),

    #[error("sink rejected the message: {0}")]
    Rejected(String),

    #[error("transport error: {0}")]
    Transport(String),
}

impl NotifyError {
    /// Only transport failures are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, NotifyError::Transport(_))
    }
}
