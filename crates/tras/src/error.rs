use thiserror::Error;
use tras_agents::AgentError;
use tras_store::StoreError;

#[derive(Error, Debug)]
pub enum TrasError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Agent error: {0}")]
    Agent(#[from] AgentError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure to fetch source documents. The cycle is skipped either way;
/// the split only decides how loudly it is logged.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("document folder unavailable: {0}")]
    Io(#[from] std::io::Error),

    #[error("no documents matching {0:?} or the fallback pattern")]
    NoDocuments(String),

    #[error("unreadable document {name}: {detail}")]
    Unreadable { name: String, detail: String },
}

impl SourceError {
    /// Whether the next scheduled run might succeed without intervention.
    pub fn is_retryable(&self) -> bool {
        match self {
            SourceError::Io(e) => !matches!(
                e.kind(),
                std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied
            ),
            SourceError::NoDocuments(_) => true,
            SourceError::Unreadable { .. } => false,
        }
    }
}
