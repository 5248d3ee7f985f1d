use thiserror::Error;

/// Failure talking to the remote image feed. Always recovered by the aggregator.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to image feed failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("image feed returned unexpected status {0}")]
    Status(u16),

    #[error("failed to parse image feed response: {0}")]
    Parse(String),
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("preference store error: {0}")]
    Persistence(String),

    #[error("stored custom sources are malformed: {0}")]
    CorruptSources(String),

    #[error("a custom source with id `{0}` already exists")]
    DuplicateSource(String),

    #[error("{0}")]
    InvalidSource(String),

    #[error("No wallpapers available")]
    NoWallpapers,
}

impl ProviderError {
    pub(crate) fn persistence(err: impl std::fmt::Display) -> Self {
        ProviderError::Persistence(err.to_string())
    }
}

pub type Result<T, E = ProviderError> = std::result::Result<T, E>;
