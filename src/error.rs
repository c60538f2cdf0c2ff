use thiserror::Error;

/// Failures reading one of the two status sources.
///
/// These never leave the resolver; they only decide whether a tick produced a reading.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("status source not rendered yet: {source_name}")]
    NotRendered { source_name: &'static str },
    #[error("status source read failed: {message}")]
    ReadFailed { message: String },
}

/// Errors from the persisted warp-list document.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Persist failed for {path}: {reason}")]
    PersistFailed { path: String, reason: String },
}

/// Errors from the JSON-lines session feed.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Feed IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum EndBroodError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Feed(#[from] FeedError),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid type '{0}'. Use 'brood' or 'prot'")]
    UnknownEntity(String),
}
