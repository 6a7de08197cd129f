use thiserror::Error;

pub type PregelResult<T> = Result<T, PregelError>;

#[derive(Debug, Error)]
pub enum PregelError {
    /// The shard mapping could not resolve a shard the vertex depends on.
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("document not found: {shard}/{key}")]
    DocumentNotFound { shard: String, key: String },

    #[error("invalid document: {0}")]
    InvalidDocument(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}
