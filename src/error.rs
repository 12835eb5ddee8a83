use thiserror::Error;

/// Errors produced anywhere in the engine, from request validation through
/// storage and codec failures.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("region is malformed: {0}")]
    BadRequest(String),

    #[error("no data found for key range {0}")]
    NotFound(String),

    #[error("store operation failed: {0}")]
    Store(String),

    #[error("codec error: {0}")]
    Codec(String),

    #[error("unsupported operation: {0}")]
    Unsupported(String),

    #[error("invariant violated: {0}")]
    Invariant(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
