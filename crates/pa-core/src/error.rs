use thiserror::Error;

/// Top-level error type for the pa-core crate and dependents.
///
/// The alignment pipeline itself never fails; these variants cover the
/// loading, parsing and configuration work that surrounds it.
#[derive(Debug, Error)]
pub enum PaError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Convenience Result alias used across the workspace.
pub type Result<T> = std::result::Result<T, PaError>;
