use std::path::PathBuf;

use thiserror::Error;

use pa_core::PaError;

/// Errors raised while loading, caching or querying annotation batches.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error(transparent)]
    Core(#[from] PaError),

    #[error("failed to read batch file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse batch file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("unknown batch file: {0}")]
    UnknownBatch(String),

    #[error("segment {index} out of range for batch {batch} ({len} segments)")]
    SegmentOutOfRange {
        batch: String,
        index: usize,
        len: usize,
    },
}

/// Convenience Result alias for the batch layer.
pub type Result<T> = std::result::Result<T, BatchError>;
