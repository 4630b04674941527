pub mod batch;
pub mod cache;
pub mod config;
pub mod error;

pub use batch::{AnnoStats, Batch, BatchSummary, DocumentView, PairPreview};
pub use cache::{BatchCache, FileIdentity, RescanReport};
pub use config::BatchConfig;
pub use error::{BatchError, Result};
