//! Runtime configuration for the batch layer.
//!
//! [`BatchConfig`] names the directory holding batch files, the URL prefix
//! the front end is mounted under, and the size of the worker pool used for
//! projection. It is normally read from the environment:
//!
//! - `VIS_PICK_DATA`: directory of `*.json` batch files (required)
//! - `VIS_PICK_ROOT`: URL prefix for links (optional, default empty)
//!
//! ```no_run
//! use pa_batch::BatchConfig;
//!
//! let config = BatchConfig::from_env().expect("VIS_PICK_DATA must be set");
//! config.validate().expect("invalid configuration");
//! ```

use std::path::PathBuf;

use pa_align::EngineConfig;
use pa_core::PaError;

use crate::error::Result;

/// Environment variable naming the batch directory.
pub const DATA_DIR_ENV: &str = "VIS_PICK_DATA";
/// Environment variable holding the URL prefix.
pub const APP_ROOT_ENV: &str = "VIS_PICK_ROOT";

#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Directory scanned for `*.json` batch files.
    pub data_dir: PathBuf,
    /// URL prefix prepended to generated links.
    pub app_root: String,
    /// Number of rayon worker threads used for loading and projection.
    /// Default: `rayon::current_num_threads()`.
    pub worker_threads: usize,
}

impl BatchConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            app_root: String::new(),
            worker_threads: rayon::current_num_threads(),
        }
    }

    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through `lookup`, which maps a variable name
    /// to its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let data_dir = lookup(DATA_DIR_ENV)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| PaError::Config(format!("{DATA_DIR_ENV} is not set")))?;
        let mut config = Self::new(data_dir);
        config.app_root = lookup(APP_ROOT_ENV).unwrap_or_default();
        Ok(config)
    }

    /// Check that the data directory exists and the pool size is usable.
    pub fn validate(&self) -> Result<()> {
        if !self.data_dir.is_dir() {
            return Err(PaError::Config(format!(
                "data directory {} does not exist or is not a directory",
                self.data_dir.display()
            ))
            .into());
        }
        if self.worker_threads == 0 {
            return Err(PaError::Config("worker_threads must be at least 1".to_string()).into());
        }
        Ok(())
    }

    /// Engine settings derived from this configuration.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            worker_threads: self.worker_threads,
        }
    }

    /// Link to the batch listing page.
    pub fn batch_link(&self, file_name: &str) -> String {
        format!("{}/ann/{}", self.app_root, file_name)
    }

    /// Link to one document pair of a batch.
    pub fn document_link(&self, file_name: &str, index: usize) -> String {
        format!("{}/ann/{}/{}", self.app_root, file_name, index)
    }
}
