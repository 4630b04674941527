//! In-memory cache of the batch directory.
//!
//! Every `*.json` file in the data directory is loaded once and kept with
//! the SHA-256 of the bytes it was parsed from. [`BatchCache::rescan`]
//! re-reads the directory listing and only reparses files whose content
//! digest changed; unchanged batches are reused as-is and vanished files are
//! dropped. Loading runs on the engine's rayon pool.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{error, info};

use pa_align::AlignEngine;
use pa_core::content_digest;

use crate::batch::{Batch, BatchSummary};
use crate::config::BatchConfig;
use crate::error::{BatchError, Result};

/// Where a cached batch came from and what its bytes hashed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileIdentity {
    pub path: PathBuf,
    pub digest: String,
}

/// What a rescan did, by file name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RescanReport {
    pub loaded: Vec<String>,
    pub reused: Vec<String>,
    pub removed: Vec<String>,
    pub failed: Vec<String>,
}

impl RescanReport {
    pub fn is_unchanged(&self) -> bool {
        self.loaded.is_empty() && self.removed.is_empty() && self.failed.is_empty()
    }
}

#[derive(Debug)]
struct CacheEntry {
    identity: FileIdentity,
    batch: Arc<Batch>,
}

/// Loaded batches keyed by file name.
pub struct BatchCache {
    config: BatchConfig,
    engine: AlignEngine,
    entries: BTreeMap<String, CacheEntry>,
}

impl BatchCache {
    /// Validate `config`, build the engine and load every batch file.
    pub fn open(config: BatchConfig) -> Result<Self> {
        config.validate()?;
        let engine = AlignEngine::new(config.engine_config())?;
        let mut cache = Self {
            config,
            engine,
            entries: BTreeMap::new(),
        };
        let report = cache.rescan()?;
        info!(
            dir = %cache.config.data_dir.display(),
            batches = cache.entries.len(),
            failed = report.failed.len(),
            "batch cache opened"
        );
        Ok(cache)
    }

    /// Bring the cache in line with the directory contents.
    ///
    /// A file that fails to read or parse is dropped from the cache and
    /// listed under `failed`; the other files are unaffected.
    pub fn rescan(&mut self) -> Result<RescanReport> {
        let files = list_batch_files(&self.config.data_dir)?;
        let mut report = RescanReport::default();

        // Read and hash everything first; parsing is only needed on change.
        let engine = &self.engine;
        let entries = &self.entries;
        let scanned: Vec<(String, Scan)> = engine.install(|| {
            files
                .par_iter()
                .map(|(name, path)| {
                    let scan = scan_file(path, entries.get(name), engine);
                    (name.clone(), scan)
                })
                .collect()
        });

        let mut next = BTreeMap::new();
        for (name, scan) in scanned {
            match scan {
                Scan::Unchanged => {
                    if let Some(entry) = self.entries.remove(&name) {
                        report.reused.push(name.clone());
                        next.insert(name, entry);
                    }
                }
                Scan::Loaded(entry) => {
                    report.loaded.push(name.clone());
                    next.insert(name, entry);
                }
                Scan::Failed(err) => {
                    error!(file = %name, error = %err, "failed to load batch");
                    report.failed.push(name);
                }
            }
        }
        report.removed = self
            .entries
            .keys()
            .filter(|name| !report.failed.contains(name))
            .cloned()
            .collect();
        self.entries = next;

        if !report.is_unchanged() {
            info!(
                loaded = report.loaded.len(),
                reused = report.reused.len(),
                removed = report.removed.len(),
                failed = report.failed.len(),
                "batch directory rescanned"
            );
        }
        Ok(report)
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    pub fn engine(&self) -> &AlignEngine {
        &self.engine
    }

    /// Batch loaded from `file_name`.
    pub fn get(&self, file_name: &str) -> Result<Arc<Batch>> {
        self.entries
            .get(file_name)
            .map(|e| Arc::clone(&e.batch))
            .ok_or_else(|| BatchError::UnknownBatch(file_name.to_string()))
    }

    pub fn identity(&self, file_name: &str) -> Option<&FileIdentity> {
        self.entries.get(file_name).map(|e| &e.identity)
    }

    /// All batches in file name order.
    pub fn batches(&self) -> impl Iterator<Item = &Arc<Batch>> + '_ {
        self.entries.values().map(|e| &e.batch)
    }

    /// Index rows for every batch in file name order.
    pub fn summaries(&self) -> Vec<BatchSummary> {
        self.batches().map(|b| b.summary()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

enum Scan {
    Unchanged,
    Loaded(CacheEntry),
    Failed(BatchError),
}

fn scan_file(path: &Path, cached: Option<&CacheEntry>, engine: &AlignEngine) -> Scan {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(source) => {
            return Scan::Failed(BatchError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    let digest = content_digest(&bytes);
    if cached.is_some_and(|entry| entry.identity.digest == digest) {
        return Scan::Unchanged;
    }
    match Batch::from_slice(path, &bytes, engine) {
        Ok(batch) => Scan::Loaded(CacheEntry {
            identity: FileIdentity {
                path: path.to_path_buf(),
                digest,
            },
            batch: Arc::new(batch),
        }),
        Err(err) => Scan::Failed(err),
    }
}

/// `(file name, path)` of every `*.json` file directly under `dir`, sorted.
fn list_batch_files(dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    let read_err = |source| BatchError::Read {
        path: dir.to_path_buf(),
        source,
    };
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(read_err)? {
        let path = entry.map_err(read_err)?.path();
        if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            files.push((name.to_string(), path.clone()));
        }
    }
    files.sort();
    Ok(files)
}
