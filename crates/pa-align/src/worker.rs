//! Per-pair projection engine using rayon across annotations.
//!
//! [`PreparedText`] holds the derived data of one document side (display
//! text, canonical haystack, correspondence map), computed once when the
//! pair is loaded. [`AlignEngine::process_pair`] prepares both sides and
//! resolves every selection against them, in parallel, preserving input
//! order in the output.

use rayon::prelude::*;
use tracing::debug;

use pa_core::{MatchSpan, PaError, Result, Selection, Side};

use crate::align::{build_map, CorrespondenceMap};
use crate::locate::locate;
use crate::normalize::{fold_case, to_display, to_selection_form};
use crate::result::{MappedAnnotation, PairResult, ProjectionStats, RenderedPair, RenderedSide};
use crate::sanitize::sanitize;
use crate::spans::merge_spans;

// ---------------------------------------------------------------------------
// PreparedText
// ---------------------------------------------------------------------------

/// Derived search data for one document side. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedText {
    display: String,
    canonical: String,
    map: CorrespondenceMap,
}

impl PreparedText {
    /// Normalize `raw` and derive its canonical haystack and map.
    pub fn new(raw: &str) -> Self {
        Self::from_display(to_display(raw))
    }

    /// Derive the canonical haystack and map for an existing display text.
    pub fn from_display(display: String) -> Self {
        let canonical = sanitize(&to_selection_form(&display));
        let map = build_map(&fold_case(&display), &canonical);
        Self {
            display,
            canonical,
            map,
        }
    }

    pub fn display(&self) -> &str {
        &self.display
    }

    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    pub fn map(&self) -> &CorrespondenceMap {
        &self.map
    }

    /// Resolve one selection half against this side.
    pub fn locate(&self, selection: &str) -> MatchSpan {
        locate(selection, &self.canonical, &self.map)
    }

    /// Highlight runs for the resolved spans; sentinels are skipped.
    pub fn render(&self, spans: &[MatchSpan]) -> RenderedSide {
        render_display(&self.display, spans)
    }

    pub fn into_display(self) -> String {
        self.display
    }
}

// ---------------------------------------------------------------------------
// EngineConfig
// ---------------------------------------------------------------------------

/// Runtime configuration for the projection engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Number of rayon worker threads to use.
    /// Default: `rayon::current_num_threads()`.
    pub worker_threads: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            worker_threads: rayon::current_num_threads(),
        }
    }
}

// ---------------------------------------------------------------------------
// AlignEngine
// ---------------------------------------------------------------------------

/// Deterministic, parallel projection engine.
///
/// Call [`AlignEngine::process_pair`] with the raw texts of a document pair
/// and its stored selections to get a [`PairResult`].
pub struct AlignEngine {
    config: EngineConfig,
    /// Dedicated pool when the configured size differs from the global one.
    pool: Option<rayon::ThreadPool>,
}

impl AlignEngine {
    /// Create a new engine with the given configuration.
    pub fn new(config: EngineConfig) -> Result<Self> {
        if config.worker_threads == 0 {
            return Err(PaError::Config("worker_threads must be at least 1".to_string()));
        }
        let pool = if config.worker_threads == rayon::current_num_threads() {
            None
        } else {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(config.worker_threads)
                .build()
                .map_err(|e| PaError::Config(e.to_string()))?;
            Some(pool)
        };
        Ok(Self { config, pool })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Project every selection of one document pair.
    ///
    /// # Steps
    /// 1. Prepare both sides (display text, canonical haystack, map).
    /// 2. Resolve each selection half on its side, in parallel.
    /// 3. Tally the outcomes.
    pub fn process_pair(&self, raw_d1: &str, raw_d2: &str, selections: &[Selection]) -> PairResult {
        let left = PreparedText::new(raw_d1);
        let right = PreparedText::new(raw_d2);
        self.process_prepared(left, right, selections)
    }

    /// Like [`AlignEngine::process_pair`] for sides that are already prepared.
    pub fn process_prepared(
        &self,
        left: PreparedText,
        right: PreparedText,
        selections: &[Selection],
    ) -> PairResult {
        let annotations = self.install(|| {
            selections
                .par_iter()
                .map(|sel| MappedAnnotation {
                    left: left.locate(sel.get(Side::Left)),
                    right: right.locate(sel.get(Side::Right)),
                })
                .collect::<Vec<_>>()
        });

        let stats = ProjectionStats::from_annotations(&annotations);
        debug!(
            annotations = annotations.len(),
            found = stats.found,
            not_found = stats.not_found,
            index_inconsistent = stats.index_inconsistent,
            "pair projected"
        );

        PairResult {
            d1_text: left.into_display(),
            d2_text: right.into_display(),
            annotations,
            stats,
        }
    }

    /// Highlight runs for one display text from its resolved spans.
    pub fn render(&self, display: &str, spans: &[MatchSpan]) -> RenderedSide {
        render_display(display, spans)
    }

    /// Highlight runs for both sides of a projected pair.
    pub fn render_pair(&self, pair: &PairResult) -> RenderedPair {
        let (left, right) = self.install(|| {
            rayon::join(
                || render_display(&pair.d1_text, &pair.spans(Side::Left)),
                || render_display(&pair.d2_text, &pair.spans(Side::Right)),
            )
        });
        RenderedPair { left, right }
    }

    /// Run `op` inside this engine's thread pool.
    pub fn install<R: Send>(&self, op: impl FnOnce() -> R + Send) -> R {
        match &self.pool {
            Some(pool) => pool.install(op),
            None => op(),
        }
    }
}

impl Default for AlignEngine {
    fn default() -> Self {
        Self {
            config: EngineConfig::default(),
            pool: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn render_display(display: &str, spans: &[MatchSpan]) -> RenderedSide {
    let intervals: Vec<(usize, usize)> = spans.iter().filter_map(MatchSpan::interval).collect();
    merge_spans(display, &intervals)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
