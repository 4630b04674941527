//! Projection result types handed to the batch layer and the FFI.
//!
//! These types are serialized to JSON for the FFI surface and for stored
//! annotation records, so field names are part of the contract.

use serde::{Deserialize, Serialize};

use pa_core::{MatchSpan, Side};

use crate::spans::MergedSpans;

// ---------------------------------------------------------------------------
// MappedAnnotation
// ---------------------------------------------------------------------------

/// One annotation resolved on both document sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappedAnnotation {
    pub left: MatchSpan,
    pub right: MatchSpan,
}

impl MappedAnnotation {
    pub fn get(&self, side: Side) -> MatchSpan {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }
}

// ---------------------------------------------------------------------------
// ProjectionStats
// ---------------------------------------------------------------------------

/// Outcome counts over every span of a pair (two per annotation).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectionStats {
    pub found: usize,
    pub not_found: usize,
    pub index_inconsistent: usize,
}

impl ProjectionStats {
    /// Tally the outcomes of `annotations`.
    pub fn from_annotations(annotations: &[MappedAnnotation]) -> Self {
        let mut stats = Self::default();
        for span in annotations.iter().flat_map(|a| [a.left, a.right]) {
            match span {
                MatchSpan::Found { .. } => stats.found += 1,
                MatchSpan::NotFound => stats.not_found += 1,
                MatchSpan::IndexInconsistent => stats.index_inconsistent += 1,
            }
        }
        stats
    }

    pub fn failed(&self) -> usize {
        self.not_found + self.index_inconsistent
    }
}

// ---------------------------------------------------------------------------
// PairResult / RenderedSide / RenderedPair
// ---------------------------------------------------------------------------

/// The projection of one document pair.
///
/// `d1_text` / `d2_text` are the display texts; every span in
/// `annotations` is in their character coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairResult {
    pub d1_text: String,
    pub d2_text: String,
    pub annotations: Vec<MappedAnnotation>,
    pub stats: ProjectionStats,
}

impl PairResult {
    pub fn text(&self, side: Side) -> &str {
        match side {
            Side::Left => &self.d1_text,
            Side::Right => &self.d2_text,
        }
    }

    /// Resolved spans of `side`, sentinels included, in annotation order.
    pub fn spans(&self, side: Side) -> Vec<MatchSpan> {
        self.annotations.iter().map(|a| a.get(side)).collect()
    }
}

/// Highlight runs for one display text plus its depth range.
pub type RenderedSide = MergedSpans;

/// Highlight runs for both sides of a pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedPair {
    pub left: RenderedSide,
    pub right: RenderedSide,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn make_result() -> PairResult {
        let annotations = vec![
            MappedAnnotation {
                left: MatchSpan::found(0, 5),
                right: MatchSpan::found(3, 4),
            },
            MappedAnnotation {
                left: MatchSpan::NotFound,
                right: MatchSpan::IndexInconsistent,
            },
        ];
        let stats = ProjectionStats::from_annotations(&annotations);
        PairResult {
            d1_text: "Hei maailma".to_string(),
            d2_text: "Hello world".to_string(),
            annotations,
            stats,
        }
    }

    #[test]
    fn stats_tally_both_sides() {
        let result = make_result();
        assert_eq!(result.stats.found, 2);
        assert_eq!(result.stats.not_found, 1);
        assert_eq!(result.stats.index_inconsistent, 1);
        assert_eq!(result.stats.failed(), 2);
    }

    #[test]
    fn pair_result_round_trips_json() {
        let result = make_result();
        let json = serde_json::to_string(&result).expect("serialize");
        assert!(json.contains("\"annotations\":[{\"left\":[0,5],\"right\":[3,4]}"));
        let restored: PairResult = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(restored, result);
    }

    #[test]
    fn spans_are_per_side() {
        let result = make_result();
        assert_eq!(
            result.spans(Side::Right),
            vec![MatchSpan::found(3, 4), MatchSpan::IndexInconsistent]
        );
        assert_eq!(result.text(Side::Left), "Hei maailma");
    }

    #[test]
    fn empty_stats_serialize() {
        let json = serde_json::to_string(&ProjectionStats::default()).expect("serialize");
        assert_eq!(json, r#"{"found":0,"not_found":0,"index_inconsistent":0}"#);
    }
}
