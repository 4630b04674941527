use serde::{Deserialize, Serialize};

use crate::error::{PaError, Result};

// ---------------------------------------------------------------------------
// Side
// ---------------------------------------------------------------------------

/// One of the two parallel documents in a pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    /// The first document (`d1_text`).
    Left,
    /// The second document (`d2_text`).
    Right,
}

impl Side {
    /// Label used for the selection half belonging to this side.
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Left => "seg1",
            Side::Right => "seg2",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

/// The pair of raw strings an annotator highlighted, one per document side.
///
/// Both halves are exactly what the browser's selection-to-string conversion
/// produced; no normalization has been applied yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub seg1: String,
    pub seg2: String,
}

impl Selection {
    pub fn new(seg1: impl Into<String>, seg2: impl Into<String>) -> Self {
        Self {
            seg1: seg1.into(),
            seg2: seg2.into(),
        }
    }

    /// Parse a stored annotation record of the form `"seg1\nseg2"`.
    ///
    /// Exactly one `\n` separator is accepted; any other part count is
    /// reported as [`PaError::InvalidInput`].
    pub fn parse(txt: &str) -> Result<Self> {
        let parts: Vec<&str> = txt.split('\n').collect();
        match parts.as_slice() {
            [seg1, seg2] => Ok(Self::new(*seg1, *seg2)),
            _ => Err(PaError::InvalidInput(format!(
                "annotation must hold two newline-separated segments, found {}",
                parts.len()
            ))),
        }
    }

    /// The half of the selection that belongs to `side`.
    pub fn get(&self, side: Side) -> &str {
        match side {
            Side::Left => &self.seg1,
            Side::Right => &self.seg2,
        }
    }
}

// ---------------------------------------------------------------------------
// MatchSpan
// ---------------------------------------------------------------------------

/// A selection resolved to display-text coordinates, or one of the two
/// sentinel outcomes.
///
/// On the wire a span is the pair `[offset, length]`; the sentinels keep
/// their historical encodings `[0, 0]` and `[1, 1]`. Decoding a pair is
/// therefore lossy for a genuine zero-length span at offset 0 or a one
/// character span at offset 1, which read back as sentinels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "(usize, usize)", from = "(usize, usize)")]
pub enum MatchSpan {
    /// Offset and length, in characters, within the display text.
    Found { offset: usize, length: usize },
    /// The sanitized selection does not occur in the sanitized display text.
    NotFound,
    /// The selection occurs in the canonical text but a boundary index has
    /// no entry in the correspondence map.
    IndexInconsistent,
}

impl MatchSpan {
    pub fn found(offset: usize, length: usize) -> Self {
        MatchSpan::Found { offset, length }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, MatchSpan::Found { .. })
    }

    /// `(offset, length)` of a resolved span; `None` for the sentinels.
    pub fn interval(&self) -> Option<(usize, usize)> {
        match *self {
            MatchSpan::Found { offset, length } => Some((offset, length)),
            _ => None,
        }
    }

    /// The pair encoding, sentinels included.
    pub fn as_pair(&self) -> (usize, usize) {
        match *self {
            MatchSpan::Found { offset, length } => (offset, length),
            MatchSpan::NotFound => (0, 0),
            MatchSpan::IndexInconsistent => (1, 1),
        }
    }

    /// Log label for this outcome.
    pub fn label(&self) -> &'static str {
        match self {
            MatchSpan::Found { .. } => "SUCCESS",
            MatchSpan::NotFound => "NOT FOUND",
            MatchSpan::IndexInconsistent => "INDEX WRONG",
        }
    }
}

impl From<MatchSpan> for (usize, usize) {
    fn from(span: MatchSpan) -> Self {
        span.as_pair()
    }
}

impl From<(usize, usize)> for MatchSpan {
    fn from(pair: (usize, usize)) -> Self {
        match pair {
            (0, 0) => MatchSpan::NotFound,
            (1, 1) => MatchSpan::IndexInconsistent,
            (offset, length) => MatchSpan::Found { offset, length },
        }
    }
}

// ---------------------------------------------------------------------------
// HighlightRun
// ---------------------------------------------------------------------------

/// A maximal run of display-text characters sharing one match depth.
///
/// `start` and `len` are in display-text characters; `text` is the run's
/// characters escaped for embedding in markup, so its length may exceed `len`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighlightRun {
    pub start: usize,
    pub len: usize,
    pub text: String,
    /// Length of the longest match covering this run; 0 when uncovered.
    pub depth: usize,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_parses_two_segments() {
        let sel = Selection::parse("Minulla on asia.\nI have a thing.").unwrap();
        assert_eq!(sel.seg1, "Minulla on asia.");
        assert_eq!(sel.seg2, "I have a thing.");
        assert_eq!(sel.get(Side::Left), "Minulla on asia.");
        assert_eq!(sel.get(Side::Right), "I have a thing.");
    }

    #[test]
    fn selection_keeps_empty_halves() {
        let sel = Selection::parse("\nonly right").unwrap();
        assert_eq!(sel.seg1, "");
        assert_eq!(sel.seg2, "only right");
    }

    #[test]
    fn selection_rejects_wrong_part_count() {
        assert!(matches!(
            Selection::parse("no separator"),
            Err(PaError::InvalidInput(_))
        ));
        assert!(matches!(
            Selection::parse("a\nb\nc"),
            Err(PaError::InvalidInput(_))
        ));
    }

    #[test]
    fn sentinel_pairs_are_distinct() {
        assert_eq!(MatchSpan::NotFound.as_pair(), (0, 0));
        assert_eq!(MatchSpan::IndexInconsistent.as_pair(), (1, 1));
        assert_ne!(MatchSpan::NotFound, MatchSpan::IndexInconsistent);
        assert_eq!(MatchSpan::NotFound.label(), "NOT FOUND");
        assert_eq!(MatchSpan::IndexInconsistent.label(), "INDEX WRONG");
    }

    #[test]
    fn match_span_serializes_as_pair() {
        assert_eq!(
            serde_json::to_string(&MatchSpan::found(12, 7)).unwrap(),
            "[12,7]"
        );
        assert_eq!(serde_json::to_string(&MatchSpan::NotFound).unwrap(), "[0,0]");
        assert_eq!(
            serde_json::to_string(&MatchSpan::IndexInconsistent).unwrap(),
            "[1,1]"
        );
    }

    #[test]
    fn match_span_decodes_sentinels() {
        let spans: Vec<MatchSpan> = serde_json::from_str("[[0,0],[1,1],[4,2]]").unwrap();
        assert_eq!(
            spans,
            vec![
                MatchSpan::NotFound,
                MatchSpan::IndexInconsistent,
                MatchSpan::found(4, 2)
            ]
        );
    }

    #[test]
    fn interval_only_for_found_spans() {
        assert_eq!(MatchSpan::found(3, 4).interval(), Some((3, 4)));
        assert_eq!(MatchSpan::NotFound.interval(), None);
        assert_eq!(MatchSpan::IndexInconsistent.interval(), None);
    }

    #[test]
    fn side_serializes_to_snake_case() {
        assert_eq!(serde_json::to_string(&Side::Left).unwrap(), "\"left\"");
        assert_eq!(Side::Right.to_string(), "seg2");
    }
}
