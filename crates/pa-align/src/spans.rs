//! Merge possibly overlapping match intervals into highlight runs.
//!
//! Each character of the base string gets a depth: the length of the
//! longest match interval covering it, or 0 when uncovered. This is not an
//! overlap count: a character under a 3-character match and a 7-character
//! match has depth 7. Consecutive characters of equal depth are grouped into
//! one [`HighlightRun`], so the runs partition the base string and no two
//! neighbouring runs share a depth.

use serde::{Deserialize, Serialize};

use pa_core::HighlightRun;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Span Merger output for one document side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedSpans {
    /// Ordered runs covering the base string exactly once.
    pub runs: Vec<HighlightRun>,
    /// Smallest depth over all characters; 0 unless every character is covered.
    pub min_depth: usize,
    /// Largest depth over all characters.
    pub max_depth: usize,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Build highlight runs for `base` from `(offset, length)` match intervals.
///
/// Offsets and lengths count characters. Intervals are clipped to the base;
/// anything outside it is ignored.
pub fn merge_spans(base: &str, matches: &[(usize, usize)]) -> MergedSpans {
    let chars: Vec<char> = base.chars().collect();
    let depths = depth_profile(chars.len(), matches);

    let min_depth = depths.iter().copied().min().unwrap_or(0);
    let max_depth = depths.iter().copied().max().unwrap_or(0);

    MergedSpans {
        runs: group_runs(&chars, &depths),
        min_depth,
        max_depth,
    }
}

/// Escape the characters that are unsafe inside HTML text or attributes.
pub fn escape_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        push_escaped(&mut out, ch);
    }
    out
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Per-character depth: the longest covering interval length.
fn depth_profile(len: usize, matches: &[(usize, usize)]) -> Vec<usize> {
    let mut depths = vec![0usize; len];
    for &(offset, length) in matches {
        let start = offset.min(len);
        let end = offset.saturating_add(length).min(len);
        for depth in &mut depths[start..end] {
            *depth = (*depth).max(length);
        }
    }
    depths
}

/// Group consecutive characters of equal depth into runs.
fn group_runs(chars: &[char], depths: &[usize]) -> Vec<HighlightRun> {
    let mut runs: Vec<HighlightRun> = Vec::new();

    for (idx, (&ch, &depth)) in chars.iter().zip(depths).enumerate() {
        match runs.last_mut() {
            Some(last) if last.depth == depth => {
                push_escaped(&mut last.text, ch);
                last.len += 1;
            }
            _ => {
                let mut text = String::new();
                push_escaped(&mut text, ch);
                runs.push(HighlightRun {
                    start: idx,
                    len: 1,
                    text,
                    depth,
                });
            }
        }
    }

    runs
}

fn push_escaped(out: &mut String, ch: char) {
    match ch {
        '&' => out.push_str("&amp;"),
        '<' => out.push_str("&lt;"),
        '>' => out.push_str("&gt;"),
        '"' => out.push_str("&quot;"),
        '\'' => out.push_str("&#x27;"),
        other => out.push(other),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
