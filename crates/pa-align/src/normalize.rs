//! Display-form normalization of raw document text and browser selections.
//!
//! Rules for [`to_display`], applied in this order:
//! - Any run of `\n` characters collapses to a single `\n`.
//! - Each italic marker `<i>` / `</i>` is replaced by one space.
//! - Any run of spaces collapses to a single space.
//!
//! Marker replacement can put two spaces next to each other, which is why
//! space collapsing runs last.
//!
//! Example:
//!   "Hello\n\n\nworld<i>!</i>" → "Hello\nworld ! "

const ITALIC_OPEN: &str = "<i>";
const ITALIC_CLOSE: &str = "</i>";

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Turn raw source text into the display form shown to annotators.
///
/// Character offsets into the returned string are the coordinate system for
/// every stored span and highlight. The output is never longer than the
/// input and re-applying the function is a no-op.
pub fn to_display(raw: &str) -> String {
    let collapsed = collapse_runs(raw, '\n');
    let unmarked = collapsed
        .replace(ITALIC_OPEN, " ")
        .replace(ITALIC_CLOSE, " ");
    collapse_runs(&unmarked, ' ')
}

/// Model the browser's selection-to-string conversion.
///
/// Every `\n` or `\r` becomes one space, one-for-one. Adjacent spaces are
/// left alone so character counts are unchanged.
pub fn to_selection_form(raw: &str) -> String {
    raw.chars()
        .map(|ch| if matches!(ch, '\n' | '\r') { ' ' } else { ch })
        .collect()
}

/// Lowercase `text` without changing its character count.
///
/// Characters whose lowercase form is more than one character (e.g. `İ`)
/// are kept unchanged so indices into the result are indices into `text`.
pub fn fold_case(text: &str) -> String {
    text.chars().map(fold_char).collect()
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Replace every run of `target` in `text` with a single `target`.
fn collapse_runs(text: &str, target: char) -> String {
    let mut out = String::with_capacity(text.len());
    let mut previous_was_target = false;
    for ch in text.chars() {
        if ch == target {
            if previous_was_target {
                continue;
            }
            previous_was_target = true;
        } else {
            previous_was_target = false;
        }
        out.push(ch);
    }
    out
}

fn fold_char(ch: char) -> char {
    let mut lower = ch.to_lowercase();
    match (lower.next(), lower.next()) {
        (Some(single), None) => single,
        _ => ch,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
