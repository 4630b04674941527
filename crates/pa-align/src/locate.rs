//! Projection of a user selection back onto display-text offsets.
//!
//! The selection is sanitized, found in the canonical haystack (leftmost
//! occurrence wins; there is no disambiguation between repeats), and its
//! start and one-past-end boundaries are translated through the
//! [`CorrespondenceMap`]. A missing boundary key is reported as
//! [`MatchSpan::IndexInconsistent`] instead of being coerced to an offset.

use pa_core::MatchSpan;

use crate::align::CorrespondenceMap;
use crate::normalize::to_selection_form;
use crate::sanitize::sanitize;

/// Resolve `selection` against `canonical_haystack` and `map`.
///
/// The selection is put through the browser's selection form before it is
/// sanitized, which is a no-op for text that already came from a browser.
/// `canonical_haystack` must be the sanitized form the map was built for.
pub fn locate(selection: &str, canonical_haystack: &str, map: &CorrespondenceMap) -> MatchSpan {
    let needle = sanitize(&to_selection_form(selection));

    let Some(a_start) = find_chars(canonical_haystack, &needle) else {
        return MatchSpan::NotFound;
    };
    let a_end = a_start + needle.chars().count();

    match (map.get(a_start), map.get(a_end)) {
        (Some(start), Some(end)) => MatchSpan::found(start, end - start),
        _ => MatchSpan::IndexInconsistent,
    }
}

/// Character index of the first occurrence of `needle` in `haystack`.
fn find_chars(haystack: &str, needle: &str) -> Option<usize> {
    haystack
        .find(needle)
        .map(|byte_pos| haystack[..byte_pos].chars().count())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::build_map;
    use crate::normalize::{fold_case, to_display};

    struct Prepared {
        display: String,
        canonical: String,
        map: CorrespondenceMap,
    }

    fn prepare(raw: &str) -> Prepared {
        let display = to_display(raw);
        let canonical = sanitize(&to_selection_form(&display));
        let map = build_map(&fold_case(&display), &canonical);
        Prepared {
            display,
            canonical,
            map,
        }
    }

    fn slice(text: &str, span: MatchSpan) -> String {
        let (offset, length) = span.interval().expect("resolved span");
        text.chars().skip(offset).take(length).collect()
    }

    #[test]
    fn not_found_sentinel() {
        let map = build_map("abcdef", "abcdef");
        assert_eq!(locate("xyz", "abcdef", &map), MatchSpan::NotFound);
    }

    #[test]
    fn resolves_selection_with_punctuation() {
        let doc = prepare("Hei, mitä kuuluu? Hyvää kiitos.");
        let span = locate("Mitä kuuluu?", &doc.canonical, &doc.map);
        // The trailing '?' is not part of the canonical match.
        assert_eq!(span, MatchSpan::found(5, 11));
        assert_eq!(slice(&doc.display, span), "mitä kuuluu");
    }

    #[test]
    fn selection_across_line_break() {
        let doc = prepare("First line\n\nsecond line and more");
        // The browser turns the newline into a space.
        let span = locate("line\nsecond", &doc.canonical, &doc.map);
        assert_eq!(slice(&doc.display, span), "line\nsecond");
    }

    #[test]
    fn selection_over_italic_marker() {
        let doc = prepare("Se oli <i>todella</i> hyvä juttu");
        let span = locate("todella hyvä", &doc.canonical, &doc.map);
        assert!(span.is_found());
        assert_eq!(sanitize(&slice(&doc.display, span)), "todella hyvä");
    }

    #[test]
    fn selection_ending_at_text_end_is_index_inconsistent() {
        // The one-past-end boundary of the canonical text has no key.
        let doc = prepare("Hello, World!");
        assert_eq!(
            locate("World", &doc.canonical, &doc.map),
            MatchSpan::IndexInconsistent
        );
    }

    #[test]
    fn truncated_map_is_index_inconsistent() {
        let map = build_map("ab", "abcd");
        assert_eq!(locate("a", "abcd", &map), MatchSpan::found(0, 1));
        assert_eq!(locate("bc", "abcd", &map), MatchSpan::IndexInconsistent);
    }

    #[test]
    fn leftmost_occurrence_wins() {
        let doc = prepare("no no, ei ei. no no, ei ei. loppu");
        let first = locate("no no", &doc.canonical, &doc.map);
        assert_eq!(first, MatchSpan::found(0, 5));
        for _ in 0..5 {
            assert_eq!(locate("no no", &doc.canonical, &doc.map), first);
        }
    }

    #[test]
    fn round_trip_through_display() {
        let doc = prepare("\"Voi ei!\" hän sanoi.\n\n<i>Mitä nyt?</i> Ei mitään.\nHei sitten");
        let selections = [
            "Voi ei!",
            "hän sanoi.",
            "sanoi.\n Mitä",
            "Mitä nyt? Ei",
            "mitään.\nHei",
        ];
        let canon = |text: &str| sanitize(&to_selection_form(text));
        for sel in selections {
            let span = locate(sel, &doc.canonical, &doc.map);
            assert!(span.is_found(), "selection {:?} gave {:?}", sel, span);
            assert_eq!(canon(&slice(&doc.display, span)), canon(sel));
        }
    }

    #[test]
    fn offsets_count_characters() {
        let doc = prepare("Äiti ja isä, kotona");
        let span = locate("isä", &doc.canonical, &doc.map);
        assert_eq!(span, MatchSpan::found(8, 3));
        assert_eq!(slice(&doc.display, span), "isä");
    }

    #[test]
    fn empty_selection_projects_to_start() {
        let doc = prepare("...abc def");
        assert_eq!(locate("", &doc.canonical, &doc.map), MatchSpan::found(3, 0));
    }

    #[test]
    fn empty_haystack() {
        let map = build_map("", "");
        assert_eq!(locate("x", "", &map), MatchSpan::NotFound);
        assert_eq!(locate("", "", &map), MatchSpan::IndexInconsistent);
    }
}
