//! Canonical search form shared by haystack and needle.
//!
//! Only ASCII letters, ASCII digits, `ä`/`ö`/`å` (either case) and the plain
//! space survive. The result is trimmed of surrounding spaces and lowercased.
//! Punctuation, tag residue and OCR noise are not meaningful for locating a
//! span, so they never take part in substring search.

/// Reduce `text` to its canonical comparison form.
///
/// Both sides of a search must go through this function; comparing a
/// sanitized string against an unsanitized one is a bug.
pub fn sanitize(text: &str) -> String {
    let kept: String = text.chars().filter(|&ch| is_canonical(ch)).collect();
    kept.trim_matches(' ').to_lowercase()
}

/// Return `true` if `ch` belongs to the canonical alphabet.
pub fn is_canonical(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == ' ' || matches!(ch, 'ä' | 'ö' | 'å' | 'Ä' | 'Ö' | 'Å')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_punctuation_and_lowercases() {
        assert_eq!(sanitize("Hello, World!"), "hello world");
    }

    #[test]
    fn keeps_nordic_letters() {
        assert_eq!(sanitize("Älä jätä Åsaa yksin."), "älä jätä åsaa yksin");
    }

    #[test]
    fn drops_other_accented_letters() {
        assert_eq!(sanitize("café über"), "caf ber");
    }

    #[test]
    fn trims_only_after_filtering() {
        // The leading dash goes first, exposing the space that is then trimmed.
        assert_eq!(sanitize("- Moi -"), "moi");
    }

    #[test]
    fn keeps_inner_space_runs() {
        assert_eq!(sanitize("a - b"), "a  b");
    }

    #[test]
    fn newlines_and_tabs_are_removed() {
        assert_eq!(sanitize("a\nb\tc"), "abc");
    }

    #[test]
    fn sanitize_is_a_fixpoint() {
        let inputs = ["", "  ", "Mitä?! 123 <i>x</i>", "ÅÄÖ", " a  b ", "¿Qué?"];
        for input in inputs {
            let once = sanitize(input);
            assert_eq!(sanitize(&once), once, "input {:?}", input);
        }
    }

    #[test]
    fn empty_and_symbol_only_inputs() {
        assert_eq!(sanitize(""), "");
        assert_eq!(sanitize("?!..."), "");
    }
}
