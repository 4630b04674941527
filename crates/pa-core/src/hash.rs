use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 of `input`.
pub fn sha256_hex(input: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input);
    format!("{:x}", hasher.finalize())
}

/// Content digest of a batch file.
///
/// Two reads of the same file produce the same digest, so a cache can tell
/// an untouched file from a rewritten one regardless of its mtime.
pub fn content_digest(bytes: &[u8]) -> String {
    sha256_hex(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_hex_known_vector() {
        // SHA-256("") = e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855
        let digest = sha256_hex(b"");
        assert_eq!(
            digest,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn content_digest_is_deterministic() {
        let bytes = br#"[{"d1_text": "a", "d2_text": "b"}]"#;
        assert_eq!(content_digest(bytes), content_digest(bytes));
    }

    #[test]
    fn content_digest_differs_on_different_input() {
        assert_ne!(content_digest(b"foo"), content_digest(b"bar"));
    }
}
