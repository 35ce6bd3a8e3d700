//! Text helpers: content-addressed identifiers and char-safe clipping.
//!
//! Content ids are a fixed-width SHA-256 prefix of the normalized text, so the same
//! topic written with different casing or spacing resolves to the same node or
//! truth entry. Two different texts that collide on the prefix are merged; this
//! is treated as deduplication.

use sha2::{Digest, Sha256};

/// Number of digest bytes kept in an id (16 hex characters).
pub const CONTENT_HASH_BYTES: usize = 8;

/// Normalize free text before hashing: trim, lowercase, collapse whitespace.
#[must_use]
pub fn normalize(text: &str) -> String {
    text.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Hex digest prefix of the normalized text.
#[must_use]
pub fn content_hash(text: &str) -> String {
    let digest = Sha256::digest(normalize(text).as_bytes());
    hex::encode(&digest[..CONTENT_HASH_BYTES])
}

/// Build a prefixed id such as `topic_3f2a...`.
#[must_use]
pub fn content_id(prefix: &str, text: &str) -> String {
    format!("{prefix}_{}", content_hash(text))
}

/// Keep at most `max_chars` characters of `text`.
#[must_use]
pub fn clip(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_text_same_id() {
        assert_eq!(
            content_id("topic", "Budget Review"),
            content_id("topic", "  budget   review ")
        );
    }

    #[test]
    fn test_different_text_different_id() {
        assert_ne!(
            content_id("topic", "budget review"),
            content_id("topic", "launch plan")
        );
    }

    #[test]
    fn test_id_shape() {
        let id = content_id("decision", "proceed with launch");
        assert!(id.starts_with("decision_"));
        assert_eq!(id.len(), "decision_".len() + CONTENT_HASH_BYTES * 2);
        assert!(id["decision_".len()..]
            .chars()
            .all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_content_hash_is_lowercase_digest_prefix() {
        // sha256("abc") = ba7816bf8f01cfea414140de5dae2223...
        assert_eq!(content_hash("  ABC "), "ba7816bf8f01cfea");
    }

    #[test]
    fn test_clip_is_char_safe() {
        assert_eq!(clip("héllo wörld", 4), "héll");
        assert_eq!(clip("short", 50), "short");
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  Hello\tWORLD \n"), "hello world");
        assert_eq!(normalize(""), "");
    }
}
