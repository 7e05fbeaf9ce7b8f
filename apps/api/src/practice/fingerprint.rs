//! Content fingerprints for duplicate-question detection within a session.

use sha2::{Digest, Sha256};

/// Lowercases, collapses whitespace runs to single spaces, trims.
pub fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Hex SHA-256 of the normalized text.
pub fn fingerprint(text: &str) -> String {
    sha256_hex(&normalize(text))
}

/// Fingerprint of an MCQ stem together with its options, so the same stem
/// with different options is a distinct item.
pub fn mcq_fingerprint<S: AsRef<str>>(question: &str, options: &[S]) -> String {
    let options = options
        .iter()
        .map(|o| normalize(o.as_ref()))
        .collect::<Vec<_>>()
        .join("|");
    sha256_hex(&format!("{}||{}", normalize(question), options))
}

fn sha256_hex(input: &str) -> String {
    format!("{:x}", Sha256::digest(input.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_collapses_whitespace_and_case() {
        assert_eq!(normalize("  What IS\ta\n\n JOIN? "), "what is a join?");
    }

    #[test]
    fn test_fingerprint_ignores_case_and_spacing() {
        let a = fingerprint("Explain   the difference between INNER and LEFT joins.");
        let b = fingerprint("explain the difference\nbetween inner and left joins.");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_fingerprint_is_stable() {
        // sha256("abc")
        assert_eq!(
            fingerprint("ABC"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_mcq_fingerprint_depends_on_options() {
        let q = "Which join keeps unmatched left rows?";
        let a = mcq_fingerprint(q, &["INNER", "LEFT", "CROSS", "SELF"]);
        let b = mcq_fingerprint(q, &["inner", " left ", "cross", "self"]);
        let c = mcq_fingerprint(q, &["INNER", "RIGHT", "CROSS", "SELF"]);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, fingerprint(q));
    }
}
