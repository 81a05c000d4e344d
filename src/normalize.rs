//! Identifier normalization.
//!
//! Circular numbers are written inconsistently across documents
//! (`SEBI/HO/ABC/2024/5`, `SEBI HO ABC 2024 5`, `sebi/ho/abc/2024/5.`). All
//! identity comparisons in the crate go through [`normalize`]; the looser
//! [`contains_either`] check is reserved for fuzzy matching.

/// Prefix of the sentinel canonical identifier assigned to documents whose
/// own identifier could not be extracted.
pub const UNKNOWN_PREFIX: &str = "UNKNOWN_";

/// Turns a raw identifier into its comparison key: every character that is
/// not an ASCII letter or digit is dropped and the rest is upper-cased.
///
/// Total and idempotent.
pub fn normalize(raw: &str) -> String {
    raw.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Containment check on already-normalized keys: `a` is a substring of `b`
/// or vice versa.
///
/// Empty keys never match, since the empty string is contained in everything.
pub fn contains_either(a: &str, b: &str) -> bool {
    if a.is_empty() || b.is_empty() {
        return false;
    }
    a.contains(b) || b.contains(a)
}

/// Key used for case- and whitespace-insensitive lookups of raw identifiers
/// (the reverse reference index). Punctuation is preserved.
pub fn fold_key(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect()
}

/// Builds the sentinel canonical identifier for a document with an unknown
/// identifier.
pub fn unknown_identifier(document_id: &str) -> String {
    format!("{UNKNOWN_PREFIX}{document_id}")
}

/// Returns `canonical`, or the sentinel for `document_id` when the
/// identifier is blank, literally "Unknown", or has no letters or digits.
pub fn canonical_or_sentinel(canonical: &str, document_id: &str) -> String {
    let trimmed = canonical.trim();
    if trimmed.eq_ignore_ascii_case("unknown") || normalize(trimmed).is_empty() {
        unknown_identifier(document_id)
    } else {
        trimmed.to_string()
    }
}

/// Returns `true` if `canonical` is the sentinel assigned to `document_id`.
pub fn is_unknown_identifier(canonical: &str, document_id: &str) -> bool {
    canonical
        .strip_prefix(UNKNOWN_PREFIX)
        .is_some_and(|rest| rest == document_id)
}
