//! Term normalisation for vocabulary lookups.
//!
//! Converts free-text term strings (e.g., "Antibodies, Monoclonal",
//! "  Programmed Cell Death 1  Receptor") into a canonical lookup key so that
//! index keys and query strings compare equal regardless of case, spacing,
//! or punctuation.
//!
//! # Rules
//!
//! - Lowercase (Unicode-aware)
//! - Punctuation and symbols act as separators: "PD-1" and "PD 1" share a key
//! - Runs of whitespace collapse to a single space
//! - Leading and trailing whitespace is dropped
//!
//! Letters and digits from any script are kept as-is, so "β-Lactams"
//! normalises to "β lactams".

/// Normalise a term string into its lookup key.
///
/// Input: "Antibodies, Monoclonal"
/// Output: "antibodies monoclonal"
pub fn normalize_term(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut pending_space = false;

    for c in s.chars() {
        if c.is_alphanumeric() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.extend(c.to_lowercase());
        } else {
            // Whitespace, punctuation and symbols all separate words.
            pending_space = true;
        }
    }

    out
}
