//! Tree locators: dot-segmented positions in the vocabulary hierarchy.
//!
//! A locator such as `D12.776.543` starts with a branch code (`D12`) followed
//! by increasingly specific segments. Depth is the number of segments, so
//! `D12` has depth 1 and `D12.776.543` has depth 3. A locator is inside a
//! prefix only on a segment boundary: `D12.776` contains `D12.776.543` but
//! not `D12.7761`.

/// Branch code of a locator (its first segment).
///
/// ```
/// use trialmoa_core::locator::branch;
/// assert_eq!(branch("D12.776.543"), "D12");
/// assert_eq!(branch("D27"), "D27");
/// ```
pub fn branch(locator: &str) -> &str {
    locator.split('.').next().unwrap_or(locator)
}

/// Number of dot-separated segments. Empty input has depth 0.
pub fn depth(locator: &str) -> usize {
    if locator.is_empty() {
        0
    } else {
        locator.split('.').count()
    }
}

/// True when `locator` equals `prefix` or descends from it.
pub fn is_within(locator: &str, prefix: &str) -> bool {
    if prefix.is_empty() {
        return false;
    }
    match locator.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('.'),
        None => false,
    }
}

/// Shape check used by the vocabulary parsers.
///
/// A well-formed locator has no empty segments and only ASCII
/// alphanumerics inside segments.
pub fn is_well_formed(locator: &str) -> bool {
    !locator.is_empty()
        && locator
            .split('.')
            .all(|seg| !seg.is_empty() && seg.bytes().all(|b| b.is_ascii_alphanumeric()))
}

/// Parent locator, or `None` for a top-level branch.
pub fn parent(locator: &str) -> Option<&str> {
    locator.rfind('.').map(|i| &locator[..i])
}
