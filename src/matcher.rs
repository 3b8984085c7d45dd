//! Fuzzy header-name matching.
//!
//! Two names match when they are equal after trimming and lower-casing, or
//! when one is the other with a single trailing `s`. Nothing more elaborate
//! than that is attempted.

/// Resolves `candidate` against `possibilities`, returning the index of the
/// first entry that matches.
///
/// Checks run in order: exact case-insensitive match, then the singular form
/// (when the candidate ends in `s`) or the plural form (when it does not).
/// An empty candidate never matches.
pub fn match_header<S: AsRef<str>>(candidate: &str, possibilities: &[S]) -> Option<usize> {
    let text = normalize(candidate);
    if text.is_empty() {
        return None;
    }
    let normalized: Vec<String> = possibilities
        .iter()
        .map(|possibility| normalize(possibility.as_ref()))
        .collect();

    if let Some(idx) = position_of(&normalized, &text) {
        return Some(idx);
    }
    match text.strip_suffix('s') {
        Some(singular) => position_of(&normalized, singular),
        None => position_of(&normalized, &format!("{text}s")),
    }
}

fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

fn position_of(normalized: &[String], needle: &str) -> Option<usize> {
    normalized.iter().position(|entry| entry == needle)
}
