//! Deterministic label → node id normalization.
//!
//! Trim, lowercase, collapse internal whitespace, and — if the result is a single
//! ASCII-alphabetic word with >= 4 characters — singularize it.

use crate::types::NodeId;

/// Normalize a raw label into a stable node id. Idempotent: applying this twice is the
/// same as applying it once.
pub fn normalize_id(label: &str) -> NodeId {
    let trimmed = label.trim();
    let lowered = trimmed.to_lowercase();
    let collapsed = collapse_whitespace(&lowered);
    let singular = maybe_singularize(&collapsed);
    NodeId::from(singular)
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_single_ascii_word(s: &str) -> bool {
    s.len() >= 4 && s.chars().all(|c| c.is_ascii_alphabetic())
}

/// Singularize a single ASCII word:
/// `*ies -> *y`; `*ches|*shes|*xes|*ses|*zes -> drop 'es'`; `*ss -> unchanged`;
/// trailing `s -> drop`.
fn maybe_singularize(word: &str) -> String {
    if !is_single_ascii_word(word) {
        return word.to_string();
    }
    singularize(word)
}

fn singularize(word: &str) -> String {
    if word.ends_with("ies") && word.len() > 3 {
        return format!("{}y", &word[..word.len() - 3]);
    }
    for suffix in ["ches", "shes", "xes", "ses", "zes"] {
        if word.ends_with(suffix) {
            return word[..word.len() - 2].to_string();
        }
    }
    if word.ends_with("ss") {
        return word.to_string();
    }
    if let Some(stripped) = word.strip_suffix('s') {
        return stripped.to_string();
    }
    word.to_string()
}
