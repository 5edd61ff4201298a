//! Source key normalization.

use once_cell::sync::Lazy;
use regex::Regex;

static ACRONYM_BOUNDARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([A-Z]+)([A-Z][a-z])").expect("valid regex"));
static WORD_BOUNDARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([a-z\d])([A-Z])").expect("valid regex"));
static SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[-\s]").expect("valid regex"));
static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\W").expect("valid regex"));
static REPEATED: Lazy<Regex> = Lazy::new(|| Regex::new(r"__+").expect("valid regex"));

/// Convert an upstream key to the snake_case name a record would expose for
/// it. Runs of capitals are kept together as one word, so `HTTPAddr`
/// becomes `http_addr` and `ModifyIndex` becomes `modify_index`.
pub fn normalize_key(key: &str) -> String {
    let key = ACRONYM_BOUNDARY.replace_all(key, "${1}_${2}");
    let key = WORD_BOUNDARY.replace_all(&key, "${1}_${2}");
    let key = SEPARATORS.replace_all(&key, "_");
    let key = NON_WORD.replace_all(&key, "_");
    let key = REPEATED.replace_all(&key, "_");
    key.to_lowercase()
}
