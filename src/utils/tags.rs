//! Normalization of tag names supplied with a question.

use regex::Regex;
use std::sync::LazyLock;

/// Allowed shape of a normalized tag name.
pub static TAG_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9][a-z0-9+#.-]*$").expect("tag pattern is valid"));

/// Trims and lower-cases tag names, dropping blanks and duplicates.
///
/// First occurrence wins, so the caller's ordering is preserved.
pub fn normalize_tags<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut normalized: Vec<String> = Vec::new();

    for name in names {
        let name = name.as_ref().trim().to_lowercase();
        if !name.is_empty() && !normalized.contains(&name) {
            normalized.push(name);
        }
    }

    normalized
}

/// Returns true if an already normalized name is an acceptable tag.
pub fn is_valid_tag(name: &str) -> bool {
    TAG_NAME.is_match(name)
}
