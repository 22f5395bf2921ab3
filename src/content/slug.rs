//! Title to URL slug derivation.

use regex::Regex;

lazy_static::lazy_static! {
    /// Anything that is not an ASCII word character, whitespace or a hyphen.
    static ref NON_SLUG_CHARS: Regex = Regex::new(r"[^a-z0-9_\s-]+").unwrap();

    /// Runs of whitespace and hyphens collapse into a single hyphen.
    static ref SEPARATOR_RUNS: Regex = Regex::new(r"[\s-]+").unwrap();

    /// Valid slug: lowercase letters, digits and underscores joined by single hyphens
    static ref SLUG_REGEX: Regex = Regex::new(r"^[a-z0-9_]+(?:-[a-z0-9_]+)*$").unwrap();
}

/// Lowercases and trims the title, strips everything that is not a word
/// character or separator, then joins the remaining words with hyphens.
///
/// Pure and deterministic. Uniqueness is not checked here; the store's
/// per-collection constraint decides. Returns an empty string when the
/// title holds no word characters.
pub fn derive_slug(title: &str) -> String {
    let lowered = title.to_lowercase();
    let stripped = NON_SLUG_CHARS.replace_all(lowered.trim(), "");
    SEPARATOR_RUNS
        .replace_all(&stripped, "-")
        .trim_matches('-')
        .to_string()
}

pub fn is_valid_slug(slug: &str) -> bool {
    SLUG_REGEX.is_match(slug)
}
