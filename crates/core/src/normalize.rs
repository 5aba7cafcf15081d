//! Text normalization for table headers, song titles and free text.
//!
//! Handles diacritic removal, header canonicalization and line-ending cleanup
//! before text reaches the page layout.

use regex::Regex;
use std::sync::LazyLock;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Regex to collapse multiple whitespace characters into one.
static WHITESPACE_COLLAPSE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]+").unwrap());

/// Remove diacritics and surrounding whitespace.
///
/// The text is decomposed (NFD), combining marks are dropped and the result
/// is trimmed. Trimming happens last so that a stray mark next to a space
/// cannot leave whitespace behind, which keeps the function idempotent.
pub fn strip_accents(text: &str) -> String {
    let stripped: String = text.nfd().filter(|c| !is_combining_mark(*c)).collect();
    stripped.trim().to_string()
}

/// Canonical form of a spreadsheet column header.
///
/// `"Número "` becomes `"numero"`, `"TÍTULO"` becomes `"titulo"`.
pub fn normalize_header(name: &str) -> String {
    strip_accents(name).to_lowercase().trim().to_string()
}

/// Prepare free text for layout: carriage returns are dropped.
pub fn clean_text(text: &str) -> String {
    text.replace('\r', "")
}

/// Collapse runs of spaces and tabs into a single space and trim.
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_COLLAPSE_REGEX
        .replace_all(text, " ")
        .trim()
        .to_string()
}
