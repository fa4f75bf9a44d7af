//! Text normalization for run text and title matching.
//!
//! Handles non-breaking and vertical-tab characters in run text, and folds
//! titles to a canonical form before fuzzy comparison.

use regex::Regex;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

/// Regex to collapse whitespace runs into one space.
static WHITESPACE_COLLAPSE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Normalize raw run text from the container.
///
/// - Non-breaking spaces become ordinary spaces
/// - Vertical tabs (soft line breaks in some producers) become newlines
/// - `\r\n` and `\r` become `\n`
pub fn normalize_run_text(text: &str) -> String {
    text.replace("\r\n", "\n")
        .chars()
        .map(|c| match c {
            '\u{00A0}' | '\u{202F}' => ' ',
            '\u{000B}' | '\r' => '\n',
            c => c,
        })
        .collect()
}

/// Fold text for fuzzy comparison.
///
/// Applies NFKC, lowercases, collapses whitespace and trims.
pub fn normalize_for_matching(text: &str) -> String {
    let folded: String = text.nfkc().collect::<String>().to_lowercase();
    WHITESPACE_COLLAPSE_REGEX
        .replace_all(folded.trim(), " ")
        .into_owned()
}

/// Collapse line breaks and repeated whitespace to single spaces.
pub fn flatten_whitespace(text: &str) -> String {
    WHITESPACE_COLLAPSE_REGEX.replace_all(text, " ").into_owned()
}

/// Count non-whitespace characters.
pub fn visible_len(text: &str) -> usize {
    text.chars().filter(|c| !c.is_whitespace()).count()
}
