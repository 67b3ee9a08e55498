//! Text predicates and normalization helpers shared by all detectors.

use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Three or more consecutive newlines (with optional whitespace between).
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static EXCESS_BLANK_LINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n(?:[ \t]*\n){2,}").expect("valid regex"));

/// Horizontal whitespace runs.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static HORIZONTAL_SPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t\u{00A0}]+").expect("valid regex"));

/// Characters that end a sentence or clause.
pub const TERMINAL_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?', '…'];

/// Function words that stay lowercase in title case (Spanish and English).
pub const MINOR_WORDS: &[&str] = &[
    "a", "al", "de", "del", "el", "en", "la", "las", "los", "y", "o", "u", "e", "por", "para",
    "con", "sin", "un", "una", "the", "of", "and", "or", "in", "on", "to", "for", "an",
];

/// Number of Unicode scalar values.
#[must_use]
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

#[must_use]
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// True when the text has at least two letters and none of them lowercase.
#[must_use]
pub fn is_all_caps(text: &str) -> bool {
    let mut letters = 0;
    for c in text.chars().filter(|c| c.is_alphabetic()) {
        if c.is_lowercase() {
            return false;
        }
        letters += 1;
    }
    letters >= 2
}

fn starts_uppercase(word: &str) -> bool {
    word.chars()
        .find(|c| c.is_alphanumeric())
        .is_some_and(|c| c.is_uppercase() || c.is_numeric())
}

/// True when every significant word starts with an uppercase letter.
///
/// Minor words are allowed in lowercase anywhere except first position.
#[must_use]
pub fn is_title_case(text: &str) -> bool {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() || is_all_caps(text) {
        return false;
    }
    words.iter().enumerate().all(|(i, word)| {
        if starts_uppercase(word) {
            return true;
        }
        i > 0 && MINOR_WORDS.contains(&word.to_lowercase().as_str())
    }) && starts_uppercase(words[0])
}

/// First alphabetic character is uppercase.
#[must_use]
pub fn starts_with_capital(text: &str) -> bool {
    text.trim_start()
        .chars()
        .find(|c| c.is_alphabetic())
        .is_some_and(char::is_uppercase)
}

#[must_use]
pub fn ends_with_terminal_punctuation(text: &str) -> bool {
    text.trim_end()
        .chars()
        .last()
        .is_some_and(|c| TERMINAL_PUNCTUATION.contains(&c))
}

/// Text is wrapped in straight or typographic quotes.
#[must_use]
pub fn is_quoted(text: &str) -> bool {
    let t = text.trim();
    let mut chars = t.chars();
    let (Some(first), Some(last)) = (chars.next(), chars.next_back()) else {
        return false;
    };
    matches!(
        (first, last),
        ('"', '"') | ('“', '”') | ('«', '»') | ('\'', '\'') | ('‘', '’') | ('„', '“')
    )
}

/// Remove surrounding quotes from a quoted title.
#[must_use]
pub fn strip_quotes(text: &str) -> &str {
    let t = text.trim();
    if is_quoted(t) {
        let mut chars = t.chars();
        chars.next();
        chars.next_back();
        chars.as_str().trim()
    } else {
        t
    }
}

/// Collapse three or more consecutive newlines to exactly two.
#[must_use]
pub fn collapse_blank_lines(text: &str) -> String {
    EXCESS_BLANK_LINES.replace_all(text, "\n\n").into_owned()
}

/// Collapse horizontal whitespace runs to single spaces and trim.
#[must_use]
pub fn normalize_spaces(text: &str) -> String {
    HORIZONTAL_SPACE.replace_all(text.trim(), " ").into_owned()
}

/// Strip diacritics, lowercase and collapse whitespace.
///
/// # Examples
/// ```
/// use biblio_segmenter::text::fold_diacritics;
///
/// assert_eq!(fold_diacritics("  Rubén   DARÍO "), "ruben dario");
/// ```
#[must_use]
pub fn fold_diacritics(text: &str) -> String {
    let stripped: String = text
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Number of non-empty lines.
#[must_use]
pub fn count_nonempty_lines(text: &str) -> usize {
    text.lines().filter(|l| !l.trim().is_empty()).count()
}
