//! Removal of running headers, page numbers and loader artifacts from poem text.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Result, SegmenterError};
use crate::text::collapse_blank_lines;

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static PAGE_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?:p[aá]gina|p[aá]g\.|page|p\.)\s*\d+(?:\s*(?:de|of|/)\s*\d+)?$|^[-–—]\s*\d{1,4}\s*[-–—]$",
    )
    .expect("valid regex")
});

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static BARE_PAGE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{2,4}$").expect("valid regex"));

/// Uppercase running header fused with a page number, either side.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static HEADER_WITH_PAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\p{Lu}[\p{Lu}\s.,'’-]{3,60}\s+\d{1,4}$|^\d{1,4}\s+\p{Lu}[\p{Lu}\s.,'’-]{3,60}$")
        .expect("valid regex")
});

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static URL_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:https?://|www\.)\S+$").expect("valid regex"));

/// Digital-library watermark lines left in the text layer of ebooks.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static WATERMARK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:librodot\.com|biblioteca\s+virtual\b.*|www\.elaleph\.com.*|ciudad\s+seva\b.*)$")
        .expect("valid regex")
});

fn is_artifact_line(line: &str) -> bool {
    let line = line.trim();
    !line.is_empty()
        && (PAGE_MARKER.is_match(line)
            || BARE_PAGE_NUMBER.is_match(line)
            || HEADER_WITH_PAGE.is_match(line)
            || URL_LINE.is_match(line)
            || WATERMARK.is_match(line))
}

/// Structural artifact remover with optional user patterns.
#[derive(Debug, Clone, Default)]
pub struct PoemCleaner {
    extra: Vec<Regex>,
}

impl PoemCleaner {
    /// Compile additional artifact patterns.
    ///
    /// # Errors
    /// Returns [`SegmenterError::InvalidPattern`] for the first pattern that
    /// fails to compile.
    pub fn new(patterns: &[String]) -> Result<Self> {
        let extra = patterns
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|source| SegmenterError::InvalidPattern {
                    pattern: pattern.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { extra })
    }

    /// Strip artifacts from one block of text, keeping blank lines.
    #[must_use]
    pub fn clean_block(&self, text: &str) -> String {
        let mut text = text.to_string();
        for pattern in &self.extra {
            text = pattern.replace_all(&text, "").into_owned();
        }
        text.lines()
            .filter(|line| !is_artifact_line(line))
            .map(str::trim_end)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Strip artifacts from assembled text and collapse blank-line runs.
    #[must_use]
    pub fn clean_text(&self, text: &str) -> String {
        collapse_blank_lines(&self.clean_block(text))
            .trim()
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_removes_page_artifacts() {
        let cleaner = PoemCleaner::default();
        let text = "verso uno\nPágina 12\n- 13 -\n145\nverso dos";
        assert_eq!(cleaner.clean_block(text), "verso uno\nverso dos");
    }

    #[test]
    fn test_removes_running_header_and_urls() {
        let cleaner = PoemCleaner::default();
        let text = "ANTOLOGÍA POÉTICA 27\nverso\nwww.ejemplo.com/libro\nLibrodot.com\n12 RUBÉN DARÍO";
        assert_eq!(cleaner.clean_block(text), "verso");
    }

    #[test]
    fn test_keeps_short_numbers_and_verses() {
        let cleaner = PoemCleaner::default();
        // Single digits may be stanza numbers
        assert_eq!(cleaner.clean_block("7\ny siete veces"), "7\ny siete veces");
    }

    #[test]
    fn test_clean_text_collapses_blank_lines() {
        let cleaner = PoemCleaner::default();
        let text = "uno\n\n\n\nPágina 2\n\n\ndos\n";
        assert_eq!(cleaner.clean_text(text), "uno\n\ndos");
    }

    #[test]
    fn test_custom_patterns() {
        let cleaner = PoemCleaner::new(&[r"\[\d+\]".to_string()]).unwrap();
        assert_eq!(cleaner.clean_block("verso[3] final"), "verso final");
    }

    #[test]
    fn test_invalid_custom_pattern() {
        let err = PoemCleaner::new(&["(".to_string()]).unwrap_err();
        assert!(matches!(err, SegmenterError::InvalidPattern { .. }));
    }
}
