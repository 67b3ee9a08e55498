//! Document-context precedence over standard detection.
//!
//! A candidate is read from the document title or filename. When it is a
//! known author it usually wins over what the text itself suggests:
//!
//! | standard result | context author | outcome |
//! |---|---|---|
//! | none | known | context, 0.85 |
//! | same person | known | canonical name, at least 0.85 |
//! | looks like a section title | known | context, 0.90 |
//! | weaker than 0.85 | known | context, 0.85 |
//! | 0.85 or stronger | known | context, 0.80 |
//! | none | unverified | context, 0.65 if `fallback_to_override` |

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use super::detector::{occurrences, AuthorDetector};
use super::known::KnownAuthors;
use super::names::{clean_author_name, is_valid_author_name, same_name};
use super::port::AuthorDetectionPort;
use super::{segment_titles, segments_text, AuthorResult};
use crate::config::{AuthorDetectionConfig, ProfileType};
use crate::text::fold_diacritics;
use crate::types::{AuthorDetectionDetails, DocumentContext, Segment};

pub const KNOWN_AUTHOR_CONFIDENCE: f64 = 0.85;
pub const SECTION_TITLE_OVERRIDE_CONFIDENCE: f64 = 0.90;
pub const CONFLICT_CONFIDENCE: f64 = 0.80;
pub const UNVERIFIED_CONFIDENCE: f64 = 0.65;

/// Words that make a detected "name" read like a part of the book.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static SECTION_KEYWORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(?:poemas?|versos|cantos?|rimas|leyendas|cuentos|obras|odas|elegias|sonetos|romances?|canciones|primera|segunda|tercera|parte|libro|capitulo|seccion|antologia)\b",
    )
    .expect("valid regex")
});

/// "Title by Name" / "Title por Name".
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static TITLE_BY_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s(?i:by|por)\s+(.+)$").expect("valid regex"));

const DASH_SEPARATORS: [&str; 3] = [" - ", " – ", " — "];

/// An author read from the document title or filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextAuthor {
    /// Cleaned name as written in the context.
    pub name: String,
    /// Canonical spelling when the name is a known author.
    pub canonical: Option<String>,
    /// `title` or `filename`.
    pub source: &'static str,
    /// Shape of the context the name was read from.
    pub pattern: &'static str,
}

impl ContextAuthor {
    #[must_use]
    pub fn is_verified(&self) -> bool {
        self.canonical.is_some()
    }

    #[must_use]
    pub fn display_name(&self) -> &str {
        self.canonical.as_deref().unwrap_or(&self.name)
    }
}

/// Name-bearing fragments of a title, with the shape they came from.
fn title_fragments(title: &str) -> Vec<(String, &'static str)> {
    let title = title.trim();
    let mut fragments = Vec::new();
    if let Some((before, _)) = title.split_once('_') {
        fragments.push((before.to_string(), "surname_name_title"));
    }
    for separator in DASH_SEPARATORS {
        if let Some((left, right)) = title.split_once(separator) {
            fragments.push((left.to_string(), "name_dash_title"));
            fragments.push((right.to_string(), "title_dash_name"));
        }
    }
    if let Some(caps) = TITLE_BY_NAME.captures(title) {
        if let Some(name) = caps.get(1) {
            fragments.push((name.as_str().to_string(), "title_by_name"));
        }
    }
    fragments
}

/// Filename stem with hyphens and dots read as spaces; underscores kept.
fn filename_title(filename: &str) -> Option<String> {
    let stem = Path::new(filename.trim()).file_stem()?.to_str()?;
    let spaced: String = stem
        .chars()
        .map(|c| if c == '-' || c == '.' { ' ' } else { c })
        .collect();
    let spaced = spaced.split_whitespace().collect::<Vec<_>>().join(" ");
    (!spaced.is_empty()).then_some(spaced)
}

/// Runs of two and three tokens at either end of a filename stem.
fn token_windows(stem: &str) -> Vec<String> {
    let tokens: Vec<&str> = stem
        .split(|c: char| c == '_' || c.is_whitespace())
        .filter(|t| !t.is_empty())
        .collect();
    let mut windows = Vec::new();
    for size in [2, 3] {
        if tokens.len() >= size {
            windows.push(tokens[..size].join(" "));
            windows.push(tokens[tokens.len() - size..].join(" "));
        }
    }
    windows
}

/// Standard detection plus document-context precedence.
#[derive(Debug, Clone, Default)]
pub struct ContextualAuthorDetector {
    base: AuthorDetector,
    known: KnownAuthors,
}

impl ContextualAuthorDetector {
    /// Build a detector whose known-author list is the built-in list plus
    /// `config.known_authors`.
    #[must_use]
    pub fn new(config: AuthorDetectionConfig) -> Self {
        Self {
            known: KnownAuthors::with_extra(&config.known_authors),
            base: AuthorDetector::new(config),
        }
    }

    #[must_use]
    pub fn base(&self) -> &AuthorDetector {
        &self.base
    }

    #[must_use]
    pub fn known_authors(&self) -> &KnownAuthors {
        &self.known
    }

    fn context_author(&self, raw: &str, source: &'static str, pattern: &'static str) -> ContextAuthor {
        let name = clean_author_name(raw);
        ContextAuthor {
            canonical: self.known.lookup(&name).map(str::to_string),
            name,
            source,
            pattern,
        }
    }

    /// Author suggested by the document title or filename.
    ///
    /// A known author from either source is preferred over an unverified
    /// name, and the title is preferred over the filename.
    #[must_use]
    pub fn extract_context_author(&self, context: &DocumentContext) -> Option<ContextAuthor> {
        let mut candidates: Vec<ContextAuthor> = Vec::new();

        if let Some(title) = context.title.as_deref() {
            for (fragment, pattern) in title_fragments(title) {
                candidates.push(self.context_author(&fragment, "title", pattern));
            }
        }
        if let Some(stem) = context.filename.as_deref().and_then(filename_title) {
            for (fragment, pattern) in title_fragments(&stem) {
                candidates.push(self.context_author(&fragment, "filename", pattern));
            }
            for window in token_windows(&stem) {
                let candidate = self.context_author(&window, "filename", "filename_tokens");
                // Bare token runs only count when they name a known author
                if candidate.is_verified() {
                    candidates.push(candidate);
                }
            }
        }

        let found = candidates
            .iter()
            .find(|c| c.is_verified())
            .or_else(|| candidates.iter().find(|c| is_valid_author_name(&c.name)))
            .cloned();
        if let Some(author) = &found {
            tracing::debug!(
                name = %author.display_name(),
                source = author.source,
                pattern = author.pattern,
                verified = author.is_verified(),
                "Context author candidate"
            );
        }
        found
    }

    /// Whether a detected name is more likely a section of the book.
    ///
    /// True when it appears after an underscore in the title, or contains
    /// section keywords.
    #[must_use]
    pub fn is_section_title(&self, name: &str, context: &DocumentContext) -> bool {
        let folded = fold_diacritics(name);
        if folded.is_empty() {
            return false;
        }
        let after_underscore = context
            .title
            .as_deref()
            .and_then(|title| title.split_once('_'))
            .is_some_and(|(_, rest)| fold_diacritics(rest).contains(&folded));
        after_underscore || SECTION_KEYWORD.is_match(&folded)
    }

    fn same_person(&self, detected: &str, canonical: &str) -> bool {
        same_name(detected, canonical) || self.known.lookup(detected) == Some(canonical)
    }

    /// Enhanced detection over raw text with this detector's configuration.
    #[must_use]
    pub fn detect_author_enhanced(
        &self,
        text: &str,
        profile: ProfileType,
        context: &DocumentContext,
    ) -> Option<AuthorResult> {
        self.resolve(text, profile, self.base.config(), context, &BTreeSet::new())
    }

    fn resolve(
        &self,
        text: &str,
        profile: ProfileType,
        config: &AuthorDetectionConfig,
        context: &DocumentContext,
        titles: &BTreeSet<String>,
    ) -> Option<AuthorResult> {
        if !config.enabled {
            return None;
        }
        let standard = self.base.detect_with(text, profile, config, titles);
        let Some(ctx) = self.extract_context_author(context) else {
            return standard;
        };

        let total = standard.as_ref().map_or(0, |s| s.details.total_candidates);
        let outcome = match (&standard, ctx.canonical.as_deref()) {
            (None, Some(_)) => Some((KNOWN_AUTHOR_CONFIDENCE, "context_known_author")),
            (Some(found), Some(canonical)) => {
                if self.same_person(&found.name, canonical) {
                    let mut confirmed = found.clone();
                    confirmed.name = canonical.to_string();
                    confirmed.confidence = found.confidence.max(KNOWN_AUTHOR_CONFIDENCE);
                    confirmed.method = "context_confirmed".to_string();
                    confirmed
                        .details
                        .sources
                        .push(format!("document_context:{}", ctx.source));
                    return Some(confirmed);
                }
                if self.is_section_title(&found.name, context) {
                    Some((SECTION_TITLE_OVERRIDE_CONFIDENCE, "context_override_section_title"))
                } else if found.confidence < KNOWN_AUTHOR_CONFIDENCE {
                    Some((KNOWN_AUTHOR_CONFIDENCE, "context_known_author"))
                } else {
                    Some((CONFLICT_CONFIDENCE, "context_override_conflict"))
                }
            }
            (None, None) if config.fallback_to_override => {
                Some((UNVERIFIED_CONFIDENCE, "context_unverified"))
            }
            _ => None,
        };

        let Some((confidence, method)) = outcome else {
            return standard;
        };
        tracing::info!(
            name = %ctx.display_name(),
            replaced = standard.as_ref().map(|s| s.name.as_str()),
            confidence,
            method,
            "Document context decided the author"
        );
        let name = ctx.display_name().to_string();
        Some(AuthorResult {
            details: AuthorDetectionDetails {
                sources: vec![format!("document_context:{}", ctx.source)],
                frequency: occurrences(&fold_diacritics(text), &fold_diacritics(&name)).len(),
                total_candidates: total,
                threshold_used: config.confidence_threshold,
            },
            name,
            confidence,
            method: method.to_string(),
        })
    }
}

impl AuthorDetectionPort for ContextualAuthorDetector {
    fn detect_author_in_segments(
        &self,
        segments: &[Segment],
        profile: ProfileType,
        config: &AuthorDetectionConfig,
    ) -> Option<AuthorResult> {
        self.base.detect_author_in_segments(segments, profile, config)
    }

    fn detect_with_context(
        &self,
        segments: &[Segment],
        profile: ProfileType,
        config: &AuthorDetectionConfig,
        context: &DocumentContext,
    ) -> Option<AuthorResult> {
        self.resolve(
            &segments_text(segments),
            profile,
            config,
            context,
            &segment_titles(segments),
        )
    }
}
