//! Configuration constants, profiles and validation for the segmenter.
//!
//! Every option has a default, so an empty YAML document is a valid
//! configuration. Named profiles are bundles of those options selecting the
//! segmenter and thresholds for a document type.

use std::fmt;
use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SegmenterError};

/// Default maximum segment length in characters before paragraph splitting.
pub const DEFAULT_MAX_SEGMENT_LENGTH: usize = 1000;

/// Default minimum segment length used by the small-segment filter.
pub const DEFAULT_MIN_SEGMENT_LENGTH: usize = 10;

/// Default minimum length of a split fragment before it is merged back.
pub const DEFAULT_MIN_PARAGRAPH_LENGTH: usize = 20;

/// Sections with fewer content lines than this (and no subsections) are demoted.
pub const DEFAULT_MIN_HEADING_CONTENT: usize = 2;

/// Default acceptance threshold for author candidates.
pub const DEFAULT_AUTHOR_THRESHOLD: f64 = 0.6;

/// Author threshold tuned for verse documents, which carry fewer bylines.
pub const VERSE_AUTHOR_THRESHOLD: f64 = 0.55;

/// Default minimum title score (0-10) for a block to count as a smart title.
pub const DEFAULT_TITLE_SCORE_THRESHOLD: f64 = 5.0;

/// Blocks longer than this are scanned for merged poems.
pub const DEFAULT_PRE_SPLIT_THRESHOLD: usize = 1000;

/// Longest line still considered a verse.
pub const DEFAULT_MAX_VERSE_LENGTH: usize = 120;

/// Which segmenter handles a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileType {
    /// Prose documents: HeadingSegmenter, prose author patterns.
    #[default]
    Prose,
    /// Poetry collections: VerseSegmenter, verse author patterns.
    Verse,
}

impl ProfileType {
    /// Get the string value used in logs and output.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Prose => "prose",
            Self::Verse => "verse",
        }
    }
}

impl fmt::Display for ProfileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Heading and smart-title detection options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadingDetectionConfig {
    pub enable_heading_detection: bool,
    pub smart_title_detection: bool,
    /// Minimum title score (0-10) for a smart title.
    pub title_score_threshold: f64,
}

impl Default for HeadingDetectionConfig {
    fn default() -> Self {
        Self {
            enable_heading_detection: true,
            smart_title_detection: true,
            title_score_threshold: DEFAULT_TITLE_SCORE_THRESHOLD,
        }
    }
}

/// Author attribution options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthorDetectionConfig {
    pub enabled: bool,
    /// Minimum candidate score (0-1) for a result to be returned.
    pub confidence_threshold: f64,
    /// Log every candidate score at info level.
    pub debug: bool,
    /// Return an unverified document-context author when nothing else is found.
    pub fallback_to_override: bool,
    /// Extra canonical author names added to the built-in list.
    pub known_authors: Vec<String>,
}

impl Default for AuthorDetectionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            confidence_threshold: DEFAULT_AUTHOR_THRESHOLD,
            debug: false,
            fallback_to_override: true,
            known_authors: Vec::new(),
        }
    }
}

/// VerseSegmenter options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerseConfig {
    pub pre_split_threshold: usize,
    pub max_verse_length: usize,
    /// Non-blank lines inspected after a title candidate.
    pub title_lookahead: usize,
    pub max_blank_after_title: usize,
    /// Lines inspected after a title candidate in the fallback pass.
    pub fallback_lookahead: usize,
    /// Additional artifact regexes removed from assembled poem text.
    pub artifact_patterns: Vec<String>,
}

impl Default for VerseConfig {
    fn default() -> Self {
        Self {
            pre_split_threshold: DEFAULT_PRE_SPLIT_THRESHOLD,
            max_verse_length: DEFAULT_MAX_VERSE_LENGTH,
            title_lookahead: 10,
            max_blank_after_title: 3,
            fallback_lookahead: 8,
            artifact_patterns: Vec::new(),
        }
    }
}

/// Full segmenter configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmenterConfig {
    pub profile: ProfileType,
    /// Join section content with blank lines instead of spaces.
    pub preserve_paragraphs: bool,
    /// Paragraph mode: one segment per block, no section tree.
    pub disable_grouping: bool,
    pub enable_headings: bool,
    pub smart_titles: bool,
    pub min_paragraph_length: usize,
    pub max_segment_length: usize,
    pub min_segment_length: usize,
    pub filter_small_segments: bool,
    pub min_heading_content: usize,
    /// Minimum normalized title score (0-1) for a smart title to open a section.
    pub confidence_threshold: f64,
    pub heading_detection: HeadingDetectionConfig,
    pub author_detection: AuthorDetectionConfig,
    pub verse: VerseConfig,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            profile: ProfileType::Prose,
            preserve_paragraphs: true,
            disable_grouping: true,
            enable_headings: true,
            smart_titles: true,
            min_paragraph_length: DEFAULT_MIN_PARAGRAPH_LENGTH,
            max_segment_length: DEFAULT_MAX_SEGMENT_LENGTH,
            min_segment_length: DEFAULT_MIN_SEGMENT_LENGTH,
            filter_small_segments: false,
            min_heading_content: DEFAULT_MIN_HEADING_CONTENT,
            confidence_threshold: DEFAULT_AUTHOR_THRESHOLD,
            heading_detection: HeadingDetectionConfig::default(),
            author_detection: AuthorDetectionConfig::default(),
            verse: VerseConfig::default(),
        }
    }
}

impl SegmenterConfig {
    /// Parse and validate a configuration from YAML text.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml_ng::from_str(yaml)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a configuration file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }

    /// Check value ranges and cross-field consistency.
    pub fn validate(&self) -> Result<()> {
        check_unit_interval("confidence_threshold", self.confidence_threshold)?;
        check_unit_interval(
            "author_detection.confidence_threshold",
            self.author_detection.confidence_threshold,
        )?;

        let title = self.heading_detection.title_score_threshold;
        if !(0.0..=10.0).contains(&title) {
            return Err(SegmenterError::InvalidConfig(format!(
                "heading_detection.title_score_threshold must be within [0, 10], got {title}"
            )));
        }

        if self.max_segment_length == 0 {
            return Err(SegmenterError::InvalidConfig(
                "max_segment_length must be greater than 0".to_string(),
            ));
        }

        if self.min_segment_length > self.max_segment_length {
            return Err(SegmenterError::InvalidConfig(format!(
                "min_segment_length ({}) exceeds max_segment_length ({})",
                self.min_segment_length, self.max_segment_length
            )));
        }

        if self.verse.max_verse_length == 0 || self.verse.title_lookahead == 0 {
            return Err(SegmenterError::InvalidConfig(
                "verse.max_verse_length and verse.title_lookahead must be greater than 0"
                    .to_string(),
            ));
        }

        for pattern in &self.verse.artifact_patterns {
            Regex::new(pattern).map_err(|source| SegmenterError::InvalidPattern {
                pattern: pattern.clone(),
                source,
            })?;
        }

        Ok(())
    }

    /// Heading detection runs only when both switches are on.
    #[must_use]
    pub fn headings_enabled(&self) -> bool {
        self.enable_headings && self.heading_detection.enable_heading_detection
    }

    /// Smart titles run only when both switches are on.
    #[must_use]
    pub fn smart_titles_enabled(&self) -> bool {
        self.smart_titles && self.heading_detection.smart_title_detection
    }
}

fn check_unit_interval(name: &str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(SegmenterError::InvalidConfig(format!(
            "{name} must be within [0, 1], got {value}"
        )))
    }
}

/// Names of the built-in profiles, in display order.
pub const BUILTIN_PROFILES: [&str; 3] = ["prose", "book", "verse"];

/// Build the configuration bundle for a named profile.
///
/// # Examples
/// ```
/// use biblio_segmenter::config::{builtin_profile, ProfileType};
///
/// let verse = builtin_profile("poesia").unwrap();
/// assert_eq!(verse.profile, ProfileType::Verse);
/// assert!(builtin_profile("drama").is_err());
/// ```
pub fn builtin_profile(name: &str) -> Result<SegmenterConfig> {
    let mut config = SegmenterConfig::default();
    match name.trim().to_lowercase().as_str() {
        "prose" | "prosa" => {}
        "book" | "libro" => {
            config.disable_grouping = false;
        }
        "verse" | "poesia" | "poesía" => {
            config.profile = ProfileType::Verse;
            config.author_detection = get_author_detection_config(ProfileType::Verse);
        }
        _ => return Err(SegmenterError::UnknownProfile(name.to_string())),
    }
    Ok(config)
}

/// One-line description of a built-in profile.
#[must_use]
pub fn profile_description(name: &str) -> &'static str {
    match name {
        "prose" => "one segment per block, long blocks split on sentences",
        "book" => "nested sections built from detected headings",
        "verse" => "poems detected from titles and verse lines",
        _ => "",
    }
}

/// Tuned author detection settings for a profile type.
#[must_use]
pub fn get_author_detection_config(profile: ProfileType) -> AuthorDetectionConfig {
    match profile {
        ProfileType::Verse => AuthorDetectionConfig {
            confidence_threshold: VERSE_AUTHOR_THRESHOLD,
            ..AuthorDetectionConfig::default()
        },
        ProfileType::Prose => AuthorDetectionConfig::default(),
    }
}
