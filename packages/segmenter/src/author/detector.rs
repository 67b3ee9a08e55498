//! Candidate extraction, merging and scoring.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use regex::Regex;

use super::names::{clean_author_name, has_name_shape, is_valid_author_name, NAME_PATTERN};
use super::port::AuthorDetectionPort;
use super::{
    segment_titles, segments_text, AuthorCandidate, AuthorResult, SOURCE_METADATA, SOURCE_PROSE,
    SOURCE_VERSE,
};
use crate::config::{AuthorDetectionConfig, ProfileType};
use crate::rules::ExtractionRule;
use crate::text::fold_diacritics;
use crate::types::{AuthorDetectionDetails, Segment};

const METADATA_BONUS: f64 = 0.4;
const SHAPE_BONUS: f64 = 0.1;
/// Scores are rounded to three decimals.
const SCORE_SCALE: f64 = 1000.0;
const MAX_POSITION_BONUS: f64 = 0.2;

/// Rule whose lines are indistinguishable from short titles.
const ISOLATED_NAME_TAG: &str = "isolated_name";

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
fn name_regex(prefix: &str, suffix: &str) -> Regex {
    Regex::new(&format!("{prefix}{NAME_PATTERN}{suffix}")).expect("valid regex")
}

static BYLINE: LazyLock<Regex> = LazyLock::new(|| {
    name_regex(
        r"(?m)^[ \t]*(?:(?i:autora?|author)[ \t]*:|(?i:escrito|written)[ \t]+(?i:por|by)[ \t]*:?)[ \t]*",
        "",
    )
});

static COPYRIGHT: LazyLock<Regex> = LazyLock::new(|| {
    name_regex(
        r"(?:©|\((?i:c)\)|(?i:copyright))[ \t]*(?:\d{4}[ \t]*,?[ \t]*)?(?:(?i:by|por)[ \t]+)?",
        "",
    )
});

static DASH_LINE: LazyLock<Regex> =
    LazyLock::new(|| name_regex(r"(?m)^[ \t]*[—–][ \t]*", r"[ \t]*\.?[ \t]*$"));

static TRAILING_SIGNATURE: LazyLock<Regex> =
    LazyLock::new(|| name_regex(r"[—–][ \t]*", r"[ \t]*\.?[ \t]*(?:\n[ \t]*\n|\z)"));

static DE_POR_LINE: LazyLock<Regex> =
    LazyLock::new(|| name_regex(r"(?m)^[ \t]*(?:[Dd]e|[Pp]or)[ \t]+", r"[ \t]*$"));

static ISOLATED_NAME: LazyLock<Regex> =
    LazyLock::new(|| name_regex(r"(?m)^[ \t]*", r"[ \t]*$"));

static ACADEMIC_CITATION: LazyLock<Regex> = LazyLock::new(|| {
    name_regex(r"\([ \t]*", r"[ \t]*,[ \t]*(?:\d{4}|s\.f\.)[ \t]*\)")
});

static BOLD_HEADER: LazyLock<Regex> =
    LazyLock::new(|| name_regex(r"(?m)^[ \t]*\*\*[ \t]*", r"[ \t]*\*\*[ \t]*$"));

static PUBLISHER_LINE: LazyLock<Regex> = LazyLock::new(|| {
    name_regex(r"(?m)^[ \t]*", r"[^\n]*?(?i:isbn|editorial|ediciones)")
});

/// Explicit bylines, applied to every profile.
pub static METADATA_RULES: [ExtractionRule; 3] = [
    ExtractionRule { tag: "byline", source: SOURCE_METADATA, weight: METADATA_BONUS, pattern: &BYLINE },
    ExtractionRule { tag: "copyright", source: SOURCE_METADATA, weight: METADATA_BONUS, pattern: &COPYRIGHT },
    ExtractionRule { tag: "dash_line", source: SOURCE_METADATA, weight: METADATA_BONUS, pattern: &DASH_LINE },
];

/// Signatures typical of poems.
pub static VERSE_RULES: [ExtractionRule; 3] = [
    ExtractionRule { tag: "trailing_signature", source: SOURCE_VERSE, weight: 0.35, pattern: &TRAILING_SIGNATURE },
    ExtractionRule { tag: "de_por_line", source: SOURCE_VERSE, weight: 0.3, pattern: &DE_POR_LINE },
    ExtractionRule { tag: ISOLATED_NAME_TAG, source: SOURCE_VERSE, weight: 0.25, pattern: &ISOLATED_NAME },
];

/// Citations and headers typical of prose.
pub static PROSE_RULES: [ExtractionRule; 3] = [
    ExtractionRule { tag: "academic_citation", source: SOURCE_PROSE, weight: 0.3, pattern: &ACADEMIC_CITATION },
    ExtractionRule { tag: "bold_header", source: SOURCE_PROSE, weight: 0.25, pattern: &BOLD_HEADER },
    ExtractionRule { tag: "publisher_line", source: SOURCE_PROSE, weight: 0.2, pattern: &PUBLISHER_LINE },
];

fn profile_rules(profile: ProfileType) -> [&'static [ExtractionRule]; 2] {
    match profile {
        ProfileType::Verse => [&METADATA_RULES, &VERSE_RULES],
        ProfileType::Prose => [&METADATA_RULES, &PROSE_RULES],
    }
}

/// Relative positions (0-1) of every occurrence of `key` in `folded_text`.
pub(crate) fn occurrences(folded_text: &str, key: &str) -> Vec<f64> {
    if key.is_empty() || folded_text.is_empty() {
        return Vec::new();
    }
    let len = folded_text.len() as f64;
    folded_text
        .match_indices(key)
        .map(|(idx, _)| idx as f64 / len)
        .collect()
}

fn frequency_bonus(count: usize) -> f64 {
    match count {
        0 => 0.0,
        1 => 0.1,
        2 | 3 => 0.2,
        _ => 0.3,
    }
}

fn position_bonus(positions: &[f64]) -> f64 {
    let total: f64 = positions
        .iter()
        .map(|&p| {
            if p <= 0.1 || p >= 0.9 {
                0.1
            } else if p <= 0.2 || p >= 0.8 {
                0.05
            } else {
                0.0
            }
        })
        .sum();
    total.min(MAX_POSITION_BONUS)
}

/// Extractions grouped under one folded name.
struct Merged {
    key: String,
    spellings: Vec<(String, usize)>,
    candidate: AuthorCandidate,
    best_weight: f64,
}

/// Rule-based author detector.
#[derive(Debug, Clone, Default)]
pub struct AuthorDetector {
    config: AuthorDetectionConfig,
}

impl AuthorDetector {
    #[must_use]
    pub fn new(config: AuthorDetectionConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &AuthorDetectionConfig {
        &self.config
    }

    /// Detect the author of raw text with this detector's configuration.
    #[must_use]
    pub fn detect_author(&self, text: &str, profile: ProfileType) -> Option<AuthorResult> {
        self.detect_with(text, profile, &self.config, &BTreeSet::new())
    }

    /// Extract and merge candidates; confidences are left at zero.
    #[must_use]
    pub fn extract_candidates(&self, text: &str, profile: ProfileType) -> Vec<AuthorCandidate> {
        self.extract_excluding(text, profile, &BTreeSet::new())
    }

    /// Like [`extract_candidates`](Self::extract_candidates), but isolated
    /// lines matching one of the folded `titles` are not candidates.
    #[must_use]
    pub fn extract_excluding(
        &self,
        text: &str,
        profile: ProfileType,
        titles: &BTreeSet<String>,
    ) -> Vec<AuthorCandidate> {
        let mut merged: Vec<Merged> = Vec::new();

        for rule in profile_rules(profile).into_iter().flatten() {
            for extraction in rule.extract(text) {
                let name = clean_author_name(extraction.value);
                if !is_valid_author_name(&name) {
                    continue;
                }
                let key = fold_diacritics(&name);
                if rule.tag == ISOLATED_NAME_TAG && titles.contains(&key) {
                    continue;
                }
                let index = match merged.iter().position(|m| m.key == key) {
                    Some(index) => index,
                    None => {
                        merged.push(Merged {
                            key,
                            spellings: Vec::new(),
                            candidate: AuthorCandidate {
                                name: name.clone(),
                                confidence: 0.0,
                                sources: BTreeSet::new(),
                                positions: Vec::new(),
                                extraction_method: rule.tag.to_string(),
                                context: Vec::new(),
                                source_weights: BTreeMap::new(),
                            },
                            best_weight: f64::MIN,
                        });
                        merged.len() - 1
                    }
                };

                let entry = &mut merged[index];
                match entry.spellings.iter().position(|(s, _)| *s == name) {
                    Some(i) => entry.spellings[i].1 += 1,
                    None => entry.spellings.push((name, 1)),
                }
                let candidate = &mut entry.candidate;
                candidate.sources.insert(rule.source.to_string());
                candidate.positions.push(extraction.offset);
                candidate.context.push(extraction.matched.trim().to_string());
                let weight = candidate
                    .source_weights
                    .entry(rule.source.to_string())
                    .or_insert(rule.weight);
                *weight = weight.max(rule.weight);
                if rule.weight > entry.best_weight {
                    entry.best_weight = rule.weight;
                    candidate.extraction_method = rule.tag.to_string();
                }
            }
        }

        merged
            .into_iter()
            .map(|mut m| {
                // Most frequent spelling wins, earliest on ties
                let mut best: Option<&(String, usize)> = None;
                for spelling in &m.spellings {
                    if best.is_none_or(|b| spelling.1 > b.1) {
                        best = Some(spelling);
                    }
                }
                if let Some((name, _)) = best {
                    m.candidate.name = name.clone();
                }
                m.candidate
            })
            .collect()
    }

    /// Score of a merged candidate against the text it was found in, in `[0, 1]`.
    #[must_use]
    pub fn calculate_candidate_score(&self, candidate: &AuthorCandidate, text: &str) -> f64 {
        score_folded(candidate, &fold_diacritics(text))
    }

    /// Detection over `text` with an explicit configuration; `titles` are
    /// folded segment titles that isolated lines must not match.
    pub(crate) fn detect_with(
        &self,
        text: &str,
        profile: ProfileType,
        config: &AuthorDetectionConfig,
        titles: &BTreeSet<String>,
    ) -> Option<AuthorResult> {
        if !config.enabled || text.trim().is_empty() {
            return None;
        }
        let mut candidates = self.extract_excluding(text, profile, titles);
        if candidates.is_empty() {
            tracing::debug!(profile = %profile, "No author candidates found");
            return None;
        }

        let folded = fold_diacritics(text);
        for candidate in &mut candidates {
            candidate.confidence = score_folded(candidate, &folded);
            if config.debug {
                tracing::info!(name = %candidate.name, score = candidate.confidence, sources = ?candidate.sources, method = %candidate.extraction_method, "Author candidate");
            } else {
                tracing::debug!(name = %candidate.name, score = candidate.confidence, sources = ?candidate.sources, method = %candidate.extraction_method, "Author candidate");
            }
        }

        let total_candidates = candidates.len();
        let mut best: Option<AuthorCandidate> = None;
        for candidate in candidates {
            if best.as_ref().is_none_or(|b| candidate.confidence > b.confidence) {
                best = Some(candidate);
            }
        }
        let best = best?;

        if best.confidence < config.confidence_threshold {
            tracing::debug!(
                name = %best.name,
                score = best.confidence,
                threshold = config.confidence_threshold,
                "Best author candidate below threshold"
            );
            return None;
        }

        let frequency = occurrences(&folded, &fold_diacritics(&best.name)).len();
        tracing::debug!(name = %best.name, score = best.confidence, "Author detected");
        Some(AuthorResult {
            details: AuthorDetectionDetails {
                sources: best.sources.iter().cloned().collect(),
                frequency,
                total_candidates,
                threshold_used: config.confidence_threshold,
            },
            name: best.name,
            confidence: best.confidence,
            method: best.extraction_method,
        })
    }
}

fn score_folded(candidate: &AuthorCandidate, folded_text: &str) -> f64 {
    let mut score = 0.0;
    if candidate.sources.contains(SOURCE_METADATA) {
        score += METADATA_BONUS;
    }
    for source in [SOURCE_VERSE, SOURCE_PROSE] {
        score += candidate.source_weights.get(source).copied().unwrap_or(0.0);
    }

    let positions = occurrences(folded_text, &fold_diacritics(&candidate.name));
    score += frequency_bonus(positions.len().max(candidate.positions.len()));
    score += position_bonus(&positions);
    if has_name_shape(&candidate.name) {
        score += SHAPE_BONUS;
    }
    // Sums of tenths must compare exactly against thresholds like 0.55
    ((score * SCORE_SCALE).round() / SCORE_SCALE).clamp(0.0, 1.0)
}

impl AuthorDetectionPort for AuthorDetector {
    fn detect_author_in_segments(
        &self,
        segments: &[Segment],
        profile: ProfileType,
        config: &AuthorDetectionConfig,
    ) -> Option<AuthorResult> {
        self.detect_with(&segments_text(segments), profile, config, &segment_titles(segments))
    }
}
