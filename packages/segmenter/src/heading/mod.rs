//! HeadingSegmenter: nested sections built from detected headings.
//!
//! In grouping mode the block stream drives a [`SegmenterState`] machine
//! over a stack of open sections. In paragraph mode (the default) the
//! machine is bypassed and every non-empty block becomes one segment, with
//! long blocks split on sentence boundaries.

mod paragraph;
mod state;

use std::sync::LazyLock;

use regex::Regex;

pub use paragraph::{fallback_segments, split_long_text};
pub use state::{SegmenterEvent, SegmenterState};

use crate::config::SegmenterConfig;
use crate::error::{Result, SegmenterError};
use crate::text::{char_len, ends_with_terminal_punctuation, is_all_caps, is_title_case, word_count};
use crate::title::{TitleAnnotation, TitleDetector, MAX_LEVEL, MAX_TITLE_SCORE};
use crate::types::{
    assign_order, Block, LeveledSegment, Section, Segment, SegmentMetadata, SegmentationOutput,
    SegmentationReport,
};

/// Markdown ATX heading; group 1 is the hash run, group 2 the title.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static MARKDOWN_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#+)\s+(\S.*)$").expect("valid regex"));

/// Decimal section numbering such as `2.` or `3.1.4`.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static DECIMAL_NUMBERING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+(?:\.\d+)*)\.?\s+\S").expect("valid regex"));

/// "Topic - note" shaped lines.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static TOPIC_NOTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\p{Lu}[^.!?]{0,40}\s[-–—]\s\S[^.!?]{0,40}$").expect("valid regex")
});

/// Structural words that open top-level headings.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static STRUCTURAL_LEAD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?:cap[ií]tulo|chapter|parte|part|libro|book|t[ií]tulo|art[ií]culo|article|secci[oó]n|section)\b",
    )
    .expect("valid regex")
});

/// Longest bold or centered block still taken as a heading.
const MAX_STYLED_HEADING_CHARS: usize = 120;

/// Longest all-caps block still taken as a heading.
const MAX_CAPS_HEADING_CHARS: usize = 80;

/// Longest line the short-line heuristics apply to.
const MAX_SHORT_HEADING_CHARS: usize = 60;

const MAX_HEADING_WORDS: usize = 8;

/// Trailing-colon lines must be shorter than this.
const MAX_COLON_HEADING_CHARS: usize = 40;

const STOP_WORDS: &[&str] = &[
    "a", "al", "de", "del", "el", "en", "es", "la", "las", "lo", "los", "no", "o", "por", "que",
    "se", "su", "un", "una", "y", "con", "para", "the", "of", "and", "to", "in", "is", "it",
];

/// Section-building and paragraph segmenter for prose documents.
///
/// Holds only configuration; every call to [`segment`](Self::segment)
/// builds its own report.
#[derive(Debug, Clone)]
pub struct HeadingSegmenter {
    config: SegmenterConfig,
    titles: TitleDetector,
}

impl HeadingSegmenter {
    #[must_use]
    pub fn new(config: &SegmenterConfig) -> Self {
        Self {
            titles: TitleDetector::new(config.heading_detection.title_score_threshold),
            config: config.clone(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &SegmenterConfig {
        &self.config
    }

    /// Segment a document.
    ///
    /// Never fails: an internal error is logged and answered with one
    /// fallback segment per non-empty block.
    #[must_use]
    pub fn segment(&self, blocks: &[Block]) -> SegmentationOutput {
        let mut report = SegmentationReport {
            blocks_in: blocks.len(),
            empty_blocks: blocks.iter().filter(|b| b.is_blank()).count(),
            ..SegmentationReport::default()
        };
        if blocks.is_empty() {
            return SegmentationOutput {
                segments: Vec::new(),
                report,
            };
        }

        let annotations = if self.config.smart_titles_enabled() {
            self.titles.annotate(blocks)
        } else {
            vec![TitleAnnotation::default(); blocks.len()]
        };

        let result = if self.config.disable_grouping {
            self.segment_paragraphs(blocks, &annotations, &mut report)
        } else {
            self.segment_grouped(blocks, &annotations, &mut report)
        };

        let mut segments = recover(blocks, &mut report, result);
        assign_order(&mut segments);

        tracing::debug!(
            blocks = report.blocks_in,
            segments = segments.len(),
            sections = report.sections_created,
            demoted = report.sections_demoted,
            split = report.segments_split,
            grouping = !self.config.disable_grouping,
            "Heading segmentation complete"
        );
        SegmentationOutput { segments, report }
    }

    /// Whether a block opens a section.
    ///
    /// Smart titles are not considered here; see [`segment`](Self::segment).
    #[must_use]
    pub fn is_heading(&self, block: &Block) -> bool {
        if !self.config.headings_enabled() {
            return false;
        }
        let text = block.trimmed();
        if text.is_empty() {
            return false;
        }
        if block.is_heading || block.heading_level.is_some() || MARKDOWN_HEADING.is_match(text) {
            return true;
        }

        let chars = char_len(text);
        if (block.is_bold() || block.is_centered()) && chars <= MAX_STYLED_HEADING_CHARS {
            return true;
        }
        if chars <= MAX_CAPS_HEADING_CHARS && is_all_caps(text) {
            return true;
        }
        if chars > MAX_SHORT_HEADING_CHARS {
            return false;
        }
        if text.ends_with(':') {
            return chars < MAX_COLON_HEADING_CHARS;
        }
        if ends_with_terminal_punctuation(text) {
            return false;
        }
        (is_title_case(text) && word_count(text) <= MAX_HEADING_WORDS) || TOPIC_NOTE.is_match(text)
    }

    /// Hierarchy level of a heading block, always within `[1, 6]`.
    #[must_use]
    pub fn get_heading_level(&self, block: &Block) -> u8 {
        self.level_with(block, None)
    }

    fn level_with(&self, block: &Block, smart_level: Option<u8>) -> u8 {
        let text = block.trimmed();
        let level = if let Some(level) = block.heading_level {
            usize::from(level)
        } else if let Some(caps) = MARKDOWN_HEADING.captures(text) {
            caps.get(1).map_or(1, |m| m.len())
        } else if let Some(caps) = DECIMAL_NUMBERING.captures(text) {
            caps.get(1).map_or(1, |m| m.as_str().matches('.').count() + 1)
        } else if let Some(level) = smart_level {
            usize::from(level)
        } else if is_all_caps(text) || STRUCTURAL_LEAD.is_match(text) {
            1
        } else {
            match char_len(text) {
                0..30 => 1,
                30..50 => 2,
                _ => 3,
            }
        };
        level.clamp(1, usize::from(MAX_LEVEL)) as u8
    }

    /// Whether a text fragment is too small to stand as its own segment.
    ///
    /// Short fragments, runs of stop words and numbers, and fragments made
    /// only of tokens of three characters or less are all too small.
    #[must_use]
    pub fn is_too_small_for_segment(&self, text: &str) -> bool {
        let text = text.trim();
        if char_len(text) < self.config.min_segment_length {
            return true;
        }
        let tokens: Vec<&str> = text.split_whitespace().collect();
        let only_noise = tokens.iter().all(|token| {
            let word = token
                .trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase();
            word.is_empty() || STOP_WORDS.contains(&word.as_str()) || word.chars().all(char::is_numeric)
        });
        only_noise || tokens.iter().all(|token| char_len(token) <= 3)
    }

    /// Smart titles open sections when their normalized score clears the
    /// configured confidence threshold.
    fn smart_heading(&self, annotation: &TitleAnnotation) -> bool {
        self.config.headings_enabled()
            && annotation.is_smart_title
            && annotation.title_score / MAX_TITLE_SCORE >= self.config.confidence_threshold
    }

    fn filtered(&self, text: &str, report: &mut SegmentationReport) -> bool {
        let drop = self.config.filter_small_segments && self.is_too_small_for_segment(text);
        if drop {
            report.segments_filtered += 1;
        }
        drop
    }

    fn segment_paragraphs(
        &self,
        blocks: &[Block],
        annotations: &[TitleAnnotation],
        report: &mut SegmentationReport,
    ) -> Result<Vec<Segment>> {
        let mut segments = Vec::with_capacity(blocks.len());
        for (index, block) in blocks.iter().enumerate() {
            if block.is_blank() {
                continue;
            }
            let annotation = annotations.get(index).ok_or_else(|| {
                SegmenterError::segmentation("missing title annotation", Some(block.order))
            })?;

            if annotation.is_smart_title {
                let mut metadata = SegmentMetadata::from_block(block.order);
                metadata.title_score = Some(annotation.title_score);
                segments.push(Segment::Title(LeveledSegment {
                    text: block.trimmed().to_string(),
                    level: self.level_with(block, annotation.smart_hierarchy_level),
                    order: 0,
                    metadata,
                }));
                continue;
            }
            if block.is_heading && self.config.headings_enabled() {
                report.headings_detected += 1;
                segments.push(Segment::Heading(LeveledSegment {
                    text: heading_title(block.trimmed()).to_string(),
                    level: self.get_heading_level(block),
                    order: 0,
                    metadata: SegmentMetadata::from_block(block.order),
                }));
                continue;
            }
            if self.filtered(&block.text, report) {
                continue;
            }

            let (leaves, split) = paragraph::paragraph_leaves(
                block,
                self.config.max_segment_length,
                self.config.min_paragraph_length,
            );
            if split {
                report.segments_split += 1;
                tracing::debug!(block = block.order, parts = leaves.len(), "Split long paragraph");
            }
            segments.extend(leaves);
        }
        Ok(segments)
    }

    fn segment_grouped(
        &self,
        blocks: &[Block],
        annotations: &[TitleAnnotation],
        report: &mut SegmentationReport,
    ) -> Result<Vec<Segment>> {
        let mut builder = SectionBuilder::new(self);
        for (index, block) in blocks.iter().enumerate() {
            let annotation = annotations.get(index).ok_or_else(|| {
                SegmenterError::segmentation("missing title annotation", Some(block.order))
            })?;

            if block.is_blank() {
                builder.advance(SegmenterEvent::Blank);
            } else if self.is_heading(block) || self.smart_heading(annotation) {
                report.headings_detected += 1;
                let smart = annotation.smart_hierarchy_level.filter(|_| annotation.is_smart_title);
                let mut metadata = SegmentMetadata::from_block(block.order);
                if annotation.is_smart_title {
                    metadata.title_score = Some(annotation.title_score);
                }
                builder.open(
                    heading_title(block.trimmed()),
                    self.level_with(block, smart),
                    metadata,
                    report,
                )?;
            } else if !self.filtered(&block.text, report) {
                builder.content(block.trimmed(), block.order);
            }
        }
        Ok(builder.finish(report))
    }
}

/// Segments of a finished pass, or one fallback segment per block when the
/// pass failed. A failure resets the report to the fallback's counts.
fn recover(
    blocks: &[Block],
    report: &mut SegmentationReport,
    result: Result<Vec<Segment>>,
) -> Vec<Segment> {
    match result {
        Ok(segments) => segments,
        Err(err) => {
            tracing::warn!(error = %err, blocks = blocks.len(), "Heading segmentation failed, using paragraph fallback");
            *report = SegmentationReport {
                blocks_in: report.blocks_in,
                empty_blocks: report.empty_blocks,
                fallback_used: true,
                error: Some(err.to_string()),
                ..SegmentationReport::default()
            };
            fallback_segments(blocks)
        }
    }
}

/// Heading text without its Markdown hash prefix.
fn heading_title(text: &str) -> &str {
    MARKDOWN_HEADING
        .captures(text)
        .and_then(|caps| caps.get(2))
        .map_or(text, |m| m.as_str().trim())
}

struct OpenSection {
    title: String,
    level: u8,
    /// Content lines with the order of the block they came from.
    lines: Vec<(String, usize)>,
    children: Vec<Segment>,
    metadata: SegmentMetadata,
}

/// Stack of open sections driven by the state machine.
struct SectionBuilder<'a> {
    segmenter: &'a HeadingSegmenter,
    state: SegmenterState,
    stack: Vec<OpenSection>,
    output: Vec<Segment>,
}

impl<'a> SectionBuilder<'a> {
    fn new(segmenter: &'a HeadingSegmenter) -> Self {
        Self {
            segmenter,
            state: SegmenterState::Initial,
            stack: Vec::new(),
            output: Vec::new(),
        }
    }

    fn advance(&mut self, event: SegmenterEvent) {
        let next = self.state.transition(event);
        tracing::trace!(from = ?self.state, ?event, to = ?next, "State transition");
        self.state = next;
    }

    fn open(
        &mut self,
        title: &str,
        level: u8,
        metadata: SegmentMetadata,
        report: &mut SegmentationReport,
    ) -> Result<()> {
        let demote = self.state.demotes_on_heading();
        while self.stack.last().is_some_and(|top| top.level >= level) {
            let section = self.stack.pop().ok_or_else(|| {
                SegmenterError::segmentation("section stack underflow", metadata.source_block)
            })?;
            self.close(section, demote, report);
        }
        self.stack.push(OpenSection {
            title: title.to_string(),
            level,
            lines: Vec::new(),
            children: Vec::new(),
            metadata,
        });
        self.advance(SegmenterEvent::Heading);
        Ok(())
    }

    fn content(&mut self, text: &str, order: usize) {
        match self.stack.last_mut() {
            Some(top) => top.lines.push((text.to_string(), order)),
            None => self
                .output
                .push(Segment::paragraph(text, SegmentMetadata::from_block(order))),
        }
        self.advance(SegmenterEvent::Content);
    }

    fn close(&mut self, section: OpenSection, demote: bool, report: &mut SegmentationReport) {
        let config = &self.segmenter.config;
        // Empty sections are always demoted, thin ones only after content
        let thin = section.lines.is_empty()
            || (demote && section.lines.len() < config.min_heading_content);
        let closed = if thin && section.children.is_empty() {
            report.sections_demoted += 1;
            tracing::debug!(
                title = %section.title,
                lines = section.lines.len(),
                "Demoting section without enough content"
            );
            let mut leaves = vec![Segment::Heading(LeveledSegment {
                text: section.title,
                level: section.level,
                order: 0,
                metadata: section.metadata,
            })];
            leaves.extend(
                section
                    .lines
                    .into_iter()
                    .map(|(text, order)| Segment::paragraph(text, SegmentMetadata::from_block(order))),
            );
            leaves
        } else {
            report.sections_created += 1;
            let separator = if config.preserve_paragraphs { "\n\n" } else { " " };
            let content = section
                .lines
                .iter()
                .map(|(text, _)| text.as_str())
                .collect::<Vec<_>>()
                .join(separator);
            vec![Segment::Section(Section {
                title: section.title,
                level: section.level,
                content,
                children: section.children,
                order: 0,
                metadata: section.metadata,
            })]
        };

        match self.stack.last_mut() {
            Some(parent) => parent.children.extend(closed),
            None => self.output.extend(closed),
        }
    }

    /// Close every open section bottom-up.
    fn finish(mut self, report: &mut SegmentationReport) -> Vec<Segment> {
        while let Some(section) = self.stack.pop() {
            self.close(section, false, report);
        }
        self.advance(SegmenterEvent::EndOfStream);
        self.output
    }
}
