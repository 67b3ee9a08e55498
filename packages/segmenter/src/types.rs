//! Core data types for the segmenter.
//!
//! Blocks come in from document loaders and are never modified. Segments are
//! the engine's output: a closed sum type with one variant per segment kind,
//! each carrying only the fields that kind needs.

use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Horizontal alignment reported by a loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Left,
    #[serde(alias = "centre", alias = "centered")]
    Center,
    Right,
    Justify,
    Indented,
    /// Any alignment value this crate does not interpret.
    #[serde(other)]
    Other,
}

/// Optional layout information attached to a block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualMetadata {
    pub font_size: Option<f64>,
    pub is_bold: bool,
    pub is_centered: bool,
    pub alignment: Option<Alignment>,
    pub text_length: Option<usize>,
}

impl VisualMetadata {
    /// Centered either by flag or by alignment.
    #[must_use]
    pub fn centered(&self) -> bool {
        self.is_centered || self.alignment == Some(Alignment::Center)
    }

    #[must_use]
    pub fn indented(&self) -> bool {
        self.alignment == Some(Alignment::Indented)
    }
}

/// A unit of extracted text as produced by an upstream loader.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub text: String,

    /// Position in the document (page or reading order).
    #[serde(default, alias = "page", alias = "index")]
    pub order: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visual_metadata: Option<VisualMetadata>,

    #[serde(default)]
    pub is_heading: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading_level: Option<u8>,
}

impl Block {
    /// Create a plain text block.
    #[must_use]
    pub fn new(text: impl Into<String>, order: usize) -> Self {
        Self {
            text: text.into(),
            order,
            ..Self::default()
        }
    }

    /// Attach visual metadata.
    #[must_use]
    pub fn with_visual(mut self, visual: VisualMetadata) -> Self {
        self.visual_metadata = Some(visual);
        self
    }

    /// Mark as a heading with an optional explicit level.
    #[must_use]
    pub fn with_heading(mut self, level: Option<u8>) -> Self {
        self.is_heading = true;
        self.heading_level = level;
        self
    }

    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    #[must_use]
    pub fn trimmed(&self) -> &str {
        self.text.trim()
    }

    #[must_use]
    pub fn is_bold(&self) -> bool {
        self.visual_metadata.as_ref().is_some_and(|v| v.is_bold)
    }

    #[must_use]
    pub fn is_centered(&self) -> bool {
        self.visual_metadata.as_ref().is_some_and(VisualMetadata::centered)
    }

    #[must_use]
    pub fn is_indented(&self) -> bool {
        self.visual_metadata.as_ref().is_some_and(VisualMetadata::indented)
    }

    #[must_use]
    pub fn font_size(&self) -> Option<f64> {
        self.visual_metadata
            .as_ref()
            .and_then(|v| v.font_size)
            .filter(|size| size.is_finite() && *size > 0.0)
    }
}

/// Build one block per line of plain text.
///
/// Blank lines are kept as blank blocks so that stanza and paragraph breaks
/// survive.
#[must_use]
pub fn blocks_from_text(text: &str) -> Vec<Block> {
    text.lines()
        .enumerate()
        .map(|(i, line)| Block::new(line, i))
        .collect()
}

/// Per-document context used by author attribution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentContext {
    pub title: Option<String>,
    pub filename: Option<String>,
    pub metadata: BTreeMap<String, String>,
}

impl DocumentContext {
    #[must_use]
    pub fn new(title: Option<String>, filename: Option<String>) -> Self {
        Self {
            title,
            filename,
            metadata: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.filename.is_none() && self.metadata.is_empty()
    }
}

/// Which pass of the verse segmenter produced a poem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionPass {
    Primary,
    Fallback,
}

/// Summary of how an author was attributed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorDetectionDetails {
    pub sources: Vec<String>,
    pub frequency: usize,
    pub total_candidates: usize,
    pub threshold_used: f64,
}

/// Metadata map carried by every segment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SegmentMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detected_author: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_confidence: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_detection_method: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_detection_details: Option<AuthorDetectionDetails>,

    /// `(part, total)` for leaves produced by splitting one block, 1-based.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub split_part: Option<(usize, usize)>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub title_score: Option<f64>,

    /// Tag of the rule that accepted a poem title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title_rule: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub detection_pass: Option<DetectionPass>,

    /// Order of the input block this segment starts at.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_block: Option<usize>,
}

impl SegmentMetadata {
    #[must_use]
    pub fn from_block(order: usize) -> Self {
        Self {
            source_block: Some(order),
            ..Self::default()
        }
    }
}

/// A section owning its content and nested subsections.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub title: String,
    pub level: u8,
    pub content: String,
    pub children: Vec<Segment>,
    pub order: usize,
    pub metadata: SegmentMetadata,
}

/// A plain text leaf (paragraphs and fallback segments).
#[derive(Debug, Clone, PartialEq)]
pub struct TextSegment {
    pub text: String,
    pub order: usize,
    pub metadata: SegmentMetadata,
}

impl TextSegment {
    #[must_use]
    pub fn new(text: impl Into<String>, metadata: SegmentMetadata) -> Self {
        Self {
            text: text.into(),
            order: 0,
            metadata,
        }
    }
}

/// A leaf with a hierarchy level (standalone headings and smart titles).
#[derive(Debug, Clone, PartialEq)]
pub struct LeveledSegment {
    pub text: String,
    pub level: u8,
    pub order: usize,
    pub metadata: SegmentMetadata,
}

/// An assembled poem.
#[derive(Debug, Clone, PartialEq)]
pub struct Poem {
    pub title: String,
    /// Title followed by the verses, stanza breaks preserved.
    pub text: String,
    pub verse_count: usize,
    pub order: usize,
    pub metadata: SegmentMetadata,
}

/// A semantic unit produced by the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    Section(Section),
    Paragraph(TextSegment),
    Heading(LeveledSegment),
    Poem(Poem),
    /// Smart title; serialized as `title_level_N`.
    Title(LeveledSegment),
    /// Block emitted by the failure fallback.
    Fallback(TextSegment),
}

impl Segment {
    /// Build a paragraph leaf.
    #[must_use]
    pub fn paragraph(text: impl Into<String>, metadata: SegmentMetadata) -> Self {
        Self::Paragraph(TextSegment::new(text, metadata))
    }

    /// Build a fallback leaf.
    #[must_use]
    pub fn fallback(text: impl Into<String>, metadata: SegmentMetadata) -> Self {
        Self::Fallback(TextSegment::new(text, metadata))
    }

    /// Type string of the output contract.
    #[must_use]
    pub fn kind(&self) -> Cow<'static, str> {
        match self {
            Self::Section(_) => Cow::Borrowed("section"),
            Self::Paragraph(_) => Cow::Borrowed("paragraph"),
            Self::Heading(_) => Cow::Borrowed("heading"),
            Self::Poem(_) => Cow::Borrowed("poem"),
            Self::Title(t) => Cow::Owned(format!("title_level_{}", t.level)),
            Self::Fallback(_) => Cow::Borrowed("fallback_segment"),
        }
    }

    /// Main text of the segment (section content for sections).
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Section(s) => &s.content,
            Self::Paragraph(t) | Self::Fallback(t) => &t.text,
            Self::Heading(h) | Self::Title(h) => &h.text,
            Self::Poem(p) => &p.text,
        }
    }

    #[must_use]
    pub fn order(&self) -> usize {
        match self {
            Self::Section(s) => s.order,
            Self::Paragraph(t) | Self::Fallback(t) => t.order,
            Self::Heading(h) | Self::Title(h) => h.order,
            Self::Poem(p) => p.order,
        }
    }

    fn set_order(&mut self, order: usize) {
        match self {
            Self::Section(s) => s.order = order,
            Self::Paragraph(t) | Self::Fallback(t) => t.order = order,
            Self::Heading(h) | Self::Title(h) => h.order = order,
            Self::Poem(p) => p.order = order,
        }
    }

    #[must_use]
    pub fn metadata(&self) -> &SegmentMetadata {
        match self {
            Self::Section(s) => &s.metadata,
            Self::Paragraph(t) | Self::Fallback(t) => &t.metadata,
            Self::Heading(h) | Self::Title(h) => &h.metadata,
            Self::Poem(p) => &p.metadata,
        }
    }

    pub fn metadata_mut(&mut self) -> &mut SegmentMetadata {
        match self {
            Self::Section(s) => &mut s.metadata,
            Self::Paragraph(t) | Self::Fallback(t) => &mut t.metadata,
            Self::Heading(h) | Self::Title(h) => &mut h.metadata,
            Self::Poem(p) => &mut p.metadata,
        }
    }

    /// Child segments; empty for leaves.
    #[must_use]
    pub fn children(&self) -> &[Segment] {
        match self {
            Self::Section(s) => &s.children,
            _ => &[],
        }
    }

    #[must_use]
    pub fn is_leaf(&self) -> bool {
        !matches!(self, Self::Section(_))
    }

    /// Visit this segment and all descendants in pre-order.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Segment)) {
        visit(self);
        for child in self.children() {
            child.walk(visit);
        }
    }

    /// Mutable pre-order visit.
    pub fn walk_mut(&mut self, visit: &mut impl FnMut(&mut Segment)) {
        visit(self);
        if let Self::Section(section) = self {
            for child in &mut section.children {
                child.walk_mut(visit);
            }
        }
    }
}

/// Renumber segments in pre-order starting at 0.
pub fn assign_order(segments: &mut [Segment]) {
    let mut next = 0usize;
    for segment in segments.iter_mut() {
        segment.walk_mut(&mut |s| {
            s.set_order(next);
            next += 1;
        });
    }
}

/// All text carried by a segment list, in document order.
///
/// Section titles precede their content; poem text already includes the title.
#[must_use]
pub fn collect_text(segments: &[Segment]) -> Vec<&str> {
    let mut parts = Vec::new();
    for segment in segments {
        segment.walk(&mut |s| {
            if let Segment::Section(section) = s {
                parts.push(section.title.as_str());
            }
            if !s.text().is_empty() {
                parts.push(s.text());
            }
        });
    }
    parts
}

/// Statistics for a single segmentation call.
///
/// Created fresh by every `segment()` call, never stored on a segmenter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentationReport {
    pub blocks_in: usize,
    pub empty_blocks: usize,
    pub headings_detected: usize,
    pub sections_created: usize,
    pub sections_demoted: usize,
    pub segments_split: usize,
    pub segments_filtered: usize,
    pub blocks_pre_split: usize,
    pub poems_detected: usize,
    pub fallback_used: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Segments plus the report of the call that produced them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SegmentationOutput {
    pub segments: Vec<Segment>,
    pub report: SegmentationReport,
}

impl SegmentationOutput {
    /// Number of leaf segments in the tree.
    #[must_use]
    pub fn leaf_count(&self) -> usize {
        let mut count = 0;
        for segment in &self.segments {
            segment.walk(&mut |s| {
                if s.is_leaf() {
                    count += 1;
                }
            });
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> Vec<Segment> {
        let child = Segment::Section(Section {
            title: "Sub".to_string(),
            level: 2,
            content: "Body two.".to_string(),
            children: Vec::new(),
            order: 0,
            metadata: SegmentMetadata::default(),
        });
        vec![
            Segment::Section(Section {
                title: "Title".to_string(),
                level: 1,
                content: "Body one.".to_string(),
                children: vec![child],
                order: 0,
                metadata: SegmentMetadata::default(),
            }),
            Segment::paragraph("Tail", SegmentMetadata::default()),
        ]
    }

    #[test]
    fn test_block_deserialize_with_aliases() {
        let json = r#"{"text": "Hola", "page": 3, "visual_metadata": {"font_size": 14.0, "is_bold": true, "alignment": "center"}}"#;
        let block: Block = serde_json::from_str(json).unwrap();
        assert_eq!(block.order, 3);
        assert!(block.is_bold());
        assert!(block.is_centered());
        assert_eq!(block.font_size(), Some(14.0));
        assert!(!block.is_heading);
    }

    #[test]
    fn test_unknown_alignment_is_other() {
        let json = r#"{"text": "x", "visual_metadata": {"alignment": "distributed"}}"#;
        let block: Block = serde_json::from_str(json).unwrap();
        assert_eq!(
            block.visual_metadata.unwrap().alignment,
            Some(Alignment::Other)
        );
    }

    #[test]
    fn test_font_size_ignores_invalid_values() {
        let block = Block::new("x", 0).with_visual(VisualMetadata {
            font_size: Some(0.0),
            ..VisualMetadata::default()
        });
        assert_eq!(block.font_size(), None);
    }

    #[test]
    fn test_blocks_from_text_keeps_blank_lines() {
        let blocks = blocks_from_text("uno\n\ndos");
        assert_eq!(blocks.len(), 3);
        assert!(blocks[1].is_blank());
        assert_eq!(blocks[2].order, 2);
    }

    #[test]
    fn test_segment_kind() {
        let title = Segment::Title(LeveledSegment {
            text: "Prólogo".to_string(),
            level: 2,
            order: 0,
            metadata: SegmentMetadata::default(),
        });
        assert_eq!(title.kind(), "title_level_2");
        assert_eq!(
            Segment::fallback("x", SegmentMetadata::default()).kind(),
            "fallback_segment"
        );
    }

    #[test]
    fn test_assign_order_pre_order() {
        let mut segments = sample_tree();
        assign_order(&mut segments);

        let mut orders = Vec::new();
        for s in &segments {
            s.walk(&mut |seg| orders.push(seg.order()));
        }
        assert_eq!(orders, vec![0, 1, 2]);
    }

    #[test]
    fn test_collect_text_includes_titles() {
        let segments = sample_tree();
        assert_eq!(
            collect_text(&segments),
            vec!["Title", "Body one.", "Sub", "Body two.", "Tail"]
        );
    }

    #[test]
    fn test_leaf_count() {
        let output = SegmentationOutput {
            segments: sample_tree(),
            report: SegmentationReport::default(),
        };
        assert_eq!(output.leaf_count(), 1);
    }
}
