//! Document processor that ties segmentation and author attribution together.

use crate::author::{AuthorDetectionPort, AuthorResult, ContextualAuthorDetector};
use crate::config::{builtin_profile, ProfileType, SegmenterConfig};
use crate::error::Result;
use crate::heading::HeadingSegmenter;
use crate::types::{Block, DocumentContext, Segment, SegmentationOutput, SegmentationReport};
use crate::verse::VerseSegmenter;

/// Result of processing one document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessedDocument {
    pub segments: Vec<Segment>,
    pub report: SegmentationReport,
    /// Author written into every segment's metadata, if any.
    pub author: Option<AuthorResult>,
}

/// Single entry point of the engine.
///
/// Holds no per-document state; one processor can handle any number of
/// documents in sequence.
pub struct DocumentProcessor {
    config: SegmenterConfig,
    segmenter: Segmenter,
    author_port: Option<Box<dyn AuthorDetectionPort>>,
}

/// Segmenter selected by the profile, built once per processor.
#[derive(Debug, Clone)]
enum Segmenter {
    Heading(HeadingSegmenter),
    Verse(VerseSegmenter),
}

impl Segmenter {
    fn for_config(config: &SegmenterConfig) -> Result<Self> {
        Ok(match config.profile {
            ProfileType::Verse => Self::Verse(VerseSegmenter::new(config)?),
            ProfileType::Prose => Self::Heading(HeadingSegmenter::new(config)),
        })
    }
}

impl std::fmt::Debug for DocumentProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentProcessor")
            .field("config", &self.config)
            .field("author_detection", &self.author_port.is_some())
            .finish()
    }
}

impl DocumentProcessor {
    /// Processor with the contextual author detector.
    pub fn new(config: SegmenterConfig) -> Result<Self> {
        let port = ContextualAuthorDetector::new(config.author_detection.clone());
        Self::with_port(config, Box::new(port))
    }

    /// Processor for a named built-in profile.
    pub fn from_profile(name: &str) -> Result<Self> {
        Self::new(builtin_profile(name)?)
    }

    /// Processor that never attributes authors.
    pub fn without_author_detection(config: SegmenterConfig) -> Result<Self> {
        Self::build(config, None)
    }

    /// Processor using a caller-supplied author detection capability.
    pub fn with_port(config: SegmenterConfig, port: Box<dyn AuthorDetectionPort>) -> Result<Self> {
        Self::build(config, Some(port))
    }

    /// All configuration problems surface here, never while processing.
    fn build(
        config: SegmenterConfig,
        author_port: Option<Box<dyn AuthorDetectionPort>>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            segmenter: Segmenter::for_config(&config)?,
            config,
            author_port,
        })
    }

    #[must_use]
    pub fn config(&self) -> &SegmenterConfig {
        &self.config
    }

    #[must_use]
    pub fn has_author_detection(&self) -> bool {
        self.author_port.is_some()
    }

    /// Segment blocks with the segmenter selected by the profile.
    #[must_use]
    pub fn segment(&self, blocks: &[Block]) -> SegmentationOutput {
        match &self.segmenter {
            Segmenter::Verse(segmenter) => segmenter.segment(blocks),
            Segmenter::Heading(segmenter) => segmenter.segment(blocks),
        }
    }

    /// Run author detection over already segmented text.
    #[must_use]
    pub fn detect_author(
        &self,
        segments: &[Segment],
        context: &DocumentContext,
    ) -> Option<AuthorResult> {
        let detection = &self.config.author_detection;
        if !detection.enabled || segments.is_empty() {
            return None;
        }
        let port = self.author_port.as_deref()?;
        port.detect_with_context(segments, self.config.profile, detection, context)
    }

    /// Segment a document and annotate every segment with its author.
    #[must_use]
    pub fn process(&self, blocks: &[Block], context: &DocumentContext) -> ProcessedDocument {
        tracing::debug!(
            blocks = blocks.len(),
            profile = %self.config.profile,
            title = context.title.as_deref(),
            "Processing document"
        );
        let SegmentationOutput {
            mut segments,
            report,
        } = self.segment(blocks);

        let author = self.detect_author(&segments, context);
        match &author {
            Some(result) => {
                for segment in &mut segments {
                    segment.walk_mut(&mut |s| result.apply_to(s.metadata_mut()));
                }
                tracing::debug!(
                    author = %result.name,
                    confidence = result.confidence,
                    method = %result.method,
                    "Annotated segments with author"
                );
            }
            None if self.has_author_detection() && self.config.author_detection.enabled => {
                tracing::debug!("No author detected");
            }
            None => {}
        }

        ProcessedDocument {
            segments,
            report,
            author,
        }
    }
}
