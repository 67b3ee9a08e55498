//! Biblio segmenter - Turn extracted text blocks into semantic segments.
//!
//! Blocks from a document loader become sections, paragraphs, headings and
//! poems, and every segment is annotated with the detected author.
//!
//! # Example
//!
//! ```
//! use biblio_segmenter::{blocks_from_text, DocumentContext, DocumentProcessor, Segment};
//!
//! let processor = DocumentProcessor::from_profile("verse").unwrap();
//! let blocks = blocks_from_text("\"Cementerio\"\nLine one\nLine two");
//! let doc = processor.process(&blocks, &DocumentContext::default());
//!
//! let Segment::Poem(poem) = &doc.segments[0] else { panic!("expected a poem") };
//! assert_eq!(poem.title, "Cementerio");
//! assert_eq!(poem.verse_count, 2);
//! ```
//!
//! # Architecture
//!
//! - [`config`]: Configuration tree, YAML loading and built-in profiles
//! - [`types`]: Blocks, the segment sum type and per-call reports
//! - [`error`]: Error types and Result alias
//! - [`text`]: Shared text predicates
//! - [`rules`]: Ordered rule tables shared by the detectors
//! - [`title`]: Title scoring from layout statistics
//! - [`heading`]: Heading-based sections and paragraph mode
//! - [`verse`]: Poem detection
//! - [`author`]: Author attribution
//! - [`processor`]: Profile dispatch and author annotation
//! - [`output`]: JSON and NDJSON rendering
//! - [`cli`]: Command-line interface

pub mod author;
pub mod cli;
pub mod config;
pub mod error;
pub mod heading;
pub mod output;
pub mod processor;
pub mod rules;
pub mod text;
pub mod title;
pub mod types;
pub mod verse;

// Re-export main entry points
pub use processor::{DocumentProcessor, ProcessedDocument};

// Re-export commonly used items
pub use author::{AuthorDetectionPort, AuthorDetector, AuthorResult, ContextualAuthorDetector};
pub use config::{builtin_profile, get_author_detection_config, ProfileType, SegmenterConfig};
pub use error::{Result, SegmenterError};
pub use heading::HeadingSegmenter;
pub use title::TitleDetector;
pub use types::{
    blocks_from_text, Block, DocumentContext, Segment, SegmentationOutput, SegmentationReport,
};
pub use verse::VerseSegmenter;
