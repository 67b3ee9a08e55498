//! Author attribution.
//!
//! [`AuthorDetector`] extracts candidates from bylines and profile-specific
//! patterns, merges them by folded name and scores them.
//! [`ContextualAuthorDetector`] adds document title and filename evidence
//! checked against a known-author list. Both plug into the processor
//! through [`AuthorDetectionPort`].

mod contextual;
mod detector;
mod known;
mod names;
mod port;

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

pub use contextual::{ContextAuthor, ContextualAuthorDetector};
pub use detector::{AuthorDetector, METADATA_RULES, PROSE_RULES, VERSE_RULES};
pub use known::{KnownAuthors, BUILTIN_KNOWN_AUTHORS};
pub use names::{clean_author_name, has_name_shape, is_valid_author_name, same_name, NAME_PATTERN};
pub use port::AuthorDetectionPort;

use crate::text::fold_diacritics;
use crate::types::{collect_text, AuthorDetectionDetails, Segment, SegmentMetadata};

/// Evidence level of bylines and copyright lines.
pub const SOURCE_METADATA: &str = "metadata";
/// Evidence level of verse signatures.
pub const SOURCE_VERSE: &str = "verse";
/// Evidence level of prose citations and headers.
pub const SOURCE_PROSE: &str = "prose";

/// A possible author with the evidence collected for it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthorCandidate {
    pub name: String,
    /// Score in `[0, 1]`, filled in by scoring.
    pub confidence: f64,
    pub sources: BTreeSet<String>,
    /// Byte offsets of the extractions in the searched text.
    pub positions: Vec<usize>,
    /// Tag of the strongest rule that produced this candidate.
    pub extraction_method: String,
    /// Matched text around each extraction.
    pub context: Vec<String>,
    /// Highest rule weight seen per source.
    pub source_weights: BTreeMap<String, f64>,
}

/// A detected author.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthorResult {
    pub name: String,
    pub confidence: f64,
    pub method: String,
    pub details: AuthorDetectionDetails,
}

impl AuthorResult {
    /// Write this result into a segment's metadata.
    pub fn apply_to(&self, metadata: &mut SegmentMetadata) {
        metadata.detected_author = Some(self.name.clone());
        metadata.author_confidence = Some(self.confidence);
        metadata.author_detection_method = Some(self.method.clone());
        metadata.author_detection_details = Some(self.details.clone());
    }
}

/// Text searched for authors in a segment list: every text in document
/// order, one blank line between segments.
#[must_use]
pub fn segments_text(segments: &[Segment]) -> String {
    collect_text(segments).join("\n\n")
}

/// Folded titles of the sections, headings and poems in a segment list.
///
/// Merged poem titles ("A - B") contribute each part as well.
#[must_use]
pub fn segment_titles(segments: &[Segment]) -> BTreeSet<String> {
    let mut titles = BTreeSet::new();
    for segment in segments {
        segment.walk(&mut |s| {
            let title = match s {
                Segment::Section(section) => section.title.as_str(),
                Segment::Heading(h) | Segment::Title(h) => h.text.as_str(),
                Segment::Poem(poem) => poem.title.as_str(),
                Segment::Paragraph(_) | Segment::Fallback(_) => return,
            };
            titles.insert(fold_diacritics(title));
            for part in title.split(" - ") {
                titles.insert(fold_diacritics(part));
            }
        });
    }
    titles.remove("");
    titles
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_to_metadata() {
        let result = AuthorResult {
            name: "Juan Pérez".to_string(),
            confidence: 0.8,
            method: "byline".to_string(),
            details: AuthorDetectionDetails {
                sources: vec!["metadata".to_string()],
                frequency: 3,
                total_candidates: 1,
                threshold_used: 0.6,
            },
        };
        let mut metadata = SegmentMetadata::default();
        result.apply_to(&mut metadata);
        assert_eq!(metadata.detected_author.as_deref(), Some("Juan Pérez"));
        assert_eq!(metadata.author_detection_details.unwrap().frequency, 3);
    }

    #[test]
    fn test_segment_titles() {
        let segments = vec![
            Segment::Poem(crate::types::Poem {
                title: "SONETOS - La Espera".to_string(),
                text: "SONETOS - La Espera\n\nun verso".to_string(),
                verse_count: 1,
                order: 0,
                metadata: SegmentMetadata::default(),
            }),
            Segment::paragraph("Canción de Otoño", SegmentMetadata::default()),
        ];
        let titles = segment_titles(&segments);
        assert!(titles.contains("sonetos - la espera"));
        assert!(titles.contains("la espera"));
        assert!(!titles.contains("cancion de otono"));
    }

    #[test]
    fn test_segments_text() {
        let segments = vec![
            Segment::paragraph("uno", SegmentMetadata::default()),
            Segment::paragraph("dos", SegmentMetadata::default()),
        ];
        assert_eq!(segments_text(&segments), "uno\n\ndos");
    }
}
