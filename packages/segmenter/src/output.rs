//! JSON and NDJSON rendering of segments.

use serde::Serialize;

use crate::error::Result;
use crate::types::{Segment, SegmentMetadata};

/// Serialized shape of one segment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentRecord {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
    pub order: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verse_count: Option<usize>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<SegmentRecord>,
    pub metadata: SegmentMetadata,
    /// Order of the enclosing section in flattened output.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_order: Option<usize>,
}

impl SegmentRecord {
    fn shallow(segment: &Segment) -> Self {
        let (title, level, verse_count) = match segment {
            Segment::Section(s) => (Some(s.title.clone()), Some(s.level), None),
            Segment::Heading(h) | Segment::Title(h) => (None, Some(h.level), None),
            Segment::Poem(p) => (Some(p.title.clone()), None, Some(p.verse_count)),
            Segment::Paragraph(_) | Segment::Fallback(_) => (None, None, None),
        };
        Self {
            kind: segment.kind().into_owned(),
            text: segment.text().to_string(),
            order: segment.order(),
            title,
            level,
            verse_count,
            children: Vec::new(),
            metadata: segment.metadata().clone(),
            parent_order: None,
        }
    }
}

impl From<&Segment> for SegmentRecord {
    fn from(segment: &Segment) -> Self {
        let mut record = Self::shallow(segment);
        record.children = segment.children().iter().map(Self::from).collect();
        record
    }
}

/// Nested records, one per top-level segment.
#[must_use]
pub fn to_records(segments: &[Segment]) -> Vec<SegmentRecord> {
    segments.iter().map(SegmentRecord::from).collect()
}

/// Every segment in pre-order without nesting; children point to their
/// section through `parent_order`.
#[must_use]
pub fn flatten(segments: &[Segment]) -> Vec<SegmentRecord> {
    fn visit(segment: &Segment, parent: Option<usize>, out: &mut Vec<SegmentRecord>) {
        let mut record = SegmentRecord::shallow(segment);
        record.parent_order = parent;
        out.push(record);
        for child in segment.children() {
            visit(child, Some(segment.order()), out);
        }
    }

    let mut out = Vec::new();
    for segment in segments {
        visit(segment, None, &mut out);
    }
    out
}

/// Pretty-printed JSON array of nested records.
pub fn to_json(segments: &[Segment]) -> Result<String> {
    Ok(serde_json::to_string_pretty(&to_records(segments))?)
}

/// One flattened record per line.
pub fn to_ndjson(segments: &[Segment]) -> Result<String> {
    let mut out = String::new();
    for record in flatten(segments) {
        out.push_str(&serde_json::to_string(&record)?);
        out.push('\n');
    }
    Ok(out)
}
