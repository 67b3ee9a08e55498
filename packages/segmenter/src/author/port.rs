//! Capability interface through which the processor reaches author detection.

use super::AuthorResult;
use crate::config::{AuthorDetectionConfig, ProfileType};
use crate::types::{DocumentContext, Segment};

/// Author detection as seen by [`crate::DocumentProcessor`].
///
/// Implementations never fail; "no author" is `None`.
pub trait AuthorDetectionPort: Send + Sync {
    fn detect_author_in_segments(
        &self,
        segments: &[Segment],
        profile: ProfileType,
        config: &AuthorDetectionConfig,
    ) -> Option<AuthorResult>;

    /// Detection that may use the document title and filename.
    ///
    /// Defaults to ignoring the context.
    fn detect_with_context(
        &self,
        segments: &[Segment],
        profile: ProfileType,
        config: &AuthorDetectionConfig,
        context: &DocumentContext,
    ) -> Option<AuthorResult> {
        let _ = context;
        self.detect_author_in_segments(segments, profile, config)
    }
}
