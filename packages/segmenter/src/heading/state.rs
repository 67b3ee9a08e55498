//! States and transitions of the section-building state machine.

/// Where the heading segmenter is while walking the block stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmenterState {
    /// No heading seen yet; content becomes standalone paragraphs.
    Initial,
    /// A heading opened a section that has no content yet.
    HeadingFound,
    /// The innermost open section is accumulating content lines.
    CollectingContent,
    /// End of stream; every open section has been closed.
    Finished,
}

/// Classified input block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmenterEvent {
    Heading,
    Content,
    Blank,
    EndOfStream,
}

impl SegmenterState {
    /// Next state for an event. Total over all pairs.
    #[must_use]
    pub fn transition(self, event: SegmenterEvent) -> Self {
        use SegmenterEvent as E;
        use SegmenterState as S;

        match (self, event) {
            (S::Finished, _) | (_, E::EndOfStream) => S::Finished,
            (_, E::Heading) => S::HeadingFound,
            (S::Initial, E::Content | E::Blank) => S::Initial,
            (S::HeadingFound, E::Blank) => S::HeadingFound,
            (S::HeadingFound | S::CollectingContent, E::Content) => S::CollectingContent,
            (S::CollectingContent, E::Blank) => S::CollectingContent,
        }
    }

    /// Whether sections closed by a heading in this state are checked for demotion.
    #[must_use]
    pub fn demotes_on_heading(self) -> bool {
        self == Self::CollectingContent
    }
}
