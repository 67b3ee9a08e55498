//! VerseSegmenter: poems from poetry collections.
//!
//! Oversized blocks are first split at poem-opening lines. The primary pass
//! then opens a poem at every block accepted by the title cascade that is
//! followed, within a short lookahead, by verse-like lines. When that finds
//! nothing, a looser fallback pass runs over the same blocks.

mod cleanup;
mod patterns;

pub use cleanup::PoemCleaner;
pub use patterns::{
    fallback_title_rule, is_internal_subtitle, is_page_footer, is_poem_opening_line,
    is_verse_like, title_rule, FallbackLine, FALLBACK_TITLE_RULES, TITLE_ACCEPT_RULES,
    VERSE_REJECT_RULES,
};

use crate::config::{SegmenterConfig, VerseConfig};
use crate::error::Result;
use crate::heading::fallback_segments;
use crate::text::{char_len, count_nonempty_lines, strip_quotes};
use crate::types::{
    assign_order, Block, DetectionPass, Poem, Segment, SegmentMetadata, SegmentationOutput,
    SegmentationReport,
};

/// Poem segmenter for verse documents.
#[derive(Debug, Clone)]
pub struct VerseSegmenter {
    config: VerseConfig,
    cleaner: PoemCleaner,
}

struct PoemBuilder {
    title: String,
    rule: &'static str,
    source_block: usize,
    body: Vec<String>,
}

impl PoemBuilder {
    fn has_verses(&self) -> bool {
        self.body.iter().any(|line| !line.trim().is_empty())
    }

    fn finish(self, cleaner: &PoemCleaner, pass: DetectionPass) -> Segment {
        let body = cleaner.clean_text(&self.body.join("\n"));
        let text = if body.is_empty() {
            self.title.clone()
        } else {
            format!("{}\n\n{body}", self.title)
        };
        let mut metadata = SegmentMetadata::from_block(self.source_block);
        metadata.title_rule = Some(self.rule.to_string());
        metadata.detection_pass = Some(pass);

        Segment::Poem(Poem {
            title: self.title,
            text,
            verse_count: count_nonempty_lines(&body),
            order: 0,
            metadata,
        })
    }
}

impl VerseSegmenter {
    /// # Errors
    /// Returns [`crate::SegmenterError::InvalidPattern`] when a configured
    /// artifact pattern does not compile.
    pub fn new(config: &SegmenterConfig) -> Result<Self> {
        Ok(Self {
            cleaner: PoemCleaner::new(&config.verse.artifact_patterns)?,
            config: config.verse.clone(),
        })
    }

    /// Segment a verse document into poems.
    ///
    /// Blocks before the first poem are kept as paragraphs. When neither
    /// pass finds a poem, every non-empty block becomes a fallback segment.
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

        let (blocks, split) = self.pre_split_large_blocks(blocks);
        report.blocks_pre_split = split;

        let mut segments = self.assemble(&blocks, DetectionPass::Primary);
        if segments.is_empty() {
            tracing::debug!(blocks = blocks.len(), "No poems in primary pass, running fallback");
            report.fallback_used = true;
            segments = self.fallback_segmentation(&blocks);
        }
        if segments.is_empty() {
            tracing::warn!(blocks = blocks.len(), "No poems detected, emitting blocks as fallback segments");
            segments = fallback_segments(&blocks);
        }

        report.poems_detected = segments
            .iter()
            .filter(|s| matches!(s, Segment::Poem(_)))
            .count();
        assign_order(&mut segments);

        tracing::debug!(
            blocks = report.blocks_in,
            poems = report.poems_detected,
            pre_split = report.blocks_pre_split,
            fallback = report.fallback_used,
            "Verse segmentation complete"
        );
        SegmentationOutput { segments, report }
    }

    /// Split blocks longer than the pre-split threshold at poem-opening lines.
    ///
    /// Each opening line becomes its own block; the lines between openings
    /// stay together. Returns the new block list and the number of blocks
    /// that were split.
    #[must_use]
    pub fn pre_split_large_blocks(&self, blocks: &[Block]) -> (Vec<Block>, usize) {
        let mut out = Vec::with_capacity(blocks.len());
        let mut split_count = 0;

        for block in blocks {
            if char_len(&block.text) <= self.config.pre_split_threshold {
                out.push(block.clone());
                continue;
            }

            let mut pieces: Vec<String> = Vec::new();
            let mut current: Vec<&str> = Vec::new();
            for line in block.text.lines() {
                if is_poem_opening_line(line) {
                    flush_lines(&mut current, &mut pieces);
                    pieces.push(line.trim().to_string());
                } else {
                    current.push(line);
                }
            }
            flush_lines(&mut current, &mut pieces);

            if pieces.len() <= 1 {
                out.push(block.clone());
                continue;
            }
            split_count += 1;
            tracing::debug!(block = block.order, pieces = pieces.len(), "Pre-split oversized block");
            out.extend(pieces.into_iter().map(|piece| Block::new(piece, block.order)));
        }
        (out, split_count)
    }

    /// Whether a block passes the title cascade on its own.
    #[must_use]
    pub fn is_title_block(&self, block: &Block) -> bool {
        title_rule(block).is_some()
    }

    /// Whether `blocks[index]` opens a poem.
    #[must_use]
    pub fn is_main_title(&self, blocks: &[Block], index: usize) -> bool {
        self.main_title_rule(blocks, index).is_some()
    }

    fn main_title_rule(&self, blocks: &[Block], index: usize) -> Option<&'static str> {
        let block = blocks.get(index)?;
        let rule = title_rule(block)?;
        if is_internal_subtitle(block.trimmed()) {
            return None;
        }

        let mut next = index + 1;
        while blocks.get(next).is_some_and(Block::is_blank) {
            next += 1;
        }
        if next - index - 1 > self.config.max_blank_after_title {
            return None;
        }
        self.has_verse_ahead(blocks, next, self.config.title_lookahead)
            .then_some(rule)
    }

    /// At least one verse-like block among the next `lookahead` non-blank
    /// blocks starting at `start`.
    fn has_verse_ahead(&self, blocks: &[Block], start: usize, lookahead: usize) -> bool {
        blocks
            .iter()
            .skip(start)
            .filter(|b| !b.is_blank())
            .take(lookahead)
            .any(|b| is_verse_like(b, self.config.max_verse_length))
    }

    /// Looser pass used when the primary pass finds no poem.
    #[must_use]
    pub fn fallback_segmentation(&self, blocks: &[Block]) -> Vec<Segment> {
        self.assemble(blocks, DetectionPass::Fallback)
    }

    fn fallback_title(&self, blocks: &[Block], index: usize) -> Option<&'static str> {
        let rule = fallback_title_rule(blocks, index)?;
        self.has_verse_ahead(blocks, index + 1, self.config.fallback_lookahead)
            .then_some(rule)
    }

    /// Accumulate verses under detected titles.
    ///
    /// Returns an empty list when no poem was opened.
    fn assemble(&self, blocks: &[Block], pass: DetectionPass) -> Vec<Segment> {
        let mut preamble: Vec<Segment> = Vec::new();
        let mut poems: Vec<Segment> = Vec::new();
        let mut current: Option<PoemBuilder> = None;

        for (index, block) in blocks.iter().enumerate() {
            if block.is_blank() {
                if let Some(poem) = current.as_mut() {
                    poem.body.push(String::new());
                }
                continue;
            }

            let rule = match pass {
                DetectionPass::Primary => self.main_title_rule(blocks, index),
                DetectionPass::Fallback => self.fallback_title(blocks, index),
            };
            if let Some(rule) = rule {
                let title = strip_quotes(block.trimmed());
                match current.as_mut() {
                    // Consecutive titles belong to one poem
                    Some(poem) if !poem.has_verses() => {
                        poem.title = format!("{} - {title}", poem.title);
                    }
                    _ => {
                        if let Some(done) = current.take() {
                            poems.push(done.finish(&self.cleaner, pass));
                        }
                        current = Some(PoemBuilder {
                            title: title.to_string(),
                            rule,
                            source_block: block.order,
                            body: Vec::new(),
                        });
                    }
                }
                continue;
            }

            match current.as_mut() {
                Some(poem) => {
                    let cleaned = self.cleaner.clean_block(&block.text);
                    if !cleaned.trim().is_empty() {
                        poem.body.push(cleaned);
                    }
                }
                None => preamble.push(Segment::paragraph(
                    block.trimmed(),
                    SegmentMetadata::from_block(block.order),
                )),
            }
        }
        if let Some(done) = current {
            poems.push(done.finish(&self.cleaner, pass));
        }

        if poems.is_empty() {
            return Vec::new();
        }
        preamble.extend(poems);
        preamble
    }
}

fn flush_lines(current: &mut Vec<&str>, pieces: &mut Vec<String>) {
    if current.iter().any(|line| !line.trim().is_empty()) {
        pieces.push(current.join("\n").trim().to_string());
    }
    current.clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SegmenterError;
    use crate::types::VisualMetadata;

    fn segmenter() -> VerseSegmenter {
        VerseSegmenter::new(&SegmenterConfig::default()).unwrap()
    }

    fn blocks(lines: &[&str]) -> Vec<Block> {
        lines
            .iter()
            .enumerate()
            .map(|(i, line)| Block::new(*line, i))
            .collect()
    }

    fn poem(segment: &Segment) -> &Poem {
        match segment {
            Segment::Poem(p) => p,
            other => panic!("expected poem, got {}", other.kind()),
        }
    }

    #[test]
    fn test_quoted_title_poem() {
        let output = segmenter().segment(&blocks(&["\"Cementerio\"", "Line one", "Line two"]));
        assert_eq!(output.segments.len(), 1);
        let p = poem(&output.segments[0]);
        assert_eq!(p.title, "Cementerio");
        assert_eq!(p.verse_count, 2);
        assert_eq!(p.text, "Cementerio\n\nLine one\nLine two");
        assert_eq!(p.metadata.detection_pass, Some(DetectionPass::Primary));
        assert_eq!(p.metadata.title_rule.as_deref(), Some("quoted_title"));
    }

    #[test]
    fn test_stanza_breaks_and_multiple_poems() {
        let output = segmenter().segment(&blocks(&[
            "I",
            "",
            "primer verso",
            "",
            "",
            "",
            "segunda estrofa",
            "II",
            "otro verso",
        ]));
        assert_eq!(output.report.poems_detected, 2);
        let first = poem(&output.segments[0]);
        assert_eq!(first.text, "I\n\nprimer verso\n\nsegunda estrofa");
        assert_eq!(first.verse_count, 2);
        assert_eq!(poem(&output.segments[1]).title, "II");
        assert_eq!(output.segments[1].order(), 1);
    }

    #[test]
    fn test_title_needs_verse_ahead() {
        let s = segmenter();
        let long = "x".repeat(200);
        let bs = blocks(&["NOTA", long.as_str()]);
        assert!(s.is_title_block(&bs[0]));
        assert!(!s.is_main_title(&bs, 0));

        let too_many_blanks = blocks(&["NOTA", "", "", "", "", "un verso"]);
        assert!(!s.is_main_title(&too_many_blanks, 0));
        let three_blanks = blocks(&["NOTA", "", "", "", "un verso"]);
        assert!(s.is_main_title(&three_blanks, 0));
    }

    #[test]
    fn test_internal_subtitle_is_not_main_title() {
        let s = segmenter();
        let bs = vec![
            Block::new("Coro:", 0).with_heading(None),
            Block::new("un verso", 1),
        ];
        assert!(s.is_title_block(&bs[0]));
        assert!(!s.is_main_title(&bs, 0));
    }

    #[test]
    fn test_consecutive_titles_merge() {
        let output = segmenter().segment(&blocks(&["SONETOS", "\"La espera\"", "un verso", "otro verso"]));
        assert_eq!(output.segments.len(), 1);
        assert_eq!(poem(&output.segments[0]).title, "SONETOS - La espera");
    }

    #[test]
    fn test_preamble_kept_with_poems() {
        let output = segmenter().segment(&blocks(&[
            "Una introducción en prosa que explica el libro entero y su origen.",
            "\"Cementerio\"",
            "Line one",
        ]));
        let kinds: Vec<_> = output.segments.iter().map(Segment::kind).collect();
        assert_eq!(kinds, vec!["paragraph", "poem"]);
    }

    #[test]
    fn test_artifacts_removed_from_poem() {
        let output = segmenter().segment(&blocks(&["\"Cementerio\"", "Line one", "Página 4", "Line two"]));
        let p = poem(&output.segments[0]);
        assert_eq!(p.text, "Cementerio\n\nLine one\nLine two");
    }

    #[test]
    fn test_fallback_pass() {
        let output = segmenter().segment(&blocks(&[
            "Noche de verano",
            "la luna sale despacio",
            "sobre el mar dormido",
        ]));
        assert!(output.report.fallback_used);
        assert_eq!(output.report.poems_detected, 1);
        let p = poem(&output.segments[0]);
        assert_eq!(p.title, "Noche de verano");
        assert_eq!(p.metadata.detection_pass, Some(DetectionPass::Fallback));
        assert_eq!(p.metadata.title_rule.as_deref(), Some("fallback_poetic_title"));
    }

    #[test]
    fn test_no_poems_at_all() {
        let output = segmenter().segment(&blocks(&["texto sin forma alguna.", "más texto."]));
        assert_eq!(output.segments.len(), 2);
        assert!(output.segments.iter().all(|s| s.kind() == "fallback_segment"));
        assert_eq!(output.report.poems_detected, 0);
    }

    #[test]
    fn test_pre_split_large_block() {
        let verses = "un verso que se repite sin descanso\n".repeat(20);
        let merged = format!("POEMA 1\n{verses}POEMA 2\n{verses}");
        let bs = vec![Block::new(merged, 0)];

        let s = segmenter();
        let (split, count) = s.pre_split_large_blocks(&bs);
        assert_eq!(count, 1);
        assert_eq!(split.len(), 4);
        assert_eq!(split[0].text, "POEMA 1");
        assert_eq!(split[2].text, "POEMA 2");

        let output = s.segment(&bs);
        assert_eq!(output.report.blocks_pre_split, 1);
        assert_eq!(output.report.poems_detected, 2);
        assert_eq!(poem(&output.segments[1]).verse_count, 20);
    }

    #[test]
    fn test_small_blocks_not_pre_split() {
        let bs = blocks(&["POEMA 1\nverso"]);
        let (split, count) = segmenter().pre_split_large_blocks(&bs);
        assert_eq!(count, 0);
        assert_eq!(split, bs);
    }

    #[test]
    fn test_bold_title_poem() {
        let title = Block::new("Nocturno", 0).with_visual(VisualMetadata {
            is_bold: true,
            ..VisualMetadata::default()
        });
        let output = segmenter().segment(&[title, Block::new("la noche", 1)]);
        assert_eq!(poem(&output.segments[0]).title, "Nocturno");
    }

    #[test]
    fn test_invalid_artifact_pattern() {
        let mut config = SegmenterConfig::default();
        config.verse.artifact_patterns = vec!["[".to_string()];
        assert!(matches!(
            VerseSegmenter::new(&config),
            Err(SegmenterError::InvalidPattern { .. })
        ));
    }
}
