//! Paragraph mode: one segment per block, long blocks split on sentences.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use crate::text::char_len;
use crate::types::{Block, Segment, SegmentMetadata};

/// Candidate sentence boundaries.
///
/// `blank` is a paragraph break and always splits. `stop` (terminal
/// punctuation with optional closing quotes) and `gap` (a double space)
/// split only when followed by an uppercase letter.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static SENTENCE_BREAK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?P<blank>\n[ \t]*\n\s*)|(?P<stop>[.!?…]["'»”’)\]]*\s+)|(?P<gap>[ \t]{2,})"#)
        .expect("valid regex")
});

/// Chars that may precede the capital of a new sentence.
const SENTENCE_OPENERS: &[char] = &['¿', '¡', '"', '«', '“', '(', '—', '-'];

fn opens_sentence(rest: &str) -> bool {
    rest.chars()
        .find(|c| !SENTENCE_OPENERS.contains(c))
        .is_some_and(char::is_uppercase)
}

/// Byte ranges of the sentences of `text`, covering it without gaps.
fn sentence_ranges(text: &str) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    let mut start = 0;
    for caps in SENTENCE_BREAK.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        let accepted =
            caps.name("blank").is_some() || opens_sentence(&text[whole.end()..]);
        if accepted && whole.end() < text.len() {
            ranges.push(start..whole.end());
            start = whole.end();
        }
    }
    if start < text.len() {
        ranges.push(start..text.len());
    }
    ranges
}

/// Split `text` into chunks of at most `max_len` characters on sentence
/// boundaries.
///
/// Sentences are packed greedily. A trailing fragment shorter than
/// `min_len` is merged into the chunk before it. A single sentence longer
/// than `max_len` is kept whole. Chunks are slices of the input, trimmed,
/// so their concatenation keeps every non-whitespace character.
#[must_use]
pub fn split_long_text(text: &str, max_len: usize, min_len: usize) -> Vec<&str> {
    let trimmed = text.trim();
    if char_len(trimmed) <= max_len {
        return vec![trimmed];
    }

    let mut chunks: Vec<Range<usize>> = Vec::new();
    let mut current: Option<Range<usize>> = None;
    for sentence in sentence_ranges(trimmed) {
        current = Some(match current {
            None => sentence,
            Some(open) => {
                if char_len(trimmed[open.start..sentence.end].trim()) <= max_len {
                    open.start..sentence.end
                } else {
                    chunks.push(open);
                    sentence
                }
            }
        });
    }
    if let Some(open) = current {
        let tiny = char_len(trimmed[open.clone()].trim()) < min_len;
        match chunks.last_mut() {
            Some(previous) if tiny => previous.end = open.end,
            _ => chunks.push(open),
        }
    }

    chunks
        .into_iter()
        .map(|range| trimmed[range].trim())
        .filter(|chunk| !chunk.is_empty())
        .collect()
}

/// Leaves for one paragraph block, split when longer than `max_len`.
///
/// Returns the leaves and whether the block was split.
pub(crate) fn paragraph_leaves(block: &Block, max_len: usize, min_len: usize) -> (Vec<Segment>, bool) {
    let parts = split_long_text(&block.text, max_len, min_len);
    let total = parts.len();
    let split = total > 1;
    let leaves = parts
        .into_iter()
        .enumerate()
        .map(|(i, part)| {
            let mut metadata = SegmentMetadata::from_block(block.order);
            if split {
                metadata.split_part = Some((i + 1, total));
            }
            Segment::paragraph(part, metadata)
        })
        .collect();
    (leaves, split)
}

/// One fallback leaf per non-empty block.
///
/// Used whenever a segmentation pass fails.
#[must_use]
pub fn fallback_segments(blocks: &[Block]) -> Vec<Segment> {
    blocks
        .iter()
        .filter(|b| !b.is_blank())
        .map(|b| Segment::fallback(b.trimmed(), SegmentMetadata::from_block(b.order)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_is_not_split() {
        assert_eq!(split_long_text("  Una frase corta.  ", 100, 5), vec!["Una frase corta."]);
    }

    #[test]
    fn test_split_on_sentence_boundaries() {
        let text = "Primera frase bastante larga. Segunda frase también larga. Tercera frase final.";
        let parts = split_long_text(text, 40, 5);
        assert_eq!(
            parts,
            vec![
                "Primera frase bastante larga.",
                "Segunda frase también larga.",
                "Tercera frase final."
            ]
        );
    }

    #[test]
    fn test_lowercase_after_period_does_not_split() {
        let text = "Vivía en la calle Mayor núm. tres con su madre y dos hermanos pequeños.";
        assert_eq!(split_long_text(text, 30, 5).len(), 1);
    }

    #[test]
    fn test_split_on_blank_line_and_double_space() {
        let text = "uno dos tres cuatro cinco\n\nseis siete ocho nueve diez";
        assert_eq!(
            split_long_text(text, 30, 5),
            vec!["uno dos tres cuatro cinco", "seis siete ocho nueve diez"]
        );

        let gapped = "Sin punto al final  Otra frase sin punto";
        assert_eq!(
            split_long_text(gapped, 25, 5),
            vec!["Sin punto al final", "Otra frase sin punto"]
        );
    }

    #[test]
    fn test_tiny_tail_merges_into_previous() {
        let text = "Una frase realmente larga termina aquí. Fin.";
        let parts = split_long_text(text, 40, 10);
        assert_eq!(parts, vec!["Una frase realmente larga termina aquí. Fin."]);
    }

    #[test]
    fn test_split_preserves_non_whitespace() {
        let text = "¿Quién llama? ¡Nadie responde! «Abre», dijo. Y la puerta se abrió sola.";
        let parts = split_long_text(text, 20, 3);
        assert!(parts.len() > 1);
        let strip = |s: &str| s.chars().filter(|c| !c.is_whitespace()).collect::<String>();
        assert_eq!(strip(&parts.concat()), strip(text));
    }

    #[test]
    fn test_paragraph_leaves_mark_split_parts() {
        let block = Block::new("Primera frase larga aquí. Segunda frase larga aquí.", 4);
        let (leaves, split) = paragraph_leaves(&block, 30, 5);
        assert!(split);
        assert_eq!(leaves.len(), 2);
        assert_eq!(leaves[1].metadata().split_part, Some((2, 2)));
        assert_eq!(leaves[0].metadata().source_block, Some(4));
    }

    #[test]
    fn test_fallback_segments_skip_blank() {
        let blocks = vec![Block::new("a", 0), Block::new("  ", 1), Block::new(" b ", 2)];
        let segments = fallback_segments(&blocks);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[1].text(), "b");
        assert_eq!(segments[1].kind(), "fallback_segment");
    }
}
