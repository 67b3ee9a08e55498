//! Smart title detection.
//!
//! Scores each block's likelihood of being a title from visual features
//! (font size against the document baseline, bold, alignment) and textual
//! features (numbering, keywords, length, casing), then assigns hierarchy
//! levels by clustering the font sizes of the accepted candidates.

mod scoring;

use std::collections::BTreeSet;

pub use scoring::{has_numbering, score_features, TitleFeatures, MAX_TITLE_SCORE, TITLE_SCORE_RULES};

use crate::config::DEFAULT_TITLE_SCORE_THRESHOLD;
use crate::text::char_len;
use crate::types::Block;

/// Font size assumed when no block carries visual metadata.
pub const DEFAULT_FONT_SIZE: f64 = 12.0;

/// Average block length assumed for an empty document.
pub const DEFAULT_TEXT_LENGTH: f64 = 80.0;

/// Deepest hierarchy level.
pub const MAX_LEVEL: u8 = 6;

/// Document-wide visual statistics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisualBaseline {
    pub avg_font_size: f64,
    pub max_font_size: f64,
    pub font_size_std: f64,
    pub avg_text_length: f64,
    /// Number of blocks that contributed a font size.
    pub sampled_blocks: usize,
}

impl Default for VisualBaseline {
    fn default() -> Self {
        Self {
            avg_font_size: DEFAULT_FONT_SIZE,
            max_font_size: DEFAULT_FONT_SIZE,
            font_size_std: 0.0,
            avg_text_length: DEFAULT_TEXT_LENGTH,
            sampled_blocks: 0,
        }
    }
}

/// A block that scored above the smart-title threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TitleCandidate {
    /// Index of the block in the input slice.
    pub index: usize,
    pub font_size: Option<f64>,
    pub score: f64,
}

/// Title information computed for one block.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TitleAnnotation {
    pub is_smart_title: bool,
    pub title_score: f64,
    pub smart_hierarchy_level: Option<u8>,
}

/// Rule-based title scorer.
#[derive(Debug, Clone)]
pub struct TitleDetector {
    threshold: f64,
}

impl Default for TitleDetector {
    fn default() -> Self {
        Self::new(DEFAULT_TITLE_SCORE_THRESHOLD)
    }
}

impl TitleDetector {
    /// Create a detector accepting blocks that score at least `threshold` (0-10).
    #[must_use]
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold: threshold.clamp(0.0, MAX_TITLE_SCORE),
        }
    }

    #[must_use]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Compute baseline statistics over the blocks carrying visual metadata.
    #[must_use]
    pub fn analyze_visual_characteristics(&self, blocks: &[Block]) -> VisualBaseline {
        let sizes: Vec<f64> = blocks.iter().filter_map(Block::font_size).collect();
        let lengths: Vec<f64> = blocks
            .iter()
            .filter(|b| !b.is_blank())
            .map(|b| {
                b.visual_metadata
                    .as_ref()
                    .and_then(|v| v.text_length)
                    .unwrap_or_else(|| char_len(b.trimmed())) as f64
            })
            .collect();

        let mut baseline = VisualBaseline::default();
        if !lengths.is_empty() {
            baseline.avg_text_length = mean(&lengths);
        }
        if sizes.is_empty() {
            return baseline;
        }

        let avg = mean(&sizes);
        let variance = sizes.iter().map(|s| (s - avg).powi(2)).sum::<f64>() / sizes.len() as f64;
        baseline.avg_font_size = avg;
        baseline.max_font_size = sizes.iter().copied().fold(f64::MIN, f64::max);
        baseline.font_size_std = variance.sqrt();
        baseline.sampled_blocks = sizes.len();
        baseline
    }

    /// Title score of a block in `[0, 10]`.
    #[must_use]
    pub fn calculate_title_score(&self, block: &Block, baseline: &VisualBaseline) -> f64 {
        if block.is_blank() {
            return 0.0;
        }
        score_features(&TitleFeatures::extract(block, baseline))
    }

    /// Hierarchy level for each candidate, in the same order.
    ///
    /// The base level is the rank of the candidate's font size among the
    /// distinct candidate sizes (largest first). High scores promote one
    /// level, low scores demote one. Candidates without a font size sit one
    /// level below the smallest known size.
    #[must_use]
    pub fn determine_hierarchy_level(&self, candidates: &[TitleCandidate]) -> Vec<u8> {
        // Keyed in tenths of a point so near-identical sizes cluster together
        let distinct: BTreeSet<i64> = candidates
            .iter()
            .filter_map(|c| c.font_size)
            .map(size_key)
            .collect();
        let descending: Vec<i64> = distinct.into_iter().rev().collect();

        candidates
            .iter()
            .map(|candidate| {
                let base = match candidate.font_size {
                    Some(size) => descending
                        .iter()
                        .position(|k| *k == size_key(size))
                        .map_or(1, |p| p + 1),
                    None => descending.len() + 1,
                } as i64;

                let adjusted = if candidate.score >= 8.0 {
                    base - 1
                } else if candidate.score < 5.0 {
                    base + 1
                } else {
                    base
                };
                adjusted.clamp(1, i64::from(MAX_LEVEL)) as u8
            })
            .collect()
    }

    /// Score every block and assign levels to those above the threshold.
    #[must_use]
    pub fn annotate(&self, blocks: &[Block]) -> Vec<TitleAnnotation> {
        let baseline = self.analyze_visual_characteristics(blocks);
        let mut annotations: Vec<TitleAnnotation> = blocks
            .iter()
            .map(|block| TitleAnnotation {
                title_score: self.calculate_title_score(block, &baseline),
                ..TitleAnnotation::default()
            })
            .collect();

        let candidates: Vec<TitleCandidate> = annotations
            .iter()
            .enumerate()
            .filter(|(_, a)| a.title_score >= self.threshold && a.title_score > 0.0)
            .map(|(index, a)| TitleCandidate {
                index,
                font_size: blocks[index].font_size(),
                score: a.title_score,
            })
            .collect();

        let levels = self.determine_hierarchy_level(&candidates);
        for (candidate, level) in candidates.iter().zip(levels) {
            let annotation = &mut annotations[candidate.index];
            annotation.is_smart_title = true;
            annotation.smart_hierarchy_level = Some(level);
        }

        tracing::debug!(
            blocks = blocks.len(),
            titles = candidates.len(),
            avg_font_size = baseline.avg_font_size,
            "Smart title detection complete"
        );
        annotations
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn size_key(size: f64) -> i64 {
    (size * 10.0).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::VisualMetadata;

    fn sized(text: &str, size: f64, bold: bool) -> Block {
        Block::new(text, 0).with_visual(VisualMetadata {
            font_size: Some(size),
            is_bold: bold,
            ..VisualMetadata::default()
        })
    }

    #[test]
    fn test_baseline_defaults_without_metadata() {
        let detector = TitleDetector::default();
        let baseline = detector.analyze_visual_characteristics(&[Block::new("hola", 0)]);
        assert_eq!(baseline.avg_font_size, DEFAULT_FONT_SIZE);
        assert_eq!(baseline.sampled_blocks, 0);
        assert_eq!(baseline.avg_text_length, 4.0);
    }

    #[test]
    fn test_baseline_statistics() {
        let detector = TitleDetector::default();
        let blocks = vec![sized("a", 10.0, false), sized("b", 14.0, false)];
        let baseline = detector.analyze_visual_characteristics(&blocks);
        assert_eq!(baseline.avg_font_size, 12.0);
        assert_eq!(baseline.max_font_size, 14.0);
        assert_eq!(baseline.font_size_std, 2.0);
        assert_eq!(baseline.sampled_blocks, 2);
    }

    #[test]
    fn test_title_score_bounds() {
        let detector = TitleDetector::default();
        let baseline = VisualBaseline::default();
        let long = "palabra ".repeat(100);
        let texts = ["", "x", "CAPÍTULO PRIMERO — EL COMIENZO | I", long.as_str()];
        for text in texts {
            let score = detector.calculate_title_score(&sized(text, 30.0, true), &baseline);
            assert!((0.0..=10.0).contains(&score), "{text}: {score}");
        }
    }

    #[test]
    fn test_hierarchy_by_font_size() {
        let detector = TitleDetector::default();
        let candidates = [
            TitleCandidate { index: 0, font_size: Some(24.0), score: 6.0 },
            TitleCandidate { index: 1, font_size: Some(18.0), score: 6.0 },
            TitleCandidate { index: 2, font_size: Some(24.0), score: 6.0 },
            TitleCandidate { index: 3, font_size: None, score: 6.0 },
        ];
        assert_eq!(detector.determine_hierarchy_level(&candidates), vec![1, 2, 1, 3]);
    }

    #[test]
    fn test_hierarchy_promotion_and_demotion() {
        let detector = TitleDetector::default();
        let candidates = [
            TitleCandidate { index: 0, font_size: Some(24.0), score: 9.0 },
            TitleCandidate { index: 1, font_size: Some(18.0), score: 9.0 },
            TitleCandidate { index: 2, font_size: Some(12.0), score: 4.0 },
        ];
        // 1 -> clamped 1, 2 -> 1, 3 -> 4
        assert_eq!(detector.determine_hierarchy_level(&candidates), vec![1, 1, 4]);
    }

    #[test]
    fn test_hierarchy_level_clamped_to_six() {
        let detector = TitleDetector::default();
        let candidates: Vec<TitleCandidate> = (0..8)
            .map(|i| TitleCandidate {
                index: i,
                font_size: Some(30.0 - i as f64),
                score: 4.0,
            })
            .collect();
        let levels = detector.determine_hierarchy_level(&candidates);
        assert!(levels.iter().all(|l| (1..=6).contains(l)));
        assert_eq!(levels[7], 6);
    }

    #[test]
    fn test_annotate_marks_large_bold_titles() {
        let detector = TitleDetector::default();
        let blocks = vec![
            sized("PRIMERA PARTE", 24.0, true),
            sized("El día que llegamos al puerto llovía sin descanso desde el alba.", 10.0, false),
            sized("Había gaviotas en todos los tejados y nadie salía a la calle.", 10.0, false),
        ];
        let annotations = detector.annotate(&blocks);
        assert!(annotations[0].is_smart_title);
        assert_eq!(annotations[0].smart_hierarchy_level, Some(1));
        assert!(!annotations[1].is_smart_title);
        assert!(annotations[1].smart_hierarchy_level.is_none());
    }
}
