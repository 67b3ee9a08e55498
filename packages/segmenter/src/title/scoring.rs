//! Title score rule table.

use std::sync::LazyLock;

use regex::Regex;

use super::VisualBaseline;
use crate::rules::{Rule, RuleSet};
use crate::text::{char_len, ends_with_terminal_punctuation, is_all_caps, is_title_case};
use crate::types::Block;

/// Upper bound of a title score.
pub const MAX_TITLE_SCORE: f64 = 10.0;

/// Chapter/section numbering at the start of a line.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static NUMBERING_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?ix)^(?:
            (?:cap[ií]tulo|chapter|parte|part|libro|book|secci[oó]n|section|canto|tomo)\s+(?:[ivxlcdm]+|\d+|[a-z]+)\b
          | \d+(?:\.\d+)*\.?\s+\S
          | [ivxlcdm]+\.\s+\S
          | [a-z]\)\s+\S
        )",
    )
    .expect("valid regex")
});

/// Structural keywords commonly used as stand-alone titles.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static KEYWORD_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\W*(?:introducci[oó]n|pr[oó]logo|ep[ií]logo|conclusi[oó]n(?:es)?|[ií]ndice|prefacio|ap[eé]ndice|bibliograf[ií]a|agradecimientos|resumen|dedicatoria|nota\s+preliminar|introduction|prologue|epilogue|conclusions?|preface|appendix|contents|bibliography|acknowledgements?|abstract|foreword)\b",
    )
    .expect("valid regex")
});

/// Features of one block that the score rules inspect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TitleFeatures {
    /// Font size divided by the document's average, when both are known.
    pub font_ratio: Option<f64>,
    pub bold: bool,
    pub centered: bool,
    pub indented: bool,
    pub numbered: bool,
    pub keyword: bool,
    pub chars: usize,
    pub all_caps: bool,
    pub title_case: bool,
    pub terminal_punctuation: bool,
    pub separator_glyph: bool,
}

impl TitleFeatures {
    /// Extract the features of a block against the document baseline.
    #[must_use]
    pub fn extract(block: &Block, baseline: &VisualBaseline) -> Self {
        let text = block.trimmed();
        let font_ratio = block
            .font_size()
            .filter(|_| baseline.avg_font_size > 0.0)
            .map(|size| size / baseline.avg_font_size);

        Self {
            font_ratio,
            bold: block.is_bold(),
            centered: block.is_centered(),
            indented: block.is_indented(),
            numbered: NUMBERING_PATTERN.is_match(text),
            keyword: KEYWORD_PATTERN.is_match(text),
            chars: char_len(text),
            all_caps: is_all_caps(text),
            title_case: is_title_case(text),
            terminal_punctuation: ends_with_terminal_punctuation(text),
            separator_glyph: text.contains(['—', '–', '|']) || text.contains(" - "),
        }
    }
}

fn font_much_larger(f: &TitleFeatures) -> bool {
    f.font_ratio.is_some_and(|r| r >= 1.5)
}

fn font_larger(f: &TitleFeatures) -> bool {
    f.font_ratio.is_some_and(|r| r >= 1.2)
}

fn bold(f: &TitleFeatures) -> bool {
    f.bold
}

fn centered(f: &TitleFeatures) -> bool {
    f.centered
}

fn indented(f: &TitleFeatures) -> bool {
    f.indented
}

fn numbered(f: &TitleFeatures) -> bool {
    f.numbered
}

fn keyword(f: &TitleFeatures) -> bool {
    f.keyword
}

fn very_short(f: &TitleFeatures) -> bool {
    f.chars > 0 && f.chars <= 50
}

fn short(f: &TitleFeatures) -> bool {
    f.chars > 0 && f.chars <= 100
}

fn long(f: &TitleFeatures) -> bool {
    f.chars > 200
}

fn all_caps(f: &TitleFeatures) -> bool {
    f.all_caps
}

fn title_case(f: &TitleFeatures) -> bool {
    f.title_case
}

fn no_terminal_punctuation(f: &TitleFeatures) -> bool {
    f.chars > 0 && !f.terminal_punctuation
}

fn separator_glyph(f: &TitleFeatures) -> bool {
    f.separator_glyph
}

static TITLE_RULES: [Rule<TitleFeatures>; 14] = [
    Rule::new("font_much_larger", "font", 2.0, font_much_larger),
    Rule::new("font_larger", "font", 1.0, font_larger),
    Rule::new("bold", "bold", 1.5, bold),
    Rule::new("centered", "alignment", 1.0, centered),
    Rule::new("indented", "alignment", 0.5, indented),
    Rule::new("numbering", "numbering", 2.0, numbered),
    Rule::new("keyword", "keyword", 1.5, keyword),
    Rule::new("very_short", "length", 1.5, very_short),
    Rule::new("short", "length", 1.0, short),
    Rule::new("long_penalty", "length", -1.0, long),
    Rule::new("all_caps", "case", 1.0, all_caps),
    Rule::new("title_case", "case", 0.5, title_case),
    Rule::new("no_terminal_punctuation", "punctuation", 0.5, no_terminal_punctuation),
    Rule::new("separator_glyph", "glyph", 0.5, separator_glyph),
];

/// Additive title score rules, one contribution per group.
pub static TITLE_SCORE_RULES: RuleSet<TitleFeatures> = RuleSet::new(&TITLE_RULES);

/// Score features and clamp into `[0, MAX_TITLE_SCORE]`.
#[must_use]
pub fn score_features(features: &TitleFeatures) -> f64 {
    TITLE_SCORE_RULES
        .score(features)
        .clamp(0.0, MAX_TITLE_SCORE)
}

/// Chapter-style numbering, shared with the heading segmenter.
#[must_use]
pub fn has_numbering(text: &str) -> bool {
    NUMBERING_PATTERN.is_match(text.trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::VisualMetadata;

    fn features(text: &str) -> TitleFeatures {
        TitleFeatures::extract(&Block::new(text, 0), &VisualBaseline::default())
    }

    #[test]
    fn test_numbering_pattern() {
        assert!(has_numbering("Capítulo IV"));
        assert!(has_numbering("CHAPTER 12 The end"));
        assert!(has_numbering("2.3 Métodos"));
        assert!(has_numbering("IV. La vuelta"));
        assert!(!has_numbering("Había una vez"));
    }

    #[test]
    fn test_keyword_pattern() {
        assert!(features("Prólogo").keyword);
        assert!(features("INTRODUCCIÓN").keyword);
        assert!(!features("Introducir datos en la tabla.").keyword);
    }

    #[test]
    fn test_plain_sentence_scores_low() {
        let f = features("Era una mañana tranquila y el pueblo todavía dormía.");
        // very_short is false (51+ chars), short +1.0 only
        assert!(score_features(&f) <= 1.5);
    }

    #[test]
    fn test_styled_heading_scores_high() {
        let baseline = VisualBaseline {
            avg_font_size: 10.0,
            ..VisualBaseline::default()
        };
        let block = Block::new("CAPÍTULO I", 0).with_visual(VisualMetadata {
            font_size: Some(18.0),
            is_bold: true,
            is_centered: true,
            ..VisualMetadata::default()
        });
        let f = TitleFeatures::extract(&block, &baseline);
        // 2.0 + 1.5 + 1.0 + 2.0 + 1.5 + 1.0 + 0.5 = 9.5
        assert_eq!(score_features(&f), 9.5);
    }

    #[test]
    fn test_score_is_clamped() {
        let f = TitleFeatures {
            font_ratio: Some(3.0),
            bold: true,
            centered: true,
            indented: false,
            numbered: true,
            keyword: true,
            chars: 10,
            all_caps: true,
            title_case: false,
            terminal_punctuation: false,
            separator_glyph: true,
        };
        assert_eq!(score_features(&f), MAX_TITLE_SCORE);

        let long = TitleFeatures {
            font_ratio: None,
            bold: false,
            centered: false,
            indented: false,
            numbered: false,
            keyword: false,
            chars: 500,
            all_caps: false,
            title_case: false,
            terminal_punctuation: true,
            separator_glyph: false,
        };
        assert_eq!(score_features(&long), 0.0);
    }
}
