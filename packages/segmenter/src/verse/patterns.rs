//! Poem title cascade and line classifiers.

use std::sync::LazyLock;

use regex::Regex;

use crate::rules::{Rule, RuleSet};
use crate::text::{
    char_len, ends_with_terminal_punctuation, is_all_caps, is_quoted, starts_with_capital,
    word_count,
};
use crate::types::Block;

/// Group of the accept rules that win over the verse rejection pass.
pub const STRONG: &str = "strong";

/// Group of the accept rules that the rejection pass can veto.
pub const SOFT: &str = "soft";

const MAX_TITLE_CHARS: usize = 80;
const MAX_CAPS_TITLE_WORDS: usize = 8;
const MAX_SOFT_TITLE_WORDS: usize = 10;

const MAX_FALLBACK_TITLE_CHARS: usize = 60;
const MAX_FALLBACK_TITLE_WORDS: usize = 6;

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static POEM_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^poema\s+(?:\d+|[ivxlcdm]+)\b").expect("valid regex")
});

/// A numeral standing alone on its line.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static BARE_NUMERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[IVXLCDM]+|\d{1,3})$").expect("valid regex"));

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static POETIC_FORM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?:soneto|oda|eleg[ií]a|balada|romance|canci[oó]n|himno|madrigal|[eé]gloga|ep[ií]stola|letrilla|nocturno|haiku|d[eé]cima|sonnet|ode|elegy|ballad|song|hymn)\b",
    )
    .expect("valid regex")
});

/// Sub-headings inside a poem: `Word:`, ellipsis lines, `II.` / `3)` markers.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static INTERNAL_SUBTITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\p{Lu}\p{Ll}*:|.*(?:\.\.\.|…)|(?:[IVXLCDM]+|\d{1,3})[.)])$")
        .expect("valid regex")
});

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static ARTICLE_NOUN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[Ee]l|[Ll]as?|[Ll]os|[Uu]nos?|[Uu]nas?)\s+\p{Ll}").expect("valid regex")
});

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static REFLEXIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:^|\s)(?:me|te|se|nos|os)\s+\p{L}+(?:o|a|as|an|es|en|amos|é|ó)(?:\s|$)")
        .expect("valid regex")
});

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static VERB_STEM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\p{L}{2,}(?:aba|aban|ías?|ían|ando|iendo|aron|ieron)(?:\s|$)")
        .expect("valid regex")
});

/// Footer lines: page counters and publisher watermarks.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static PAGE_FOOTER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?:p[aá]gina|p[aá]g\.|page)\s*\d+|^[-–—]\s*\d{1,4}\s*[-–—]$|^\d{1,4}\s*/\s*\d{1,4}$|^(?:www\.|https?://)",
    )
    .expect("valid regex")
});

fn title_text(block: &Block) -> &str {
    block.trimmed()
}

fn heading_flag(block: &Block) -> bool {
    block.is_heading || block.heading_level.is_some()
}

fn quoted_title(block: &Block) -> bool {
    let text = title_text(block);
    is_quoted(text) && char_len(text) <= MAX_TITLE_CHARS && word_count(text) <= MAX_SOFT_TITLE_WORDS
}

fn poem_number(block: &Block) -> bool {
    POEM_NUMBER.is_match(title_text(block))
}

fn bare_numeral(block: &Block) -> bool {
    BARE_NUMERAL.is_match(title_text(block))
}

fn all_caps_title(block: &Block) -> bool {
    let text = title_text(block);
    is_all_caps(text) && char_len(text) <= MAX_TITLE_CHARS && word_count(text) <= MAX_CAPS_TITLE_WORDS
}

fn styled_short(block: &Block) -> bool {
    let text = title_text(block);
    (block.is_bold() || block.is_centered())
        && char_len(text) <= MAX_TITLE_CHARS
        && word_count(text) <= MAX_SOFT_TITLE_WORDS
}

fn poetic_form(block: &Block) -> bool {
    let text = title_text(block);
    POETIC_FORM.is_match(text) && char_len(text) <= MAX_TITLE_CHARS
}

static TITLE_ACCEPT: [Rule<Block>; 7] = [
    Rule::new("heading_flag", STRONG, 1.0, heading_flag),
    Rule::new("quoted_title", STRONG, 1.0, quoted_title),
    Rule::new("poem_number", STRONG, 1.0, poem_number),
    Rule::new("bare_numeral", STRONG, 1.0, bare_numeral),
    Rule::new("all_caps", STRONG, 1.0, all_caps_title),
    Rule::new("styled_short", SOFT, 0.5, styled_short),
    Rule::new("poetic_form", SOFT, 0.5, poetic_form),
];

/// Ordered accept cascade for poem titles.
pub static TITLE_ACCEPT_RULES: RuleSet<Block> = RuleSet::new(&TITLE_ACCEPT);

fn trailing_punctuation(text: &str) -> bool {
    ends_with_terminal_punctuation(text)
}

fn article_noun(text: &str) -> bool {
    ARTICLE_NOUN.is_match(text)
}

fn reflexive(text: &str) -> bool {
    REFLEXIVE.is_match(text)
}

fn verb_stem(text: &str) -> bool {
    VERB_STEM.is_match(text)
}

static VERSE_REJECT: [Rule<str>; 4] = [
    Rule::new("trailing_punctuation", "reject", 1.0, trailing_punctuation),
    Rule::new("article_noun", "reject", 1.0, article_noun),
    Rule::new("reflexive", "reject", 1.0, reflexive),
    Rule::new("verb_stem", "reject", 1.0, verb_stem),
];

/// Patterns that mark a line as an ordinary verse.
pub static VERSE_REJECT_RULES: RuleSet<str> = RuleSet::new(&VERSE_REJECT);

/// Tag of the rule accepting `block` as a poem title, if any.
///
/// Strong rules accept outright. A soft accept is vetoed when the text
/// also looks like an ordinary verse.
#[must_use]
pub fn title_rule(block: &Block) -> Option<&'static str> {
    let text = block.trimmed();
    if text.is_empty() {
        return None;
    }
    let rule = TITLE_ACCEPT_RULES.first_match(block)?;
    if rule.group == SOFT {
        if let Some(reject) = VERSE_REJECT_RULES.first_match(text) {
            tracing::trace!(text, accept = rule.tag, reject = reject.tag, "Title candidate rejected");
            return None;
        }
    }
    Some(rule.tag)
}

#[must_use]
pub fn is_internal_subtitle(text: &str) -> bool {
    INTERNAL_SUBTITLE.is_match(text.trim())
}

#[must_use]
pub fn is_page_footer(text: &str) -> bool {
    PAGE_FOOTER.is_match(text.trim())
}

/// Whether a block reads like a verse: every line short, and no heading
/// styling unless the block is itself an internal subtitle.
#[must_use]
pub fn is_verse_like(block: &Block, max_verse_length: usize) -> bool {
    let text = block.trimmed();
    if text.is_empty() {
        return false;
    }
    if (block.is_bold() || heading_flag(block)) && !is_internal_subtitle(text) {
        return false;
    }
    text.lines().all(|line| char_len(line.trim()) <= max_verse_length)
}

/// Lines that open a new poem inside an oversized block.
#[must_use]
pub fn is_poem_opening_line(line: &str) -> bool {
    let line = line.trim();
    if line.is_empty() || char_len(line) > MAX_TITLE_CHARS {
        return false;
    }
    POEM_NUMBER.is_match(line)
        || BARE_NUMERAL.is_match(line)
        || (is_all_caps(line) && word_count(line) <= MAX_CAPS_TITLE_WORDS)
        || is_quoted(line)
        || POETIC_FORM.is_match(line)
}

/// What the fallback title rules look at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FallbackLine {
    pub heading: bool,
    pub styled: bool,
    pub capitalized: bool,
    pub terminal_punctuation: bool,
    /// First block, or preceded by a blank block.
    pub after_break: bool,
}

fn fallback_heading(p: &FallbackLine) -> bool {
    p.heading
}

fn fallback_styled(p: &FallbackLine) -> bool {
    p.styled
}

fn poetic_title(p: &FallbackLine) -> bool {
    p.capitalized && !p.terminal_punctuation && p.after_break
}

static FALLBACK_TITLE: [Rule<FallbackLine>; 3] = [
    Rule::new("fallback_heading_flag", "fallback", 1.0, fallback_heading),
    Rule::new("fallback_styled", "fallback", 1.0, fallback_styled),
    Rule::new("fallback_poetic_title", "fallback", 0.5, poetic_title),
];

/// Looser title rules used when the primary pass finds no poem.
pub static FALLBACK_TITLE_RULES: RuleSet<FallbackLine> = RuleSet::new(&FALLBACK_TITLE);

/// Tag of the fallback rule accepting `blocks[index]`, if any.
#[must_use]
pub fn fallback_title_rule(blocks: &[Block], index: usize) -> Option<&'static str> {
    let block = blocks.get(index)?;
    let text = block.trimmed();
    if text.is_empty()
        || char_len(text) > MAX_FALLBACK_TITLE_CHARS
        || word_count(text) > MAX_FALLBACK_TITLE_WORDS
        || is_page_footer(text)
    {
        return None;
    }
    let line = FallbackLine {
        heading: heading_flag(block),
        styled: block.is_bold() || block.is_centered(),
        capitalized: starts_with_capital(text),
        terminal_punctuation: ends_with_terminal_punctuation(text),
        after_break: index == 0 || blocks[index - 1].is_blank(),
    };
    FALLBACK_TITLE_RULES.first_match(&line).map(|rule| rule.tag)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::VisualMetadata;

    fn bold(text: &str) -> Block {
        Block::new(text, 0).with_visual(VisualMetadata {
            is_bold: true,
            ..VisualMetadata::default()
        })
    }

    #[test]
    fn test_strong_title_rules() {
        assert_eq!(title_rule(&Block::new("\"Cementerio\"", 0)), Some("quoted_title"));
        assert_eq!(title_rule(&Block::new("Poema 20", 0)), Some("poem_number"));
        assert_eq!(title_rule(&Block::new("XIV", 0)), Some("bare_numeral"));
        assert_eq!(title_rule(&Block::new("CANCIÓN DEL PIRATA", 0)), Some("all_caps"));
        assert_eq!(title_rule(&Block::new("x", 0).with_heading(None)), Some("heading_flag"));
    }

    #[test]
    fn test_soft_titles_and_rejection() {
        assert_eq!(title_rule(&bold("Nocturno")), Some("styled_short"));
        assert_eq!(title_rule(&Block::new("Soneto de la espera", 0)), Some("poetic_form"));
        // Bold, but reads like a verse
        assert_eq!(title_rule(&bold("la tarde se apagaba,")), None);
        assert_eq!(title_rule(&bold("El viento soplaba")), None);
        assert_eq!(title_rule(&bold("La noche triste")), None);
    }

    #[test]
    fn test_plain_lines_are_not_titles() {
        assert_eq!(title_rule(&Block::new("Line one", 0)), None);
        assert_eq!(title_rule(&Block::new("", 0)), None);
    }

    #[test]
    fn test_internal_subtitle() {
        assert!(is_internal_subtitle("Coro:"));
        assert!(is_internal_subtitle("y entonces..."));
        assert!(is_internal_subtitle("II."));
        assert!(!is_internal_subtitle("II"));
        assert!(!is_internal_subtitle("Cementerio"));
    }

    #[test]
    fn test_verse_like() {
        assert!(is_verse_like(&Block::new("Line one", 0), 120));
        assert!(is_verse_like(&Block::new("uno\ndos\ntres", 0), 120));
        assert!(!is_verse_like(&Block::new("x".repeat(130), 0), 120));
        assert!(!is_verse_like(&bold("Titulo"), 120));
        assert!(is_verse_like(&bold("Coro:"), 120));
    }

    #[test]
    fn test_poem_opening_lines() {
        assert!(is_poem_opening_line("POEMA 3"));
        assert!(is_poem_opening_line("XII"));
        assert!(is_poem_opening_line("«La espera»"));
        assert!(is_poem_opening_line("LA ESPERA"));
        assert!(!is_poem_opening_line("y la espera se hizo larga"));
    }

    #[test]
    fn test_page_footer() {
        assert!(is_page_footer("Página 12"));
        assert!(is_page_footer("- 12 -"));
        assert!(is_page_footer("3 / 120"));
        assert!(!is_page_footer("Noche de verano"));
    }

    #[test]
    fn test_fallback_title_rule() {
        let blocks = vec![
            Block::new("Noche de verano", 0),
            Block::new("la luna sale despacio", 1),
            Block::new("", 2),
            Block::new("Página 3", 3),
            Block::new("Otra noche sin fin", 4),
        ];
        assert_eq!(fallback_title_rule(&blocks, 0), Some("fallback_poetic_title"));
        assert_eq!(fallback_title_rule(&blocks, 1), None);
        assert_eq!(fallback_title_rule(&blocks, 3), None);
        // Capitalized but not preceded by a break
        assert_eq!(fallback_title_rule(&blocks, 4), None);
    }
}
