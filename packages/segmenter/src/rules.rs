//! Ordered rule tables shared by the detectors.
//!
//! A [`RuleSet`] is an ordered list of `(predicate, weight, tag)` rules. The
//! order is part of the semantics: `first_match` returns the earliest rule
//! that fires, and `score` counts at most one rule per exclusive group (the
//! first one that fires). An [`ExtractionRule`] pairs a regex with the tag
//! and weight of the evidence it produces.

use std::sync::LazyLock;

use regex::Regex;

/// A predicate rule over some input type `T`.
pub struct Rule<T: ?Sized> {
    /// Identifier reported in metadata and logs.
    pub tag: &'static str,
    /// Rules sharing a group are mutually exclusive when scoring.
    pub group: &'static str,
    pub weight: f64,
    pub predicate: fn(&T) -> bool,
}

impl<T: ?Sized> Rule<T> {
    #[must_use]
    pub const fn new(
        tag: &'static str,
        group: &'static str,
        weight: f64,
        predicate: fn(&T) -> bool,
    ) -> Self {
        Self {
            tag,
            group,
            weight,
            predicate,
        }
    }

    #[must_use]
    pub fn matches(&self, input: &T) -> bool {
        (self.predicate)(input)
    }
}

/// An ordered table of rules.
pub struct RuleSet<T: ?Sized + 'static> {
    rules: &'static [Rule<T>],
}

impl<T: ?Sized + 'static> RuleSet<T> {
    #[must_use]
    pub const fn new(rules: &'static [Rule<T>]) -> Self {
        Self { rules }
    }

    /// The first rule, in declaration order, whose predicate holds.
    #[must_use]
    pub fn first_match(&self, input: &T) -> Option<&'static Rule<T>> {
        self.rules.iter().find(|rule| rule.matches(input))
    }

    /// All rules whose predicate holds, in declaration order.
    pub fn matches<'p>(&self, input: &'p T) -> impl Iterator<Item = &'static Rule<T>> + 'p {
        let rules: &'static [Rule<T>] = self.rules;
        rules.iter().filter(move |rule| rule.matches(input))
    }

    /// Sum of weights, counting only the first matching rule of each group.
    #[must_use]
    pub fn score(&self, input: &T) -> f64 {
        let mut seen: Vec<&'static str> = Vec::new();
        let mut total = 0.0;
        for rule in self.matches(input) {
            if seen.contains(&rule.group) {
                continue;
            }
            seen.push(rule.group);
            total += rule.weight;
        }
        total
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// A regex extraction rule; capture group 1 holds the extracted value.
pub struct ExtractionRule {
    /// Extraction method reported for candidates found by this rule.
    pub tag: &'static str,
    /// Evidence level (e.g. "metadata", "verse", "prose").
    pub source: &'static str,
    pub weight: f64,
    pub pattern: &'static LazyLock<Regex>,
}

/// A value captured by an [`ExtractionRule`].
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction<'t> {
    pub value: &'t str,
    /// Byte offset of the capture in the searched text.
    pub offset: usize,
    /// Full matched text, kept as context.
    pub matched: &'t str,
}

impl ExtractionRule {
    /// Every capture of this rule in `text`.
    #[must_use]
    pub fn extract<'t>(&self, text: &'t str) -> Vec<Extraction<'t>> {
        self.pattern
            .captures_iter(text)
            .filter_map(|caps| {
                let value = caps.get(1)?;
                let whole = caps.get(0)?;
                Some(Extraction {
                    value: value.as_str(),
                    offset: value.start(),
                    matched: whole.as_str(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_short(s: &str) -> bool {
        s.len() < 5
    }

    fn is_very_short(s: &str) -> bool {
        s.len() < 3
    }

    fn has_digit(s: &str) -> bool {
        s.chars().any(|c| c.is_ascii_digit())
    }

    static RULES: [Rule<str>; 3] = [
        Rule::new("very_short", "length", 2.0, is_very_short),
        Rule::new("short", "length", 1.0, is_short),
        Rule::new("digit", "digit", 0.5, has_digit),
    ];

    static SET: RuleSet<str> = RuleSet::new(&RULES);

    #[test]
    fn test_first_match_respects_order() {
        assert_eq!(SET.first_match("ab").map(|r| r.tag), Some("very_short"));
        assert_eq!(SET.first_match("abcd").map(|r| r.tag), Some("short"));
        assert_eq!(SET.first_match("abcdefg").map(|r| r.tag), None);
    }

    #[test]
    fn test_score_counts_one_rule_per_group() {
        // very_short and short both fire, only the first counts
        assert_eq!(SET.score("a1"), 2.5);
        assert_eq!(SET.score("abc1"), 1.5);
        assert_eq!(SET.score("abcdef"), 0.0);
    }

    #[test]
    fn test_matches_lists_all() {
        let tags: Vec<_> = SET.matches("a1").map(|r| r.tag).collect();
        assert_eq!(tags, vec!["very_short", "short", "digit"]);
        assert_eq!(SET.len(), 3);
    }

    #[test]
    fn test_extraction_rule() {
        static PATTERN: LazyLock<Regex> =
            LazyLock::new(|| Regex::new(r"Autor:\s*(\w+)").unwrap());
        static RULE: ExtractionRule = ExtractionRule {
            tag: "byline",
            source: "metadata",
            weight: 0.4,
            pattern: &PATTERN,
        };
        let rule = &RULE;
        let found = rule.extract("x Autor: Ana y Autor: Luis");
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].value, "Ana");
        assert_eq!(found[0].offset, 9);
        assert_eq!(found[1].matched, "Autor: Luis");
    }
}
