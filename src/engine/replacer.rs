// ============================================================
// Layer 5 — Pattern Replacer
// ============================================================
// Matches patterns against a paragraph's CONCATENATED text
// (so a phrase split over several runs is still found), builds
// the substituted string and hands it to the splicer.
//
// Rules are grouped in an ordered RuleSet. Within one paragraph
// an `exclusive` rule that matches suppresses every rule after
// it. This is how the date rules avoid double substitution:
//
//   1. "2025年12月" → "{year}年{month}月"   (exclusive)
//   2. "12月"       → "{month}月"
//
// Rule 2 alone would rewrite the month inside the result of
// rule 1 a second time, so it only runs in paragraphs where
// rule 1 found nothing.
//
// Matching never crosses paragraph boundaries.

use regex::{NoExpand, Regex};

use crate::domain::document::{DocumentTree, Paragraph};
use crate::engine::splicer::splice_paragraph;

/// What a rule looks for.
#[derive(Debug, Clone)]
pub enum Pattern {
    Literal(String),
    Regex(Regex),
}

#[derive(Debug, Clone)]
pub struct PatternRule {
    pattern:     Pattern,
    replacement: String,
    exclusive:   bool,
}

impl PatternRule {
    /// Replace every occurrence of `old` with `new`.
    pub fn literal(old: impl Into<String>, new: impl Into<String>) -> Self {
        Self {
            pattern:     Pattern::Literal(old.into()),
            replacement: new.into(),
            exclusive:   false,
        }
    }

    /// Replace every match of `pattern`. The replacement is inserted
    /// verbatim: `$` has no special meaning.
    pub fn regex(pattern: &str, replacement: impl Into<String>) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern:     Pattern::Regex(Regex::new(pattern)?),
            replacement: replacement.into(),
            exclusive:   false,
        })
    }

    /// Once this rule matches a paragraph, later rules skip that paragraph.
    pub fn exclusive(mut self) -> Self {
        self.exclusive = true;
        self
    }

    pub fn is_match(&self, text: &str) -> bool {
        match &self.pattern {
            Pattern::Literal(old) => !old.is_empty() && text.contains(old.as_str()),
            Pattern::Regex(re)    => re.is_match(text),
        }
    }

    pub fn apply(&self, text: &str) -> String {
        match &self.pattern {
            Pattern::Literal(old) if old.is_empty() => text.to_string(),
            Pattern::Literal(old) => text.replace(old.as_str(), &self.replacement),
            Pattern::Regex(re)    => re.replace_all(text, NoExpand(&self.replacement)).into_owned(),
        }
    }
}

/// An ordered list of rules applied paragraph by paragraph.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<PatternRule>,
}

impl RuleSet {
    pub fn new(rules: Vec<PatternRule>) -> Self {
        Self { rules }
    }

    /// Rewrite text according to the rules and their priorities.
    pub fn rewrite(&self, text: &str) -> String {
        let mut current = text.to_string();
        for rule in &self.rules {
            if rule.is_match(&current) {
                current = rule.apply(&current);
                if rule.exclusive {
                    break;
                }
            }
        }
        current
    }

    /// Apply to one paragraph. Returns `true` if its text changed.
    pub fn apply_to_paragraph(&self, paragraph: &mut Paragraph) -> bool {
        let original  = paragraph.text();
        let rewritten = self.rewrite(&original);
        if rewritten == original {
            return false;
        }
        splice_paragraph(paragraph, &rewritten);
        true
    }

    /// Apply to every top-level paragraph. Returns the number changed.
    pub fn apply_to_tree(&self, tree: &mut DocumentTree) -> usize {
        tree.paragraphs_mut()
            .map(|p| self.apply_to_paragraph(p))
            .filter(|changed| *changed)
            .count()
    }
}

// ─── Rule factories ───────────────────────────────────────────────────────────

/// "2025年12月" style, four-digit year plus month.
pub const YEAR_MONTH_PATTERN: &str = r"\d{4}年\d{1,2}月";

/// A bare month such as "12月".
pub const MONTH_PATTERN: &str = r"\d{1,2}月";

/// Year/month rules for the target period, year-qualified first.
pub fn date_rules(year: i32, month: u32) -> Result<RuleSet, regex::Error> {
    Ok(RuleSet::new(vec![
        PatternRule::regex(YEAR_MONTH_PATTERN, format!("{year}年{month}月"))?.exclusive(),
        PatternRule::regex(MONTH_PATTERN, format!("{month}月"))?,
    ]))
}

/// Office-name substitution, e.g. "天河办事处" → "广州办事处".
pub fn office_rules(placeholder: &str, office: &str) -> RuleSet {
    RuleSet::new(vec![PatternRule::literal(placeholder, office)])
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::document::Block;
    use proptest::prelude::*;

    #[test]
    fn test_year_month_suppresses_bare_month() {
        let rules = date_rules(2026, 1).unwrap();
        assert_eq!(rules.rewrite("2025年12月的预算"), "2026年1月的预算");
    }

    #[test]
    fn test_bare_month_rewritten_without_year() {
        let rules = date_rules(2026, 3).unwrap();
        assert_eq!(rules.rewrite("务必于12月15日前"), "务必于3月15日前");
    }

    #[test]
    fn test_year_month_rewrites_all_occurrences() {
        let rules = date_rules(2025, 3).unwrap();
        assert_eq!(
            rules.rewrite("2024年11月及2024年12月"),
            "2025年3月及2025年3月"
        );
    }

    #[test]
    fn test_match_across_fragments_keeps_fragment_count() {
        let mut p = Paragraph::from_texts(["关于", "2025年1", "2月", "预算"]);
        let rules = date_rules(2026, 1).unwrap();
        assert!(rules.apply_to_paragraph(&mut p));
        assert_eq!(p.text(), "关于2026年1月预算");
        assert_eq!(p.fragments.len(), 4);
    }

    #[test]
    fn test_literal_split_across_runs() {
        let mut p = Paragraph::from_texts(["天河", "办事处："]);
        office_rules("天河办事处", "广州办事处").apply_to_paragraph(&mut p);
        assert_eq!(p.text(), "广州办事处：");
    }

    #[test]
    fn test_unmatched_paragraph_untouched() {
        let mut p = Paragraph::from_texts(["无", "匹配"]);
        assert!(!office_rules("天河办事处", "广州办事处").apply_to_paragraph(&mut p));
        assert_eq!(p.fragments[0].text, "无");
    }

    #[test]
    fn test_replacement_is_not_expanded() {
        let rule = PatternRule::regex(r"\d+", "$0元").unwrap();
        assert_eq!(rule.apply("12"), "$0元");
    }

    #[test]
    fn test_no_match_across_paragraphs() {
        let mut tree = DocumentTree::new(vec![
            Block::Paragraph(Paragraph::from_texts(["2025年"])),
            Block::Paragraph(Paragraph::from_texts(["的预算"])),
        ]);
        let changed = office_rules("年的", "X").apply_to_tree(&mut tree);
        assert_eq!(changed, 0);
    }

    #[test]
    fn test_empty_literal_never_matches() {
        let rule = PatternRule::literal("", "x");
        assert!(!rule.is_match("abc"));
        assert_eq!(rule.apply("abc"), "abc");
    }

    proptest! {
        #[test]
        fn prop_literal_replacement_is_idempotent(
            prefix in "[a-z]{0,8}",
            suffix in "[a-z]{0,8}",
        ) {
            // "A" never appears in the lowercase input or in the replacement
            let rules = RuleSet::new(vec![PatternRule::literal("A", "B")]);
            let text  = format!("{prefix}A{suffix}");
            let once  = rules.rewrite(&text);
            let twice = rules.rewrite(&once);
            prop_assert_eq!(once, twice);
        }
    }
}
