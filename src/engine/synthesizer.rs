// ============================================================
// Layer 5 — Region Synthesizer
// ============================================================
// Turns a group's rows into the blocks that replace the anchor
// region. It never touches the document tree itself.
//
// Steps (applied in order):
//   1. Filter rows → expense items
//        - project not blank, not "合计", not "其他"
//        - "本月批复数" coerced to a number
//        - amount strictly positive
//   2. Sum the kept amounts
//   3. One paragraph per item:   [name] [\t amount]        (bold)
//   4. One totals paragraph:     [合计] [\t total 元] [closing notice]
//
// Amounts print in their natural decimal form (1200, 1200.5),
// no separators and no fixed decimals.

use serde::{Deserialize, Serialize};

use crate::domain::document::{Block, Fragment, Paragraph};
use crate::domain::error::CoercionWarning;
use crate::domain::record::{CellValue, Column, RowRecord};
use crate::engine::profile::TemplateProfile;

/// One line of the synthesized expense list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseItem {
    pub name:   String,
    pub amount: f64,
}

/// Everything the pipeline needs from one synthesis run.
#[derive(Debug, Clone, PartialEq)]
pub struct Synthesis {
    pub items:    Vec<ExpenseItem>,
    pub total:    f64,
    pub blocks:   Vec<Block>,
    pub warnings: Vec<CoercionWarning>,
}

// ─── Coercion ─────────────────────────────────────────────────────────────────

/// Read an amount cell.
///
/// Numbers pass through, blank cells are zero, text is parsed
/// (surrounding whitespace and thousands separators allowed).
/// Unparseable or non-finite values yield `Err(raw)`; callers
/// treat them as zero.
pub fn coerce_amount(value: &CellValue) -> Result<f64, String> {
    match value {
        CellValue::Number(n) if n.is_finite() => Ok(*n),
        CellValue::Number(n) => Err(n.to_string()),
        CellValue::Empty     => Ok(0.0),
        CellValue::Text(raw) => {
            let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
            if cleaned.is_empty() {
                return Ok(0.0);
            }
            cleaned
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .ok_or_else(|| raw.clone())
        }
    }
}

/// Filter and coerce rows into expense items, in source order.
pub fn extract_items(
    rows:    &[RowRecord],
    profile: &TemplateProfile,
) -> (Vec<ExpenseItem>, Vec<CoercionWarning>) {
    let mut items    = Vec::new();
    let mut warnings = Vec::new();

    for row in rows {
        let name = row.project().trim();
        if name.is_empty() || profile.is_excluded(name) {
            continue;
        }

        let amount = match coerce_amount(row.get(Column::CurrentApproved)) {
            Ok(n) => n,
            Err(raw) => {
                tracing::warn!(
                    "{} '{}' for '{}' is not numeric, using 0",
                    Column::CurrentApproved.header(),
                    raw,
                    name
                );
                warnings.push(CoercionWarning { project: name.to_string(), raw });
                0.0
            }
        };

        // NaN fails this comparison too
        if amount > 0.0 {
            items.push(ExpenseItem { name: name.to_string(), amount });
        }
    }

    (items, warnings)
}

// ─── Synthesizer ──────────────────────────────────────────────────────────────

pub struct RegionSynthesizer<'a> {
    profile: &'a TemplateProfile,
}

impl<'a> RegionSynthesizer<'a> {
    pub fn new(profile: &'a TemplateProfile) -> Self {
        Self { profile }
    }

    /// Build the replacement blocks. `month` is the target month;
    /// `None` selects the profile's fallback month and default cutoff.
    pub fn synthesize(&self, rows: &[RowRecord], month: Option<u32>) -> Synthesis {
        let (items, warnings) = extract_items(rows, self.profile);
        // fold from +0.0: an empty f64 sum may be -0.0, which prints as "-0"
        let total = items.iter().fold(0.0, |acc, i| acc + i.amount);

        let mut blocks: Vec<Block> = items.iter().map(|i| self.line_block(i)).collect();
        blocks.push(self.totals_block(total, month));

        tracing::debug!("Synthesized {} line items, total {}", items.len(), total);
        Synthesis { items, total, blocks, warnings }
    }

    /// Day by which receipts are due for the given month.
    pub fn cutoff_day(&self, month: Option<u32>) -> u32 {
        match month {
            Some(m) => self.profile.cutoff.day_for(m),
            None    => self.profile.cutoff.default_day,
        }
    }

    pub fn closing_sentence(&self, month: Option<u32>) -> String {
        let shown = month.unwrap_or(self.profile.fallback_month);
        self.profile
            .closing_notice
            .replace("{month}", &shown.to_string())
            .replace("{day}", &self.cutoff_day(month).to_string())
    }

    fn line_block(&self, item: &ExpenseItem) -> Block {
        let style = &self.profile.style;
        Block::Paragraph(
            Paragraph::new(style.paragraph())
                .with_fragment(Fragment::new(item.name.clone(), style.fragment(true)))
                .with_fragment(Fragment::new(format!("\t{}", item.amount), style.fragment(true))),
        )
    }

    fn totals_block(&self, total: f64, month: Option<u32>) -> Block {
        let p     = self.profile;
        let style = &p.style;
        Block::Paragraph(
            Paragraph::new(style.paragraph())
                .with_fragment(Fragment::new(p.total_label.clone(), style.fragment(true)))
                .with_fragment(Fragment::new(
                    format!("\t{}{}", total, p.currency_suffix),
                    style.fragment(true),
                ))
                .with_fragment(Fragment::new(self.closing_sentence(month), style.fragment(false))),
        )
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn row(project: &str, approved: impl Into<CellValue>) -> RowRecord {
        RowRecord::new(project).unwrap().with(Column::CurrentApproved, approved)
    }

    fn texts(block: &Block) -> Vec<String> {
        block.as_paragraph().unwrap().fragments.iter().map(|f| f.text.clone()).collect()
    }

    #[test]
    fn test_guangzhou_scenario() {
        let profile = TemplateProfile::default();
        let rows = vec![
            row("交通费", 1200.0),
            row("合计", 5000.0),
            row("办公费", 0.0),
        ];
        let s = RegionSynthesizer::new(&profile).synthesize(&rows, Some(3));

        assert_eq!(s.items, vec![ExpenseItem { name: "交通费".into(), amount: 1200.0 }]);
        assert_eq!(s.total, 1200.0);
        assert_eq!(s.blocks.len(), 2);
        assert_eq!(texts(&s.blocks[0]), vec!["交通费", "\t1200"]);

        let totals = texts(&s.blocks[1]);
        assert_eq!(totals[0], "合计");
        assert_eq!(totals[1], "\t1200元");
        assert!(totals[2].contains("3月15日"));
    }

    #[test]
    fn test_october_cutoff() {
        let profile = TemplateProfile::default();
        let s = RegionSynthesizer::new(&profile).closing_sentence(Some(10));
        assert!(s.contains("10月18日"));
    }

    #[test]
    fn test_no_period_uses_fallback_month_and_default_day() {
        let mut profile = TemplateProfile::default();
        profile.fallback_month = 10;
        let s = RegionSynthesizer::new(&profile).closing_sentence(None);
        // month-specific cutoff is skipped without a period
        assert!(s.contains("10月15日"));
    }

    #[test]
    fn test_empty_rows_still_yield_totals() {
        let profile = TemplateProfile::default();
        let s = RegionSynthesizer::new(&profile).synthesize(&[], Some(5));
        assert!(s.items.is_empty());
        assert_eq!(s.total, 0.0);
        assert_eq!(s.blocks.len(), 1);
        assert_eq!(texts(&s.blocks[0])[1], "\t0元");
    }

    #[test]
    fn test_text_amounts_are_parsed() {
        let profile = TemplateProfile::default();
        let rows    = vec![row("差旅费", " 1,250.5 "), row("通讯费", "300")];
        let (items, warnings) = extract_items(&rows, &profile);
        assert_eq!(items[0].amount, 1250.5);
        assert_eq!(items[1].amount, 300.0);
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_non_finite_amounts_warn_and_count_as_zero() {
        let profile = TemplateProfile::default();
        let rows    = vec![
            row("差旅费", "NaN"),
            row("通讯费", "inf"),
            row("办公费", f64::INFINITY),
            row("房租", 800.0),
        ];
        let (items, warnings) = extract_items(&rows, &profile);
        assert_eq!(items, vec![ExpenseItem { name: "房租".into(), amount: 800.0 }]);
        let flagged: Vec<&str> = warnings.iter().map(|w| w.project.as_str()).collect();
        assert_eq!(flagged, vec!["差旅费", "通讯费", "办公费"]);
        assert_eq!(warnings[0].raw, "NaN");
    }

    #[test]
    fn test_unparseable_amount_warns_and_is_dropped() {
        let profile = TemplateProfile::default();
        let rows    = vec![row("招待费", "待定"), row("交通费", 10.0)];
        let (items, warnings) = extract_items(&rows, &profile);
        assert_eq!(items.len(), 1);
        assert_eq!(warnings, vec![CoercionWarning { project: "招待费".into(), raw: "待定".into() }]);
    }

    #[test]
    fn test_blank_amount_is_zero_without_warning() {
        let profile = TemplateProfile::default();
        let rows    = vec![RowRecord::new("房租").unwrap()];
        let (items, warnings) = extract_items(&rows, &profile);
        assert!(items.is_empty());
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_synthesized_fragments_share_one_style() {
        let profile = TemplateProfile::default();
        let s = RegionSynthesizer::new(&profile).synthesize(&[row("交通费", 1.0)], Some(1));
        let line = s.blocks[0].as_paragraph().unwrap();
        assert_eq!(line.style.first_line_indent, Some(720));
        assert!(line.fragments.iter().all(|f| f.style == profile.style.fragment(true)));
        let totals = s.blocks[1].as_paragraph().unwrap();
        assert!(!totals.fragments[2].style.bold);
        assert_eq!(totals.fragments[2].style.east_asia_font.as_deref(), Some("楷体_GB2312"));
    }

    fn arb_row() -> impl Strategy<Value = RowRecord> {
        let project = prop_oneof![
            Just("合计".to_string()),
            Just("其他".to_string()),
            "[a-z]{1,6}",
        ];
        (project, -1000i32..1000).prop_map(|(p, n)| row(&p, n as f64))
    }

    proptest! {
        #[test]
        fn prop_filtering_law(rows in proptest::collection::vec(arb_row(), 0..20)) {
            let profile = TemplateProfile::default();
            let (items, _) = extract_items(&rows, &profile);
            for item in &items {
                prop_assert!(item.name != "合计" && item.name != "其他");
                prop_assert!(item.amount > 0.0);
            }
        }

        #[test]
        fn prop_total_is_sum_of_items(rows in proptest::collection::vec(arb_row(), 0..20)) {
            let profile = TemplateProfile::default();
            let s = RegionSynthesizer::new(&profile).synthesize(&rows, Some(4));
            let expected = s.items.iter().fold(0.0, |acc, i| acc + i.amount);
            prop_assert_eq!(s.total, expected);
            let totals = s.blocks.last().and_then(Block::as_paragraph).unwrap();
            prop_assert_eq!(&totals.fragments[1].text, &format!("\t{}元", expected));
        }
    }
}
