// ============================================================
// Layer 5 — Template Profile
// ============================================================
// Every literal that ties the engine to one particular
// template lives here instead of in the code:
//
//   - anchor marker phrases
//   - the office placeholder that gets renamed per group
//   - project names that are never expense items
//   - the single style applied to synthesized text
//   - the closing notice and its cutoff-day rule
//
// The defaults describe the stock "日常费用预算财务.docx"
// template. A JSON profile can override any subset of fields
// (#[serde(default)] fills in the rest).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::document::{FragmentStyle, ParagraphStyle};
use crate::engine::anchor::AnchorMarkers;

/// The font/size/indent used for every synthesized fragment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthStyle {
    pub east_asia_font:    String,
    pub latin_font:        String,
    pub size_half_points:  usize,
    pub first_line_indent: i32,
}

impl Default for SynthStyle {
    fn default() -> Self {
        Self {
            east_asia_font:    "楷体_GB2312".to_string(),
            latin_font:        "KaiTi_GB2312".to_string(),
            size_half_points:  28,
            first_line_indent: 720,
        }
    }
}

impl SynthStyle {
    pub fn fragment(&self, bold: bool) -> FragmentStyle {
        FragmentStyle {
            bold,
            east_asia_font:   Some(self.east_asia_font.clone()),
            latin_font:       Some(self.latin_font.clone()),
            size_half_points: Some(self.size_half_points),
        }
    }

    pub fn paragraph(&self) -> ParagraphStyle {
        ParagraphStyle { first_line_indent: Some(self.first_line_indent) }
    }
}

/// Day of the month by which receipts must arrive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CutoffRule {
    pub default_day: u32,
    /// month → day exceptions
    pub overrides: BTreeMap<u32, u32>,
}

impl Default for CutoffRule {
    fn default() -> Self {
        Self {
            default_day: 15,
            overrides:   BTreeMap::from([(10, 18)]),
        }
    }
}

impl CutoffRule {
    pub fn day_for(&self, month: u32) -> u32 {
        self.overrides.get(&month).copied().unwrap_or(self.default_day)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateProfile {
    pub markers: AnchorMarkers,

    /// Office name in the template, replaced by "{group}{office_suffix}"
    pub office_placeholder: String,
    pub office_suffix:      String,

    /// Rows whose project equals one of these are never line items
    pub excluded_projects: Vec<String>,

    pub total_label:     String,
    pub currency_suffix: String,
    pub style:           SynthStyle,

    /// Closing sentence; `{month}` and `{day}` are interpolated
    pub closing_notice: String,
    pub cutoff:         CutoffRule,

    /// Month printed in the closing notice when no period is given
    pub fallback_month: u32,

    /// Also remove the end-marker paragraph itself when splicing.
    /// Off by default: only `[S+1, E)` is replaced. The stock template's
    /// end marker is its old "合计 …元，请你处严格…" line, so it needs
    /// `true` or the output shows both the old and the new totals.
    pub replace_end_marker: bool,
}

impl Default for TemplateProfile {
    fn default() -> Self {
        Self {
            markers:            AnchorMarkers::default(),
            office_placeholder: "天河办事处".to_string(),
            office_suffix:      "办事处".to_string(),
            excluded_projects:  vec!["合计".to_string(), "其他".to_string()],
            total_label:        "合计".to_string(),
            currency_suffix:    "元".to_string(),
            style:              SynthStyle::default(),
            closing_notice:     "，请你处严格按费用明细开支，并按财务制度规定，务必于{month}月{day}日前\
                                 将本月相关合法单据寄到财务部核销，逾期不予报销。"
                .to_string(),
            cutoff:             CutoffRule::default(),
            fallback_month:     12,
            replace_end_marker: false,
        }
    }
}

impl TemplateProfile {
    /// The office name a group's documents should carry.
    pub fn office_name(&self, group: &str) -> String {
        format!("{group}{}", self.office_suffix)
    }

    pub fn is_excluded(&self, project: &str) -> bool {
        self.excluded_projects.iter().any(|p| p == project)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cutoff_rule() {
        let rule = CutoffRule::default();
        for month in 1..=12 {
            let expected = if month == 10 { 18 } else { 15 };
            assert_eq!(rule.day_for(month), expected, "month {month}");
        }
    }

    #[test]
    fn test_partial_profile_json_uses_defaults() {
        let json    = r#"{ "office_placeholder": "越秀办事处", "cutoff": { "default_day": 20 } }"#;
        let profile: TemplateProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.office_placeholder, "越秀办事处");
        assert_eq!(profile.cutoff.day_for(3), 20);
        // overrides were not mentioned, so the default map applies
        assert_eq!(profile.cutoff.day_for(10), 18);
        assert_eq!(profile.markers, AnchorMarkers::default());
    }

    #[test]
    fn test_default_closing_notice_has_placeholders() {
        let p = TemplateProfile::default();
        assert!(p.closing_notice.contains("务必于{month}月{day}日前将本月"));
    }
}
