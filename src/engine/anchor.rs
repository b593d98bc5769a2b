// ============================================================
// Layer 5 — Anchor Locator
// ============================================================
// Finds the replaceable expense list inside the template:
//
//   [S]   ...批复如下：                     ← start marker
//   [S+1]   交通费  1200                   ┐
//   ...     办公费  800                    │ region [S+1, E)
//   [E]   合计 2000元，请你处严格按费用明细…  ← end marker
//
// Markers are predicates over a block's rendered text, so an
// alternate template only needs a different profile. The end
// search tries the strict predicate first and falls back to the
// relaxed one ("合计" + "元" alone) if nothing matches.
//
// Only paragraph blocks can be markers; indices count every
// top-level block (tables included).

use serde::{Deserialize, Serialize};
use std::ops::Range;

use crate::domain::document::Block;
use crate::domain::error::EngineError;

// ─── Predicates ───────────────────────────────────────────────────────────────

/// A test over the rendered text of one block.
pub trait BlockPredicate {
    fn matches(&self, text: &str) -> bool;
}

impl<F> BlockPredicate for F
where
    F: Fn(&str) -> bool,
{
    fn matches(&self, text: &str) -> bool {
        self(text)
    }
}

/// Every phrase in `all_of` must occur, and at least one of
/// `any_of` (when it is non-empty).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PhraseMatcher {
    pub all_of: Vec<String>,
    pub any_of: Vec<String>,
}

impl PhraseMatcher {
    pub fn all_of<I, S>(phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { all_of: phrases.into_iter().map(Into::into).collect(), any_of: Vec::new() }
    }

    pub fn or_any_of<I, S>(mut self, phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.any_of = phrases.into_iter().map(Into::into).collect();
        self
    }
}

impl BlockPredicate for PhraseMatcher {
    fn matches(&self, text: &str) -> bool {
        self.all_of.iter().all(|p| text.contains(p.as_str()))
            && (self.any_of.is_empty() || self.any_of.iter().any(|p| text.contains(p.as_str())))
    }
}

/// The marker predicates of one template layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnchorMarkers {
    pub start:       PhraseMatcher,
    pub end_strict:  PhraseMatcher,
    pub end_relaxed: PhraseMatcher,
}

impl Default for AnchorMarkers {
    fn default() -> Self {
        Self {
            start:       PhraseMatcher::all_of(["批复如下："]),
            end_strict:  PhraseMatcher::all_of(["合计", "元"])
                .or_any_of(["请你处严格", "严格按费用明细"]),
            end_relaxed: PhraseMatcher::all_of(["合计", "元"]),
        }
    }
}

// ─── Region ──────────────────────────────────────────────────────────────────

/// Indices of the start and end marker blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorRegion {
    pub start: usize,
    pub end:   usize,
}

impl AnchorRegion {
    /// The replaceable blocks between the markers, `[start+1, end)`.
    pub fn body(&self) -> Range<usize> {
        self.start + 1..self.end
    }
}

// ─── Locator ─────────────────────────────────────────────────────────────────

pub struct AnchorLocator<'a> {
    start:       &'a dyn BlockPredicate,
    end_strict:  &'a dyn BlockPredicate,
    end_relaxed: &'a dyn BlockPredicate,
}

impl<'a> AnchorLocator<'a> {
    pub fn new(
        start:       &'a dyn BlockPredicate,
        end_strict:  &'a dyn BlockPredicate,
        end_relaxed: &'a dyn BlockPredicate,
    ) -> Self {
        Self { start, end_strict, end_relaxed }
    }

    pub fn from_markers(markers: &'a AnchorMarkers) -> Self {
        Self::new(&markers.start, &markers.end_strict, &markers.end_relaxed)
    }

    /// First match wins for both markers.
    pub fn locate(&self, blocks: &[Block]) -> Result<AnchorRegion, EngineError> {
        let start = first_paragraph_matching(blocks, 0, self.start)
            .ok_or_else(|| EngineError::RegionNotFound { marker: "start".into() })?;

        let end = first_paragraph_matching(blocks, start + 1, self.end_strict)
            .or_else(|| {
                tracing::debug!("No strict end marker after block {start}, trying relaxed match");
                first_paragraph_matching(blocks, start + 1, self.end_relaxed)
            })
            .ok_or_else(|| EngineError::RegionNotFound { marker: "end".into() })?;

        Ok(AnchorRegion { start, end })
    }
}

fn first_paragraph_matching(
    blocks:    &[Block],
    from:      usize,
    predicate: &dyn BlockPredicate,
) -> Option<usize> {
    blocks
        .iter()
        .enumerate()
        .skip(from)
        .find(|(_, block)| {
            block.as_paragraph().is_some_and(|p| predicate.matches(&p.text()))
        })
        .map(|(i, _)| i)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::document::{Paragraph, Table};

    fn para(text: &str) -> Block {
        Block::Paragraph(Paragraph::from_texts([text]))
    }

    fn template() -> Vec<Block> {
        vec![
            para("关于天河办事处2025年12月日常费用的批复"),
            para("经研究，批复如下："),
            para("交通费\t1000"),
            para("合计\t1000元"),
            para("合计\t1000元，请你处严格按费用明细开支。"),
            para("财务部"),
        ]
    }

    #[test]
    fn test_strict_end_preferred_over_earlier_relaxed() {
        let markers = AnchorMarkers::default();
        let region  = AnchorLocator::from_markers(&markers).locate(&template()).unwrap();
        assert_eq!(region, AnchorRegion { start: 1, end: 4 });
        assert_eq!(region.body(), 2..4);
    }

    #[test]
    fn test_relaxed_fallback() {
        let blocks = vec![para("批复如下："), para("交通费"), para("合计100元"), para("完")];
        let markers = AnchorMarkers::default();
        let region  = AnchorLocator::from_markers(&markers).locate(&blocks).unwrap();
        assert_eq!(region, AnchorRegion { start: 0, end: 2 });
    }

    #[test]
    fn test_missing_start_marker() {
        let blocks  = vec![para("合计100元，请你处严格按费用明细开支")];
        let markers = AnchorMarkers::default();
        let err     = AnchorLocator::from_markers(&markers).locate(&blocks).unwrap_err();
        assert_eq!(err, EngineError::RegionNotFound { marker: "start".into() });
    }

    #[test]
    fn test_end_must_follow_start() {
        let blocks  = vec![para("合计100元"), para("批复如下："), para("交通费")];
        let markers = AnchorMarkers::default();
        let err     = AnchorLocator::from_markers(&markers).locate(&blocks).unwrap_err();
        assert_eq!(err, EngineError::RegionNotFound { marker: "end".into() });
    }

    #[test]
    fn test_tables_are_never_markers_but_are_counted() {
        let blocks = vec![
            Block::Table(Table { text: "批复如下：".into(), origin: Some(0) }),
            para("批复如下："),
            Block::Table(Table { text: "合计100元".into(), origin: Some(2) }),
            para("合计100元"),
        ];
        let markers = AnchorMarkers::default();
        let region  = AnchorLocator::from_markers(&markers).locate(&blocks).unwrap();
        assert_eq!(region, AnchorRegion { start: 1, end: 3 });
    }

    #[test]
    fn test_closure_predicates() {
        let start = |t: &str| t.starts_with("BEGIN");
        let end   = |t: &str| t.starts_with("END");
        let never = |_: &str| false;
        let blocks = vec![para("x"), para("BEGIN"), para("y"), para("END")];
        let region = AnchorLocator::new(&start, &end, &never).locate(&blocks).unwrap();
        assert_eq!(region, AnchorRegion { start: 1, end: 3 });
    }
}
