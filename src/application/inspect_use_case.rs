// ============================================================
// Layer 2 — InspectUseCase
// ============================================================
// Shows how the engine sees a template before running a batch:
// every top-level block with its index, and where the anchor
// region would be spliced. Handy when adapting a new template
// or a profile's marker phrases.

use anyhow::Result;
use serde::Serialize;
use std::path::Path;

use crate::data::docx_store::DocxStore;
use crate::domain::document::{Block, DocumentTree};
use crate::domain::traits::DocumentStore;
use crate::engine::anchor::{AnchorLocator, AnchorRegion};
use crate::engine::profile::TemplateProfile;
use crate::infra::profile_store::ProfileStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BlockKind {
    Paragraph,
    Table,
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockSummary {
    pub index: usize,
    pub kind:  BlockKind,
    pub text:  String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemplateInspection {
    pub blocks: Vec<BlockSummary>,
    /// The located region, or why it could not be located
    pub region: Result<AnchorRegion, String>,
}

impl TemplateInspection {
    /// Whether block `index` would be replaced by the synthesized list.
    pub fn is_replaced(&self, index: usize, include_end: bool) -> bool {
        match &self.region {
            Ok(r) => r.body().contains(&index) || (include_end && index == r.end),
            Err(_) => false,
        }
    }
}

pub struct InspectUseCase {
    template: String,
    profile:  Option<String>,
}

impl InspectUseCase {
    pub fn new(template: impl Into<String>, profile: Option<String>) -> Self {
        Self { template: template.into(), profile }
    }

    pub fn execute(&self) -> Result<(TemplateInspection, TemplateProfile)> {
        let profile = ProfileStore::load_or_default(self.profile.as_deref().map(Path::new))?;
        let store   = DocxStore::open(Path::new(&self.template))?;
        Ok((inspect(store.template(), &profile), profile))
    }

    /// Save the profile in effect so it can be edited and passed back
    /// with `--profile`.
    pub fn write_profile(profile: &TemplateProfile, path: &Path) -> Result<()> {
        ProfileStore::save(profile, path)
    }
}

pub fn inspect(tree: &DocumentTree, profile: &TemplateProfile) -> TemplateInspection {
    let blocks = tree
        .blocks
        .iter()
        .enumerate()
        .map(|(index, block)| BlockSummary {
            index,
            kind: match block {
                Block::Paragraph(_)  => BlockKind::Paragraph,
                Block::Table(_)      => BlockKind::Table,
                Block::Opaque { .. } => BlockKind::Other,
            },
            text: block.text(),
        })
        .collect();

    let region = AnchorLocator::from_markers(&profile.markers)
        .locate(&tree.blocks)
        .map_err(|e| e.to_string());

    TemplateInspection { blocks, region }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::document::{Paragraph, Table};

    fn para(text: &str) -> Block {
        Block::Paragraph(Paragraph::from_texts([text]))
    }

    #[test]
    fn test_inspect_lists_blocks_and_region() {
        let tree = DocumentTree::new(vec![
            para("天河办事处："),
            para("批复如下："),
            Block::Table(Table { text: "项目 金额".into(), origin: Some(2) }),
            para("合计\t100元，请你处严格按费用明细开支。"),
        ]);

        let report = inspect(&tree, &TemplateProfile::default());
        assert_eq!(report.blocks.len(), 4);
        assert_eq!(report.blocks[2].kind, BlockKind::Table);
        assert_eq!(report.region, Ok(AnchorRegion { start: 1, end: 3 }));
        assert!(report.is_replaced(2, false));
        assert!(!report.is_replaced(3, false));
        assert!(report.is_replaced(3, true));
    }

    #[test]
    fn test_inspect_reports_missing_marker() {
        let tree   = DocumentTree::new(vec![para("天河办事处："), para("财务部")]);
        let report = inspect(&tree, &TemplateProfile::default());
        assert!(report.region.as_ref().unwrap_err().contains("start marker"));
        assert!(!report.is_replaced(1, true));
    }

    #[test]
    fn test_write_profile_round_trips() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("profile.json");
        InspectUseCase::write_profile(&TemplateProfile::default(), &path).unwrap();
        assert_eq!(ProfileStore::load(&path).unwrap(), TemplateProfile::default());
    }
}
