// ============================================================
// Layer 2 — Template Mutation Pipeline
// ============================================================
// Produces ONE output document for ONE data group:
//
//   Loaded     fresh copy of the template tree
//      │
//   Replaced   office name + (optional) year/month substitution
//      │
//   Spliced    locate [S, E], drop the paragraphs between them,
//      │       insert the synthesized expense list at S+1
//      │
//   Persisted  hand the tree to the document store
//
// Any step may fail; the failure is captured in the group's
// outcome together with the step it happened in, so the batch
// can carry on with the next group.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::domain::document::{Block, DocumentTree};
use crate::domain::error::EngineError;
use crate::domain::record::DataGroup;
use crate::domain::traits::DocumentStore;
use crate::engine::anchor::{AnchorLocator, AnchorRegion};
use crate::engine::profile::TemplateProfile;
use crate::engine::replacer::{date_rules, office_rules, RuleSet};
use crate::engine::synthesizer::RegionSynthesizer;

// ─── Types ────────────────────────────────────────────────────────────────────

/// Lifecycle of one group's document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    Loaded,
    Replaced,
    Spliced,
    Persisted,
    Failed,
}

/// Target year and month of the generated documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub year:  i32,
    pub month: u32,
}

/// The result of running the pipeline for one group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupOutcome {
    pub group: String,

    /// `Persisted` on success, `Failed` otherwise
    pub stage: Stage,

    /// Last stage that completed before a failure
    pub failed_after: Option<Stage>,

    pub output:            Option<PathBuf>,
    pub failure:           Option<String>,
    pub item_count:        usize,
    pub total:             f64,
    pub coercion_warnings: usize,
}

impl GroupOutcome {
    pub fn succeeded(&self) -> bool {
        self.stage == Stage::Persisted
    }
}

// ─── Pipeline ─────────────────────────────────────────────────────────────────

pub struct TemplatePipeline<'a, S: DocumentStore> {
    store:      &'a S,
    profile:    &'a TemplateProfile,
    period:     Option<Period>,
    date_rules: Option<RuleSet>,
    output_dir: PathBuf,
}

impl<'a, S: DocumentStore> TemplatePipeline<'a, S> {
    /// `substitute_dates` controls the year/month rewrite only; the
    /// period still drives the cutoff day when it is switched off.
    pub fn new(
        store:            &'a S,
        profile:          &'a TemplateProfile,
        period:           Option<Period>,
        substitute_dates: bool,
        output_dir:       impl Into<PathBuf>,
    ) -> Result<Self> {
        let date_rules = match period {
            Some(p) if substitute_dates => Some(date_rules(p.year, p.month)?),
            _ => None,
        };
        Ok(Self { store, profile, period, date_rules, output_dir: output_dir.into() })
    }

    /// Run all stages for one group. Never panics on bad input and
    /// never returns an error: failures end up in the outcome.
    pub fn run(&self, group: &DataGroup) -> GroupOutcome {
        let mut outcome = GroupOutcome {
            group:             group.name.clone(),
            stage:             Stage::Loaded,
            failed_after:      None,
            output:            None,
            failure:           None,
            item_count:        0,
            total:             0.0,
            coercion_warnings: 0,
        };

        if let Err(e) = self.try_run(group, &mut outcome) {
            tracing::warn!("Group '{}' failed after {:?}: {:#}", group.name, outcome.stage, e);
            outcome.failed_after = Some(outcome.stage);
            outcome.stage        = Stage::Failed;
            outcome.failure      = Some(format!("{e:#}"));
            outcome.output       = None;
        }
        outcome
    }

    fn try_run(&self, group: &DataGroup, outcome: &mut GroupOutcome) -> Result<()> {
        // ── Loaded ───────────────────────────────────────────────────────────
        let mut tree = self.store.template().clone();
        if !tree.blocks.iter().any(Block::is_paragraph) {
            return Err(EngineError::InvalidTemplate {
                reason: "template body has no paragraphs".into(),
            }
            .into());
        }

        // ── Replaced ─────────────────────────────────────────────────────────
        let office  = self.profile.office_name(&group.name);
        let renamed = office_rules(&self.profile.office_placeholder, &office).apply_to_tree(&mut tree);
        let redated = self
            .date_rules
            .as_ref()
            .map(|rules| rules.apply_to_tree(&mut tree))
            .unwrap_or(0);
        tracing::debug!(
            "Group '{}': {} paragraphs renamed, {} re-dated",
            group.name,
            renamed,
            redated
        );
        outcome.stage = Stage::Replaced;

        // ── Spliced ──────────────────────────────────────────────────────────
        let region = AnchorLocator::from_markers(&self.profile.markers).locate(&tree.blocks)?;

        let synthesis = RegionSynthesizer::new(self.profile)
            .synthesize(&group.rows, self.period.map(|p| p.month));
        outcome.item_count        = synthesis.items.len();
        outcome.total             = synthesis.total;
        outcome.coercion_warnings = synthesis.warnings.len();

        splice_region(&mut tree, region, synthesis.blocks, self.profile.replace_end_marker);
        outcome.stage = Stage::Spliced;

        // ── Persisted ────────────────────────────────────────────────────────
        let path = self.output_path(&group.name);
        self.store.persist(&tree, &path)?;
        tracing::info!("Generated '{}' ({} items, total {})", path.display(), outcome.item_count, outcome.total);
        outcome.output = Some(path);
        outcome.stage  = Stage::Persisted;

        Ok(())
    }

    /// `{output_dir}/{group}.{ext}`; path separators in the group name
    /// are replaced so every group lands directly in the output directory.
    pub fn output_path(&self, group: &str) -> PathBuf {
        output_path(&self.output_dir, group, self.store.extension())
    }
}

pub fn output_path(dir: &Path, group: &str, extension: &str) -> PathBuf {
    let safe: String = group
        .chars()
        .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
        .collect();
    dir.join(format!("{safe}.{extension}"))
}

/// Remove the paragraphs strictly between the markers (and the end
/// marker itself when `include_end` is set), then insert `blocks`
/// right after the start marker. Non-paragraph blocks in the region
/// are kept and end up after the inserted blocks.
pub fn splice_region(
    tree:        &mut DocumentTree,
    region:      AnchorRegion,
    blocks:      Vec<Block>,
    include_end: bool,
) {
    let body = region.body();
    let last = if include_end { body.end + 1 } else { body.end };

    let mut index = 0;
    tree.blocks.retain(|block| {
        let remove = index >= body.start && index < last && block.is_paragraph();
        index += 1;
        !remove
    });

    let at = body.start.min(tree.blocks.len());
    tree.blocks.splice(at..at, blocks);
}
