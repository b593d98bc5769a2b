// ============================================================
// Layer 2 — GenerateUseCase
// ============================================================
// One run of the batch driver:
//
//   Step 1: Load the template profile      (Layer 6 - infra)
//   Step 2: Open the template once         (Layer 4 - data)
//   Step 3: Read all data groups           (Layer 4 - data)
//   Step 4: Run the pipeline per group     (Layer 2 - pipeline)
//   Step 5: Write report.json              (Layer 6 - infra)
//
// Steps 1–3 are batch-level: if any fails, no group runs and
// the error propagates. In step 4 a failing group is recorded
// in the summary and the loop moves on to the next group.

use anyhow::{Context, Result};
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};

use crate::application::pipeline::{GroupOutcome, Period, Stage, TemplatePipeline};
use crate::data::{docx_store::DocxStore, workbook::WorkbookSource};
use crate::domain::record::DataGroup;
use crate::domain::traits::{DocumentStore, GroupSource};
use crate::engine::profile::TemplateProfile;
use crate::infra::{profile_store::ProfileStore, report::ReportWriter};

// ─── Generate Configuration ──────────────────────────────────────────────────
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateConfig {
    pub workbook:         String,
    pub template:         String,
    pub output_dir:       String,
    pub year:             Option<i32>,
    pub month:            Option<u32>,
    pub profile:          Option<String>,
    pub substitute_dates: bool,
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            workbook:         "data/办事处日常费用预算财务.xlsx".to_string(),
            template:         "data/日常费用预算财务.docx".to_string(),
            output_dir:       "output".to_string(),
            year:             None,
            month:            None,
            profile:          None,
            substitute_dates: true,
        }
    }
}

impl GenerateConfig {
    /// The target period. A month without a year means this year.
    pub fn period(&self) -> Option<Period> {
        resolve_period(self.year, self.month, chrono::Local::now().year())
    }
}

pub fn resolve_period(year: Option<i32>, month: Option<u32>, current_year: i32) -> Option<Period> {
    month.map(|month| Period { year: year.unwrap_or(current_year), month })
}

// ─── Batch Summary ───────────────────────────────────────────────────────────
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchSummary {
    pub outcomes: Vec<GroupOutcome>,
}

impl BatchSummary {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.succeeded()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    pub fn failures(&self) -> impl Iterator<Item = &GroupOutcome> {
        self.outcomes.iter().filter(|o| !o.succeeded())
    }
}

// ─── Use Case ────────────────────────────────────────────────────────────────
pub struct GenerateUseCase {
    config: GenerateConfig,
}

impl GenerateUseCase {
    pub fn new(config: GenerateConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<BatchSummary> {
        let cfg = &self.config;

        // ── Step 1: Profile ──────────────────────────────────────────────────
        let profile = ProfileStore::load_or_default(cfg.profile.as_deref().map(Path::new))?;

        // ── Step 2: Template ─────────────────────────────────────────────────
        let store = DocxStore::open(Path::new(&cfg.template))?;

        // ── Step 3: Data groups ──────────────────────────────────────────────
        let groups = WorkbookSource::new(&cfg.workbook).load_groups()?;

        let output_dir = PathBuf::from(&cfg.output_dir);
        fs::create_dir_all(&output_dir)
            .with_context(|| format!("Cannot create output directory '{}'", output_dir.display()))?;

        // ── Step 4: Pipeline per group ───────────────────────────────────────
        let period = cfg.period();
        match period {
            Some(p) => tracing::info!("Target period {}年{}月", p.year, p.month),
            None    => tracing::info!("No target period: dates are left as in the template"),
        }
        let summary = run_batch(
            &store,
            &profile,
            &groups,
            period,
            cfg.substitute_dates,
            &output_dir,
        )?;

        // ── Step 5: Report ───────────────────────────────────────────────────
        ReportWriter::new(&output_dir).write(&summary)?;

        Ok(summary)
    }
}

/// Run the pipeline for every group in order.
///
/// Only building the date rules can fail here; everything that goes
/// wrong for one group is part of that group's outcome. A group whose
/// output path was already claimed by an earlier group is not written.
pub fn run_batch<S: DocumentStore>(
    store:            &S,
    profile:          &TemplateProfile,
    groups:           &[DataGroup],
    period:           Option<Period>,
    substitute_dates: bool,
    output_dir:       &Path,
) -> Result<BatchSummary> {
    let pipeline = TemplatePipeline::new(store, profile, period, substitute_dates, output_dir)?;

    let mut claimed  = HashSet::new();
    let mut outcomes = Vec::with_capacity(groups.len());

    for (i, group) in groups.iter().enumerate() {
        tracing::info!(
            "[{}/{}] Generating for '{}' (标题: {})",
            i + 1,
            groups.len(),
            group.name,
            group.title
        );

        let path = pipeline.output_path(&group.name);
        if !claimed.insert(path.clone()) {
            tracing::warn!("Group '{}' would overwrite '{}', skipped", group.name, path.display());
            outcomes.push(collision(group, &path));
            continue;
        }

        outcomes.push(pipeline.run(group));
    }

    let summary = BatchSummary { outcomes };
    tracing::info!(
        "Batch finished: {} succeeded, {} failed",
        summary.succeeded(),
        summary.failed()
    );
    Ok(summary)
}

fn collision(group: &DataGroup, path: &Path) -> GroupOutcome {
    GroupOutcome {
        group:             group.name.clone(),
        stage:             Stage::Failed,
        failed_after:      None,
        output:            None,
        failure:           Some(format!("output path '{}' already used by another group", path.display())),
        item_count:        0,
        total:             0.0,
        coercion_warnings: 0,
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::document::{Block, DocumentTree, Paragraph};
    use crate::domain::record::{Column, RowRecord};
    use std::cell::Cell;

    fn para(text: &str) -> Block {
        Block::Paragraph(Paragraph::from_texts([text]))
    }

    fn template(with_end_marker: bool) -> DocumentTree {
        let mut blocks = vec![
            para("天河办事处："),
            para("你处2025年12月费用预算批复如下："),
            para("交通费\t1000"),
        ];
        if with_end_marker {
            blocks.push(para("合计\t1000元，请你处严格按费用明细开支。"));
        }
        blocks.push(para("财务部"));
        DocumentTree::new(blocks)
    }

    /// Writes trees as JSON. The n-th call to `template()` returns
    /// the broken template when n is `broken_call`.
    struct JsonStore {
        good:        DocumentTree,
        broken:      DocumentTree,
        broken_call: usize,
        calls:       Cell<usize>,
    }

    impl JsonStore {
        fn new(broken_call: usize) -> Self {
            Self {
                good:   template(true),
                broken: template(false),
                broken_call,
                calls:  Cell::new(0),
            }
        }
    }

    impl DocumentStore for JsonStore {
        fn template(&self) -> &DocumentTree {
            let n = self.calls.get() + 1;
            self.calls.set(n);
            if n == self.broken_call { &self.broken } else { &self.good }
        }

        fn extension(&self) -> &str {
            "json"
        }

        fn persist(&self, tree: &DocumentTree, path: &Path) -> Result<()> {
            fs::write(path, serde_json::to_string_pretty(tree)?)?;
            Ok(())
        }
    }

    fn group(name: &str, amount: f64) -> DataGroup {
        let row = RowRecord::new("交通费").unwrap().with(Column::CurrentApproved, amount);
        DataGroup::new(name, format!("{name}办事处"), vec![row])
    }

    fn output_files(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_failing_group_does_not_stop_the_batch() {
        let dir    = tempfile::tempdir().unwrap();
        let store  = JsonStore::new(2);
        let groups = vec![group("广州", 1200.0), group("佛山", 800.0), group("深圳", 300.0)];

        let summary = run_batch(
            &store,
            &TemplateProfile::default(),
            &groups,
            Some(Period { year: 2025, month: 3 }),
            true,
            dir.path(),
        )
        .unwrap();

        assert_eq!(summary.succeeded(), 2);
        assert_eq!(summary.failed(), 1);

        let failed: Vec<_> = summary.failures().collect();
        assert_eq!(failed[0].group, "佛山");
        assert!(failed[0].failure.as_deref().unwrap().contains("end marker"));

        assert_eq!(output_files(dir.path()), vec!["广州.json", "深圳.json"]);
    }

    #[test]
    fn test_persisted_tree_has_group_data() {
        let dir   = tempfile::tempdir().unwrap();
        let store = JsonStore::new(0);

        run_batch(
            &store,
            &TemplateProfile::default(),
            &[group("广州", 1200.0)],
            Some(Period { year: 2025, month: 3 }),
            true,
            dir.path(),
        )
        .unwrap();

        let json = fs::read_to_string(dir.path().join("广州.json")).unwrap();
        let tree: DocumentTree = serde_json::from_str(&json).unwrap();
        let lines: Vec<String> = tree.blocks.iter().map(Block::text).collect();
        assert_eq!(lines[0], "广州办事处：");
        assert_eq!(lines[1], "你处2025年3月费用预算批复如下：");
        assert_eq!(lines[2], "交通费\t1200");
        assert!(lines[3].starts_with("合计\t1200元"));
    }

    #[test]
    fn test_colliding_output_names_are_not_overwritten() {
        let dir    = tempfile::tempdir().unwrap();
        let store  = JsonStore::new(0);
        let groups = vec![group("华南/广州", 1.0), group("华南_广州", 2.0)];

        let summary = run_batch(&store, &TemplateProfile::default(), &groups, None, true, dir.path())
            .unwrap();

        assert_eq!(summary.succeeded(), 1);
        assert!(summary.outcomes[1].failure.as_deref().unwrap().contains("already used"));
        assert_eq!(output_files(dir.path()), vec!["华南_广州.json"]);
    }

    #[test]
    fn test_resolve_period() {
        assert_eq!(resolve_period(None, None, 2025), None);
        assert_eq!(resolve_period(None, Some(3), 2025), Some(Period { year: 2025, month: 3 }));
        assert_eq!(resolve_period(Some(2024), Some(10), 2025), Some(Period { year: 2024, month: 10 }));
    }

    #[test]
    fn test_unsupported_template_aborts_before_groups() {
        let dir    = tempfile::tempdir().unwrap();
        let config = GenerateConfig {
            template:   dir.path().join("模板.doc").display().to_string(),
            output_dir: dir.path().join("out").display().to_string(),
            ..GenerateConfig::default()
        };

        let err = GenerateUseCase::new(config).execute().unwrap_err();
        assert!(err.to_string().starts_with("unsupported template format"));
        assert!(!dir.path().join("out").exists());
    }
}
