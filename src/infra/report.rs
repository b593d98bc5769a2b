// ============================================================
// Layer 6 — Batch Report
// ============================================================
// Writes a machine-readable record of one `generate` run next
// to the generated documents:
//
//   output/
//     广州.docx
//     深圳.docx
//     report.json   ← this file
//
// Example:
//   {
//     "generated_at": "2025-03-02T09:14:55+08:00",
//     "succeeded": 2,
//     "failed": 1,
//     "outcomes": [
//       { "group": "广州", "stage": "Persisted", "output": "output/广州.docx", ... },
//       { "group": "佛山", "stage": "Failed", "failure": "region not found: ...", ... }
//     ]
//   }
//
// The report is rewritten on every run.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::{Path, PathBuf}};

use crate::application::generate_use_case::BatchSummary;
use crate::application::pipeline::GroupOutcome;

pub const REPORT_FILE: &str = "report.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub generated_at: String,
    pub succeeded:    usize,
    pub failed:       usize,
    pub outcomes:     Vec<GroupOutcome>,
}

impl BatchReport {
    pub fn from_summary(summary: &BatchSummary) -> Self {
        Self {
            generated_at: chrono::Local::now().to_rfc3339(),
            succeeded:    summary.succeeded(),
            failed:       summary.failed(),
            outcomes:     summary.outcomes.clone(),
        }
    }
}

pub struct ReportWriter {
    path: PathBuf,
}

impl ReportWriter {
    /// Report file inside `dir`. The directory must already exist.
    pub fn new(dir: &Path) -> Self {
        Self { path: dir.join(REPORT_FILE) }
    }

    pub fn write(&self, summary: &BatchSummary) -> Result<&Path> {
        let json = serde_json::to_string_pretty(&BatchReport::from_summary(summary))?;
        fs::write(&self.path, json)
            .with_context(|| format!("Cannot write report to '{}'", self.path.display()))?;

        tracing::debug!("Saved batch report to '{}'", self.path.display());
        Ok(self.path.as_path())
    }
}
