// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The engine never opens files itself. Two seams keep the
// spreadsheet and the document package out of the core:
//
//   GroupSource    — yields the data groups (one per sheet)
//   DocumentStore  — hands out the template tree and persists
//                    a mutated tree to an output path
//
// Implementations:
//   - WorkbookSource  → reads an .xlsx workbook with calamine
//   - DocxStore       → reads / writes .docx with docx-rs
//   - in tests, small in-memory stand-ins for both

use anyhow::Result;
use std::path::Path;

use crate::domain::document::DocumentTree;
use crate::domain::record::DataGroup;

// ─── GroupSource ──────────────────────────────────────────────────────────────
/// Anything that can supply the ordered list of data groups.
pub trait GroupSource {
    fn load_groups(&self) -> Result<Vec<DataGroup>>;
}

// ─── DocumentStore ────────────────────────────────────────────────────────────
/// Owner of the template. The template tree is read-only; every
/// caller clones it before mutating.
pub trait DocumentStore {
    /// The template body as loaded once at start-up.
    fn template(&self) -> &DocumentTree;

    /// File extension (without dot) of documents this store writes.
    fn extension(&self) -> &str;

    /// Serialise `tree` to `path`, replacing any existing file.
    fn persist(&self, tree: &DocumentTree, path: &Path) -> Result<()>;
}
