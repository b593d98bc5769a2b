// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Files the engine reads or writes besides the workbook, the
// template and the generated documents:
//
//   profile_store.rs — Template profile JSON
//                      Loads a profile given with --profile,
//                      or falls back to the built-in defaults.
//                      `inspect --write-profile` saves one as a
//                      starting point for editing.
//
//   report.rs        — Batch report
//                      Writes report.json into the output
//                      directory after every `generate` run:
//                      one entry per group with its final stage,
//                      output path or failure reason.

/// Template profile loading and saving
pub mod profile_store;

/// report.json writer
pub mod report;
