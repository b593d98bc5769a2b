// ============================================================
// Layer 4 — Data Access
// ============================================================
// The only layer that touches the two input files:
//
//   budget workbook (.xlsx)          template (.docx)
//       │                                 │
//       ▼                                 ▼
//   WorkbookSource                    DocxStore
//     (calamine)                        (docx-rs)
//       │  CellNormalizer                 │
//       ▼                                 ▼
//   Vec<DataGroup>                    DocumentTree ──► mutated ──► {group}.docx
//
// Both implement the traits from Layer 3, so the application
// layer can be exercised with in-memory stand-ins.

/// Reads/writes .docx documents using docx-rs
pub mod docx_store;

/// Reads budget sheets from a workbook using calamine
pub mod workbook;

/// Cleans cell text before comparison and parsing
pub mod normalizer;
