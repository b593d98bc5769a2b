// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust structs, enums and traits describing what the
// system works on: data groups read from the workbook and the
// document tree of the template.
//
// Rules for this layer:
//   - NO docx-rs or calamine types
//   - NO file I/O
//   - Only data, invariants and the seams other layers implement

// Document tree: blocks, paragraphs, fragments, styles
pub mod document;

// Row records and data groups
pub mod record;

// Engine error taxonomy
pub mod error;

// Core abstractions (traits) that other layers implement
pub mod traits;
