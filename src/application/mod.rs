// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Wires the data layer, the engine and the infra layer
// together for the two things a user can do:
//
//   generate — one output document per data group
//   inspect  — show how a template will be read and spliced
//
// Rules for this layer:
//   - No printing here (that's Layer 1)
//   - No docx-rs or calamine calls (that's Layer 4)
//   - Only workflow coordination

// Per-group state machine: Loaded → Replaced → Spliced → Persisted
pub mod pipeline;

// The batch workflow
pub mod generate_use_case;

// Template diagnostics
pub mod inspect_use_case;
