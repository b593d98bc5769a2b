// ============================================================
// Layer 5 — Template Mutation Engine
// ============================================================
// Pure transformations over the domain document tree. Nothing
// in here opens files or knows about .docx; every function is
// testable with hand-built trees.
//
// What's in this layer:
//
//   splicer.rs     — pours a replacement string back into the
//                    original run boundaries of a paragraph
//
//   replacer.rs    — literal and regex rules over a paragraph's
//                    concatenated text, with per-paragraph
//                    priority (exclusive rules)
//
//   anchor.rs      — finds the start/end marker paragraphs that
//                    bound the replaceable expense list
//
//   synthesizer.rs — builds the styled expense lines and the
//                    totals paragraph from a group's rows
//
//   profile.rs     — every template-specific literal (markers,
//                    fonts, closing notice, cutoff rule)

/// Run-text splicing with fragment-count conservation
pub mod splicer;

/// Pattern rules and rule sets
pub mod replacer;

/// Anchor region location
pub mod anchor;

/// Expense list synthesis
pub mod synthesizer;

/// Template profile (configuration)
pub mod profile;
