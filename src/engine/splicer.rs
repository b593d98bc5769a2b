// ============================================================
// Layer 5 — Run-Text Splicer
// ============================================================
// Word splits a visually continuous sentence into many runs:
// "2025年12月" can easily arrive as ["20", "25年1", "2月"].
// To rewrite such text without losing per-run formatting we
// keep the NUMBER of fragments and pour the new text back
// into the old boundaries:
//
//   old:  ["20", "25年1", "2月"]         (2 | 4 | 2 chars)
//   new:  "2026年3月"
//   out:  ["20", "26年3", "月"]          (2 | 4 | rest)
//
// Every fragment but the last takes at most its original
// length from the cursor; the last one takes whatever is left.
// Shorter replacements leave trailing fragments empty.
//
// Lengths are counted in chars, never bytes — the text is
// mostly CJK and a byte split would land inside a character.

use crate::domain::document::{Fragment, Paragraph};

/// Rewrite `fragments` so that their concatenation equals `replacement`.
/// Styles are untouched; an empty slice is left as is.
pub fn splice(fragments: &mut [Fragment], replacement: &str) {
    let Some((last, head)) = fragments.split_last_mut() else {
        return;
    };

    let mut rest = replacement;
    for fragment in head {
        let take  = fragment.text.chars().count();
        let split = byte_offset(rest, take);
        fragment.text = rest[..split].to_string();
        rest = &rest[split..];
    }
    last.text = rest.to_string();
}

/// Convenience wrapper for a whole paragraph.
pub fn splice_paragraph(paragraph: &mut Paragraph, replacement: &str) {
    splice(&mut paragraph.fragments, replacement);
}

/// Byte offset of the `chars`-th character, clamped to the end of `s`.
fn byte_offset(s: &str, chars: usize) -> usize {
    s.char_indices().nth(chars).map(|(i, _)| i).unwrap_or(s.len())
}
