// ============================================================
// Layer 4 — Cell Text Normaliser
// ============================================================
// Cleans text read from workbook cells before it is compared
// against names like "合计" or parsed as an amount.
//
// Spreadsheet cells often contain:
//   - Non-breaking spaces (U+00A0) pasted from web pages
//   - Ideographic spaces (U+3000) typed with a CJK IME
//   - Zero-width spaces (U+200B) and BOMs (U+FEFF)
//   - Line breaks inside a cell (Alt+Enter)
//
// Cleaning steps (applied in order):
//   1. Map every whitespace-like or control character to ' '
//   2. Collapse runs of spaces into one
//   3. Trim both ends

pub struct CellNormalizer;

impl CellNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// Normalise one cell's text to a single trimmed line.
    pub fn clean(&self, text: &str) -> String {
        let mut out        = String::with_capacity(text.len());
        let mut last_space = false;

        for c in text.chars() {
            let c = match c {
                '\u{00A0}' | '\u{3000}' | '\u{200B}' | '\u{FEFF}' => ' ',
                c if c.is_whitespace() || c.is_control() => ' ',
                c => c,
            };

            if c == ' ' {
                if !last_space {
                    out.push(' ');
                }
                last_space = true;
            } else {
                out.push(c);
                last_space = false;
            }
        }

        out.trim().to_string()
    }
}

impl Default for CellNormalizer {
    fn default() -> Self {
        Self::new()
    }
}
