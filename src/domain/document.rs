// ============================================================
// Layer 3 — Document Tree Domain Types
// ============================================================
// An in-memory, format-agnostic view of a word-processing
// document body:
//
//   DocumentTree
//     └── blocks: Vec<Block>
//           ├── Paragraph
//           │     └── fragments: Vec<Fragment>   (one per text run)
//           │           ├── text
//           │           └── style: FragmentStyle
//           ├── Table   (kept opaque, only its text is visible)
//           └── Opaque  (section properties, bookmarks, ...)
//
// The order of fragments inside a paragraph matters:
// concatenating their text yields the paragraph's logical text.
// Nothing here knows about .docx — the data layer maps the
// real file onto this tree and back again.
//
// Blocks that came from the template remember their position
// in the source file (`origin`) so the store can write them
// back untouched apart from their text.

use serde::{Deserialize, Serialize};

// ─── Styles ──────────────────────────────────────────────────────────────────

/// Character-level style carried by a single fragment.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FragmentStyle {
    pub bold: bool,

    /// East-Asian font family, e.g. "楷体_GB2312"
    pub east_asia_font: Option<String>,

    /// Latin font family used for ASCII / high-ANSI characters
    pub latin_font: Option<String>,

    /// Font size in half-points (28 = 14pt = Chinese size "四号")
    pub size_half_points: Option<usize>,
}

/// Paragraph-level layout.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ParagraphStyle {
    /// First-line indentation in twips (720 = two full-width characters at 14pt)
    pub first_line_indent: Option<i32>,
}

// ─── Fragment ────────────────────────────────────────────────────────────────

/// The smallest text-bearing unit in a paragraph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    pub text:  String,
    pub style: FragmentStyle,
}

impl Fragment {
    pub fn new(text: impl Into<String>, style: FragmentStyle) -> Self {
        Self { text: text.into(), style }
    }

    /// A fragment with default (unstyled) formatting.
    #[cfg(test)]
    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, FragmentStyle::default())
    }
}

// ─── Paragraph ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Paragraph {
    pub style:     ParagraphStyle,
    pub fragments: Vec<Fragment>,

    /// Index of the source block this paragraph was read from.
    /// `None` for paragraphs synthesized at run time.
    pub origin: Option<usize>,
}

impl Paragraph {
    pub fn new(style: ParagraphStyle) -> Self {
        Self { style, fragments: Vec::new(), origin: None }
    }

    /// Build a paragraph from plain text pieces, one fragment each.
    #[cfg(test)]
    pub fn from_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            style:     ParagraphStyle::default(),
            fragments: texts.into_iter().map(Fragment::plain).collect(),
            origin:    None,
        }
    }

    pub fn with_fragment(mut self, fragment: Fragment) -> Self {
        self.fragments.push(fragment);
        self
    }

    /// Concatenation of every fragment's text, in order.
    pub fn text(&self) -> String {
        self.fragments.iter().map(|f| f.text.as_str()).collect()
    }
}

// ─── Block / Tree ────────────────────────────────────────────────────────────

/// A table from the template. Only its flattened text is exposed;
/// the structure itself is preserved by the store via `origin`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub text:   String,
    pub origin: Option<usize>,
}

/// One top-level content block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Block {
    Paragraph(Paragraph),
    Table(Table),
    /// Anything else the source format carries at the top level
    Opaque { origin: usize },
}

impl Block {
    pub fn as_paragraph(&self) -> Option<&Paragraph> {
        match self {
            Block::Paragraph(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_paragraph_mut(&mut self) -> Option<&mut Paragraph> {
        match self {
            Block::Paragraph(p) => Some(p),
            _ => None,
        }
    }

    pub fn is_paragraph(&self) -> bool {
        matches!(self, Block::Paragraph(_))
    }

    /// Rendered text of the block (empty for opaque blocks).
    pub fn text(&self) -> String {
        match self {
            Block::Paragraph(p) => p.text(),
            Block::Table(t)     => t.text.clone(),
            Block::Opaque { .. } => String::new(),
        }
    }
}

/// The full body of one document. Cloning it gives an independent
/// copy: every group works on its own tree.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DocumentTree {
    pub blocks: Vec<Block>,
}

impl DocumentTree {
    pub fn new(blocks: Vec<Block>) -> Self {
        Self { blocks }
    }

    pub fn paragraphs_mut(&mut self) -> impl Iterator<Item = &mut Paragraph> {
        self.blocks.iter_mut().filter_map(Block::as_paragraph_mut)
    }
}
