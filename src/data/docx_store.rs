// ============================================================
// Layer 4 — .docx Document Store
// ============================================================
// Loads the template with the docx-rs crate, exposes it as a
// domain DocumentTree, and writes mutated trees back out.
//
// How .docx files map onto the tree:
//   A .docx file is a ZIP archive of XML parts. docx-rs parses
//   the main part into:
//
//   Docx
//     └── document.children: Vec<DocumentChild>
//           ├── Paragraph
//           │     └── children: Vec<ParagraphChild>
//           │           └── Run  ── run_property (bold, fonts, size)
//           │                 └── children: Vec<RunChild>
//           │                       └── Text   ← one Fragment each
//           ├── Table        → Block::Table (text only)
//           └── anything else → Block::Opaque
//
// Writing back:
//   Blocks that came from the template (origin = Some(i)) are
//   re-emitted from the original child i. For paragraphs only
//   the Text payloads are replaced, in the same traversal order
//   used when reading, so run properties, bookmarks and field
//   codes survive. docx-rs keeps Text payloads XML-escaped in
//   memory but hands them out unescaped when reading a file, so
//   every payload is rebuilt through `Text::new`. Synthesized paragraphs (origin = None) are
//   built fresh from their style descriptors.
//
// Runs nested inside hyperlinks or revision marks are not
// exposed as fragments and are written back unchanged.

use anyhow::{anyhow, Context, Result};
use docx_rs::{
    read_docx, DocumentChild, Docx, ParagraphChild, Run, RunChild, RunFonts, SpecialIndentType,
    TableCellContent, TableChild, TableRowChild,
};
use std::{fs, path::Path};

use crate::domain::document::{Block, DocumentTree, Fragment, FragmentStyle, Paragraph, Table};
use crate::domain::error::EngineError;
use crate::domain::traits::DocumentStore;

/// Holds the parsed template and its tree view.
pub struct DocxStore {
    source: Docx,
    tree:   DocumentTree,
}

impl DocxStore {
    /// Open and parse a .docx template.
    ///
    /// Fails with `UnsupportedTemplateFormat` for anything that is not
    /// a readable .docx package (legacy .doc included).
    pub fn open(path: &Path) -> Result<Self> {
        let is_docx = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("docx"));
        if !is_docx {
            return Err(EngineError::UnsupportedTemplateFormat {
                path:   path.to_path_buf(),
                reason: "only .docx templates are supported".into(),
            }
            .into());
        }

        let bytes = fs::read(path)
            .with_context(|| format!("Cannot read template '{}'", path.display()))?;

        let source = read_docx(&bytes).map_err(|e| EngineError::UnsupportedTemplateFormat {
            path:   path.to_path_buf(),
            reason: format!("not a valid .docx package: {e:?}"),
        })?;

        let tree = read_tree(&source);
        tracing::info!(
            "Loaded template '{}' ({} top-level blocks)",
            path.display(),
            tree.blocks.len()
        );
        Ok(Self { source, tree })
    }

    /// Build the output package for a mutated tree.
    fn render(&self, tree: &DocumentTree) -> Docx {
        let originals = &self.source.document.children;
        let mut children = Vec::with_capacity(tree.blocks.len());

        for block in &tree.blocks {
            match block {
                Block::Paragraph(p) => match p.origin.and_then(|i| originals.get(i)) {
                    Some(DocumentChild::Paragraph(src)) => {
                        children.push(DocumentChild::Paragraph(Box::new(write_back(src, p))));
                    }
                    _ => children.push(DocumentChild::Paragraph(Box::new(build_paragraph(p)))),
                },
                Block::Table(t) => {
                    if let Some(child) = t.origin.and_then(|i| originals.get(i)) {
                        children.push(child.clone());
                    }
                }
                Block::Opaque { origin } => {
                    if let Some(child) = originals.get(*origin) {
                        children.push(child.clone());
                    }
                }
            }
        }

        let mut docx = self.source.clone();
        docx.document.children = children;
        docx
    }
}

impl DocumentStore for DocxStore {
    fn template(&self) -> &DocumentTree {
        &self.tree
    }

    fn extension(&self) -> &str {
        "docx"
    }

    fn persist(&self, tree: &DocumentTree, path: &Path) -> Result<()> {
        let file = fs::File::create(path)
            .with_context(|| format!("Cannot create '{}'", path.display()))?;

        self.render(tree)
            .build()
            .pack(file)
            .map_err(|e| anyhow!("Cannot write '{}': {:?}", path.display(), e))?;

        tracing::debug!("Wrote '{}'", path.display());
        Ok(())
    }
}

// ─── Reading ──────────────────────────────────────────────────────────────────

fn read_tree(docx: &Docx) -> DocumentTree {
    let blocks = docx
        .document
        .children
        .iter()
        .enumerate()
        .map(|(i, child)| match child {
            DocumentChild::Paragraph(p) => Block::Paragraph(read_paragraph(p, i)),
            DocumentChild::Table(t) => Block::Table(Table {
                text:   table_text(t),
                origin: Some(i),
            }),
            _ => Block::Opaque { origin: i },
        })
        .collect();
    DocumentTree::new(blocks)
}

/// One fragment per Text node of each direct run.
fn read_paragraph(para: &docx_rs::Paragraph, origin: usize) -> Paragraph {
    let mut out = Paragraph { origin: Some(origin), ..Paragraph::default() };

    for child in &para.children {
        if let ParagraphChild::Run(run) = child {
            let style = FragmentStyle {
                bold: run.run_property.bold.is_some(),
                ..FragmentStyle::default()
            };
            for rc in &run.children {
                if let RunChild::Text(t) = rc {
                    out.fragments.push(Fragment::new(t.text.clone(), style.clone()));
                }
            }
        }
    }
    out
}

fn paragraph_text(para: &docx_rs::Paragraph) -> String {
    read_paragraph(para, 0).text()
}

/// Cell paragraphs joined by spaces, rows by newlines.
fn table_text(table: &docx_rs::Table) -> String {
    let mut lines = Vec::new();
    for row in &table.rows {
        #[allow(irrefutable_let_patterns)]
        let TableChild::TableRow(row) = row else { continue };
        let mut cells = Vec::new();
        for cell in &row.cells {
            #[allow(irrefutable_let_patterns)]
            let TableRowChild::TableCell(cell) = cell else { continue };
            for content in &cell.children {
                if let TableCellContent::Paragraph(p) = content {
                    cells.push(paragraph_text(p));
                }
            }
        }
        lines.push(cells.join(" "));
    }
    lines.join("\n")
}

// ─── Writing ──────────────────────────────────────────────────────────────────

/// Copy of `src` with its Text payloads replaced by the fragment texts.
/// Every Text node is rebuilt so its payload is escaped again.
fn write_back(src: &docx_rs::Paragraph, para: &Paragraph) -> docx_rs::Paragraph {
    let mut out   = src.clone();
    let mut texts = para.fragments.iter().map(|f| f.text.as_str());

    for child in out.children.iter_mut() {
        if let ParagraphChild::Run(run) = child {
            for rc in run.children.iter_mut() {
                if let RunChild::Text(t) = rc {
                    if let Some(text) = texts.next() {
                        *t = docx_rs::Text::new(text);
                    }
                }
            }
        }
    }
    out
}

fn build_paragraph(para: &Paragraph) -> docx_rs::Paragraph {
    let mut out = docx_rs::Paragraph::new();

    if let Some(indent) = para.style.first_line_indent {
        out = out.indent(None, Some(SpecialIndentType::FirstLine(indent)), None, None);
    }
    for fragment in &para.fragments {
        out = out.add_run(build_run(fragment));
    }
    out
}

/// `\t` inside fragment text becomes a real tab element.
fn build_run(fragment: &Fragment) -> Run {
    let mut run = Run::new();
    for (i, piece) in fragment.text.split('\t').enumerate() {
        if i > 0 {
            run = run.add_tab();
        }
        if !piece.is_empty() {
            run = run.add_text(piece);
        }
    }

    let style = &fragment.style;
    if style.bold {
        run = run.bold();
    }
    if let Some(size) = style.size_half_points {
        run = run.size(size);
    }
    if style.east_asia_font.is_some() || style.latin_font.is_some() {
        let mut fonts = RunFonts::new();
        if let Some(font) = &style.east_asia_font {
            fonts = fonts.east_asia(font.as_str());
        }
        if let Some(font) = &style.latin_font {
            fonts = fonts.ascii(font.as_str()).hi_ansi(font.as_str());
        }
        run = run.fonts(fonts);
    }
    run
}
