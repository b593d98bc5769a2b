// ============================================================
// Layer 4 — Workbook Group Source
// ============================================================
// Reads the budget workbook with calamine. Every worksheet is
// one office, i.e. one DataGroup named after the sheet.
//
// Sheet layout (1-based rows, as seen in Excel):
//
//   row 1      title in C1 (often a merged cell across the row)
//   row 2–3    two-level header
//   row 4+     data: A=项目  B=办事处预算  C=公司预算
//                    D=本月批复数  E=上月批复数  F=上月执行数  G=备注
//
// Sheets smaller than 4 rows × 7 columns are not budget sheets
// and are skipped. Rows with an empty project are skipped.
//
// calamine positions are 0-based and absolute, so "row 4" is
// row index 3 and column A is index 0.

use anyhow::{Context, Result};
use calamine::{open_workbook_auto, Data, Range, Reader};
use std::path::PathBuf;

use crate::data::normalizer::CellNormalizer;
use crate::domain::record::{CellValue, Column, DataGroup, RowRecord};
use crate::domain::traits::GroupSource;

const MIN_ROWS: u32 = 4;
const MIN_COLS: u32 = 7;
const FIRST_DATA_ROW: u32 = 3;
const TITLE_COL: u32 = 2;

/// Loads every budget sheet of an .xlsx/.xls workbook.
pub struct WorkbookSource {
    path: PathBuf,
}

impl WorkbookSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl GroupSource for WorkbookSource {
    fn load_groups(&self) -> Result<Vec<DataGroup>> {
        let mut workbook = open_workbook_auto(&self.path)
            .with_context(|| format!("Cannot open workbook '{}'", self.path.display()))?;

        let normalizer = CellNormalizer::new();
        let mut groups = Vec::new();

        for name in workbook.sheet_names() {
            let range = workbook
                .worksheet_range(&name)
                .with_context(|| format!("Cannot read sheet '{}'", name))?;

            match read_sheet(&name, &range, &normalizer) {
                Some(group) => {
                    tracing::debug!("Sheet '{}': {} rows", group.name, group.rows.len());
                    groups.push(group);
                }
                None => tracing::warn!("Skipping sheet '{}': not a budget sheet", name),
            }
        }

        tracing::info!("Loaded {} data groups from '{}'", groups.len(), self.path.display());
        Ok(groups)
    }
}

/// Convert one worksheet into a DataGroup, or `None` if the sheet
/// is too small to follow the budget layout.
pub fn read_sheet(name: &str, range: &Range<Data>, normalizer: &CellNormalizer) -> Option<DataGroup> {
    let (last_row, last_col) = range.end()?;
    if last_row + 1 < MIN_ROWS || last_col + 1 < MIN_COLS {
        return None;
    }

    let title = read_title(range, last_col, normalizer);

    let mut rows = Vec::new();
    for r in FIRST_DATA_ROW..=last_row {
        let project = cell_text(range, r, 0, normalizer);
        let Some(mut record) = RowRecord::new(project) else {
            continue;
        };

        // Columns B..G follow Column::Project in declaration order
        for (offset, column) in Column::ALL.iter().enumerate().skip(1) {
            record.set(*column, cell_value(range, r, offset as u32, normalizer));
        }
        rows.push(record);
    }

    Some(DataGroup::new(name, title, rows))
}

/// C1, or the first non-empty cell of row 1 when C1 is blank
/// (a merged title keeps its value in the top-left cell only).
fn read_title(range: &Range<Data>, last_col: u32, normalizer: &CellNormalizer) -> String {
    let c1 = cell_text(range, 0, TITLE_COL, normalizer);
    if !c1.is_empty() {
        return c1;
    }
    (0..=last_col)
        .map(|c| cell_text(range, 0, c, normalizer))
        .find(|t| !t.is_empty())
        .unwrap_or_default()
}

fn cell_text(range: &Range<Data>, row: u32, col: u32, normalizer: &CellNormalizer) -> String {
    match range.get_value((row, col)) {
        None | Some(Data::Empty) => String::new(),
        Some(Data::String(s))    => normalizer.clean(s),
        Some(other)              => normalizer.clean(&other.to_string()),
    }
}

fn cell_value(range: &Range<Data>, row: u32, col: u32, normalizer: &CellNormalizer) -> CellValue {
    match range.get_value((row, col)) {
        Some(Data::Float(f)) => CellValue::Number(*f),
        Some(Data::Int(i))   => CellValue::Number(*i as f64),
        None | Some(Data::Empty) => CellValue::Empty,
        Some(Data::String(s)) => CellValue::from(normalizer.clean(s).as_str()),
        Some(other)           => CellValue::from(normalizer.clean(&other.to_string()).as_str()),
    }
}
