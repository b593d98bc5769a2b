// ============================================================
// Layer 3 — Row Records and Data Groups
// ============================================================
// One worksheet of the budget workbook becomes one DataGroup.
// Each data row becomes a RowRecord keyed by a fixed set of
// columns (A–G of the sheet):
//
//   项目 | 办事处预算 | 公司预算 | 本月批复数 | 上月批复数 | 上月执行数 | 备注
//
// A record without a project name is not valid and is never
// constructed by the data source.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The fixed column set. Declaration order = sheet column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Column {
    Project,
    OfficeBudget,
    CompanyBudget,
    CurrentApproved,
    PriorApproved,
    PriorExecuted,
    Remark,
}

impl Column {
    pub const ALL: [Column; 7] = [
        Column::Project,
        Column::OfficeBudget,
        Column::CompanyBudget,
        Column::CurrentApproved,
        Column::PriorApproved,
        Column::PriorExecuted,
        Column::Remark,
    ];

    /// Header text as it appears in the workbook.
    pub fn header(self) -> &'static str {
        match self {
            Column::Project         => "项目",
            Column::OfficeBudget    => "办事处预算",
            Column::CompanyBudget   => "公司预算",
            Column::CurrentApproved => "本月批复数",
            Column::PriorApproved   => "上月批复数",
            Column::PriorExecuted   => "上月执行数",
            Column::Remark          => "备注",
        }
    }
}

/// A single cell value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum CellValue {
    Number(f64),
    Text(String),
    #[default]
    Empty,
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        if s.is_empty() { CellValue::Empty } else { CellValue::Text(s.to_string()) }
    }
}

/// One data row. `project` is always present and non-empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowRecord {
    cells: BTreeMap<Column, CellValue>,
}

impl RowRecord {
    /// Returns `None` when the project name is blank.
    pub fn new(project: impl Into<String>) -> Option<Self> {
        let project = project.into();
        if project.trim().is_empty() {
            return None;
        }
        let mut cells = BTreeMap::new();
        cells.insert(Column::Project, CellValue::Text(project));
        Some(Self { cells })
    }

    /// Builder-style setter. Setting the project column is ignored so
    /// the non-empty invariant cannot be broken after construction.
    pub fn with(mut self, column: Column, value: impl Into<CellValue>) -> Self {
        self.set(column, value);
        self
    }

    pub fn set(&mut self, column: Column, value: impl Into<CellValue>) {
        if column != Column::Project {
            self.cells.insert(column, value.into());
        }
    }

    pub fn project(&self) -> &str {
        match self.cells.get(&Column::Project) {
            Some(CellValue::Text(s)) => s,
            _ => "",
        }
    }

    /// Absent columns read as `CellValue::Empty`.
    pub fn get(&self, column: Column) -> &CellValue {
        const EMPTY: &CellValue = &CellValue::Empty;
        self.cells.get(&column).unwrap_or(EMPTY)
    }
}

/// All rows of one worksheet plus its display title.
/// Produces exactly one output document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataGroup {
    pub name:  String,
    pub title: String,
    pub rows:  Vec<RowRecord>,
}

impl DataGroup {
    pub fn new(name: impl Into<String>, title: impl Into<String>, rows: Vec<RowRecord>) -> Self {
        Self { name: name.into(), title: title.into(), rows }
    }
}
