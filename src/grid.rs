//! Destination grid abstraction
//!
//! The destination spreadsheet is an opaque (row, column)-addressed
//! service: the core reads the roster column and the date header row,
//! then issues one batched write per category action. Connection and
//! authentication live outside this crate; [`Grid`] is the seam.
//!
//! Rows and columns are 1-based, matching the remote service's
//! addressing.

use anyhow::{anyhow, Context, Result};
use calamine::{open_workbook, Data, Reader, Xlsx};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

/// A native scalar staged for a grid cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Int(i64),
    Number(f64),
    Text(String),
}

impl CellValue {
    pub fn from_count(n: i64) -> CellValue {
        CellValue::Int(n)
    }

    /// Decimal sums stage as integers when integral, else as numbers.
    pub fn from_decimal(d: Decimal) -> CellValue {
        if d.fract().is_zero() {
            if let Some(i) = d.to_i64() {
                return CellValue::Int(i);
            }
        }
        CellValue::Number(d.to_f64().unwrap_or(0.0))
    }

    pub fn to_display(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Int(i) => i.to_string(),
            CellValue::Number(f) => f.to_string(),
            CellValue::Text(s) => s.clone(),
        }
    }
}

impl From<&Data> for CellValue {
    fn from(cell: &Data) -> Self {
        match cell {
            Data::Empty => CellValue::Empty,
            Data::Int(i) => CellValue::Int(*i),
            Data::Float(f) => {
                if *f == f.floor() && f.abs() < 1e15 {
                    CellValue::Int(*f as i64)
                } else {
                    CellValue::Number(*f)
                }
            }
            Data::String(s) => {
                if s.trim().is_empty() {
                    CellValue::Empty
                } else {
                    CellValue::Text(s.clone())
                }
            }
            other => CellValue::Text(other.to_string()),
        }
    }
}

/// One staged (row, column, value) triple. Accumulated in memory per
/// action, flushed in a single batched write, then discarded.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingWrite {
    pub row: u32,
    pub col: u32,
    pub value: CellValue,
}

/// Read/write access to the destination grid.
pub trait Grid {
    /// All values of a column from row 1 to the last non-empty row.
    /// Empty cells inside the range render as "".
    fn col_values(&self, col: u32) -> Result<Vec<String>>;

    /// All values of a row from column 1 to the last non-empty column.
    fn row_values(&self, row: u32) -> Result<Vec<String>>;

    fn read_cell(&self, row: u32, col: u32) -> Result<CellValue>;

    /// Apply one batched write. A failure is reported to the caller and
    /// is not retried; already-applied writes are not rolled back.
    fn update_cells(&mut self, writes: &[PendingWrite]) -> Result<()>;
}

/// In-memory grid used by tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryGrid {
    cells: BTreeMap<(u32, u32), CellValue>,
}

impl MemoryGrid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_cell(&mut self, row: u32, col: u32, value: CellValue) {
        self.cells.insert((row, col), value);
    }

    pub fn set_text(&mut self, row: u32, col: u32, text: &str) {
        self.set_cell(row, col, CellValue::Text(text.to_string()));
    }

    fn values_along(&self, fixed: u32, by_col: bool) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for (&(row, col), value) in &self.cells {
            let (key, idx) = if by_col { (col, row) } else { (row, col) };
            if key != fixed || matches!(value, CellValue::Empty) {
                continue;
            }
            let idx = idx as usize;
            if out.len() < idx {
                out.resize(idx, String::new());
            }
            out[idx - 1] = value.to_display();
        }
        out
    }
}

impl Grid for MemoryGrid {
    fn col_values(&self, col: u32) -> Result<Vec<String>> {
        Ok(self.values_along(col, true))
    }

    fn row_values(&self, row: u32) -> Result<Vec<String>> {
        Ok(self.values_along(row, false))
    }

    fn read_cell(&self, row: u32, col: u32) -> Result<CellValue> {
        Ok(self
            .cells
            .get(&(row, col))
            .cloned()
            .unwrap_or(CellValue::Empty))
    }

    fn update_cells(&mut self, writes: &[PendingWrite]) -> Result<()> {
        for w in writes {
            self.cells.insert((w.row, w.col), w.value.clone());
        }
        Ok(())
    }
}

/// Grid backed by an xlsx snapshot of the destination workbook.
///
/// Reads come from the snapshot; writes are applied to the in-memory
/// copy and kept in order for reporting, so an update run against a
/// snapshot shows exactly what would land on the live sheet.
#[derive(Debug)]
pub struct XlsxGrid {
    inner: MemoryGrid,
    applied: Vec<PendingWrite>,
}

impl XlsxGrid {
    pub fn open<P: AsRef<Path>>(path: P, tab: Option<&str>) -> Result<XlsxGrid> {
        let path = path.as_ref();
        let mut workbook: Xlsx<_> =
            open_workbook(path).context("Failed to open grid snapshot")?;

        let sheet_name = match tab {
            Some(name) => name.to_string(),
            None => workbook
                .sheet_names()
                .first()
                .cloned()
                .ok_or_else(|| anyhow!("No sheets found in grid snapshot"))?,
        };
        info!("Loading grid snapshot {:?} tab '{}'", path, sheet_name);

        let range = workbook
            .worksheet_range(&sheet_name)
            .with_context(|| format!("Worksheet '{}' not found in grid snapshot", sheet_name))?;

        let mut inner = MemoryGrid::new();
        let (start_row, start_col) = range.start().unwrap_or((0, 0));
        for (r, row) in range.rows().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                let value = CellValue::from(cell);
                if !matches!(value, CellValue::Empty) {
                    inner.set_cell(start_row + r as u32 + 1, start_col + c as u32 + 1, value);
                }
            }
        }

        Ok(XlsxGrid {
            inner,
            applied: Vec::new(),
        })
    }

    /// Writes applied so far, in flush order.
    pub fn applied(&self) -> &[PendingWrite] {
        &self.applied
    }
}

impl Grid for XlsxGrid {
    fn col_values(&self, col: u32) -> Result<Vec<String>> {
        self.inner.col_values(col)
    }

    fn row_values(&self, row: u32) -> Result<Vec<String>> {
        self.inner.row_values(row)
    }

    fn read_cell(&self, row: u32, col: u32) -> Result<CellValue> {
        self.inner.read_cell(row, col)
    }

    fn update_cells(&mut self, writes: &[PendingWrite]) -> Result<()> {
        self.inner.update_cells(writes)?;
        self.applied.extend_from_slice(writes);
        Ok(())
    }
}
