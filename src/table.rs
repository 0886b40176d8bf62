//! Upload table loading
//!
//! Every category upload is a rectangular table with a header row. The
//! header is usually row 1, but some exports shift it (GM tire files put
//! it on row 3, some technician reports on row 2), so loading takes an
//! explicit number of leading rows to skip. Timecard dumps have no header
//! at all and are loaded as raw positional rows.

use anyhow::{anyhow, Context, Result};
use calamine::{open_workbook, Data, Reader, Xlsx};
use std::path::Path;
use tracing::{debug, info};

use crate::error::ReportError;
use crate::normalize::{cell_is_blank, cell_text};

/// A parsed upload: trimmed header names plus data rows.
#[derive(Debug, Clone)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Data>>,
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Data>>) -> Self {
        Table { headers, rows }
    }

    /// Load an upload, dispatching on extension. Header on the first row.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Table> {
        Self::load_with_skip(path, 0)
    }

    /// Load an upload with `skip` leading rows dropped before the header.
    pub fn load_with_skip<P: AsRef<Path>>(path: P, skip: usize) -> Result<Table> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| anyhow!("File has no extension"))?
            .to_lowercase();

        info!("Loading upload: {:?} (type: {}, skip: {})", path, extension, skip);

        match extension.as_str() {
            "xlsx" | "xls" => Self::from_xlsx(path, skip),
            "csv" => Self::from_csv(path, skip),
            _ => Err(anyhow!(
                "Unsupported file format: {}. Supported formats: .xlsx, .xls, .csv",
                extension
            )),
        }
    }

    fn from_xlsx(path: &Path, skip: usize) -> Result<Table> {
        let rows = load_raw(path)?;
        let mut iter = rows.into_iter().skip(skip);

        let header_row = iter
            .next()
            .ok_or_else(|| anyhow!("Upload has no header row"))?;
        let headers: Vec<String> = header_row.iter().map(cell_text).collect();
        debug!("Upload headers: {:?}", headers);

        let data_rows = iter
            .filter(|row| !row.iter().all(cell_is_blank))
            .collect();

        Ok(Table {
            headers,
            rows: data_rows,
        })
    }

    fn from_csv(path: &Path, skip: usize) -> Result<Table> {
        let rows = load_raw_csv(path)?;
        let mut iter = rows.into_iter().skip(skip);

        let header_row = iter
            .next()
            .ok_or_else(|| anyhow!("Upload has no header row"))?;
        let headers: Vec<String> = header_row.iter().map(cell_text).collect();

        let data_rows = iter
            .filter(|row| !row.iter().all(cell_is_blank))
            .collect();

        Ok(Table {
            headers,
            rows: data_rows,
        })
    }

    /// Index of the column whose (trimmed) header equals `name`.
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Like [`Table::column`] but missing columns are a hard error naming
    /// the category, matching the user-facing message contract.
    pub fn require_column(&self, category: &str, name: &str) -> Result<usize> {
        self.column(name)
            .ok_or_else(|| ReportError::column_missing(category, name).into())
    }

    pub fn cell(&self, row: usize, col: usize) -> &Data {
        static EMPTY: Data = Data::Empty;
        self.rows.get(row).and_then(|r| r.get(col)).unwrap_or(&EMPTY)
    }
}

/// Load a workbook's first sheet as raw positional rows (no header).
pub fn load_raw<P: AsRef<Path>>(path: P) -> Result<Vec<Vec<Data>>> {
    let path = path.as_ref();
    let mut workbook: Xlsx<_> = open_workbook(path).context("Failed to open Excel file")?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| anyhow!("No sheets found in workbook"))?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .context("Failed to read worksheet")?;

    Ok(range.rows().map(|r| r.to_vec()).collect())
}

/// Load a CSV file as raw positional rows, numbers parsed where possible.
pub fn load_raw_csv<P: AsRef<Path>>(path: P) -> Result<Vec<Vec<Data>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path.as_ref())
        .context("Failed to open CSV file")?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.context("Failed to read CSV record")?;
        let row = record
            .iter()
            .map(|field| {
                let trimmed = field.trim();
                if trimmed.is_empty() {
                    Data::Empty
                } else if let Ok(f) = trimmed.parse::<f64>() {
                    Data::Float(f)
                } else {
                    Data::String(trimmed.to_string())
                }
            })
            .collect();
        rows.push(row);
    }
    Ok(rows)
}
