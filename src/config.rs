//! Grid layout configuration
//!
//! The destination workbook's geometry (roster start row, block strides,
//! date header row, first date column per grid kind) is fixed by the
//! shared template, so the defaults here are the production layout. A
//! TOML file can override them for stores whose template drifted.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// First roster row in column A.
    pub roster_start_row: u32,
    /// Row holding the day-of-month headers.
    pub date_header_row: u32,
    /// Rows per advisor block (including the trailing spacer row).
    pub advisor_block_rows: u32,
    /// Rows per technician block.
    pub tech_block_rows: u32,
    /// First column that can hold a date header on advisor grids (C).
    pub advisor_first_date_col: u32,
    /// First date column on technician grids (E).
    pub tech_first_date_col: u32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        LayoutConfig {
            roster_start_row: 4,
            date_header_row: 2,
            advisor_block_rows: 26,
            tech_block_rows: 4,
            advisor_first_date_col: 3,
            tech_first_date_col: 5,
        }
    }
}

impl LayoutConfig {
    /// Load from a TOML file, or the production defaults when no path is
    /// given.
    pub fn load(path: Option<&Path>) -> Result<LayoutConfig> {
        match path {
            None => Ok(LayoutConfig::default()),
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config file {:?}", path))?;
                toml::from_str(&text)
                    .with_context(|| format!("Failed to parse config file {:?}", path))
            }
        }
    }
}
