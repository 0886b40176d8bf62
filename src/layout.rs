//! Staff block and date column resolution
//!
//! The destination grid gives every staff member a fixed-size block of
//! rows. Blocks are discovered by reading column A at fixed strides from
//! the roster start row; the first blank cell ends discovery, so a blank
//! row embedded mid-roster silently truncates it (known fragility of the
//! shared template, not guarded here). Within a block, each metric lives
//! at a fixed 1-based row offset: `target_row = block_start + offset - 1`.

use anyhow::Result;
use once_cell::sync::Lazy;
use std::collections::BTreeMap;
use tracing::info;

use crate::error::ReportError;
use crate::grid::Grid;
use crate::normalize::normalize_key;

/// Staff-key → absolute block start row, rebuilt once per run.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    blocks: BTreeMap<String, u32>,
}

impl Roster {
    pub fn from_entries<I: IntoIterator<Item = (String, u32)>>(entries: I) -> Self {
        Roster {
            blocks: entries.into_iter().collect(),
        }
    }

    pub fn blocks(&self) -> &BTreeMap<String, u32> {
        &self.blocks
    }

    pub fn start_row(&self, key: &str) -> Option<u32> {
        self.blocks.get(key).copied()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.blocks.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

/// Walk column A in `stride`-row steps from `start_row`, collecting
/// (normalized key, block start row) pairs until the first blank cell.
pub fn resolve_roster(grid: &dyn Grid, start_row: u32, stride: u32) -> Result<Roster> {
    let column = grid.col_values(1)?;
    let mut blocks = BTreeMap::new();

    let mut row = start_row;
    loop {
        let value = column.get(row as usize - 1).map(String::as_str).unwrap_or("");
        if value.trim().is_empty() {
            break;
        }
        blocks.insert(normalize_key(value), row);
        row += stride;
    }

    info!("Resolved {} staff blocks from the grid roster", blocks.len());
    Ok(Roster { blocks })
}

/// Find the column whose header matches the day-of-month label.
///
/// The label is matched exactly against the header row, scanning from
/// `first_date_col` (advisor grids start dates at column C, technician
/// grids at column E). Absence aborts the run before any write.
pub fn resolve_date_column(
    grid: &dyn Grid,
    header_row: u32,
    day_label: &str,
    first_date_col: u32,
) -> Result<u32> {
    let headers = grid.row_values(header_row)?;
    let first = first_date_col as usize - 1;

    for (idx, header) in headers.iter().enumerate().skip(first) {
        if header.trim() == day_label {
            return Ok(idx as u32 + 1);
        }
    }

    Err(ReportError::DateNotFound {
        label: day_label.to_string(),
    }
    .into())
}

/// Strip any leading-zero formatting from a day-of-month label so "07"
/// matches the sheet's "7" header.
pub fn day_label(day: &str) -> String {
    let stripped = day.trim().trim_start_matches('0');
    if stripped.is_empty() {
        "0".to_string()
    } else {
        stripped.to_string()
    }
}

/// Metric rows inside an advisor block, 1-based from the block start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvisorField {
    MenuCount,
    MenuLabor,
    MenuParts,
    AlaCarteCount,
    AlaCarteLabor,
    AlaCarteParts,
    LaborGross,
    PartsGross,
    RecCount,
    RecSoldCount,
    RecAmount,
    RecSoldAmount,
    DailyLabor,
    DailyParts,
    RoCount,
}

impl AdvisorField {
    /// Fixed schema contract with the spreadsheet template; offsets 8-17
    /// between AlaCarteParts and LaborGross belong to the commodities.
    pub fn offset(self) -> u32 {
        match self {
            AdvisorField::MenuCount => 2,
            AdvisorField::MenuLabor => 3,
            AdvisorField::MenuParts => 4,
            AdvisorField::AlaCarteCount => 5,
            AdvisorField::AlaCarteLabor => 6,
            AdvisorField::AlaCarteParts => 7,
            AdvisorField::LaborGross => 18,
            AdvisorField::PartsGross => 19,
            AdvisorField::RecCount => 20,
            AdvisorField::RecSoldCount => 21,
            AdvisorField::RecAmount => 22,
            AdvisorField::RecSoldAmount => 23,
            AdvisorField::DailyLabor => 24,
            AdvisorField::DailyParts => 25,
            AdvisorField::RoCount => 26,
        }
    }
}

/// Metric rows inside a technician block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TechField {
    ActualHours,
    BilledHours,
    Attendance,
    Objective,
}

impl TechField {
    pub fn offset(self) -> u32 {
        match self {
            TechField::ActualHours => 1,
            TechField::BilledHours => 2,
            TechField::Attendance => 3,
            TechField::Objective => 4,
        }
    }
}

/// Commodity write order; Alignments is populated from its own uploads
/// but occupies a commodity row like the rest.
pub const COMMODITIES: [&str; 10] = [
    "Air Filters",
    "Cabin Filters",
    "Batteries",
    "Tires",
    "Brakes",
    "Alignments",
    "Wipers",
    "Belts",
    "Fluids",
    "Factory Chemicals",
];

pub static COMMODITY_OFFSETS: Lazy<BTreeMap<&'static str, u32>> = Lazy::new(|| {
    BTreeMap::from([
        ("Air Filters", 8),
        ("Cabin Filters", 9),
        ("Batteries", 10),
        ("Tires", 11),
        ("Brakes", 12),
        ("Alignments", 13),
        ("Wipers", 14),
        ("Belts", 15),
        ("Fluids", 16),
        ("Factory Chemicals", 17),
    ])
});

/// Absolute row for a 1-based offset within a block.
pub fn target_row(block_start: u32, offset: u32) -> u32 {
    block_start + offset - 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::MemoryGrid;

    #[test]
    fn test_roster_discovery_halts_at_first_blank() {
        let mut grid = MemoryGrid::new();
        grid.set_text(4, 1, "Alice");
        grid.set_text(30, 1, "bob ");
        // Blank at row 56, then a key after it that must stay invisible.
        grid.set_text(82, 1, "CAROL");

        let roster = resolve_roster(&grid, 4, 26).unwrap();
        assert_eq!(roster.len(), 2);
        assert_eq!(roster.start_row("ALICE"), Some(4));
        assert_eq!(roster.start_row("BOB"), Some(30));
        assert!(!roster.contains("CAROL"));
    }

    #[test]
    fn test_roster_technician_stride() {
        let mut grid = MemoryGrid::new();
        grid.set_text(4, 1, "TED");
        grid.set_text(8, 1, "URSULA");
        let roster = resolve_roster(&grid, 4, 4).unwrap();
        assert_eq!(roster.start_row("URSULA"), Some(8));
    }

    #[test]
    fn test_date_column_scans_from_base() {
        let mut grid = MemoryGrid::new();
        // A stray "7" before the date range must not match.
        grid.set_text(2, 2, "7");
        grid.set_text(2, 3, "6");
        grid.set_text(2, 4, "7");
        let col = resolve_date_column(&grid, 2, "7", 3).unwrap();
        assert_eq!(col, 4);
    }

    #[test]
    fn test_date_column_missing_is_fatal() {
        let mut grid = MemoryGrid::new();
        grid.set_text(2, 3, "6");
        let err = resolve_date_column(&grid, 2, "31", 3).unwrap_err();
        assert!(err.to_string().contains("date 31 not found"));
    }

    #[test]
    fn test_day_label_strips_leading_zero() {
        assert_eq!(day_label("07"), "7");
        assert_eq!(day_label("15"), "15");
    }

    #[test]
    fn test_offsets_cover_the_block() {
        assert_eq!(AdvisorField::MenuCount.offset(), 2);
        assert_eq!(AdvisorField::RoCount.offset(), 26);
        assert_eq!(COMMODITY_OFFSETS["Air Filters"], 8);
        assert_eq!(COMMODITY_OFFSETS["Factory Chemicals"], 17);
        assert_eq!(target_row(30, AdvisorField::DailyLabor.offset()), 53);
    }
}
