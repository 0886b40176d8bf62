//! Technician hours and timecard aggregation
//!
//! The technician report is a flat table grouped by technician name. The
//! timecard dump is a vertical, repeating-block layout with no header:
//! each technician's multi-day record opens with a "Lastname, Firstname"
//! cell in column C, followed by one row per day whose column-A cell is
//! the date and whose column-K cell is the day's paid hours. Rows whose
//! column-A cell is not a date (page headers, totals) are skipped.

use anyhow::Result;
use calamine::Data;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use tracing::{debug, warn};

use super::{add_sum, KeyedCounts, KeyedSums};
use crate::normalize::{cell_text, currency_cell, date_from_cell, normalize_key};
use crate::table::Table;

const CATEGORY: &str = "Technician Report";
const NAMES_COLUMN: &str = "Technician Name";
const ACTUAL_COLUMN: &str = "Actual Hours";
const BILLED_COLUMN: &str = "Assigned Billed Hours";

/// Timecard fixed positions: column A = date, column C = name marker,
/// column K = paid hours.
const TIMECARD_DATE_COL: usize = 0;
const TIMECARD_NAME_COL: usize = 2;
const TIMECARD_PAID_COL: usize = 10;

/// Attendance objective flag written when the technician had any paid
/// hours on the selected day.
const OBJECTIVE_MET: i64 = 1;

static NAME_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*([^,]+?)\s*,\s*(.+?)\s*$").unwrap());

/// Per-technician actual and billed hour sums.
#[derive(Debug, Clone, Default)]
pub struct TechHours {
    pub actual: KeyedSums,
    pub billed: KeyedSums,
}

/// One day's attendance per technician: paid hours and whether the
/// attendance objective was met.
#[derive(Debug, Clone, Default)]
pub struct TimecardDay {
    pub attendance: KeyedSums,
    pub objective: KeyedCounts,
}

/// Aggregate a technician report by technician name.
pub fn technician_hours(table: &Table) -> Result<TechHours> {
    let name_col = table.require_column(CATEGORY, NAMES_COLUMN)?;
    let actual_col = table.require_column(CATEGORY, ACTUAL_COLUMN)?;
    let billed_col = table.require_column(CATEGORY, BILLED_COLUMN)?;

    let mut hours = TechHours::default();
    for (idx, _) in table.rows.iter().enumerate() {
        let key = normalize_key(&cell_text(table.cell(idx, name_col)));
        if key.is_empty() {
            continue;
        }
        add_sum(
            &mut hours.actual,
            &key,
            currency_cell(table.cell(idx, actual_col), ACTUAL_COLUMN)?,
        );
        add_sum(
            &mut hours.billed,
            &key,
            currency_cell(table.cell(idx, billed_col), BILLED_COLUMN)?,
        );
    }

    debug!("{}: {} technicians aggregated", CATEGORY, hours.actual.len());
    Ok(hours)
}

/// Convert a "Lastname, Firstname" marker into the grid's
/// "FIRSTNAME LASTNAME" key form.
fn key_from_marker(text: &str) -> Option<String> {
    let caps = NAME_MARKER.captures(text)?;
    let last = caps.get(1)?.as_str();
    let first = caps.get(2)?.as_str();
    Some(normalize_key(&format!("{} {}", first, last)))
}

/// Extract one day's attendance from a raw timecard dump.
pub fn timecard_day(rows: &[Vec<Data>], day: NaiveDate) -> Result<TimecardDay> {
    static EMPTY: Data = Data::Empty;
    let mut result = TimecardDay::default();
    let mut current: Option<String> = None;

    for row in rows {
        let marker = row.get(TIMECARD_NAME_COL).unwrap_or(&EMPTY);
        let marker_text = cell_text(marker);
        if !marker_text.is_empty() {
            if let Some(key) = key_from_marker(&marker_text) {
                current = Some(key);
                continue;
            }
        }

        let Some(key) = current.as_ref() else {
            continue;
        };
        let Some(date) = date_from_cell(row.get(TIMECARD_DATE_COL).unwrap_or(&EMPTY)) else {
            continue;
        };
        if date != day {
            continue;
        }

        let paid = currency_cell(row.get(TIMECARD_PAID_COL).unwrap_or(&EMPTY), "Paid Hours")?
            .unwrap_or(Decimal::ZERO);
        result.attendance.insert(key.clone(), paid);
        result.objective.insert(
            key.clone(),
            if paid > Decimal::ZERO { OBJECTIVE_MET } else { 0 },
        );
    }

    if result.attendance.is_empty() {
        warn!("Timecard has no rows for {}", day);
    }
    Ok(result)
}
