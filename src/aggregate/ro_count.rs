//! Repair-order counting
//!
//! An RO export can carry several line items for the same repair order,
//! so the count per advisor is over distinct RO numbers, never raw rows.
//! Rows with a blank RO number are dropped before deduplication.

use anyhow::Result;
use std::collections::BTreeSet;
use tracing::debug;

use super::KeyedCounts;
use crate::normalize::{cell_is_blank, cell_text, normalize_key};
use crate::table::Table;

const CATEGORY: &str = "RO Count";
const NAMES_COLUMN: &str = "Advisor Name";
const RO_COLUMN: &str = "RO Number";

pub fn ro_counts(table: &Table) -> Result<KeyedCounts> {
    let name_col = table.require_column(CATEGORY, NAMES_COLUMN)?;
    let ro_col = table.require_column(CATEGORY, RO_COLUMN)?;

    let mut seen: BTreeSet<(String, String)> = BTreeSet::new();
    let mut counts = KeyedCounts::new();

    for (idx, _) in table.rows.iter().enumerate() {
        if cell_is_blank(table.cell(idx, ro_col)) {
            continue;
        }
        let key = normalize_key(&cell_text(table.cell(idx, name_col)));
        if key.is_empty() {
            continue;
        }
        let ro = cell_text(table.cell(idx, ro_col));
        if seen.insert((key.clone(), ro)) {
            *counts.entry(key).or_insert(0) += 1;
        }
    }

    debug!("RO Count: {} advisors aggregated", counts.len());
    Ok(counts)
}
