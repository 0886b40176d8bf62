//! Menu-sales and a-la-carte aggregation
//!
//! Both uploads share the same columns (Advisor Name, Opcode Labor
//! Gross, Opcode Parts Gross). Menu exports duplicate every transaction
//! across two lines, so their per-advisor count is the row count halved;
//! a-la-carte counts rows as-is. An odd remainder is floored away (see
//! DESIGN.md).

use anyhow::Result;
use tracing::debug;

use super::{add_sum, KeyedCounts, KeyedSums};
use crate::normalize::{cell_text, currency_cell, normalize_key};
use crate::table::Table;

const LABOR_COLUMN: &str = "Opcode Labor Gross";
const PARTS_COLUMN: &str = "Opcode Parts Gross";

/// Per-advisor sale counts and gross sums.
#[derive(Debug, Clone, Default)]
pub struct SalesBreakdown {
    pub counts: KeyedCounts,
    pub labor_gross: KeyedSums,
    pub parts_gross: KeyedSums,
}

/// Aggregate a menu-sales upload; counts are halved.
pub fn menu_sales(table: &Table, names_column: &str) -> Result<SalesBreakdown> {
    combined_sales(&[table], names_column, "Menu Sales", true)
}

/// Aggregate an a-la-carte upload; counts are raw row counts.
pub fn a_la_carte(table: &Table, names_column: &str) -> Result<SalesBreakdown> {
    combined_sales(&[table], names_column, "A-La-Carte", false)
}

/// Aggregate one or more sales-shaped uploads into a single breakdown.
///
/// Tables are concatenated before halving, so a transaction split across
/// two uploads still counts once.
pub fn combined_sales(
    tables: &[&Table],
    names_column: &str,
    category: &str,
    halve: bool,
) -> Result<SalesBreakdown> {
    let mut breakdown = SalesBreakdown::default();

    for table in tables {
        let name_col = table.require_column(category, names_column)?;
        let labor_col = table.require_column(category, LABOR_COLUMN)?;
        let parts_col = table.require_column(category, PARTS_COLUMN)?;

        for (idx, _) in table.rows.iter().enumerate() {
            let key = normalize_key(&cell_text(table.cell(idx, name_col)));
            if key.is_empty() {
                continue;
            }
            *breakdown.counts.entry(key.clone()).or_insert(0) += 1;
            add_sum(
                &mut breakdown.labor_gross,
                &key,
                currency_cell(table.cell(idx, labor_col), LABOR_COLUMN)?,
            );
            add_sum(
                &mut breakdown.parts_gross,
                &key,
                currency_cell(table.cell(idx, parts_col), PARTS_COLUMN)?,
            );
        }
    }

    if halve {
        for count in breakdown.counts.values_mut() {
            *count /= 2;
        }
    }

    debug!(
        "{}: {} advisors aggregated",
        category,
        breakdown.counts.len()
    );
    Ok(breakdown)
}
