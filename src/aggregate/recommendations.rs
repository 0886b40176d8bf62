//! Recommendations aggregation
//!
//! The export embeds a totals row keyed "Total" which must not be
//! aggregated as an advisor.

use anyhow::Result;

use super::{add_sum, KeyedSums};
use crate::normalize::{cell_text, currency_cell, normalize_key};
use crate::table::Table;

const CATEGORY: &str = "Recommendations";
const NAMES_COLUMN: &str = "Name";
const TOTAL_SENTINEL: &str = "TOTAL";

const REC_COLUMN: &str = "Recommendations";
const SOLD_COLUMN: &str = "Recommendations Sold";
const AMOUNT_COLUMN: &str = "Recommendations $ amount";
const SOLD_AMOUNT_COLUMN: &str = "Recommendations Sold $ amount";

/// Per-advisor recommendation totals.
#[derive(Debug, Clone, Default)]
pub struct RecommendationTotals {
    pub recommended: KeyedSums,
    pub sold: KeyedSums,
    pub amount: KeyedSums,
    pub sold_amount: KeyedSums,
}

pub fn recommendations(table: &Table) -> Result<RecommendationTotals> {
    let name_col = table.require_column(CATEGORY, NAMES_COLUMN)?;
    let rec_col = table.require_column(CATEGORY, REC_COLUMN)?;
    let sold_col = table.require_column(CATEGORY, SOLD_COLUMN)?;
    let amount_col = table.require_column(CATEGORY, AMOUNT_COLUMN)?;
    let sold_amount_col = table.require_column(CATEGORY, SOLD_AMOUNT_COLUMN)?;

    let mut totals = RecommendationTotals::default();
    for (idx, _) in table.rows.iter().enumerate() {
        let key = normalize_key(&cell_text(table.cell(idx, name_col)));
        if key.is_empty() || key == TOTAL_SENTINEL {
            continue;
        }
        add_sum(
            &mut totals.recommended,
            &key,
            currency_cell(table.cell(idx, rec_col), REC_COLUMN)?,
        );
        add_sum(
            &mut totals.sold,
            &key,
            currency_cell(table.cell(idx, sold_col), SOLD_COLUMN)?,
        );
        add_sum(
            &mut totals.amount,
            &key,
            currency_cell(table.cell(idx, amount_col), AMOUNT_COLUMN)?,
        );
        add_sum(
            &mut totals.sold_amount,
            &key,
            currency_cell(table.cell(idx, sold_amount_col), SOLD_AMOUNT_COLUMN)?,
        );
    }

    Ok(totals)
}
