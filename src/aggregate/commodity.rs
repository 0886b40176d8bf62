//! Commodity and tire aggregation
//!
//! Generic commodity exports (brakes, batteries, wipers, ...) share one
//! layout: Primary Advisor Name + Gross. Tire exports come in two
//! historical layouts resolved through the format detector; the GM
//! variant carries its header on row 3, which the caller handles by
//! re-reading with two rows skipped.

use anyhow::{anyhow, Result};
use tracing::debug;

use super::{add_sum, KeyedCounts, KeyedSums};
use crate::detect::{self, TiresVariant};
use crate::normalize::{cell_text, currency_cell, normalize_key};
use crate::table::Table;

const NAMES_COLUMN: &str = "Primary Advisor Name";
const GROSS_COLUMN: &str = "Gross";

/// Per-advisor sale count and gross for one commodity.
#[derive(Debug, Clone, Default)]
pub struct CommodityBreakdown {
    pub counts: KeyedCounts,
    pub gross: KeyedSums,
}

/// Per-advisor tire quantity and gross sums.
#[derive(Debug, Clone, Default)]
pub struct TireBreakdown {
    pub quantity: KeyedSums,
    pub gross: KeyedSums,
}

/// Aggregate a generic commodity upload. `category` names the commodity
/// in error messages ("Brakes", "Wipers", ...).
pub fn commodity(table: &Table, category: &str) -> Result<CommodityBreakdown> {
    let name_col = table.require_column(category, NAMES_COLUMN)?;
    let gross_col = table.require_column(category, GROSS_COLUMN)?;

    let mut breakdown = CommodityBreakdown::default();
    for (idx, _) in table.rows.iter().enumerate() {
        let key = normalize_key(&cell_text(table.cell(idx, name_col)));
        if key.is_empty() {
            continue;
        }
        *breakdown.counts.entry(key.clone()).or_insert(0) += 1;
        add_sum(
            &mut breakdown.gross,
            &key,
            currency_cell(table.cell(idx, gross_col), GROSS_COLUMN)?,
        );
    }

    debug!("{}: {} advisors aggregated", category, breakdown.counts.len());
    Ok(breakdown)
}

/// Aggregate a tires upload whose layout the detector can resolve.
///
/// Fails (for the caller's fallback chain) when neither known layout
/// matches the headers.
pub fn tires(table: &Table) -> Result<TireBreakdown> {
    let cols = detect::try_detect_tires(&table.headers).map_err(|reason| anyhow!(reason))?;
    if cols.variant == TiresVariant::Gm {
        debug!("Aggregating GM-format tires upload");
    }

    let quantity_header = &table.headers[cols.quantity];
    let gross_header = &table.headers[cols.gross];

    let mut breakdown = TireBreakdown::default();
    for (idx, _) in table.rows.iter().enumerate() {
        let key = normalize_key(&cell_text(table.cell(idx, cols.name)));
        if key.is_empty() {
            continue;
        }
        add_sum(
            &mut breakdown.quantity,
            &key,
            currency_cell(table.cell(idx, cols.quantity), quantity_header)?,
        );
        add_sum(
            &mut breakdown.gross,
            &key,
            currency_cell(table.cell(idx, cols.gross), gross_header)?,
        );
    }

    Ok(breakdown)
}
