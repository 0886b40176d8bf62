//! Daily gross aggregation
//!
//! The old export breaks every advisor's day down by pay type; only the
//! "ALL" row is authoritative and everything else is excluded before
//! summing. The newer export has one row per advisor and no pay-type
//! column. Both embed a "Total" row that is filtered out.

use anyhow::Result;

use super::{add_sum, KeyedSums};
use crate::detect::{self, DailyColumns};
use crate::error::ReportError;
use crate::normalize::{cell_text, currency_cell, normalize_key};
use crate::table::Table;

const CATEGORY: &str = "Daily Data";
const LABOR_COLUMN: &str = "Labor Gross";
const PARTS_COLUMN: &str = "Parts Gross";
const TOTAL_SENTINEL: &str = "TOTAL";
const ALL_PAY_TYPES: &str = "ALL";

/// Per-advisor daily labor/parts gross.
#[derive(Debug, Clone, Default)]
pub struct DailyGross {
    pub labor: KeyedSums,
    pub parts: KeyedSums,
}

pub fn daily(table: &Table) -> Result<DailyGross> {
    let cols = detect::try_detect_daily(&table.headers).map_err(|details| {
        ReportError::FormatNotRecognized {
            category: CATEGORY.to_string(),
            details,
        }
    })?;

    let labor_col = table.require_column(CATEGORY, LABOR_COLUMN)?;
    let parts_col = table.require_column(CATEGORY, PARTS_COLUMN)?;

    let (name_col, pay_type_col) = match cols {
        DailyColumns::Old { name, pay_type } => (name, Some(pay_type)),
        DailyColumns::New { name } => (name, None),
    };

    let mut gross = DailyGross::default();
    for (idx, _) in table.rows.iter().enumerate() {
        let key = normalize_key(&cell_text(table.cell(idx, name_col)));
        if key.is_empty() || key == TOTAL_SENTINEL {
            continue;
        }
        if let Some(pay_type_col) = pay_type_col {
            let pay_type = cell_text(table.cell(idx, pay_type_col)).to_uppercase();
            if pay_type != ALL_PAY_TYPES {
                continue;
            }
        }
        add_sum(
            &mut gross.labor,
            &key,
            currency_cell(table.cell(idx, labor_col), LABOR_COLUMN)?,
        );
        add_sum(
            &mut gross.parts,
            &key,
            currency_cell(table.cell(idx, parts_col), PARTS_COLUMN)?,
        );
    }

    Ok(gross)
}
