//! Coordinate mapping of aggregates onto the destination grid
//!
//! A category update is planned as a list of (row, column, value)
//! triples: one series of values per metric, the first series landing at
//! the block-relative offset, each further series one row down. Every
//! staff member in the roster receives a write for every series, zero
//! when the upload had nothing for them. Aggregated keys with no roster
//! block are skipped with a warning; a roster that differs from an
//! upload is expected, not fatal.

use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

use crate::aggregate::{
    AlignmentBreakdown, CommodityBreakdown, KeyedCounts, KeyedSums, TireBreakdown,
};
use crate::grid::{CellValue, PendingWrite};
use crate::layout::{target_row, AdvisorField, Roster, COMMODITIES, COMMODITY_OFFSETS};

/// One column of values keyed by staff, already converted to native
/// cell scalars.
pub type WriteSeries = BTreeMap<String, CellValue>;

pub fn counts_series(counts: &KeyedCounts) -> WriteSeries {
    counts
        .iter()
        .map(|(k, v)| (k.clone(), CellValue::from_count(*v)))
        .collect()
}

pub fn sums_series(sums: &KeyedSums) -> WriteSeries {
    sums.iter()
        .map(|(k, v)| (k.clone(), CellValue::from_decimal(*v)))
        .collect()
}

fn warn_unknown_keys<'a, I: IntoIterator<Item = &'a WriteSeries>>(roster: &Roster, series: I) {
    let mut missing = BTreeSet::new();
    for s in series {
        for key in s.keys() {
            if !roster.contains(key) {
                missing.insert(key.clone());
            }
        }
    }
    for key in missing {
        warn!("staff key '{}' has no block in the sheet; skipping", key);
    }
}

/// Plan the writes for one category update.
///
/// The first series lands at `first_offset` within each staff block,
/// the i-th series at `first_offset + i`.
pub fn plan_block_writes(
    roster: &Roster,
    date_col: u32,
    first_offset: u32,
    series: &[WriteSeries],
) -> Vec<PendingWrite> {
    warn_unknown_keys(roster, series.iter());

    let mut writes = Vec::with_capacity(roster.len() * series.len());
    for (key, &block_start) in roster.blocks() {
        for (i, s) in series.iter().enumerate() {
            writes.push(PendingWrite {
                row: target_row(block_start, first_offset + i as u32),
                col: date_col,
                value: s.get(key).cloned().unwrap_or(CellValue::Int(0)),
            });
        }
    }
    writes
}

/// Everything uploaded for the commodities update in one run. Absent
/// commodities still get zero writes for every staff block.
#[derive(Debug, Clone, Default)]
pub struct CommoditiesUpload {
    /// Generic commodity breakdowns keyed by commodity display name
    /// ("Brakes", "Wipers", ...).
    pub generic: BTreeMap<String, CommodityBreakdown>,
    pub tires: Option<TireBreakdown>,
    pub alignments: Option<AlignmentBreakdown>,
}

/// Plan the commodity-block writes and the per-staff gross summary rows.
///
/// Single pass over commodities × roster. Each commodity's count (Tires:
/// quantity sum) is written at its fixed offset while its gross is
/// folded into a per-staff parts-gross running total (Alignments also
/// fold labor gross); the two totals are written once per staff at the
/// Labor Gross / Parts Gross offsets after all commodities.
pub fn plan_commodity_writes(
    roster: &Roster,
    date_col: u32,
    upload: &CommoditiesUpload,
) -> Vec<PendingWrite> {
    let mut upload_keys: BTreeSet<&String> = BTreeSet::new();
    for breakdown in upload.generic.values() {
        upload_keys.extend(breakdown.counts.keys());
    }
    if let Some(tires) = &upload.tires {
        upload_keys.extend(tires.quantity.keys());
    }
    if let Some(alignments) = &upload.alignments {
        upload_keys.extend(alignments.counts.keys());
    }
    for key in upload_keys {
        if !roster.contains(key) {
            warn!("staff key '{}' has no block in the sheet; skipping", key);
        }
    }

    let empty_counts = KeyedCounts::new();
    let empty_sums = KeyedSums::new();

    let mut total_parts: BTreeMap<&str, Decimal> = BTreeMap::new();
    let mut total_labor: BTreeMap<&str, Decimal> = BTreeMap::new();
    let mut writes = Vec::new();

    for commodity in COMMODITIES {
        let offset = COMMODITY_OFFSETS[commodity];

        // Which maps feed the count cell and the running totals depends
        // on the commodity kind; tires have no separate labor line.
        let (quantity_sums, counts, gross, labor): (
            &KeyedSums,
            &KeyedCounts,
            &KeyedSums,
            &KeyedSums,
        ) = match commodity {
            "Tires" => {
                let tires = upload.tires.as_ref();
                (
                    tires.map(|t| &t.quantity).unwrap_or(&empty_sums),
                    &empty_counts,
                    tires.map(|t| &t.gross).unwrap_or(&empty_sums),
                    &empty_sums,
                )
            }
            "Alignments" => {
                let al = upload.alignments.as_ref();
                (
                    &empty_sums,
                    al.map(|a| &a.counts).unwrap_or(&empty_counts),
                    al.map(|a| &a.parts_gross).unwrap_or(&empty_sums),
                    al.map(|a| &a.labor_gross).unwrap_or(&empty_sums),
                )
            }
            _ => {
                let generic = upload.generic.get(commodity);
                (
                    &empty_sums,
                    generic.map(|g| &g.counts).unwrap_or(&empty_counts),
                    generic.map(|g| &g.gross).unwrap_or(&empty_sums),
                    &empty_sums,
                )
            }
        };

        for (key, &block_start) in roster.blocks() {
            let value = if commodity == "Tires" {
                CellValue::from_decimal(
                    quantity_sums.get(key).copied().unwrap_or(Decimal::ZERO),
                )
            } else {
                CellValue::from_count(counts.get(key).copied().unwrap_or(0))
            };
            writes.push(PendingWrite {
                row: target_row(block_start, offset),
                col: date_col,
                value,
            });

            *total_parts.entry(key.as_str()).or_insert(Decimal::ZERO) +=
                gross.get(key).copied().unwrap_or(Decimal::ZERO);
            *total_labor.entry(key.as_str()).or_insert(Decimal::ZERO) +=
                labor.get(key).copied().unwrap_or(Decimal::ZERO);
        }
    }

    for (key, &block_start) in roster.blocks() {
        writes.push(PendingWrite {
            row: target_row(block_start, AdvisorField::LaborGross.offset()),
            col: date_col,
            value: CellValue::from_decimal(
                total_labor.get(key.as_str()).copied().unwrap_or(Decimal::ZERO),
            ),
        });
        writes.push(PendingWrite {
            row: target_row(block_start, AdvisorField::PartsGross.offset()),
            col: date_col,
            value: CellValue::from_decimal(
                total_parts.get(key.as_str()).copied().unwrap_or(Decimal::ZERO),
            ),
        });
    }

    writes
}
