//! Category update actions
//!
//! Each action is a pure pipeline from (uploaded tables, resolved run
//! context) to one batched grid write; nothing is implicit or ambient.
//! The roster and date column are resolved once per run. Errors stop
//! only the action that raised them — the caller reports and moves on to
//! the next category, since a manager may only have some files ready.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::path::Path;
use tracing::{info, warn};

use crate::aggregate::{
    alignment, commodity, daily, menu, recommendations, ro_count, technician, AlignmentBreakdown,
    TechHours, TireBreakdown,
};
use crate::config::LayoutConfig;
use crate::error::ReportError;
use crate::grid::{Grid, PendingWrite};
use crate::layout::{resolve_date_column, resolve_roster, AdvisorField, Roster, TechField};
use crate::table::{self, Table};
use crate::writer::{counts_series, plan_block_writes, plan_commodity_writes, sums_series,
    CommoditiesUpload};

/// Roster and date column for one grid, resolved once per run.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub roster: Roster,
    pub date_col: u32,
}

/// Resolve the advisor grid's roster and date column.
pub fn prepare_advisor_run(
    grid: &dyn Grid,
    cfg: &LayoutConfig,
    day_label: &str,
) -> Result<RunContext> {
    let date_col = resolve_date_column(
        grid,
        cfg.date_header_row,
        day_label,
        cfg.advisor_first_date_col,
    )?;
    let roster = resolve_roster(grid, cfg.roster_start_row, cfg.advisor_block_rows)?;
    Ok(RunContext { roster, date_col })
}

/// Resolve the technician grid's roster and date column.
pub fn prepare_technician_run(
    grid: &dyn Grid,
    cfg: &LayoutConfig,
    day_label: &str,
) -> Result<RunContext> {
    let date_col =
        resolve_date_column(grid, cfg.date_header_row, day_label, cfg.tech_first_date_col)?;
    let roster = resolve_roster(grid, cfg.roster_start_row, cfg.tech_block_rows)?;
    Ok(RunContext { roster, date_col })
}

fn flush(grid: &mut dyn Grid, writes: Vec<PendingWrite>, category: &str) -> Result<()> {
    if writes.is_empty() {
        return Ok(());
    }
    info!("Flushing {} cells for {}", writes.len(), category);
    grid.update_cells(&writes)
        .map_err(|e| ReportError::RemoteWrite(format!("{:#}", e)).into())
}

pub fn update_menu_sales(grid: &mut dyn Grid, ctx: &RunContext, table: &Table) -> Result<()> {
    let sales = menu::menu_sales(table, "Advisor Name")?;
    let writes = plan_block_writes(
        &ctx.roster,
        ctx.date_col,
        AdvisorField::MenuCount.offset(),
        &[
            counts_series(&sales.counts),
            sums_series(&sales.labor_gross),
            sums_series(&sales.parts_gross),
        ],
    );
    flush(grid, writes, "Menu Sales")
}

pub fn update_a_la_carte(grid: &mut dyn Grid, ctx: &RunContext, table: &Table) -> Result<()> {
    let sales = menu::a_la_carte(table, "Advisor Name")?;
    let writes = plan_block_writes(
        &ctx.roster,
        ctx.date_col,
        AdvisorField::AlaCarteCount.offset(),
        &[
            counts_series(&sales.counts),
            sums_series(&sales.labor_gross),
            sums_series(&sales.parts_gross),
        ],
    );
    flush(grid, writes, "A-La-Carte")
}

pub fn update_commodities(
    grid: &mut dyn Grid,
    ctx: &RunContext,
    upload: &CommoditiesUpload,
) -> Result<()> {
    let writes = plan_commodity_writes(&ctx.roster, ctx.date_col, upload);
    flush(grid, writes, "Commodities")
}

pub fn update_recommendations(grid: &mut dyn Grid, ctx: &RunContext, table: &Table) -> Result<()> {
    let totals = recommendations::recommendations(table)?;
    let writes = plan_block_writes(
        &ctx.roster,
        ctx.date_col,
        AdvisorField::RecCount.offset(),
        &[
            sums_series(&totals.recommended),
            sums_series(&totals.sold),
            sums_series(&totals.amount),
            sums_series(&totals.sold_amount),
        ],
    );
    flush(grid, writes, "Recommendations")
}

pub fn update_daily(grid: &mut dyn Grid, ctx: &RunContext, table: &Table) -> Result<()> {
    let gross = daily::daily(table)?;
    let writes = plan_block_writes(
        &ctx.roster,
        ctx.date_col,
        AdvisorField::DailyLabor.offset(),
        &[sums_series(&gross.labor), sums_series(&gross.parts)],
    );
    flush(grid, writes, "Daily Data")
}

pub fn update_ro_count(grid: &mut dyn Grid, ctx: &RunContext, table: &Table) -> Result<()> {
    let counts = ro_count::ro_counts(table)?;
    let writes = plan_block_writes(
        &ctx.roster,
        ctx.date_col,
        AdvisorField::RoCount.offset(),
        &[counts_series(&counts)],
    );
    flush(grid, writes, "RO Count")
}

pub fn update_technician_hours(
    grid: &mut dyn Grid,
    ctx: &RunContext,
    hours: &TechHours,
) -> Result<()> {
    let writes = plan_block_writes(
        &ctx.roster,
        ctx.date_col,
        TechField::ActualHours.offset(),
        &[sums_series(&hours.actual), sums_series(&hours.billed)],
    );
    flush(grid, writes, "Technician Report")
}

pub fn update_timecard(
    grid: &mut dyn Grid,
    ctx: &RunContext,
    rows: &[Vec<calamine::Data>],
    day: NaiveDate,
) -> Result<()> {
    let timecard = technician::timecard_day(rows, day)?;
    let writes = plan_block_writes(
        &ctx.roster,
        ctx.date_col,
        TechField::Attendance.offset(),
        &[
            sums_series(&timecard.attendance),
            counts_series(&timecard.objective),
        ],
    );
    flush(grid, writes, "Timecard")
}

/// Load a tires upload, falling back to the GM layout (header on row 3)
/// when the default layout is not recognized. A failure of both layouts
/// surfaces both messages.
pub fn load_tires<P: AsRef<Path>>(path: P) -> Result<TireBreakdown> {
    let path = path.as_ref();
    let default_attempt = Table::load(path).and_then(|t| commodity::tires(&t));
    let first = match default_attempt {
        Ok(breakdown) => return Ok(breakdown),
        Err(e) => e,
    };

    warn!("Original tires format not detected; trying GM format");
    match Table::load_with_skip(path, 2).and_then(|t| commodity::tires(&t)) {
        Ok(breakdown) => Ok(breakdown),
        Err(second) => Err(ReportError::FormatNotRecognized {
            category: "Tires".to_string(),
            details: format!("default layout: {:#}; skip-2 layout: {:#}", first, second),
        }
        .into()),
    }
}

/// Load a technician report, falling back to a header on row 2.
pub fn load_technician_report<P: AsRef<Path>>(path: P) -> Result<TechHours> {
    let path = path.as_ref();
    let first = match Table::load(path).and_then(|t| technician::technician_hours(&t)) {
        Ok(hours) => return Ok(hours),
        Err(e) => e,
    };

    match Table::load_with_skip(path, 1).and_then(|t| technician::technician_hours(&t)) {
        Ok(hours) => Ok(hours),
        Err(second) => Err(ReportError::FormatNotRecognized {
            category: "Technician Report".to_string(),
            details: format!("row-1 header: {:#}; row-2 header: {:#}", first, second),
        }
        .into()),
    }
}

/// Load and combine the alignment menus + a-la-carte pair.
pub fn load_alignment_pair<P: AsRef<Path>>(menus: P, alacarte: P) -> Result<AlignmentBreakdown> {
    let menus_table = Table::load(menus).context("Failed to load Alignment Menus file")?;
    let alacarte_table =
        Table::load(alacarte).context("Failed to load Alignment A-La-Carte file")?;
    alignment::combine(&menus_table, &alacarte_table)
}

/// Load a raw (header-less) timecard dump.
pub fn load_timecard<P: AsRef<Path>>(path: P) -> Result<Vec<Vec<calamine::Data>>> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    match extension.as_str() {
        "csv" => table::load_raw_csv(path),
        _ => table::load_raw(path),
    }
}
