//! Integration tests for the aggregation and positional-write engine
//!
//! These tests verify end-to-end behavior against an in-memory grid:
//! - menu-sales halved counting and block-relative write placement
//! - daily pay-type filtering
//! - commodity gross accumulation into the summary rows
//! - roster truncation at the first blank
//! - integer round-trips for counts
//! - write-failure reporting without rollback

use anyhow::Result;
use calamine::Data;
use popreport::actions::{
    prepare_advisor_run, update_commodities, update_daily, update_menu_sales, update_ro_count,
    RunContext,
};
use popreport::aggregate::{commodity, menu};
use popreport::config::LayoutConfig;
use popreport::grid::{CellValue, Grid, MemoryGrid, PendingWrite};
use popreport::layout::Roster;
use popreport::table::Table;
use popreport::writer::{counts_series, plan_block_writes, sums_series, CommoditiesUpload};
use rust_decimal_macros::dec;

/// Test helper: advisor grid with ALICE and BOB blocks and the day "7"
/// header in column F.
fn advisor_grid() -> MemoryGrid {
    let mut grid = MemoryGrid::new();
    grid.set_text(2, 6, "7");
    grid.set_text(4, 1, "ALICE");
    grid.set_text(30, 1, "BOB");
    grid
}

fn advisor_ctx(grid: &MemoryGrid) -> RunContext {
    prepare_advisor_run(grid, &LayoutConfig::default(), "7").unwrap()
}

/// Test helper: menu-sales fixture where ALICE appears twice (one full
/// transaction pair) and BOB once (a stray half-pair).
fn menu_fixture() -> Table {
    Table::new(
        vec![
            "Advisor Name".into(),
            "Opcode Labor Gross".into(),
            "Opcode Parts Gross".into(),
        ],
        vec![
            vec![
                Data::String("ALICE".into()),
                Data::Float(100.0),
                Data::Float(50.0),
            ],
            vec![
                Data::String("ALICE".into()),
                Data::Float(100.0),
                Data::Float(50.0),
            ],
            vec![
                Data::String("BOB".into()),
                Data::Float(200.0),
                Data::Float(75.0),
            ],
        ],
    )
}

#[test]
fn menu_sales_scenario_maps_onto_block_starts() -> Result<()> {
    // Planning at the very first block row: primary at the block start,
    // secondaries on the next rows down.
    let sales = menu::menu_sales(&menu_fixture(), "Advisor Name")?;
    let roster = Roster::from_entries([("ALICE".to_string(), 4), ("BOB".to_string(), 30)]);

    let writes = plan_block_writes(
        &roster,
        6,
        1,
        &[
            counts_series(&sales.counts),
            sums_series(&sales.labor_gross),
            sums_series(&sales.parts_gross),
        ],
    );

    let mut grid = MemoryGrid::new();
    grid.update_cells(&writes)?;

    assert_eq!(grid.read_cell(4, 6)?, CellValue::Int(1));
    assert_eq!(grid.read_cell(5, 6)?, CellValue::Int(200));
    assert_eq!(grid.read_cell(6, 6)?, CellValue::Int(100));
    // BOB's single row floors to a zero count; his sums are untouched.
    assert_eq!(grid.read_cell(30, 6)?, CellValue::Int(0));
    assert_eq!(grid.read_cell(31, 6)?, CellValue::Int(200));
    assert_eq!(grid.read_cell(32, 6)?, CellValue::Int(75));
    Ok(())
}

#[test]
fn menu_sales_update_lands_on_template_offsets() -> Result<()> {
    let mut grid = advisor_grid();
    let ctx = advisor_ctx(&grid);
    update_menu_sales(&mut grid, &ctx, &menu_fixture())?;

    // Menu count lives one row below the block start in the template.
    assert_eq!(grid.read_cell(5, 6)?, CellValue::Int(1));
    assert_eq!(grid.read_cell(6, 6)?, CellValue::Int(200));
    assert_eq!(grid.read_cell(7, 6)?, CellValue::Int(100));
    assert_eq!(grid.read_cell(31, 6)?, CellValue::Int(0));
    Ok(())
}

#[test]
fn daily_update_excludes_non_all_pay_types() -> Result<()> {
    let mut grid = advisor_grid();
    let ctx = advisor_ctx(&grid);

    let table = Table::new(
        vec![
            "Name".into(),
            "Pay Type".into(),
            "Labor Gross".into(),
            "Parts Gross".into(),
        ],
        vec![
            vec![
                Data::String("ALICE".into()),
                Data::String("ALL".into()),
                Data::Float(100.0),
                Data::Float(40.0),
            ],
            vec![
                Data::String("ALICE".into()),
                Data::String("CASH".into()),
                Data::Float(50.0),
                Data::Float(20.0),
            ],
        ],
    );
    update_daily(&mut grid, &ctx, &table)?;

    // Daily labor lands 23 rows into the block; the CASH row must not
    // inflate the sum.
    assert_eq!(grid.read_cell(27, 6)?, CellValue::Int(100));
    assert_eq!(grid.read_cell(28, 6)?, CellValue::Int(40));
    Ok(())
}

#[test]
fn commodity_totals_accumulate_into_summary_rows() -> Result<()> {
    let mut grid = advisor_grid();
    let ctx = advisor_ctx(&grid);

    let brakes = Table::new(
        vec!["Primary Advisor Name".into(), "Gross".into()],
        vec![vec![Data::String("ALICE".into()), Data::Float(60.0)]],
    );
    let tires = Table::new(
        vec![
            "Advisor Name".into(),
            "Part Count".into(),
            "Opcode Parts Gross".into(),
        ],
        vec![vec![
            Data::String("ALICE".into()),
            Data::Float(4.0),
            Data::Float(40.0),
        ]],
    );

    let mut upload = CommoditiesUpload::default();
    upload
        .generic
        .insert("Brakes".to_string(), commodity::commodity(&brakes, "Brakes")?);
    upload.tires = Some(commodity::tires(&tires)?);
    upload.alignments = Some(popreport::aggregate::AlignmentBreakdown {
        counts: [("ALICE".to_string(), 1)].into(),
        parts_gross: Default::default(),
        labor_gross: [("ALICE".to_string(), dec!(25))].into(),
    });

    update_commodities(&mut grid, &ctx, &upload)?;

    // Commodity count rows.
    assert_eq!(grid.read_cell(14, 6)?, CellValue::Int(4)); // Tires quantity
    assert_eq!(grid.read_cell(15, 6)?, CellValue::Int(1)); // Brakes count
    assert_eq!(grid.read_cell(16, 6)?, CellValue::Int(1)); // Alignments count

    // Summary rows: labor gross only from alignments, parts gross from
    // tires + brakes, independent of write order.
    assert_eq!(grid.read_cell(21, 6)?, CellValue::Int(25));
    assert_eq!(grid.read_cell(22, 6)?, CellValue::Int(100));

    // BOB uploaded nothing yet still gets explicit zeros.
    assert_eq!(grid.read_cell(40, 6)?, CellValue::Int(0));
    assert_eq!(grid.read_cell(47, 6)?, CellValue::Int(0));
    assert_eq!(grid.read_cell(48, 6)?, CellValue::Int(0));
    Ok(())
}

#[test]
fn roster_truncates_at_first_blank_stride_cell() -> Result<()> {
    let mut grid = advisor_grid();
    // CAROL sits after a blank stride position and must stay invisible.
    grid.set_text(82, 1, "CAROL");
    let ctx = advisor_ctx(&grid);
    assert_eq!(ctx.roster.len(), 2);
    assert!(!ctx.roster.contains("CAROL"));

    // An upload key without a block is skipped with a warning, not fatal.
    let table = Table::new(
        vec!["Advisor Name".into(), "RO Number".into()],
        vec![vec![Data::String("CAROL".into()), Data::Float(1.0)]],
    );
    update_ro_count(&mut grid, &ctx, &table)?;
    assert_eq!(grid.read_cell(29, 6)?, CellValue::Int(0));
    assert_eq!(grid.read_cell(107, 6)?, CellValue::Empty);
    Ok(())
}

#[test]
fn counts_round_trip_as_integers() -> Result<()> {
    let roster = Roster::from_entries([("ALICE".to_string(), 4)]);
    let counts = [("ALICE".to_string(), 12i64)].into();
    let writes = plan_block_writes(&roster, 6, 1, &[counts_series(&counts)]);

    let mut grid = MemoryGrid::new();
    grid.update_cells(&writes)?;
    assert_eq!(grid.read_cell(4, 6)?, CellValue::Int(12));
    Ok(())
}

/// Grid whose batched write always fails, for the failure-reporting path.
struct FailingGrid;

impl Grid for FailingGrid {
    fn col_values(&self, _col: u32) -> Result<Vec<String>> {
        Ok(vec![])
    }
    fn row_values(&self, _row: u32) -> Result<Vec<String>> {
        Ok(vec![])
    }
    fn read_cell(&self, _row: u32, _col: u32) -> Result<CellValue> {
        Ok(CellValue::Empty)
    }
    fn update_cells(&mut self, _writes: &[PendingWrite]) -> Result<()> {
        Err(anyhow::anyhow!("quota exceeded"))
    }
}

#[test]
fn write_failure_is_reported_not_retried() {
    let mut grid = FailingGrid;
    let ctx = RunContext {
        roster: Roster::from_entries([("ALICE".to_string(), 4)]),
        date_col: 6,
    };
    let table = Table::new(
        vec!["Advisor Name".into(), "RO Number".into()],
        vec![vec![Data::String("ALICE".into()), Data::Float(1.0)]],
    );

    let err = update_ro_count(&mut grid, &ctx, &table).unwrap_err();
    assert!(err.to_string().contains("sheet update failed"));
    assert!(err.to_string().contains("quota exceeded"));
}
