//! File-level tests: xlsx/csv fixtures generated on the fly and pushed
//! through the real load paths, including the GM header-on-row-3
//! fallback and the grid snapshot reader.

use anyhow::Result;
use popreport::actions::{load_tires, prepare_advisor_run, update_ro_count};
use popreport::aggregate::menu;
use popreport::aggregate::commodity;
use popreport::config::LayoutConfig;
use popreport::error::ReportError;
use popreport::grid::{CellValue, Grid, XlsxGrid};
use popreport::table::Table;
use rust_decimal_macros::dec;
use rust_xlsxwriter::Workbook;
use std::path::PathBuf;
use tempfile::TempDir;

fn temp_path(dir: &TempDir, name: &str) -> PathBuf {
    dir.path().join(name)
}

fn write_menu_fixture(path: &PathBuf) {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    let headers = ["Advisor Name", "Opcode Labor Gross", "Opcode Parts Gross"];
    for (col, header) in headers.iter().enumerate() {
        worksheet.write_string(0, col as u16, *header).unwrap();
    }
    let rows = [
        ("ALICE", 100.0, 50.0),
        ("ALICE", 100.0, 50.0),
        ("BOB", 200.0, 75.0),
        ("BOB", 200.0, 75.0),
    ];
    for (i, (name, labor, parts)) in rows.iter().enumerate() {
        let r = i as u32 + 1;
        worksheet.write_string(r, 0, *name).unwrap();
        worksheet.write_number(r, 1, *labor).unwrap();
        worksheet.write_string(r, 2, &format!("${}", parts)).unwrap();
    }
    workbook.save(path).unwrap();
}

#[test]
fn menu_sales_xlsx_loads_and_aggregates() -> Result<()> {
    let dir = TempDir::new()?;
    let path = temp_path(&dir, "menu_sales.xlsx");
    write_menu_fixture(&path);

    let table = Table::load(&path)?;
    let sales = menu::menu_sales(&table, "Advisor Name")?;
    assert_eq!(sales.counts["ALICE"], 2);
    assert_eq!(sales.labor_gross["BOB"], dec!(400));
    // Currency strings in the xlsx are cleaned like typed numbers.
    assert_eq!(sales.parts_gross["ALICE"], dec!(100));
    Ok(())
}

#[test]
fn gm_tires_header_on_row_three_falls_back() -> Result<()> {
    let dir = TempDir::new()?;
    let path = temp_path(&dir, "tires_gm.xlsx");

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    // Two summary rows above the real header, as GM exports do.
    worksheet.write_string(0, 0, "Store 4411 - Tire Sales").unwrap();
    worksheet.write_string(1, 0, "Period: July").unwrap();
    let headers = ["Advisor Name Group", "Actual Quantity", "Gross"];
    for (col, header) in headers.iter().enumerate() {
        worksheet.write_string(2, col as u16, *header).unwrap();
    }
    worksheet.write_string(3, 0, "ALICE").unwrap();
    worksheet.write_number(3, 1, 4.0).unwrap();
    worksheet.write_number(3, 2, 412.80).unwrap();
    worksheet.write_string(4, 0, "ALICE").unwrap();
    worksheet.write_number(4, 1, 2.0).unwrap();
    worksheet.write_number(4, 2, 190.0).unwrap();
    workbook.save(&path).unwrap();

    let tires = load_tires(&path)?;
    assert_eq!(tires.quantity["ALICE"], dec!(6));
    assert_eq!(tires.gross["ALICE"], dec!(602.80));
    Ok(())
}

#[test]
fn unrecognized_tires_file_reports_both_layouts() -> Result<()> {
    let dir = TempDir::new()?;
    let path = temp_path(&dir, "tires_bad.xlsx");

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.write_string(0, 0, "Customer").unwrap();
    worksheet.write_string(0, 1, "Invoice").unwrap();
    worksheet.write_string(1, 0, "x").unwrap();
    worksheet.write_string(2, 0, "y").unwrap();
    workbook.save(&path).unwrap();

    let err = load_tires(&path).unwrap_err();
    let report = err.downcast_ref::<ReportError>().unwrap();
    assert!(matches!(report, ReportError::FormatNotRecognized { .. }));
    let message = err.to_string();
    assert!(message.contains("default layout"));
    assert!(message.contains("skip-2 layout"));
    Ok(())
}

#[test]
fn commodity_csv_loads_like_xlsx() -> Result<()> {
    let dir = TempDir::new()?;
    let path = temp_path(&dir, "brakes.csv");
    std::fs::write(
        &path,
        "Primary Advisor Name,Gross\nALICE,60.0\nALICE,12.5\nBOB,30\n",
    )?;

    let table = Table::load(&path)?;
    let breakdown = commodity::commodity(&table, "Brakes")?;
    assert_eq!(breakdown.counts["ALICE"], 2);
    assert_eq!(breakdown.gross["ALICE"], dec!(72.5));
    assert_eq!(breakdown.gross["BOB"], dec!(30));
    Ok(())
}

#[test]
fn grid_snapshot_resolves_and_records_writes() -> Result<()> {
    let dir = TempDir::new()?;
    let grid_path = temp_path(&dir, "grid.xlsx");

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name("Input").unwrap();
    // Day headers on row 2 starting at column C.
    worksheet.write_string(1, 2, "6").unwrap();
    worksheet.write_string(1, 3, "7").unwrap();
    // Roster in column A: blocks at rows 4 and 30.
    worksheet.write_string(3, 0, "ALICE").unwrap();
    worksheet.write_string(29, 0, "BOB").unwrap();
    workbook.save(&grid_path).unwrap();

    let mut grid = XlsxGrid::open(&grid_path, Some("Input"))?;
    let ctx = prepare_advisor_run(&grid, &LayoutConfig::default(), "7")?;
    assert_eq!(ctx.date_col, 4);
    assert_eq!(ctx.roster.start_row("BOB"), Some(30));

    let table = Table::new(
        vec!["Advisor Name".into(), "RO Number".into()],
        vec![
            vec![
                calamine::Data::String("ALICE".into()),
                calamine::Data::Float(1001.0),
            ],
            vec![
                calamine::Data::String("ALICE".into()),
                calamine::Data::Float(1002.0),
            ],
        ],
    );
    update_ro_count(&mut grid, &ctx, &table)?;

    assert_eq!(grid.read_cell(29, 4)?, CellValue::Int(2));
    assert_eq!(grid.applied().len(), 2);
    Ok(())
}
