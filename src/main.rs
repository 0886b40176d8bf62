use anyhow::{anyhow, Result};
use chrono::{Datelike, NaiveDate};
use clap::Parser;
use colored::Colorize;
use tabled::{settings::Style, Table as DisplayTable, Tabled};
use tracing::info;

use popreport::actions::{
    self, load_alignment_pair, load_technician_report, load_timecard, load_tires,
    prepare_advisor_run, prepare_technician_run, RunContext,
};
use popreport::aggregate::{alignment, commodity, daily, menu, recommendations, ro_count};
use popreport::cli::{Category, Cli, Commands, UpdateArgs};
use popreport::config::LayoutConfig;
use popreport::detect::{self, AlignmentColumns};
use popreport::grid::XlsxGrid;
use popreport::layout::day_label;
use popreport::table::Table;
use popreport::writer::CommoditiesUpload;
use popreport::aggregate::{KeyedCounts, KeyedSums};

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    if cli.no_color {
        colored::control::set_override(false);
    }
    let cfg = LayoutConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Inspect {
            file,
            category,
            date,
        } => handle_inspect(&file, category, date.as_deref()),
        Commands::Update(args) => handle_update(&args, &cfg),
    }
}

#[derive(Tabled)]
struct MetricRow {
    #[tabled(rename = "Staff")]
    staff: String,
    #[tabled(rename = "Metric")]
    metric: String,
    #[tabled(rename = "Value")]
    value: String,
}

fn count_rows(rows: &mut Vec<MetricRow>, counts: &KeyedCounts, metric: &str) {
    for (staff, count) in counts {
        rows.push(MetricRow {
            staff: staff.clone(),
            metric: metric.to_string(),
            value: count.to_string(),
        });
    }
}

fn sum_rows(rows: &mut Vec<MetricRow>, sums: &KeyedSums, metric: &str) {
    for (staff, sum) in sums {
        rows.push(MetricRow {
            staff: staff.clone(),
            metric: metric.to_string(),
            value: sum.to_string(),
        });
    }
}

/// Parse the selected date: a full date keeps the day for the header
/// label, a bare day-of-month is used as the label directly.
fn parse_selected_date(input: &str) -> (String, Option<NaiveDate>) {
    for fmt in ["%Y-%m-%d", "%m/%d/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(input, fmt) {
            return (date.day().to_string(), Some(date));
        }
    }
    (day_label(input), None)
}

fn handle_inspect(file: &std::path::Path, category: Category, date: Option<&str>) -> Result<()> {
    let mut rows = Vec::new();

    match category {
        Category::MenuSales => {
            let sales = menu::menu_sales(&Table::load(file)?, "Advisor Name")?;
            count_rows(&mut rows, &sales.counts, "Menu Sales");
            sum_rows(&mut rows, &sales.labor_gross, "Labor Gross");
            sum_rows(&mut rows, &sales.parts_gross, "Parts Gross");
        }
        Category::ALaCarte => {
            let sales = menu::a_la_carte(&Table::load(file)?, "Advisor Name")?;
            count_rows(&mut rows, &sales.counts, "A-La-Carte");
            sum_rows(&mut rows, &sales.labor_gross, "Labor Gross");
            sum_rows(&mut rows, &sales.parts_gross, "Parts Gross");
        }
        Category::Commodity => {
            let breakdown = commodity::commodity(&Table::load(file)?, "Commodity")?;
            count_rows(&mut rows, &breakdown.counts, "Count");
            sum_rows(&mut rows, &breakdown.gross, "Gross");
        }
        Category::Tires => {
            let breakdown = load_tires(file)?;
            sum_rows(&mut rows, &breakdown.quantity, "Quantity");
            sum_rows(&mut rows, &breakdown.gross, "Gross");
        }
        Category::Alignment => {
            let table = Table::load(file)?;
            match detect::try_detect_alignment(&table.headers).map_err(|r| anyhow!(r))? {
                AlignmentColumns::Story { .. } => {
                    count_rows(&mut rows, &alignment::story_counts(&table)?, "Alignments");
                }
                AlignmentColumns::Legacy { .. } => {
                    let sales =
                        menu::combined_sales(&[&table], "Advisor Name", "Alignments", true)?;
                    count_rows(&mut rows, &sales.counts, "Alignments");
                    sum_rows(&mut rows, &sales.labor_gross, "Labor Gross");
                    sum_rows(&mut rows, &sales.parts_gross, "Parts Gross");
                }
            }
        }
        Category::Recommendations => {
            let totals = recommendations::recommendations(&Table::load(file)?)?;
            sum_rows(&mut rows, &totals.recommended, "Recommendations");
            sum_rows(&mut rows, &totals.sold, "Sold");
            sum_rows(&mut rows, &totals.amount, "Amount");
            sum_rows(&mut rows, &totals.sold_amount, "Sold Amount");
        }
        Category::Daily => {
            let gross = daily::daily(&Table::load(file)?)?;
            sum_rows(&mut rows, &gross.labor, "Labor Gross");
            sum_rows(&mut rows, &gross.parts, "Parts Gross");
        }
        Category::RoCount => {
            count_rows(&mut rows, &ro_count::ro_counts(&Table::load(file)?)?, "RO Count");
        }
        Category::TechReport => {
            let hours = load_technician_report(file)?;
            sum_rows(&mut rows, &hours.actual, "Actual Hours");
            sum_rows(&mut rows, &hours.billed, "Billed Hours");
        }
        Category::Timecard => {
            let date = date.ok_or_else(|| {
                anyhow!("timecard inspection needs --date (e.g. 2024-07-15)")
            })?;
            let (_, full_date) = parse_selected_date(date);
            let day = full_date
                .ok_or_else(|| anyhow!("could not parse '{}' as a full date", date))?;
            let timecard =
                popreport::aggregate::technician::timecard_day(&load_timecard(file)?, day)?;
            sum_rows(&mut rows, &timecard.attendance, "Attendance");
            count_rows(&mut rows, &timecard.objective, "Objective");
        }
    }

    println!(
        "\n{} Aggregated {} values\n",
        "✓".green().bold(),
        rows.len()
    );
    let table = DisplayTable::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);
    Ok(())
}

fn report(category: &str, result: Result<()>, ok: &mut usize, failed: &mut usize) {
    match result {
        Ok(()) => {
            *ok += 1;
            println!(
                "{} {} data updated successfully.",
                "✓".green().bold(),
                category
            );
        }
        Err(e) => {
            *failed += 1;
            eprintln!(
                "{} Error updating {} data: {:#}",
                "✗".red().bold(),
                category,
                e
            );
        }
    }
}

#[derive(Tabled)]
struct WriteRow {
    #[tabled(rename = "Row")]
    row: u32,
    #[tabled(rename = "Col")]
    col: u32,
    #[tabled(rename = "Value")]
    value: String,
}

fn print_writes(label: &str, grid: &XlsxGrid) {
    if grid.applied().is_empty() {
        return;
    }
    println!("\nPlanned writes for the {} ({} cells):", label, grid.applied().len());
    let rows: Vec<WriteRow> = grid
        .applied()
        .iter()
        .map(|w| WriteRow {
            row: w.row,
            col: w.col,
            value: w.value.to_display(),
        })
        .collect();
    let table = DisplayTable::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);
}

fn handle_update(args: &UpdateArgs, cfg: &LayoutConfig) -> Result<()> {
    let (label, full_date) = parse_selected_date(&args.date);
    info!("Selected day column label: {}", label);

    let mut ok = 0usize;
    let mut failed = 0usize;

    if args.has_advisor_uploads() {
        let mut grid = XlsxGrid::open(&args.grid, Some(&args.tab))?;
        let ctx: RunContext = prepare_advisor_run(&grid, cfg, &label)?;

        if let Some(path) = &args.menu_sales {
            let result = Table::load(path)
                .and_then(|t| actions::update_menu_sales(&mut grid, &ctx, &t));
            report("Menu Sales", result, &mut ok, &mut failed);
        }
        if let Some(path) = &args.a_la_carte {
            let result = Table::load(path)
                .and_then(|t| actions::update_a_la_carte(&mut grid, &ctx, &t));
            report("A-La-Carte", result, &mut ok, &mut failed);
        }

        if args.has_commodity_uploads() {
            let upload = collect_commodities(args, &mut failed);
            report(
                "Commodities",
                actions::update_commodities(&mut grid, &ctx, &upload),
                &mut ok,
                &mut failed,
            );
        }

        if let Some(path) = &args.recommendations {
            let result = Table::load(path)
                .and_then(|t| actions::update_recommendations(&mut grid, &ctx, &t));
            report("Recommendations", result, &mut ok, &mut failed);
        }
        if let Some(path) = &args.daily {
            let result =
                Table::load(path).and_then(|t| actions::update_daily(&mut grid, &ctx, &t));
            report("Daily", result, &mut ok, &mut failed);
        }
        if let Some(path) = &args.ro_count {
            let result =
                Table::load(path).and_then(|t| actions::update_ro_count(&mut grid, &ctx, &t));
            report("RO Count", result, &mut ok, &mut failed);
        }

        print_writes("advisor grid", &grid);
    }

    if args.has_technician_uploads() {
        let tech_path = args
            .tech_grid
            .as_ref()
            .ok_or_else(|| anyhow!("--tech-grid is required for technician uploads"))?;
        let mut tech = XlsxGrid::open(tech_path, Some(&args.tech_tab))?;
        let tech_ctx = prepare_technician_run(&tech, cfg, &label)?;

        if let Some(path) = &args.tech_report {
            let result = load_technician_report(path)
                .and_then(|hours| actions::update_technician_hours(&mut tech, &tech_ctx, &hours));
            report("Technician Report", result, &mut ok, &mut failed);
        }
        if let Some(path) = &args.timecard {
            let result = match full_date {
                Some(day) => load_timecard(path)
                    .and_then(|rows| actions::update_timecard(&mut tech, &tech_ctx, &rows, day)),
                None => Err(anyhow!(
                    "timecard updates need a full --date (e.g. 2024-07-15), not just a day of month"
                )),
            };
            report("Timecard", result, &mut ok, &mut failed);
        }

        print_writes("technician grid", &tech);
    }

    println!("\n{} Update complete!", "✓".green().bold());
    println!("  Succeeded: {}", ok.to_string().green());
    if failed > 0 {
        println!("  Failed: {}", failed.to_string().red());
    }

    Ok(())
}

/// Gather every commodity upload; a commodity whose file fails to parse
/// is reported and contributes zeros, without blocking the others.
fn collect_commodities(args: &UpdateArgs, failed: &mut usize) -> CommoditiesUpload {
    let mut upload = CommoditiesUpload::default();

    for (name, path) in args.generic_commodities() {
        match Table::load(path).and_then(|t| commodity::commodity(&t, name)) {
            Ok(breakdown) => {
                println!("{} {} data processed successfully.", "✓".green().bold(), name);
                upload.generic.insert(name.to_string(), breakdown);
            }
            Err(e) => {
                *failed += 1;
                eprintln!(
                    "{} Error processing {} file: {:#}",
                    "✗".red().bold(),
                    name,
                    e
                );
            }
        }
    }

    if let Some(path) = &args.tires {
        match load_tires(path) {
            Ok(breakdown) => {
                println!("{} Tires data processed successfully.", "✓".green().bold());
                upload.tires = Some(breakdown);
            }
            Err(e) => {
                *failed += 1;
                eprintln!("{} Error processing Tires file: {:#}", "✗".red().bold(), e);
            }
        }
    }

    match (&args.alignment_menus, &args.alignment_a_la_carte) {
        (Some(menus), Some(alacarte)) => match load_alignment_pair(menus, alacarte) {
            Ok(breakdown) => {
                println!(
                    "{} Alignments data from both files processed successfully.",
                    "✓".green().bold()
                );
                upload.alignments = Some(breakdown);
            }
            Err(e) => {
                *failed += 1;
                eprintln!(
                    "{} Error processing Alignments files: {:#}",
                    "✗".red().bold(),
                    e
                );
            }
        },
        (None, None) => {}
        _ => {
            *failed += 1;
            eprintln!(
                "{} Please upload both Alignment Menus and Alignment A-La-Carte files.",
                "✗".red().bold()
            );
        }
    }

    upload
}
