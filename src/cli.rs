use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "popreport")]
#[command(
    version,
    about = "Service-department performance report updater"
)]
#[command(
    long_about = "Aggregate dealership service exports (menu sales, commodities, recommendations, technician hours, timecards) per staff member and write them into the day column of a shared performance grid."
)]
pub struct Cli {
    /// Disable colorized/ANSI output
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,

    /// Grid layout config file (TOML); defaults to the production layout
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse one upload and preview its per-staff aggregates
    Inspect {
        /// Path to the Excel or CSV upload
        file: PathBuf,

        /// Upload category
        #[arg(long, value_enum)]
        category: Category,

        /// Selected date (required for timecard inspection), e.g. 2024-07-15
        #[arg(long)]
        date: Option<String>,
    },

    /// Run every category with an upload against a grid snapshot
    Update(Box<UpdateArgs>),
}

#[derive(Args)]
pub struct UpdateArgs {
    /// Xlsx snapshot of the destination grid
    #[arg(long)]
    pub grid: PathBuf,

    /// Worksheet (tab) name in the grid
    #[arg(long, default_value = "Input")]
    pub tab: String,

    /// Selected date: a full date (2024-07-15) or a day of month (15)
    #[arg(long)]
    pub date: String,

    #[arg(long)]
    pub menu_sales: Option<PathBuf>,

    #[arg(long)]
    pub a_la_carte: Option<PathBuf>,

    #[arg(long)]
    pub recommendations: Option<PathBuf>,

    #[arg(long)]
    pub daily: Option<PathBuf>,

    #[arg(long)]
    pub ro_count: Option<PathBuf>,

    #[arg(long)]
    pub tires: Option<PathBuf>,

    #[arg(long)]
    pub air_filters: Option<PathBuf>,

    #[arg(long)]
    pub cabin_filters: Option<PathBuf>,

    #[arg(long)]
    pub batteries: Option<PathBuf>,

    #[arg(long)]
    pub brakes: Option<PathBuf>,

    #[arg(long)]
    pub wipers: Option<PathBuf>,

    #[arg(long)]
    pub belts: Option<PathBuf>,

    #[arg(long)]
    pub fluids: Option<PathBuf>,

    #[arg(long)]
    pub factory_chemicals: Option<PathBuf>,

    #[arg(long)]
    pub alignment_menus: Option<PathBuf>,

    #[arg(long)]
    pub alignment_a_la_carte: Option<PathBuf>,

    /// Xlsx snapshot of the technician grid
    #[arg(long)]
    pub tech_grid: Option<PathBuf>,

    /// Worksheet (tab) name in the technician grid
    #[arg(long, default_value = "Input")]
    pub tech_tab: String,

    #[arg(long)]
    pub tech_report: Option<PathBuf>,

    #[arg(long)]
    pub timecard: Option<PathBuf>,
}

impl UpdateArgs {
    /// Generic commodity uploads, paired with their grid display names.
    pub fn generic_commodities(&self) -> Vec<(&'static str, &PathBuf)> {
        [
            ("Air Filters", &self.air_filters),
            ("Cabin Filters", &self.cabin_filters),
            ("Batteries", &self.batteries),
            ("Brakes", &self.brakes),
            ("Wipers", &self.wipers),
            ("Belts", &self.belts),
            ("Fluids", &self.fluids),
            ("Factory Chemicals", &self.factory_chemicals),
        ]
        .into_iter()
        .filter_map(|(name, path)| path.as_ref().map(|p| (name, p)))
        .collect()
    }

    pub fn has_advisor_uploads(&self) -> bool {
        self.menu_sales.is_some()
            || self.a_la_carte.is_some()
            || self.recommendations.is_some()
            || self.daily.is_some()
            || self.ro_count.is_some()
            || self.has_commodity_uploads()
    }

    pub fn has_commodity_uploads(&self) -> bool {
        self.tires.is_some()
            || !self.generic_commodities().is_empty()
            || self.alignment_menus.is_some()
            || self.alignment_a_la_carte.is_some()
    }

    pub fn has_technician_uploads(&self) -> bool {
        self.tech_report.is_some() || self.timecard.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Category {
    MenuSales,
    ALaCarte,
    Commodity,
    Tires,
    Alignment,
    Recommendations,
    Daily,
    RoCount,
    TechReport,
    Timecard,
}
