// Aggregation module - one per-staff reducer per upload category

pub mod alignment;
pub mod commodity;
pub mod daily;
pub mod menu;
pub mod recommendations;
pub mod ro_count;
pub mod technician;

use rust_decimal::Decimal;
use std::collections::BTreeMap;

pub use alignment::AlignmentBreakdown;
pub use commodity::{CommodityBreakdown, TireBreakdown};
pub use daily::DailyGross;
pub use menu::SalesBreakdown;
pub use recommendations::RecommendationTotals;
pub use technician::{TechHours, TimecardDay};

/// Per-staff row/event counts.
pub type KeyedCounts = BTreeMap<String, i64>;

/// Per-staff currency/hour/quantity sums.
pub type KeyedSums = BTreeMap<String, Decimal>;

/// Add an optional cell value into a keyed sum; empty cells stay out of
/// the sum entirely.
pub(crate) fn add_sum(sums: &mut KeyedSums, key: &str, value: Option<Decimal>) {
    if let Some(v) = value {
        *sums.entry(key.to_string()).or_insert(Decimal::ZERO) += v;
    }
}
