//! Alignment aggregation
//!
//! Alignments arrive as a menus upload plus an a-la-carte upload, in one
//! of two layouts. The legacy layout looks like a menu export (gross
//! columns, halved counting across the concatenated pair). The story
//! layout carries a free-text job description instead; every row whose
//! story mentions "wheel alignment" counts one alignment, and the two
//! uploads' counts merge by key-wise sum. Merge policy across layouts is
//! recorded in DESIGN.md.

use anyhow::{anyhow, Result};
use tracing::debug;

use super::menu::combined_sales;
use super::{KeyedCounts, KeyedSums};
use crate::detect::{self, AlignmentColumns};
use crate::normalize::{cell_text, normalize_key};
use crate::table::Table;

const CATEGORY: &str = "Alignments";
const KEYWORD: &str = "wheel alignment";

/// Per-advisor alignment counts plus gross sums (legacy layout only; the
/// story layout carries no currency, leaving the sums empty).
#[derive(Debug, Clone, Default)]
pub struct AlignmentBreakdown {
    pub counts: KeyedCounts,
    pub parts_gross: KeyedSums,
    pub labor_gross: KeyedSums,
}

/// Count "wheel alignment" mentions per advisor in a story-layout upload.
pub fn story_counts(table: &Table) -> Result<KeyedCounts> {
    let cols = detect::try_detect_alignment(&table.headers).map_err(|r| anyhow!(r))?;
    let AlignmentColumns::Story { name, story } = cols else {
        return Err(anyhow!("alignment file is not in the story layout"));
    };

    let mut counts = KeyedCounts::new();
    for (idx, _) in table.rows.iter().enumerate() {
        let key = normalize_key(&cell_text(table.cell(idx, name)));
        if key.is_empty() {
            continue;
        }
        let story_text = cell_text(table.cell(idx, story)).to_lowercase();
        if story_text.contains(KEYWORD) {
            *counts.entry(key).or_insert(0) += 1;
        }
    }
    Ok(counts)
}

/// Key-wise sum of two story-count maps.
pub fn merge_counts(mut a: KeyedCounts, b: &KeyedCounts) -> KeyedCounts {
    for (key, count) in b {
        *a.entry(key.clone()).or_insert(0) += count;
    }
    a
}

/// Combine the menus + a-la-carte alignment pair into one breakdown.
///
/// Both story-layout: counts merge by sum. Both legacy-layout: the pair
/// is concatenated and counted like menu sales. Mixed: story counts win,
/// the legacy upload still contributes its gross sums.
pub fn combine(menus: &Table, alacarte: &Table) -> Result<AlignmentBreakdown> {
    let menus_layout = detect::try_detect_alignment(&menus.headers);
    let alacarte_layout = detect::try_detect_alignment(&alacarte.headers);

    let (menus_layout, alacarte_layout) = match (menus_layout, alacarte_layout) {
        (Ok(m), Ok(a)) => (m, a),
        (m, a) => {
            let details = [m.err(), a.err()].into_iter().flatten().collect::<Vec<_>>();
            return Err(crate::error::ReportError::FormatNotRecognized {
                category: CATEGORY.to_string(),
                details: details.join("; "),
            }
            .into());
        }
    };

    let mut story_tables = Vec::new();
    let mut legacy_tables = Vec::new();
    for (table, layout) in [(menus, menus_layout), (alacarte, alacarte_layout)] {
        match layout {
            AlignmentColumns::Story { .. } => story_tables.push(table),
            AlignmentColumns::Legacy { .. } => legacy_tables.push(table),
        }
    }

    let mut breakdown = AlignmentBreakdown::default();

    if !legacy_tables.is_empty() {
        let sales = combined_sales(&legacy_tables, "Advisor Name", CATEGORY, true)?;
        breakdown.counts = sales.counts;
        breakdown.labor_gross = sales.labor_gross;
        breakdown.parts_gross = sales.parts_gross;
    }

    if !story_tables.is_empty() {
        let mut counts = KeyedCounts::new();
        for table in &story_tables {
            counts = merge_counts(counts, &story_counts(table)?);
        }
        // Story counts replace legacy counts; summing across layouts
        // would count the same alignments twice.
        breakdown.counts = counts;
    }

    debug!("Alignments: {} advisors aggregated", breakdown.counts.len());
    Ok(breakdown)
}
