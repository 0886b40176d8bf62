//! Layout detection for multi-format upload categories
//!
//! Tire exports, alignment exports and daily-data exports each exist in
//! two or three historical layouts. Column roles are resolved from an
//! ordered rule table: each role carries a prioritized list of keyword
//! patterns, a pattern matches a header when every keyword appears in it
//! (case-insensitive), and the first unclaimed matching header wins. New
//! layouts get a new pattern appended; existing rules never reorder.
//!
//! Detection returns `Result<_, String>` so callers can chain layout
//! fallbacks (e.g. retry a GM file with two rows skipped) without
//! treating a mismatch as fatal. Truly missing columns in single-layout
//! categories go through `ReportError::ColumnMissing` instead.

use itertools::Itertools;
use tracing::debug;

/// Resolved column roles for a tires upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TiresColumns {
    pub name: usize,
    pub quantity: usize,
    pub gross: usize,
    pub variant: TiresVariant,
}

/// Which historical tire export produced the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TiresVariant {
    Original,
    Gm,
}

/// Resolved columns for an alignment upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlignmentColumns {
    /// Menu-style export with gross columns; counted like menu sales.
    Legacy { name: usize },
    /// Newer export with a free-text job story; alignments are counted
    /// by keyword.
    Story { name: usize, story: usize },
}

/// Resolved columns for a daily-data upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DailyColumns {
    /// One row per pay type per advisor; only "ALL" rows are authoritative.
    Old { name: usize, pay_type: usize },
    /// One row per advisor.
    New { name: usize },
}

/// One role rule: patterns tried in order, each pattern a conjunction of
/// keywords that must all appear in the header.
struct RoleRule {
    role: &'static str,
    patterns: &'static [&'static [&'static str]],
}

const TIRE_RULES: &[RoleRule] = &[
    RoleRule {
        role: "advisor name",
        patterns: &[&["advisor", "name"]],
    },
    RoleRule {
        role: "quantity",
        patterns: &[&["part count"], &["actual quantity"]],
    },
    RoleRule {
        role: "gross",
        patterns: &[&["opcode parts gross"], &["gross"]],
    },
];

/// Find the first unclaimed header matching one of `patterns`.
fn resolve_role(
    headers: &[String],
    claimed: &[bool],
    patterns: &[&[&str]],
) -> Option<usize> {
    for pattern in patterns {
        for (idx, header) in headers.iter().enumerate() {
            if claimed[idx] {
                continue;
            }
            if pattern.iter().all(|kw| header.contains(kw)) {
                return Some(idx);
            }
        }
    }
    None
}

/// Try to resolve tire columns against the known layouts.
///
/// The GM sub-variant is distinguished by the name header itself
/// ("advisor name group"); GM files also carry their header on row 3,
/// which the caller handles by re-reading with two rows skipped before
/// retrying this detection.
pub fn try_detect_tires(headers: &[String]) -> Result<TiresColumns, String> {
    let lowered: Vec<String> = headers.iter().map(|h| h.to_lowercase()).collect();
    let mut claimed = vec![false; lowered.len()];
    let mut resolved = Vec::with_capacity(TIRE_RULES.len());

    for rule in TIRE_RULES {
        match resolve_role(&lowered, &claimed, rule.patterns) {
            Some(idx) => {
                claimed[idx] = true;
                resolved.push(idx);
            }
            None => {
                return Err(format!(
                    "no column matching '{}' among headers [{}]",
                    rule.role,
                    headers.iter().join(", ")
                ));
            }
        }
    }

    let (name, quantity, gross) = (resolved[0], resolved[1], resolved[2]);
    let variant = if lowered[name].contains("advisor name group") {
        TiresVariant::Gm
    } else {
        TiresVariant::Original
    };
    debug!("Detected {:?} tires format", variant);

    Ok(TiresColumns {
        name,
        quantity,
        gross,
        variant,
    })
}

/// Try to resolve alignment columns against the known layouts.
pub fn try_detect_alignment(headers: &[String]) -> Result<AlignmentColumns, String> {
    let lowered: Vec<String> = headers.iter().map(|h| h.to_lowercase()).collect();

    let name = lowered
        .iter()
        .position(|h| h.contains("advisor") && h.contains("name"));
    let Some(name) = name else {
        return Err(format!(
            "no advisor name column among headers [{}]",
            headers.iter().join(", ")
        ));
    };

    let has_gross = lowered.iter().any(|h| h.contains("opcode labor gross"))
        && lowered.iter().any(|h| h.contains("opcode parts gross"));
    if has_gross {
        debug!("Detected legacy alignment format");
        return Ok(AlignmentColumns::Legacy { name });
    }

    let story = lowered
        .iter()
        .position(|h| h.contains("story") || h.contains("description"));
    if let Some(story) = story {
        debug!("Detected story alignment format");
        return Ok(AlignmentColumns::Story { name, story });
    }

    Err(format!(
        "neither gross columns nor a story/description column among headers [{}]",
        headers.iter().join(", ")
    ))
}

/// Resolve daily-data columns; the pay-type breakdown marks the old layout.
pub fn try_detect_daily(headers: &[String]) -> Result<DailyColumns, String> {
    let lowered: Vec<String> = headers.iter().map(|h| h.to_lowercase()).collect();

    let pay_type = lowered.iter().position(|h| h == "pay type");

    if let Some(pay_type) = pay_type {
        let name = lowered
            .iter()
            .position(|h| h == "name" || h == "service advisor")
            .ok_or_else(|| "pay-type layout without a Name column".to_string())?;
        debug!("Detected old daily-data format (pay-type breakdown)");
        return Ok(DailyColumns::Old { name, pay_type });
    }

    let name = lowered
        .iter()
        .position(|h| h == "service advisor" || h == "name")
        .ok_or_else(|| {
            format!(
                "no Name or Service Advisor column among headers [{}]",
                headers.iter().join(", ")
            )
        })?;
    debug!("Detected new daily-data format");
    Ok(DailyColumns::New { name })
}
