//! Text and numeric normalization shared by every aggregator
//!
//! Staff keys are trimmed and upper-cased; currency-looking text is
//! stripped of `$`, thousands separators and spaces before parsing into
//! a Decimal. Cells that are empty stay out of sums entirely (grouping
//! then summing must ignore absent values, not coerce them to zero).

use anyhow::Result;
use calamine::Data;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::error::ReportError;

/// Normalize an advisor/technician identifier: trim whitespace, uppercase.
pub fn normalize_key(s: &str) -> String {
    s.trim().to_uppercase()
}

/// Parse a currency-looking string into a Decimal.
///
/// Removes `$`, `,` and literal spaces, then parses base-10. Idempotent
/// on already-clean numeric input. Fails on anything non-numeric left
/// after cleaning.
pub fn parse_currency(s: &str) -> Result<Decimal, rust_decimal::Error> {
    let cleaned: String = s
        .chars()
        .filter(|c| *c != '$' && *c != ',' && *c != ' ')
        .collect();
    Decimal::from_str(&cleaned)
}

/// Extract a numeric value from a cell in a currency/quantity column.
///
/// Returns `Ok(None)` for empty or blank cells so the caller can drop
/// them from the sum. A non-empty cell that fails to parse after
/// cleaning is a hard error naming the column.
pub fn currency_cell(cell: &Data, column: &str) -> Result<Option<Decimal>> {
    match cell {
        Data::Empty => Ok(None),
        Data::Int(i) => Ok(Some(Decimal::from(*i))),
        Data::Float(f) => Ok(Decimal::from_f64_retain(*f)
            .map(Some)
            .unwrap_or(Some(Decimal::ZERO))),
        _ => {
            let text = cell.to_string();
            if text.trim().is_empty() {
                return Ok(None);
            }
            parse_currency(&text).map(Some).map_err(|_| {
                ReportError::BadNumber {
                    column: column.to_string(),
                    value: text,
                }
                .into()
            })
        }
    }
}

/// Render a cell as trimmed text. Integral floats render without the
/// trailing `.0` so RO numbers like `123456.0` compare as `"123456"`.
pub fn cell_text(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.trim().to_owned(),
        Data::Float(f) => {
            if *f == f.floor() && f.abs() < 1e15 {
                format!("{}", *f as i64)
            } else {
                f.to_string()
            }
        }
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::Empty => String::new(),
        other => other.to_string().trim().to_owned(),
    }
}

/// True if a cell is empty or whitespace-only.
pub fn cell_is_blank(cell: &Data) -> bool {
    matches!(cell, Data::Empty) || cell_text(cell).is_empty()
}

/// Parse a date from a cell: Excel serial datetimes or common US string
/// formats. Returns None for anything that is not a date (used to tell
/// timecard data rows apart from header/summary rows).
pub fn date_from_cell(cell: &Data) -> Option<NaiveDate> {
    match cell {
        Data::DateTime(dt) => {
            let days_since_epoch = dt.as_f64().floor() as i64;
            let excel_epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
            excel_epoch.checked_add_signed(chrono::Duration::days(days_since_epoch))
        }
        Data::Empty => None,
        _ => {
            let text = cell_text(cell);
            for fmt in ["%m/%d/%Y", "%m/%d/%y", "%Y-%m-%d"] {
                if let Ok(date) = NaiveDate::parse_from_str(&text, fmt) {
                    return Some(date);
                }
            }
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_normalize_key() {
        assert_eq!(normalize_key("  alice smith "), "ALICE SMITH");
        assert_eq!(normalize_key("BOB"), "BOB");
    }

    #[test]
    fn test_parse_currency_strips_symbols() {
        assert_eq!(parse_currency("$1,234.50").unwrap(), dec!(1234.50));
        assert_eq!(parse_currency("$ 40").unwrap(), dec!(40));
    }

    #[test]
    fn test_parse_currency_idempotent_on_clean_input() {
        assert_eq!(parse_currency("1234.50").unwrap(), dec!(1234.50));
        assert_eq!(parse_currency("-12.5").unwrap(), dec!(-12.5));
    }

    #[test]
    fn test_parse_currency_rejects_garbage() {
        assert!(parse_currency("N/A").is_err());
        assert!(parse_currency("").is_err());
    }

    #[test]
    fn test_currency_cell_passthrough_and_blank() {
        let v = currency_cell(&Data::Float(1234.50), "Gross").unwrap();
        assert_eq!(v, Some(dec!(1234.50)));
        assert_eq!(currency_cell(&Data::Empty, "Gross").unwrap(), None);
        assert_eq!(
            currency_cell(&Data::String("  ".into()), "Gross").unwrap(),
            None
        );
    }

    #[test]
    fn test_currency_cell_error_names_column() {
        let err = currency_cell(&Data::String("abc".into()), "Opcode Labor Gross")
            .unwrap_err()
            .to_string();
        assert!(err.contains("Opcode Labor Gross"));
        assert!(err.contains("abc"));
    }

    #[test]
    fn test_cell_text_integral_float() {
        assert_eq!(cell_text(&Data::Float(123456.0)), "123456");
        assert_eq!(cell_text(&Data::Float(1.5)), "1.5");
        assert_eq!(cell_text(&Data::String(" RO-1 ".into())), "RO-1");
    }

    #[test]
    fn test_date_from_cell_strings() {
        assert_eq!(
            date_from_cell(&Data::String("07/15/2024".into())),
            NaiveDate::from_ymd_opt(2024, 7, 15)
        );
        assert_eq!(date_from_cell(&Data::String("Totals".into())), None);
        assert_eq!(date_from_cell(&Data::Empty), None);
    }

    #[test]
    fn test_date_from_cell_excel_serial() {
        // 45488 = 2024-07-15 in the 1900 date system
        let cell = Data::DateTime(calamine::ExcelDateTime::new(
            45488.0,
            calamine::ExcelDateTimeType::DateTime,
            false,
        ));
        assert_eq!(date_from_cell(&cell), NaiveDate::from_ymd_opt(2024, 7, 15));
    }
}
