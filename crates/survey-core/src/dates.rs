//! Lenient timestamp parsing for visit and modification dates.

use crate::table::CellValue;
use chrono::{NaiveDate, NaiveDateTime};

const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%m-%d-%Y %H:%M:%S",
    "%m-%d-%Y %H:%M",
    "%d-%m-%Y %H:%M:%S",
    "%d-%m-%Y %H:%M",
];

// Month-first wins for ambiguous numeric dates; day-first only when the
// month-first reading is impossible (`25/10/2025`).
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%m-%d-%Y",
    "%d-%m-%Y",
];

/// Format used when normalising the visit date column.
pub const VISIT_DATE_FORMAT: &str = "%Y-%m-%d";
/// Format used when normalising the modification date column.
pub const MODIFY_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parse a timestamp from free text. Date-only values land on midnight.
///
/// Returns `None` for anything that matches none of the known layouts.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    for format in DATE_TIME_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(value, format) {
            return Some(ts);
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }
    None
}

/// Timestamp view of a cell; numbers and blanks never parse.
pub fn cell_timestamp(cell: Option<&CellValue>) -> Option<NaiveDateTime> {
    match cell {
        Some(CellValue::String(s)) => parse_timestamp(s),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iso_date_and_datetime() {
        let d = parse_timestamp("2025-10-11").unwrap();
        assert_eq!(d.format("%Y%m%d").to_string(), "20251011");

        let t = parse_timestamp("2025-10-11 14:05:09").unwrap();
        assert_eq!(t.format(MODIFY_DATE_FORMAT).to_string(), "2025-10-11 14:05:09");

        let t = parse_timestamp("2025-10-11T14:05:09.123").unwrap();
        assert_eq!(t.format(VISIT_DATE_FORMAT).to_string(), "2025-10-11");
    }

    #[test]
    fn test_numeric_dates_month_first() {
        let d = parse_timestamp("11/10/2025").unwrap();
        assert_eq!(d.format(VISIT_DATE_FORMAT).to_string(), "2025-11-10");

        let d = parse_timestamp("11-10-2025 09:30").unwrap();
        assert_eq!(d.format(MODIFY_DATE_FORMAT).to_string(), "2025-11-10 09:30:00");
    }

    #[test]
    fn test_day_first_fallback() {
        let d = parse_timestamp("25/10/2025").unwrap();
        assert_eq!(d.format(VISIT_DATE_FORMAT).to_string(), "2025-10-25");

        let d = parse_timestamp("25-10-2025 18:30").unwrap();
        assert_eq!(d.format(MODIFY_DATE_FORMAT).to_string(), "2025-10-25 18:30:00");
    }

    #[test]
    fn test_garbage_is_none() {
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("not a date").is_none());
        assert!(parse_timestamp("2025-13-40").is_none());
        assert!(cell_timestamp(Some(&CellValue::Integer(45000))).is_none());
        assert!(cell_timestamp(None).is_none());
    }
}
