//! Flexible date parsing for the date-bearing employee columns.
//!
//! Accepts year-first (`2026-06-29`, `2026/6/29`) and day-first (`29/06/2026`)
//! input and renders the canonical `YYYY/MM/DD` form. Anything else degrades to
//! [`ABSENT_DATE`]; an unparseable date is never an error.

use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

/// Canonical "no date" marker.
pub const ABSENT_DATE: &str = "--";

const YEAR_RANGE: std::ops::RangeInclusive<i32> = 1900..=2100;

static YEAR_FIRST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})[-/](\d{1,2})[-/](\d{1,2})").expect("valid regex"));
static DAY_FIRST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2})[-/](\d{1,2})[-/](\d{4})").expect("valid regex"));

/// Parses `text` into a calendar date.
///
/// Patterns are anchored at the start only, so a trailing time part is ignored.
/// Returns `None` for blank input, the `--` marker, out-of-range components, or a
/// day that does not exist in the given month (e.g. `2024/02/30`).
pub fn parse_flexible_date(text: &str) -> Option<NaiveDate> {
    let s = text.trim();
    if s.is_empty() || s == ABSENT_DATE {
        return None;
    }

    let (year, month, day) = if let Some(c) = YEAR_FIRST.captures(s) {
        (c[1].parse::<i32>().ok()?, c[2].parse::<u32>().ok()?, c[3].parse::<u32>().ok()?)
    } else if let Some(c) = DAY_FIRST.captures(s) {
        (c[3].parse::<i32>().ok()?, c[2].parse::<u32>().ok()?, c[1].parse::<u32>().ok()?)
    } else {
        return None;
    };

    if !YEAR_RANGE.contains(&year) || !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return None;
    }

    // NaiveDate carries no offset, so the day cannot shift on render.
    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    (date.year() == year && date.month() == month && date.day() == day).then_some(date)
}

/// Renders a date in the canonical `YYYY/MM/DD` form.
pub fn render_date(date: NaiveDate) -> String {
    date.format("%Y/%m/%d").to_string()
}

/// Canonical text for a raw date value: `YYYY/MM/DD` or `--`.
pub fn canonical_date_text(text: &str) -> String {
    parse_flexible_date(text)
        .map(render_date)
        .unwrap_or_else(|| ABSENT_DATE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn year_first_and_day_first_agree() {
        let a = parse_flexible_date("2026/06/29");
        let b = parse_flexible_date("29/06/2026");
        assert!(a.is_some());
        assert_eq!(a, b);
        assert_eq!(render_date(a.unwrap()), "2026/06/29");
    }

    #[test]
    fn accepts_dash_separators_and_single_digits() {
        assert_eq!(canonical_date_text("2026-6-9"), "2026/06/09");
        assert_eq!(canonical_date_text("9-6-2026"), "2026/06/09");
        assert_eq!(canonical_date_text("  1993/07/09 "), "1993/07/09");
    }

    #[test]
    fn ignores_trailing_time_part() {
        assert_eq!(canonical_date_text("2024-01-05T10:30:00Z"), "2024/01/05");
    }

    #[test]
    fn rejects_impossible_calendar_dates() {
        assert_eq!(parse_flexible_date("2024/02/30"), None);
        assert_eq!(parse_flexible_date("31/04/2025"), None);
        assert!(parse_flexible_date("2024/02/29").is_some());
        assert_eq!(parse_flexible_date("2023/02/29"), None);
    }

    #[test]
    fn rejects_out_of_range_components() {
        assert_eq!(parse_flexible_date("1899/12/31"), None);
        assert_eq!(parse_flexible_date("2101/01/01"), None);
        assert_eq!(parse_flexible_date("2024/13/01"), None);
        assert_eq!(parse_flexible_date("2024/00/10"), None);
        assert_eq!(parse_flexible_date("2024/01/32"), None);
    }

    #[test]
    fn blank_and_marker_are_absent() {
        assert_eq!(parse_flexible_date(""), None);
        assert_eq!(parse_flexible_date("   "), None);
        assert_eq!(parse_flexible_date("--"), None);
        assert_eq!(parse_flexible_date(" -- "), None);
        assert_eq!(parse_flexible_date("not a date"), None);
        assert_eq!(canonical_date_text(""), ABSENT_DATE);
    }

    #[test]
    fn canonical_text_is_a_fixed_point() {
        for raw in ["2026/06/29", "29-6-2026", "garbage", "--"] {
            let once = canonical_date_text(raw);
            assert_eq!(canonical_date_text(&once), once);
        }
    }
}
