use chrono::{Datelike, NaiveDate};

use crate::expiry::record::CellValue;
use crate::expiry::settings::DateFormats;

/// A calendar date, or `None` when the cell held nothing usable.
pub type ParsedDate = Option<NaiveDate>;

/// Placeholder strings that spreadsheets and exports emit for "no value".
const NULL_LIKE: &[&str] = &["none", "null", "nan", "nat", "n/a", "-"];

/// Resolves a raw cell to a date. Never fails: anything unrecognised is unset.
pub fn parse_date(value: &CellValue, formats: &DateFormats) -> ParsedDate {
    match value {
        CellValue::Empty => None,
        CellValue::Date(d) => Some(*d),
        CellValue::DateTime(dt) => Some(dt.date()),
        CellValue::Text(raw) => parse_date_str(raw, formats),
    }
}

/// Tries each format in order against the leading tokens of `raw`.
///
/// A format spanning N whitespace-separated tokens is matched against the
/// first N tokens of the input, so trailing text such as a time of day or a
/// remark is ignored. Years outside 1000..=9999 are rejected so that
/// two-digit years never slip through a `%Y` pattern.
pub fn parse_date_str(raw: &str, formats: &DateFormats) -> ParsedDate {
    let raw = raw.trim();
    if raw.is_empty() || NULL_LIKE.iter().any(|n| raw.eq_ignore_ascii_case(n)) {
        return None;
    }

    let tokens: Vec<&str> = raw.split_whitespace().collect();

    formats.iter().find_map(|format| {
        let width = format.split_whitespace().count().max(1);
        if tokens.len() < width {
            return None;
        }
        let candidate = tokens[..width].join(" ");
        NaiveDate::parse_from_str(&candidate, format)
            .ok()
            .filter(|d| (1000..=9999).contains(&d.year()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    #[test]
    fn test_parses_each_default_format() {
        let formats = DateFormats::default();
        assert_eq!(parse_date(&text("2025-01-05"), &formats), Some(ymd(2025, 1, 5)));
        assert_eq!(parse_date(&text("05-Jan-2025"), &formats), Some(ymd(2025, 1, 5)));
        assert_eq!(parse_date(&text("05/01/2025"), &formats), Some(ymd(2025, 1, 5)));
        assert_eq!(
            parse_date(&text("05 January 2025"), &formats),
            Some(ymd(2025, 1, 5))
        );
    }

    #[test]
    fn test_ignores_trailing_text() {
        let formats = DateFormats::default();
        assert_eq!(
            parse_date(&text("2025-06-10 14:30:00"), &formats),
            Some(ymd(2025, 6, 10))
        );
        assert_eq!(
            parse_date(&text("  12/03/2026 (renewal pending)"), &formats),
            Some(ymd(2026, 3, 12))
        );
        assert_eq!(
            parse_date(&text("7 March 2026 per vendor"), &formats),
            Some(ymd(2026, 3, 7))
        );
    }

    #[test]
    fn test_empty_and_garbage_are_unset() {
        let formats = DateFormats::default();
        assert_eq!(parse_date(&CellValue::Empty, &formats), None);
        assert_eq!(parse_date(&text(""), &formats), None);
        assert_eq!(parse_date(&text("   "), &formats), None);
        assert_eq!(parse_date(&text("not a date"), &formats), None);
        assert_eq!(parse_date(&text("None"), &formats), None);
        assert_eq!(parse_date(&text("NaT"), &formats), None);
        assert_eq!(parse_date(&text("31/02/2025"), &formats), None);
    }

    #[test]
    fn test_native_values_pass_through() {
        let formats = DateFormats::new(Vec::<String>::new());
        assert_eq!(
            parse_date(&CellValue::Date(ymd(2024, 2, 29)), &formats),
            Some(ymd(2024, 2, 29))
        );
        let dt = NaiveDateTime::parse_from_str("2024-02-29 23:59:00", "%Y-%m-%d %H:%M:%S").unwrap();
        assert_eq!(
            parse_date(&CellValue::DateTime(dt), &formats),
            Some(ymd(2024, 2, 29))
        );
    }

    #[test]
    fn test_two_digit_year_rejected() {
        let formats = DateFormats::default();
        assert_eq!(parse_date(&text("05/01/25"), &formats), None);
    }

    #[test]
    fn test_first_configured_format_wins_on_ambiguity() {
        let day_first = DateFormats::new(["%d/%m/%Y", "%m/%d/%Y"]);
        let month_first = DateFormats::new(["%m/%d/%Y", "%d/%m/%Y"]);
        assert_eq!(
            parse_date(&text("01/02/2025"), &day_first),
            Some(ymd(2025, 2, 1))
        );
        assert_eq!(
            parse_date(&text("01/02/2025"), &month_first),
            Some(ymd(2025, 1, 2))
        );
    }

    #[test]
    fn test_falls_through_to_later_format() {
        let formats = DateFormats::new(["%d/%m/%Y", "%m/%d/%Y"]);
        assert_eq!(
            parse_date(&text("12/31/2025"), &formats),
            Some(ymd(2025, 12, 31))
        );
    }

    #[test]
    fn test_unconfigured_format_degrades_to_unset() {
        let iso_only = DateFormats::new(["%Y-%m-%d"]);
        assert_eq!(parse_date(&text("10-Jun-2025"), &iso_only), None);
        assert_eq!(
            parse_date(&text("2025-06-10"), &iso_only),
            Some(ymd(2025, 6, 10))
        );
    }

    #[test]
    fn test_display_format_round_trip() {
        let display = "%d %B %Y";
        let formats = DateFormats::new(["%Y-%m-%d", display]);
        for d in [ymd(2025, 1, 1), ymd(2024, 2, 29), ymd(2030, 12, 31)] {
            let shown = d.format(display).to_string();
            assert_eq!(parse_date_str(&shown, &formats), Some(d), "{shown}");
        }
    }
}
