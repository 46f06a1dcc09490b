//! Date parsing for statement and receipt lines.

use chrono::{Datelike, NaiveDate};

use super::patterns::{DATE_MDY_PARTS, DATE_YMD_PARTS};

/// Where a date without a printed year takes its year from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YearHint {
    /// Statement closing date: months after it belong to the previous year.
    Closing(NaiveDate),
    /// Fixed year from configuration.
    Fixed(i32),
}

/// Parse a date token in one of the accepted formats.
///
/// `MM/DD/YYYY`, `MM/DD/YY`, `MM-DD-YYYY` and `YYYY-MM-DD` carry their own
/// year; `MM/DD` needs a [`YearHint`]. Returns `None` for anything else or
/// for impossible calendar dates.
pub fn parse_date(token: &str, hint: Option<YearHint>) -> Option<NaiveDate> {
    let token = token.trim();

    if let Some(caps) = DATE_YMD_PARTS.captures(token) {
        let year: i32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        let day: u32 = caps[3].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    let caps = DATE_MDY_PARTS.captures(token)?;
    let month: u32 = caps[1].parse().ok()?;
    let day: u32 = caps[2].parse().ok()?;

    let year = match caps.get(3) {
        Some(y) => parse_year(y.as_str())?,
        None => match hint? {
            YearHint::Closing(closing) if month > closing.month() => closing.year() - 1,
            YearHint::Closing(closing) => closing.year(),
            YearHint::Fixed(year) => year,
        },
    };

    NaiveDate::from_ymd_opt(year, month, day)
}

fn parse_year(s: &str) -> Option<i32> {
    let year: i32 = s.parse().ok()?;
    if s.len() == 2 {
        // Two-digit year: 00-50 is 2000s, 51-99 is 1900s
        Some(if year <= 50 { 2000 + year } else { 1900 + year })
    } else {
        Some(year)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_full_formats() {
        assert_eq!(parse_date("04/01/2025", None), Some(ymd(2025, 4, 1)));
        assert_eq!(parse_date("4/1/25", None), Some(ymd(2025, 4, 1)));
        assert_eq!(parse_date("04-01-2025", None), Some(ymd(2025, 4, 1)));
        assert_eq!(parse_date("2025-04-01", None), Some(ymd(2025, 4, 1)));
        assert_eq!(parse_date("12/31/99", None), Some(ymd(1999, 12, 31)));
    }

    #[test]
    fn test_invalid_calendar_date() {
        assert_eq!(parse_date("13/45/2025", None), None);
        assert_eq!(parse_date("02/30/2025", None), None);
        assert_eq!(parse_date("April 1", None), None);
    }

    #[test]
    fn test_month_day_needs_hint() {
        assert_eq!(parse_date("04/01", None), None);
        assert_eq!(
            parse_date("04/01", Some(YearHint::Fixed(2024))),
            Some(ymd(2024, 4, 1))
        );
    }

    #[test]
    fn test_month_day_rolls_back_over_year_end() {
        let hint = Some(YearHint::Closing(ymd(2025, 1, 15)));
        assert_eq!(parse_date("12/28", hint), Some(ymd(2024, 12, 28)));
        assert_eq!(parse_date("01/03", hint), Some(ymd(2025, 1, 3)));
    }
}
