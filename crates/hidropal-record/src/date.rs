//! Day-first date parsing and `dd/mm/YYYY` rendering
//!
//! Parsing never fails loudly: anything that does not look like a calendar
//! date yields `None`.

use chrono::NaiveDate;

/// Persisted date format
pub const DATE_OUT_FMT: &str = "%d/%m/%Y";

const SEPARATORS: [char; 3] = ['/', '-', '.'];

const DAY_FIRST: [&str; 3] = ["%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y"];
const DAY_FIRST_SHORT_YEAR: [&str; 3] = ["%d/%m/%y", "%d-%m-%y", "%d.%m.%y"];
const YEAR_FIRST: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d"];

/// Parse a date, reading ambiguous numeric forms day-first
///
/// `03/04/2024` is 3 April. ISO `2024-04-03` is also accepted. A trailing
/// time component is ignored.
#[must_use]
pub fn parse_date(input: &str) -> Option<NaiveDate> {
    let date_part = input
        .trim()
        .split(|c: char| c.is_whitespace() || c == 'T')
        .next()?;
    if date_part.is_empty() {
        return None;
    }

    let mut segments = date_part.split(SEPARATORS);
    let first = segments.next().unwrap_or_default();
    let last = segments.last().unwrap_or_default();

    let formats: &[&str] = if first.len() == 4 {
        &YEAR_FIRST
    } else if last.len() == 2 {
        &DAY_FIRST_SHORT_YEAR
    } else {
        &DAY_FIRST
    };

    formats
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
}

/// Render a date as `dd/mm/YYYY`
#[inline]
#[must_use]
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_OUT_FMT).to_string()
}

/// Re-render a parseable date string as `dd/mm/YYYY`
///
/// Strings that do not parse come back unchanged, so this is idempotent.
#[must_use]
pub fn format_date_str(input: &str) -> String {
    parse_date(input).map_or_else(|| input.to_string(), format_date)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn ambiguous_dates_are_day_first() {
        assert_eq!(parse_date("03/04/2024"), Some(ymd(2024, 4, 3)));
        assert_eq!(parse_date("3/4/2024"), Some(ymd(2024, 4, 3)));
        assert_eq!(parse_date("03-04-2024"), Some(ymd(2024, 4, 3)));
        assert_eq!(parse_date("03.04.2024"), Some(ymd(2024, 4, 3)));
    }

    #[test]
    fn iso_dates_are_year_first() {
        assert_eq!(parse_date("2024-04-03"), Some(ymd(2024, 4, 3)));
        assert_eq!(parse_date("2024-04-03 10:15:00"), Some(ymd(2024, 4, 3)));
        assert_eq!(parse_date("2024-04-03T10:15:00"), Some(ymd(2024, 4, 3)));
    }

    #[test]
    fn two_digit_years() {
        assert_eq!(parse_date("03/04/24"), Some(ymd(2024, 4, 3)));
    }

    #[test]
    fn unparseable_dates_are_none() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("   "), None);
        assert_eq!(parse_date("yesterday"), None);
        assert_eq!(parse_date("31/02/2024"), None);
        assert_eq!(parse_date("nan"), None);
    }

    #[test]
    fn format_is_zero_padded() {
        assert_eq!(format_date(ymd(2024, 4, 3)), "03/04/2024");
    }

    #[test]
    fn format_str_passes_through_garbage() {
        assert_eq!(format_date_str("not a date"), "not a date");
        assert_eq!(format_date_str("2024-04-03"), "03/04/2024");
        let once = format_date_str("3/4/2024");
        assert_eq!(format_date_str(&once), once);
    }
}
