//! Course date handling: the catalog stores dates as hand-entered
//! strings, so parsing is lenient and display formatting is Dutch.

use chrono::NaiveDate;

/// Shown when a course has no parsable date yet.
pub const DATE_TBA: &str = "Datum volgt";

/// Shown when a course has no time slot filled in.
pub const TIME_TBA: &str = "Tijd volgt";

const MONTHS: [&str; 12] = [
    "jan", "feb", "mrt", "apr", "mei", "jun", "jul", "aug", "sep", "okt", "nov",
    "dec",
];

/// Sentinel used to sort undated courses after every dated one.
pub fn far_future() -> NaiveDate {
    NaiveDate::from_ymd_opt(2099, 1, 1).expect("valid sentinel date")
}

/// Parses a hand-entered course date. Accepts ISO dates, ISO
/// timestamps and the Dutch day-first form.
pub fn parse_course_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(datetime) = chrono::DateTime::parse_from_rfc3339(raw) {
        return Some(datetime.date_naive());
    }
    NaiveDate::parse_from_str(raw, "%d-%m-%Y").ok()
}

/// Formats a course date as the storefront shows it: `12 mei`.
pub fn format_dutch_date(date: NaiveDate) -> String {
    use chrono::Datelike;
    format!("{} {}", date.day(), MONTHS[date.month0() as usize])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_iso_dates() {
        let date = parse_course_date("2026-05-12").unwrap();
        assert_eq!(format_dutch_date(date), "12 mei");
    }

    #[test]
    fn parses_iso_timestamps() {
        let date = parse_course_date("2026-03-01T09:00:00+01:00").unwrap();
        assert_eq!(format_dutch_date(date), "1 mrt");
    }

    #[test]
    fn parses_day_first_dates() {
        let date = parse_course_date("31-10-2026").unwrap();
        assert_eq!(format_dutch_date(date), "31 okt");
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_course_date("").is_none());
        assert!(parse_course_date("binnenkort").is_none());
    }

    #[test]
    fn sentinel_sorts_after_any_real_date() {
        let real = parse_course_date("2026-12-31").unwrap();
        assert!(far_future() > real);
    }
}
