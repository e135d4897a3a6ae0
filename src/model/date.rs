//! Civil-calendar date helpers.
//!
//! Everything here works on `NaiveDate`: days have no time zone and no
//! time-of-day, so arithmetic never drifts across DST changes.

use chrono::{Days, NaiveDate, NaiveDateTime};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse an ISO-like date (`2024-03-10` or `2024-03-10T08:30:00`).
///
/// A trailing time component is discarded. Returns `None` for anything
/// else; the timeline core only ever sees dates that parsed.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if let Ok(d) = NaiveDate::parse_from_str(s, DATE_FORMAT) {
        return Some(d);
    }
    let (day, _time) = s.split_once('T')?;
    NaiveDate::parse_from_str(day, DATE_FORMAT).ok()
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Shift by `days`, or `None` past the representable calendar.
pub fn checked_add_days(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    let step = Days::new(days.unsigned_abs());
    if days >= 0 {
        date.checked_add_days(step)
    } else {
        date.checked_sub_days(step)
    }
}

/// Shift by `days`, saturating at `NaiveDate::MIN`/`MAX`.
pub fn add_days(date: NaiveDate, days: i64) -> NaiveDate {
    checked_add_days(date, days).unwrap_or(if days >= 0 {
        NaiveDate::MAX
    } else {
        NaiveDate::MIN
    })
}

/// Whole days from `from` to `to` (negative if `to` is earlier).
pub fn day_diff(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}

pub fn start_of_day(at: NaiveDateTime) -> NaiveDate {
    at.date()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn format_parse_round_trip() {
        for s in ["2024-01-05", "2024-02-29", "1999-12-31", "2030-07-01"] {
            assert_eq!(format_date(parse_date(s).unwrap()), s);
        }
    }

    #[test]
    fn parse_strips_time_component() {
        assert_eq!(parse_date("2024-03-10T17:45:00"), Some(d(2024, 3, 10)));
        assert_eq!(parse_date(" 2024-03-10 "), Some(d(2024, 3, 10)));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert_eq!(parse_date("10/03/2024"), None);
        assert_eq!(parse_date("2024-02-30"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn day_arithmetic() {
        assert_eq!(add_days(d(2024, 2, 28), 2), d(2024, 3, 1));
        assert_eq!(add_days(d(2024, 3, 1), -1), d(2024, 2, 29));
        assert_eq!(day_diff(d(2024, 3, 1), d(2024, 3, 10)), 9);
        assert_eq!(day_diff(d(2024, 3, 10), d(2024, 3, 1)), -9);
        assert_eq!(day_diff(d(2024, 3, 10), d(2024, 3, 10)), 0);
    }

    #[test]
    fn shifting_past_the_calendar_saturates() {
        assert_eq!(checked_add_days(NaiveDate::MAX, 1), None);
        assert_eq!(checked_add_days(NaiveDate::MIN, -1), None);
        assert_eq!(add_days(d(2024, 6, 1), i64::MAX), NaiveDate::MAX);
        assert_eq!(add_days(d(2024, 6, 1), i64::MIN), NaiveDate::MIN);
        assert_eq!(checked_add_days(d(2024, 6, 1), -31), Some(d(2024, 5, 1)));
    }

    #[test]
    fn start_of_day_drops_time() {
        let at = d(2024, 3, 10).and_hms_opt(23, 59, 59).unwrap();
        assert_eq!(start_of_day(at), d(2024, 3, 10));
    }
}
