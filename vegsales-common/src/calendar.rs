//! Week-number calendar codec
//!
//! External dates arrive as `"YYYY-WW"` labels and are stored as `year_week = year * 100 + week`.
//! Week numbers follow the Monday-first `%W` convention: week 1 begins on the first Monday of
//! the year and the days before it form week 0. This anchoring is an external contract; weeks
//! must not be reinterpreted as ISO weeks or as fixed 7-day offsets from January 1st.

use chrono::{Datelike, Duration, NaiveDate};

use crate::{Error, Result};

/// Highest week number `%W` can produce
pub const MAX_WEEK: i64 = 53;

/// Split `year_week` into (year, week)
pub fn split_year_week(year_week: i64) -> (i64, i64) {
    (year_week / 100, year_week % 100)
}

/// Parse an external `"YYYY-WW"` label into the internal `year_week` key
///
/// Accepts one- or two-digit weeks (`"2020-1"` and `"2020-01"` are the same week).
pub fn parse_date_label(label: &str) -> Result<i64> {
    let invalid = || {
        Error::Validation(format!(
            "Invalid date '{}': expected YYYY-WW with week 00-{}",
            label, MAX_WEEK
        ))
    };

    let (year_part, week_part) = label.trim().split_once('-').ok_or_else(invalid)?;
    if year_part.is_empty()
        || week_part.is_empty()
        || week_part.len() > 2
        || !year_part.bytes().all(|b| b.is_ascii_digit())
        || !week_part.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(invalid());
    }

    let year: i64 = year_part.parse().map_err(|_| invalid())?;
    let week: i64 = week_part.parse().map_err(|_| invalid())?;

    if !(1..=9999).contains(&year) || week > MAX_WEEK {
        return Err(invalid());
    }

    Ok(year * 100 + week)
}

/// Format `year_week` back to `"YYYY-WW"`
pub fn format_year_week(year_week: i64) -> String {
    let (year, week) = split_year_week(year_week);
    format!("{}-{:02}", year, week)
}

/// Format a stored `"YYYYMM"` key as `"YYYY-MM"`
///
/// Keys that are not six digits are returned unchanged.
pub fn format_year_month(year_month: &str) -> String {
    if year_month.len() == 6 && year_month.bytes().all(|b| b.is_ascii_digit()) {
        format!("{}-{}", &year_month[..4], &year_month[4..])
    } else {
        year_month.to_string()
    }
}

/// `"YYYYMM"` key of the month containing `date`
pub fn year_month_key(date: NaiveDate) -> String {
    date.format("%Y%m").to_string()
}

/// Monday that starts the given `%W` week
///
/// Week 0 starts `weekday(Jan 1)` days before January 1st and may therefore begin in the
/// previous year. When January 1st is itself a Monday, weeks 0 and 1 both start on it.
pub fn week_start(year_week: i64) -> Result<NaiveDate> {
    let (year, week) = split_year_week(year_week);

    let out_of_range = || Error::Compute(format!("year_week {} is outside the calendar", year_week));

    let year = i32::try_from(year).map_err(|_| out_of_range())?;
    let jan1 = NaiveDate::from_ymd_opt(year, 1, 1).ok_or_else(out_of_range)?;
    let first_weekday = i64::from(jan1.weekday().num_days_from_monday());

    let offset_days = if week == 0 {
        -first_weekday
    } else {
        let week0_length = (7 - first_weekday) % 7;
        week0_length + 7 * (week - 1)
    };

    jan1.checked_add_signed(Duration::days(offset_days))
        .ok_or_else(out_of_range)
}
