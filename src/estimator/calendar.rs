//! Business-day arithmetic
//!
//! A business day is any day other than Saturday or Sunday. Holidays are
//! not modelled.

use chrono::{Datelike, Days, NaiveDate, Weekday};

pub fn is_business_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

fn next_day(date: NaiveDate) -> NaiveDate {
    date.checked_add_days(Days::new(1)).unwrap_or(NaiveDate::MAX)
}

/// The first business day strictly after `date`.
pub fn next_working_day(date: NaiveDate) -> NaiveDate {
    let mut day = next_day(date);
    while !is_business_day(day) {
        day = next_day(day);
    }
    day
}

/// Advance `days` business days from `date`, one calendar day at a time.
///
/// With `days == 0` the date is returned unchanged.
pub fn add_business_days(date: NaiveDate, days: u32) -> NaiveDate {
    let mut result = date;
    let mut remaining = days;
    while remaining > 0 {
        result = next_day(result);
        if is_business_day(result) {
            remaining -= 1;
        }
    }
    result
}
