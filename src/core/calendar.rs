//! Weekday-only business calendar helpers.

use chrono::{Datelike, Days, Months, NaiveDate, Weekday};

const ONE_DAY: Days = Days::new(1);

pub fn is_business_day(d: NaiveDate) -> bool {
    !matches!(d.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Last business day strictly before `d`.
pub fn previous_business_day(d: NaiveDate) -> NaiveDate {
    let mut prev = d - ONE_DAY;
    while !is_business_day(prev) {
        prev = prev - ONE_DAY;
    }
    prev
}

/// All business days in `[start, end]`, ascending.
pub fn business_days(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    start
        .iter_days()
        .take_while(|d| *d <= end)
        .filter(|d| is_business_day(*d))
        .collect()
}

pub fn first_of_month(d: NaiveDate) -> NaiveDate {
    d.with_day(1).unwrap_or(d)
}

pub fn first_of_year(d: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(d.year(), 1, 1).unwrap_or(d)
}

/// Calendar month subtraction; day-of-month is clamped to the target month's end.
pub fn months_before(d: NaiveDate, months: u32) -> NaiveDate {
    d.checked_sub_months(Months::new(months)).unwrap_or(NaiveDate::MIN)
}

pub fn days_before(d: NaiveDate, days: u64) -> NaiveDate {
    d.checked_sub_days(Days::new(days)).unwrap_or(NaiveDate::MIN)
}
