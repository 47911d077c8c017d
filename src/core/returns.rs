//! Percentage returns over named horizons and custom date ranges.
//!
//! Every function here returns `None` when the return cannot be determined:
//! not enough history, a missing baseline, or a non-positive baseline.

use crate::core::calendar::{first_of_month, first_of_year, previous_business_day};
use crate::core::horizon::Horizon;
use crate::core::series::PriceSeries;
use chrono::{Datelike, NaiveDate};

fn pct_change(baseline: f64, current: f64) -> Option<f64> {
    if baseline <= 0.0 {
        return None;
    }
    let change = (current / baseline - 1.0) * 100.0;
    change.is_finite().then_some(change)
}

/// Rounds a percentage to two decimals for display.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Return of `series` over `horizon`, anchored to the series' own last date.
pub fn horizon_return(series: &PriceSeries, horizon: Horizon) -> Option<f64> {
    let (last_date, last) = series.last()?;
    match horizon {
        Horizon::OneDay => {
            let points = series.points();
            if points.len() < 2 {
                return None;
            }
            pct_change(points[points.len() - 2].1, last)
        }
        Horizon::MonthToDate => pct_change(series.last_before(first_of_month(last_date))?, last),
        Horizon::YearToDate => pct_change(series.last_before(first_of_year(last_date))?, last),
        Horizon::OneWeek | Horizon::OneYear | Horizon::ThreeYears | Horizon::FiveYears => {
            let start = horizon.offset_start(last_date)?;
            let (_, baseline) = series.since(start).first()?;
            pct_change(baseline, last)
        }
    }
}

/// Default custom window: last business day before January 1st of the
/// current year, through today.
pub fn default_custom_window(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    (previous_business_day(first_of_year(today)), today)
}

/// Resolves the effective `[start, end]` of a custom window.
///
/// Falls back to [`default_custom_window`] when either bound is missing or
/// when `start` is after `end`. A start on December 31st with an end in the
/// following year is moved to January 1st of that year.
pub fn resolve_custom_window(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    today: NaiveDate,
) -> (NaiveDate, NaiveDate) {
    let (start, end) = match (start, end) {
        (Some(start), Some(end)) if start <= end => (start, end),
        _ => default_custom_window(today),
    };

    if start.month() == 12 && start.day() == 31 && end.year() == start.year() + 1 {
        let jan_first = NaiveDate::from_ymd_opt(end.year(), 1, 1).unwrap_or(start);
        return (jan_first, end);
    }
    (start, end)
}

/// Return between the last close strictly before `start` and the last close
/// on or before `end`.
pub fn custom_return(
    series: &PriceSeries,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    today: NaiveDate,
) -> Option<f64> {
    if series.is_empty() {
        return None;
    }
    let (start, end) = resolve_custom_window(start, end, today);
    let baseline = series.last_before(start)?;
    let current = series.last_on_or_before(end)?;
    pct_change(baseline, current)
}
