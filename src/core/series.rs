//! Date-indexed daily price series.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Ordered daily observations for one instrument.
///
/// Dates are strictly increasing and unique. Values are finite; gaps in the
/// calendar are represented by missing dates rather than placeholder values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    points: Vec<(NaiveDate, f64)>,
}

impl PriceSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a series from arbitrary points.
    ///
    /// Points are sorted by date, non-finite values are dropped and, for
    /// duplicate dates, the last point given wins.
    pub fn from_points<I>(points: I) -> Self
    where
        I: IntoIterator<Item = (NaiveDate, f64)>,
    {
        let mut points: Vec<(NaiveDate, f64)> =
            points.into_iter().filter(|(_, v)| v.is_finite()).collect();
        // Stable sort keeps input order among equal dates, so keeping the
        // last of each run keeps the last point given.
        points.sort_by_key(|(d, _)| *d);
        let mut deduped: Vec<(NaiveDate, f64)> = Vec::with_capacity(points.len());
        for (date, value) in points {
            match deduped.last_mut() {
                Some(last) if last.0 == date => last.1 = value,
                _ => deduped.push((date, value)),
            }
        }
        Self { points: deduped }
    }

    /// Builds a series from optional values, skipping absent ones.
    pub fn from_optional_points<I>(points: I) -> Self
    where
        I: IntoIterator<Item = (NaiveDate, Option<f64>)>,
    {
        Self::from_points(points.into_iter().filter_map(|(d, v)| v.map(|v| (d, v))))
    }

    /// A series holding `value` on every given date.
    pub fn constant(dates: impl IntoIterator<Item = NaiveDate>, value: f64) -> Self {
        Self::from_points(dates.into_iter().map(|d| (d, value)))
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn points(&self) -> &[(NaiveDate, f64)] {
        &self.points
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.points.iter().map(|(d, _)| *d)
    }

    pub fn first(&self) -> Option<(NaiveDate, f64)> {
        self.points.first().copied()
    }

    pub fn last(&self) -> Option<(NaiveDate, f64)> {
        self.points.last().copied()
    }

    /// Value on exactly `date`, if observed.
    pub fn get(&self, date: NaiveDate) -> Option<f64> {
        self.points
            .binary_search_by_key(&date, |(d, _)| *d)
            .ok()
            .map(|i| self.points[i].1)
    }

    /// Last value strictly before `date`.
    pub fn last_before(&self, date: NaiveDate) -> Option<f64> {
        let idx = self.points.partition_point(|(d, _)| *d < date);
        idx.checked_sub(1).map(|i| self.points[i].1)
    }

    /// Last value on or before `date`.
    pub fn last_on_or_before(&self, date: NaiveDate) -> Option<f64> {
        let idx = self.points.partition_point(|(d, _)| *d <= date);
        idx.checked_sub(1).map(|i| self.points[i].1)
    }

    /// Observations dated on or after `date`.
    pub fn since(&self, date: NaiveDate) -> PriceSeries {
        let idx = self.points.partition_point(|(d, _)| *d < date);
        PriceSeries {
            points: self.points[idx..].to_vec(),
        }
    }

    /// Carries the last observation forward onto each of `dates`.
    ///
    /// `dates` must be ascending. Dates preceding the first observation
    /// resolve to `None`.
    pub fn forward_fill_onto(&self, dates: &[NaiveDate]) -> Vec<Option<f64>> {
        let mut filled = Vec::with_capacity(dates.len());
        let mut cursor = 0;
        let mut carried = None;
        for date in dates {
            while cursor < self.points.len() && self.points[cursor].0 <= *date {
                carried = Some(self.points[cursor].1);
                cursor += 1;
            }
            filled.push(carried);
        }
        filled
    }

    /// Applies `f` to every value, dropping results that are not finite.
    pub fn map_values(&self, f: impl Fn(f64) -> f64) -> PriceSeries {
        PriceSeries {
            points: self
                .points
                .iter()
                .map(|(d, v)| (*d, f(*v)))
                .filter(|(_, v)| v.is_finite())
                .collect(),
        }
    }
}

impl FromIterator<(NaiveDate, f64)> for PriceSeries {
    fn from_iter<T: IntoIterator<Item = (NaiveDate, f64)>>(iter: T) -> Self {
        Self::from_points(iter)
    }
}
