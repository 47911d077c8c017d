//! Calendar alignment of several series onto one shared date index.

use crate::core::series::PriceSeries;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeSet;

/// A named column of values aligned to the frame's dates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

/// Several series aligned on the union of their dates.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Frame {
    pub dates: Vec<NaiveDate>,
    pub columns: Vec<Column>,
}

impl Frame {
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty() || self.columns.is_empty()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// Unions the dates of all `series` and forward-fills each one onto them.
///
/// Column order follows the input order. A column is `None` on dates before
/// its own first observation.
pub fn align<'a, I>(series: I) -> Frame
where
    I: IntoIterator<Item = (&'a str, &'a PriceSeries)>,
{
    let series: Vec<(&str, &PriceSeries)> = series.into_iter().collect();
    let dates: Vec<NaiveDate> = series
        .iter()
        .flat_map(|(_, s)| s.dates())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let columns = series
        .iter()
        .map(|(name, s)| Column {
            name: name.to_string(),
            values: s.forward_fill_onto(&dates),
        })
        .collect();

    Frame { dates, columns }
}
