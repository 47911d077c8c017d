//! Multi-horizon performance table across the whole index universe.

use crate::core::calendar::months_before;
use crate::core::convert::{FxMap, convert_series};
use crate::core::horizon::Horizon;
use crate::core::market_data::MarketData;
use crate::core::returns::{custom_return, horizon_return, round2};
use crate::core::series::PriceSeries;
use crate::core::universe::{INDICES, Region, TargetCurrency};
use chrono::NaiveDate;
use futures::future::join_all;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::fmt::Display;
use std::str::FromStr;
use tracing::{debug, info};

/// Converted price series per index name.
pub type ConvertedSeries = HashMap<String, PriceSeries>;

/// A column of the performance table that holds returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnColumn {
    Horizon(Horizon),
    Custom,
}

impl Display for ReturnColumn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReturnColumn::Horizon(h) => write!(f, "{h}"),
            ReturnColumn::Custom => write!(f, "Custom"),
        }
    }
}

impl FromStr for ReturnColumn {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("custom") {
            return Ok(ReturnColumn::Custom);
        }
        s.parse().map(ReturnColumn::Horizon)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceRow {
    pub name: String,
    pub region: Region,
    pub local_currency: String,
    /// Percentages rounded to two decimals; `None` when undeterminable.
    pub returns: BTreeMap<Horizon, Option<f64>>,
    pub custom: Option<f64>,
}

impl PerformanceRow {
    pub fn value(&self, column: ReturnColumn) -> Option<f64> {
        match column {
            ReturnColumn::Horizon(h) => self.returns.get(&h).copied().flatten(),
            ReturnColumn::Custom => self.custom,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PerformanceTable {
    pub target: String,
    pub as_of: NaiveDate,
    pub rows: Vec<PerformanceRow>,
}

impl PerformanceTable {
    pub fn row(&self, name: &str) -> Option<&PerformanceRow> {
        self.rows.iter().find(|r| r.name == name)
    }

    /// Fills the `Custom` column from previously converted series.
    ///
    /// Indices with no converted series get an absent value.
    pub fn with_custom_column(
        mut self,
        converted: &ConvertedSeries,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Self {
        for row in &mut self.rows {
            row.custom = converted
                .get(&row.name)
                .and_then(|series| custom_return(series, start, end, self.as_of))
                .map(round2);
        }
        self
    }

    /// Keeps only the rows of `region`.
    pub fn filter_region(mut self, region: Region) -> Self {
        self.rows.retain(|r| r.region == region);
        self
    }

    /// Orders rows by `column`. Absent values always sort last.
    pub fn sort_by(mut self, column: ReturnColumn, ascending: bool) -> Self {
        self.rows.sort_by(|a, b| match (a.value(column), b.value(column)) {
            (Some(x), Some(y)) => {
                let ord = x.partial_cmp(&y).unwrap_or(Ordering::Equal);
                if ascending { ord } else { ord.reverse() }
            }
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
        self
    }
}

/// Earliest date any fixed horizon needs: five years back plus a month of
/// slack so the own-date anchoring always finds a baseline.
pub fn lookback_start(today: NaiveDate) -> NaiveDate {
    months_before(today, 12 * 5 + 1)
}

/// Builds one row per configured index with a return for every fixed horizon.
///
/// Also returns the converted series of every index that produced data, so
/// the caller can compute the `Custom` column without fetching again.
/// `on_progress` is called once per fetched index.
pub async fn build_performance_table(
    market: &MarketData,
    target: &TargetCurrency,
    on_progress: &(dyn Fn() + Send + Sync),
) -> (PerformanceTable, ConvertedSeries) {
    let today = market.today();
    let start = lookback_start(today);
    info!("Building performance table in {target} from {start}");

    let fx_map = async {
        if target.is_local() {
            return FxMap::new();
        }
        let mut currencies: Vec<&str> = INDICES.iter().map(|def| def.currency).collect();
        currencies.extend(target.code());
        market.build_fx_map(currencies, start).await
    };

    let fetches = join_all(INDICES.iter().map(|def| async move {
        let series = market.fetch_series(def.ticker, start).await;
        on_progress();
        (def, series)
    }));

    let (fx_map, fetched) = tokio::join!(fx_map, fetches);

    let mut rows = Vec::with_capacity(INDICES.len());
    let mut converted = ConvertedSeries::new();

    for (def, local) in fetched {
        let mut row = PerformanceRow {
            name: def.name.to_string(),
            region: Region::of(def.name),
            local_currency: def.currency.to_string(),
            returns: Horizon::ALL.iter().map(|h| (*h, None)).collect(),
            custom: None,
        };

        if local.is_empty() {
            debug!("No data for {} ({}), leaving row empty", def.name, def.ticker);
            rows.push(row);
            continue;
        }

        let series = convert_series(&local, def.currency, target, &fx_map);
        for horizon in Horizon::ALL {
            row.returns
                .insert(horizon, horizon_return(&series, horizon).map(round2));
        }
        converted.insert(def.name.to_string(), series);
        rows.push(row);
    }

    rows.sort_by(|a, b| a.region.cmp(&b.region).then_with(|| a.name.cmp(&b.name)));

    let table = PerformanceTable {
        target: target.to_string(),
        as_of: today,
        rows,
    };
    (table, converted)
}
