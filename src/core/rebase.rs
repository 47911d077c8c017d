//! Rebased (=100) comparison series for a selection of indices.

use crate::core::calendar::{days_before, months_before};
use crate::core::convert::{FxMap, convert_series};
use crate::core::frame::{Frame, align};
use crate::core::horizon::Horizon;
use crate::core::market_data::MarketData;
use crate::core::series::PriceSeries;
use crate::core::universe::{IndexDefinition, TargetCurrency, find_index};
use chrono::NaiveDate;
use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Serialize)]
pub struct RebasedTable {
    pub target: String,
    pub horizon: Horizon,
    pub window_start: NaiveDate,
    pub frame: Frame,
}

/// First date shown for `horizon` on a chart ending `today`.
///
/// 1D has no window of its own and shows the last ten days.
pub fn comparison_start(horizon: Horizon, today: NaiveDate) -> NaiveDate {
    horizon
        .window_start(today)
        .unwrap_or_else(|| days_before(today, 10))
}

/// Divides every column by its own first present value and scales to 100.
pub fn rebase_to_100(mut frame: Frame) -> Frame {
    for column in &mut frame.columns {
        let Some(base) = column.values.iter().flatten().copied().next() else {
            continue;
        };
        for value in column.values.iter_mut().flatten() {
            *value = *value / base * 100.0;
        }
    }
    frame
}

/// Rebased series of the selected indices on a shared calendar.
///
/// Unknown names and indices without data after conversion are left out.
/// Returns `None` when nothing is left.
pub async fn build_rebased_table(
    market: &MarketData,
    names: &[String],
    target: &TargetCurrency,
    horizon: Horizon,
) -> Option<RebasedTable> {
    let selected: Vec<&IndexDefinition> = names
        .iter()
        .filter_map(|name| {
            let def = find_index(name);
            if def.is_none() {
                warn!("Unknown index {}, skipping", name);
            }
            def
        })
        .collect();
    if selected.is_empty() {
        return None;
    }

    let today = market.today();
    let start = comparison_start(horizon, today);
    let fetch_start = months_before(start, 1);
    info!("Rebasing {} indices in {target} from {start}", selected.len());

    let fx_map = async {
        if target.is_local() {
            return FxMap::new();
        }
        let mut currencies: Vec<&str> = selected.iter().map(|def| def.currency).collect();
        currencies.extend(target.code());
        market.build_fx_map(currencies, fetch_start).await
    };
    let fetches = join_all(
        selected
            .iter()
            .map(|def| async move { (*def, market.fetch_series(def.ticker, fetch_start).await) }),
    );
    let (fx_map, fetched) = tokio::join!(fx_map, fetches);

    let trimmed: Vec<(&str, PriceSeries)> = fetched
        .into_iter()
        .filter_map(|(def, local)| {
            let series = convert_series(&local, def.currency, target, &fx_map).since(start);
            if series.is_empty() {
                debug!("No data for {} in window, omitting", def.name);
                return None;
            }
            Some((def.name, series))
        })
        .collect();

    if trimmed.is_empty() {
        return None;
    }

    let frame = align(trimmed.iter().map(|(name, series)| (*name, series)));
    Some(RebasedTable {
        target: target.to_string(),
        horizon,
        window_start: start,
        frame: rebase_to_100(frame),
    })
}
