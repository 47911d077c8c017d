//! Currency conversion of price series through a USD pivot.

use crate::core::series::PriceSeries;
use crate::core::universe::TargetCurrency;
use std::collections::HashMap;
use tracing::debug;

/// USD value of one unit of each currency, keyed by currency code.
pub type FxMap = HashMap<String, PriceSeries>;

/// Converts `series`, quoted in `local_currency`, into `target`.
///
/// Each price is multiplied by `usd_per_local / usd_per_target`, with both
/// FX legs forward-filled onto the series' own dates. Dates where either leg
/// has no prior observation are dropped. A `LOCAL` target, or a target equal
/// to the local currency, returns the input unchanged.
pub fn convert_series(
    series: &PriceSeries,
    local_currency: &str,
    target: &TargetCurrency,
    fx_map: &FxMap,
) -> PriceSeries {
    let target_currency = match target.code() {
        None => return series.clone(),
        Some(code) if code == local_currency => return series.clone(),
        Some(code) => code,
    };

    let (Some(usd_local), Some(usd_target)) =
        (fx_map.get(local_currency), fx_map.get(target_currency))
    else {
        debug!(
            "Missing FX leg for {local_currency} -> {target_currency}, no converted values",
        );
        return PriceSeries::new();
    };

    let dates: Vec<_> = series.dates().collect();
    let local_legs = usd_local.forward_fill_onto(&dates);
    let target_legs = usd_target.forward_fill_onto(&dates);

    series
        .points()
        .iter()
        .zip(local_legs.into_iter().zip(target_legs))
        .filter_map(|((date, price), legs)| match legs {
            (Some(local), Some(target)) => Some((*date, price * (local / target))),
            _ => None,
        })
        .collect()
}
