//! Upstream price history abstraction

use crate::core::series::PriceSeries;
use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Daily closes for `symbol` in `[start, end]`, adjusted where the source
    /// offers it.
    ///
    /// An unknown symbol or an empty range is `Ok` with an empty series;
    /// `Err` is reserved for transport and decoding failures.
    async fn fetch_history(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries>;
}
