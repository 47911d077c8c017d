//! Cached access to equity price histories and USD exchange rates.
//!
//! This is where upstream failures stop: a provider error is logged and
//! becomes an empty series, so callers only ever see data or its absence.

use crate::core::cache::{Cache, Clock, SingleFlight};
use crate::core::calendar::business_days;
use crate::core::convert::FxMap;
use crate::core::price::PriceProvider;
use crate::core::series::PriceSeries;
use crate::core::universe::HARD_CURRENCIES;
use crate::store::memory::MemoryCache;
use chrono::NaiveDate;
use futures::future::join_all;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Default freshness window for fetched series.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60 * 60);

/// Cache key of a fetched series: symbol or currency, and start date.
pub type SeriesKey = (String, NaiveDate);

pub type SeriesCache = Arc<dyn Cache<SeriesKey, PriceSeries>>;

pub struct MarketData {
    provider: Arc<dyn PriceProvider>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    prices: SingleFlight<SeriesKey, PriceSeries>,
    rates: SingleFlight<SeriesKey, PriceSeries>,
}

impl MarketData {
    /// Market data cached in memory against `clock`.
    pub fn new(provider: Arc<dyn PriceProvider>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        let prices: SeriesCache = Arc::new(MemoryCache::<SeriesKey, PriceSeries>::with_clock(
            Arc::clone(&clock),
        ));
        let rates: SeriesCache = Arc::new(MemoryCache::<SeriesKey, PriceSeries>::with_clock(
            Arc::clone(&clock),
        ));
        Self::with_storage(provider, clock, ttl, prices, rates)
    }

    /// Market data cached in the given storage, one for price histories and
    /// one for USD rates.
    pub fn with_storage(
        provider: Arc<dyn PriceProvider>,
        clock: Arc<dyn Clock>,
        ttl: Duration,
        prices: SeriesCache,
        rates: SeriesCache,
    ) -> Self {
        Self {
            provider,
            clock,
            ttl,
            prices: SingleFlight::new(prices),
            rates: SingleFlight::new(rates),
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Daily adjusted closes for `ticker` from `start` through today.
    ///
    /// Results, empty ones included, are cached per `(ticker, start)` for the
    /// freshness window.
    #[instrument(name = "FetchSeries", skip(self), fields(ticker = %ticker, start = %start))]
    pub async fn fetch_series(&self, ticker: &str, start: NaiveDate) -> PriceSeries {
        let key = (ticker.to_string(), start);
        self.prices
            .get_or_fetch(key, Some(self.ttl), || self.fetch_uncached(ticker, start))
            .await
    }

    async fn fetch_uncached(&self, symbol: &str, start: NaiveDate) -> PriceSeries {
        let end = self.today();
        match self.provider.fetch_history(symbol, start, end).await {
            Ok(series) => {
                debug!("Fetched {} observations for {}", series.len(), symbol);
                series
            }
            Err(e) => {
                warn!("Price history fetch failed for {}: {:#}", symbol, e);
                PriceSeries::new()
            }
        }
    }

    /// USD value of one unit of `currency`, daily from `start` through today.
    ///
    /// USD is a constant 1.0 on business days. Other currencies try the
    /// direct `CCYUSD=X` quote first and fall back to inverting `USDCCY=X`.
    /// Cached like [`MarketData::fetch_series`].
    #[instrument(name = "FetchUsdRate", skip(self), fields(currency = %currency, start = %start))]
    pub async fn usd_per_currency(&self, currency: &str, start: NaiveDate) -> PriceSeries {
        if currency == "USD" {
            return PriceSeries::constant(business_days(start, self.today()), 1.0);
        }

        let key = (currency.to_string(), start);
        self.rates
            .get_or_fetch(key, Some(self.ttl), || async {
                let direct = self
                    .fetch_uncached(&format!("{currency}USD=X"), start)
                    .await;
                if !direct.is_empty() {
                    return direct;
                }

                debug!("No direct quote for {currency}USD, trying inverse");
                let inverse = self
                    .fetch_uncached(&format!("USD{currency}=X"), start)
                    .await;
                if inverse.is_empty() {
                    warn!("No USD rate available for {}", currency);
                }
                inverse.map_values(|rate| 1.0 / rate)
            })
            .await
    }

    /// Fetches USD rates for `currencies` plus the hard currencies.
    pub async fn build_fx_map<'a, I>(&self, currencies: I, start: NaiveDate) -> FxMap
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut wanted: BTreeSet<&str> = HARD_CURRENCIES.into_iter().collect();
        wanted.extend(currencies);

        let futures = wanted.into_iter().map(|currency| async move {
            (currency.to_string(), self.usd_per_currency(currency, start).await)
        });

        join_all(futures).await.into_iter().collect()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::core::cache::ManualClock;
    use anyhow::{Result, anyhow};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    pub(crate) fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Serves canned series per symbol and records every request.
    #[derive(Default)]
    pub(crate) struct MockPriceProvider {
        series: HashMap<String, PriceSeries>,
        failing: Vec<String>,
        pub(crate) requests: Mutex<Vec<String>>,
    }

    impl MockPriceProvider {
        pub(crate) fn with_series(mut self, symbol: &str, series: PriceSeries) -> Self {
            self.series.insert(symbol.to_string(), series);
            self
        }

        pub(crate) fn with_failure(mut self, symbol: &str) -> Self {
            self.failing.push(symbol.to_string());
            self
        }

        pub(crate) fn request_count(&self, symbol: &str) -> usize {
            self.requests
                .lock()
                .unwrap()
                .iter()
                .filter(|s| *s == symbol)
                .count()
        }
    }

    #[async_trait]
    impl PriceProvider for MockPriceProvider {
        async fn fetch_history(
            &self,
            symbol: &str,
            start: NaiveDate,
            end: NaiveDate,
        ) -> Result<PriceSeries> {
            self.requests.lock().unwrap().push(symbol.to_string());
            if self.failing.iter().any(|s| s == symbol) {
                return Err(anyhow!("Request error for symbol: {}", symbol));
            }
            Ok(self
                .series
                .get(symbol)
                .map(|s| {
                    s.points()
                        .iter()
                        .filter(|(d, _)| *d >= start && *d <= end)
                        .copied()
                        .collect()
                })
                .unwrap_or_default())
        }
    }

    pub(crate) fn market_data(
        provider: MockPriceProvider,
        today: NaiveDate,
    ) -> (MarketData, Arc<MockPriceProvider>, Arc<ManualClock>) {
        let provider = Arc::new(provider);
        let clock = Arc::new(ManualClock::at_date(today));
        let market = MarketData::new(provider.clone(), clock.clone(), DEFAULT_CACHE_TTL);
        (market, provider, clock)
    }

    /// Storage that never expires and records every write.
    #[derive(Default)]
    struct RecordingCache {
        entries: Mutex<HashMap<SeriesKey, PriceSeries>>,
        puts: Mutex<Vec<(SeriesKey, Option<Duration>)>>,
    }

    #[async_trait]
    impl Cache<SeriesKey, PriceSeries> for RecordingCache {
        async fn get(&self, key: &SeriesKey) -> Option<PriceSeries> {
            self.entries.lock().unwrap().get(key).cloned()
        }

        async fn put(&self, key: SeriesKey, value: PriceSeries, ttl: Option<Duration>) {
            self.puts.lock().unwrap().push((key.clone(), ttl));
            self.entries.lock().unwrap().insert(key, value);
        }
    }

    #[tokio::test]
    async fn test_storage_is_injectable() {
        let seeded = PriceSeries::from_points(vec![(date(2024, 6, 14), 42.0)]);
        let prices = Arc::new(RecordingCache::default());
        prices
            .entries
            .lock()
            .unwrap()
            .insert(("^GSPC".to_string(), date(2024, 1, 1)), seeded.clone());
        let rates = Arc::new(RecordingCache::default());

        let provider = Arc::new(
            MockPriceProvider::default()
                .with_series("^GDAXI", PriceSeries::from_points(vec![(date(2024, 6, 14), 1.0)])),
        );
        let market = MarketData::with_storage(
            provider.clone(),
            Arc::new(ManualClock::at_date(date(2024, 6, 15))),
            Duration::from_secs(90),
            prices.clone(),
            rates.clone(),
        );

        // Served from storage without touching the provider.
        assert_eq!(market.fetch_series("^GSPC", date(2024, 1, 1)).await, seeded);
        assert_eq!(provider.request_count("^GSPC"), 0);

        // A miss is fetched once and written back with the configured TTL.
        market.fetch_series("^GDAXI", date(2024, 1, 1)).await;
        assert_eq!(
            *prices.puts.lock().unwrap(),
            vec![(
                ("^GDAXI".to_string(), date(2024, 1, 1)),
                Some(Duration::from_secs(90))
            )]
        );

        // USD rates go to their own storage.
        market.usd_per_currency("EUR", date(2024, 6, 1)).await;
        assert_eq!(rates.puts.lock().unwrap().len(), 1);
        assert_eq!(prices.puts.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_series_is_cached_within_ttl() {
        let series =
            PriceSeries::from_points(vec![(date(2024, 6, 13), 10.0), (date(2024, 6, 14), 11.0)]);
        let (market, provider, clock) = market_data(
            MockPriceProvider::default().with_series("^GSPC", series.clone()),
            date(2024, 6, 15),
        );

        assert_eq!(market.fetch_series("^GSPC", date(2024, 1, 1)).await, series);
        assert_eq!(market.fetch_series("^GSPC", date(2024, 1, 1)).await, series);
        assert_eq!(provider.request_count("^GSPC"), 1);

        // A different start date is a different key.
        market.fetch_series("^GSPC", date(2024, 2, 1)).await;
        assert_eq!(provider.request_count("^GSPC"), 2);

        clock.advance(DEFAULT_CACHE_TTL);
        market.fetch_series("^GSPC", date(2024, 1, 1)).await;
        assert_eq!(provider.request_count("^GSPC"), 3);
    }

    #[tokio::test]
    async fn test_concurrent_fetches_share_one_request() {
        let series = PriceSeries::from_points(vec![(date(2024, 6, 14), 11.0)]);
        let (market, provider, _clock) = market_data(
            MockPriceProvider::default().with_series("^N225", series),
            date(2024, 6, 15),
        );

        let start = date(2024, 1, 1);
        let (a, b, c) = tokio::join!(
            market.fetch_series("^N225", start),
            market.fetch_series("^N225", start),
            market.fetch_series("^N225", start),
        );
        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_eq!(provider.request_count("^N225"), 1);
    }

    #[tokio::test]
    async fn test_failed_fetch_degrades_to_empty() {
        let (market, provider, _clock) = market_data(
            MockPriceProvider::default().with_failure("^BAD"),
            date(2024, 6, 15),
        );
        assert!(market.fetch_series("^BAD", date(2024, 1, 1)).await.is_empty());
        assert!(market.fetch_series("^BAD", date(2024, 1, 1)).await.is_empty());
        assert_eq!(provider.request_count("^BAD"), 1);
    }

    #[tokio::test]
    async fn test_usd_is_constant_without_network() {
        let (market, provider, _clock) =
            market_data(MockPriceProvider::default(), date(2024, 6, 14));
        let usd = market.usd_per_currency("USD", date(2024, 6, 7)).await;

        assert_eq!(usd.len(), 6);
        assert!(usd.points().iter().all(|(_, v)| *v == 1.0));
        assert_eq!(usd.first().unwrap().0, date(2024, 6, 7));
        assert_eq!(usd.last().unwrap().0, date(2024, 6, 14));
        assert!(provider.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_direct_quote_preferred() {
        let direct = PriceSeries::from_points(vec![(date(2024, 6, 14), 1.07)]);
        let (market, provider, _clock) = market_data(
            MockPriceProvider::default().with_series("EURUSD=X", direct.clone()),
            date(2024, 6, 15),
        );
        assert_eq!(market.usd_per_currency("EUR", date(2024, 6, 1)).await, direct);
        assert_eq!(provider.request_count("USDEUR=X"), 0);
    }

    #[tokio::test]
    async fn test_inverse_quote_is_inverted() {
        let inverse =
            PriceSeries::from_points(vec![(date(2024, 6, 13), 157.0), (date(2024, 6, 14), 160.0)]);
        let (market, provider, _clock) = market_data(
            MockPriceProvider::default().with_series("USDJPY=X", inverse),
            date(2024, 6, 15),
        );

        let jpy = market.usd_per_currency("JPY", date(2024, 6, 1)).await;
        assert_eq!(
            jpy.points(),
            &[(date(2024, 6, 13), 1.0 / 157.0), (date(2024, 6, 14), 1.0 / 160.0)]
        );
        assert_eq!(provider.request_count("JPYUSD=X"), 1);

        // Cached as a whole: neither leg is requested again.
        market.usd_per_currency("JPY", date(2024, 6, 1)).await;
        assert_eq!(provider.request_count("JPYUSD=X"), 1);
        assert_eq!(provider.request_count("USDJPY=X"), 1);
    }

    #[tokio::test]
    async fn test_missing_currency_is_empty() {
        let (market, _provider, _clock) =
            market_data(MockPriceProvider::default(), date(2024, 6, 15));
        assert!(market.usd_per_currency("XYZ", date(2024, 6, 1)).await.is_empty());
    }

    #[tokio::test]
    async fn test_fx_map_includes_hard_currencies() {
        let (market, _provider, _clock) =
            market_data(MockPriceProvider::default(), date(2024, 6, 15));
        let fx = market.build_fx_map(["SEK", "EUR"], date(2024, 6, 1)).await;

        let mut keys: Vec<_> = fx.keys().cloned().collect();
        keys.sort();
        assert_eq!(keys, vec!["CHF", "EUR", "GBP", "JPY", "SEK", "USD"]);
        assert!(!fx["USD"].is_empty());
        assert!(fx["SEK"].is_empty());
    }
}
