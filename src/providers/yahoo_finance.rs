use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Days, NaiveDate, NaiveTime};
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::core::{PriceProvider, PriceSeries};

fn unix_midnight(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp()
}

/// Picks adjusted closes when the response carries them, raw closes
/// otherwise, and dates each bar in the exchange's own time zone.
fn extract_series(item: &PriceChartItem) -> PriceSeries {
    let Some(timestamps) = item.timestamp.as_ref() else {
        return PriceSeries::new();
    };
    let Some(indicators) = item.indicators.as_ref() else {
        return PriceSeries::new();
    };

    let adjusted = indicators
        .adjclose
        .as_ref()
        .and_then(|a| a.first())
        .and_then(|a| a.adjclose.as_ref())
        .filter(|values| !values.is_empty());
    let closes = adjusted.or_else(|| {
        indicators
            .quote
            .first()
            .and_then(|q| q.close.as_ref())
    });
    let Some(closes) = closes else {
        return PriceSeries::new();
    };

    let offset = item.meta.gmt_offset.unwrap_or(0);
    PriceSeries::from_optional_points(timestamps.iter().zip(closes).filter_map(|(ts, close)| {
        DateTime::from_timestamp(ts + offset, 0).map(|dt| (dt.date_naive(), *close))
    }))
}

pub struct YahooFinanceProvider {
    base_url: String,
    client: reqwest::Client,
}

impl YahooFinanceProvider {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("weidash/0.1")
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(YahooFinanceProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[derive(Deserialize, Debug)]
struct YahooChartResponse {
    chart: PriceChartResult,
}

#[derive(Deserialize, Debug)]
struct PriceChartResult {
    result: Option<Vec<PriceChartItem>>,
    error: Option<ChartError>,
}

#[derive(Deserialize, Debug)]
struct ChartError {
    code: String,
    description: Option<String>,
}

#[derive(Deserialize, Debug)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Quote>,
    adjclose: Option<Vec<AdjClose>>,
}

#[derive(Deserialize, Debug)]
struct Quote {
    close: Option<Vec<Option<f64>>>,
}

#[derive(Deserialize, Debug)]
struct AdjClose {
    adjclose: Option<Vec<Option<f64>>>,
}

#[derive(Deserialize, Debug)]
struct PriceChartItem {
    meta: PriceChartMeta,
    timestamp: Option<Vec<i64>>,
    indicators: Option<Indicators>,
}

#[derive(Deserialize, Debug)]
struct PriceChartMeta {
    #[serde(alias = "gmtoffset")]
    gmt_offset: Option<i64>,
}

#[async_trait]
impl PriceProvider for YahooFinanceProvider {
    #[instrument(
        name = "YahooHistoryFetch",
        skip(self),
        fields(symbol = %symbol)
    )]
    async fn fetch_history(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries> {
        let period2 = end.checked_add_days(Days::new(1)).unwrap_or(end);
        let url = format!(
            "{}/v8/finance/chart/{}?period1={}&period2={}&interval=1d&events=div%2Csplit&includeAdjustedClose=true",
            self.base_url,
            symbol,
            unix_midnight(start),
            unix_midnight(period2)
        );
        debug!("Requesting price history from {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {} for symbol: {} URL: {}", e, symbol, url))?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!("Symbol {} not found upstream", symbol);
            return Ok(PriceSeries::new());
        }
        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error: {} for symbol: {}",
                response.status(),
                symbol
            ));
        }

        let text = response.text().await?;
        let data: YahooChartResponse = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse JSON response for {}: {}", symbol, e))?;

        if let Some(error) = data.chart.error {
            debug!(
                "Yahoo returned {} for {}: {}",
                error.code,
                symbol,
                error.description.unwrap_or_default()
            );
            return Ok(PriceSeries::new());
        }

        let Some(item) = data.chart.result.and_then(|r| r.into_iter().next()) else {
            return Ok(PriceSeries::new());
        };

        Ok(extract_series(&item)
            .since(start)
            .points()
            .iter()
            .filter(|(d, _)| *d <= end)
            .copied()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    pub async fn create_mock_server(symbol: &str, status: u16, mock_response: &str) -> MockServer {
        let mock_server = MockServer::start().await;
        let request_path = format!("/v8/finance/chart/{symbol}");

        Mock::given(method("GET"))
            .and(path(request_path))
            .and(query_param("interval", "1d"))
            .respond_with(ResponseTemplate::new(status).set_body_string(mock_response))
            .mount(&mock_server)
            .await;

        mock_server
    }

    fn provider(server: &MockServer) -> YahooFinanceProvider {
        YahooFinanceProvider::new(&server.uri(), Duration::from_secs(5)).unwrap()
    }

    // 2024-06-12/13/14 13:30 UTC, New York open.
    const TS: [i64; 3] = [1718199000, 1718285400, 1718371800];

    #[tokio::test]
    async fn test_history_prefers_adjusted_close() {
        let mock_response = format!(
            r#"{{
                "chart": {{
                    "result": [{{
                        "meta": {{ "currency": "USD", "gmtoffset": -14400 }},
                        "timestamp": [{}, {}, {}],
                        "indicators": {{
                            "quote": [{{ "close": [101.0, 102.0, 103.0] }}],
                            "adjclose": [{{ "adjclose": [100.5, null, 102.5] }}]
                        }}
                    }}],
                    "error": null
                }}
            }}"#,
            TS[0], TS[1], TS[2]
        );
        let server = create_mock_server("AAPL", 200, &mock_response).await;

        let series = provider(&server)
            .fetch_history("AAPL", date(2024, 6, 1), date(2024, 6, 15))
            .await
            .unwrap();

        assert_eq!(
            series.points(),
            &[(date(2024, 6, 12), 100.5), (date(2024, 6, 14), 102.5)]
        );
    }

    #[tokio::test]
    async fn test_history_falls_back_to_close() {
        let mock_response = format!(
            r#"{{
                "chart": {{
                    "result": [{{
                        "meta": {{ "currency": "USD" }},
                        "timestamp": [{}, {}],
                        "indicators": {{ "quote": [{{ "close": [1.07, 1.08] }}] }}
                    }}]
                }}
            }}"#,
            TS[0], TS[1]
        );
        let server = create_mock_server("EURUSD=X", 200, &mock_response).await;

        let series = provider(&server)
            .fetch_history("EURUSD=X", date(2024, 6, 1), date(2024, 6, 15))
            .await
            .unwrap();

        assert_eq!(
            series.points(),
            &[(date(2024, 6, 12), 1.07), (date(2024, 6, 13), 1.08)]
        );
    }

    #[tokio::test]
    async fn test_history_trims_to_requested_range() {
        let mock_response = format!(
            r#"{{
                "chart": {{
                    "result": [{{
                        "meta": {{}},
                        "timestamp": [{}, {}, {}],
                        "indicators": {{ "quote": [{{ "close": [1.0, 2.0, 3.0] }}] }}
                    }}]
                }}
            }}"#,
            TS[0], TS[1], TS[2]
        );
        let server = create_mock_server("SPY", 200, &mock_response).await;

        let series = provider(&server)
            .fetch_history("SPY", date(2024, 6, 13), date(2024, 6, 13))
            .await
            .unwrap();

        assert_eq!(series.points(), &[(date(2024, 6, 13), 2.0)]);
    }

    #[tokio::test]
    async fn test_unknown_symbol_is_empty() {
        let mock_response = r#"{
            "chart": {
                "result": null,
                "error": { "code": "Not Found", "description": "No data found, symbol may be delisted" }
            }
        }"#;
        let server = create_mock_server("INVALID", 404, mock_response).await;

        let series = provider(&server)
            .fetch_history("INVALID", date(2024, 6, 1), date(2024, 6, 15))
            .await
            .unwrap();
        assert!(series.is_empty());
    }

    #[tokio::test]
    async fn test_empty_result_is_empty() {
        let server = create_mock_server("EMPTY", 200, r#"{"chart": {"result": []}}"#).await;

        let series = provider(&server)
            .fetch_history("EMPTY", date(2024, 6, 1), date(2024, 6, 15))
            .await
            .unwrap();
        assert!(series.is_empty());
    }

    #[tokio::test]
    async fn test_server_error_is_reported() {
        let server = create_mock_server("AAPL", 500, "").await;

        let result = provider(&server)
            .fetch_history("AAPL", date(2024, 6, 1), date(2024, 6, 15))
            .await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "HTTP error: 500 Internal Server Error for symbol: AAPL"
        );
    }

    #[tokio::test]
    async fn test_malformed_response_is_reported() {
        let server = create_mock_server("AAPL", 200, r#"{"charts": {"result": []}}"#).await;

        let result = provider(&server)
            .fetch_history("AAPL", date(2024, 6, 1), date(2024, 6, 15))
            .await;
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to parse JSON response for AAPL")
        );
    }
}
