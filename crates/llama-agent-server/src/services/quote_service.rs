use crate::agent::{QuoteError, QuoteProvider, QuoteSnapshot};
use crate::config::QuotesConfig;
use crate::utils::http::build_client;
use anyhow::{Context, Result};
use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

/// Keys the API uses instead of data when the caller is throttled
const RATE_LIMIT_KEYS: [&str; 2] = ["Note", "Information"];

#[derive(Debug, Deserialize)]
struct IntradayBar {
    #[serde(rename = "1. open")]
    open: String,
    #[serde(rename = "2. high")]
    high: String,
    #[serde(rename = "3. low")]
    low: String,
    #[serde(rename = "4. close")]
    close: String,
    #[serde(rename = "5. volume")]
    volume: String,
}

/// Alpha Vantage `TIME_SERIES_INTRADAY` client
#[derive(Clone)]
pub struct AlphaVantageClient {
    client: Client,
    config: QuotesConfig,
}

impl AlphaVantageClient {
    pub fn new(config: QuotesConfig) -> Result<Self> {
        let client = build_client(config.timeout_seconds, None)
            .context("Failed to create HTTP client for quotes")?;
        Ok(Self { client, config })
    }

    fn series_key(&self) -> String {
        format!("Time Series ({})", self.config.interval)
    }

    fn request_url(&self, symbol: &str) -> Result<Url, QuoteError> {
        Url::parse_with_params(
            &self.config.base_url,
            &[
                ("function", "TIME_SERIES_INTRADAY"),
                ("symbol", symbol),
                ("interval", self.config.interval.as_str()),
                ("apikey", self.config.api_key.as_str()),
            ],
        )
        .map_err(|e| QuoteError::Transport(format!("invalid quote endpoint: {}", e)))
    }

    pub async fn fetch_intraday(&self, symbol: &str) -> Result<QuoteSnapshot, QuoteError> {
        let url = self.request_url(symbol)?;
        debug!("Requesting intraday series for {}", symbol);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| QuoteError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(QuoteError::Status(status.as_u16()));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| QuoteError::Malformed(e.to_string()))?;

        parse_intraday(symbol, &self.series_key(), &body)
    }
}

/// Pick the latest bar from an intraday payload.
///
/// Timestamps are `YYYY-MM-DD HH:MM:SS`, so the greatest key is the most
/// recent regardless of the order the API listed them in.
pub fn parse_intraday(symbol: &str, series_key: &str, body: &Value) -> Result<QuoteSnapshot, QuoteError> {
    if let Some(series) = body.get(series_key) {
        let series: BTreeMap<String, IntradayBar> = serde_json::from_value(series.clone())
            .map_err(|e| QuoteError::Malformed(e.to_string()))?;

        let (timestamp, bar) = series.into_iter().next_back().ok_or(QuoteError::NoData)?;
        return Ok(QuoteSnapshot {
            symbol: symbol.to_string(),
            timestamp,
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume,
        });
    }

    if RATE_LIMIT_KEYS.iter().any(|key| body.get(key).is_some()) {
        return Err(QuoteError::RateLimited);
    }

    Err(QuoteError::NoData)
}

#[async_trait::async_trait]
impl QuoteProvider for AlphaVantageClient {
    async fn latest_quote(&self, symbol: &str) -> Result<QuoteSnapshot, QuoteError> {
        self.fetch_intraday(symbol).await
    }
}
