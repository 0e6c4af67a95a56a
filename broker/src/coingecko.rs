//! CoinGecko public market-chart client (feature `coingecko`).

use std::time::Duration;

use log::debug;
use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::Deserialize;

use crate::error::BrokerError;
use crate::history::PriceHistory;

pub const DEFAULT_BASE_URL: &str = "https://api.coingecko.com";

/// `GET /api/v3/coins/{id}/market_chart` response: `[timestamp_ms, price]` pairs.
#[derive(Debug, Deserialize)]
pub struct MarketChart {
    pub prices: Vec<(f64, f64)>,
}

impl MarketChart {
    /// Prices only, oldest first.
    pub fn closes(&self) -> Vec<f64> {
        self.prices.iter().map(|&(_, price)| price).collect()
    }
}

/// Blocking CoinGecko client.
pub struct CoinGeckoClient {
    client: Client,
    base_url: String,
}

impl CoinGeckoClient {
    pub fn new(base_url: Option<&str>, timeout: Duration) -> Result<Self, BrokerError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BrokerError::Connection(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url
                .unwrap_or(DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
        })
    }

    /// Daily USD prices for the last `days` days.
    pub fn market_chart(&self, coin_id: &str, days: u32) -> Result<MarketChart, BrokerError> {
        let url = format!("{}/api/v3/coins/{coin_id}/market_chart", self.base_url);
        debug!("Fetching {days}d market chart for {coin_id}");
        let days = days.to_string();

        let resp = self
            .client
            .get(&url)
            .query(&[
                ("vs_currency", "usd"),
                ("days", days.as_str()),
                ("interval", "daily"),
            ])
            .send()
            .map_err(|e| BrokerError::Connection(format!("market chart request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().unwrap_or_default();
            return Err(match status {
                StatusCode::TOO_MANY_REQUESTS => BrokerError::RateLimit,
                StatusCode::NOT_FOUND => BrokerError::InvalidSymbol(coin_id.to_string()),
                _ => BrokerError::Connection(format!("market chart returned {status}: {body}")),
            });
        }

        resp.json::<MarketChart>()
            .map_err(|e| BrokerError::Parse(format!("failed to parse market chart: {e}")))
    }
}

impl PriceHistory for CoinGeckoClient {
    fn closes(&self, coin_id: &str, days: u32) -> Result<Vec<f64>, BrokerError> {
        Ok(self.market_chart(coin_id, days)?.closes())
    }
}
