//! Recall REST API client.

use std::time::Duration;

use log::debug;
use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};
use serde::de::DeserializeOwned;

use super::types::{PortfolioResponse, PriceResponse, TradeBody, TradeResponse, TradesResponse};
use crate::error::BrokerError;

/// Sandbox competition endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.sandbox.competitions.recall.network";

/// Blocking Recall REST client with bearer-token auth.
pub struct RecallClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl RecallClient {
    /// Create a new client. `base_url` defaults to the sandbox.
    pub fn new(
        api_key: &str,
        base_url: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, BrokerError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BrokerError::Connection(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key: api_key.to_string(),
            base_url: base_url
                .unwrap_or(DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
        })
    }

    /// Account balances (GET /api/account/portfolio).
    pub fn portfolio(&self) -> Result<PortfolioResponse, BrokerError> {
        let url = format!("{}/api/account/portfolio", self.base_url);
        let resp = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .map_err(|e| BrokerError::Connection(format!("portfolio request failed: {e}")))?;
        parse_json(resp, "portfolio")
    }

    /// Token price by contract address (GET /api/price).
    pub fn price(&self, token: &str) -> Result<PriceResponse, BrokerError> {
        let url = format!("{}/api/price", self.base_url);
        let resp = self
            .client
            .get(&url)
            .query(&[("token", token), ("chain", "evm"), ("specificChain", "eth")])
            .bearer_auth(&self.api_key)
            .send()
            .map_err(|e| BrokerError::Connection(format!("price request failed: {e}")))?;
        parse_json(resp, "price")
    }

    /// Execute a swap (POST /api/trade/execute).
    ///
    /// The sandbox answers rejected trades with a JSON body carrying
    /// `success: false`; that body is returned as-is for the caller to map.
    pub fn execute_trade(&self, body: &TradeBody) -> Result<TradeResponse, BrokerError> {
        let url = format!("{}/api/trade/execute", self.base_url);

        debug!(
            "Submitting Recall trade: {} {} -> {}",
            body.amount, body.from_token, body.to_token
        );

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .map_err(|e| BrokerError::Trade(format!("trade request failed: {e}")))?;

        let status = resp.status();
        let text = resp.text().unwrap_or_default();
        match serde_json::from_str::<TradeResponse>(&text) {
            Ok(parsed) => Ok(parsed),
            Err(_) if !status.is_success() => Err(status_error(status, &text, "trade")),
            Err(e) => Err(BrokerError::Parse(format!(
                "failed to parse trade response: {e}"
            ))),
        }
    }

    /// Executed trades (GET /api/account/trades).
    pub fn trades(&self) -> Result<TradesResponse, BrokerError> {
        let url = format!("{}/api/account/trades", self.base_url);
        let resp = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .map_err(|e| BrokerError::Connection(format!("trades request failed: {e}")))?;
        parse_json(resp, "trades")
    }
}

fn parse_json<T: DeserializeOwned>(resp: Response, what: &str) -> Result<T, BrokerError> {
    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().unwrap_or_default();
        return Err(status_error(status, &body, what));
    }
    resp.json::<T>()
        .map_err(|e| BrokerError::Parse(format!("failed to parse {what}: {e}")))
}

fn status_error(status: StatusCode, body: &str, what: &str) -> BrokerError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            BrokerError::Auth(format!("{what} returned {status}: {body}"))
        }
        StatusCode::TOO_MANY_REQUESTS => BrokerError::RateLimit,
        _ => BrokerError::Connection(format!("{what} returned {status}: {body}")),
    }
}
