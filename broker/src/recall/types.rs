//! Recall-specific API request and response types.

use serde::{Deserialize, Serialize};

/// One token entry in the portfolio response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenBalance {
    /// Contract address.
    #[serde(alias = "tokenAddress")]
    pub token: String,
    pub amount: f64,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub chain: Option<String>,
}

/// `GET /api/account/portfolio` response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub total_value: Option<f64>,
    #[serde(default, alias = "balances")]
    pub tokens: Vec<TokenBalance>,
}

/// `GET /api/price` response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub error: Option<String>,
}

/// `POST /api/trade/execute` body. `amount` is a decimal string of whole
/// units of `from_token`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeBody {
    pub from_token: String,
    pub to_token: String,
    pub amount: String,
    pub reason: String,
}

/// A settled trade, as returned by execute and history.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub from_token: String,
    pub to_token: String,
    pub from_amount: f64,
    pub to_amount: f64,
    #[serde(default)]
    pub from_token_symbol: Option<String>,
    #[serde(default)]
    pub to_token_symbol: Option<String>,
    #[serde(default)]
    pub trade_amount_usd: Option<f64>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// `POST /api/trade/execute` response.
#[derive(Debug, Deserialize)]
pub struct TradeResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub transaction: Option<Transaction>,
    #[serde(default)]
    pub error: Option<String>,
}

/// `GET /api/account/trades` response.
#[derive(Debug, Deserialize)]
pub struct TradesResponse {
    #[serde(default)]
    pub trades: Vec<Transaction>,
}
