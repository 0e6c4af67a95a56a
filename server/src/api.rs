//! HTTP API.
//!
//! Provides REST endpoints for:
//! - Liveness and health
//! - Manual trades
//! - Trend analysis (optionally trading on the signals)
//! - Dashboard statistics

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::{Json, Router};
use driftbook::Symbol;
use driftbook::units::parse_units;
use driftbook_broker::{TokenRegistry, TradeReceipt, TradeRequest};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};

use crate::error::ApiError;
use crate::state::ApiState;
use crate::trend::{self, TrendEntry};

// =============================================================================
// Request/Response Types
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Manual trade. Tokens are symbols or contract addresses; `amount` is in
/// whole units of `fromToken`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeBody {
    pub from_token: String,
    pub to_token: String,
    pub amount: AmountField,
    #[serde(default = "default_reason")]
    pub reason: String,
}

fn default_reason() -> String {
    "Manual trade".into()
}

/// Amounts arrive as strings from the dashboard, numbers from scripts.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum AmountField {
    Text(String),
    Number(serde_json::Number),
}

impl AmountField {
    fn as_text(&self) -> String {
        match self {
            AmountField::Text(s) => s.trim().to_string(),
            AmountField::Number(n) => n.to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TrendRequest {
    /// Price-feed coin ids; the configured defaults when absent or empty.
    pub symbols: Option<Vec<String>>,
    /// Trade on Buy/Sell signals.
    pub execute: bool,
}

#[derive(Debug, Serialize)]
pub struct TrendResponse {
    pub trends: Vec<TrendEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_value: f64,
    /// Tokens with a non-zero balance.
    pub asset_count: usize,
    pub trade_count: usize,
}

// =============================================================================
// Router
// =============================================================================

/// Create the API router.
pub fn create_router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/trade", post(trade_handler))
        .route("/run-trend-analysis", post(trend_handler))
        .route("/dashboard-stats", get(dashboard_handler))
        .with_state(state)
}

/// CORS for the dashboard origins. Unparseable origins are skipped.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                log::warn!("Ignoring invalid CORS origin {o:?}");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

// =============================================================================
// Handlers
// =============================================================================

async fn root_handler() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Trend following agent API is running.".into(),
    })
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".into(),
        version: env!("CARGO_PKG_VERSION").into(),
    })
}

/// Execute one swap on the exchange.
async fn trade_handler(
    State(state): State<Arc<ApiState>>,
    Json(body): Json<TradeBody>,
) -> Result<Json<TradeReceipt>, ApiError> {
    let request = trade_request(&state.registry, &body)?;
    log::info!(
        "Manual trade: {} base units of {} -> {}",
        request.amount,
        request.from,
        request.to
    );

    let receipt = tokio::task::spawn_blocking(move || state.exchange.submit_trade(&request))
        .await??;
    Ok(Json(receipt))
}

/// Analyse the requested coins, trading on signals when asked.
async fn trend_handler(
    State(state): State<Arc<ApiState>>,
    Json(req): Json<TrendRequest>,
) -> Result<Json<TrendResponse>, ApiError> {
    let coins = match req.symbols {
        Some(symbols) if !symbols.is_empty() => symbols,
        _ => state.default_coins.clone(),
    };
    let execute = req.execute;

    let trends =
        tokio::task::spawn_blocking(move || trend::run_analysis(&state, &coins, execute)).await?;
    Ok(Json(TrendResponse { trends }))
}

/// Portfolio value, asset count and trade count.
async fn dashboard_handler(
    State(state): State<Arc<ApiState>>,
) -> Result<Json<DashboardStats>, ApiError> {
    let stats = tokio::task::spawn_blocking(move || {
        let balances = state.exchange.balances()?;
        let mut total_value = 0.0;
        for b in &balances {
            total_value += match b.value() {
                Some(v) => v,
                None => match state.exchange.quote(&b.symbol) {
                    Ok(q) => q.price * b.amount,
                    Err(e) => {
                        log::warn!("No price for {}: {e}", b.symbol);
                        0.0
                    }
                },
            };
        }
        let trades = state.exchange.trade_history()?;
        Ok::<_, ApiError>(DashboardStats {
            total_value,
            asset_count: balances.iter().filter(|b| b.amount > 0.0).count(),
            trade_count: trades.len(),
        })
    })
    .await??;
    Ok(Json(stats))
}

// =============================================================================
// Helpers
// =============================================================================

/// Validate a manual trade body into a base-unit request.
pub fn trade_request(registry: &TokenRegistry, body: &TradeBody) -> Result<TradeRequest, ApiError> {
    let from = resolve_token(registry, &body.from_token)?;
    let to = resolve_token(registry, &body.to_token)?;
    if from == to {
        return Err(ApiError::BadRequest(format!("cannot trade {from} for itself")));
    }

    let text = body.amount.as_text();
    let decimals = registry.get(&from)?.decimals;
    let amount = parse_units(&text, decimals)
        .map_err(|e| ApiError::BadRequest(format!("invalid amount {text:?}: {e}")))?;
    if amount == 0 {
        return Err(ApiError::BadRequest("amount must be positive".into()));
    }

    Ok(TradeRequest {
        from,
        to,
        amount,
        reason: body.reason.clone(),
    })
}

/// A registered token by symbol (case-insensitive) or contract address.
fn resolve_token(registry: &TokenRegistry, text: &str) -> Result<Symbol, ApiError> {
    let text = text.trim();
    let symbol = if text.starts_with("0x") {
        registry.symbol_for_address(text)
    } else {
        Symbol::try_new(&text.to_ascii_uppercase()).filter(|s| registry.contains(s))
    };
    symbol.ok_or_else(|| ApiError::BadRequest(format!("unknown token {text:?}")))
}
