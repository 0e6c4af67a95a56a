//! Router tests against the mock exchange and canned price history.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use driftbook::Symbol;
use driftbook_broker::mock::{FillMode, MockExchange, MockHistory};
use driftbook_broker::{Exchange, TradeRequest};
use driftbook_server::api::{DashboardStats, HealthResponse, MessageResponse};
use driftbook_server::{ApiState, create_router};
use http_body_util::BodyExt;
use tower::ServiceExt;

fn weth() -> Symbol {
    Symbol::new("WETH")
}
fn wbtc() -> Symbol {
    Symbol::new("WBTC")
}
fn usdc() -> Symbol {
    Symbol::new("USDC")
}

fn mock_exchange(mode: FillMode) -> Arc<MockExchange> {
    Arc::new(
        MockExchange::builder()
            .fill_mode(mode)
            .with_balance(usdc(), 1_000.0)
            .with_balance(weth(), 1.0)
            .with_balance(wbtc(), 0.0)
            .with_quote(usdc(), 1.0)
            .with_quote(weth(), 2_000.0)
            .with_quote(wbtc(), 40_000.0)
            .build(),
    )
}

fn history() -> MockHistory {
    MockHistory::new()
        // +300%: bullish, capped at 95 confidence
        .with_series("ethereum", vec![10.0, 11.0, 12.0, 15.0, 20.0, 30.0, 40.0])
        .with_series("bitcoin", vec![100.0; 8])
}

fn app(exchange: Arc<MockExchange>) -> Router {
    create_router(Arc::new(ApiState::new(exchange, Arc::new(history()))))
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&body).unwrap())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post(uri: &str, json: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(json.to_string()))
        .unwrap()
}

#[tokio::test]
async fn root_and_health() {
    let (status, body) = send(app(mock_exchange(FillMode::Accept)), get("/")).await;
    assert_eq!(status, StatusCode::OK);
    let msg: MessageResponse = serde_json::from_value(body).unwrap();
    assert!(msg.message.contains("running"));

    let (status, body) = send(app(mock_exchange(FillMode::Accept)), get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    let health: HealthResponse = serde_json::from_value(body).unwrap();
    assert_eq!(health.status, "healthy");
}

#[tokio::test]
async fn trade_submits_base_units() {
    let exchange = mock_exchange(FillMode::Accept);
    let (status, body) = send(
        app(exchange.clone()),
        post(
            "/trade",
            serde_json::json!({
                "fromToken": "USDC",
                "toToken": "WETH",
                "amount": "100",
                "reason": "test buy",
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], "mock-1");
    let trades = exchange.submitted_trades();
    assert_eq!(trades.len(), 1);
    assert_eq!(trades[0].amount, 100_000_000);
    assert_eq!(trades[0].reason, "test buy");
    assert!((exchange.balance(&weth()) - 1.05).abs() < 1e-9);
}

#[tokio::test]
async fn trade_with_unknown_token_is_bad_request() {
    let exchange = mock_exchange(FillMode::Accept);
    let (status, body) = send(
        app(exchange.clone()),
        post(
            "/trade",
            serde_json::json!({ "fromToken": "DOGE", "toToken": "WETH", "amount": "1" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("DOGE"));
    assert!(exchange.submitted_trades().is_empty());
}

#[tokio::test]
async fn rejected_trade_is_bad_gateway() {
    let (status, body) = send(
        app(mock_exchange(FillMode::Reject)),
        post(
            "/trade",
            serde_json::json!({ "fromToken": "WETH", "toToken": "USDC", "amount": 0.5 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"].as_str().unwrap().contains("rejected"));
}

#[tokio::test]
async fn trend_analysis_defaults_to_configured_coins() {
    let exchange = mock_exchange(FillMode::Accept);
    let (status, body) = send(
        app(exchange.clone()),
        post("/run-trend-analysis", serde_json::json!({})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let trends = body["trends"].as_array().unwrap();
    assert_eq!(trends.len(), 2);

    assert_eq!(trends[0]["symbol"], "ethereum");
    assert_eq!(trends[0]["token"], "WETH");
    assert_eq!(trends[0]["trend"], "bullish");
    assert_eq!(trends[0]["confidence"], 95.0);
    assert_eq!(trends[0]["action"], "BUY");
    assert!(trends[0]["reason"].as_str().unwrap().starts_with("Price change"));

    assert_eq!(trends[1]["trend"], "neutral");
    assert_eq!(trends[1]["action"], "HOLD");

    // No execute flag: nothing traded
    assert!(trends[0].get("trade").is_none());
    assert!(exchange.submitted_trades().is_empty());
}

#[tokio::test]
async fn trend_execute_trades_non_hold_signals() {
    let exchange = mock_exchange(FillMode::Accept);
    let (status, body) = send(
        app(exchange.clone()),
        post(
            "/run-trend-analysis",
            serde_json::json!({ "symbols": ["ethereum", "bitcoin"], "execute": true }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let trends = body["trends"].as_array().unwrap();
    assert_eq!(trends[0]["trade"]["id"], "mock-1");
    assert!(trends[1].get("trade").is_none());

    let trades = exchange.submitted_trades();
    assert_eq!(trades.len(), 1);
    assert_eq!((trades[0].from, trades[0].to), (usdc(), weth()));
    assert_eq!(trades[0].amount, 100_000_000);
}

#[tokio::test]
async fn trend_for_unknown_coin_reports_error() {
    let (status, body) = send(
        app(mock_exchange(FillMode::Accept)),
        post("/run-trend-analysis", serde_json::json!({ "symbols": ["dogecoin"] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let entry = &body["trends"][0];
    assert_eq!(entry["action"], "HOLD");
    assert!(entry["error"].is_string());
}

#[tokio::test]
async fn dashboard_stats_value_the_portfolio() {
    let exchange = mock_exchange(FillMode::Accept);
    // 400 USDC into WBTC: value moves between tokens, total unchanged
    exchange
        .submit_trade(&TradeRequest {
            from: usdc(),
            to: wbtc(),
            amount: 400_000_000,
            reason: "seed".into(),
        })
        .unwrap();
    let (status, body) = send(app(exchange), get("/dashboard-stats")).await;

    assert_eq!(status, StatusCode::OK);
    let stats: DashboardStats = serde_json::from_value(body).unwrap();
    assert!((stats.total_value - 3_000.0).abs() < 1e-6);
    assert_eq!(stats.asset_count, 3);
    assert_eq!(stats.trade_count, 1);
}

#[tokio::test]
async fn dashboard_offline_is_bad_gateway() {
    let exchange = Arc::new(MockExchange::builder().offline().build());
    let (status, _) = send(app(exchange), get("/dashboard-stats")).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
}
