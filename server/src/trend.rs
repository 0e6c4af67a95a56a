//! Trend analysis and trend-driven trades.
//!
//! Everything here blocks on the exchange or the price feed; handlers call
//! it from `spawn_blocking`.

use driftbook::Symbol;
use driftbook::trend::{Signal, TrendAnalysis, analyze};
use driftbook_broker::tokens::coin_symbol;
use driftbook_broker::{BrokerError, TradeReceipt, TradeRequest};
use log::{info, warn};
use serde::Serialize;

use crate::state::ApiState;

/// One coin's row in the trend response.
#[derive(Debug, Clone, Serialize)]
pub struct TrendEntry {
    /// Price-feed coin id as requested.
    pub symbol: String,
    /// Exchange token the coin trades as.
    pub token: Symbol,
    #[serde(flatten)]
    pub analysis: Option<TrendAnalysis>,
    pub action: Signal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trade: Option<TradeReceipt>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Analyse every coin; with `execute`, submit a trade for each Buy/Sell.
///
/// Failures are per coin: a missing series or a rejected trade is reported
/// in that entry and the remaining coins still run.
pub fn run_analysis(state: &ApiState, coins: &[String], execute: bool) -> Vec<TrendEntry> {
    coins
        .iter()
        .map(|coin| {
            let token = coin_symbol(coin);
            let analysis = state
                .history
                .closes(coin, state.history_days)
                .map_err(|e| e.to_string())
                .and_then(|closes| analyze(&closes, &state.trend).map_err(|e| e.to_string()));

            let analysis = match analysis {
                Ok(a) => a,
                Err(e) => {
                    warn!("Trend analysis for {coin} failed: {e}");
                    return TrendEntry {
                        symbol: coin.clone(),
                        token,
                        analysis: None,
                        action: Signal::Hold,
                        trade: None,
                        error: Some(e),
                    };
                }
            };

            let action = analysis.signal(&state.trend);
            info!(
                "{coin}: {} ({:.1}% confidence) -> {action}",
                analysis.trend, analysis.confidence
            );

            let (trade, error) = if execute && action != Signal::Hold {
                match trend_trade(state, token, action, &analysis) {
                    Ok(receipt) => (Some(receipt), None),
                    Err(e) => {
                        warn!("Trend trade for {coin} failed: {e}");
                        (None, Some(e.to_string()))
                    }
                }
            } else {
                (None, None)
            };

            TrendEntry {
                symbol: coin.clone(),
                token,
                analysis: Some(analysis),
                action,
                trade,
                error,
            }
        })
        .collect()
}

/// Trade `trade_size_usd` between the quote asset and `token`.
///
/// Buy spends the quote asset, Sell spends the token.
pub fn build_trend_trade(
    state: &ApiState,
    token: Symbol,
    action: Signal,
    analysis: &TrendAnalysis,
) -> Result<TradeRequest, BrokerError> {
    let (from, to) = match action {
        Signal::Buy => (state.quote, token),
        Signal::Sell => (token, state.quote),
        Signal::Hold => {
            return Err(BrokerError::Other("hold signals do not trade".into()));
        }
    };

    let price = state.exchange.quote(&from)?.price;
    if !(price.is_finite() && price > 0.0) {
        return Err(BrokerError::Trade(format!("{from} price is {price}")));
    }
    let amount = state
        .registry
        .to_base_units(&from, state.trade_size_usd / price)?;
    if amount == 0 {
        return Err(BrokerError::Trade(format!(
            "${:.2} rounds to zero {from} base units",
            state.trade_size_usd
        )));
    }

    Ok(TradeRequest {
        from,
        to,
        amount,
        reason: format!(
            "Trend {action}: {} at {:.1}% confidence. {}",
            analysis.trend, analysis.confidence, analysis.reason
        ),
    })
}

fn trend_trade(
    state: &ApiState,
    token: Symbol,
    action: Signal,
    analysis: &TrendAnalysis,
) -> Result<TradeReceipt, BrokerError> {
    let request = build_trend_trade(state, token, action, analysis)?;
    info!(
        "Submitting trend trade: {} base units of {} -> {}",
        request.amount, request.from, request.to
    );
    state.exchange.submit_trade(&request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use driftbook::trend::{Trend, TrendConfig};
    use driftbook_broker::mock::{MockExchange, MockHistory};

    fn weth() -> Symbol {
        Symbol::new("WETH")
    }
    fn usdc() -> Symbol {
        Symbol::new("USDC")
    }

    fn state(history: MockHistory) -> ApiState {
        let exchange = MockExchange::builder()
            .with_balance(usdc(), 1_000.0)
            .with_balance(weth(), 1.0)
            .with_quote(usdc(), 1.0)
            .with_quote(weth(), 2_000.0)
            .build();
        ApiState::new(Arc::new(exchange), Arc::new(history))
    }

    fn analysis(trend: Trend) -> TrendAnalysis {
        analyze(
            &match trend {
                Trend::Bullish => [10.0, 11.0, 12.0, 15.0, 20.0, 30.0, 40.0],
                _ => [40.0, 30.0, 20.0, 15.0, 12.0, 11.0, 10.0],
            },
            &TrendConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn buy_spends_trade_size_of_quote() {
        let s = state(MockHistory::new());
        let req = build_trend_trade(&s, weth(), Signal::Buy, &analysis(Trend::Bullish)).unwrap();
        assert_eq!((req.from, req.to), (usdc(), weth()));
        assert_eq!(req.amount, 100_000_000);
        assert!(req.reason.starts_with("Trend BUY: bullish"));
    }

    #[test]
    fn sell_spends_trade_size_of_token() {
        let s = state(MockHistory::new());
        let req = build_trend_trade(&s, weth(), Signal::Sell, &analysis(Trend::Bearish)).unwrap();
        assert_eq!((req.from, req.to), (weth(), usdc()));
        // $100 / $2000 = 0.05 WETH
        assert_eq!(req.amount, 50_000_000_000_000_000);
    }

    #[test]
    fn hold_never_builds_a_trade() {
        let s = state(MockHistory::new());
        assert!(build_trend_trade(&s, weth(), Signal::Hold, &analysis(Trend::Bullish)).is_err());
    }

    #[test]
    fn missing_series_is_reported_per_coin() {
        let history = MockHistory::new().with_series("ethereum", vec![100.0; 8]);
        let s = state(history);
        let coins = vec!["ethereum".to_string(), "dogecoin".to_string()];
        let entries = run_analysis(&s, &coins, false);

        assert_eq!(entries.len(), 2);
        assert!(entries[0].error.is_none());
        assert_eq!(entries[0].analysis.as_ref().unwrap().trend, Trend::Neutral);
        assert!(entries[1].analysis.is_none());
        assert!(entries[1].error.is_some());
        assert_eq!(entries[1].action, Signal::Hold);
        // Unknown coins map to WETH
        assert_eq!(entries[1].token, weth());
    }
}
