//! Moving-average trend report over price-feed coins.

use driftbook::Symbol;
use driftbook::trend::{Signal, TrendAnalysis, TrendConfig, analyze};
use driftbook_broker::PriceHistory;
use driftbook_broker::tokens::coin_symbol;
use log::warn;
use serde::Serialize;

/// Trend analysis of one coin, or why it could not be produced.
#[derive(Debug, Clone, Serialize)]
pub struct CoinTrend {
    pub coin_id: String,
    /// Token traded for this coin.
    pub symbol: Symbol,
    #[serde(flatten)]
    pub analysis: Option<TrendAnalysis>,
    pub signal: Signal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Fetch `days` of closes for each coin and classify it.
///
/// A coin whose history cannot be fetched or analysed reports `Hold` with
/// the error attached; the other coins are unaffected.
pub fn analyze_coins<H: PriceHistory + ?Sized>(
    history: &H,
    coins: &[String],
    days: u32,
    config: &TrendConfig,
) -> Vec<CoinTrend> {
    coins
        .iter()
        .map(|coin| {
            let outcome = history
                .closes(coin, days)
                .map_err(|e| e.to_string())
                .and_then(|closes| analyze(&closes, config).map_err(|e| e.to_string()));
            match outcome {
                Ok(analysis) => CoinTrend {
                    coin_id: coin.clone(),
                    symbol: coin_symbol(coin),
                    signal: analysis.signal(config),
                    analysis: Some(analysis),
                    error: None,
                },
                Err(e) => {
                    warn!("Trend analysis for {coin} failed: {e}");
                    CoinTrend {
                        coin_id: coin.clone(),
                        symbol: coin_symbol(coin),
                        analysis: None,
                        signal: Signal::Hold,
                        error: Some(e),
                    }
                }
            }
        })
        .collect()
}

/// Tabular report for the terminal.
pub fn format_report(trends: &[CoinTrend]) -> String {
    let mut out = String::from("TREND ANALYSIS:\n");
    for t in trends {
        match &t.analysis {
            Some(a) => out.push_str(&format!(
                "  {:16} {:5} {:8} {:>5.1}%  {:4}  {}\n",
                t.coin_id, t.symbol, a.trend, a.confidence, t.signal, a.reason
            )),
            None => out.push_str(&format!(
                "  {:16} {:5} unavailable: {}\n",
                t.coin_id,
                t.symbol,
                t.error.as_deref().unwrap_or("unknown error")
            )),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use driftbook::trend::Trend;
    use driftbook_broker::mock::MockHistory;

    fn history() -> MockHistory {
        MockHistory::new()
            .with_series("ethereum", vec![10.0, 11.0, 12.0, 15.0, 20.0, 30.0, 40.0, 50.0])
            .with_series("bitcoin", vec![100.0; 8])
    }

    #[test]
    fn classifies_each_coin() {
        let config = TrendConfig::default();
        let coins = vec!["ethereum".to_string(), "bitcoin".to_string()];
        let trends = analyze_coins(&history(), &coins, 7, &config);

        assert_eq!(trends.len(), 2);
        assert_eq!(trends[0].symbol, Symbol::new("WETH"));
        assert_eq!(trends[0].analysis.as_ref().unwrap().trend, Trend::Bullish);
        assert_eq!(trends[0].signal, Signal::Buy);
        assert_eq!(trends[1].symbol, Symbol::new("WBTC"));
        assert_eq!(trends[1].signal, Signal::Hold);
    }

    #[test]
    fn failed_coin_holds_without_affecting_others() {
        let config = TrendConfig::default();
        let coins = vec!["dogecoin".to_string(), "bitcoin".to_string()];
        let trends = analyze_coins(&history(), &coins, 7, &config);

        assert!(trends[0].analysis.is_none());
        assert_eq!(trends[0].signal, Signal::Hold);
        assert!(trends[0].error.is_some());
        assert!(trends[1].analysis.is_some());
    }

    #[test]
    fn short_history_is_reported() {
        let h = MockHistory::new().with_series("ethereum", vec![1.0, 2.0]);
        let trends = analyze_coins(&h, &["ethereum".to_string()], 7, &TrendConfig::default());
        assert!(trends[0].error.as_deref().unwrap().contains("need at least 7"));
    }

    #[test]
    fn report_lists_coins() {
        let coins = vec!["ethereum".to_string(), "dogecoin".to_string()];
        let report = format_report(&analyze_coins(&history(), &coins, 7, &TrendConfig::default()));
        assert!(report.contains("ethereum"));
        assert!(report.contains("bullish"));
        assert!(report.contains("dogecoin"));
        assert!(report.contains("unavailable"));
    }

    #[test]
    fn serializes_flat() {
        let trends = analyze_coins(&history(), &["bitcoin".to_string()], 7, &TrendConfig::default());
        let json = serde_json::to_value(&trends[0]).unwrap();
        assert_eq!(json["coin_id"], "bitcoin");
        assert_eq!(json["trend"], "neutral");
        assert_eq!(json["signal"], "HOLD");
        assert!(json.get("error").is_none());
    }
}
