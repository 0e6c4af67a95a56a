//! Shared state for API handlers.

use std::sync::Arc;

use driftbook::Symbol;
use driftbook::trend::TrendConfig;
use driftbook_broker::{Exchange, PriceHistory, TokenRegistry};

pub const DEFAULT_TRADE_SIZE_USD: f64 = 100.0;
pub const DEFAULT_HISTORY_DAYS: u32 = 7;

/// Everything a handler needs. Exchange and history calls block, so
/// handlers run them on the blocking pool.
pub struct ApiState {
    pub exchange: Arc<dyn Exchange + Send + Sync>,
    pub history: Arc<dyn PriceHistory + Send + Sync>,
    pub registry: TokenRegistry,
    /// Settlement asset for trend trades.
    pub quote: Symbol,
    /// USD value of each trend-driven trade.
    pub trade_size_usd: f64,
    pub trend: TrendConfig,
    /// Coins analysed when a request names none.
    pub default_coins: Vec<String>,
    pub history_days: u32,
}

impl ApiState {
    /// State with the default registry, USDC quote and trend parameters.
    pub fn new(
        exchange: Arc<dyn Exchange + Send + Sync>,
        history: Arc<dyn PriceHistory + Send + Sync>,
    ) -> Self {
        Self {
            exchange,
            history,
            registry: TokenRegistry::default(),
            quote: Symbol::new("USDC"),
            trade_size_usd: DEFAULT_TRADE_SIZE_USD,
            trend: TrendConfig::default(),
            default_coins: vec!["ethereum".into(), "bitcoin".into()],
            history_days: DEFAULT_HISTORY_DAYS,
        }
    }

    pub fn with_trade_size(mut self, usd: f64) -> Self {
        self.trade_size_usd = usd;
        self
    }

    pub fn with_quote(mut self, quote: Symbol) -> Self {
        self.quote = quote;
        self
    }

    pub fn with_registry(mut self, registry: TokenRegistry) -> Self {
        self.registry = registry;
        self
    }
}
