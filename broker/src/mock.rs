//! Mock exchange for testing. Implements `Exchange` with configurable behavior.
//!
//! Use this in integration tests to simulate a venue without network calls.
//! Accepted trades settle at the configured quotes and update the mock
//! balances, so a second pass sees the rebalanced portfolio.
//!
//! ```
//! use driftbook_broker::mock::{FillMode, MockExchange};
//! use driftbook::Symbol;
//!
//! let exchange = MockExchange::builder()
//!     .fill_mode(FillMode::RejectAfter(2))
//!     .with_balance(Symbol::new("WETH"), 1.5)
//!     .with_quote(Symbol::new("WETH"), 2_000.0)
//!     .with_quote(Symbol::new("USDC"), 1.0)
//!     .build();
//! ```

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use driftbook::Symbol;

use crate::error::BrokerError;
use crate::history::PriceHistory;
use crate::tokens::TokenRegistry;
use crate::types::*;
use crate::Exchange;

/// How the mock exchange handles submitted trades.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FillMode {
    /// Every trade settles in full at the quoted prices.
    Accept,
    /// Every trade is rejected.
    Reject,
    /// The first `n` trades settle; every later one is rejected.
    RejectAfter(usize),
}

/// Builder for `MockExchange`.
pub struct MockExchangeBuilder {
    fill_mode: FillMode,
    balances: Vec<(Symbol, f64)>,
    quotes: Vec<(Symbol, f64)>,
    registry: TokenRegistry,
    offline: bool,
}

impl MockExchangeBuilder {
    pub fn fill_mode(mut self, mode: FillMode) -> Self {
        self.fill_mode = mode;
        self
    }

    pub fn with_balance(mut self, symbol: Symbol, amount: f64) -> Self {
        self.balances.push((symbol, amount));
        self
    }

    pub fn with_quote(mut self, symbol: Symbol, price: f64) -> Self {
        self.quotes.push((symbol, price));
        self
    }

    pub fn with_registry(mut self, registry: TokenRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Make every call fail with a connection error.
    pub fn offline(mut self) -> Self {
        self.offline = true;
        self
    }

    pub fn build(self) -> MockExchange {
        MockExchange {
            fill_mode: self.fill_mode,
            quotes: self.quotes,
            registry: self.registry,
            offline: self.offline,
            state: Mutex::new(MockState {
                balances: self.balances,
                submitted: Vec::new(),
                settled: Vec::new(),
            }),
        }
    }
}

struct MockState {
    balances: Vec<(Symbol, f64)>,
    submitted: Vec<TradeRequest>,
    settled: Vec<TradeReceipt>,
}

impl MockState {
    fn adjust(&mut self, symbol: Symbol, delta: f64) {
        match self.balances.iter_mut().find(|(s, _)| *s == symbol) {
            Some((_, amount)) => *amount += delta,
            None => self.balances.push((symbol, delta)),
        }
    }
}

/// A mock exchange that records submitted trades and settles them in memory.
pub struct MockExchange {
    fill_mode: FillMode,
    quotes: Vec<(Symbol, f64)>,
    registry: TokenRegistry,
    offline: bool,
    state: Mutex<MockState>,
}

impl MockExchange {
    pub fn builder() -> MockExchangeBuilder {
        MockExchangeBuilder {
            fill_mode: FillMode::Accept,
            balances: Vec::new(),
            quotes: Vec::new(),
            registry: TokenRegistry::default(),
            offline: false,
        }
    }

    /// Every trade request received, accepted or not (for assertion in tests).
    pub fn submitted_trades(&self) -> Vec<TradeRequest> {
        self.lock().submitted.clone()
    }

    /// Current in-memory balance of `symbol`.
    pub fn balance(&self, symbol: &Symbol) -> f64 {
        self.lock()
            .balances
            .iter()
            .find(|(s, _)| s == symbol)
            .map_or(0.0, |(_, a)| *a)
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        // A panicking test thread must not hide the recorded state from others.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check_online(&self) -> Result<(), BrokerError> {
        if self.offline {
            return Err(BrokerError::Connection("mock: exchange offline".into()));
        }
        Ok(())
    }

    fn price(&self, symbol: &Symbol) -> Result<f64, BrokerError> {
        self.quotes
            .iter()
            .find(|(s, _)| s == symbol)
            .map(|(_, p)| *p)
            .ok_or_else(|| BrokerError::InvalidSymbol(symbol.as_str().to_string()))
    }
}

impl Exchange for MockExchange {
    fn ping(&self) -> Result<(), BrokerError> {
        self.check_online()
    }

    fn balances(&self) -> Result<Vec<Balance>, BrokerError> {
        self.check_online()?;
        let state = self.lock();
        Ok(state
            .balances
            .iter()
            .map(|&(symbol, amount)| Balance {
                symbol,
                amount,
                price: self.price(&symbol).ok(),
            })
            .collect())
    }

    fn quote(&self, symbol: &Symbol) -> Result<Quote, BrokerError> {
        self.check_online()?;
        Ok(Quote {
            symbol: *symbol,
            price: self.price(symbol)?,
        })
    }

    fn submit_trade(&self, request: &TradeRequest) -> Result<TradeReceipt, BrokerError> {
        self.check_online()?;
        let mut state = self.lock();
        state.submitted.push(request.clone());

        let accepted = match self.fill_mode {
            FillMode::Accept => true,
            FillMode::Reject => false,
            FillMode::RejectAfter(n) => state.settled.len() < n,
        };
        if !accepted {
            return Err(BrokerError::Trade("mock: trade rejected".into()));
        }

        let from_amount = self.registry.from_base_units(&request.from, request.amount)?;
        let to_amount = from_amount * self.price(&request.from)? / self.price(&request.to)?;
        state.adjust(request.from, -from_amount);
        state.adjust(request.to, to_amount);

        let receipt = TradeReceipt {
            id: format!("mock-{}", state.settled.len() + 1),
            from: request.from,
            to: request.to,
            from_amount,
            to_amount,
            timestamp: None,
        };
        state.settled.push(receipt.clone());
        Ok(receipt)
    }

    fn trade_history(&self) -> Result<Vec<TradeReceipt>, BrokerError> {
        self.check_online()?;
        Ok(self.lock().settled.clone())
    }
}

/// Canned price history keyed by coin id.
#[derive(Debug, Clone, Default)]
pub struct MockHistory {
    series: HashMap<String, Vec<f64>>,
}

impl MockHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_series(mut self, coin_id: &str, closes: Vec<f64>) -> Self {
        self.series.insert(coin_id.to_string(), closes);
        self
    }
}

impl PriceHistory for MockHistory {
    /// The last `days + 1` closes of the canned series (or all of it).
    fn closes(&self, coin_id: &str, days: u32) -> Result<Vec<f64>, BrokerError> {
        let series = self
            .series
            .get(coin_id)
            .ok_or_else(|| BrokerError::InvalidSymbol(coin_id.to_string()))?;
        let keep = (days as usize + 1).min(series.len());
        Ok(series[series.len() - keep..].to_vec())
    }
}
