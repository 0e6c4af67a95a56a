//! Exchange trait and implementations for driftbook.
//!
//! Provides a generic `Exchange` trait over spot-swap venues and a
//! `PriceHistory` trait over historical price feeds. Implementations:
//!
//! - **Mock** (always): in-memory exchange and history for tests
//! - **Recall** (feature `recall`): Recall sandbox trading REST API
//! - **CoinGecko** (feature `coingecko`): daily closes from the public API

pub mod error;
pub mod history;
pub mod mock;
pub mod tokens;
pub mod types;

#[cfg(feature = "recall")]
pub mod recall;

#[cfg(feature = "coingecko")]
pub mod coingecko;

pub use error::BrokerError;
pub use history::PriceHistory;
pub use tokens::{TokenInfo, TokenRegistry};
pub use types::*;

use driftbook::{HoldingsTable, Symbol};

/// A trading venue that can report balances, quote prices and swap tokens.
///
/// Methods take `&self` so one client can sit behind an `Arc` and be shared
/// between request handlers.
pub trait Exchange {
    /// Check connectivity and credentials.
    fn ping(&self) -> Result<(), BrokerError>;

    /// Current token balances, one entry per symbol.
    fn balances(&self) -> Result<Vec<Balance>, BrokerError>;

    /// Current USD price of one whole unit of `symbol`.
    fn quote(&self, symbol: &Symbol) -> Result<Quote, BrokerError>;

    /// Swap `amount` base units of `from` into `to`.
    fn submit_trade(&self, request: &TradeRequest) -> Result<TradeReceipt, BrokerError>;

    /// Trades executed on this account, as reported by the venue.
    fn trade_history(&self) -> Result<Vec<TradeReceipt>, BrokerError>;
}

impl<E: Exchange + ?Sized> Exchange for &E {
    fn ping(&self) -> Result<(), BrokerError> {
        (**self).ping()
    }
    fn balances(&self) -> Result<Vec<Balance>, BrokerError> {
        (**self).balances()
    }
    fn quote(&self, symbol: &Symbol) -> Result<Quote, BrokerError> {
        (**self).quote(symbol)
    }
    fn submit_trade(&self, request: &TradeRequest) -> Result<TradeReceipt, BrokerError> {
        (**self).submit_trade(request)
    }
    fn trade_history(&self) -> Result<Vec<TradeReceipt>, BrokerError> {
        (**self).trade_history()
    }
}

/// Collapse balances into a holdings table, summing repeated symbols.
pub fn holdings_from_balances(balances: &[Balance]) -> HoldingsTable {
    let mut holdings = HoldingsTable::new();
    for b in balances {
        holdings.adjust(b.symbol, b.amount);
    }
    holdings
}
