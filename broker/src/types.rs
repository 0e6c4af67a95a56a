//! Shared exchange types: balances, quotes, trade requests and receipts.

use driftbook::Symbol;
use serde::Serialize;

/// Token balance held on the exchange.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Balance {
    pub symbol: Symbol,
    /// Whole units.
    pub amount: f64,
    /// USD price per unit, when the venue reports one alongside the balance.
    pub price: Option<f64>,
}

impl Balance {
    /// USD value, when a price is known.
    pub fn value(&self) -> Option<f64> {
        self.price.map(|p| p * self.amount)
    }
}

/// Current USD price of one whole unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Quote {
    pub symbol: Symbol,
    pub price: f64,
}

/// Swap request: spend `amount` base units of `from` to receive `to`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TradeRequest {
    pub from: Symbol,
    pub to: Symbol,
    /// Integer amount in the smallest unit of `from`.
    pub amount: u128,
    pub reason: String,
}

/// Confirmation of an executed swap.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeReceipt {
    /// Venue transaction id.
    pub id: String,
    pub from: Symbol,
    pub to: Symbol,
    /// Whole units of `from` spent.
    pub from_amount: f64,
    /// Whole units of `to` received.
    pub to_amount: f64,
    /// Venue timestamp, verbatim.
    pub timestamp: Option<String>,
}
