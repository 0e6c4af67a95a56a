//! Recall sandbox trading API (feature `recall`).
//!
//! Spot swaps between ERC-20 tokens. Balances and prices are addressed by
//! contract; [`RecallExchange`] translates through a [`TokenRegistry`] so
//! callers only ever see symbols.

pub mod client;
pub mod types;

use driftbook::Symbol;
use driftbook::units::format_units;
use log::{debug, warn};

use crate::error::BrokerError;
use crate::tokens::TokenRegistry;
use crate::types::{Balance, Quote, TradeReceipt, TradeRequest};
use crate::Exchange;

pub use client::{DEFAULT_BASE_URL, RecallClient};
use types::{TokenBalance, TradeBody, Transaction};

/// `Exchange` implementation over the Recall REST API.
pub struct RecallExchange {
    client: RecallClient,
    registry: TokenRegistry,
}

impl RecallExchange {
    pub fn new(client: RecallClient, registry: TokenRegistry) -> Self {
        Self { client, registry }
    }

    pub fn registry(&self) -> &TokenRegistry {
        &self.registry
    }

    /// Resolve a portfolio entry to a symbol: by address first, then by the
    /// venue's own symbol if it is registered.
    fn entry_symbol(&self, entry: &TokenBalance) -> Option<Symbol> {
        self.registry.symbol_for_address(&entry.token).or_else(|| {
            entry
                .symbol
                .as_deref()
                .and_then(Symbol::try_new)
                .filter(|s| self.registry.contains(s))
        })
    }

    fn receipt(&self, tx: Transaction, from: Symbol, to: Symbol) -> TradeReceipt {
        TradeReceipt {
            id: tx.id,
            from,
            to,
            from_amount: tx.from_amount,
            to_amount: tx.to_amount,
            timestamp: tx.timestamp,
        }
    }
}

/// Merge per-chain entries of the same symbol.
pub fn merge_balances(entries: impl IntoIterator<Item = (Symbol, f64, Option<f64>)>) -> Vec<Balance> {
    let mut merged: Vec<Balance> = Vec::new();
    for (symbol, amount, price) in entries {
        match merged.iter_mut().find(|b| b.symbol == symbol) {
            Some(existing) => {
                existing.amount += amount;
                if existing.price.is_none() {
                    existing.price = price;
                }
            }
            None => merged.push(Balance {
                symbol,
                amount,
                price,
            }),
        }
    }
    merged
}

impl Exchange for RecallExchange {
    fn ping(&self) -> Result<(), BrokerError> {
        self.client.portfolio().map(|_| ())
    }

    fn balances(&self) -> Result<Vec<Balance>, BrokerError> {
        let portfolio = self.client.portfolio()?;
        let mut entries = Vec::with_capacity(portfolio.tokens.len());
        for entry in &portfolio.tokens {
            match self.entry_symbol(entry) {
                Some(symbol) => entries.push((symbol, entry.amount, entry.price)),
                None => debug!("Skipping unregistered token {}", entry.token),
            }
        }
        Ok(merge_balances(entries))
    }

    fn quote(&self, symbol: &Symbol) -> Result<Quote, BrokerError> {
        let info = self.registry.get(symbol)?;
        let resp = self.client.price(&info.address)?;
        match resp.price {
            Some(price) if resp.success || resp.error.is_none() => Ok(Quote {
                symbol: *symbol,
                price,
            }),
            _ => Err(BrokerError::Connection(format!(
                "no price for {symbol}: {}",
                resp.error.as_deref().unwrap_or("empty response")
            ))),
        }
    }

    fn submit_trade(&self, request: &TradeRequest) -> Result<TradeReceipt, BrokerError> {
        let from = self.registry.get(&request.from)?;
        let to = self.registry.get(&request.to)?;

        let body = TradeBody {
            from_token: from.address.clone(),
            to_token: to.address.clone(),
            amount: format_units(request.amount, from.decimals),
            reason: request.reason.clone(),
        };

        let resp = self.client.execute_trade(&body)?;
        if !resp.success {
            return Err(BrokerError::Trade(
                resp.error.unwrap_or_else(|| "trade rejected".to_string()),
            ));
        }
        let tx = resp
            .transaction
            .ok_or_else(|| BrokerError::Parse("trade succeeded without a transaction".into()))?;
        Ok(self.receipt(tx, request.from, request.to))
    }

    fn trade_history(&self) -> Result<Vec<TradeReceipt>, BrokerError> {
        let resp = self.client.trades()?;
        let mut receipts = Vec::with_capacity(resp.trades.len());
        for tx in resp.trades {
            let from = self.registry.symbol_for_address(&tx.from_token);
            let to = self.registry.symbol_for_address(&tx.to_token);
            match (from, to) {
                (Some(from), Some(to)) => receipts.push(self.receipt(tx, from, to)),
                _ => warn!("Skipping trade {} with unregistered tokens", tx.id),
            }
        }
        Ok(receipts)
    }
}
