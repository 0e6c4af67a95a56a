//! Per-pass market snapshots: prices and holdings.
//!
//! Both tables are plain maps rebuilt for every rebalance pass. The engine
//! never caches them across calls.

use rustc_hash::FxHashMap;

use crate::types::Symbol;

/// USD price per whole unit, keyed by symbol.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PriceTable {
    prices: FxHashMap<Symbol, f64>,
}

impl PriceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set (or replace) the price of `symbol`.
    pub fn insert(&mut self, symbol: Symbol, price: f64) {
        self.prices.insert(symbol, price);
    }

    /// Price of `symbol`, if known.
    pub fn get(&self, symbol: &Symbol) -> Option<f64> {
        self.prices.get(symbol).copied()
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Symbol, f64)> + '_ {
        self.prices.iter().map(|(&s, &p)| (s, p))
    }
}

impl FromIterator<(Symbol, f64)> for PriceTable {
    fn from_iter<I: IntoIterator<Item = (Symbol, f64)>>(iter: I) -> Self {
        PriceTable {
            prices: iter.into_iter().collect(),
        }
    }
}

/// Quantity held in whole units, keyed by symbol. Missing symbols hold zero.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HoldingsTable {
    quantities: FxHashMap<Symbol, f64>,
}

impl HoldingsTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set (or replace) the quantity held of `symbol`.
    pub fn insert(&mut self, symbol: Symbol, quantity: f64) {
        self.quantities.insert(symbol, quantity);
    }

    /// Add `delta` to the quantity held (negative to reduce).
    pub fn adjust(&mut self, symbol: Symbol, delta: f64) {
        *self.quantities.entry(symbol).or_insert(0.0) += delta;
    }

    /// Quantity held of `symbol`; zero when absent.
    pub fn quantity(&self, symbol: &Symbol) -> f64 {
        self.quantities.get(symbol).copied().unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.quantities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quantities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Symbol, f64)> + '_ {
        self.quantities.iter().map(|(&s, &q)| (s, q))
    }
}

impl FromIterator<(Symbol, f64)> for HoldingsTable {
    fn from_iter<I: IntoIterator<Item = (Symbol, f64)>>(iter: I) -> Self {
        HoldingsTable {
            quantities: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_holding_is_zero() {
        let holdings: HoldingsTable = [(Symbol::new("WETH"), 2.0)].into_iter().collect();
        assert_eq!(holdings.quantity(&Symbol::new("WETH")), 2.0);
        assert_eq!(holdings.quantity(&Symbol::new("WBTC")), 0.0);
    }

    #[test]
    fn adjust_accumulates() {
        let mut holdings = HoldingsTable::new();
        holdings.adjust(Symbol::new("USDC"), 100.0);
        holdings.adjust(Symbol::new("USDC"), -40.0);
        assert_eq!(holdings.quantity(&Symbol::new("USDC")), 60.0);
    }

    #[test]
    fn price_lookup() {
        let mut prices = PriceTable::new();
        prices.insert(Symbol::new("WBTC"), 65_000.0);
        assert_eq!(prices.get(&Symbol::new("WBTC")), Some(65_000.0));
        assert_eq!(prices.get(&Symbol::new("WETH")), None);
        assert_eq!(prices.len(), 1);
    }
}
