//! Token registry: symbol ↔ contract address and decimals.
//!
//! Exchange APIs address tokens by contract and count amounts in base units.
//! The registry is the single place that maps a [`Symbol`] to both.

use driftbook::Symbol;
use driftbook::units::{self, UnitsError};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::BrokerError;

/// Contract address and precision of one token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    pub address: String,
    pub decimals: u8,
}

impl TokenInfo {
    pub fn new(address: &str, decimals: u8) -> Self {
        TokenInfo {
            address: address.to_string(),
            decimals,
        }
    }
}

pub const USDC_ADDRESS: &str = "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48";
pub const WETH_ADDRESS: &str = "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2";
pub const WBTC_ADDRESS: &str = "0x2260FAC5E5542a773Aa44fBCfeDf7C193bc2C599";

/// Known tokens, keyed by symbol.
#[derive(Debug, Clone)]
pub struct TokenRegistry {
    tokens: FxHashMap<Symbol, TokenInfo>,
}

impl Default for TokenRegistry {
    /// USDC, WETH and WBTC on Ethereum mainnet.
    fn default() -> Self {
        let mut registry = TokenRegistry::empty();
        registry.insert(Symbol::new("USDC"), TokenInfo::new(USDC_ADDRESS, 6));
        registry.insert(Symbol::new("WETH"), TokenInfo::new(WETH_ADDRESS, 18));
        registry.insert(Symbol::new("WBTC"), TokenInfo::new(WBTC_ADDRESS, 8));
        registry
    }
}

impl TokenRegistry {
    pub fn empty() -> Self {
        TokenRegistry {
            tokens: FxHashMap::default(),
        }
    }

    /// Add or replace a token.
    pub fn insert(&mut self, symbol: Symbol, info: TokenInfo) {
        self.tokens.insert(symbol, info);
    }

    pub fn get(&self, symbol: &Symbol) -> Result<&TokenInfo, BrokerError> {
        self.tokens
            .get(symbol)
            .ok_or_else(|| BrokerError::InvalidSymbol(format!("{symbol} is not a registered token")))
    }

    pub fn contains(&self, symbol: &Symbol) -> bool {
        self.tokens.contains_key(symbol)
    }

    /// Reverse lookup by contract address (case-insensitive hex).
    pub fn symbol_for_address(&self, address: &str) -> Option<Symbol> {
        self.tokens
            .iter()
            .find(|(_, info)| info.address.eq_ignore_ascii_case(address))
            .map(|(&sym, _)| sym)
    }

    /// Convert whole units of `symbol` to its integer base units (truncating).
    pub fn to_base_units(&self, symbol: &Symbol, amount: f64) -> Result<u128, BrokerError> {
        let info = self.get(symbol)?;
        units::to_base_units(amount, info.decimals).map_err(|e| units_error(symbol, e))
    }

    /// Convert integer base units of `symbol` back to whole units.
    pub fn from_base_units(&self, symbol: &Symbol, amount: u128) -> Result<f64, BrokerError> {
        let info = self.get(symbol)?;
        Ok(units::from_base_units(amount, info.decimals))
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Registered symbols, sorted.
    pub fn symbols(&self) -> Vec<Symbol> {
        let mut symbols: Vec<Symbol> = self.tokens.keys().copied().collect();
        symbols.sort();
        symbols
    }
}

fn units_error(symbol: &Symbol, err: UnitsError) -> BrokerError {
    BrokerError::Trade(format!("cannot convert {symbol} amount: {err}"))
}

/// Map a price-feed coin id to the token traded for it.
///
/// `ethereum` trades as WETH and `bitcoin`/`wrapped-bitcoin` as WBTC.
/// Anything else falls back to WETH.
pub fn coin_symbol(coin_id: &str) -> Symbol {
    match coin_id {
        "bitcoin" | "wrapped-bitcoin" => Symbol::new("WBTC"),
        _ => Symbol::new("WETH"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let registry = TokenRegistry::default();
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.get(&Symbol::new("USDC")).unwrap().decimals, 6);
        assert_eq!(registry.get(&Symbol::new("WETH")).unwrap().decimals, 18);
        assert_eq!(registry.get(&Symbol::new("WBTC")).unwrap().decimals, 8);
    }

    #[test]
    fn unknown_symbol_is_invalid() {
        let registry = TokenRegistry::default();
        let err = registry.get(&Symbol::new("DOGE")).unwrap_err();
        assert!(matches!(err, BrokerError::InvalidSymbol(_)));
    }

    #[test]
    fn reverse_lookup_ignores_case() {
        let registry = TokenRegistry::default();
        let lower = WETH_ADDRESS.to_ascii_lowercase();
        assert_eq!(registry.symbol_for_address(&lower), Some(Symbol::new("WETH")));
        assert_eq!(registry.symbol_for_address("0xdead"), None);
    }

    #[test]
    fn base_units_use_token_decimals() {
        let registry = TokenRegistry::default();
        assert_eq!(
            registry.to_base_units(&Symbol::new("WETH"), 1.5).unwrap(),
            1_500_000_000_000_000_000
        );
        assert_eq!(
            registry.to_base_units(&Symbol::new("USDC"), 100.25).unwrap(),
            100_250_000
        );
        assert_eq!(
            registry.from_base_units(&Symbol::new("WBTC"), 50_000_000).unwrap(),
            0.5
        );
    }

    #[test]
    fn negative_amount_is_trade_error() {
        let registry = TokenRegistry::default();
        assert!(matches!(
            registry.to_base_units(&Symbol::new("USDC"), -1.0),
            Err(BrokerError::Trade(_))
        ));
    }

    #[test]
    fn override_replaces_entry() {
        let mut registry = TokenRegistry::default();
        registry.insert(Symbol::new("USDC"), TokenInfo::new("0xabc", 18));
        assert_eq!(registry.get(&Symbol::new("USDC")).unwrap().address, "0xabc");
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn coin_mapping() {
        assert_eq!(coin_symbol("ethereum"), Symbol::new("WETH"));
        assert_eq!(coin_symbol("bitcoin"), Symbol::new("WBTC"));
        assert_eq!(coin_symbol("wrapped-bitcoin"), Symbol::new("WBTC"));
        assert_eq!(coin_symbol("solana"), Symbol::new("WETH"));
    }
}
