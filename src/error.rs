//! Errors returned by the rebalance engine.

use crate::types::Symbol;

/// Fatal input errors for a rebalance computation.
///
/// Every variant aborts the whole pass: no orders are produced when any
/// of these is returned.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum RebalanceError {
    /// Weights missing, non-positive, duplicated, or not summing to 1.
    #[error("invalid target allocation: {reason}")]
    InvalidTargetAllocation { reason: String },

    /// A targeted symbol has no entry in the price table.
    #[error("no price for targeted symbol {symbol}")]
    MissingPrice { symbol: Symbol },

    /// A targeted symbol has a negative, non-finite, or unusable price.
    #[error("invalid price for {symbol}: {price}")]
    InvalidPrice { symbol: Symbol, price: f64 },

    /// A targeted symbol has a negative or non-finite holding.
    #[error("invalid holding for {symbol}: {quantity}")]
    InvalidHolding { symbol: Symbol, quantity: f64 },

    /// Total value of the targeted symbols is zero or negative.
    #[error("portfolio value of targeted symbols is {total_value}; nothing to rebalance against")]
    EmptyPortfolio { total_value: f64 },

    /// Engine configuration out of range.
    #[error("invalid rebalance config: {reason}")]
    InvalidConfig { reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_carries_context() {
        let err = RebalanceError::MissingPrice {
            symbol: Symbol::new("WETH"),
        };
        assert_eq!(err.to_string(), "no price for targeted symbol WETH");

        let err = RebalanceError::EmptyPortfolio { total_value: 0.0 };
        assert!(err.to_string().contains("is 0"));
    }

    #[test]
    fn is_std_error() {
        let err: Box<dyn std::error::Error> = Box::new(RebalanceError::InvalidConfig {
            reason: "drift threshold must be in [0, 1)".into(),
        });
        assert!(err.to_string().contains("drift threshold"));
    }
}
