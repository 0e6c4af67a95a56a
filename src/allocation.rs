//! Target allocation: symbol → weight, validated on construction.

use rustc_hash::FxHashSet;

use crate::error::RebalanceError;
use crate::types::Symbol;

/// Allowed deviation of the weight sum from 1.0.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Target weights for the managed watch-list.
///
/// Invariants (checked by [`TargetAllocation::new`]):
/// - at least one symbol, no duplicates
/// - every weight finite and in (0, 1]
/// - weights sum to 1 within [`WEIGHT_SUM_TOLERANCE`]
///
/// Iteration follows insertion order.
#[derive(Clone, Debug, PartialEq)]
pub struct TargetAllocation {
    entries: Vec<(Symbol, f64)>,
}

impl TargetAllocation {
    /// Validate `(symbol, weight)` pairs into an allocation.
    pub fn new(entries: impl IntoIterator<Item = (Symbol, f64)>) -> Result<Self, RebalanceError> {
        let entries: Vec<(Symbol, f64)> = entries.into_iter().collect();
        if entries.is_empty() {
            return Err(invalid("no target weights"));
        }

        let mut seen = FxHashSet::default();
        for &(sym, weight) in &entries {
            if !seen.insert(sym) {
                return Err(invalid(format!("duplicate symbol {sym}")));
            }
            if !weight.is_finite() || weight <= 0.0 || weight > 1.0 {
                return Err(invalid(format!(
                    "weight for {sym} is {weight}; must be in (0, 1]"
                )));
            }
        }

        let sum: f64 = entries.iter().map(|&(_, w)| w).sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(invalid(format!("weights sum to {sum:.6}, expected 1")));
        }

        Ok(TargetAllocation { entries })
    }

    /// Number of targeted symbols.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false for a constructed allocation; provided for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Weight of `symbol`, or `None` if it is not targeted.
    pub fn weight(&self, symbol: &Symbol) -> Option<f64> {
        self.entries
            .iter()
            .find(|(s, _)| s == symbol)
            .map(|&(_, w)| w)
    }

    /// True if `symbol` is part of the watch-list.
    pub fn contains(&self, symbol: &Symbol) -> bool {
        self.weight(symbol).is_some()
    }

    /// `(symbol, weight)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (Symbol, f64)> + '_ {
        self.entries.iter().copied()
    }

    /// Targeted symbols in insertion order.
    pub fn symbols(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.entries.iter().map(|&(s, _)| s)
    }
}

fn invalid(reason: impl Into<String>) -> RebalanceError {
    RebalanceError::InvalidTargetAllocation {
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weth() -> Symbol {
        Symbol::new("WETH")
    }
    fn wbtc() -> Symbol {
        Symbol::new("WBTC")
    }

    #[test]
    fn accepts_valid_weights() {
        let alloc = TargetAllocation::new([(weth(), 0.6), (wbtc(), 0.4)]).unwrap();
        assert_eq!(alloc.len(), 2);
        assert_eq!(alloc.weight(&weth()), Some(0.6));
        assert!(alloc.contains(&wbtc()));
        assert!(!alloc.contains(&Symbol::new("USDC")));
    }

    #[test]
    fn preserves_insertion_order() {
        let alloc = TargetAllocation::new([(wbtc(), 0.5), (weth(), 0.5)]).unwrap();
        let syms: Vec<_> = alloc.symbols().collect();
        assert_eq!(syms, vec![wbtc(), weth()]);
    }

    #[test]
    fn accepts_sum_within_tolerance() {
        let third = 1.0 / 3.0;
        let alloc = TargetAllocation::new([
            (Symbol::new("A"), third),
            (Symbol::new("B"), third),
            (Symbol::new("C"), third),
        ]);
        assert!(alloc.is_ok());
    }

    #[test]
    fn rejects_empty() {
        let err = TargetAllocation::new([]).unwrap_err();
        assert!(matches!(err, RebalanceError::InvalidTargetAllocation { .. }));
    }

    #[test]
    fn rejects_duplicates() {
        let err = TargetAllocation::new([(weth(), 0.5), (weth(), 0.5)]).unwrap_err();
        assert!(err.to_string().contains("duplicate symbol WETH"));
    }

    #[test]
    fn rejects_non_positive_weight() {
        assert!(TargetAllocation::new([(weth(), 1.0), (wbtc(), 0.0)]).is_err());
        assert!(TargetAllocation::new([(weth(), 1.2), (wbtc(), -0.2)]).is_err());
    }

    #[test]
    fn rejects_nan_weight() {
        assert!(TargetAllocation::new([(weth(), f64::NAN)]).is_err());
    }

    #[test]
    fn rejects_bad_sum() {
        let err = TargetAllocation::new([(weth(), 0.5), (wbtc(), 0.3)]).unwrap_err();
        assert!(err.to_string().contains("0.800000"));
    }
}
