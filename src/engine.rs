//! Drift-threshold rebalance engine.
//!
//! Pure computation over an already-fetched snapshot: given target weights,
//! prices and holdings, decide which assets have drifted far enough from
//! their target value to trade, and size the trades that put them back.
//!
//! Only targeted symbols count toward portfolio value. Assets held but not
//! on the watch-list are neither valued nor traded.

use crate::allocation::TargetAllocation;
use crate::error::RebalanceError;
use crate::market::{HoldingsTable, PriceTable};
use crate::plan::{Order, RebalancePlan};
use crate::side::Side;
use crate::types::Symbol;

/// Default drift tolerance: 2% of portfolio value.
pub const DEFAULT_DRIFT_THRESHOLD: f64 = 0.02;

/// Default quote (funding) asset.
pub const DEFAULT_QUOTE: &str = "USDC";

/// Engine parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RebalanceConfig {
    /// Minimum |drift| (fraction of total value) that triggers a trade.
    /// Inclusive: a drift exactly at the threshold trades.
    pub drift_threshold: f64,
    /// Funding asset. Never traded directly; sells credit it and buys debit it.
    pub quote: Option<Symbol>,
}

impl Default for RebalanceConfig {
    fn default() -> Self {
        RebalanceConfig {
            drift_threshold: DEFAULT_DRIFT_THRESHOLD,
            quote: Some(Symbol::new(DEFAULT_QUOTE)),
        }
    }
}

impl RebalanceConfig {
    pub fn with_drift_threshold(mut self, threshold: f64) -> Self {
        self.drift_threshold = threshold;
        self
    }

    pub fn with_quote(mut self, quote: Option<Symbol>) -> Self {
        self.quote = quote;
        self
    }

    /// Check that the threshold is finite and in [0, 1).
    pub fn validate(&self) -> Result<(), RebalanceError> {
        let t = self.drift_threshold;
        if !t.is_finite() || !(0.0..1.0).contains(&t) {
            return Err(RebalanceError::InvalidConfig {
                reason: format!("drift threshold {t} must be in [0, 1)"),
            });
        }
        Ok(())
    }
}

/// Valuation of one targeted asset.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct AssetValuation {
    pub symbol: Symbol,
    pub weight: f64,
    pub quantity: f64,
    pub price: f64,
    pub current_value: f64,
    pub target_value: f64,
    /// `(current_value - target_value) / total_value`; positive = overweight.
    pub drift: f64,
}

impl AssetValuation {
    /// Current share of the targeted portfolio.
    pub fn current_weight(&self) -> f64 {
        self.weight + self.drift
    }

    /// True when `|drift| >= threshold`.
    pub fn in_drift(&self, threshold: f64) -> bool {
        self.drift.abs() >= threshold
    }
}

/// Snapshot valuation of the targeted portfolio.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PortfolioValuation {
    /// Sum of `quantity * price` over targeted symbols. Strictly positive.
    pub total_value: f64,
    /// One entry per targeted symbol, in allocation order.
    pub assets: Vec<AssetValuation>,
}

impl PortfolioValuation {
    /// Largest absolute drift across the targeted symbols.
    pub fn max_abs_drift(&self) -> f64 {
        self.assets
            .iter()
            .map(|a| a.drift.abs())
            .fold(0.0, f64::max)
    }

    /// Valuation entry for `symbol`, if targeted.
    pub fn asset(&self, symbol: &Symbol) -> Option<&AssetValuation> {
        self.assets.iter().find(|a| a.symbol == *symbol)
    }
}

/// Value the targeted portfolio and compute each symbol's drift.
///
/// Fails with [`RebalanceError::MissingPrice`] before anything else if a
/// targeted symbol is unpriced, and with [`RebalanceError::EmptyPortfolio`]
/// if the targeted holdings are worth nothing.
pub fn valuate(
    targets: &TargetAllocation,
    prices: &PriceTable,
    holdings: &HoldingsTable,
) -> Result<PortfolioValuation, RebalanceError> {
    let mut priced = Vec::with_capacity(targets.len());
    for (symbol, weight) in targets.iter() {
        let price = prices
            .get(&symbol)
            .ok_or(RebalanceError::MissingPrice { symbol })?;
        priced.push((symbol, weight, price));
    }

    for &(symbol, _, price) in &priced {
        if !price.is_finite() || price < 0.0 {
            return Err(RebalanceError::InvalidPrice { symbol, price });
        }
        let quantity = holdings.quantity(&symbol);
        if !quantity.is_finite() || quantity < 0.0 {
            return Err(RebalanceError::InvalidHolding { symbol, quantity });
        }
    }

    let total_value: f64 = priced
        .iter()
        .map(|&(symbol, _, price)| holdings.quantity(&symbol) * price)
        .sum();
    if total_value.is_nan() || total_value <= 0.0 {
        return Err(RebalanceError::EmptyPortfolio { total_value });
    }

    let assets = priced
        .into_iter()
        .map(|(symbol, weight, price)| {
            let quantity = holdings.quantity(&symbol);
            let current_value = quantity * price;
            let target_value = total_value * weight;
            AssetValuation {
                symbol,
                weight,
                quantity,
                price,
                current_value,
                target_value,
                drift: (current_value - target_value) / total_value,
            }
        })
        .collect();

    Ok(PortfolioValuation {
        total_value,
        assets,
    })
}

/// Compute the orders that bring every drifted symbol back to its target.
///
/// Symbols with `|drift| < config.drift_threshold` are left alone. The
/// quote asset is valued but never ordered. The returned plan lists sells
/// before buys, each in allocation order; it is empty when the portfolio
/// is already within tolerance.
pub fn compute_orders(
    targets: &TargetAllocation,
    prices: &PriceTable,
    holdings: &HoldingsTable,
    config: &RebalanceConfig,
) -> Result<RebalancePlan, RebalanceError> {
    config.validate()?;
    let valuation = valuate(targets, prices, holdings)?;
    plan_from_valuation(&valuation, config)
}

/// Second half of [`compute_orders`], for callers that already hold a valuation.
pub fn plan_from_valuation(
    valuation: &PortfolioValuation,
    config: &RebalanceConfig,
) -> Result<RebalancePlan, RebalanceError> {
    let mut plan = RebalancePlan::new();

    for asset in &valuation.assets {
        if !asset.in_drift(config.drift_threshold) {
            continue;
        }
        if config.quote == Some(asset.symbol) {
            continue;
        }

        let excess = asset.current_value - asset.target_value;
        let notional = excess.abs();
        if notional == 0.0 {
            continue;
        }
        if asset.price <= 0.0 {
            return Err(RebalanceError::InvalidPrice {
                symbol: asset.symbol,
                price: asset.price,
            });
        }

        plan.push(Order {
            symbol: asset.symbol,
            side: Side::correcting(excess),
            amount: notional / asset.price,
            price: asset.price,
            notional,
        });
    }

    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn a() -> Symbol {
        Symbol::new("A")
    }
    fn b() -> Symbol {
        Symbol::new("B")
    }

    fn half_half() -> TargetAllocation {
        TargetAllocation::new([(a(), 0.5), (b(), 0.5)]).unwrap()
    }

    fn prices() -> PriceTable {
        [(a(), 100.0), (b(), 50.0)].into_iter().collect()
    }

    #[test]
    fn sells_overweight_buys_underweight() {
        let holdings: HoldingsTable = [(a(), 3.0), (b(), 2.0)].into_iter().collect();
        let plan =
            compute_orders(&half_half(), &prices(), &holdings, &RebalanceConfig::default())
                .unwrap();

        let orders = plan.to_vec();
        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0].symbol, a());
        assert_eq!(orders[0].side, Side::Sell);
        assert!((orders[0].amount - 1.0).abs() < 1e-12);
        assert_eq!(orders[1].symbol, b());
        assert_eq!(orders[1].side, Side::Buy);
        assert!((orders[1].amount - 2.0).abs() < 1e-12);
    }

    #[test]
    fn within_tolerance_is_noop() {
        let holdings: HoldingsTable = [(a(), 2.05), (b(), 3.9)].into_iter().collect();
        let plan =
            compute_orders(&half_half(), &prices(), &holdings, &RebalanceConfig::default())
                .unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn valuation_reports_drift() {
        let holdings: HoldingsTable = [(a(), 3.0), (b(), 2.0)].into_iter().collect();
        let val = valuate(&half_half(), &prices(), &holdings).unwrap();
        assert_eq!(val.total_value, 400.0);
        let va = val.asset(&a()).unwrap();
        assert_eq!(va.current_value, 300.0);
        assert_eq!(va.target_value, 200.0);
        assert!((va.drift - 0.25).abs() < 1e-12);
        assert!((va.current_weight() - 0.75).abs() < 1e-12);
        assert!((val.max_abs_drift() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn untargeted_holdings_are_ignored() {
        let holdings: HoldingsTable = [(a(), 3.0), (b(), 2.0), (Symbol::new("Z"), 1e9)]
            .into_iter()
            .collect();
        let mut px = prices();
        px.insert(Symbol::new("Z"), 1.0);
        let val = valuate(&half_half(), &px, &holdings).unwrap();
        assert_eq!(val.total_value, 400.0);
    }

    #[test]
    fn missing_holding_counts_as_zero() {
        let holdings: HoldingsTable = [(a(), 4.0)].into_iter().collect();
        let plan =
            compute_orders(&half_half(), &prices(), &holdings, &RebalanceConfig::default())
                .unwrap();
        let buy = plan.buys()[0];
        assert_eq!(buy.symbol, b());
        assert!((buy.amount - 4.0).abs() < 1e-12); // $200 / $50
    }

    #[test]
    fn quote_asset_is_never_ordered() {
        let usdc = Symbol::new("USDC");
        let targets = TargetAllocation::new([(a(), 0.5), (usdc, 0.5)]).unwrap();
        let px: PriceTable = [(a(), 100.0), (usdc, 1.0)].into_iter().collect();
        let holdings: HoldingsTable = [(usdc, 1_000.0)].into_iter().collect();

        let plan = compute_orders(&targets, &px, &holdings, &RebalanceConfig::default()).unwrap();
        assert!(plan.sells().is_empty());
        assert_eq!(plan.buys().len(), 1);
        assert_eq!(plan.buys()[0].symbol, a());
        assert!((plan.buys()[0].amount - 5.0).abs() < 1e-12);
    }

    #[test]
    fn quote_can_be_disabled() {
        let usdc = Symbol::new("USDC");
        let targets = TargetAllocation::new([(a(), 0.5), (usdc, 0.5)]).unwrap();
        let px: PriceTable = [(a(), 100.0), (usdc, 1.0)].into_iter().collect();
        let holdings: HoldingsTable = [(usdc, 1_000.0)].into_iter().collect();

        let config = RebalanceConfig::default().with_quote(None);
        let plan = compute_orders(&targets, &px, &holdings, &config).unwrap();
        assert_eq!(plan.len(), 2);
        assert_eq!(plan.sells()[0].symbol, usdc);
    }

    #[test]
    fn missing_price_is_fatal() {
        let px: PriceTable = [(a(), 100.0)].into_iter().collect();
        let holdings: HoldingsTable = [(a(), 1.0)].into_iter().collect();
        let err = compute_orders(&half_half(), &px, &holdings, &RebalanceConfig::default())
            .unwrap_err();
        assert_eq!(err, RebalanceError::MissingPrice { symbol: b() });
    }

    #[test]
    fn zero_holdings_is_empty_portfolio() {
        let err = compute_orders(
            &half_half(),
            &prices(),
            &HoldingsTable::new(),
            &RebalanceConfig::default(),
        )
        .unwrap_err();
        assert_eq!(err, RebalanceError::EmptyPortfolio { total_value: 0.0 });
    }

    #[test]
    fn zero_price_with_positive_total_is_invalid() {
        let px: PriceTable = [(a(), 100.0), (b(), 0.0)].into_iter().collect();
        let holdings: HoldingsTable = [(a(), 1.0)].into_iter().collect();
        let err = compute_orders(&half_half(), &px, &holdings, &RebalanceConfig::default())
            .unwrap_err();
        assert!(matches!(err, RebalanceError::InvalidPrice { symbol, .. } if symbol == b()));
    }

    #[test]
    fn negative_inputs_rejected() {
        let px: PriceTable = [(a(), -1.0), (b(), 50.0)].into_iter().collect();
        let holdings: HoldingsTable = [(a(), 1.0), (b(), 1.0)].into_iter().collect();
        assert!(matches!(
            compute_orders(&half_half(), &px, &holdings, &RebalanceConfig::default()),
            Err(RebalanceError::InvalidPrice { .. })
        ));

        let holdings: HoldingsTable = [(a(), -1.0), (b(), 1.0)].into_iter().collect();
        assert!(matches!(
            compute_orders(&half_half(), &prices(), &holdings, &RebalanceConfig::default()),
            Err(RebalanceError::InvalidHolding { .. })
        ));
    }

    #[test]
    fn bad_threshold_rejected() {
        let holdings: HoldingsTable = [(a(), 1.0), (b(), 1.0)].into_iter().collect();
        for t in [-0.1, 1.0, f64::NAN] {
            let config = RebalanceConfig::default().with_drift_threshold(t);
            assert!(matches!(
                compute_orders(&half_half(), &prices(), &holdings, &config),
                Err(RebalanceError::InvalidConfig { .. })
            ));
        }
    }

    #[test]
    fn zero_threshold_skips_exact_matches() {
        // Exactly on target: drift 0 >= 0 but nothing to move
        let holdings: HoldingsTable = [(a(), 2.0), (b(), 4.0)].into_iter().collect();
        let config = RebalanceConfig::default().with_drift_threshold(0.0);
        let plan = compute_orders(&half_half(), &prices(), &holdings, &config).unwrap();
        assert!(plan.is_empty());
    }
}
