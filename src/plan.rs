//! Rebalance orders and the two-phase plan that carries them.
//!
//! A [`RebalancePlan`] keeps sells and buys in separate phases, so the
//! sell-before-buy ordering is a property of the type rather than of how a
//! list happened to be concatenated. Sells turn overweight assets into the
//! quote asset that the buys then spend.

use std::fmt;

use crate::side::Side;
use crate::types::Symbol;

/// A single rebalance order.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Order {
    pub symbol: Symbol,
    pub side: Side,
    /// Quantity of `symbol` to trade, in whole units. Always positive.
    pub amount: f64,
    /// Unit price the order was sized with.
    pub price: f64,
    /// `amount * price`, in USD.
    pub notional: f64,
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} (${:.2} @ ${:.2})",
            self.side, self.amount, self.symbol, self.notional, self.price
        )
    }
}

/// Execution phase of a plan.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Phase {
    /// Phase 1: drain overweight assets into the quote asset.
    Sell,
    /// Phase 2: spend the quote asset on underweight assets.
    Buy,
}

impl Phase {
    /// The order side every order in this phase carries.
    pub fn side(self) -> Side {
        match self {
            Phase::Sell => Side::Sell,
            Phase::Buy => Side::Buy,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Sell => write!(f, "sell phase"),
            Phase::Buy => write!(f, "buy phase"),
        }
    }
}

/// Orders needed to bring a portfolio back within tolerance, sells first.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RebalancePlan {
    sells: Vec<Order>,
    buys: Vec<Order>,
}

impl RebalancePlan {
    /// An empty plan (portfolio already balanced).
    pub fn new() -> Self {
        Self::default()
    }

    /// Route an order into its phase, preserving discovery order within it.
    pub fn push(&mut self, order: Order) {
        match order.side {
            Side::Sell => self.sells.push(order),
            Side::Buy => self.buys.push(order),
        }
    }

    /// Phase 1 orders.
    pub fn sells(&self) -> &[Order] {
        &self.sells
    }

    /// Phase 2 orders.
    pub fn buys(&self) -> &[Order] {
        &self.buys
    }

    /// Both phases, sell phase first.
    pub fn phases(&self) -> [(Phase, &[Order]); 2] {
        [(Phase::Sell, &self.sells), (Phase::Buy, &self.buys)]
    }

    /// Every order in execution order: all sells, then all buys.
    pub fn orders(&self) -> impl Iterator<Item = &Order> {
        self.sells.iter().chain(self.buys.iter())
    }

    /// Flattened copy of [`RebalancePlan::orders`].
    pub fn to_vec(&self) -> Vec<Order> {
        self.orders().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.sells.len() + self.buys.len()
    }

    /// True when nothing is out of tolerance.
    pub fn is_empty(&self) -> bool {
        self.sells.is_empty() && self.buys.is_empty()
    }

    /// USD raised by the sell phase.
    pub fn sell_notional(&self) -> f64 {
        self.sells.iter().map(|o| o.notional).sum()
    }

    /// USD spent by the buy phase.
    pub fn buy_notional(&self) -> f64 {
        self.buys.iter().map(|o| o.notional).sum()
    }

    /// Net USD credited to the quote asset (negative when buys outspend sells).
    pub fn net_quote_flow(&self) -> f64 {
        self.sell_notional() - self.buy_notional()
    }
}
