//! Two-phase plan execution: drain sells, then issue buys.
//!
//! [`execute_plan`] walks a [`RebalancePlan`] one order at a time through an
//! [`OrderExecutor`]. The first failure halts the pass: later buys may
//! depend on the proceeds of the sell that failed, so nothing after it is
//! attempted. Orders that already went through are not reversed; a fresh
//! pass recomputes drift from the resulting holdings.

use crate::plan::{Order, Phase, RebalancePlan};

/// Submits a single order somewhere (an exchange, a simulator, a test double).
pub trait OrderExecutor {
    /// What a successful submission returns (fill receipt, trade id, ...).
    type Receipt;
    /// Transport- or exchange-level failure for one order.
    type Error;

    fn execute(&mut self, order: &Order) -> Result<Self::Receipt, Self::Error>;
}

/// An order that went through.
#[derive(Debug, Clone)]
pub struct Executed<R> {
    pub phase: Phase,
    pub order: Order,
    pub receipt: R,
}

/// The order that halted the pass.
#[derive(Debug, Clone)]
pub struct Failed<E> {
    pub phase: Phase,
    pub order: Order,
    pub error: E,
}

/// Outcome of one pass over a plan.
#[derive(Debug, Clone)]
pub struct ExecutionReport<R, E> {
    /// Successful orders, in submission order.
    pub executed: Vec<Executed<R>>,
    /// First failure, if any.
    pub failure: Option<Failed<E>>,
    /// Orders never attempted because of the failure.
    pub skipped: Vec<Order>,
}

impl<R, E> ExecutionReport<R, E> {
    /// True when every order in the plan executed.
    pub fn is_complete(&self) -> bool {
        self.failure.is_none()
    }

    /// Number of orders that executed.
    pub fn executed_count(&self) -> usize {
        self.executed.len()
    }

    /// USD notional that actually went through in `phase`.
    pub fn executed_notional(&self, phase: Phase) -> f64 {
        self.executed
            .iter()
            .filter(|e| e.phase == phase)
            .map(|e| e.order.notional)
            .sum()
    }
}

/// Execute `plan` sequentially: every sell, then every buy.
///
/// Stops at the first error and reports the remaining orders as skipped.
pub fn execute_plan<X: OrderExecutor>(
    plan: &RebalancePlan,
    executor: &mut X,
) -> ExecutionReport<X::Receipt, X::Error> {
    let mut report = ExecutionReport {
        executed: Vec::with_capacity(plan.len()),
        failure: None,
        skipped: Vec::new(),
    };

    for (phase, orders) in plan.phases() {
        for order in orders {
            if report.failure.is_some() {
                report.skipped.push(*order);
                continue;
            }
            match executor.execute(order) {
                Ok(receipt) => report.executed.push(Executed {
                    phase,
                    order: *order,
                    receipt,
                }),
                Err(error) => {
                    report.failure = Some(Failed {
                        phase,
                        order: *order,
                        error,
                    })
                }
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::side::Side;
    use crate::types::Symbol;

    /// Records submissions and fails the n-th one (0-based) if configured.
    struct Recorder {
        seen: Vec<Order>,
        fail_at: Option<usize>,
    }

    impl OrderExecutor for Recorder {
        type Receipt = usize;
        type Error = String;

        fn execute(&mut self, order: &Order) -> Result<usize, String> {
            let idx = self.seen.len();
            self.seen.push(*order);
            if self.fail_at == Some(idx) {
                Err(format!("rejected {}", order.symbol))
            } else {
                Ok(idx)
            }
        }
    }

    fn order(sym: &str, side: Side) -> Order {
        Order {
            symbol: Symbol::new(sym),
            side,
            amount: 1.0,
            price: 10.0,
            notional: 10.0,
        }
    }

    fn plan() -> RebalancePlan {
        let mut plan = RebalancePlan::new();
        plan.push(order("B1", Side::Buy));
        plan.push(order("S1", Side::Sell));
        plan.push(order("B2", Side::Buy));
        plan.push(order("S2", Side::Sell));
        plan
    }

    #[test]
    fn sells_execute_before_buys() {
        let mut rec = Recorder {
            seen: Vec::new(),
            fail_at: None,
        };
        let report = execute_plan(&plan(), &mut rec);

        assert!(report.is_complete());
        let order: Vec<&str> = rec.seen.iter().map(|o| o.symbol.as_str()).collect();
        assert_eq!(order, vec!["S1", "S2", "B1", "B2"]);
        assert_eq!(report.executed_notional(Phase::Sell), 20.0);
    }

    #[test]
    fn failed_sell_blocks_all_buys() {
        let mut rec = Recorder {
            seen: Vec::new(),
            fail_at: Some(1),
        };
        let report = execute_plan(&plan(), &mut rec);

        assert!(!report.is_complete());
        assert_eq!(report.executed_count(), 1);
        let failure = report.failure.unwrap();
        assert_eq!(failure.phase, Phase::Sell);
        assert_eq!(failure.order.symbol.as_str(), "S2");
        assert_eq!(failure.error, "rejected S2");
        assert_eq!(report.skipped.len(), 2);
        assert!(report.skipped.iter().all(|o| o.side == Side::Buy));
        // nothing after the failure was submitted
        assert_eq!(rec.seen.len(), 2);
    }

    #[test]
    fn failed_buy_keeps_earlier_orders() {
        let mut rec = Recorder {
            seen: Vec::new(),
            fail_at: Some(2),
        };
        let report = execute_plan(&plan(), &mut rec);

        assert_eq!(report.executed_count(), 2);
        assert_eq!(report.failure.as_ref().unwrap().phase, Phase::Buy);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].symbol.as_str(), "B2");
    }

    #[test]
    fn empty_plan_is_complete() {
        let mut rec = Recorder {
            seen: Vec::new(),
            fail_at: Some(0),
        };
        let report = execute_plan(&RebalancePlan::new(), &mut rec);
        assert!(report.is_complete());
        assert!(rec.seen.is_empty());
    }
}
