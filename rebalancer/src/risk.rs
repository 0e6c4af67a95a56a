//! Pre-trade risk checks.
//!
//! Validates a rebalance plan against configured limits before anything is
//! submitted.

use driftbook::{PortfolioValuation, RebalancePlan};
use serde::Serialize;

use crate::config::Config;

/// Result of running all risk checks.
#[derive(Debug, Clone, Serialize)]
pub struct RiskReport {
    pub checks: Vec<RiskCheck>,
}

/// A single risk check result.
#[derive(Debug, Clone, Serialize)]
pub struct RiskCheck {
    pub name: &'static str,
    pub status: RiskStatus,
    pub detail: String,
}

/// Whether a check passed, warned, or failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RiskStatus {
    Pass,
    Warn,
    Fail,
}

impl std::fmt::Display for RiskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskStatus::Pass => write!(f, "PASS"),
            RiskStatus::Warn => write!(f, "WARN"),
            RiskStatus::Fail => write!(f, "FAIL"),
        }
    }
}

impl RiskReport {
    /// True if any check failed (not just warned).
    pub fn has_failures(&self) -> bool {
        self.checks.iter().any(|c| c.status == RiskStatus::Fail)
    }

    /// True if any check warned.
    pub fn has_warnings(&self) -> bool {
        self.checks.iter().any(|c| c.status == RiskStatus::Warn)
    }

    /// Names of the failed checks.
    pub fn failures(&self) -> Vec<&'static str> {
        self.checks
            .iter()
            .filter(|c| c.status == RiskStatus::Fail)
            .map(|c| c.name)
            .collect()
    }
}

impl std::fmt::Display for RiskReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "RISK CHECKS:")?;
        for check in &self.checks {
            writeln!(f, "  [{}] {}: {}", check.status, check.name, check.detail)?;
        }
        Ok(())
    }
}

fn cmp_word(status: RiskStatus) -> &'static str {
    if status == RiskStatus::Pass { "<=" } else { ">" }
}

/// Run all pre-trade risk checks.
///
/// # Arguments
/// - `plan`: The computed rebalance plan
/// - `valuation`: Valuation the plan was computed from
/// - `quote_value`: USD value of the quote asset already held
/// - `config`: Rebalancer configuration (limits)
pub fn check_risk(
    plan: &RebalancePlan,
    valuation: &PortfolioValuation,
    quote_value: f64,
    config: &Config,
) -> RiskReport {
    let mut checks = Vec::new();

    // 1. Order count
    let max_orders = config.execution.max_orders_per_run;
    let count_status = if plan.len() > max_orders {
        RiskStatus::Fail
    } else {
        RiskStatus::Pass
    };
    checks.push(RiskCheck {
        name: "Order count",
        status: count_status,
        detail: format!(
            "{} orders {} {max_orders} limit",
            plan.len(),
            cmp_word(count_status)
        ),
    });

    // 2. Max trade size, one failure per oversized order
    let max_trade = config.risk.max_trade_usd;
    let mut oversized = false;
    for order in plan.orders() {
        if order.notional > max_trade {
            oversized = true;
            checks.push(RiskCheck {
                name: "Max trade size",
                status: RiskStatus::Fail,
                detail: format!(
                    "{} {}: ${:.2} > ${max_trade:.2} max_trade_usd",
                    order.side, order.symbol, order.notional
                ),
            });
        }
    }
    if !oversized {
        let largest = plan.orders().map(|o| o.notional).fold(0.0, f64::max);
        checks.push(RiskCheck {
            name: "Max trade size",
            status: RiskStatus::Pass,
            detail: format!("largest ${largest:.2} <= ${max_trade:.2} limit"),
        });
    }

    // 3. Buys must be fundable from held quote plus sell proceeds
    let available = quote_value + plan.sell_notional();
    let needed = plan.buy_notional();
    let slack = 1e-9 * needed.max(1.0);
    let funding_status = if needed <= available + slack {
        RiskStatus::Pass
    } else {
        RiskStatus::Warn
    };
    checks.push(RiskCheck {
        name: "Buy funding",
        status: funding_status,
        detail: format!(
            "${needed:.2} of buys vs ${available:.2} quote after sells{}",
            if funding_status == RiskStatus::Pass {
                ""
            } else {
                " (later buys may be rejected)"
            }
        ),
    });

    // 4. Drift summary
    checks.push(RiskCheck {
        name: "Drift",
        status: RiskStatus::Pass,
        detail: format!(
            "max {:.2}% vs {:.2}% threshold, portfolio ${:.2}",
            valuation.max_abs_drift() * 100.0,
            config.rebalance.drift_threshold * 100.0,
            valuation.total_value,
        ),
    });

    RiskReport { checks }
}
