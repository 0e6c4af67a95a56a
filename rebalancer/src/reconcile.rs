//! Reconciliation: compare actual holdings against the target weights.

use driftbook::PortfolioValuation;
use serde::Serialize;

/// Reconciliation report comparing actual vs target.
#[derive(Debug, Clone, Serialize)]
pub struct ReconcileReport {
    pub entries: Vec<ReconcileEntry>,
    pub total_value: f64,
    /// Root-mean-square weight deviation, in percent.
    pub tracking_error_pct: f64,
    pub max_abs_drift: f64,
}

/// One symbol's reconciliation entry.
#[derive(Debug, Clone, Serialize)]
pub struct ReconcileEntry {
    pub symbol: String,
    pub target_weight: f64,
    pub actual_weight: f64,
    pub diff_weight: f64,
    pub target_qty: f64,
    pub actual_qty: f64,
    pub diff_qty: f64,
}

impl ReconcileReport {
    /// True when every symbol is within `threshold` of its target weight.
    pub fn within(&self, threshold: f64) -> bool {
        self.max_abs_drift < threshold
    }
}

/// Build a report from a valuation of the targeted symbols.
pub fn reconcile(valuation: &PortfolioValuation) -> ReconcileReport {
    let mut entries = Vec::with_capacity(valuation.assets.len());
    let mut sum_sq_diff = 0.0_f64;

    for asset in &valuation.assets {
        let target_qty = if asset.price > 0.0 {
            asset.target_value / asset.price
        } else {
            0.0
        };
        let diff_weight = asset.drift;
        sum_sq_diff += diff_weight * diff_weight;

        entries.push(ReconcileEntry {
            symbol: asset.symbol.as_str().to_string(),
            target_weight: asset.weight,
            actual_weight: asset.current_weight(),
            diff_weight,
            target_qty,
            actual_qty: asset.quantity,
            diff_qty: asset.quantity - target_qty,
        });
    }

    let tracking_error_pct = (sum_sq_diff / entries.len().max(1) as f64).sqrt() * 100.0;

    ReconcileReport {
        entries,
        total_value: valuation.total_value,
        tracking_error_pct,
        max_abs_drift: valuation.max_abs_drift(),
    }
}

impl std::fmt::Display for ReconcileReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "RECONCILIATION (${:.2}):", self.total_value)?;
        writeln!(
            f,
            "  {:8} {:>10} {:>10} {:>10} {:>14} {:>14}",
            "Symbol", "Target%", "Actual%", "Diff%", "TargetQty", "ActualQty"
        )?;
        for e in &self.entries {
            writeln!(
                f,
                "  {:8} {:>9.2}% {:>9.2}% {:>+9.2}% {:>14.6} {:>14.6}",
                e.symbol,
                e.target_weight * 100.0,
                e.actual_weight * 100.0,
                e.diff_weight * 100.0,
                e.target_qty,
                e.actual_qty,
            )?;
        }
        writeln!(f, "\n  Tracking error: {:.3}%", self.tracking_error_pct)?;
        Ok(())
    }
}
