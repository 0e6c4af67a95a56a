//! JSONL audit trail logging.
//!
//! Each rebalancer pass appends events to an audit.jsonl file, one JSON
//! object per line.

use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use driftbook::{Order, Phase, PortfolioValuation, RebalancePlan};
use driftbook_broker::TradeReceipt;
use serde::Serialize;

use crate::error::Result;
use crate::risk::RiskReport;

/// An audit event written to the JSONL trail.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    pub event: &'static str,
    pub ts: DateTime<Utc>,
    #[serde(flatten)]
    pub data: serde_json::Value,
}

/// Append-only audit logger.
pub struct AuditLog {
    writer: Box<dyn Write + Send>,
}

impl AuditLog {
    /// Open (or create) the audit log file for appending.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self::from_writer(BufWriter::new(file)))
    }

    /// Audit into any writer, one flushed line per event.
    pub fn from_writer<W: Write + Send + 'static>(writer: W) -> Self {
        Self {
            writer: Box::new(writer),
        }
    }

    /// Log an event with arbitrary JSON data.
    pub fn log(&mut self, event: &'static str, data: serde_json::Value) -> Result<()> {
        let entry = AuditEvent {
            event,
            ts: Utc::now(),
            data,
        };
        let mut line = serde_json::to_string(&entry)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        line.push('\n');
        self.writer.write_all(line.as_bytes())?;
        self.writer.flush()?;
        Ok(())
    }

    /// Log a simple event with no additional data.
    pub fn log_simple(&mut self, event: &'static str) -> Result<()> {
        self.log(event, serde_json::json!({}))
    }
}

pub fn log_run_started(audit: &mut AuditLog, target_file: &str, exchange_url: &str) -> Result<()> {
    audit.log(
        "run_started",
        serde_json::json!({
            "target_file": target_file,
            "exchange": exchange_url,
        }),
    )
}

/// Holdings and valuation of the targeted symbols.
pub fn log_holdings(audit: &mut AuditLog, valuation: &PortfolioValuation) -> Result<()> {
    let assets: Vec<_> = valuation
        .assets
        .iter()
        .map(|a| {
            serde_json::json!({
                "symbol": a.symbol.as_str(),
                "qty": a.quantity,
                "price": a.price,
                "value": a.current_value,
                "target_value": a.target_value,
                "drift": a.drift,
            })
        })
        .collect();

    audit.log(
        "holdings_fetched",
        serde_json::json!({
            "assets": assets,
            "total_value": valuation.total_value,
        }),
    )
}

pub fn log_plan(audit: &mut AuditLog, plan: &RebalancePlan) -> Result<()> {
    audit.log(
        "plan_computed",
        serde_json::json!({
            "sells": plan.sells(),
            "buys": plan.buys(),
            "sell_notional": plan.sell_notional(),
            "buy_notional": plan.buy_notional(),
        }),
    )
}

pub fn log_risk_check(audit: &mut AuditLog, report: &RiskReport) -> Result<()> {
    audit.log(
        "risk_check",
        serde_json::json!({
            "passed": !report.has_failures(),
            "checks": report.checks,
        }),
    )
}

pub fn log_order_executed(
    audit: &mut AuditLog,
    phase: Phase,
    order: &Order,
    receipt: &TradeReceipt,
) -> Result<()> {
    audit.log(
        "order_executed",
        serde_json::json!({
            "phase": phase,
            "order": order,
            "tx_id": receipt.id,
            "from_amount": receipt.from_amount,
            "to_amount": receipt.to_amount,
        }),
    )
}

pub fn log_order_failed(audit: &mut AuditLog, phase: Phase, order: &Order, reason: &str) -> Result<()> {
    audit.log(
        "order_failed",
        serde_json::json!({
            "phase": phase,
            "order": order,
            "error": reason,
        }),
    )
}

pub fn log_run_completed(
    audit: &mut AuditLog,
    executed: usize,
    failed: usize,
    skipped: usize,
) -> Result<()> {
    audit.log(
        "run_completed",
        serde_json::json!({
            "executed": executed,
            "failed": failed,
            "skipped": skipped,
        }),
    )
}
