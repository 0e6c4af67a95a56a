//! Error types for the rebalancer.

use std::path::PathBuf;

use driftbook::{RebalanceError, Side, Symbol};
use driftbook_broker::BrokerError;

/// All errors that can occur during rebalancer operation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("failed to read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("target file error: {0}")]
    Target(String),

    #[error("failed to read target file {path}: {source}")]
    TargetRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse target JSON: {0}")]
    TargetParse(#[from] serde_json::Error),

    #[error("rebalance error: {0}")]
    Rebalance(#[from] RebalanceError),

    #[error("exchange error: {0}")]
    Exchange(#[from] BrokerError),

    #[error("risk check failed: {0}")]
    RiskFailed(String),

    #[error(
        "{side} {symbol} failed: {reason} ({executed} executed, {skipped} not attempted)"
    )]
    OrderFailed {
        symbol: Symbol,
        side: Side,
        reason: String,
        executed: usize,
        skipped: usize,
    },

    #[error("execution aborted: {0}")]
    Aborted(String),

    #[error("audit log error: {0}")]
    Audit(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
