//! driftbook-rebalancer: scheduled drift-threshold rebalancing against the
//! Recall trading sandbox.
//!
//! Reads target weights from a JSON file, fetches balances and prices from
//! the exchange, plans sell-before-buy swaps against the quote asset, and
//! executes them with risk checks and an audit trail.

pub mod audit;
pub mod broker;
pub mod config;
pub mod error;
pub mod execution;
pub mod reconcile;
pub mod risk;
pub mod schedule;
pub mod target;
pub mod trend;
