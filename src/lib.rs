//! # driftbook
//!
//! A drift-threshold portfolio rebalancing engine with sell-before-buy
//! execution.
//!
//! ## Features
//!
//! - **Pure engine**: [`compute_orders`] works on fetched snapshots, no I/O
//! - **Drift tolerance**: assets within the threshold are never traded
//! - **Two-phase plans**: every sell is issued before any buy
//! - **Halt on failure**: [`execute_plan`] stops at the first rejected order
//! - **Base units**: exact decimal conversion to exchange integer amounts
//! - **Trend signal**: moving-average buy/sell/hold classifier
//!
//! ## Quick Start
//!
//! ```
//! use driftbook::{
//!     compute_orders, HoldingsTable, PriceTable, RebalanceConfig, Side, Symbol,
//!     TargetAllocation,
//! };
//!
//! let weth = Symbol::new("WETH");
//! let wbtc = Symbol::new("WBTC");
//!
//! let targets = TargetAllocation::new([(weth, 0.5), (wbtc, 0.5)]).unwrap();
//! let prices: PriceTable = [(weth, 100.0), (wbtc, 50.0)].into_iter().collect();
//! let holdings: HoldingsTable = [(weth, 3.0), (wbtc, 2.0)].into_iter().collect();
//!
//! // $300 of WETH vs $100 of WBTC: both 25% away from target
//! let plan = compute_orders(&targets, &prices, &holdings, &RebalanceConfig::default()).unwrap();
//!
//! let orders = plan.to_vec();
//! assert_eq!(orders[0].side, Side::Sell);
//! assert_eq!(orders[0].symbol, weth);
//! assert_eq!(orders[1].side, Side::Buy);
//! assert_eq!(orders[1].symbol, wbtc);
//! ```
//!
//! ## Drift Threshold
//!
//! Drift is `(current_value - target_value) / total_value`. A symbol trades
//! only when `|drift| >= drift_threshold` (default 2%):
//!
//! ```
//! use driftbook::{compute_orders, HoldingsTable, PriceTable, RebalanceConfig, Symbol, TargetAllocation};
//!
//! let (a, b) = (Symbol::new("A"), Symbol::new("B"));
//! let targets = TargetAllocation::new([(a, 0.5), (b, 0.5)]).unwrap();
//! let prices: PriceTable = [(a, 100.0), (b, 50.0)].into_iter().collect();
//!
//! // $205 vs $195: 1.25% drift, left alone
//! let holdings: HoldingsTable = [(a, 2.05), (b, 3.9)].into_iter().collect();
//! let plan = compute_orders(&targets, &prices, &holdings, &RebalanceConfig::default()).unwrap();
//! assert!(plan.is_empty());
//!
//! // Tighter tolerance: now both sides trade
//! let tight = RebalanceConfig::default().with_drift_threshold(0.01);
//! let plan = compute_orders(&targets, &prices, &holdings, &tight).unwrap();
//! assert_eq!(plan.len(), 2);
//! ```
//!
//! ## Executing a Plan
//!
//! ```
//! use driftbook::{execute_plan, Order, OrderExecutor, RebalancePlan, Side, Symbol};
//!
//! struct Paper;
//!
//! impl OrderExecutor for Paper {
//!     type Receipt = ();
//!     type Error = String;
//!     fn execute(&mut self, order: &Order) -> Result<(), String> {
//!         if order.side == Side::Sell { Ok(()) } else { Err("insufficient USDC".into()) }
//!     }
//! }
//!
//! let mut plan = RebalancePlan::new();
//! plan.push(Order { symbol: Symbol::new("WBTC"), side: Side::Buy, amount: 1.0, price: 10.0, notional: 10.0 });
//! plan.push(Order { symbol: Symbol::new("WETH"), side: Side::Sell, amount: 1.0, price: 10.0, notional: 10.0 });
//!
//! let report = execute_plan(&plan, &mut Paper);
//! assert_eq!(report.executed_count(), 1); // the sell ran first
//! assert!(!report.is_complete());         // the buy failed; nothing is rolled back
//! ```

mod allocation;
pub mod engine;
mod error;
pub mod execution;
mod market;
mod plan;
mod side;
pub mod trend;
mod types;
pub mod units;

// Re-export public API
pub use allocation::{TargetAllocation, WEIGHT_SUM_TOLERANCE};
pub use engine::{
    AssetValuation, PortfolioValuation, RebalanceConfig, compute_orders, plan_from_valuation,
    valuate,
};
pub use error::RebalanceError;
pub use execution::{ExecutionReport, OrderExecutor, execute_plan};
pub use market::{HoldingsTable, PriceTable};
pub use plan::{Order, Phase, RebalancePlan};
pub use side::Side;
pub use types::{SYMBOL_MAX_LEN, Symbol};
