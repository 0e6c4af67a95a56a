//! Execution orchestrator: snapshot → plan → risk → confirm → execute →
//! reconcile.
//!
//! This is the main workflow that ties together all components. Every
//! entry point has a `*_with` form taking the exchange explicitly, which is
//! what the integration tests drive.

use std::path::Path;
use std::time::Duration;

use driftbook::execution::execute_plan;
use driftbook::{
    Order, OrderExecutor, Phase, PortfolioValuation, RebalanceError, RebalancePlan, Side, Symbol,
    TargetAllocation, plan_from_valuation, valuate,
};
use driftbook_broker::coingecko::CoinGeckoClient;
use driftbook_broker::{BrokerError, Exchange, PriceHistory, TradeReceipt};
use log::{error, info, warn};

use crate::audit::{self, AuditLog};
use crate::broker::{self, ExchangeExecutor};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::reconcile;
use crate::risk;
use crate::schedule::{ScheduleSummary, Scheduler};
use crate::target;
use crate::trend::{self, CoinTrend};

/// Options for a rebalance pass.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub dry_run: bool,
    pub force: bool,
    pub target_file: String,
}

/// How a pass ended, when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every asset was already within tolerance.
    Balanced,
    /// Plan shown, nothing submitted.
    DryRun { orders: usize },
    /// The operator declined at the prompt.
    Declined,
    /// Every order in the plan executed.
    Executed { orders: usize },
}

/// Options for the `schedule` command.
#[derive(Debug, Clone, Default)]
pub struct ScheduleOptions {
    /// Overrides `schedule.interval_hours`.
    pub interval_hours: Option<u64>,
    /// Stop after this many passes.
    pub runs: Option<usize>,
    pub dry_run: bool,
    pub force: bool,
}

/// Symbols that need a price: every target plus the quote asset.
pub fn collect_symbols(targets: &TargetAllocation, quote: Symbol) -> Vec<Symbol> {
    let mut symbols: Vec<Symbol> = targets.symbols().collect();
    if !symbols.contains(&quote) {
        symbols.push(quote);
    }
    symbols
}

/// Run one rebalance pass against the configured exchange.
pub fn run(config: &Config, targets: &TargetAllocation, opts: &RunOptions) -> Result<RunOutcome> {
    let exchange = broker::connect(config)?;
    let mut audit = AuditLog::open(&config.audit_path())?;
    run_with(&exchange, config, targets, opts, &mut audit)
}

/// Run one rebalance pass against `exchange`.
pub fn run_with<E: Exchange + ?Sized>(
    exchange: &E,
    config: &Config,
    targets: &TargetAllocation,
    opts: &RunOptions,
    audit: &mut AuditLog,
) -> Result<RunOutcome> {
    // 1. Start the audit trail
    audit::log_run_started(audit, &opts.target_file, &config.exchange.base_url)?;

    let quote = config.quote()?;
    let registry = config.token_registry()?;
    let engine = config.rebalance_config()?;

    // 2. Fetch holdings and fresh prices
    let symbols = collect_symbols(targets, quote);
    let snap = broker::snapshot(exchange, &symbols)?;

    // 3. Value the portfolio and compute the plan
    let valuation = valuate(targets, &snap.prices, &snap.holdings)?;
    audit::log_holdings(audit, &valuation)?;
    display_valuation(&valuation);

    let plan = plan_from_valuation(&valuation, &engine)?;
    if plan.is_empty() {
        println!(
            "\nNo rebalancing needed: every asset is within {:.2}% of target.",
            engine.drift_threshold * 100.0
        );
        audit.log_simple("no_rebalance_needed")?;
        return Ok(RunOutcome::Balanced);
    }

    audit::log_plan(audit, &plan)?;
    display_plan(&plan);
    println!();

    // 4. Risk checks
    let quote_price = snap
        .prices
        .get(&quote)
        .ok_or(RebalanceError::MissingPrice { symbol: quote })?;
    let quote_value = snap.holdings.quantity(&quote) * quote_price;
    let risk_report = risk::check_risk(&plan, &valuation, quote_value, config);

    print!("{risk_report}");
    audit::log_risk_check(audit, &risk_report)?;

    if risk_report.has_failures() {
        return Err(Error::RiskFailed(format!(
            "{} failed, aborting",
            risk_report.failures().join(", ")
        )));
    }

    // 5. Dry run stops here
    if opts.dry_run {
        println!("\n[DRY RUN] No trades submitted.");
        return Ok(RunOutcome::DryRun { orders: plan.len() });
    }

    // 6. Confirm execution
    if !opts.force {
        let confirmed = dialoguer::Confirm::new()
            .with_prompt("Execute?")
            .default(false)
            .interact()
            .map_err(|e| Error::Aborted(format!("confirmation prompt failed: {e}")))?;

        audit.log("user_confirmed", serde_json::json!({ "approved": confirmed }))?;
        if !confirmed {
            println!("Aborted.");
            return Ok(RunOutcome::Declined);
        }
    }

    // 7. Execute, sells first, halting on the first failure
    let report = {
        let inner = ExchangeExecutor::new(
            exchange,
            &registry,
            quote,
            quote_price,
            config.order_interval(),
        );
        let mut executor = AuditedExecutor {
            inner,
            audit: &mut *audit,
            total: plan.len(),
            attempted: 0,
        };
        execute_plan(&plan, &mut executor)
    };

    let failed = usize::from(report.failure.is_some());
    let completed =
        audit::log_run_completed(audit, report.executed_count(), failed, report.skipped.len());
    if let Err(e) = completed {
        error!("Audit write failed for run_completed: {e}");
    }
    println!(
        "\n{} executed, {failed} failed, {} not attempted. Audit logged to {}",
        report.executed_count(),
        report.skipped.len(),
        config.audit_path().display()
    );

    // 8. Reconcile against the post-trade holdings
    info!("Running post-execution reconciliation...");
    match reconcile_with(exchange, config, targets) {
        Ok(rec) => print!("\n{rec}"),
        Err(e) => warn!("Reconciliation skipped: {e}"),
    }

    match report.failure {
        Some(failure) => Err(Error::OrderFailed {
            symbol: failure.order.symbol,
            side: failure.order.side,
            reason: failure.error.to_string(),
            executed: report.executed.len(),
            skipped: report.skipped.len(),
        }),
        None => Ok(RunOutcome::Executed {
            orders: report.executed.len(),
        }),
    }
}

/// Wraps an executor to print and audit every order as it goes through.
struct AuditedExecutor<'a, X> {
    inner: X,
    audit: &'a mut AuditLog,
    total: usize,
    attempted: usize,
}

impl<X> OrderExecutor for AuditedExecutor<'_, X>
where
    X: OrderExecutor<Receipt = TradeReceipt, Error = BrokerError>,
{
    type Receipt = TradeReceipt;
    type Error = Error;

    fn execute(&mut self, order: &Order) -> Result<TradeReceipt> {
        self.attempted += 1;
        let phase = match order.side {
            Side::Sell => Phase::Sell,
            Side::Buy => Phase::Buy,
        };
        print!("[{}/{}] {order} ... ", self.attempted, self.total);

        match self.inner.execute(order) {
            Ok(receipt) => {
                println!(
                    "OK {}: {:.6} {} -> {:.6} {}",
                    receipt.id, receipt.from_amount, receipt.from, receipt.to_amount, receipt.to
                );
                // The trade has settled; a lost audit line must not turn it into a failure
                if let Err(e) = audit::log_order_executed(self.audit, phase, order, &receipt) {
                    error!("Audit write failed for {}: {e}", receipt.id);
                }
                Ok(receipt)
            }
            Err(e) => {
                println!("FAILED");
                error!("{} {} failed: {e}", order.side, order.symbol);
                let logged = audit::log_order_failed(self.audit, phase, order, &e.to_string());
                if let Err(audit_err) = logged {
                    error!("Audit write failed for {} {}: {audit_err}", order.side, order.symbol);
                }
                Err(e.into())
            }
        }
    }
}

/// Show current balances and their USD value.
pub fn show_positions(config: &Config) -> Result<()> {
    let exchange = broker::connect(config)?;
    show_positions_with(&exchange)
}

pub fn show_positions_with<E: Exchange + ?Sized>(exchange: &E) -> Result<()> {
    let balances = exchange.balances()?;
    if balances.is_empty() {
        println!("No balances.");
        return Ok(());
    }

    println!("CURRENT BALANCES:");
    let mut total = 0.0;
    for b in &balances {
        let price = match b.price {
            Some(p) => Some(p),
            None => exchange.quote(&b.symbol).ok().map(|q| q.price),
        };
        match price {
            Some(p) => {
                let value = p * b.amount;
                total += value;
                println!(
                    "  {:8} {:>18.6} @ ${:>10.4} = ${:>12.2}",
                    b.symbol, b.amount, p, value
                );
            }
            None => println!("  {:8} {:>18.6} (no price)", b.symbol, b.amount),
        }
    }
    println!("\n  Total: ${total:.2}");
    Ok(())
}

/// Check exchange connectivity and credentials.
pub fn check_status(config: &Config) -> Result<()> {
    print!("Connecting to {}... ", config.exchange.base_url);
    let exchange = broker::connect(config)?;
    check_status_with(&exchange)
}

pub fn check_status_with<E: Exchange + ?Sized>(exchange: &E) -> Result<()> {
    exchange.ping()?;
    println!("OK");

    let balances = exchange.balances()?;
    let total: f64 = balances.iter().filter_map(|b| b.value()).sum();
    println!("{} tokens, ${total:.2} priced value", balances.len());
    Ok(())
}

/// Print a drift report against `targets` without trading.
pub fn run_reconcile(config: &Config, targets: &TargetAllocation) -> Result<()> {
    let exchange = broker::connect(config)?;
    let report = reconcile_with(&exchange, config, targets)?;
    print!("{report}");
    Ok(())
}

pub fn reconcile_with<E: Exchange + ?Sized>(
    exchange: &E,
    config: &Config,
    targets: &TargetAllocation,
) -> Result<reconcile::ReconcileReport> {
    let symbols = collect_symbols(targets, config.quote()?);
    let snap = broker::snapshot(exchange, &symbols)?;
    let valuation = valuate(targets, &snap.prices, &snap.holdings)?;
    Ok(reconcile::reconcile(&valuation))
}

/// Rebalance on a fixed interval until `opts.runs` passes have run.
pub fn run_schedule(config: &Config, target_path: &Path, opts: &ScheduleOptions) -> Result<()> {
    let exchange = broker::connect(config)?;
    let summary = run_schedule_with(&exchange, config, target_path, opts, std::thread::sleep);
    println!(
        "\nSchedule finished: {} passes, {} failed.",
        summary.passes, summary.failures
    );
    Ok(())
}

/// Scheduled loop against `exchange`. The targets file is re-read for every
/// pass, so edits take effect on the next tick.
pub fn run_schedule_with<E, S>(
    exchange: &E,
    config: &Config,
    target_path: &Path,
    opts: &ScheduleOptions,
    sleep: S,
) -> ScheduleSummary
where
    E: Exchange + ?Sized,
    S: FnMut(Duration),
{
    let interval = opts
        .interval_hours
        .map(|h| Duration::from_secs(h.saturating_mul(3_600)))
        .unwrap_or_else(|| config.schedule_interval());
    let run_opts = RunOptions {
        dry_run: opts.dry_run,
        force: opts.force,
        target_file: target_path.display().to_string(),
    };

    Scheduler::new(interval).with_max_runs(opts.runs).run(
        |_| {
            let targets = target::load(target_path)?;
            let mut audit = AuditLog::open(&config.audit_path())?;
            run_with(exchange, config, &targets, &run_opts, &mut audit).map(|_| ())
        },
        sleep,
    )
}

/// Print the moving-average trend report for `coins` (config defaults if empty).
pub fn run_trend(config: &Config, coins: &[String]) -> Result<()> {
    let history = CoinGeckoClient::new(config.trend.history_base_url.as_deref(), config.timeout())?;
    let trends = run_trend_with(&history, config, coins);
    print!("{}", trend::format_report(&trends));
    Ok(())
}

pub fn run_trend_with<H: PriceHistory + ?Sized>(
    history: &H,
    config: &Config,
    coins: &[String],
) -> Vec<CoinTrend> {
    let coins = if coins.is_empty() {
        &config.trend.coins[..]
    } else {
        coins
    };
    trend::analyze_coins(history, coins, config.trend.days, &config.trend.analysis)
}

// === Display ===

fn display_valuation(valuation: &PortfolioValuation) {
    println!("PORTFOLIO (${:.2}):", valuation.total_value);
    println!(
        "  {:8} {:>18} {:>12} {:>12} {:>9} {:>9}",
        "Symbol", "Quantity", "Value", "Target", "Weight%", "Drift%"
    );
    for a in &valuation.assets {
        println!(
            "  {:8} {:>18.6} ${:>11.2} ${:>11.2} {:>8.2}% {:>+8.2}%",
            a.symbol,
            a.quantity,
            a.current_value,
            a.target_value,
            a.current_weight() * 100.0,
            a.drift * 100.0,
        );
    }
}

fn display_plan(plan: &RebalancePlan) {
    println!("\nREBALANCE ORDERS:");
    println!(
        "  {:>3}  {:5} {:8} {:>18} {:>12} {:>12}",
        "#", "Side", "Symbol", "Amount", "Price", "Notional"
    );

    for (i, order) in plan.orders().enumerate() {
        println!(
            "  {:>3}  {:5} {:8} {:>18.6} ${:>11.4} ${:>11.2}",
            i + 1,
            order.side,
            order.symbol,
            order.amount,
            order.price,
            order.notional,
        );
    }

    println!(
        "\nSells ${:.2}, buys ${:.2}, net quote ${:+.2}",
        plan.sell_notional(),
        plan.buy_notional(),
        plan.net_quote_flow()
    );
}
