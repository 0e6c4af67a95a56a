//! CLI entry point for the driftbook rebalancer.

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};

use driftbook_rebalancer::config::Config;
use driftbook_rebalancer::error::Error;
use driftbook_rebalancer::execution::{self, RunOptions, ScheduleOptions};
use driftbook_rebalancer::target;

const DEFAULT_CONFIG: &str = "config.toml";

#[derive(Parser)]
#[command(name = "rebalancer")]
#[command(about = "Drift-threshold portfolio rebalancer for the Recall sandbox")]
#[command(version)]
struct Cli {
    /// Path to config.toml (defaults apply when omitted and absent)
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Plan, confirm, and execute one rebalance pass
    Run {
        /// Path to the target weights JSON
        target: PathBuf,

        /// Show plan without executing
        #[arg(long)]
        dry_run: bool,

        /// Skip confirmation prompt (for automation/cron)
        #[arg(long)]
        force: bool,
    },

    /// Show current exchange balances
    Positions,

    /// Check exchange connection and credentials
    Status,

    /// Compare actual holdings vs target
    Reconcile {
        /// Path to the target weights JSON
        target: PathBuf,
    },

    /// Rebalance on a fixed interval
    Schedule {
        /// Path to the target weights JSON, re-read every pass
        target: PathBuf,

        /// Hours between passes (overrides config)
        #[arg(long)]
        interval_hours: Option<u64>,

        /// Stop after this many passes
        #[arg(long)]
        runs: Option<usize>,

        /// Plan only, never submit
        #[arg(long)]
        dry_run: bool,

        /// Skip confirmation prompts
        #[arg(long)]
        force: bool,
    },

    /// Moving-average trend signal per coin
    Trend {
        /// Price-feed coin ids, e.g. ethereum bitcoin (config list if empty)
        coins: Vec<String>,
    },
}

fn load_config(path: Option<&Path>) -> Result<Config, Error> {
    match path {
        Some(path) => Config::load(path),
        None if Path::new(DEFAULT_CONFIG).exists() => Config::load(Path::new(DEFAULT_CONFIG)),
        None => Ok(Config::default()),
    }
}

fn load_target(path: &Path) -> driftbook::TargetAllocation {
    match target::load(path) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Error loading target: {e}");
            process::exit(1);
        }
    }
}

fn main() {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {e}");
            process::exit(1);
        }
    };

    let result = match cli.command {
        Command::Run {
            target,
            dry_run,
            force,
        } => {
            let targets = load_target(&target);
            let opts = RunOptions {
                dry_run,
                force,
                target_file: target.display().to_string(),
            };
            execution::run(&config, &targets, &opts).map(|_| ())
        }
        Command::Positions => execution::show_positions(&config),
        Command::Status => execution::check_status(&config),
        Command::Reconcile { target } => {
            let targets = load_target(&target);
            execution::run_reconcile(&config, &targets)
        }
        Command::Schedule {
            target,
            interval_hours,
            runs,
            dry_run,
            force,
        } => {
            // Fail fast on a broken targets file before the first sleep
            load_target(&target);
            let opts = ScheduleOptions {
                interval_hours,
                runs,
                dry_run,
                force,
            };
            execution::run_schedule(&config, &target, &opts)
        }
        Command::Trend { coins } => execution::run_trend(&config, &coins),
    };

    if let Err(e) = result {
        match &e {
            Error::RiskFailed(msg) => {
                eprintln!("\nAborted: {msg}");
                process::exit(2);
            }
            Error::OrderFailed { .. } => {
                eprintln!("\nHalted: {e}");
                process::exit(3);
            }
            Error::Aborted(msg) => {
                eprintln!("{msg}");
                process::exit(0);
            }
            _ => {
                eprintln!("Error: {e}");
                process::exit(1);
            }
        }
    }
}
