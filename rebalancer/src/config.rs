//! TOML configuration loading and validation.
//!
//! Every section is optional; a missing file section takes its defaults.
//! The exchange API key never lives in the file: `exchange.api_key_env`
//! names the environment variable that holds it.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use driftbook::trend::TrendConfig;
use driftbook::{RebalanceConfig, Symbol};
use driftbook_broker::{TokenInfo, TokenRegistry};
use serde::Deserialize;

use crate::error::{Error, Result};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub exchange: ExchangeConfig,
    pub rebalance: RebalanceSection,
    pub execution: ExecutionConfig,
    pub risk: RiskConfig,
    pub schedule: ScheduleConfig,
    pub trend: TrendSection,
    /// Extra or overriding tokens, keyed by symbol.
    pub tokens: BTreeMap<String, TokenInfo>,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    driftbook_broker::recall::DEFAULT_BASE_URL.into()
}
fn default_api_key_env() -> String {
    "RECALL_API_KEY".into()
}
fn default_timeout() -> u64 {
    30
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RebalanceSection {
    #[serde(default = "default_drift_threshold")]
    pub drift_threshold: f64,
    /// Settlement asset; valued but never ordered.
    #[serde(default = "default_quote")]
    pub quote: String,
}

fn default_drift_threshold() -> f64 {
    driftbook::engine::DEFAULT_DRIFT_THRESHOLD
}
fn default_quote() -> String {
    driftbook::engine::DEFAULT_QUOTE.into()
}

impl Default for RebalanceSection {
    fn default() -> Self {
        Self {
            drift_threshold: default_drift_threshold(),
            quote: default_quote(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExecutionConfig {
    /// Pause between consecutive trade submissions.
    #[serde(default = "default_interval")]
    pub order_interval_ms: u64,
    #[serde(default = "default_max_orders")]
    pub max_orders_per_run: usize,
}

fn default_interval() -> u64 {
    1_000
}
fn default_max_orders() -> usize {
    20
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            order_interval_ms: default_interval(),
            max_orders_per_run: default_max_orders(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RiskConfig {
    #[serde(default = "default_max_trade")]
    pub max_trade_usd: f64,
}

fn default_max_trade() -> f64 {
    100_000.0
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            max_trade_usd: default_max_trade(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_interval_hours")]
    pub interval_hours: u64,
}

fn default_interval_hours() -> u64 {
    24
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_hours: default_interval_hours(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrendSection {
    /// Price-feed coin ids analysed when none are given on the command line.
    #[serde(default = "default_coins")]
    pub coins: Vec<String>,
    #[serde(default = "default_days")]
    pub days: u32,
    #[serde(default)]
    pub history_base_url: Option<String>,
    #[serde(default)]
    pub analysis: TrendConfig,
}

fn default_coins() -> Vec<String> {
    vec!["ethereum".into(), "bitcoin".into()]
}
fn default_days() -> u32 {
    7
}

impl Default for TrendSection {
    fn default() -> Self {
        Self {
            coins: default_coins(),
            days: default_days(),
            history_base_url: None,
            analysis: TrendConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_dir")]
    pub dir: String,
    #[serde(default = "default_audit_file")]
    pub audit_file: String,
}

fn default_log_dir() -> String {
    "./logs".into()
}
fn default_audit_file() -> String {
    "audit.jsonl".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: default_log_dir(),
            audit_file: default_audit_file(),
        }
    }
}

impl Config {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::ConfigRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml(&contents)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate config invariants.
    pub fn validate(&self) -> Result<()> {
        self.rebalance_config()?;
        let registry = self.token_registry()?;
        let quote = self.quote()?;
        if !registry.contains(&quote) {
            return Err(Error::Config(format!(
                "quote asset {quote} has no [tokens] entry"
            )));
        }
        if self.exchange.timeout_secs == 0 {
            return Err(Error::Config("timeout_secs must be > 0".into()));
        }
        if self.exchange.api_key_env.is_empty() {
            return Err(Error::Config("api_key_env must not be empty".into()));
        }
        if self.execution.max_orders_per_run == 0 {
            return Err(Error::Config("max_orders_per_run must be > 0".into()));
        }
        if self.risk.max_trade_usd.is_nan() || self.risk.max_trade_usd <= 0.0 {
            return Err(Error::Config("max_trade_usd must be > 0".into()));
        }
        if self.schedule.interval_hours == 0 {
            return Err(Error::Config("interval_hours must be > 0".into()));
        }
        let needed = self.trend.analysis.long_window;
        if (self.trend.days as usize) + 1 < needed {
            return Err(Error::Config(format!(
                "trend.days ({}) too short for a {needed}-close moving average",
                self.trend.days
            )));
        }
        Ok(())
    }

    /// Engine parameters.
    pub fn rebalance_config(&self) -> Result<RebalanceConfig> {
        let config = RebalanceConfig::default()
            .with_drift_threshold(self.rebalance.drift_threshold)
            .with_quote(Some(self.quote()?));
        config.validate()?;
        Ok(config)
    }

    /// The settlement asset.
    pub fn quote(&self) -> Result<Symbol> {
        Symbol::try_new(&self.rebalance.quote)
            .ok_or_else(|| Error::Config(format!("invalid quote symbol {:?}", self.rebalance.quote)))
    }

    /// Default tokens with `[tokens]` overrides applied.
    pub fn token_registry(&self) -> Result<TokenRegistry> {
        let mut registry = TokenRegistry::default();
        for (name, info) in &self.tokens {
            let symbol = Symbol::try_new(name)
                .ok_or_else(|| Error::Config(format!("invalid token symbol {name:?}")))?;
            registry.insert(symbol, info.clone());
        }
        Ok(registry)
    }

    /// Read the API key from the configured environment variable.
    pub fn api_key(&self) -> Result<String> {
        std::env::var(&self.exchange.api_key_env).map_err(|_| {
            Error::Config(format!(
                "environment variable {} is not set",
                self.exchange.api_key_env
            ))
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.exchange.timeout_secs)
    }

    pub fn order_interval(&self) -> Duration {
        Duration::from_millis(self.execution.order_interval_ms)
    }

    pub fn schedule_interval(&self) -> Duration {
        Duration::from_secs(self.schedule.interval_hours.saturating_mul(3_600))
    }

    /// Full path to the audit log file.
    pub fn audit_path(&self) -> PathBuf {
        Path::new(&self.logging.dir).join(&self.logging.audit_file)
    }
}
