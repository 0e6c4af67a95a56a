//! driftbook-server entry point.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use driftbook::Symbol;
use driftbook_broker::TokenRegistry;
use driftbook_broker::coingecko::CoinGeckoClient;
use driftbook_broker::recall::{DEFAULT_BASE_URL, RecallClient, RecallExchange};
use driftbook_server::api::{cors_layer, create_router};
use driftbook_server::state::{ApiState, DEFAULT_HISTORY_DAYS, DEFAULT_TRADE_SIZE_USD};
use log::info;

#[derive(Parser)]
#[command(name = "driftbook-server")]
#[command(about = "HTTP API for trend analysis and Recall sandbox trades")]
#[command(version)]
struct Args {
    /// Address to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: String,

    #[arg(long, env = "PORT", default_value_t = 8084)]
    port: u16,

    /// Recall API key
    #[arg(long, env = "RECALL_API_KEY", hide_env_values = true)]
    api_key: String,

    #[arg(long, env = "RECALL_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Price history base URL (CoinGecko by default)
    #[arg(long, env = "COINGECKO_BASE_URL")]
    history_url: Option<String>,

    /// Allowed CORS origins, comma separated
    #[arg(
        long,
        env = "CORS_ORIGINS",
        value_delimiter = ',',
        default_value = "http://localhost:8080,https://trendsight-server.onrender.com"
    )]
    cors_origins: Vec<String>,

    /// USD value of each trend-driven trade
    #[arg(long, env = "TRADE_SIZE_USD", default_value_t = DEFAULT_TRADE_SIZE_USD)]
    trade_size_usd: f64,

    /// Days of price history per analysis
    #[arg(long, default_value_t = DEFAULT_HISTORY_DAYS)]
    days: u32,

    #[arg(long, default_value = "USDC")]
    quote: String,

    /// HTTP timeout for upstream calls, in seconds
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    let args = Args::parse();
    if !(args.trade_size_usd.is_finite() && args.trade_size_usd > 0.0) {
        bail!("--trade-size-usd must be positive, got {}", args.trade_size_usd);
    }
    let quote = Symbol::try_new(&args.quote)
        .with_context(|| format!("invalid quote symbol {:?}", args.quote))?;
    let registry = TokenRegistry::default();
    if !registry.contains(&quote) {
        bail!("quote asset {quote} is not a known token");
    }

    // Blocking HTTP clients must be built outside the async runtime
    let timeout = Duration::from_secs(args.timeout_secs);
    let client = RecallClient::new(&args.api_key, Some(&args.base_url), timeout)
        .context("building Recall client")?;
    let history = CoinGeckoClient::new(args.history_url.as_deref(), timeout)
        .context("building price history client")?;

    let mut state = ApiState::new(
        Arc::new(RecallExchange::new(client, registry.clone())),
        Arc::new(history),
    )
    .with_registry(registry)
    .with_quote(quote)
    .with_trade_size(args.trade_size_usd);
    state.history_days = args.days;

    let app = create_router(Arc::new(state)).layer(cors_layer(&args.cors_origins));
    let addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .with_context(|| format!("invalid bind address {}:{}", args.host, args.port))?;

    let runtime = tokio::runtime::Runtime::new().context("starting tokio runtime")?;
    runtime.block_on(async move {
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("binding {addr}"))?;
        info!("Listening on {addr} (exchange {})", args.base_url);
        axum::serve(listener, app).await.context("server error")
    })
}
