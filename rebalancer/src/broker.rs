//! Exchange glue used by rebalancer execution: connecting, snapshotting
//! balances and prices, and turning engine orders into swaps.

use std::thread;
use std::time::Duration;

use driftbook::{HoldingsTable, Order, OrderExecutor, PriceTable, Side, Symbol};
use driftbook_broker::recall::{RecallClient, RecallExchange};
use driftbook_broker::{
    Balance, BrokerError, Exchange, TokenRegistry, TradeReceipt, TradeRequest,
    holdings_from_balances,
};
use log::{debug, info};

use crate::config::Config;
use crate::error::Result;

/// Build the Recall exchange client from config and the environment.
pub fn connect(config: &Config) -> Result<RecallExchange> {
    let api_key = config.api_key()?;
    let client = RecallClient::new(&api_key, Some(&config.exchange.base_url), config.timeout())?;
    Ok(RecallExchange::new(client, config.token_registry()?))
}

/// Balances and prices fetched for one pass.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub balances: Vec<Balance>,
    pub holdings: HoldingsTable,
    pub prices: PriceTable,
}

/// Fetch balances, then a fresh quote for every symbol in `symbols`.
pub fn snapshot<E: Exchange + ?Sized>(exchange: &E, symbols: &[Symbol]) -> Result<Snapshot> {
    let balances = exchange.balances()?;
    let holdings = holdings_from_balances(&balances);

    let mut prices = PriceTable::new();
    for sym in symbols {
        let quote = exchange.quote(sym)?;
        debug!("{sym} @ ${:.4}", quote.price);
        prices.insert(*sym, quote.price);
    }

    Ok(Snapshot {
        balances,
        holdings,
        prices,
    })
}

/// Translate an engine order into a swap against the quote asset.
///
/// Sells spend `amount` of the asset. Buys spend `notional / quote_price`
/// of the quote asset. Both amounts truncate to whole base units.
pub fn trade_request(
    order: &Order,
    quote: Symbol,
    quote_price: f64,
    registry: &TokenRegistry,
) -> std::result::Result<TradeRequest, BrokerError> {
    let (from, to, spend) = match order.side {
        Side::Sell => (order.symbol, quote, order.amount),
        Side::Buy => {
            if !(quote_price.is_finite() && quote_price > 0.0) {
                return Err(BrokerError::Trade(format!(
                    "cannot fund {} buy: {quote} price is {quote_price}",
                    order.symbol
                )));
            }
            (quote, order.symbol, order.notional / quote_price)
        }
    };

    let amount = registry.to_base_units(&from, spend)?;
    if amount == 0 {
        return Err(BrokerError::Trade(format!(
            "{} {} rounds to zero {from} base units",
            order.side, order.symbol
        )));
    }

    Ok(TradeRequest {
        from,
        to,
        amount,
        reason: format!(
            "Rebalance: {} {} to restore target weight",
            order.side, order.symbol
        ),
    })
}

/// Submits engine orders to an exchange, pausing between submissions.
pub struct ExchangeExecutor<'a, E: Exchange + ?Sized> {
    exchange: &'a E,
    registry: &'a TokenRegistry,
    quote: Symbol,
    quote_price: f64,
    interval: Duration,
    submitted: usize,
}

impl<'a, E: Exchange + ?Sized> ExchangeExecutor<'a, E> {
    pub fn new(
        exchange: &'a E,
        registry: &'a TokenRegistry,
        quote: Symbol,
        quote_price: f64,
        interval: Duration,
    ) -> Self {
        Self {
            exchange,
            registry,
            quote,
            quote_price,
            interval,
            submitted: 0,
        }
    }

    /// Trades sent so far, successful or not.
    pub fn submitted(&self) -> usize {
        self.submitted
    }
}

impl<E: Exchange + ?Sized> OrderExecutor for ExchangeExecutor<'_, E> {
    type Receipt = TradeReceipt;
    type Error = BrokerError;

    fn execute(&mut self, order: &Order) -> std::result::Result<TradeReceipt, BrokerError> {
        let request = trade_request(order, self.quote, self.quote_price, self.registry)?;

        if self.submitted > 0 && !self.interval.is_zero() {
            thread::sleep(self.interval);
        }
        self.submitted += 1;

        info!(
            "Submitting {} {}: {} base units of {} -> {}",
            order.side, order.symbol, request.amount, request.from, request.to
        );
        self.exchange.submit_trade(&request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use driftbook_broker::mock::{FillMode, MockExchange};

    fn weth() -> Symbol {
        Symbol::new("WETH")
    }
    fn usdc() -> Symbol {
        Symbol::new("USDC")
    }

    fn order(side: Side, amount: f64, price: f64) -> Order {
        Order {
            symbol: weth(),
            side,
            amount,
            price,
            notional: amount * price,
        }
    }

    #[test]
    fn sell_spends_the_asset() {
        let registry = TokenRegistry::default();
        let req = trade_request(&order(Side::Sell, 1.5, 2_000.0), usdc(), 1.0, &registry).unwrap();
        assert_eq!(req.from, weth());
        assert_eq!(req.to, usdc());
        assert_eq!(req.amount, 1_500_000_000_000_000_000);
        assert!(req.reason.contains("SELL WETH"));
    }

    #[test]
    fn buy_spends_the_quote() {
        let registry = TokenRegistry::default();
        let req = trade_request(&order(Side::Buy, 0.5, 2_000.0), usdc(), 1.0, &registry).unwrap();
        assert_eq!(req.from, usdc());
        assert_eq!(req.to, weth());
        assert_eq!(req.amount, 1_000_000_000);
    }

    #[test]
    fn buy_scales_by_quote_price() {
        let registry = TokenRegistry::default();
        let req = trade_request(&order(Side::Buy, 0.5, 2_000.0), usdc(), 0.5, &registry).unwrap();
        assert_eq!(req.amount, 2_000_000_000);
    }

    #[test]
    fn buy_with_bad_quote_price_fails() {
        let registry = TokenRegistry::default();
        assert!(trade_request(&order(Side::Buy, 0.5, 2_000.0), usdc(), 0.0, &registry).is_err());
    }

    #[test]
    fn dust_is_rejected() {
        let registry = TokenRegistry::default();
        // 1e-9 USDC is below one base unit
        let dust = Order {
            symbol: weth(),
            side: Side::Buy,
            amount: 1e-12,
            price: 1_000.0,
            notional: 1e-9,
        };
        assert!(matches!(
            trade_request(&dust, usdc(), 1.0, &registry),
            Err(BrokerError::Trade(_))
        ));
    }

    #[test]
    fn unregistered_symbol_fails() {
        let registry = TokenRegistry::default();
        let doge = Order {
            symbol: Symbol::new("DOGE"),
            ..order(Side::Sell, 1.0, 0.1)
        };
        assert!(matches!(
            trade_request(&doge, usdc(), 1.0, &registry),
            Err(BrokerError::InvalidSymbol(_))
        ));
    }

    #[test]
    fn executor_submits_to_exchange() {
        let exchange = MockExchange::builder()
            .fill_mode(FillMode::Accept)
            .with_balance(weth(), 2.0)
            .with_quote(weth(), 2_000.0)
            .with_quote(usdc(), 1.0)
            .build();
        let registry = TokenRegistry::default();
        let mut executor =
            ExchangeExecutor::new(&exchange, &registry, usdc(), 1.0, Duration::ZERO);

        let receipt = executor.execute(&order(Side::Sell, 1.0, 2_000.0)).unwrap();
        assert_eq!(receipt.to_amount, 2_000.0);
        assert_eq!(executor.submitted(), 1);
        assert_eq!(exchange.balance(&weth()), 1.0);
    }

    #[test]
    fn snapshot_collects_holdings_and_prices() {
        let exchange = MockExchange::builder()
            .with_balance(weth(), 2.0)
            .with_balance(usdc(), 500.0)
            .with_quote(weth(), 2_000.0)
            .with_quote(usdc(), 1.0)
            .build();
        let snap = snapshot(&exchange, &[weth(), usdc()]).unwrap();
        assert_eq!(snap.balances.len(), 2);
        assert_eq!(snap.holdings.quantity(&weth()), 2.0);
        assert_eq!(snap.prices.get(&usdc()), Some(1.0));
    }
}
