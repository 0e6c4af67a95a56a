//! Historical price feeds.

use crate::error::BrokerError;

/// A source of daily closing prices keyed by the feed's own coin id
/// (`"ethereum"`, `"bitcoin"`, ...).
pub trait PriceHistory {
    /// Closing USD prices for roughly the last `days` days, oldest first.
    fn closes(&self, coin_id: &str, days: u32) -> Result<Vec<f64>, BrokerError>;
}

impl<H: PriceHistory + ?Sized> PriceHistory for &H {
    fn closes(&self, coin_id: &str, days: u32) -> Result<Vec<f64>, BrokerError> {
        (**self).closes(coin_id, days)
    }
}
