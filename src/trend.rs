//! Moving-average trend signal.
//!
//! Classifies a short price history as bullish, bearish or neutral from two
//! readings: the net change across the window, and whether a short simple
//! moving average sits above or below a long one. Both must agree before a
//! direction is called.
//!
//! ```
//! use driftbook::trend::{analyze, Signal, Trend, TrendConfig};
//!
//! let closes = [100.0, 101.0, 103.0, 104.0, 107.0, 109.0, 112.0];
//! let config = TrendConfig::default();
//! let analysis = analyze(&closes, &config).unwrap();
//!
//! assert_eq!(analysis.trend, Trend::Bullish);
//! assert_eq!(analysis.signal(&config), Signal::Hold); // 12% move, below 70 confidence
//! ```

use std::fmt;

/// Trend classifier parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TrendConfig {
    /// Closes in the short moving average.
    pub short_window: usize,
    /// Closes in the long moving average; also the minimum history length.
    pub long_window: usize,
    /// Net fractional change needed to call a direction (0.02 = 2%).
    pub change_threshold: f64,
    /// Confidence a direction needs before it becomes a Buy/Sell signal.
    pub min_confidence: f64,
    /// Cap on reported confidence.
    pub max_confidence: f64,
}

impl Default for TrendConfig {
    fn default() -> Self {
        TrendConfig {
            short_window: 3,
            long_window: 7,
            change_threshold: 0.02,
            min_confidence: 70.0,
            max_confidence: 95.0,
        }
    }
}

/// Errors from [`analyze`].
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum TrendError {
    #[error("need at least {needed} closes, got {got}")]
    InsufficientHistory { needed: usize, got: usize },

    #[error("invalid windows: short {short}, long {long}")]
    InvalidWindows { short: usize, long: usize },

    #[error("first close must be positive, got {0}")]
    InvalidPrice(f64),
}

/// Market direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Trend {
    Bullish,
    Bearish,
    Neutral,
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Trend::Bullish => "bullish",
            Trend::Bearish => "bearish",
            Trend::Neutral => "neutral",
        };
        f.pad(s)
    }
}

/// Trading action derived from a trend.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "UPPERCASE"))]
pub enum Signal {
    Buy,
    Sell,
    Hold,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Signal::Buy => "BUY",
            Signal::Sell => "SELL",
            Signal::Hold => "HOLD",
        };
        f.pad(s)
    }
}

/// Result of [`analyze`].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TrendAnalysis {
    pub trend: Trend,
    /// 0–100.
    pub confidence: f64,
    /// `(last - first) / first`.
    pub price_change: f64,
    pub current_price: f64,
    pub short_ma: f64,
    pub long_ma: f64,
    pub reason: String,
}

impl TrendAnalysis {
    /// Map the trend to an action; weak trends hold.
    pub fn signal(&self, config: &TrendConfig) -> Signal {
        if self.confidence <= config.min_confidence {
            return Signal::Hold;
        }
        match self.trend {
            Trend::Bullish => Signal::Buy,
            Trend::Bearish => Signal::Sell,
            Trend::Neutral => Signal::Hold,
        }
    }
}

/// Mean of the last `period` values.
fn trailing_sma(values: &[f64], period: usize) -> f64 {
    let window = &values[values.len() - period..];
    window.iter().sum::<f64>() / period as f64
}

/// Classify the trend of `closes` (oldest first).
pub fn analyze(closes: &[f64], config: &TrendConfig) -> Result<TrendAnalysis, TrendError> {
    let (short, long) = (config.short_window, config.long_window);
    if short == 0 || short > long {
        return Err(TrendError::InvalidWindows { short, long });
    }
    if closes.len() < long {
        return Err(TrendError::InsufficientHistory {
            needed: long,
            got: closes.len(),
        });
    }

    let first = closes[0];
    if !(first.is_finite() && first > 0.0) {
        return Err(TrendError::InvalidPrice(first));
    }
    let current_price = closes[closes.len() - 1];
    let price_change = (current_price - first) / first;

    let short_ma = trailing_sma(closes, short);
    let long_ma = trailing_sma(closes, long);

    let directional_confidence = (price_change.abs() * 100.0).min(config.max_confidence);
    let (trend, confidence) = if price_change > config.change_threshold && short_ma > long_ma {
        (Trend::Bullish, directional_confidence)
    } else if price_change < -config.change_threshold && short_ma < long_ma {
        (Trend::Bearish, directional_confidence)
    } else {
        (Trend::Neutral, 50.0)
    };

    Ok(TrendAnalysis {
        trend,
        confidence,
        price_change,
        current_price,
        short_ma,
        long_ma,
        reason: format!(
            "Price change: {:.2}%, MA comparison: {short_ma:.2} vs {long_ma:.2}",
            price_change * 100.0
        ),
    })
}
