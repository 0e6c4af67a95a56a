//! Order side: Buy or Sell

use std::fmt;
use std::str::FromStr;

/// Side of a rebalance order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "UPPERCASE"))]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Returns the opposite side.
    #[inline]
    pub fn opposite(self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }

    /// Side that corrects a signed value deviation: overweight (positive)
    /// sells, underweight (negative) buys.
    #[inline]
    pub fn correcting(excess_value: f64) -> Self {
        if excess_value > 0.0 {
            Side::Sell
        } else {
            Side::Buy
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Side::Buy => "BUY",
            Side::Sell => "SELL",
        };
        f.pad(s)
    }
}

impl FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "buy" => Ok(Side::Buy),
            "sell" => Ok(Side::Sell),
            other => Err(format!("unknown side: {other:?}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposite() {
        assert_eq!(Side::Buy.opposite(), Side::Sell);
        assert_eq!(Side::Sell.opposite().opposite(), Side::Sell);
    }

    #[test]
    fn correcting_side() {
        assert_eq!(Side::correcting(100.0), Side::Sell);
        assert_eq!(Side::correcting(-0.5), Side::Buy);
    }

    #[test]
    fn display_and_parse() {
        assert_eq!(format!("{}", Side::Buy), "BUY");
        assert_eq!(format!("{:5}|", Side::Sell), "SELL |");
        assert_eq!("sell".parse::<Side>().unwrap(), Side::Sell);
        assert_eq!("BUY".parse::<Side>().unwrap(), Side::Buy);
        assert!("hold".parse::<Side>().is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_uppercase() {
        assert_eq!(serde_json::to_string(&Side::Sell).unwrap(), r#""SELL""#);
        assert_eq!(serde_json::from_str::<Side>(r#""BUY""#).unwrap(), Side::Buy);
        assert!(serde_json::from_str::<Side>(r#""buy""#).is_err());
    }
}
