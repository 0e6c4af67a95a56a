//! Core types: Symbol

use std::fmt;

/// Maximum ticker length in bytes.
pub const SYMBOL_MAX_LEN: usize = 8;

/// Asset ticker stored inline (no heap allocation), e.g. `WETH`, `USDC`.
///
/// Symbols are `Copy` so they can key every table of a rebalance pass
/// without cloning strings around.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol {
    len: u8,
    bytes: [u8; SYMBOL_MAX_LEN],
}

impl Symbol {
    /// Create a symbol from a ticker string.
    ///
    /// # Panics
    ///
    /// Panics if `s` is empty, longer than 8 bytes, or contains whitespace.
    /// Use [`Symbol::try_new`] for untrusted input.
    pub fn new(s: &str) -> Self {
        Self::try_new(s).unwrap_or_else(|| panic!("invalid symbol: {s:?}"))
    }

    /// Create a symbol, returning `None` for empty, oversized or
    /// whitespace-containing tickers.
    pub fn try_new(s: &str) -> Option<Self> {
        let raw = s.as_bytes();
        if raw.is_empty() || raw.len() > SYMBOL_MAX_LEN {
            return None;
        }
        if raw.iter().any(|b| b.is_ascii_whitespace() || b.is_ascii_control()) {
            return None;
        }
        let mut bytes = [0u8; SYMBOL_MAX_LEN];
        bytes[..raw.len()].copy_from_slice(raw);
        Some(Symbol {
            len: raw.len() as u8,
            bytes,
        })
    }

    /// The ticker as a string slice.
    pub fn as_str(&self) -> &str {
        // Always copied from a whole &str, so the bytes are valid UTF-8.
        std::str::from_utf8(&self.bytes[..self.len as usize]).unwrap_or("")
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // pad() so width/alignment specifiers work in tables
        f.pad(self.as_str())
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.as_str())
    }
}

impl std::str::FromStr for Symbol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Symbol::try_new(s).ok_or_else(|| format!("invalid symbol: {s:?}"))
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Symbol {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Symbol {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = <std::borrow::Cow<'de, str>>::deserialize(deserializer)?;
        Symbol::try_new(&s).ok_or_else(|| serde::de::Error::custom(format!("invalid symbol: {s:?}")))
    }
}
