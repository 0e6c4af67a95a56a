//! Target allocation file (targets.json) loading and validation.
//!
//! The file is a flat JSON object mapping symbols to weights:
//!
//! ```json
//! { "WETH": 0.5, "WBTC": 0.3, "USDC": 0.2 }
//! ```
//!
//! Entries keep file order, and a repeated key is reported rather than
//! silently overwritten.

use std::fmt;
use std::path::Path;

use driftbook::{Symbol, TargetAllocation};
use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};

use crate::error::{Error, Result};

/// Raw `(symbol, weight)` entries in file order, duplicates included.
struct RawTargets(Vec<(String, f64)>);

impl<'de> Deserialize<'de> for RawTargets {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = RawTargets;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object mapping symbols to weights")
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut map: A,
            ) -> std::result::Result<RawTargets, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(entry) = map.next_entry::<String, f64>()? {
                    entries.push(entry);
                }
                Ok(RawTargets(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}

/// Load and validate a targets file.
pub fn load(path: &Path) -> Result<TargetAllocation> {
    let contents = std::fs::read_to_string(path).map_err(|e| Error::TargetRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    from_json(&contents)
}

/// Parse from a JSON string (useful for testing).
pub fn from_json(json: &str) -> Result<TargetAllocation> {
    let RawTargets(entries) = serde_json::from_str(json)?;

    let mut pairs = Vec::with_capacity(entries.len());
    for (name, weight) in entries {
        let symbol = Symbol::try_new(&name).ok_or_else(|| {
            Error::Target(format!(
                "symbol {name:?} must be 1-{} printable bytes",
                driftbook::SYMBOL_MAX_LEN
            ))
        })?;
        pairs.push((symbol, weight));
    }

    TargetAllocation::new(pairs).map_err(|e| Error::Target(e.to_string()))
}
