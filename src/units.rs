//! Conversion between whole-unit token amounts and exchange base units.
//!
//! Exchanges settle token amounts as integers in the token's smallest unit
//! (`amount * 10^decimals`). Multiplying an `f64` by `1e18` directly would
//! lose hundreds of base units for ordinary ETH amounts, so conversion goes
//! through the decimal text of the amount instead: `f64` Display yields the
//! shortest string that round-trips, never in exponent form, and the digits
//! beyond `decimals` are truncated. The result is never more than one base
//! unit below the decimal value, and never above it.

/// Largest supported `decimals` (10^30 still leaves headroom in a `u128`).
pub const MAX_DECIMALS: u8 = 30;

/// Errors converting an amount to base units.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum UnitsError {
    #[error("amount must be finite, got {0}")]
    NonFinite(f64),

    #[error("amount must not be negative, got {0}")]
    Negative(f64),

    #[error("{0} decimals exceeds the supported maximum of {MAX_DECIMALS}")]
    TooManyDecimals(u8),

    #[error("malformed decimal amount {0:?}")]
    Malformed(String),

    #[error("amount {amount} with {decimals} decimals overflows u128")]
    Overflow { amount: String, decimals: u8 },
}

/// Convert a whole-unit amount into base units, truncating.
///
/// ```
/// use driftbook::units::to_base_units;
///
/// assert_eq!(to_base_units(1.5, 18).unwrap(), 1_500_000_000_000_000_000);
/// assert_eq!(to_base_units(0.1234567, 6).unwrap(), 123_456); // truncated
/// ```
pub fn to_base_units(amount: f64, decimals: u8) -> Result<u128, UnitsError> {
    if !amount.is_finite() {
        return Err(UnitsError::NonFinite(amount));
    }
    if amount < 0.0 {
        return Err(UnitsError::Negative(amount));
    }
    if amount == 0.0 {
        // covers -0.0, whose text form carries a sign
        return Ok(0);
    }
    parse_units(&amount.to_string(), decimals)
}

/// Parse a plain decimal string (`"12"`, `"0.05"`, `"3."`) into base units,
/// truncating digits beyond `decimals`. Signs and exponents are rejected.
pub fn parse_units(text: &str, decimals: u8) -> Result<u128, UnitsError> {
    if decimals > MAX_DECIMALS {
        return Err(UnitsError::TooManyDecimals(decimals));
    }
    let text = text.trim();
    let (int_part, frac_part) = text.split_once('.').unwrap_or((text, ""));

    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if (int_part.is_empty() && frac_part.is_empty())
        || !all_digits(int_part)
        || !all_digits(frac_part)
    {
        return Err(UnitsError::Malformed(text.to_string()));
    }

    let overflow = || UnitsError::Overflow {
        amount: text.to_string(),
        decimals,
    };

    let whole: u128 = if int_part.is_empty() {
        0
    } else {
        int_part.parse().map_err(|_| overflow())?
    };

    let mut frac: u128 = 0;
    let mut taken = 0u32;
    for b in frac_part.bytes().take(decimals as usize) {
        frac = frac * 10 + u128::from(b - b'0');
        taken += 1;
    }
    frac *= 10u128.pow(u32::from(decimals) - taken);

    whole
        .checked_mul(10u128.pow(u32::from(decimals)))
        .and_then(|w| w.checked_add(frac))
        .ok_or_else(overflow)
}

/// Approximate whole-unit value of `units` base units (for display).
pub fn from_base_units(units: u128, decimals: u8) -> f64 {
    units as f64 / 10f64.powi(i32::from(decimals))
}

/// Exact decimal rendering of `units`, trailing zeros trimmed.
///
/// ```
/// use driftbook::units::format_units;
///
/// assert_eq!(format_units(1_500_000, 6), "1.5");
/// assert_eq!(format_units(42, 0), "42");
/// ```
pub fn format_units(units: u128, decimals: u8) -> String {
    if decimals == 0 {
        return units.to_string();
    }
    let scale = 10u128.pow(u32::from(decimals.min(MAX_DECIMALS)));
    let whole = units / scale;
    let frac = units % scale;
    if frac == 0 {
        return whole.to_string();
    }
    let frac = format!("{frac:0width$}", width = decimals as usize);
    format!("{whole}.{}", frac.trim_end_matches('0'))
}
