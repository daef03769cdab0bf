//! Exact conversion between decimal currency strings and minimal units.
//!
//! The native currency has 18 decimals. Parsing and formatting are integer
//! only, so `format_currency(parse_currency(a)?) == a` for every canonical
//! amount `a` (no leading zeros, no trailing fractional zeros).

use alloy_primitives::U256;

use crate::errors::AmountError;

pub const DECIMALS: usize = 18;

/// 10^18 minimal units per whole coin.
const UNIT: U256 = U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]);

/// Parse a decimal amount such as `"1.5"` or `".25"` into minimal units.
pub fn parse_currency(input: &str) -> Result<U256, AmountError> {
    let s = input.trim();
    let (whole, fraction) = s.split_once('.').unwrap_or((s, ""));

    if whole.is_empty() && fraction.is_empty() {
        return Err(AmountError::Empty);
    }
    if let Some(c) = whole
        .chars()
        .chain(fraction.chars())
        .find(|c| !c.is_ascii_digit())
    {
        return Err(AmountError::InvalidCharacter(c));
    }
    if fraction.len() > DECIMALS {
        return Err(AmountError::TooManyDecimals(fraction.len()));
    }

    let whole = if whole.is_empty() {
        U256::ZERO
    } else {
        whole.parse::<U256>().map_err(|_| AmountError::Overflow)?
    };
    let fraction = format!("{fraction:0<width$}", width = DECIMALS)
        .parse::<U256>()
        .map_err(|_| AmountError::Overflow)?;

    whole
        .checked_mul(UNIT)
        .and_then(|w| w.checked_add(fraction))
        .ok_or(AmountError::Overflow)
}

/// Render minimal units as a canonical decimal string (`"1.5"`, `"0"`, `"12"`).
pub fn format_currency(value: U256) -> String {
    let whole = value / UNIT;
    let fraction = value % UNIT;
    if fraction.is_zero() {
        return whole.to_string();
    }
    let fraction = format!("{:0>width$}", fraction.to_string(), width = DECIMALS);
    format!("{whole}.{}", fraction.trim_end_matches('0'))
}
