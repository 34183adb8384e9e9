//! Conversions between raw fixed-point amounts and display strings.
//!
//! Token amounts are shown exactly, with trailing fractional zeros trimmed.
//! Native amounts are shown in ether, rounded half-up to six decimals.

use alloy_primitives::{
    utils::{parse_units, ParseUnits, UnitsError},
    U256,
};
use thiserror::Error;

/// Digits shown after the point for native balances.
pub const NATIVE_DISPLAY_DECIMALS: u8 = 6;

const ETHER_DECIMALS: u8 = 18;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("Amount is empty")]
    Empty,

    #[error("Amount must not be negative")]
    Negative,

    #[error("Invalid amount: {0:?}")]
    Invalid(String),

    #[error("Amount has {digits} fractional digits, token supports {decimals}")]
    TooManyDecimals { digits: usize, decimals: u8 },

    #[error("Amount does not fit in uint256: {0}")]
    Overflow(String),
}

impl From<UnitsError> for AmountError {
    fn from(err: UnitsError) -> Self {
        Self::Overflow(err.to_string())
    }
}

/// Parse a user-entered decimal amount into its fixed-point integer.
///
/// `"1.5"` with 18 decimals gives `1500000000000000000`. Trailing fractional
/// zeros are ignored; any other digit past `decimals` is rejected rather than
/// truncated.
pub fn parse_token_amount(text: &str, decimals: u8) -> Result<U256, AmountError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(AmountError::Empty);
    }
    if text.starts_with('-') {
        return Err(AmountError::Negative);
    }

    let (whole, fraction) = text.split_once('.').unwrap_or((text, ""));
    let is_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if !is_digits(whole) || !is_digits(fraction) || (whole.is_empty() && fraction.is_empty()) {
        return Err(AmountError::Invalid(text.to_string()));
    }

    // Trailing zeros carry no precision
    let fraction = fraction.trim_end_matches('0');
    if fraction.len() > decimals as usize {
        return Err(AmountError::TooManyDecimals {
            digits: fraction.len(),
            decimals,
        });
    }

    // parse_units does not accept a bare leading or trailing point
    let whole = if whole.is_empty() { "0" } else { whole };
    let normalized = if fraction.is_empty() {
        whole.to_string()
    } else {
        format!("{whole}.{fraction}")
    };

    match parse_units(&normalized, decimals)? {
        ParseUnits::U256(amount) => Ok(amount),
        ParseUnits::I256(_) => Err(AmountError::Negative),
    }
}

/// Format a raw token amount in human units.
///
/// `1500000000000000000` with 18 decimals gives `"1.5"`, zero gives `"0"`.
pub fn format_token_amount(raw: U256, decimals: u8) -> String {
    let (whole, fraction) = split_decimals(raw, decimals);
    if fraction.is_zero() {
        return whole.to_string();
    }

    let fraction = format!("{:0>width$}", fraction.to_string(), width = decimals as usize);
    format!("{whole}.{}", fraction.trim_end_matches('0'))
}

/// Format a wei amount as ether with exactly six decimals.
///
/// One ether gives `"1.000000"`; digits beyond the sixth are rounded half-up.
pub fn format_native_amount(wei: U256) -> String {
    let dropped = ETHER_DECIMALS - NATIVE_DISPLAY_DECIMALS;
    let step = pow10(dropped);
    let scaled = wei.saturating_add(step / U256::from(2)) / step;

    let (whole, fraction) = split_decimals(scaled, NATIVE_DISPLAY_DECIMALS);
    format!(
        "{whole}.{:0>width$}",
        fraction.to_string(),
        width = NATIVE_DISPLAY_DECIMALS as usize
    )
}

fn split_decimals(raw: U256, decimals: u8) -> (U256, U256) {
    let base = pow10(decimals);
    (raw / base, raw % base)
}

fn pow10(exponent: u8) -> U256 {
    U256::from(10).pow(U256::from(exponent))
}
