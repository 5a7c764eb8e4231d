//! Ether amount conversion between human decimal strings and wei.

use alloy::primitives::U256;
use alloy::primitives::utils;

pub const ETHER_DECIMALS: usize = 18;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    #[error("amount is empty")]
    Empty,
    #[error("amount must not be negative: {0}")]
    Negative(String),
    #[error("amount {0:?} has more than 18 decimal places")]
    TooPrecise(String),
    #[error("invalid amount {value:?}: {reason}")]
    Invalid { value: String, reason: String },
}

/// Parses a decimal ether string such as `"0.05"` or `".5"` into wei.
pub fn parse_ether(input: &str) -> Result<U256, AmountError> {
    let value = input.trim();
    if value.is_empty() {
        return Err(AmountError::Empty);
    }
    if value.starts_with('-') {
        return Err(AmountError::Negative(value.to_string()));
    }

    let (whole, fraction) = value.split_once('.').unwrap_or((value, ""));
    let digits_only = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if (whole.is_empty() && fraction.is_empty()) || !digits_only(whole) || !digits_only(fraction) {
        return Err(AmountError::Invalid {
            value: value.to_string(),
            reason: "expected a decimal number".to_string(),
        });
    }
    if fraction.len() > ETHER_DECIMALS {
        return Err(AmountError::TooPrecise(value.to_string()));
    }

    let whole = if whole.is_empty() { "0" } else { whole };
    let normalized = if fraction.is_empty() {
        whole.to_string()
    } else {
        format!("{whole}.{fraction}")
    };

    utils::parse_ether(&normalized).map_err(|e| AmountError::Invalid {
        value: value.to_string(),
        reason: e.to_string(),
    })
}

/// Formats wei as ether in minimal form: `"0.05"`, `"10"`, never `"10.0"`.
pub fn format_ether(wei: U256) -> String {
    let padded = utils::format_ether(wei);
    match padded.split_once('.') {
        Some((whole, fraction)) => {
            let fraction = fraction.trim_end_matches('0');
            if fraction.is_empty() {
                whole.to_string()
            } else {
                format!("{whole}.{fraction}")
            }
        }
        None => padded,
    }
}
