//! Amount parsing for user input.
//!
//! Accepts plain base units (`"1000"`, `"0x3e8"`) or a decimal followed by a
//! unit name (`"5000ether"`, `"1.5 gwei"`, `"7wei"`).

use alloy_primitives::utils::{format_ether, parse_units, ParseUnits};

use crate::error::AuthError;
use crate::Amount;

/// Parse a non-negative amount into base units.
///
/// Negative input is rejected rather than wrapped around.
pub fn parse_amount(input: &str) -> Result<Amount, AuthError> {
    let trimmed = input.trim();
    let invalid = |reason: String| AuthError::InvalidAmount {
        input: input.to_string(),
        reason,
    };
    if trimmed.is_empty() {
        return Err(invalid("empty".into()));
    }
    if trimmed.starts_with('-') {
        return Err(invalid("amounts are unsigned".into()));
    }

    if trimmed.starts_with("0x") {
        return trimmed.parse::<Amount>().map_err(|err| invalid(err.to_string()));
    }

    let split = trimmed
        .find(|c: char| c.is_ascii_alphabetic())
        .unwrap_or(trimmed.len());
    let (number, unit) = trimmed.split_at(split);
    let (number, unit) = (number.trim(), unit.trim());

    if unit.is_empty() {
        return number.parse::<Amount>().map_err(|err| invalid(err.to_string()));
    }
    match parse_units(number, unit.to_ascii_lowercase().as_str())
        .map_err(|err| invalid(err.to_string()))?
    {
        ParseUnits::U256(amount) => Ok(amount),
        ParseUnits::I256(_) => Err(invalid("amounts are unsigned".into())),
    }
}

/// `"<base units> (<ether> ether)"`, used for human-facing output.
pub fn describe(amount: Amount) -> String {
    format!("{amount} ({} ether)", format_ether(amount))
}

#[cfg(test)]
mod tests {
    use super::*;

    use alloy_primitives::U256;

    fn ether(n: u64) -> U256 {
        U256::from(n) * U256::from(10u64).pow(U256::from(18u64))
    }

    #[test]
    fn parses_base_units_and_hex() {
        assert_eq!(parse_amount("1000").unwrap(), U256::from(1000u64));
        assert_eq!(parse_amount("0x3e8").unwrap(), U256::from(1000u64));
    }

    #[test]
    fn parses_unit_suffixes() {
        assert_eq!(parse_amount("5000ether").unwrap(), ether(5000));
        assert_eq!(parse_amount("1.5 gwei").unwrap(), U256::from(1_500_000_000u64));
        assert_eq!(parse_amount("7wei").unwrap(), U256::from(7u64));
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_amount("").is_err());
        assert!(parse_amount("ten").is_err());
        assert!(parse_amount("1.5").is_err());
        assert!(parse_amount("3 parsecs").is_err());
    }

    #[test]
    fn negative_amounts_do_not_wrap() {
        assert!(parse_amount("-5ether").is_err());
        assert!(parse_amount("-3 wei").is_err());
        assert!(parse_amount(" -1wei").is_err());
        assert!(parse_amount("-1").is_err());
        assert!(matches!(
            parse_amount("-1wei"),
            Err(AuthError::InvalidAmount { .. })
        ));
    }

    #[test]
    fn describes_amounts_in_ether() {
        assert!(describe(ether(2)).starts_with("2000000000000000000 (2."));
    }
}
