//! Conversions between human decimal strings and on-chain base units.
//!
//! The native asset and every exchange token share the chain's canonical 18-decimal scale.
use alloy::primitives::{
    U256,
    utils::{ParseUnits, format_units, parse_units},
};
use color_eyre::eyre::{self, WrapErr as _, bail};

pub const DECIMALS: u8 = 18;

/// Parses a non-negative decimal string such as `"1.5"` into base units.
pub fn parse_amount(amount: &str) -> eyre::Result<U256> {
    let amount = amount.trim();
    if amount.is_empty() {
        bail!("amount is empty");
    }
    if amount.starts_with('-') {
        bail!("amount `{amount}` is negative");
    }
    if let Some((_, fraction)) = amount.split_once('.') {
        if fraction.len() > DECIMALS as usize {
            bail!("amount `{amount}` has more than {DECIMALS} decimal places");
        }
    }

    match parse_units(amount, DECIMALS).wrap_err_with(|| format!("invalid amount `{amount}`"))? {
        ParseUnits::U256(value) => Ok(value),
        ParseUnits::I256(_) => bail!("amount `{amount}` is negative"),
    }
}

/// Formats base units as the shortest decimal string, e.g. `10^18` as `"1"`.
pub fn format_amount(amount: U256) -> String {
    let formatted = format_units(amount, DECIMALS).expect("18 decimals is a valid unit");
    match formatted.split_once('.') {
        Some((whole, fraction)) => {
            let fraction = fraction.trim_end_matches('0');
            if fraction.is_empty() {
                whole.to_string()
            } else {
                format!("{whole}.{fraction}")
            }
        }
        None => formatted,
    }
}

/// `whole * 10^18`, for readable constants.
pub fn units(whole: u64) -> U256 {
    U256::from(whole) * U256::from(10u64).pow(U256::from(DECIMALS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parses_whole_and_fractional_amounts() {
        assert_eq!(parse_amount("1.0").unwrap(), units(1));
        assert_eq!(parse_amount("5").unwrap(), units(5));
        assert_eq!(
            parse_amount("0.5").unwrap(),
            U256::from(500_000_000_000_000_000u64)
        );
        assert_eq!(parse_amount("0.000000000000000001").unwrap(), U256::from(1u64));
    }

    #[test]
    fn rejects_malformed_amounts() {
        assert!(parse_amount("").is_err());
        assert!(parse_amount("   ").is_err());
        assert!(parse_amount("-1").is_err());
        assert!(parse_amount("abc").is_err());
        assert!(parse_amount("0.0000000000000000001").is_err());
    }

    #[test]
    fn formats_without_trailing_zeros() {
        assert_eq!(format_amount(U256::ZERO), "0");
        assert_eq!(format_amount(units(1)), "1");
        assert_eq!(format_amount(units(1) / U256::from(4u64)), "0.25");
        assert_eq!(format_amount(U256::from(1u64)), "0.000000000000000001");
    }

    proptest! {
        #[test]
        fn formatted_amounts_keep_the_whole_part(raw in any::<u128>()) {
            let formatted = format_amount(U256::from(raw));
            let whole = formatted.split('.').next().unwrap();
            prop_assert_eq!(whole, (raw / 10u128.pow(18)).to_string());
            prop_assert!(!formatted.contains('.') || !formatted.ends_with('0'));
        }
    }
}
