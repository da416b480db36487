use anyhow::{Result, bail};

/// Number of nano units in one whole coin.
pub const NANO_PER_COIN: u128 = 1_000_000_000;

const NANO_DECIMALS: usize = 9;

/// Convert a decimal coin amount (`"0.15"`, `"12345678"`) into nano units.
///
/// At most nine fractional digits are accepted. Negative, empty or
/// non-numeric input is rejected, as is anything that overflows `u128`.
pub fn to_nano(amount: &str) -> Result<u128> {
    let amount = amount.trim();
    if amount.is_empty() {
        bail!("amount is empty");
    }
    if amount.starts_with('-') {
        bail!("amount must not be negative: {amount}");
    }

    let (whole, frac) = match amount.split_once('.') {
        Some((w, f)) => (w, f),
        None => (amount, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        bail!("amount has no digits: {amount}");
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
        bail!("amount is not a decimal number: {amount}");
    }
    if frac.len() > NANO_DECIMALS {
        bail!("amount has more than {NANO_DECIMALS} fractional digits: {amount}");
    }

    let whole_value = if whole.is_empty() {
        0
    } else {
        whole
            .parse::<u128>()
            .map_err(|_| anyhow::anyhow!("amount is too large: {amount}"))?
    };

    let mut frac_value: u128 = 0;
    for digit in frac.bytes().chain(std::iter::repeat(b'0')).take(NANO_DECIMALS) {
        frac_value = frac_value * 10 + u128::from(digit - b'0');
    }

    whole_value
        .checked_mul(NANO_PER_COIN)
        .and_then(|v| v.checked_add(frac_value))
        .ok_or_else(|| anyhow::anyhow!("amount is too large: {amount}"))
}

/// Render nano units as a decimal coin amount without trailing zeros.
pub fn from_nano(nano: u128) -> String {
    let whole = nano / NANO_PER_COIN;
    let frac = nano % NANO_PER_COIN;
    if frac == 0 {
        return whole.to_string();
    }
    let frac = format!("{frac:09}");
    format!("{whole}.{}", frac.trim_end_matches('0'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_nano_whole_and_fractional() {
        assert_eq!(to_nano("0.15").unwrap(), 150_000_000);
        assert_eq!(to_nano("0.01").unwrap(), 10_000_000);
        assert_eq!(to_nano("12345678").unwrap(), 12_345_678_000_000_000);
        assert_eq!(to_nano("1.000000001").unwrap(), 1_000_000_001);
        assert_eq!(to_nano(".5").unwrap(), 500_000_000);
    }

    #[test]
    fn to_nano_large_supply() {
        assert_eq!(
            to_nano("1000000000000000").unwrap(),
            1_000_000_000_000_000_000_000_000
        );
    }

    #[test]
    fn to_nano_rejects_negative() {
        let err = to_nano("-1").unwrap_err();
        assert!(err.to_string().contains("negative"));
    }

    #[test]
    fn to_nano_rejects_garbage() {
        assert!(to_nano("").is_err());
        assert!(to_nano(".").is_err());
        assert!(to_nano("1e9").is_err());
        assert!(to_nano("0.1234567891").is_err());
    }

    #[test]
    fn to_nano_rejects_overflow() {
        assert!(to_nano("340282366920938463463374607431768211455").is_err());
    }

    #[test]
    fn from_nano_trims_zeros() {
        assert_eq!(from_nano(150_000_000), "0.15");
        assert_eq!(from_nano(2 * NANO_PER_COIN), "2");
        assert_eq!(from_nano(1), "0.000000001");
    }
}
