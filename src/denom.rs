use bigdecimal::{BigDecimal, ToPrimitive};
use std::str::FromStr;

use crate::config::ChainConfig;

/// Parse a string-encoded on-chain amount without losing precision.
pub fn parse_amount(raw: &str) -> eyre::Result<BigDecimal> {
    BigDecimal::from_str(raw.trim())
        .map_err(|e| eyre::eyre!("Invalid amount '{}': {}", raw, e))
}

/// Convert a raw amount into display units using the chain's denom table.
/// Denoms missing from the table pass through unchanged.
pub fn normalize(chain: &ChainConfig, denom: &str, amount: &BigDecimal) -> (String, BigDecimal) {
    match chain.find_denom_by_name(denom) {
        Some(info) => (
            info.display_name().to_string(),
            shift_exponent(amount, info.denom_exponent),
        ),
        None => (denom.to_string(), amount.clone()),
    }
}

/// Exact division by `10^exponent`.
fn shift_exponent(amount: &BigDecimal, exponent: u32) -> BigDecimal {
    if exponent == 0 {
        return amount.clone();
    }
    let (digits, scale) = amount.as_bigint_and_exponent();
    BigDecimal::new(digits, scale + i64::from(exponent))
}

/// Gauge value for a normalized amount; `None` when it has no finite `f64` form.
pub fn to_gauge_value(amount: &BigDecimal) -> Option<f64> {
    amount.to_f64().filter(|value| value.is_finite())
}

/// Parse, normalize and convert one raw amount into a `(display denom, value)` sample.
pub fn gauge_sample(chain: &ChainConfig, denom: &str, raw: &str) -> eyre::Result<(String, f64)> {
    let amount = parse_amount(raw)?;
    let (display, value) = normalize(chain, denom, &amount);
    let value = to_gauge_value(&value)
        .ok_or_else(|| eyre::eyre!("Amount '{}' does not fit a gauge value", raw))?;
    Ok((display, value))
}
