//! # Pricing Engine
//!
//! Deterministic, side-effect-free totals computation over cart lines.
//! All arithmetic is fixed-point decimal; floats never touch money.
//!
//! Totals are recomputed on every cart view, at intent creation and again
//! at payment verification, so a client-supplied amount is never trusted.

use crate::error::{ShopError, ShopResult};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Sales tax rate applied to every order: 0.08
pub const TAX_RATE: Decimal = Decimal::from_parts(8, 0, 0, false, 2);

/// Smallest amount (in minor units) the payment gateway accepts.
/// Computed totals that round below this are raised to it.
pub const GATEWAY_MIN_MINOR_UNITS: i64 = 100;

/// Currency code sent to the gateway
pub const CURRENCY: &str = "INR";

/// Subtotal, tax and total for a set of cart lines, 2 decimal places
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CartTotals {
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

impl CartTotals {
    /// All-zero totals (empty or just-cleared cart)
    pub fn zero() -> Self {
        Self::default()
    }
}

fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Compute subtotal, tax and total over `(unit_price, quantity)` lines.
///
/// subtotal = Σ unit_price × quantity
/// tax      = round(subtotal × TAX_RATE, 2, half-up)
/// total    = round(subtotal + tax, 2, half-up)
pub fn compute_totals<I>(lines: I) -> CartTotals
where
    I: IntoIterator<Item = (Decimal, u32)>,
{
    let subtotal: Decimal = lines
        .into_iter()
        .map(|(unit_price, quantity)| unit_price * Decimal::from(quantity))
        .sum();

    let tax = round_half_up(subtotal * TAX_RATE);
    let total = round_half_up(subtotal + tax);

    CartTotals {
        subtotal,
        tax,
        total,
    }
}

/// Convert a 2-decimal-place total to gateway minor units (×100),
/// raised to the gateway minimum when the total rounds below it.
pub fn to_minor_units(total: Decimal) -> ShopResult<i64> {
    let minor = round_half_up(total * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or_else(|| ShopError::Internal(format!("amount out of range: {total}")))?;

    Ok(minor.max(GATEWAY_MIN_MINOR_UNITS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_tax_rate_constant() {
        assert_eq!(TAX_RATE, dec("0.08"));
    }

    #[test]
    fn test_basic_totals() {
        // 2 × 10.00 = 20.00, tax 1.60, total 21.60
        let totals = compute_totals(vec![(dec("10.00"), 2)]);
        assert_eq!(totals.subtotal, dec("20.00"));
        assert_eq!(totals.tax, dec("1.60"));
        assert_eq!(totals.total, dec("21.60"));
    }

    #[test]
    fn test_rounding_fixture_half_up() {
        // Pinned fixture: subtotal 10.005 -> tax 0.8004 -> 0.80,
        // total 10.805 -> 10.81 (half-up)
        let totals = compute_totals(vec![(dec("10.005"), 1)]);
        assert_eq!(totals.subtotal, dec("10.005"));
        assert_eq!(totals.tax, dec("0.80"));
        assert_eq!(totals.total, dec("10.81"));
    }

    #[test]
    fn test_linearity_under_doubled_quantities() {
        let lines = vec![(dec("10.00"), 2u32), (dec("3.25"), 5)];
        let doubled: Vec<_> = lines.iter().map(|(p, q)| (*p, q * 2)).collect();

        let base = compute_totals(lines);
        let twice = compute_totals(doubled);

        assert_eq!(twice.subtotal, base.subtotal * Decimal::from(2));
        assert_eq!(twice.tax, base.tax * Decimal::from(2));
    }

    #[test]
    fn test_empty_lines_zero_totals() {
        let totals = compute_totals(Vec::<(Decimal, u32)>::new());
        assert_eq!(totals, CartTotals::zero());
    }

    #[test]
    fn test_minor_units() {
        assert_eq!(to_minor_units(dec("21.60")).unwrap(), 2160);
        assert_eq!(to_minor_units(dec("10.81")).unwrap(), 1081);
    }

    #[test]
    fn test_minor_units_floored_to_gateway_minimum() {
        // 0.50 -> 50 minor units, below the gateway minimum of 100
        assert_eq!(to_minor_units(dec("0.50")).unwrap(), GATEWAY_MIN_MINOR_UNITS);
        assert_eq!(to_minor_units(dec("1.00")).unwrap(), 100);
    }
}
