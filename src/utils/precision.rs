// src/utils/precision.rs
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

/// Decimal places kept on order quantities.
pub const QUANTITY_DECIMALS: u32 = 5;

/// Rounds the amount DOWN to the nearest multiple of step_size.
/// Example: amount=10.999, step=1.0 -> 10.0
pub fn normalize_quantity(amount: Decimal, step_size: Decimal) -> Decimal {
    if step_size.is_zero() {
        return amount;
    }
    (amount / step_size).floor() * step_size
}

/// Truncates `value` to `decimals` places, never rounding up.
/// Example: 0.123456789 with 5 decimals -> 0.12345
///
/// Non-finite or negative inputs give 0.
pub fn round_down(value: f64, decimals: u32) -> f64 {
    if !value.is_finite() || value <= 0.0 {
        return 0.0;
    }
    let Some(amount) = Decimal::from_f64(value) else {
        return 0.0;
    };
    normalize_quantity(amount, Decimal::new(1, decimals))
        .to_f64()
        .unwrap_or(0.0)
}

/// Quantity to buy with `budget` quote units at `price`, truncated to
/// [`QUANTITY_DECIMALS`] places.
pub fn order_quantity(budget: f64, price: f64) -> f64 {
    if price <= 0.0 {
        return 0.0;
    }
    round_down(budget / price, QUANTITY_DECIMALS)
}

/// Renders a quantity for the order endpoint: at most
/// [`QUANTITY_DECIMALS`] places, no trailing zeros.
/// Example: 2.0 -> "2", 0.000123456 -> "0.00012"
pub fn format_quantity(quantity: f64) -> String {
    Decimal::from_f64(quantity)
        .map(|q| {
            normalize_quantity(q, Decimal::new(1, QUANTITY_DECIMALS))
                .normalize()
                .to_string()
        })
        .unwrap_or_else(|| "0".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_normalize_quantity_floors_to_step() {
        let amount = Decimal::from_str("10.999").unwrap();
        assert_eq!(normalize_quantity(amount, Decimal::ONE), Decimal::from(10));

        let amount = Decimal::from_str("0.123456").unwrap();
        let step = Decimal::from_str("0.001").unwrap();
        assert_eq!(
            normalize_quantity(amount, step),
            Decimal::from_str("0.123").unwrap()
        );
    }

    #[test]
    fn test_round_down() {
        assert_eq!(round_down(0.123456789, 5), 0.12345);
        assert!((round_down(1.999999, 5) - 1.99999).abs() < 1e-12);
        assert_eq!(round_down(3.0, 5), 3.0);
        assert_eq!(round_down(-1.0, 5), 0.0);
        assert_eq!(round_down(f64::NAN, 5), 0.0);
    }

    #[test]
    fn test_order_quantity() {
        assert_eq!(order_quantity(100.0, 50.0), 2.0);
        assert_eq!(order_quantity(80.0, 67_123.45), 0.00119);
        assert_eq!(order_quantity(80.0, 0.0), 0.0);
    }

    #[test]
    fn test_format_quantity() {
        assert_eq!(format_quantity(2.0), "2");
        assert_eq!(format_quantity(0.00119), "0.00119");
        assert_eq!(format_quantity(0.000123456), "0.00012");
    }
}
