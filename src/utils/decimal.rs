//! Decimal arithmetic utilities for financial calculations.

use rust_decimal::Decimal;

/// Floor-truncate a quantity to a number of decimal places.
///
/// Always rounds toward zero, never to nearest; submitting a rounded-up
/// quantity to the venue risks over-selling a position.
pub fn floor_to_precision(value: Decimal, decimals: u32) -> Decimal {
    value.trunc_with_scale(decimals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_floor_to_precision() {
        assert_eq!(floor_to_precision(dec!(1.567), 3), dec!(1.567));
        assert_eq!(floor_to_precision(dec!(1.567), 2), dec!(1.56));
        assert_eq!(floor_to_precision(dec!(1.567), 1), dec!(1.5));
        assert_eq!(floor_to_precision(dec!(1.999), 0), dec!(1));
    }

    #[test]
    fn test_floor_never_rounds_up() {
        // floor(q * 10^p) / 10^p <= q for all q >= 0
        let samples = [
            dec!(0),
            dec!(0.00000001),
            dec!(0.999999),
            dec!(1.005),
            dec!(123.456789),
            dec!(9999.9999),
        ];
        for q in samples {
            for p in 0..8u32 {
                assert!(floor_to_precision(q, p) <= q, "q={} p={}", q, p);
            }
        }
    }

    #[test]
    fn test_floor_can_yield_zero() {
        assert_eq!(floor_to_precision(dec!(0.0049), 2), dec!(0.00));
    }

}
