//! Stock rules.
//!
//! Every change to a product's quantity goes through [`apply_stock_change`]
//! so the on-hand quantity can never become negative, whatever the source
//! of the change (addition, sale, correction or sale reversal).

mod error;
mod types;

pub use error::InventoryError;
pub use types::{CorrectionReason, MovementType};

use rust_decimal::Decimal;

/// Decimal places stored for quantities.
pub const QUANTITY_SCALE: u32 = 3;

/// Returns true when the quantity fits the stored precision.
#[must_use]
pub fn fits_quantity_scale(quantity: Decimal) -> bool {
    quantity.round_dp(QUANTITY_SCALE) == quantity
}

fn check_quantity_scale(quantity: Decimal) -> Result<(), InventoryError> {
    if fits_quantity_scale(quantity) {
        Ok(())
    } else {
        Err(InventoryError::InvalidQuantity(format!(
            "quantity cannot have more than {QUANTITY_SCALE} decimal places"
        )))
    }
}

/// Applies a signed quantity change to the current stock level.
///
/// # Errors
///
/// Returns `InventoryError::InsufficientStock` when the result would be
/// negative.
pub fn apply_stock_change(current: Decimal, delta: Decimal) -> Result<Decimal, InventoryError> {
    let next = current + delta;
    if next < Decimal::ZERO {
        return Err(InventoryError::InsufficientStock {
            available: current,
            requested: -delta,
        });
    }
    Ok(next)
}

/// Returns true when the quantity is at or below the low-stock threshold.
#[must_use]
pub fn is_low_stock(quantity: Decimal, threshold: Decimal) -> bool {
    quantity <= threshold
}

/// Checks the quantity of a stock addition.
///
/// # Errors
///
/// Returns `InventoryError::InvalidQuantity` unless the quantity is positive
/// and fits the stored precision.
pub fn validate_addition(quantity: Decimal) -> Result<(), InventoryError> {
    if quantity <= Decimal::ZERO {
        return Err(InventoryError::InvalidQuantity(
            "added quantity must be greater than zero".to_string(),
        ));
    }
    check_quantity_scale(quantity)
}

/// Checks the signed change of a stock correction.
///
/// # Errors
///
/// Returns `InventoryError::InvalidQuantity` when the change is zero or
/// finer than the stored precision.
pub fn validate_correction(quantity_change: Decimal) -> Result<(), InventoryError> {
    if quantity_change.is_zero() {
        return Err(InventoryError::InvalidQuantity(
            "correction must change the quantity".to_string(),
        ));
    }
    check_quantity_scale(quantity_change)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case(dec!(10), dec!(5), dec!(15))]
    #[case(dec!(10), dec!(-10), dec!(0))]
    #[case(dec!(2.5), dec!(-0.75), dec!(1.75))]
    fn test_apply_stock_change(
        #[case] current: Decimal,
        #[case] delta: Decimal,
        #[case] expected: Decimal,
    ) {
        assert_eq!(apply_stock_change(current, delta).unwrap(), expected);
    }

    #[test]
    fn test_apply_stock_change_rejects_negative_result() {
        let err = apply_stock_change(dec!(3), dec!(-4)).unwrap_err();
        assert!(matches!(
            err,
            InventoryError::InsufficientStock { available, requested }
                if available == dec!(3) && requested == dec!(4)
        ));
    }

    #[rstest]
    #[case(dec!(5), dec!(5), true)]
    #[case(dec!(4.999), dec!(5), true)]
    #[case(dec!(6), dec!(5), false)]
    #[case(dec!(0), dec!(0), true)]
    fn test_is_low_stock(#[case] quantity: Decimal, #[case] threshold: Decimal, #[case] low: bool) {
        assert_eq!(is_low_stock(quantity, threshold), low);
    }

    #[test]
    fn test_addition_and_correction_validation() {
        assert!(validate_addition(dec!(0.5)).is_ok());
        assert!(validate_addition(dec!(0)).is_err());
        assert!(validate_addition(dec!(-1)).is_err());

        assert!(validate_correction(dec!(-2)).is_ok());
        assert!(validate_correction(dec!(3)).is_ok());
        assert!(validate_correction(dec!(0)).is_err());
    }

    #[rstest]
    #[case(dec!(0.0004))]
    #[case(dec!(2.0005))]
    fn test_quantities_beyond_three_places_rejected(#[case] quantity: Decimal) {
        assert!(matches!(
            validate_addition(quantity),
            Err(InventoryError::InvalidQuantity(_))
        ));
        assert!(matches!(
            validate_correction(-quantity),
            Err(InventoryError::InvalidQuantity(_))
        ));
        assert!(validate_addition(quantity.round_dp(QUANTITY_SCALE) + dec!(0.001)).is_ok());
    }

    proptest! {
        /// Stock never goes negative, and a successful change is exact.
        #[test]
        fn prop_stock_never_negative(current in 0i64..100_000, delta in -100_000i64..100_000) {
            let current = Decimal::new(current, 3);
            let delta = Decimal::new(delta, 3);

            match apply_stock_change(current, delta) {
                Ok(next) => {
                    prop_assert!(next >= Decimal::ZERO);
                    prop_assert_eq!(next, current + delta);
                }
                Err(InventoryError::InsufficientStock { .. }) => {
                    prop_assert!(current + delta < Decimal::ZERO);
                }
                Err(other) => prop_assert!(false, "unexpected error: {other}"),
            }
        }
    }
}
