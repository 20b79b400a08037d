//! Sales error types.

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors raised by sale and payment rules.
#[derive(Debug, Error)]
pub enum SalesError {
    /// Sold quantity must be positive.
    #[error("Quantity must be greater than zero")]
    InvalidQuantity,

    /// Prices cannot be negative.
    #[error("Price cannot be negative")]
    NegativePrice,

    /// Payments cannot be negative or zero.
    #[error("Payment amount must be greater than zero")]
    InvalidPayment,

    /// Paid amount exceeds what is owed.
    #[error("Payment exceeds the outstanding balance of {outstanding}")]
    Overpayment {
        /// Amount still owed before the payment.
        outstanding: Decimal,
    },

    /// An amount carries more decimal places than its column stores.
    #[error("{field} cannot have more than {places} decimal places")]
    Precision {
        /// Which amount.
        field: &'static str,
        /// Decimal places allowed.
        places: u32,
    },

    /// The sale is already fully paid.
    #[error("Sale is already fully paid")]
    AlreadySettled,
}
