//! Inventory error types.

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors raised by stock rules.
#[derive(Debug, Error)]
pub enum InventoryError {
    /// The change would take stock below zero.
    #[error("Insufficient stock: {available} available, {requested} requested")]
    InsufficientStock {
        /// Quantity currently on hand.
        available: Decimal,
        /// Quantity the change tried to remove.
        requested: Decimal,
    },

    /// The quantity of the change itself is not acceptable.
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),
}
