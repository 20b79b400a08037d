//! Sale amounts and payment tracking.
//!
//! A sale stores its totals at the moment it is recorded: later changes to
//! the product's prices never alter past sales. Payments move a sale from
//! `pending` through `partial` to `paid`; the paid amount can never exceed
//! the sale total.

mod error;

pub use error::SalesError;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::inventory::{QUANTITY_SCALE, fits_quantity_scale};

/// How the customer paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Cash at the stall.
    Cash,
    /// Mobile money transfer.
    MobileMoney,
    /// Bank transfer.
    BankTransfer,
    /// Goods taken on credit, paid later.
    Credit,
}

impl PaymentMethod {
    const ALL: [Self; 4] = [
        Self::Cash,
        Self::MobileMoney,
        Self::BankTransfer,
        Self::Credit,
    ];

    /// Convert to database string value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::MobileMoney => "mobile_money",
            Self::BankTransfer => "bank_transfer",
            Self::Credit => "credit",
        }
    }

    /// Parse from database string value.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_str() == s)
    }

    /// Human readable label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Cash => "Cash",
            Self::MobileMoney => "Mobile money",
            Self::BankTransfer => "Bank transfer",
            Self::Credit => "Credit",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Settlement state of a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Fully paid.
    Paid,
    /// Partly paid.
    Partial,
    /// Nothing paid yet.
    Pending,
}

impl PaymentStatus {
    const ALL: [Self; 3] = [Self::Paid, Self::Partial, Self::Pending];

    /// Convert to database string value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Paid => "paid",
            Self::Partial => "partial",
            Self::Pending => "pending",
        }
    }

    /// Parse from database string value.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_str() == s)
    }

    /// Human readable label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Paid => "Paid",
            Self::Partial => "Partially paid",
            Self::Pending => "Pending",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decimal places stored for money amounts.
pub const MONEY_SCALE: u32 = 2;

/// Returns true when the amount is representable in cents.
#[must_use]
pub fn fits_money_scale(amount: Decimal) -> bool {
    amount.round_dp(MONEY_SCALE) == amount
}

fn check_money(field: &'static str, amount: Decimal) -> Result<(), SalesError> {
    if fits_money_scale(amount) {
        Ok(())
    } else {
        Err(SalesError::Precision {
            field,
            places: MONEY_SCALE,
        })
    }
}

/// Money amounts of a single sale line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleAmounts {
    /// quantity × unit price, rounded to cents.
    pub total: Decimal,
    /// quantity × unit cost, rounded to cents.
    pub cost: Decimal,
    /// total − cost.
    pub profit: Decimal,
}

impl SaleAmounts {
    /// Computes the amounts of a sale.
    ///
    /// # Errors
    ///
    /// Returns `SalesError::InvalidQuantity` for a non-positive quantity,
    /// `SalesError::NegativePrice` for a negative price or cost and
    /// `SalesError::Precision` for a quantity or price finer than its column.
    pub fn compute(
        quantity: Decimal,
        unit_price: Decimal,
        unit_cost: Decimal,
    ) -> Result<Self, SalesError> {
        if quantity <= Decimal::ZERO {
            return Err(SalesError::InvalidQuantity);
        }
        if unit_price < Decimal::ZERO || unit_cost < Decimal::ZERO {
            return Err(SalesError::NegativePrice);
        }
        if !fits_quantity_scale(quantity) {
            return Err(SalesError::Precision {
                field: "Quantity",
                places: QUANTITY_SCALE,
            });
        }
        check_money("Unit price", unit_price)?;

        let total = (quantity * unit_price).round_dp(2);
        let cost = (quantity * unit_cost).round_dp(2);

        Ok(Self {
            total,
            cost,
            profit: total - cost,
        })
    }
}

/// Amount paid up front when the request does not say.
///
/// Credit sales start unpaid; every other method is settled on the spot.
#[must_use]
pub fn default_amount_paid(method: PaymentMethod, total: Decimal) -> Decimal {
    match method {
        PaymentMethod::Credit => Decimal::ZERO,
        _ => total,
    }
}

/// Derives the payment status from the sale total and the amount paid.
///
/// # Errors
///
/// Returns `SalesError::InvalidPayment` for a negative paid amount,
/// `SalesError::Precision` for fractions of a cent and
/// `SalesError::Overpayment` when more than the total is paid.
pub fn payment_status_for(total: Decimal, amount_paid: Decimal) -> Result<PaymentStatus, SalesError> {
    if amount_paid < Decimal::ZERO {
        return Err(SalesError::InvalidPayment);
    }
    check_money("Amount paid", amount_paid)?;
    if amount_paid > total {
        return Err(SalesError::Overpayment { outstanding: total });
    }

    Ok(if amount_paid == total {
        PaymentStatus::Paid
    } else if amount_paid.is_zero() {
        PaymentStatus::Pending
    } else {
        PaymentStatus::Partial
    })
}

/// State of a sale after a payment is recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentUpdate {
    /// New cumulative paid amount.
    pub amount_paid: Decimal,
    /// What is still owed.
    pub outstanding: Decimal,
    /// New status.
    pub status: PaymentStatus,
}

/// Records a payment against a sale.
///
/// # Errors
///
/// Returns `SalesError::InvalidPayment` for a non-positive payment,
/// `SalesError::Precision` for fractions of a cent,
/// `SalesError::AlreadySettled` if nothing is owed and
/// `SalesError::Overpayment` if the payment exceeds the outstanding balance.
pub fn apply_payment(
    total: Decimal,
    already_paid: Decimal,
    payment: Decimal,
) -> Result<PaymentUpdate, SalesError> {
    if payment <= Decimal::ZERO {
        return Err(SalesError::InvalidPayment);
    }
    check_money("Payment", payment)?;

    let outstanding = total - already_paid;
    if outstanding <= Decimal::ZERO {
        return Err(SalesError::AlreadySettled);
    }
    if payment > outstanding {
        return Err(SalesError::Overpayment { outstanding });
    }

    let amount_paid = already_paid + payment;
    Ok(PaymentUpdate {
        amount_paid,
        outstanding: total - amount_paid,
        status: payment_status_for(total, amount_paid)?,
    })
}
