//! Expenses, deposits, the cash transaction log and contacts.

use serde::{Deserialize, Serialize};

/// Settlement state of an expense.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseStatus {
    /// Paid; recorded in the transaction log.
    Paid,
    /// Owed but not yet paid.
    Pending,
}

impl ExpenseStatus {
    /// Convert to database string value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Paid => "paid",
            Self::Pending => "pending",
        }
    }

    /// Parse from database string value.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "paid" => Some(Self::Paid),
            "pending" => Some(Self::Pending),
            _ => None,
        }
    }

    /// Human readable label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Paid => "Paid",
            Self::Pending => "Pending",
        }
    }
}

/// Where cash was deposited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepositType {
    /// Bank account.
    Bank,
    /// Mobile money wallet.
    MobileMoney,
    /// Anything else.
    Other,
}

impl DepositType {
    /// Convert to database string value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Bank => "bank",
            Self::MobileMoney => "mobile_money",
            Self::Other => "other",
        }
    }

    /// Parse from database string value.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "bank" => Some(Self::Bank),
            "mobile_money" => Some(Self::MobileMoney),
            "other" => Some(Self::Other),
            _ => None,
        }
    }

    /// Human readable label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Bank => "Bank",
            Self::MobileMoney => "Mobile money",
            Self::Other => "Other",
        }
    }
}

/// Direction of a cash transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CashFlow {
    /// Money coming into the business.
    Inflow,
    /// Money leaving the business.
    Outflow,
    /// Money moved between the business's own accounts.
    Transfer,
}

/// Entry type of the cash transaction log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    /// Payment received for a sale.
    Sale,
    /// Refund of a deleted sale's payments.
    SaleReversal,
    /// Paid expense.
    Expense,
    /// Stock bought from a supplier.
    StockPurchase,
    /// Cash deposited to a bank or wallet.
    Deposit,
}

impl TransactionType {
    /// All transaction types in display order.
    pub const ALL: [Self; 5] = [
        Self::Sale,
        Self::SaleReversal,
        Self::Expense,
        Self::StockPurchase,
        Self::Deposit,
    ];

    /// Direction of the money.
    #[must_use]
    pub const fn flow(&self) -> CashFlow {
        match self {
            Self::Sale => CashFlow::Inflow,
            Self::SaleReversal | Self::Expense | Self::StockPurchase => CashFlow::Outflow,
            Self::Deposit => CashFlow::Transfer,
        }
    }

    /// Convert to database string value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Sale => "sale",
            Self::SaleReversal => "sale_reversal",
            Self::Expense => "expense",
            Self::StockPurchase => "stock_purchase",
            Self::Deposit => "deposit",
        }
    }

    /// Parse from database string value.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }

    /// Human readable label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Sale => "Sales",
            Self::SaleReversal => "Sale reversals",
            Self::Expense => "Expenses",
            Self::StockPurchase => "Stock purchases",
            Self::Deposit => "Deposits",
        }
    }
}

/// Kind of business contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactType {
    /// Buys from the business.
    Customer,
    /// Sells stock to the business.
    Supplier,
}

impl ContactType {
    /// Convert to database string value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Supplier => "supplier",
        }
    }

    /// Parse from database string value.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "customer" => Some(Self::Customer),
            "supplier" => Some(Self::Supplier),
            _ => None,
        }
    }
}

macro_rules! impl_display_as_str {
    ($($ty:ty),*) => {
        $(
            impl std::fmt::Display for $ty {
                fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    f.write_str(self.as_str())
                }
            }
        )*
    };
}

impl_display_as_str!(ExpenseStatus, DepositType, TransactionType, ContactType);
