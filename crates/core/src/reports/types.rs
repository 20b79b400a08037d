//! Report data types.
//!
//! `*Row` types are what the query layer returns; everything else is the
//! output of aggregation, serialized as the JSON report and fed to the PDF
//! renderer.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::filter::ReportKind;
use crate::finance::{DepositType, ExpenseStatus, TransactionType};
use crate::inventory::MovementType;
use crate::sales::{PaymentMethod, PaymentStatus};

// ---------------------------------------------------------------------------
// Query rows
// ---------------------------------------------------------------------------

/// One sale with its product and contact names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleRow {
    /// Sale ID.
    pub id: Uuid,
    /// Product sold.
    pub product_id: Uuid,
    /// Product name at query time.
    pub product_name: String,
    /// Product category name.
    pub category_name: Option<String>,
    /// Customer name.
    pub contact_name: Option<String>,
    /// Quantity sold.
    pub quantity: Decimal,
    /// Price per unit.
    pub unit_price: Decimal,
    /// Sale total.
    pub total_amount: Decimal,
    /// Cost of the goods sold.
    pub cost: Decimal,
    /// total − cost.
    pub profit: Decimal,
    /// Paid so far.
    pub amount_paid: Decimal,
    /// Payment method.
    pub payment_method: PaymentMethod,
    /// Payment status.
    pub payment_status: PaymentStatus,
    /// Business date of the sale.
    pub sale_date: NaiveDate,
    /// When the sale was recorded.
    pub created_at: DateTime<Utc>,
}

/// One expense with its category name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseRow {
    /// Expense ID.
    pub id: Uuid,
    /// Short description.
    pub title: String,
    /// Category name.
    pub category_name: Option<String>,
    /// Amount.
    pub amount: Decimal,
    /// Status.
    pub status: ExpenseStatus,
    /// Business date of the expense.
    pub expense_date: NaiveDate,
}

/// Current stock of one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductStockRow {
    /// Product ID.
    pub id: Uuid,
    /// Product name.
    pub name: String,
    /// Category name.
    pub category_name: Option<String>,
    /// Unit of measure (kg, piece, ...).
    pub unit: String,
    /// Quantity on hand.
    pub quantity: Decimal,
    /// Cost per unit.
    pub cost_price: Decimal,
    /// Selling price per unit.
    pub selling_price: Decimal,
    /// Low-stock threshold.
    pub low_stock_threshold: Decimal,
}

/// One stock movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovementRow {
    /// Why the quantity changed.
    pub movement_type: MovementType,
    /// Signed change.
    pub quantity_change: Decimal,
    /// When it happened.
    pub created_at: DateTime<Utc>,
}

/// One entry of the cash transaction log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRow {
    /// Entry type.
    pub transaction_type: TransactionType,
    /// Positive amount.
    pub amount: Decimal,
    /// Business date.
    pub transaction_date: NaiveDate,
}

/// One deposit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositRow {
    /// Deposit type.
    pub deposit_type: DepositType,
    /// Amount.
    pub amount: Decimal,
    /// Business date.
    pub deposit_date: NaiveDate,
}

// ---------------------------------------------------------------------------
// Shared report pieces
// ---------------------------------------------------------------------------

/// Count and amount of one group in a breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Breakdown {
    /// Machine key (the stored enum value).
    pub key: String,
    /// Human readable label.
    pub label: String,
    /// Number of rows in the group.
    pub count: u64,
    /// Sum of the group's amounts.
    pub amount: Decimal,
}

// ---------------------------------------------------------------------------
// Sales
// ---------------------------------------------------------------------------

/// Sales totals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesSummary {
    /// Number of sales.
    pub count: u64,
    /// Quantity sold.
    pub total_quantity: Decimal,
    /// Sum of sale totals.
    pub revenue: Decimal,
    /// Cost of goods sold.
    pub cost: Decimal,
    /// Gross profit.
    pub profit: Decimal,
    /// Collected amount.
    pub amount_paid: Decimal,
    /// Still owed by customers.
    pub outstanding: Decimal,
    /// Revenue per sale.
    pub average_sale: Decimal,
}

/// Sales of one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSales {
    /// Product ID.
    pub product_id: Uuid,
    /// Product name.
    pub product_name: String,
    /// Number of sales.
    pub sale_count: u64,
    /// Quantity sold.
    pub quantity: Decimal,
    /// Revenue.
    pub revenue: Decimal,
    /// Gross profit.
    pub profit: Decimal,
}

/// Sales of one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyTotal {
    /// Day.
    pub date: NaiveDate,
    /// Number of sales.
    pub count: u64,
    /// Revenue.
    pub revenue: Decimal,
    /// Gross profit.
    pub profit: Decimal,
}

/// Sales report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesReport {
    /// Totals.
    pub summary: SalesSummary,
    /// Totals per payment status.
    pub by_payment_status: Vec<Breakdown>,
    /// Totals per payment method.
    pub by_payment_method: Vec<Breakdown>,
    /// Best selling products by revenue.
    pub top_products: Vec<ProductSales>,
    /// Totals per day, oldest first.
    pub daily: Vec<DailyTotal>,
}

// ---------------------------------------------------------------------------
// Expenses
// ---------------------------------------------------------------------------

/// Expense totals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseSummary {
    /// Number of expenses.
    pub count: u64,
    /// Sum of all expenses.
    pub total: Decimal,
    /// Sum of paid expenses.
    pub paid: Decimal,
    /// Sum of pending expenses.
    pub pending: Decimal,
    /// Amount per expense.
    pub average: Decimal,
}

/// Expenses of one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryShare {
    /// Category name.
    pub category: String,
    /// Number of expenses.
    pub count: u64,
    /// Sum of the category's expenses.
    pub total: Decimal,
    /// Percentage of all expenses, two decimals.
    pub share_percent: Decimal,
}

/// Expense report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseReport {
    /// Totals.
    pub summary: ExpenseSummary,
    /// Totals per category.
    pub by_category: Vec<CategoryShare>,
    /// Totals per status.
    pub by_status: Vec<Breakdown>,
    /// Largest expenses.
    pub top_expenses: Vec<ExpenseRow>,
}

// ---------------------------------------------------------------------------
// Inventory
// ---------------------------------------------------------------------------

/// Stock totals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventorySummary {
    /// Number of products.
    pub product_count: u64,
    /// Sum of quantities on hand.
    pub total_quantity: Decimal,
    /// Stock valued at cost.
    pub stock_value: Decimal,
    /// Stock valued at selling price.
    pub retail_value: Decimal,
    /// Products at or below their threshold (out of stock included).
    pub low_stock_count: u64,
    /// Products with nothing on hand.
    pub out_of_stock_count: u64,
}

/// Stock of one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStock {
    /// Category name.
    pub category: String,
    /// Number of products.
    pub product_count: u64,
    /// Quantity on hand.
    pub quantity: Decimal,
    /// Stock valued at cost.
    pub stock_value: Decimal,
}

/// A product that needs restocking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LowStockItem {
    /// Product ID.
    pub product_id: Uuid,
    /// Product name.
    pub name: String,
    /// Quantity on hand.
    pub quantity: Decimal,
    /// Threshold.
    pub threshold: Decimal,
    /// Unit of measure.
    pub unit: String,
}

/// Movements of one type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovementTotal {
    /// Movement type.
    pub movement_type: MovementType,
    /// Human readable label.
    pub label: String,
    /// Number of movements.
    pub count: u64,
    /// Net quantity change.
    pub quantity: Decimal,
}

/// Inventory report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryReport {
    /// Totals.
    pub summary: InventorySummary,
    /// Totals per category.
    pub by_category: Vec<CategoryStock>,
    /// Products at or below their threshold, emptiest first.
    pub low_stock: Vec<LowStockItem>,
    /// Movements in the period per type.
    pub movements: Vec<MovementTotal>,
}

// ---------------------------------------------------------------------------
// Financial
// ---------------------------------------------------------------------------

/// Cash flow totals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialSummary {
    /// Money in.
    pub inflow: Decimal,
    /// Money out.
    pub outflow: Decimal,
    /// inflow − outflow.
    pub net_cash_flow: Decimal,
    /// Cash moved to bank or mobile money.
    pub deposits_total: Decimal,
    /// Net cash flow not yet deposited.
    pub cash_on_hand: Decimal,
}

/// Financial report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialReport {
    /// Totals.
    pub summary: FinancialSummary,
    /// Totals per transaction type.
    pub by_transaction_type: Vec<Breakdown>,
    /// Totals per deposit type.
    pub by_deposit_type: Vec<Breakdown>,
}

// ---------------------------------------------------------------------------
// General
// ---------------------------------------------------------------------------

/// Summary of every area plus net profit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneralReport {
    /// Sales totals.
    pub sales: SalesSummary,
    /// Expense totals.
    pub expenses: ExpenseSummary,
    /// Stock totals.
    pub inventory: InventorySummary,
    /// Cash flow totals.
    pub financial: FinancialSummary,
    /// Gross sales profit − expenses.
    pub net_profit: Decimal,
}

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// Any of the reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Report {
    /// Sales report.
    Sales(SalesReport),
    /// Expense report.
    Expenses(ExpenseReport),
    /// Inventory report.
    Inventory(InventoryReport),
    /// Financial report.
    Financial(FinancialReport),
    /// General report.
    General(GeneralReport),
}

impl Report {
    /// Kind of the report.
    #[must_use]
    pub const fn kind(&self) -> ReportKind {
        match self {
            Self::Sales(_) => ReportKind::Sales,
            Self::Expenses(_) => ReportKind::Expenses,
            Self::Inventory(_) => ReportKind::Inventory,
            Self::Financial(_) => ReportKind::Financial,
            Self::General(_) => ReportKind::General,
        }
    }
}

/// A generated report with its period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportDocument {
    /// Report kind.
    pub kind: ReportKind,
    /// First day covered.
    pub start_date: NaiveDate,
    /// Last day covered.
    pub end_date: NaiveDate,
    /// Generation time.
    pub generated_at: DateTime<Utc>,
    /// The report body.
    pub data: Report,
}

impl ReportDocument {
    /// Wraps a report.
    #[must_use]
    pub const fn new(
        data: Report,
        start_date: NaiveDate,
        end_date: NaiveDate,
        generated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            kind: data.kind(),
            start_date,
            end_date,
            generated_at,
            data,
        }
    }
}

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

/// Raw data the dashboard is computed from.
#[derive(Debug, Clone)]
pub struct DashboardInput {
    /// Current business date.
    pub today: NaiveDate,
    /// Sales since the first of the month.
    pub month_sales: Vec<SaleRow>,
    /// Expenses since the first of the month.
    pub month_expenses: Vec<ExpenseRow>,
    /// All products.
    pub products: Vec<ProductStockRow>,
    /// Unpaid amount over all sales.
    pub outstanding_credit: Decimal,
    /// Latest sales, any date.
    pub recent_sales: Vec<SaleRow>,
}

/// Today's sales.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodaySales {
    /// Number of sales.
    pub count: u64,
    /// Revenue.
    pub revenue: Decimal,
}

/// A sale shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentSale {
    /// Sale ID.
    pub id: Uuid,
    /// Product name.
    pub product_name: String,
    /// Customer name.
    pub contact_name: Option<String>,
    /// Quantity.
    pub quantity: Decimal,
    /// Total.
    pub total_amount: Decimal,
    /// Payment status.
    pub payment_status: PaymentStatus,
    /// Business date.
    pub sale_date: NaiveDate,
}

/// Dashboard figures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    /// Sales recorded for today.
    pub today: TodaySales,
    /// Revenue this month.
    pub month_revenue: Decimal,
    /// Gross profit this month.
    pub month_profit: Decimal,
    /// Expenses this month.
    pub month_expenses: Decimal,
    /// Gross profit − expenses this month.
    pub month_net_profit: Decimal,
    /// Unpaid amount over all sales.
    pub outstanding_credit: Decimal,
    /// Number of products.
    pub product_count: u64,
    /// Products at or below their threshold.
    pub low_stock_count: u64,
    /// The five latest sales.
    pub recent_sales: Vec<RecentSale>,
}
