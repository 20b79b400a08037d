//! Report aggregation.
//!
//! Pure reductions over query rows. Grouped output is deterministic:
//! breakdowns are ordered by amount (largest first) and then by key, so two
//! runs over the same rows always serialize identically.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use uuid::Uuid;

use super::filter::ReportFilter;
use super::types::{
    Breakdown, CategoryShare, CategoryStock, DailyTotal, DashboardInput, DashboardStats,
    DepositRow, ExpenseReport, ExpenseRow, ExpenseSummary, FinancialReport, FinancialSummary,
    GeneralReport, InventoryReport, InventorySummary, LowStockItem, MovementRow, MovementTotal,
    ProductSales, ProductStockRow, RecentSale, SaleRow, SalesReport, SalesSummary, TodaySales,
    TransactionRow,
};
use crate::finance::{CashFlow, ExpenseStatus};
use crate::inventory::is_low_stock;

/// Label used for rows without a category.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Number of sales on the dashboard.
const RECENT_SALES: usize = 5;

/// Service for generating business reports.
pub struct ReportService;

impl ReportService {
    /// Builds the sales report.
    #[must_use]
    pub fn sales_report(rows: &[SaleRow], filter: &ReportFilter) -> SalesReport {
        let mut by_status: BTreeMap<_, (u64, Decimal)> = BTreeMap::new();
        let mut by_method: BTreeMap<_, (u64, Decimal)> = BTreeMap::new();
        let mut by_product: BTreeMap<Uuid, ProductSales> = BTreeMap::new();
        let mut by_day: BTreeMap<_, DailyTotal> = BTreeMap::new();

        for row in rows {
            tally(by_status.entry(row.payment_status).or_default(), row.total_amount);
            tally(by_method.entry(row.payment_method).or_default(), row.total_amount);

            let product = by_product
                .entry(row.product_id)
                .or_insert_with(|| ProductSales {
                    product_id: row.product_id,
                    product_name: row.product_name.clone(),
                    sale_count: 0,
                    quantity: Decimal::ZERO,
                    revenue: Decimal::ZERO,
                    profit: Decimal::ZERO,
                });
            product.sale_count += 1;
            product.quantity += row.quantity;
            product.revenue += row.total_amount;
            product.profit += row.profit;

            let day = by_day.entry(row.sale_date).or_insert_with(|| DailyTotal {
                date: row.sale_date,
                count: 0,
                revenue: Decimal::ZERO,
                profit: Decimal::ZERO,
            });
            day.count += 1;
            day.revenue += row.total_amount;
            day.profit += row.profit;
        }

        let mut top_products: Vec<ProductSales> = by_product.into_values().collect();
        top_products.sort_by(|a, b| {
            b.revenue
                .cmp(&a.revenue)
                .then_with(|| a.product_name.cmp(&b.product_name))
        });
        top_products.truncate(filter.top_n);

        SalesReport {
            summary: Self::sales_summary(rows),
            by_payment_status: breakdown(by_status, |s| (s.as_str(), s.label())),
            by_payment_method: breakdown(by_method, |m| (m.as_str(), m.label())),
            top_products,
            daily: by_day.into_values().collect(),
        }
    }

    /// Totals over sale rows.
    #[must_use]
    pub fn sales_summary(rows: &[SaleRow]) -> SalesSummary {
        let mut summary = SalesSummary::default();
        for row in rows {
            summary.count += 1;
            summary.total_quantity += row.quantity;
            summary.revenue += row.total_amount;
            summary.cost += row.cost;
            summary.profit += row.profit;
            summary.amount_paid += row.amount_paid;
        }
        summary.outstanding = summary.revenue - summary.amount_paid;
        summary.average_sale = average(summary.revenue, summary.count);
        summary
    }

    /// Builds the expense report.
    #[must_use]
    pub fn expense_report(rows: &[ExpenseRow], filter: &ReportFilter) -> ExpenseReport {
        let summary = Self::expense_summary(rows);

        let mut by_category: BTreeMap<&str, (u64, Decimal)> = BTreeMap::new();
        let mut by_status: BTreeMap<_, (u64, Decimal)> = BTreeMap::new();
        for row in rows {
            let category = row.category_name.as_deref().unwrap_or(UNCATEGORIZED);
            tally(by_category.entry(category).or_default(), row.amount);
            tally(by_status.entry(row.status).or_default(), row.amount);
        }

        let mut by_category: Vec<CategoryShare> = by_category
            .into_iter()
            .map(|(category, (count, total))| CategoryShare {
                category: category.to_string(),
                count,
                total,
                share_percent: percent(total, summary.total),
            })
            .collect();
        by_category.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.category.cmp(&b.category)));

        let mut top_expenses = rows.to_vec();
        top_expenses.sort_by(|a, b| {
            b.amount
                .cmp(&a.amount)
                .then_with(|| b.expense_date.cmp(&a.expense_date))
                .then_with(|| a.title.cmp(&b.title))
        });
        top_expenses.truncate(filter.top_n);

        ExpenseReport {
            summary,
            by_category,
            by_status: breakdown(by_status, |s| (s.as_str(), s.label())),
            top_expenses,
        }
    }

    /// Totals over expense rows.
    #[must_use]
    pub fn expense_summary(rows: &[ExpenseRow]) -> ExpenseSummary {
        let mut summary = ExpenseSummary::default();
        for row in rows {
            summary.count += 1;
            summary.total += row.amount;
            match row.status {
                ExpenseStatus::Paid => summary.paid += row.amount,
                ExpenseStatus::Pending => summary.pending += row.amount,
            }
        }
        summary.average = average(summary.total, summary.count);
        summary
    }

    /// Builds the inventory report.
    ///
    /// Stock figures are a snapshot of the products as given; only the
    /// movements are limited to the report period.
    #[must_use]
    pub fn inventory_report(
        products: &[ProductStockRow],
        movements: &[MovementRow],
        _filter: &ReportFilter,
    ) -> InventoryReport {
        let mut by_category: BTreeMap<&str, CategoryStock> = BTreeMap::new();
        for product in products {
            let name = product.category_name.as_deref().unwrap_or(UNCATEGORIZED);
            let entry = by_category.entry(name).or_insert_with(|| CategoryStock {
                category: name.to_string(),
                product_count: 0,
                quantity: Decimal::ZERO,
                stock_value: Decimal::ZERO,
            });
            entry.product_count += 1;
            entry.quantity += product.quantity;
            entry.stock_value += (product.quantity * product.cost_price).round_dp(2);
        }
        let mut by_category: Vec<CategoryStock> = by_category.into_values().collect();
        by_category.sort_by(|a, b| {
            b.stock_value
                .cmp(&a.stock_value)
                .then_with(|| a.category.cmp(&b.category))
        });

        let mut low_stock: Vec<LowStockItem> = products
            .iter()
            .filter(|p| is_low_stock(p.quantity, p.low_stock_threshold))
            .map(|p| LowStockItem {
                product_id: p.id,
                name: p.name.clone(),
                quantity: p.quantity,
                threshold: p.low_stock_threshold,
                unit: p.unit.clone(),
            })
            .collect();
        low_stock.sort_by(|a, b| a.quantity.cmp(&b.quantity).then_with(|| a.name.cmp(&b.name)));

        let mut by_type: BTreeMap<_, (u64, Decimal)> = BTreeMap::new();
        for movement in movements {
            tally(
                by_type.entry(movement.movement_type).or_default(),
                movement.quantity_change,
            );
        }
        let movements = by_type
            .into_iter()
            .map(|(movement_type, (count, quantity))| MovementTotal {
                movement_type,
                label: movement_type.label().to_string(),
                count,
                quantity,
            })
            .collect();

        InventoryReport {
            summary: Self::inventory_summary(products),
            by_category,
            low_stock,
            movements,
        }
    }

    /// Totals over product rows.
    #[must_use]
    pub fn inventory_summary(products: &[ProductStockRow]) -> InventorySummary {
        let mut summary = InventorySummary::default();
        for product in products {
            summary.product_count += 1;
            summary.total_quantity += product.quantity;
            summary.stock_value += (product.quantity * product.cost_price).round_dp(2);
            summary.retail_value += (product.quantity * product.selling_price).round_dp(2);
            if is_low_stock(product.quantity, product.low_stock_threshold) {
                summary.low_stock_count += 1;
            }
            if product.quantity.is_zero() {
                summary.out_of_stock_count += 1;
            }
        }
        summary
    }

    /// Builds the financial report.
    #[must_use]
    pub fn financial_report(
        transactions: &[TransactionRow],
        deposits: &[DepositRow],
        _filter: &ReportFilter,
    ) -> FinancialReport {
        let mut by_type: BTreeMap<_, (u64, Decimal)> = BTreeMap::new();
        for row in transactions {
            tally(by_type.entry(row.transaction_type).or_default(), row.amount);
        }
        let mut by_deposit: BTreeMap<_, (u64, Decimal)> = BTreeMap::new();
        for row in deposits {
            tally(by_deposit.entry(row.deposit_type).or_default(), row.amount);
        }

        FinancialReport {
            summary: Self::financial_summary(transactions, deposits),
            by_transaction_type: breakdown(by_type, |t| (t.as_str(), t.label())),
            by_deposit_type: breakdown(by_deposit, |d| (d.as_str(), d.label())),
        }
    }

    /// Cash flow totals.
    #[must_use]
    pub fn financial_summary(
        transactions: &[TransactionRow],
        deposits: &[DepositRow],
    ) -> FinancialSummary {
        let mut summary = FinancialSummary::default();
        for row in transactions {
            match row.transaction_type.flow() {
                CashFlow::Inflow => summary.inflow += row.amount,
                CashFlow::Outflow => summary.outflow += row.amount,
                CashFlow::Transfer => {}
            }
        }
        summary.deposits_total = deposits.iter().map(|d| d.amount).sum();
        summary.net_cash_flow = summary.inflow - summary.outflow;
        summary.cash_on_hand = summary.net_cash_flow - summary.deposits_total;
        summary
    }

    /// Combines the four area reports.
    #[must_use]
    pub fn general_report(
        sales: &SalesReport,
        expenses: &ExpenseReport,
        inventory: &InventoryReport,
        financial: &FinancialReport,
    ) -> GeneralReport {
        GeneralReport {
            net_profit: sales.summary.profit - expenses.summary.total,
            sales: sales.summary.clone(),
            expenses: expenses.summary.clone(),
            inventory: inventory.summary.clone(),
            financial: financial.summary.clone(),
        }
    }

    /// Computes the dashboard figures.
    #[must_use]
    pub fn dashboard_stats(input: DashboardInput) -> DashboardStats {
        let month = Self::sales_summary(&input.month_sales);
        let month_expenses: Decimal = input.month_expenses.iter().map(|e| e.amount).sum();

        let today = input
            .month_sales
            .iter()
            .filter(|s| s.sale_date == input.today)
            .fold(TodaySales::default(), |mut acc, s| {
                acc.count += 1;
                acc.revenue += s.total_amount;
                acc
            });

        let inventory = Self::inventory_summary(&input.products);

        let mut recent = input.recent_sales;
        recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let recent_sales = recent
            .into_iter()
            .take(RECENT_SALES)
            .map(|s| RecentSale {
                id: s.id,
                product_name: s.product_name,
                contact_name: s.contact_name,
                quantity: s.quantity,
                total_amount: s.total_amount,
                payment_status: s.payment_status,
                sale_date: s.sale_date,
            })
            .collect();

        DashboardStats {
            today,
            month_revenue: month.revenue,
            month_profit: month.profit,
            month_expenses,
            month_net_profit: month.profit - month_expenses,
            outstanding_credit: input.outstanding_credit,
            product_count: inventory.product_count,
            low_stock_count: inventory.low_stock_count,
            recent_sales,
        }
    }
}

fn tally(slot: &mut (u64, Decimal), amount: Decimal) {
    slot.0 += 1;
    slot.1 += amount;
}

fn breakdown<K: Ord>(
    groups: BTreeMap<K, (u64, Decimal)>,
    describe: impl Fn(&K) -> (&'static str, &'static str),
) -> Vec<Breakdown> {
    let mut out: Vec<Breakdown> = groups
        .into_iter()
        .map(|(key, (count, amount))| {
            let (key, label) = describe(&key);
            Breakdown {
                key: key.to_string(),
                label: label.to_string(),
                count,
                amount,
            }
        })
        .collect();
    out.sort_by(|a, b| b.amount.cmp(&a.amount).then_with(|| a.key.cmp(&b.key)));
    out
}

fn average(total: Decimal, count: u64) -> Decimal {
    if count == 0 {
        Decimal::ZERO
    } else {
        (total / Decimal::from(count)).round_dp(2)
    }
}

fn percent(part: Decimal, whole: Decimal) -> Decimal {
    if whole.is_zero() {
        Decimal::ZERO
    } else {
        (part * Decimal::ONE_HUNDRED / whole).round_dp(2)
    }
}
