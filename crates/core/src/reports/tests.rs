//! Aggregation tests for the reports module.

use chrono::{NaiveDate, TimeZone, Utc};
use proptest::prelude::*;
use rstest::{fixture, rstest};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

use super::filter::ReportFilter;
use super::service::{ReportService, UNCATEGORIZED};
use super::types::{
    DashboardInput, DepositRow, ExpenseRow, MovementRow, ProductStockRow, SaleRow, TransactionRow,
};
use crate::finance::{DepositType, ExpenseStatus, TransactionType};
use crate::inventory::MovementType;
use crate::sales::{PaymentMethod, PaymentStatus};

fn date(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
}

fn march() -> ReportFilter {
    ReportFilter::for_period(date(1), date(31))
}

fn sale(
    product: (Uuid, &str),
    day: u32,
    total: Decimal,
    cost: Decimal,
    paid: Decimal,
    method: PaymentMethod,
) -> SaleRow {
    let status = if paid == total {
        PaymentStatus::Paid
    } else if paid.is_zero() {
        PaymentStatus::Pending
    } else {
        PaymentStatus::Partial
    };
    SaleRow {
        id: Uuid::new_v4(),
        product_id: product.0,
        product_name: product.1.to_string(),
        category_name: Some("Fresh fish".to_string()),
        contact_name: None,
        quantity: dec!(1),
        unit_price: total,
        total_amount: total,
        cost,
        profit: total - cost,
        amount_paid: paid,
        payment_method: method,
        payment_status: status,
        sale_date: date(day),
        created_at: Utc.with_ymd_and_hms(2025, 3, day, 9, 0, 0).unwrap(),
    }
}

fn expense(title: &str, category: Option<&str>, amount: Decimal, status: ExpenseStatus) -> ExpenseRow {
    ExpenseRow {
        id: Uuid::new_v4(),
        title: title.to_string(),
        category_name: category.map(str::to_string),
        amount,
        status,
        expense_date: date(5),
    }
}

fn product(name: &str, category: Option<&str>, quantity: Decimal, threshold: Decimal) -> ProductStockRow {
    ProductStockRow {
        id: Uuid::new_v4(),
        name: name.to_string(),
        category_name: category.map(str::to_string),
        unit: "kg".to_string(),
        quantity,
        cost_price: dec!(4.00),
        selling_price: dec!(6.50),
        low_stock_threshold: threshold,
    }
}

#[fixture]
fn tilapia() -> (Uuid, &'static str) {
    (Uuid::from_u128(1), "Tilapia")
}

#[fixture]
fn catfish() -> (Uuid, &'static str) {
    (Uuid::from_u128(2), "Catfish")
}

#[rstest]
fn test_sales_summary_totals(tilapia: (Uuid, &'static str), catfish: (Uuid, &'static str)) {
    let rows = vec![
        sale(tilapia, 3, dec!(100), dec!(60), dec!(100), PaymentMethod::Cash),
        sale(tilapia, 3, dec!(50), dec!(30), dec!(20), PaymentMethod::MobileMoney),
        sale(catfish, 4, dec!(30), dec!(25), dec!(0), PaymentMethod::Credit),
    ];

    let report = ReportService::sales_report(&rows, &march());

    assert_eq!(report.summary.count, 3);
    assert_eq!(report.summary.revenue, dec!(180));
    assert_eq!(report.summary.cost, dec!(115));
    assert_eq!(report.summary.profit, dec!(65));
    assert_eq!(report.summary.amount_paid, dec!(120));
    assert_eq!(report.summary.outstanding, dec!(60));
    assert_eq!(report.summary.average_sale, dec!(60));
}

#[rstest]
fn test_sales_breakdowns_are_ordered(tilapia: (Uuid, &'static str), catfish: (Uuid, &'static str)) {
    let rows = vec![
        sale(catfish, 2, dec!(30), dec!(25), dec!(0), PaymentMethod::Credit),
        sale(tilapia, 1, dec!(100), dec!(60), dec!(100), PaymentMethod::Cash),
        sale(tilapia, 2, dec!(50), dec!(30), dec!(20), PaymentMethod::Cash),
    ];

    let report = ReportService::sales_report(&rows, &march());

    let methods: Vec<_> = report.by_payment_method.iter().map(|b| b.key.as_str()).collect();
    assert_eq!(methods, ["cash", "credit"]);
    assert_eq!(report.by_payment_method[0].count, 2);
    assert_eq!(report.by_payment_method[0].amount, dec!(150));

    let statuses: Vec<_> = report.by_payment_status.iter().map(|b| b.key.as_str()).collect();
    assert_eq!(statuses, ["paid", "partial", "pending"]);

    assert_eq!(report.top_products[0].product_name, "Tilapia");
    assert_eq!(report.top_products[0].sale_count, 2);
    assert_eq!(report.top_products[0].revenue, dec!(150));

    let days: Vec<_> = report.daily.iter().map(|d| d.date).collect();
    assert_eq!(days, [date(1), date(2)]);
    assert_eq!(report.daily[1].revenue, dec!(80));
}

#[rstest]
fn test_top_products_ties_break_by_name(tilapia: (Uuid, &'static str), catfish: (Uuid, &'static str)) {
    let rows = vec![
        sale(tilapia, 1, dec!(40), dec!(10), dec!(40), PaymentMethod::Cash),
        sale(catfish, 1, dec!(40), dec!(10), dec!(40), PaymentMethod::Cash),
    ];
    let mut filter = march();
    filter.top_n = 1;

    let report = ReportService::sales_report(&rows, &filter);

    assert_eq!(report.top_products.len(), 1);
    assert_eq!(report.top_products[0].product_name, "Catfish");
}

#[test]
fn test_empty_sales_report() {
    let report = ReportService::sales_report(&[], &march());

    assert_eq!(report.summary.count, 0);
    assert_eq!(report.summary.average_sale, Decimal::ZERO);
    assert!(report.top_products.is_empty());
    assert!(report.daily.is_empty());
}

#[test]
fn test_expense_report_shares() {
    let rows = vec![
        expense("Ice", Some("Supplies"), dec!(30), ExpenseStatus::Paid),
        expense("Fuel", Some("Transport"), dec!(60), ExpenseStatus::Pending),
        expense("Nets", Some("Supplies"), dec!(10), ExpenseStatus::Paid),
        expense("Misc", None, dec!(20), ExpenseStatus::Paid),
    ];

    let report = ReportService::expense_report(&rows, &march());

    assert_eq!(report.summary.total, dec!(120));
    assert_eq!(report.summary.paid, dec!(60));
    assert_eq!(report.summary.pending, dec!(60));
    assert_eq!(report.summary.average, dec!(30));

    let categories: Vec<_> = report.by_category.iter().map(|c| c.category.as_str()).collect();
    assert_eq!(categories, ["Transport", "Supplies", UNCATEGORIZED]);
    assert_eq!(report.by_category[0].share_percent, dec!(50));
    assert_eq!(report.by_category[1].share_percent, dec!(33.33));
    assert_eq!(report.by_category[2].share_percent, dec!(16.67));

    assert_eq!(report.top_expenses[0].title, "Fuel");
}

#[test]
fn test_inventory_report() {
    let products = vec![
        product("Tilapia", Some("Fresh fish"), dec!(10), dec!(5)),
        product("Catfish", Some("Fresh fish"), dec!(3), dec!(5)),
        product("Smoked mackerel", None, dec!(0), dec!(2)),
    ];
    let movements = vec![
        MovementRow {
            movement_type: MovementType::Addition,
            quantity_change: dec!(20),
            created_at: Utc.with_ymd_and_hms(2025, 3, 2, 8, 0, 0).unwrap(),
        },
        MovementRow {
            movement_type: MovementType::Sale,
            quantity_change: dec!(-4),
            created_at: Utc.with_ymd_and_hms(2025, 3, 3, 8, 0, 0).unwrap(),
        },
        MovementRow {
            movement_type: MovementType::Sale,
            quantity_change: dec!(-3),
            created_at: Utc.with_ymd_and_hms(2025, 3, 4, 8, 0, 0).unwrap(),
        },
    ];

    let report = ReportService::inventory_report(&products, &movements, &march());

    assert_eq!(report.summary.product_count, 3);
    assert_eq!(report.summary.total_quantity, dec!(13));
    assert_eq!(report.summary.stock_value, dec!(52.00));
    assert_eq!(report.summary.retail_value, dec!(84.50));
    assert_eq!(report.summary.low_stock_count, 2);
    assert_eq!(report.summary.out_of_stock_count, 1);

    let low: Vec<_> = report.low_stock.iter().map(|l| l.name.as_str()).collect();
    assert_eq!(low, ["Smoked mackerel", "Catfish"]);

    assert_eq!(report.by_category[0].category, "Fresh fish");
    assert_eq!(report.by_category[0].product_count, 2);

    assert_eq!(report.movements.len(), 2);
    assert_eq!(report.movements[1].movement_type, MovementType::Sale);
    assert_eq!(report.movements[1].count, 2);
    assert_eq!(report.movements[1].quantity, dec!(-7));
}

#[test]
fn test_financial_report_cash_on_hand() {
    let transactions = vec![
        TransactionRow {
            transaction_type: TransactionType::Sale,
            amount: dec!(500),
            transaction_date: date(2),
        },
        TransactionRow {
            transaction_type: TransactionType::Expense,
            amount: dec!(80),
            transaction_date: date(3),
        },
        TransactionRow {
            transaction_type: TransactionType::StockPurchase,
            amount: dec!(120),
            transaction_date: date(3),
        },
        TransactionRow {
            transaction_type: TransactionType::Deposit,
            amount: dec!(200),
            transaction_date: date(4),
        },
    ];
    let deposits = vec![DepositRow {
        deposit_type: DepositType::Bank,
        amount: dec!(200),
        deposit_date: date(4),
    }];

    let report = ReportService::financial_report(&transactions, &deposits, &march());

    assert_eq!(report.summary.inflow, dec!(500));
    assert_eq!(report.summary.outflow, dec!(200));
    assert_eq!(report.summary.net_cash_flow, dec!(300));
    assert_eq!(report.summary.deposits_total, dec!(200));
    assert_eq!(report.summary.cash_on_hand, dec!(100));
    assert_eq!(report.by_transaction_type[0].key, "sale");
    assert_eq!(report.by_deposit_type[0].label, "Bank");
}

#[rstest]
fn test_general_report_net_profit(tilapia: (Uuid, &'static str)) {
    let filter = march();
    let sales = ReportService::sales_report(
        &[sale(tilapia, 1, dec!(100), dec!(60), dec!(100), PaymentMethod::Cash)],
        &filter,
    );
    let expenses = ReportService::expense_report(
        &[expense("Ice", None, dec!(15), ExpenseStatus::Paid)],
        &filter,
    );
    let inventory = ReportService::inventory_report(&[], &[], &filter);
    let financial = ReportService::financial_report(&[], &[], &filter);

    let report = ReportService::general_report(&sales, &expenses, &inventory, &financial);

    assert_eq!(report.net_profit, dec!(25));
    assert_eq!(report.sales.revenue, dec!(100));
}

#[rstest]
fn test_dashboard_stats(tilapia: (Uuid, &'static str), catfish: (Uuid, &'static str)) {
    let month_sales: Vec<SaleRow> = (1..=7)
        .map(|day| sale(tilapia, day, dec!(10), dec!(6), dec!(10), PaymentMethod::Cash))
        .chain([sale(catfish, 7, dec!(20), dec!(12), dec!(0), PaymentMethod::Credit)])
        .collect();

    let stats = ReportService::dashboard_stats(DashboardInput {
        today: date(7),
        recent_sales: month_sales.clone(),
        month_sales,
        month_expenses: vec![expense("Ice", None, dec!(5), ExpenseStatus::Paid)],
        products: vec![
            product("Tilapia", None, dec!(10), dec!(5)),
            product("Catfish", None, dec!(1), dec!(5)),
        ],
        outstanding_credit: dec!(20),
    });

    assert_eq!(stats.today.count, 2);
    assert_eq!(stats.today.revenue, dec!(30));
    assert_eq!(stats.month_revenue, dec!(90));
    assert_eq!(stats.month_profit, dec!(36));
    assert_eq!(stats.month_net_profit, dec!(31));
    assert_eq!(stats.low_stock_count, 1);
    assert_eq!(stats.product_count, 2);
    assert_eq!(stats.recent_sales.len(), 5);
    assert_eq!(stats.recent_sales[0].sale_date, date(7));
}

proptest! {
    /// Breakdown amounts always add up to the summary revenue.
    #[test]
    fn prop_breakdowns_sum_to_revenue(
        amounts in prop::collection::vec((1i64..100_000, 0i64..=2), 0..40),
    ) {
        let methods = [PaymentMethod::Cash, PaymentMethod::MobileMoney, PaymentMethod::Credit];
        let rows: Vec<SaleRow> = amounts
            .iter()
            .enumerate()
            .map(|(i, (cents, method))| {
                let total = Decimal::new(*cents, 2);
                let product = (Uuid::from_u128((i % 3) as u128), "P");
                sale(product, 1 + (i % 28) as u32, total, Decimal::ZERO, total, methods[*method as usize])
            })
            .collect();

        let report = ReportService::sales_report(&rows, &march());

        let by_method: Decimal = report.by_payment_method.iter().map(|b| b.amount).sum();
        let by_status: Decimal = report.by_payment_status.iter().map(|b| b.amount).sum();
        let by_day: Decimal = report.daily.iter().map(|d| d.revenue).sum();
        let count: u64 = report.by_payment_method.iter().map(|b| b.count).sum();

        prop_assert_eq!(by_method, report.summary.revenue);
        prop_assert_eq!(by_status, report.summary.revenue);
        prop_assert_eq!(by_day, report.summary.revenue);
        prop_assert_eq!(count, rows.len() as u64);
    }

    /// Category shares of a non-empty expense report add up to about 100%.
    #[test]
    fn prop_category_shares_sum_to_hundred(
        amounts in prop::collection::vec((1i64..1_000_000, 0usize..4), 1..30),
    ) {
        let categories = ["Ice", "Fuel", "Rent", "Wages"];
        let rows: Vec<ExpenseRow> = amounts
            .iter()
            .map(|(cents, cat)| {
                expense("e", Some(categories[*cat]), Decimal::new(*cents, 2), ExpenseStatus::Paid)
            })
            .collect();

        let report = ReportService::expense_report(&rows, &march());
        let shares: Decimal = report.by_category.iter().map(|c| c.share_percent).sum();

        // Each share is rounded to 0.01, so the sum may drift by half a cent per category.
        prop_assert!((shares - Decimal::ONE_HUNDRED).abs() <= dec!(0.02));
    }

    /// Cash on hand is always inflow − outflow − deposits.
    #[test]
    fn prop_cash_on_hand_identity(
        entries in prop::collection::vec((1i64..1_000_000, 0usize..5), 0..30),
        deposits in prop::collection::vec(1i64..1_000_000, 0..10),
    ) {
        let transactions: Vec<TransactionRow> = entries
            .iter()
            .map(|(cents, kind)| TransactionRow {
                transaction_type: TransactionType::ALL[*kind],
                amount: Decimal::new(*cents, 2),
                transaction_date: date(1),
            })
            .collect();
        let deposits: Vec<DepositRow> = deposits
            .iter()
            .map(|cents| DepositRow {
                deposit_type: DepositType::Bank,
                amount: Decimal::new(*cents, 2),
                deposit_date: date(1),
            })
            .collect();

        let summary = ReportService::financial_summary(&transactions, &deposits);

        prop_assert_eq!(summary.net_cash_flow, summary.inflow - summary.outflow);
        prop_assert_eq!(summary.cash_on_hand, summary.net_cash_flow - summary.deposits_total);
    }
}
