//! Report repository: the query side of report generation.
//!
//! Each method applies the report filter in SQL and returns the plain row
//! types the aggregation in `localfish_core::reports` works on. Names of
//! products, categories and contacts are resolved through per-business
//! lookup maps rather than joins.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate, Utc};
use localfish_core::finance::{DepositType, ExpenseStatus, TransactionType};
use localfish_core::inventory::MovementType;
use localfish_core::reports::{
    DashboardInput, DepositRow, ExpenseRow, MovementRow, ProductStockRow, ReportFilter, SaleRow,
    TransactionRow,
};
use localfish_core::sales::{PaymentMethod, PaymentStatus};
use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
};
use uuid::Uuid;

use super::decode;
use super::error::RepoResult;
use crate::entities::{
    contacts, deposits, expense_categories, expenses, product_categories, products, sales,
    stock_movements, transactions,
};

/// Number of latest sales loaded for the dashboard.
const RECENT_SALES: u64 = 5;

/// Names needed to describe sale and product rows.
struct Lookups {
    products: HashMap<Uuid, products::Model>,
    categories: HashMap<Uuid, String>,
    contacts: HashMap<Uuid, String>,
}

impl Lookups {
    fn category_of(&self, product_id: Uuid) -> Option<String> {
        self.products
            .get(&product_id)
            .and_then(|p| p.category_id)
            .and_then(|id| self.categories.get(&id).cloned())
    }

    fn sale_row(&self, sale: sales::Model) -> RepoResult<SaleRow> {
        Ok(SaleRow {
            id: sale.id,
            product_id: sale.product_id,
            product_name: self
                .products
                .get(&sale.product_id)
                .map_or_else(String::new, |p| p.name.clone()),
            category_name: self.category_of(sale.product_id),
            contact_name: sale
                .contact_id
                .and_then(|id| self.contacts.get(&id).cloned()),
            quantity: sale.quantity,
            unit_price: sale.unit_price,
            cost: sale.total_amount - sale.profit,
            total_amount: sale.total_amount,
            profit: sale.profit,
            amount_paid: sale.amount_paid,
            payment_method: decode("payment_method", &sale.payment_method, PaymentMethod::parse)?,
            payment_status: decode("payment_status", &sale.payment_status, PaymentStatus::parse)?,
            sale_date: sale.sale_date,
            created_at: sale.created_at.with_timezone(&Utc),
        })
    }

    fn stock_row(&self, product: &products::Model) -> ProductStockRow {
        ProductStockRow {
            id: product.id,
            name: product.name.clone(),
            category_name: product
                .category_id
                .and_then(|id| self.categories.get(&id).cloned()),
            unit: product.unit.clone(),
            quantity: product.quantity,
            cost_price: product.cost_price,
            selling_price: product.selling_price,
            low_stock_threshold: product.low_stock_threshold,
        }
    }
}

/// Report repository.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    db: DatabaseConnection,
}

impl ReportRepository {
    /// Creates a new report repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn lookups(&self, business_id: Uuid) -> RepoResult<Lookups> {
        let products = products::Entity::find()
            .filter(products::Column::UserId.eq(business_id))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();
        let categories = product_categories::Entity::find()
            .filter(product_categories::Column::UserId.eq(business_id))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|c| (c.id, c.name))
            .collect();
        let contacts = contacts::Entity::find()
            .filter(contacts::Column::UserId.eq(business_id))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|c| (c.id, c.name))
            .collect();

        Ok(Lookups {
            products,
            categories,
            contacts,
        })
    }

    /// IDs of the products the filter restricts to, if any.
    fn product_scope(lookups: &Lookups, filter: &ReportFilter) -> Option<Vec<Uuid>> {
        if filter.product_id.is_none() && filter.category_id.is_none() {
            return None;
        }
        Some(
            lookups
                .products
                .values()
                .filter(|p| filter.product_id.is_none_or(|id| p.id == id))
                .filter(|p| filter.category_id.is_none_or(|id| p.category_id == Some(id)))
                .map(|p| p.id)
                .collect(),
        )
    }

    // ========================================================================
    // Sales
    // ========================================================================

    /// Sales in the period, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails or a stored enum value
    /// is unknown.
    pub async fn sale_rows(
        &self,
        business_id: Uuid,
        filter: &ReportFilter,
    ) -> RepoResult<Vec<SaleRow>> {
        let lookups = self.lookups(business_id).await?;

        let mut query = sales::Entity::find()
            .filter(sales::Column::UserId.eq(business_id))
            .filter(sales::Column::SaleDate.gte(filter.start_date))
            .filter(sales::Column::SaleDate.lte(filter.end_date));

        if let Some(ids) = Self::product_scope(&lookups, filter) {
            query = query.filter(sales::Column::ProductId.is_in(ids));
        }
        if let Some(status) = filter.payment_status {
            query = query.filter(sales::Column::PaymentStatus.eq(status.as_str()));
        }
        if let Some(method) = filter.payment_method {
            query = query.filter(sales::Column::PaymentMethod.eq(method.as_str()));
        }

        query
            .order_by_asc(sales::Column::SaleDate)
            .order_by_asc(sales::Column::CreatedAt)
            .all(&self.db)
            .await?
            .into_iter()
            .map(|sale| lookups.sale_row(sale))
            .collect()
    }

    // ========================================================================
    // Expenses
    // ========================================================================

    /// Expenses in the period, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails or a stored enum value
    /// is unknown.
    pub async fn expense_rows(
        &self,
        business_id: Uuid,
        filter: &ReportFilter,
    ) -> RepoResult<Vec<ExpenseRow>> {
        let categories: HashMap<Uuid, String> = expense_categories::Entity::find()
            .filter(expense_categories::Column::UserId.eq(business_id))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|c| (c.id, c.name))
            .collect();

        let mut query = expenses::Entity::find()
            .filter(expenses::Column::UserId.eq(business_id))
            .filter(expenses::Column::ExpenseDate.gte(filter.start_date))
            .filter(expenses::Column::ExpenseDate.lte(filter.end_date));

        if let Some(category_id) = filter.category_id {
            query = query.filter(expenses::Column::CategoryId.eq(category_id));
        }
        if let Some(status) = filter.expense_status {
            query = query.filter(expenses::Column::PaymentStatus.eq(status.as_str()));
        }

        query
            .order_by_asc(expenses::Column::ExpenseDate)
            .all(&self.db)
            .await?
            .into_iter()
            .map(|e| {
                Ok(ExpenseRow {
                    id: e.id,
                    category_name: e.category_id.and_then(|id| categories.get(&id).cloned()),
                    status: decode("payment_status", &e.payment_status, ExpenseStatus::parse)?,
                    title: e.title,
                    amount: e.amount,
                    expense_date: e.expense_date,
                })
            })
            .collect()
    }

    // ========================================================================
    // Inventory
    // ========================================================================

    /// Current stock of every product in scope, by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn product_stock_rows(
        &self,
        business_id: Uuid,
        filter: &ReportFilter,
    ) -> RepoResult<Vec<ProductStockRow>> {
        let lookups = self.lookups(business_id).await?;
        let scope = Self::product_scope(&lookups, filter);

        let mut rows: Vec<ProductStockRow> = lookups
            .products
            .values()
            .filter(|p| scope.as_ref().is_none_or(|ids| ids.contains(&p.id)))
            .map(|p| lookups.stock_row(p))
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(rows)
    }

    /// Stock movements recorded in the period.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails or a stored enum value
    /// is unknown.
    pub async fn movement_rows(
        &self,
        business_id: Uuid,
        filter: &ReportFilter,
    ) -> RepoResult<Vec<MovementRow>> {
        let mut query = stock_movements::Entity::find()
            .filter(stock_movements::Column::UserId.eq(business_id));

        if let Some(start) = filter.start_date.and_hms_opt(0, 0, 0) {
            query = query.filter(stock_movements::Column::CreatedAt.gte(start.and_utc()));
        }
        if let Some(end) = filter.end_date.succ_opt().and_then(|d| d.and_hms_opt(0, 0, 0)) {
            query = query.filter(stock_movements::Column::CreatedAt.lt(end.and_utc()));
        }
        if filter.product_id.is_some() || filter.category_id.is_some() {
            let lookups = self.lookups(business_id).await?;
            if let Some(ids) = Self::product_scope(&lookups, filter) {
                query = query.filter(stock_movements::Column::ProductId.is_in(ids));
            }
        }

        query
            .order_by_asc(stock_movements::Column::CreatedAt)
            .all(&self.db)
            .await?
            .into_iter()
            .map(|m| {
                Ok(MovementRow {
                    movement_type: decode("movement_type", &m.movement_type, MovementType::parse)?,
                    quantity_change: m.quantity_change,
                    created_at: m.created_at.with_timezone(&Utc),
                })
            })
            .collect()
    }

    // ========================================================================
    // Financial
    // ========================================================================

    /// Cash log entries in the period.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails or a stored enum value
    /// is unknown.
    pub async fn transaction_rows(
        &self,
        business_id: Uuid,
        filter: &ReportFilter,
    ) -> RepoResult<Vec<TransactionRow>> {
        transactions::Entity::find()
            .filter(transactions::Column::UserId.eq(business_id))
            .filter(transactions::Column::TransactionDate.gte(filter.start_date))
            .filter(transactions::Column::TransactionDate.lte(filter.end_date))
            .order_by_asc(transactions::Column::TransactionDate)
            .all(&self.db)
            .await?
            .into_iter()
            .map(|t| {
                Ok(TransactionRow {
                    transaction_type: decode(
                        "transaction_type",
                        &t.transaction_type,
                        TransactionType::parse,
                    )?,
                    amount: t.amount,
                    transaction_date: t.transaction_date,
                })
            })
            .collect()
    }

    /// Deposits in the period.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails or a stored enum value
    /// is unknown.
    pub async fn deposit_rows(
        &self,
        business_id: Uuid,
        filter: &ReportFilter,
    ) -> RepoResult<Vec<DepositRow>> {
        let mut query = deposits::Entity::find()
            .filter(deposits::Column::UserId.eq(business_id))
            .filter(deposits::Column::DepositDate.gte(filter.start_date))
            .filter(deposits::Column::DepositDate.lte(filter.end_date));
        if let Some(kind) = filter.deposit_type {
            query = query.filter(deposits::Column::DepositType.eq(kind.as_str()));
        }

        query
            .order_by_asc(deposits::Column::DepositDate)
            .all(&self.db)
            .await?
            .into_iter()
            .map(|d| {
                Ok(DepositRow {
                    deposit_type: decode("deposit_type", &d.deposit_type, DepositType::parse)?,
                    amount: d.amount,
                    deposit_date: d.deposit_date,
                })
            })
            .collect()
    }

    // ========================================================================
    // Dashboard
    // ========================================================================

    /// Loads everything the dashboard is computed from.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails or a stored enum value
    /// is unknown.
    pub async fn dashboard_input(
        &self,
        business_id: Uuid,
        today: NaiveDate,
    ) -> RepoResult<DashboardInput> {
        let month = ReportFilter::for_period(today.with_day(1).unwrap_or(today), today);

        let month_sales = self.sale_rows(business_id, &month).await?;
        let month_expenses = self.expense_rows(business_id, &month).await?;

        let lookups = self.lookups(business_id).await?;
        let mut products: Vec<ProductStockRow> =
            lookups.products.values().map(|p| lookups.stock_row(p)).collect();
        products.sort_by(|a, b| a.name.cmp(&b.name));

        let outstanding_credit = sales::Entity::find()
            .filter(sales::Column::UserId.eq(business_id))
            .filter(sales::Column::PaymentStatus.ne(PaymentStatus::Paid.as_str()))
            .all(&self.db)
            .await?
            .iter()
            .map(|s| s.total_amount - s.amount_paid)
            .sum::<Decimal>();

        let recent_sales = sales::Entity::find()
            .filter(sales::Column::UserId.eq(business_id))
            .order_by_desc(sales::Column::CreatedAt)
            .limit(RECENT_SALES)
            .all(&self.db)
            .await?
            .into_iter()
            .map(|sale| lookups.sale_row(sale))
            .collect::<RepoResult<Vec<_>>>()?;

        Ok(DashboardInput {
            today,
            month_sales,
            month_expenses,
            products,
            outstanding_credit,
            recent_sales,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use rust_decimal_macros::dec;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn product(business_id: Uuid, category_id: Option<Uuid>, name: &str) -> products::Model {
        let now = Utc::now().into();
        products::Model {
            id: Uuid::new_v4(),
            user_id: business_id,
            category_id,
            name: name.to_string(),
            sku: None,
            unit: "kg".to_string(),
            quantity: dec!(8),
            cost_price: dec!(3),
            selling_price: dec!(5),
            low_stock_threshold: dec!(2),
            image_url: None,
            image_public_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn lookups(products: Vec<products::Model>) -> Lookups {
        Lookups {
            products: products.into_iter().map(|p| (p.id, p)).collect(),
            categories: HashMap::new(),
            contacts: HashMap::new(),
        }
    }

    #[test]
    fn test_product_scope_by_category() {
        let business = Uuid::new_v4();
        let fresh = Uuid::new_v4();
        let tilapia = product(business, Some(fresh), "Tilapia");
        let sardines = product(business, None, "Sardines");
        let lookups = lookups(vec![tilapia.clone(), sardines]);

        let mut filter = ReportFilter::for_period(date(2025, 1, 1), date(2025, 1, 31));
        assert!(ReportRepository::product_scope(&lookups, &filter).is_none());

        filter.category_id = Some(fresh);
        let scope = ReportRepository::product_scope(&lookups, &filter).unwrap();
        assert_eq!(scope, vec![tilapia.id]);

        filter.category_id = Some(Uuid::new_v4());
        assert!(ReportRepository::product_scope(&lookups, &filter).unwrap().is_empty());
    }

    #[test]
    fn test_sale_row_resolves_names_and_cost() {
        let business = Uuid::new_v4();
        let perch = product(business, None, "Nile perch");
        let lookups = lookups(vec![perch.clone()]);
        let created: DateTime<Utc> = Utc::now();

        let row = lookups
            .sale_row(sales::Model {
                id: Uuid::new_v4(),
                user_id: business,
                product_id: perch.id,
                contact_id: Some(Uuid::new_v4()),
                quantity: dec!(2),
                unit_price: dec!(5),
                unit_cost: dec!(3),
                total_amount: dec!(10),
                profit: dec!(4),
                amount_paid: dec!(10),
                payment_method: "mobile_money".to_string(),
                payment_status: "paid".to_string(),
                sale_date: date(2025, 1, 9),
                notes: None,
                recorded_by: business,
                created_at: created.into(),
                updated_at: created.into(),
            })
            .unwrap();

        assert_eq!(row.product_name, "Nile perch");
        assert_eq!(row.cost, dec!(6));
        assert_eq!(row.contact_name, None);
        assert_eq!(row.payment_method, PaymentMethod::MobileMoney);
        assert_eq!(row.created_at, created);
    }

    #[tokio::test]
    async fn test_transaction_rows_decode_types() {
        let business = Uuid::new_v4();
        let row = transactions::Model {
            id: Uuid::new_v4(),
            user_id: business,
            transaction_type: "stock_purchase".to_string(),
            amount: dec!(120),
            description: None,
            reference_id: None,
            transaction_date: date(2025, 2, 3),
            recorded_by: business,
            created_at: Utc::now().into(),
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![row]])
            .into_connection();

        let rows = ReportRepository::new(db)
            .transaction_rows(
                business,
                &ReportFilter::for_period(date(2025, 2, 1), date(2025, 2, 28)),
            )
            .await
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].transaction_type, TransactionType::StockPurchase);
    }

    #[tokio::test]
    async fn test_unknown_stored_value_is_an_error() {
        let business = Uuid::new_v4();
        let row = deposits::Model {
            id: Uuid::new_v4(),
            user_id: business,
            deposit_type: "safe".to_string(),
            amount: dec!(50),
            account_name: None,
            reference: None,
            deposit_date: date(2025, 2, 3),
            proof_url: None,
            proof_public_id: None,
            notes: None,
            recorded_by: business,
            created_at: Utc::now().into(),
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![row]])
            .into_connection();

        let result = ReportRepository::new(db)
            .deposit_rows(
                business,
                &ReportFilter::for_period(date(2025, 2, 1), date(2025, 2, 28)),
            )
            .await;

        assert!(result.is_err());
    }
}
