//! Sale repository.
//!
//! Recording a sale, a payment or a sale deletion touches the sale, the
//! product stock, the movement log and the cash log together, so each runs
//! in one database transaction with the product (or sale) row locked.

use chrono::{NaiveDate, Utc};
use localfish_core::finance::{ContactType, TransactionType};
use localfish_core::inventory::MovementType;
use localfish_core::sales::{
    PaymentMethod, PaymentStatus, SaleAmounts, apply_payment, default_amount_paid,
    payment_status_for,
};
use localfish_shared::types::{PageRequest, PageResponse};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use super::contact::ensure_contact;
use super::error::{RepoResult, RepositoryError};
use super::stock::{Movement, apply_movement, lock_product};
use super::transaction::{NewTransaction, record};
use super::paginate;
use crate::entities::sales;

/// Input for recording a sale.
#[derive(Debug, Clone)]
pub struct CreateSaleInput {
    /// Product sold.
    pub product_id: Uuid,
    /// Customer.
    pub contact_id: Option<Uuid>,
    /// Quantity sold.
    pub quantity: Decimal,
    /// Price per unit; the product's selling price when absent.
    pub unit_price: Option<Decimal>,
    /// Payment method.
    pub payment_method: PaymentMethod,
    /// Paid up front; the whole total unless the method is credit.
    pub amount_paid: Option<Decimal>,
    /// Business date; today when absent.
    pub sale_date: Option<NaiveDate>,
    /// Free text.
    pub notes: Option<String>,
}

/// Input for a payment against an open sale.
#[derive(Debug, Clone)]
pub struct RecordPaymentInput {
    /// Amount received.
    pub amount: Decimal,
    /// Business date; today when absent.
    pub payment_date: Option<NaiveDate>,
}

/// Filter for listing sales.
#[derive(Debug, Clone, Default)]
pub struct SaleFilter {
    /// Only this product.
    pub product_id: Option<Uuid>,
    /// Only this customer.
    pub contact_id: Option<Uuid>,
    /// Only sales in this state.
    pub payment_status: Option<PaymentStatus>,
    /// Only sales paid this way.
    pub payment_method: Option<PaymentMethod>,
    /// Only sales on or after this date.
    pub date_from: Option<NaiveDate>,
    /// Only sales on or before this date.
    pub date_to: Option<NaiveDate>,
}

/// Sale repository.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    db: DatabaseConnection,
}

impl SaleRepository {
    /// Creates a new sale repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists sales, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        business_id: Uuid,
        filter: SaleFilter,
        page: PageRequest,
    ) -> RepoResult<PageResponse<sales::Model>> {
        let mut query = sales::Entity::find().filter(sales::Column::UserId.eq(business_id));

        if let Some(product_id) = filter.product_id {
            query = query.filter(sales::Column::ProductId.eq(product_id));
        }
        if let Some(contact_id) = filter.contact_id {
            query = query.filter(sales::Column::ContactId.eq(contact_id));
        }
        if let Some(status) = filter.payment_status {
            query = query.filter(sales::Column::PaymentStatus.eq(status.as_str()));
        }
        if let Some(method) = filter.payment_method {
            query = query.filter(sales::Column::PaymentMethod.eq(method.as_str()));
        }
        if let Some(date_from) = filter.date_from {
            query = query.filter(sales::Column::SaleDate.gte(date_from));
        }
        if let Some(date_to) = filter.date_to {
            query = query.filter(sales::Column::SaleDate.lte(date_to));
        }

        let query = query
            .order_by_desc(sales::Column::SaleDate)
            .order_by_desc(sales::Column::CreatedAt);
        paginate(&self.db, query, page).await
    }

    /// Finds a sale of the business.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if there is no such sale.
    pub async fn find(&self, business_id: Uuid, id: Uuid) -> RepoResult<sales::Model> {
        sales::Entity::find_by_id(id)
            .filter(sales::Column::UserId.eq(business_id))
            .one(&self.db)
            .await?
            .ok_or(RepositoryError::NotFound("Sale"))
    }

    /// Records a sale: takes the stock, stores the sale with the product's
    /// current cost and logs what was paid up front.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Inventory` when there is not enough stock
    /// and `RepositoryError::Sales` for invalid amounts or overpayment.
    pub async fn create(
        &self,
        business_id: Uuid,
        recorded_by: Uuid,
        input: CreateSaleInput,
    ) -> RepoResult<sales::Model> {
        let txn = self.db.begin().await?;

        let product = lock_product(&txn, business_id, input.product_id).await?;
        if let Some(contact_id) = input.contact_id {
            ensure_contact(&txn, business_id, contact_id, ContactType::Customer).await?;
        }

        let unit_price = input.unit_price.unwrap_or(product.selling_price);
        let unit_cost = product.cost_price;
        let amounts = SaleAmounts::compute(input.quantity, unit_price, unit_cost)?;
        let amount_paid = input
            .amount_paid
            .unwrap_or_else(|| default_amount_paid(input.payment_method, amounts.total));
        let status = payment_status_for(amounts.total, amount_paid)?;
        let sale_date = input.sale_date.unwrap_or_else(|| Utc::now().date_naive());
        let sale_id = Uuid::new_v4();
        let product_name = product.name.clone();

        apply_movement(
            &txn,
            product,
            Movement {
                movement_type: MovementType::Sale,
                quantity_change: -input.quantity,
                reference_id: Some(sale_id),
                notes: None,
                recorded_by,
            },
        )
        .await?;

        let now = Utc::now().into();
        let sale = sales::ActiveModel {
            id: Set(sale_id),
            user_id: Set(business_id),
            product_id: Set(input.product_id),
            contact_id: Set(input.contact_id),
            quantity: Set(input.quantity),
            unit_price: Set(unit_price),
            unit_cost: Set(unit_cost),
            total_amount: Set(amounts.total),
            profit: Set(amounts.profit),
            amount_paid: Set(amount_paid),
            payment_method: Set(input.payment_method.as_str().to_string()),
            payment_status: Set(status.as_str().to_string()),
            sale_date: Set(sale_date),
            notes: Set(input.notes),
            recorded_by: Set(recorded_by),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        if amount_paid > Decimal::ZERO {
            record(
                &txn,
                NewTransaction {
                    business_id,
                    transaction_type: TransactionType::Sale,
                    amount: amount_paid,
                    description: Some(format!("Sale: {} {product_name}", input.quantity)),
                    reference_id: Some(sale_id),
                    transaction_date: sale_date,
                    recorded_by,
                },
            )
            .await?;
        }

        txn.commit().await?;

        tracing::info!(
            sale_id = %sale.id,
            total = %sale.total_amount,
            status = %sale.payment_status,
            "Sale recorded"
        );
        Ok(sale)
    }

    /// Records a payment against a pending or partially paid sale.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Sales` for a non-positive payment, a
    /// settled sale or a payment above the outstanding balance.
    pub async fn record_payment(
        &self,
        business_id: Uuid,
        id: Uuid,
        recorded_by: Uuid,
        input: RecordPaymentInput,
    ) -> RepoResult<sales::Model> {
        let txn = self.db.begin().await?;

        let sale = sales::Entity::find_by_id(id)
            .filter(sales::Column::UserId.eq(business_id))
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(RepositoryError::NotFound("Sale"))?;

        let update = apply_payment(sale.total_amount, sale.amount_paid, input.amount)?;

        let mut active: sales::ActiveModel = sale.into();
        active.amount_paid = Set(update.amount_paid);
        active.payment_status = Set(update.status.as_str().to_string());
        active.updated_at = Set(Utc::now().into());
        let sale = active.update(&txn).await?;

        record(
            &txn,
            NewTransaction {
                business_id,
                transaction_type: TransactionType::Sale,
                amount: input.amount,
                description: Some("Sale payment".to_string()),
                reference_id: Some(sale.id),
                transaction_date: input.payment_date.unwrap_or_else(|| Utc::now().date_naive()),
                recorded_by,
            },
        )
        .await?;

        txn.commit().await?;

        tracing::info!(
            sale_id = %sale.id,
            paid = %sale.amount_paid,
            outstanding = %update.outstanding,
            "Payment recorded"
        );
        Ok(sale)
    }

    /// Deletes a sale, returns its quantity to stock and logs a reversal
    /// of what had been paid.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if there is no such sale.
    pub async fn delete(&self, business_id: Uuid, id: Uuid, recorded_by: Uuid) -> RepoResult<()> {
        let txn = self.db.begin().await?;

        let sale = sales::Entity::find_by_id(id)
            .filter(sales::Column::UserId.eq(business_id))
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(RepositoryError::NotFound("Sale"))?;

        let product = lock_product(&txn, business_id, sale.product_id).await?;
        let product_name = product.name.clone();
        apply_movement(
            &txn,
            product,
            Movement {
                movement_type: MovementType::SaleReversal,
                quantity_change: sale.quantity,
                reference_id: Some(sale.id),
                notes: Some("Sale deleted".to_string()),
                recorded_by,
            },
        )
        .await?;

        if sale.amount_paid > Decimal::ZERO {
            record(
                &txn,
                NewTransaction {
                    business_id,
                    transaction_type: TransactionType::SaleReversal,
                    amount: sale.amount_paid,
                    description: Some(format!("Sale reversal: {} {product_name}", sale.quantity)),
                    reference_id: Some(sale.id),
                    transaction_date: Utc::now().date_naive(),
                    recorded_by,
                },
            )
            .await?;
        }

        let sale_id = sale.id;
        sale.delete(&txn).await?;
        txn.commit().await?;

        tracing::info!(sale_id = %sale_id, "Sale deleted and stock restored");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::products;
    use localfish_core::inventory::InventoryError;
    use localfish_core::sales::SalesError;
    use rust_decimal_macros::dec;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn product(business_id: Uuid, quantity: Decimal) -> products::Model {
        let now = Utc::now().into();
        products::Model {
            id: Uuid::new_v4(),
            user_id: business_id,
            category_id: None,
            name: "Tilapia".to_string(),
            sku: None,
            unit: "kg".to_string(),
            quantity,
            cost_price: dec!(4.00),
            selling_price: dec!(6.50),
            low_stock_threshold: dec!(5),
            image_url: None,
            image_public_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn sale(business_id: Uuid, total: Decimal, paid: Decimal) -> sales::Model {
        let now = Utc::now().into();
        sales::Model {
            id: Uuid::new_v4(),
            user_id: business_id,
            product_id: Uuid::new_v4(),
            contact_id: None,
            quantity: dec!(2),
            unit_price: total / dec!(2),
            unit_cost: dec!(1),
            total_amount: total,
            profit: total - dec!(2),
            amount_paid: paid,
            payment_method: "credit".to_string(),
            payment_status: payment_status_for(total, paid).unwrap().as_str().to_string(),
            sale_date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            notes: None,
            recorded_by: business_id,
            created_at: now,
            updated_at: now,
        }
    }

    fn cash_sale(product_id: Uuid, quantity: Decimal) -> CreateSaleInput {
        CreateSaleInput {
            product_id,
            contact_id: None,
            quantity,
            unit_price: None,
            payment_method: PaymentMethod::Cash,
            amount_paid: None,
            sale_date: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_sale_beyond_stock_is_rejected() {
        let business = Uuid::new_v4();
        let stock = product(business, dec!(3));
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![stock.clone()]])
            .into_connection();

        let err = SaleRepository::new(db)
            .create(business, business, cash_sale(stock.id, dec!(3.5)))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            RepositoryError::Inventory(InventoryError::InsufficientStock { available, .. })
                if available == dec!(3)
        ));
    }

    #[tokio::test]
    async fn test_overpaid_sale_is_rejected_before_stock_moves() {
        let business = Uuid::new_v4();
        let stock = product(business, dec!(10));
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![stock.clone()]])
            .into_connection();

        let input = CreateSaleInput {
            amount_paid: Some(dec!(100)),
            ..cash_sale(stock.id, dec!(2))
        };
        let err = SaleRepository::new(db)
            .create(business, business, input)
            .await
            .unwrap_err();

        assert!(matches!(err, RepositoryError::Sales(SalesError::Overpayment { .. })));
    }

    #[tokio::test]
    async fn test_payment_on_settled_sale_is_rejected() {
        let business = Uuid::new_v4();
        let settled = sale(business, dec!(20), dec!(20));
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![settled.clone()]])
            .into_connection();

        let err = SaleRepository::new(db)
            .record_payment(
                business,
                settled.id,
                business,
                RecordPaymentInput {
                    amount: dec!(5),
                    payment_date: None,
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, RepositoryError::Sales(SalesError::AlreadySettled)));
    }

    #[tokio::test]
    async fn test_delete_missing_sale() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<sales::Model>::new()])
            .into_connection();

        let err = SaleRepository::new(db)
            .delete(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4())
            .await
            .unwrap_err();

        assert!(matches!(err, RepositoryError::NotFound("Sale")));
    }
}
