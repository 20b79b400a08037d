//! Stock repository: additions, corrections and the movement log.
//!
//! Every quantity change locks the product row, applies the change through
//! [`apply_stock_change`] and writes a `stock_movements` row with the
//! quantities before and after, all in one database transaction.

use chrono::{NaiveDate, Utc};
use localfish_core::finance::{ContactType, TransactionType};
use localfish_core::inventory::{
    CorrectionReason, MovementType, apply_stock_change, validate_addition, validate_correction,
};
use localfish_core::sales::fits_money_scale;
use localfish_shared::types::{PageRequest, PageResponse};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use super::contact::ensure_contact;
use super::error::{RepoResult, RepositoryError};
use super::paginate;
use super::transaction::{NewTransaction, record};
use crate::entities::{products, stock_additions, stock_corrections, stock_movements};

/// Input for receiving stock.
#[derive(Debug, Clone)]
pub struct AddStockInput {
    /// Product received.
    pub product_id: Uuid,
    /// Quantity received, positive.
    pub quantity: Decimal,
    /// Price paid per unit.
    pub unit_cost: Decimal,
    /// Supplier.
    pub contact_id: Option<Uuid>,
    /// Free text.
    pub notes: Option<String>,
}

/// Input for a manual stock correction.
#[derive(Debug, Clone)]
pub struct CorrectStockInput {
    /// Product corrected.
    pub product_id: Uuid,
    /// Signed change, non-zero.
    pub quantity_change: Decimal,
    /// Why the stock changed.
    pub reason: CorrectionReason,
    /// Free text.
    pub notes: Option<String>,
}

/// Filter for the movement log.
#[derive(Debug, Clone, Default)]
pub struct MovementFilter {
    /// Only this product.
    pub product_id: Option<Uuid>,
    /// Only this movement type.
    pub movement_type: Option<MovementType>,
    /// Only movements on or after this day (UTC).
    pub date_from: Option<NaiveDate>,
    /// Only movements on or before this day (UTC).
    pub date_to: Option<NaiveDate>,
}

/// A quantity change to apply to a locked product.
pub(crate) struct Movement {
    pub movement_type: MovementType,
    pub quantity_change: Decimal,
    pub reference_id: Option<Uuid>,
    pub notes: Option<String>,
    pub recorded_by: Uuid,
}

/// Loads a product of the business with a row lock held until commit.
pub(crate) async fn lock_product<C: ConnectionTrait>(
    conn: &C,
    business_id: Uuid,
    product_id: Uuid,
) -> RepoResult<products::Model> {
    products::Entity::find_by_id(product_id)
        .filter(products::Column::UserId.eq(business_id))
        .lock_exclusive()
        .one(conn)
        .await?
        .ok_or(RepositoryError::NotFound("Product"))
}

/// Applies a movement to a locked product and logs it.
pub(crate) async fn apply_movement<C: ConnectionTrait>(
    conn: &C,
    product: products::Model,
    movement: Movement,
) -> RepoResult<products::Model> {
    let before = product.quantity;
    let after = apply_stock_change(before, movement.quantity_change)?;
    let business_id = product.user_id;
    let product_id = product.id;

    let mut active: products::ActiveModel = product.into();
    active.quantity = Set(after);
    active.updated_at = Set(Utc::now().into());
    let product = active.update(conn).await?;

    stock_movements::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(business_id),
        product_id: Set(product_id),
        movement_type: Set(movement.movement_type.as_str().to_string()),
        quantity_change: Set(movement.quantity_change),
        quantity_before: Set(before),
        quantity_after: Set(after),
        reference_id: Set(movement.reference_id),
        notes: Set(movement.notes),
        recorded_by: Set(movement.recorded_by),
        created_at: Set(Utc::now().into()),
    }
    .insert(conn)
    .await?;

    tracing::debug!(
        product_id = %product_id,
        movement = %movement.movement_type,
        before = %before,
        after = %after,
        "Stock changed"
    );

    Ok(product)
}

/// Stock repository.
#[derive(Debug, Clone)]
pub struct StockRepository {
    db: DatabaseConnection,
}

impl StockRepository {
    /// Creates a new stock repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Receives stock: records the addition, raises the product quantity
    /// and logs a stock purchase in the cash log when it cost anything.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown product or
    /// supplier, and a validation error for a non-positive quantity or a
    /// negative or sub-cent cost.
    pub async fn add_stock(
        &self,
        business_id: Uuid,
        recorded_by: Uuid,
        input: AddStockInput,
    ) -> RepoResult<stock_additions::Model> {
        validate_addition(input.quantity)?;
        if input.unit_cost < Decimal::ZERO {
            return Err(RepositoryError::validation("Unit cost cannot be negative"));
        }
        if !fits_money_scale(input.unit_cost) {
            return Err(RepositoryError::validation(
                "Unit cost cannot have more than 2 decimal places",
            ));
        }
        let total_cost = (input.quantity * input.unit_cost).round_dp(2);

        let txn = self.db.begin().await?;

        let product = lock_product(&txn, business_id, input.product_id).await?;
        if let Some(contact_id) = input.contact_id {
            ensure_contact(&txn, business_id, contact_id, ContactType::Supplier).await?;
        }

        let addition = stock_additions::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(business_id),
            product_id: Set(product.id),
            contact_id: Set(input.contact_id),
            quantity: Set(input.quantity),
            unit_cost: Set(input.unit_cost),
            total_cost: Set(total_cost),
            notes: Set(input.notes.clone()),
            recorded_by: Set(recorded_by),
            created_at: Set(Utc::now().into()),
        }
        .insert(&txn)
        .await?;

        let product_name = product.name.clone();
        apply_movement(
            &txn,
            product,
            Movement {
                movement_type: MovementType::Addition,
                quantity_change: input.quantity,
                reference_id: Some(addition.id),
                notes: input.notes,
                recorded_by,
            },
        )
        .await?;

        if total_cost > Decimal::ZERO {
            record(
                &txn,
                NewTransaction {
                    business_id,
                    transaction_type: TransactionType::StockPurchase,
                    amount: total_cost,
                    description: Some(format!("Stock purchase: {product_name}")),
                    reference_id: Some(addition.id),
                    transaction_date: Utc::now().date_naive(),
                    recorded_by,
                },
            )
            .await?;
        }

        txn.commit().await?;

        tracing::info!(
            addition_id = %addition.id,
            product_id = %addition.product_id,
            quantity = %addition.quantity,
            "Stock added"
        );
        Ok(addition)
    }

    /// Corrects stock by a signed amount.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Inventory` when the correction is zero or
    /// would take the stock below zero.
    pub async fn correct_stock(
        &self,
        business_id: Uuid,
        recorded_by: Uuid,
        input: CorrectStockInput,
    ) -> RepoResult<stock_corrections::Model> {
        validate_correction(input.quantity_change)?;

        let txn = self.db.begin().await?;

        let product = lock_product(&txn, business_id, input.product_id).await?;
        let correction_id = Uuid::new_v4();

        apply_movement(
            &txn,
            product,
            Movement {
                movement_type: MovementType::Correction,
                quantity_change: input.quantity_change,
                reference_id: Some(correction_id),
                notes: Some(input.reason.as_str().to_string()),
                recorded_by,
            },
        )
        .await?;

        let correction = stock_corrections::ActiveModel {
            id: Set(correction_id),
            user_id: Set(business_id),
            product_id: Set(input.product_id),
            quantity_change: Set(input.quantity_change),
            reason: Set(input.reason.as_str().to_string()),
            notes: Set(input.notes),
            recorded_by: Set(recorded_by),
            created_at: Set(Utc::now().into()),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        tracing::info!(
            correction_id = %correction.id,
            product_id = %correction.product_id,
            change = %correction.quantity_change,
            reason = %correction.reason,
            "Stock corrected"
        );
        Ok(correction)
    }

    /// Lists stock additions, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_additions(
        &self,
        business_id: Uuid,
        product_id: Option<Uuid>,
        page: PageRequest,
    ) -> RepoResult<PageResponse<stock_additions::Model>> {
        let mut query = stock_additions::Entity::find()
            .filter(stock_additions::Column::UserId.eq(business_id));
        if let Some(product_id) = product_id {
            query = query.filter(stock_additions::Column::ProductId.eq(product_id));
        }
        let query = query.order_by_desc(stock_additions::Column::CreatedAt);
        paginate(&self.db, query, page).await
    }

    /// Lists stock corrections, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_corrections(
        &self,
        business_id: Uuid,
        product_id: Option<Uuid>,
        page: PageRequest,
    ) -> RepoResult<PageResponse<stock_corrections::Model>> {
        let mut query = stock_corrections::Entity::find()
            .filter(stock_corrections::Column::UserId.eq(business_id));
        if let Some(product_id) = product_id {
            query = query.filter(stock_corrections::Column::ProductId.eq(product_id));
        }
        let query = query.order_by_desc(stock_corrections::Column::CreatedAt);
        paginate(&self.db, query, page).await
    }

    /// Lists the movement log, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_movements(
        &self,
        business_id: Uuid,
        filter: MovementFilter,
        page: PageRequest,
    ) -> RepoResult<PageResponse<stock_movements::Model>> {
        let mut query = stock_movements::Entity::find()
            .filter(stock_movements::Column::UserId.eq(business_id));

        if let Some(product_id) = filter.product_id {
            query = query.filter(stock_movements::Column::ProductId.eq(product_id));
        }
        if let Some(kind) = filter.movement_type {
            query = query.filter(stock_movements::Column::MovementType.eq(kind.as_str()));
        }
        if let Some(from) = filter.date_from.and_then(|d| d.and_hms_opt(0, 0, 0)) {
            query = query.filter(stock_movements::Column::CreatedAt.gte(from.and_utc()));
        }
        if let Some(to) = filter
            .date_to
            .and_then(|d| d.succ_opt())
            .and_then(|d| d.and_hms_opt(0, 0, 0))
        {
            query = query.filter(stock_movements::Column::CreatedAt.lt(to.and_utc()));
        }

        let query = query.order_by_desc(stock_movements::Column::CreatedAt);
        paginate(&self.db, query, page).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use localfish_core::inventory::InventoryError;
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

    fn movement_row(product: &products::Model, change: Decimal) -> stock_movements::Model {
        stock_movements::Model {
            id: Uuid::new_v4(),
            user_id: product.user_id,
            product_id: product.id,
            movement_type: "correction".to_string(),
            quantity_change: change,
            quantity_before: product.quantity,
            quantity_after: product.quantity + change,
            reference_id: None,
            notes: None,
            recorded_by: product.user_id,
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_apply_movement_updates_quantity() {
        let business = Uuid::new_v4();
        let current = product(business, dec!(10));
        let updated = products::Model {
            quantity: dec!(7.5),
            ..current.clone()
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![updated]])
            .append_query_results([vec![movement_row(&current, dec!(-2.5))]])
            .into_connection();

        let product = apply_movement(
            &db,
            current,
            Movement {
                movement_type: MovementType::Correction,
                quantity_change: dec!(-2.5),
                reference_id: None,
                notes: None,
                recorded_by: business,
            },
        )
        .await
        .unwrap();

        assert_eq!(product.quantity, dec!(7.5));
    }

    #[tokio::test]
    async fn test_correction_below_zero_is_rejected() {
        let business = Uuid::new_v4();
        let current = product(business, dec!(2));
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![current.clone()]])
            .into_connection();

        let err = StockRepository::new(db)
            .correct_stock(
                business,
                business,
                CorrectStockInput {
                    product_id: current.id,
                    quantity_change: dec!(-5),
                    reason: CorrectionReason::Damaged,
                    notes: None,
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            RepositoryError::Inventory(InventoryError::InsufficientStock { .. })
        ));
    }

    #[tokio::test]
    async fn test_addition_quantity_is_checked_before_querying() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let business = Uuid::new_v4();

        let err = StockRepository::new(db)
            .add_stock(
                business,
                business,
                AddStockInput {
                    product_id: Uuid::new_v4(),
                    quantity: dec!(0),
                    unit_cost: dec!(3),
                    contact_id: None,
                    notes: None,
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            RepositoryError::Inventory(InventoryError::InvalidQuantity(_))
        ));
    }

    #[tokio::test]
    async fn test_sub_cent_unit_cost_is_rejected() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let business = Uuid::new_v4();

        let err = StockRepository::new(db)
            .add_stock(
                business,
                business,
                AddStockInput {
                    product_id: Uuid::new_v4(),
                    quantity: dec!(4),
                    unit_cost: dec!(2.505),
                    contact_id: None,
                    notes: None,
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, RepositoryError::Validation(msg) if msg.contains("decimal places")));
    }

    #[tokio::test]
    async fn test_missing_product_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<products::Model>::new()])
            .into_connection();
        let business = Uuid::new_v4();

        let err = StockRepository::new(db)
            .correct_stock(
                business,
                business,
                CorrectStockInput {
                    product_id: Uuid::new_v4(),
                    quantity_change: dec!(1),
                    reason: CorrectionReason::CountError,
                    notes: None,
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, RepositoryError::NotFound("Product")));
    }
}
