//! Product repository.

use chrono::Utc;
use localfish_core::inventory::MovementType;
use localfish_shared::types::{PageRequest, PageResponse};
use rust_decimal::Decimal;
use sea_orm::sea_query::{Condition, Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

use super::error::{RepoResult, RepositoryError};
use super::{like_pattern, paginate};
use crate::entities::{product_categories, products, sales, stock_movements};

/// Filter for listing products.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    /// Only products of this category.
    pub category_id: Option<Uuid>,
    /// Case-insensitive match on name or SKU.
    pub search: Option<String>,
    /// Only products at or below their low-stock threshold.
    pub low_stock: bool,
}

/// Input for creating a product.
#[derive(Debug, Clone)]
pub struct CreateProductInput {
    /// Category.
    pub category_id: Option<Uuid>,
    /// Display name.
    pub name: String,
    /// Stock keeping unit, unique per business when set.
    pub sku: Option<String>,
    /// Unit of measure (kg, piece, crate, ...).
    pub unit: String,
    /// Opening stock.
    pub quantity: Decimal,
    /// Cost per unit.
    pub cost_price: Decimal,
    /// Selling price per unit.
    pub selling_price: Decimal,
    /// Low-stock threshold.
    pub low_stock_threshold: Decimal,
}

/// Partial product update. Quantity only changes through stock operations.
#[derive(Debug, Clone, Default)]
pub struct UpdateProductInput {
    /// Category.
    pub category_id: Option<Uuid>,
    /// Display name.
    pub name: Option<String>,
    /// Stock keeping unit.
    pub sku: Option<String>,
    /// Unit of measure.
    pub unit: Option<String>,
    /// Cost per unit.
    pub cost_price: Option<Decimal>,
    /// Selling price per unit.
    pub selling_price: Option<Decimal>,
    /// Low-stock threshold.
    pub low_stock_threshold: Option<Decimal>,
}

fn check_amounts(values: &[(&str, Option<Decimal>)]) -> RepoResult<()> {
    for (field, value) in values {
        if value.is_some_and(|v| v < Decimal::ZERO) {
            return Err(RepositoryError::validation(format!("{field} cannot be negative")));
        }
    }
    Ok(())
}

async fn ensure_category<C: ConnectionTrait>(
    conn: &C,
    business_id: Uuid,
    category_id: Uuid,
) -> RepoResult<()> {
    let exists = product_categories::Entity::find_by_id(category_id)
        .filter(product_categories::Column::UserId.eq(business_id))
        .count(conn)
        .await?;
    if exists == 0 {
        return Err(RepositoryError::NotFound("Product category"));
    }
    Ok(())
}

/// Product repository.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    db: DatabaseConnection,
}

impl ProductRepository {
    /// Creates a new product repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists products by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        business_id: Uuid,
        filter: ProductFilter,
        page: PageRequest,
    ) -> RepoResult<PageResponse<products::Model>> {
        let mut query = products::Entity::find().filter(products::Column::UserId.eq(business_id));

        if let Some(category_id) = filter.category_id {
            query = query.filter(products::Column::CategoryId.eq(category_id));
        }
        if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
            let pattern = like_pattern(search);
            query = query.filter(
                Condition::any()
                    .add(
                        Expr::expr(Func::lower(Expr::col(products::Column::Name)))
                            .like(pattern.as_str()),
                    )
                    .add(
                        Expr::expr(Func::lower(Expr::col(products::Column::Sku)))
                            .like(pattern.as_str()),
                    ),
            );
        }
        if filter.low_stock {
            query = query.filter(
                Expr::col(products::Column::Quantity).lte(Expr::col(products::Column::LowStockThreshold)),
            );
        }

        let query = query.order_by_asc(products::Column::Name);
        paginate(&self.db, query, page).await
    }

    /// Finds a product of the business.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if there is no such product.
    pub async fn find(&self, business_id: Uuid, id: Uuid) -> RepoResult<products::Model> {
        products::Entity::find_by_id(id)
            .filter(products::Column::UserId.eq(business_id))
            .one(&self.db)
            .await?
            .ok_or(RepositoryError::NotFound("Product"))
    }

    /// Creates a product. Opening stock is logged as an addition movement.
    ///
    /// # Errors
    ///
    /// Returns a validation error for negative amounts and
    /// `RepositoryError::NotFound` for an unknown category.
    pub async fn create(
        &self,
        business_id: Uuid,
        recorded_by: Uuid,
        input: CreateProductInput,
    ) -> RepoResult<products::Model> {
        check_amounts(&[
            ("Quantity", Some(input.quantity)),
            ("Cost price", Some(input.cost_price)),
            ("Selling price", Some(input.selling_price)),
            ("Low-stock threshold", Some(input.low_stock_threshold)),
        ])?;

        let txn = self.db.begin().await?;

        if let Some(category_id) = input.category_id {
            ensure_category(&txn, business_id, category_id).await?;
        }

        let now = Utc::now().into();
        let product = products::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(business_id),
            category_id: Set(input.category_id),
            name: Set(input.name.trim().to_string()),
            sku: Set(input.sku.filter(|s| !s.trim().is_empty())),
            unit: Set(input.unit),
            quantity: Set(input.quantity),
            cost_price: Set(input.cost_price),
            selling_price: Set(input.selling_price),
            low_stock_threshold: Set(input.low_stock_threshold),
            image_url: Set(None),
            image_public_id: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        if product.quantity > Decimal::ZERO {
            stock_movements::ActiveModel {
                id: Set(Uuid::new_v4()),
                user_id: Set(business_id),
                product_id: Set(product.id),
                movement_type: Set(MovementType::Addition.as_str().to_string()),
                quantity_change: Set(product.quantity),
                quantity_before: Set(Decimal::ZERO),
                quantity_after: Set(product.quantity),
                reference_id: Set(None),
                notes: Set(Some("Opening stock".to_string())),
                recorded_by: Set(recorded_by),
                created_at: Set(now),
            }
            .insert(&txn)
            .await?;
        }

        txn.commit().await?;

        tracing::info!(product_id = %product.id, name = %product.name, "Product created");
        Ok(product)
    }

    /// Updates the given product fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown product or
    /// category, and a validation error for negative amounts.
    pub async fn update(
        &self,
        business_id: Uuid,
        id: Uuid,
        input: UpdateProductInput,
    ) -> RepoResult<products::Model> {
        check_amounts(&[
            ("Cost price", input.cost_price),
            ("Selling price", input.selling_price),
            ("Low-stock threshold", input.low_stock_threshold),
        ])?;

        let product = self.find(business_id, id).await?;
        if let Some(category_id) = input.category_id {
            ensure_category(&self.db, business_id, category_id).await?;
        }

        let mut active: products::ActiveModel = product.into();
        if let Some(category_id) = input.category_id {
            active.category_id = Set(Some(category_id));
        }
        if let Some(name) = input.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(sku) = input.sku {
            active.sku = Set(Some(sku).filter(|s| !s.trim().is_empty()));
        }
        if let Some(unit) = input.unit {
            active.unit = Set(unit);
        }
        if let Some(cost_price) = input.cost_price {
            active.cost_price = Set(cost_price);
        }
        if let Some(selling_price) = input.selling_price {
            active.selling_price = Set(selling_price);
        }
        if let Some(threshold) = input.low_stock_threshold {
            active.low_stock_threshold = Set(threshold);
        }
        active.updated_at = Set(Utc::now().into());

        Ok(active.update(&self.db).await?)
    }

    /// Stores a new image and returns the public ID of the replaced one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if there is no such product.
    pub async fn set_image(
        &self,
        business_id: Uuid,
        id: Uuid,
        url: String,
        public_id: String,
    ) -> RepoResult<(products::Model, Option<String>)> {
        let product = self.find(business_id, id).await?;
        let previous = product.image_public_id.clone();

        let mut active: products::ActiveModel = product.into();
        active.image_url = Set(Some(url));
        active.image_public_id = Set(Some(public_id));
        active.updated_at = Set(Utc::now().into());

        Ok((active.update(&self.db).await?, previous))
    }

    /// Deletes a product that has never been sold. Its stock history goes
    /// with it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` while sales reference it.
    pub async fn delete(&self, business_id: Uuid, id: Uuid) -> RepoResult<Option<String>> {
        let product = self.find(business_id, id).await?;

        let sold = sales::Entity::find()
            .filter(sales::Column::ProductId.eq(id))
            .count(&self.db)
            .await?;
        if sold > 0 {
            return Err(RepositoryError::conflict(format!(
                "Product has {sold} sale(s) and cannot be deleted"
            )));
        }

        let image = product.image_public_id.clone();
        product.delete(&self.db).await?;
        Ok(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn product(business_id: Uuid) -> products::Model {
        let now = Utc::now().into();
        products::Model {
            id: Uuid::new_v4(),
            user_id: business_id,
            category_id: None,
            name: "Nile perch".to_string(),
            sku: Some("NP-01".to_string()),
            unit: "kg".to_string(),
            quantity: dec!(12),
            cost_price: dec!(5),
            selling_price: dec!(8),
            low_stock_threshold: dec!(3),
            image_url: Some("https://res.cloudinary.com/demo/old.jpg".to_string()),
            image_public_id: Some("local-fishing/old".to_string()),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_create_rejects_negative_price() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let business = Uuid::new_v4();

        let err = ProductRepository::new(db)
            .create(
                business,
                business,
                CreateProductInput {
                    category_id: None,
                    name: "Sardines".to_string(),
                    sku: None,
                    unit: "kg".to_string(),
                    quantity: dec!(0),
                    cost_price: dec!(1),
                    selling_price: dec!(-2),
                    low_stock_threshold: dec!(0),
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, RepositoryError::Validation(msg) if msg.starts_with("Selling price")));
    }

    #[tokio::test]
    async fn test_set_image_returns_previous_public_id() {
        let business = Uuid::new_v4();
        let current = product(business);
        let updated = products::Model {
            image_url: Some("https://res.cloudinary.com/demo/new.jpg".to_string()),
            image_public_id: Some("local-fishing/new".to_string()),
            ..current.clone()
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![current.clone()]])
            .append_query_results([vec![updated]])
            .into_connection();

        let (product, previous) = ProductRepository::new(db)
            .set_image(
                business,
                current.id,
                "https://res.cloudinary.com/demo/new.jpg".to_string(),
                "local-fishing/new".to_string(),
            )
            .await
            .unwrap();

        assert_eq!(previous.as_deref(), Some("local-fishing/old"));
        assert_eq!(product.image_public_id.as_deref(), Some("local-fishing/new"));
    }

    #[tokio::test]
    async fn test_delete_refused_when_sold() {
        let business = Uuid::new_v4();
        let current = product(business);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![current.clone()]])
            .append_query_results([vec![std::collections::BTreeMap::from([(
                "num_items".to_string(),
                sea_orm::Value::BigInt(Some(3)),
            )])]])
            .into_connection();

        let err = ProductRepository::new(db)
            .delete(business, current.id)
            .await
            .unwrap_err();

        assert!(matches!(err, RepositoryError::Conflict(msg) if msg.contains("3 sale(s)")));
    }
}
