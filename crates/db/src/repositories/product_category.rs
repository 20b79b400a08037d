//! Product category repository.

use chrono::Utc;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use super::error::{RepoResult, RepositoryError};
use crate::entities::{product_categories, products};

/// Name and description of a category (products and expenses alike).
#[derive(Debug, Clone)]
pub struct CategoryInput {
    /// Category name, unique per business.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
}

/// Product category repository.
#[derive(Debug, Clone)]
pub struct ProductCategoryRepository {
    db: DatabaseConnection,
}

impl ProductCategoryRepository {
    /// Creates a new product category repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists categories by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self, business_id: Uuid) -> RepoResult<Vec<product_categories::Model>> {
        Ok(product_categories::Entity::find()
            .filter(product_categories::Column::UserId.eq(business_id))
            .order_by_asc(product_categories::Column::Name)
            .all(&self.db)
            .await?)
    }

    /// Finds a category of the business.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if there is no such category.
    pub async fn find(&self, business_id: Uuid, id: Uuid) -> RepoResult<product_categories::Model> {
        product_categories::Entity::find_by_id(id)
            .filter(product_categories::Column::UserId.eq(business_id))
            .one(&self.db)
            .await?
            .ok_or(RepositoryError::NotFound("Product category"))
    }

    async fn ensure_name_free(
        &self,
        business_id: Uuid,
        name: &str,
        except: Option<Uuid>,
    ) -> RepoResult<()> {
        let mut query = product_categories::Entity::find()
            .filter(product_categories::Column::UserId.eq(business_id))
            .filter(
                Expr::expr(Func::lower(Expr::col(product_categories::Column::Name)))
                    .eq(name.trim().to_lowercase()),
            );
        if let Some(id) = except {
            query = query.filter(product_categories::Column::Id.ne(id));
        }

        if query.count(&self.db).await? > 0 {
            return Err(RepositoryError::conflict(format!(
                "A product category named '{}' already exists",
                name.trim()
            )));
        }
        Ok(())
    }

    /// Creates a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the name is already used.
    pub async fn create(
        &self,
        business_id: Uuid,
        input: CategoryInput,
    ) -> RepoResult<product_categories::Model> {
        self.ensure_name_free(business_id, &input.name, None).await?;

        let now = Utc::now().into();
        let category = product_categories::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(business_id),
            name: Set(input.name.trim().to_string()),
            description: Set(input.description),
            created_at: Set(now),
            updated_at: Set(now),
        };
        Ok(category.insert(&self.db).await?)
    }

    /// Renames or re-describes a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` or `RepositoryError::Conflict`.
    pub async fn update(
        &self,
        business_id: Uuid,
        id: Uuid,
        input: CategoryInput,
    ) -> RepoResult<product_categories::Model> {
        let category = self.find(business_id, id).await?;
        self.ensure_name_free(business_id, &input.name, Some(id)).await?;

        let mut active: product_categories::ActiveModel = category.into();
        active.name = Set(input.name.trim().to_string());
        active.description = Set(input.description);
        active.updated_at = Set(Utc::now().into());
        Ok(active.update(&self.db).await?)
    }

    /// Deletes a category that no product uses.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` while products reference it.
    pub async fn delete(&self, business_id: Uuid, id: Uuid) -> RepoResult<()> {
        let category = self.find(business_id, id).await?;

        let in_use = products::Entity::find()
            .filter(products::Column::CategoryId.eq(id))
            .count(&self.db)
            .await?;
        if in_use > 0 {
            return Err(RepositoryError::conflict(format!(
                "Category is used by {in_use} product(s)"
            )));
        }

        category.delete(&self.db).await?;
        Ok(())
    }
}
