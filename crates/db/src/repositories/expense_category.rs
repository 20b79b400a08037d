//! Expense category repository.

use chrono::Utc;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use super::error::{RepoResult, RepositoryError};
use super::product_category::CategoryInput;
use crate::entities::{expense_categories, expenses};

/// Expense category repository.
#[derive(Debug, Clone)]
pub struct ExpenseCategoryRepository {
    db: DatabaseConnection,
}

impl ExpenseCategoryRepository {
    /// Creates a new expense category repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists categories by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self, business_id: Uuid) -> RepoResult<Vec<expense_categories::Model>> {
        Ok(expense_categories::Entity::find()
            .filter(expense_categories::Column::UserId.eq(business_id))
            .order_by_asc(expense_categories::Column::Name)
            .all(&self.db)
            .await?)
    }

    /// Finds a category of the business.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if there is no such category.
    pub async fn find(&self, business_id: Uuid, id: Uuid) -> RepoResult<expense_categories::Model> {
        expense_categories::Entity::find_by_id(id)
            .filter(expense_categories::Column::UserId.eq(business_id))
            .one(&self.db)
            .await?
            .ok_or(RepositoryError::NotFound("Expense category"))
    }

    async fn ensure_name_free(
        &self,
        business_id: Uuid,
        name: &str,
        except: Option<Uuid>,
    ) -> RepoResult<()> {
        let mut query = expense_categories::Entity::find()
            .filter(expense_categories::Column::UserId.eq(business_id))
            .filter(
                Expr::expr(Func::lower(Expr::col(expense_categories::Column::Name)))
                    .eq(name.trim().to_lowercase()),
            );
        if let Some(id) = except {
            query = query.filter(expense_categories::Column::Id.ne(id));
        }

        if query.count(&self.db).await? > 0 {
            return Err(RepositoryError::conflict(format!(
                "A expense category named '{}' already exists",
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
    ) -> RepoResult<expense_categories::Model> {
        self.ensure_name_free(business_id, &input.name, None).await?;

        let now = Utc::now().into();
        let category = expense_categories::ActiveModel {
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
    ) -> RepoResult<expense_categories::Model> {
        let category = self.find(business_id, id).await?;
        self.ensure_name_free(business_id, &input.name, Some(id)).await?;

        let mut active: expense_categories::ActiveModel = category.into();
        active.name = Set(input.name.trim().to_string());
        active.description = Set(input.description);
        active.updated_at = Set(Utc::now().into());
        Ok(active.update(&self.db).await?)
    }

    /// Deletes a category that no expense uses.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` while expenses reference it.
    pub async fn delete(&self, business_id: Uuid, id: Uuid) -> RepoResult<()> {
        let category = self.find(business_id, id).await?;

        let in_use = expenses::Entity::find()
            .filter(expenses::Column::CategoryId.eq(id))
            .count(&self.db)
            .await?;
        if in_use > 0 {
            return Err(RepositoryError::conflict(format!(
                "Category is used by {in_use} expense(s)"
            )));
        }

        category.delete(&self.db).await?;
        Ok(())
    }
}
