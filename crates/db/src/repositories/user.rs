//! User repository: business owner accounts.

use chrono::Utc;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set,
};
use uuid::Uuid;

use super::error::{RepoResult, RepositoryError};
use crate::entities::users;

/// Input for registering a business owner.
#[derive(Debug, Clone)]
pub struct CreateUserInput {
    /// Login email.
    pub email: String,
    /// Argon2 hash of the password.
    pub password_hash: String,
    /// Business name, unique across all accounts.
    pub business_name: String,
    /// Contact phone number.
    pub phone_number: Option<String>,
}

/// User repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    db: DatabaseConnection,
}

impl UserRepository {
    /// Creates a new user repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a user by email (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_email(&self, email: &str) -> RepoResult<Option<users::Model>> {
        Ok(users::Entity::find()
            .filter(users::Column::Email.eq(normalize_email(email)))
            .one(&self.db)
            .await?)
    }

    /// Finds a user by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<users::Model>> {
        Ok(users::Entity::find_by_id(id).one(&self.db).await?)
    }

    /// Checks if an email is already registered.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn email_exists(&self, email: &str) -> RepoResult<bool> {
        let count = users::Entity::find()
            .filter(users::Column::Email.eq(normalize_email(email)))
            .count(&self.db)
            .await?;

        Ok(count > 0)
    }

    /// Checks if another account already uses the business name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn business_name_taken(&self, name: &str, except: Option<Uuid>) -> RepoResult<bool> {
        let mut query = users::Entity::find().filter(
            Expr::expr(Func::lower(Expr::col(users::Column::BusinessName)))
                .eq(name.trim().to_lowercase()),
        );
        if let Some(id) = except {
            query = query.filter(users::Column::Id.ne(id));
        }

        Ok(query.count(&self.db).await? > 0)
    }

    /// Creates a new business owner.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn create(&self, input: CreateUserInput) -> RepoResult<users::Model> {
        let now = Utc::now().into();
        let user = users::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(normalize_email(&input.email)),
            password_hash: Set(input.password_hash),
            business_name: Set(input.business_name.trim().to_string()),
            phone_number: Set(input.phone_number),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };

        Ok(user.insert(&self.db).await?)
    }

    /// Updates the business name and/or phone number.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    pub async fn update_profile(
        &self,
        id: Uuid,
        business_name: Option<String>,
        phone_number: Option<String>,
    ) -> RepoResult<users::Model> {
        let user = self
            .find_by_id(id)
            .await?
            .ok_or(RepositoryError::NotFound("User"))?;

        let mut active: users::ActiveModel = user.into();
        if let Some(name) = business_name {
            active.business_name = Set(name.trim().to_string());
        }
        if let Some(phone) = phone_number {
            active.phone_number = Set(Some(phone));
        }
        active.updated_at = Set(Utc::now().into());

        Ok(active.update(&self.db).await?)
    }

    /// Replaces the password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    pub async fn update_password(&self, id: Uuid, password_hash: &str) -> RepoResult<()> {
        let user = self
            .find_by_id(id)
            .await?
            .ok_or(RepositoryError::NotFound("User"))?;

        let mut active: users::ActiveModel = user.into();
        active.password_hash = Set(password_hash.to_string());
        active.updated_at = Set(Utc::now().into());
        active.update(&self.db).await?;
        Ok(())
    }
}

/// Emails are stored trimmed and lowercased.
pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn owner() -> users::Model {
        let now = Utc::now().into();
        users::Model {
            id: Uuid::new_v4(),
            email: "owner@lakefresh.test".to_string(),
            password_hash: "$argon2id$hash".to_string(),
            business_name: "Lake Fresh".to_string(),
            phone_number: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Owner@LakeFresh.TEST "), "owner@lakefresh.test");
    }

    #[tokio::test]
    async fn test_find_by_email_returns_row() {
        let user = owner();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![user.clone()]])
            .into_connection();

        let found = UserRepository::new(db)
            .find_by_email("OWNER@lakefresh.test")
            .await
            .unwrap();

        assert_eq!(found, Some(user));
    }

    #[tokio::test]
    async fn test_update_profile_missing_user() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<users::Model>::new()])
            .into_connection();

        let result = UserRepository::new(db)
            .update_profile(Uuid::new_v4(), Some("New name".into()), None)
            .await;

        assert!(matches!(result, Err(RepositoryError::NotFound("User"))));
    }
}
