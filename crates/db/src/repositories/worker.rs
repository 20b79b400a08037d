//! Worker repository: staff accounts that act for a business.

use chrono::Utc;
use localfish_shared::types::{PageRequest, PageResponse};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use super::error::{RepoResult, RepositoryError};
use super::paginate;
use super::user::normalize_email;
use crate::entities::workers;

/// Input for adding a worker.
#[derive(Debug, Clone)]
pub struct CreateWorkerInput {
    /// Full name.
    pub full_name: String,
    /// Login email, unique across workers.
    pub email: String,
    /// Phone number.
    pub phone_number: Option<String>,
    /// Argon2 hash of the initial password.
    pub password_hash: String,
    /// Job title.
    pub title: Option<String>,
}

/// Fields an owner can change on a worker.
#[derive(Debug, Clone, Default)]
pub struct UpdateWorkerInput {
    /// Full name.
    pub full_name: Option<String>,
    /// Phone number.
    pub phone_number: Option<String>,
    /// Job title.
    pub title: Option<String>,
    /// Enables or disables login.
    pub is_active: Option<bool>,
}

/// Worker repository.
#[derive(Debug, Clone)]
pub struct WorkerRepository {
    db: DatabaseConnection,
}

impl WorkerRepository {
    /// Creates a new worker repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists a business's workers by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        business_id: Uuid,
        page: PageRequest,
    ) -> RepoResult<PageResponse<workers::Model>> {
        let query = workers::Entity::find()
            .filter(workers::Column::UserId.eq(business_id))
            .order_by_asc(workers::Column::FullName);
        paginate(&self.db, query, page).await
    }

    /// Finds a worker of the business.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if there is no such worker.
    pub async fn find(&self, business_id: Uuid, id: Uuid) -> RepoResult<workers::Model> {
        workers::Entity::find_by_id(id)
            .filter(workers::Column::UserId.eq(business_id))
            .one(&self.db)
            .await?
            .ok_or(RepositoryError::NotFound("Worker"))
    }

    /// Finds a worker by ID regardless of business (token refresh, profile).
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<workers::Model>> {
        Ok(workers::Entity::find_by_id(id).one(&self.db).await?)
    }

    /// Finds a worker by login email.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_email(&self, email: &str) -> RepoResult<Option<workers::Model>> {
        Ok(workers::Entity::find()
            .filter(workers::Column::Email.eq(normalize_email(email)))
            .one(&self.db)
            .await?)
    }

    /// Checks if any worker uses the email.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn email_exists(&self, email: &str) -> RepoResult<bool> {
        let count = workers::Entity::find()
            .filter(workers::Column::Email.eq(normalize_email(email)))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }

    /// Adds a worker to the business.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn create(
        &self,
        business_id: Uuid,
        input: CreateWorkerInput,
    ) -> RepoResult<workers::Model> {
        let now = Utc::now().into();
        let worker = workers::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(business_id),
            full_name: Set(input.full_name.trim().to_string()),
            email: Set(normalize_email(&input.email)),
            phone_number: Set(input.phone_number),
            password_hash: Set(input.password_hash),
            title: Set(input.title),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };

        Ok(worker.insert(&self.db).await?)
    }

    /// Updates a worker.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if there is no such worker.
    pub async fn update(
        &self,
        business_id: Uuid,
        id: Uuid,
        input: UpdateWorkerInput,
    ) -> RepoResult<workers::Model> {
        let worker = self.find(business_id, id).await?;

        let mut active: workers::ActiveModel = worker.into();
        if let Some(name) = input.full_name {
            active.full_name = Set(name.trim().to_string());
        }
        if let Some(phone) = input.phone_number {
            active.phone_number = Set(Some(phone));
        }
        if let Some(title) = input.title {
            active.title = Set(Some(title));
        }
        if let Some(is_active) = input.is_active {
            active.is_active = Set(is_active);
        }
        active.updated_at = Set(Utc::now().into());

        Ok(active.update(&self.db).await?)
    }

    /// Replaces a worker's password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the worker does not exist.
    pub async fn update_password(&self, id: Uuid, password_hash: &str) -> RepoResult<()> {
        let worker = self
            .find_by_id(id)
            .await?
            .ok_or(RepositoryError::NotFound("Worker"))?;

        let mut active: workers::ActiveModel = worker.into();
        active.password_hash = Set(password_hash.to_string());
        active.updated_at = Set(Utc::now().into());
        active.update(&self.db).await?;
        Ok(())
    }

    /// Removes a worker. Records they entered keep their `recorded_by`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if there is no such worker.
    pub async fn delete(&self, business_id: Uuid, id: Uuid) -> RepoResult<()> {
        let worker = self.find(business_id, id).await?;
        worker.delete(&self.db).await?;
        Ok(())
    }
}
