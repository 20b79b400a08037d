//! Contact repository: customers and suppliers.

use chrono::Utc;
use localfish_core::finance::ContactType;
use localfish_shared::types::{PageRequest, PageResponse};
use sea_orm::sea_query::{Condition, Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, ModelTrait,
    QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use super::error::{RepoResult, RepositoryError};
use super::{decode, like_pattern, paginate};
use crate::entities::contacts;

/// Filter for listing contacts.
#[derive(Debug, Clone, Default)]
pub struct ContactFilter {
    /// Only customers or only suppliers.
    pub contact_type: Option<ContactType>,
    /// Case-insensitive match on name, email or phone.
    pub search: Option<String>,
}

/// Contact fields, for both create and update.
#[derive(Debug, Clone)]
pub struct ContactInput {
    /// Display name.
    pub name: String,
    /// Customer or supplier.
    pub contact_type: ContactType,
    /// Email address.
    pub email: Option<String>,
    /// Phone number.
    pub phone_number: Option<String>,
    /// Postal or market address.
    pub address: Option<String>,
    /// Free text.
    pub notes: Option<String>,
}

/// Checks that a referenced contact belongs to the business and has the
/// expected type.
pub(crate) async fn ensure_contact<C: ConnectionTrait>(
    conn: &C,
    business_id: Uuid,
    contact_id: Uuid,
    expected: ContactType,
) -> RepoResult<contacts::Model> {
    let contact = contacts::Entity::find_by_id(contact_id)
        .filter(contacts::Column::UserId.eq(business_id))
        .one(conn)
        .await?
        .ok_or(RepositoryError::NotFound("Contact"))?;

    let actual = decode("contact_type", &contact.contact_type, ContactType::parse)?;
    if actual != expected {
        return Err(RepositoryError::validation(format!(
            "Contact '{}' is not a {expected}",
            contact.name
        )));
    }
    Ok(contact)
}

/// Contact repository.
#[derive(Debug, Clone)]
pub struct ContactRepository {
    db: DatabaseConnection,
}

impl ContactRepository {
    /// Creates a new contact repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists contacts by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        business_id: Uuid,
        filter: ContactFilter,
        page: PageRequest,
    ) -> RepoResult<PageResponse<contacts::Model>> {
        let mut query = contacts::Entity::find().filter(contacts::Column::UserId.eq(business_id));

        if let Some(kind) = filter.contact_type {
            query = query.filter(contacts::Column::ContactType.eq(kind.as_str()));
        }
        if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
            let pattern = like_pattern(search);
            query = query.filter(
                Condition::any()
                    .add(Expr::expr(Func::lower(Expr::col(contacts::Column::Name))).like(pattern.as_str()))
                    .add(Expr::expr(Func::lower(Expr::col(contacts::Column::Email))).like(pattern.as_str()))
                    .add(Expr::col(contacts::Column::PhoneNumber).like(pattern.as_str())),
            );
        }

        let query = query.order_by_asc(contacts::Column::Name);
        paginate(&self.db, query, page).await
    }

    /// Finds a contact of the business.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if there is no such contact.
    pub async fn find(&self, business_id: Uuid, id: Uuid) -> RepoResult<contacts::Model> {
        contacts::Entity::find_by_id(id)
            .filter(contacts::Column::UserId.eq(business_id))
            .one(&self.db)
            .await?
            .ok_or(RepositoryError::NotFound("Contact"))
    }

    /// Creates a contact.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn create(&self, business_id: Uuid, input: ContactInput) -> RepoResult<contacts::Model> {
        let now = Utc::now().into();
        let contact = contacts::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(business_id),
            name: Set(input.name.trim().to_string()),
            contact_type: Set(input.contact_type.as_str().to_string()),
            email: Set(input.email),
            phone_number: Set(input.phone_number),
            address: Set(input.address),
            notes: Set(input.notes),
            created_at: Set(now),
            updated_at: Set(now),
        };
        Ok(contact.insert(&self.db).await?)
    }

    /// Replaces a contact's fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if there is no such contact.
    pub async fn update(
        &self,
        business_id: Uuid,
        id: Uuid,
        input: ContactInput,
    ) -> RepoResult<contacts::Model> {
        let contact = self.find(business_id, id).await?;

        let mut active: contacts::ActiveModel = contact.into();
        active.name = Set(input.name.trim().to_string());
        active.contact_type = Set(input.contact_type.as_str().to_string());
        active.email = Set(input.email);
        active.phone_number = Set(input.phone_number);
        active.address = Set(input.address);
        active.notes = Set(input.notes);
        active.updated_at = Set(Utc::now().into());
        Ok(active.update(&self.db).await?)
    }

    /// Deletes a contact. Sales and stock additions keep their rows with
    /// the contact cleared.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if there is no such contact.
    pub async fn delete(&self, business_id: Uuid, id: Uuid) -> RepoResult<()> {
        let contact = self.find(business_id, id).await?;
        contact.delete(&self.db).await?;
        Ok(())
    }
}
