//! Customers and suppliers.

use axum::{Router, extract::State, routing::get};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use super::{non_empty, page_request};
use crate::AppState;
use crate::error::ApiResult;
use crate::extractors::{ApiPath, ValidatedJson, ValidatedQuery};
use crate::middleware::AuthUser;
use crate::response::ApiResponse;
use localfish_core::finance::ContactType;
use localfish_db::entities::contacts;
use localfish_db::{ContactFilter, ContactInput, ContactRepository};
use localfish_shared::types::PageResponse;

/// Creates the contact router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/contacts", get(list_contacts).post(create_contact))
        .route(
            "/contacts/{id}",
            get(get_contact).put(update_contact).delete(delete_contact),
        )
}

/// Contact list filters.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ContactListQuery {
    /// Page number.
    #[validate(range(min = 1))]
    pub page: Option<u32>,
    /// Items per page.
    #[validate(range(min = 1, max = 100))]
    pub per_page: Option<u32>,
    /// Customers or suppliers only.
    pub contact_type: Option<ContactType>,
    /// Name, email, or phone substring.
    #[validate(length(max = 100))]
    pub search: Option<String>,
}

/// Contact create/update body.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ContactRequest {
    /// Display name.
    #[validate(length(min = 1, max = 255, message = "Name is required"))]
    pub name: String,
    /// Customer or supplier.
    pub contact_type: ContactType,
    /// Email address.
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    /// Phone number.
    #[validate(length(max = 32))]
    pub phone_number: Option<String>,
    /// Postal address.
    #[validate(length(max = 500))]
    pub address: Option<String>,
    /// Free text.
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

impl From<ContactRequest> for ContactInput {
    fn from(req: ContactRequest) -> Self {
        Self {
            name: req.name,
            contact_type: req.contact_type,
            email: non_empty(req.email),
            phone_number: non_empty(req.phone_number),
            address: non_empty(req.address),
            notes: non_empty(req.notes),
        }
    }
}

/// GET /contacts
async fn list_contacts(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedQuery(query): ValidatedQuery<ContactListQuery>,
) -> ApiResult<ApiResponse<PageResponse<contacts::Model>>> {
    let repo = ContactRepository::new(state.db().await?);
    let filter = ContactFilter {
        contact_type: query.contact_type,
        search: non_empty(query.search),
    };
    let page = page_request(query.page, query.per_page);
    Ok(ApiResponse::ok(repo.list(user.business_id(), filter, page).await?))
}

/// GET /contacts/{id}
async fn get_contact(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<ApiResponse<contacts::Model>> {
    let repo = ContactRepository::new(state.db().await?);
    Ok(ApiResponse::ok(repo.find(user.business_id(), id).await?))
}

/// POST /contacts
async fn create_contact(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(payload): ValidatedJson<ContactRequest>,
) -> ApiResult<ApiResponse<contacts::Model>> {
    let repo = ContactRepository::new(state.db().await?);
    let contact = repo.create(user.business_id(), payload.into()).await?;

    info!(contact_id = %contact.id, "Contact created");
    Ok(ApiResponse::created(contact).with_message("Contact created"))
}

/// PUT /contacts/{id}
async fn update_contact(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ValidatedJson(payload): ValidatedJson<ContactRequest>,
) -> ApiResult<ApiResponse<contacts::Model>> {
    let repo = ContactRepository::new(state.db().await?);
    let contact = repo.update(user.business_id(), id, payload.into()).await?;
    Ok(ApiResponse::ok(contact).with_message("Contact updated"))
}

/// DELETE /contacts/{id}
async fn delete_contact(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<ApiResponse<()>> {
    let repo = ContactRepository::new(state.db().await?);
    repo.delete(user.business_id(), id).await?;

    info!(contact_id = %id, "Contact deleted");
    Ok(ApiResponse::message("Contact deleted"))
}
