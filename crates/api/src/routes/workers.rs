//! Worker management (owner only).

use std::sync::Arc;

use axum::{Router, extract::State, routing::get};
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use super::{PageQuery, non_empty};
use crate::AppState;
use crate::error::ApiResult;
use crate::extractors::{ApiPath, ValidatedJson, ValidatedQuery};
use crate::middleware::AuthUser;
use crate::response::ApiResponse;
use localfish_core::auth::hash_password;
use localfish_db::entities::workers;
use localfish_db::{CreateWorkerInput, UpdateWorkerInput, UserRepository, WorkerRepository};
use localfish_shared::types::PageResponse;
use localfish_shared::{AppError, EmailService};

/// Creates the worker router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/workers", get(list_workers).post(create_worker))
        .route(
            "/workers/{id}",
            get(get_worker).put(update_worker).delete(delete_worker),
        )
}

/// New worker.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateWorkerRequest {
    /// Full name.
    #[validate(length(min = 1, max = 255, message = "Full name is required"))]
    pub full_name: String,
    /// Login email, unique across owners and workers.
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    /// Initial password chosen by the owner.
    #[validate(length(min = 8, max = 128, message = "Password must be 8 to 128 characters"))]
    pub password: String,
    /// Phone number.
    #[validate(length(max = 32))]
    pub phone_number: Option<String>,
    /// Job title.
    #[validate(length(max = 100))]
    pub title: Option<String>,
}

/// Worker changes.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateWorkerRequest {
    /// Full name.
    #[validate(length(min = 1, max = 255))]
    pub full_name: Option<String>,
    /// Phone number.
    #[validate(length(max = 32))]
    pub phone_number: Option<String>,
    /// Job title.
    #[validate(length(max = 100))]
    pub title: Option<String>,
    /// Deactivated workers cannot sign in.
    pub is_active: Option<bool>,
}

/// GET /workers - List the business's workers.
async fn list_workers(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedQuery(query): ValidatedQuery<PageQuery>,
) -> ApiResult<ApiResponse<PageResponse<workers::Model>>> {
    user.require_owner()?;
    let repo = WorkerRepository::new(state.db().await?);
    Ok(ApiResponse::ok(repo.list(user.business_id(), query.page()).await?))
}

/// GET /workers/{id} - One worker.
async fn get_worker(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<ApiResponse<workers::Model>> {
    user.require_owner()?;
    let repo = WorkerRepository::new(state.db().await?);
    Ok(ApiResponse::ok(repo.find(user.business_id(), id).await?))
}

/// POST /workers - Add a worker and mail them an invitation.
async fn create_worker(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(payload): ValidatedJson<CreateWorkerRequest>,
) -> ApiResult<ApiResponse<workers::Model>> {
    user.require_owner()?;
    let db = state.db().await?;
    let users = UserRepository::new(db.clone());
    let repo = WorkerRepository::new(db);

    if users.email_exists(&payload.email).await? || repo.email_exists(&payload.email).await? {
        return Err(AppError::Conflict("Email already registered".to_string()).into());
    }
    let business = users
        .find_by_id(user.business_id())
        .await?
        .ok_or_else(|| AppError::not_found("Business"))?;

    let password_hash = hash_password(&payload.password)?;
    let worker = repo
        .create(
            user.business_id(),
            CreateWorkerInput {
                full_name: payload.full_name,
                email: payload.email,
                phone_number: non_empty(payload.phone_number),
                password_hash,
                title: non_empty(payload.title),
            },
        )
        .await?;

    info!(worker_id = %worker.id, business_id = %business.id, "Worker created");
    send_invitation(
        Arc::clone(&state.email_service),
        worker.email.clone(),
        worker.full_name.clone(),
        business.business_name,
    );

    Ok(ApiResponse::created(worker).with_message("Worker created"))
}

/// Mails the invitation in the background; the worker exists either way.
fn send_invitation(email: Arc<EmailService>, to: String, name: String, business_name: String) {
    if !email.is_enabled() {
        return;
    }
    tokio::spawn(async move {
        if let Err(e) = email.send_worker_invitation(&to, &name, &business_name).await {
            warn!(error = %e, "Failed to send worker invitation");
        }
    });
}

/// PUT /workers/{id} - Update a worker.
async fn update_worker(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateWorkerRequest>,
) -> ApiResult<ApiResponse<workers::Model>> {
    user.require_owner()?;
    let repo = WorkerRepository::new(state.db().await?);
    let worker = repo
        .update(
            user.business_id(),
            id,
            UpdateWorkerInput {
                full_name: payload.full_name,
                phone_number: payload.phone_number,
                title: payload.title,
                is_active: payload.is_active,
            },
        )
        .await?;

    info!(worker_id = %worker.id, "Worker updated");
    Ok(ApiResponse::ok(worker).with_message("Worker updated"))
}

/// DELETE /workers/{id} - Remove a worker.
async fn delete_worker(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<ApiResponse<()>> {
    user.require_owner()?;
    let repo = WorkerRepository::new(state.db().await?);
    repo.delete(user.business_id(), id).await?;

    info!(worker_id = %id, "Worker deleted");
    Ok(ApiResponse::message("Worker deleted"))
}
