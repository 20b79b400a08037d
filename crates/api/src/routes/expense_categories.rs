//! Expense category routes.

use axum::{Router, extract::State, routing::{get, put}};
use tracing::info;
use uuid::Uuid;

use super::product_categories::CategoryRequest;
use crate::AppState;
use crate::error::ApiResult;
use crate::extractors::{ApiPath, ValidatedJson};
use crate::middleware::AuthUser;
use crate::response::ApiResponse;
use localfish_db::ExpenseCategoryRepository;
use localfish_db::entities::expense_categories;

/// Creates the expense category router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/expense-categories", get(list_categories).post(create_category))
        .route(
            "/expense-categories/{id}",
            put(update_category).delete(delete_category),
        )
}

/// GET /expense-categories
async fn list_categories(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<ApiResponse<Vec<expense_categories::Model>>> {
    let repo = ExpenseCategoryRepository::new(state.db().await?);
    Ok(ApiResponse::ok(repo.list(user.business_id()).await?))
}

/// POST /expense-categories
async fn create_category(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(payload): ValidatedJson<CategoryRequest>,
) -> ApiResult<ApiResponse<expense_categories::Model>> {
    let repo = ExpenseCategoryRepository::new(state.db().await?);
    let category = repo.create(user.business_id(), payload.into()).await?;

    info!(category_id = %category.id, "Expense category created");
    Ok(ApiResponse::created(category).with_message("Category created"))
}

/// PUT /expense-categories/{id}
async fn update_category(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ValidatedJson(payload): ValidatedJson<CategoryRequest>,
) -> ApiResult<ApiResponse<expense_categories::Model>> {
    let repo = ExpenseCategoryRepository::new(state.db().await?);
    let category = repo.update(user.business_id(), id, payload.into()).await?;
    Ok(ApiResponse::ok(category).with_message("Category updated"))
}

/// DELETE /expense-categories/{id} - Refused while expenses use it.
async fn delete_category(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<ApiResponse<()>> {
    user.require_delete()?;
    let repo = ExpenseCategoryRepository::new(state.db().await?);
    repo.delete(user.business_id(), id).await?;

    info!(category_id = %id, "Expense category deleted");
    Ok(ApiResponse::message("Category deleted"))
}
