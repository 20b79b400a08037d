//! Product category routes.

use axum::{Router, extract::State, routing::{get, put}};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use super::non_empty;
use crate::AppState;
use crate::error::ApiResult;
use crate::extractors::{ApiPath, ValidatedJson};
use crate::middleware::AuthUser;
use crate::response::ApiResponse;
use localfish_core::auth::Role;
use localfish_db::entities::product_categories;
use localfish_db::{CategoryInput, ProductCategoryRepository};

/// Creates the product category router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/product-categories", get(list_categories).post(create_category))
        .route(
            "/product-categories/{id}",
            put(update_category).delete(delete_category),
        )
}

/// Category create/update body, shared with expense categories.
#[derive(Debug, Deserialize, Validate)]
pub struct CategoryRequest {
    /// Name, unique per business (case-insensitive).
    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    pub name: String,
    /// Free text.
    #[validate(length(max = 500))]
    pub description: Option<String>,
}

impl From<CategoryRequest> for CategoryInput {
    fn from(req: CategoryRequest) -> Self {
        Self {
            name: req.name,
            description: non_empty(req.description),
        }
    }
}

/// GET /product-categories - All categories, by name.
async fn list_categories(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<ApiResponse<Vec<product_categories::Model>>> {
    let repo = ProductCategoryRepository::new(state.db().await?);
    Ok(ApiResponse::ok(repo.list(user.business_id()).await?))
}

/// POST /product-categories - New category.
async fn create_category(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(payload): ValidatedJson<CategoryRequest>,
) -> ApiResult<ApiResponse<product_categories::Model>> {
    user.require(Role::can_manage_catalog, "Not allowed to manage the catalog")?;
    let repo = ProductCategoryRepository::new(state.db().await?);
    let category = repo.create(user.business_id(), payload.into()).await?;

    info!(category_id = %category.id, "Product category created");
    Ok(ApiResponse::created(category).with_message("Category created"))
}

/// PUT /product-categories/{id} - Rename or describe a category.
async fn update_category(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ValidatedJson(payload): ValidatedJson<CategoryRequest>,
) -> ApiResult<ApiResponse<product_categories::Model>> {
    user.require(Role::can_manage_catalog, "Not allowed to manage the catalog")?;
    let repo = ProductCategoryRepository::new(state.db().await?);
    let category = repo.update(user.business_id(), id, payload.into()).await?;
    Ok(ApiResponse::ok(category).with_message("Category updated"))
}

/// DELETE /product-categories/{id} - Refused while products use it.
async fn delete_category(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<ApiResponse<()>> {
    user.require_delete()?;
    let repo = ProductCategoryRepository::new(state.db().await?);
    repo.delete(user.business_id(), id).await?;

    info!(category_id = %id, "Product category deleted");
    Ok(ApiResponse::message("Category deleted"))
}
