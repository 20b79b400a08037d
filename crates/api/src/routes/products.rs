//! Product catalog routes.

use axum::{Router, extract::State, routing::{get, post}};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use super::{money, non_empty, page_request, stock_level, upload};
use crate::AppState;
use crate::error::ApiResult;
use crate::extractors::{ApiPath, UploadForm, ValidatedJson, ValidatedQuery};
use crate::middleware::AuthUser;
use crate::response::ApiResponse;
use localfish_core::auth::Role;
use localfish_db::entities::products;
use localfish_db::{CreateProductInput, ProductFilter, ProductRepository, UpdateProductInput};
use localfish_shared::types::PageResponse;

/// Cloudinary sub-folder for product images.
const IMAGE_FOLDER: &str = "products";

/// Creates the product router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route(
            "/products/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/products/{id}/image", post(upload_image))
}

// ============================================================================
// Request DTOs
// ============================================================================

/// Product list filters.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProductListQuery {
    /// Page number.
    #[validate(range(min = 1))]
    pub page: Option<u32>,
    /// Items per page.
    #[validate(range(min = 1, max = 100))]
    pub per_page: Option<u32>,
    /// Only this category.
    pub category_id: Option<Uuid>,
    /// Name or SKU substring.
    #[validate(length(max = 100))]
    pub search: Option<String>,
    /// Only products at or below their threshold.
    pub low_stock: Option<bool>,
}

/// New product.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    /// Category.
    pub category_id: Option<Uuid>,
    /// Display name.
    #[validate(length(min = 1, max = 255, message = "Name is required"))]
    pub name: String,
    /// Stock keeping unit.
    #[validate(length(max = 64))]
    pub sku: Option<String>,
    /// Unit of measure, e.g. `kg`.
    #[validate(length(min = 1, max = 20))]
    pub unit: Option<String>,
    /// Opening stock.
    #[validate(custom(function = "stock_level"))]
    pub quantity: Option<Decimal>,
    /// Purchase price per unit.
    #[validate(custom(function = "money"))]
    pub cost_price: Decimal,
    /// Selling price per unit.
    #[validate(custom(function = "money"))]
    pub selling_price: Decimal,
    /// Low-stock alert level.
    #[validate(custom(function = "stock_level"))]
    pub low_stock_threshold: Option<Decimal>,
}

/// Product changes. Stock is only changed through additions,
/// corrections, and sales.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    /// Category.
    pub category_id: Option<Uuid>,
    /// Display name.
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    /// Stock keeping unit.
    #[validate(length(max = 64))]
    pub sku: Option<String>,
    /// Unit of measure.
    #[validate(length(min = 1, max = 20))]
    pub unit: Option<String>,
    /// Purchase price per unit.
    #[validate(custom(function = "money"))]
    pub cost_price: Option<Decimal>,
    /// Selling price per unit.
    #[validate(custom(function = "money"))]
    pub selling_price: Option<Decimal>,
    /// Low-stock alert level.
    #[validate(custom(function = "stock_level"))]
    pub low_stock_threshold: Option<Decimal>,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /products - Filtered, paginated product list.
async fn list_products(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedQuery(query): ValidatedQuery<ProductListQuery>,
) -> ApiResult<ApiResponse<PageResponse<products::Model>>> {
    let repo = ProductRepository::new(state.db().await?);
    let filter = ProductFilter {
        category_id: query.category_id,
        search: non_empty(query.search),
        low_stock: query.low_stock.unwrap_or(false),
    };
    let page = page_request(query.page, query.per_page);
    Ok(ApiResponse::ok(repo.list(user.business_id(), filter, page).await?))
}

/// GET /products/{id}
async fn get_product(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<ApiResponse<products::Model>> {
    let repo = ProductRepository::new(state.db().await?);
    Ok(ApiResponse::ok(repo.find(user.business_id(), id).await?))
}

/// POST /products - New product; opening stock is logged as a movement.
async fn create_product(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(payload): ValidatedJson<CreateProductRequest>,
) -> ApiResult<ApiResponse<products::Model>> {
    user.require(Role::can_manage_catalog, "Not allowed to manage the catalog")?;
    let repo = ProductRepository::new(state.db().await?);
    let product = repo
        .create(
            user.business_id(),
            user.subject_id(),
            CreateProductInput {
                category_id: payload.category_id,
                name: payload.name,
                sku: non_empty(payload.sku),
                unit: payload.unit.unwrap_or_else(|| "kg".to_string()),
                quantity: payload.quantity.unwrap_or_default(),
                cost_price: payload.cost_price,
                selling_price: payload.selling_price,
                low_stock_threshold: payload.low_stock_threshold.unwrap_or_default(),
            },
        )
        .await?;

    info!(product_id = %product.id, "Product created");
    Ok(ApiResponse::created(product).with_message("Product created"))
}

/// PUT /products/{id}
async fn update_product(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateProductRequest>,
) -> ApiResult<ApiResponse<products::Model>> {
    user.require(Role::can_manage_catalog, "Not allowed to manage the catalog")?;
    let repo = ProductRepository::new(state.db().await?);
    let product = repo
        .update(
            user.business_id(),
            id,
            UpdateProductInput {
                category_id: payload.category_id,
                name: payload.name,
                sku: payload.sku,
                unit: payload.unit,
                cost_price: payload.cost_price,
                selling_price: payload.selling_price,
                low_stock_threshold: payload.low_stock_threshold,
            },
        )
        .await?;
    Ok(ApiResponse::ok(product).with_message("Product updated"))
}

/// DELETE /products/{id} - Refused once the product has sales.
async fn delete_product(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<ApiResponse<()>> {
    user.require_delete()?;
    let repo = ProductRepository::new(state.db().await?);
    let image = repo.delete(user.business_id(), id).await?;
    upload::discard(state.media.as_deref(), image).await;

    info!(product_id = %id, "Product deleted");
    Ok(ApiResponse::message("Product deleted"))
}

/// POST /products/{id}/image - Upload an image, replacing the previous one.
async fn upload_image(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    UploadForm(multipart): UploadForm,
) -> ApiResult<ApiResponse<products::Model>> {
    let media = state.media()?;
    let repo = ProductRepository::new(state.db().await?);
    repo.find(user.business_id(), id).await?;

    let file = upload::read_file(multipart, IMAGE_FOLDER).await?;
    let uploaded = upload::store(&media, file).await?;

    let (product, previous) = match repo
        .set_image(user.business_id(), id, uploaded.url, uploaded.public_id.clone())
        .await
    {
        Ok(result) => result,
        Err(e) => {
            upload::discard(Some(&media), Some(uploaded.public_id)).await;
            return Err(e.into());
        }
    };
    upload::discard(Some(&media), previous).await;

    info!(product_id = %product.id, "Product image updated");
    Ok(ApiResponse::ok(product).with_message("Image uploaded"))
}
