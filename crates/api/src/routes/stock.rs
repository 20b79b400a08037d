//! Stock additions, corrections, and the movement log.

use axum::{Router, extract::State, routing::get};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use super::{check_range, money, non_empty, page_request, positive_quantity, quantity_delta};
use crate::AppState;
use crate::error::ApiResult;
use crate::extractors::{ValidatedJson, ValidatedQuery};
use crate::middleware::AuthUser;
use crate::response::ApiResponse;
use localfish_core::inventory::{CorrectionReason, MovementType};
use localfish_db::entities::{stock_additions, stock_corrections, stock_movements};
use localfish_db::{AddStockInput, CorrectStockInput, MovementFilter, StockRepository};
use localfish_shared::types::PageResponse;

/// Creates the stock router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/stock/additions", get(list_additions).post(add_stock))
        .route("/stock/corrections", get(list_corrections).post(correct_stock))
        .route("/stock/movements", get(list_movements))
}

/// Additions and corrections list filters.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct StockListQuery {
    /// Page number.
    #[validate(range(min = 1))]
    pub page: Option<u32>,
    /// Items per page.
    #[validate(range(min = 1, max = 100))]
    pub per_page: Option<u32>,
    /// Only this product.
    pub product_id: Option<Uuid>,
}

/// Movement log filters.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MovementListQuery {
    /// Page number.
    #[validate(range(min = 1))]
    pub page: Option<u32>,
    /// Items per page.
    #[validate(range(min = 1, max = 100))]
    pub per_page: Option<u32>,
    /// Only this product.
    pub product_id: Option<Uuid>,
    /// Only this kind of movement.
    pub movement_type: Option<MovementType>,
    /// Earliest day (inclusive).
    pub date_from: Option<NaiveDate>,
    /// Latest day (inclusive).
    pub date_to: Option<NaiveDate>,
}

/// Stock received.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddStockRequest {
    /// Product receiving stock.
    pub product_id: Uuid,
    /// Quantity received.
    #[validate(custom(function = "positive_quantity"))]
    pub quantity: Decimal,
    /// Purchase price per unit.
    #[validate(custom(function = "money"))]
    pub unit_cost: Option<Decimal>,
    /// Supplier contact.
    pub contact_id: Option<Uuid>,
    /// Free text.
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

/// Manual stock correction.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CorrectStockRequest {
    /// Product to correct.
    pub product_id: Uuid,
    /// Signed change; negative removes stock.
    #[validate(custom(function = "quantity_delta"))]
    pub quantity_change: Decimal,
    /// Why the count changed.
    pub reason: CorrectionReason,
    /// Free text.
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

/// GET /stock/additions
async fn list_additions(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedQuery(query): ValidatedQuery<StockListQuery>,
) -> ApiResult<ApiResponse<PageResponse<stock_additions::Model>>> {
    let repo = StockRepository::new(state.db().await?);
    let page = page_request(query.page, query.per_page);
    Ok(ApiResponse::ok(
        repo.list_additions(user.business_id(), query.product_id, page)
            .await?,
    ))
}

/// POST /stock/additions - Receive stock.
async fn add_stock(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(payload): ValidatedJson<AddStockRequest>,
) -> ApiResult<ApiResponse<stock_additions::Model>> {
    let repo = StockRepository::new(state.db().await?);
    let addition = repo
        .add_stock(
            user.business_id(),
            user.subject_id(),
            AddStockInput {
                product_id: payload.product_id,
                quantity: payload.quantity,
                unit_cost: payload.unit_cost.unwrap_or_default(),
                contact_id: payload.contact_id,
                notes: non_empty(payload.notes),
            },
        )
        .await?;

    info!(addition_id = %addition.id, product_id = %addition.product_id, "Stock added");
    Ok(ApiResponse::created(addition).with_message("Stock added"))
}

/// GET /stock/corrections
async fn list_corrections(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedQuery(query): ValidatedQuery<StockListQuery>,
) -> ApiResult<ApiResponse<PageResponse<stock_corrections::Model>>> {
    let repo = StockRepository::new(state.db().await?);
    let page = page_request(query.page, query.per_page);
    Ok(ApiResponse::ok(
        repo.list_corrections(user.business_id(), query.product_id, page)
            .await?,
    ))
}

/// POST /stock/corrections - Signed correction; never below zero.
async fn correct_stock(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(payload): ValidatedJson<CorrectStockRequest>,
) -> ApiResult<ApiResponse<stock_corrections::Model>> {
    let repo = StockRepository::new(state.db().await?);
    let correction = repo
        .correct_stock(
            user.business_id(),
            user.subject_id(),
            CorrectStockInput {
                product_id: payload.product_id,
                quantity_change: payload.quantity_change,
                reason: payload.reason,
                notes: non_empty(payload.notes),
            },
        )
        .await?;
    Ok(ApiResponse::created(correction).with_message("Stock corrected"))
}

/// GET /stock/movements - The movement log.
async fn list_movements(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedQuery(query): ValidatedQuery<MovementListQuery>,
) -> ApiResult<ApiResponse<PageResponse<stock_movements::Model>>> {
    check_range(query.date_from, query.date_to)?;
    let repo = StockRepository::new(state.db().await?);
    let filter = MovementFilter {
        product_id: query.product_id,
        movement_type: query.movement_type,
        date_from: query.date_from,
        date_to: query.date_to,
    };
    let page = page_request(query.page, query.per_page);
    Ok(ApiResponse::ok(
        repo.list_movements(user.business_id(), filter, page).await?,
    ))
}
