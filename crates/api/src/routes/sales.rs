//! Sales and payments.
//!
//! Recording a sale takes the product row lock, decrements stock, and logs
//! the movement and the cash received in one database transaction. Two
//! concurrent sales of the last units cannot both succeed.

use axum::{Router, extract::State, routing::{get, post}};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use super::{check_range, money, non_empty, page_request, positive_money, positive_quantity};
use crate::AppState;
use crate::error::ApiResult;
use crate::extractors::{ApiPath, ValidatedJson, ValidatedQuery};
use crate::middleware::AuthUser;
use crate::response::ApiResponse;
use localfish_core::sales::{PaymentMethod, PaymentStatus};
use localfish_db::entities::sales;
use localfish_db::{CreateSaleInput, RecordPaymentInput, SaleFilter, SaleRepository};
use localfish_shared::types::PageResponse;

/// Creates the sales router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/sales", get(list_sales).post(create_sale))
        .route("/sales/{id}", get(get_sale).delete(delete_sale))
        .route("/sales/{id}/payments", post(record_payment))
}

/// Sales list filters.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SaleListQuery {
    /// Page number.
    #[validate(range(min = 1))]
    pub page: Option<u32>,
    /// Items per page.
    #[validate(range(min = 1, max = 100))]
    pub per_page: Option<u32>,
    /// Only this product.
    pub product_id: Option<Uuid>,
    /// Only this customer.
    pub contact_id: Option<Uuid>,
    /// Only this payment status.
    pub payment_status: Option<PaymentStatus>,
    /// Only this payment method.
    pub payment_method: Option<PaymentMethod>,
    /// Earliest sale date (inclusive).
    pub date_from: Option<NaiveDate>,
    /// Latest sale date (inclusive).
    pub date_to: Option<NaiveDate>,
}

/// New sale.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateSaleRequest {
    /// Product sold.
    pub product_id: Uuid,
    /// Customer contact.
    pub contact_id: Option<Uuid>,
    /// Quantity sold.
    #[validate(custom(function = "positive_quantity"))]
    pub quantity: Decimal,
    /// Price per unit; defaults to the product's selling price.
    #[validate(custom(function = "money"))]
    pub unit_price: Option<Decimal>,
    /// How the customer pays.
    pub payment_method: PaymentMethod,
    /// Paid now; defaults to the full total, or zero on credit.
    #[validate(custom(function = "money"))]
    pub amount_paid: Option<Decimal>,
    /// Sale day; defaults to today.
    pub sale_date: Option<NaiveDate>,
    /// Free text.
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

/// A payment against an open sale.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RecordPaymentRequest {
    /// Amount received.
    #[validate(custom(function = "positive_money"))]
    pub amount: Decimal,
    /// Day received; defaults to today.
    pub payment_date: Option<NaiveDate>,
}

/// GET /sales - Filtered, paginated sales, newest first.
async fn list_sales(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedQuery(query): ValidatedQuery<SaleListQuery>,
) -> ApiResult<ApiResponse<PageResponse<sales::Model>>> {
    check_range(query.date_from, query.date_to)?;
    let repo = SaleRepository::new(state.db().await?);
    let filter = SaleFilter {
        product_id: query.product_id,
        contact_id: query.contact_id,
        payment_status: query.payment_status,
        payment_method: query.payment_method,
        date_from: query.date_from,
        date_to: query.date_to,
    };
    let page = page_request(query.page, query.per_page);
    Ok(ApiResponse::ok(repo.list(user.business_id(), filter, page).await?))
}

/// GET /sales/{id}
async fn get_sale(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<ApiResponse<sales::Model>> {
    let repo = SaleRepository::new(state.db().await?);
    Ok(ApiResponse::ok(repo.find(user.business_id(), id).await?))
}

/// POST /sales - Record a sale; 422 when stock is insufficient.
async fn create_sale(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(payload): ValidatedJson<CreateSaleRequest>,
) -> ApiResult<ApiResponse<sales::Model>> {
    let repo = SaleRepository::new(state.db().await?);
    let sale = repo
        .create(
            user.business_id(),
            user.subject_id(),
            CreateSaleInput {
                product_id: payload.product_id,
                contact_id: payload.contact_id,
                quantity: payload.quantity,
                unit_price: payload.unit_price,
                payment_method: payload.payment_method,
                amount_paid: payload.amount_paid,
                sale_date: payload.sale_date,
                notes: non_empty(payload.notes),
            },
        )
        .await?;
    Ok(ApiResponse::created(sale).with_message("Sale recorded"))
}

/// POST /sales/{id}/payments - Pay down a pending or partial sale.
async fn record_payment(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ValidatedJson(payload): ValidatedJson<RecordPaymentRequest>,
) -> ApiResult<ApiResponse<sales::Model>> {
    let repo = SaleRepository::new(state.db().await?);
    let sale = repo
        .record_payment(
            user.business_id(),
            id,
            user.subject_id(),
            RecordPaymentInput {
                amount: payload.amount,
                payment_date: payload.payment_date,
            },
        )
        .await?;
    Ok(ApiResponse::ok(sale).with_message("Payment recorded"))
}

/// DELETE /sales/{id} - Remove a sale and put its quantity back in stock.
async fn delete_sale(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<ApiResponse<()>> {
    user.require_delete()?;
    let repo = SaleRepository::new(state.db().await?);
    repo.delete(user.business_id(), id, user.subject_id()).await?;

    info!(sale_id = %id, "Sale deleted");
    Ok(ApiResponse::message("Sale deleted and stock restored"))
}
