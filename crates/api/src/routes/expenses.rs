//! Expenses and their receipts.

use axum::{Router, extract::State, routing::{get, post}};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use super::{check_range, non_empty, page_request, positive_money, upload};
use crate::AppState;
use crate::error::ApiResult;
use crate::extractors::{ApiPath, UploadForm, ValidatedJson, ValidatedQuery};
use crate::middleware::AuthUser;
use crate::response::ApiResponse;
use localfish_core::finance::ExpenseStatus;
use localfish_core::sales::PaymentMethod;
use localfish_db::entities::expenses;
use localfish_db::{ExpenseFilter, ExpenseInput, ExpenseRepository};
use localfish_shared::types::PageResponse;

/// Cloudinary sub-folder for receipts.
const RECEIPT_FOLDER: &str = "receipts";

/// Creates the expense router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/expenses", get(list_expenses).post(create_expense))
        .route(
            "/expenses/{id}",
            get(get_expense).put(update_expense).delete(delete_expense),
        )
        .route("/expenses/{id}/receipt", post(upload_receipt))
}

/// Expense list filters.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseListQuery {
    /// Page number.
    #[validate(range(min = 1))]
    pub page: Option<u32>,
    /// Items per page.
    #[validate(range(min = 1, max = 100))]
    pub per_page: Option<u32>,
    /// Only this category.
    pub category_id: Option<Uuid>,
    /// Only paid or only pending.
    pub status: Option<ExpenseStatus>,
    /// Earliest expense date (inclusive).
    pub date_from: Option<NaiveDate>,
    /// Latest expense date (inclusive).
    pub date_to: Option<NaiveDate>,
}

/// Expense create/update body.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseRequest {
    /// Expense category.
    pub category_id: Option<Uuid>,
    /// Short description.
    #[validate(length(min = 1, max = 255, message = "Title is required"))]
    pub title: String,
    /// Amount spent.
    #[validate(custom(function = "positive_money"))]
    pub amount: Decimal,
    /// Paid (default) or pending.
    pub payment_status: Option<ExpenseStatus>,
    /// How it was paid.
    pub payment_method: Option<PaymentMethod>,
    /// Expense day; defaults to today.
    pub expense_date: Option<NaiveDate>,
    /// Free text.
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

impl From<ExpenseRequest> for ExpenseInput {
    fn from(req: ExpenseRequest) -> Self {
        Self {
            category_id: req.category_id,
            title: req.title.trim().to_string(),
            amount: req.amount,
            payment_status: req.payment_status.unwrap_or(ExpenseStatus::Paid),
            payment_method: req.payment_method,
            expense_date: req.expense_date.unwrap_or_else(|| Utc::now().date_naive()),
            notes: non_empty(req.notes),
        }
    }
}

/// GET /expenses
async fn list_expenses(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedQuery(query): ValidatedQuery<ExpenseListQuery>,
) -> ApiResult<ApiResponse<PageResponse<expenses::Model>>> {
    check_range(query.date_from, query.date_to)?;
    let repo = ExpenseRepository::new(state.db().await?);
    let filter = ExpenseFilter {
        category_id: query.category_id,
        status: query.status,
        date_from: query.date_from,
        date_to: query.date_to,
    };
    let page = page_request(query.page, query.per_page);
    Ok(ApiResponse::ok(repo.list(user.business_id(), filter, page).await?))
}

/// GET /expenses/{id}
async fn get_expense(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<ApiResponse<expenses::Model>> {
    let repo = ExpenseRepository::new(state.db().await?);
    Ok(ApiResponse::ok(repo.find(user.business_id(), id).await?))
}

/// POST /expenses - Paid expenses also land in the transaction log.
async fn create_expense(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(payload): ValidatedJson<ExpenseRequest>,
) -> ApiResult<ApiResponse<expenses::Model>> {
    let repo = ExpenseRepository::new(state.db().await?);
    let expense = repo
        .create(user.business_id(), user.subject_id(), payload.into())
        .await?;
    Ok(ApiResponse::created(expense).with_message("Expense recorded"))
}

/// PUT /expenses/{id}
async fn update_expense(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ValidatedJson(payload): ValidatedJson<ExpenseRequest>,
) -> ApiResult<ApiResponse<expenses::Model>> {
    let repo = ExpenseRepository::new(state.db().await?);
    let expense = repo
        .update(user.business_id(), id, user.subject_id(), payload.into())
        .await?;
    Ok(ApiResponse::ok(expense).with_message("Expense updated"))
}

/// DELETE /expenses/{id}
async fn delete_expense(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<ApiResponse<()>> {
    user.require_delete()?;
    let repo = ExpenseRepository::new(state.db().await?);
    let receipt = repo.delete(user.business_id(), id).await?;
    upload::discard(state.media.as_deref(), receipt).await;

    info!(expense_id = %id, "Expense deleted");
    Ok(ApiResponse::message("Expense deleted"))
}

/// POST /expenses/{id}/receipt - Attach a receipt image or PDF.
async fn upload_receipt(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    UploadForm(multipart): UploadForm,
) -> ApiResult<ApiResponse<expenses::Model>> {
    let media = state.media()?;
    let repo = ExpenseRepository::new(state.db().await?);
    repo.find(user.business_id(), id).await?;

    let file = upload::read_file(multipart, RECEIPT_FOLDER).await?;
    let uploaded = upload::store(&media, file).await?;

    let (expense, previous) = match repo
        .set_receipt(user.business_id(), id, uploaded.url, uploaded.public_id.clone())
        .await
    {
        Ok(result) => result,
        Err(e) => {
            upload::discard(Some(&media), Some(uploaded.public_id)).await;
            return Err(e.into());
        }
    };
    upload::discard(Some(&media), previous).await;

    info!(expense_id = %expense.id, "Receipt uploaded");
    Ok(ApiResponse::ok(expense).with_message("Receipt uploaded"))
}
