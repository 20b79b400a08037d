//! The cash transaction log (read-only; entries come from sales, stock
//! purchases, expenses, and deposits).

use axum::{Router, extract::State, routing::get};
use chrono::NaiveDate;
use serde::Deserialize;
use validator::Validate;

use super::{check_range, page_request};
use crate::AppState;
use crate::error::ApiResult;
use crate::extractors::ValidatedQuery;
use crate::middleware::AuthUser;
use crate::response::ApiResponse;
use localfish_core::finance::TransactionType;
use localfish_db::entities::transactions;
use localfish_db::{TransactionFilter, TransactionRepository};
use localfish_shared::types::PageResponse;

/// Creates the transaction router.
pub fn routes() -> Router<AppState> {
    Router::new().route("/transactions", get(list_transactions))
}

/// Transaction list filters.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TransactionListQuery {
    /// Page number.
    #[validate(range(min = 1))]
    pub page: Option<u32>,
    /// Items per page.
    #[validate(range(min = 1, max = 100))]
    pub per_page: Option<u32>,
    /// Only this kind of transaction.
    #[serde(rename = "type")]
    pub transaction_type: Option<TransactionType>,
    /// Earliest day (inclusive).
    pub date_from: Option<NaiveDate>,
    /// Latest day (inclusive).
    pub date_to: Option<NaiveDate>,
}

/// GET /transactions - Newest first.
async fn list_transactions(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedQuery(query): ValidatedQuery<TransactionListQuery>,
) -> ApiResult<ApiResponse<PageResponse<transactions::Model>>> {
    check_range(query.date_from, query.date_to)?;
    let repo = TransactionRepository::new(state.db().await?);
    let filter = TransactionFilter {
        transaction_type: query.transaction_type,
        date_from: query.date_from,
        date_to: query.date_to,
    };
    let page = page_request(query.page, query.per_page);
    Ok(ApiResponse::ok(repo.list(user.business_id(), filter, page).await?))
}
