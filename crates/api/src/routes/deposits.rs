//! Cash deposits and their proof documents.

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
use localfish_core::finance::DepositType;
use localfish_db::entities::deposits;
use localfish_db::{CreateDepositInput, DepositFilter, DepositRepository};
use localfish_shared::types::PageResponse;

/// Cloudinary sub-folder for deposit proofs.
const PROOF_FOLDER: &str = "deposits";

/// Creates the deposit router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/deposits", get(list_deposits).post(create_deposit))
        .route("/deposits/{id}", get(get_deposit).delete(delete_deposit))
        .route("/deposits/{id}/proof", post(upload_proof))
}

/// Deposit list filters.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DepositListQuery {
    /// Page number.
    #[validate(range(min = 1))]
    pub page: Option<u32>,
    /// Items per page.
    #[validate(range(min = 1, max = 100))]
    pub per_page: Option<u32>,
    /// Only this kind of deposit.
    pub deposit_type: Option<DepositType>,
    /// Earliest deposit date (inclusive).
    pub date_from: Option<NaiveDate>,
    /// Latest deposit date (inclusive).
    pub date_to: Option<NaiveDate>,
}

/// New deposit.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateDepositRequest {
    /// Bank, mobile money, or other.
    pub deposit_type: DepositType,
    /// Amount deposited.
    #[validate(custom(function = "positive_money"))]
    pub amount: Decimal,
    /// Receiving account.
    #[validate(length(max = 255))]
    pub account_name: Option<String>,
    /// Slip or transfer reference.
    #[validate(length(max = 255))]
    pub reference: Option<String>,
    /// Deposit day; defaults to today.
    pub deposit_date: Option<NaiveDate>,
    /// Free text.
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

/// GET /deposits
async fn list_deposits(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedQuery(query): ValidatedQuery<DepositListQuery>,
) -> ApiResult<ApiResponse<PageResponse<deposits::Model>>> {
    check_range(query.date_from, query.date_to)?;
    let repo = DepositRepository::new(state.db().await?);
    let filter = DepositFilter {
        deposit_type: query.deposit_type,
        date_from: query.date_from,
        date_to: query.date_to,
    };
    let page = page_request(query.page, query.per_page);
    Ok(ApiResponse::ok(repo.list(user.business_id(), filter, page).await?))
}

/// GET /deposits/{id}
async fn get_deposit(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<ApiResponse<deposits::Model>> {
    let repo = DepositRepository::new(state.db().await?);
    Ok(ApiResponse::ok(repo.find(user.business_id(), id).await?))
}

/// POST /deposits - Record a deposit and its transaction.
async fn create_deposit(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(payload): ValidatedJson<CreateDepositRequest>,
) -> ApiResult<ApiResponse<deposits::Model>> {
    let repo = DepositRepository::new(state.db().await?);
    let deposit = repo
        .create(
            user.business_id(),
            user.subject_id(),
            CreateDepositInput {
                deposit_type: payload.deposit_type,
                amount: payload.amount,
                account_name: non_empty(payload.account_name),
                reference: non_empty(payload.reference),
                deposit_date: payload
                    .deposit_date
                    .unwrap_or_else(|| Utc::now().date_naive()),
                notes: non_empty(payload.notes),
            },
        )
        .await?;
    Ok(ApiResponse::created(deposit).with_message("Deposit recorded"))
}

/// DELETE /deposits/{id}
async fn delete_deposit(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<ApiResponse<()>> {
    user.require_delete()?;
    let repo = DepositRepository::new(state.db().await?);
    let proof = repo.delete(user.business_id(), id).await?;
    upload::discard(state.media.as_deref(), proof).await;

    info!(deposit_id = %id, "Deposit deleted");
    Ok(ApiResponse::message("Deposit deleted"))
}

/// POST /deposits/{id}/proof - Attach a deposit slip or screenshot.
async fn upload_proof(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    UploadForm(multipart): UploadForm,
) -> ApiResult<ApiResponse<deposits::Model>> {
    let media = state.media()?;
    let repo = DepositRepository::new(state.db().await?);
    repo.find(user.business_id(), id).await?;

    let file = upload::read_file(multipart, PROOF_FOLDER).await?;
    let uploaded = upload::store(&media, file).await?;

    let (deposit, previous) = match repo
        .set_proof(user.business_id(), id, uploaded.url, uploaded.public_id.clone())
        .await
    {
        Ok(result) => result,
        Err(e) => {
            upload::discard(Some(&media), Some(uploaded.public_id)).await;
            return Err(e.into());
        }
    };
    upload::discard(Some(&media), previous).await;

    info!(deposit_id = %deposit.id, "Deposit proof uploaded");
    Ok(ApiResponse::ok(deposit).with_message("Proof uploaded"))
}
