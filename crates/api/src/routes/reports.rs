//! Report routes.
//!
//! `GET /reports/{kind}` returns the report as JSON; `/pdf` renders the same
//! document on the blocking pool and returns it as an attachment.

use axum::{
    Router,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::AppState;
use crate::error::{ApiError, ApiResult};
use crate::extractors::{ApiPath, ValidatedQuery};
use crate::middleware::AuthUser;
use crate::response::ApiResponse;
use localfish_core::finance::{DepositType, ExpenseStatus};
use localfish_core::reports::{
    PdfHeader, Report, ReportDocument, ReportFilter, ReportKind, ReportQuery, ReportService,
    render_pdf,
};
use localfish_core::sales::{PaymentMethod, PaymentStatus};
use localfish_db::{ReportRepository, UserRepository};

/// Creates the report router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/reports/{kind}", get(get_report))
        .route("/reports/{kind}/pdf", get(get_report_pdf))
}

/// Report query parameters.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ReportParams {
    /// First day; defaults to the first of the end date's month.
    pub start_date: Option<NaiveDate>,
    /// Last day; defaults to today.
    pub end_date: Option<NaiveDate>,
    /// Product category (sales, inventory) or expense category (expenses);
    /// rejected for the financial and general reports.
    pub category_id: Option<Uuid>,
    /// One product.
    pub product_id: Option<Uuid>,
    /// Sales with this payment status.
    pub payment_status: Option<PaymentStatus>,
    /// Sales with this payment method.
    pub payment_method: Option<PaymentMethod>,
    /// Expenses with this status.
    pub expense_status: Option<ExpenseStatus>,
    /// Deposits of this type.
    pub deposit_type: Option<DepositType>,
    /// Length of top-N lists.
    #[validate(range(min = 1, max = 50))]
    pub top_n: Option<u32>,
}

impl From<ReportParams> for ReportQuery {
    fn from(p: ReportParams) -> Self {
        Self {
            start_date: p.start_date,
            end_date: p.end_date,
            category_id: p.category_id,
            product_id: p.product_id,
            payment_status: p.payment_status,
            payment_method: p.payment_method,
            expense_status: p.expense_status,
            deposit_type: p.deposit_type,
            top_n: p.top_n,
        }
    }
}

/// Loads the rows a report needs and aggregates them.
async fn build_report(
    repo: &ReportRepository,
    business_id: Uuid,
    kind: ReportKind,
    filter: &ReportFilter,
) -> ApiResult<Report> {
    let report = match kind {
        ReportKind::Sales => {
            let rows = repo.sale_rows(business_id, filter).await?;
            Report::Sales(ReportService::sales_report(&rows, filter))
        }
        ReportKind::Expenses => {
            let rows = repo.expense_rows(business_id, filter).await?;
            Report::Expenses(ReportService::expense_report(&rows, filter))
        }
        ReportKind::Inventory => {
            let (products, movements) = tokio::try_join!(
                repo.product_stock_rows(business_id, filter),
                repo.movement_rows(business_id, filter),
            )?;
            Report::Inventory(ReportService::inventory_report(&products, &movements, filter))
        }
        ReportKind::Financial => {
            let (transactions, deposits) = tokio::try_join!(
                repo.transaction_rows(business_id, filter),
                repo.deposit_rows(business_id, filter),
            )?;
            Report::Financial(ReportService::financial_report(&transactions, &deposits, filter))
        }
        ReportKind::General => {
            let (sales, expenses, products, movements, transactions, deposits) = tokio::try_join!(
                repo.sale_rows(business_id, filter),
                repo.expense_rows(business_id, filter),
                repo.product_stock_rows(business_id, filter),
                repo.movement_rows(business_id, filter),
                repo.transaction_rows(business_id, filter),
                repo.deposit_rows(business_id, filter),
            )?;
            Report::General(ReportService::general_report(
                &ReportService::sales_report(&sales, filter),
                &ReportService::expense_report(&expenses, filter),
                &ReportService::inventory_report(&products, &movements, filter),
                &ReportService::financial_report(&transactions, &deposits, filter),
            ))
        }
    };
    Ok(report)
}

/// Resolves the request into a finished document.
async fn generate(
    state: &AppState,
    business_id: Uuid,
    kind: &str,
    params: ReportParams,
) -> ApiResult<ReportDocument> {
    let kind: ReportKind = kind.parse()?;
    let now = Utc::now();
    let filter = ReportQuery::from(params).resolve_for(kind, now.date_naive())?;

    let repo = ReportRepository::new(state.db().await?);
    let report = build_report(&repo, business_id, kind, &filter).await?;

    info!(
        kind = %kind,
        start = %filter.start_date,
        end = %filter.end_date,
        "Report generated"
    );
    Ok(ReportDocument::new(
        report,
        filter.start_date,
        filter.end_date,
        now,
    ))
}

/// GET /reports/{kind} - Report as JSON.
async fn get_report(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(kind): ApiPath<String>,
    ValidatedQuery(params): ValidatedQuery<ReportParams>,
) -> ApiResult<ApiResponse<ReportDocument>> {
    let document = generate(&state, user.business_id(), &kind, params).await?;
    Ok(ApiResponse::ok(document))
}

/// GET /reports/{kind}/pdf - Report as a PDF attachment.
async fn get_report_pdf(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(kind): ApiPath<String>,
    ValidatedQuery(params): ValidatedQuery<ReportParams>,
) -> ApiResult<Response> {
    let document = generate(&state, user.business_id(), &kind, params).await?;

    let business_name = UserRepository::new(state.db().await?)
        .find_by_id(user.business_id())
        .await?
        .map(|u| u.business_name)
        .unwrap_or_default();
    let filename = pdf_filename(&document);

    let pdf_header = PdfHeader { business_name };
    let bytes = tokio::task::spawn_blocking(move || render_pdf(&document, &pdf_header))
        .await
        .map_err(|e| ApiError::internal(format!("PDF task failed: {e}")))??;

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        bytes,
    )
        .into_response())
}

/// `sales-report-2024-01-01-to-2024-01-31.pdf`
fn pdf_filename(document: &ReportDocument) -> String {
    format!(
        "{}-report-{}-to-{}.pdf",
        document.kind, document.start_date, document.end_date
    )
}
