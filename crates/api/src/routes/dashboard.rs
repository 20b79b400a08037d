//! Dashboard aggregates.

use axum::{Router, extract::State, routing::get};
use chrono::Utc;

use crate::AppState;
use crate::error::ApiResult;
use crate::middleware::AuthUser;
use crate::response::ApiResponse;
use localfish_core::reports::{DashboardStats, ReportService};
use localfish_db::ReportRepository;

/// Creates the dashboard router.
pub fn routes() -> Router<AppState> {
    Router::new().route("/dashboard/stats", get(get_stats))
}

/// GET /dashboard/stats - Today, this month, stock alerts, recent sales.
async fn get_stats(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<ApiResponse<DashboardStats>> {
    let repo = ReportRepository::new(state.db().await?);
    let today = Utc::now().date_naive();
    let input = repo.dashboard_input(user.business_id(), today).await?;
    Ok(ApiResponse::ok(ReportService::dashboard_stats(input)))
}
