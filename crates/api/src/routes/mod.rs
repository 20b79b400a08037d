//! API route definitions.

use axum::{Router, middleware};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use validator::{Validate, ValidationError};

use crate::error::{ApiError, ApiResult};
use crate::{AppState, middleware::auth::auth_middleware};
use localfish_core::inventory::QUANTITY_SCALE;
use localfish_core::sales::MONEY_SCALE;
use localfish_shared::AppError;
use localfish_shared::types::PageRequest;

pub mod auth;
pub mod contacts;
pub mod dashboard;
pub mod deposits;
pub mod expense_categories;
pub mod expenses;
pub mod health;
pub mod product_categories;
pub mod products;
pub mod reports;
pub mod sales;
pub mod stock;
pub mod transactions;
mod upload;
pub mod workers;

/// Creates the API router; everything except health and the public auth
/// endpoints sits behind [`auth_middleware`].
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    let protected_routes = Router::new()
        .merge(auth::protected_routes())
        .merge(workers::routes())
        .merge(product_categories::routes())
        .merge(products::routes())
        .merge(stock::routes())
        .merge(sales::routes())
        .merge(contacts::routes())
        .merge(expense_categories::routes())
        .merge(expenses::routes())
        .merge(deposits::routes())
        .merge(transactions::routes())
        .merge(dashboard::routes())
        .merge(reports::routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(health::routes())
        .merge(auth::public_routes())
        .merge(protected_routes)
}

/// Fallback for unknown paths.
pub async fn not_found() -> ApiError {
    ApiError(AppError::NotFound("Route not found".to_string()))
}

/// `?page=&perPage=` for lists without other filters.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    /// Page number (1-indexed).
    #[validate(range(min = 1))]
    pub page: Option<u32>,
    /// Items per page.
    #[validate(range(min = 1, max = 100))]
    pub per_page: Option<u32>,
}

impl PageQuery {
    /// The normalized page request.
    #[must_use]
    pub fn page(&self) -> PageRequest {
        page_request(self.page, self.per_page)
    }
}

/// Page parameters from optional query values.
pub(crate) fn page_request(page: Option<u32>, per_page: Option<u32>) -> PageRequest {
    let defaults = PageRequest::default();
    PageRequest {
        page: page.unwrap_or(defaults.page),
        per_page: per_page.unwrap_or(defaults.per_page),
    }
    .normalized()
}

/// Rejects a date filter whose start lies after its end.
pub(crate) fn check_range(from: Option<NaiveDate>, to: Option<NaiveDate>) -> ApiResult<()> {
    match (from, to) {
        (Some(from), Some(to)) if from > to => Err(ApiError::validation(
            "dateFrom must not be after dateTo",
        )),
        _ => Ok(()),
    }
}

/// Trims a string and drops it when empty.
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn positive(value: &Decimal) -> Result<(), ValidationError> {
    if *value > Decimal::ZERO {
        Ok(())
    } else {
        Err(ValidationError::new("positive").with_message("must be greater than zero".into()))
    }
}

fn non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if *value >= Decimal::ZERO {
        Ok(())
    } else {
        Err(ValidationError::new("non_negative").with_message("must not be negative".into()))
    }
}

fn non_zero(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_zero() {
        Err(ValidationError::new("non_zero").with_message("must not be zero".into()))
    } else {
        Ok(())
    }
}

fn scale(value: &Decimal, places: u32) -> Result<(), ValidationError> {
    if value.round_dp(places) == *value {
        Ok(())
    } else {
        Err(ValidationError::new("scale")
            .with_message(format!("must have at most {places} decimal places").into()))
    }
}

/// Field rule: a price or amount of zero or more, in whole cents.
pub(crate) fn money(value: &Decimal) -> Result<(), ValidationError> {
    non_negative(value)?;
    scale(value, MONEY_SCALE)
}

/// Field rule: an amount greater than zero, in whole cents.
pub(crate) fn positive_money(value: &Decimal) -> Result<(), ValidationError> {
    positive(value)?;
    scale(value, MONEY_SCALE)
}

/// Field rule: a stock level of zero or more.
pub(crate) fn stock_level(value: &Decimal) -> Result<(), ValidationError> {
    non_negative(value)?;
    scale(value, QUANTITY_SCALE)
}

/// Field rule: a quantity greater than zero.
pub(crate) fn positive_quantity(value: &Decimal) -> Result<(), ValidationError> {
    positive(value)?;
    scale(value, QUANTITY_SCALE)
}

/// Field rule: a signed quantity other than zero.
pub(crate) fn quantity_delta(value: &Decimal) -> Result<(), ValidationError> {
    non_zero(value)?;
    scale(value, QUANTITY_SCALE)
}
