//! Error responses.
//!
//! Every failure leaves the API as the same JSON envelope:
//!
//! ```json
//! { "success": false, "error": "...", "code": "NOT_FOUND",
//!   "requestId": "...", "timestamp": "2024-01-01T00:00:00Z" }
//! ```
//!
//! The handler side does not know the request id; the envelope middleware
//! stamps it in afterwards from the [`ErrorEnvelope`] left in the response
//! extensions.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, warn};

use localfish_core::auth::PasswordError;
use localfish_core::reports::ReportError;
use localfish_core::storage::StorageError;
use localfish_db::RepositoryError;
use localfish_shared::{AppError, JwtError};

/// Result alias for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// Body of an error response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEnvelope {
    /// Always false.
    pub success: bool,
    /// Human readable message, safe to show to clients.
    pub error: String,
    /// Stable machine readable code.
    pub code: &'static str,
    /// Request id from `x-request-id`, stamped by the envelope middleware.
    pub request_id: Option<String>,
    /// When the error was produced.
    pub timestamp: DateTime<Utc>,
}

/// An [`AppError`] on its way out as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl ApiError {
    /// Builds the envelope for this error.
    #[must_use]
    pub fn envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope {
            success: false,
            error: self.0.public_message(),
            code: self.0.error_code(),
            request_id: None,
            timestamp: Utc::now(),
        }
    }

    /// Shorthand for a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self(AppError::Validation(msg.into()))
    }

    /// Shorthand for a forbidden error.
    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self(AppError::Forbidden(msg.into()))
    }

    /// Shorthand for an unauthorized error.
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self(AppError::Unauthorized(msg.into()))
    }

    /// Shorthand for an internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self(AppError::Internal(msg.into()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if self.0.is_server_error() {
            error!(code = self.0.error_code(), error = %self.0, "Request failed");
        } else {
            warn!(code = self.0.error_code(), error = %self.0, "Request rejected");
        }

        let envelope = self.envelope();
        let mut response = (status, Json(envelope.clone())).into_response();
        response.extensions_mut().insert(envelope);
        response
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        Self(err.into())
    }
}

impl From<sea_orm::DbErr> for ApiError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self(localfish_db::repositories::db_error(err))
    }
}

impl From<ReportError> for ApiError {
    fn from(err: ReportError) -> Self {
        match err {
            ReportError::Render(msg) => Self::internal(msg),
            other => Self::validation(other.to_string()),
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        if err.is_client_error() {
            Self::validation(err.to_string())
        } else {
            Self(AppError::ExternalService(err.to_string()))
        }
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        Self::internal(err.to_string())
    }
}

impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::EncodingError(msg) => Self::internal(msg),
            JwtError::Expired => Self::unauthorized("Token has expired"),
            JwtError::WrongKind | JwtError::DecodingError(_) => {
                Self::unauthorized("Invalid or malformed token")
            }
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use localfish_core::inventory::InventoryError;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[rstest]
    #[case(AppError::Validation("bad".into()), 400, "VALIDATION_ERROR")]
    #[case(AppError::Unauthorized("no".into()), 401, "UNAUTHORIZED")]
    #[case(AppError::Forbidden("no".into()), 403, "FORBIDDEN")]
    #[case(AppError::NotFound("Sale not found".into()), 404, "NOT_FOUND")]
    #[case(AppError::Conflict("dup".into()), 409, "CONFLICT")]
    #[case(AppError::BusinessRule("stock".into()), 422, "BUSINESS_RULE_VIOLATION")]
    #[case(AppError::Unavailable("down".into()), 503, "DATABASE_UNAVAILABLE")]
    #[case(AppError::Internal("boom".into()), 500, "INTERNAL_ERROR")]
    #[tokio::test]
    async fn test_status_and_code(
        #[case] err: AppError,
        #[case] status: u16,
        #[case] code: &str,
    ) {
        let response = ApiError(err).into_response();
        assert_eq!(response.status().as_u16(), status);

        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], code);
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_internal_details_are_hidden() {
        let response = ApiError::internal("password hash column is null").into_response();
        let body = body_json(response).await;
        assert_eq!(body["error"], "An unexpected error occurred");
    }

    #[test]
    fn test_envelope_is_left_for_the_middleware() {
        let response = ApiError::validation("bad").into_response();
        let envelope = response.extensions().get::<ErrorEnvelope>().unwrap();
        assert_eq!(envelope.code, "VALIDATION_ERROR");
        assert!(envelope.request_id.is_none());
    }

    #[test]
    fn test_insufficient_stock_is_business_rule() {
        let err: ApiError = RepositoryError::Inventory(InventoryError::InsufficientStock {
            available: dec!(2),
            requested: dec!(5),
        })
        .into();
        assert_eq!(err.0.status_code(), 422);
    }

    #[test]
    fn test_report_errors() {
        let err: ApiError = ReportError::UnknownKind("weekly".into()).into();
        assert_eq!(err.0.status_code(), 400);

        let err: ApiError = ReportError::Render("font".into()).into();
        assert_eq!(err.0.status_code(), 500);
    }

    #[test]
    fn test_storage_errors() {
        let err: ApiError = StorageError::EmptyFile.into();
        assert_eq!(err.0.status_code(), 400);

        let err: ApiError = StorageError::Http("timeout".into()).into();
        assert_eq!(err.0.error_code(), "EXTERNAL_SERVICE_ERROR");
    }

    #[test]
    fn test_expired_token_is_unauthorized() {
        let err: ApiError = JwtError::Expired.into();
        assert_eq!(err.0.status_code(), 401);
        assert_eq!(err.0.public_message(), "Token has expired");
    }
}
