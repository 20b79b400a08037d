//! Error envelope stamping.
//!
//! Runs inside the request-id layer. For every response that carries an
//! [`ErrorEnvelope`] it writes the request id into the body, and for
//! `DATABASE_UNAVAILABLE` it drops the cached connection so the next request
//! reconnects.

use axum::{
    body::Body,
    extract::{Request, State},
    http::header::CONTENT_LENGTH,
    middleware::Next,
    response::Response,
};

use crate::AppState;
use crate::error::ErrorEnvelope;

/// Header carrying the request id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Stamps `requestId` into error envelopes.
pub async fn envelope_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::to_owned);

    let mut response = next.run(request).await;

    let Some(mut envelope) = response.extensions_mut().remove::<ErrorEnvelope>() else {
        return response;
    };

    if envelope.code == "DATABASE_UNAVAILABLE" {
        state.db.invalidate().await;
    }

    envelope.request_id = request_id;
    let (mut parts, body) = response.into_parts();
    match serde_json::to_vec(&envelope) {
        Ok(bytes) => {
            parts.headers.remove(CONTENT_LENGTH);
            Response::from_parts(parts, Body::from(bytes))
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize error envelope");
            Response::from_parts(parts, body)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use axum::{Router, http::StatusCode, routing::get};
    use http_body_util::BodyExt;
    use sea_orm::DatabaseConnection;
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::error::ApiError;
    use localfish_db::ConnectionCache;
    use localfish_shared::config::EmailConfig;
    use localfish_shared::{AppError, EmailService, JwtConfig, JwtService};

    fn counting_state() -> (AppState, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let db = ConnectionCache::with_connector(Duration::from_secs(300), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Ok(DatabaseConnection::Disconnected) }
        });
        let state = AppState {
            db,
            jwt_service: Arc::new(JwtService::new(JwtConfig::default())),
            email_service: Arc::new(EmailService::new(EmailConfig::default())),
            media: None,
        };
        (state, calls)
    }

    fn app(state: AppState) -> Router {
        Router::new()
            .route(
                "/down",
                get(|| async { ApiError(AppError::Unavailable("connection reset".into())) }),
            )
            .route(
                "/missing",
                get(|| async { ApiError(AppError::NotFound("Sale".into())) }),
            )
            .layer(axum::middleware::from_fn_with_state(
                state.clone(),
                envelope_middleware,
            ))
            .with_state(state)
    }

    fn request(uri: &str) -> Request {
        Request::builder()
            .uri(uri)
            .header(REQUEST_ID_HEADER, "req-42")
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_unavailable_drops_cached_connection() {
        let (state, calls) = counting_state();
        state.db.get().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let response = app(state.clone()).oneshot(request("/down")).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        state.db.get().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_other_errors_keep_connection() {
        let (state, calls) = counting_state();
        state.db.get().await.unwrap();

        let response = app(state.clone()).oneshot(request("/missing")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        state.db.get().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_request_id_written_into_body() {
        let (state, _) = counting_state();

        let response = app(state).oneshot(request("/missing")).await.unwrap();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(body["requestId"], "req-42");
        assert_eq!(body["code"], "NOT_FOUND");
    }
}
