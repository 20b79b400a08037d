//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes under `/api`
//! - Authentication and error-envelope middleware
//! - Validating request extractors
//! - Success and error response envelopes

pub mod error;
pub mod extractors;
pub mod middleware;
pub mod response;
pub mod routes;

use std::sync::Arc;

use axum::{Router, http::header::AUTHORIZATION};
use sea_orm::DatabaseConnection;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::sensitive_headers::SetSensitiveRequestHeadersLayer;
use tower_http::trace::TraceLayer;

use error::{ApiError, ApiResult};
use localfish_core::storage::MediaStorage;
use localfish_db::ConnectionCache;
use localfish_shared::{AppError, EmailService, JwtService};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Cached database handle.
    pub db: ConnectionCache,
    /// JWT service for token operations.
    pub jwt_service: Arc<JwtService>,
    /// Email service for worker invitations.
    pub email_service: Arc<EmailService>,
    /// Cloudinary media storage (optional).
    pub media: Option<Arc<MediaStorage>>,
}

impl AppState {
    /// Returns the database handle, connecting if needed.
    pub async fn db(&self) -> ApiResult<DatabaseConnection> {
        Ok(self.db.get().await?)
    }

    /// Returns the media storage or fails when uploads are not configured.
    pub fn media(&self) -> ApiResult<Arc<MediaStorage>> {
        self.media.clone().ok_or_else(|| {
            ApiError(AppError::ExternalService(
                "Media storage is not configured".to_string(),
            ))
        })
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api", routes::api_routes_with_state(state.clone()))
        .fallback(routes::not_found)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::envelope_middleware,
        ))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(SetSensitiveRequestHeadersLayer::new([AUTHORIZATION]))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                ),
        )
        .with_state(state)
}
