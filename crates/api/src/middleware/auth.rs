//! Authentication middleware for protected routes.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use crate::AppState;
use crate::error::ApiError;
use localfish_core::auth::Role;
use localfish_shared::{Claims, TokenKind};

/// Extracts the bearer token from the Authorization header.
fn extract_bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
}

/// Authentication middleware that validates access tokens.
///
/// This middleware:
/// 1. Extracts the Bearer token from the Authorization header
/// 2. Validates it as an access token (refresh tokens are rejected)
/// 3. Stores the claims in request extensions for handlers to access
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let Some(token) = auth_header.and_then(extract_bearer_token) else {
        return ApiError::unauthorized("Authorization header with Bearer token is required")
            .into_response();
    };

    match state.jwt_service.validate_token(token, TokenKind::Access) {
        Ok(claims) => {
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// Extractor for the authenticated account.
///
/// `subject_id` is the acting account (owner or worker); `business_id` is
/// the owner account every record belongs to.
#[derive(Debug, Clone)]
pub struct AuthUser {
    claims: Claims,
    role: Role,
}

impl AuthUser {
    /// Returns the acting account's ID.
    #[must_use]
    pub const fn subject_id(&self) -> Uuid {
        self.claims.subject_id()
    }

    /// Returns the business (owner account) ID.
    #[must_use]
    pub const fn business_id(&self) -> Uuid {
        self.claims.business_id()
    }

    /// Returns the account's role.
    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    /// Fails with 403 unless the role passes `check`.
    pub fn require(&self, check: fn(&Role) -> bool, message: &str) -> Result<(), ApiError> {
        if check(&self.role) {
            Ok(())
        } else {
            Err(ApiError::forbidden(message))
        }
    }

    /// Fails with 403 unless the account is the business owner.
    pub fn require_owner(&self) -> Result<(), ApiError> {
        self.require(Role::can_manage_workers, "Only the business owner can do this")
    }

    /// Fails with 403 unless the role may delete records.
    pub fn require_delete(&self) -> Result<(), ApiError> {
        self.require(
            Role::can_delete_records,
            "Only the business owner can delete records",
        )
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let claims = parts
            .extensions
            .get::<Claims>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;
        let role = Role::parse(&claims.role)
            .ok_or_else(|| ApiError::unauthorized("Invalid or malformed token"))?;

        Ok(Self { claims, role })
    }
}
