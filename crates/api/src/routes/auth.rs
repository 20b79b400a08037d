//! Authentication routes: register, login, token refresh, and the current
//! account's profile and password.
//!
//! Owners and workers share one login endpoint. Emails are unique across
//! both tables, so an address identifies exactly one account.

use axum::{
    Router,
    extract::State,
    routing::{get, post, put},
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::AppState;
use crate::error::{ApiError, ApiResult};
use crate::extractors::ValidatedJson;
use crate::middleware::AuthUser;
use crate::response::ApiResponse;
use localfish_core::auth::{Role, hash_password, verify_password};
use localfish_db::entities::{users, workers};
use localfish_db::{CreateUserInput, UserRepository, WorkerRepository};
use localfish_shared::{AppError, TokenKind, TokenPair};

/// Routes reachable without a token.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
}

/// Routes for the signed-in account.
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/me", get(me))
        .route("/auth/profile", put(update_profile))
        .route("/auth/password", put(change_password))
}

// ============================================================================
// Request / Response DTOs
// ============================================================================

/// Owner registration.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// Login email.
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    /// Plain password.
    #[validate(length(min = 8, max = 128, message = "Password must be 8 to 128 characters"))]
    pub password: String,
    /// Business name, unique across accounts.
    #[validate(length(min = 1, max = 255, message = "Business name is required"))]
    pub business_name: String,
    /// Contact phone.
    #[validate(length(max = 32))]
    pub phone_number: Option<String>,
}

/// Login for owners and workers.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Login email.
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    /// Plain password.
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Token refresh.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    /// A refresh token from login.
    #[validate(length(min = 1))]
    pub refresh_token: String,
}

/// Business profile changes (owner only).
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    /// New business name.
    #[validate(length(min = 1, max = 255))]
    pub business_name: Option<String>,
    /// New phone number.
    #[validate(length(max = 32))]
    pub phone_number: Option<String>,
}

/// Password change.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    /// Current password.
    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,
    /// New password.
    #[validate(length(min = 8, max = 128, message = "Password must be 8 to 128 characters"))]
    pub new_password: String,
}

/// The signed-in account.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountInfo {
    /// Account ID (owner or worker).
    pub id: Uuid,
    /// Login email.
    pub email: String,
    /// Business name for owners, full name for workers.
    pub name: String,
    /// Owner or worker.
    pub role: Role,
    /// The owning business.
    pub business_id: Uuid,
    /// The owning business's name.
    pub business_name: String,
    /// Phone number.
    pub phone_number: Option<String>,
    /// Job title (workers only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl AccountInfo {
    fn owner(user: &users::Model) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.business_name.clone(),
            role: Role::Owner,
            business_id: user.id,
            business_name: user.business_name.clone(),
            phone_number: user.phone_number.clone(),
            title: None,
        }
    }

    fn worker(worker: &workers::Model, business: &users::Model) -> Self {
        Self {
            id: worker.id,
            email: worker.email.clone(),
            name: worker.full_name.clone(),
            role: Role::Worker,
            business_id: business.id,
            business_name: business.business_name.clone(),
            phone_number: worker.phone_number.clone(),
            title: worker.title.clone(),
        }
    }
}

/// Account plus tokens.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    /// The account.
    pub account: AccountInfo,
    /// Access and refresh tokens.
    #[serde(flatten)]
    pub tokens: TokenPair,
}

fn invalid_credentials() -> ApiError {
    ApiError::unauthorized("Invalid email or password")
}

fn issue_tokens(state: &AppState, account: &AccountInfo) -> ApiResult<TokenPair> {
    Ok(state
        .jwt_service
        .generate_pair(account.id, account.business_id, account.role.as_str())?)
}

/// Loads an account by role and ID; inactive accounts count as missing.
async fn load_account(
    users: &UserRepository,
    workers: &WorkerRepository,
    role: Role,
    id: Uuid,
) -> ApiResult<Option<AccountInfo>> {
    match role {
        Role::Owner => Ok(users
            .find_by_id(id)
            .await?
            .filter(|u| u.is_active)
            .map(|u| AccountInfo::owner(&u))),
        Role::Worker => {
            let Some(worker) = workers.find_by_id(id).await?.filter(|w| w.is_active) else {
                return Ok(None);
            };
            let Some(business) = users.find_by_id(worker.user_id).await?.filter(|u| u.is_active)
            else {
                return Ok(None);
            };
            Ok(Some(AccountInfo::worker(&worker, &business)))
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/register - Create a business owner account.
async fn register(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<RegisterRequest>,
) -> ApiResult<ApiResponse<AuthResponse>> {
    let db = state.db().await?;
    let users = UserRepository::new(db.clone());
    let workers = WorkerRepository::new(db);

    if users.email_exists(&payload.email).await? || workers.email_exists(&payload.email).await? {
        return Err(AppError::Conflict("Email already registered".to_string()).into());
    }
    if users.business_name_taken(&payload.business_name, None).await? {
        return Err(AppError::Conflict("Business name already taken".to_string()).into());
    }

    let password_hash = hash_password(&payload.password)?;
    let user = users
        .create(CreateUserInput {
            email: payload.email,
            password_hash,
            business_name: payload.business_name,
            phone_number: super::non_empty(payload.phone_number),
        })
        .await?;

    info!(user_id = %user.id, "Business registered");

    let account = AccountInfo::owner(&user);
    let tokens = issue_tokens(&state, &account)?;
    Ok(ApiResponse::created(AuthResponse { account, tokens }).with_message("Registration successful"))
}

/// POST /auth/login - Authenticate an owner or a worker.
async fn login(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> ApiResult<ApiResponse<AuthResponse>> {
    let db = state.db().await?;
    let users = UserRepository::new(db.clone());
    let workers = WorkerRepository::new(db);

    let account = if let Some(user) = users.find_by_email(&payload.email).await? {
        if !verify_password(&payload.password, &user.password_hash)? {
            info!(user_id = %user.id, "Login with wrong password");
            return Err(invalid_credentials());
        }
        if !user.is_active {
            return Err(ApiError::forbidden("Account is deactivated"));
        }
        AccountInfo::owner(&user)
    } else if let Some(worker) = workers.find_by_email(&payload.email).await? {
        if !verify_password(&payload.password, &worker.password_hash)? {
            info!(worker_id = %worker.id, "Login with wrong password");
            return Err(invalid_credentials());
        }
        if !worker.is_active {
            return Err(ApiError::forbidden("Account is deactivated"));
        }
        let business = users
            .find_by_id(worker.user_id)
            .await?
            .filter(|u| u.is_active)
            .ok_or_else(|| ApiError::forbidden("Business account is deactivated"))?;
        AccountInfo::worker(&worker, &business)
    } else {
        info!("Login attempt for unknown email");
        return Err(invalid_credentials());
    };

    let tokens = issue_tokens(&state, &account)?;
    info!(account_id = %account.id, role = %account.role, "Logged in");
    Ok(ApiResponse::ok(AuthResponse { account, tokens }))
}

/// POST /auth/refresh - Exchange a refresh token for a new token pair.
async fn refresh(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<RefreshRequest>,
) -> ApiResult<ApiResponse<TokenPair>> {
    let claims = state
        .jwt_service
        .validate_token(&payload.refresh_token, TokenKind::Refresh)?;
    let role = Role::parse(&claims.role)
        .ok_or_else(|| ApiError::unauthorized("Invalid or malformed token"))?;

    let db = state.db().await?;
    let users = UserRepository::new(db.clone());
    let workers = WorkerRepository::new(db);
    let Some(account) = load_account(&users, &workers, role, claims.subject_id()).await? else {
        warn!(subject = %claims.subject_id(), "Refresh for missing or inactive account");
        return Err(ApiError::unauthorized("Account no longer active"));
    };

    Ok(ApiResponse::ok(issue_tokens(&state, &account)?))
}

/// GET /auth/me - The signed-in account.
async fn me(State(state): State<AppState>, user: AuthUser) -> ApiResult<ApiResponse<AccountInfo>> {
    let db = state.db().await?;
    let users = UserRepository::new(db.clone());
    let workers = WorkerRepository::new(db);

    load_account(&users, &workers, user.role(), user.subject_id())
        .await?
        .map(ApiResponse::ok)
        .ok_or_else(|| ApiError(AppError::not_found("Account")))
}

/// PUT /auth/profile - Change the business name or phone number.
async fn update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(payload): ValidatedJson<UpdateProfileRequest>,
) -> ApiResult<ApiResponse<AccountInfo>> {
    user.require(
        Role::can_update_business,
        "Only the business owner can update the profile",
    )?;

    let users = UserRepository::new(state.db().await?);
    if let Some(name) = &payload.business_name
        && users.business_name_taken(name, Some(user.business_id())).await?
    {
        return Err(AppError::Conflict("Business name already taken".to_string()).into());
    }

    let updated = users
        .update_profile(user.business_id(), payload.business_name, payload.phone_number)
        .await?;

    info!(user_id = %updated.id, "Business profile updated");
    Ok(ApiResponse::ok(AccountInfo::owner(&updated)).with_message("Profile updated"))
}

/// PUT /auth/password - Change the signed-in account's password.
async fn change_password(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(payload): ValidatedJson<ChangePasswordRequest>,
) -> ApiResult<ApiResponse<()>> {
    let db = state.db().await?;
    let users = UserRepository::new(db.clone());
    let workers = WorkerRepository::new(db);

    let current_hash = match user.role() {
        Role::Owner => users.find_by_id(user.subject_id()).await?.map(|u| u.password_hash),
        Role::Worker => workers.find_by_id(user.subject_id()).await?.map(|w| w.password_hash),
    }
    .ok_or_else(|| ApiError(AppError::not_found("Account")))?;

    if !verify_password(&payload.current_password, &current_hash)? {
        return Err(ApiError::validation("Current password is incorrect"));
    }

    let new_hash = hash_password(&payload.new_password)?;
    match user.role() {
        Role::Owner => users.update_password(user.subject_id(), &new_hash).await?,
        Role::Worker => workers.update_password(user.subject_id(), &new_hash).await?,
    }

    info!(account_id = %user.subject_id(), "Password changed");
    Ok(ApiResponse::message("Password updated"))
}
