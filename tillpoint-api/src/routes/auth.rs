//! Authentication endpoints
//!
//! # Endpoints
//!
//! - `POST /api/auth/login` - authenticate against a shop and get a token
//! - `GET /api/auth/me` - the logged-in user and their shop
//!
//! Login takes the shop id (the tenant's subdomain), a username, and a
//! password. Unknown shop, unknown user, deactivated account, and wrong
//! password all answer with the same 400 so the response never reveals
//! which part was wrong.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};
use tillpoint_shared::auth::{jwt, password, session::CurrentUser};
use tillpoint_shared::models::tenant::Tenant;
use tillpoint_shared::models::user::{User, UserRole};
use uuid::Uuid;
use validator::Validate;

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// The shop's subdomain
    #[validate(length(min = 1, message = "Shop ID is required"))]
    pub shop_id: String,

    /// Username within the shop
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,

    /// Password
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// The user fields clients are allowed to see
#[derive(Debug, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: UserRole,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            role: user.role,
        }
    }
}

/// The tenant fields clients need for theming and display
#[derive(Debug, Serialize, Deserialize)]
pub struct TenantProfile {
    pub id: Uuid,
    pub name: String,
    pub subdomain: String,
    pub primary_color: String,
}

impl From<&Tenant> for TenantProfile {
    fn from(tenant: &Tenant) -> Self {
        Self {
            id: tenant.id,
            name: tenant.name.clone(),
            subdomain: tenant.subdomain.clone(),
            primary_color: tenant.primary_color.clone(),
        }
    }
}

/// Login response
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Bearer token, good for 24 hours
    pub token: String,

    /// The logged-in user
    pub user: UserProfile,

    /// The shop they logged into
    pub tenant: TenantProfile,
}

/// Current-session response
#[derive(Debug, Serialize)]
pub struct MeResponse {
    /// The authenticated user
    pub user: UserProfile,

    /// Their shop, full record
    pub tenant: Tenant,
}

/// Login endpoint
///
/// # Endpoint
///
/// ```text
/// POST /api/auth/login
/// Content-Type: application/json
///
/// {
///   "shop_id": "demo",
///   "username": "admin",
///   "password": "admin123"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: invalid credentials (shop, user, or password)
/// - `422 Unprocessable Entity`: missing fields
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    req.validate().map_err(ApiError::from_validation)?;

    let tenant = state
        .storage
        .tenant_by_subdomain(&req.shop_id)
        .await?
        .filter(|t| t.is_active)
        .ok_or_else(ApiError::invalid_credentials)?;

    let user = state
        .storage
        .user_by_username(tenant.id, &req.username)
        .await?
        .filter(|u| u.is_active)
        .ok_or_else(ApiError::invalid_credentials)?;

    let valid = password::verify_password(&req.password, &user.password_hash)?;
    if !valid {
        return Err(ApiError::invalid_credentials());
    }

    let claims = jwt::Claims::new(user.id, user.tenant_id, user.role);
    let token = jwt::create_token(&claims, state.jwt_secret())?;

    tracing::info!(user_id = %user.id, tenant_id = %tenant.id, "User logged in");

    Ok(Json(LoginResponse {
        token,
        user: UserProfile::from(&user),
        tenant: TenantProfile::from(&tenant),
    }))
}

/// Current-session endpoint
///
/// # Endpoint
///
/// ```text
/// GET /api/auth/me
/// Authorization: Bearer <token>
/// ```
pub async fn me(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> ApiResult<Json<MeResponse>> {
    let tenant = state
        .storage
        .tenant_by_id(current.tenant_id())
        .await?
        .ok_or_else(|| ApiError::NotFound("tenant not found".to_string()))?;

    Ok(Json(MeResponse {
        user: UserProfile::from(&current.user),
        tenant,
    }))
}
