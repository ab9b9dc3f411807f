//! Staff management endpoints
//!
//! # Endpoints
//!
//! - `GET /api/users` - list the shop's staff (admin)
//! - `POST /api/users` - create an account (admin)
//!
//! Passwords arrive in plaintext over TLS and are hashed with Argon2id
//! before they reach storage; the hash never appears in any response.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{extract::State, Extension, Json};
use serde::Deserialize;
use tillpoint_shared::auth::{password, session::CurrentUser};
use tillpoint_shared::models::user::{CreateUser, User, UserRole};
use validator::Validate;

/// User creation request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 1, max = 100, message = "Username must be 1-100 characters"))]
    pub username: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    #[validate(length(max = 100, message = "First name must be at most 100 characters"))]
    pub first_name: Option<String>,

    #[validate(length(max = 100, message = "Last name must be at most 100 characters"))]
    pub last_name: Option<String>,

    /// Defaults to `staff`
    pub role: Option<UserRole>,
}

/// Lists the shop's staff (admin only)
pub async fn list(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> ApiResult<Json<Vec<User>>> {
    current.require_role(&[UserRole::Admin])?;

    let users = state.storage.users_by_tenant(current.tenant_id()).await?;
    Ok(Json(users))
}

/// Creates a staff account (admin only)
///
/// # Errors
///
/// - `403 Forbidden`: caller is not an admin
/// - `409 Conflict`: username already taken in this shop
pub async fn create(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<CreateUserRequest>,
) -> ApiResult<Json<User>> {
    current.require_role(&[UserRole::Admin])?;
    req.validate().map_err(ApiError::from_validation)?;

    let password_hash = password::hash_password(&req.password)?;

    let user = state
        .storage
        .create_user(CreateUser {
            tenant_id: current.tenant_id(),
            username: req.username,
            email: req.email,
            password_hash,
            first_name: req.first_name,
            last_name: req.last_name,
            role: req.role,
        })
        .await?;

    tracing::info!(user_id = %user.id, role = user.role.as_str(), "Staff account created");

    Ok(Json(user))
}
