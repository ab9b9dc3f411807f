//! Cash handover endpoints
//!
//! # Endpoints
//!
//! - `POST /api/handovers` - record an end-of-shift count (admin, cashier)
//! - `GET /api/handovers` - handover history (any role)
//! - `PUT /api/handovers/:id` - amend or submit a count (admin, cashier)
//!
//! The denomination breakdown is stored as an opaque JSON blob; the server
//! only computes with the aggregate amounts, and `difference_cents` is
//! always derived as `actual - expected` rather than taken from the
//! client.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use tillpoint_shared::auth::session::CurrentUser;
use tillpoint_shared::models::handover::{CashHandover, CreateHandover, UpdateHandover};
use tillpoint_shared::models::user::UserRole;
use uuid::Uuid;
use validator::Validate;

/// Handover creation request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateHandoverRequest {
    /// The shift being reconciled
    pub shift_date: DateTime<Utc>,

    /// What the register expects to be in the drawer, in cents
    #[validate(range(min = 0, message = "Expected amount cannot be negative"))]
    pub expected_cents: i64,

    /// What was actually counted, in cents
    #[validate(range(min = 0, message = "Actual amount cannot be negative"))]
    pub actual_cents: i64,

    /// Denomination → count mapping from the cash counter
    pub denominations: JsonValue,

    pub supervisor_id: Option<Uuid>,

    pub notes: Option<String>,

    /// Submit immediately instead of saving a draft count
    #[serde(default)]
    pub is_submitted: bool,
}

/// Records a handover (admin, cashier)
pub async fn create(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<CreateHandoverRequest>,
) -> ApiResult<Json<CashHandover>> {
    current.require_role(&[UserRole::Admin, UserRole::Cashier])?;
    req.validate().map_err(ApiError::from_validation)?;

    let handover = state
        .storage
        .create_handover(CreateHandover {
            tenant_id: current.tenant_id(),
            cashier_id: current.user_id(),
            supervisor_id: req.supervisor_id,
            shift_date: req.shift_date,
            expected_cents: req.expected_cents,
            actual_cents: req.actual_cents,
            denominations: req.denominations,
            notes: req.notes,
            is_submitted: req.is_submitted,
        })
        .await?;

    Ok(Json(handover))
}

/// Lists handovers, newest first
pub async fn list(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> ApiResult<Json<Vec<CashHandover>>> {
    let handovers = state.storage.handovers(current.tenant_id()).await?;
    Ok(Json(handovers))
}

/// Amends or submits a handover (admin, cashier)
pub async fn update(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateHandover>,
) -> ApiResult<Json<CashHandover>> {
    current.require_role(&[UserRole::Admin, UserRole::Cashier])?;

    let handover = state
        .storage
        .update_handover(current.tenant_id(), id, req)
        .await?
        .ok_or_else(|| ApiError::NotFound("Handover not found".to_string()))?;

    Ok(Json(handover))
}
