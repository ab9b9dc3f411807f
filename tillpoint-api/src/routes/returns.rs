//! Return-processing endpoints
//!
//! # Endpoints
//!
//! - `POST /api/returns` - process a return (admin, cashier)
//! - `GET /api/returns` - return history (admin, cashier)
//!
//! Omitting `items` reverses the whole sale: the refund equals the amount
//! the customer paid, the refund method defaults to how they paid, stock
//! goes back on the shelf, and the transaction flips to `refunded`.
//! Listing specific items refunds just those lines at their snapshot
//! prices.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{extract::State, Extension, Json};
use serde::Deserialize;
use tillpoint_shared::auth::session::CurrentUser;
use tillpoint_shared::models::returns::Return;
use tillpoint_shared::models::transaction::PaymentMethod;
use tillpoint_shared::models::user::UserRole;
use tillpoint_shared::storage::{ReturnDraft, ReturnLine};
use uuid::Uuid;
use validator::Validate;

/// Return request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateReturnRequest {
    /// The sale being reversed
    pub transaction_id: Uuid,

    #[validate(length(min = 1, max = 255, message = "Reason must be 1-255 characters"))]
    pub reason: String,

    /// Defaults to the original payment method
    pub refund_method: Option<PaymentMethod>,

    pub notes: Option<String>,

    /// Absent = full return
    pub items: Option<Vec<ReturnLine>>,
}

/// Processes a return (admin, cashier)
///
/// # Errors
///
/// - `400 Bad Request`: already refunded, line not part of the sale,
///   returning more than was sold
/// - `404 Not Found`: unknown transaction
pub async fn create(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<CreateReturnRequest>,
) -> ApiResult<Json<Return>> {
    current.require_role(&[UserRole::Admin, UserRole::Cashier])?;
    req.validate().map_err(ApiError::from_validation)?;

    let return_record = state
        .storage
        .create_return(
            current.tenant_id(),
            current.user_id(),
            ReturnDraft {
                transaction_id: req.transaction_id,
                reason: req.reason,
                refund_method: req.refund_method,
                notes: req.notes,
                lines: req.items,
            },
        )
        .await?;

    Ok(Json(return_record))
}

/// Lists returns, newest first (admin, cashier)
pub async fn list(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> ApiResult<Json<Vec<Return>>> {
    current.require_role(&[UserRole::Admin, UserRole::Cashier])?;

    let returns = state.storage.returns(current.tenant_id()).await?;
    Ok(Json(returns))
}
