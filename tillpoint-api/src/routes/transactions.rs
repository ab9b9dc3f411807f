//! Checkout and sale-history endpoints
//!
//! # Endpoints
//!
//! - `POST /api/transactions` - ring up a sale (admin, cashier)
//! - `GET /api/transactions?limit=N` - recent sales, newest first
//! - `GET /api/transactions/:id` - one sale with its line items
//!
//! Checkout sends product ids and quantities only. The server snapshots
//! unit prices from the catalog, computes subtotal, the 12.5% tax, and the
//! total, and commits the whole sequence atomically: stock is checked
//! before it is decremented, and a failing line aborts the entire sale. An
//! optional `idempotency_key` makes resubmission safe; the original sale
//! comes back instead of a second charge.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use tillpoint_shared::auth::session::CurrentUser;
use tillpoint_shared::models::transaction::{PaymentMethod, Transaction, TransactionItem};
use tillpoint_shared::models::user::UserRole;
use tillpoint_shared::storage::{SaleDraft, SaleLine, SaleReceipt};
use uuid::Uuid;
use validator::Validate;

/// Checkout request
#[derive(Debug, Deserialize, Validate)]
pub struct CheckoutRequest {
    /// Cart lines; quantities are validated by the storage layer
    #[validate(length(min = 1, message = "A sale needs at least one line"))]
    pub items: Vec<SaleLine>,

    #[validate(length(max = 255, message = "Customer name must be at most 255 characters"))]
    pub customer_name: Option<String>,

    /// Floor attendant credited on the sale; must work in this shop
    pub attendant_id: Option<Uuid>,

    pub payment_method: PaymentMethod,

    #[validate(range(min = 0, message = "Discount cannot be negative"))]
    pub discount_cents: Option<i64>,

    /// Client-generated key making the submission idempotent
    #[validate(length(min = 1, max = 100, message = "Idempotency key must be 1-100 characters"))]
    pub idempotency_key: Option<String>,

    pub notes: Option<String>,
}

/// Listing query parameters
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Maximum number of transactions to return (default 50)
    pub limit: Option<i64>,
}

/// One sale with its line items
#[derive(Debug, Serialize)]
pub struct TransactionDetail {
    pub transaction: Transaction,
    pub items: Vec<TransactionItem>,
}

/// Checkout endpoint (admin, cashier)
///
/// # Endpoint
///
/// ```text
/// POST /api/transactions
/// Authorization: Bearer <token>
/// Content-Type: application/json
///
/// {
///   "items": [{"product_id": "...", "quantity": 2}],
///   "payment_method": "cash",
///   "idempotency_key": "till1-000123"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: insufficient stock, unknown product, bad quantity
/// - `403 Forbidden`: caller is not an admin or cashier
pub async fn create(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<CheckoutRequest>,
) -> ApiResult<Json<SaleReceipt>> {
    current.require_role(&[UserRole::Admin, UserRole::Cashier])?;
    req.validate().map_err(ApiError::from_validation)?;

    let receipt = state
        .storage
        .create_sale(
            current.tenant_id(),
            current.user_id(),
            SaleDraft {
                customer_name: req.customer_name,
                attendant_id: req.attendant_id,
                payment_method: req.payment_method,
                discount_cents: req.discount_cents.unwrap_or(0),
                idempotency_key: req.idempotency_key,
                notes: req.notes,
                lines: req.items,
            },
        )
        .await?;

    Ok(Json(receipt))
}

/// Lists recent transactions, newest first
pub async fn list(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<Transaction>>> {
    let limit = query.limit.unwrap_or(50).clamp(1, 500);
    let transactions = state.storage.transactions(current.tenant_id(), limit).await?;
    Ok(Json(transactions))
}

/// Fetches one transaction with its items
pub async fn by_id(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<TransactionDetail>> {
    let transaction = state
        .storage
        .transaction_by_id(current.tenant_id(), id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Transaction not found".to_string()))?;

    let items = state
        .storage
        .transaction_items(current.tenant_id(), id)
        .await?;

    Ok(Json(TransactionDetail { transaction, items }))
}
