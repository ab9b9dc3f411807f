//! Dashboard endpoints
//!
//! # Endpoints
//!
//! - `GET /api/dashboard/kpis` - today's headline numbers
//!
//! Aggregates are computed per request; there is no caching layer in
//! front of them.

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Extension, Json};
use tillpoint_shared::auth::session::CurrentUser;
use tillpoint_shared::storage::DashboardKpis;

/// Today's sales total, transaction count, low-stock count, and active
/// staff count for the caller's shop
pub async fn kpis(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> ApiResult<Json<DashboardKpis>> {
    let kpis = state.storage.dashboard_kpis(current.tenant_id()).await?;
    Ok(Json(kpis))
}
