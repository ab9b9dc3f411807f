//! Reporting endpoints
//!
//! # Endpoints
//!
//! - `GET /api/reports/sales?start_date=2026-01-01&end_date=2026-01-31`
//!
//! Returns one row per day of completed sales in the range. Both endpoint
//! dates are inclusive.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use tillpoint_shared::auth::session::CurrentUser;
use tillpoint_shared::storage::SalesReportRow;

/// Sales report query parameters
#[derive(Debug, Deserialize)]
pub struct SalesReportQuery {
    /// First day of the range (inclusive), `YYYY-MM-DD`
    pub start_date: NaiveDate,

    /// Last day of the range (inclusive), `YYYY-MM-DD`
    pub end_date: NaiveDate,
}

/// Per-day totals of completed sales over a date range
pub async fn sales(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(query): Query<SalesReportQuery>,
) -> ApiResult<Json<Vec<SalesReportRow>>> {
    if query.start_date > query.end_date {
        return Err(ApiError::BadRequest(
            "start_date must not be after end_date".to_string(),
        ));
    }

    let start = query.start_date.and_time(NaiveTime::MIN).and_utc();
    // inclusive end date → exclusive bound at the following midnight
    let end = (query.end_date + chrono::Duration::days(1))
        .and_time(NaiveTime::MIN)
        .and_utc();

    let rows = state
        .storage
        .sales_report(current.tenant_id(), start, end)
        .await?;

    Ok(Json(rows))
}
