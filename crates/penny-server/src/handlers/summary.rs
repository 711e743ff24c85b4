//! Monthly summary handler

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};

use super::MonthQuery;
use crate::{AppError, AppState};
use penny_core::models::MonthlySummary;

/// GET /api/v1/summary - Income, expense and net totals for a month
pub async fn month_summary(
    State(state): State<Arc<AppState>>,
    Query(params): Query<MonthQuery>,
) -> Result<Json<MonthlySummary>, AppError> {
    Ok(Json(state.reports.monthly_summary(params.token())?))
}
