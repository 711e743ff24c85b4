//! Suggestion and monthly report handlers
//!
//! Text-generation failures never reach these handlers: the core pipelines
//! answer with the default suggestion or the fallback narrative instead.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use super::MonthQuery;
use crate::{AppError, AppState};
use penny_core::models::{CategorySuggestion, MonthlyReport};
use penny_core::suggest_category;

#[derive(Debug, Deserialize)]
pub struct SuggestRequest {
    pub description: String,
}

/// POST /api/v1/llm/suggest - Suggest a type and category for a description
pub async fn suggest(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SuggestRequest>,
) -> Result<Json<CategorySuggestion>, AppError> {
    let suggestion = suggest_category(state.reports.ai(), &request.description).await?;
    Ok(Json(suggestion))
}

/// GET|POST /api/v1/llm/reports/monthly - Generate the monthly report
pub async fn monthly_report(
    State(state): State<Arc<AppState>>,
    Query(params): Query<MonthQuery>,
) -> Result<Json<MonthlyReport>, AppError> {
    let report = state.reports.monthly_report(params.token()).await?;
    Ok(Json(report))
}
