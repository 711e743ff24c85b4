//! Transaction handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use tracing::info;

use super::MonthQuery;
use crate::{AppError, AppState};
use penny_core::models::{NewTransaction, Transaction, TransactionUpdate};
use penny_core::Period;

/// GET /api/v1/transactions - List a month's transactions (newest first)
pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
    Query(params): Query<MonthQuery>,
) -> Result<Json<Vec<Transaction>>, AppError> {
    let period = Period::resolve(params.token())?;
    let transactions = state
        .db()
        .list_transactions_between(period.first_day(), period.last_day())?;
    Ok(Json(transactions))
}

/// POST /api/v1/transactions - Create a transaction
pub async fn create_transaction(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<NewTransaction>,
) -> Result<(StatusCode, Json<Transaction>), AppError> {
    let created = state.db().insert_transaction(&payload)?;
    info!(id = created.id, kind = %created.kind, category = %created.category, "Transaction created");
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/v1/transactions/:id - Get a single transaction
pub async fn get_transaction(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Transaction>, AppError> {
    state
        .db()
        .get_transaction(id)?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Transaction not found"))
}

/// PUT /api/v1/transactions/:id - Partially update a transaction
pub async fn update_transaction(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(payload): Json<TransactionUpdate>,
) -> Result<Json<Transaction>, AppError> {
    let updated = state
        .db()
        .update_transaction(id, &payload)?
        .ok_or_else(|| AppError::not_found("Transaction not found"))?;
    info!(id, "Transaction updated");
    Ok(Json(updated))
}

/// DELETE /api/v1/transactions/:id - Delete a transaction
pub async fn delete_transaction(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    if state.db().delete_transaction(id)? {
        info!(id, "Transaction deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("Transaction not found"))
    }
}
