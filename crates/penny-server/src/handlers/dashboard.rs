//! Server-rendered dashboard pages

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::Html,
};
use serde::Serialize;

use super::MonthQuery;
use crate::views::{self, IndexPage, TransactionsPage};
use crate::{AppError, AppState};

/// GET / - Income and expense lists with month totals
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    Query(params): Query<MonthQuery>,
) -> Result<Html<String>, AppError> {
    let (period, transactions, stats) = state.reports.month_detail(params.token())?;
    render(&state, views::INDEX, &IndexPage::new(&period, &transactions, &stats))
}

/// GET /transactions - Every transaction of the month
pub async fn transactions_page(
    State(state): State<Arc<AppState>>,
    Query(params): Query<MonthQuery>,
) -> Result<Html<String>, AppError> {
    let (period, transactions, stats) = state.reports.month_detail(params.token())?;
    render(
        &state,
        views::TRANSACTIONS,
        &TransactionsPage::new(&period, &transactions, &stats),
    )
}

fn render<T: Serialize>(state: &AppState, name: &str, page: &T) -> Result<Html<String>, AppError> {
    state
        .templates
        .render(name, page)
        .map(Html)
        .map_err(AppError::internal)
}
