//! AI backend request types
//!
//! These types are backend-agnostic and used across all AI implementations.

use std::collections::HashMap;
use std::time::Duration;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::model_router::{ModelRouter, TaskType};
use crate::models::Transaction;
use crate::money::format_usd;
use crate::stats::StatisticsSnapshot;

/// Most transactions quoted to the model as context
pub const MAX_CONTEXT_LINES: usize = 50;

/// Everything a backend may say about a month.
///
/// Totals are copied from the statistics snapshot so the model quotes the
/// same numbers the insight lines show.
#[derive(Debug, Clone, Serialize)]
pub struct ReportFacts {
    /// Period token, e.g. `2025-09`
    pub month: String,
    /// Display label, e.g. `September, 2025`
    pub month_label: String,
    pub income_total: Decimal,
    pub expense_total: Decimal,
    pub net_total: Decimal,
    pub top_category: String,
    pub top_category_amount: Decimal,
    pub transaction_count: usize,
    /// One line per transaction, capped at `MAX_CONTEXT_LINES`
    pub transactions: Vec<String>,
}

impl ReportFacts {
    pub fn new(
        month: String,
        month_label: String,
        stats: &StatisticsSnapshot,
        transactions: &[Transaction],
    ) -> Self {
        Self {
            month,
            month_label,
            income_total: stats.income_total,
            expense_total: stats.expense_total,
            net_total: stats.net_total,
            top_category: stats.top_category.0.clone(),
            top_category_amount: stats.top_category.1,
            transaction_count: stats.transaction_count,
            transactions: transactions
                .iter()
                .take(MAX_CONTEXT_LINES)
                .map(context_line)
                .collect(),
        }
    }

    /// Template variables for the `monthly_report` prompt
    pub fn prompt_vars(&self) -> HashMap<&'static str, String> {
        let mut vars = HashMap::new();
        vars.insert("month", self.month.clone());
        vars.insert("month_label", self.month_label.clone());
        vars.insert("income", format_usd(self.income_total));
        vars.insert("expenses", format_usd(self.expense_total));
        vars.insert("net", format_usd(self.net_total));
        vars.insert("top_category", self.top_category.clone());
        vars.insert("top_amount", format_usd(self.top_category_amount));
        vars.insert("count", self.transaction_count.to_string());
        vars.insert("transactions", self.transactions.join("\n"));
        vars
    }
}

// No money figure appears here: amounts in the prompt come from the snapshot
fn context_line(tx: &Transaction) -> String {
    match tx.description.as_deref().map(str::trim) {
        Some(desc) if !desc.is_empty() => {
            format!("- {} {} {}: {}", tx.date, tx.kind, tx.category, desc)
        }
        _ => format!("- {} {} {}", tx.date, tx.kind, tx.category),
    }
}

/// Sampling settings for one generation call
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOptions {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    pub timeout: Duration,
}

impl GenerationOptions {
    /// Resolve a task's configured sampling against a backend's default model
    pub fn for_task(router: &ModelRouter, task: TaskType, default_model: &str) -> Self {
        let config = router.config_for_task(task);
        Self {
            model: config.model_or(default_model).to_string(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            timeout: config.timeout,
        }
    }
}
