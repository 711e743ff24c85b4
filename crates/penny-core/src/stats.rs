//! Monthly statistics
//!
//! Everything here is pure and decimal-exact. Report numbers come from this
//! module only, never from model output.

use rust_decimal::Decimal;

use crate::models::{MonthlySummary, Transaction, TransactionKind};
use crate::money::{format_usd, normalize};

/// Top category name when there are no expenses
pub const NO_CATEGORY: &str = "none";

#[derive(Debug, Clone, PartialEq)]
pub struct StatisticsSnapshot {
    pub income_total: Decimal,
    pub expense_total: Decimal,
    pub net_total: Decimal,
    /// Expense sums per category, in first-encountered order
    pub category_breakdown: Vec<(String, Decimal)>,
    pub top_category: (String, Decimal),
    pub transaction_count: usize,
}

impl StatisticsSnapshot {
    /// Aggregate a list of transactions.
    ///
    /// The list is assumed to be scoped to one period already; rows outside it
    /// are summed like any other.
    pub fn compute(transactions: &[Transaction]) -> Self {
        let mut income_total = Decimal::ZERO;
        let mut expense_total = Decimal::ZERO;
        let mut category_breakdown: Vec<(String, Decimal)> = Vec::new();

        for tx in transactions {
            let amount = normalize(tx.amount);
            match tx.kind {
                TransactionKind::Income => income_total += amount,
                TransactionKind::Expense => {
                    expense_total += amount;
                    let name = tx.category.as_str();
                    match category_breakdown.iter_mut().find(|(c, _)| c == name) {
                        Some((_, sum)) => *sum += amount,
                        None => category_breakdown.push((name.to_string(), amount)),
                    }
                }
            }
        }

        let top_category = top_of(&category_breakdown);

        Self {
            income_total,
            expense_total,
            net_total: income_total - expense_total,
            category_breakdown,
            top_category,
            transaction_count: transactions.len(),
        }
    }

    pub fn summary(&self) -> MonthlySummary {
        MonthlySummary {
            income: normalize(self.income_total),
            expenses: normalize(self.expense_total),
            net: normalize(self.net_total),
        }
    }

    /// The four fixed insight lines shown with every report
    pub fn insight_lines(&self) -> Vec<String> {
        vec![
            format!("Total income: {}", format_usd(self.income_total)),
            format!("Total expenses: {}", format_usd(self.expense_total)),
            format!("Net result: {}", format_usd(self.net_total)),
            format!(
                "Top category: {} ({})",
                self.top_category.0,
                format_usd(self.top_category.1)
            ),
        ]
    }
}

// Strictly-greater scan: on a tie the earlier category keeps the top spot
fn top_of(breakdown: &[(String, Decimal)]) -> (String, Decimal) {
    let mut top: Option<&(String, Decimal)> = None;
    for entry in breakdown {
        if top.map_or(true, |t| entry.1 > t.1) {
            top = Some(entry);
        }
    }
    top.cloned()
        .unwrap_or_else(|| (NO_CATEGORY.to_string(), Decimal::ZERO))
}
