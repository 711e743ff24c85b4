//! Dashboard page models and templates
//!
//! Templates are compiled into the binary. Amounts are preformatted so the
//! templates stay logic-free.

use handlebars::Handlebars;
use serde::Serialize;

use penny_core::models::{Transaction, TransactionKind};
use penny_core::money::format_usd;
use penny_core::{Period, StatisticsSnapshot};

pub const INDEX: &str = "index";
pub const TRANSACTIONS: &str = "transactions";

/// Build the template registry
pub fn registry() -> anyhow::Result<Handlebars<'static>> {
    let mut hb = Handlebars::new();
    hb.set_strict_mode(true);
    hb.register_template_string(INDEX, include_str!("../templates/index.hbs"))?;
    hb.register_template_string(TRANSACTIONS, include_str!("../templates/transactions.hbs"))?;
    Ok(hb)
}

#[derive(Debug, Serialize)]
pub struct Row {
    pub id: i64,
    pub date: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub category: String,
    pub amount: String,
    pub description: String,
}

impl From<&Transaction> for Row {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: tx.id,
            date: tx.date.to_string(),
            kind: tx.kind.to_string(),
            category: tx.category.to_string(),
            amount: format_usd(tx.amount),
            description: tx.description.clone().unwrap_or_default(),
        }
    }
}

/// Month navigation and totals shared by both pages
#[derive(Debug, Serialize)]
pub struct MonthHeader {
    pub month: String,
    pub month_label: String,
    pub prev_month: String,
    pub next_month: String,
    pub income_total: String,
    pub expense_total: String,
    pub net_total: String,
}

impl MonthHeader {
    pub fn new(period: &Period, stats: &StatisticsSnapshot) -> Self {
        Self {
            month: period.token(),
            month_label: period.label(),
            prev_month: period.prev().token(),
            next_month: period.next().token(),
            income_total: format_usd(stats.income_total),
            expense_total: format_usd(stats.expense_total),
            net_total: format_usd(stats.net_total),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct IndexPage {
    #[serde(flatten)]
    pub header: MonthHeader,
    pub incomes: Vec<Row>,
    pub expenses: Vec<Row>,
}

impl IndexPage {
    pub fn new(period: &Period, transactions: &[Transaction], stats: &StatisticsSnapshot) -> Self {
        let rows_of = |kind: TransactionKind| -> Vec<Row> {
            transactions
                .iter()
                .filter(|t| t.kind == kind)
                .map(Row::from)
                .collect()
        };
        Self {
            header: MonthHeader::new(period, stats),
            incomes: rows_of(TransactionKind::Income),
            expenses: rows_of(TransactionKind::Expense),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TransactionsPage {
    #[serde(flatten)]
    pub header: MonthHeader,
    pub transactions: Vec<Row>,
}

impl TransactionsPage {
    pub fn new(period: &Period, transactions: &[Transaction], stats: &StatisticsSnapshot) -> Self {
        Self {
            header: MonthHeader::new(period, stats),
            transactions: transactions.iter().map(Row::from).collect(),
        }
    }
}
