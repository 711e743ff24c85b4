//! Integration tests for penny-core
//!
//! These tests exercise the full store → statistics → report workflow.

use std::str::FromStr;

use chrono::NaiveDate;
use penny_core::{
    db::Database,
    models::{Category, NarrativeSource, NewTransaction, TransactionKind},
    report::NO_DATA_INSIGHT,
    AIClient, MockBackend, OllamaBackend, Period, ReportAssembler, StatisticsSnapshot, TransactionStore,
};
use rust_decimal::Decimal;

fn add(db: &Database, date: &str, kind: TransactionKind, category: Category, amount: &str) {
    db.insert_transaction(&NewTransaction {
        date: NaiveDate::from_str(date).unwrap(),
        kind,
        category,
        amount: Decimal::from_str(amount).unwrap(),
        description: Some(format!("{} on {}", category, date)),
    })
    .expect("Failed to insert transaction");
}

/// September 2025 with a salary, a carryover and three expenses,
/// plus one row on each neighbouring month
fn seeded_db() -> Database {
    let db = Database::in_memory().expect("Failed to create in-memory database");
    add(&db, "2025-08-31", TransactionKind::Expense, Category::Groceries, "999.99");
    add(&db, "2025-09-01", TransactionKind::Income, Category::Carryover, "150.25");
    add(&db, "2025-09-05", TransactionKind::Income, Category::Salary, "3000.00");
    add(&db, "2025-09-12", TransactionKind::Expense, Category::Groceries, "120.10");
    add(&db, "2025-09-20", TransactionKind::Expense, Category::EatingOut, "64.90");
    add(&db, "2025-09-30", TransactionKind::Expense, Category::Groceries, "80.00");
    add(&db, "2025-10-01", TransactionKind::Income, Category::Salary, "3000.00");
    db
}

// =============================================================================
// Summary
// =============================================================================

#[test]
fn test_summary_scenario() {
    let db = Database::in_memory().unwrap();
    add(&db, "2025-09-05", TransactionKind::Income, Category::Salary, "1000.00");
    add(&db, "2025-09-10", TransactionKind::Expense, Category::EatingOut, "200.00");

    let assembler = ReportAssembler::new(db, None);
    let summary = assembler.monthly_summary(Some("2025-09")).unwrap();

    assert_eq!(summary.income, Decimal::from_str("1000.00").unwrap());
    assert_eq!(summary.expenses, Decimal::from_str("200.00").unwrap());
    assert_eq!(summary.net, Decimal::from_str("800.00").unwrap());
}

#[test]
fn test_summary_respects_month_boundaries() {
    let assembler = ReportAssembler::new(seeded_db(), None);
    let summary = assembler.monthly_summary(Some("2025-9")).unwrap();

    assert_eq!(summary.income.to_string(), "3150.25");
    assert_eq!(summary.expenses.to_string(), "265.00");
    assert_eq!(summary.income - summary.expenses, summary.net);
}

// =============================================================================
// Monthly report
// =============================================================================

#[tokio::test]
async fn test_report_with_model_narrative() {
    let mock = MockBackend::new();
    let assembler = ReportAssembler::new(seeded_db(), Some(AIClient::Mock(mock.clone())));

    let report = assembler.monthly_report(Some("2025-09")).await.unwrap();

    assert_eq!(report.month, "2025-09");
    assert_eq!(report.transaction_count, 5);
    assert_eq!(report.narrative_source, NarrativeSource::Model);
    assert!(report.report_text.contains("$3150.25"));
    assert_eq!(
        report.insights,
        vec![
            "Total income: $3150.25",
            "Total expenses: $265.00",
            "Net result: $2885.25",
            "Top category: groceries ($200.10)",
        ]
    );
    assert_eq!(mock.calls(), 1);
}

#[tokio::test]
async fn test_unreachable_model_falls_back() {
    // Nothing listens on port 9 locally, so the connection is refused
    let ai = AIClient::Ollama(OllamaBackend::new("http://127.0.0.1:9", "llama3.2").with_embedded_prompts());
    let db = seeded_db();
    let direct = StatisticsSnapshot::compute(&db.fetch(&Period::parse("2025-09").unwrap()).unwrap());

    let assembler = ReportAssembler::new(db, Some(ai));
    let report = assembler.monthly_report(Some("2025-09")).await.unwrap();

    assert_eq!(report.narrative_source, NarrativeSource::Fallback);
    assert!(report.report_text.starts_with("Hello! Here's your financial summary for 2025-09"));
    assert!(report.report_text.contains("net gain of $2885.25"));
    assert_eq!(report.insights, direct.insight_lines());
}

#[tokio::test]
async fn test_empty_month_never_calls_model() {
    let mock = MockBackend::new();
    let assembler = ReportAssembler::new(seeded_db(), Some(AIClient::Mock(mock.clone())));

    let report = assembler.monthly_report(Some("2024-02")).await.unwrap();

    assert_eq!(report.narrative_source, NarrativeSource::NoData);
    assert_eq!(report.insights, vec![NO_DATA_INSIGHT]);
    assert_eq!(report.transaction_count, 0);
    assert_eq!(mock.calls(), 0);
}

#[tokio::test]
async fn test_report_reflects_deletes() {
    let db = seeded_db();
    let september = db
        .list_transactions_between(
            NaiveDate::from_ymd_opt(2025, 9, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 9, 30).unwrap(),
        )
        .unwrap();
    for tx in &september {
        assert!(db.delete_transaction(tx.id).unwrap());
    }

    let assembler = ReportAssembler::new(db, Some(AIClient::mock()));
    let report = assembler.monthly_report(Some("2025-09")).await.unwrap();
    assert_eq!(report.narrative_source, NarrativeSource::NoData);
}
