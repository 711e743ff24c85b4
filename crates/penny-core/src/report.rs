//! Monthly report pipeline
//!
//! resolve period → fetch → aggregate → narrate → shape.
//!
//! Only `InvalidPeriod` and `StoreUnavailable` can fail a report. Narrative
//! generation problems select the deterministic fallback paragraph.

use tracing::{debug, info, warn};

use crate::ai::{AIBackend, AIClient, ReportFacts};
use crate::error::Result;
use crate::models::{MonthlyReport, MonthlySummary, NarrativeSource, Transaction};
use crate::money::format_usd;
use crate::period::Period;
use crate::stats::StatisticsSnapshot;
use crate::store::TransactionStore;

/// The single insight line of an empty month
pub const NO_DATA_INSIGHT: &str = "No data available for analysis";

/// Builds reports and summaries from a store and an optional AI backend
pub struct ReportAssembler<S> {
    store: S,
    ai: Option<AIClient>,
}

impl<S: TransactionStore> ReportAssembler<S> {
    pub fn new(store: S, ai: Option<AIClient>) -> Self {
        Self { store, ai }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn ai(&self) -> Option<&AIClient> {
        self.ai.as_ref()
    }

    /// Generate the report for a month token (or the current month)
    pub async fn monthly_report(&self, token: Option<&str>) -> Result<MonthlyReport> {
        let period = Period::resolve(token)?;
        let transactions = self.store.fetch(&period)?;
        let month = period.token();

        if transactions.is_empty() {
            debug!(month = %month, "No transactions, skipping narrative");
            return Ok(no_data_report(month));
        }

        let stats = StatisticsSnapshot::compute(&transactions);
        let facts = ReportFacts::new(month.clone(), period.label(), &stats, &transactions);
        let (report_text, narrative_source) = generate_narrative(self.ai.as_ref(), &facts).await;

        info!(
            month = %month,
            transactions = stats.transaction_count,
            source = narrative_source.as_str(),
            "Monthly report generated"
        );

        Ok(MonthlyReport {
            month,
            report_text,
            insights: stats.insight_lines(),
            transaction_count: stats.transaction_count,
            narrative_source,
        })
    }

    /// Totals for a month token; never touches the AI backend
    pub fn monthly_summary(&self, token: Option<&str>) -> Result<MonthlySummary> {
        let (_, _, stats) = self.month_detail(token)?;
        Ok(stats.summary())
    }

    /// Resolved period, its transactions and their statistics
    pub fn month_detail(
        &self,
        token: Option<&str>,
    ) -> Result<(Period, Vec<Transaction>, StatisticsSnapshot)> {
        let period = Period::resolve(token)?;
        let transactions = self.store.fetch(&period)?;
        let stats = StatisticsSnapshot::compute(&transactions);
        Ok((period, transactions, stats))
    }
}

/// Narrative text for a month, falling back on any generation failure
pub async fn generate_narrative<A>(ai: Option<&A>, facts: &ReportFacts) -> (String, NarrativeSource)
where
    A: AIBackend + ?Sized,
{
    let Some(ai) = ai else {
        debug!("No AI backend configured, using fallback narrative");
        return (fallback_narrative(facts), NarrativeSource::Fallback);
    };

    match ai.generate_report(facts).await {
        Ok(text) if !text.trim().is_empty() => (text.trim().to_string(), NarrativeSource::Model),
        Ok(_) => {
            warn!(model = ai.model(), "Empty narrative from model, using fallback");
            (fallback_narrative(facts), NarrativeSource::Fallback)
        }
        Err(e) => {
            warn!(error = %e, model = ai.model(), host = ai.host(), "Narrative generation failed, using fallback");
            (fallback_narrative(facts), NarrativeSource::Fallback)
        }
    }
}

/// Deterministic paragraph built only from the statistics
pub fn fallback_narrative(facts: &ReportFacts) -> String {
    let outcome = if facts.net_total.is_sign_positive() && !facts.net_total.is_zero() {
        "gain"
    } else {
        "loss"
    };

    format!(
        "Hello! Here's your financial summary for {}: You earned {} and spent {}, resulting in a net {} of {}. Your top expense category was {} at {}.",
        facts.month,
        format_usd(facts.income_total),
        format_usd(facts.expense_total),
        outcome,
        format_usd(facts.net_total.abs()),
        facts.top_category,
        format_usd(facts.top_category_amount),
    )
}

fn no_data_report(month: String) -> MonthlyReport {
    MonthlyReport {
        report_text: format!(
            "No transactions found for {}. Start adding some transactions to get insights!",
            month
        ),
        month,
        insights: vec![NO_DATA_INSIGHT.to_string()],
        transaction_count: 0,
        narrative_source: NarrativeSource::NoData,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::MockBackend;
    use crate::error::Error;
    use crate::models::{Category, TransactionKind};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    /// In-memory store that can be switched to fail
    struct VecStore {
        rows: Vec<Transaction>,
        down: bool,
    }

    impl TransactionStore for VecStore {
        fn fetch(&self, period: &Period) -> Result<Vec<Transaction>> {
            if self.down {
                return Err(Error::StoreUnavailable("connection refused".into()));
            }
            Ok(self
                .rows
                .iter()
                .filter(|t| period.contains(t.date))
                .cloned()
                .collect())
        }
    }

    fn tx(day: u32, kind: TransactionKind, category: Category, amount: &str) -> Transaction {
        Transaction {
            id: day as i64,
            date: NaiveDate::from_ymd_opt(2025, 9, day).unwrap(),
            kind,
            category,
            amount: Decimal::from_str(amount).unwrap(),
            description: None,
        }
    }

    fn september() -> VecStore {
        VecStore {
            rows: vec![
                tx(5, TransactionKind::Income, Category::Salary, "1000.00"),
                tx(10, TransactionKind::Expense, Category::EatingOut, "200.00"),
            ],
            down: false,
        }
    }

    #[test]
    fn test_summary_scenario() {
        let assembler = ReportAssembler::new(september(), None);
        let summary = assembler.monthly_summary(Some("2025-09")).unwrap();
        assert_eq!(summary.income.to_string(), "1000.00");
        assert_eq!(summary.expenses.to_string(), "200.00");
        assert_eq!(summary.net.to_string(), "800.00");
    }

    #[tokio::test]
    async fn test_model_narrative_used_verbatim() {
        let mock = MockBackend::replying("  Great month!  ");
        let assembler = ReportAssembler::new(september(), Some(AIClient::Mock(mock)));
        let report = assembler.monthly_report(Some("2025-09")).await.unwrap();

        assert_eq!(report.report_text, "Great month!");
        assert_eq!(report.narrative_source, NarrativeSource::Model);
        assert_eq!(report.month, "2025-09");
        assert_eq!(report.transaction_count, 2);
    }

    #[tokio::test]
    async fn test_fallback_when_model_fails() {
        for mock in [
            MockBackend::failing(),
            MockBackend::timing_out(),
            MockBackend::replying("   "),
        ] {
            let assembler = ReportAssembler::new(september(), Some(AIClient::Mock(mock)));
            let report = assembler.monthly_report(Some("2025-09")).await.unwrap();

            assert_eq!(
                report.report_text,
                "Hello! Here's your financial summary for 2025-09: You earned $1000.00 and spent $200.00, \
                 resulting in a net gain of $800.00. Your top expense category was eating_out at $200.00."
            );
            assert_eq!(report.narrative_source, NarrativeSource::Fallback);

            let direct = StatisticsSnapshot::compute(&september().rows);
            assert_eq!(report.insights, direct.insight_lines());
        }
    }

    #[tokio::test]
    async fn test_fallback_reports_loss() {
        let store = VecStore {
            rows: vec![tx(3, TransactionKind::Expense, Category::Groceries, "45.50")],
            down: false,
        };
        let assembler = ReportAssembler::new(store, None);
        let report = assembler.monthly_report(Some("2025-09")).await.unwrap();
        assert!(report.report_text.contains("net loss of $45.50"));
        assert!(report.report_text.contains("You earned $0.00"));
    }

    #[tokio::test]
    async fn test_zero_net_reads_as_loss() {
        let store = VecStore {
            rows: vec![
                tx(1, TransactionKind::Income, Category::Carryover, "10"),
                tx(2, TransactionKind::Expense, Category::Groceries, "10"),
            ],
            down: false,
        };
        let report = ReportAssembler::new(store, None)
            .monthly_report(Some("2025-09"))
            .await
            .unwrap();
        assert!(report.report_text.contains("net loss of $0.00"));
    }

    #[tokio::test]
    async fn test_empty_month_skips_model() {
        let mock = MockBackend::new();
        let assembler = ReportAssembler::new(september(), Some(AIClient::Mock(mock.clone())));
        let report = assembler.monthly_report(Some("2025-10")).await.unwrap();

        assert_eq!(
            report.report_text,
            "No transactions found for 2025-10. Start adding some transactions to get insights!"
        );
        assert_eq!(report.insights, vec![NO_DATA_INSIGHT]);
        assert_eq!(report.transaction_count, 0);
        assert_eq!(report.narrative_source, NarrativeSource::NoData);
        assert_eq!(mock.calls(), 0);
    }

    #[tokio::test]
    async fn test_errors_surface() {
        let assembler = ReportAssembler::new(september(), None);
        assert!(matches!(
            assembler.monthly_report(Some("2025-13")).await,
            Err(Error::InvalidPeriod(_))
        ));

        let down = ReportAssembler::new(VecStore { rows: vec![], down: true }, Some(AIClient::mock()));
        assert!(matches!(
            down.monthly_report(Some("2025-09")).await,
            Err(Error::StoreUnavailable(_))
        ));
        assert!(matches!(
            down.monthly_summary(Some("2025-09")),
            Err(Error::StoreUnavailable(_))
        ));
    }
}
