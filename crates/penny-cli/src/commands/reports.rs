//! Summary, report and suggestion commands

use anyhow::Result;
use penny_core::ai::{AIBackend, AIClient};
use penny_core::db::Database;
use penny_core::money::format_usd;
use penny_core::{suggest_category, ReportAssembler};

pub fn cmd_summary(db: &Database, month: Option<&str>) -> Result<()> {
    let (period, _, stats) = ReportAssembler::new(db, None).month_detail(month)?;
    let summary = stats.summary();

    println!();
    println!("📊 {}", period.label());
    println!("   ─────────────────────────────");
    println!("   Income:   {:>14}", format_usd(summary.income));
    println!("   Expenses: {:>14}", format_usd(summary.expenses));
    println!("   Net:      {:>14}", format_usd(summary.net));

    Ok(())
}

pub async fn cmd_report(db: Database, month: Option<&str>, json: bool) -> Result<()> {
    let ai = AIClient::from_env();
    if let Some(ref client) = ai {
        println!("🤖 Generating report with {} ({})...", client.model(), client.host());
    }

    let report = ReportAssembler::new(db, ai).monthly_report(month).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!();
    println!(
        "📝 Report for {} ({} transactions, {})",
        report.month,
        report.transaction_count,
        report.narrative_source.as_str()
    );
    println!();
    println!("{}", report.report_text);
    println!();
    for line in &report.insights {
        println!("   • {}", line);
    }

    Ok(())
}

pub async fn cmd_suggest(description: &str) -> Result<()> {
    let ai = AIClient::from_env();
    let suggestion = suggest_category(ai.as_ref(), description).await?;

    println!(
        "{} / {} (confidence {:.2})",
        suggestion.suggested_type, suggestion.suggested_category, suggestion.confidence
    );

    Ok(())
}
