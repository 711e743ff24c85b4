//! Transaction command implementations

use anyhow::{bail, Result};
use penny_core::db::Database;
use penny_core::models::{NewTransaction, Transaction, TransactionKind};
use penny_core::money::format_usd;
use penny_core::Period;

use super::truncate;

pub fn cmd_transactions_list(db: &Database, month: Option<&str>) -> Result<()> {
    let period = Period::resolve(month)?;
    let transactions = db.list_transactions_between(period.first_day(), period.last_day())?;

    if transactions.is_empty() {
        println!("No transactions for {}. Add some with:", period.token());
        println!("  penny transactions add --date YYYY-MM-DD --kind expense --category groceries --amount 12.50");
        return Ok(());
    }

    println!();
    println!("📝 Transactions for {}", period.label());
    println!("   ─────────────────────────────────────────────────────────────");

    for tx in &transactions {
        println!("   {}", format_row(tx));
    }

    Ok(())
}

pub(crate) fn format_row(tx: &Transaction) -> String {
    let amount_str = match tx.kind {
        TransactionKind::Expense => format!("\x1b[31m-{}\x1b[0m", format_usd(tx.amount)), // Red for expenses
        TransactionKind::Income => format!("\x1b[32m+{}\x1b[0m", format_usd(tx.amount)), // Green for income
    };

    format!(
        "#{:<5} {} │ {:>12} │ {:<10} │ {}",
        tx.id,
        tx.date,
        amount_str,
        tx.category,
        truncate(tx.description.as_deref().unwrap_or(""), 40)
    )
}

pub fn cmd_transactions_add(db: &Database, tx: NewTransaction) -> Result<()> {
    let created = db.insert_transaction(&tx)?;
    println!("✅ Added transaction #{}", created.id);
    println!("   {}", format_row(&created));
    Ok(())
}

pub fn cmd_transactions_delete(db: &Database, id: i64) -> Result<()> {
    if !db.delete_transaction(id)? {
        bail!("Transaction {} not found", id);
    }
    println!("🗑️  Deleted transaction #{}", id);
    Ok(())
}
