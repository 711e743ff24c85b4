//! Core command implementations and shared utilities
//!
//! This module contains:
//! - `open_db` - Shared utility to open the database
//! - `cmd_init` - Initialize the database
//! - `cmd_seed` - Insert demo transactions for a month

use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use penny_core::db::Database;
use penny_core::models::{Category, NewTransaction, TransactionKind};
use penny_core::Period;
use rust_decimal::Decimal;

/// Open (and migrate) the database
pub fn open_db(db_path: &Path) -> Result<Database> {
    let path_str = db_path
        .to_str()
        .context("Database path is not valid UTF-8")?;
    Database::new(path_str).context("Failed to open database")
}

pub fn cmd_init(db_path: &Path) -> Result<()> {
    println!("🔧 Initializing database at {}...", db_path.display());

    let db = open_db(db_path)?;
    let count = db.count_transactions()?;
    println!("   {} transaction(s) stored", count);

    println!("✅ Database initialized successfully!");
    println!();
    println!("Next steps:");
    println!("  1. Add demo data: penny seed");
    println!("  2. Start web UI: penny serve");

    Ok(())
}

/// Demo rows: (category, amount, description)
const SAMPLE_INCOME: [(Category, &str, &str); 2] = [
    (Category::Salary, "5000.00", "Monthly salary"),
    (Category::Carryover, "6000.00", "Carryover"),
];

const SAMPLE_EXPENSES: [(Category, &str, &str); 3] = [
    (Category::Groceries, "120.50", "Groceries"),
    (Category::Groceries, "45.00", "Snacks"),
    (Category::EatingOut, "4500.00", "Dining"),
];

/// Insert the demo rows for a month, skipping any already present.
///
/// Income lands on the last then first day; expenses on the 24th (or the
/// last day of shorter months), the last day and the first day.
pub fn seed_month(db: &Database, period: &Period) -> Result<usize> {
    let first = period.first_day();
    let last = period.last_day();
    let mid = NaiveDate::from_ymd_opt(period.year(), period.month(), 24.min(last.day()))
        .context("Invalid seed date")?;

    let income_dates = [last, first];
    let expense_dates = [mid, last, first];

    let rows = SAMPLE_INCOME
        .iter()
        .enumerate()
        .map(|(i, row)| (income_dates[i % income_dates.len()], TransactionKind::Income, row))
        .chain(
            SAMPLE_EXPENSES
                .iter()
                .enumerate()
                .map(|(i, row)| (expense_dates[i % expense_dates.len()], TransactionKind::Expense, row)),
        );

    let mut inserted = 0;
    for (date, kind, &(category, amount, description)) in rows {
        let amount = Decimal::from_str(amount)?;
        if db.find_duplicate(date, kind, category, amount)?.is_some() {
            continue;
        }
        db.insert_transaction(&NewTransaction {
            date,
            kind,
            category,
            amount,
            description: Some(description.to_string()),
        })?;
        inserted += 1;
    }

    Ok(inserted)
}

pub fn cmd_seed(db: &Database, month: Option<&str>) -> Result<()> {
    let period = Period::resolve(month)?;
    let inserted = seed_month(db, &period)?;
    println!("Inserted {} rows for month {}", inserted, period.token());
    Ok(())
}
