//! Transaction operations

use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension};
use rust_decimal::Decimal;
use tracing::debug;

use super::Database;
use crate::error::{Error, Result};
use crate::models::{Category, NewTransaction, Transaction, TransactionKind, TransactionUpdate};
use crate::money::{from_cents, normalize, to_cents};

const SELECT_COLUMNS: &str = "SELECT id, date, type, category, amount_cents, description FROM transactions";

impl Database {
    /// Insert a transaction and return the stored row
    pub fn insert_transaction(&self, tx: &NewTransaction) -> Result<Transaction> {
        let amount = validate(tx.category, tx.amount)?;
        let conn = self.conn()?;

        conn.execute(
            "INSERT INTO transactions (date, type, category, amount_cents, description) VALUES (?, ?, ?, ?, ?)",
            params![
                tx.date.to_string(),
                tx.kind.as_str(),
                tx.category.as_str(),
                to_cents(amount)?,
                tx.description,
            ],
        )?;
        let id = conn.last_insert_rowid();
        debug!(id, date = %tx.date, kind = %tx.kind, "Inserted transaction");

        Ok(Transaction {
            id,
            date: tx.date,
            kind: tx.kind,
            category: tx.category,
            amount,
            description: tx.description.clone(),
        })
    }

    /// Get a single transaction by ID
    pub fn get_transaction(&self, id: i64) -> Result<Option<Transaction>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!("{} WHERE id = ?", SELECT_COLUMNS))?;

        let transaction = stmt
            .query_row(params![id], |row| Self::row_to_transaction(row))
            .optional()?;

        Ok(transaction)
    }

    /// Apply a partial update. Returns `None` when the row doesn't exist.
    pub fn update_transaction(
        &self,
        id: i64,
        update: &TransactionUpdate,
    ) -> Result<Option<Transaction>> {
        let Some(mut tx) = self.get_transaction(id)? else {
            return Ok(None);
        };
        update.apply(&mut tx);
        tx.amount = validate(tx.category, tx.amount)?;

        let conn = self.conn()?;
        conn.execute(
            "UPDATE transactions SET date = ?, type = ?, category = ?, amount_cents = ?, description = ? WHERE id = ?",
            params![
                tx.date.to_string(),
                tx.kind.as_str(),
                tx.category.as_str(),
                to_cents(tx.amount)?,
                tx.description,
                id,
            ],
        )?;

        Ok(Some(tx))
    }

    /// Delete a transaction. Returns whether a row was removed.
    pub fn delete_transaction(&self, id: i64) -> Result<bool> {
        let conn = self.conn()?;
        let deleted = conn.execute("DELETE FROM transactions WHERE id = ?", params![id])?;
        Ok(deleted > 0)
    }

    /// Transactions dated within `[from, to]`, newest first
    pub fn list_transactions_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Transaction>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE date BETWEEN ? AND ? ORDER BY date DESC, id DESC",
            SELECT_COLUMNS
        ))?;

        let transactions = stmt
            .query_map(params![from.to_string(), to.to_string()], |row| {
                Self::row_to_transaction(row)
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(transactions)
    }

    /// Find an existing row with the same date, kind, category and amount
    pub fn find_duplicate(
        &self,
        date: NaiveDate,
        kind: TransactionKind,
        category: Category,
        amount: Decimal,
    ) -> Result<Option<i64>> {
        let conn = self.conn()?;
        let id = conn
            .query_row(
                "SELECT id FROM transactions WHERE date = ? AND type = ? AND category = ? AND amount_cents = ? LIMIT 1",
                params![date.to_string(), kind.as_str(), category.as_str(), to_cents(amount)?],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }

    /// Count total transactions
    pub fn count_transactions(&self) -> Result<i64> {
        let conn = self.conn()?;
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM transactions", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Column order: id, date, type, category, amount_cents, description
    pub(crate) fn row_to_transaction(row: &rusqlite::Row) -> rusqlite::Result<Transaction> {
        let date_str: String = row.get(1)?;
        let kind_str: String = row.get(2)?;
        let category_str: String = row.get(3)?;
        let cents: i64 = row.get(4)?;

        Ok(Transaction {
            id: row.get(0)?,
            date: NaiveDate::parse_from_str(&date_str, "%Y-%m-%d")
                .map_err(|e| conversion_error(1, e.to_string()))?,
            kind: kind_str.parse().map_err(|e| conversion_error(2, e))?,
            category: category_str.parse().map_err(|e| conversion_error(3, e))?,
            amount: from_cents(cents),
            description: row.get(5)?,
        })
    }
}

/// Write-path checks; returns the normalized amount
fn validate(category: Category, amount: Decimal) -> Result<Decimal> {
    if !category.is_storable() {
        return Err(Error::InvalidData(format!(
            "Category '{}' cannot be stored",
            category
        )));
    }
    let amount = normalize(amount);
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(Error::InvalidData(format!(
            "Amount must be non-negative, got {}",
            amount
        )));
    }
    Ok(amount)
}

fn conversion_error(column: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        column,
        rusqlite::types::Type::Text,
        message.into(),
    )
}
