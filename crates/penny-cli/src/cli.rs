//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use penny_core::models::{Category, TransactionKind};
use rust_decimal::Decimal;

/// Penny - Track monthly income and spending
#[derive(Parser)]
#[command(name = "penny")]
#[command(about = "Self-hosted monthly spending tracker with local AI reports", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path
    #[arg(long, env = "PENNY_DB", default_value = "penny.db", global = true)]
    pub db: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database
    Init,

    /// Start the web server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Directory served under /static
        #[arg(long)]
        static_dir: Option<PathBuf>,
    },

    /// Insert demo transactions for a month (safe to run twice)
    Seed {
        /// Target month YYYY-MM (default: current month)
        #[arg(short, long)]
        month: Option<String>,
    },

    /// Show income, expense and net totals
    Summary {
        /// Month YYYY-MM (default: current month)
        #[arg(short, long)]
        month: Option<String>,
    },

    /// Generate the monthly report
    Report {
        /// Month YYYY-MM (default: current month)
        #[arg(short, long)]
        month: Option<String>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Suggest a type and category for a description
    Suggest {
        /// Transaction description
        description: String,
    },

    /// Manage transactions (list, add, delete)
    Transactions {
        #[command(subcommand)]
        action: Option<TransactionsAction>,
    },
}

#[derive(Subcommand)]
pub enum TransactionsAction {
    /// List a month's transactions
    List {
        /// Month YYYY-MM (default: current month)
        #[arg(short, long)]
        month: Option<String>,
    },

    /// Add a transaction
    Add {
        /// Date (YYYY-MM-DD)
        #[arg(long)]
        date: NaiveDate,

        /// income or expense
        #[arg(long)]
        kind: TransactionKind,

        /// salary, carryover, groceries or eating_out
        #[arg(long)]
        category: Category,

        /// Non-negative amount, e.g. 12.50
        #[arg(long)]
        amount: Decimal,

        /// Free-text description
        #[arg(long)]
        description: Option<String>,
    },

    /// Delete a transaction by ID
    Delete {
        /// Transaction ID
        id: i64,
    },
}
