//! Penny CLI - Monthly spending tracker
//!
//! Usage:
//!   penny init                    Initialize database
//!   penny seed --month 2025-09    Insert demo transactions
//!   penny report --month 2025-09  Generate the monthly report
//!   penny serve --port 3000       Start web server

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match cli.command {
        Commands::Init => commands::cmd_init(&cli.db),
        Commands::Serve {
            port,
            host,
            static_dir,
        } => commands::cmd_serve(&cli.db, &host, port, static_dir.as_deref()).await,
        Commands::Seed { month } => {
            let db = commands::open_db(&cli.db)?;
            commands::cmd_seed(&db, month.as_deref())
        }
        Commands::Summary { month } => {
            let db = commands::open_db(&cli.db)?;
            commands::cmd_summary(&db, month.as_deref())
        }
        Commands::Report { month, json } => {
            let db = commands::open_db(&cli.db)?;
            commands::cmd_report(db, month.as_deref(), json).await
        }
        Commands::Suggest { description } => commands::cmd_suggest(&description).await,
        Commands::Transactions { action } => {
            let db = commands::open_db(&cli.db)?;
            match action {
                None => commands::cmd_transactions_list(&db, None),
                Some(TransactionsAction::List { month }) => {
                    commands::cmd_transactions_list(&db, month.as_deref())
                }
                Some(TransactionsAction::Add {
                    date,
                    kind,
                    category,
                    amount,
                    description,
                }) => commands::cmd_transactions_add(
                    &db,
                    penny_core::models::NewTransaction {
                        date,
                        kind,
                        category,
                        amount,
                        description,
                    },
                ),
                Some(TransactionsAction::Delete { id }) => {
                    commands::cmd_transactions_delete(&db, id)
                }
            }
        }
    }
}
