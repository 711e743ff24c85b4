//! Server command implementation

use std::path::Path;

use anyhow::{Context, Result};

use super::open_db;

pub async fn cmd_serve(
    db_path: &Path,
    host: &str,
    port: u16,
    static_dir: Option<&Path>,
) -> Result<()> {
    println!("🚀 Starting Penny web server...");
    println!("   Database: {}", db_path.display());
    println!("   Listening: http://{}:{}", host, port);
    if let Some(dir) = static_dir {
        println!("   Static files: {}", dir.display());
    }

    if std::env::var("PENNY_API_KEY").map_or(true, |k| k.trim().is_empty()) {
        println!("   ⚠️  PENNY_API_KEY not set - API is open, do not expose to network!");
    } else {
        println!("   🔑 API key required on /api/v1/transactions and /api/v1/llm");
    }
    println!();

    let db = open_db(db_path)?;
    let static_dir = static_dir
        .map(|d| d.to_str().context("Static dir path is not valid UTF-8"))
        .transpose()?;

    penny_server::serve(db, host, port, static_dir).await
}
