//! HTTP request handlers organized by domain
//!
//! Each submodule contains handlers for a specific API area.

use serde::Deserialize;

pub mod dashboard;
pub mod llm;
pub mod summary;
pub mod transactions;

// Re-export all handlers for use in router
pub use dashboard::*;
pub use llm::*;
pub use summary::*;
pub use transactions::*;

/// `?month=YYYY-MM`; absent means the current month
#[derive(Debug, Default, Deserialize)]
pub struct MonthQuery {
    pub month: Option<String>,
}

impl MonthQuery {
    pub fn token(&self) -> Option<&str> {
        self.month.as_deref().filter(|m| !m.trim().is_empty())
    }
}
