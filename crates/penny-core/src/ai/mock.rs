//! Mock backend for testing
//!
//! Useful for unit tests and development without a running LLM server.
//! Raw replies go through the same parser as real backends.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::models::{Category, CategorySuggestion, TransactionKind};
use crate::money::format_usd;

use super::parsing::parse_suggestion;
use super::types::ReportFacts;
use super::{non_empty, AIBackend};

/// What the mock does when asked to generate
#[derive(Debug, Clone, Default)]
pub enum MockBehavior {
    /// Keyword classifier and a templated narrative
    #[default]
    Canned,
    /// Return this raw text as the model output
    Reply(String),
    /// Fail as if the request timed out
    Timeout,
    /// Fail as if the server were down
    Unavailable,
}

/// Mock AI backend for testing
#[derive(Clone)]
pub struct MockBackend {
    behavior: MockBehavior,
    /// Whether health_check should return true
    pub healthy: bool,
    calls: Arc<AtomicUsize>,
}

impl MockBackend {
    /// Create a new mock backend (healthy by default)
    pub fn new() -> Self {
        Self::with_behavior(MockBehavior::Canned)
    }

    pub fn with_behavior(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            healthy: true,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Always return `reply` as the raw model output
    pub fn replying(reply: impl Into<String>) -> Self {
        Self::with_behavior(MockBehavior::Reply(reply.into()))
    }

    /// Every generation fails with `GenerationUnavailable`
    pub fn failing() -> Self {
        let mut backend = Self::with_behavior(MockBehavior::Unavailable);
        backend.healthy = false;
        backend
    }

    /// Every generation fails with `GenerationTimeout`
    pub fn timing_out() -> Self {
        Self::with_behavior(MockBehavior::Timeout)
    }

    /// Number of generation calls made so far (shared across clones)
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn record_call(&self) -> Result<Option<&str>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            MockBehavior::Canned => Ok(None),
            MockBehavior::Reply(text) => Ok(Some(text.as_str())),
            MockBehavior::Timeout => Err(Error::GenerationTimeout),
            MockBehavior::Unavailable => {
                Err(Error::GenerationUnavailable("mock backend is down".into()))
            }
        }
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AIBackend for MockBackend {
    async fn suggest_category(&self, description: &str) -> Result<CategorySuggestion> {
        if let Some(reply) = self.record_call()? {
            return parse_suggestion(reply);
        }

        let d = description.to_lowercase();
        let has = |words: &[&str]| words.iter().any(|w| d.contains(w));
        let (kind, category, confidence) = if has(&["salary", "payroll", "paycheck", "wage"]) {
            (TransactionKind::Income, Category::Salary, 0.9)
        } else if has(&["carryover", "carry over", "rollover", "leftover"]) {
            (TransactionKind::Income, Category::Carryover, 0.8)
        } else if has(&["grocer", "supermarket", "market", "whole foods", "costco", "milk", "bread"]) {
            (TransactionKind::Expense, Category::Groceries, 0.85)
        } else if has(&["restaurant", "cafe", "coffee", "starbucks", "pizza", "dinner", "lunch", "takeout"]) {
            (TransactionKind::Expense, Category::EatingOut, 0.85)
        } else {
            (TransactionKind::Expense, Category::Other, 0.3)
        };

        Ok(CategorySuggestion {
            suggested_type: kind,
            suggested_category: category,
            confidence,
        })
    }

    async fn generate_report(&self, facts: &ReportFacts) -> Result<String> {
        if let Some(reply) = self.record_call()? {
            return non_empty(reply.to_string());
        }

        Ok(format!(
            "Hi there! In {} you brought in {} and spent {}, leaving {}. {} was where most of the money went.",
            facts.month,
            format_usd(facts.income_total),
            format_usd(facts.expense_total),
            format_usd(facts.net_total),
            facts.top_category,
        ))
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }

    fn model(&self) -> &str {
        "mock"
    }

    fn host(&self) -> &str {
        "mock://localhost"
    }
}
