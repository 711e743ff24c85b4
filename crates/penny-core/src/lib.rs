//! Penny Core Library
//!
//! Shared functionality for the Penny monthly spending tracker:
//! - Transaction store (SQLite) and month periods
//! - Statistics aggregation over a month of transactions
//! - Monthly report pipeline with a deterministic narrative fallback
//! - Category suggestions from a pluggable local AI backend
//! - Model router and prompt library for per-task generation settings

pub mod ai;
pub mod db;
pub mod error;
pub mod model_router;
pub mod models;
pub mod money;
pub mod period;
pub mod prompts;
pub mod report;
pub mod stats;
pub mod store;
pub mod suggest;

/// Test utilities including mock Ollama server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use ai::{
    AIBackend, AIClient, MockBackend, MockBehavior, OllamaBackend, OpenAICompatibleBackend,
    ReportFacts,
};
pub use db::Database;
pub use error::{Error, Result};
pub use model_router::{ModelRouter, RouterConfig, TaskConfig, TaskType};
pub use models::*;
pub use period::Period;
pub use prompts::{Prompt, PromptId, PromptLibrary, RenderedPrompt};
pub use report::ReportAssembler;
pub use stats::StatisticsSnapshot;
pub use store::TransactionStore;
pub use suggest::suggest_category;
