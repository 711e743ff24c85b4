//! Pluggable text-generation backend abstraction
//!
//! # Architecture
//!
//! - `AIBackend` trait: the capability the suggester and report pipeline use
//! - `AIClient` enum: concrete wrapper providing Clone + compile-time dispatch
//! - Backend implementations: `OllamaBackend`, `OpenAICompatibleBackend`, `MockBackend`
//!
//! Backends return `Error::GenerationTimeout`, `Error::GenerationUnavailable`
//! or `Error::GenerationMalformed` on failure. Callers in `suggest` and
//! `report` turn those into default/fallback results.
//!
//! # Configuration
//!
//! Environment variables:
//! - `AI_BACKEND`: ollama (default), openai_compatible / openai, mock, none
//! - `OLLAMA_HOST`: Ollama server URL (default: http://localhost:11434)
//! - `OLLAMA_MODEL`: Model name (default: llama3.2)
//! - `OPENAI_COMPATIBLE_HOST`: Server URL (default: https://api.openai.com when
//!   `OPENAI_API_KEY` is set)
//! - `OPENAI_COMPATIBLE_MODEL`: Model name (default: gpt-3.5-turbo)
//! - `OPENAI_COMPATIBLE_API_KEY` / `OPENAI_API_KEY`: bearer key (optional)

mod mock;
mod ollama;
mod openai_compatible;
pub mod parsing;
pub mod types;

pub use mock::{MockBackend, MockBehavior};
pub use ollama::OllamaBackend;
pub use openai_compatible::OpenAICompatibleBackend;
pub use types::*;

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::models::{Category, CategorySuggestion};
use crate::prompts::{PromptId, PromptLibrary, RenderedPrompt};

/// Interface implemented by every text-generation backend
#[async_trait]
pub trait AIBackend: Send + Sync {
    /// Suggest a type and category for a free-text description
    async fn suggest_category(&self, description: &str) -> Result<CategorySuggestion>;

    /// Write a short narrative for a month; empty output is an error
    async fn generate_report(&self, facts: &ReportFacts) -> Result<String>;

    /// Check if the backend is reachable
    async fn health_check(&self) -> bool;

    /// Default model name (for logging)
    fn model(&self) -> &str;

    /// Host URL (for logging)
    fn host(&self) -> &str;
}

/// Concrete AI client enum
///
/// Provides Clone and compile-time dispatch without Box<dyn> overhead.
#[derive(Clone)]
pub enum AIClient {
    /// Ollama backend (HTTP API)
    Ollama(OllamaBackend),
    /// OpenAI-compatible backend (api.openai.com, vLLM, LocalAI, llama-server, etc.)
    OpenAICompatible(OpenAICompatibleBackend),
    /// Mock backend for testing
    Mock(MockBackend),
}

impl AIClient {
    /// Create an AI client from environment variables
    ///
    /// Returns None when `AI_BACKEND=none` or the selected backend lacks
    /// its required settings.
    pub fn from_env() -> Option<Self> {
        Self::from_vars(&|key| std::env::var(key).ok())
    }

    /// Same as `from_env`, reading settings through `var`
    pub fn from_vars(var: &dyn Fn(&str) -> Option<String>) -> Option<Self> {
        let backend = var("AI_BACKEND").unwrap_or_else(|| "ollama".to_string());

        match backend.trim().to_lowercase().as_str() {
            "ollama" => Some(AIClient::Ollama(OllamaBackend::from_vars(var))),
            "openai_compatible" | "openai" | "vllm" | "localai" | "llamacpp" => {
                OpenAICompatibleBackend::from_vars(var).map(AIClient::OpenAICompatible)
            }
            "mock" => Some(AIClient::Mock(MockBackend::new())),
            "none" | "off" | "disabled" => None,
            _ => {
                tracing::warn!(backend = %backend, "Unknown AI_BACKEND, falling back to ollama");
                Some(AIClient::Ollama(OllamaBackend::from_vars(var)))
            }
        }
    }

    /// Create an Ollama backend directly
    pub fn ollama(host: &str, model: &str) -> Self {
        AIClient::Ollama(OllamaBackend::new(host, model))
    }

    /// Create a mock backend for testing
    pub fn mock() -> Self {
        AIClient::Mock(MockBackend::new())
    }

    /// Short backend name for logs and status output
    pub fn backend_name(&self) -> &'static str {
        match self {
            AIClient::Ollama(_) => "ollama",
            AIClient::OpenAICompatible(_) => "openai_compatible",
            AIClient::Mock(_) => "mock",
        }
    }
}

// Implement AIBackend for AIClient by delegating to the inner backend
#[async_trait]
impl AIBackend for AIClient {
    async fn suggest_category(&self, description: &str) -> Result<CategorySuggestion> {
        match self {
            AIClient::Ollama(b) => b.suggest_category(description).await,
            AIClient::OpenAICompatible(b) => b.suggest_category(description).await,
            AIClient::Mock(b) => b.suggest_category(description).await,
        }
    }

    async fn generate_report(&self, facts: &ReportFacts) -> Result<String> {
        match self {
            AIClient::Ollama(b) => b.generate_report(facts).await,
            AIClient::OpenAICompatible(b) => b.generate_report(facts).await,
            AIClient::Mock(b) => b.generate_report(facts).await,
        }
    }

    async fn health_check(&self) -> bool {
        match self {
            AIClient::Ollama(b) => b.health_check().await,
            AIClient::OpenAICompatible(b) => b.health_check().await,
            AIClient::Mock(b) => b.health_check().await,
        }
    }

    fn model(&self) -> &str {
        match self {
            AIClient::Ollama(b) => b.model(),
            AIClient::OpenAICompatible(b) => b.model(),
            AIClient::Mock(b) => b.model(),
        }
    }

    fn host(&self) -> &str {
        match self {
            AIClient::Ollama(b) => b.host(),
            AIClient::OpenAICompatible(b) => b.host(),
            AIClient::Mock(b) => b.host(),
        }
    }
}

/// Render the suggestion prompt for a description
pub(crate) fn suggestion_prompt(
    prompts: &RwLock<PromptLibrary>,
    description: &str,
) -> Result<RenderedPrompt> {
    let categories = Category::STORABLE
        .iter()
        .map(|c| c.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    let mut vars = HashMap::new();
    vars.insert("description", description.trim().to_string());
    vars.insert("categories", categories);

    prompts
        .write()
        .map_err(|_| Error::InvalidData("Failed to acquire prompt library lock".into()))?
        .render(PromptId::SuggestCategory, &vars)
}

/// Render the monthly narrative prompt
pub(crate) fn report_prompt(
    prompts: &RwLock<PromptLibrary>,
    facts: &ReportFacts,
) -> Result<RenderedPrompt> {
    prompts
        .write()
        .map_err(|_| Error::InvalidData("Failed to acquire prompt library lock".into()))?
        .render(PromptId::MonthlyReport, &facts.prompt_vars())
}

/// Reject blank generations
pub(crate) fn non_empty(text: String) -> Result<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(Error::GenerationMalformed("empty model output".into()));
    }
    Ok(trimmed.to_string())
}

/// Clip model output for debug logs
pub(crate) fn preview(text: &str) -> &str {
    match text.char_indices().nth(200) {
        Some((i, _)) => &text[..i],
        None => text,
    }
}
