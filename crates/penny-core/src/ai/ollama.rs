//! Ollama backend implementation
//!
//! HTTP client for the Ollama `/api/generate` endpoint. Uses the model router
//! for per-task sampling and the prompt library for customizable prompts.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::model_router::{ModelRouter, TaskType};
use crate::models::CategorySuggestion;
use crate::prompts::{PromptLibrary, RenderedPrompt};

use super::parsing::parse_suggestion;
use super::types::{GenerationOptions, ReportFacts};
use super::{non_empty, preview, report_prompt, suggestion_prompt, AIBackend};

pub const DEFAULT_HOST: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "llama3.2";

/// Ollama backend
///
/// # Configuration
///
/// Sampling per task comes from `~/.local/share/penny/config/models.toml`:
///
/// ```toml
/// [models.narrative]
/// model = "gemma3"
/// temperature = 0.3
/// max_tokens = 200
/// timeout_secs = 60
/// ```
#[derive(Clone)]
pub struct OllamaBackend {
    http_client: Client,
    base_url: String,
    default_model: String,
    router: Arc<ModelRouter>,
    prompts: Arc<RwLock<PromptLibrary>>,
}

impl OllamaBackend {
    /// Create a new Ollama backend
    pub fn new(base_url: &str, default_model: &str) -> Self {
        Self::with_router(base_url, default_model, ModelRouter::default())
    }

    /// Create with a custom router
    pub fn with_router(base_url: &str, default_model: &str, router: ModelRouter) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            default_model: default_model.to_string(),
            router: Arc::new(router),
            prompts: Arc::new(RwLock::new(PromptLibrary::new())),
        }
    }

    /// Use embedded prompts only (ignores user overrides)
    pub fn with_embedded_prompts(mut self) -> Self {
        self.prompts = Arc::new(RwLock::new(PromptLibrary::embedded_only()));
        self
    }

    pub fn from_env() -> Self {
        Self::from_vars(&|key| std::env::var(key).ok())
    }

    pub(crate) fn from_vars(var: &dyn Fn(&str) -> Option<String>) -> Self {
        let host = var("OLLAMA_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let model = var("OLLAMA_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());
        Self::new(&host, &model)
    }

    fn options(&self, task: TaskType) -> GenerationOptions {
        GenerationOptions::for_task(&self.router, task, &self.default_model)
    }

    /// One `/api/generate` call with an explicit timeout and no retry
    pub async fn generate(&self, prompt: &RenderedPrompt, options: &GenerationOptions) -> Result<String> {
        let request = OllamaRequest {
            model: &options.model,
            prompt: &prompt.user,
            system: prompt.system.as_deref(),
            stream: false,
            options: OllamaOptions {
                temperature: options.temperature,
                num_predict: options.max_tokens,
            },
        };

        let response = self
            .http_client
            .post(format!("{}/api/generate", self.base_url))
            .timeout(options.timeout)
            .json(&request)
            .send()
            .await
            .map_err(Error::from_generation)?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::GenerationUnavailable(format!(
                "Ollama returned {}",
                status
            )));
        }

        let body = response.text().await.map_err(Error::from_generation)?;
        let text = concat_responses(&body)?;
        debug!(model = %options.model, output = preview(&text), "Ollama response");
        Ok(text)
    }
}

/// Request to Ollama API
#[derive(Debug, Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

/// One response object (or one NDJSON chunk)
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    #[serde(default)]
    response: String,
}

/// Ollama may stream NDJSON even with `stream: false`; join every chunk
fn concat_responses(body: &str) -> Result<String> {
    let mut text = String::new();
    for line in body.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let chunk: OllamaResponse = serde_json::from_str(line)
            .map_err(|e| Error::GenerationMalformed(format!("Invalid Ollama chunk: {}", e)))?;
        text.push_str(&chunk.response);
    }
    Ok(text)
}

#[async_trait]
impl AIBackend for OllamaBackend {
    async fn suggest_category(&self, description: &str) -> Result<CategorySuggestion> {
        let prompt = suggestion_prompt(&self.prompts, description)?;
        let output = self
            .generate(&prompt, &self.options(TaskType::Classification))
            .await?;
        parse_suggestion(&output)
    }

    async fn generate_report(&self, facts: &ReportFacts) -> Result<String> {
        let prompt = report_prompt(&self.prompts, facts)?;
        let output = self
            .generate(&prompt, &self.options(TaskType::Narrative))
            .await?;
        non_empty(output)
    }

    async fn health_check(&self) -> bool {
        match self
            .http_client
            .get(format!("{}/api/tags", self.base_url))
            .timeout(std::time::Duration::from_secs(5))
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    fn model(&self) -> &str {
        &self.default_model
    }

    fn host(&self) -> &str {
        &self.base_url
    }
}
