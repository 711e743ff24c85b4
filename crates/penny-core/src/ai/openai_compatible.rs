//! OpenAI-compatible backend implementation
//!
//! Works with any server that implements the OpenAI chat completions API:
//! - api.openai.com
//! - vLLM (http://localhost:8000)
//! - LocalAI (http://localhost:8080)
//! - llama-server / llama.cpp (http://localhost:8080)
//!
//! # Configuration
//!
//! Environment variables:
//! - `OPENAI_COMPATIBLE_HOST`: Server URL (default: https://api.openai.com when a key is set)
//! - `OPENAI_COMPATIBLE_MODEL`: Model name (default: gpt-3.5-turbo)
//! - `OPENAI_COMPATIBLE_API_KEY` or `OPENAI_API_KEY`: API key if required

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

pub const OPENAI_HOST: &str = "https://api.openai.com";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// OpenAI-compatible backend
#[derive(Clone)]
pub struct OpenAICompatibleBackend {
    http_client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    router: Arc<ModelRouter>,
    prompts: Arc<RwLock<PromptLibrary>>,
}

impl OpenAICompatibleBackend {
    /// Create a new OpenAI-compatible backend
    pub fn new(base_url: &str, model: &str) -> Self {
        Self::with_router(base_url, model, ModelRouter::default())
    }

    pub fn with_router(base_url: &str, model: &str, router: ModelRouter) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: None,
            router: Arc::new(router),
            prompts: Arc::new(RwLock::new(PromptLibrary::new())),
        }
    }

    /// Use embedded prompts only (ignores user overrides)
    pub fn with_embedded_prompts(mut self) -> Self {
        self.prompts = Arc::new(RwLock::new(PromptLibrary::embedded_only()));
        self
    }

    /// Create from environment variables
    ///
    /// Returns None when neither a host nor an API key is configured.
    pub fn from_env() -> Option<Self> {
        Self::from_vars(&|key| std::env::var(key).ok())
    }

    pub(crate) fn from_vars(var: &dyn Fn(&str) -> Option<String>) -> Option<Self> {
        let api_key = var("OPENAI_COMPATIBLE_API_KEY").or_else(|| var("OPENAI_API_KEY"));
        let host = match var("OPENAI_COMPATIBLE_HOST") {
            Some(host) => host,
            None if api_key.is_some() => OPENAI_HOST.to_string(),
            None => return None,
        };
        let model = var("OPENAI_COMPATIBLE_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let mut backend = Self::new(&host, &model);
        backend.api_key = api_key;
        Some(backend)
    }

    fn options(&self, task: TaskType) -> GenerationOptions {
        GenerationOptions::for_task(&self.router, task, &self.model)
    }

    /// One chat completion call with an explicit timeout and no retry
    pub async fn generate(&self, prompt: &RenderedPrompt, options: &GenerationOptions) -> Result<String> {
        let request = ChatCompletionRequest {
            model: &options.model,
            messages: chat_messages(prompt),
            temperature: Some(options.temperature),
            max_tokens: options.max_tokens,
            stream: false,
        };

        let mut req_builder = self
            .http_client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .timeout(options.timeout)
            .json(&request);

        if let Some(ref api_key) = self.api_key {
            req_builder = req_builder.bearer_auth(api_key);
        }

        let response = req_builder.send().await.map_err(Error::from_generation)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::GenerationUnavailable(format!(
                "OpenAI API error {}: {}",
                status,
                preview(&body)
            )));
        }

        let body = response.text().await.map_err(Error::from_generation)?;
        let chat_response: ChatCompletionResponse = serde_json::from_str(&body)
            .map_err(|e| Error::GenerationMalformed(format!("Invalid chat response: {}", e)))?;

        let text = chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Error::GenerationMalformed("No choices in chat response".into()))?;
        debug!(model = %options.model, output = preview(&text), "Chat completion response");
        Ok(text)
    }
}

/// OpenAI chat completion request
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

// System instructions go first when the prompt has them
fn chat_messages(prompt: &RenderedPrompt) -> Vec<ChatMessage<'_>> {
    let system = prompt.system.as_deref().map(|content| ChatMessage {
        role: "system",
        content,
    });
    system
        .into_iter()
        .chain(std::iter::once(ChatMessage {
            role: "user",
            content: &prompt.user,
        }))
        .collect()
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl AIBackend for OpenAICompatibleBackend {
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
        let mut req = self
            .http_client
            .get(format!("{}/v1/models", self.base_url))
            .timeout(std::time::Duration::from_secs(5));
        if let Some(ref api_key) = self.api_key {
            req = req.bearer_auth(api_key);
        }
        match req.send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn host(&self) -> &str {
        &self.base_url
    }
}
