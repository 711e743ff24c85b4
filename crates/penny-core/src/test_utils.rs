//! Test utilities for penny-core
//!
//! A mock Ollama server for backend and fallback tests. It can answer like a
//! real model, stream NDJSON chunks, fail with a status code, or stall.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    body::Body,
    extract::{Json, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::oneshot;

/// How the mock answers `/api/generate`
#[derive(Debug, Clone)]
pub enum ReplyMode {
    /// Sniff the prompt and answer like a cooperative model
    Auto,
    /// Single JSON object whose `response` is this text
    Text(String),
    /// NDJSON body, one chunk per line
    Chunks(Vec<String>),
    /// Empty body with this status
    Status(u16),
    /// Wait, then answer with this text
    Delay(Duration, String),
}

struct ServerState {
    mode: ReplyMode,
    requests: Mutex<Vec<Value>>,
}

/// Mock Ollama server for testing and development
pub struct MockOllamaServer {
    addr: SocketAddr,
    state: Arc<ServerState>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockOllamaServer {
    /// Start the mock server on an available port
    pub async fn start() -> Self {
        Self::start_with(ReplyMode::Auto).await
    }

    /// Start with a fixed reply mode
    pub async fn start_with(mode: ReplyMode) -> Self {
        let state = Arc::new(ServerState {
            mode,
            requests: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/api/tags", get(handle_tags))
            .route("/api/generate", post(handle_generate))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            state,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Request bodies received so far
    pub fn requests(&self) -> Vec<Value> {
        self.state.requests.lock().unwrap().clone()
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockOllamaServer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Ollama tags endpoint response (health check)
async fn handle_tags() -> Json<Value> {
    Json(json!({
        "models": [{
            "name": "llama3.2:latest",
            "modified_at": "2024-01-01T00:00:00Z",
            "size": 4_000_000_000u64
        }]
    }))
}

#[derive(Debug, Deserialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
}

async fn handle_generate(State(state): State<Arc<ServerState>>, Json(body): Json<Value>) -> Response {
    state.requests.lock().unwrap().push(body.clone());
    let request: GenerateRequest = match serde_json::from_value(body) {
        Ok(r) => r,
        Err(_) => return StatusCode::BAD_REQUEST.into_response(),
    };

    match &state.mode {
        ReplyMode::Auto => single(&request.model, &auto_reply(&request.prompt)),
        ReplyMode::Text(text) => single(&request.model, text),
        ReplyMode::Chunks(chunks) => {
            let mut lines: Vec<String> = chunks
                .iter()
                .map(|c| json!({"model": request.model, "response": c, "done": false}).to_string())
                .collect();
            lines.push(json!({"model": request.model, "response": "", "done": true}).to_string());

            Response::builder()
                .header(header::CONTENT_TYPE, "application/x-ndjson")
                .body(Body::from(lines.join("\n")))
                .unwrap()
        }
        ReplyMode::Status(code) => StatusCode::from_u16(*code)
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            .into_response(),
        ReplyMode::Delay(wait, text) => {
            tokio::time::sleep(*wait).await;
            single(&request.model, text)
        }
    }
}

fn single(model: &str, text: &str) -> Response {
    Json(json!({"model": model, "response": text, "done": true})).into_response()
}

/// Answers matching the prompt files in prompts/*.md
fn auto_reply(prompt: &str) -> String {
    if let Some(description) = extract_quoted(prompt, "Transaction description: \"") {
        let d = description.to_lowercase();
        let (kind, category, confidence) = if d.contains("salary") || d.contains("payroll") {
            ("income", "salary", 0.95)
        } else if d.contains("grocer") || d.contains("market") {
            ("expense", "groceries", 0.9)
        } else if d.contains("restaurant") || d.contains("coffee") || d.contains("pizza") {
            ("expense", "eating_out", 0.9)
        } else {
            ("expense", "other", 0.4)
        };
        return format!(
            "Here is my suggestion:\n{}",
            json!({"suggested_type": kind, "suggested_category": category, "confidence": confidence})
        );
    }

    if prompt.contains("financial standing") {
        return "Hello! You kept spending well under your income this month. Keep it up.".to_string();
    }

    "I'm not sure what you're asking.".to_string()
}

fn extract_quoted<'a>(prompt: &'a str, marker: &str) -> Option<&'a str> {
    let start = prompt.find(marker)? + marker.len();
    let rest = &prompt[start..];
    rest.find('"').map(|end| &rest[..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{AIBackend, OllamaBackend, ReportFacts};
    use crate::error::Error;
    use crate::model_router::{ModelRouter, RouterConfig, TaskType};
    use crate::models::{Category, Transaction, TransactionKind};
    use crate::stats::StatisticsSnapshot;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn backend(server: &MockOllamaServer) -> OllamaBackend {
        OllamaBackend::with_router(
            &server.url(),
            "test-model",
            ModelRouter::with_config(RouterConfig::default()),
        )
        .with_embedded_prompts()
    }

    fn facts() -> ReportFacts {
        let rows = vec![Transaction {
            id: 1,
            date: NaiveDate::from_ymd_opt(2025, 9, 5).unwrap(),
            kind: TransactionKind::Income,
            category: Category::Salary,
            amount: Decimal::new(100000, 2),
            description: Some("Monthly salary".into()),
        }];
        let stats = StatisticsSnapshot::compute(&rows);
        ReportFacts::new("2025-09".into(), "September, 2025".into(), &stats, &rows)
    }

    #[tokio::test]
    async fn test_mock_server_health_check() {
        let server = MockOllamaServer::start().await;
        assert!(backend(&server).health_check().await);
    }

    #[tokio::test]
    async fn test_suggestion_through_http() {
        let server = MockOllamaServer::start().await;
        let client = backend(&server);

        let s = client.suggest_category("Corner coffee shop").await.unwrap();
        assert_eq!(s.suggested_type, TransactionKind::Expense);
        assert_eq!(s.suggested_category, Category::EatingOut);
        assert_eq!(s.confidence, 0.9);

        let sent = &server.requests()[0];
        assert_eq!(sent["model"], "test-model");
        assert_eq!(sent["stream"], false);
        assert!((sent["options"]["temperature"].as_f64().unwrap() - 0.1).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_narrative_sampling_options() {
        let server = MockOllamaServer::start().await;
        let text = backend(&server).generate_report(&facts()).await.unwrap();
        assert!(text.starts_with("Hello!"));

        let sent = &server.requests()[0];
        assert_eq!(sent["options"]["num_predict"], 200);
        assert!((sent["options"]["temperature"].as_f64().unwrap() - 0.3).abs() < 1e-6);
        let prompt = sent["prompt"].as_str().unwrap();
        assert!(prompt.contains("Total Income: $1000.00"));
        assert!(prompt.contains("- 2025-09-05 income salary: Monthly salary"));
        assert_eq!(sent["system"], "You are a concise personal financial advisor.");
    }

    #[tokio::test]
    async fn test_ndjson_chunks_concatenated() {
        let server = MockOllamaServer::start_with(ReplyMode::Chunks(vec![
            "Hello! ".into(),
            "Nice ".into(),
            "month.".into(),
        ]))
        .await;
        let text = backend(&server).generate_report(&facts()).await.unwrap();
        assert_eq!(text, "Hello! Nice month.");
    }

    #[tokio::test]
    async fn test_server_error_is_unavailable() {
        let server = MockOllamaServer::start_with(ReplyMode::Status(500)).await;
        let err = backend(&server).generate_report(&facts()).await.unwrap_err();
        assert!(matches!(err, Error::GenerationUnavailable(_)));
    }

    #[tokio::test]
    async fn test_empty_output_is_malformed() {
        let server = MockOllamaServer::start_with(ReplyMode::Text("   ".into())).await;
        let err = backend(&server).generate_report(&facts()).await.unwrap_err();
        assert!(matches!(err, Error::GenerationMalformed(_)));
    }

    #[tokio::test]
    async fn test_slow_model_times_out() {
        let server =
            MockOllamaServer::start_with(ReplyMode::Delay(Duration::from_secs(5), "late".into()))
                .await;

        let mut config = RouterConfig::default();
        if let Some(narrative) = config.tasks.get_mut(&TaskType::Narrative) {
            narrative.timeout = Duration::from_millis(100);
        }
        let client = OllamaBackend::with_router(&server.url(), "test-model", ModelRouter::with_config(config))
            .with_embedded_prompts();

        let err = client.generate_report(&facts()).await.unwrap_err();
        assert!(matches!(err, Error::GenerationTimeout), "{:?}", err);
        assert_eq!(server.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_unreachable_host_is_unavailable() {
        let mut server = MockOllamaServer::start().await;
        let client = backend(&server);
        server.stop();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(!client.health_check().await);
        let err = client.suggest_category("coffee").await.unwrap_err();
        assert!(err.is_generation_failure());
    }
}
