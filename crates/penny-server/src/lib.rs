//! Penny Web Server
//!
//! Axum-based REST API and server-rendered dashboard for Penny.
//!
//! Security features:
//! - Optional API key (`X-API-Key`) on transaction and LLM routes
//! - Restrictive CORS policy unless origins are configured
//! - Sanitized error responses

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderName, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use handlebars::Handlebars;
use tower_http::{
    cors::CorsLayer, services::ServeDir, set_header::SetResponseHeaderLayer, trace::TraceLayer,
};
use tracing::{error, info, warn};

use penny_core::ai::{AIBackend, AIClient};
use penny_core::db::Database;
use penny_core::ReportAssembler;

mod handlers;
mod views;

/// API key header checked by the auth middleware
pub const API_KEY_HEADER: &str = "x-api-key";

/// Server configuration
#[derive(Clone, Default)]
pub struct ServerConfig {
    /// Key required on protected routes; `None` leaves them open
    pub api_key: Option<String>,
    /// Allowed CORS origins (empty = same-origin only)
    pub allowed_origins: Vec<String>,
    /// Allow any origin (local development)
    pub cors_any: bool,
}

impl ServerConfig {
    /// Read `PENNY_API_KEY`, `PENNY_CORS_ORIGINS` and `PENNY_CORS_ANY`
    pub fn from_env() -> Self {
        let api_key = std::env::var("PENNY_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty());
        let allowed_origins = std::env::var("PENNY_CORS_ORIGINS")
            .map(|s| parse_origins(&s))
            .unwrap_or_default();
        let cors_any = std::env::var("PENNY_CORS_ANY")
            .map(|v| matches!(v.trim(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Self {
            api_key,
            allowed_origins,
            cors_any,
        }
    }
}

/// Parse a comma-separated origin list
pub fn parse_origins(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Shared application state
pub struct AppState {
    pub reports: ReportAssembler<Database>,
    pub config: ServerConfig,
    pub templates: Handlebars<'static>,
}

impl AppState {
    /// Transaction store shared with the report pipeline
    pub fn db(&self) -> &Database {
        self.reports.store()
    }
}

/// API key middleware
///
/// Keys are compared in constant time. With no key configured every request
/// is let through.
async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let Some(expected) = state.config.api_key.as_deref() else {
        return next.run(request).await;
    };

    let provided = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok());

    if provided.is_some_and(|key| validate_api_key(key, expected)) {
        return next.run(request).await;
    }

    warn!(path = %request.uri().path(), "Unauthorized request - invalid API key");
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({
            "error": "Invalid API key"
        })),
    )
        .into_response()
}

/// Validate an API key using constant-time comparison
fn validate_api_key(provided: &str, expected: &str) -> bool {
    use subtle::ConstantTimeEq;

    let provided_bytes = provided.as_bytes();
    let expected_bytes = expected.as_bytes();
    // Only compare if lengths match (constant-time for same-length keys)
    provided_bytes.len() == expected_bytes.len() && provided_bytes.ct_eq(expected_bytes).into()
}

/// GET /healthz
async fn healthz() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "ok": true }))
}

/// Create the application router
pub fn create_router(
    db: Database,
    ai: Option<AIClient>,
    static_dir: Option<&str>,
    config: ServerConfig,
) -> anyhow::Result<Router> {
    match ai {
        Some(ref client) => info!(
            backend = client.backend_name(),
            host = client.host(),
            model = client.model(),
            "AI backend configured"
        ),
        None => info!("AI backend not configured, reports use the fallback narrative"),
    }

    let state = Arc::new(AppState {
        reports: ReportAssembler::new(db, ai),
        config: config.clone(),
        templates: views::registry()?,
    });

    let protected = Router::new()
        // Transactions
        .route(
            "/transactions",
            get(handlers::list_transactions).post(handlers::create_transaction),
        )
        .route(
            "/transactions/:id",
            get(handlers::get_transaction)
                .put(handlers::update_transaction)
                .delete(handlers::delete_transaction),
        )
        // LLM
        .route("/llm/suggest", post(handlers::suggest))
        .route(
            "/llm/reports/monthly",
            get(handlers::monthly_report).post(handlers::monthly_report),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let api_routes = Router::new()
        .route("/summary", get(handlers::month_summary))
        .merge(protected);

    let cors = build_cors(&config);

    let mut app = Router::new()
        .route("/", get(handlers::dashboard))
        .route("/transactions", get(handlers::transactions_page))
        .route("/healthz", get(healthz))
        .nest("/api/v1", api_routes);

    // Serve static files if directory provided
    if let Some(dir) = static_dir {
        app = app.nest_service("/static", ServeDir::new(dir));
    }

    Ok(app
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        )))
}

fn build_cors(config: &ServerConfig) -> CorsLayer {
    if config.cors_any {
        return CorsLayer::permissive();
    }

    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
    ];
    let headers = [header::CONTENT_TYPE, HeaderName::from_static(API_KEY_HEADER)];

    if config.allowed_origins.is_empty() {
        // Restrictive default: only allow same-origin
        CorsLayer::new().allow_methods(methods).allow_headers(headers)
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(headers)
    }
}

/// Start the server
pub async fn serve(
    db: Database,
    host: &str,
    port: u16,
    static_dir: Option<&str>,
) -> anyhow::Result<()> {
    let config = ServerConfig::from_env();
    if config.api_key.is_none() {
        warn!("PENNY_API_KEY not set - API routes are open, do not expose to network!");
    }

    let ai = AIClient::from_env();
    check_ai_connection(ai.as_ref()).await;

    let app = create_router(db, ai, static_dir, config)?;
    let addr = format!("{}:{}", host, port);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Check and log AI backend connection status
async fn check_ai_connection(ai: Option<&AIClient>) {
    match ai {
        Some(client) => {
            if client.health_check().await {
                info!(host = client.host(), model = client.model(), "AI backend connected");
            } else {
                warn!(
                    host = client.host(),
                    model = client.model(),
                    "AI backend configured but not responding, reports will use the fallback"
                );
            }
        }
        None => {
            info!("AI backend disabled (AI_BACKEND=none)");
        }
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type with proper HTTP status codes
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
    internal: Option<anyhow::Error>,
}

impl AppError {
    pub fn bad_request(msg: &str) -> Self {
        Self::with_status(StatusCode::BAD_REQUEST, msg)
    }

    pub fn not_found(msg: &str) -> Self {
        Self::with_status(StatusCode::NOT_FOUND, msg)
    }

    pub fn unprocessable(msg: &str) -> Self {
        Self::with_status(StatusCode::UNPROCESSABLE_ENTITY, msg)
    }

    pub fn internal(err: impl Into<anyhow::Error>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            // Return generic message to client
            message: "An internal error occurred".to_string(),
            // Keep full error for logging
            internal: Some(err.into()),
        }
    }

    fn with_status(status: StatusCode, msg: &str) -> Self {
        Self {
            status,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the full internal error if present
        if let Some(err) = &self.internal {
            error!(error = %err, "Internal error");
        }

        let body = Json(serde_json::json!({
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}

impl From<penny_core::Error> for AppError {
    fn from(err: penny_core::Error) -> Self {
        use penny_core::Error;

        match err {
            Error::InvalidPeriod(_) | Error::EmptyDescription => Self::bad_request(&err.to_string()),
            Error::InvalidData(ref msg) => Self::unprocessable(msg),
            Error::NotFound(ref what) => Self::not_found(&format!("{} not found", what)),
            Error::StoreUnavailable(_) => {
                warn!(error = %err, "Transaction store unavailable");
                Self::with_status(StatusCode::SERVICE_UNAVAILABLE, "Transaction store unavailable")
            }
            other => Self::internal(other),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal(err)
    }
}

#[cfg(test)]
mod tests;
