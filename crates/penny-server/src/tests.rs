//! Server API tests

use super::*;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use penny_core::ai::MockBackend;
use penny_core::models::{Category, NewTransaction, TransactionKind};
use tower::ServiceExt;

fn seeded_db() -> Database {
    let db = Database::in_memory().unwrap();
    for (date, kind, category, amount, description) in [
        ("2025-09-05", TransactionKind::Income, Category::Salary, "1000.00", "Monthly salary"),
        ("2025-09-10", TransactionKind::Expense, Category::EatingOut, "200.00", "Dinner <b>out</b>"),
    ] {
        db.insert_transaction(&NewTransaction {
            date: date.parse().unwrap(),
            kind,
            category,
            amount: amount.parse().unwrap(),
            description: Some(description.to_string()),
        })
        .unwrap();
    }
    db
}

fn setup_test_app() -> Router {
    setup_with(seeded_db(), Some(AIClient::mock()), ServerConfig::default())
}

fn setup_with(db: Database, ai: Option<AIClient>, config: ServerConfig) -> Router {
    create_router(db, ai, None, config).unwrap()
}

fn with_key() -> ServerConfig {
    ServerConfig {
        api_key: Some("s3cret".to_string()),
        ..Default::default()
    }
}

async fn get_body_json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body();
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn get_body_text(response: axum::response::Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

// ========== Health ==========

#[tokio::test]
async fn test_healthz() {
    let response = setup_test_app().oneshot(get("/healthz")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );
    assert_eq!(get_body_json(response).await, serde_json::json!({"ok": true}));
}

// ========== Summary ==========

#[tokio::test]
async fn test_summary_scenario() {
    let response = setup_test_app()
        .oneshot(get("/api/v1/summary?month=2025-09"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["income"].as_f64(), Some(1000.0));
    assert_eq!(json["expenses"].as_f64(), Some(200.0));
    assert_eq!(json["net"].as_f64(), Some(800.0));
}

#[tokio::test]
async fn test_summary_needs_no_key() {
    let app = setup_with(seeded_db(), None, with_key());
    let response = app.oneshot(get("/api/v1/summary?month=2025-09")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_invalid_month_is_bad_request() {
    for uri in [
        "/api/v1/summary?month=2025-13",
        "/api/v1/transactions?month=garbage",
        "/api/v1/llm/reports/monthly?month=09-2025",
    ] {
        let response = setup_test_app().oneshot(get(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", uri);
    }
}

// ========== Auth ==========

#[tokio::test]
async fn test_api_key_required_when_configured() {
    let app = setup_with(seeded_db(), None, with_key());

    let response = app
        .clone()
        .oneshot(get("/api/v1/transactions?month=2025-09"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(get_body_json(response).await["error"], "Invalid API key");

    let wrong = Request::builder()
        .uri("/api/v1/transactions?month=2025-09")
        .header("X-API-Key", "s3creT")
        .body(Body::empty())
        .unwrap();
    assert_eq!(
        app.clone().oneshot(wrong).await.unwrap().status(),
        StatusCode::UNAUTHORIZED
    );

    let right = Request::builder()
        .uri("/api/v1/transactions?month=2025-09")
        .header("X-API-Key", "s3cret")
        .body(Body::empty())
        .unwrap();
    assert_eq!(app.oneshot(right).await.unwrap().status(), StatusCode::OK);
}

#[test]
fn test_validate_api_key() {
    assert!(validate_api_key("abc", "abc"));
    assert!(!validate_api_key("abd", "abc"));
    assert!(!validate_api_key("abcd", "abc"));
    assert!(!validate_api_key("", "abc"));
}

#[test]
fn test_parse_origins() {
    assert_eq!(
        parse_origins(" http://a.test ,http://b.test,, "),
        vec!["http://a.test", "http://b.test"]
    );
}

// ========== Transactions ==========

#[tokio::test]
async fn test_list_transactions_newest_first() {
    let response = setup_test_app()
        .oneshot(get("/api/v1/transactions?month=2025-09"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    let rows = json.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["date"], "2025-09-10");
    assert_eq!(rows[0]["type"], "expense");
    assert_eq!(rows[0]["category"], "eating_out");
    assert_eq!(rows[1]["amount"].as_f64(), Some(1000.0));
}

#[tokio::test]
async fn test_transaction_lifecycle() {
    let app = setup_with(Database::in_memory().unwrap(), None, ServerConfig::default());

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/transactions",
            serde_json::json!({
                "date": "2025-09-03",
                "type": "expense",
                "category": "groceries",
                "amount": 45.5,
                "description": "Farmers market"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = get_body_json(response).await;
    let id = created["id"].as_i64().unwrap();
    assert_eq!(created["amount"].as_f64(), Some(45.5));

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/api/v1/transactions/{}", id),
            serde_json::json!({"amount": 50}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated = get_body_json(response).await;
    assert_eq!(updated["amount"].as_f64(), Some(50.0));
    assert_eq!(updated["category"], "groceries");

    let response = app
        .clone()
        .oneshot(get(&format!("/api/v1/transactions/{}", id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let delete = Request::builder()
        .method("DELETE")
        .uri(format!("/api/v1/transactions/{}", id))
        .body(Body::empty())
        .unwrap();
    assert_eq!(
        app.clone().oneshot(delete).await.unwrap().status(),
        StatusCode::NO_CONTENT
    );

    let response = app
        .oneshot(get(&format!("/api/v1/transactions/{}", id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_missing_transaction_not_found() {
    let app = setup_test_app();

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/api/v1/transactions/999",
            serde_json::json!({"amount": 1}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let delete = Request::builder()
        .method("DELETE")
        .uri("/api/v1/transactions/999")
        .body(Body::empty())
        .unwrap();
    assert_eq!(app.oneshot(delete).await.unwrap().status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_transactions_rejected() {
    let app = setup_test_app();

    for body in [
        // Negative amount
        serde_json::json!({"date": "2025-09-03", "type": "expense", "category": "groceries", "amount": -1}),
        // Category not storable
        serde_json::json!({"date": "2025-09-03", "type": "expense", "category": "other", "amount": 1}),
        // Unknown category
        serde_json::json!({"date": "2025-09-03", "type": "expense", "category": "rent", "amount": 1}),
        // Missing date
        serde_json::json!({"type": "expense", "category": "groceries", "amount": 1}),
    ] {
        let response = app
            .clone()
            .oneshot(json_request("POST", "/api/v1/transactions", body.clone()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY, "{}", body);
    }
}

#[tokio::test]
async fn test_huge_amount_rejected() {
    let app = setup_with(Database::in_memory().unwrap(), None, ServerConfig::default());

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/transactions",
            serde_json::json!({"date": "2025-09-12", "type": "expense", "category": "groceries", "amount": 1e28}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(get_body_json(response).await["error"].is_string());

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/transactions",
            serde_json::json!({"date": "2025-09-12", "type": "expense", "category": "groceries", "amount": 12}),
        ))
        .await
        .unwrap();
    let id = get_body_json(response).await["id"].as_i64().unwrap();

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/api/v1/transactions/{}", id),
            serde_json::json!({"amount": 1e28}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/api/v1/transactions/{}", id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(get_body_json(response).await["amount"].as_f64(), Some(12.0));
}

// ========== LLM ==========

#[tokio::test]
async fn test_suggest() {
    let response = setup_test_app()
        .oneshot(json_request(
            "POST",
            "/api/v1/llm/suggest",
            serde_json::json!({"description": "Friday pizza night"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["suggested_type"], "expense");
    assert_eq!(json["suggested_category"], "eating_out");
}

#[tokio::test]
async fn test_suggest_empty_description() {
    let response = setup_test_app()
        .oneshot(json_request(
            "POST",
            "/api/v1/llm/suggest",
            serde_json::json!({"description": "   "}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_suggest_failing_backend_defaults() {
    let app = setup_with(
        seeded_db(),
        Some(AIClient::Mock(MockBackend::failing())),
        ServerConfig::default(),
    );
    let response = app
        .oneshot(json_request(
            "POST",
            "/api/v1/llm/suggest",
            serde_json::json!({"description": "Whole Foods"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["suggested_type"], "expense");
    assert_eq!(json["suggested_category"], "other");
    assert_eq!(json["confidence"].as_f64(), Some(0.1));
}

#[tokio::test]
async fn test_monthly_report_get_and_post() {
    let app = setup_with(
        seeded_db(),
        Some(AIClient::Mock(MockBackend::timing_out())),
        ServerConfig::default(),
    );

    for method in ["GET", "POST"] {
        let request = Request::builder()
            .method(method)
            .uri("/api/v1/llm/reports/monthly?month=2025-09")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{}", method);

        let json = get_body_json(response).await;
        assert_eq!(json["month"], "2025-09");
        assert_eq!(json["transaction_count"], 2);
        assert_eq!(json["narrative_source"], "fallback");
        assert_eq!(json["insights"][0], "Total income: $1000.00");
        assert!(json["report_text"]
            .as_str()
            .unwrap()
            .contains("net gain of $800.00"));
    }
}

#[tokio::test]
async fn test_monthly_report_empty_month() {
    let response = setup_test_app()
        .oneshot(get("/api/v1/llm/reports/monthly?month=2025-10"))
        .await
        .unwrap();
    let json = get_body_json(response).await;
    assert_eq!(json["narrative_source"], "no_data");
    assert_eq!(json["insights"], serde_json::json!(["No data available for analysis"]));
    assert_eq!(json["transaction_count"], 0);
}

// ========== Dashboard ==========

#[tokio::test]
async fn test_dashboard_page() {
    let response = setup_test_app().oneshot(get("/?month=2025-09")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = get_body_text(response).await;
    assert!(html.contains("September, 2025"));
    assert!(html.contains("/?month=2025-08"));
    assert!(html.contains("/?month=2025-10"));
    assert!(html.contains("$1000.00"));
    assert!(html.contains("$200.00"));
    // Descriptions are escaped
    assert!(html.contains("Dinner &lt;b&gt;out"));
    assert!(!html.contains("<b>out</b>"));
}

#[tokio::test]
async fn test_transactions_page_year_boundary() {
    let response = setup_test_app()
        .oneshot(get("/transactions?month=2025-01"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = get_body_text(response).await;
    assert!(html.contains("/transactions?month=2024-12"));
    assert!(html.contains("/transactions?month=2025-02"));
    assert!(html.contains("No transactions this month"));
}

#[tokio::test]
async fn test_static_files_served() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("style.css"), "body {}").unwrap();

    let app = create_router(
        seeded_db(),
        None,
        Some(dir.path().to_str().unwrap()),
        ServerConfig::default(),
    )
    .unwrap();
    let response = app.oneshot(get("/static/style.css")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(get_body_text(response).await, "body {}");
}
