use std::sync::Arc;

use async_trait::async_trait;
use redbookify::domain::errors::StorageError;
use redbookify::domain::repositories::HistoryBackend;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::helpers::{
    PNG_URI, mock_openrouter_image_response, mock_openrouter_response, spawn_app,
    spawn_app_with_backend, spawn_app_with_image_model,
};

#[tokio::test]
async fn generate_returns_created_entry_and_records_history() {
    let app = spawn_app().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/chat/completions"))
        .respond_with(mock_openrouter_response(r#"{"blogPost": "测试内容"}"#))
        .mount(&app.mock_server)
        .await;

    let client = reqwest::Client::new();
    let response = client
        .post(app.api_url("/generate"))
        .json(&serde_json::json!({ "bookTitle": "三体" }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 201);

    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["entry"]["bookTitle"], "三体");
    assert_eq!(body["entry"]["generatedContent"]["blogPost"], "测试内容");
    assert!(body["entry"]["id"].is_string());
    assert!(body["entry"]["timestamp"].is_i64());
    assert!(body.get("persistWarning").is_none());

    let entries = app.history.list().await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].book_title, "三体");
}

#[tokio::test]
async fn generate_unwraps_markdown_fenced_response() {
    let app = spawn_app().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/chat/completions"))
        .respond_with(mock_openrouter_response(
            "```json\n{\"blogPost\": \"测试内容\"}\n```",
        ))
        .mount(&app.mock_server)
        .await;

    let client = reqwest::Client::new();
    let response = client
        .post(app.api_url("/generate"))
        .json(&serde_json::json!({ "bookTitle": "三体" }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 201);
    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["entry"]["generatedContent"]["blogPost"], "测试内容");
}

#[tokio::test]
async fn generate_rejects_short_title() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(app.api_url("/generate"))
        .json(&serde_json::json!({ "bookTitle": "  三  " }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert!(
        body["message"]
            .as_str()
            .unwrap()
            .contains("书名至少需要2个字符")
    );
    assert!(app.history.list().await.is_empty());
}

#[tokio::test]
async fn generate_ai_failure_returns_error_and_leaves_history_untouched() {
    let app = spawn_app().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("timeout"))
        .mount(&app.mock_server)
        .await;

    let client = reqwest::Client::new();
    let response = client
        .post(app.api_url("/generate"))
        .json(&serde_json::json!({ "bookTitle": "三体" }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 500);
    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert!(body["message"].as_str().unwrap().contains("timeout"));

    assert!(app.history.list().await.is_empty());
}

#[tokio::test]
async fn generate_includes_images_when_image_model_configured() {
    let app = spawn_app_with_image_model().await;

    // The illustration call is the one requesting image output
    Mock::given(method("POST"))
        .and(path("/api/v1/chat/completions"))
        .and(body_partial_json(
            serde_json::json!({ "modalities": ["image", "text"] }),
        ))
        .respond_with(mock_openrouter_image_response(&[PNG_URI, PNG_URI]))
        .mount(&app.mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/v1/chat/completions"))
        .respond_with(mock_openrouter_response(r#"{"blogPost": "测试内容"}"#))
        .mount(&app.mock_server)
        .await;

    let client = reqwest::Client::new();
    let response = client
        .post(app.api_url("/generate"))
        .json(&serde_json::json!({ "bookTitle": "三体" }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 201);
    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    let content = &body["entry"]["generatedContent"];
    assert_eq!(content["coverImageUrl"], PNG_URI);
    assert_eq!(content["imageUrls"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn generate_degrades_to_text_only_when_image_call_fails() {
    let app = spawn_app_with_image_model().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/chat/completions"))
        .and(body_partial_json(
            serde_json::json!({ "modalities": ["image", "text"] }),
        ))
        .respond_with(ResponseTemplate::new(500).set_body_string("image model unavailable"))
        .mount(&app.mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/v1/chat/completions"))
        .respond_with(mock_openrouter_response(r#"{"blogPost": "测试内容"}"#))
        .mount(&app.mock_server)
        .await;

    let client = reqwest::Client::new();
    let response = client
        .post(app.api_url("/generate"))
        .json(&serde_json::json!({ "bookTitle": "三体" }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 201);
    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    let content = &body["entry"]["generatedContent"];
    assert_eq!(content["blogPost"], "测试内容");
    assert!(content.get("coverImageUrl").is_none());
}

/// Backend whose saves always fail; load and clear succeed.
struct QuotaExceededBackend;

#[async_trait]
impl HistoryBackend for QuotaExceededBackend {
    async fn load(&self) -> Result<Option<String>, StorageError> {
        Ok(None)
    }

    async fn save(&self, _document: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("quota exceeded".to_string()))
    }

    async fn clear(&self) -> Result<(), StorageError> {
        Ok(())
    }
}

#[tokio::test]
async fn generate_reports_persist_warning_when_backend_fails() {
    let app = spawn_app_with_backend(Arc::new(QuotaExceededBackend)).await;

    Mock::given(method("POST"))
        .and(path("/api/v1/chat/completions"))
        .respond_with(mock_openrouter_response(r#"{"blogPost": "测试内容"}"#))
        .mount(&app.mock_server)
        .await;

    let client = reqwest::Client::new();
    let response = client
        .post(app.api_url("/generate"))
        .json(&serde_json::json!({ "bookTitle": "三体" }))
        .send()
        .await
        .expect("Failed to execute request");

    // Generation succeeds; only persistence is degraded
    assert_eq!(response.status(), 201);
    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert!(body["persistWarning"].as_str().unwrap().contains("quota"));
    assert_eq!(app.history.list().await.len(), 1);
}

#[tokio::test]
async fn generate_is_rate_limited_per_ip() {
    let app = spawn_app().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/chat/completions"))
        .respond_with(mock_openrouter_response(r#"{"blogPost": "测试内容"}"#))
        .mount(&app.mock_server)
        .await;

    let client = reqwest::Client::new();
    let mut last_status = None;
    for _ in 0..11 {
        let response = client
            .post(app.api_url("/generate"))
            .json(&serde_json::json!({ "bookTitle": "三体" }))
            .send()
            .await
            .expect("Failed to execute request");
        last_status = Some(response.status());
    }

    assert_eq!(last_status.unwrap(), 429);
}
