use std::sync::Arc;

use redbookify::application::routes::app_router;
use redbookify::application::services::HistoryService;
use redbookify::application::state::{AppState, AppStateConfig};
use redbookify::domain::repositories::HistoryBackend;
use redbookify::infrastructure::storage::MemoryBackend;
use tokio::net::TcpListener;
use tokio::task::AbortHandle;
use wiremock::{MockServer, ResponseTemplate};

/// A 1x1 transparent PNG, small enough to embed in assertions.
pub const PNG_URI: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

pub struct TestApp {
    pub address: String,
    pub history: Arc<HistoryService>,
    /// The concrete backend, when the app was spawned with the default
    /// in-memory one. Lets tests inspect the persisted document directly.
    pub backend: Option<Arc<MemoryBackend>>,
    pub mock_server: MockServer,
    server_handle: AbortHandle,
}

impl TestApp {
    pub fn api_url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.address, path)
    }

    pub fn page_url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self.server_handle.abort();
    }
}

/// Spawn the app with an in-memory history backend and a wiremock server
/// standing in for OpenRouter. No image model is configured.
pub async fn spawn_app() -> TestApp {
    let backend = Arc::new(MemoryBackend::new());
    spawn_app_inner(backend.clone(), Some(backend), None).await
}

/// As [`spawn_app`], but with an image model configured so generation also
/// issues the illustration call.
pub async fn spawn_app_with_image_model() -> TestApp {
    let backend = Arc::new(MemoryBackend::new());
    spawn_app_inner(backend.clone(), Some(backend), Some("test-image-model".to_string())).await
}

/// Spawn the app on an arbitrary backend, for tests exercising persistence
/// failures.
pub async fn spawn_app_with_backend(backend: Arc<dyn HistoryBackend>) -> TestApp {
    spawn_app_inner(backend, None, None).await
}

async fn spawn_app_inner(
    backend: Arc<dyn HistoryBackend>,
    memory: Option<Arc<MemoryBackend>>,
    image_model: Option<String>,
) -> TestApp {
    let mock_server = MockServer::start().await;
    let openrouter_url = format!("{}/api/v1/chat/completions", mock_server.uri());

    let state = AppState::from_backend(
        backend,
        AppStateConfig {
            openrouter_url,
            openrouter_api_key: "test-key".to_string(),
            openrouter_model: "test-model".to_string(),
            openrouter_image_model: image_model,
        },
    );
    let history = state.history.clone();

    let app = app_router(state);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let local_addr = listener.local_addr().expect("Failed to get local address");
    let address = format!("http://{local_addr}");

    let server_handle = tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
        )
        .await
        .expect("Server failed to start");
    })
    .abort_handle();

    TestApp {
        address,
        history,
        backend: memory,
        mock_server,
        server_handle,
    }
}

/// Build an OpenRouter chat-completion response whose assistant message
/// content is `json_content`.
pub fn mock_openrouter_response(json_content: &str) -> ResponseTemplate {
    let body = serde_json::json!({
        "id": "gen-test",
        "model": "test-model",
        "choices": [{
            "index": 0,
            "message": {
                "role": "assistant",
                "content": json_content
            },
            "finish_reason": "stop"
        }],
        "usage": {
            "prompt_tokens": 100,
            "completion_tokens": 50,
            "total_tokens": 150,
            "cost": 0.001
        }
    });
    ResponseTemplate::new(200).set_body_json(body)
}

/// Build an OpenRouter response carrying generated images as data URIs.
pub fn mock_openrouter_image_response(urls: &[&str]) -> ResponseTemplate {
    let images: Vec<serde_json::Value> = urls
        .iter()
        .map(|url| {
            serde_json::json!({
                "type": "image_url",
                "image_url": { "url": url }
            })
        })
        .collect();

    let body = serde_json::json!({
        "id": "gen-test",
        "model": "test-image-model",
        "choices": [{
            "index": 0,
            "message": {
                "role": "assistant",
                "content": "",
                "images": images
            },
            "finish_reason": "stop"
        }]
    });
    ResponseTemplate::new(200).set_body_json(body)
}

/// Asserts that the body contains full HTML page structure
pub fn assert_full_page(body: &str) {
    assert!(
        body.contains("<!DOCTYPE") || body.contains("<html"),
        "Expected full HTML page with DOCTYPE or <html> tag"
    );
}
