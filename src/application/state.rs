use std::sync::Arc;

use crate::application::services::HistoryService;
use crate::domain::repositories::HistoryBackend;

/// Configuration for external services — everything that varies between
/// production and test environments. The history service is created
/// automatically from the backend.
pub struct AppStateConfig {
    pub openrouter_url: String,
    pub openrouter_api_key: String,
    pub openrouter_model: String,
    /// Image generation is skipped entirely when unset.
    pub openrouter_image_model: Option<String>,
}

#[derive(Clone)]
pub struct AppState {
    pub history: Arc<HistoryService>,
    pub http_client: reqwest::Client,
    pub openrouter_url: String,
    pub openrouter_api_key: String,
    pub openrouter_model: String,
    pub openrouter_image_model: Option<String>,
}

impl AppState {
    /// Build the full application state from a persistence backend and config.
    pub fn from_backend(backend: Arc<dyn HistoryBackend>, config: AppStateConfig) -> Self {
        Self {
            history: Arc::new(HistoryService::new(backend)),
            #[allow(clippy::expect_used)]
            http_client: reqwest::ClientBuilder::new()
                .timeout(std::time::Duration::from_secs(180))
                .build()
                .expect("failed to build HTTP client"),
            openrouter_url: config.openrouter_url,
            openrouter_api_key: config.openrouter_api_key,
            openrouter_model: config.openrouter_model,
            openrouter_image_model: config.openrouter_image_model,
        }
    }
}
