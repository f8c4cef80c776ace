use anyhow::{Context, Result, anyhow};
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use crate::application::errors::ErrorResponse;
use crate::domain::history::HistoryEntry;
use crate::domain::posts::GenerationRequest;

/// Response of the generate endpoint as seen by the CLI.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResult {
    pub entry: HistoryEntry,
    #[serde(default)]
    pub persist_warning: Option<String>,
}

/// HTTP client for a running redbookify server's JSON API.
pub struct RedbookifyClient {
    base_url: Url,
    http: Client,
}

impl RedbookifyClient {
    pub fn new(base_url: Url) -> Result<Self> {
        let mut normalized = base_url;
        if !normalized.path().ends_with('/') {
            normalized.set_path(&format!("{}/", normalized.path().trim_end_matches('/')));
        }

        let http = Client::builder()
            .user_agent("redbookify-cli/1.0")
            .build()
            .context("failed to configure HTTP client")?;

        Ok(Self {
            base_url: normalized,
            http,
        })
    }

    pub fn from_base_url(base_url: &str) -> Result<Self> {
        let url = Url::parse(base_url).with_context(|| format!("invalid API url: {base_url}"))?;
        Self::new(url)
    }

    pub async fn generate(&self, request: &GenerationRequest) -> Result<GenerateResult> {
        let url = self.endpoint("api/v1/generate")?;
        let response = self.http.post(url).json(request).send().await?;
        self.handle_response(response).await
    }

    pub async fn list_history(&self) -> Result<Vec<HistoryEntry>> {
        let url = self.endpoint("api/v1/history")?;
        let response = self.http.get(url).send().await?;
        self.handle_response(response).await
    }

    pub async fn clear_history(&self) -> Result<()> {
        let url = self.endpoint("api/v1/history")?;
        let response = self.http.delete(url).send().await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(self.response_error(response).await)
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .with_context(|| format!("invalid API path: {path}"))
    }

    async fn handle_response<T>(&self, response: reqwest::Response) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        if response.status().is_success() {
            response
                .json::<T>()
                .await
                .context("failed to deserialize response body")
        } else {
            Err(self.response_error(response).await)
        }
    }

    async fn response_error(&self, response: reqwest::Response) -> anyhow::Error {
        let status = response.status();
        let bytes = response.bytes().await.unwrap_or_default();

        if let Ok(err) = serde_json::from_slice::<ErrorResponse>(&bytes) {
            return anyhow!("request failed ({status}): {}", err.message);
        }

        let message = String::from_utf8_lossy(&bytes);
        anyhow!("request failed ({status}): {message}")
    }
}
