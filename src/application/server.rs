use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;

use crate::application::routes::app_router;
use crate::application::state::{AppState, AppStateConfig};
use crate::domain::repositories::HistoryBackend;
use crate::infrastructure::storage::{JsonFileBackend, MemoryBackend};

pub struct ServerConfig {
    pub bind_address: SocketAddr,
    /// `None` runs with an in-memory history (ephemeral mode).
    pub history_path: Option<PathBuf>,
    pub openrouter_api_key: String,
    pub openrouter_model: String,
    pub openrouter_image_model: Option<String>,
}

pub async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    let backend: Arc<dyn HistoryBackend> = match &config.history_path {
        Some(path) => Arc::new(JsonFileBackend::new(path.clone())),
        None => {
            info!("running with ephemeral in-memory history");
            Arc::new(MemoryBackend::new())
        }
    };

    let state = AppState::from_backend(
        backend,
        AppStateConfig {
            openrouter_url: crate::infrastructure::ai::OPENROUTER_URL.to_string(),
            openrouter_api_key: config.openrouter_api_key,
            openrouter_model: config.openrouter_model,
            openrouter_image_model: config.openrouter_image_model,
        },
    );

    // Populate history from the persisted document; malformed or absent
    // data starts the session with an empty list.
    state.history.load().await;

    let listener = TcpListener::bind(config.bind_address)
        .await
        .with_context(|| format!("failed to bind to {}", config.bind_address))?;

    let app = app_router(state);

    info!(
        address = %config.bind_address,
        history = ?config.history_path,
        "starting HTTP server"
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server terminated unexpectedly")?;

    info!("server shutdown complete");

    Ok(())
}

#[allow(clippy::expect_used)] // Startup: panicking is appropriate if signal handlers fail
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
